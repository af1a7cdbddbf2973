use serde::Serialize;

use super::error::EngineError;

/// One entry of the fixed validator roster.
///
/// `faulty` and `slashed` both suppress vote *production* only; fork
/// choice still counts a faulty validator's last recorded
/// `latest_message`. Flags are mutated only by `toggle_fault`;
/// `latest_message` is mutated only by vote delivery.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
  pub id: usize,
  pub faulty: bool,
  pub slashed: bool,
  pub latest_message: Option<LatestMessage>,
}

/// A validator's most recently applied vote target. Block ids are
/// heap-allocated strings (`"{slot}:{index}"`), so the registry cannot
/// borrow from the block tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LatestMessage {
  pub slot: u64,
  pub block_id: String,
}

/// Holds the fixed roster, fault flags, and latest-message pointer per
/// validator.
#[derive(Debug, Clone)]
pub struct Registry {
  validators: Vec<Validator>,
}

impl Registry {
  /// Creates a registry of `n` validators with sequential ids, all flags
  /// false, and an empty `latest_message`.
  pub fn new(n: usize) -> Self {
    Self {
      validators: (0..n)
        .map(|id| Validator {
          id,
          faulty: false,
          slashed: false,
          latest_message: None,
        })
        .collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.validators.len()
  }

  pub fn is_empty(&self) -> bool {
    self.validators.is_empty()
  }

  pub fn get(&self, id: usize) -> Option<&Validator> {
    self.validators.get(id)
  }

  pub fn all(&self) -> &[Validator] {
    &self.validators
  }

  /// Flips `faulty` for `id`. Fails with `InvalidId` if out of range.
  pub fn toggle_fault(&mut self, id: usize) -> Result<&Validator, EngineError> {
    let validator = self
      .validators
      .get_mut(id)
      .ok_or(EngineError::InvalidId(id))?;
    validator.faulty = !validator.faulty;
    Ok(validator)
  }

  /// Sets `latest_message` for `id`. Trusted internal caller: `id` is
  /// always valid by construction of the vote queue (never fails).
  pub fn record_vote(&mut self, id: usize, slot: u64, block_id: &str) {
    if let Some(validator) = self.validators.get_mut(id) {
      validator.latest_message = Some(LatestMessage {
        slot,
        block_id: block_id.to_string(),
      });
    }
  }

  /// Ids of validators that are neither faulty nor slashed.
  pub fn active_ids(&self) -> Vec<usize> {
    self
      .validators
      .iter()
      .filter(|v| !v.faulty && !v.slashed)
      .map(|v| v.id)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_registry_has_no_faults_and_no_messages() {
    let reg = Registry::new(5);
    assert_eq!(reg.len(), 5);
    assert_eq!(reg.active_ids(), vec![0, 1, 2, 3, 4]);
    assert!(reg.get(0).unwrap().latest_message.is_none());
  }

  #[test]
  fn toggle_fault_flips_and_removes_from_active() {
    let mut reg = Registry::new(3);
    reg.toggle_fault(1).unwrap();
    assert!(reg.get(1).unwrap().faulty);
    assert_eq!(reg.active_ids(), vec![0, 2]);
    reg.toggle_fault(1).unwrap();
    assert!(!reg.get(1).unwrap().faulty);
  }

  #[test]
  fn toggle_fault_invalid_id() {
    let mut reg = Registry::new(3);
    assert_eq!(reg.toggle_fault(3), Err(EngineError::InvalidId(3)));
  }

  #[test]
  fn record_vote_sets_latest_message() {
    let mut reg = Registry::new(2);
    reg.record_vote(0, 4, "4:0");
    let msg = reg.get(0).unwrap().latest_message.as_ref().unwrap();
    assert_eq!(msg.slot, 4);
    assert_eq!(msg.block_id, "4:0");
  }
}
