use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Runtime-tunable parameters of the simulation.
///
/// `num_validators` and `random_seed` are fixed at engine construction;
/// everything else can be read or written through the `config` facade
/// operation while the engine is running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
  pub num_validators: usize,
  pub slots_per_epoch: u64,
  pub quorum_ratio: f64,
  pub max_delay_slots: u64,
  pub fork_attack_prob: f64,
  pub random_seed: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      num_validators: 19,
      slots_per_epoch: 8,
      quorum_ratio: 2.0 / 3.0,
      max_delay_slots: 2,
      fork_attack_prob: 0.12,
      random_seed: 42,
    }
  }
}

impl Config {
  /// Validates the range constraints on each tunable. Called on
  /// construction and after every runtime patch.
  pub fn validate(&self) -> Result<(), EngineError> {
    if !(self.quorum_ratio > 0.0 && self.quorum_ratio <= 1.0) {
      return Err(EngineError::InvalidConfig {
        field: "quorum_ratio",
        reason: "must be in (0, 1]".into(),
      });
    }
    if self.max_delay_slots > 64 {
      return Err(EngineError::InvalidConfig {
        field: "max_delay_slots",
        reason: "must be in [0, 64]".into(),
      });
    }
    if !(0.0..=1.0).contains(&self.fork_attack_prob) {
      return Err(EngineError::InvalidConfig {
        field: "fork_attack_prob",
        reason: "must be in [0, 1]".into(),
      });
    }
    Ok(())
  }

  /// The number of votes a block needs to finalize: `⌈N · quorum_ratio⌉`.
  pub fn quorum(&self) -> usize {
    (self.num_validators as f64 * self.quorum_ratio).ceil() as usize
  }
}

/// Subset of [`Config`] that may be patched at runtime through the
/// `config` write operation. Fields left `None` are left unchanged.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
  pub max_delay_slots: Option<u64>,
  pub fork_attack_prob: Option<f64>,
  pub quorum_ratio: Option<f64>,
}

impl Config {
  /// Applies a patch, validating the resulting configuration before
  /// committing it. On error, `self` is left unchanged.
  pub fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), EngineError> {
    let mut next = *self;
    if let Some(v) = patch.max_delay_slots {
      next.max_delay_slots = v;
    }
    if let Some(v) = patch.fork_attack_prob {
      next.fork_attack_prob = v;
    }
    if let Some(v) = patch.quorum_ratio {
      next.quorum_ratio = v;
    }
    next.validate()?;
    *self = next;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_quorum_is_thirteen_of_nineteen() {
    let cfg = Config::default();
    assert_eq!(cfg.num_validators, 19);
    assert_eq!(cfg.quorum(), 13);
  }

  #[test]
  fn rejects_out_of_range_quorum_ratio() {
    let mut cfg = Config::default();
    assert!(cfg
      .apply_patch(ConfigPatch {
        quorum_ratio: Some(0.0),
        ..Default::default()
      })
      .is_err());
    // unchanged on error
    assert_eq!(cfg.quorum_ratio, Config::default().quorum_ratio);
  }

  #[test]
  fn rejects_out_of_range_delay() {
    let mut cfg = Config::default();
    assert!(cfg
      .apply_patch(ConfigPatch {
        max_delay_slots: Some(65),
        ..Default::default()
      })
      .is_err());
  }

  #[test]
  fn accepts_partial_patch() {
    let mut cfg = Config::default();
    cfg
      .apply_patch(ConfigPatch {
        fork_attack_prob: Some(1.0),
        ..Default::default()
      })
      .unwrap();
    assert_eq!(cfg.fork_attack_prob, 1.0);
    assert_eq!(cfg.max_delay_slots, Config::default().max_delay_slots);
  }
}
