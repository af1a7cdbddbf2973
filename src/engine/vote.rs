//! Time-indexed queue of pending vote deliveries.

use serde::Serialize;
use std::collections::VecDeque;

/// A vote scheduled to be delivered at `deliver_slot`. Created when a
/// vote is scheduled after block production; consumed when drained;
/// never mutated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
  pub deliver_slot: u64,
  pub validator: usize,
  pub block_id: String,
  pub origin_slot: u64,
}

/// FIFO queue of pending vote deliveries. `drain_due` removes and
/// returns entries whose `deliver_slot` has arrived, in insertion order
/// among equal deliver-slots — the queue must be stable.
#[derive(Debug, Default, Clone)]
pub struct VoteQueue {
  pending: VecDeque<VoteEvent>,
}

impl VoteQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn enqueue(&mut self, event: VoteEvent) {
    self.pending.push_back(event);
  }

  /// Removes and returns every event with `deliver_slot <= current_slot`,
  /// preserving FIFO order among the survivors and among the drained
  /// entries.
  pub fn drain_due(&mut self, current_slot: u64) -> Vec<VoteEvent> {
    let mut due = Vec::new();
    let mut remaining = VecDeque::with_capacity(self.pending.len());
    for event in self.pending.drain(..) {
      if event.deliver_slot <= current_slot {
        due.push(event);
      } else {
        remaining.push_back(event);
      }
    }
    self.pending = remaining;
    due
  }

  /// Read-only snapshot for telemetry (`status`'s `pending_votes`).
  pub fn pending(&self) -> impl Iterator<Item = &VoteEvent> {
    self.pending.iter()
  }

  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }
}
