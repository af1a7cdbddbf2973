//! Read-only DTOs returned by the external interface facade.
//!
//! These are plain, tagged records rather than anything that reaches
//! back into engine internals: the `status` operation must hand callers
//! a deep, read-only snapshot, never a live reference.

use std::collections::HashMap;

use serde::Serialize;

use crate::engine::{Engine, LatestMessage, MetricsSnapshot, VoteEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
  pub id: String,
  pub slot: u64,
  pub parent: String,
  pub finalized: bool,
  pub votes_count: usize,
  pub proposer: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorView {
  pub id: usize,
  pub faulty: bool,
  pub slashed: bool,
  pub latest_message: Option<LatestMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVoteView {
  pub deliver_slot: u64,
  pub validator: usize,
  pub block_id: String,
}

impl From<&VoteEvent> for PendingVoteView {
  fn from(event: &VoteEvent) -> Self {
    Self {
      deliver_slot: event.deliver_slot,
      validator: event.validator,
      block_id: event.block_id.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
  pub current_slot: u64,
  pub current_epoch: u64,
  pub validators: Vec<ValidatorView>,
  pub chain: HashMap<String, BlockView>,
  pub blocks_in_slot: HashMap<u64, Vec<String>>,
  pub head: String,
  pub pending_votes: Vec<PendingVoteView>,
  pub metrics: MetricsSnapshot,
}

/// Builds a deep, read-only snapshot of the engine for the `status`
/// facade operation.
pub fn status_view(engine: &Engine) -> StatusView {
  let chain = engine
    .tree()
    .all_ids()
    .map(|id| {
      let block = engine.tree().get(id).expect("id came from all_ids");
      (
        id.to_string(),
        BlockView {
          id: block.id.clone(),
          slot: block.slot,
          parent: block.parent.clone(),
          finalized: block.finalized,
          votes_count: block.votes_received.len(),
          proposer: block.proposer,
        },
      )
    })
    .collect();

  let validators = engine
    .registry()
    .all()
    .iter()
    .map(|v| ValidatorView {
      id: v.id,
      faulty: v.faulty,
      slashed: v.slashed,
      latest_message: v.latest_message.clone(),
    })
    .collect();

  StatusView {
    current_slot: engine.current_slot(),
    current_epoch: engine.current_epoch(),
    validators,
    chain,
    blocks_in_slot: engine.tree().blocks_in_slot().clone(),
    head: engine.head(),
    pending_votes: engine.pending_votes().map(PendingVoteView::from).collect(),
    metrics: engine.metrics_snapshot(),
  }
}
