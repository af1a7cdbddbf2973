//! The consensus simulation engine: block tree, latest-message table,
//! delayed vote-delivery queue, LMD-GHOST head selection, and the SSF
//! quorum/finalization rule, driven one logical slot at a time by
//! [`Engine::step`].
//!
//! All mutation goes through `&mut Engine`; the surrounding facade (see
//! `crate::api`) wraps a single instance in a `Mutex` so that every
//! externally reachable operation is serialized and individually atomic.

mod block;
mod config;
mod error;
mod finality;
mod forkchoice;
mod metrics;
mod scheduler;
mod validator;
mod vote;

pub use block::{Block, BlockTree, GENESIS_ID};
pub use config::{Config, ConfigPatch};
pub use error::EngineError;
pub use metrics::Metrics;
pub use validator::{LatestMessage, Registry, Validator};
pub use vote::VoteEvent;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// The outcome of a single [`Engine::step`] call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
  pub slot: u64,
  pub created: Vec<String>,
  pub applied_votes: Vec<AppliedVote>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedVote {
  pub validator: usize,
  pub block_id: String,
}

/// Owns every piece of global, process-wide engine state: the validator
/// registry, block tree, vote queue, counters, config, and the single
/// seeded RNG threaded through every random draw.
pub struct Engine {
  config: Config,
  registry: Registry,
  tree: BlockTree,
  queue: vote::VoteQueue,
  metrics: Metrics,
  current_slot: u64,
  rng: ChaCha8Rng,
}

impl Engine {
  /// Builds a fresh engine: `config.num_validators` validators, a tree
  /// containing only genesis, an empty vote queue, zeroed metrics, slot
  /// 0, and the RNG seeded from `config.random_seed`.
  pub fn new(config: Config) -> Result<Self, EngineError> {
    config.validate()?;
    Ok(Self {
      registry: Registry::new(config.num_validators),
      tree: BlockTree::new(),
      queue: vote::VoteQueue::new(),
      metrics: Metrics::default(),
      current_slot: 0,
      rng: ChaCha8Rng::seed_from_u64(config.random_seed),
      config,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn metrics(&self) -> &Metrics {
    &self.metrics
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  pub fn tree(&self) -> &BlockTree {
    &self.tree
  }

  pub fn pending_votes(&self) -> impl Iterator<Item = &VoteEvent> {
    self.queue.pending()
  }

  pub fn current_slot(&self) -> u64 {
    self.current_slot
  }

  /// `floor(current_slot / slots_per_epoch)`, derived rather than stored.
  pub fn current_epoch(&self) -> u64 {
    self.current_slot / self.config.slots_per_epoch
  }

  /// The canonical head under LMD-GHOST. Two consecutive calls with no
  /// intervening mutation return the same block.
  pub fn head(&self) -> String {
    forkchoice::head(&self.tree, &self.registry)
  }

  /// Flips a validator's `faulty` flag.
  pub fn toggle_fault(&mut self, id: usize) -> Result<&Validator, EngineError> {
    let validator = self.registry.toggle_fault(id)?;
    info!(validator = id, faulty = validator.faulty, "toggled fault flag");
    Ok(validator)
  }

  /// Applies a runtime config patch. Leaves the config unchanged if the
  /// patch would violate the range constraints.
  pub fn update_config(&mut self, patch: ConfigPatch) -> Result<Config, EngineError> {
    self.config.apply_patch(patch)?;
    debug!(?patch, "applied config patch");
    Ok(self.config)
  }

  /// Aggregate metrics for the `metrics` facade operation.
  pub fn metrics_snapshot(&self) -> MetricsSnapshot {
    let total_blocks = self.tree.all_ids().count();
    let total_finalized = self
      .tree
      .all_ids()
      .filter(|id| self.tree.get(id).map_or(false, |b| b.finalized))
      .count();
    let total_votes: usize = self
      .tree
      .all_ids()
      .map(|id| self.tree.get(id).map_or(0, |b| b.votes_received.len()))
      .sum();
    let avg_votes_per_block = if total_blocks == 0 {
      0.0
    } else {
      total_votes as f64 / total_blocks as f64
    };

    MetricsSnapshot {
      current_slot: self.current_slot,
      total_blocks,
      total_finalized,
      avg_votes_per_block,
      total_forks: self.metrics.total_forks,
      total_slots_simulated: self.metrics.total_slots_simulated,
      total_finalizations: self.metrics.total_finalizations,
    }
  }

  /// Resets engine state to a freshly initialized engine with the same
  /// configuration.
  pub fn reset(&mut self) {
    *self = Self::new(self.config).expect("config was already valid");
    info!("engine reset");
  }

  /// Advances logical time by one slot, executing nine sub-steps in a
  /// fixed order. No sub-step may be reordered: later steps depend on
  /// earlier side effects (vote delivery before head computation, block
  /// creation before vote scheduling).
  pub fn step(&mut self, attack_mode: bool) -> StepOutcome {
    // 1. advance slot, update derived counters.
    self.current_slot += 1;
    self.metrics.total_slots_simulated += 1;

    // 2. drain and apply votes that are due as of the new slot.
    let mut applied_votes = self.drain_and_apply();

    // 3. pick a proposer uniformly from the full validator set.
    let proposer = if self.registry.is_empty() {
      0
    } else {
      self.rng.gen_range(0..self.registry.len())
    };

    // 4. compute the fork-choice parent.
    let parent = self.head();

    // 5. insert one block, or a fork-attack sibling set.
    let created = self.produce_blocks(attack_mode, &parent, proposer);

    // 6. schedule votes for every newly created block.
    let head_at_scheduling = self.head();
    for block_id in &created {
      let events = scheduler::schedule_votes_for_block(
        &self.registry,
        &mut self.rng,
        block_id,
        self.current_slot,
        self.config.max_delay_slots,
        &head_at_scheduling,
      );
      for event in events {
        self.queue.enqueue(event);
      }
    }

    // 7. drain and apply zero-delay votes just scheduled.
    applied_votes.extend(self.drain_and_apply());

    // 8. finalization sweep over every block in the tree.
    let quorum = self.config.quorum();
    finality::sweep(&mut self.tree, &mut self.metrics, quorum);

    debug!(
      slot = self.current_slot,
      created = created.len(),
      applied = applied_votes.len(),
      "completed step"
    );

    StepOutcome {
      slot: self.current_slot,
      created,
      applied_votes,
    }
  }

  /// Runs `slots` successive attack-mode steps.
  pub fn simulate_attack(&mut self, slots: u64) -> Vec<StepOutcome> {
    (0..slots).map(|_| self.step(true)).collect()
  }

  /// Drains due votes, remaps any event whose target no longer exists,
  /// and applies the remaining ones to the registry and block tree.
  fn drain_and_apply(&mut self) -> Vec<AppliedVote> {
    let due = self.queue.drain_due(self.current_slot);
    due
      .into_iter()
      .map(|event| {
        let block_id = if self.tree.contains(&event.block_id) {
          event.block_id
        } else {
          warn!(
            original = event.block_id,
            "vote targeted unknown block, remapping"
          );
          self.tree.latest_by_slot_then_id().to_string()
        };
        self.registry.record_vote(event.validator, self.current_slot, &block_id);
        self.tree.record_vote(&block_id, event.validator);
        AppliedVote {
          validator: event.validator,
          block_id,
        }
      })
      .collect()
  }

  /// Inserts either a single block under `parent`, or — in attack mode,
  /// with probability `fork_attack_prob` — between one and three
  /// sibling blocks, all in the current slot.
  fn produce_blocks(&mut self, attack_mode: bool, parent: &str, proposer: usize) -> Vec<String> {
    let fork = attack_mode && self.rng.gen_bool(self.config.fork_attack_prob);
    let count = if fork { self.rng.gen_range(1..=3) } else { 1 };

    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
      match self.tree.add_block(self.current_slot, parent, proposer) {
        Ok(id) => created.push(id),
        Err(e) => {
          // An invariant violation: `parent` came from `self.head()`,
          // which only ever returns an id already in the tree.
          error!(error = %e, "fork-choice head resolved to an unknown block");
          panic!("internal invariant violated: {e}");
        }
      }
    }

    if count > 1 {
      self.metrics.total_forks += (count - 1) as u64;
    }

    created
  }
}

/// `metrics` facade response shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
  pub current_slot: u64,
  pub total_blocks: usize,
  pub total_finalized: usize,
  pub avg_votes_per_block: f64,
  pub total_forks: u64,
  pub total_slots_simulated: u64,
  pub total_finalizations: u64,
}
