//! Integration tests driving the engine end-to-end through its public
//! API, covering cross-step invariants and the determinism property
//! that a single module's unit tests can't exercise on their own.

use ssf_sim::engine::{Config, Engine, GENESIS_ID};

fn run_mixed_sequence(config: Config) -> Engine {
  let mut engine = Engine::new(config).unwrap();
  engine.step(false);
  engine.toggle_fault(2).unwrap();
  engine.step(true);
  engine.step(true);
  engine.toggle_fault(2).unwrap();
  engine.step(false);
  engine
}

#[test]
fn determinism_given_fixed_seed_and_call_sequence() {
  let config = Config {
    fork_attack_prob: 0.5,
    max_delay_slots: 2,
    ..Default::default()
  };

  let a = run_mixed_sequence(config);
  let b = run_mixed_sequence(config);

  assert_eq!(a.current_slot(), b.current_slot());
  assert_eq!(a.head(), b.head());
  assert_eq!(a.metrics().total_forks, b.metrics().total_forks);
  assert_eq!(
    a.metrics().total_finalizations,
    b.metrics().total_finalizations
  );

  let pending_a: Vec<_> = a.pending_votes().cloned().collect();
  let pending_b: Vec<_> = b.pending_votes().cloned().collect();
  assert_eq!(pending_a, pending_b);

  for id in a.tree().all_ids() {
    let ba = a.tree().get(id).unwrap();
    let bb = b.tree().get(id).unwrap();
    assert_eq!(ba.votes_received, bb.votes_received);
    assert_eq!(ba.finalized, bb.finalized);
  }
}

#[test]
fn quorum_boundary_at_nineteen_validators_two_thirds() {
  let config = Config::default();
  assert_eq!(config.num_validators, 19);
  assert_eq!(config.quorum(), 13);
}

#[test]
fn universal_invariants_hold_across_many_mixed_steps() {
  let config = Config {
    fork_attack_prob: 0.3,
    max_delay_slots: 3,
    ..Default::default()
  };
  let mut engine = Engine::new(config).unwrap();

  let mut previously_finalized = std::collections::HashSet::new();

  for slot in 1..=25u64 {
    let attack = slot % 4 == 0;
    engine.step(attack);

    assert_eq!(engine.current_slot(), slot);
    assert_eq!(engine.metrics().total_slots_simulated, slot);

    for id in engine.tree().all_ids() {
      let block = engine.tree().get(id).unwrap();
      assert!(
        block.parent == GENESIS_ID || engine.tree().contains(&block.parent),
        "block {id} has a dangling parent"
      );
      assert!(block.votes_received.len() <= config.num_validators);

      if previously_finalized.contains(id) {
        assert!(block.finalized, "block {id} un-finalized itself");
      }
      if block.finalized {
        previously_finalized.insert(id.to_string());
      }
    }

    for validator in engine.registry().all() {
      if let Some(msg) = &validator.latest_message {
        assert!(
          engine.tree().contains(&msg.block_id),
          "validator {} points at unknown block {}",
          validator.id,
          msg.block_id
        );
      }
    }
  }
}

#[test]
fn head_is_stable_across_repeated_reads() {
  let mut engine = Engine::new(Config::default()).unwrap();
  engine.step(false);
  engine.step(true);
  assert_eq!(engine.head(), engine.head());
}

#[test]
fn reset_restores_post_init_state() {
  let config = Config::default();
  let mut engine = Engine::new(config).unwrap();
  engine.step(false);
  engine.step(true);
  engine.toggle_fault(0).unwrap();

  engine.reset();

  let fresh = Engine::new(config).unwrap();
  assert_eq!(engine.current_slot(), fresh.current_slot());
  assert_eq!(engine.head(), fresh.head());
  assert_eq!(engine.metrics().total_slots_simulated, 0);
  assert_eq!(engine.tree().all_ids().count(), 1);
  assert!(!engine.registry().get(0).unwrap().faulty);
}
