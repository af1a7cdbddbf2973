//! Single Slot Finality quorum rule.

use super::block::BlockTree;
use super::metrics::Metrics;

/// If `block_id`'s vote count meets quorum and it is not already
/// finalized, marks it finalized and increments `total_finalizations`.
/// Otherwise a no-op. Once finalized, a block stays finalized even if
/// quorum is later lowered (finalization never transitions true→false).
pub fn try_finalize(tree: &mut BlockTree, metrics: &mut Metrics, block_id: &str, quorum: usize) {
  let Some(block) = tree.get_mut(block_id) else {
    return;
  };
  if block.finalized {
    return;
  }
  if block.votes_received.len() >= quorum {
    block.finalized = true;
    metrics.total_finalizations += 1;
  }
}

/// Runs `try_finalize` over every block currently in the tree. Narrowing
/// this to only the blocks touched this step would be a safe
/// optimization, but the full sweep keeps late-arriving votes on old
/// forks able to finalize them retroactively.
pub fn sweep(tree: &mut BlockTree, metrics: &mut Metrics, quorum: usize) {
  let ids: Vec<String> = tree.all_ids().map(str::to_string).collect();
  for id in ids {
    try_finalize(tree, metrics, &id, quorum);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::block::GENESIS_ID;

  #[test]
  fn finalizes_exactly_at_quorum_boundary() {
    let mut tree = BlockTree::new();
    let mut metrics = Metrics::default();
    let id = tree.add_block(1, GENESIS_ID, 0).unwrap();
    for v in 0..12 {
      tree.record_vote(&id, v);
    }
    try_finalize(&mut tree, &mut metrics, &id, 13);
    assert!(!tree.get(&id).unwrap().finalized);

    tree.record_vote(&id, 12);
    try_finalize(&mut tree, &mut metrics, &id, 13);
    assert!(tree.get(&id).unwrap().finalized);
    assert_eq!(metrics.total_finalizations, 1);
  }

  #[test]
  fn already_finalized_block_is_not_double_counted() {
    let mut tree = BlockTree::new();
    let mut metrics = Metrics::default();
    let id = tree.add_block(1, GENESIS_ID, 0).unwrap();
    for v in 0..13 {
      tree.record_vote(&id, v);
    }
    try_finalize(&mut tree, &mut metrics, &id, 13);
    try_finalize(&mut tree, &mut metrics, &id, 13);
    assert_eq!(metrics.total_finalizations, 1);
  }

  #[test]
  fn sweep_covers_every_block_including_old_ones() {
    let mut tree = BlockTree::new();
    let mut metrics = Metrics::default();
    let a = tree.add_block(1, GENESIS_ID, 0).unwrap();
    let b = tree.add_block(2, &a, 0).unwrap();
    for v in 0..13 {
      tree.record_vote(&a, v);
    }
    sweep(&mut tree, &mut metrics, 13);
    assert!(tree.get(&a).unwrap().finalized);
    assert!(!tree.get(&b).unwrap().finalized);
  }
}
