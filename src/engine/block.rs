//! The block tree: an arena of blocks keyed by opaque id, with an
//! auxiliary parent→children index so lookups don't require scanning
//! every block in the arena.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::error::EngineError;

pub const GENESIS_ID: &str = "genesis";

/// A single block in the tree.
///
/// `votes_received` is a set: duplicate deliveries are silently
/// idempotent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
  pub id: String,
  pub slot: u64,
  pub parent: String,
  pub proposer: Option<usize>,
  pub votes_received: HashSet<usize>,
  pub finalized: bool,
}

/// Stores blocks keyed by opaque id; tracks parent/children and per-slot
/// buckets; supports multiple blocks per slot (forks).
#[derive(Debug, Clone)]
pub struct BlockTree {
  blocks: HashMap<String, Block>,
  children: HashMap<String, Vec<String>>,
  blocks_in_slot: HashMap<u64, Vec<String>>,
}

impl BlockTree {
  /// A fresh tree containing only the genesis block: slot 0, no parent,
  /// no proposer, empty votes, already finalized.
  pub fn new() -> Self {
    let genesis = Block {
      id: GENESIS_ID.to_string(),
      slot: 0,
      parent: String::new(),
      proposer: None,
      votes_received: HashSet::new(),
      finalized: true,
    };

    let mut blocks = HashMap::new();
    blocks.insert(GENESIS_ID.to_string(), genesis);

    let mut blocks_in_slot = HashMap::new();
    blocks_in_slot.insert(0, vec![GENESIS_ID.to_string()]);

    Self {
      blocks,
      children: HashMap::new(),
      blocks_in_slot,
    }
  }

  pub fn contains(&self, id: &str) -> bool {
    self.blocks.contains_key(id)
  }

  pub fn get(&self, id: &str) -> Option<&Block> {
    self.blocks.get(id)
  }

  /// Inserts a new block at `slot` under `parent_id`. Allocates
  /// `index = |blocks_in_slot[slot]|` and forms id `"{slot}:{index}"`.
  ///
  /// Fails with `UnknownParent` if `parent_id` is neither `"genesis"` nor
  /// an existing id.
  pub fn add_block(
    &mut self,
    slot: u64,
    parent_id: &str,
    proposer: usize,
  ) -> Result<String, EngineError> {
    if !self.contains(parent_id) {
      return Err(EngineError::UnknownParent(parent_id.to_string()));
    }

    let index = self.blocks_in_slot.get(&slot).map_or(0, |v| v.len());
    let id = format!("{slot}:{index}");

    let block = Block {
      id: id.clone(),
      slot,
      parent: parent_id.to_string(),
      proposer: Some(proposer),
      votes_received: HashSet::new(),
      finalized: false,
    };

    self.blocks.insert(id.clone(), block);
    self
      .blocks_in_slot
      .entry(slot)
      .or_default()
      .push(id.clone());
    self
      .children
      .entry(parent_id.to_string())
      .or_default()
      .push(id.clone());

    Ok(id)
  }

  /// Direct children of `id`, in insertion order (deterministic: slots
  /// ascending, insertion order within a slot).
  pub fn children(&self, id: &str) -> &[String] {
    self.children.get(id).map_or(&[], |v| v.as_slice())
  }

  /// `root` plus all descendants. Traversal order is unspecified; the
  /// result is a set.
  pub fn subtree(&self, root: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut stack = vec![root.to_string()];
    while let Some(id) = stack.pop() {
      if !out.insert(id.clone()) {
        continue;
      }
      stack.extend(self.children(&id).iter().cloned());
    }
    out
  }

  /// From `id` up to genesis, inclusive, newest-first.
  pub fn ancestors(&self, id: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = id.to_string();
    loop {
      let Some(block) = self.blocks.get(&cur) else {
        break;
      };
      out.push(cur.clone());
      if cur == GENESIS_ID {
        break;
      }
      cur = block.parent.clone();
    }
    out
  }

  /// Adds `validator_id` to a block's `votes_received`.
  pub fn record_vote(&mut self, block_id: &str, validator_id: usize) {
    if let Some(block) = self.blocks.get_mut(block_id) {
      block.votes_received.insert(validator_id);
    }
  }

  /// All block ids, grouped by slot, in ascending-slot order. Used by the
  /// finalization sweep and by `status`.
  pub fn blocks_in_slot(&self) -> &HashMap<u64, Vec<String>> {
    &self.blocks_in_slot
  }

  pub fn all_ids(&self) -> impl Iterator<Item = &str> {
    self.blocks.keys().map(String::as_str)
  }

  pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
    self.blocks.get_mut(id)
  }

  /// The id with the greatest `(slot, id)` lexicographic pair across the
  /// entire tree, used to remap a vote whose original target has been
  /// pruned or never existed. The tree always contains at least genesis,
  /// so this never returns `None`.
  pub fn latest_by_slot_then_id(&self) -> &str {
    self
      .blocks
      .values()
      .max_by(|a, b| (a.slot, &a.id).cmp(&(b.slot, &b.id)))
      .map(|b| b.id.as_str())
      .unwrap_or(GENESIS_ID)
  }
}

impl Default for BlockTree {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn genesis_is_preseeded_and_finalized() {
    let tree = BlockTree::new();
    let genesis = tree.get(GENESIS_ID).unwrap();
    assert_eq!(genesis.slot, 0);
    assert!(genesis.finalized);
    assert!(genesis.votes_received.is_empty());
  }

  #[test]
  fn add_block_allocates_sequential_index_per_slot() {
    let mut tree = BlockTree::new();
    let a = tree.add_block(1, GENESIS_ID, 0).unwrap();
    let b = tree.add_block(1, GENESIS_ID, 1).unwrap();
    assert_eq!(a, "1:0");
    assert_eq!(b, "1:1");
    assert_eq!(tree.children(GENESIS_ID), &[a, b]);
  }

  #[test]
  fn add_block_unknown_parent_errors() {
    let mut tree = BlockTree::new();
    assert_eq!(
      tree.add_block(1, "nope", 0),
      Err(EngineError::UnknownParent("nope".to_string()))
    );
  }

  #[test]
  fn subtree_includes_root_and_descendants_only() {
    let mut tree = BlockTree::new();
    let a = tree.add_block(1, GENESIS_ID, 0).unwrap();
    let b = tree.add_block(1, GENESIS_ID, 1).unwrap();
    let a1 = tree.add_block(2, &a, 0).unwrap();

    let sub = tree.subtree(&a);
    assert!(sub.contains(&a));
    assert!(sub.contains(&a1));
    assert!(!sub.contains(&b));
  }

  #[test]
  fn ancestors_walk_to_genesis_newest_first() {
    let mut tree = BlockTree::new();
    let a = tree.add_block(1, GENESIS_ID, 0).unwrap();
    let a1 = tree.add_block(2, &a, 0).unwrap();
    assert_eq!(
      tree.ancestors(&a1),
      vec![a1.clone(), a.clone(), GENESIS_ID.to_string()]
    );
  }

  #[test]
  fn record_vote_on_unknown_block_is_a_noop() {
    let mut tree = BlockTree::new();
    tree.record_vote("does-not-exist", 0);
    assert!(!tree.contains("does-not-exist"));
  }

  #[test]
  fn latest_by_slot_then_id_prefers_highest_slot() {
    let mut tree = BlockTree::new();
    tree.add_block(1, GENESIS_ID, 0).unwrap();
    let b2 = tree.add_block(2, GENESIS_ID, 0).unwrap();
    assert_eq!(tree.latest_by_slot_then_id(), b2);
  }
}
