//! LMD-GHOST head selection.
//!
//! A literal implementation recomputes `subtree(child)` and re-scans all
//! validators for every child at every step down the tree, which is
//! `O(B²)` on tree size. Instead we compute, in one reverse-preorder pass
//! over the whole tree, each block's subtree weight (count of validators
//! whose latest message falls inside it) and the maximum slot anywhere
//! in its subtree, then walk from genesis using those memoized values.
//! The result is identical to the naive definition; only the complexity
//! differs.

use std::collections::HashMap;

use super::block::{BlockTree, GENESIS_ID};
use super::validator::Registry;

struct SubtreeStats {
  weight: HashMap<String, usize>,
  max_slot: HashMap<String, u64>,
}

fn compute_stats(tree: &BlockTree, validators: &Registry) -> SubtreeStats {
  // Reverse-preorder = postorder for this purpose: a stack-based DFS
  // visits a node before any of its descendants, and explores an entire
  // subtree before moving to the next sibling, so reversing the visit
  // order guarantees every node appears after all of its descendants.
  let mut order = Vec::new();
  let mut stack = vec![GENESIS_ID.to_string()];
  while let Some(id) = stack.pop() {
    stack.extend(tree.children(&id).iter().cloned());
    order.push(id);
  }

  let mut direct_weight: HashMap<String, usize> = HashMap::new();
  for validator in validators.all() {
    // Faulty/slashed validators still count here: the filter applies at
    // vote production, not at fork-choice time.
    if let Some(msg) = &validator.latest_message {
      if tree.contains(&msg.block_id) {
        *direct_weight.entry(msg.block_id.clone()).or_insert(0) += 1;
      }
    }
  }

  let mut weight = HashMap::new();
  let mut max_slot = HashMap::new();
  for id in order.into_iter().rev() {
    let mut w = *direct_weight.get(&id).unwrap_or(&0);
    let mut m = tree.get(&id).map(|b| b.slot).unwrap_or(0);
    for child in tree.children(&id) {
      w += *weight.get(child).unwrap_or(&0);
      m = m.max(*max_slot.get(child).unwrap_or(&0));
    }
    weight.insert(id.clone(), w);
    max_slot.insert(id, m);
  }

  SubtreeStats { weight, max_slot }
}

/// Returns the canonical head, walking from `"genesis"` and at each step
/// selecting the child with maximal subtree weight, breaking ties by the
/// greatest maximum slot in the subtree, and finally by the deterministic
/// (insertion, slot-ascending) order of `children`.
pub fn head(tree: &BlockTree, validators: &Registry) -> String {
  let stats = compute_stats(tree, validators);
  let mut cur = GENESIS_ID.to_string();

  loop {
    let children = tree.children(&cur);
    if children.is_empty() {
      return cur;
    }

    let mut best = &children[0];
    let mut best_weight = *stats.weight.get(best).unwrap_or(&0);
    let mut best_max_slot = *stats.max_slot.get(best).unwrap_or(&0);

    for child in &children[1..] {
      let w = *stats.weight.get(child).unwrap_or(&0);
      let m = *stats.max_slot.get(child).unwrap_or(&0);
      if w > best_weight || (w == best_weight && m > best_max_slot) {
        best = child;
        best_weight = w;
        best_max_slot = m;
      }
    }

    cur = best.clone();
  }
}
