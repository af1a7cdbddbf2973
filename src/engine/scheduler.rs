//! Vote scheduling: for every active validator, draws a delivery delay
//! and, for delayed votes, a coin flip between the new block and the
//! current head.

use rand::Rng;

use super::validator::Registry;
use super::vote::VoteEvent;

/// Schedules one [`VoteEvent`] per active validator for a newly produced
/// block `block_id` at `origin_slot`. `head` is the fork-choice head
/// observed at scheduling time (used as the delayed-vote's alternate
/// target).
pub fn schedule_votes_for_block(
  validators: &Registry,
  rng: &mut impl Rng,
  block_id: &str,
  origin_slot: u64,
  max_delay_slots: u64,
  head: &str,
) -> Vec<VoteEvent> {
  validators
    .active_ids()
    .into_iter()
    .map(|validator| {
      let delay = rng.gen_range(0..=max_delay_slots);
      let target = if delay == 0 {
        block_id
      } else if rng.gen_bool(0.5) {
        block_id
      } else {
        head
      };
      VoteEvent {
        deliver_slot: origin_slot + delay,
        validator,
        block_id: target.to_string(),
        origin_slot,
      }
    })
    .collect()
}
