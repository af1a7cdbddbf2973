use serde::Serialize;

/// Cumulative counters maintained across the lifetime of the engine.
/// Reset to zero on `reset`.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
  pub total_slots_simulated: u64,
  pub total_forks: u64,
  pub total_finalizations: u64,
}
