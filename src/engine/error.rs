use thiserror::Error;

/// Errors surfaced by the engine to external callers.
///
/// `UnknownParent` indicates an invariant violation and should never be
/// reachable from validated external input; it exists so
/// that a bug in orchestration fails loudly instead of leaving partial
/// state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
  #[error("validator id {0} is out of range")]
  InvalidId(usize),

  #[error("invalid configuration value for `{field}`: {reason}")]
  InvalidConfig { field: &'static str, reason: String },

  #[error("block {0} references unknown parent")]
  UnknownParent(String),
}
