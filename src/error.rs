use std::fmt;

/// Failures that can propagate out of [`crate::Own::deep_copy`].
///
/// A failing clone hook aborts the whole copy transaction: partially-built
/// clones are released through ordinary `Drop`, the transaction's
/// correspondence map is discarded, and this error propagates out of the
/// outermost `deep_copy` call. Counter overflow is deliberately *not* a
/// variant here — it is treated as fatal and fail-fast (a `panic!`), since a
/// counter that has overflowed means the process is already in an
/// unrecoverable state.
#[derive(thiserror::Error, Debug)]
pub enum CloneError {
    /// A user-provided `clone_value`/`DeepClone` implementation reported a
    /// failure while duplicating one node of the graph.
    #[error("clone hook failed while duplicating object graph: {0}")]
    HookFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A clone hook failed with no structured cause to attach.
    #[error("clone hook failed while duplicating object graph: {0}")]
    HookFailedMessage(String),
}

impl CloneError {
    /// Convenience constructor for clone hooks that fail without a
    /// lower-level error to wrap.
    pub fn message(msg: impl fmt::Display) -> Self {
        CloneError::HookFailedMessage(msg.to_string())
    }

    /// Convenience constructor for clone hooks wrapping a concrete error.
    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CloneError::HookFailed(Box::new(err))
    }
}
