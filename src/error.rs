//! Error types.
//!
//! - [`ReactiveError`] - failures inside the reactive graph (cycles, disposed reads)
//! - [`RenderError`] - failures while a component renders
//! - [`SessionError`] - failures at the session boundary (inbound messages, handlers)

use thiserror::Error;

/// Errors raised by the reactive engine.
///
/// Cloneable so a failed [`Computed`](crate::reactive::Computed) can keep
/// reporting the error that produced it until the next successful run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// Batch nesting went past the configured depth bound.
    ///
    /// This is a depth bound rather than a proof of a cycle: a long enough
    /// chain of effects feeding each other trips it as well.
    #[error("cycle detected: batch nesting exceeded {limit} levels")]
    CycleDetected { limit: usize },

    /// A disposed computation was read.
    #[error("read of a disposed reactive node")]
    Disposed,

    /// `on_cleanup` was called outside any running computation.
    #[error("on_cleanup called outside a reactive computation")]
    NoReaction,

    /// A computation read itself while running.
    #[error("reactive node read itself while running")]
    Reentrant,

    /// A user body failed.
    #[error("{0}")]
    Failed(String),
}

impl ReactiveError {
    /// Build a [`ReactiveError::Failed`] from anything displayable.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Errors raised by component renders.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    #[error("render failed: {0}")]
    Failed(String),
}

/// Errors raised at the session boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An inbound callback addressed a handler id that is not registered.
    #[error("no handler registered for id {0}")]
    UnknownHandler(String),

    /// An inbound message parsed as JSON but has the wrong shape.
    #[error("malformed inbound message: {0}")]
    Malformed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    /// The patch consumer went away.
    #[error("session closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_limit() {
        let err = ReactiveError::CycleDetected { limit: 50 };
        assert_eq!(err.to_string(), "cycle detected: batch nesting exceeded 50 levels");
    }

    #[test]
    fn test_render_error_wraps_reactive() {
        let err: RenderError = ReactiveError::Disposed.into();
        assert!(matches!(err, RenderError::Reactive(ReactiveError::Disposed)));
        assert_eq!(err.to_string(), "read of a disposed reactive node");
    }

    #[test]
    fn test_session_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err: SessionError = json_err.into();
        assert!(matches!(err, SessionError::Json(_)));
    }
}
