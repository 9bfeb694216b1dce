//! Error types for the timeline engine.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Errors returned by engine operations that take a node handle or a
/// caller-supplied number. Configuration problems that only affect a single
/// property binding are logged instead (see `log::warn!` call sites).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineError {
    /// Handle is unknown or refers to a node that was killed
    #[error("Node not found: {id:?}")]
    NodeNotFound { id: NodeId },

    /// Operation requires a timeline
    #[error("Node {id:?} is not a timeline")]
    NotATimeline { id: NodeId },

    /// Adding the child would make a node its own ancestor
    #[error("Cannot add {child:?} to {parent:?}: the parent is inside the child")]
    CyclicParent { parent: NodeId, child: NodeId },

    /// The engine's root timeline cannot be reparented, killed, or seeked directly
    #[error("Operation not allowed on the root timeline")]
    RootTimeline,

    /// Invalid time value
    #[error("Invalid time value: {time}")]
    InvalidTime { time: f64 },

    /// Invalid duration
    #[error("Invalid duration: {duration}")]
    InvalidDuration { duration: f64 },

    /// Label lookup failed
    #[error("Label not found: {label}")]
    LabelNotFound { label: String },

    /// Position string could not be parsed
    #[error("Invalid position {input:?}: {reason}")]
    InvalidPosition { input: String, reason: String },

    /// Configuration could not be parsed
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

pub type TimelineResult<T> = Result<T, TimelineError>;

/// Reject NaN and infinities for caller-supplied times.
#[inline]
pub(crate) fn check_time(time: f64) -> TimelineResult<f64> {
    if time.is_finite() {
        Ok(time)
    } else {
        Err(TimelineError::InvalidTime { time })
    }
}
