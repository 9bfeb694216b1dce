use serde::{Deserialize, Serialize};
use thiserror::Error;
use vizij_timeline_core::TimelineError;

use crate::RegionId;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ScrollError {
    /// Start/end edge string could not be parsed
    #[error("Invalid edge {input:?}: {reason}")]
    InvalidEdge { input: String, reason: String },

    /// Toggle action list could not be parsed
    #[error("Invalid toggle actions {input:?}: {reason}")]
    InvalidToggleActions { input: String, reason: String },

    /// Scroll positions and deltas must be finite
    #[error("Invalid scroll value: {value}")]
    InvalidScroll { value: f64 },

    /// Region handle is unknown
    #[error("Region not found: {id:?}")]
    RegionNotFound { id: RegionId },

    /// The linked animation node rejected a playback call
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

pub type ScrollResult<T> = Result<T, ScrollError>;

pub(crate) fn check_scroll(value: f64) -> ScrollResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScrollError::InvalidScroll { value })
    }
}
