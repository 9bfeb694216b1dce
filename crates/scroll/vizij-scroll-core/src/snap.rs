use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SnapTo {
    /// Explicit progress values in `[0, 1]`.
    Points(Vec<f64>),
    /// Every multiple of the step, e.g. `0.25` snaps to quarters.
    Increment(f64),
}

/// Settle on the nearest snap point once scrolling has been idle for `delay`
/// seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snap {
    pub to: SnapTo,
    pub delay: f64,
}

impl Snap {
    pub const DEFAULT_DELAY: f64 = 0.1;

    pub fn points(points: impl Into<Vec<f64>>) -> Self {
        Self {
            to: SnapTo::Points(points.into()),
            delay: Self::DEFAULT_DELAY,
        }
    }

    pub fn increment(step: f64) -> Self {
        Self {
            to: SnapTo::Increment(step),
            delay: Self::DEFAULT_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Nearest snap progress. Falls back to `progress` when there is nothing
    /// to snap to.
    pub fn nearest(&self, progress: f64) -> f64 {
        match &self.to {
            SnapTo::Points(points) => points
                .iter()
                .copied()
                .filter(|p| p.is_finite())
                .min_by(|a, b| (a - progress).abs().total_cmp(&(b - progress).abs()))
                .unwrap_or(progress)
                .clamp(0.0, 1.0),
            SnapTo::Increment(step) if step.is_finite() && *step > 0.0 => {
                ((progress / step).round() * step).clamp(0.0, 1.0)
            }
            SnapTo::Increment(_) => progress,
        }
    }
}
