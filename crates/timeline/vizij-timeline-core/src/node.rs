//! Animation nodes: shared clock state plus the tween/timeline payloads.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use vizij_api_core::Value;

use crate::binding::PropertyBinding;
use crate::callbacks::Callbacks;
use crate::easing::Easing;
use crate::ids::NodeId;
use crate::target::{Target, TargetKey};
use crate::vars::{Overwrite, PropSpec, Timing, TweenDefaults};

/// Smallest meaningful time step; guards divisions by a zero time scale and
/// end-of-range comparisons.
pub(crate) const TINY: f64 = 1e-8;

/// Cycle count standing in for "repeat forever".
pub(crate) const INFINITE_REPEAT: f64 = 1e8;

/// Span of `repeat + 1` cycles separated by `repeat_delay`.
pub fn total_span(duration: f64, repeat: i32, repeat_delay: f64) -> f64 {
    let repeats = if repeat < 0 {
        INFINITE_REPEAT
    } else {
        f64::from(repeat)
    };
    duration * (repeats + 1.0) + repeat_delay * repeats
}

/// Split a total time into (time within the cycle, zero-based cycle index).
///
/// An exact cycle boundary belongs to the end of the earlier cycle. Time spent
/// in a repeat delay holds the cycle's end. Odd cycles under `yoyo` run
/// backward.
pub fn cycle_position(
    total_time: f64,
    duration: f64,
    repeat: i32,
    repeat_delay: f64,
    yoyo: bool,
) -> (f64, u32) {
    if duration <= 0.0 && repeat_delay <= 0.0 {
        return (0.0, 0);
    }
    let total = total_span(duration, repeat, repeat_delay);
    let odd = |c: u32| yoyo && c % 2 == 1;
    if total_time >= total {
        let cycle = if repeat < 0 {
            INFINITE_REPEAT as u32
        } else {
            repeat as u32
        };
        let time = if odd(cycle) { 0.0 } else { duration };
        return (time, cycle);
    }
    if total_time <= 0.0 {
        return (0.0, 0);
    }
    let cycle_len = duration + repeat_delay;
    let mut cycle = (total_time / cycle_len).floor();
    let mut time = total_time - cycle * cycle_len;
    if time <= 0.0 && cycle > 0.0 {
        cycle -= 1.0;
        time = cycle_len;
    }
    let time = time.min(duration);
    let cycle = cycle as u32;
    if odd(cycle) {
        (duration - time, cycle)
    } else {
        (time, cycle)
    }
}

/// Leaf payload: what to animate and the live bindings.
#[derive(Debug)]
pub(crate) struct TweenData {
    pub targets: Vec<Target>,
    pub specs: Vec<(String, PropSpec)>,
    pub bindings: Vec<PropertyBinding>,
    /// (target, property) pairs taken over by newer tweens; skipped on re-init.
    pub overwritten: HashSet<(TargetKey, String)>,
    /// Values held by the targets before the first render, for `revert`.
    pub originals: Vec<(Target, String, Value)>,
    pub ease: Easing,
    pub yoyo_ease: Option<Easing>,
    pub overwrite: Overwrite,
}

impl TweenData {
    pub fn has_binding(&self, key: TargetKey, property: &str) -> bool {
        self.bindings.iter().any(|b| b.matches(key, property))
    }
}

/// Composite payload: ordered children and labels.
#[derive(Debug, Default)]
pub(crate) struct TimelineData {
    /// Sorted by start time; ties keep insertion order.
    pub children: Vec<NodeId>,
    pub labels: HashMap<String, f64>,
    pub smooth_child_timing: bool,
    pub auto_remove_children: bool,
    pub defaults: TweenDefaults,
    /// Bumped on every change to `children`; a dispatch restarts when it moves.
    pub structure: u64,
    pub last_added: Option<NodeId>,
    /// `revision` value the cached duration was computed at.
    pub stamp: Option<u64>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Tween(Box<TweenData>),
    Timeline(Box<TimelineData>),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Start offset on the parent's time axis.
    pub start: f64,
    pub delay: f64,
    /// One cycle. Cached for timelines (see `TimelineData::stamp`).
    pub duration: f64,
    pub repeat: i32,
    pub repeat_delay: f64,
    pub yoyo: bool,
    pub repeat_refresh: bool,
    pub time_scale: f64,
    pub reversed: bool,
    pub paused: bool,
    pub time: f64,
    pub total_time: f64,
    /// Raw total time of the previous render (may be negative).
    pub z_time: f64,
    pub cycle: u32,
    /// Linear progress within the cycle as of the last render.
    pub ratio: f64,
    pub initialized: bool,
    /// Reached an end and was detached by its parent.
    pub finished: bool,
    pub retained: bool,
    pub revision: u64,
    pub callbacks: Callbacks,
}

fn finite_or(value: f64, fallback: f64, what: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("invalid {what} {value}; using {fallback}");
        fallback
    }
}

impl Node {
    pub fn new(kind: NodeKind, duration: f64, timing: &Timing, repeat_refresh: bool) -> Self {
        Self {
            kind,
            parent: None,
            start: 0.0,
            delay: finite_or(timing.delay, 0.0, "delay"),
            duration: duration.max(0.0),
            repeat: timing.repeat,
            repeat_delay: finite_or(timing.repeat_delay, 0.0, "repeat delay"),
            yoyo: timing.yoyo,
            repeat_refresh,
            time_scale: finite_or(timing.time_scale, 1.0, "time scale"),
            reversed: timing.reversed,
            paused: timing.paused,
            time: 0.0,
            total_time: 0.0,
            z_time: -TINY,
            cycle: 0,
            ratio: 0.0,
            initialized: false,
            finished: false,
            retained: false,
            revision: 0,
            callbacks: Callbacks::default(),
        }
    }

    /// Signed rate: time scale, negated when reversed.
    #[inline]
    pub fn rts(&self) -> f64 {
        if self.reversed {
            -self.time_scale
        } else {
            self.time_scale
        }
    }

    /// Absolute rate, never below TINY.
    #[inline]
    pub fn abs_rate(&self) -> f64 {
        self.time_scale.abs().max(TINY)
    }

    /// Total duration from the cached one-cycle duration.
    #[inline]
    pub fn total_duration(&self) -> f64 {
        total_span(self.duration, self.repeat, self.repeat_delay)
    }

    /// End offset on the parent's axis.
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.total_duration() / self.abs_rate()
    }

    /// Map a parent-local time to this node's total time.
    #[inline]
    pub fn parent_to_child(&self, parent_time: f64) -> f64 {
        let rts = self.rts();
        if rts > 0.0 {
            (parent_time - self.start) * rts
        } else {
            self.total_duration() + (parent_time - self.start) * rts
        }
    }

    pub fn is_timeline(&self) -> bool {
        matches!(self.kind, NodeKind::Timeline(_))
    }

    pub fn tween(&self) -> Option<&TweenData> {
        match &self.kind {
            NodeKind::Tween(t) => Some(t),
            NodeKind::Timeline(_) => None,
        }
    }

    pub fn tween_mut(&mut self) -> Option<&mut TweenData> {
        match &mut self.kind {
            NodeKind::Tween(t) => Some(t),
            NodeKind::Timeline(_) => None,
        }
    }

    pub fn timeline(&self) -> Option<&TimelineData> {
        match &self.kind {
            NodeKind::Timeline(t) => Some(t),
            NodeKind::Tween(_) => None,
        }
    }

    pub fn timeline_mut(&mut self) -> Option<&mut TimelineData> {
        match &mut self.kind {
            NodeKind::Timeline(t) => Some(t),
            NodeKind::Tween(_) => None,
        }
    }

    /// Progress within the current cycle.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.time / self.duration).clamp(0.0, 1.0)
        } else {
            self.ratio
        }
    }

    pub fn total_progress(&self) -> f64 {
        let total = self.total_duration();
        if total > 0.0 {
            (self.total_time / total).clamp(0.0, 1.0)
        } else {
            self.ratio
        }
    }
}

/// Kind tag exposed through snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindTag {
    Tween,
    Timeline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_includes_repeat_delays() {
        assert_eq!(total_span(1.0, 0, 0.5), 1.0);
        assert_eq!(total_span(1.0, 2, 0.5), 4.0);
        assert!(total_span(1.0, -1, 0.0) >= INFINITE_REPEAT);
    }

    #[test]
    fn boundary_belongs_to_previous_cycle() {
        assert_eq!(cycle_position(1.0, 1.0, 3, 0.0, false), (1.0, 0));
        assert_eq!(cycle_position(1.25, 1.0, 3, 0.0, false), (0.25, 1));
        assert_eq!(cycle_position(4.0, 1.0, 3, 0.0, false), (1.0, 3));
    }

    #[test]
    fn yoyo_odd_cycles_run_backward() {
        assert_eq!(cycle_position(1.25, 1.0, 3, 0.0, true), (0.75, 1));
        assert_eq!(cycle_position(2.5, 1.0, 3, 0.0, true), (0.5, 2));
        // repeat 3 ends on cycle 3, which is odd: back at zero.
        assert_eq!(cycle_position(4.0, 1.0, 3, 0.0, true), (0.0, 3));
    }

    #[test]
    fn repeat_delay_holds_the_cycle_end() {
        assert_eq!(cycle_position(1.2, 1.0, 1, 0.5, false), (1.0, 0));
        assert_eq!(cycle_position(1.75, 1.0, 1, 0.5, false), (0.25, 1));
    }
}
