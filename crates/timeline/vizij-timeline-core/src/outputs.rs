//! Output contracts from the engine.
//!
//! Rendering writes property values straight to targets; what the caller
//! observes afterwards is the list of lifecycle events raised since the last
//! `Engine::update` (or drain).

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Lifecycle signal kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    Start,
    Update,
    Complete,
    /// Entered repeat cycle `cycle` (zero-based).
    Repeat { cycle: u32 },
    ReverseComplete,
    /// Killed before completion, or lost its last binding to an overwrite.
    Interrupt,
}

/// One lifecycle event raised by a node during rendering or a playback call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub node: NodeId,
    pub kind: EventKind,
    /// The node's total time when the event fired.
    pub total_time: f64,
}

/// Events collected by the engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<NodeEvent>,
    /// Events discarded because the buffer hit `Config::max_events_per_tick`.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped_events = 0;
    }

    #[inline]
    pub fn push_event(&mut self, event: NodeEvent, cap: usize) {
        if self.events.len() < cap {
            self.events.push(event);
        } else {
            self.dropped_events += 1;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events raised by `node`, in order.
    pub fn events_for(&self, node: NodeId) -> impl Iterator<Item = &NodeEvent> + '_ {
        self.events.iter().filter(move |e| e.node == node)
    }
}
