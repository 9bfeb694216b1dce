//! Vizij Timeline Core (host-agnostic)
//!
//! Hierarchical tween/timeline scheduling: a tree of time-scoped nodes rooted
//! in a global timeline, driven by a lag-smoothed clock. Tweens interpolate
//! properties of weakly held targets; timelines sequence children with
//! labels and relative positions, and repeat/yoyo/reverse/rescale like any
//! other node. Conflicting tweens of the same property are resolved by the
//! overwrite protocol.

mod binding;
pub mod callbacks;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod ids;
mod node;
pub mod outputs;
pub mod position;
mod scratch;
pub mod target;
pub mod ticker;
pub mod vars;

// Re-exports for consumers (drivers and hosts)
pub use binding::lerp_f32;
pub use callbacks::CallbackKind;
pub use config::Config;
pub use easing::{EaseDir, Easing, UnknownEasing};
pub use engine::{Engine, NodeSnapshot};
pub use error::{TimelineError, TimelineResult};
pub use ids::{ListenerId, NodeId};
pub use node::{cycle_position, total_span, NodeKindTag};
pub use outputs::{EventKind, NodeEvent, Outputs};
pub use position::Position;
pub use target::{Animatable, PropertyMap, Target, TargetKey, CELL_PROPERTY};
pub use ticker::{ClockSource, ManualClock, SystemClock, Tick, Ticker, TickerConfig};
pub use vars::{
    Overwrite, PropSpec, PropValue, RelOp, Stagger, StaggerFrom, TimelineVars, Timing,
    TweenDefaults, TweenVars,
};
pub use vizij_api_core::{Value, ValueKind};
