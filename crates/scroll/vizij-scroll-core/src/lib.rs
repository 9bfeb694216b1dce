//! vizij-scroll-core: maps a scroll position onto progress regions and links
//! them to `vizij-timeline-core` animation nodes.
//!
//! ```no_run
//! use vizij_scroll_core::{Link, RegionConfig, ScrollMapper};
//! use vizij_timeline_core::{Config, Engine, TimelineVars};
//!
//! let mut engine = Engine::new(Config::default());
//! let tl = engine.timeline(TimelineVars::default());
//! let mut mapper = ScrollMapper::new();
//! let region = mapper
//!     .add(&mut engine, RegionConfig::new(100.0, 300.0).link(Link::Seek(tl)))
//!     .unwrap();
//! mapper.update(&mut engine, 200.0).unwrap();
//! assert_eq!(mapper.progress(region), Some(0.5));
//! ```

pub mod edge;
pub mod error;
pub mod mapper;
pub mod snap;
pub mod state;

pub use edge::{Anchor, Edge, Layout};
pub use error::{ScrollError, ScrollResult};
pub use mapper::{
    Link, RegionConfig, RegionError, RegionEvent, RegionId, ScrollCallbackKind, ScrollEvent,
    ScrollMapper, ScrollOutputs,
};
pub use snap::{Snap, SnapTo};
pub use state::{Crossing, ScrollState, ToggleAction, ToggleActions};
