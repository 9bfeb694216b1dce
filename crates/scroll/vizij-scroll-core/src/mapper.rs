//! Scroll progress mapper: turns a scroll position into per-region progress
//! and drives linked animation nodes through the engine's playback API.

use std::fmt;

use serde::{Deserialize, Serialize};
use vizij_timeline_core::{Engine, NodeId, TimelineError};

use crate::edge::{Edge, Layout};
use crate::error::{check_scroll, ScrollError, ScrollResult};
use crate::snap::Snap;
use crate::state::{Crossing, ScrollState, ToggleActions};

/// Below this the smoothed scrub progress jumps to its target.
const SCRUB_EPSILON: f64 = 1e-4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// How region progress reaches an animation.
pub enum Link {
    None,
    /// Seek the node to `progress * total_duration`.
    Seek(NodeId),
    /// Set the node's total progress directly; smoothed when the region has a
    /// scrub lag.
    TotalProgress(NodeId),
    Callback(Box<dyn FnMut(f64)>),
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::None => write!(f, "None"),
            Link::Seek(id) => f.debug_tuple("Seek").field(id).finish(),
            Link::TotalProgress(id) => f.debug_tuple("TotalProgress").field(id).finish(),
            Link::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl Link {
    fn node(&self) -> Option<NodeId> {
        match self {
            Link::Seek(id) | Link::TotalProgress(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScrollEvent {
    State { from: ScrollState, to: ScrollState },
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
    Toggle { active: bool },
    Update { progress: f64 },
    Pin { pinned: bool },
    /// The host should scroll to `scroll` to land on the snap point.
    Snap { progress: f64, scroll: f64 },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ScrollCallbackKind {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
    Update,
    Toggle,
    Pin,
    Snap,
}

impl ScrollEvent {
    pub fn callback_kind(&self) -> Option<ScrollCallbackKind> {
        Some(match self {
            ScrollEvent::State { .. } => return None,
            ScrollEvent::Enter => ScrollCallbackKind::Enter,
            ScrollEvent::Leave => ScrollCallbackKind::Leave,
            ScrollEvent::EnterBack => ScrollCallbackKind::EnterBack,
            ScrollEvent::LeaveBack => ScrollCallbackKind::LeaveBack,
            ScrollEvent::Toggle { .. } => ScrollCallbackKind::Toggle,
            ScrollEvent::Update { .. } => ScrollCallbackKind::Update,
            ScrollEvent::Pin { .. } => ScrollCallbackKind::Pin,
            ScrollEvent::Snap { .. } => ScrollCallbackKind::Snap,
        })
    }

    fn from_crossing(crossing: Crossing) -> Self {
        match crossing {
            Crossing::Enter => ScrollEvent::Enter,
            Crossing::Leave => ScrollEvent::Leave,
            Crossing::EnterBack => ScrollEvent::EnterBack,
            Crossing::LeaveBack => ScrollEvent::LeaveBack,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionEvent {
    pub region: RegionId,
    pub event: ScrollEvent,
}

/// A failure contained at one region; the other regions still updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionError {
    pub region: RegionId,
    pub error: ScrollError,
}

/// Events produced by the last `update`/`tick`/`refresh` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScrollOutputs {
    pub events: Vec<RegionEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RegionError>,
}

impl ScrollOutputs {
    pub fn clear(&mut self) {
        self.events.clear();
        self.errors.clear();
    }

    pub fn for_region(&self, id: RegionId) -> impl Iterator<Item = &ScrollEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.region == id)
            .map(|e| &e.event)
    }
}

type ScrollCallback = Box<dyn FnMut(&ScrollEvent)>;

/// Builder for a scroll region.
pub struct RegionConfig {
    start: Edge,
    end: Edge,
    layout: Layout,
    link: Link,
    toggle: Option<(NodeId, ToggleActions)>,
    scrub_lag: Option<f64>,
    pin_spacing: Option<bool>,
    snap: Option<Snap>,
    callbacks: Vec<(ScrollCallbackKind, ScrollCallback)>,
}

impl fmt::Debug for RegionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionConfig")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("layout", &self.layout)
            .field("link", &self.link)
            .field("toggle", &self.toggle)
            .field("scrub_lag", &self.scrub_lag)
            .field("pin_spacing", &self.pin_spacing)
            .field("snap", &self.snap)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl RegionConfig {
    pub fn new(start: impl Into<Edge>, end: impl Into<Edge>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            layout: Layout::default(),
            link: Link::None,
            toggle: None,
            scrub_lag: None,
            pin_spacing: None,
            snap: None,
            callbacks: Vec::new(),
        }
    }

    /// Parse both edges, e.g. `RegionConfig::parse("top bottom", "+=500")`.
    pub fn parse(start: &str, end: &str) -> ScrollResult<Self> {
        Ok(Self::new(start.parse::<Edge>()?, end.parse::<Edge>()?))
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        self.link = link;
        self
    }

    pub fn on_progress(self, f: impl FnMut(f64) + 'static) -> Self {
        self.link(Link::Callback(Box::new(f)))
    }

    pub fn toggle_actions(mut self, node: NodeId, actions: ToggleActions) -> Self {
        self.toggle = Some((node, actions));
        self
    }

    /// Smooth `Link::TotalProgress` so it catches up over roughly `lag`
    /// seconds of `ScrollMapper::tick`.
    pub fn scrub(mut self, lag: f64) -> Self {
        self.scrub_lag = (lag.is_finite() && lag > 0.0).then_some(lag);
        self
    }

    /// Pin the element while the region is active. With `spacing`, the
    /// region's length is reported by `ScrollMapper::pin_spacing`.
    pub fn pin(mut self, spacing: bool) -> Self {
        self.pin_spacing = Some(spacing);
        self
    }

    pub fn snap(mut self, snap: Snap) -> Self {
        self.snap = Some(snap);
        self
    }

    pub fn on(mut self, kind: ScrollCallbackKind, f: impl FnMut(&ScrollEvent) + 'static) -> Self {
        self.callbacks.push((kind, Box::new(f)));
        self
    }
}

#[derive(Debug)]
struct Region {
    id: RegionId,
    cfg: RegionConfig,
    start: f64,
    end: f64,
    state: ScrollState,
    progress: f64,
    /// Progress last written to a scrubbed node.
    shown: f64,
    updated: bool,
    idle: f64,
    snap_pending: bool,
}

impl Region {
    fn resolve_edges(&mut self) {
        let start = self.cfg.start.resolve(&self.cfg.layout, None);
        let mut end = self.cfg.end.resolve(&self.cfg.layout, Some(start));
        if end < start {
            log::warn!(
                "scroll region {:?}: end {end} is before start {start}; using a zero-length window",
                self.id
            );
            end = start;
        }
        self.start = start;
        self.end = end;
    }

    fn progress_at(&self, scroll: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if scroll >= self.end { 1.0 } else { 0.0 };
        }
        ((scroll - self.start) / span).clamp(0.0, 1.0)
    }

    fn emit(&mut self, event: ScrollEvent, out: &mut ScrollOutputs) {
        if let Some(kind) = event.callback_kind() {
            for (k, f) in self.cfg.callbacks.iter_mut() {
                if *k == kind {
                    f(&event);
                }
            }
        }
        out.events.push(RegionEvent {
            region: self.id,
            event,
        });
    }

    /// Log and record a failed engine call. A linked node that no longer
    /// exists is dropped from the region.
    fn contain(&mut self, err: ScrollError, out: &mut ScrollOutputs) {
        log::warn!("scroll region {:?}: {err}", self.id);
        if let ScrollError::Timeline(TimelineError::NodeNotFound { id }) = &err {
            if self.cfg.link.node() == Some(*id) {
                log::warn!("scroll region {:?}: linked node {id:?} is gone; unlinking", self.id);
                self.cfg.link = Link::None;
            }
            if self.cfg.toggle.is_some_and(|(node, _)| node == *id) {
                self.cfg.toggle = None;
            }
        }
        out.errors.push(RegionError {
            region: self.id,
            error: err,
        });
    }

    fn update(&mut self, engine: &mut Engine, scroll: f64, out: &mut ScrollOutputs) {
        let prev = self.state;
        let next = prev.next(scroll, self.start, self.end);
        let progress = self.progress_at(scroll);
        self.state = next;

        if next != prev {
            log::debug!("scroll region {:?}: {prev:?} -> {next:?}", self.id);
            self.emit(ScrollEvent::State { from: prev, to: next }, out);
            for &crossing in Crossing::between(prev, next) {
                self.emit(ScrollEvent::from_crossing(crossing), out);
                let active = crossing.activates();
                self.emit(ScrollEvent::Toggle { active }, out);
                if self.cfg.pin_spacing.is_some() {
                    self.emit(ScrollEvent::Pin { pinned: active }, out);
                }
                if let Some((node, actions)) = self.cfg.toggle {
                    if let Err(err) = actions.for_crossing(crossing).apply(engine, node) {
                        self.contain(err.into(), out);
                    }
                }
            }
        }

        let changed = !self.updated || progress != self.progress;
        self.updated = true;
        self.progress = progress;
        if changed {
            self.emit(ScrollEvent::Update { progress }, out);
            if let Err(err) = self.drive(engine) {
                self.contain(err, out);
            }
        }

        if self.cfg.snap.is_some() {
            self.idle = 0.0;
            self.snap_pending = next.is_inside();
        }
    }

    fn drive(&mut self, engine: &mut Engine) -> ScrollResult<()> {
        let progress = self.progress;
        match &mut self.cfg.link {
            Link::None => {}
            Link::Seek(node) => {
                let node = *node;
                let total = engine
                    .total_duration(node)
                    .ok_or(TimelineError::NodeNotFound { id: node })?;
                engine.seek(node, progress * total, false)?;
            }
            Link::TotalProgress(node) => {
                if self.cfg.scrub_lag.is_none() {
                    engine.set_total_progress(*node, progress, false)?;
                    self.shown = progress;
                }
            }
            Link::Callback(f) => f(progress),
        }
        Ok(())
    }

    fn tick(&mut self, engine: &mut Engine, dt: f64, out: &mut ScrollOutputs) {
        if let (Link::TotalProgress(node), Some(lag)) = (&self.cfg.link, self.cfg.scrub_lag) {
            let node = *node;
            if self.shown != self.progress {
                let alpha = (dt / lag).min(1.0);
                self.shown += (self.progress - self.shown) * alpha;
                if (self.progress - self.shown).abs() < SCRUB_EPSILON {
                    self.shown = self.progress;
                }
                if let Err(err) = engine.set_total_progress(node, self.shown, false) {
                    self.contain(err.into(), out);
                }
            }
        }

        if !self.snap_pending {
            return;
        }
        let Some(snap) = &self.cfg.snap else {
            return;
        };
        self.idle += dt;
        if self.idle < snap.delay {
            return;
        }
        self.snap_pending = false;
        let target = snap.nearest(self.progress);
        if (target - self.progress).abs() > f64::EPSILON {
            let scroll = self.start + target * (self.end - self.start);
            self.emit(ScrollEvent::Snap { progress: target, scroll }, out);
        }
    }
}

/// Maps a scroll position onto any number of regions.
///
/// The mapper does not own the engine: every call that may touch a linked
/// node takes `&mut Engine`, so the host keeps driving `Engine::update` for
/// everything else.
#[derive(Debug, Default)]
pub struct ScrollMapper {
    regions: Vec<Region>,
    next_id: u32,
    scroll: Option<f64>,
    outputs: ScrollOutputs,
}

impl ScrollMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region. Nodes linked by seek or total progress are paused
    /// so the engine clock does not also advance them.
    pub fn add(&mut self, engine: &mut Engine, cfg: RegionConfig) -> ScrollResult<RegionId> {
        if let Some(node) = cfg.link.node() {
            engine.pause(node)?;
        }
        if let Some(lag) = cfg.scrub_lag {
            if !matches!(cfg.link, Link::TotalProgress(_)) {
                log::warn!("scrub lag {lag} only applies to total progress links; ignoring");
            }
        }
        let id = RegionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let mut region = Region {
            id,
            cfg,
            start: 0.0,
            end: 0.0,
            state: ScrollState::Before,
            progress: 0.0,
            shown: 0.0,
            updated: false,
            idle: 0.0,
            snap_pending: false,
        };
        region.resolve_edges();
        self.regions.push(region);
        Ok(id)
    }

    pub fn remove(&mut self, id: RegionId) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.id != id);
        self.regions.len() != before
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Feed a new scroll position. A region whose engine call fails is
    /// reported in [`ScrollOutputs::errors`]; the other regions still update.
    pub fn update(&mut self, engine: &mut Engine, scroll: f64) -> ScrollResult<&ScrollOutputs> {
        let scroll = check_scroll(scroll)?;
        self.outputs.clear();
        self.scroll = Some(scroll);
        for region in self.regions.iter_mut() {
            region.update(engine, scroll, &mut self.outputs);
        }
        Ok(&self.outputs)
    }

    /// Advance time-based behavior: scrub smoothing and idle snapping.
    pub fn tick(&mut self, engine: &mut Engine, dt: f64) -> ScrollResult<&ScrollOutputs> {
        let dt = check_scroll(dt)?.max(0.0);
        self.outputs.clear();
        for region in self.regions.iter_mut() {
            region.tick(engine, dt, &mut self.outputs);
        }
        Ok(&self.outputs)
    }

    /// Recompute a region's pixel window for new geometry and re-apply the
    /// last scroll position.
    pub fn refresh(
        &mut self,
        engine: &mut Engine,
        id: RegionId,
        layout: Layout,
    ) -> ScrollResult<&ScrollOutputs> {
        self.outputs.clear();
        let scroll = self.scroll;
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ScrollError::RegionNotFound { id })?;
        region.cfg.layout = layout;
        region.resolve_edges();
        if let Some(scroll) = scroll {
            region.update(engine, scroll, &mut self.outputs);
        }
        Ok(&self.outputs)
    }

    /// Re-resolve every region after a viewport resize. Element geometry is
    /// kept; only the viewport height changes.
    pub fn refresh_viewport(
        &mut self,
        engine: &mut Engine,
        viewport_height: f64,
    ) -> ScrollResult<&ScrollOutputs> {
        let viewport_height = check_scroll(viewport_height)?;
        self.outputs.clear();
        for region in self.regions.iter_mut() {
            region.cfg.layout.viewport_height = viewport_height;
            region.resolve_edges();
            if let Some(scroll) = self.scroll {
                region.update(engine, scroll, &mut self.outputs);
            }
        }
        Ok(&self.outputs)
    }

    pub fn outputs(&self) -> &ScrollOutputs {
        &self.outputs
    }

    pub fn scroll(&self) -> Option<f64> {
        self.scroll
    }

    fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn progress(&self, id: RegionId) -> Option<f64> {
        self.region(id).map(|r| r.progress)
    }

    pub fn state(&self, id: RegionId) -> Option<ScrollState> {
        self.region(id).map(|r| r.state)
    }

    pub fn is_active(&self, id: RegionId) -> Option<bool> {
        self.region(id).map(|r| r.state.is_inside())
    }

    /// Resolved `(start, end)` in scroll pixels.
    pub fn window(&self, id: RegionId) -> Option<(f64, f64)> {
        self.region(id).map(|r| (r.start, r.end))
    }

    /// Extra scroll length a pinned region with spacing adds to the page.
    pub fn pin_spacing(&self, id: RegionId) -> Option<f64> {
        self.region(id).map(|r| match r.cfg.pin_spacing {
            Some(true) => r.end - r.start,
            _ => 0.0,
        })
    }
}
