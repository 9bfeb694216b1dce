//! Engine: owns the node arena, the root timeline, the target index and the
//! global clock, and exposes the public API.
//!
//! Methods are grouped by concern:
//! - creation (this file): to, from, from_to, set, timeline, delayed_call,
//!   staggered tweens, and the `timeline_*` variants that place a child
//! - `render`: time propagation through tweens and timelines
//! - `playback`: play/pause/seek/retime and the getters
//! - `hierarchy`: add/remove, labels, positions, kill/revert
//! - `overwrite`: the target index and the overwrite protocol

mod hierarchy;
mod overwrite;
mod playback;
mod render;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::callbacks::{Callback, CallbackKind};
use crate::config::Config;
use crate::error::{TimelineError, TimelineResult};
use crate::ids::{Arena, IdAllocator, ListenerId, NodeId};
use crate::node::{Node, NodeKind, NodeKindTag, TimelineData, TweenData, TINY};
use crate::outputs::{EventKind, NodeEvent, Outputs};
use crate::position::Position;
use crate::scratch::Scratch;
use crate::target::Target;
use crate::ticker::{ClockSource, SystemClock, Tick, Ticker};
use crate::vars::{PropSpec, TimelineVars, Timing, TweenDefaults, TweenVars};

pub(crate) use overwrite::TargetIndex;

/// Serialisable view of a node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: NodeKindTag,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub total_duration: f64,
    pub time: f64,
    pub total_time: f64,
    pub progress: f64,
    pub cycle: u32,
    pub time_scale: f64,
    pub repeat: i32,
    pub repeat_delay: f64,
    pub yoyo: bool,
    pub paused: bool,
    pub reversed: bool,
    /// Animated property names (tweens only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    /// Labels sorted by time (timelines only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<(String, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[derive(Clone)]
enum TweenKind {
    To,
    From,
    FromTo(Vec<(String, PropSpec)>),
    Set,
}

/// Resolved insertion point: the parent timeline and the child's start
/// before its own delay.
#[derive(Copy, Clone, Debug)]
struct Slot {
    parent: NodeId,
    at: f64,
}

type Listener = Box<dyn FnMut(&Tick)>;

pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    nodes: Arena<Node>,
    root: NodeId,
    index: TargetIndex,
    scratch: Scratch,
    outputs: Outputs,
    ticker: Ticker,
    clock: Box<dyn ClockSource>,
    listeners: Vec<(ListenerId, Listener)>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("ticker", &self.ticker)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[inline]
pub(crate) fn clamp_total(total_time: f64, total_duration: f64) -> f64 {
    if total_time > total_duration - TINY && total_time >= 0.0 {
        total_duration
    } else if total_time < TINY {
        0.0
    } else {
        total_time
    }
}

impl Engine {
    /// Engine driven by the system clock.
    pub fn new(cfg: Config) -> Self {
        Self::with_clock(cfg, Box::new(SystemClock::new()))
    }

    pub fn with_clock(cfg: Config, clock: Box<dyn ClockSource>) -> Self {
        let mut nodes = Arena::default();
        let data = TimelineData {
            smooth_child_timing: true,
            auto_remove_children: true,
            ..TimelineData::default()
        };
        let mut root = Node::new(
            NodeKind::Timeline(Box::new(data)),
            0.0,
            &Timing::default(),
            false,
        );
        root.initialized = true;
        root.z_time = 0.0;
        let root = nodes.insert(root);
        Self {
            scratch: Scratch::new(&cfg),
            ticker: Ticker::new(cfg.ticker.clone()),
            cfg,
            ids: IdAllocator::new(),
            nodes,
            root,
            index: TargetIndex::default(),
            outputs: Outputs::default(),
            clock,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The root timeline every top-level node is placed in.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKindTag> {
        self.nodes.get(id).map(|n| {
            if n.is_timeline() {
                NodeKindTag::Timeline
            } else {
                NodeKindTag::Tween
            }
        })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    // ---------- per-call outputs ----------

    /// Events raised since the last `update` began.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn drain_events(&mut self) -> Vec<NodeEvent> {
        self.outputs.dropped_events = 0;
        std::mem::take(&mut self.outputs.events)
    }

    // ---------- clock ----------

    /// Advance the root timeline by `dt` seconds (scaled by the root's time
    /// scale) and return the events raised. Clears the previous outputs first.
    pub fn update(&mut self, dt: f64) -> &Outputs {
        self.outputs.clear();
        if !dt.is_finite() {
            log::warn!("ignoring non-finite update delta {dt}");
            return &self.outputs;
        }
        let root = self.root;
        let target = match self.nodes.get(root) {
            Some(r) if !r.paused => r.total_time + dt * r.time_scale,
            _ => return &self.outputs,
        };
        self.render_node(root, target, false, false);
        &self.outputs
    }

    /// Drive the engine from its clock source. `manual` supplies the frame
    /// timestamp in milliseconds instead, and forces a frame even when the
    /// fps cap says it is early or the clock is asleep.
    pub fn tick(&mut self, manual: Option<f64>) -> Option<Tick> {
        let now = manual.unwrap_or_else(|| self.clock.now_ms());
        if manual.is_some() {
            self.ticker.wake(now);
        }
        let tick = self.ticker.advance(now, manual.is_some())?;
        self.update(tick.delta);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&tick);
        }
        if self.ticker.idle_check_due() {
            if self.cfg.sweep_completed {
                self.sweep();
            }
            if !self.has_running_children() && self.listeners.is_empty() {
                self.ticker.sleep();
            }
        }
        Some(tick)
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn is_awake(&self) -> bool {
        self.ticker.is_awake()
    }

    /// Register a per-frame listener, called after the root advances.
    pub fn add_listener(&mut self, f: impl FnMut(&Tick) + 'static) -> ListenerId {
        let id = self.ids.alloc_listener();
        self.listeners.push((id, Box::new(f)));
        self.wake();
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub(crate) fn wake(&mut self) {
        if !self.ticker.is_awake() {
            let now = self.clock.now_ms();
            self.ticker.wake(now);
        }
    }

    fn has_running_children(&self) -> bool {
        self.nodes
            .get(self.root)
            .and_then(Node::timeline)
            .is_some_and(|tl| {
                tl.children
                    .iter()
                    .any(|c| self.nodes.get(*c).is_some_and(|n| !n.paused))
            })
    }

    /// Release every detached, finished node not marked as retained.
    /// Returns how many top-level nodes were released.
    pub fn sweep(&mut self) -> usize {
        let root = self.root;
        let doomed: Vec<NodeId> = self
            .nodes
            .ids()
            .filter(|id| {
                *id != root
                    && self
                        .nodes
                        .get(*id)
                        .is_some_and(|n| n.parent.is_none() && n.finished && !n.retained)
            })
            .collect();
        for id in &doomed {
            self.release(*id);
        }
        if !doomed.is_empty() {
            log::debug!("swept {} finished nodes", doomed.len());
        }
        doomed.len()
    }

    /// Keep (or stop keeping) a node alive after it finishes and is detached.
    pub fn retain(&mut self, id: NodeId, retained: bool) -> TimelineResult<()> {
        self.node_mut(id)?.retained = retained;
        Ok(())
    }

    // ---------- internal helpers ----------

    pub(crate) fn node(&self, id: NodeId) -> TimelineResult<&Node> {
        self.nodes.get(id).ok_or(TimelineError::NodeNotFound { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> TimelineResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or(TimelineError::NodeNotFound { id })
    }

    pub(crate) fn timeline_data(&self, id: NodeId) -> TimelineResult<&TimelineData> {
        self.node(id)?
            .timeline()
            .ok_or(TimelineError::NotATimeline { id })
    }

    pub(crate) fn timeline_data_mut(&mut self, id: NodeId) -> TimelineResult<&mut TimelineData> {
        self.node_mut(id)?
            .timeline_mut()
            .ok_or(TimelineError::NotATimeline { id })
    }

    pub(crate) fn not_root(&self, id: NodeId) -> TimelineResult<()> {
        if id == self.root {
            Err(TimelineError::RootTimeline)
        } else {
            Ok(())
        }
    }

    /// Mark `id` and its ancestors as changed so cached durations recompute.
    pub(crate) fn touch(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            match self.nodes.get_mut(c) {
                Some(n) => {
                    n.revision = n.revision.wrapping_add(1);
                    cur = n.parent;
                }
                None => break,
            }
        }
    }

    /// Total duration of `id`, recomputing a stale timeline first.
    pub(crate) fn refresh(&mut self, id: NodeId) -> f64 {
        let Some(node) = self.nodes.get(id) else {
            return 0.0;
        };
        let stale = node
            .timeline()
            .is_some_and(|tl| tl.stamp != Some(node.revision));
        if stale {
            self.recompute_timeline(id);
        }
        self.nodes.get(id).map_or(0.0, Node::total_duration)
    }

    fn recompute_timeline(&mut self, id: NodeId) {
        let mut children = self.scratch.take();
        if let Some(tl) = self.nodes.get(id).and_then(Node::timeline) {
            children.extend_from_slice(&tl.children);
        }
        let mut max_end = 0.0f64;
        let mut min_start = 0.0f64;
        for &c in &children {
            self.refresh(c);
            if let Some(cn) = self.nodes.get(c) {
                max_end = max_end.max(cn.end());
                min_start = min_start.min(cn.start);
            }
        }
        if min_start < 0.0 && id != self.root {
            self.normalize(id, &children, min_start);
            max_end -= min_start;
        }
        self.scratch.give_back(children);
        if let Some(node) = self.nodes.get_mut(id) {
            assert!(
                max_end >= 0.0,
                "timeline {id:?} has negative duration {max_end} after normalization"
            );
            node.duration = max_end;
            let revision = node.revision;
            if let Some(tl) = node.timeline_mut() {
                tl.stamp = Some(revision);
            }
        }
    }

    /// Shift children and labels right by `-min` so the earliest child starts
    /// at zero. Under a smooth (or no) parent the timeline itself moves left
    /// by the same amount so its content stays put on the parent's axis.
    fn normalize(&mut self, id: NodeId, children: &[NodeId], min: f64) {
        for &c in children {
            if let Some(cn) = self.nodes.get_mut(c) {
                cn.start -= min;
            }
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if let Some(tl) = node.timeline_mut() {
            for t in tl.labels.values_mut() {
                *t -= min;
            }
        }
        let parent = node.parent;
        let parent_smooth = parent
            .and_then(|p| self.nodes.get(p))
            .and_then(Node::timeline)
            .map_or(true, |tl| tl.smooth_child_timing);
        if parent_smooth {
            let Some(node) = self.nodes.get_mut(id) else {
                return;
            };
            node.start += min / node.abs_rate();
            node.time -= min;
            node.total_time -= min;
            let start = node.start;
            if let Some(p) = parent {
                self.place_child(p, id, start);
            }
        }
        log::trace!("normalized {id:?} by {}", -min);
    }

    /// Raise `kind` on `id`: record it in the outputs and run its callback.
    /// Suppressed events are dropped, except interrupts.
    pub(crate) fn emit(&mut self, id: NodeId, kind: EventKind, suppress: bool) {
        if (suppress && kind != EventKind::Interrupt) || id == self.root {
            return;
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let event = NodeEvent {
            node: id,
            kind,
            total_time: node.total_time,
        };
        let slot = CallbackKind::from(kind);
        if let Some(mut cb) = node.callbacks.slot_mut(slot).take() {
            cb(&event);
            if let Some(node) = self.nodes.get_mut(id) {
                let s = node.callbacks.slot_mut(slot);
                if s.is_none() {
                    *s = Some(cb);
                }
            }
        }
        self.outputs
            .push_event(event, self.cfg.max_events_per_tick);
    }

    /// Install or replace a lifecycle callback on an existing node.
    pub fn event_callback(
        &mut self,
        id: NodeId,
        kind: CallbackKind,
        f: impl FnMut(&NodeEvent) + 'static,
    ) -> TimelineResult<()> {
        let cb: Callback = Box::new(f);
        *self.node_mut(id)?.callbacks.slot_mut(kind) = Some(cb);
        Ok(())
    }

    pub fn clear_event_callback(&mut self, id: NodeId, kind: CallbackKind) -> TimelineResult<()> {
        *self.node_mut(id)?.callbacks.slot_mut(kind) = None;
        Ok(())
    }

    // ---------- creation ----------

    /// Tween `targets` from their current values to the values in `vars`.
    /// With a stagger and several targets this returns a wrapping timeline.
    pub fn to(&mut self, targets: impl IntoIterator<Item = Target>, vars: TweenVars) -> NodeId {
        self.create_root_tween(targets.into_iter().collect(), vars, TweenKind::To)
    }

    /// Tween from the values in `vars` to the targets' current values.
    pub fn from(&mut self, targets: impl IntoIterator<Item = Target>, vars: TweenVars) -> NodeId {
        self.create_root_tween(targets.into_iter().collect(), vars, TweenKind::From)
    }

    /// Tween between explicit start (`from`) and end (`to`) values. Timing
    /// and callbacks come from `to`.
    pub fn from_to(
        &mut self,
        targets: impl IntoIterator<Item = Target>,
        from: TweenVars,
        to: TweenVars,
    ) -> NodeId {
        self.create_root_tween(targets.into_iter().collect(), to, TweenKind::FromTo(from.props))
    }

    /// Zero-duration tween; applied immediately unless delayed.
    pub fn set(&mut self, targets: impl IntoIterator<Item = Target>, vars: TweenVars) -> NodeId {
        self.create_root_tween(targets.into_iter().collect(), vars, TweenKind::Set)
    }

    pub fn timeline(&mut self, vars: TimelineVars) -> NodeId {
        let slot = self.root_slot();
        self.create_timeline(vars, slot)
    }

    /// Call `f` once after `delay` seconds of root time.
    pub fn delayed_call(&mut self, delay: f64, f: impl FnMut(&NodeEvent) + 'static) -> NodeId {
        let vars = TweenVars::new().delay(delay).on_complete(f);
        self.create_root_tween(Vec::new(), vars, TweenKind::Set)
    }

    pub fn timeline_to(
        &mut self,
        tl: NodeId,
        targets: impl IntoIterator<Item = Target>,
        vars: TweenVars,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let slot = self.slot_in(tl, position.into())?;
        Ok(self.create_tween(targets.into_iter().collect(), vars, TweenKind::To, slot))
    }

    pub fn timeline_from(
        &mut self,
        tl: NodeId,
        targets: impl IntoIterator<Item = Target>,
        vars: TweenVars,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let slot = self.slot_in(tl, position.into())?;
        Ok(self.create_tween(targets.into_iter().collect(), vars, TweenKind::From, slot))
    }

    pub fn timeline_from_to(
        &mut self,
        tl: NodeId,
        targets: impl IntoIterator<Item = Target>,
        from: TweenVars,
        to: TweenVars,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let slot = self.slot_in(tl, position.into())?;
        let kind = TweenKind::FromTo(from.props);
        Ok(self.create_tween(targets.into_iter().collect(), to, kind, slot))
    }

    pub fn timeline_set(
        &mut self,
        tl: NodeId,
        targets: impl IntoIterator<Item = Target>,
        vars: TweenVars,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let slot = self.slot_in(tl, position.into())?;
        Ok(self.create_tween(targets.into_iter().collect(), vars, TweenKind::Set, slot))
    }

    /// Nested timeline created inside `tl`.
    pub fn timeline_in(
        &mut self,
        tl: NodeId,
        vars: TimelineVars,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let slot = self.slot_in(tl, position.into())?;
        Ok(self.create_timeline(vars, slot))
    }

    /// Zero-duration callback node inside `tl`.
    pub fn call(
        &mut self,
        tl: NodeId,
        f: impl FnMut(&NodeEvent) + 'static,
        position: impl Into<Position>,
    ) -> TimelineResult<NodeId> {
        let vars = TweenVars::new().on_complete(f);
        let slot = self.slot_in(tl, position.into())?;
        Ok(self.create_tween(Vec::new(), vars, TweenKind::Set, slot))
    }

    fn create_root_tween(&mut self, targets: Vec<Target>, vars: TweenVars, kind: TweenKind) -> NodeId {
        let slot = self.root_slot();
        self.create_tween(targets, vars, kind, slot)
    }

    fn root_slot(&self) -> Slot {
        let root = self.root;
        let at = self.nodes.get(root).map_or(0.0, |n| n.time);
        Slot { parent: root, at }
    }

    fn slot_in(&mut self, tl: NodeId, position: Position) -> TimelineResult<Slot> {
        let at = self.resolve_position(tl, &position)?;
        Ok(Slot { parent: tl, at })
    }

    fn create_tween(
        &mut self,
        targets: Vec<Target>,
        mut vars: TweenVars,
        kind: TweenKind,
        slot: Slot,
    ) -> NodeId {
        if targets.len() > 1 {
            if let Some(stagger) = vars.stagger.take() {
                return self.create_staggered(targets, vars, kind, stagger, slot);
            }
        }
        let defaults = if slot.parent == self.root {
            TweenDefaults::default()
        } else {
            self.nodes
                .get(slot.parent)
                .and_then(Node::timeline)
                .map(|data| data.defaults.clone())
                .unwrap_or_default()
        };
        let duration = match kind {
            TweenKind::Set => 0.0,
            _ => vars
                .duration
                .or(defaults.duration)
                .unwrap_or(self.cfg.default_duration),
        };
        let duration = if duration.is_finite() && duration >= 0.0 {
            duration
        } else {
            log::warn!("invalid tween duration {duration}; using 0");
            0.0
        };
        let immediate = vars.immediate_render.unwrap_or(match kind {
            TweenKind::To => false,
            TweenKind::From | TweenKind::FromTo(_) => true,
            TweenKind::Set => vars.timing.delay == 0.0,
        });
        let specs = build_specs(std::mem::take(&mut vars.props), kind);
        if targets.is_empty() && !specs.is_empty() {
            log::warn!("tween created without targets; it will animate nothing");
        }
        for t in targets.iter().filter(|t| !t.is_alive()) {
            log::warn!("tween target {:?} no longer exists", t.key());
        }
        let overwrite = vars.overwrite.unwrap_or(self.cfg.default_overwrite);
        let data = TweenData {
            targets,
            specs,
            bindings: Vec::new(),
            overwritten: Default::default(),
            originals: Vec::new(),
            ease: vars.ease.or(defaults.ease).unwrap_or(self.cfg.default_ease),
            yoyo_ease: vars.yoyo_ease,
            overwrite,
        };
        let mut node = Node::new(
            NodeKind::Tween(Box::new(data)),
            duration,
            &vars.timing,
            vars.repeat_refresh,
        );
        node.callbacks = std::mem::take(&mut vars.callbacks);
        let id = self.nodes.insert(node);
        self.register_targets(id);
        self.place(id, slot);
        if overwrite == crate::vars::Overwrite::All {
            self.overwrite_all(id);
        }
        if immediate {
            self.render_node(id, 0.0, duration > 0.0, true);
        }
        self.wake();
        id
    }

    fn create_staggered(
        &mut self,
        targets: Vec<Target>,
        vars: TweenVars,
        kind: TweenKind,
        mut stagger: crate::vars::Stagger,
        slot: Slot,
    ) -> NodeId {
        if !stagger.each.is_finite() || stagger.amount.is_some_and(|a| !a.is_finite()) {
            log::warn!("invalid stagger {stagger:?}; starting every target together");
            stagger = crate::vars::Stagger::default();
        }
        let TweenVars {
            props,
            duration,
            ease,
            yoyo_ease,
            timing,
            repeat_refresh,
            immediate_render,
            overwrite,
            callbacks,
            ..
        } = vars;
        let wrapper = TimelineVars {
            timing,
            repeat_refresh,
            callbacks,
            ..TimelineVars::default()
        };
        let tl = self.create_timeline(wrapper, slot);
        let count = targets.len();
        for (i, target) in targets.into_iter().enumerate() {
            let child = TweenVars {
                props: props.clone(),
                duration,
                ease,
                yoyo_ease,
                immediate_render,
                overwrite,
                ..TweenVars::default()
            };
            let offset = stagger.offset(i, count);
            let at = if offset.is_finite() { offset } else { 0.0 };
            self.create_tween(vec![target], child, kind.clone(), Slot { parent: tl, at });
        }
        tl
    }

    fn create_timeline(&mut self, vars: TimelineVars, slot: Slot) -> NodeId {
        let TimelineVars {
            timing,
            repeat_refresh,
            smooth_child_timing,
            auto_remove_children,
            defaults,
            callbacks,
        } = vars;
        let data = TimelineData {
            smooth_child_timing,
            auto_remove_children,
            defaults,
            ..TimelineData::default()
        };
        let mut node = Node::new(
            NodeKind::Timeline(Box::new(data)),
            0.0,
            &timing,
            repeat_refresh,
        );
        node.callbacks = callbacks;
        let id = self.nodes.insert(node);
        self.place(id, slot);
        self.wake();
        id
    }

    fn place(&mut self, id: NodeId, slot: Slot) {
        let delay = self.nodes.get(id).map_or(0.0, |n| n.delay);
        let mut start = slot.at + delay;
        if !start.is_finite() {
            log::warn!("start {start} of {id:?} is not finite; ignoring its delay");
            start = slot.at;
        }
        self.insert_child(slot.parent, id, start);
    }

    // ---------- introspection ----------

    pub fn snapshot(&mut self, id: NodeId) -> TimelineResult<NodeSnapshot> {
        self.node(id)?;
        self.refresh(id);
        let node = self.node(id)?;
        let mut snap = NodeSnapshot {
            id,
            kind: if node.is_timeline() {
                NodeKindTag::Timeline
            } else {
                NodeKindTag::Tween
            },
            start: node.start,
            end: node.end(),
            duration: node.duration,
            total_duration: node.total_duration(),
            time: node.time,
            total_time: node.total_time,
            progress: node.progress(),
            cycle: node.cycle,
            time_scale: node.time_scale,
            repeat: node.repeat,
            repeat_delay: node.repeat_delay,
            yoyo: node.yoyo,
            paused: node.paused,
            reversed: node.reversed,
            properties: Vec::new(),
            labels: Vec::new(),
            children: Vec::new(),
        };
        let children = match &node.kind {
            NodeKind::Tween(tw) => {
                snap.properties = tw.specs.iter().map(|(n, _)| n.clone()).collect();
                Vec::new()
            }
            NodeKind::Timeline(tl) => {
                let mut labels: Vec<(String, f64)> =
                    tl.labels.iter().map(|(k, v)| (k.clone(), *v)).collect();
                labels.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                snap.labels = labels;
                tl.children.clone()
            }
        };
        for c in children {
            snap.children.push(self.snapshot(c)?);
        }
        Ok(snap)
    }
}

/// Reduce a tween kind to per-property start/end specs.
fn build_specs(props: Vec<(String, PropSpec)>, kind: TweenKind) -> Vec<(String, PropSpec)> {
    match kind {
        TweenKind::To | TweenKind::Set => props,
        TweenKind::From => props
            .into_iter()
            .map(|(name, spec)| {
                let flipped = PropSpec {
                    start: spec.end,
                    end: None,
                    ease: spec.ease,
                };
                (name, flipped)
            })
            .collect(),
        TweenKind::FromTo(from) => {
            let mut out = props;
            for (name, spec) in out.iter_mut() {
                if let Some((_, f)) = from.iter().find(|(n, _)| n == name) {
                    spec.start = f.end.clone();
                }
            }
            for (name, f) in from {
                if !out.iter().any(|(n, _)| *n == name) {
                    out.push((
                        name,
                        PropSpec {
                            start: f.end,
                            end: None,
                            ease: f.ease,
                        },
                    ));
                }
            }
            out
        }
    }
}
