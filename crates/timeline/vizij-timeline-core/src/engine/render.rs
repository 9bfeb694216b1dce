//! Time propagation: tween and timeline rendering.
//!
//! A render takes a node's *total* time (all repeat cycles), reduces it to a
//! cycle time, applies bindings or dispatches children, and raises lifecycle
//! events. Parents map their local time into each child's total time with
//! `Node::parent_to_child`.

use super::{clamp_total, Engine};
use crate::binding::PropertyBinding;
use crate::ids::NodeId;
use crate::node::{cycle_position, Node};
use crate::outputs::EventKind;
use crate::vars::Overwrite;

/// A dispatch that keeps restarting is a structural bug, not a busy frame.
const MAX_DISPATCH_RESTARTS: u32 = 10_000;

impl Engine {
    pub(crate) fn render_node(&mut self, id: NodeId, total_time: f64, suppress: bool, force: bool) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.is_timeline() {
            self.render_timeline(id, total_time, suppress, force);
        } else {
            self.render_tween(id, total_time, suppress, force);
        }
    }

    fn render_tween(&mut self, id: NodeId, total_time: f64, suppress: bool, force: bool) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let tdur = node.total_duration();
        if tdur <= 0.0 {
            self.render_instant(id, total_time, suppress, force);
            return;
        }
        let first = !node.initialized;
        if first && total_time < 0.0 && !force {
            self.set_z_time(id, total_time);
            return;
        }
        let tt = clamp_total(total_time, tdur);
        let prev_total = node.total_time;
        if tt == prev_total && !first && !force {
            self.set_z_time(id, total_time);
            return;
        }
        let dur = node.duration;
        let prev_cycle = node.cycle;
        let (time, cycle) = if node.repeat != 0 {
            cycle_position(tt, dur, node.repeat, node.repeat_delay, node.yoyo)
        } else {
            (tt.min(dur), 0)
        };
        let refresh_on_repeat = node.repeat_refresh && !node.yoyo;

        if first {
            self.init_tween(id);
        }
        let cycle_changed = !first && cycle != prev_cycle;
        if cycle_changed && refresh_on_repeat {
            // Finish the old cycle, then capture starts from where it left off.
            let old_end = if cycle > prev_cycle { 1.0 } else { 0.0 };
            self.apply_tween(id, old_end, prev_cycle);
            self.clear_bindings(id);
            self.init_tween(id);
        }

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let linear = if dur > 0.0 { time / dur } else { 1.0 };
        node.time = time;
        node.total_time = tt;
        node.cycle = cycle;
        node.z_time = total_time;
        node.ratio = linear;
        self.apply_tween(id, linear, cycle);

        if prev_total == 0.0 && tt > 0.0 {
            self.emit(id, EventKind::Start, suppress);
        }
        if cycle_changed {
            self.emit(id, EventKind::Repeat { cycle }, suppress);
        }
        self.emit(id, EventKind::Update, suppress);
        if tt == tdur && prev_total != tdur {
            self.emit(id, EventKind::Complete, suppress);
        } else if tt == 0.0 && prev_total > 0.0 {
            self.emit(id, EventKind::ReverseComplete, suppress);
        }
    }

    /// Zero-duration tweens: fully applied at any non-negative time, reverted
    /// before zero. At exactly zero the side the playhead came from decides.
    fn render_instant(&mut self, id: NodeId, total_time: f64, suppress: bool, force: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let first = !node.initialized;
        if first && total_time < 0.0 && !force {
            node.z_time = total_time;
            return;
        }
        let prev_z = node.z_time;
        let prev_ratio = node.ratio;
        let ratio = if total_time > 0.0 {
            1.0
        } else if total_time < 0.0 || prev_z > 0.0 {
            0.0
        } else if prev_z < 0.0 || first {
            1.0
        } else {
            prev_ratio
        };
        node.z_time = total_time;
        if ratio == prev_ratio && !first && !force {
            return;
        }
        if first {
            self.init_tween(id);
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.ratio = ratio;
        node.time = 0.0;
        node.total_time = 0.0;
        self.apply_tween(id, ratio, 0);

        if ratio == 1.0 && (first || prev_ratio == 0.0) {
            self.emit(id, EventKind::Start, suppress);
            self.emit(id, EventKind::Update, suppress);
            self.emit(id, EventKind::Complete, suppress);
        } else if ratio == 0.0 && !first && prev_ratio == 1.0 {
            self.emit(id, EventKind::Update, suppress);
            self.emit(id, EventKind::ReverseComplete, suppress);
        }
    }

    fn set_z_time(&mut self, id: NodeId, total_time: f64) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.z_time = total_time;
        }
    }

    /// Evaluate the ease for `linear` progress and write every binding.
    pub(crate) fn apply_tween(&self, id: NodeId, linear: f64, cycle: u32) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let Some(tw) = node.tween() else {
            return;
        };
        let ease = if node.yoyo && cycle % 2 == 1 {
            tw.yoyo_ease.unwrap_or(tw.ease)
        } else {
            tw.ease
        };
        let eased = ease.evaluate(linear);
        for b in &tw.bindings {
            let r = b.ease.map_or(eased, |e| e.evaluate(linear));
            b.apply(r as f32);
        }
    }

    /// Capture start values and build bindings. Runs on first render, after
    /// `invalidate`, and on each repeat with `repeat_refresh`.
    pub(crate) fn init_tween(&mut self, id: NodeId) {
        let Some(tw) = self.nodes.get(id).and_then(Node::tween) else {
            return;
        };
        let targets = tw.targets.clone();
        let specs = tw.specs.clone();
        let overwritten = tw.overwritten.clone();
        let record_originals = tw.originals.is_empty();
        let overwrite = tw.overwrite;

        let mut bindings = Vec::with_capacity(targets.len() * specs.len());
        let mut originals = Vec::new();
        for target in &targets {
            if !target.is_alive() {
                log::warn!("tween {id:?}: target {:?} no longer exists; skipped", target.key());
                continue;
            }
            let key = target.key();
            for (prop, spec) in &specs {
                if overwritten.contains(&(key, prop.clone())) {
                    continue;
                }
                let Some(current) = target.get(prop) else {
                    log::warn!("tween {id:?}: target has no property {prop:?}; skipped");
                    continue;
                };
                let start = spec
                    .start
                    .as_ref()
                    .map_or_else(|| current.clone(), |s| s.resolve(&current));
                let end = spec
                    .end
                    .as_ref()
                    .map_or_else(|| current.clone(), |e| e.resolve(&start));
                bindings.push(PropertyBinding::new(
                    target.clone(),
                    prop.clone(),
                    &start,
                    &end,
                    spec.ease,
                ));
                if record_originals {
                    originals.push((target.clone(), prop.clone(), current));
                }
            }
        }

        if overwrite == Overwrite::Auto {
            self.auto_overwrite(id, &bindings);
        }

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.initialized = true;
        if let Some(tw) = node.tween_mut() {
            tw.bindings = bindings;
            if record_originals {
                tw.originals = originals;
            }
        }
    }

    pub(crate) fn clear_bindings(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.initialized = false;
            if let Some(tw) = node.tween_mut() {
                tw.bindings.clear();
            }
        }
    }

    fn render_timeline(&mut self, id: NodeId, total_time: f64, suppress: bool, force: bool) {
        let is_root = id == self.root;
        let tdur = if is_root { 0.0 } else { self.refresh(id) };
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let first = !node.initialized;
        if first && total_time < 0.0 && !force {
            node.z_time = total_time;
            return;
        }
        let crossing = (node.z_time >= 0.0) != (total_time >= 0.0);
        let tt = if is_root {
            total_time
        } else {
            clamp_total(total_time, tdur)
        };
        if tt == node.total_time && !first && !force && !crossing {
            node.z_time = total_time;
            return;
        }
        let dur = node.duration;
        let prev_total = node.total_time;
        let prev_cycle = node.cycle;
        let yoyo = node.yoyo;
        let refresh_children = node.repeat_refresh;
        let (time, cycle) = if is_root {
            (tt, 0)
        } else if node.repeat != 0 {
            cycle_position(tt, dur, node.repeat, node.repeat_delay, yoyo)
        } else {
            (tt.min(dur), 0)
        };
        node.initialized = true;
        node.total_time = tt;
        node.z_time = total_time;
        node.ratio = if dur > 0.0 {
            time / dur
        } else if tt > 0.0 {
            1.0
        } else {
            0.0
        };

        if !is_root && prev_total == 0.0 && tt > 0.0 {
            self.emit(id, EventKind::Start, suppress);
        }

        if !first && cycle != prev_cycle {
            let forward = cycle > prev_cycle;
            let exit = if forward != (yoyo && prev_cycle % 2 == 1) {
                dur
            } else {
                0.0
            };
            self.dispatch(id, exit, exit, suppress, force);
            if let Some(n) = self.nodes.get_mut(id) {
                n.cycle = cycle;
            }
            self.emit(id, EventKind::Repeat { cycle }, suppress);
            if refresh_children {
                self.invalidate_children(id);
            }
            let entry = if forward != (yoyo && cycle % 2 == 1) {
                0.0
            } else {
                dur
            };
            if entry != exit {
                self.dispatch(id, entry, entry, true, force);
            }
        }
        if let Some(n) = self.nodes.get_mut(id) {
            n.cycle = cycle;
        }

        let raw = if total_time < 0.0 { total_time } else { time };
        self.dispatch(id, time, raw, suppress, force);

        if is_root {
            return;
        }
        self.emit(id, EventKind::Update, suppress);
        if tt == tdur && prev_total != tdur {
            self.emit(id, EventKind::Complete, suppress);
        } else if tt == 0.0 && prev_total > 0.0 {
            self.emit(id, EventKind::ReverseComplete, suppress);
        }
    }

    #[inline]
    fn structure_of(&self, id: NodeId) -> Option<u64> {
        self.nodes
            .get(id)
            .and_then(Node::timeline)
            .map(|tl| tl.structure)
    }

    /// Render the children of `id` at local `time`, in the direction of
    /// travel. `raw` is passed to children instead of `time` when it is
    /// negative, so they see the playhead before the start.
    ///
    /// Iterates a snapshot of the child list; if the list changes under a
    /// child's render (a kill, a reparent), the pass starts over. Children
    /// that already reached this time treat the repeat render as a no-op.
    fn dispatch(&mut self, id: NodeId, time: f64, raw: f64, suppress: bool, force: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let backward = time < node.time;
        node.time = time;
        let parent_time = if raw < 0.0 { raw } else { time };

        let mut buf = self.scratch.take();
        let mut restarts = 0u32;
        'pass: loop {
            buf.clear();
            let Some(tl) = self.nodes.get(id).and_then(Node::timeline) else {
                break;
            };
            buf.extend_from_slice(&tl.children);
            let mut structure = tl.structure;
            if backward {
                buf.reverse();
            }
            for &child in buf.iter() {
                if self.structure_of(id) != Some(structure) {
                    restarts += 1;
                    assert!(
                        restarts < MAX_DISPATCH_RESTARTS,
                        "dispatch of {id:?} keeps restarting; child list never settles"
                    );
                    log::trace!("dispatch of {id:?} restarted");
                    continue 'pass;
                }
                self.refresh(child);
                let Some(c) = self.nodes.get(child) else {
                    continue 'pass;
                };
                assert_eq!(
                    c.parent,
                    Some(id),
                    "child {child:?} is listed under {id:?} but links to {:?}",
                    c.parent
                );
                if c.paused || c.time_scale == 0.0 {
                    continue;
                }
                if !backward {
                    if c.start > parent_time {
                        break;
                    }
                } else if c.end() < parent_time {
                    continue;
                }
                let child_time = c.parent_to_child(parent_time);
                self.render_node(child, child_time, suppress, force);
                if self.structure_of(id) != Some(structure) {
                    restarts += 1;
                    log::trace!("dispatch of {id:?} restarted after rendering {child:?}");
                    continue 'pass;
                }
                if self.auto_remove_if_done(id, child) {
                    structure = self.structure_of(id).unwrap_or(structure);
                }
            }
            break;
        }
        self.scratch.give_back(buf);
    }

    /// Detach a child that finished in its direction of play, when the
    /// parent auto-removes children.
    fn auto_remove_if_done(&mut self, parent: NodeId, child: NodeId) -> bool {
        let auto_remove = self
            .nodes
            .get(parent)
            .and_then(Node::timeline)
            .is_some_and(|tl| tl.auto_remove_children);
        if !auto_remove {
            return false;
        }
        let Some(c) = self.nodes.get(child) else {
            return false;
        };
        if !c.initialized || c.paused || c.repeat < 0 {
            return false;
        }
        let tdur = c.total_duration();
        let rts = c.rts();
        let done = if rts > 0.0 {
            if tdur > 0.0 {
                c.total_time >= tdur
            } else {
                c.ratio >= 1.0
            }
        } else if rts < 0.0 {
            c.total_time <= 0.0 && (tdur > 0.0 || c.ratio <= 0.0)
        } else {
            false
        };
        if done {
            self.detach(child);
            if let Some(c) = self.nodes.get_mut(child) {
                c.finished = true;
            }
            log::debug!("{child:?} finished; removed from {parent:?}");
        }
        done
    }
}
