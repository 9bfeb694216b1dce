//! Playback controls, retiming, and the read-only playback getters.
//!
//! Under a parent with `smooth_child_timing`, changing how a node maps onto
//! its parent (rate, direction, duration, repeats) moves its start so the
//! parent's current time still lands on the same child progress. The start
//! is solved for before the change is rendered.

use super::Engine;
use crate::error::{check_time, TimelineError, TimelineResult};
use crate::ids::NodeId;
use crate::node::{Node, NodeKind};

impl Engine {
    // ---------- alignment ----------

    fn parent_smooth(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .and_then(Node::timeline)
            .is_some_and(|tl| tl.smooth_child_timing)
    }

    /// Total time the parent's playhead maps to, capped at the node's end.
    /// Paused and detached nodes report their own total time.
    fn mapped_total(&mut self, id: NodeId) -> f64 {
        let tdur = self.refresh(id);
        let Some(node) = self.nodes.get(id) else {
            return 0.0;
        };
        let parent_time = node
            .parent
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.time);
        match parent_time {
            Some(pt) if !node.paused && node.time_scale != 0.0 => {
                node.parent_to_child(pt).min(tdur)
            }
            _ => node.total_time,
        }
    }

    /// Solve for the start that maps the parent's time onto `total_time`.
    pub(crate) fn align_playhead(&mut self, id: NodeId, total_time: f64) {
        let tdur = self.refresh(id);
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let Some(parent) = node.parent else {
            return;
        };
        let rts = node.rts();
        if rts == 0.0 {
            return;
        }
        let Some(pt) = self.nodes.get(parent).map(|p| p.time) else {
            return;
        };
        let start = if rts > 0.0 {
            pt - total_time / rts
        } else {
            pt - (total_time - tdur) / rts
        };
        if start != node.start {
            self.place_child(parent, id, start);
        }
    }

    /// Link a detached node back under the root at its current progress.
    pub(crate) fn ensure_attached(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if id == self.root || node.parent.is_some() {
            return;
        }
        let (start, total) = (node.start, node.total_time);
        let root = self.root;
        self.insert_child(root, id, start);
        self.align_playhead(id, total);
        log::debug!("{id:?} re-attached to the root");
    }

    /// Change how `id` maps onto its parent without a visible jump.
    fn retime(&mut self, id: NodeId, mutate: impl FnOnce(&mut Node)) -> TimelineResult<()> {
        self.node(id)?;
        if id == self.root {
            mutate(self.node_mut(id)?);
            return Ok(());
        }
        let total = self.mapped_total(id);
        mutate(self.node_mut(id)?);
        self.touch(id);
        if self.parent_smooth(id) {
            self.align_playhead(id, total);
        }
        let node = self.node(id)?;
        if node.parent.is_some() && !node.paused && node.initialized {
            let t = self.mapped_total(id);
            self.render_node(id, t, true, false);
        }
        Ok(())
    }

    /// Change the cycle structure of `id`, keeping its total time.
    fn restructure(&mut self, id: NodeId, mutate: impl FnOnce(&mut Node)) -> TimelineResult<()> {
        self.not_root(id)?;
        let total = self.node(id)?.total_time;
        mutate(self.node_mut(id)?);
        self.touch(id);
        let tdur = self.refresh(id);
        let total = total.min(tdur);
        if self.parent_smooth(id) {
            self.align_playhead(id, total);
        }
        if self.node(id)?.initialized {
            self.render_node(id, total, true, true);
        }
        Ok(())
    }

    // ---------- playback ----------

    /// Play forward from the current position.
    pub fn play(&mut self, id: NodeId) -> TimelineResult<()> {
        self.node(id)?;
        self.ensure_attached(id);
        self.set_reversed(id, false)?;
        self.resume(id)
    }

    pub fn pause(&mut self, id: NodeId) -> TimelineResult<()> {
        self.node_mut(id)?.paused = true;
        Ok(())
    }

    /// Unpause without changing direction.
    pub fn resume(&mut self, id: NodeId) -> TimelineResult<()> {
        let node = self.node_mut(id)?;
        if node.paused {
            node.paused = false;
            let total = node.total_time;
            if self.parent_smooth(id) {
                self.align_playhead(id, total);
            }
        }
        self.wake();
        Ok(())
    }

    /// Play backward toward the start.
    pub fn reverse(&mut self, id: NodeId) -> TimelineResult<()> {
        self.node(id)?;
        self.ensure_attached(id);
        self.set_reversed(id, true)?;
        self.resume(id)
    }

    /// Jump to the start and play forward. With `include_delay` the delay is
    /// replayed too.
    pub fn restart(&mut self, id: NodeId, include_delay: bool) -> TimelineResult<()> {
        self.play(id)?;
        let delay = self.node(id)?.delay;
        let at = if include_delay { -delay } else { 0.0 };
        self.seek(id, at, true)
    }

    /// Set the total time of `id` (all cycles, repeat delays included).
    pub fn seek(&mut self, id: NodeId, total_time: f64, suppress: bool) -> TimelineResult<()> {
        check_time(total_time)?;
        self.node(id)?;
        if id != self.root && self.parent_smooth(id) {
            self.align_playhead(id, total_time);
        }
        self.render_node(id, total_time, suppress, false);
        Ok(())
    }

    pub fn set_total_time(&mut self, id: NodeId, total_time: f64, suppress: bool) -> TimelineResult<()> {
        self.seek(id, total_time, suppress)
    }

    /// Set the time within the current cycle.
    pub fn set_time(&mut self, id: NodeId, time: f64, suppress: bool) -> TimelineResult<()> {
        check_time(time)?;
        self.refresh(id);
        let node = self.node(id)?;
        let dur = node.duration;
        let time = time.clamp(0.0, dur);
        let cycle = node.cycle;
        let local = if node.yoyo && cycle % 2 == 1 {
            dur - time
        } else {
            time
        };
        let total = f64::from(cycle) * (dur + node.repeat_delay) + local;
        self.seek(id, total, suppress)
    }

    pub fn set_progress(&mut self, id: NodeId, progress: f64, suppress: bool) -> TimelineResult<()> {
        check_time(progress)?;
        self.refresh(id);
        let dur = self.node(id)?.duration;
        self.set_time(id, progress.clamp(0.0, 1.0) * dur, suppress)
    }

    pub fn set_total_progress(&mut self, id: NodeId, progress: f64, suppress: bool) -> TimelineResult<()> {
        check_time(progress)?;
        let tdur = self.refresh(id);
        self.node(id)?;
        self.seek(id, progress.clamp(0.0, 1.0) * tdur, suppress)
    }

    pub fn set_time_scale(&mut self, id: NodeId, time_scale: f64) -> TimelineResult<()> {
        check_time(time_scale)?;
        self.retime(id, |n| n.time_scale = time_scale)
    }

    pub fn set_reversed(&mut self, id: NodeId, reversed: bool) -> TimelineResult<()> {
        if self.node(id)?.reversed == reversed {
            return Ok(());
        }
        self.retime(id, |n| n.reversed = reversed)
    }

    pub fn set_paused(&mut self, id: NodeId, paused: bool) -> TimelineResult<()> {
        if paused {
            self.pause(id)
        } else {
            self.resume(id)
        }
    }

    /// Tweens keep their total progress; timelines rescale their time scale
    /// so their content plays in `duration` seconds.
    pub fn set_duration(&mut self, id: NodeId, duration: f64) -> TimelineResult<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(TimelineError::InvalidDuration { duration });
        }
        self.not_root(id)?;
        self.refresh(id);
        let node = self.node(id)?;
        if node.is_timeline() {
            let current = node.duration;
            if current <= 0.0 || duration <= 0.0 {
                log::warn!("cannot rescale {id:?} from duration {current} to {duration}");
                return Ok(());
            }
            let scale = node.time_scale * current / duration;
            return self.set_time_scale(id, scale);
        }
        let progress = node.total_progress();
        self.node_mut(id)?.duration = duration;
        self.touch(id);
        let tdur = self.refresh(id);
        let total = progress * tdur;
        if self.parent_smooth(id) {
            self.align_playhead(id, total);
        }
        if self.node(id)?.initialized {
            self.render_node(id, total, true, true);
        }
        Ok(())
    }

    /// `-1` repeats forever.
    pub fn set_repeat(&mut self, id: NodeId, repeat: i32) -> TimelineResult<()> {
        self.restructure(id, |n| n.repeat = repeat.max(-1))
    }

    pub fn set_repeat_delay(&mut self, id: NodeId, repeat_delay: f64) -> TimelineResult<()> {
        check_time(repeat_delay)?;
        self.restructure(id, |n| n.repeat_delay = repeat_delay.max(0.0))
    }

    pub fn set_yoyo(&mut self, id: NodeId, yoyo: bool) -> TimelineResult<()> {
        self.restructure(id, |n| n.yoyo = yoyo)
    }

    /// Move `id` to `start` on its parent's axis.
    pub fn set_start_time(&mut self, id: NodeId, start: f64) -> TimelineResult<()> {
        check_time(start)?;
        self.not_root(id)?;
        match self.node(id)?.parent {
            Some(parent) => self.place_child(parent, id, start),
            None => {
                self.node_mut(id)?.start = start;
                self.touch(id);
            }
        }
        Ok(())
    }

    /// Drop captured start values; the next render re-reads the targets.
    pub fn invalidate(&mut self, id: NodeId) -> TimelineResult<()> {
        self.node(id)?;
        self.invalidate_node(id);
        Ok(())
    }

    pub(crate) fn invalidate_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if let NodeKind::Tween(tw) = &mut node.kind {
            tw.bindings.clear();
            tw.overwritten.clear();
            node.initialized = false;
        } else {
            self.invalidate_children(id);
        }
    }

    pub(crate) fn invalidate_children(&mut self, id: NodeId) {
        let children = match self.nodes.get(id).and_then(Node::timeline) {
            Some(tl) => tl.children.clone(),
            None => return,
        };
        for c in children {
            self.invalidate_node(c);
        }
    }

    // ---------- getters ----------

    pub fn time(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(|n| n.time)
    }

    pub fn total_time(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(|n| n.total_time)
    }

    pub fn progress(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(Node::progress)
    }

    pub fn total_progress(&mut self, id: NodeId) -> Option<f64> {
        self.refresh(id);
        self.nodes.get(id).map(Node::total_progress)
    }

    /// Single-cycle duration; timelines recompute it from their children.
    pub fn duration(&mut self, id: NodeId) -> Option<f64> {
        self.refresh(id);
        self.nodes.get(id).map(|n| n.duration)
    }

    pub fn total_duration(&mut self, id: NodeId) -> Option<f64> {
        self.nodes.get(id)?;
        Some(self.refresh(id))
    }

    /// Where `id` ends on its parent's axis.
    pub fn end_time(&mut self, id: NodeId) -> Option<f64> {
        self.refresh(id);
        self.nodes.get(id).map(Node::end)
    }

    pub fn start_time(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(|n| n.start)
    }

    pub fn time_scale(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(|n| n.time_scale)
    }

    pub fn repeat(&self, id: NodeId) -> Option<i32> {
        self.nodes.get(id).map(|n| n.repeat)
    }

    pub fn repeat_delay(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).map(|n| n.repeat_delay)
    }

    pub fn yoyo(&self, id: NodeId) -> Option<bool> {
        self.nodes.get(id).map(|n| n.yoyo)
    }

    /// Zero-based repeat cycle.
    pub fn cycle(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(id).map(|n| n.cycle)
    }

    /// One-based iteration number.
    pub fn iteration(&self, id: NodeId) -> Option<u32> {
        self.cycle(id).map(|c| c + 1)
    }

    pub fn is_paused(&self, id: NodeId) -> Option<bool> {
        self.nodes.get(id).map(|n| n.paused)
    }

    pub fn is_reversed(&self, id: NodeId) -> Option<bool> {
        self.nodes.get(id).map(|n| n.reversed)
    }
}
