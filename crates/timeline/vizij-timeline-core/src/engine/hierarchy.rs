//! Parent/child links, positions, labels, and node teardown.

use super::Engine;
use crate::error::{check_time, TimelineError, TimelineResult};
use crate::ids::NodeId;
use crate::node::{Node, NodeKind};
use crate::outputs::EventKind;
use crate::position::Position;

impl Engine {
    /// Link `child` under `tl` at `start`, after any siblings starting at or
    /// before it. The child must be detached.
    pub(crate) fn insert_child(&mut self, tl: NodeId, child: NodeId, start: f64) {
        let index = {
            let Some(data) = self.nodes.get(tl).and_then(Node::timeline) else {
                return;
            };
            let nodes = &self.nodes;
            data.children
                .partition_point(|c| nodes.get(*c).is_some_and(|n| n.start <= start))
        };
        if let Some(node) = self.nodes.get_mut(child) {
            debug_assert!(node.parent.is_none(), "{child:?} is already linked");
            node.parent = Some(tl);
            node.start = start;
            node.finished = false;
        }
        if let Some(data) = self.nodes.get_mut(tl).and_then(Node::timeline_mut) {
            data.children.insert(index, child);
            data.structure += 1;
            data.last_added = Some(child);
        }
        self.touch(child);
    }

    /// Move `child` (already under `tl`) to a new start, keeping the list sorted.
    pub(crate) fn place_child(&mut self, tl: NodeId, child: NodeId, start: f64) {
        let last_added = self
            .nodes
            .get(tl)
            .and_then(Node::timeline)
            .and_then(|d| d.last_added);
        self.detach(child);
        self.insert_child(tl, child, start);
        if let Some(data) = self.nodes.get_mut(tl).and_then(Node::timeline_mut) {
            data.last_added = last_added;
        }
    }

    /// Unlink `child` from its parent, if any.
    pub(crate) fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(parent).and_then(Node::timeline_mut) {
            if let Some(pos) = data.children.iter().position(|c| *c == child) {
                data.children.remove(pos);
                data.structure += 1;
            }
            if data.last_added == Some(child) {
                data.last_added = None;
            }
        }
        self.touch(parent);
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cur = Some(of);
        while let Some(c) = cur {
            if c == candidate {
                return true;
            }
            cur = self.nodes.get(c).and_then(|n| n.parent);
        }
        false
    }

    /// Resolve a position to a time on `tl`'s axis. Unknown labels are
    /// created at the current end.
    pub(crate) fn resolve_position(&mut self, tl: NodeId, position: &Position) -> TimelineResult<f64> {
        self.timeline_data(tl)?;
        self.refresh(tl);
        let end = self.node(tl)?.duration;
        let last = self.timeline_data(tl)?.last_added;
        let last = last.and_then(|id| self.nodes.get(id));
        let at = match position {
            Position::Absolute(t) => check_time(*t)?,
            Position::End(offset) => end + offset,
            Position::PrevStart(offset) => last.map_or(end, |n| n.start) + offset,
            Position::PrevEnd(offset) => last.map_or(end, Node::end) + offset,
            Position::Label { name, offset } => {
                let data = self.timeline_data_mut(tl)?;
                let t = *data.labels.entry(name.clone()).or_insert(end);
                t + offset
            }
        };
        check_time(at)
    }

    /// Place `child` inside `tl`, unlinking it from its current parent.
    pub fn add(&mut self, tl: NodeId, child: NodeId, position: impl Into<Position>) -> TimelineResult<()> {
        self.not_root(child)?;
        self.timeline_data(tl)?;
        self.node(child)?;
        if self.is_ancestor(child, tl) {
            return Err(TimelineError::CyclicParent { parent: tl, child });
        }
        self.detach(child);
        let at = self.resolve_position(tl, &position.into())?;
        let delay = self.node(child)?.delay;
        self.insert_child(tl, child, at + delay);
        self.wake();
        Ok(())
    }

    /// Unlink `child` from `tl` without killing it.
    pub fn remove(&mut self, tl: NodeId, child: NodeId) -> TimelineResult<()> {
        self.timeline_data(tl)?;
        if self.node(child)?.parent != Some(tl) {
            return Err(TimelineError::NodeNotFound { id: child });
        }
        self.detach(child);
        Ok(())
    }

    /// Unlink every child and drop all labels.
    pub fn clear(&mut self, tl: NodeId) -> TimelineResult<()> {
        let children = self.timeline_data(tl)?.children.clone();
        for c in children {
            self.detach(c);
        }
        self.timeline_data_mut(tl)?.labels.clear();
        Ok(())
    }

    /// Direct children in start order, or every descendant depth-first when
    /// `nested` is set.
    pub fn children(&self, tl: NodeId, nested: bool) -> TimelineResult<Vec<NodeId>> {
        let mut out = Vec::new();
        self.collect_children(tl, nested, &mut out)?;
        Ok(out)
    }

    fn collect_children(&self, tl: NodeId, nested: bool, out: &mut Vec<NodeId>) -> TimelineResult<()> {
        for &c in &self.timeline_data(tl)?.children {
            out.push(c);
            if nested && self.nodes.get(c).is_some_and(Node::is_timeline) {
                self.collect_children(c, true, out)?;
            }
        }
        Ok(())
    }

    // ---------- labels ----------

    /// Add (or move) a label; returns its time.
    pub fn add_label(
        &mut self,
        tl: NodeId,
        name: impl Into<String>,
        position: impl Into<Position>,
    ) -> TimelineResult<f64> {
        let at = self.resolve_position(tl, &position.into())?;
        self.timeline_data_mut(tl)?.labels.insert(name.into(), at);
        Ok(at)
    }

    pub fn remove_label(&mut self, tl: NodeId, name: &str) -> TimelineResult<bool> {
        Ok(self.timeline_data_mut(tl)?.labels.remove(name).is_some())
    }

    pub fn label_time(&self, tl: NodeId, name: &str) -> Option<f64> {
        self.timeline_data(tl).ok()?.labels.get(name).copied()
    }

    /// First label strictly after `after` (default: the timeline's time).
    pub fn next_label(&self, tl: NodeId, after: Option<f64>) -> Option<(String, f64)> {
        let node = self.nodes.get(tl)?;
        let after = after.unwrap_or(node.time);
        node.timeline()?
            .labels
            .iter()
            .filter(|(_, t)| **t > after)
            .min_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(n, t)| (n.clone(), *t))
    }

    /// Last label strictly before `before` (default: the timeline's time).
    pub fn previous_label(&self, tl: NodeId, before: Option<f64>) -> Option<(String, f64)> {
        let node = self.nodes.get(tl)?;
        let before = before.unwrap_or(node.time);
        node.timeline()?
            .labels
            .iter()
            .filter(|(_, t)| **t < before)
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(n, t)| (n.clone(), *t))
    }

    pub fn seek_label(&mut self, tl: NodeId, name: &str, suppress: bool) -> TimelineResult<()> {
        let at = self
            .label_time(tl, name)
            .ok_or_else(|| TimelineError::LabelNotFound {
                label: name.to_string(),
            })?;
        self.seek(tl, at, suppress)
    }

    // ---------- teardown ----------

    /// Stop `id` for good: unlink it and free it and its descendants. Raises
    /// an interrupt when it had not completed.
    pub fn kill(&mut self, id: NodeId) -> TimelineResult<()> {
        self.not_root(id)?;
        self.node(id)?;
        self.kill_node(id, true);
        Ok(())
    }

    pub(crate) fn kill_node(&mut self, id: NodeId, interrupt: bool) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if interrupt && node.progress_for_interrupt() < 1.0 {
            self.emit(id, EventKind::Interrupt, false);
        }
        self.detach(id);
        self.release(id);
    }

    /// Restore every value captured at first render, then kill without an
    /// interrupt. Timelines revert children last-to-first.
    pub fn revert(&mut self, id: NodeId) -> TimelineResult<()> {
        self.not_root(id)?;
        self.node(id)?;
        self.restore_originals(id);
        self.kill_node(id, false);
        Ok(())
    }

    fn restore_originals(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Tween(tw) => {
                for (target, prop, value) in tw.originals.iter().rev() {
                    target.set(prop, value.clone());
                }
            }
            NodeKind::Timeline(tl) => {
                let children = tl.children.clone();
                for c in children.into_iter().rev() {
                    self.restore_originals(c);
                }
            }
        }
    }

    /// Free `id` and its subtree. The node must already be detached.
    pub(crate) fn release(&mut self, id: NodeId) {
        self.detach(id);
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        match node.kind {
            NodeKind::Tween(tw) => self.index.unregister(id, &tw.targets),
            NodeKind::Timeline(tl) => {
                for c in tl.children {
                    if let Some(cn) = self.nodes.get_mut(c) {
                        cn.parent = None;
                    }
                    self.release(c);
                }
            }
        }
    }
}

impl Node {
    /// Progress used to decide whether a kill interrupts.
    fn progress_for_interrupt(&self) -> f64 {
        if self.repeat < 0 {
            return 0.0;
        }
        self.total_progress()
    }
}
