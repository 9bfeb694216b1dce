//! Target index and the overwrite protocol.
//!
//! At most one binding drives a (target, property) pair at a time. In `Auto`
//! mode a tween, while initialising, takes the pair away from every other
//! initialised tween that is active at that moment; a tween left with no
//! bindings is interrupted and killed. `All` kills every other tween of the
//! same targets as soon as the new tween is created.

use hashbrown::HashMap;

use super::Engine;
use crate::binding::PropertyBinding;
use crate::ids::NodeId;
use crate::node::{Node, TINY};
use crate::outputs::EventKind;
use crate::target::{Target, TargetKey};

/// Which tweens reference which targets.
#[derive(Debug, Default)]
pub(crate) struct TargetIndex {
    by_target: HashMap<TargetKey, Vec<NodeId>>,
}

impl TargetIndex {
    pub fn register(&mut self, id: NodeId, targets: &[Target]) {
        for t in targets {
            let list = self.by_target.entry(t.key()).or_default();
            if !list.contains(&id) {
                list.push(id);
            }
        }
    }

    pub fn unregister(&mut self, id: NodeId, targets: &[Target]) {
        for t in targets {
            let key = t.key();
            if let Some(list) = self.by_target.get_mut(&key) {
                list.retain(|n| *n != id);
                if list.is_empty() {
                    self.by_target.remove(&key);
                }
            }
        }
    }

    pub fn tweens_of(&self, key: TargetKey) -> &[NodeId] {
        self.by_target.get(&key).map_or(&[], Vec::as_slice)
    }
}

impl Engine {
    pub(crate) fn register_targets(&mut self, id: NodeId) {
        if let Some(tw) = self.nodes.get(id).and_then(Node::tween) {
            self.index.register(id, &tw.targets);
        }
    }

    /// Active means: not paused, linked to the root through unpaused
    /// ancestors, and every parent's playhead is inside the child's span.
    pub(crate) fn is_active_node(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            let Some(node) = self.nodes.get(cur) else {
                return false;
            };
            if node.paused || node.time_scale == 0.0 {
                return false;
            }
            let Some(parent) = node.parent.and_then(|p| self.nodes.get(p).map(|n| (p, n))) else {
                return false;
            };
            let t = parent.1.time;
            if t < node.start || t >= node.end() - TINY {
                return false;
            }
            cur = parent.0;
        }
    }

    /// Whether `id` is initialised and currently active.
    pub fn is_active(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.initialized) && self.is_active_node(id)
    }

    /// Take the pairs in `bindings` away from other active tweens.
    pub(crate) fn auto_overwrite(&mut self, id: NodeId, bindings: &[PropertyBinding]) {
        let mut hits: Vec<(NodeId, TargetKey, String)> = Vec::new();
        for b in bindings {
            for &other in self.index.tweens_of(b.key) {
                if other == id {
                    continue;
                }
                let Some(node) = self.nodes.get(other) else {
                    continue;
                };
                let holds = node.initialized
                    && node
                        .tween()
                        .is_some_and(|tw| tw.has_binding(b.key, &b.property));
                if holds && self.is_active_node(other) {
                    hits.push((other, b.key, b.property.clone()));
                }
            }
        }
        for (other, key, property) in hits {
            log::debug!("{id:?} overwrites {property:?} on {other:?}");
            self.drop_pair(other, key, &property);
        }
    }

    /// Remove one (target, property) pair from a tween; kill it with an
    /// interrupt when nothing is left to animate.
    fn drop_pair(&mut self, id: NodeId, key: TargetKey, property: &str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let initialized = node.initialized;
        let Some(tw) = node.tween_mut() else {
            return;
        };
        tw.bindings.retain(|b| !b.matches(key, property));
        tw.overwritten.insert((key, property.to_string()));
        let gutted = if initialized {
            tw.bindings.is_empty()
        } else {
            tw.targets.iter().all(|t| {
                tw.specs
                    .iter()
                    .all(|(p, _)| tw.overwritten.contains(&(t.key(), p.clone())))
            })
        };
        if gutted {
            log::debug!("{id:?} lost its last binding; interrupted");
            self.emit(id, EventKind::Interrupt, false);
            self.kill_node(id, false);
        }
    }

    /// `Overwrite::All`: kill every other tween sharing a target with `id`.
    pub(crate) fn overwrite_all(&mut self, id: NodeId) {
        let Some(tw) = self.nodes.get(id).and_then(Node::tween) else {
            return;
        };
        let mut victims: Vec<NodeId> = Vec::new();
        for t in &tw.targets {
            for &other in self.index.tweens_of(t.key()) {
                if other != id && !victims.contains(&other) {
                    victims.push(other);
                }
            }
        }
        for v in victims {
            log::debug!("{id:?} kills {v:?} (overwrite all)");
            self.kill_node(v, true);
        }
    }

    /// Tweens referencing `target`, in creation order.
    pub fn tweens_of(&self, target: &Target) -> Vec<NodeId> {
        self.index
            .tweens_of(target.key())
            .iter()
            .copied()
            .filter(|id| self.nodes.contains(*id))
            .collect()
    }

    /// Whether any tween of `target` is active right now.
    pub fn is_tweening(&self, target: &Target) -> bool {
        self.index
            .tweens_of(target.key())
            .iter()
            .any(|id| self.is_active(*id))
    }

    /// Kill the tweens of `target`, or with `properties`, only strip those
    /// properties (killing tweens left with nothing). Returns how many tweens
    /// were affected.
    pub fn kill_tweens_of(&mut self, target: &Target, properties: Option<&[&str]>) -> usize {
        let key = target.key();
        let tweens = self.tweens_of(target);
        match properties {
            None => {
                for id in &tweens {
                    self.kill_node(*id, true);
                }
                tweens.len()
            }
            Some(props) => {
                let mut affected = 0;
                for id in tweens {
                    let touches = self.nodes.get(id).and_then(Node::tween).is_some_and(|tw| {
                        tw.specs.iter().any(|(p, _)| props.contains(&p.as_str()))
                    });
                    if !touches {
                        continue;
                    }
                    affected += 1;
                    for p in props {
                        self.drop_pair(id, key, p);
                    }
                }
                affected
            }
        }
    }

    /// Whether tween `id` currently drives `property` on `target`.
    pub fn has_binding(&self, id: NodeId, target: &Target, property: &str) -> bool {
        self.nodes
            .get(id)
            .and_then(Node::tween)
            .is_some_and(|tw| tw.has_binding(target.key(), property))
    }

    /// Number of live bindings on tween `id` (0 before its first render).
    pub fn binding_count(&self, id: NodeId) -> usize {
        self.nodes
            .get(id)
            .and_then(Node::tween)
            .map_or(0, |tw| tw.bindings.len())
    }
}
