//! Reusable child-list buffers for timeline dispatch.
//!
//! Dispatch iterates a copy of a timeline's children so that the live list
//! can change underneath it. Nested timelines take nested buffers; the pool
//! keeps their allocations across frames.

use crate::config::Config;
use crate::ids::NodeId;

#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pool: Vec<Vec<NodeId>>,
    cap_children: usize,
}

impl Scratch {
    pub fn new(cfg: &Config) -> Self {
        Self {
            pool: Vec::new(),
            cap_children: cfg.scratch_children,
        }
    }

    /// An empty buffer, reused when one is available.
    #[inline]
    pub fn take(&mut self) -> Vec<NodeId> {
        self.pool
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.cap_children))
    }

    #[inline]
    pub fn give_back(&mut self, mut buf: Vec<NodeId>) {
        buf.clear();
        self.pool.push(buf);
    }

    #[cfg(test)]
    fn pooled(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_recycled() {
        let mut scratch = Scratch::new(&Config::default());
        let a = scratch.take();
        assert!(a.capacity() >= 64);
        let b = scratch.take();
        scratch.give_back(a);
        scratch.give_back(b);
        assert_eq!(scratch.pooled(), 2);
        let c = scratch.take();
        assert!(c.is_empty());
        assert_eq!(scratch.pooled(), 1);
    }
}
