//! Global clock: turns wall-clock readings into frame ticks.
//!
//! The ticker holds no reference to the engine; `Engine::tick` feeds it a
//! timestamp from a [`ClockSource`] and, when a frame is due, advances the root
//! timeline by the returned delta.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Millisecond timestamps.
pub trait ClockSource {
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `instant::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: instant::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock moved by hand; clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    /// A gap longer than this (ms) is treated as a stall...
    pub lag_threshold: f64,
    /// ...and replaced by this many ms.
    pub adjusted_lag: f64,
    /// Frame cap; `None` runs at 240 fps at most.
    pub fps: Option<f64>,
    /// Frames between idle checks.
    pub idle_frames: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            lag_threshold: 500.0,
            adjusted_lag: 33.0,
            fps: None,
            idle_frames: 120,
        }
    }
}

impl TickerConfig {
    fn gap_ms(&self) -> f64 {
        match self.fps {
            Some(fps) if fps > 0.0 => 1000.0 / fps,
            _ => 1000.0 / 240.0,
        }
    }
}

/// One dispatched frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Seconds since the ticker first woke, excluding stalls.
    pub time: f64,
    /// Seconds since the previous dispatched frame.
    pub delta: f64,
    pub frame: u64,
}

#[derive(Debug)]
pub struct Ticker {
    cfg: TickerConfig,
    gap: f64,
    awake: bool,
    start_time: f64,
    last_update: f64,
    next_time: f64,
    /// Seconds.
    time: f64,
    frame: u64,
}

impl Ticker {
    pub fn new(cfg: TickerConfig) -> Self {
        Self {
            gap: cfg.gap_ms(),
            cfg,
            awake: false,
            start_time: 0.0,
            last_update: 0.0,
            next_time: 0.0,
            time: 0.0,
            frame: 0,
        }
    }

    #[inline]
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &TickerConfig {
        &self.cfg
    }

    pub fn set_fps(&mut self, fps: Option<f64>) {
        self.cfg.fps = fps;
        self.gap = self.cfg.gap_ms();
    }

    /// Resume from `now_ms`. Time spent asleep is not replayed.
    pub fn wake(&mut self, now_ms: f64) {
        if self.awake {
            return;
        }
        self.awake = true;
        self.last_update = now_ms;
        self.start_time = now_ms - self.time * 1000.0;
        self.next_time = self.time * 1000.0;
        log::debug!("ticker awake at frame {}", self.frame);
    }

    pub fn sleep(&mut self) {
        if self.awake {
            self.awake = false;
            log::debug!("ticker asleep at frame {}", self.frame);
        }
    }

    /// Advance to `now_ms`. Returns a tick when a frame is due, or always when
    /// `force` is set. Does nothing while asleep.
    pub fn advance(&mut self, now_ms: f64, force: bool) -> Option<Tick> {
        if !self.awake {
            return None;
        }
        let elapsed = now_ms - self.last_update;
        if elapsed > self.cfg.lag_threshold || elapsed < 0.0 {
            self.start_time += elapsed - self.cfg.adjusted_lag;
        }
        self.last_update += elapsed;
        let time_ms = self.last_update - self.start_time;
        let overlap = time_ms - self.next_time;
        if overlap <= 0.0 && !force {
            return None;
        }
        self.frame += 1;
        let delta = time_ms / 1000.0 - self.time;
        self.time = time_ms / 1000.0;
        self.next_time += overlap + if overlap >= self.gap { 4.0 } else { self.gap - overlap };
        Some(Tick {
            time: self.time,
            delta,
            frame: self.frame,
        })
    }

    /// True when an idle check is due on this frame.
    #[inline]
    pub fn idle_check_due(&self) -> bool {
        self.cfg.idle_frames > 0 && self.frame % self.cfg.idle_frames == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asleep_ticker_is_inert() {
        let mut t = Ticker::new(TickerConfig::default());
        assert_eq!(t.advance(16.0, true), None);
    }

    #[test]
    fn frames_advance_by_elapsed_time() {
        let mut t = Ticker::new(TickerConfig::default());
        t.wake(1000.0);
        let tick = t.advance(1016.0, false).unwrap();
        assert_eq!(tick.frame, 1);
        assert!((tick.delta - 0.016).abs() < 1e-9);
        assert!((tick.time - 0.016).abs() < 1e-9);
    }

    #[test]
    fn stalls_are_clamped_to_adjusted_lag() {
        let mut t = Ticker::new(TickerConfig::default());
        t.wake(0.0);
        t.advance(16.0, false).unwrap();
        let tick = t.advance(16.0 + 2000.0, false).unwrap();
        assert!((tick.delta - 0.033).abs() < 1e-9);
    }

    #[test]
    fn fps_cap_skips_early_frames() {
        let mut t = Ticker::new(TickerConfig {
            fps: Some(10.0),
            ..TickerConfig::default()
        });
        t.wake(0.0);
        assert!(t.advance(16.0, false).is_some());
        // next frame due at 100ms
        assert!(t.advance(50.0, false).is_none());
        assert!(t.advance(50.0, true).is_some());
    }

    #[test]
    fn wake_does_not_replay_sleep() {
        let mut t = Ticker::new(TickerConfig::default());
        t.wake(0.0);
        t.advance(100.0, false).unwrap();
        t.sleep();
        t.wake(10_000.0);
        let tick = t.advance(10_016.0, false).unwrap();
        assert!((tick.delta - 0.016).abs() < 1e-9);
        assert!((tick.time - 0.116).abs() < 1e-9);
    }
}
