use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vizij_timeline_core::{Config, Engine, ManualClock, Target, TickerConfig, TweenVars};

fn engine_with(cfg: Config) -> (Engine, ManualClock) {
    let clock = ManualClock::new();
    let engine = Engine::with_clock(cfg, Box::new(clock.clone()));
    (engine, clock)
}

fn linear(duration: f64) -> TweenVars {
    TweenVars::new().duration(duration).ease("none")
}

#[test]
fn clock_drives_the_root_timeline() {
    let (mut engine, clock) = engine_with(Config::default());
    let x = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    assert!(engine.is_awake());

    clock.advance(100.0);
    let tick = engine.tick(None).unwrap();
    assert_eq!(tick.frame, 1);
    assert_abs_diff_eq!(tick.delta, 0.1, epsilon = 1e-9);
    assert_abs_diff_eq!(x.get(), 0.1, epsilon = 1e-6);

    clock.advance(50.0);
    engine.tick(None).unwrap();
    assert_abs_diff_eq!(x.get(), 0.15, epsilon = 1e-6);
}

#[test]
fn stalls_advance_by_the_adjusted_lag() {
    let (mut engine, clock) = engine_with(Config::default());
    let x = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    clock.advance(2000.0);
    let tick = engine.tick(None).unwrap();
    assert_abs_diff_eq!(tick.delta, 0.033, epsilon = 1e-9);
    assert_abs_diff_eq!(x.get(), 0.033, epsilon = 1e-6);
}

#[test]
fn idle_engine_sweeps_and_sleeps_then_wakes_without_replay() {
    let cfg = Config {
        ticker: TickerConfig {
            idle_frames: 2,
            ..TickerConfig::default()
        },
        ..Config::default()
    };
    let (mut engine, clock) = engine_with(cfg);
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(0.1).prop("value", 1.0));

    clock.advance(100.0);
    engine.tick(None).unwrap();
    assert_eq!(engine.parent(t), None);
    assert!(engine.contains(t));

    clock.advance(100.0);
    engine.tick(None).unwrap();
    assert!(!engine.contains(t));
    assert!(!engine.is_awake());

    clock.advance(5000.0);
    assert!(engine.tick(None).is_none());

    let y = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&y)], linear(1.0).prop("value", 1.0));
    assert!(engine.is_awake());
    clock.advance(16.0);
    let tick = engine.tick(None).unwrap();
    assert_abs_diff_eq!(tick.delta, 0.016, epsilon = 1e-9);
    assert_abs_diff_eq!(y.get(), 0.016, epsilon = 1e-6);
}

#[test]
fn listeners_run_after_each_frame_and_keep_the_clock_awake() {
    let cfg = Config {
        ticker: TickerConfig {
            idle_frames: 1,
            ..TickerConfig::default()
        },
        ..Config::default()
    };
    let (mut engine, clock) = engine_with(cfg);
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    let id = engine.add_listener(move |tick| sink.borrow_mut().push(tick.frame));

    for _ in 0..3 {
        clock.advance(20.0);
        engine.tick(None).unwrap();
    }
    assert_eq!(*frames.borrow(), vec![1, 2, 3]);
    assert!(engine.is_awake());

    assert!(engine.remove_listener(id));
    assert!(!engine.remove_listener(id));
    clock.advance(20.0);
    engine.tick(None).unwrap();
    assert!(!engine.is_awake());
    assert_eq!(frames.borrow().len(), 3);
}

#[test]
fn fps_cap_skips_early_frames_unless_forced() {
    let cfg = Config {
        ticker: TickerConfig {
            fps: Some(10.0),
            ..TickerConfig::default()
        },
        ..Config::default()
    };
    let (mut engine, clock) = engine_with(cfg);
    let x = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&x)], linear(10.0).prop("value", 1.0));

    clock.set(16.0);
    assert!(engine.tick(None).is_some());
    clock.set(50.0);
    assert!(engine.tick(None).is_none());
    clock.set(101.0);
    assert!(engine.tick(None).is_some());
    assert!(engine.tick(Some(120.0)).is_some());
    assert_eq!(engine.ticker().frame(), 3);
}

#[test]
fn manual_update_ignores_bad_deltas() {
    let (mut engine, _clock) = engine_with(Config::default());
    let x = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    assert!(engine.update(f64::NAN).is_empty());
    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 0.5, epsilon = 1e-6);
}
