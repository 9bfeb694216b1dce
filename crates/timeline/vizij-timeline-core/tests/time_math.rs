use std::cell::Cell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vizij_timeline_core::{
    cycle_position, total_span, Config, Engine, ManualClock, Target, TimelineVars, TweenVars,
};

fn engine() -> Engine {
    Engine::with_clock(Config::default(), Box::new(ManualClock::new()))
}

fn linear(duration: f64) -> TweenVars {
    TweenVars::new().duration(duration).ease("none")
}

#[test]
fn span_counts_cycles_and_gaps() {
    assert_abs_diff_eq!(total_span(1.0, 0, 0.5), 1.0);
    assert_abs_diff_eq!(total_span(1.0, 3, 0.0), 4.0);
    assert_abs_diff_eq!(total_span(2.0, 2, 0.5), 7.0);
}

#[test]
fn yoyo_cycles_alternate_direction() {
    // cycle 1 runs backward: 0.25 into it is 0.75 of the way through
    assert_eq!(cycle_position(1.25, 1.0, 3, 0.0, true), (0.75, 1));
    assert_eq!(cycle_position(2.5, 1.0, 3, 0.0, true), (0.5, 2));
    // past the end the last cycle holds its end (odd cycle -> start)
    assert_eq!(cycle_position(10.0, 1.0, 3, 0.0, true), (0.0, 3));
}

#[test]
fn repeat_delay_holds_cycle_end() {
    let (time, cycle) = cycle_position(1.25, 1.0, 2, 0.5, false);
    assert_eq!(cycle, 0);
    assert_abs_diff_eq!(time, 1.0);
    let (time, cycle) = cycle_position(1.75, 1.0, 2, 0.5, false);
    assert_eq!(cycle, 1);
    assert_abs_diff_eq!(time, 0.25);
}

#[test]
fn seek_then_progress_round_trips() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(2.0).prop("value", 1.0));
    for step in 0..=10 {
        let p = f64::from(step) / 10.0;
        engine.seek(t, p * 2.0, true).unwrap();
        assert_abs_diff_eq!(engine.progress(t).unwrap(), p, epsilon = 1e-9);
        assert_abs_diff_eq!(x.get(), p as f32, epsilon = 1e-6);
    }
}

#[test]
fn repeated_yoyo_tween_reports_cycle_and_ratio() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to(
        [Target::cell(&x)],
        linear(1.0).prop("value", 1.0).repeat(3).yoyo(true),
    );
    assert_abs_diff_eq!(engine.total_duration(t).unwrap(), 4.0);

    engine.seek(t, 2.5, true).unwrap();
    assert_eq!(engine.cycle(t), Some(2));
    assert_eq!(engine.iteration(t), Some(3));
    assert_abs_diff_eq!(engine.progress(t).unwrap(), 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(x.get(), 0.5, epsilon = 1e-6);

    engine.seek(t, 1.25, true).unwrap();
    assert_eq!(engine.cycle(t), Some(1));
    assert_abs_diff_eq!(x.get(), 0.75, epsilon = 1e-6);
}

#[test]
fn end_time_is_start_plus_scaled_total_duration() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to(
        [Target::cell(&x)],
        linear(2.0).prop("value", 1.0).repeat(1).repeat_delay(0.5),
    );
    let tl = engine.timeline(TimelineVars::new().delay(1.0));
    engine
        .timeline_to(tl, [Target::cell(&x)], linear(1.5).prop("value", 2.0), 0.5)
        .unwrap();

    for (id, scale) in [(t, 2.0), (tl, 0.25)] {
        engine.set_time_scale(id, scale).unwrap();
        let start = engine.start_time(id).unwrap();
        let total = engine.total_duration(id).unwrap();
        let end = engine.end_time(id).unwrap();
        assert_abs_diff_eq!(start + total / scale, end, epsilon = 1e-9);
    }
    assert_abs_diff_eq!(engine.total_duration(t).unwrap(), 4.5);
    assert_abs_diff_eq!(engine.total_duration(tl).unwrap(), 2.0);
}

#[test]
fn total_time_never_decreases_during_forward_play() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0).repeat(2));
    let mut last = 0.0;
    for _ in 0..250 {
        engine.update(1.0 / 60.0);
        let now = engine.total_time(t).unwrap();
        assert!(now >= last, "total time went back from {last} to {now}");
        last = now;
    }
    assert_abs_diff_eq!(last, 3.0);
}

#[test]
fn nested_time_scales_multiply() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tl = engine.timeline(TimelineVars::new().time_scale(2.0));
    engine
        .timeline_to(tl, [Target::cell(&x)], linear(1.0).prop("value", 1.0), 0.0)
        .unwrap();
    engine.update(0.25);
    assert_abs_diff_eq!(x.get(), 0.5, epsilon = 1e-6);
}

#[test]
fn retiming_mid_flight_does_not_jump() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(2.0).prop("value", 1.0));
    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 0.25, epsilon = 1e-6);

    engine.set_time_scale(t, 0.5).unwrap();
    assert_abs_diff_eq!(x.get(), 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(engine.start_time(t).unwrap(), -0.5, epsilon = 1e-9);

    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 0.375, epsilon = 1e-6);
}

#[test]
fn reversing_mid_flight_plays_back_from_the_same_point() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    engine.update(0.75);
    engine.reverse(t).unwrap();
    assert_abs_diff_eq!(x.get(), 0.75, epsilon = 1e-6);
    engine.update(0.25);
    assert_abs_diff_eq!(x.get(), 0.5, epsilon = 1e-6);
    assert_eq!(engine.is_reversed(t), Some(true));
}

#[test]
fn tween_duration_change_keeps_progress() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(2.0).prop("value", 1.0));
    engine.update(0.5);
    engine.set_duration(t, 4.0).unwrap();
    assert_abs_diff_eq!(engine.total_progress(t).unwrap(), 0.25, epsilon = 1e-9);
    assert_abs_diff_eq!(engine.total_time(t).unwrap(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(x.get(), 0.25, epsilon = 1e-6);
    engine.update(1.0);
    assert_abs_diff_eq!(x.get(), 0.5, epsilon = 1e-6);
}

#[test]
fn timeline_duration_change_rescales() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tl = engine.timeline(TimelineVars::new());
    for _ in 0..2 {
        engine
            .timeline_to(tl, [Target::cell(&x)], linear(1.0).prop("value", 1.0), "+=0")
            .unwrap();
    }
    engine.set_duration(tl, 4.0).unwrap();
    assert_abs_diff_eq!(engine.time_scale(tl).unwrap(), 0.5);
    assert_abs_diff_eq!(engine.duration(tl).unwrap(), 2.0);
    assert_abs_diff_eq!(engine.end_time(tl).unwrap(), 4.0);
}

#[test]
fn invalid_arguments_are_rejected() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    assert!(engine.seek(t, f64::NAN, false).is_err());
    assert!(engine.set_duration(t, -1.0).is_err());
    assert!(engine.set_time_scale(t, f64::INFINITY).is_err());
}
