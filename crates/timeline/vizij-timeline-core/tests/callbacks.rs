use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vizij_timeline_core::{
    CallbackKind, Config, Engine, EventKind, ManualClock, NodeEvent, Target, TimelineVars,
    TweenVars,
};

fn engine() -> Engine {
    Engine::with_clock(Config::default(), Box::new(ManualClock::new()))
}

fn linear(duration: f64) -> TweenVars {
    TweenVars::new().duration(duration).ease("none")
}

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, tag: &'static str) -> impl FnMut(&NodeEvent) + 'static {
    let log = Rc::clone(log);
    move |_| log.borrow_mut().push(tag.to_string())
}

fn kinds(events: &[NodeEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

#[test]
fn lifecycle_callbacks_fire_in_order() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let log: Log = Rc::default();
    engine.to(
        [Target::cell(&x)],
        linear(1.0)
            .prop("value", 1.0)
            .on_start(recorder(&log, "start"))
            .on_update(recorder(&log, "update"))
            .on_complete(recorder(&log, "complete")),
    );
    let first = kinds(&engine.update(0.5).events);
    assert_eq!(first, vec![EventKind::Start, EventKind::Update]);
    let second = kinds(&engine.update(0.5).events);
    assert_eq!(second, vec![EventKind::Update, EventKind::Complete]);
    assert_eq!(*log.borrow(), vec!["start", "update", "update", "complete"]);
}

#[test]
fn repeat_and_reverse_complete() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let cycles = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&cycles);
    let log: Log = Rc::default();
    let t = engine.to(
        [Target::cell(&x)],
        linear(1.0)
            .prop("value", 1.0)
            .repeat(1)
            .yoyo(true)
            .on_repeat(move |e| {
                if let EventKind::Repeat { cycle } = e.kind {
                    sink.borrow_mut().push(cycle);
                }
            })
            .on_reverse_complete(recorder(&log, "reverse_complete")),
    );
    engine.update(0.5);
    engine.update(1.0);
    assert_eq!(*cycles.borrow(), vec![1]);

    engine.reverse(t).unwrap();
    engine.update(2.0);
    assert_eq!(*log.borrow(), vec!["reverse_complete"]);
    assert_eq!(engine.total_time(t), Some(0.0));
}

#[test]
fn interrupt_fires_on_overwrite_and_kill() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let log: Log = Rc::default();
    engine.to(
        [Target::cell(&x)],
        linear(1.0)
            .prop("value", 1.0)
            .on_interrupt(recorder(&log, "a"))
            .on_complete(recorder(&log, "a complete")),
    );
    engine.update(0.5);
    engine.to([Target::cell(&x)], linear(1.0).prop("value", 2.0));
    engine.update(0.1);
    assert_eq!(*log.borrow(), vec!["a"]);

    let y = Rc::new(Cell::new(0.0f32));
    let done = engine.to(
        [Target::cell(&y)],
        linear(0.1)
            .prop("value", 1.0)
            .on_interrupt(recorder(&log, "done")),
    );
    engine.retain(done, true).unwrap();
    engine.update(0.5);
    engine.kill(done).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn delayed_call_fires_once() {
    let mut engine = engine();
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    engine.delayed_call(1.0, move |_| c.set(c.get() + 1));
    engine.update(0.5);
    assert_eq!(calls.get(), 0);
    engine.update(0.6);
    assert_eq!(calls.get(), 1);
    engine.update(1.0);
    assert_eq!(calls.get(), 1);
}

#[test]
fn timeline_call_runs_when_the_playhead_crosses_it() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    let tl = engine.timeline(TimelineVars::new());
    engine
        .timeline_to(tl, [Target::cell(&x)], linear(1.0).prop("value", 1.0), 0.0)
        .unwrap();
    engine.call(tl, move |_| c.set(c.get() + 1), 0.5).unwrap();

    engine.update(0.4);
    assert_eq!(calls.get(), 0);
    engine.update(0.2);
    assert_eq!(calls.get(), 1);
    engine.update(0.2);
    assert_eq!(calls.get(), 1);
}

#[test]
fn callbacks_can_be_installed_and_cleared_later() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let log: Log = Rc::default();
    let t = engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0).paused(true));
    engine
        .event_callback(t, CallbackKind::Complete, recorder(&log, "complete"))
        .unwrap();
    engine.seek(t, 1.0, false).unwrap();
    assert_eq!(log.borrow().len(), 1);

    engine.clear_event_callback(t, CallbackKind::Complete).unwrap();
    engine.seek(t, 0.0, false).unwrap();
    engine.seek(t, 1.0, false).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn suppressed_seeks_raise_nothing() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let t = engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0).paused(true));
    engine.seek(t, 1.0, true).unwrap();
    assert!(engine.outputs().is_empty());
    engine.seek(t, 0.5, false).unwrap();
    let drained = engine.drain_events();
    assert_eq!(kinds(&drained), vec![EventKind::Update]);
    assert!(engine.outputs().is_empty());
}

#[test]
fn event_buffer_is_capped() {
    let cfg = Config {
        max_events_per_tick: 1,
        ..Config::default()
    };
    let mut engine = Engine::with_clock(cfg, Box::new(ManualClock::new()));
    let x = Rc::new(Cell::new(0.0f32));
    engine.to([Target::cell(&x)], linear(1.0).prop("value", 1.0));
    let out = engine.update(1.0);
    assert_eq!(out.events.len(), 1);
    assert_eq!(out.dropped_events, 2);
}
