use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vizij_scroll_core::{
    Layout, Link, RegionConfig, ScrollCallbackKind, ScrollError, ScrollEvent, ScrollMapper,
    ScrollState, Snap, ToggleActions,
};
use vizij_timeline_core::{Config, Engine, ManualClock, NodeId, Target, TimelineError, TweenVars};

fn engine() -> Engine {
    Engine::with_clock(Config::default(), Box::new(ManualClock::new()))
}

fn tween(engine: &mut Engine, x: &Rc<Cell<f32>>, duration: f64) -> NodeId {
    engine.to(
        [Target::cell(x)],
        TweenVars::new()
            .duration(duration)
            .ease("none")
            .prop("value", 100.0),
    )
}

#[test]
fn window_progress_and_single_transitions() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(&mut engine, RegionConfig::new(100.0, 300.0))
        .unwrap();

    let mut progress = Vec::new();
    let mut states = Vec::new();
    let mut transitions = Vec::new();
    for pos in [50.0, 100.0, 200.0, 300.0, 400.0] {
        let out = mapper.update(&mut engine, pos).unwrap();
        for event in out.for_region(region) {
            if let ScrollEvent::State { from, to } = event {
                transitions.push((*from, *to));
            }
        }
        progress.push(mapper.progress(region).unwrap());
        states.push(mapper.state(region).unwrap());
    }

    assert_eq!(progress, vec![0.0, 0.0, 0.5, 1.0, 1.0]);
    assert_eq!(
        states,
        vec![
            ScrollState::Before,
            ScrollState::Entering,
            ScrollState::Active,
            ScrollState::After,
            ScrollState::After,
        ]
    );
    let count = |from, to| transitions.iter().filter(|t| **t == (from, to)).count();
    assert_eq!(count(ScrollState::Entering, ScrollState::Active), 1);
    assert_eq!(count(ScrollState::Active, ScrollState::After), 1);
}

#[test]
fn scrolling_back_passes_through_leaving() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(&mut engine, RegionConfig::new(100.0, 300.0))
        .unwrap();
    mapper.update(&mut engine, 400.0).unwrap();
    assert_eq!(mapper.state(region), Some(ScrollState::After));

    let out = mapper.update(&mut engine, 250.0).unwrap();
    let events: Vec<_> = out.for_region(region).cloned().collect();
    assert!(events.contains(&ScrollEvent::EnterBack));
    assert_eq!(mapper.state(region), Some(ScrollState::Leaving));

    mapper.update(&mut engine, 150.0).unwrap();
    assert_eq!(mapper.state(region), Some(ScrollState::Active));
    let out = mapper.update(&mut engine, 0.0).unwrap();
    assert!(out.for_region(region).any(|e| *e == ScrollEvent::LeaveBack));
    assert_eq!(mapper.state(region), Some(ScrollState::Before));
}

#[test]
fn seek_link_follows_scroll() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tw = tween(&mut engine, &x, 2.0);
    let mut mapper = ScrollMapper::new();
    mapper
        .add(&mut engine, RegionConfig::new(100.0, 300.0).link(Link::Seek(tw)))
        .unwrap();
    assert_eq!(engine.is_paused(tw), Some(true));

    mapper.update(&mut engine, 200.0).unwrap();
    assert_abs_diff_eq!(engine.total_time(tw).unwrap(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(x.get(), 50.0, epsilon = 1e-3);

    // the clock does not move a scroll-linked node
    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 50.0, epsilon = 1e-3);

    mapper.update(&mut engine, 150.0).unwrap();
    assert_abs_diff_eq!(x.get(), 25.0, epsilon = 1e-3);
}

#[test]
fn killed_link_does_not_stop_other_regions() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let seeked = tween(&mut engine, &x, 1.0);
    let toggled = tween(&mut engine, &x, 1.0);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut mapper = ScrollMapper::new();
    let a = mapper
        .add(&mut engine, RegionConfig::new(0.0, 100.0).link(Link::Seek(seeked)))
        .unwrap();
    let b = mapper
        .add(
            &mut engine,
            RegionConfig::new(0.0, 100.0).toggle_actions(toggled, ToggleActions::default()),
        )
        .unwrap();
    let c = mapper
        .add(
            &mut engine,
            RegionConfig::new(0.0, 100.0).on_progress(move |p| sink.borrow_mut().push(p)),
        )
        .unwrap();
    engine.kill(seeked).unwrap();
    engine.kill(toggled).unwrap();

    let out = mapper.update(&mut engine, 50.0).unwrap();
    let failed: Vec<_> = out.errors.iter().map(|e| (e.region, e.error.clone())).collect();
    assert_eq!(
        failed,
        vec![
            (a, ScrollError::Timeline(TimelineError::NodeNotFound { id: seeked })),
            (b, ScrollError::Timeline(TimelineError::NodeNotFound { id: toggled })),
        ]
    );
    assert_eq!(*seen.borrow(), vec![0.5]);
    for id in [a, b, c] {
        assert_eq!(mapper.progress(id), Some(0.5));
        assert_eq!(mapper.state(id), Some(ScrollState::Entering));
    }

    // dead links are dropped, so later updates run clean
    let out = mapper.update(&mut engine, 60.0).unwrap();
    assert!(out.errors.is_empty());
    assert_eq!(mapper.progress(a), Some(0.6));
    assert_eq!(*seen.borrow(), vec![0.5, 0.6]);
}

#[test]
fn total_progress_link_without_lag_is_immediate() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tw = tween(&mut engine, &x, 1.0);
    let mut mapper = ScrollMapper::new();
    mapper
        .add(
            &mut engine,
            RegionConfig::new(0.0, 1000.0).link(Link::TotalProgress(tw)),
        )
        .unwrap();
    mapper.update(&mut engine, 750.0).unwrap();
    assert_abs_diff_eq!(x.get(), 75.0, epsilon = 1e-3);
}

#[test]
fn scrub_lag_catches_up_over_ticks() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tw = tween(&mut engine, &x, 1.0);
    let mut mapper = ScrollMapper::new();
    mapper
        .add(
            &mut engine,
            RegionConfig::new(100.0, 300.0)
                .link(Link::TotalProgress(tw))
                .scrub(0.5),
        )
        .unwrap();

    mapper.update(&mut engine, 200.0).unwrap();
    assert_abs_diff_eq!(x.get(), 0.0);

    mapper.tick(&mut engine, 0.25).unwrap();
    assert_abs_diff_eq!(x.get(), 25.0, epsilon = 1e-3);
    mapper.tick(&mut engine, 0.25).unwrap();
    assert_abs_diff_eq!(x.get(), 37.5, epsilon = 1e-3);
    mapper.tick(&mut engine, 1.0).unwrap();
    assert_abs_diff_eq!(x.get(), 50.0, epsilon = 1e-3);
}

#[test]
fn toggle_actions_drive_playback() {
    let mut engine = engine();
    let x = Rc::new(Cell::new(0.0f32));
    let tw = tween(&mut engine, &x, 1.0);
    engine.pause(tw).unwrap();

    let actions: ToggleActions = "play none none reverse".parse().unwrap();
    let mut mapper = ScrollMapper::new();
    mapper
        .add(
            &mut engine,
            RegionConfig::new(100.0, 300.0).toggle_actions(tw, actions),
        )
        .unwrap();

    mapper.update(&mut engine, 50.0).unwrap();
    engine.update(0.25);
    assert_abs_diff_eq!(x.get(), 0.0);

    mapper.update(&mut engine, 150.0).unwrap();
    assert_eq!(engine.is_paused(tw), Some(false));
    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 50.0, epsilon = 1e-3);

    mapper.update(&mut engine, 50.0).unwrap();
    assert_eq!(engine.is_reversed(tw), Some(true));
    engine.update(0.5);
    assert_abs_diff_eq!(x.get(), 0.0, epsilon = 1e-3);
}

#[test]
fn callbacks_fire_in_crossing_order() {
    let mut engine = engine();
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut cfg = RegionConfig::new(100.0, 300.0).pin(true);
    for kind in [
        ScrollCallbackKind::Enter,
        ScrollCallbackKind::Leave,
        ScrollCallbackKind::Toggle,
        ScrollCallbackKind::Pin,
        ScrollCallbackKind::Update,
    ] {
        let log = log.clone();
        cfg = cfg.on(kind, move |e| log.borrow_mut().push(format!("{e:?}")));
    }
    let mut mapper = ScrollMapper::new();
    let region = mapper.add(&mut engine, cfg).unwrap();
    assert_eq!(mapper.pin_spacing(region), Some(200.0));

    // jump straight over the window
    mapper.update(&mut engine, 500.0).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            "Enter",
            "Toggle { active: true }",
            "Pin { pinned: true }",
            "Leave",
            "Toggle { active: false }",
            "Pin { pinned: false }",
            "Update { progress: 1.0 }",
        ]
    );

    // unchanged progress does not repeat the update callback
    log.borrow_mut().clear();
    mapper.update(&mut engine, 600.0).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn progress_callback_link() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut mapper = ScrollMapper::new();
    mapper
        .add(
            &mut engine,
            RegionConfig::new(0.0, 100.0).on_progress(move |p| sink.borrow_mut().push(p)),
        )
        .unwrap();
    for pos in [-10.0, 25.0, 25.0, 80.0] {
        mapper.update(&mut engine, pos).unwrap();
    }
    assert_eq!(*seen.borrow(), vec![0.0, 0.25, 0.8]);
}

#[test]
fn snaps_after_idle_delay() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(
            &mut engine,
            RegionConfig::new(0.0, 200.0).snap(Snap::increment(0.25).with_delay(0.1)),
        )
        .unwrap();

    mapper.update(&mut engine, 60.0).unwrap();
    assert!(mapper.tick(&mut engine, 0.06).unwrap().events.is_empty());

    // new input restarts the idle timer
    mapper.update(&mut engine, 62.0).unwrap();
    assert!(mapper.tick(&mut engine, 0.06).unwrap().events.is_empty());

    let out = mapper.tick(&mut engine, 0.06).unwrap();
    let snaps: Vec<_> = out
        .for_region(region)
        .filter_map(|e| match e {
            ScrollEvent::Snap { progress, scroll } => Some((*progress, *scroll)),
            _ => None,
        })
        .collect();
    assert_eq!(snaps.len(), 1);
    assert_abs_diff_eq!(snaps[0].0, 0.25);
    assert_abs_diff_eq!(snaps[0].1, 50.0);

    // fires once per idle period
    assert!(mapper.tick(&mut engine, 1.0).unwrap().events.is_empty());
}

#[test]
fn no_snap_outside_the_window() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    mapper
        .add(
            &mut engine,
            RegionConfig::new(100.0, 200.0).snap(Snap::points(vec![0.0, 1.0])),
        )
        .unwrap();
    mapper.update(&mut engine, 20.0).unwrap();
    assert!(mapper.tick(&mut engine, 1.0).unwrap().events.is_empty());
}

#[test]
fn refresh_recomputes_keyword_edges() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(
            &mut engine,
            RegionConfig::parse("top bottom", "+=200")
                .unwrap()
                .layout(Layout::new(800.0, 1000.0, 400.0)),
        )
        .unwrap();
    assert_eq!(mapper.window(region), Some((200.0, 400.0)));

    mapper.update(&mut engine, 300.0).unwrap();
    assert_abs_diff_eq!(mapper.progress(region).unwrap(), 0.5);

    let out = mapper
        .refresh(&mut engine, region, Layout::new(800.0, 1200.0, 400.0))
        .unwrap();
    assert!(out.for_region(region).any(|e| *e == ScrollEvent::LeaveBack));
    assert_eq!(mapper.window(region), Some((400.0, 600.0)));
    assert_eq!(mapper.state(region), Some(ScrollState::Before));

    mapper.refresh_viewport(&mut engine, 1000.0).unwrap();
    assert_eq!(mapper.window(region), Some((200.0, 400.0)));
    assert_eq!(mapper.state(region), Some(ScrollState::Entering));
}

#[test]
fn zero_length_window_jumps() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(&mut engine, RegionConfig::new(300.0, 100.0))
        .unwrap();
    assert_eq!(mapper.window(region), Some((300.0, 300.0)));
    mapper.update(&mut engine, 299.0).unwrap();
    assert_eq!(mapper.progress(region), Some(0.0));
    mapper.update(&mut engine, 300.0).unwrap();
    assert_eq!(mapper.progress(region), Some(1.0));
    assert_eq!(mapper.state(region), Some(ScrollState::After));
}

#[test]
fn errors() {
    let mut engine = engine();
    let mut mapper = ScrollMapper::new();
    let region = mapper
        .add(&mut engine, RegionConfig::new(0.0, 10.0))
        .unwrap();
    assert!(matches!(
        mapper.update(&mut engine, f64::NAN),
        Err(ScrollError::InvalidScroll { .. })
    ));
    assert!(mapper.remove(region));
    assert!(!mapper.remove(region));
    assert!(matches!(
        mapper.refresh(&mut engine, region, Layout::default()),
        Err(ScrollError::RegionNotFound { .. })
    ));
    assert!(RegionConfig::parse("top", "bottom top").is_err());

    let x = Rc::new(Cell::new(0.0f32));
    let tw = tween(&mut engine, &x, 1.0);
    engine.kill(tw).unwrap();
    assert!(matches!(
        mapper.add(&mut engine, RegionConfig::new(0.0, 1.0).link(Link::Seek(tw))),
        Err(ScrollError::Timeline(_))
    ));
}

#[test]
fn events_serialize_with_a_type_tag() {
    let json = serde_json::to_string(&ScrollEvent::Toggle { active: true }).unwrap();
    assert_eq!(json, r#"{"type":"Toggle","active":true}"#);
    let state: ScrollState = serde_json::from_str(r#""Entering""#).unwrap();
    assert_eq!(state, ScrollState::Entering);
}
