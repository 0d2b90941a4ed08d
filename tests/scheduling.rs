//! Time slicing, coalescing, transitions and effects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use spark_fiber::{
    Cleanup, Component, Element, FiberId, ManualHost, MemoryRenderer, NodeHandle, Reconciler,
    ReconcilerConfig, RenderError, RenderOptions,
};

type Log = Rc<RefCell<Vec<String>>>;

fn manual(step: Duration, budget: Duration) -> (Reconciler<MemoryRenderer, ManualHost>, NodeHandle, ManualHost) {
    let mut renderer = MemoryRenderer::new();
    let body = renderer.create_container("body");
    let host = ManualHost::with_step(step);
    let config = ReconcilerConfig::default().frame_budget(budget);
    (Reconciler::with_host(renderer, host.clone(), config), body, host)
}

fn long_list(len: usize) -> Element {
    Element::host("ul").children(
        (0..len)
            .map(|i| Element::host("li").key(i).children(format!("item {i};")))
            .collect::<Vec<_>>(),
    )
}

// =============================================================================
// Scheduling
// =============================================================================

#[test]
fn test_render_waits_for_tick() {
    let (mut r, body, _) = manual(Duration::ZERO, Duration::from_millis(16));
    r.render(Element::host("p"), body, RenderOptions::default());

    assert!(r.has_pending_work());
    assert_eq!(r.renderer().serialize(body), "");

    assert!(!r.tick());
    assert_eq!(r.renderer().serialize(body), "<p></p>");
}

#[test]
fn test_repeated_updates_coalesce() {
    let (mut r, body, _) = manual(Duration::ZERO, Duration::from_millis(16));
    let log: Log = Rc::default();
    let done = |name: &'static str| {
        let log = log.clone();
        RenderOptions::new().done(move |result| {
            assert!(result.is_ok());
            log.borrow_mut().push(name.to_string());
        })
    };

    let first = r.render(Element::host("p").children("one"), body, done("first"));
    let second = r.render(Element::host("p").children("two"), body, done("second"));

    assert_eq!(first, second);
    assert_eq!(r.pending_batches(), 1);

    r.request_update(first);
    assert_eq!(r.pending_batches(), 1);

    r.run_until_idle();
    assert_eq!(r.renderer().text_content(body), "two");
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn test_time_slicing_matches_sync_output() {
    // Every clock read advances 1ms against a 4ms budget
    let (mut sliced, body, _) = manual(Duration::from_millis(1), Duration::from_millis(4));
    sliced.render(long_list(20), body, RenderOptions::default());

    assert!(sliced.tick());
    assert_eq!(sliced.pending_batches(), 1, "batch suspended, not dropped");
    assert_eq!(sliced.renderer().serialize(body), "", "nothing commits mid-batch");

    let ticks = 1 + sliced.run_until_idle();
    assert!(ticks > 5, "expected the batch to span many ticks, got {ticks}");

    let (mut sync, sync_body, _) = manual(Duration::from_millis(1), Duration::from_millis(4));
    sync.render(long_list(20), sync_body, RenderOptions::new().sync(true));
    assert_eq!(sync.run_until_idle(), 1);
    assert!(sync.is_sync());

    assert_eq!(
        sliced.renderer().serialize(body),
        sync.renderer().serialize(sync_body)
    );
    assert!(sliced.renderer().text_content(body).starts_with("item 0;item 1;"));
}

#[test]
fn test_sliced_update_after_reorder() {
    let (mut r, body, _) = manual(Duration::from_millis(1), Duration::from_millis(3));
    r.render(long_list(10), body, RenderOptions::default());
    r.run_until_idle();

    let reversed = Element::host("ul").children(
        (0..10usize)
            .rev()
            .map(|i| Element::host("li").key(i).children(format!("item {i};")))
            .collect::<Vec<_>>(),
    );
    r.renderer_mut().reset_stats();
    r.render(reversed, body, RenderOptions::default());
    r.run_until_idle();

    assert!(r.renderer().text_content(body).starts_with("item 9;item 8;"));
    assert_eq!(r.renderer().stats().created, 0);
}

#[test]
fn test_render_during_suspended_batch_runs_after_it() {
    let (mut r, body, _) = manual(Duration::from_millis(1), Duration::from_millis(3));
    let letters = |keys: &[&str]| {
        Element::host("ul").children(
            keys.iter()
                .map(|&k| Element::host("li").key(k).children(k))
                .collect::<Vec<_>>(),
        )
    };

    r.render(letters(&["a", "b", "c", "d", "e"]), body, RenderOptions::default());
    assert!(r.tick());
    assert_eq!(r.pending_batches(), 1);

    // The suspended batch already diffed the root, so this one queues behind it
    let outcome: Rc<Cell<Option<bool>>> = Rc::default();
    let options = {
        let outcome = outcome.clone();
        RenderOptions::new().done(move |result| outcome.set(Some(result.is_ok())))
    };
    r.render(letters(&["x", "y"]), body, options);
    assert_eq!(r.pending_batches(), 2);

    r.run_until_idle();
    assert_eq!(r.renderer().text_content(body), "xy");
    assert_eq!(outcome.get(), Some(true));
}

#[test]
fn test_pending_input_defers_work() {
    let (mut r, body, host) = manual(Duration::ZERO, Duration::from_millis(16));
    let clock = host.clock();
    r.render(Element::host("p"), body, RenderOptions::default());

    clock.set_input_pending(true);
    assert!(r.tick(), "flush yields and reschedules itself");
    assert_eq!(r.renderer().serialize(body), "");

    clock.set_input_pending(false);
    r.run_until_idle();
    assert_eq!(r.renderer().serialize(body), "<p></p>");
}

#[test]
fn test_failed_batch_does_not_block_queue() {
    let mut renderer = MemoryRenderer::new();
    let left = renderer.create_container("left");
    let right = renderer.create_container("right");
    let mut r = Reconciler::with_host(renderer, ManualHost::new(), ReconcilerConfig::default());

    let broken = Component::fallible("Broken", |_, _| Err(RenderError::new("nope")));
    let log: Log = Rc::default();
    let done = |side: &'static str| {
        let log = log.clone();
        RenderOptions::new().done(move |result| {
            log.borrow_mut().push(format!("{side}: {}", result.is_ok()));
        })
    };

    r.render(Element::component(&broken), left, done("left"));
    r.render(Element::host("p").children("ok"), right, done("right"));
    assert_eq!(r.pending_batches(), 2);

    r.run_until_idle();

    assert_eq!(*log.borrow(), vec!["left: false", "right: true"]);
    assert_eq!(r.renderer().text_content(right), "ok");
    assert_eq!(r.renderer().serialize(left), "");
}

// =============================================================================
// Effects
// =============================================================================

fn logger(log: &Log) -> Component {
    let log = log.clone();
    Component::new("Logger", move |props, cx| {
        let name = props.get("name").map(ToString::to_string).unwrap_or_default();
        let dep = props.get("dep").map(ToString::to_string).unwrap_or_default();

        for kind in ["layout", "passive"] {
            let log = log.clone();
            let name = name.clone();
            let setup = move || {
                log.borrow_mut().push(format!("{kind} {name}"));
                let log = log.clone();
                Some(Box::new(move || log.borrow_mut().push(format!("cleanup {kind} {name}"))) as Cleanup)
            };
            if kind == "layout" {
                cx.use_layout_effect(dep.clone(), setup);
            } else {
                cx.use_effect(dep.clone(), setup);
            }
        }
        Element::host("span").children(name)
    })
}

fn loggers(component: &Component, deps: &[(&str, i64)]) -> Element {
    Element::host("div").children(
        deps.iter()
            .map(|&(name, dep)| {
                Element::component(component)
                    .key(name)
                    .attr("name", name)
                    .attr("dep", dep)
            })
            .collect::<Vec<_>>(),
    )
}

#[test]
fn test_layout_now_passive_later() {
    let (mut r, body, _) = manual(Duration::ZERO, Duration::from_millis(16));
    let log: Log = Rc::default();
    let component = logger(&log);

    r.render(loggers(&component, &[("a", 1), ("b", 1)]), body, RenderOptions::default());

    // Flush tick: the batch runs and layout effects fire while bubbling
    assert!(r.tick());
    assert_eq!(*log.borrow(), vec!["layout b", "layout a"]);

    // One passive group per tick, in the order they were deferred
    assert!(r.tick());
    assert_eq!(log.borrow().last().map(String::as_str), Some("passive b"));
    assert!(!r.tick());
    assert_eq!(log.borrow().last().map(String::as_str), Some("passive a"));
}

#[test]
fn test_effect_cleanup_on_change_and_unmount() {
    let (mut r, body, _) = manual(Duration::ZERO, Duration::from_millis(16));
    let log: Log = Rc::default();
    let component = logger(&log);

    r.render(loggers(&component, &[("a", 1), ("b", 1)]), body, RenderOptions::default());
    r.run_until_idle();
    log.borrow_mut().clear();

    // Only `a` changes its dependency
    r.render(loggers(&component, &[("a", 2), ("b", 1)]), body, RenderOptions::default());
    r.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec!["cleanup layout a", "layout a", "cleanup passive a", "passive a"]
    );
    log.borrow_mut().clear();

    // Unmount runs every stored cleanup
    r.render(Element::host("div"), body, RenderOptions::default());
    r.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![
            "cleanup layout b",
            "cleanup passive b",
            "cleanup layout a",
            "cleanup passive a",
        ]
    );
    assert_eq!(r.renderer().serialize(body), "<div></div>");
}

#[test]
fn test_deferred_effect_skipped_for_unmounted_fiber() {
    let (mut r, body, _) = manual(Duration::ZERO, Duration::from_millis(16));
    let log: Log = Rc::default();
    let dep = Rc::new(Cell::new(1i64));
    let handle: Rc<Cell<Option<FiberId>>> = Rc::default();

    let watcher = {
        let log = log.clone();
        let dep = dep.clone();
        let handle = handle.clone();
        Component::new("Watcher", move |_, cx| {
            handle.set(Some(cx.fiber()));
            let value = dep.get();
            let log = log.clone();
            cx.use_effect(value, move || {
                log.borrow_mut().push(format!("setup {value}"));
                Some(Box::new(move || log.borrow_mut().push(format!("cleanup {value}"))) as Cleanup)
            });
            Element::host("span")
        })
    };

    r.render(Element::host("div").child(Element::component(&watcher)), body, RenderOptions::default());
    r.run_until_idle();
    assert_eq!(*log.borrow(), vec!["setup 1"]);

    // The dependency changes, then a second batch in the same flush unmounts
    dep.set(2);
    let fiber = handle.get().expect("watcher rendered");
    r.request_update(fiber);
    r.render(Element::host("div"), body, RenderOptions::default());
    assert_eq!(r.pending_batches(), 2);

    r.run_until_idle();
    assert_eq!(*log.borrow(), vec!["setup 1", "cleanup 1"]);
    assert_eq!(r.renderer().serialize(body), "<div></div>");
}
