use post_task::{DelayTable, Error, Priority, TaskScheduler, pause_task, post_task};
use post_task_local::{LocalHost, Profile};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_exactly_once_under_every_profile() {
    for profile in Profile::all() {
        for priority in Priority::ALL {
            let host = LocalHost::new(profile);
            let count = Rc::new(Cell::new(0));
            let c = count.clone();

            let mut handle = post_task(&host, move || c.set(c.get() + 1), priority);

            // Never resolved before the task has run.
            if count.get() == 0 {
                assert_eq!(handle.try_resolved(), None, "{profile:?} {priority}");
            }

            host.run_until_stalled();
            assert_eq!(count.get(), 1, "{profile:?} {priority}");
            if let Some(outcome) = handle.try_resolved() {
                assert_eq!(outcome, Ok(()));
            } else {
                panic!("handle unresolved for {profile:?} {priority}");
            }
            // And resolved only once.
            assert_eq!(handle.try_resolved(), None);
            assert_eq!(host.pending(), 0);
        }
    }
}

#[test]
fn test_pause_resolves_under_every_profile() {
    for profile in Profile::all() {
        let host = LocalHost::new(profile);
        let mut handle = pause_task(&host);
        host.run_until_stalled();
        assert_eq!(handle.try_resolved(), Some(Ok(())), "{profile:?}");
    }
}

#[test]
fn test_batch_never_drops_a_task() {
    let host = LocalHost::new(Profile::batch());
    let count = Rc::new(Cell::new(0));

    for priority in Priority::ALL {
        let c = count.clone();
        let mut handle = post_task(&host, move || c.set(c.get() + 1), priority);
        // Ran synchronously, handle already resolved.
        assert_eq!(handle.try_resolved(), Some(Ok(())));
    }
    assert_eq!(count.get(), 3);
    assert_eq!(host.pending(), 0);
}

#[test]
fn test_timer_fallback_delays_are_monotonic() {
    let host = LocalHost::new(Profile::timers());
    let ran_at = Rc::new(RefCell::new(Vec::new()));
    let host = Rc::new(host);

    for priority in Priority::ALL {
        let ran_at = ran_at.clone();
        let clock = host.clone();
        let _ = post_task(
            &*host,
            move || ran_at.borrow_mut().push((priority, clock.now())),
            priority,
        );
    }
    host.run_until_stalled();

    let at = |p: Priority| {
        ran_at
            .borrow()
            .iter()
            .find(|(q, _)| *q == p)
            .map(|(_, t)| *t)
            .unwrap()
    };
    assert_eq!(at(Priority::UserBlocking), Duration::ZERO);
    assert_eq!(at(Priority::UserVisible), Duration::ZERO);
    assert_eq!(at(Priority::Background), Duration::from_millis(150));
}

#[test]
fn test_capabilities_swapped_between_calls() {
    let host = LocalHost::new(Profile::native());
    let count = Rc::new(Cell::new(0));

    let c = count.clone();
    let _ = post_task(&host, move || c.set(c.get() + 1), Priority::Background);
    host.set_profile(Profile::timers());
    let c = count.clone();
    let _ = post_task(&host, move || c.set(c.get() + 1), Priority::Background);

    assert_eq!(host.native_posts(), vec![Priority::Background]);

    // Already queued work survives the swap.
    host.run_native();
    assert_eq!(count.get(), 1);
    host.advance(Duration::from_millis(150));
    assert_eq!(count.get(), 2);
}

#[test]
fn test_panicking_task_rejects_its_handle_only() {
    let host = LocalHost::new(Profile::microtasks());
    let count = Rc::new(Cell::new(0));

    let mut bad = post_task(&host, || panic!("task failed"), Priority::UserBlocking);
    let c = count.clone();
    let mut good = post_task(&host, move || c.set(c.get() + 1), Priority::UserBlocking);

    host.run_microtasks();
    assert_eq!(
        bad.try_resolved(),
        Some(Err(Error::TaskPanicked {
            message: "task failed".into()
        }))
    );
    // The loop kept going.
    assert_eq!(good.try_resolved(), Some(Ok(())));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_dropping_host_abandons_queued_handles() {
    let host = LocalHost::new(Profile::timers());
    let mut handle = post_task(&host, || {}, Priority::Background);
    drop(host);
    assert_eq!(handle.try_resolved(), Some(Err(Error::Abandoned)));
}

#[test]
fn test_handle_can_be_awaited() {
    let host = LocalHost::new(Profile::microtasks());
    let handle = post_task(&host, || {}, Priority::UserBlocking);
    host.run_microtasks();
    assert_eq!(futures::executor::block_on(handle), Ok(()));
}

#[test]
fn test_configured_delays_drive_the_timer() {
    let delays = DelayTable::from_json(
        r#"{"timer_delays_ms": {"background": 400, "user-visible": 20, "user-blocking": 0}}"#,
    )
    .unwrap();
    let scheduler = TaskScheduler::new(LocalHost::new(Profile::timers()))
        .with_delays(delays)
        .unwrap();
    let count = Rc::new(Cell::new(0));

    let c = count.clone();
    let _ = scheduler.post_task(move || c.set(c.get() + 1), Priority::UserVisible);
    let c = count.clone();
    let _ = scheduler.post_task(move || c.set(c.get() + 1), Priority::Background);

    scheduler.host().advance(Duration::from_millis(19));
    assert_eq!(count.get(), 0);
    scheduler.host().advance(Duration::from_millis(1));
    assert_eq!(count.get(), 1);
    scheduler.host().advance(Duration::from_millis(380));
    assert_eq!(count.get(), 2);
}

#[test]
fn test_out_of_order_delays_are_refused() {
    let mut delays = DelayTable::DEFAULT;
    delays.timer_delays[Priority::Background] = Duration::ZERO;
    delays.timer_delays[Priority::UserBlocking] = Duration::from_millis(500);
    assert!(delays.validate().is_err());

    let refused = TaskScheduler::new(LocalHost::new(Profile::timers())).with_delays(delays);
    assert!(matches!(refused, Err(Error::NonMonotonicDelays { .. })));
}
