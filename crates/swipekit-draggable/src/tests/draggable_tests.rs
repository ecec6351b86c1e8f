use std::cell::{Cell, RefCell};
use std::rc::Rc;

use swipekit_geometry::{Point, Rect, Size};
use swipekit_gesture::{Axis, Direction};
use swipekit_testing::TestHost;

use crate::draggable::{DragEvent, Draggable, DraggableConfig};
use crate::registry::DraggableRegistry;
use crate::PositionError;

fn draggable(host: &TestHost, config: DraggableConfig) -> Draggable {
    Draggable::new(
        host.surface.clone(),
        host.events.clone(),
        host.handle(),
        config,
    )
}

/// Press, drag `distance` px along x over 50ms (one velocity sample), and
/// release. Leaves the sampled velocity at `distance / 50` px/ms.
fn flick_x(host: &TestHost, distance: f32) {
    host.press(0.0, 0.0);
    host.move_to(distance, 0.0);
    host.advance(50);
    host.release(distance, 0.0);
}

#[test]
fn dragging_moves_the_element_by_the_gesture_delta() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());

    host.press(10.0, 10.0);
    host.move_to(40.0, 10.0);
    assert_eq!(drag.position(), Point::new(30.0, 0.0));

    host.move_to(25.0, 10.0);
    assert_eq!(drag.position(), Point::new(15.0, 0.0));
    host.release(25.0, 10.0);
}

#[test]
fn y_position_is_invariant_on_an_x_axis_draggable() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_position(0.0, 50.0).unwrap();

    host.press(0.0, 0.0);
    for (x, y) in [(5.0, 80.0), (2.0, -40.0), (60.0, 300.0), (-10.0, 7.0)] {
        host.move_to(x, y);
        assert_eq!(drag.position().y, 50.0);
    }
    host.release(-10.0, 7.0);
    assert_eq!(drag.position().y, 50.0);
}

#[test]
fn friction_scales_the_raw_delta() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_friction(0.5);

    host.press(0.0, 0.0);
    host.move_to(21.0, 0.0);

    // round(21 * 0.5) with rounding only at the write boundary.
    assert_eq!(drag.position(), Point::new(11.0, 0.0));
    host.release(21.0, 0.0);
}

#[test]
fn zero_friction_freezes_dragging_but_not_programmatic_moves() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_friction(0.0);

    host.press(0.0, 0.0);
    host.move_to(500.0, 0.0);
    assert_eq!(drag.position(), Point::ZERO);
    host.release(500.0, 0.0);

    assert_eq!(drag.set_position(70.0, 0.0), Ok(Point::new(70.0, 0.0)));
}

#[test]
fn set_position_rounds_subpixel_input() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());

    assert_eq!(drag.set_position(50.0, 50.0), Ok(Point::new(50.0, 50.0)));
    assert_eq!(drag.set_position(50.5, 50.0), Ok(Point::new(51.0, 50.0)));
    assert_eq!(drag.position(), Point::new(51.0, 50.0));
}

#[test]
fn percent_position_uses_the_movable_range() {
    let host = TestHost::new();
    // Element 200px wide in a 1000px parent: movable range is 800px.
    let drag = draggable(&host, DraggableConfig::default());

    drag.set_position(50.0, 50.0).unwrap();
    let percent = drag.position_percent();
    assert!((percent.x - 6.25).abs() < f32::EPSILON);
}

#[test]
fn percent_position_is_zero_when_range_is_empty() {
    let host = TestHost::new();
    host.surface.set_size(Size::new(1000.0, 500.0)); // fills the parent
    let drag = draggable(&host, DraggableConfig::default());

    drag.set_position(10.0, 10.0).unwrap();
    assert_eq!(drag.position_percent(), Point::ZERO);
}

#[test]
fn set_position_fails_on_zero_sized_container() {
    let host = TestHost::new();
    host.surface.set_parent_size(Size::new(0.0, 500.0));
    let drag = draggable(&host, DraggableConfig::default());

    assert_eq!(
        drag.set_position(10.0, 0.0),
        Err(PositionError::EmptyContainer { axis: Axis::X })
    );

    // The y axis is not configured, so its zero height is irrelevant.
    host.surface.set_parent_size(Size::new(1000.0, 0.0));
    assert!(drag.set_position(10.0, 0.0).is_ok());
}

#[test]
fn limits_clamp_programmatic_positioning() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_limits(Rect::new(-50.0, 0.0, 400.0, 150.0));

    assert_eq!(drag.set_position(-200.0, 0.0), Ok(Point::new(-50.0, 0.0)));
    assert_eq!(drag.set_position(500.0, 0.0), Ok(Point::new(350.0, 0.0)));

    // Clamping is deterministic: the same out-of-bounds input lands on the
    // same boundary value every time.
    assert_eq!(drag.set_position(500.0, 0.0), Ok(Point::new(350.0, 0.0)));
}

#[test]
fn limits_clamp_drag_movement() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_limits(Rect::new(0.0, 0.0, 100.0, 0.0));

    host.press(0.0, 0.0);
    host.move_to(250.0, 0.0);
    assert_eq!(drag.position(), Point::new(100.0, 0.0));

    host.move_to(-250.0, 0.0);
    assert_eq!(drag.position(), Point::ZERO);
    host.release(-250.0, 0.0);
}

#[test]
fn nan_limit_components_leave_an_axis_unbounded() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            axis: Axis::Both,
            ..DraggableConfig::default()
        },
    );
    drag.set_limits(Rect::new(f32::NAN, 0.0, f32::NAN, 150.0));

    assert_eq!(
        drag.set_position(-4000.0, 900.0),
        Ok(Point::new(-4000.0, 150.0))
    );
}

#[test]
fn disabled_draggable_ignores_pointer_but_not_set_position() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    drag.set_enabled(false);

    host.press(0.0, 0.0);
    host.move_to(100.0, 0.0);
    host.release(100.0, 0.0);
    assert_eq!(drag.position(), Point::ZERO);
    assert_eq!(host.surface.write_count(), 0);

    assert!(drag.set_position(30.0, 0.0).is_ok());
    assert!(!drag.enabled());

    drag.set_enabled(true);
    host.press(0.0, 0.0);
    host.move_to(10.0, 0.0);
    assert_eq!(drag.position(), Point::new(40.0, 0.0));
    host.release(10.0, 0.0);
}

#[test]
fn end_event_carries_gesture_kinematics() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    let seen: Rc<RefCell<Option<DragEvent>>> = Rc::new(RefCell::new(None));

    let end_seen = seen.clone();
    drag.on_end(move |event| *end_seen.borrow_mut() = Some(*event));

    flick_x(&host, 100.0);

    let event = seen.borrow().expect("end event not emitted");
    assert_eq!(event.delta, Point::new(100.0, 0.0));
    assert_eq!(event.velocity, Point::new(2.0, 0.0));
    assert_eq!(event.direction, Direction::Right);
    assert_eq!(event.position, Point::new(100.0, 0.0));
}

#[test]
fn non_throwable_release_never_starts_a_throw() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    let ended = Rc::new(Cell::new(false));

    let end_flag = ended.clone();
    drag.on_end(move |_| end_flag.set(true));

    flick_x(&host, 400.0); // 8 px/ms raw, clamped to 5: well past the gate

    assert!(ended.get());
    assert!(!drag.is_throwing());
    assert_eq!(host.handle().frame_callback_count(), 0);
}

#[test]
fn slow_release_on_a_throwable_settles_immediately() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );
    let ended = Rc::new(Cell::new(false));

    let end_flag = ended.clone();
    drag.on_end(move |_| end_flag.set(true));

    // 10px over 50ms = 0.2 px/ms, under the swipe threshold.
    flick_x(&host, 10.0);

    assert!(ended.get());
    assert!(!drag.is_throwing());
}

#[test]
fn fast_release_throws_and_settles() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );
    let settled: Rc<RefCell<Option<DragEvent>>> = Rc::new(RefCell::new(None));

    let settle_seen = settled.clone();
    drag.on_settle(move |event| *settle_seen.borrow_mut() = Some(*event));

    flick_x(&host, 100.0); // 2 px/ms release velocity
    assert!(drag.is_throwing());

    // 2 * 0.95^k <= 0.1 after 59 frames; give it room and require it stops.
    let frames = host.run_frames(200, 16);
    assert!(frames < 100, "throw must terminate in bounded frames");
    assert!(!drag.is_throwing());

    let event = settled.borrow().expect("settle event not emitted");
    assert!(event.position.x > 100.0, "throw carried the element onward");
    assert_eq!(event.position, drag.position());
    assert_eq!(event.direction, Direction::None);
    assert_eq!(host.handle().frame_callback_count(), 0);
}

#[test]
fn throw_hard_stops_at_the_limit() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );
    drag.set_limits(Rect::new(0.0, 0.0, 120.0, 0.0));
    let settled = Rc::new(Cell::new(false));

    let settle_flag = settled.clone();
    drag.on_settle(move |_| settle_flag.set(true));

    flick_x(&host, 100.0);
    host.run_frames(200, 16);

    assert!(settled.get());
    assert_eq!(drag.position(), Point::new(120.0, 0.0), "no overshoot");
    assert_eq!(host.handle().frame_callback_count(), 0);
}

#[test]
fn throw_from_the_boundary_stops_on_its_first_frame() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );
    drag.set_limits(Rect::new(0.0, 0.0, 100.0, 0.0));

    flick_x(&host, 200.0); // drag already clamps to x = 100
    assert_eq!(drag.position(), Point::new(100.0, 0.0));
    assert!(drag.is_throwing());

    let frames = host.run_frames(10, 16);
    assert_eq!(frames, 1);
    assert_eq!(drag.position(), Point::new(100.0, 0.0));
    assert!(!drag.is_throwing());
}

#[test]
fn dispose_during_a_throw_cancels_the_pending_frame() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );

    flick_x(&host, 100.0);
    assert!(drag.is_throwing());
    assert_eq!(host.handle().frame_callback_count(), 1);

    drag.dispose();
    assert_eq!(
        host.handle().frame_callback_count(),
        0,
        "the exact pending frame registration must be cancelled"
    );
    assert!(host.surface.was_cleared());
    assert_eq!(host.events.subscription_count(), 0);

    drag.dispose(); // idempotent
}

#[test]
fn grabbing_a_thrown_element_drags_from_its_current_position() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );

    flick_x(&host, 100.0);
    host.run_frames(5, 16);
    let mid_throw = drag.position();
    assert!(mid_throw.x > 100.0);
    assert!(drag.is_throwing());

    // Grab: the throw stops where it is and the new drag is relative to
    // the mid-throw position, not the throw's natural end.
    host.press(500.0, 0.0);
    assert!(!drag.is_throwing());
    assert_eq!(host.handle().frame_callback_count(), 0);

    host.move_to(510.0, 0.0);
    assert_eq!(drag.position(), Point::new(mid_throw.x + 10.0, 0.0));
    host.release(510.0, 0.0);
}

#[test]
fn refresh_cancels_a_throw_and_reclamps() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            ..DraggableConfig::default()
        },
    );

    drag.set_position(300.0, 0.0).unwrap();
    flick_x(&host, 100.0);
    assert!(drag.is_throwing());

    // The container shrank: tighter limits now apply.
    drag.set_limits(Rect::new(0.0, 0.0, 60.0, 0.0));
    drag.refresh();

    assert!(!drag.is_throwing());
    assert_eq!(drag.position(), Point::new(60.0, 0.0));
}

#[test]
fn refresh_does_not_interrupt_a_held_drag() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());

    host.press(0.0, 0.0);
    host.move_to(40.0, 0.0);
    assert!(drag.is_dragging());

    drag.refresh();
    assert_eq!(drag.position(), Point::new(40.0, 0.0));

    // The drag continues against its original origin.
    host.move_to(50.0, 0.0);
    assert_eq!(drag.position(), Point::new(50.0, 0.0));
    host.release(50.0, 0.0);
}

#[test]
fn amplifier_scales_the_initial_throw_velocity() {
    let host = TestHost::new();
    let drag = draggable(
        &host,
        DraggableConfig {
            throwable: true,
            amplifier: 2.0,
            ..DraggableConfig::default()
        },
    );

    flick_x(&host, 100.0); // 2 px/ms, amplified to 4 px/frame
    host.clock.advance(16);
    host.frame();

    // First frame advances by the amplified velocity.
    assert_eq!(drag.position(), Point::new(104.0, 0.0));
    drag.dispose();
}

#[test]
fn out_of_range_config_falls_back_to_defaults() {
    let config = DraggableConfig {
        throw_friction: 1.7,
        amplifier: -3.0,
        velocity_stop: 0.0,
        ..DraggableConfig::default()
    }
    .normalized();

    assert_eq!(config.throw_friction, crate::draggable::DEFAULT_THROW_FRICTION);
    assert_eq!(config.amplifier, crate::draggable::DEFAULT_AMPLIFIER);
    assert_eq!(config.velocity_stop, crate::draggable::DEFAULT_VELOCITY_STOP);
}

#[test]
fn move_listeners_fire_per_drag_write_and_can_be_removed() {
    let host = TestHost::new();
    let drag = draggable(&host, DraggableConfig::default());
    let count = Rc::new(Cell::new(0));

    let counter = count.clone();
    let id = drag.on_move(move |_| counter.set(counter.get() + 1));

    host.press(0.0, 0.0);
    host.move_to(10.0, 0.0);
    host.move_to(20.0, 0.0);
    drag.off_move(id);
    host.move_to(30.0, 0.0);
    host.release(30.0, 0.0);

    assert_eq!(count.get(), 2);
}

#[test]
fn registry_hands_out_stable_ids() {
    let host = TestHost::new();
    let mut registry = DraggableRegistry::new();

    let first = registry.insert(draggable(&host, DraggableConfig::default()));
    let second = registry.insert(draggable(&host, DraggableConfig::default()));
    assert_ne!(first, second);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.ids().collect::<Vec<_>>(), vec![first, second]);

    let removed = registry.remove(first).expect("instance was registered");
    removed.dispose();
    assert!(registry.get(first).is_none());
    assert!(registry.get(second).is_some());
    assert!(registry.remove(first).is_none(), "double remove is a no-op");
    assert_eq!(registry.len(), 1);
}
