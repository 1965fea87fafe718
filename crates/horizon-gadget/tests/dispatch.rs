//! Integration tests for mouse and drag dispatch, including handlers that
//! remove elements while the event is being delivered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use horizon_gadget::{
    Callable, CallableRef, DragEvent, ElementFactory, ElementRef, EventResult, EventType, MouseButton,
    MouseEvent, RecordingGraphics, Scriptable, Variant, View, functor_slot,
};

fn new_view() -> Arc<View> {
    let view = View::new(
        Arc::new(ElementFactory::with_builtin()),
        Arc::new(RecordingGraphics::new()),
    );
    view.set_size(200.0, 200.0);
    view
}

fn place(element: &ElementRef, x: f64, y: f64, width: f64, height: f64) {
    let base = element.element_base();
    base.set_x(x);
    base.set_y(y);
    base.set_width(width);
    base.set_height(height);
}

fn counter() -> (Arc<AtomicUsize>, CallableRef) {
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = Arc::clone(&count);
    let handler = functor_slot(move || {
        handler_count.fetch_add(1, Ordering::SeqCst);
    });
    (count, handler)
}

fn on(element: &ElementRef, signal: &str, handler: CallableRef) {
    assert!(element.set_property_by_name(signal, Variant::Callable(Some(handler))));
}

fn mouse(event_type: EventType, x: f64, y: f64) -> MouseEvent {
    MouseEvent::new(event_type, x, y, MouseButton::Left)
}

fn remover(view: &Arc<View>, name: &'static str) -> CallableRef {
    let view: Weak<View> = Arc::downgrade(view);
    functor_slot(move || {
        let Some(view) = view.upgrade() else {
            return;
        };
        if let Some(element) = view.element_by_name(name) {
            let collection = match element.element_base().parent() {
                Some(parent) => parent.element_base().children().cloned(),
                None => Some(Arc::clone(view.children())),
            };
            if let Some(collection) = collection {
                collection.remove_element(&element);
            }
        }
    })
}

#[test]
fn test_topmost_sibling_receives_click() {
    let view = new_view();
    let below = view.children().append_element("div", "below").unwrap();
    let above = view.children().append_element("div", "above").unwrap();
    place(&below, 0.0, 0.0, 100.0, 100.0);
    place(&above, 50.0, 50.0, 100.0, 100.0);
    let (below_clicks, below_handler) = counter();
    let (above_clicks, above_handler) = counter();
    on(&below, "onclick", below_handler);
    on(&above, "onclick", above_handler);

    assert_eq!(view.on_mouse_event(&mouse(EventType::Click, 75.0, 75.0)), EventResult::Handled);
    assert_eq!(above_clicks.load(Ordering::SeqCst), 1);
    assert_eq!(below_clicks.load(Ordering::SeqCst), 0);

    view.on_mouse_event(&mouse(EventType::Click, 10.0, 10.0));
    assert_eq!(below_clicks.load(Ordering::SeqCst), 1);

    assert_eq!(
        view.on_mouse_event(&mouse(EventType::Click, 190.0, 10.0)),
        EventResult::Unhandled
    );
}

#[test]
fn test_unhandled_child_falls_through_to_sibling_beneath() {
    let view = new_view();
    let below = view.children().append_element("div", "below").unwrap();
    let above = view.children().append_element("div", "above").unwrap();
    place(&below, 0.0, 0.0, 100.0, 100.0);
    place(&above, 0.0, 0.0, 100.0, 100.0);
    let (below_clicks, below_handler) = counter();
    on(&below, "onclick", below_handler);

    view.on_mouse_event(&mouse(EventType::Click, 10.0, 10.0));
    assert_eq!(below_clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_child_coordinates_follow_rotation() {
    let view = new_view();
    let div = view.children().append_element("div", "rotated").unwrap();
    place(&div, 100.0, 100.0, 40.0, 20.0);
    div.element_base().set_rotation(90.0);
    let (clicks, handler) = counter();
    on(&div, "onclick", handler);

    // Rotated a quarter turn about its origin, the div covers x in
    // [80, 100] and y in [100, 140].
    view.on_mouse_event(&mouse(EventType::Click, 90.0, 130.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    view.on_mouse_event(&mouse(EventType::Click, 130.0, 110.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_removing_its_element() {
    let view = new_view();
    let below = view.children().append_element("div", "below").unwrap();
    let victim = view.children().append_element("div", "victim").unwrap();
    place(&below, 0.0, 0.0, 100.0, 100.0);
    place(&victim, 0.0, 0.0, 100.0, 100.0);
    let (below_clicks, below_handler) = counter();
    on(&below, "onclick", below_handler);
    on(&victim, "onclick", remover(&view, "victim"));
    let victim_id = victim.element_base().id().unwrap();
    drop(victim);

    let result = view.on_mouse_event(&mouse(EventType::Click, 10.0, 10.0));
    assert_eq!(result, EventResult::Handled);
    assert!(!view.is_alive(victim_id));
    assert_eq!(view.children().count(), 1);
    assert_eq!(below_clicks.load(Ordering::SeqCst), 0);
}

#[test]
fn test_handler_removing_its_ancestor() {
    let view = new_view();
    let outer = view.children().append_element("div", "outer").unwrap();
    place(&outer, 0.0, 0.0, 100.0, 100.0);
    let inner = outer
        .element_base()
        .children()
        .unwrap()
        .append_element("div", "inner")
        .unwrap();
    place(&inner, 10.0, 10.0, 50.0, 50.0);
    let (outer_clicks, outer_handler) = counter();
    on(&outer, "onclick", outer_handler);
    on(&inner, "onclick", remover(&view, "outer"));
    view.set_focus(Some(&inner));
    drop((outer, inner));

    let result = view.on_mouse_event(&mouse(EventType::Click, 20.0, 20.0));
    assert_eq!(result, EventResult::Handled);
    assert_eq!(outer_clicks.load(Ordering::SeqCst), 0);
    assert_eq!(view.element_count(), 0);
    assert!(view.focused_element().is_none());
}

#[test]
fn test_handler_removing_itself_from_signal() {
    let view = new_view();
    let div = view.children().append_element("div", "once").unwrap();
    place(&div, 0.0, 0.0, 50.0, 50.0);
    let count = Arc::new(AtomicUsize::new(0));
    let weak = Arc::downgrade(&div);
    let handler_count = Arc::clone(&count);
    on(
        &div,
        "onclick",
        functor_slot(move || {
            handler_count.fetch_add(1, Ordering::SeqCst);
            if let Some(div) = weak.upgrade() {
                div.set_property_by_name("onclick", Variant::Void);
            }
        }),
    );

    view.on_mouse_event(&mouse(EventType::Click, 5.0, 5.0));
    view.on_mouse_event(&mouse(EventType::Click, 5.0, 5.0));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_canceled_event_result() {
    let view = new_view();
    let div = view.children().append_element("div", "cancel").unwrap();
    place(&div, 0.0, 0.0, 50.0, 50.0);
    let weak = Arc::downgrade(&view);
    on(
        &div,
        "onmousedown",
        functor_slot(move || {
            if let Some(view) = weak.upgrade() {
                assert_eq!(
                    view.current_event().map(|event| event.event_type()),
                    Some(EventType::MouseDown)
                );
                view.set_event_result(EventResult::Canceled);
            }
        }),
    );
    assert_eq!(
        view.on_mouse_event(&mouse(EventType::MouseDown, 5.0, 5.0)),
        EventResult::Canceled
    );
    assert!(view.current_event().is_none());
}

#[test]
fn test_disabled_element_and_events_off() {
    let view = new_view();
    let div = view.children().append_element("div", "off").unwrap();
    place(&div, 0.0, 0.0, 50.0, 50.0);
    let (clicks, handler) = counter();
    on(&div, "onclick", handler);

    div.element_base().set_enabled(false);
    view.on_mouse_event(&mouse(EventType::Click, 5.0, 5.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 0);

    div.element_base().set_enabled(true);
    view.set_events_enabled(false);
    view.on_mouse_event(&mouse(EventType::Click, 5.0, 5.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 0);

    view.set_events_enabled(true);
    view.on_mouse_event(&mouse(EventType::Click, 5.0, 5.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_mouse_over_and_out() {
    let view = new_view();
    let div = view.children().append_element("div", "hover").unwrap();
    place(&div, 0.0, 0.0, 50.0, 50.0);
    let (overs, over_handler) = counter();
    let (outs, out_handler) = counter();
    on(&div, "onmouseover", over_handler);
    on(&div, "onmouseout", out_handler);

    view.on_mouse_event(&mouse(EventType::MouseMove, 10.0, 10.0));
    view.on_mouse_event(&mouse(EventType::MouseMove, 20.0, 20.0));
    assert_eq!(overs.load(Ordering::SeqCst), 1);
    assert!(view.mouse_over_element().is_some());

    view.on_mouse_event(&mouse(EventType::MouseMove, 100.0, 100.0));
    assert_eq!(outs.load(Ordering::SeqCst), 1);
    assert!(view.mouse_over_element().is_none());

    view.on_mouse_event(&mouse(EventType::MouseMove, 10.0, 10.0));
    view.on_mouse_event(&mouse(EventType::MouseOut, 0.0, 0.0));
    assert_eq!(overs.load(Ordering::SeqCst), 2);
    assert_eq!(outs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_mouse_grab_and_focus() {
    let view = new_view();
    let div = view.children().append_element("div", "drag").unwrap();
    place(&div, 0.0, 0.0, 50.0, 50.0);
    let (moves, move_handler) = counter();
    let (ups, up_handler) = counter();
    on(&div, "onmousemove", move_handler);
    on(&div, "onmouseup", up_handler);

    view.on_mouse_event(&mouse(EventType::MouseDown, 10.0, 10.0));
    assert!(view.grabbed_element().is_some());
    let focused = view.focused_element().unwrap();
    assert_eq!(focused.element_base().name(), "drag");

    // Outside the element, but the grab routes the event to it.
    view.on_mouse_event(&mouse(EventType::MouseMove, 150.0, 150.0));
    assert_eq!(moves.load(Ordering::SeqCst), 1);

    view.on_mouse_event(&mouse(EventType::MouseUp, 150.0, 150.0));
    assert_eq!(ups.load(Ordering::SeqCst), 1);
    assert!(view.grabbed_element().is_none());

    view.on_mouse_event(&mouse(EventType::MouseMove, 150.0, 150.0));
    assert_eq!(moves.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drag_over_drop_and_out() {
    let view = new_view();
    let target = view.children().append_element("div", "target").unwrap();
    let plain = view.children().append_element("div", "plain").unwrap();
    place(&target, 0.0, 0.0, 50.0, 50.0);
    place(&plain, 100.0, 0.0, 50.0, 50.0);
    target.element_base().set_drop_target(true);
    let (drops, drop_handler) = counter();
    let (outs, out_handler) = counter();
    on(&target, "ondragdrop", drop_handler);
    on(&target, "ondragout", out_handler);
    let (plain_drops, plain_handler) = counter();
    on(&plain, "ondragdrop", plain_handler);

    let files = vec!["/tmp/photo.png".to_string()];
    view.on_drag_event(&DragEvent::new(EventType::DragOver, 10.0, 10.0, files.clone()));
    view.on_drag_event(&DragEvent::new(EventType::DragOver, 120.0, 10.0, files.clone()));
    assert_eq!(outs.load(Ordering::SeqCst), 1);

    view.on_drag_event(&DragEvent::new(EventType::DragDrop, 120.0, 10.0, files.clone()));
    assert_eq!(plain_drops.load(Ordering::SeqCst), 0);

    view.on_drag_event(&DragEvent::new(EventType::DragOver, 10.0, 10.0, files.clone()));
    let result = view.on_drag_event(&DragEvent::new(EventType::DragDrop, 10.0, 10.0, files));
    assert_eq!(result, EventResult::Handled);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scrolled_div_maps_child_coordinates() {
    let view = new_view();
    let div = view.children().append_element("div", "scroller").unwrap();
    place(&div, 0.0, 0.0, 100.0, 100.0);
    assert!(div.set_property_by_name("autoscroll", Variant::Bool(true)));
    let child = div
        .element_base()
        .children()
        .unwrap()
        .append_element("div", "far")
        .unwrap();
    place(&child, 0.0, 150.0, 100.0, 100.0);
    let (clicks, handler) = counter();
    on(&child, "onclick", handler);

    view.layout();
    assert!(div.set_property_by_name("scrollY", Variant::Double(120.0)));
    assert_eq!(div.get_property_by_name("scrollY"), Some(Variant::Double(120.0)));

    // View y 40 is children y 160 after scrolling.
    view.on_mouse_event(&mouse(EventType::Click, 10.0, 40.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);

    let (x, y) = view.view_coord_to_element_coord(&child, 10.0, 40.0);
    assert!((x - 10.0).abs() < 1e-9 && (y - 10.0).abs() < 1e-9);
}

fn nested_pair(view: &Arc<View>) -> (ElementRef, ElementRef) {
    let outer = view.children().append_element("div", "outer").unwrap();
    place(&outer, 0.0, 0.0, 100.0, 100.0);
    let inner = outer
        .element_base()
        .children()
        .unwrap()
        .append_element("div", "inner")
        .unwrap();
    place(&inner, 10.0, 10.0, 50.0, 50.0);
    (outer, inner)
}

#[test]
fn test_self_removal_does_not_bubble_to_parent() {
    let view = new_view();
    let (outer, inner) = nested_pair(&view);
    let (outer_clicks, outer_handler) = counter();
    on(&outer, "onclick", outer_handler);
    let inner_clicks = Arc::new(AtomicUsize::new(0));
    let removal = remover(&view, "inner");
    let handler_clicks = Arc::clone(&inner_clicks);
    on(
        &inner,
        "onclick",
        functor_slot(move || {
            handler_clicks.fetch_add(1, Ordering::SeqCst);
            removal.call(&[]);
        }),
    );
    drop(inner);

    let result = view.on_mouse_event(&mouse(EventType::Click, 20.0, 20.0));
    assert_eq!(result, EventResult::Handled);
    assert_eq!(inner_clicks.load(Ordering::SeqCst), 1);
    assert_eq!(outer_clicks.load(Ordering::SeqCst), 0);
    assert!(view.element_by_name("inner").is_none());

    // With the child gone the parent receives the next click.
    view.on_mouse_event(&mouse(EventType::Click, 20.0, 20.0));
    assert_eq!(outer_clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_target_self_removal_does_not_bubble_to_parent() {
    let view = new_view();
    let (outer, inner) = nested_pair(&view);
    outer.element_base().set_drop_target(true);
    inner.element_base().set_drop_target(true);
    let (outer_drops, outer_handler) = counter();
    on(&outer, "ondragdrop", outer_handler);
    on(&inner, "ondragdrop", remover(&view, "inner"));
    drop(inner);

    let files = vec!["/tmp/note.txt".to_string()];
    let result = view.on_drag_event(&DragEvent::new(EventType::DragDrop, 20.0, 20.0, files));
    assert_eq!(result, EventResult::Handled);
    assert_eq!(outer_drops.load(Ordering::SeqCst), 0);
    assert!(view.element_by_name("inner").is_none());
}
