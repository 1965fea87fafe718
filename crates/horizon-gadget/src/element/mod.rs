//! The element tree.
//!
//! An element is a [`Scriptable`] node with geometry, drawing and event
//! handling. Container elements own an [`Elements`] collection of children;
//! the view owns the root collection.
//!
//! # Event dispatch and element death
//!
//! Event handlers are script callbacks and may remove any element,
//! including the one whose handler is running. Dispatch therefore never
//! holds a lock across a callback: collections are snapshotted first and
//! each element's [`ElementId`] is checked against the view's registry
//! after every callback. Once an element is found dead, dispatch returns
//! the result computed so far without touching the element's children or
//! siblings.

mod base;
mod div;
mod elements;
mod factory;
pub mod geometry;
mod label;

use std::sync::{Arc, Weak};

use horizon_gadget_core::Scriptable;

pub use base::{BASIC_ELEMENT_CLASS_ID, ElementBase, same_element};
pub use div::{DIV_CLASS_ID, Div};
pub use elements::{ELEMENTS_CLASS_ID, Elements};
pub use factory::{ElementCreator, ElementFactory};
pub use geometry::{
    Extents, child_coord_to_parent_coord, child_extent_in_parent, degrees_to_radians,
    parent_coord_to_child_coord,
};
pub use label::{LABEL_CLASS_ID, Label};

use crate::event::{DragEvent, Event, EventResult, MouseEvent};
use crate::graphics::{Canvas, Color, SharedCanvas};
use crate::view::{DebugMode, ElementId, View};

/// A shared, type-erased element.
pub type ElementRef = Arc<dyn Element>;

/// Everything an element type needs to construct itself.
#[derive(Clone)]
pub struct ElementContext {
    /// The view the element will live in.
    pub view: Weak<View>,
    /// The parent element; `None` for top level elements.
    pub parent: Option<Weak<dyn Element>>,
    /// The tag name the element is created under.
    pub tag: String,
    /// The instance name.
    pub name: String,
}

/// A node of the element tree.
pub trait Element: Scriptable {
    /// The shared element state.
    fn element_base(&self) -> &ElementBase;

    /// Draw the element's own content, below its children.
    fn do_draw(&self, _canvas: &mut dyn Canvas) {}

    /// Default handling of a mouse event that reached this element and
    /// was not canceled by a script handler.
    fn handle_mouse_event(&self, _event: &MouseEvent) -> EventResult {
        EventResult::Unhandled
    }

    /// Default handling of a drag event that reached this drop target.
    fn handle_drag_event(&self, _event: &DragEvent) -> EventResult {
        EventResult::Unhandled
    }

    /// Offset of the children's origin in this element's coordinates,
    /// for example a scroll position.
    fn children_offset(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// Map a point in this element's coordinates into `child`'s.
    fn self_coord_to_child_coord(&self, child: &dyn Element, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = self.children_offset();
        let base = child.element_base();
        parent_coord_to_child_coord(
            x - dx,
            y - dy,
            base.x(),
            base.y(),
            base.pin_x(),
            base.pin_y(),
            base.rotation_radians(),
        )
    }

    /// Lay out the element and its children.
    fn layout(&self) {
        if let Some(children) = self.element_base().children() {
            children.layout();
        }
    }
}

/// Outcome of dispatching a mouse event into a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseDispatch {
    /// The combined result.
    pub result: EventResult,
    /// The element whose handler fired or handled the event.
    pub fired: Option<ElementId>,
    /// The innermost element under the pointer.
    pub in_element: Option<ElementId>,
    /// An element in the subtree fired or was removed by a handler; the
    /// event goes no further.
    pub consumed: bool,
}

impl MouseDispatch {
    fn dead(result: EventResult) -> Self {
        Self {
            result,
            fired: None,
            in_element: None,
            consumed: true,
        }
    }
}

/// Outcome of dispatching a drag event into a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragDispatch {
    /// The combined result.
    pub result: EventResult,
    /// The drop target that received the event.
    pub fired: Option<ElementId>,
    /// A drop target in the subtree received the event or was removed by
    /// a handler.
    pub consumed: bool,
}

impl DragDispatch {
    fn dead(result: EventResult) -> Self {
        Self {
            result,
            fired: None,
            consumed: true,
        }
    }
}

/// Deliver a mouse event, in `element`'s coordinates, to `element`.
///
/// Unless `direct` is set, the children get the event first and the
/// element only sees it if no child fired or was removed by a handler.
/// The element's script signal runs before [`Element::handle_mouse_event`],
/// which is skipped when a handler canceled the event.
pub fn dispatch_mouse_event(element: &ElementRef, event: &MouseEvent, direct: bool) -> MouseDispatch {
    let base = element.element_base();
    let (Some(id), Some(view)) = (base.id(), base.view()) else {
        return MouseDispatch::default();
    };
    if !base.is_enabled() {
        return MouseDispatch {
            in_element: Some(id),
            ..MouseDispatch::default()
        };
    }

    let mut in_element = Some(id);
    if !direct {
        if let Some(children) = base.children() {
            let inner = children.on_mouse_event(event);
            if !view.is_alive(id) {
                return MouseDispatch::dead(inner.result);
            }
            if inner.consumed {
                return inner;
            }
            in_element = inner.in_element.or(in_element);
        }
    }

    let mut result = EventResult::Unhandled;
    let signal = base.signal(event.event_type);
    let fired_signal = signal.has_active_connections();
    if fired_signal {
        result = view.fire_event(signal, Event::Mouse(event.clone()));
        if !view.is_alive(id) {
            return MouseDispatch::dead(result);
        }
    }
    if result != EventResult::Canceled {
        let handled = element.handle_mouse_event(event);
        if !view.is_alive(id) {
            return MouseDispatch::dead(result.max(handled));
        }
        result = result.max(handled);
    }

    let fired = fired_signal || result != EventResult::Unhandled;
    MouseDispatch {
        result,
        fired: fired.then_some(id),
        in_element,
        consumed: fired,
    }
}

/// Deliver a drag event, in `element`'s coordinates, to `element`.
///
/// Only drop targets receive drag events; children are tried first unless
/// `direct` is set.
pub fn dispatch_drag_event(element: &ElementRef, event: &DragEvent, direct: bool) -> DragDispatch {
    let base = element.element_base();
    let (Some(id), Some(view)) = (base.id(), base.view()) else {
        return DragDispatch::default();
    };
    if !base.is_enabled() {
        return DragDispatch::default();
    }

    if !direct {
        if let Some(children) = base.children() {
            let inner = children.on_drag_event(event);
            if !view.is_alive(id) {
                return DragDispatch::dead(inner.result);
            }
            if inner.consumed {
                return inner;
            }
        }
    }
    if !base.is_drop_target() {
        return DragDispatch::default();
    }

    let signal = base.signal(event.event_type);
    let mut result = EventResult::Unhandled;
    if signal.has_active_connections() {
        result = view.fire_event(signal, Event::Drag(event.clone()));
        if !view.is_alive(id) {
            return DragDispatch::dead(result);
        }
    }
    if result != EventResult::Canceled {
        let handled = element.handle_drag_event(event);
        if !view.is_alive(id) {
            return DragDispatch::dead(result.max(handled));
        }
        result = result.max(handled);
    }
    DragDispatch {
        result,
        fired: Some(id),
        consumed: true,
    }
}

/// Draw `element` and its children into the element's canvas.
///
/// Returns `None` for invisible or empty elements. An unchanged element
/// returns its cached canvas without redrawing.
pub fn draw_element(element: &ElementRef) -> Option<SharedCanvas> {
    let base = element.element_base();
    if !base.is_visible() {
        return None;
    }
    let (width, height) = (base.width(), base.height());
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let view = base.view()?;

    let cached = base.cached_canvas().filter(|canvas| {
        let canvas = canvas.lock();
        canvas.width() == width && canvas.height() == height
    });
    if let Some(canvas) = &cached {
        if !base.is_changed() {
            return Some(Arc::clone(canvas));
        }
    }

    let canvas = cached.unwrap_or_else(|| view.graphics().new_canvas(width, height));
    let composite = base.children().and_then(|children| children.draw());
    {
        let mut target = canvas.lock();
        target.clear();
        element.do_draw(&mut *target);
        if let Some(composite) = &composite {
            let (dx, dy) = element.children_offset();
            target.draw_canvas(dx, dy, &*composite.lock());
        }
        let debug = view.debug_mode();
        if debug == DebugMode::All || (debug == DebugMode::Container && base.children().is_some()) {
            draw_debug_box(&mut *target, width, height);
        }
    }
    base.clear_changed();
    base.store_canvas(Arc::clone(&canvas));
    Some(canvas)
}

fn draw_debug_box(canvas: &mut dyn Canvas, width: f64, height: f64) {
    let color = Color::from_rgb(1.0, 0.0, 0.0);
    canvas.draw_line(0.0, 0.0, width, 0.0, 1.0, color);
    canvas.draw_line(width, 0.0, width, height, 1.0, color);
    canvas.draw_line(width, height, 0.0, height, 1.0, color);
    canvas.draw_line(0.0, height, 0.0, 0.0, 1.0, color);
    canvas.draw_line(0.0, 0.0, width, height, 1.0, color);
    canvas.draw_line(width, 0.0, 0.0, height, 1.0, color);
}
