//! The view: root of an element tree.
//!
//! A view owns the top level [`Elements`], the registry that gives every
//! element an [`ElementId`], and the interaction state that refers to
//! elements by id: focus, popup, mouse-over, mouse grab and drag-over.
//! Removing an element clears every such reference to it and its subtree.

mod registry;

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use horizon_gadget_core::{
    ClassId, PerfSpan, Property, Scriptable, ScriptableHelper, ScriptableRef, Signal, fixed_getter_slot,
    functor_slot, gadget_str_eq, property_getter_slot,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

pub use registry::{ElementId, ElementRegistry};

use crate::element::{
    Element, ElementFactory, ElementRef, Elements, dispatch_drag_event, dispatch_mouse_event,
    draw_element, parent_coord_to_child_coord,
};
use crate::event::{DragEvent, Event, EventResult, EventType, MouseEvent};
use crate::graphics::{Graphics, SharedCanvas};
use crate::logging::{describe, targets};
use crate::script::ScriptContext;
use crate::xml::{QuickXmlParser, XmlParser};

/// Class id of [`View`].
pub const VIEW_CLASS_ID: ClassId = 0xc484_8f6a_6f1c_4bd1;

/// The tag of the singleton content area element.
pub const CONTENT_AREA_TAG: &str = "contentarea";

/// Which elements draw debug bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    /// No debug drawing.
    #[default]
    Off,
    /// Boxes around container elements.
    Container,
    /// Boxes around every element.
    All,
}

/// A hook that may veto elements before they join the view.
pub type ElementAddFilter = Arc<dyn Fn(&ElementRef) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct InteractionState {
    focus: Option<ElementId>,
    popup: Option<ElementId>,
    mouse_over: Option<ElementId>,
    grab: Option<ElementId>,
    drag_over: Option<ElementId>,
    content_area: Option<ElementId>,
}

impl InteractionState {
    fn forget(&mut self, id: ElementId) {
        for slot in [
            &mut self.focus,
            &mut self.popup,
            &mut self.mouse_over,
            &mut self.grab,
            &mut self.drag_over,
            &mut self.content_area,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}

/// The root of an element tree.
pub struct View {
    helper: ScriptableHelper,
    registry: Mutex<ElementRegistry>,
    children: Arc<Elements>,
    factory: Arc<ElementFactory>,
    graphics: Arc<dyn Graphics>,
    xml_parser: Arc<dyn XmlParser>,
    script_context: RwLock<Option<Arc<dyn ScriptContext>>>,
    width: Arc<Property<f64>>,
    height: Arc<Property<f64>>,
    state: Mutex<InteractionState>,
    current_event: Mutex<Option<Event>>,
    event_result: Mutex<EventResult>,
    element_add_filter: RwLock<Option<ElementAddFilter>>,
    debug_mode: Mutex<DebugMode>,
    events_enabled: AtomicBool,
    needs_redraw: AtomicBool,
    canvas: Mutex<Option<SharedCanvas>>,
}

impl View {
    /// Create a view using the default XML parser.
    pub fn new(factory: Arc<ElementFactory>, graphics: Arc<dyn Graphics>) -> Arc<Self> {
        Self::with_xml_parser(factory, graphics, Arc::new(QuickXmlParser::new()))
    }

    /// Create a view with an explicit XML parser.
    pub fn with_xml_parser(
        factory: Arc<ElementFactory>,
        graphics: Arc<dyn Graphics>,
        xml_parser: Arc<dyn XmlParser>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<View>| {
            let view = View {
                helper: ScriptableHelper::new(),
                registry: Mutex::new(ElementRegistry::new()),
                children: Elements::new(me.clone(), None),
                factory,
                graphics,
                xml_parser,
                script_context: RwLock::new(None),
                width: Arc::new(Property::new(0.0)),
                height: Arc::new(Property::new(0.0)),
                state: Mutex::new(InteractionState::default()),
                current_event: Mutex::new(None),
                event_result: Mutex::new(EventResult::Unhandled),
                element_add_filter: RwLock::new(None),
                debug_mode: Mutex::new(DebugMode::Off),
                events_enabled: AtomicBool::new(true),
                needs_redraw: AtomicBool::new(true),
                canvas: Mutex::new(None),
            };
            view.register_members(me);
            view
        })
    }

    fn register_members(&self, me: &Weak<View>) {
        let helper = &self.helper;
        let this = me.clone();
        helper.register_property(
            "width",
            Some(property_getter_slot(&self.width)),
            Some(functor_slot(move |width: f64| {
                if let Some(view) = this.upgrade() {
                    view.set_size(width, view.height());
                }
            })),
        );
        let this = me.clone();
        helper.register_property(
            "height",
            Some(property_getter_slot(&self.height)),
            Some(functor_slot(move |height: f64| {
                if let Some(view) = this.upgrade() {
                    view.set_size(view.width(), height);
                }
            })),
        );
        let children: ScriptableRef = Arc::clone(&self.children) as ScriptableRef;
        helper.register_property("children", Some(fixed_getter_slot(children)), None);

        let this = me.clone();
        helper.register_method(
            "appendElement",
            functor_slot(move |xml: String| -> Option<ScriptableRef> {
                let view = this.upgrade()?;
                view.children
                    .append_element_from_xml(&xml)
                    .map(|element| element as ScriptableRef)
            }),
        );
        let this = me.clone();
        helper.register_method(
            "getElementByName",
            functor_slot(move |name: String| -> Option<ScriptableRef> {
                let view = this.upgrade()?;
                view.element_by_name(&name).map(|element| element as ScriptableRef)
            }),
        );
    }

    // -------------------------------------------------------------------------
    // Collaborators
    // -------------------------------------------------------------------------

    /// The top level elements.
    pub fn children(&self) -> &Arc<Elements> {
        &self.children
    }

    /// The element factory.
    pub fn factory(&self) -> &Arc<ElementFactory> {
        &self.factory
    }

    /// The graphics used to create canvases.
    pub fn graphics(&self) -> &Arc<dyn Graphics> {
        &self.graphics
    }

    /// The XML parser used for element markup.
    pub fn xml_parser(&self) -> &Arc<dyn XmlParser> {
        &self.xml_parser
    }

    /// The script context compiling event handler attributes, if any.
    pub fn script_context(&self) -> Option<Arc<dyn ScriptContext>> {
        self.script_context.read().clone()
    }

    pub fn set_script_context(&self, context: Option<Arc<dyn ScriptContext>>) {
        *self.script_context.write() = context;
    }

    // -------------------------------------------------------------------------
    // Size, flags and redraw
    // -------------------------------------------------------------------------

    pub fn width(&self) -> f64 {
        self.width.get()
    }

    pub fn height(&self) -> f64 {
        self.height.get()
    }

    /// Resize the view.
    pub fn set_size(&self, width: f64, height: f64) {
        let changed_width = self.width.set(width.max(0.0));
        let changed_height = self.height.set(height.max(0.0));
        if changed_width || changed_height {
            self.children.mark_redraw();
            self.queue_draw();
        }
    }

    pub fn debug_mode(&self) -> DebugMode {
        *self.debug_mode.lock()
    }

    pub fn set_debug_mode(&self, mode: DebugMode) {
        let mut current = self.debug_mode.lock();
        if *current != mode {
            *current = mode;
            drop(current);
            self.children.mark_redraw();
            self.queue_draw();
        }
    }

    /// Whether script event handlers run.
    pub fn events_enabled(&self) -> bool {
        self.events_enabled.load(Ordering::Acquire)
    }

    pub fn set_events_enabled(&self, enabled: bool) {
        self.events_enabled.store(enabled, Ordering::Release);
    }

    /// Request a redraw of the view.
    pub fn queue_draw(&self) {
        self.needs_redraw.store(true, Ordering::Release);
    }

    /// Whether anything changed since the last [`draw`](Self::draw).
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Whether the element is still part of this view.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.registry.lock().contains(id)
    }

    /// Resolve an element id.
    pub fn element(&self, id: ElementId) -> Option<ElementRef> {
        self.registry.lock().get(id)
    }

    /// The element named `name`, anywhere in the view.
    pub fn element_by_name(&self, name: &str) -> Option<ElementRef> {
        let registry = self.registry.lock();
        registry.find_by_name(name).and_then(|id| registry.get(id))
    }

    /// The number of elements in the view.
    pub fn element_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Install a hook that may veto new elements.
    pub fn set_element_add_filter<F>(&self, filter: Option<F>)
    where
        F: Fn(&ElementRef) -> bool + Send + Sync + 'static,
    {
        *self.element_add_filter.write() = filter.map(|f| Arc::new(f) as ElementAddFilter);
    }

    /// Accept a newly created element into the view.
    ///
    /// Returns `false` when the element add filter vetoes it or when it is
    /// a second content area. On success the element is registered and has
    /// its id.
    pub fn on_element_add(&self, element: &ElementRef) -> bool {
        let filter = self.element_add_filter.read().clone();
        if let Some(filter) = filter {
            if !filter(element) {
                return false;
            }
        }

        let is_content_area = gadget_str_eq(element.element_base().tag_name(), CONTENT_AREA_TAG);
        let mut state = self.state.lock();
        if is_content_area {
            if let Some(existing) = state.content_area {
                if self.is_alive(existing) {
                    tracing::warn!(target: targets::VIEW, "only one contentarea is allowed in a view");
                    return false;
                }
            }
        }
        let id = self.registry.lock().register(element);
        element.element_base().set_id(id);
        if is_content_area {
            state.content_area = Some(id);
        }
        true
    }

    /// Forget `element` and its subtree before it leaves the view.
    pub fn on_element_remove(&self, element: &ElementRef) {
        let mut pending = vec![Arc::clone(element)];
        let mut state = self.state.lock();
        let mut registry = self.registry.lock();
        while let Some(current) = pending.pop() {
            let base = current.element_base();
            if let Some(children) = base.children() {
                pending.extend(children.snapshot());
            }
            if let Some(id) = base.id() {
                state.forget(id);
                registry.unregister(id);
            }
        }
        drop(registry);
        drop(state);
        tracing::debug!(target: targets::VIEW, element = %describe(&**element), "element removed");
        self.queue_draw();
    }

    // -------------------------------------------------------------------------
    // Focus and popup
    // -------------------------------------------------------------------------

    /// The element with keyboard focus.
    pub fn focused_element(&self) -> Option<ElementRef> {
        let id = self.state.lock().focus?;
        self.element(id)
    }

    /// Move the keyboard focus; `None` clears it.
    pub fn set_focus(&self, element: Option<&ElementRef>) {
        let id = element.and_then(|element| element.element_base().id());
        let previous = std::mem::replace(&mut self.state.lock().focus, id);
        if previous != id {
            tracing::trace!(target: targets::VIEW, ?previous, focus = ?id, "focus changed");
        }
    }

    /// The element drawn above everything else.
    pub fn popup_element(&self) -> Option<ElementRef> {
        let id = self.state.lock().popup?;
        self.element(id)
    }

    pub fn set_popup_element(&self, element: Option<&ElementRef>) {
        self.state.lock().popup = element.and_then(|element| element.element_base().id());
        self.children.mark_redraw();
        self.queue_draw();
    }

    /// The element under the pointer.
    pub fn mouse_over_element(&self) -> Option<ElementRef> {
        let id = self.state.lock().mouse_over?;
        self.element(id)
    }

    /// The element holding the mouse grab.
    pub fn grabbed_element(&self) -> Option<ElementRef> {
        let id = self.state.lock().grab?;
        self.element(id)
    }

    /// The content area element, if one was added.
    pub fn content_area(&self) -> Option<ElementRef> {
        let id = self.state.lock().content_area?;
        self.element(id)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// The event being fired, for handlers to inspect.
    pub fn current_event(&self) -> Option<Event> {
        self.current_event.lock().clone()
    }

    /// Set the result of the event being fired; handlers cancel the default
    /// action with [`EventResult::Canceled`].
    pub fn set_event_result(&self, result: EventResult) {
        *self.event_result.lock() = result;
    }

    /// Emit `signal` with `event` as the current event.
    ///
    /// Nested firing saves and restores the outer event. Returns the event
    /// result, `Handled` unless a handler changed it.
    pub fn fire_event(&self, signal: &Signal, event: Event) -> EventResult {
        if !self.events_enabled() {
            return EventResult::Unhandled;
        }
        let previous_event = self.current_event.lock().replace(event);
        let previous_result =
            std::mem::replace(&mut *self.event_result.lock(), EventResult::Handled);
        signal.emit(&[]);
        let result = std::mem::replace(&mut *self.event_result.lock(), previous_result);
        *self.current_event.lock() = previous_event;
        result
    }

    /// Map a point in view coordinates into `element`'s coordinates.
    pub fn view_coord_to_element_coord(&self, element: &ElementRef, x: f64, y: f64) -> (f64, f64) {
        let mut chain = vec![Arc::clone(element)];
        while let Some(parent) = chain.last().and_then(|e| e.element_base().parent()) {
            chain.push(parent);
        }
        let (mut x, mut y) = (x, y);
        let mut parent: Option<&ElementRef> = None;
        for current in chain.iter().rev() {
            (x, y) = match parent {
                Some(parent) => parent.self_coord_to_child_coord(&**current, x, y),
                None => {
                    let base = current.element_base();
                    parent_coord_to_child_coord(
                        x,
                        y,
                        base.x(),
                        base.y(),
                        base.pin_x(),
                        base.pin_y(),
                        base.rotation_radians(),
                    )
                }
            };
            parent = Some(current);
        }
        (x, y)
    }

    /// Deliver a mouse event in view coordinates.
    #[tracing::instrument(skip_all, target = "horizon_gadget::view", level = "trace", fields(event = ?event.event_type))]
    pub fn on_mouse_event(&self, event: &MouseEvent) -> EventResult {
        let event_type = event.event_type;

        if event_type == EventType::MouseOut {
            self.update_mouse_over(None, event);
            return EventResult::Unhandled;
        }

        if matches!(
            event_type,
            EventType::MouseMove
                | EventType::MouseUp
                | EventType::Click
                | EventType::DblClick
                | EventType::RClick
                | EventType::RDblClick
        ) {
            if let Some(grabbed) = self.grabbed_element() {
                let (x, y) = self.view_coord_to_element_coord(&grabbed, event.x, event.y);
                let dispatch = dispatch_mouse_event(&grabbed, &event.at(x, y), true);
                let inside = grabbed.element_base().is_point_in(x, y);
                // A click always follows the up event; an up outside the
                // element ends the gesture without one.
                let release = match event_type {
                    EventType::MouseUp => !inside,
                    EventType::MouseMove => false,
                    _ => true,
                };
                if release {
                    self.state.lock().grab = None;
                }
                if event_type == EventType::MouseMove {
                    let over = grabbed
                        .element_base()
                        .id()
                        .filter(|&id| inside && self.is_alive(id));
                    self.update_mouse_over(over, event);
                }
                return dispatch.result;
            }
        }

        if let Some(popup) = self.popup_element() {
            let (x, y) = self.view_coord_to_element_coord(&popup, event.x, event.y);
            if popup.element_base().is_point_in(x, y) {
                let dispatch = dispatch_mouse_event(&popup, &event.at(x, y), false);
                self.after_mouse_dispatch(event, &dispatch);
                return dispatch.result;
            }
            if event_type == EventType::MouseDown {
                self.set_popup_element(None);
            }
        }

        let dispatch = self.children.on_mouse_event(event);
        self.after_mouse_dispatch(event, &dispatch);
        dispatch.result
    }

    fn after_mouse_dispatch(&self, event: &MouseEvent, dispatch: &crate::element::MouseDispatch) {
        match event.event_type {
            EventType::MouseMove => self.update_mouse_over(dispatch.in_element, event),
            EventType::MouseDown => {
                let target = dispatch.fired.or(dispatch.in_element);
                self.state.lock().grab = target;
                let element = target.and_then(|id| self.element(id));
                self.set_focus(element.as_ref());
            }
            _ => {}
        }
    }

    fn update_mouse_over(&self, over: Option<ElementId>, event: &MouseEvent) {
        let previous = {
            let mut state = self.state.lock();
            if state.mouse_over == over {
                return;
            }
            std::mem::replace(&mut state.mouse_over, over)
        };
        if let Some(old) = previous.and_then(|id| self.element(id)) {
            let (x, y) = self.view_coord_to_element_coord(&old, event.x, event.y);
            let out = event.with_type(EventType::MouseOut).at(x, y);
            dispatch_mouse_event(&old, &out, true);
        }
        if let Some(new) = over.and_then(|id| self.element(id)) {
            let (x, y) = self.view_coord_to_element_coord(&new, event.x, event.y);
            let enter = event.with_type(EventType::MouseOver).at(x, y);
            dispatch_mouse_event(&new, &enter, true);
        }
    }

    /// Deliver a drag event in view coordinates.
    #[tracing::instrument(skip_all, target = "horizon_gadget::view", level = "trace", fields(event = ?event.event_type))]
    pub fn on_drag_event(&self, event: &DragEvent) -> EventResult {
        match event.event_type {
            EventType::DragOut => {
                self.update_drag_over(None, event);
                EventResult::Unhandled
            }
            EventType::DragDrop => {
                let dispatch = self.children.on_drag_event(event);
                self.state.lock().drag_over = None;
                dispatch.result
            }
            _ => {
                let over = event.with_type(EventType::DragOver);
                let dispatch = self.children.on_drag_event(&over);
                self.update_drag_over(dispatch.fired, event);
                dispatch.result
            }
        }
    }

    fn update_drag_over(&self, over: Option<ElementId>, event: &DragEvent) {
        let previous = {
            let mut state = self.state.lock();
            if state.drag_over == over {
                return;
            }
            std::mem::replace(&mut state.drag_over, over)
        };
        if let Some(old) = previous.and_then(|id| self.element(id)) {
            let (x, y) = self.view_coord_to_element_coord(&old, event.x, event.y);
            dispatch_drag_event(&old, &event.with_type(EventType::DragOut).at(x, y), true);
        }
    }

    // -------------------------------------------------------------------------
    // Layout and drawing
    // -------------------------------------------------------------------------

    /// Lay out the whole tree.
    pub fn layout(&self) {
        self.children.layout();
    }

    /// Lay out and draw the view. The popup element is drawn last, at its
    /// position in view coordinates.
    pub fn draw(&self) -> Option<SharedCanvas> {
        let (width, height) = (self.width(), self.height());
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let _span = PerfSpan::new("view_draw");
        self.layout();

        let canvas = {
            let mut cached = self.canvas.lock();
            let reusable = cached.as_ref().is_some_and(|canvas| {
                let canvas = canvas.lock();
                canvas.width() == width && canvas.height() == height
            });
            if !reusable {
                *cached = Some(self.graphics.new_canvas(width, height));
            }
            cached.clone()?
        };

        let root = self.children.draw();
        let popup = self.popup_element().and_then(|popup| {
            let origin = popup_origin(&popup);
            draw_element(&popup).map(|canvas| (origin, canvas))
        });
        {
            let mut target = canvas.lock();
            target.clear();
            if let Some(root) = root {
                target.draw_canvas(0.0, 0.0, &*root.lock());
            }
            if let Some(((x, y), popup)) = popup {
                target.draw_canvas(x, y, &*popup.lock());
            }
        }
        self.needs_redraw.store(false, Ordering::Release);
        Some(canvas)
    }
}

/// The view position of an element's origin, ignoring ancestor rotation.
fn popup_origin(element: &ElementRef) -> (f64, f64) {
    let (mut x, mut y) = (0.0, 0.0);
    let mut current = Some(Arc::clone(element));
    while let Some(element) = current {
        let base = element.element_base();
        x += base.x() - base.pin_x();
        y += base.y() - base.pin_y();
        current = base.parent();
        if let Some(parent) = &current {
            let (dx, dy) = parent.children_offset();
            x += dx;
            y += dy;
        }
    }
    (x, y)
}

impl Scriptable for View {
    fn scriptable_helper(&self) -> &ScriptableHelper {
        &self.helper
    }

    fn class_id(&self) -> ClassId {
        VIEW_CLASS_ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("elements", &self.element_count())
            .finish()
    }
}
