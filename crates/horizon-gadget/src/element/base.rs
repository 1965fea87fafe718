//! State shared by every element type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use horizon_gadget_core::{
    CallableRef, FromVariant, Property, ScriptableHelper, ScriptableRef, Signal, fixed_getter_slot,
    functor_slot, property_getter_slot,
};
use parking_lot::Mutex;

use super::geometry::degrees_to_radians;
use super::{Element, ElementContext, Elements};
use crate::event::EventType;
use crate::graphics::SharedCanvas;
use crate::logging::targets;
use crate::view::{ElementId, View};

/// Class id shared by all elements; element types report it from
/// `is_instance_of` in addition to their own.
pub const BASIC_ELEMENT_CLASS_ID: u64 = 0xfd70_820c_5bbf_11db;

/// Geometry, visibility, children and event signals of an element.
///
/// Element types embed one `ElementBase` and return it from
/// [`Element::element_base`]. The base registers the common script members
/// on its [`ScriptableHelper`] when it is created.
pub struct ElementBase {
    helper: ScriptableHelper,
    id: OnceLock<ElementId>,
    tag: String,
    name: String,
    view: Weak<View>,
    parent: Option<Weak<dyn Element>>,

    x: Arc<Property<f64>>,
    y: Arc<Property<f64>>,
    width: Arc<Property<f64>>,
    height: Arc<Property<f64>>,
    pin_x: Arc<Property<f64>>,
    pin_y: Arc<Property<f64>>,
    rotation: Arc<Property<f64>>,
    opacity: Arc<Property<f64>>,
    visible: Arc<Property<bool>>,
    enabled: Arc<Property<bool>>,
    drop_target: Arc<Property<bool>>,

    changed: AtomicBool,
    position_changed: AtomicBool,
    children: Option<Arc<Elements>>,
    canvas: Mutex<Option<SharedCanvas>>,
    signals: [Arc<Signal>; EventType::ALL.len()],
}

impl ElementBase {
    /// Create the base of a new element.
    ///
    /// `owner` is the element being built (from `Arc::new_cyclic`); the
    /// registered setters reach the element through it. Containers get an
    /// [`Elements`] collection owned by the element.
    pub fn new(context: &ElementContext, owner: &Weak<dyn Element>, container: bool) -> Self {
        let children = container.then(|| Elements::new(context.view.clone(), Some(owner.clone())));
        let base = Self {
            helper: ScriptableHelper::new(),
            id: OnceLock::new(),
            tag: context.tag.clone(),
            name: context.name.clone(),
            view: context.view.clone(),
            parent: context.parent.clone(),
            x: Arc::new(Property::new(0.0)),
            y: Arc::new(Property::new(0.0)),
            width: Arc::new(Property::new(0.0)),
            height: Arc::new(Property::new(0.0)),
            pin_x: Arc::new(Property::new(0.0)),
            pin_y: Arc::new(Property::new(0.0)),
            rotation: Arc::new(Property::new(0.0)),
            opacity: Arc::new(Property::new(1.0)),
            visible: Arc::new(Property::new(true)),
            enabled: Arc::new(Property::new(true)),
            drop_target: Arc::new(Property::new(false)),
            changed: AtomicBool::new(true),
            position_changed: AtomicBool::new(true),
            children,
            canvas: Mutex::new(None),
            signals: std::array::from_fn(|_| Arc::new(Signal::new())),
        };
        base.register_members(owner);
        base
    }

    fn register_members(&self, owner: &Weak<dyn Element>) {
        let helper = &self.helper;
        helper.register_property("name", Some(fixed_getter_slot(self.name.clone())), None);
        helper.register_property("tagName", Some(fixed_getter_slot(self.tag.clone())), None);

        helper.register_property("x", Some(property_getter_slot(&self.x)), Some(setter(owner, Self::set_x)));
        helper.register_property("y", Some(property_getter_slot(&self.y)), Some(setter(owner, Self::set_y)));
        helper.register_property(
            "width",
            Some(property_getter_slot(&self.width)),
            Some(setter(owner, Self::set_width)),
        );
        helper.register_property(
            "height",
            Some(property_getter_slot(&self.height)),
            Some(setter(owner, Self::set_height)),
        );
        helper.register_property(
            "pinX",
            Some(property_getter_slot(&self.pin_x)),
            Some(setter(owner, Self::set_pin_x)),
        );
        helper.register_property(
            "pinY",
            Some(property_getter_slot(&self.pin_y)),
            Some(setter(owner, Self::set_pin_y)),
        );
        helper.register_property(
            "rotation",
            Some(property_getter_slot(&self.rotation)),
            Some(setter(owner, Self::set_rotation)),
        );
        helper.register_property(
            "opacity",
            Some(property_getter_slot(&self.opacity)),
            Some(setter(owner, Self::set_opacity)),
        );
        helper.register_property(
            "visible",
            Some(property_getter_slot(&self.visible)),
            Some(setter(owner, Self::set_visible)),
        );
        helper.register_property(
            "enabled",
            Some(property_getter_slot(&self.enabled)),
            Some(setter(owner, Self::set_enabled)),
        );
        helper.register_property(
            "dropTarget",
            Some(property_getter_slot(&self.drop_target)),
            Some(setter(owner, Self::set_drop_target)),
        );

        if let Some(children) = &self.children {
            let children: ScriptableRef = Arc::clone(children) as ScriptableRef;
            helper.register_property("children", Some(fixed_getter_slot(children)), None);
        }

        let focus_owner = owner.clone();
        helper.register_method(
            "focus",
            functor_slot(move || {
                if let Some(element) = focus_owner.upgrade() {
                    if let Some(view) = element.element_base().view() {
                        view.set_focus(Some(&element));
                    }
                }
            }),
        );
        let blur_owner = owner.clone();
        helper.register_method(
            "killFocus",
            functor_slot(move || {
                if let Some(element) = blur_owner.upgrade() {
                    if let Some(view) = element.element_base().view() {
                        if view.focused_element().is_some_and(|f| same_element(&f, &element)) {
                            view.set_focus(None);
                        }
                    }
                }
            }),
        );

        for event_type in EventType::ALL {
            helper.register_signal(event_type.signal_name(), &self.signals[event_type as usize]);
        }
    }

    /// The member registry.
    pub fn helper(&self) -> &ScriptableHelper {
        &self.helper
    }

    /// The id assigned when the view accepted the element.
    pub fn id(&self) -> Option<ElementId> {
        self.id.get().copied()
    }

    pub(crate) fn set_id(&self, id: ElementId) {
        if self.id.set(id).is_err() {
            tracing::warn!(target: targets::ELEMENT, tag = %self.tag, "element registered twice");
        }
    }

    /// The tag name the element was created with.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// The instance name, empty if unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning view, if it is still alive.
    pub fn view(&self) -> Option<Arc<View>> {
        self.view.upgrade()
    }

    /// The parent element; `None` for top level elements.
    pub fn parent(&self) -> Option<Arc<dyn Element>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The child collection of a container element.
    pub fn children(&self) -> Option<&Arc<Elements>> {
        self.children.as_ref()
    }

    /// The signal fired for `event_type`.
    pub fn signal(&self, event_type: EventType) -> &Arc<Signal> {
        &self.signals[event_type as usize]
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    pub fn x(&self) -> f64 {
        self.x.get()
    }

    pub fn set_x(&self, x: f64) {
        if self.x.set(x) {
            self.position_changed();
        }
    }

    pub fn y(&self) -> f64 {
        self.y.get()
    }

    pub fn set_y(&self, y: f64) {
        if self.y.set(y) {
            self.position_changed();
        }
    }

    pub fn width(&self) -> f64 {
        self.width.get()
    }

    /// Set the width. Negative widths are clamped to zero.
    pub fn set_width(&self, width: f64) {
        if self.width.set(width.max(0.0)) {
            self.queue_draw();
        }
    }

    pub fn height(&self) -> f64 {
        self.height.get()
    }

    /// Set the height. Negative heights are clamped to zero.
    pub fn set_height(&self, height: f64) {
        if self.height.set(height.max(0.0)) {
            self.queue_draw();
        }
    }

    pub fn pin_x(&self) -> f64 {
        self.pin_x.get()
    }

    pub fn set_pin_x(&self, pin_x: f64) {
        if self.pin_x.set(pin_x) {
            self.position_changed();
        }
    }

    pub fn pin_y(&self) -> f64 {
        self.pin_y.get()
    }

    pub fn set_pin_y(&self, pin_y: f64) {
        if self.pin_y.set(pin_y) {
            self.position_changed();
        }
    }

    /// Rotation in degrees, clockwise around the pin.
    pub fn rotation(&self) -> f64 {
        self.rotation.get()
    }

    /// Rotation in radians.
    pub fn rotation_radians(&self) -> f64 {
        degrees_to_radians(self.rotation.get())
    }

    pub fn set_rotation(&self, degrees: f64) {
        if self.rotation.set(degrees) {
            self.position_changed();
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    /// Set the opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&self, opacity: f64) {
        if self.opacity.set(opacity.clamp(0.0, 1.0)) {
            self.position_changed();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        if self.visible.set(visible) {
            self.position_changed();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_drop_target(&self) -> bool {
        self.drop_target.get()
    }

    pub fn set_drop_target(&self, drop_target: bool) {
        self.drop_target.set(drop_target);
    }

    /// Whether `(x, y)`, in element coordinates, lies inside the element.
    pub fn is_point_in(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width() && y < self.height()
    }

    // -------------------------------------------------------------------------
    // Redraw bookkeeping
    // -------------------------------------------------------------------------

    /// Mark the element's own content dirty and propagate to its ancestors.
    pub fn queue_draw(&self) {
        self.changed.store(true, Ordering::Release);
        self.request_parent_redraw();
    }

    /// Whether the content changed since the last draw.
    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    pub(crate) fn clear_changed(&self) {
        self.changed.store(false, Ordering::Release);
    }

    /// Whether placement in the parent changed since the last composite.
    pub fn is_position_changed(&self) -> bool {
        self.position_changed.load(Ordering::Acquire)
    }

    pub(crate) fn clear_position_changed(&self) {
        self.position_changed.store(false, Ordering::Release);
    }

    fn position_changed(&self) {
        self.position_changed.store(true, Ordering::Release);
        self.request_parent_redraw();
    }

    fn request_parent_redraw(&self) {
        if let Some(parent) = self.parent() {
            parent.element_base().queue_draw();
        } else if let Some(view) = self.view() {
            view.queue_draw();
        }
    }

    pub(crate) fn cached_canvas(&self) -> Option<SharedCanvas> {
        self.canvas.lock().clone()
    }

    pub(crate) fn store_canvas(&self, canvas: SharedCanvas) {
        *self.canvas.lock() = Some(canvas);
    }
}

/// Whether two element handles point at the same element.
pub fn same_element(a: &Arc<dyn Element>, b: &Arc<dyn Element>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A setter callable applying `apply` to the owner's base.
pub(crate) fn setter<T, F>(owner: &Weak<dyn Element>, apply: F) -> CallableRef
where
    T: FromVariant + 'static,
    F: Fn(&ElementBase, T) + Send + Sync + 'static,
{
    let owner = owner.clone();
    functor_slot(move |value: T| {
        if let Some(element) = owner.upgrade() {
            apply(element.element_base(), value);
        }
    })
}
