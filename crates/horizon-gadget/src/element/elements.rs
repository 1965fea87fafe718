//! The ordered child collection of a container element or a view.

use std::any::Any;
use std::sync::{Arc, Weak};

use horizon_gadget_core::{
    ClassId, Scriptable, ScriptableHelper, ScriptableRef, Variant, dynamic_slot, functor_slot,
    gadget_str_eq,
};
use parking_lot::Mutex;

use super::geometry::{Extents, child_extent_in_parent, parent_coord_to_child_coord};
use super::{
    DragDispatch, Element, ElementRef, MouseDispatch, dispatch_drag_event, dispatch_mouse_event,
    draw_element, same_element,
};
use crate::event::{DragEvent, EventResult, MouseEvent};
use crate::graphics::SharedCanvas;
use crate::logging::{describe, targets};
use crate::view::View;
use crate::xml::insert_element_from_dom;

/// Class id of [`Elements`].
pub const ELEMENTS_CLASS_ID: ClassId = 0xe3bd_b064_cb15_4c9e;

#[derive(Default)]
struct CompositeState {
    canvas: Option<SharedCanvas>,
    count: usize,
}

/// An ordered collection of child elements.
///
/// The collection holds the only strong references to its elements. Each
/// element keeps a weak link to the owner of the collection, which is its
/// parent.
pub struct Elements {
    helper: ScriptableHelper,
    children: Mutex<Vec<ElementRef>>,
    owner: Option<Weak<dyn Element>>,
    view: Weak<View>,
    scrollable: Mutex<bool>,
    extents: Mutex<Extents>,
    composite: Mutex<CompositeState>,
}

impl Elements {
    /// Create a collection owned by `owner`, or by the view when `owner`
    /// is `None`.
    pub fn new(view: Weak<View>, owner: Option<Weak<dyn Element>>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Elements>| {
            let elements = Elements {
                helper: ScriptableHelper::new(),
                children: Mutex::new(Vec::new()),
                owner,
                view,
                scrollable: Mutex::new(false),
                extents: Mutex::new(Extents::default()),
                composite: Mutex::new(CompositeState::default()),
            };
            elements.register_members(me);
            elements
        })
    }

    fn register_members(&self, me: &Weak<Elements>) {
        let helper = &self.helper;

        let this = me.clone();
        helper.register_property(
            "count",
            Some(functor_slot(move || this.upgrade().map_or(0, |e| e.count() as i64))),
            None,
        );

        let this = me.clone();
        let item = functor_slot(move |key: Variant| -> Option<ScriptableRef> {
            let elements = this.upgrade()?;
            elements.item(&key).map(|element| element as ScriptableRef)
        });
        helper.register_method("item", Arc::clone(&item));
        helper.register_method("", item);

        let this = me.clone();
        helper.register_method(
            "appendElement",
            functor_slot(move |xml: String| -> Option<ScriptableRef> {
                let elements = this.upgrade()?;
                elements
                    .append_element_from_xml(&xml)
                    .map(|element| element as ScriptableRef)
            }),
        );

        let this = me.clone();
        helper.register_method(
            "insertElement",
            functor_slot(
                move |xml: String, before: Option<ScriptableRef>| -> Option<ScriptableRef> {
                    let elements = this.upgrade()?;
                    let before = before.and_then(|b| elements.find_child(&b));
                    elements
                        .insert_element_from_xml(&xml, before.as_ref())
                        .map(|element| element as ScriptableRef)
                },
            ),
        );

        let this = me.clone();
        helper.register_method(
            "removeElement",
            functor_slot(move |element: Option<ScriptableRef>| -> bool {
                let Some(elements) = this.upgrade() else {
                    return false;
                };
                match element.and_then(|e| elements.find_child(&e)) {
                    Some(child) => elements.remove_element(&child),
                    None => false,
                }
            }),
        );

        let this = me.clone();
        helper.register_method(
            "removeAllElements",
            functor_slot(move || {
                if let Some(elements) = this.upgrade() {
                    elements.remove_all_elements();
                }
            }),
        );

        let this = me.clone();
        helper.set_array_handler(
            dynamic_slot(move |args: &[Variant]| {
                let child = this.upgrade().and_then(|elements| {
                    let index = usize::try_from(args.first()?.to_int64()?).ok()?;
                    elements.get_item_by_index(index)
                });
                match child {
                    Some(element) => Variant::Scriptable(Some(element as ScriptableRef)),
                    None => Variant::Void,
                }
            }),
            None,
        );

        let this = me.clone();
        helper.set_dynamic_property_handler(
            dynamic_slot(move |args: &[Variant]| {
                let child = this.upgrade().and_then(|elements| {
                    let name = args.first()?.as_str()?.to_string();
                    elements.get_item_by_name(&name)
                });
                match child {
                    Some(element) => Variant::Scriptable(Some(element as ScriptableRef)),
                    None => Variant::Void,
                }
            }),
            None,
        );
    }

    /// The owning view.
    pub fn view(&self) -> Option<Arc<View>> {
        self.view.upgrade()
    }

    /// The element owning this collection; `None` for the view's root.
    pub fn owner(&self) -> Option<ElementRef> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// The number of children.
    pub fn count(&self) -> usize {
        self.children.lock().len()
    }

    /// A copy of the child list, safe to iterate while handlers mutate
    /// the collection.
    pub fn snapshot(&self) -> Vec<ElementRef> {
        self.children.lock().clone()
    }

    /// The child at `index`.
    pub fn get_item_by_index(&self, index: usize) -> Option<ElementRef> {
        self.children.lock().get(index).cloned()
    }

    /// The first child named `name`.
    pub fn get_item_by_name(&self, name: &str) -> Option<ElementRef> {
        self.children
            .lock()
            .iter()
            .find(|child| gadget_str_eq(child.element_base().name(), name))
            .cloned()
    }

    /// Resolve an integer index or a name, as scripts do with `item()`.
    pub fn item(&self, key: &Variant) -> Option<ElementRef> {
        match key {
            Variant::Int64(_) | Variant::Double(_) => {
                let index = usize::try_from(key.to_int64()?).ok()?;
                self.get_item_by_index(index)
            }
            Variant::String(text) => match text.trim().parse::<usize>() {
                Ok(index) => self.get_item_by_index(index),
                Err(_) => self.get_item_by_name(text),
            },
            _ => None,
        }
    }

    /// Find the child that `scriptable` refers to.
    fn find_child(&self, scriptable: &ScriptableRef) -> Option<ElementRef> {
        self.children
            .lock()
            .iter()
            .find(|child| std::ptr::addr_eq(Arc::as_ptr(child), Arc::as_ptr(scriptable)))
            .cloned()
    }

    /// Create an element and append it.
    pub fn append_element(&self, tag: &str, name: &str) -> Option<ElementRef> {
        self.insert_element(tag, None, name)
    }

    /// Create an element and insert it before `before`, or append it when
    /// `before` is `None` or not a child of this collection.
    ///
    /// Returns `None` if the tag is unknown or the view vetoed the element;
    /// the element is dropped in that case.
    pub fn insert_element(
        &self,
        tag: &str,
        before: Option<&ElementRef>,
        name: &str,
    ) -> Option<ElementRef> {
        let view = self.view()?;
        let owner = self.owner();
        let element = view
            .factory()
            .create_element(tag, owner.as_ref(), &view, name)?;
        if !view.on_element_add(&element) {
            tracing::debug!(target: targets::ELEMENT, element = %describe(&*element), "element add vetoed");
            return None;
        }
        {
            let mut children = self.children.lock();
            let index = before
                .and_then(|before| children.iter().position(|c| same_element(c, before)))
                .unwrap_or(children.len());
            children.insert(index, Arc::clone(&element));
        }
        self.changed();
        Some(element)
    }

    /// Remove `element`. Returns `false` if it is not a child of this
    /// collection.
    pub fn remove_element(&self, element: &ElementRef) -> bool {
        if !self.children.lock().iter().any(|c| same_element(c, element)) {
            return false;
        }
        if let Some(view) = self.view() {
            view.on_element_remove(element);
        }
        let removed = {
            let mut children = self.children.lock();
            children
                .iter()
                .position(|c| same_element(c, element))
                .map(|index| children.remove(index))
        };
        if removed.is_some() {
            self.changed();
        }
        removed.is_some()
    }

    /// Remove every child.
    pub fn remove_all_elements(&self) {
        let removed = std::mem::take(&mut *self.children.lock());
        if removed.is_empty() {
            return;
        }
        if let Some(view) = self.view() {
            for element in &removed {
                view.on_element_remove(element);
            }
        }
        self.changed();
    }

    /// Parse `xml` and append the element it describes.
    pub fn append_element_from_xml(&self, xml: &str) -> Option<ElementRef> {
        self.insert_element_from_xml(xml, None)
    }

    /// Parse `xml` and insert the element it describes before `before`.
    pub fn insert_element_from_xml(&self, xml: &str, before: Option<&ElementRef>) -> Option<ElementRef> {
        let view = self.view()?;
        let dom = match view.xml_parser().parse_dom(xml, "") {
            Ok(dom) => dom,
            Err(err) => {
                tracing::warn!(target: targets::XML, %err, "invalid element XML");
                return None;
            }
        };
        let context = view.script_context();
        insert_element_from_dom(self, context.as_deref(), &dom, before, "")
    }

    /// Whether the collection is sized to its children rather than to its
    /// owner.
    pub fn is_scrollable(&self) -> bool {
        *self.scrollable.lock()
    }

    pub fn set_scrollable(&self, scrollable: bool) {
        let mut current = self.scrollable.lock();
        if *current != scrollable {
            *current = scrollable;
            drop(current);
            self.changed();
        }
    }

    /// The extents of the children computed by the last layout of a
    /// scrollable collection.
    pub fn children_extents(&self) -> Extents {
        *self.extents.lock()
    }

    /// Mark every child changed so the next draw repaints the whole tree.
    pub fn mark_redraw(&self) {
        for child in self.snapshot() {
            child.element_base().queue_draw();
            if let Some(children) = child.element_base().children() {
                children.mark_redraw();
            }
        }
    }

    /// The size children are laid out and composited in.
    pub fn size(&self) -> (f64, f64) {
        let (width, height) = match self.owner() {
            Some(owner) => (owner.element_base().width(), owner.element_base().height()),
            None => self
                .view()
                .map_or((0.0, 0.0), |view| (view.width(), view.height())),
        };
        if self.is_scrollable() {
            let extents = self.children_extents();
            (width.max(extents.max_x), height.max(extents.max_y))
        } else {
            (width, height)
        }
    }

    /// Lay out every child, then recompute the extents of a scrollable
    /// collection.
    pub fn layout(&self) {
        let children = self.snapshot();
        for child in &children {
            child.layout();
        }
        if !self.is_scrollable() {
            return;
        }

        let (mut max_x, mut max_y) = (0.0_f64, 0.0_f64);
        for child in &children {
            let base = child.element_base();
            if !base.is_visible() {
                continue;
            }
            let (x, y) = (base.x(), base.y());
            let (width, height) = (base.width(), base.height());
            let (pin_x, pin_y) = (base.pin_x(), base.pin_y());
            // Bound of the child's reach from its pin under any rotation.
            let radius = pin_x.max(width - pin_x) + pin_y.max(height - pin_y);
            if x + radius > max_x || y + radius > max_y {
                let extent = child_extent_in_parent(
                    x,
                    y,
                    pin_x,
                    pin_y,
                    width,
                    height,
                    base.rotation_radians(),
                );
                max_x = max_x.max(extent.max_x);
                max_y = max_y.max(extent.max_y);
            }
        }
        *self.extents.lock() = Extents {
            min_x: 0.0,
            min_y: 0.0,
            max_x,
            max_y,
        };
    }

    /// Composite the children into this collection's canvas.
    ///
    /// The popup element is skipped; the view draws it on top of
    /// everything. Returns the cached canvas when no child changed.
    pub fn draw(&self) -> Option<SharedCanvas> {
        let view = self.view()?;
        let (width, height) = self.size();
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let children = self.snapshot();
        let popup = view.popup_element();
        let children_changed = children.iter().any(|child| {
            let base = child.element_base();
            base.is_changed() || base.is_position_changed()
        });

        let mut state = self.composite.lock();
        let cached = state.canvas.clone().filter(|canvas| {
            let canvas = canvas.lock();
            canvas.width() == width && canvas.height() == height
        });
        if let Some(canvas) = &cached {
            if !children_changed && state.count == children.len() {
                return Some(Arc::clone(canvas));
            }
        }

        let canvas = cached.unwrap_or_else(|| view.graphics().new_canvas(width, height));
        {
            let mut target = canvas.lock();
            target.clear();
            for child in &children {
                let base = child.element_base();
                base.clear_position_changed();
                if popup.as_ref().is_some_and(|popup| same_element(popup, child)) {
                    continue;
                }
                let Some(child_canvas) = draw_element(child) else {
                    continue;
                };
                target.push_state();
                target.translate(base.x(), base.y());
                let rotation = base.rotation_radians();
                if rotation != 0.0 {
                    target.rotate(rotation);
                }
                target.translate(-base.pin_x(), -base.pin_y());
                if base.opacity() < 1.0 {
                    target.multiply_opacity(base.opacity());
                }
                target.draw_canvas(0.0, 0.0, &*child_canvas.lock());
                target.pop_state();
            }
        }
        state.canvas = Some(Arc::clone(&canvas));
        state.count = children.len();
        Some(canvas)
    }

    /// Deliver a mouse event, in the owner's coordinates, to the children
    /// under the pointer, topmost first.
    ///
    /// Stops at the first child whose subtree fires. `in_element` reports
    /// the deepest element under the pointer in the topmost hit child.
    pub fn on_mouse_event(&self, event: &MouseEvent) -> MouseDispatch {
        let Some(view) = self.view() else {
            return MouseDispatch::default();
        };
        let owner = self.owner();
        let mut outcome = MouseDispatch::default();
        for child in self.snapshot().iter().rev() {
            let base = child.element_base();
            let Some(child_id) = base.id() else {
                continue;
            };
            if !view.is_alive(child_id) || !base.is_visible() {
                continue;
            }
            let (x, y) = self.to_child_coord(owner.as_ref(), child, event.x, event.y);
            if !base.is_point_in(x, y) {
                continue;
            }
            let dispatch = dispatch_mouse_event(child, &event.at(x, y), false);
            if dispatch.consumed || !view.is_alive(child_id) {
                return MouseDispatch {
                    in_element: outcome.in_element.or(dispatch.in_element),
                    consumed: true,
                    ..dispatch
                };
            }
            if outcome.in_element.is_none() {
                outcome.in_element = dispatch.in_element;
            }
            outcome.result = outcome.result.max(dispatch.result);
        }
        outcome
    }

    /// Deliver a drag event, in the owner's coordinates, to the topmost
    /// drop target under the pointer.
    pub fn on_drag_event(&self, event: &DragEvent) -> DragDispatch {
        let Some(view) = self.view() else {
            return DragDispatch::default();
        };
        let owner = self.owner();
        for child in self.snapshot().iter().rev() {
            let base = child.element_base();
            let Some(child_id) = base.id() else {
                continue;
            };
            if !view.is_alive(child_id) || !base.is_visible() {
                continue;
            }
            let (x, y) = self.to_child_coord(owner.as_ref(), child, event.x, event.y);
            if !base.is_point_in(x, y) {
                continue;
            }
            let dispatch = dispatch_drag_event(child, &event.at(x, y), false);
            if dispatch.consumed
                || dispatch.result != EventResult::Unhandled
                || !view.is_alive(child_id)
            {
                return DragDispatch {
                    consumed: true,
                    ..dispatch
                };
            }
        }
        DragDispatch::default()
    }

    fn to_child_coord(&self, owner: Option<&ElementRef>, child: &ElementRef, x: f64, y: f64) -> (f64, f64) {
        match owner {
            Some(owner) => owner.self_coord_to_child_coord(&**child, x, y),
            None => {
                let base = child.element_base();
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
        }
    }

    fn changed(&self) {
        match self.owner() {
            Some(owner) => owner.element_base().queue_draw(),
            None => {
                if let Some(view) = self.view() {
                    view.queue_draw();
                }
            }
        }
    }
}

impl Scriptable for Elements {
    fn scriptable_helper(&self) -> &ScriptableHelper {
        &self.helper
    }

    fn class_id(&self) -> ClassId {
        ELEMENTS_CLASS_ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Div, ElementFactory};
    use crate::graphics::RecordingGraphics;

    fn new_view() -> Arc<View> {
        View::new(
            Arc::new(ElementFactory::with_builtin()),
            Arc::new(RecordingGraphics::new()),
        )
    }

    fn place(element: &ElementRef, x: f64, y: f64, width: f64, height: f64) {
        let base = element.element_base();
        base.set_x(x);
        base.set_y(y);
        base.set_width(width);
        base.set_height(height);
    }

    #[test]
    fn test_rotated_child_extents() {
        let view = new_view();
        let div = view.children().append_element("div", "scroller").unwrap();
        place(&div, 0.0, 0.0, 50.0, 60.0);
        let children = div.element_base().children().unwrap();
        children.set_scrollable(true);

        let rotated = children.append_element("div", "rotated").unwrap();
        place(&rotated, 100.0, 100.0, 40.0, 40.0);
        rotated.element_base().set_rotation(45.0);
        // Cannot reach past the rotated child; skipped by the cheap bound.
        let small = children.append_element("div", "small").unwrap();
        place(&small, 10.0, 10.0, 20.0, 20.0);

        children.layout();
        let extents = children.children_extents();
        let half_diagonal = 40.0 * std::f64::consts::FRAC_1_SQRT_2;
        assert!((extents.max_x - (100.0 + half_diagonal)).abs() < 1e-9);
        assert!((extents.max_y - (100.0 + 2.0 * half_diagonal)).abs() < 1e-9);
        assert_eq!(children.size(), (extents.max_x, extents.max_y));

        // Invisible children do not count.
        rotated.element_base().set_visible(false);
        children.layout();
        assert_eq!(children.children_extents().max_x, 30.0);
        assert_eq!(children.children_extents().max_y, 30.0);
    }

    #[test]
    fn test_div_scroll_clamped_to_extents() {
        let view = new_view();
        let element = view.children().append_element("div", "scroller").unwrap();
        place(&element, 0.0, 0.0, 50.0, 60.0);
        let div = element.as_any().downcast_ref::<Div>().unwrap();
        div.set_autoscroll(true);
        let rotated = element
            .element_base()
            .children()
            .unwrap()
            .append_element("div", "rotated")
            .unwrap();
        place(&rotated, 100.0, 100.0, 40.0, 40.0);
        rotated.element_base().set_rotation(45.0);

        view.layout();
        div.set_scroll_position(1000.0, 1000.0);
        let (x, y) = div.scroll_position();
        let half_diagonal = 40.0 * std::f64::consts::FRAC_1_SQRT_2;
        assert!((x - (100.0 + half_diagonal - 50.0)).abs() < 1e-9);
        assert!((y - (100.0 + 2.0 * half_diagonal - 60.0)).abs() < 1e-9);

        div.set_autoscroll(false);
        assert_eq!(div.scroll_position(), (0.0, 0.0));
    }
}
