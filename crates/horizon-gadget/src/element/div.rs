//! The `div` container element.

use std::any::Any;
use std::sync::{Arc, Weak};

use horizon_gadget_core::{
    ClassId, Property, Scriptable, ScriptableHelper, functor_slot, property_getter_slot,
};

use super::base::BASIC_ELEMENT_CLASS_ID;
use super::{Element, ElementBase, ElementContext};
use crate::graphics::{Canvas, Color};
use crate::logging::targets;

/// Class id of [`Div`].
pub const DIV_CLASS_ID: ClassId = 0x2e2a_f4a6_2c1b_4c64;

/// A container with an optional background color and scrolling.
///
/// With `autoscroll` set, the children are laid out over their full
/// extents and `scrollX`/`scrollY` shift them inside the div.
pub struct Div {
    base: ElementBase,
    background: Arc<Property<String>>,
    autoscroll: Arc<Property<bool>>,
    scroll_x: Arc<Property<f64>>,
    scroll_y: Arc<Property<f64>>,
}

impl Div {
    /// Create a div for `context`.
    pub fn create(context: &ElementContext) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Div>| {
            let owner: Weak<dyn Element> = weak.clone();
            let div = Div {
                base: ElementBase::new(context, &owner, true),
                background: Arc::new(Property::new(String::new())),
                autoscroll: Arc::new(Property::new(false)),
                scroll_x: Arc::new(Property::new(0.0)),
                scroll_y: Arc::new(Property::new(0.0)),
            };
            div.register_members(weak);
            div
        })
    }

    fn register_members(&self, weak: &Weak<Div>) {
        let helper = self.base.helper();

        let this = weak.clone();
        helper.register_property(
            "background",
            Some(property_getter_slot(&self.background)),
            Some(functor_slot(move |value: String| {
                if let Some(div) = this.upgrade() {
                    div.set_background(&value);
                }
            })),
        );

        let this = weak.clone();
        helper.register_property(
            "autoscroll",
            Some(property_getter_slot(&self.autoscroll)),
            Some(functor_slot(move |value: bool| {
                if let Some(div) = this.upgrade() {
                    div.set_autoscroll(value);
                }
            })),
        );

        let this = weak.clone();
        helper.register_property(
            "scrollX",
            Some(property_getter_slot(&self.scroll_x)),
            Some(functor_slot(move |value: f64| {
                if let Some(div) = this.upgrade() {
                    div.set_scroll_position(value, div.scroll_y.get());
                }
            })),
        );

        let this = weak.clone();
        helper.register_property(
            "scrollY",
            Some(property_getter_slot(&self.scroll_y)),
            Some(functor_slot(move |value: f64| {
                if let Some(div) = this.upgrade() {
                    div.set_scroll_position(div.scroll_x.get(), value);
                }
            })),
        );
    }

    /// The background color text, empty for none.
    pub fn background(&self) -> String {
        self.background.get()
    }

    pub fn set_background(&self, background: &str) {
        if !background.is_empty() && Color::parse(background).is_none() {
            tracing::warn!(target: targets::ELEMENT, background, "unrecognized background color");
        }
        if self.background.set(background.to_string()) {
            self.base.queue_draw();
        }
    }

    pub fn is_autoscroll(&self) -> bool {
        self.autoscroll.get()
    }

    pub fn set_autoscroll(&self, autoscroll: bool) {
        if self.autoscroll.set(autoscroll) {
            if let Some(children) = self.base.children() {
                children.set_scrollable(autoscroll);
            }
            if !autoscroll {
                self.set_scroll_position(0.0, 0.0);
            }
        }
    }

    /// The scroll position in children coordinates.
    pub fn scroll_position(&self) -> (f64, f64) {
        (self.scroll_x.get(), self.scroll_y.get())
    }

    /// Scroll the children, clamped to their extents.
    pub fn set_scroll_position(&self, x: f64, y: f64) {
        let (max_x, max_y) = match self.base.children() {
            Some(children) if self.is_autoscroll() => {
                let extents = children.children_extents();
                (
                    (extents.max_x - self.base.width()).max(0.0),
                    (extents.max_y - self.base.height()).max(0.0),
                )
            }
            _ => (0.0, 0.0),
        };
        let changed_x = self.scroll_x.set(x.clamp(0.0, max_x));
        let changed_y = self.scroll_y.set(y.clamp(0.0, max_y));
        if changed_x || changed_y {
            self.base.queue_draw();
        }
    }
}

impl Scriptable for Div {
    fn scriptable_helper(&self) -> &ScriptableHelper {
        self.base.helper()
    }

    fn class_id(&self) -> ClassId {
        DIV_CLASS_ID
    }

    fn is_instance_of(&self, class_id: ClassId) -> bool {
        class_id == DIV_CLASS_ID || class_id == BASIC_ELEMENT_CLASS_ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Element for Div {
    fn element_base(&self) -> &ElementBase {
        &self.base
    }

    fn do_draw(&self, canvas: &mut dyn Canvas) {
        if let Some(color) = Color::parse(&self.background.get()) {
            canvas.draw_filled_rect(0.0, 0.0, self.base.width(), self.base.height(), color);
        }
    }

    fn children_offset(&self) -> (f64, f64) {
        let (x, y) = self.scroll_position();
        (-x, -y)
    }

    fn layout(&self) {
        if let Some(children) = self.base.children() {
            children.layout();
        }
        // Re-clamp after the extents moved.
        let (x, y) = self.scroll_position();
        self.set_scroll_position(x, y);
    }
}
