//! The `label` text element.

use std::any::Any;
use std::sync::{Arc, Weak};

use horizon_gadget_core::{
    ClassId, Property, Scriptable, ScriptableHelper, functor_slot, property_getter_slot,
};

use super::base::BASIC_ELEMENT_CLASS_ID;
use super::{Element, ElementBase, ElementContext};
use crate::graphics::{Canvas, Color};

/// Class id of [`Label`].
pub const LABEL_CLASS_ID: ClassId = 0x4b12_8d0f_91a3_4e27;

/// A single run of text.
///
/// The text comes from the element's XML content through `innerText`.
pub struct Label {
    base: ElementBase,
    inner_text: Arc<Property<String>>,
    color: Arc<Property<String>>,
}

impl Label {
    /// Create a label for `context`.
    pub fn create(context: &ElementContext) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Label>| {
            let owner: Weak<dyn Element> = weak.clone();
            let label = Label {
                base: ElementBase::new(context, &owner, false),
                inner_text: Arc::new(Property::new(String::new())),
                color: Arc::new(Property::new("#000000".to_string())),
            };
            let helper = label.base.helper();

            let this = weak.clone();
            helper.register_property(
                "innerText",
                Some(property_getter_slot(&label.inner_text)),
                Some(functor_slot(move |text: String| {
                    if let Some(label) = this.upgrade() {
                        label.set_inner_text(&text);
                    }
                })),
            );
            let this = weak.clone();
            helper.register_property(
                "color",
                Some(property_getter_slot(&label.color)),
                Some(functor_slot(move |color: String| {
                    if let Some(label) = this.upgrade() {
                        label.set_color(&color);
                    }
                })),
            );
            label
        })
    }

    pub fn inner_text(&self) -> String {
        self.inner_text.get()
    }

    pub fn set_inner_text(&self, text: &str) {
        if self.inner_text.set(text.to_string()) {
            self.base.queue_draw();
        }
    }

    pub fn color(&self) -> String {
        self.color.get()
    }

    pub fn set_color(&self, color: &str) {
        if self.color.set(color.to_string()) {
            self.base.queue_draw();
        }
    }
}

impl Scriptable for Label {
    fn scriptable_helper(&self) -> &ScriptableHelper {
        self.base.helper()
    }

    fn class_id(&self) -> ClassId {
        LABEL_CLASS_ID
    }

    fn is_instance_of(&self, class_id: ClassId) -> bool {
        class_id == LABEL_CLASS_ID || class_id == BASIC_ELEMENT_CLASS_ID
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Element for Label {
    fn element_base(&self) -> &ElementBase {
        &self.base
    }

    fn do_draw(&self, canvas: &mut dyn Canvas) {
        let text = self.inner_text.get();
        if text.is_empty() {
            return;
        }
        let color = Color::parse(&self.color.get()).unwrap_or(Color::BLACK);
        canvas.draw_text(0.0, 0.0, &text, color);
    }
}
