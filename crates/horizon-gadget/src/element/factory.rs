//! Creates elements by tag name.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_gadget_core::name_key;
use parking_lot::RwLock;

use super::{Div, ElementContext, ElementRef, Label};
use crate::logging::targets;
use crate::view::View;

/// A function constructing an element; `None` signals a creation failure.
pub type ElementCreator = Arc<dyn Fn(&ElementContext) -> Option<ElementRef> + Send + Sync>;

/// A registry of element classes keyed by tag name.
///
/// Tag names compare by the crate-wide string rules, so with the
/// `case-insensitive` feature `DIV` and `div` are the same class.
#[derive(Default)]
pub struct ElementFactory {
    creators: RwLock<HashMap<String, ElementCreator>>,
}

impl ElementFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the built-in `div` and `label` classes.
    pub fn with_builtin() -> Self {
        let factory = Self::new();
        factory.register_element_class("div", |context| Some(Div::create(context) as ElementRef));
        factory.register_element_class("label", |context| {
            Some(Label::create(context) as ElementRef)
        });
        factory
    }

    /// Register a class. Returns `false`, keeping the existing creator, if
    /// `tag` is already registered.
    pub fn register_element_class<F>(&self, tag: &str, creator: F) -> bool
    where
        F: Fn(&ElementContext) -> Option<ElementRef> + Send + Sync + 'static,
    {
        let mut creators = self.creators.write();
        let key = name_key(tag).into_owned();
        if creators.contains_key(&key) {
            tracing::warn!(target: targets::FACTORY, tag, "element class already registered");
            return false;
        }
        creators.insert(key, Arc::new(creator));
        tracing::debug!(target: targets::FACTORY, tag, "registered element class");
        true
    }

    /// Whether `tag` is registered.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.creators.read().contains_key(&*name_key(tag))
    }

    /// Create an element of class `tag` inside `view`.
    ///
    /// Returns `None` if the tag is unknown or its creator failed.
    pub fn create_element(
        &self,
        tag: &str,
        parent: Option<&ElementRef>,
        view: &Arc<View>,
        name: &str,
    ) -> Option<ElementRef> {
        let Some(creator) = self.creators.read().get(&*name_key(tag)).cloned() else {
            tracing::warn!(target: targets::FACTORY, tag, "unknown element tag");
            return None;
        };
        let context = ElementContext {
            view: Arc::downgrade(view),
            parent: parent.map(Arc::downgrade),
            tag: tag.to_string(),
            name: name.to_string(),
        };
        let element = creator(&context);
        if element.is_none() {
            tracing::warn!(target: targets::FACTORY, tag, "element creation failed");
        }
        element
    }
}
