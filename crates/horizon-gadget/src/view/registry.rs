//! Arena of the elements living in a view.
//!
//! Every element added to a view gets an [`ElementId`] here. Removing an
//! element from its collection unregisters it and its subtree, which
//! invalidates the ids. Dispatch code that runs script callbacks holds ids
//! across the callback and checks [`ElementRegistry::contains`] afterwards,
//! so a handler deleting the element it was invoked on is detected.

use std::sync::{Arc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::element::{Element, ElementRef};
use crate::logging::targets;

new_key_type! {
    /// A handle to an element registered in a view.
    ///
    /// Ids are generational: once an element is removed its id never
    /// resolves again, even if the slot is reused.
    pub struct ElementId;
}

impl ElementId {
    /// Convert the id to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

struct ElementEntry {
    element: Weak<dyn Element>,
    tag: String,
    name: String,
}

/// The registry of live elements of one view.
#[derive(Default)]
pub struct ElementRegistry {
    elements: SlotMap<ElementId, ElementEntry>,
}

impl ElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element and return its id.
    pub fn register(&mut self, element: &ElementRef) -> ElementId {
        let base = element.element_base();
        let entry = ElementEntry {
            element: Arc::downgrade(element),
            tag: base.tag_name().to_string(),
            name: base.name().to_string(),
        };
        let id = self.elements.insert(entry);
        tracing::trace!(target: targets::VIEW, ?id, tag = base.tag_name(), "registered element");
        id
    }

    /// Remove an element. Returns `false` if the id was already gone.
    pub fn unregister(&mut self, id: ElementId) -> bool {
        match self.elements.remove(id) {
            Some(entry) => {
                tracing::trace!(target: targets::VIEW, ?id, tag = %entry.tag, "unregistered element");
                true
            }
            None => false,
        }
    }

    /// Whether the element is still part of the view.
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements
            .get(id)
            .is_some_and(|entry| entry.element.strong_count() > 0)
    }

    /// Resolve an id.
    pub fn get(&self, id: ElementId) -> Option<ElementRef> {
        self.elements.get(id).and_then(|entry| entry.element.upgrade())
    }

    /// The tag name an element was registered with.
    pub fn tag_name(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|entry| entry.tag.as_str())
    }

    /// Find the first registered element with `name`.
    ///
    /// Registration order is not tree order; names are expected to be
    /// unique within a view.
    pub fn find_by_name(&self, name: &str) -> Option<ElementId> {
        if name.is_empty() {
            return None;
        }
        self.elements
            .iter()
            .find(|(_, entry)| horizon_gadget_core::gadget_str_eq(&entry.name, name))
            .map(|(id, _)| id)
    }

    /// The number of registered elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element is registered.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ids_do_not_resolve() {
        let mut registry = ElementRegistry::new();
        let mut map: SlotMap<ElementId, ()> = SlotMap::with_key();
        let stale = map.insert(());
        map.remove(stale);
        assert!(!registry.contains(stale));
        assert!(!registry.unregister(stale));
        assert!(registry.is_empty());
        assert!(registry.find_by_name("").is_none());
    }
}
