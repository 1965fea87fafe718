//! Property storage for Horizon Gadget.
//!
//! [`Property<T>`] is the interior-mutable cell that backs the script
//! visible properties of elements and views. It has no notion of names or
//! types on its own; a scriptable object exposes it by registering getter
//! and setter callables (see [`property_getter_slot`] and
//! [`property_setter_slot`]) or methods that read it.
//!
//! [`property_getter_slot`]: crate::property_getter_slot
//! [`property_setter_slot`]: crate::property_setter_slot
//!
//! # Example
//!
//! ```
//! use horizon_gadget_core::Property;
//!
//! let width = Property::new(100.0_f64);
//! assert!(width.set(120.0));
//! assert!(!width.set(120.0));
//! assert_eq!(width.get(), 120.0);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value cell that reports whether writes change it.
///
/// # Thread Safety
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without comparing.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// The caller marks whatever depends on the value (redraw, layout) when
    /// this returns `true`.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.value.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_property_basic() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);
    }

    #[test]
    fn test_property_set_detects_change() {
        let prop = Property::new(10);
        assert!(!prop.set(10));
        assert!(prop.set(20));
        assert_eq!(prop.get(), 20);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::new(String::from("a"));
        prop.set_silent(String::from("b"));
        assert_eq!(prop.get(), "b");
    }

    #[test]
    fn test_property_replace() {
        let prop = Property::new(1.0_f64);
        assert_eq!(prop.replace(1.0), None);
        assert_eq!(prop.replace(2.5), Some(1.0));
        assert_eq!(prop.get(), 2.5);
    }

    #[test]
    fn test_property_with_closure() {
        let prop = Property::new(vec![1, 2, 3]);
        assert_eq!(prop.with(|v| v.len()), 3);
    }

    #[test]
    fn test_property_thread_safe() {
        let prop = Arc::new(Property::new(0));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let prop = Arc::clone(&prop);
                thread::spawn(move || {
                    prop.set(i);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!((0..4).contains(&prop.get()));
    }
}
