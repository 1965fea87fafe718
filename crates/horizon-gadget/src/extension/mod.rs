//! Loadable native extensions.
//!
//! An extension module contributes element classes, script bindings or
//! framework members through up to three entry points. An
//! [`ExtensionManager`] opens modules by name through its
//! [`ModuleLoader`]s and runs an entry point with an
//! [`ExtensionRegister`].
//!
//! # Example
//!
//! ```
//! use horizon_gadget::element::{ElementFactory, ElementRef, Label};
//! use horizon_gadget::extension::{
//!     ElementExtensionRegister, ExtensionManager, ExtensionModule, StaticModuleLoader,
//! };
//!
//! struct Muffin;
//!
//! impl ExtensionModule for Muffin {
//!     fn name(&self) -> &str {
//!         "muffin"
//!     }
//!
//!     fn register_element_extension(&self, factory: &ElementFactory) -> bool {
//!         factory.register_element_class("muffin", |context| {
//!             Some(Label::create(context) as ElementRef)
//!         })
//!     }
//! }
//!
//! let loader = StaticModuleLoader::new().with_module("muffin", || Box::new(Muffin));
//! let manager = ExtensionManager::new().with_loader(loader);
//! let factory = ElementFactory::with_builtin();
//!
//! assert!(manager.register_extension("muffin", &ElementExtensionRegister::new(&factory)));
//! assert!(factory.is_registered("muffin"));
//! ```

mod loader;
mod manager;
mod register;

use horizon_gadget_core::Scriptable;

pub use loader::{
    DynamicModuleLoader, EXTENSION_CONSTRUCTOR_SYMBOL, ExtensionConstructor, LoadedModule,
    ModuleLoader, StaticModuleLoader,
};
pub use manager::ExtensionManager;
pub use register::{
    ElementExtensionRegister, ExtensionRegister, FrameworkExtensionRegister,
    MultipleExtensionRegisterWrapper, ScriptExtensionRegister,
};

use crate::element::ElementFactory;
use crate::script::ScriptContext;

/// A native extension module.
///
/// Every entry point defaults to "absent", which registrars report as a
/// failed registration.
pub trait ExtensionModule: Send + Sync {
    /// The module's name.
    fn name(&self) -> &str;

    /// Called once after loading. Returning `false` rejects the module.
    fn initialize(&self) -> bool {
        true
    }

    /// Called once before an unload.
    fn finalize(&self) {}

    /// Register element classes.
    fn register_element_extension(&self, _factory: &ElementFactory) -> bool {
        false
    }

    /// Register script bindings.
    fn register_script_extension(&self, _context: &dyn ScriptContext) -> bool {
        false
    }

    /// Register members on the framework object.
    fn register_framework_extension(&self, _framework: &dyn Scriptable) -> bool {
        false
    }
}
