//! The name-keyed registry of loaded extension modules.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use horizon_gadget_core::{Callable, Variant};
use parking_lot::RwLock;

use super::{ExtensionRegister, LoadedModule, ModuleLoader};
use crate::error::ExtensionError;
use crate::logging::targets;

static GLOBAL_MANAGER: OnceLock<ExtensionManager> = OnceLock::new();

struct Entry {
    module: Arc<LoadedModule>,
    resident: bool,
}

#[derive(Default)]
struct ManagerState {
    extensions: BTreeMap<String, Entry>,
    readonly: bool,
}

/// Loads, tracks and unloads extension modules by name.
///
/// Resident modules are never unloaded. A readonly manager refuses all
/// further loads and unloads; the process-wide manager installed with
/// [`set_global`](Self::set_global) is readonly with every module
/// resident.
#[derive(Default)]
pub struct ExtensionManager {
    loaders: Vec<Box<dyn ModuleLoader>>,
    state: RwLock<ManagerState>,
}

impl ExtensionManager {
    /// Create a manager without loaders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loader, tried after the ones already added.
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn add_loader(&mut self, loader: impl ModuleLoader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// Load the module `name`, asking each loader in turn.
    ///
    /// Loading an already loaded module succeeds and, with `resident`,
    /// makes it resident.
    pub fn load_extension(&self, name: &str, resident: bool) -> Result<(), ExtensionError> {
        self.load_module(name, resident).map(|_| ())
    }

    fn load_module(&self, name: &str, resident: bool) -> Result<Arc<LoadedModule>, ExtensionError> {
        {
            let mut state = self.state.write();
            if state.readonly {
                tracing::warn!(target: targets::EXTENSION, name, "cannot load into a readonly extension manager");
                return Err(ExtensionError::Readonly {
                    name: name.to_string(),
                });
            }
            if let Some(entry) = state.extensions.get_mut(name) {
                entry.resident |= resident;
                return Ok(Arc::clone(&entry.module));
            }
        }

        let module = Arc::new(self.open(name)?);
        if !module.module().initialize() {
            tracing::warn!(target: targets::EXTENSION, name, "extension failed to initialize");
            return Err(ExtensionError::InitializeFailed {
                name: name.to_string(),
            });
        }

        let mut state = self.state.write();
        if let Some(entry) = state.extensions.get_mut(name) {
            // Loaded concurrently; keep the first instance.
            entry.resident |= resident;
            module.module().finalize();
            return Ok(Arc::clone(&entry.module));
        }
        state.extensions.insert(
            name.to_string(),
            Entry {
                module: Arc::clone(&module),
                resident,
            },
        );
        tracing::info!(target: targets::EXTENSION, name, location = module.location(), resident, "extension loaded");
        Ok(module)
    }

    fn open(&self, name: &str) -> Result<LoadedModule, ExtensionError> {
        if name.is_empty() {
            return Err(ExtensionError::NotFound {
                name: String::new(),
            });
        }
        for loader in &self.loaders {
            match loader.load(name) {
                Ok(module) => return Ok(module),
                Err(ExtensionError::NotFound { .. }) => continue,
                Err(err) => {
                    tracing::warn!(target: targets::EXTENSION, name, %err, "extension failed to load");
                    return Err(err);
                }
            }
        }
        tracing::debug!(target: targets::EXTENSION, name, "no loader provides extension");
        Err(ExtensionError::NotFound {
            name: name.to_string(),
        })
    }

    /// Unload the module `name`, calling its `finalize`.
    pub fn unload_extension(&self, name: &str) -> Result<(), ExtensionError> {
        let entry = {
            let mut state = self.state.write();
            if state.readonly {
                return Err(ExtensionError::Readonly {
                    name: name.to_string(),
                });
            }
            match state.extensions.get(name) {
                None => {
                    return Err(ExtensionError::NotLoaded {
                        name: name.to_string(),
                    });
                }
                Some(entry) if entry.resident => {
                    tracing::debug!(target: targets::EXTENSION, name, "cannot unload a resident extension");
                    return Err(ExtensionError::Resident {
                        name: name.to_string(),
                    });
                }
                Some(_) => state.extensions.remove(name),
            }
        };
        if let Some(entry) = entry {
            entry.module.module().finalize();
            tracing::info!(target: targets::EXTENSION, name, "extension unloaded");
        }
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state.read().extensions.contains_key(name)
    }

    pub fn is_resident(&self, name: &str) -> bool {
        self.state
            .read()
            .extensions
            .get(name)
            .is_some_and(|entry| entry.resident)
    }

    /// Names of the loaded modules, sorted.
    pub fn loaded_extensions(&self) -> Vec<String> {
        self.state.read().extensions.keys().cloned().collect()
    }

    /// Call `callback` with the name and location of each loaded module,
    /// in name order, until it returns `false`.
    ///
    /// Returns the last callback result, `false` when nothing is loaded.
    pub fn enumerate_loaded_extensions(&self, callback: &dyn Callable) -> bool {
        let snapshot: Vec<(String, String)> = self
            .state
            .read()
            .extensions
            .iter()
            .map(|(name, entry)| (name.clone(), entry.module.location().to_string()))
            .collect();
        let mut result = false;
        for (name, location) in snapshot {
            let value = callback.call(&[Variant::String(name), Variant::String(location)]);
            result = value.v().to_bool().unwrap_or(false);
            if !result {
                break;
            }
        }
        result
    }

    /// Run `register` on the module `name`, loading it first if needed.
    pub fn register_extension(&self, name: &str, register: &dyn ExtensionRegister) -> bool {
        let loaded = self.state.read().extensions.get(name).map(|e| Arc::clone(&e.module));
        let module = match loaded {
            Some(module) => module,
            None => match self.load_module(name, false) {
                Ok(module) => module,
                Err(_) => return false,
            },
        };
        register.register_extension(module.module())
    }

    /// Run `register` on every loaded module.
    ///
    /// Returns `true` only if modules are loaded and all registrations
    /// succeeded. Every module is tried regardless.
    pub fn register_loaded_extensions(&self, register: &dyn ExtensionRegister) -> bool {
        let modules: Vec<Arc<LoadedModule>> = self
            .state
            .read()
            .extensions
            .values()
            .map(|entry| Arc::clone(&entry.module))
            .collect();
        if modules.is_empty() {
            return false;
        }
        modules
            .iter()
            .fold(true, |ok, module| register.register_extension(module.module()) && ok)
    }

    /// Refuse further loads and unloads.
    pub fn set_readonly(&self) {
        self.state.write().readonly = true;
    }

    pub fn is_readonly(&self) -> bool {
        self.state.read().readonly
    }

    /// Install the process-wide manager.
    ///
    /// The manager becomes readonly and every loaded module resident.
    /// Fails, handing the manager back, if one was installed already.
    pub fn set_global(manager: ExtensionManager) -> Result<&'static ExtensionManager, ExtensionManager> {
        let mut pending = Some(manager);
        let installed = GLOBAL_MANAGER.get_or_init(|| pending.take().unwrap_or_default());
        if let Some(rejected) = pending {
            return Err(rejected);
        }
        let mut state = installed.state.write();
        for entry in state.extensions.values_mut() {
            entry.resident = true;
        }
        state.readonly = true;
        drop(state);
        Ok(installed)
    }

    /// The process-wide manager, if installed.
    pub fn global() -> Option<&'static ExtensionManager> {
        GLOBAL_MANAGER.get()
    }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ExtensionManager")
            .field("loaders", &self.loaders.len())
            .field("extensions", &state.extensions.keys().collect::<Vec<_>>())
            .field("readonly", &state.readonly)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use horizon_gadget_core::functor_slot;
    use parking_lot::Mutex;

    use super::*;
    use crate::element::{ElementFactory, ElementRef, Label};
    use crate::extension::{
        ElementExtensionRegister, ExtensionModule, MultipleExtensionRegisterWrapper,
        StaticModuleLoader,
    };

    static FINALIZED: AtomicUsize = AtomicUsize::new(0);

    struct Muffin;

    impl ExtensionModule for Muffin {
        fn name(&self) -> &str {
            "muffin"
        }

        fn finalize(&self) {
            FINALIZED.fetch_add(1, Ordering::SeqCst);
        }

        fn register_element_extension(&self, factory: &ElementFactory) -> bool {
            factory.register_element_class("muffin", |context| {
                Some(Label::create(context) as ElementRef)
            })
        }
    }

    struct Broken;

    impl ExtensionModule for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn initialize(&self) -> bool {
            false
        }
    }

    struct Plain;

    impl ExtensionModule for Plain {
        fn name(&self) -> &str {
            "plain"
        }
    }

    fn manager() -> ExtensionManager {
        let loader = StaticModuleLoader::new()
            .with_module("muffin", || Box::new(Muffin))
            .with_module("broken", || Box::new(Broken))
            .with_module("plain", || Box::new(Plain));
        ExtensionManager::new().with_loader(loader)
    }

    #[test]
    fn test_load_and_unload() {
        let manager = manager();
        manager.load_extension("muffin", false).unwrap();
        assert!(manager.is_loaded("muffin"));
        manager.load_extension("muffin", false).unwrap();
        assert_eq!(manager.loaded_extensions(), vec!["muffin".to_string()]);

        let before = FINALIZED.load(Ordering::SeqCst);
        manager.unload_extension("muffin").unwrap();
        assert!(!manager.is_loaded("muffin"));
        assert_eq!(FINALIZED.load(Ordering::SeqCst), before + 1);
        assert!(matches!(
            manager.unload_extension("muffin"),
            Err(ExtensionError::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_load_failures() {
        let manager = manager();
        assert!(matches!(
            manager.load_extension("nowhere", false),
            Err(ExtensionError::NotFound { .. })
        ));
        assert!(matches!(
            manager.load_extension("broken", false),
            Err(ExtensionError::InitializeFailed { .. })
        ));
        assert!(!manager.is_loaded("broken"));
    }

    #[test]
    fn test_resident_and_readonly() {
        let manager = manager();
        manager.load_extension("plain", false).unwrap();
        manager.load_extension("plain", true).unwrap();
        assert!(manager.is_resident("plain"));
        assert!(matches!(
            manager.unload_extension("plain"),
            Err(ExtensionError::Resident { .. })
        ));

        manager.set_readonly();
        assert!(matches!(
            manager.load_extension("muffin", false),
            Err(ExtensionError::Readonly { .. })
        ));
        assert!(matches!(
            manager.unload_extension("plain"),
            Err(ExtensionError::Readonly { .. })
        ));
    }

    #[test]
    fn test_register_extension_loads_on_demand() {
        let manager = manager();
        let factory = ElementFactory::new();
        let register = ElementExtensionRegister::new(&factory);

        assert!(manager.register_extension("muffin", &register));
        assert!(manager.is_loaded("muffin"));
        assert!(factory.is_registered("muffin"));
        // The class exists now, so a second registration reports failure.
        assert!(!manager.register_extension("muffin", &register));
        // No element entry point.
        assert!(!manager.register_extension("plain", &register));
    }

    #[test]
    fn test_register_loaded_extensions() {
        let manager = manager();
        let factory = ElementFactory::new();
        let register = ElementExtensionRegister::new(&factory);
        assert!(!manager.register_loaded_extensions(&register));

        manager.load_extension("muffin", false).unwrap();
        assert!(manager.register_loaded_extensions(&register));

        manager.load_extension("plain", false).unwrap();
        let other = ElementFactory::new();
        let other_register = ElementExtensionRegister::new(&other);
        assert!(!manager.register_loaded_extensions(&other_register));
        assert!(other.is_registered("muffin"));
    }

    #[test]
    fn test_multiple_register_wrapper() {
        let first = ElementFactory::new();
        let second = ElementFactory::new();
        let first_register = ElementExtensionRegister::new(&first);
        let second_register = ElementExtensionRegister::new(&second);
        let mut wrapper = MultipleExtensionRegisterWrapper::new();
        wrapper.add_extension_register(&first_register);
        wrapper.add_extension_register(&second_register);

        assert!(wrapper.register_extension(&Muffin));
        assert!(first.is_registered("muffin") && second.is_registered("muffin"));
        assert!(!wrapper.register_extension(&Plain));
    }

    #[test]
    fn test_enumerate_stops_on_false() {
        let manager = manager();
        assert!(!manager.enumerate_loaded_extensions(&*functor_slot(|_: String, _: String| true)));

        manager.load_extension("muffin", false).unwrap();
        manager.load_extension("plain", false).unwrap();

        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let record = std::sync::Arc::clone(&seen);
        let callback = functor_slot(move |name: String, location: String| {
            record.lock().push((name, location));
            false
        });
        assert!(!manager.enumerate_loaded_extensions(&*callback));
        assert_eq!(
            *seen.lock(),
            vec![("muffin".to_string(), "builtin:muffin".to_string())]
        );
    }

    #[test]
    fn test_set_global_freezes() {
        let manager = manager();
        manager.load_extension("plain", false).unwrap();
        let global = ExtensionManager::set_global(manager).unwrap();
        assert!(global.is_readonly());
        assert!(global.is_resident("plain"));
        assert!(std::ptr::eq(ExtensionManager::global().unwrap(), global));
        assert!(ExtensionManager::set_global(ExtensionManager::new()).is_err());
    }
}
