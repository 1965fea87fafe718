//! Finding and opening extension modules.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use parking_lot::RwLock;

use super::ExtensionModule;
use crate::error::ExtensionError;
use crate::logging::targets;

/// The symbol a shared library exports to construct its module.
///
/// Libraries export it with [`declare_extension!`](crate::declare_extension).
pub const EXTENSION_CONSTRUCTOR_SYMBOL: &[u8] = b"horizon_gadget_extension_create\0";

/// Signature of [`EXTENSION_CONSTRUCTOR_SYMBOL`].
///
/// The constructor uses the Rust ABI, so a library must be built with the
/// same compiler and `horizon-gadget` version as the host.
pub type ExtensionConstructor = fn() -> Box<dyn ExtensionModule>;

/// A module instance with the library that holds its code, if any.
pub struct LoadedModule {
    // Declared before `library` so the module drops first.
    module: Box<dyn ExtensionModule>,
    location: String,
    library: Option<Library>,
}

impl LoadedModule {
    /// A module linked into the host.
    pub fn in_process(module: Box<dyn ExtensionModule>) -> Self {
        let location = format!("builtin:{}", module.name());
        Self {
            module,
            location,
            library: None,
        }
    }

    /// The module.
    pub fn module(&self) -> &dyn ExtensionModule {
        &*self.module
    }

    /// Where the module came from: a library path or `builtin:<name>`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether the module lives in a shared library.
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.module.name())
            .field("location", &self.location)
            .finish()
    }
}

/// A source of extension modules.
pub trait ModuleLoader: Send + Sync {
    /// Open the module called `name`.
    ///
    /// Returns [`ExtensionError::NotFound`] when this loader does not know
    /// the name, so a manager can try its next loader.
    fn load(&self, name: &str) -> Result<LoadedModule, ExtensionError>;
}

type ModuleFactory = Arc<dyn Fn() -> Box<dyn ExtensionModule> + Send + Sync>;

/// Modules compiled into the host, registered by name.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: RwLock<HashMap<String, ModuleFactory>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `constructor` available as `name`. Replaces an earlier module
    /// of the same name.
    pub fn register<F>(&self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn ExtensionModule> + Send + Sync + 'static,
    {
        self.modules
            .write()
            .insert(name.to_string(), Arc::new(constructor));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_module<F>(self, name: &str, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn ExtensionModule> + Send + Sync + 'static,
    {
        self.register(name, constructor);
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, name: &str) -> Result<LoadedModule, ExtensionError> {
        let constructor = self
            .modules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ExtensionError::NotFound {
                name: name.to_string(),
            })?;
        Ok(LoadedModule::in_process(constructor()))
    }
}

/// Modules in shared libraries found on a search path.
///
/// A name is tried as a path first, then as a platform library file name
/// (`libclock.so` for `clock` on Linux) and as a literal file name in each
/// search directory.
#[derive(Debug, Default, Clone)]
pub struct DynamicModuleLoader {
    search_paths: Vec<PathBuf>,
}

impl DynamicModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The first existing candidate file for `name`.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.components().count() > 1 && direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let file_name = libloading::library_filename(name);
        self.search_paths.iter().find_map(|dir| {
            [dir.join(&file_name), dir.join(name)]
                .into_iter()
                .find(|candidate| candidate.is_file())
        })
    }
}

impl ModuleLoader for DynamicModuleLoader {
    fn load(&self, name: &str) -> Result<LoadedModule, ExtensionError> {
        let path = self.find(name).ok_or_else(|| ExtensionError::NotFound {
            name: name.to_string(),
        })?;
        tracing::debug!(target: targets::EXTENSION, name, path = %path.display(), "opening extension library");

        // SAFETY: opening a library runs its initializers. Extension
        // libraries are trusted host components found on the configured
        // search path.
        let library = unsafe { Library::new(&path) }.map_err(|source| ExtensionError::Library {
            path: path.clone(),
            source,
        })?;
        // SAFETY: the symbol is declared by `declare_extension!` with the
        // `ExtensionConstructor` signature.
        let constructor: ExtensionConstructor = unsafe {
            *library
                .get::<ExtensionConstructor>(EXTENSION_CONSTRUCTOR_SYMBOL)
                .map_err(|source| ExtensionError::MissingSymbol {
                    path: path.clone(),
                    source,
                })?
        };
        Ok(LoadedModule {
            module: constructor(),
            location: path.display().to_string(),
            library: Some(library),
        })
    }
}

/// Export an extension module constructor from a `cdylib`.
///
/// ```ignore
/// struct Clock;
/// impl horizon_gadget::extension::ExtensionModule for Clock {
///     fn name(&self) -> &str { "clock" }
/// }
/// horizon_gadget::declare_extension!(|| Clock);
/// ```
#[macro_export]
macro_rules! declare_extension {
    ($constructor:expr) => {
        #[unsafe(no_mangle)]
        pub fn horizon_gadget_extension_create()
        -> ::std::boxed::Box<dyn $crate::extension::ExtensionModule> {
            ::std::boxed::Box::new(($constructor)())
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl ExtensionModule for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_static_loader() {
        let loader = StaticModuleLoader::new().with_module("clock", || Box::new(Named("clock")));
        let loaded = loader.load("clock").unwrap();
        assert_eq!(loaded.module().name(), "clock");
        assert_eq!(loaded.location(), "builtin:clock");
        assert!(!loaded.is_dynamic());
        assert!(matches!(loader.load("weather"), Err(ExtensionError::NotFound { .. })));
    }

    #[test]
    fn test_dynamic_loader_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DynamicModuleLoader::new(vec![dir.path().to_path_buf()]);
        assert!(loader.find("absent").is_none());
        assert!(matches!(loader.load("absent"), Err(ExtensionError::NotFound { .. })));
    }

    #[test]
    fn test_dynamic_loader_rejects_non_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(libloading::library_filename("bogus"));
        std::fs::write(&path, b"not a shared object").unwrap();

        let loader = DynamicModuleLoader::new(vec![dir.path().to_path_buf()]);
        assert_eq!(loader.find("bogus"), Some(path));
        assert!(matches!(loader.load("bogus"), Err(ExtensionError::Library { .. })));
    }
}
