//! Host configuration loaded from TOML.
//!
//! ```toml
//! debug_mode = "container"
//! events_enabled = true
//! extension_paths = ["/usr/lib/horizon-gadget/extensions"]
//!
//! [[extensions]]
//! name = "clock"
//! resident = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExtensionError};
use crate::extension::{DynamicModuleLoader, ExtensionManager};
use crate::logging::targets;
use crate::view::{DebugMode, View};

/// An extension to load at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub name: String,
    #[serde(default)]
    pub resident: bool,
}

/// Settings shared by the views of a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GadgetConfig {
    /// Which elements draw debug bounding boxes.
    pub debug_mode: DebugMode,
    /// Whether script event handlers run.
    pub events_enabled: bool,
    /// Directories searched for extension libraries.
    pub extension_paths: Vec<PathBuf>,
    /// Extensions to preload, in order.
    pub extensions: Vec<ExtensionConfig>,
}

impl Default for GadgetConfig {
    fn default() -> Self {
        Self {
            debug_mode: DebugMode::Off,
            events_enabled: true,
            extension_paths: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

impl GadgetConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Write the configuration to `path` as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the view settings.
    pub fn apply_to_view(&self, view: &View) {
        view.set_debug_mode(self.debug_mode);
        view.set_events_enabled(self.events_enabled);
    }

    /// A loader searching [`extension_paths`](Self::extension_paths).
    pub fn module_loader(&self) -> DynamicModuleLoader {
        DynamicModuleLoader::new(self.extension_paths.clone())
    }

    /// Load the configured extensions into `manager`, in order.
    ///
    /// A failing extension does not stop the others; the failures are
    /// logged and returned.
    pub fn load_extensions(&self, manager: &ExtensionManager) -> Vec<ExtensionError> {
        let mut failures = Vec::new();
        for extension in &self.extensions {
            if let Err(err) = manager.load_extension(&extension.name, extension.resident) {
                tracing::warn!(target: targets::CONFIG, name = %extension.name, %err, "configured extension not loaded");
                failures.push(err);
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::element::ElementFactory;
    use crate::extension::{ExtensionModule, StaticModuleLoader};
    use crate::graphics::RecordingGraphics;

    struct Clock;

    impl ExtensionModule for Clock {
        fn name(&self) -> &str {
            "clock"
        }
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let config = GadgetConfig::from_toml_str("debug_mode = \"all\"").unwrap();
        assert_eq!(config.debug_mode, DebugMode::All);
        assert!(config.events_enabled);
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            GadgetConfig::from_toml_str("debug_mode = \"sometimes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gadget.toml");
        let config = GadgetConfig {
            debug_mode: DebugMode::Container,
            events_enabled: false,
            extension_paths: vec![dir.path().to_path_buf()],
            extensions: vec![ExtensionConfig {
                name: "clock".into(),
                resident: true,
            }],
        };
        config.save(&path).unwrap();
        assert_eq!(GadgetConfig::from_path(&path).unwrap(), config);

        assert!(matches!(
            GadgetConfig::from_path(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_apply_and_load() {
        let config = GadgetConfig::from_toml_str(
            r#"
            debug_mode = "container"
            events_enabled = false

            [[extensions]]
            name = "clock"
            resident = true

            [[extensions]]
            name = "weather"
            "#,
        )
        .unwrap();

        let view = View::new(
            Arc::new(ElementFactory::with_builtin()),
            Arc::new(RecordingGraphics::new()),
        );
        config.apply_to_view(&view);
        assert_eq!(view.debug_mode(), DebugMode::Container);
        assert!(!view.events_enabled());

        let manager = ExtensionManager::new()
            .with_loader(StaticModuleLoader::new().with_module("clock", || Box::new(Clock)))
            .with_loader(config.module_loader());
        let failures = config.load_extensions(&manager);
        assert!(manager.is_resident("clock"));
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], ExtensionError::NotFound { .. }));
    }
}
