//! Error types for the gadget host.

use std::path::PathBuf;

/// Errors raised while parsing gadget XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document is not well formed.
    #[error("{file}:{row}:{column}: {message}")]
    Parse {
        file: String,
        row: usize,
        column: usize,
        message: String,
    },

    /// The document has no root element.
    #[error("{file}: document has no root element")]
    NoRoot { file: String },

    /// The root element has an unexpected tag.
    #[error("{file}: expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot {
        file: String,
        expected: String,
        found: String,
    },
}

impl XmlError {
    /// Create a parse error at a location.
    pub fn parse(file: &str, row: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.to_string(),
            row,
            column,
            message: message.into(),
        }
    }
}

/// Errors raised by extension loading and registration.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// No loader could find a module with this name.
    #[error("extension '{name}' was not found")]
    NotFound { name: String },

    /// The shared library could not be opened.
    #[error("failed to load extension library '{path}': {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The shared library does not export the extension constructor.
    #[error("'{path}' does not export an extension constructor: {source}")]
    MissingSymbol {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The module refused to initialize.
    #[error("extension '{name}' failed to initialize")]
    InitializeFailed { name: String },

    /// The manager no longer accepts loads or unloads.
    #[error("extension manager is read only, cannot change '{name}'")]
    Readonly { name: String },

    /// Resident modules are never unloaded.
    #[error("extension '{name}' is resident")]
    Resident { name: String },

    /// The module is not loaded.
    #[error("extension '{name}' is not loaded")]
    NotLoaded { name: String },
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Any error raised by the gadget host.
#[derive(Debug, thiserror::Error)]
pub enum GadgetError {
    /// XML error.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// Extension error.
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for gadget operations.
pub type Result<T> = std::result::Result<T, GadgetError>;
