//! Logging and debugging facilities for Horizon Gadget.
//!
//! This module provides:
//! - Target names for filtering the `tracing` output of each subsystem
//! - Tree formatting options shared by the element tree debug dump
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Gadget uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_gadget_core::property=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_gadget_core";
    /// Callable invocation target.
    pub const SLOT: &str = "horizon_gadget_core::slot";
    /// Signal system target.
    pub const SIGNAL: &str = "horizon_gadget_core::signal";
    /// Scriptable object registration and ownership target.
    pub const SCRIPTABLE: &str = "horizon_gadget_core::scriptable";
    /// Property access target.
    pub const PROPERTY: &str = "horizon_gadget_core::property";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show type or tag names.
    pub show_types: bool,
    /// Whether to show geometry and other properties.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_types: false,
            show_properties: false,
            ..Default::default()
        }
    }

    /// Whether a node at `depth` is past the depth limit.
    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth > max)
    }

    /// Build the prefix string for a tree node.
    pub fn node_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    /// Build the prefix for property lines under a node.
    pub fn property_prefix(&self, depth: usize) -> String {
        let branch = match self.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.indent_size));
        }
        prefix
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_gadget::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_prefix_styles() {
        let unicode = TreeFormatOptions::default();
        assert_eq!(unicode.node_prefix(0, true), "");
        assert_eq!(unicode.node_prefix(1, false), "\u{251c}\u{2500}\u{2500} ");
        assert_eq!(unicode.node_prefix(2, true), "\u{2502}  \u{2514}\u{2500}\u{2500} ");

        let ascii = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        assert_eq!(ascii.node_prefix(1, true), "`-- ");
        assert_eq!(ascii.property_prefix(2), "|  |  ");
    }

    #[test]
    fn test_depth_limit() {
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        };
        assert!(!options.exceeds_depth(1));
        assert!(options.exceeds_depth(2));
        assert!(!TreeFormatOptions::detailed().exceeds_depth(100));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
        tracing::trace!("inside a perf span");
    }
}
