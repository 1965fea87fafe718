//! Logging targets and the element tree debug dump.
//!
//! Host applications filter gadget output by target:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_gadget::xml=debug,horizon_gadget::view=trace")
//!     .init();
//! ```

use std::fmt::Write;

use horizon_gadget_core::TreeFormatOptions;

use crate::element::{Element, ElementRef, Elements};
use crate::view::View;

/// Target names for log filtering.
pub mod targets {
    /// Element property and tree mutation target.
    pub const ELEMENT: &str = "horizon_gadget::element";
    /// View dispatch, focus and redraw target.
    pub const VIEW: &str = "horizon_gadget::view";
    /// XML parsing and binding target.
    pub const XML: &str = "horizon_gadget::xml";
    /// Extension loading target.
    pub const EXTENSION: &str = "horizon_gadget::extension";
    /// Configuration target.
    pub const CONFIG: &str = "horizon_gadget::config";
    /// Element factory target.
    pub const FACTORY: &str = "horizon_gadget::factory";
}

/// Renders the element tree of a view for diagnostics.
///
/// # Example
///
/// ```ignore
/// let dump = ElementTreeDebug::new(TreeFormatOptions::detailed()).format_view(&view);
/// tracing::debug!("{dump}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementTreeDebug {
    options: TreeFormatOptions,
}

impl ElementTreeDebug {
    /// Create a formatter with the given options.
    pub fn new(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every element of `view`.
    pub fn format_view(&self, view: &View) -> String {
        let mut out = format!("view {}x{}\n", view.width(), view.height());
        self.format_children(view.children(), 1, &mut out);
        out
    }

    /// Format `element` and its descendants.
    pub fn format_subtree(&self, element: &ElementRef) -> String {
        let mut out = String::new();
        self.format_node(element, 0, true, &mut out);
        out
    }

    fn format_children(&self, children: &Elements, depth: usize, out: &mut String) {
        if self.options.exceeds_depth(depth) {
            return;
        }
        let snapshot = children.snapshot();
        let last = snapshot.len().saturating_sub(1);
        for (index, child) in snapshot.iter().enumerate() {
            self.format_node(child, depth, index == last, out);
        }
    }

    fn format_node(&self, element: &ElementRef, depth: usize, is_last: bool, out: &mut String) {
        let base = element.element_base();
        out.push_str(&self.options.node_prefix(depth, is_last));
        if self.options.show_types {
            let _ = write!(out, "<{}>", base.tag_name());
        }
        if !base.name().is_empty() {
            let _ = write!(out, " \"{}\"", base.name());
        }
        if self.options.show_ids {
            if let Some(id) = base.id() {
                let _ = write!(out, " #{:x}", id.as_raw());
            }
        }
        out.push('\n');

        if self.options.show_properties {
            let prefix = self.options.property_prefix(depth + 1);
            let _ = writeln!(
                out,
                "{prefix}geometry: ({}, {}) {}x{} pin ({}, {}) rotation {}",
                base.x(),
                base.y(),
                base.width(),
                base.height(),
                base.pin_x(),
                base.pin_y(),
                base.rotation()
            );
            let _ = writeln!(
                out,
                "{prefix}visible: {}, enabled: {}, opacity: {}",
                base.is_visible(),
                base.is_enabled(),
                base.opacity()
            );
        }

        if let Some(children) = base.children() {
            self.format_children(children, depth + 1, out);
        }
    }
}

/// Format a single element as `<tag> "name"`, used in log fields.
pub(crate) fn describe(element: &dyn Element) -> String {
    let base = element.element_base();
    if base.name().is_empty() {
        format!("<{}>", base.tag_name())
    } else {
        format!("<{}> \"{}\"", base.tag_name(), base.name())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::element::ElementFactory;
    use crate::graphics::RecordingGraphics;

    fn sample_view() -> Arc<View> {
        let view = View::new(
            Arc::new(ElementFactory::with_builtin()),
            Arc::new(RecordingGraphics::new()),
        );
        view.set_size(100.0, 50.0);
        let outer = view.children().append_element("div", "outer").unwrap();
        outer
            .element_base()
            .children()
            .unwrap()
            .append_element("label", "caption")
            .unwrap();
        view.children().append_element("label", "").unwrap();
        view
    }

    #[test]
    fn test_format_view_lists_every_element() {
        let dump = ElementTreeDebug::default().format_view(&sample_view());
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "view 100x50");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("<div> \"outer\""));
        assert!(lines[2].contains("<label> \"caption\""));
        assert!(lines[3].contains("<label>"));
    }

    #[test]
    fn test_depth_limit_and_properties() {
        let view = sample_view();
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::detailed()
        };
        let dump = ElementTreeDebug::new(options).format_view(&view);
        assert!(!dump.contains("caption"));
        assert!(dump.contains("geometry: (0, 0) 0x0"));
    }

    #[test]
    fn test_describe() {
        let view = sample_view();
        let outer = view.children().get_item_by_index(0).unwrap();
        assert_eq!(describe(&*outer), "<div> \"outer\"");
    }
}
