//! Applying parsed markup to scriptable objects and element trees.

use std::fmt;

use horizon_gadget_core::{PropertyId, Scriptable, Variant, VariantType, gadget_str_eq};

use super::dom::DomElement;
use crate::element::{ElementRef, Elements};
use crate::error::XmlError;
use crate::logging::targets;
use crate::script::ScriptContext;
use crate::view::View;

/// The attribute holding an element's instance name.
pub const NAME_ATTRIBUTE: &str = "name";
/// The property receiving an element's text content.
pub const INNER_TEXT_PROPERTY: &str = "innerText";
/// Child tags holding script rather than elements.
pub const SCRIPT_TAG: &str = "script";
/// The root tag of a view document.
pub const VIEW_TAG: &str = "view";

fn warn_at(filename: &str, row: usize, column: usize, message: fmt::Arguments<'_>) {
    tracing::warn!(
        target: targets::XML,
        file = filename,
        row,
        column,
        "{filename}:{row}:{column}: {message}"
    );
}

/// Guess the kind of an attribute assigned to a variant typed property.
fn guess_variant(value: &str) -> Variant {
    if value.eq_ignore_ascii_case("true") {
        Variant::Bool(true)
    } else if value.eq_ignore_ascii_case("false") {
        Variant::Bool(false)
    } else if let Ok(int) = value.parse::<i64>() {
        Variant::Int64(int)
    } else if let Some(double) = value.parse::<f64>().ok().filter(|d| d.is_finite()) {
        Variant::Double(double)
    } else {
        Variant::String(value.to_string())
    }
}

/// Convert attribute text to a property's declared kind.
fn coerce_attribute(
    kind: VariantType,
    value: &str,
    context: Option<&dyn ScriptContext>,
    filename: &str,
    row: usize,
) -> Option<Variant> {
    match kind {
        VariantType::Any => Some(guess_variant(value)),
        VariantType::Callable => {
            let context = context?;
            context
                .compile(value, filename, row)
                .map(|callable| Variant::Callable(Some(callable)))
        }
        VariantType::Scriptable | VariantType::Void => None,
        kind => Variant::String(value.to_string()).convert_to(kind),
    }
}

fn apply_value(
    scriptable: &dyn Scriptable,
    context: Option<&dyn ScriptContext>,
    name: &str,
    value: &str,
    filename: &str,
    row: usize,
    column: usize,
) -> bool {
    let Some(info) = scriptable.property_info(name) else {
        warn_at(filename, row, column, format_args!("no property '{name}'"));
        return false;
    };
    if info.is_method || info.id == PropertyId::Constant {
        warn_at(filename, row, column, format_args!("'{name}' is not a writable property"));
        return false;
    }
    let kind = info.kind();
    let Some(converted) = coerce_attribute(kind, value, context, filename, row) else {
        warn_at(
            filename,
            row,
            column,
            format_args!("cannot convert '{value}' to {} for property '{name}'", kind.name()),
        );
        return false;
    };
    let applied = match info.id {
        PropertyId::Dynamic => scriptable.set_property_by_name(name, converted),
        id => scriptable.set_property(id, converted),
    };
    if !applied {
        warn_at(filename, row, column, format_args!("failed to set property '{name}' to '{value}'"));
    }
    applied
}

/// Assign each attribute of `element` to the property of the same name,
/// converting the text to the property's declared kind, then assign the
/// trimmed text content to `innerText` when it is not empty.
///
/// Failures are logged with their location and skipped; the remaining
/// attributes are still applied.
pub fn setup_scriptable_properties(
    scriptable: &dyn Scriptable,
    context: Option<&dyn ScriptContext>,
    element: &DomElement,
    filename: &str,
) {
    for attr in &element.attributes {
        if gadget_str_eq(&attr.name, NAME_ATTRIBUTE) {
            continue;
        }
        if gadget_str_eq(&attr.name, INNER_TEXT_PROPERTY) {
            warn_at(
                filename,
                attr.row,
                attr.column,
                format_args!("'{INNER_TEXT_PROPERTY}' must be given as element content"),
            );
            continue;
        }
        apply_value(scriptable, context, &attr.name, &attr.value, filename, attr.row, attr.column);
    }

    let text = element.text_content();
    let text = text.trim();
    if !text.is_empty() {
        apply_value(
            scriptable,
            context,
            INNER_TEXT_PROPERTY,
            text,
            filename,
            element.row,
            element.column,
        );
    }
}

/// Create the element described by `dom` and its subtree, inserting it
/// into `elements` before `before`.
///
/// Returns `None` if the element itself could not be created; failed
/// descendants are logged and skipped.
pub fn insert_element_from_dom(
    elements: &Elements,
    context: Option<&dyn ScriptContext>,
    dom: &DomElement,
    before: Option<&ElementRef>,
    filename: &str,
) -> Option<ElementRef> {
    let name = dom.attribute(NAME_ATTRIBUTE).unwrap_or("");
    let Some(element) = elements.insert_element(&dom.tag, before, name) else {
        warn_at(filename, dom.row, dom.column, format_args!("failed to create element <{}>", dom.tag));
        return None;
    };
    setup_scriptable_properties(&*element, context, dom, filename);

    let children: Vec<&DomElement> = dom
        .child_elements()
        .filter(|child| !gadget_str_eq(&child.tag, SCRIPT_TAG))
        .collect();
    match element.element_base().children() {
        Some(collection) => {
            for child in children {
                insert_element_from_dom(collection, context, child, None, filename);
            }
        }
        None if !children.is_empty() => {
            warn_at(
                filename,
                dom.row,
                dom.column,
                format_args!("<{}> cannot have child elements", dom.tag),
            );
        }
        None => {}
    }
    Some(element)
}

/// Populate `view` from a `<view>` document.
///
/// View attributes become view properties, child elements join the view
/// and `<script>` children run in the view's script context, in document
/// order.
pub fn load_view_from_xml(view: &View, xml: &str, filename: &str) -> Result<(), XmlError> {
    let dom = view.xml_parser().parse_dom(xml, filename)?;
    if !gadget_str_eq(&dom.tag, VIEW_TAG) {
        return Err(XmlError::UnexpectedRoot {
            file: filename.to_string(),
            expected: VIEW_TAG.to_string(),
            found: dom.tag,
        });
    }
    let context = view.script_context();
    let context = context.as_deref();
    setup_scriptable_properties(view, context, &dom, filename);

    for child in dom.child_elements() {
        if gadget_str_eq(&child.tag, SCRIPT_TAG) {
            match context {
                Some(context) => context.execute(&child.text_content(), filename, child.row),
                None => warn_at(
                    filename,
                    child.row,
                    child.column,
                    format_args!("no script context to run <{SCRIPT_TAG}>"),
                ),
            }
            continue;
        }
        insert_element_from_dom(view.children(), context, child, None, filename);
    }
    tracing::debug!(target: targets::XML, file = filename, elements = view.element_count(), "view loaded");
    Ok(())
}
