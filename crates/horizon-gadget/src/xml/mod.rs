//! Gadget markup: DOM, parsing and binding to element trees.
//!
//! A view document is parsed into a [`DomElement`] tree by an
//! [`XmlParser`]. Binding then walks the tree: each tag selects an element
//! class through the view's factory, each attribute is assigned to the
//! property of the same name with conversion to its declared kind, and
//! text content becomes `innerText`.
//!
//! Binding never aborts on a bad element or attribute. Problems are logged
//! as `file:row:column: message` under the `horizon_gadget::xml` target
//! and the rest of the document is still applied.

mod binding;
mod dom;
mod parser;

pub use binding::{
    INNER_TEXT_PROPERTY, NAME_ATTRIBUTE, SCRIPT_TAG, VIEW_TAG, insert_element_from_dom,
    load_view_from_xml, setup_scriptable_properties,
};
pub use dom::{DomAttribute, DomElement, DomNode};
pub use parser::{QuickXmlParser, XmlParser};
