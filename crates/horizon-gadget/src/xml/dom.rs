//! A minimal read-only DOM for gadget markup.

use std::collections::{BTreeMap, HashMap};

use horizon_gadget_core::gadget_str_eq;

/// An attribute with the location of its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomAttribute {
    pub name: String,
    pub value: String,
    pub row: usize,
    pub column: usize,
}

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(DomElement),
    Text(String),
    CData(String),
}

impl DomNode {
    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&DomElement> {
        match self {
            DomNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its attributes and children, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    pub tag: String,
    pub attributes: Vec<DomAttribute>,
    pub children: Vec<DomNode>,
    /// One-based line of the start tag.
    pub row: usize,
    /// One-based column of the start tag.
    pub column: usize,
}

impl DomElement {
    /// Create an element without attributes or children at line 1.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            row: 1,
            column: 1,
        }
    }

    /// Look up an attribute value. Names compare by the crate-wide rules.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_node(name).map(|attr| attr.value.as_str())
    }

    pub fn attribute_node(&self, name: &str) -> Option<&DomAttribute> {
        self.attributes.iter().find(|attr| gadget_str_eq(&attr.name, name))
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &DomElement> {
        self.children.iter().filter_map(DomNode::as_element)
    }

    /// The first child element named `tag`.
    pub fn first_child(&self, tag: &str) -> Option<&DomElement> {
        self.child_elements().find(|child| gadget_str_eq(&child.tag, tag))
    }

    /// The concatenated text and CDATA directly inside this element.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                DomNode::Text(t) | DomNode::CData(t) => text.push_str(t),
                DomNode::Element(_) => {}
            }
        }
        text
    }

    /// Flatten the subtree into a map keyed by simple XPath expressions.
    ///
    /// Children are keyed by tag, repeated tags get a one-based `[n]`
    /// suffix from the second occurrence, attributes append `@name` and
    /// nesting joins keys with `/`. Root attributes are keyed `@name`.
    pub fn to_xpath_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for attr in &self.attributes {
            map.insert(format!("@{}", attr.name), attr.value.clone());
        }
        self.collect_xpath("", &mut map);
        map
    }

    fn collect_xpath(&self, prefix: &str, map: &mut BTreeMap<String, String>) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for child in self.child_elements() {
            let count = seen.entry(child.tag.as_str()).or_insert(0);
            *count += 1;
            let key = if *count == 1 {
                format!("{prefix}{}", child.tag)
            } else {
                format!("{prefix}{}[{count}]", child.tag)
            };
            map.insert(key.clone(), child.text_content().trim().to_string());
            for attr in &child.attributes {
                map.insert(format!("{key}@{}", attr.name), attr.value.clone());
            }
            child.collect_xpath(&format!("{key}/"), map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> DomAttribute {
        DomAttribute {
            name: name.into(),
            value: value.into(),
            row: 1,
            column: 1,
        }
    }

    #[test]
    fn test_text_content_skips_elements() {
        let mut root = DomElement::new("label");
        root.children.push(DomNode::Text(" hello ".into()));
        root.children.push(DomNode::Element(DomElement::new("b")));
        root.children.push(DomNode::CData("world".into()));
        assert_eq!(root.text_content(), " hello world");
        assert_eq!(root.child_elements().count(), 1);
    }

    #[test]
    fn test_xpath_keys() {
        let mut item = DomElement::new("item");
        item.attributes.push(attr("id", "1"));
        item.children.push(DomNode::Text("first".into()));
        let mut second = DomElement::new("item");
        second.children.push(DomNode::Text("second".into()));

        let mut root = DomElement::new("list");
        root.attributes.push(attr("version", "2"));
        root.children.push(DomNode::Element(item));
        root.children.push(DomNode::Element(second));

        let map = root.to_xpath_map();
        assert_eq!(map.get("@version").map(String::as_str), Some("2"));
        assert_eq!(map.get("item").map(String::as_str), Some("first"));
        assert_eq!(map.get("item@id").map(String::as_str), Some("1"));
        assert_eq!(map.get("item[2]").map(String::as_str), Some("second"));
    }
}
