//! Markup parsing into the gadget DOM.

use std::collections::BTreeMap;

use horizon_gadget_core::gadget_str_eq;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::dom::{DomAttribute, DomElement, DomNode};
use crate::error::XmlError;
use crate::logging::targets;

/// Turns markup into a DOM tree or an XPath keyed string map.
pub trait XmlParser: Send + Sync {
    /// Parse `xml` and return its root element. `filename` only labels
    /// diagnostics.
    fn parse_dom(&self, xml: &str, filename: &str) -> Result<DomElement, XmlError>;

    /// Parse `xml`, check that the root is `root_tag`, and flatten it with
    /// [`DomElement::to_xpath_map`].
    fn parse_xpath_map(
        &self,
        xml: &str,
        filename: &str,
        root_tag: &str,
    ) -> Result<BTreeMap<String, String>, XmlError> {
        let root = self.parse_dom(xml, filename)?;
        if !gadget_str_eq(&root.tag, root_tag) {
            return Err(XmlError::UnexpectedRoot {
                file: filename.to_string(),
                expected: root_tag.to_string(),
                found: root.tag,
            });
        }
        Ok(root.to_xpath_map())
    }
}

/// The default parser, built on `quick-xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuickXmlParser;

impl QuickXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl XmlParser for QuickXmlParser {
    fn parse_dom(&self, xml: &str, filename: &str) -> Result<DomElement, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<DomElement> = Vec::new();
        let mut root: Option<DomElement> = None;

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|err| {
                let (row, column) = location(xml, reader.error_position() as usize);
                XmlError::parse(filename, row, column, err.to_string())
            })?;
            let tag_start = xml
                .get(before..)
                .and_then(|rest| rest.find('<'))
                .map_or(before, |offset| before + offset);

            match event {
                Event::Start(start) => {
                    stack.push(new_element(xml, filename, tag_start, &start)?);
                }
                Event::Empty(empty) => {
                    let element = new_element(xml, filename, tag_start, &empty)?;
                    attach(&mut stack, &mut root, element, xml, filename, tag_start)?;
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element, xml, filename, tag_start)?;
                    }
                }
                Event::Text(text) => {
                    let content = text.unescape().map_err(|err| {
                        let (row, column) = location(xml, before);
                        XmlError::parse(filename, row, column, err.to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(DomNode::Text(content.into_owned())),
                        None if !content.trim().is_empty() => {
                            let (row, column) = location(xml, before);
                            return Err(XmlError::parse(
                                filename,
                                row,
                                column,
                                "text outside the root element",
                            ));
                        }
                        None => {}
                    }
                }
                Event::CData(cdata) => {
                    if let Some(parent) = stack.last_mut() {
                        let content = String::from_utf8_lossy(&cdata).into_owned();
                        parent.children.push(DomNode::CData(content));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and
                // doctypes carry nothing the gadget DOM keeps.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            let (row, column) = location(xml, xml.len());
            return Err(XmlError::parse(
                filename,
                row,
                column,
                format!("element <{}> is not closed", open.tag),
            ));
        }
        let root = root.ok_or_else(|| XmlError::NoRoot {
            file: filename.to_string(),
        })?;
        tracing::trace!(target: targets::XML, file = filename, root = %root.tag, "parsed document");
        Ok(root)
    }
}

fn new_element(
    xml: &str,
    filename: &str,
    offset: usize,
    start: &BytesStart<'_>,
) -> Result<DomElement, XmlError> {
    let (row, column) = location(xml, offset);
    let mut element = DomElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    element.row = row;
    element.column = column;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlError::parse(filename, row, column, err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::parse(filename, row, column, err.to_string()))?;
        element.attributes.push(DomAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: value.into_owned(),
            row,
            column,
        });
    }
    Ok(element)
}

fn attach(
    stack: &mut [DomElement],
    root: &mut Option<DomElement>,
    element: DomElement,
    xml: &str,
    filename: &str,
    offset: usize,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(DomNode::Element(element)),
        None if root.is_some() => {
            let (row, column) = location(xml, offset);
            return Err(XmlError::parse(
                filename,
                row,
                column,
                "more than one root element",
            ));
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// One-based line and column of a byte offset.
fn location(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let row = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |index| index + 1);
    let column = source
        .get(line_start..offset)
        .map_or(offset - line_start, |line| line.chars().count());
    (row, column + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_locations() {
        let xml = "<view width=\"200\">\n  <div name=\"a\">\n    <label>hi &amp; bye</label>\n  </div>\n</view>";
        let root = QuickXmlParser::new().parse_dom(xml, "main.xml").unwrap();
        assert_eq!(root.tag, "view");
        assert_eq!(root.attribute("width"), Some("200"));
        let div = root.first_child("div").unwrap();
        assert_eq!((div.row, div.column), (2, 3));
        let label = div.first_child("label").unwrap();
        assert_eq!(label.text_content(), "hi & bye");
        assert_eq!(label.row, 3);
    }

    #[test]
    fn test_malformed_reports_file() {
        let err = QuickXmlParser::new()
            .parse_dom("<view><div></view>", "broken.xml")
            .unwrap_err();
        assert!(matches!(err, XmlError::Parse { ref file, .. } if file == "broken.xml"));

        let err = QuickXmlParser::new().parse_dom("   ", "empty.xml").unwrap_err();
        assert!(matches!(err, XmlError::NoRoot { .. }));
    }

    #[test]
    fn test_xpath_map_checks_root() {
        let parser = QuickXmlParser::new();
        let xml = "<gadget><about><name>Clock</name></about></gadget>";
        let map = parser.parse_xpath_map(xml, "gadget.gmanifest", "gadget").unwrap();
        assert_eq!(map.get("about/name").map(String::as_str), Some("Clock"));

        let err = parser.parse_xpath_map(xml, "gadget.gmanifest", "view").unwrap_err();
        assert!(matches!(err, XmlError::UnexpectedRoot { .. }));
    }

    #[test]
    fn test_location() {
        assert_eq!(location("ab\ncd", 4), (2, 2));
        assert_eq!(location("abc", 0), (1, 1));
    }
}
