//! Owned XML element tree with parse/serialize built on quick-xml.

use anyhow::{anyhow, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::defs::PROFILE_INDENT;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing one with the same name.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    #[must_use]
    pub fn first_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }
}

/// Parse a complete document into its root element.
///
/// # Errors
///
/// Returns an error when the input is not well-formed XML or contains no
/// root element.
pub fn parse_document(raw: &str) -> Result<Element> {
    let mut reader = Reader::from_reader(raw.as_bytes());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| anyhow!("invalid XML: {err}"))?
        {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let content = text.unescape().map_err(|err| anyhow!("invalid XML: {err}"))?;
                    parent.text.push_str(content.trim());
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| anyhow!("invalid XML: unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(anyhow!("invalid XML: unterminated element"));
    }
    root.ok_or_else(|| anyhow!("document has no root element"))
}

/// Serialize `root` with the UTF-8 prolog and the fixed profile indent.
///
/// # Errors
///
/// Returns an error when event serialization fails; with an in-memory sink
/// this does not happen for well-formed element trees.
pub fn write_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', PROFILE_INDENT);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|err| anyhow!("{err}"))?;
    write_element(&mut writer, root)?;
    let mut out = writer.into_inner();
    out.push(b'\n');
    String::from_utf8(out).map_err(|err| anyhow!("serialized XML is not UTF-8: {err}"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag());
    for (key, value) in element.attrs() {
        start.push_attribute((key, value));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|err| anyhow!("{err}"))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|err| anyhow!("{err}"))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|err| anyhow!("{err}"))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag())))
        .map_err(|err| anyhow!("{err}"))?;
    Ok(())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(anyhow!("invalid XML: multiple root elements"));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| anyhow!("invalid XML tag name: {err}"))?
        .to_string();
    let mut element = Element::new(tag);
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|err| anyhow!("invalid XML attribute: {err}"))?;
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("").to_string();
        if key.is_empty() {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| anyhow!("invalid XML attribute value: {err}"))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() -> Result<()> {
        let root = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<profile name="foo" type="sync">
    <key name="enabled" value="true"/>
    <profile name="svc" type="service"/>
</profile>"#,
        )?;
        assert_eq!(root.tag(), "profile");
        assert_eq!(root.attr("name"), Some("foo"));
        assert_eq!(root.children().len(), 2);
        let key = root.first_child("key").expect("key child");
        assert_eq!(key.attr("value"), Some("true"));
        Ok(())
    }

    #[test]
    fn round_trips_through_write_document() -> Result<()> {
        let mut root = Element::new("profile");
        root.set_attr("name", "a&b");
        root.set_attr("type", "sync");
        let mut key = Element::new("key");
        key.set_attr("name", "note");
        key.set_attr("value", "<quoted>");
        root.push_child(key);

        let rendered = write_document(&root)?;
        assert!(rendered.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        let reparsed = parse_document(&rendered)?;
        assert_eq!(reparsed, root);
        Ok(())
    }

    #[test]
    fn text_content_survives_round_trip() -> Result<()> {
        let mut root = Element::new("syncResults");
        let mut error = Element::new("error");
        error.set_text("device unreachable");
        root.push_child(error);

        let rendered = write_document(&root)?;
        let reparsed = parse_document(&rendered)?;
        assert_eq!(
            reparsed.first_child("error").map(Element::text),
            Some("device unreachable")
        );
        Ok(())
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_document("<profile").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("<a></b>").is_err());
    }
}
