//! Part XML parsing into the arena and serialization back out
//!
//! Element and attribute names are kept exactly as written, prefixes
//! included, and namespace declarations survive as ordinary attributes, so a
//! parse/serialize cycle reproduces the part's markup. Whitespace-only text is
//! dropped unless it sits inside a text-bearing element or an element marked
//! `xml:space="preserve"`.

use crate::docx::error::{DocxError, DocxResult};
use doc_model::{names, NodeId, XmlNodeKind, XmlTree};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Elements whose whitespace is always significant
const TEXT_ELEMENTS: &[&str] = &[names::T, names::DEL_TEXT, names::INSTR_TEXT, "w:delInstrText"];

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

struct Frame {
    node: NodeId,
    preserve: bool,
}

/// Parse a part's bytes into a detached subtree of `tree`, returning its root
pub fn parse_part(tree: &mut XmlTree, bytes: &[u8]) -> DocxResult<NodeId> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let frame = open_element(tree, &reader, e, stack.last(), &mut root)?;
                stack.push(frame);
            }
            Event::Empty(ref e) => {
                open_element(tree, &reader, e, stack.last(), &mut root)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(ref t) => {
                if let Some(frame) = stack.last() {
                    let text = t.unescape()?;
                    if frame.preserve || !text.trim().is_empty() {
                        append_text(tree, frame.node, &text)?;
                    }
                }
            }
            Event::CData(ref c) => {
                if let Some(frame) = stack.last() {
                    let text = String::from_utf8(c.to_vec())?;
                    append_text(tree, frame.node, &text)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(DocxError::XmlParse("unexpected end of part".into()));
    }
    root.ok_or_else(|| DocxError::XmlParse("part has no root element".into()))
}

fn open_element(
    tree: &mut XmlTree,
    reader: &Reader<&[u8]>,
    e: &BytesStart,
    parent: Option<&Frame>,
    root: &mut Option<NodeId>,
) -> DocxResult<Frame> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| DocxError::XmlParse(err.to_string()))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| DocxError::XmlParse(err.to_string()))?
            .to_string();
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
        attributes.push((key, value));
    }
    let attr_refs: Vec<(&str, &str)> = attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let node = tree.create_element_with(&name, &attr_refs);

    let preserve = match tree.attribute(node, names::ATTR_XML_SPACE) {
        Some("preserve") => true,
        Some(_) => false,
        None => parent.is_some_and(|p| p.preserve) || TEXT_ELEMENTS.contains(&name.as_str()),
    };

    match parent {
        Some(frame) => tree.append_child(frame.node, node)?,
        None => {
            if root.is_some() {
                return Err(DocxError::XmlParse(format!("second root element <{}>", name)));
            }
            *root = Some(node);
        }
    }
    Ok(Frame { node, preserve })
}

fn append_text(tree: &mut XmlTree, parent: NodeId, text: &str) -> DocxResult<()> {
    // merge with a preceding text node so CDATA/entity splits stay one node
    if let Some(last) = tree.children(parent).last().copied() {
        if let Some(existing) = tree.text(last) {
            let merged = format!("{}{}", existing, text);
            let node = tree.create_text(&merged);
            tree.replace_with(last, &[node])?;
            return Ok(());
        }
    }
    let node = tree.create_text(text);
    tree.append_child(parent, node)?;
    Ok(())
}

/// Serialize a subtree to part bytes, with an XML declaration
pub fn serialize_part(tree: &XmlTree, root: NodeId) -> DocxResult<Vec<u8>> {
    let mut xml = String::new();
    xml.push_str(DECLARATION);
    xml.push('\n');
    write_node(tree, root, &mut xml)?;
    Ok(xml.into_bytes())
}

/// Serialize a subtree to a string without declaration
pub fn to_xml_string(tree: &XmlTree, node: NodeId) -> DocxResult<String> {
    let mut xml = String::new();
    write_node(tree, node, &mut xml)?;
    Ok(xml)
}

fn write_node(tree: &XmlTree, node: NodeId, xml: &mut String) -> DocxResult<()> {
    let kind = tree
        .node(node)
        .map(|n| n.kind())
        .ok_or(doc_model::DocModelError::NodeNotFound(node))?;
    match kind {
        XmlNodeKind::Text(text) => {
            xml.push_str(&quick_xml::escape::partial_escape(text.as_str()));
        }
        XmlNodeKind::Element { name, attributes } => {
            xml.push('<');
            xml.push_str(name);
            for attr in attributes {
                xml.push(' ');
                xml.push_str(&attr.name);
                xml.push_str("=\"");
                xml.push_str(&quick_xml::escape::escape(attr.value.as_str()));
                xml.push('"');
            }
            let children = tree.children(node);
            if children.is_empty() {
                xml.push_str("/>");
            } else {
                xml.push('>');
                for child in children {
                    write_node(tree, *child, xml)?;
                }
                xml.push_str("</");
                xml.push_str(name);
                xml.push('>');
            }
        }
    }
    Ok(())
}
