//! HTML5 parsing using html5ever.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::NodeKey;
use crate::document::{DEFAULT_UPDATE_CAPACITY, Document, DomError};

fn parse(markup: &str) -> Result<RcDom, DomError> {
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut markup.as_bytes())
        .map_err(|error| DomError::Parse(error.to_string()))
}

impl Document {
    /// Parse a full HTML document.
    pub fn from_html(markup: &str) -> Result<Self, DomError> {
        Self::from_html_with_capacity(markup, DEFAULT_UPDATE_CAPACITY)
    }

    /// Parse a full HTML document with a custom mirror channel capacity.
    pub fn from_html_with_capacity(markup: &str, capacity: usize) -> Result<Self, DomError> {
        let parsed = parse(markup)?;
        let mut document = Self::bare(capacity);
        for child in parsed.document.children.borrow().iter() {
            convert_node(&mut document, child, NodeKey::ROOT)?;
        }
        document.adopt_skeleton()?;
        Ok(document)
    }
}

/// Copy an html5ever node (and its subtree) under `parent`.
fn convert_node(
    document: &mut Document,
    rc_node: &Handle,
    parent: NodeKey,
) -> Result<(), DomError> {
    match &rc_node.data {
        RcNodeData::Element { name, attrs, .. } => {
            let node = document.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                document.set_attribute(node, &attr.name.local, &attr.value)?;
            }
            document.append_child(parent, node)?;
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, node)?;
            }
        }
        RcNodeData::Text { contents } => {
            let text = contents.borrow();
            if !text.is_empty() {
                let node = document.create_text_node(&text);
                document.append_child(parent, node)?;
            }
        }
        RcNodeData::Document => {
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, parent)?;
            }
        }
        // Doctype, comments and processing instructions carry nothing the host reads.
        RcNodeData::Doctype { .. }
        | RcNodeData::Comment { .. }
        | RcNodeData::ProcessingInstruction { .. } => {}
    }
    Ok(())
}

/// Strip markup and return the text content, with entities decoded.
///
/// Unparsable input yields an empty string.
pub fn html_to_text(markup: &str) -> String {
    fn collect(node: &Handle, out: &mut String) {
        if let RcNodeData::Text { contents } = &node.data {
            out.push_str(&contents.borrow());
        }
        for child in node.children.borrow().iter() {
            collect(child, out);
        }
    }
    let Ok(parsed) = parse(markup) else {
        return String::new();
    };
    let mut out = String::new();
    collect(&parsed.document, &mut out);
    out
}
