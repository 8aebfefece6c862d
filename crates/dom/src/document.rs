//! The document tree and its lookup helpers.
//!
//! Nodes are stored in a flat map keyed by [`NodeKey`] with explicit
//! parent/child links. Elements keep their attributes in insertion order so
//! attribute listings come back the way they were written. Every mutation of a
//! node connected to the document is mirrored as one [`DOMUpdate`] batch.

use std::collections::HashMap;

use log::trace;
use smallvec::SmallVec;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::mirror::DOMUpdate;
use crate::selector::{Selector, SelectorError};
use crate::{NodeKey, NodeKeyManager};

/// Default number of update batches a lagging subscriber can fall behind by.
pub const DEFAULT_UPDATE_CAPACITY: usize = 1024;

/// Errors raised by document mutations and queries.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {0:?} does not belong to this document")]
    UnknownNode(NodeKey),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeKey),
    #[error("cannot insert {child:?} under {parent:?}")]
    HierarchyRequest { parent: NodeKey, child: NodeKey },
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("failed to parse markup: {0}")]
    Parse(String),
}

/// What a node is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    kind: NodeKind,
    attrs: SmallVec<[(String, String); 4]>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// An HTML document owned by one page context.
#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeKey, NodeRecord>,
    keys: NodeKeyManager,
    document_element: NodeKey,
    head: NodeKey,
    body: NodeKey,
    update_sender: broadcast::Sender<Vec<DOMUpdate>>,
}

impl Document {
    /// Create the `html > (head, body)` skeleton.
    pub fn new() -> Self {
        Self::with_update_capacity(DEFAULT_UPDATE_CAPACITY)
    }

    /// Create the skeleton with a custom mirror channel capacity (in batches).
    pub fn with_update_capacity(capacity: usize) -> Self {
        let mut document = Self::bare(capacity);
        let html = document.create_element("html");
        let head = document.create_element("head");
        let body = document.create_element("body");
        document.link(NodeKey::ROOT, html, usize::MAX);
        document.link(html, head, usize::MAX);
        document.link(html, body, usize::MAX);
        document.document_element = html;
        document.head = head;
        document.body = body;
        document
    }

    /// A document holding only the document node.
    pub(crate) fn bare(capacity: usize) -> Self {
        let (update_sender, _) = broadcast::channel(capacity.max(1));
        let mut nodes = HashMap::new();
        nodes.insert(NodeKey::ROOT, NodeRecord::default());
        Self {
            nodes,
            keys: NodeKeyManager::new(),
            document_element: NodeKey::ROOT,
            head: NodeKey::ROOT,
            body: NodeKey::ROOT,
            update_sender,
        }
    }

    /// Locate (or create) `html`, `head` and `body` after a parse.
    pub(crate) fn adopt_skeleton(&mut self) -> Result<(), DomError> {
        let html = match self.first_child_element(NodeKey::ROOT, "html") {
            Some(found) => found,
            None => {
                let created = self.create_element("html");
                self.append_child(NodeKey::ROOT, created)?;
                created
            }
        };
        let head = match self.first_child_element(html, "head") {
            Some(found) => found,
            None => {
                let created = self.create_element("head");
                self.insert_child(html, created, 0)?;
                created
            }
        };
        let body = match self.first_child_element(html, "body") {
            Some(found) => found,
            None => {
                let created = self.create_element("body");
                self.append_child(html, created)?;
                created
            }
        };
        self.document_element = html;
        self.head = head;
        self.body = body;
        Ok(())
    }

    /// Subscribe to mirrored update batches.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<DOMUpdate>> {
        self.update_sender.subscribe()
    }

    /// The `<html>` element.
    pub const fn document_element(&self) -> NodeKey {
        self.document_element
    }

    /// The `<head>` element.
    pub const fn head(&self) -> NodeKey {
        self.head
    }

    /// The `<body>` element.
    pub const fn body(&self) -> NodeKey {
        self.body
    }

    /// Whether the key names a node of this document (attached or not).
    pub fn contains(&self, node: NodeKey) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Create a detached element. Tag names are stored lowercased.
    pub fn create_element(&mut self, tag: &str) -> NodeKey {
        let key = self.keys.mint();
        self.nodes.insert(
            key,
            NodeRecord {
                kind: NodeKind::Element {
                    tag: tag.to_ascii_lowercase(),
                },
                ..NodeRecord::default()
            },
        );
        key
    }

    /// Create a detached text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeKey {
        let key = self.keys.mint();
        self.nodes.insert(
            key,
            NodeRecord {
                kind: NodeKind::Text {
                    text: text.to_owned(),
                },
                ..NodeRecord::default()
            },
        );
        key
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.insert_child(parent, child, usize::MAX)
    }

    /// Insert `child` under `parent` at `pos` (clamped to the end).
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        pos: usize,
    ) -> Result<(), DomError> {
        let parent_record = self.record(parent)?;
        if matches!(parent_record.kind, NodeKind::Text { .. }) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.record(child)?;
        if child == NodeKey::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let mut batch = Vec::new();
        if let Some(previous) = self.nodes.get(&child).and_then(|record| record.parent) {
            let was_connected = self.is_connected(child);
            self.unlink(previous, child);
            if was_connected {
                batch.push(DOMUpdate::RemoveNode { node: child });
            }
        }
        let index = self.link(parent, child, pos);
        if self.is_connected(parent) {
            self.describe_subtree(parent, child, index, &mut batch);
        }
        self.emit(batch);
        Ok(())
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove_node(&mut self, node: NodeKey) -> Result<(), DomError> {
        let parent = self.record(node)?.parent;
        if let Some(parent) = parent {
            let was_connected = self.is_connected(node);
            self.unlink(parent, node);
            if was_connected {
                self.emit(vec![DOMUpdate::RemoveNode { node }]);
            }
        }
        Ok(())
    }

    /// Set (or overwrite) an attribute. Names are lowercased, HTML-style.
    pub fn set_attribute(
        &mut self,
        node: NodeKey,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let record = self.element_mut(node)?;
        if let Some(slot) = record.attrs.iter_mut().find(|(existing, _)| *existing == name) {
            value.clone_into(&mut slot.1);
        } else {
            record.attrs.push((name.clone(), value.to_owned()));
        }
        if self.is_connected(node) {
            self.emit(vec![DOMUpdate::SetAttr {
                node,
                name,
                value: value.to_owned(),
            }]);
        }
        Ok(())
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<bool, DomError> {
        let name = name.to_ascii_lowercase();
        let record = self.element_mut(node)?;
        let before = record.attrs.len();
        record.attrs.retain(|(existing, _)| *existing != name);
        let removed = record.attrs.len() != before;
        if removed && self.is_connected(node) {
            self.emit(vec![DOMUpdate::RemoveAttr { node, name }]);
        }
        Ok(removed)
    }

    /// Read one attribute.
    pub fn get_attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        self.nodes
            .get(&node)?
            .attrs
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All attributes of an element in the order they were first set.
    pub fn attributes(&self, node: NodeKey) -> Option<&[(String, String)]> {
        let record = self.nodes.get(&node)?;
        matches!(record.kind, NodeKind::Element { .. }).then_some(record.attrs.as_slice())
    }

    /// The node's kind.
    pub fn kind(&self, node: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|record| &record.kind)
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, node: NodeKey) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&node)?.parent
    }

    /// Children of a node, in order.
    pub fn children(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&node)
            .map(|record| record.children.as_slice())
            .unwrap_or_default()
    }

    /// Whether the node is reachable from the document node.
    pub fn is_connected(&self, node: NodeKey) -> bool {
        let mut current = node;
        loop {
            if current == NodeKey::ROOT {
                return true;
            }
            match self.nodes.get(&current).and_then(|record| record.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: NodeKey) -> String {
        fn collect(document: &Document, current: NodeKey, out: &mut String) {
            let Some(record) = document.nodes.get(&current) else {
                return;
            };
            if let NodeKind::Text { text } = &record.kind {
                out.push_str(text);
            }
            for child in &record.children {
                collect(document, *child, out);
            }
        }
        let mut result = String::new();
        collect(self, node, &mut result);
        result
    }

    /// Replace all children of `node` with a single text node (none if `text` is empty).
    pub fn set_text_content(&mut self, node: NodeKey, text: &str) -> Result<(), DomError> {
        let children = self.element_mut(node)?.children.clone();
        let connected = self.is_connected(node);
        let mut batch = Vec::new();
        for child in children {
            self.unlink(node, child);
            if connected {
                batch.push(DOMUpdate::RemoveNode { node: child });
            }
        }
        if !text.is_empty() {
            let text_key = self.create_text_node(text);
            self.link(node, text_key, 0);
            if connected {
                batch.push(DOMUpdate::InsertText {
                    parent: node,
                    node: text_key,
                    text: text.to_owned(),
                    pos: 0,
                });
            }
        }
        self.emit(batch);
        Ok(())
    }

    /// `document.title`: text of the first `<title>`, whitespace stripped and collapsed.
    pub fn title(&self) -> String {
        self.find(NodeKey::ROOT, &Selector::tag("title"))
            .map(|title| {
                self.text_content(title)
                    .split_ascii_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Set `document.title`, creating `<title>` in the head when missing.
    pub fn set_title(&mut self, title: &str) -> Result<(), DomError> {
        let element = match self.find(NodeKey::ROOT, &Selector::tag("title")) {
            Some(existing) => existing,
            None => {
                let created = self.create_element("title");
                self.append_child(self.head, created)?;
                created
            }
        };
        self.set_text_content(element, title)
    }

    /// First connected element whose `id` equals `id`, in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeKey> {
        if id.is_empty() {
            return None;
        }
        self.find(NodeKey::ROOT, &Selector::default().with_id(id))
    }

    /// First descendant of `scope` matching the selector text.
    pub fn query_selector(
        &self,
        scope: NodeKey,
        selector: &str,
    ) -> Result<Option<NodeKey>, DomError> {
        let parsed = Selector::parse(selector)?;
        Ok(self.find(scope, &parsed))
    }

    /// Every descendant of `scope` matching the selector text, in document order.
    pub fn query_selector_all(
        &self,
        scope: NodeKey,
        selector: &str,
    ) -> Result<Vec<NodeKey>, DomError> {
        let parsed = Selector::parse(selector)?;
        Ok(self.find_all(scope, &parsed))
    }

    /// First descendant of `scope` matching an already-built selector.
    pub fn find(&self, scope: NodeKey, selector: &Selector) -> Option<NodeKey> {
        let mut stack: Vec<NodeKey> = self.children(scope).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.node_matches(current, selector) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev());
        }
        None
    }

    /// Every descendant of `scope` matching an already-built selector.
    pub fn find_all(&self, scope: NodeKey, selector: &Selector) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(scope).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.node_matches(current, selector) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    fn node_matches(&self, node: NodeKey, selector: &Selector) -> bool {
        self.nodes.get(&node).is_some_and(|record| match &record.kind {
            NodeKind::Element { tag } => selector.matches(tag, &record.attrs),
            NodeKind::Document | NodeKind::Text { .. } => false,
        })
    }

    fn first_child_element(&self, parent: NodeKey, tag: &str) -> Option<NodeKey> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.tag_name(*child) == Some(tag))
    }

    fn record(&self, node: NodeKey) -> Result<&NodeRecord, DomError> {
        self.nodes.get(&node).ok_or(DomError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: NodeKey) -> Result<&mut NodeRecord, DomError> {
        let record = self.nodes.get_mut(&node).ok_or(DomError::UnknownNode(node))?;
        if matches!(record.kind, NodeKind::Element { .. }) {
            Ok(record)
        } else {
            Err(DomError::NotAnElement(node))
        }
    }

    fn is_inclusive_ancestor(&self, candidate: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(step) = current {
            if step == candidate {
                return true;
            }
            current = self.nodes.get(&step).and_then(|record| record.parent);
        }
        false
    }

    /// Attach without emitting; returns the index the child landed at.
    fn link(&mut self, parent: NodeKey, child: NodeKey, pos: usize) -> usize {
        let index = self.nodes.get_mut(&parent).map_or(0, |record| {
            let index = pos.min(record.children.len());
            record.children.insert(index, child);
            index
        });
        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = Some(parent);
        }
        index
    }

    /// Detach without emitting.
    fn unlink(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.retain(|existing| *existing != child);
        }
        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = None;
        }
    }

    /// Describe a freshly connected subtree as insert + attribute updates.
    fn describe_subtree(
        &self,
        parent: NodeKey,
        node: NodeKey,
        pos: usize,
        batch: &mut Vec<DOMUpdate>,
    ) {
        let Some(record) = self.nodes.get(&node) else {
            return;
        };
        match &record.kind {
            NodeKind::Element { tag } => {
                batch.push(DOMUpdate::InsertElement {
                    parent,
                    node,
                    tag: tag.clone(),
                    pos,
                });
                for (name, value) in &record.attrs {
                    batch.push(DOMUpdate::SetAttr {
                        node,
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
            NodeKind::Text { text } => batch.push(DOMUpdate::InsertText {
                parent,
                node,
                text: text.clone(),
                pos,
            }),
            NodeKind::Document => {}
        }
        for (index, child) in record.children.iter().enumerate() {
            self.describe_subtree(node, *child, index, batch);
        }
    }

    fn emit(&self, batch: Vec<DOMUpdate>) {
        if batch.is_empty() || self.update_sender.receiver_count() == 0 {
            return;
        }
        if let Err(error) = self.update_sender.send(batch) {
            trace!(target: "dom::document", "dropped update batch: {error}");
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_is_connected() {
        let document = Document::new();
        assert_eq!(document.tag_name(document.document_element()), Some("html"));
        assert_eq!(document.parent(document.head()), Some(document.document_element()));
        assert!(document.is_connected(document.body()));
    }

    #[test]
    fn detached_element_is_not_connected_until_appended() {
        let mut document = Document::new();
        let meta = document.create_element("META");
        assert_eq!(document.tag_name(meta), Some("meta"));
        assert!(!document.is_connected(meta));
        document.append_child(document.head(), meta).unwrap();
        assert!(document.is_connected(meta));
    }

    #[test]
    fn cannot_insert_ancestor_under_descendant() {
        let mut document = Document::new();
        let html = document.document_element();
        let body = document.body();
        let result = document.append_child(body, html);
        assert!(matches!(result, Err(DomError::HierarchyRequest { .. })));
    }

    #[test]
    fn title_collapses_whitespace() {
        let mut document = Document::new();
        assert_eq!(document.title(), "");
        document.set_title("  Hello \n  World ").unwrap();
        assert_eq!(document.title(), "Hello World");
    }

    #[test]
    fn attributes_keep_first_set_order() {
        let mut document = Document::new();
        let link = document.create_element("link");
        document.set_attribute(link, "rel", "icon").unwrap();
        document.set_attribute(link, "HREF", "/a.png").unwrap();
        document.set_attribute(link, "rel", "shortcut icon").unwrap();
        let attrs = document.attributes(link).unwrap();
        assert_eq!(attrs[0], ("rel".to_owned(), "shortcut icon".to_owned()));
        assert_eq!(attrs[1], ("href".to_owned(), "/a.png".to_owned()));
    }

    #[test]
    fn keys_from_other_documents_are_unknown() {
        let mut first = Document::new();
        let mut second = Document::new();
        let foreign = second.create_element("meta");
        assert!(matches!(
            first.set_attribute(foreign, "name", "x"),
            Err(DomError::UnknownNode(_))
        ));
    }
}
