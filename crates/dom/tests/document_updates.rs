//! Mirrored update batches emitted by `Document` mutations.

use anyhow::Error;
use dom::{DOMMirror, DOMSubscriber, DOMUpdate, Document, NodeKey};

#[derive(Default)]
struct Recorder {
    updates: Vec<DOMUpdate>,
}

impl DOMSubscriber for Recorder {
    fn apply_update(&mut self, update: DOMUpdate) -> Result<(), Error> {
        self.updates.push(update);
        Ok(())
    }
}

#[test]
fn appending_a_prepared_element_describes_its_attributes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut document = Document::new();
    let mut mirror = DOMMirror::new(document.subscribe(), Recorder::default());

    let meta = document.create_element("meta");
    document.set_attribute(meta, "property", "og:title").unwrap();
    // Nothing is mirrored while the element is detached.
    assert_eq!(mirror.try_update_sync().unwrap(), 0);

    document.append_child(document.head(), meta).unwrap();
    document.set_attribute(meta, "content", "Home").unwrap();
    mirror.try_update_sync().unwrap();

    let updates = &mirror.mirror().updates;
    assert_eq!(updates.len(), 3, "unexpected updates: {updates:?}");
    match &updates[0] {
        DOMUpdate::InsertElement { parent, node, tag, .. } => {
            assert_eq!(*parent, document.head());
            assert_eq!(*node, meta);
            assert_eq!(tag, "meta");
        }
        other => panic!("unexpected first update: {other:?}"),
    }
    assert_eq!(
        updates[1],
        DOMUpdate::SetAttr { node: meta, name: "property".into(), value: "og:title".into() }
    );
    assert_eq!(
        updates[2],
        DOMUpdate::SetAttr { node: meta, name: "content".into(), value: "Home".into() }
    );
}

#[test]
fn set_text_content_emits_remove_and_insert() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut document = Document::new();
    let paragraph = document.create_element("p");
    document.append_child(document.body(), paragraph).unwrap();
    let first = document.create_text_node("a");
    let second = document.create_text_node("b");
    document.append_child(paragraph, first).unwrap();
    document.append_child(paragraph, second).unwrap();

    let mut mirror = DOMMirror::new(document.subscribe(), Recorder::default());
    document.set_text_content(paragraph, "Hello, page!").unwrap();
    mirror.try_update_sync().unwrap();

    let updates = &mirror.mirror().updates;
    assert_eq!(updates.len(), 3, "unexpected batch: {updates:?}");
    assert_eq!(updates[0], DOMUpdate::RemoveNode { node: first });
    assert_eq!(updates[1], DOMUpdate::RemoveNode { node: second });
    match &updates[2] {
        DOMUpdate::InsertText { parent, node, text, pos } => {
            assert_eq!(*parent, paragraph);
            assert_eq!(*pos, 0);
            assert_eq!(text, "Hello, page!");
            assert_ne!(*node, NodeKey::ROOT);
        }
        other => panic!("unexpected third update: {other:?}"),
    }
    assert_eq!(document.text_content(paragraph), "Hello, page!");
}

#[test]
fn query_selector_walks_in_document_order() {
    let document = Document::from_html(
        r#"<html><head>
            <link rel="stylesheet" href="/a.css" id="first">
            <link rel="icon" href="/favicon.ico">
            <link rel="stylesheet" href="/b.css">
        </head><body></body></html>"#,
    )
    .unwrap();
    let sheets = document
        .query_selector_all(document.head(), r#"link[rel="stylesheet"]"#)
        .unwrap();
    assert_eq!(sheets.len(), 2);
    assert_eq!(document.get_attribute(sheets[0], "href"), Some("/a.css"));
    assert_eq!(document.get_element_by_id("first"), Some(sheets[0]));

    let icon = document.query_selector(document.head(), "link[rel=icon]").unwrap();
    assert_eq!(icon.and_then(|key| document.get_attribute(key, "href")), Some("/favicon.ico"));
    assert!(document.query_selector(document.head(), "link >").is_err());
}

#[test]
fn removed_attribute_is_mirrored_once() {
    let mut document = Document::new();
    let html = document.document_element();
    document.set_attribute(html, "lang", "en").unwrap();
    let mut mirror = DOMMirror::new(document.subscribe(), Recorder::default());
    assert!(document.remove_attribute(html, "LANG").unwrap());
    assert!(!document.remove_attribute(html, "lang").unwrap());
    mirror.try_update_sync().unwrap();
    assert_eq!(
        mirror.into_inner().updates,
        vec![DOMUpdate::RemoveAttr { node: html, name: "lang".into() }]
    );
}
