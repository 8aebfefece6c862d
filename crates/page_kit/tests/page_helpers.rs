//! Pressed keys, CSS variables, attributes, scripts and text extraction.

use std::cell::Cell;
use std::rc::Rc;

use page_kit::{KeyMods, NodeKey, PageConfig, PageContext, html_to_text};

fn page() -> PageContext {
    let _ = env_logger::builder().is_test(true).try_init();
    PageContext::new(PageConfig::new().with_id_seed(1))
}

#[test]
fn pressed_keys_follow_down_and_up() {
    let page = page();
    let mut keys = page.track_keys();
    assert!(!keys.is_pressed("a"));

    page.dispatch_key_down("a", "KeyA", KeyMods::default());
    assert!(keys.is_pressed("a"));
    page.dispatch_key_down("Shift", "ShiftLeft", KeyMods { shift: true, ..KeyMods::default() });
    assert_eq!(keys.pressed_keys(), vec!["Shift".to_owned(), "a".to_owned()]);

    page.dispatch_key_up("a", "KeyA", KeyMods::default());
    assert!(!keys.is_pressed("a"));
    assert!(keys.is_pressed("Shift"));
}

#[test]
fn trackers_only_see_later_events() {
    let page = page();
    page.dispatch_key_down("a", "KeyA", KeyMods::default());
    let mut late = page.track_keys();
    assert!(!late.is_pressed("a"));

    let early = page.track_keys();
    early.detach();
    assert_eq!(page.dispatch_key_down("b", "KeyB", KeyMods::default()), 1);
    assert!(late.is_pressed("b"));
}

#[test]
fn css_variables_read_write_and_resolve() {
    let mut page = page();
    assert_eq!(page.css_variable("--accent", None).unwrap(), Some(String::new()));
    assert_eq!(page.css_variable("--accent", Some("#f00")).unwrap(), None);
    page.set_css_variable("--gap", "var(--unit, 4px)", None).unwrap();
    assert_eq!(page.get_css_variable("--accent", None), "#f00");

    let root = page.document().document_element();
    assert_eq!(
        page.document().get_attribute(root, "style"),
        Some("--accent: #f00; --gap: var(--unit, 4px)")
    );

    let body = page.document().body();
    page.set_css_variable("--unit", "8px", Some(body)).unwrap();
    page.set_css_variable("padding", "var(--gap)", Some(body)).unwrap();
    assert_eq!(page.computed_css_variable("--gap", Some(body)), "8px");
    assert_eq!(page.computed_css_variable("--gap", None), "4px");
    assert_eq!(page.computed_css_variable("padding", Some(body)), "8px");
    assert_eq!(page.computed_css_variable("--accent", Some(body)), "#f00");
}

#[test]
fn attributes_on_html_and_elements() {
    let mut page = page();
    page.set_html_attributes([("lang", "en"), ("data-theme", "dark")]).unwrap();
    let root = page.document().document_element();
    let attrs = page.attributes_list(root).unwrap();
    assert_eq!(attrs.get("lang").map(String::as_str), Some("en"));
    assert_eq!(attrs.get("data-theme").map(String::as_str), Some("dark"));

    let body = page.document().body();
    page.set_element_attributes(body, vec![("class".to_owned(), "ready".to_owned())])
        .unwrap();
    assert_eq!(page.get_element_attributes(body).unwrap().len(), 1);
    assert!(page.attributes_list(NodeKey(u64::MAX)).is_err());
}

#[test]
fn script_callback_runs_once_on_load() {
    let mut page = page();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let script = page
        .load_script("/app.js", move |_| counter.set(counter.get() + 1))
        .unwrap();

    let document = page.document();
    assert_eq!(document.parent(script.key()), Some(document.body()));
    assert_eq!(document.get_attribute(script.key(), "src"), Some("/app.js"));
    assert_eq!(page.pending_scripts(), 1);

    assert!(page.notify_script_loaded(script));
    assert!(!page.notify_script_loaded(script));
    assert_eq!(fired.get(), 1);
    assert_eq!(page.pending_scripts(), 0);
}

#[test]
fn dimensions_and_text() {
    let mut page = page();
    page.resize_window(2560, 1440);
    assert_eq!(page.window_width(), 2560);
    assert_eq!(page.screen_width(), 2560);
    page.resize_screen(3840, 2160);
    assert_eq!(page.screen_height(), 2160);
    assert_eq!(page.window_height(), 1440);

    assert_eq!(html_to_text("<p>Fish &amp; <em>chips</em></p>"), "Fish & chips");
}
