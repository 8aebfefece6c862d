//! Metadata setters against a mirrored document.

use anyhow::Error;
use dom::{DOMMirror, DOMSubscriber, DOMUpdate, Document, Selector};
use page_kit::{
    Keywords, MetaField, MetaQuery, OpenGraph, PageConfig, PageContext, PageError, PageMeta,
};

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

fn page() -> PageContext {
    let _ = env_logger::builder().is_test(true).try_init();
    PageContext::new(PageConfig::new().with_id_seed(42))
}

fn meta_content(page: &PageContext, attr: &str, name: &str) -> Option<String> {
    let document = page.document();
    let selector = Selector::tag("meta").with_attribute(attr, name);
    let found = document.find_all(document.head(), &selector);
    assert!(found.len() <= 1, "duplicate meta {attr}={name}");
    found
        .first()
        .and_then(|&key| document.get_attribute(key, "content"))
        .map(str::to_owned)
}

#[test]
fn title_writes_document_and_four_social_tags() {
    let mut page = page();
    page.set_title("Home").unwrap();

    assert_eq!(page.document().title(), "Home");
    for name in ["og:title", "og:image:alt", "twitter:title", "twitter:image:alt"] {
        assert_eq!(meta_content(&page, "property", name).as_deref(), Some("Home"), "{name}");
    }
    assert_eq!(meta_content(&page, "itemprop", "name").as_deref(), Some("Home"));
    assert_eq!(page.meta_value(MetaField::Title), Some("Home"));
}

#[test]
fn repeating_a_value_touches_nothing() {
    let mut page = page();
    page.set_title("Home").unwrap();
    page.set_description("About us").unwrap();

    let mut mirror = DOMMirror::new(page.subscribe(), Recorder::default());
    page.set_title("Home").unwrap();
    page.set_description("About us").unwrap();
    assert_eq!(mirror.try_update_sync().unwrap(), 0);

    page.set_title("Away").unwrap();
    mirror.try_update_sync().unwrap();
    let content_writes = mirror
        .mirror()
        .updates
        .iter()
        .filter(|update| {
            matches!(
                update,
                DOMUpdate::SetAttr { name, value, .. } if name == "content" && value == "Away"
            )
        })
        .count();
    assert_eq!(content_writes, 5);
    let head_children = page.document().children(page.document().head()).len();
    // title + 5 title tags + 4 description tags
    assert_eq!(head_children, 10);
}

type Setter = fn(&mut PageContext, &str) -> Result<(), PageError>;

#[test]
fn every_recorded_setter_skips_repeats_and_restores() {
    let setters: [(MetaField, Setter); 7] = [
        (MetaField::Title, PageContext::set_title),
        (MetaField::Description, PageContext::set_description),
        (MetaField::Keywords, |page, value| page.set_keywords(value)),
        (MetaField::Image, PageContext::set_image),
        (MetaField::Color, PageContext::set_page_color),
        (MetaField::FavIcon, PageContext::set_fav_icon),
        (MetaField::Url, PageContext::set_canonical_url),
    ];
    for (field, set) in setters {
        let mut page = page();
        set(&mut page, "first").unwrap();
        let head_children = page.document().children(page.document().head()).len();

        let mut mirror = DOMMirror::new(page.subscribe(), Recorder::default());
        set(&mut page, "first").unwrap();
        assert_eq!(mirror.try_update_sync().unwrap(), 0, "{field} repeated");

        set(&mut page, "second").unwrap();
        assert!(mirror.try_update_sync().unwrap() > 0, "{field} changed");
        assert_eq!(page.meta_value(field), Some("second"));

        set(&mut page, "first").unwrap();
        assert!(mirror.try_update_sync().unwrap() > 0, "{field} restored");
        assert_eq!(page.meta_value(field), Some("first"));
        assert_eq!(
            page.document().children(page.document().head()).len(),
            head_children,
            "{field} added head elements"
        );
    }
}

#[test]
fn keywords_join_with_commas() {
    let mut page = page();
    page.set_keywords(["a", "b", "c"]).unwrap();
    assert_eq!(meta_content(&page, "name", "keywords").as_deref(), Some("a,b,c"));

    let mut mirror = DOMMirror::new(page.subscribe(), Recorder::default());
    page.set_keywords("a,b,c").unwrap();
    assert_eq!(mirror.try_update_sync().unwrap(), 0);

    page.set_keywords("x, y").unwrap();
    assert_eq!(meta_content(&page, "name", "keywords").as_deref(), Some("x, y"));
    assert_eq!(page.meta_value(MetaField::Keywords), Some("x, y"));
}

#[test]
fn image_and_card_tags() {
    let mut page = page();
    page.twitter(None).unwrap();
    assert_eq!(meta_content(&page, "property", "twitter:card").as_deref(), Some("summary"));
    page.twitter(Some("summary_large_image")).unwrap();
    assert_eq!(
        meta_content(&page, "property", "twitter:card").as_deref(),
        Some("summary_large_image")
    );

    page.set_image("/cover.png").unwrap();
    for name in ["image", "og:image", "twitter:image"] {
        assert_eq!(meta_content(&page, "property", name).as_deref(), Some("/cover.png"), "{name}");
    }
    assert_eq!(meta_content(&page, "itemprop", "image").as_deref(), Some("/cover.png"));
}

#[test]
fn icon_and_canonical_keep_separate_snapshot_fields() {
    let mut page = page();
    page.set_fav_icon("/favicon.ico").unwrap();
    page.set_canonical_url("https://example.com/").unwrap();
    assert_eq!(page.meta_value(MetaField::FavIcon), Some("/favicon.ico"));
    assert_eq!(page.meta_value(MetaField::Url), Some("https://example.com/"));
    assert_eq!(page.meta_value(MetaField::Color), None);

    let document = page.document();
    let icon = document
        .query_selector(document.head(), r#"link[rel="icon"]"#)
        .unwrap()
        .unwrap();
    assert_eq!(document.get_attribute(icon, "href"), Some("/favicon.ico"));
    let canonical = document
        .query_selector(document.head(), "link[rel=canonical]")
        .unwrap()
        .unwrap();
    assert_eq!(document.get_attribute(canonical, "href"), Some("https://example.com/"));
    for name in ["og:url", "twitter:url"] {
        assert_eq!(
            meta_content(&page, "property", name).as_deref(),
            Some("https://example.com/"),
            "{name}"
        );
    }
}

#[test]
fn og_and_twitter_always_write() {
    let mut page = page();
    page.og("website").unwrap();
    let mut mirror = DOMMirror::new(page.subscribe(), Recorder::default());
    page.og("website").unwrap();
    page.twitter(None).unwrap();
    page.twitter(None).unwrap();
    // og:type content, twitter:card insert plus its key attribute, two card contents
    assert_eq!(mirror.try_update_sync().unwrap(), 5);
}

#[test]
fn page_meta_skips_empty_fields() {
    let mut page = page();
    let meta: PageMeta = serde_json::from_value(serde_json::json!({
        "title": "Docs",
        "description": "",
        "keywords": [],
        "color": "#112233",
        "type": "website"
    }))
    .unwrap();
    page.set_page_meta(&meta).unwrap();

    assert_eq!(page.document().title(), "Docs");
    assert_eq!(meta_content(&page, "name", "description"), None);
    assert_eq!(meta_content(&page, "name", "keywords"), None);
    assert_eq!(meta_content(&page, "property", "theme-color").as_deref(), Some("#112233"));
    assert_eq!(meta_content(&page, "property", "og:type").as_deref(), Some("website"));

    match page.get_meta_data(None) {
        MetaQuery::All(snapshot) => {
            assert_eq!(snapshot.title.as_deref(), Some("Docs"));
            assert_eq!(snapshot.color.as_deref(), Some("#112233"));
            assert!(snapshot.description.is_none());
        }
        MetaQuery::Field(_) => panic!("expected the whole snapshot"),
    }
    assert_eq!(page.get_meta_data(Some(MetaField::Color)), MetaQuery::Field(Some("#112233")));
}

#[test]
fn open_graph_and_fresh_meta() {
    let mut page = page();
    page.open_graph(&OpenGraph {
        page_type: Some("article".into()),
        site_name: Some("Blog".into()),
        locale: None,
    })
    .unwrap();
    assert_eq!(meta_content(&page, "property", "og:site_name").as_deref(), Some("Blog"));
    assert_eq!(meta_content(&page, "property", "og:locale"), None);

    let first = page.create_new_meta(&[("name", "robots"), ("content", "noindex")]).unwrap();
    let second = page.create_new_meta(&[("name", "robots"), ("content", "noindex")]).unwrap();
    assert_ne!(first, second);
}

#[test]
fn snapshot_starts_from_existing_title() {
    let markup = "<html><head><title>Start</title></head><body></body></html>";
    let document = Document::from_html(markup).unwrap();
    let mut page = PageContext::with_document(document, PageConfig::new());
    assert_eq!(page.meta_value(MetaField::Title), Some("Start"));

    let mut mirror = DOMMirror::new(page.subscribe(), Recorder::default());
    page.set_title("Start").unwrap();
    assert_eq!(mirror.try_update_sync().unwrap(), 0);
    assert_eq!(Keywords::from(["one"]).joined(), "one");
}
