//! Find-or-create registry for elements in the document `<head>`.
//!
//! Lookups key on the attribute that identifies the element (a meta
//! name/property, an itemprop, a link rel, a stylesheet id), so repeated calls
//! update one element instead of appending duplicates. [`head_element`] itself
//! never looks anything up.

use dom::{Document, NodeKey, Selector};
use log::{debug, trace};
use rand::Rng;

use crate::context::PageContext;
use crate::error::PageError;

/// Upper bound (exclusive) of the numeric suffix in generated stylesheet ids.
const GENERATED_ID_RANGE: u32 = 10_000_000;

/// Handle to an element owned by the document head.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadElementRef(NodeKey);

impl HeadElementRef {
    pub const fn key(self) -> NodeKey {
        self.0
    }
}

impl From<HeadElementRef> for NodeKey {
    fn from(element: HeadElementRef) -> Self {
        element.0
    }
}

/// Attribute that identifies a meta tag: `name` for the two standard
/// document-level tags, `property` for everything else (Open Graph, Twitter).
pub fn meta_key_attribute(name: &str) -> &'static str {
    match name {
        "keywords" | "description" => "name",
        _ => "property",
    }
}

/// Create an element of `tag` with `attrs` and append it to the head.
///
/// No lookup happens here; the `find_or_create_*` helpers add identity.
pub fn head_element(
    document: &mut Document,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Result<HeadElementRef, PageError> {
    let element = document.create_element(tag);
    for (name, value) in attrs {
        document.set_attribute(element, name, value)?;
    }
    document.append_child(document.head(), element)?;
    debug!(target: "page_kit::head", "appended <{tag}> with {} attributes", attrs.len());
    Ok(HeadElementRef(element))
}

/// First head element matching `selector`, else a new one built from `attrs`.
fn find_or_create(
    document: &mut Document,
    selector: &Selector,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Result<HeadElementRef, PageError> {
    if let Some(existing) = document.find(document.head(), selector) {
        trace!(target: "page_kit::head", "reusing {selector}");
        return Ok(HeadElementRef(existing));
    }
    head_element(document, tag, attrs)
}

/// Upsert a `<meta>` tag and set its `content` to the trimmed value.
pub fn find_or_create_meta(
    document: &mut Document,
    name: &str,
    value: &str,
) -> Result<HeadElementRef, PageError> {
    let key = meta_key_attribute(name);
    let selector = Selector::tag("meta").with_attribute(key, name);
    let meta = find_or_create(document, &selector, "meta", &[(key, name)])?;
    document.set_attribute(meta.key(), "content", value.trim())?;
    Ok(meta)
}

/// Upsert a `<meta itemprop>` tag and set its `content` to the trimmed value.
pub fn find_or_create_itemprop(
    document: &mut Document,
    name: &str,
    value: &str,
) -> Result<HeadElementRef, PageError> {
    let selector = Selector::tag("meta").with_attribute("itemprop", name);
    let meta = find_or_create(document, &selector, "meta", &[("itemprop", name)])?;
    document.set_attribute(meta.key(), "content", value.trim())?;
    Ok(meta)
}

/// Upsert a `<link>` by `rel`, then set `href` and every extra attribute.
pub fn find_or_create_link(
    document: &mut Document,
    rel: &str,
    href: &str,
    extra: &[(&str, &str)],
) -> Result<HeadElementRef, PageError> {
    let selector = Selector::tag("link").with_attribute("rel", rel);
    let link = find_or_create(document, &selector, "link", &[("rel", rel)])?;
    document.set_attribute(link.key(), "href", href)?;
    for (name, value) in extra {
        document.set_attribute(link.key(), name, value)?;
    }
    Ok(link)
}

/// Upsert a stylesheet link identified by `id`, generating `link-<n>` when absent.
///
/// An element found under `id` is only reused when its `rel` is
/// `stylesheet`; otherwise a fresh stylesheet link is created.
pub fn find_or_create_stylesheet<R: Rng>(
    document: &mut Document,
    rng: &mut R,
    href: &str,
    id: Option<&str>,
) -> Result<HeadElementRef, PageError> {
    let id = id.filter(|id| !id.is_empty());
    let existing = id.and_then(|id| document.get_element_by_id(id)).filter(|&found| {
        document
            .get_attribute(found, "rel")
            .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"))
    });
    let link = match existing {
        Some(found) => HeadElementRef(found),
        None => {
            let id = id.map_or_else(|| generate_id(document, rng), str::to_owned);
            head_element(document, "link", &[("rel", "stylesheet"), ("id", id.as_str())])?
        }
    };
    document.set_attribute(link.key(), "href", href)?;
    Ok(link)
}

fn generate_id<R: Rng>(document: &Document, rng: &mut R) -> String {
    loop {
        let candidate = format!("link-{}", rng.random_range(0..GENERATED_ID_RANGE));
        if document.get_element_by_id(&candidate).is_none() {
            return candidate;
        }
    }
}

impl PageContext {
    /// See [`head_element`].
    pub fn head_element(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<HeadElementRef, PageError> {
        head_element(self.document_mut(), tag, attrs)
    }

    /// See [`find_or_create_meta`].
    pub fn meta(&mut self, name: &str, value: &str) -> Result<HeadElementRef, PageError> {
        find_or_create_meta(self.document_mut(), name, value)
    }

    /// See [`find_or_create_itemprop`].
    pub fn itemprop(&mut self, name: &str, value: &str) -> Result<HeadElementRef, PageError> {
        find_or_create_itemprop(self.document_mut(), name, value)
    }

    /// See [`find_or_create_link`].
    pub fn meta_link(
        &mut self,
        rel: &str,
        href: &str,
        extra: &[(&str, &str)],
    ) -> Result<HeadElementRef, PageError> {
        find_or_create_link(self.document_mut(), rel, href, extra)
    }

    /// See [`find_or_create_stylesheet`].
    pub fn style_sheet(
        &mut self,
        href: &str,
        id: Option<&str>,
    ) -> Result<HeadElementRef, PageError> {
        let (document, rng) = self.document_and_rng();
        find_or_create_stylesheet(document, rng, href, id)
    }
}
