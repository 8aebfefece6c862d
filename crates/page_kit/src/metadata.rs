//! Page metadata: title, description, keywords, social previews and icons.
//!
//! Every setter compares the requested value against the last value it wrote
//! and returns without touching the document when nothing changed. When a
//! value changes, all tags derived from it are upserted through the head
//! registry, so a value always lives in exactly one element per tag.

use core::fmt::{Display, Formatter, Result as FmtResult};

use dom::Document;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::context::PageContext;
use crate::error::PageError;
use crate::head::HeadElementRef;

/// Last values written by the metadata setters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSnapshot {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub fav_icon: Option<String>,
}

impl MetaSnapshot {
    /// Seed the snapshot from what the document already shows.
    pub fn from_document(document: &Document) -> Self {
        let title = document.title();
        Self {
            title: (!title.is_empty()).then_some(title),
            ..Self::default()
        }
    }

    pub fn get(&self, field: MetaField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    const fn slot(&self, field: MetaField) -> &Option<String> {
        match field {
            MetaField::Title => &self.title,
            MetaField::Description => &self.description,
            MetaField::Keywords => &self.keywords,
            MetaField::Image => &self.image,
            MetaField::Url => &self.url,
            MetaField::Color => &self.color,
            MetaField::FavIcon => &self.fav_icon,
        }
    }

    const fn slot_mut(&mut self, field: MetaField) -> &mut Option<String> {
        match field {
            MetaField::Title => &mut self.title,
            MetaField::Description => &mut self.description,
            MetaField::Keywords => &mut self.keywords,
            MetaField::Image => &mut self.image,
            MetaField::Url => &mut self.url,
            MetaField::Color => &mut self.color,
            MetaField::FavIcon => &mut self.fav_icon,
        }
    }
}

/// A field of the [`MetaSnapshot`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetaField {
    Title,
    Description,
    Keywords,
    Image,
    Url,
    Color,
    FavIcon,
}

impl Display for MetaField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Keywords => "keywords",
            Self::Image => "image",
            Self::Url => "url",
            Self::Color => "color",
            Self::FavIcon => "favIcon",
        })
    }
}

/// Keywords as one comma separated string or as a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    Text(String),
    List(Vec<String>),
}

impl Keywords {
    /// The `content` value: list entries joined with `,`.
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(list) => list.join(","),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(list) => list.is_empty(),
        }
    }
}

impl From<&str> for Keywords {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Keywords {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for Keywords {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<&[&str]> for Keywords {
    fn from(list: &[&str]) -> Self {
        Self::List(list.iter().map(|&item| item.to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Keywords {
    fn from(list: [&str; N]) -> Self {
        Self::from(list.as_slice())
    }
}

/// Bulk input for [`PageContext::set_page_meta`]. Absent and empty fields are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fav_icon: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub keywords: Option<Keywords>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub page_type: Option<String>,
}

/// Extra Open Graph fields written by [`PageContext::open_graph`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenGraph {
    pub page_type: Option<String>,
    pub site_name: Option<String>,
    pub locale: Option<String>,
}

/// Answer of [`PageContext::get_meta_data`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaQuery<'page> {
    All(&'page MetaSnapshot),
    Field(Option<&'page str>),
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

impl PageContext {
    /// Apply every present field in a fixed order: title, description,
    /// favicon, url, image, keywords, color, type.
    pub fn set_page_meta(&mut self, meta: &PageMeta) -> Result<(), PageError> {
        if let Some(title) = present(meta.title.as_deref()) {
            self.set_title(title)?;
        }
        if let Some(description) = present(meta.description.as_deref()) {
            self.set_description(description)?;
        }
        if let Some(icon) = present(meta.fav_icon.as_deref()) {
            self.set_fav_icon(icon)?;
        }
        if let Some(url) = present(meta.url.as_deref()) {
            self.set_canonical_url(url)?;
        }
        if let Some(image) = present(meta.image.as_deref()) {
            self.set_image(image)?;
        }
        if let Some(keywords) = meta.keywords.as_ref().filter(|keywords| !keywords.is_empty()) {
            self.set_keywords(keywords.clone())?;
        }
        if let Some(color) = present(meta.color.as_deref()) {
            self.set_page_color(color)?;
        }
        if let Some(page_type) = present(meta.page_type.as_deref()) {
            self.og(page_type)?;
        }
        Ok(())
    }

    /// Set the document title and its Open Graph, Twitter and itemprop mirrors.
    pub fn set_title(&mut self, title: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::Title, title) {
            return Ok(());
        }
        self.document_mut().set_title(title)?;
        self.meta("og:title", title)?;
        self.meta("og:image:alt", title)?;
        self.meta("twitter:title", title)?;
        self.meta("twitter:image:alt", title)?;
        self.itemprop("name", title)?;
        self.record(MetaField::Title, title);
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::Description, description) {
            return Ok(());
        }
        self.meta("description", description)?;
        self.itemprop("description", description)?;
        self.meta("og:description", description)?;
        self.meta("twitter:description", description)?;
        self.record(MetaField::Description, description);
        Ok(())
    }

    pub fn set_keywords(&mut self, keywords: impl Into<Keywords>) -> Result<(), PageError> {
        let joined = keywords.into().joined();
        if self.unchanged(MetaField::Keywords, &joined) {
            return Ok(());
        }
        self.meta("keywords", &joined)?;
        self.record(MetaField::Keywords, &joined);
        Ok(())
    }

    /// Set the preview image used by link unfurlers.
    pub fn set_image(&mut self, image: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::Image, image) {
            return Ok(());
        }
        self.meta("image", image)?;
        self.meta("og:image", image)?;
        self.meta("twitter:image", image)?;
        self.itemprop("image", image)?;
        self.record(MetaField::Image, image);
        Ok(())
    }

    /// Set the browser theme color.
    pub fn set_page_color(&mut self, color: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::Color, color) {
            return Ok(());
        }
        self.meta("theme-color", color)?;
        self.record(MetaField::Color, color);
        Ok(())
    }

    /// Point the `icon` link at `href`.
    pub fn set_fav_icon(&mut self, href: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::FavIcon, href) {
            return Ok(());
        }
        self.meta_link("icon", href, &[])?;
        self.record(MetaField::FavIcon, href);
        Ok(())
    }

    pub fn set_canonical_url(&mut self, url: &str) -> Result<(), PageError> {
        if self.unchanged(MetaField::Url, url) {
            return Ok(());
        }
        self.meta_link("canonical", url, &[])?;
        self.meta("twitter:url", url)?;
        self.meta("og:url", url)?;
        self.record(MetaField::Url, url);
        Ok(())
    }

    /// Write `og:type`. Not tracked by the snapshot, so always written.
    pub fn og(&mut self, page_type: &str) -> Result<HeadElementRef, PageError> {
        self.meta("og:type", page_type)
    }

    /// Write `twitter:card`, defaulting to `summary`.
    pub fn twitter(&mut self, card: Option<&str>) -> Result<HeadElementRef, PageError> {
        self.meta("twitter:card", card.unwrap_or("summary"))
    }

    /// Write the present Open Graph extras (`og:type`, `og:site_name`, `og:locale`).
    pub fn open_graph(&mut self, graph: &OpenGraph) -> Result<(), PageError> {
        if let Some(page_type) = present(graph.page_type.as_deref()) {
            self.og(page_type)?;
        }
        if let Some(site_name) = present(graph.site_name.as_deref()) {
            self.meta("og:site_name", site_name)?;
        }
        if let Some(locale) = present(graph.locale.as_deref()) {
            self.meta("og:locale", locale)?;
        }
        Ok(())
    }

    /// Append a fresh `<meta>` with exactly `attrs`, without looking for an existing one.
    pub fn create_new_meta(&mut self, attrs: &[(&str, &str)]) -> Result<HeadElementRef, PageError> {
        self.head_element("meta", attrs)
    }

    /// The full snapshot of last written values.
    pub const fn meta_data(&self) -> &MetaSnapshot {
        self.snapshot()
    }

    pub fn meta_value(&self, field: MetaField) -> Option<&str> {
        self.snapshot().get(field)
    }

    /// The whole snapshot when `field` is `None`, otherwise that one value.
    pub fn get_meta_data(&self, field: Option<MetaField>) -> MetaQuery<'_> {
        match field {
            Some(field) => MetaQuery::Field(self.meta_value(field)),
            None => MetaQuery::All(self.snapshot()),
        }
    }

    fn unchanged(&self, field: MetaField, value: &str) -> bool {
        let same = self.snapshot().get(field) == Some(value);
        if same {
            trace!(target: "page_kit::metadata", "{field} unchanged");
        }
        same
    }

    fn record(&mut self, field: MetaField, value: &str) {
        debug!(target: "page_kit::metadata", "{field} set to {value:?}");
        *self.snapshot_mut().slot_mut(field) = Some(value.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_join_without_spaces() {
        assert_eq!(Keywords::from(["a", "b", "c"]).joined(), "a,b,c");
        assert_eq!(Keywords::from("x, y").joined(), "x, y");
    }

    #[test]
    fn page_meta_reads_camel_case_json() {
        let meta: PageMeta = serde_json::from_str(
            r#"{"title":"T","favIcon":"/f.ico","keywords":["a","b"],"type":"article"}"#,
        )
        .unwrap();
        assert_eq!(meta.fav_icon.as_deref(), Some("/f.ico"));
        assert_eq!(meta.keywords, Some(Keywords::List(vec!["a".into(), "b".into()])));
        assert_eq!(meta.page_type.as_deref(), Some("article"));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = MetaSnapshot {
            fav_icon: Some("/f.ico".into()),
            ..MetaSnapshot::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["favIcon"], "/f.ico");
        assert!(json["title"].is_null());
    }
}
