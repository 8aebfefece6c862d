//! Font descriptors accepted by `load_font` and the faces built from them.

use core::fmt::{Formatter, Result as FmtResult};

use bytes::Bytes;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Optional `@font-face` descriptors copied onto each constructed face.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontFaceDescriptors {
    pub style: Option<String>,
    /// Numeric weights such as `400` are accepted and kept in string form.
    #[serde(deserialize_with = "string_or_number")]
    pub weight: Option<String>,
    pub stretch: Option<String>,
    pub unicode_range: Option<String>,
    pub variant: Option<String>,
    pub feature_settings: Option<String>,
    pub variation_settings: Option<String>,
    pub display: Option<String>,
    pub ascent_override: Option<String>,
    pub descent_override: Option<String>,
    pub line_gap_override: Option<String>,
}

impl FontFaceDescriptors {
    /// Set the `font-weight` descriptor.
    #[must_use]
    pub fn weight(mut self, weight: &str) -> Self {
        self.weight = Some(weight.to_owned());
        self
    }

    /// Set the `font-style` descriptor.
    #[must_use]
    pub fn style(mut self, style: &str) -> Self {
        self.style = Some(style.to_owned());
        self
    }

    /// Set the `font-display` descriptor.
    #[must_use]
    pub fn display(mut self, display: &str) -> Self {
        self.display = Some(display.to_owned());
        self
    }
}

/// One weight (or style) variant of a family, with per-format sources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontWeightSetup {
    #[serde(flatten)]
    pub descriptors: FontFaceDescriptors,
    /// Literal source used verbatim, ahead of any format-specific URL.
    pub src: Option<String>,
    pub woff: Option<String>,
    pub woff2: Option<String>,
    pub ttf: Option<String>,
    pub eot: Option<String>,
    pub svg: Option<String>,
    pub otf: Option<String>,
}

impl FontWeightSetup {
    /// A variant with the given weight and no sources yet.
    pub fn with_weight(weight: &str) -> Self {
        Self {
            descriptors: FontFaceDescriptors::default().weight(weight),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn woff(mut self, url: &str) -> Self {
        self.woff = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn woff2(mut self, url: &str) -> Self {
        self.woff2 = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn ttf(mut self, url: &str) -> Self {
        self.ttf = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn otf(mut self, url: &str) -> Self {
        self.otf = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn src(mut self, url: &str) -> Self {
        self.src = Some(url.to_owned());
        self
    }

    /// Source candidates in preference order: `src`, woff, woff2, ttf, eot, svg, otf.
    pub fn sources(&self) -> Vec<FontSource> {
        let ordered = [
            (&self.src, SourceFormat::Unspecified),
            (&self.woff, SourceFormat::Woff),
            (&self.woff2, SourceFormat::Woff2),
            (&self.ttf, SourceFormat::TrueType),
            (&self.eot, SourceFormat::EmbeddedOpenType),
            (&self.svg, SourceFormat::Svg),
            (&self.otf, SourceFormat::OpenType),
        ];
        ordered
            .into_iter()
            .filter_map(|(url, format)| {
                url.as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| FontSource::new(url, format))
            })
            .collect()
    }

    /// Build the face for `family`, normalizing a `light` weight to `300`.
    pub fn font_face(&self, family: &str) -> FontFace {
        let mut descriptors = self.descriptors.clone();
        descriptors.weight = descriptors.weight.as_deref().map(normalize_weight);
        FontFace::new(family, self.sources(), descriptors)
    }
}

/// Describes a family to load: either a single `src` or a list of weights.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDescriptor {
    pub name: String,
    pub src: Option<String>,
    pub descriptors: FontFaceDescriptors,
    pub weights: Option<Vec<FontWeightSetup>>,
}

impl FontDescriptor {
    /// A family loaded from one source string.
    pub fn single(name: &str, src: &str) -> Self {
        Self {
            name: name.to_owned(),
            src: Some(src.to_owned()),
            ..Self::default()
        }
    }

    /// A family loaded as several weight variants.
    pub fn weighted(name: &str, weights: Vec<FontWeightSetup>) -> Self {
        Self {
            name: name.to_owned(),
            weights: Some(weights),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_descriptors(mut self, descriptors: FontFaceDescriptors) -> Self {
        self.descriptors = descriptors;
        self
    }
}

/// `light` in any case becomes `300`; every other weight is kept as given.
pub fn normalize_weight(weight: &str) -> String {
    if weight.trim().eq_ignore_ascii_case("light") {
        "300".to_owned()
    } else {
        weight.to_owned()
    }
}

/// Declared format of a source URL.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Unspecified,
    Woff,
    Woff2,
    TrueType,
    EmbeddedOpenType,
    Svg,
    OpenType,
}

impl SourceFormat {
    /// The `format("...")` hint written after the URL, if any.
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Woff => Some("woff"),
            Self::Woff2 => Some("woff2"),
            Self::TrueType => Some("truetype"),
            Self::EmbeddedOpenType => Some("embedded-opentype"),
            Self::Svg => Some("svg"),
            Self::OpenType => Some("opentype"),
        }
    }
}

/// One candidate in a face's source list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSource {
    pub url: String,
    pub format: SourceFormat,
}

impl FontSource {
    pub fn new(url: &str, format: SourceFormat) -> Self {
        Self {
            url: url.trim().to_owned(),
            format,
        }
    }

    /// Render as a CSS source entry: `url(...)`, plus `format("...")` when known.
    pub fn to_css(&self) -> String {
        let location = self.location();
        match self.format.hint() {
            Some(hint) => format!("url({location}) format(\"{hint}\")"),
            None => format!("url({location})"),
        }
    }

    /// The fetchable location: `url(...)` wrappers and quotes removed.
    pub fn location(&self) -> &str {
        let trimmed = self.url.trim();
        let inner = trimmed
            .strip_prefix("url(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed)
            .trim();
        inner
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .or_else(|| inner.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
            .unwrap_or(inner)
    }
}

/// Load progress of a face.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FontFaceStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// A constructed font face awaiting (or after) load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub sources: Vec<FontSource>,
    pub descriptors: FontFaceDescriptors,
    pub status: FontFaceStatus,
}

impl FontFace {
    pub fn new(family: &str, sources: Vec<FontSource>, descriptors: FontFaceDescriptors) -> Self {
        Self {
            family: family.to_owned(),
            sources,
            descriptors,
            status: FontFaceStatus::Unloaded,
        }
    }

    /// The CSS `src` value, e.g. `url(a.woff2) format("woff2"), url(a.ttf) format("truetype")`.
    pub fn source(&self) -> String {
        self.sources
            .iter()
            .map(FontSource::to_css)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn weight(&self) -> Option<&str> {
        self.descriptors.weight.as_deref()
    }

    /// Mark the face as handed to a loader.
    #[must_use]
    pub fn into_loading(mut self) -> Self {
        self.status = FontFaceStatus::Loading;
        self
    }

    /// Mark the face as rejected by its loader.
    #[must_use]
    pub fn into_failed(mut self) -> Self {
        self.status = FontFaceStatus::Failed;
        self
    }
}

/// A face whose bytes were fetched and recognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedFontFace {
    pub face: FontFace,
    /// The candidate the bytes came from.
    pub source: FontSource,
    pub data: Bytes,
}

impl LoadedFontFace {
    pub fn new(mut face: FontFace, source: FontSource, data: Bytes) -> Self {
        face.status = FontFaceStatus::Loaded;
        Self { face, source, data }
    }

    pub fn family(&self) -> &str {
        &self.face.family
    }

    pub fn weight(&self) -> Option<&str> {
        self.face.weight()
    }
}

/// Result of `load_font`: one face for a `src` descriptor, a list for `weights`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadedFonts {
    Single(LoadedFontFace),
    Weights(Vec<LoadedFontFace>),
}

impl LoadedFonts {
    pub fn faces(&self) -> &[LoadedFontFace] {
        match self {
            Self::Single(face) => core::slice::from_ref(face),
            Self::Weights(faces) => faces,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct WeightVisitor;

    impl Visitor<'_> for WeightVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut Formatter<'_>) -> FmtResult {
            formatter.write_str("a font weight string or number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_owned()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(WeightVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_follow_format_precedence() {
        let setup = FontWeightSetup::with_weight("400")
            .otf("/a.otf")
            .ttf("/a.ttf")
            .woff2("/a.woff2");
        let face = setup.font_face("Inter");
        assert_eq!(
            face.source(),
            "url(/a.woff2) format(\"woff2\"), url(/a.ttf) format(\"truetype\"), url(/a.otf) format(\"opentype\")"
        );
    }

    #[test]
    fn generic_src_is_wrapped_like_the_formats() {
        let face = FontWeightSetup::with_weight("400")
            .src("/a.woff")
            .woff2("/a.woff2")
            .font_face("X");
        assert_eq!(face.source(), "url(/a.woff), url(/a.woff2) format(\"woff2\")");
        let wrapped = FontSource::new("url('/b.woff')", SourceFormat::Unspecified);
        assert_eq!(wrapped.to_css(), "url(/b.woff)");
    }

    #[test]
    fn light_weight_becomes_300() {
        assert_eq!(FontWeightSetup::with_weight("Light").font_face("X").weight(), Some("300"));
        assert_eq!(FontWeightSetup::with_weight("LIGHT").font_face("X").weight(), Some("300"));
        assert_eq!(FontWeightSetup::with_weight("bold").font_face("X").weight(), Some("bold"));
    }

    #[test]
    fn location_strips_css_wrappers() {
        let quoted = FontSource::new("url(\"/fonts/a.woff\")", SourceFormat::Unspecified);
        assert_eq!(quoted.location(), "/fonts/a.woff");
        let bare = FontSource::new(" /fonts/b.ttf ", SourceFormat::TrueType);
        assert_eq!(bare.location(), "/fonts/b.ttf");
    }
}
