//! Page utilities over an in-memory document.
//!
//! A [`PageContext`] owns one [`Document`] and offers the helpers a page
//! needs at runtime: deduplicated `<head>` metadata, font loading, pressed
//! key tracking, inline CSS variables, viewport and media queries, and script
//! injection.

#![allow(
    clippy::missing_errors_doc,
    reason = "Error conditions are described on the error enums"
)]

pub mod config;
pub mod context;
pub mod css_variable;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod head;
pub mod keys;
pub mod media;
pub mod metadata;
pub mod script;
pub mod viewport;

pub use config::PageConfig;
pub use context::PageContext;
pub use dom::{Document, NodeKey, html_to_text};
pub use error::PageError;
pub use fonts::{
    FetchFontLoader, FontDescriptor, FontFace, FontFaceDescriptors, FontFaceLoader, FontFaceSet,
    FontLoadError, FontWeightSetup, LoadedFontFace, LoadedFonts,
};
pub use head::HeadElementRef;
pub use keys::{KeyEventKind, KeyMods, KeyboardEvent, PressedKeys};
pub use media::ColorScheme;
pub use metadata::{Keywords, MetaField, MetaQuery, MetaSnapshot, OpenGraph, PageMeta};
pub use script::ScriptElement;
pub use viewport::Viewport;
