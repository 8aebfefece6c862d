//! Font loading: descriptors, the loader seam, and the page's font face set.

pub mod descriptor;
pub mod fetch;

use std::sync::Arc;

use futures::TryFutureExt as _;
use futures::future::{BoxFuture, try_join_all};
use log::{debug, warn};
use thiserror::Error;

use crate::context::PageContext;
use crate::error::PageError;
use crate::head::HeadElementRef;
pub use descriptor::{
    FontDescriptor, FontFace, FontFaceDescriptors, FontFaceStatus, FontSource, FontWeightSetup,
    LoadedFontFace, LoadedFonts, SourceFormat, normalize_weight,
};
pub use fetch::{FetchFontLoader, FontSignature, sniff_font};

/// Failure to load a single font face.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontLoadError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("unsupported URL scheme: {url}")]
    UnsupportedScheme { url: String },
    #[error("{url} is not a recognized font file")]
    InvalidData { url: String },
    #[error("no usable source for font family {family}: {attempts:?}")]
    NoUsableSource { family: String, attempts: Vec<String> },
    #[error("font family {family} has no sources")]
    NoSources { family: String },
}

/// Loads the bytes behind a constructed face.
pub trait FontFaceLoader: Send + Sync {
    fn load(&self, face: FontFace) -> BoxFuture<'static, Result<LoadedFontFace, FontLoadError>>;
}

/// Faces registered with the page, in registration order, plus the faces
/// whose load was rejected.
#[derive(Clone, Debug, Default)]
pub struct FontFaceSet {
    faces: Vec<LoadedFontFace>,
    failed: Vec<FontFace>,
}

impl FontFaceSet {
    pub fn add(&mut self, face: LoadedFontFace) {
        self.faces.push(face);
    }

    pub(crate) fn record_failure(&mut self, face: FontFace) {
        self.failed.push(face.into_failed());
    }

    /// Faces that failed to load, each in the `Failed` state.
    pub fn failed(&self) -> &[FontFace] {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedFontFace> {
        self.faces.iter()
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.faces.iter().any(|face| face.family() == family)
    }
}

impl PageContext {
    /// Load a font family and register its faces with the page.
    ///
    /// A descriptor with `weights` loads every variant concurrently; the first
    /// failure rejects the whole call and nothing is registered. Otherwise a
    /// single face is built from `src` and the shared descriptors.
    pub async fn load_font(
        &mut self,
        descriptor: &FontDescriptor,
    ) -> Result<LoadedFonts, PageError> {
        let loader = Arc::clone(self.font_loader());
        if let Some(weights) = &descriptor.weights {
            let loads = weights.iter().map(|setup| {
                let face = setup.font_face(&descriptor.name).into_loading();
                loader.load(face.clone()).map_err(move |error| (face, error))
            });
            let loaded = match try_join_all(loads).await {
                Ok(loaded) => loaded,
                Err((face, error)) => return Err(self.reject_face(face, error)),
            };
            for face in &loaded {
                self.fonts_mut().add(face.clone());
            }
            debug!(
                target: "page_kit::fonts",
                "registered {} faces of {}",
                loaded.len(),
                descriptor.name
            );
            return Ok(LoadedFonts::Weights(loaded));
        }
        let Some(src) = descriptor.src.as_deref() else {
            return Err(PageError::InvalidConfiguration(format!(
                "font {:?} has neither src nor weights",
                descriptor.name
            )));
        };
        let face = FontFace::new(
            &descriptor.name,
            vec![FontSource::new(src, SourceFormat::Unspecified)],
            descriptor.descriptors.clone(),
        )
        .into_loading();
        let loaded = match loader.load(face.clone()).await {
            Ok(loaded) => loaded,
            Err(error) => return Err(self.reject_face(face, error)),
        };
        self.fonts_mut().add(loaded.clone());
        debug!(target: "page_kit::fonts", "registered {}", descriptor.name);
        Ok(LoadedFonts::Single(loaded))
    }

    fn reject_face(&mut self, face: FontFace, error: FontLoadError) -> PageError {
        warn!(target: "page_kit::fonts", "loading {} failed: {error}", face.family);
        self.fonts_mut().record_failure(face);
        PageError::FontLoad(error)
    }

    /// Add a Google Fonts stylesheet.
    ///
    /// The first call on a page also injects the two preconnect hints; later
    /// calls only add (or reuse) the stylesheet link.
    pub fn google_font(
        &mut self,
        href: &str,
        id: Option<&str>,
    ) -> Result<HeadElementRef, PageError> {
        if !self.google_fonts_connected() {
            let host = self.config().font_host_origin.clone();
            let assets = self.config().font_static_origin.clone();
            self.head_element("link", &[("rel", "preconnect"), ("href", host.as_str())])?;
            self.head_element(
                "link",
                &[("rel", "preconnect"), ("href", assets.as_str()), ("crossorigin", "")],
            )?;
            self.mark_google_fonts_connected();
            debug!(target: "page_kit::fonts", "preconnected to {host} and {assets}");
        }
        self.style_sheet(href, id)
    }
}
