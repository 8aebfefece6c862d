//! The page context: one document plus the per-page state every helper shares.

use std::sync::Arc;

use dom::{DOMUpdate, Document};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast;

use crate::config::PageConfig;
use crate::fonts::{FetchFontLoader, FontFaceLoader, FontFaceSet};
use crate::keys::KeyboardEvents;
use crate::media::Environment;
use crate::metadata::MetaSnapshot;
use crate::script::ScriptRegistry;
use crate::viewport::Viewport;

/// Owns a [`Document`] and the state the page helpers keep between calls:
/// the metadata snapshot, the Google Fonts preconnect latch, registered font
/// faces, viewport and media environment, the keyboard channel and pending
/// script callbacks.
pub struct PageContext {
    document: Document,
    config: PageConfig,
    snapshot: MetaSnapshot,
    google_fonts_connected: bool,
    fonts: FontFaceSet,
    font_loader: Arc<dyn FontFaceLoader>,
    viewport: Viewport,
    environment: Environment,
    keyboard: KeyboardEvents,
    scripts: ScriptRegistry,
    id_rng: StdRng,
}

impl PageContext {
    /// A context over an empty `html`/`head`/`body` document.
    pub fn new(config: PageConfig) -> Self {
        let document = Document::with_update_capacity(config.update_capacity);
        Self::with_document(document, config)
    }

    /// A context over an existing document. The metadata snapshot starts with
    /// the document's current title.
    pub fn with_document(document: Document, config: PageConfig) -> Self {
        let loader: Arc<dyn FontFaceLoader> =
            Arc::new(FetchFontLoader::new(config.base_url.clone()));
        Self::with_services(document, config, loader)
    }

    /// A context with a caller-supplied font loader.
    pub fn with_services(
        document: Document,
        config: PageConfig,
        font_loader: Arc<dyn FontFaceLoader>,
    ) -> Self {
        let snapshot = MetaSnapshot::from_document(&document);
        let id_rng = config
            .id_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let keyboard = KeyboardEvents::new(config.key_event_capacity);
        debug!(target: "page_kit::context", "page context ready (title {:?})", snapshot.title);
        Self {
            document,
            config,
            snapshot,
            google_fonts_connected: false,
            fonts: FontFaceSet::default(),
            font_loader,
            viewport: Viewport::default(),
            environment: Environment::default(),
            keyboard,
            scripts: ScriptRegistry::default(),
            id_rng,
        }
    }

    /// Replace the font loader.
    #[must_use]
    pub fn with_font_loader(mut self, font_loader: Arc<dyn FontFaceLoader>) -> Self {
        self.font_loader = font_loader;
        self
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Subscribe to the document's mirrored update batches.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<DOMUpdate>> {
        self.document.subscribe()
    }

    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Faces registered by successful `load_font` calls.
    pub const fn fonts(&self) -> &FontFaceSet {
        &self.fonts
    }

    pub(crate) const fn fonts_mut(&mut self) -> &mut FontFaceSet {
        &mut self.fonts
    }

    pub(crate) const fn font_loader(&self) -> &Arc<dyn FontFaceLoader> {
        &self.font_loader
    }

    pub(crate) const fn snapshot(&self) -> &MetaSnapshot {
        &self.snapshot
    }

    pub(crate) const fn snapshot_mut(&mut self) -> &mut MetaSnapshot {
        &mut self.snapshot
    }

    pub(crate) const fn google_fonts_connected(&self) -> bool {
        self.google_fonts_connected
    }

    pub(crate) const fn mark_google_fonts_connected(&mut self) {
        self.google_fonts_connected = true;
    }

    pub(crate) const fn viewport_state(&self) -> &Viewport {
        &self.viewport
    }

    pub(crate) const fn viewport_state_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub(crate) const fn environment(&self) -> &Environment {
        &self.environment
    }

    pub(crate) const fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub(crate) const fn keyboard(&self) -> &KeyboardEvents {
        &self.keyboard
    }

    pub(crate) const fn scripts_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.scripts
    }

    pub(crate) const fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    pub(crate) const fn document_and_rng(&mut self) -> (&mut Document, &mut StdRng) {
        (&mut self.document, &mut self.id_rng)
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::new(PageConfig::default())
    }
}
