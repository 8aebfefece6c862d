//! Configuration settings for a page context.
//!
//! Defines the origins used for font preconnect hints, channel capacities for
//! the keyboard and document mirrors, and determinism knobs for tests.
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use std::env;

use url::Url;

/// Origin of the Google Fonts stylesheet host.
pub const DEFAULT_FONT_HOST_ORIGIN: &str = "https://fonts.googleapis.com";
/// Origin the Google Fonts stylesheets pull font files from.
pub const DEFAULT_FONT_STATIC_ORIGIN: &str = "https://fonts.gstatic.com";
/// Keyboard events a subscription may fall behind by before it lags.
pub const DEFAULT_KEY_EVENT_CAPACITY: usize = 256;
/// Document update batches a mirror may fall behind by before it lags.
pub const DEFAULT_UPDATE_CAPACITY: usize = dom::document::DEFAULT_UPDATE_CAPACITY;

/// Runtime configuration for a [`PageContext`](crate::PageContext).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageConfig {
    /// Origin of the first preconnect hint injected by `google_font`
    pub font_host_origin: String,
    /// Origin of the second (credentialed) preconnect hint injected by `google_font`
    pub font_static_origin: String,
    /// Capacity of the keyboard event channel
    pub key_event_capacity: usize,
    /// Capacity of the document update channel
    pub update_capacity: usize,
    /// Seed for generated stylesheet ids; `None` seeds from the OS
    pub id_seed: Option<u64>,
    /// Base URL relative font sources resolve against
    pub base_url: Option<Url>,
}

impl PageConfig {
    /// Construct a configuration with the default origins and capacities.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            font_host_origin: DEFAULT_FONT_HOST_ORIGIN.to_owned(),
            font_static_origin: DEFAULT_FONT_STATIC_ORIGIN.to_owned(),
            key_event_capacity: DEFAULT_KEY_EVENT_CAPACITY,
            update_capacity: DEFAULT_UPDATE_CAPACITY,
            id_seed: None,
            base_url: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PAGE_KIT_FONT_HOST_ORIGIN`: first preconnect origin
    ///   (default: `https://fonts.googleapis.com`)
    /// - `PAGE_KIT_FONT_STATIC_ORIGIN`: second preconnect origin
    ///   (default: `https://fonts.gstatic.com`)
    /// - `PAGE_KIT_KEY_EVENT_CAPACITY`: keyboard channel capacity (default: 256, minimum 1)
    /// - `PAGE_KIT_UPDATE_CAPACITY`: document mirror capacity (default: 1024, minimum 1)
    /// - `PAGE_KIT_ID_SEED`: seed for generated stylesheet ids (default: OS entropy)
    /// - `PAGE_KIT_BASE_URL`: base for relative font URLs (default: none)
    ///
    /// Unparsable values fall back to their defaults.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::new();
        let font_host_origin = env::var("PAGE_KIT_FONT_HOST_ORIGIN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.font_host_origin);
        let font_static_origin = env::var("PAGE_KIT_FONT_STATIC_ORIGIN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.font_static_origin);
        let key_event_capacity = env::var("PAGE_KIT_KEY_EVENT_CAPACITY")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_KEY_EVENT_CAPACITY)
            .max(1);
        let update_capacity = env::var("PAGE_KIT_UPDATE_CAPACITY")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_UPDATE_CAPACITY)
            .max(1);
        let id_seed = env::var("PAGE_KIT_ID_SEED")
            .ok()
            .and_then(|val| val.parse::<u64>().ok());
        let base_url = env::var("PAGE_KIT_BASE_URL")
            .ok()
            .and_then(|val| Url::parse(&val).ok());
        Self {
            font_host_origin,
            font_static_origin,
            key_event_capacity,
            update_capacity,
            id_seed,
            base_url,
        }
    }

    /// Seed the stylesheet id generator for reproducible ids.
    #[inline]
    #[must_use]
    pub const fn with_id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }

    /// Resolve relative font URLs against `base`.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Override the keyboard channel capacity (minimum 1).
    #[inline]
    #[must_use]
    pub fn with_key_event_capacity(mut self, capacity: usize) -> Self {
        self.key_event_capacity = capacity.max(1);
        self
    }

    /// Override both preconnect origins.
    #[inline]
    #[must_use]
    pub fn with_font_origins(mut self, host: &str, assets: &str) -> Self {
        host.clone_into(&mut self.font_host_origin);
        assets.clone_into(&mut self.font_static_origin);
        self
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_clamp_and_override() {
        let config = PageConfig::new()
            .with_key_event_capacity(0)
            .with_id_seed(7)
            .with_font_origins("https://fonts.example", "https://static.example");
        assert_eq!(config.key_event_capacity, 1);
        assert_eq!(config.id_seed, Some(7));
        assert_eq!(config.font_host_origin, "https://fonts.example");
        assert_eq!(config.font_static_origin, "https://static.example");
        assert_eq!(PageConfig::default().update_capacity, DEFAULT_UPDATE_CAPACITY);
    }
}
