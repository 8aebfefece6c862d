//! Indexed in-memory document model used by the page utilities.
//!
//! The document owns every node, keyed by a stable [`NodeKey`], and mirrors
//! each mutation as a [`DOMUpdate`] batch so subscribers (tests, renderers,
//! inspectors) can follow along without holding a borrow of the document.

#![allow(
    clippy::missing_errors_doc,
    reason = "Error conditions are described on the error enums"
)]

use core::sync::atomic::{AtomicU16, Ordering};

pub mod document;
pub mod html;
pub mod mirror;
pub mod selector;

pub use document::{Document, DomError, NodeKind};
pub use html::html_to_text;
pub use mirror::{DOMMirror, DOMSubscriber, DOMUpdate};
pub use selector::{AttributeMatch, Selector, SelectorError};

/// A 64-bit stable key for DOM nodes used to correlate mirrored updates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document node key (always present).
    pub const ROOT: Self = Self(0);

    /// Pack epoch+counter into a single 64-bit key.
    #[inline]
    pub const fn pack(epoch: u16, counter: u64) -> Self {
        let masked = counter & ((1_u64 << 48) - 1);
        Self(((epoch as u64) << 48) | masked)
    }

    /// Extract the epoch (owning document generation) from the key.
    #[inline]
    pub const fn epoch(self) -> u16 {
        (self.0 >> 48) as u16
    }

    /// Extract the per-document counter from the key.
    #[inline]
    pub const fn counter(self) -> u64 {
        self.0 & ((1_u64 << 48) - 1)
    }
}

/// Process-wide epoch source so keys minted by different documents never collide.
static NEXT_EPOCH: AtomicU16 = AtomicU16::new(1);

/// Per-document key minter.
#[derive(Clone, Debug)]
pub struct NodeKeyManager {
    epoch: u16,
    counter: u64,
}

impl NodeKeyManager {
    /// Create a manager on a fresh epoch.
    pub fn new() -> Self {
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        Self { epoch, counter: 1 }
    }

    /// Mint the next key in this manager's epoch.
    #[inline]
    pub fn mint(&mut self) -> NodeKey {
        let key = NodeKey::pack(self.epoch, self.counter);
        self.counter = self.counter.wrapping_add(1);
        key
    }

    /// Return the epoch this manager mints into.
    #[inline]
    pub const fn epoch(&self) -> u16 {
        self.epoch
    }
}

impl Default for NodeKeyManager {
    fn default() -> Self {
        Self::new()
    }
}
