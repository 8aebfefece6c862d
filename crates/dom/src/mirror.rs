use anyhow::{Error, anyhow};
use log::warn;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::NodeKey;

/// A batchable mutation applied to a [`Document`](crate::Document) and mirrored to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DOMUpdate {
    InsertElement {
        parent: NodeKey,
        node: NodeKey,
        tag: String,
        pos: usize,
    },
    InsertText {
        parent: NodeKey,
        node: NodeKey,
        text: String,
        pos: usize,
    },
    SetAttr {
        node: NodeKey,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: NodeKey,
        name: String,
    },
    RemoveNode {
        node: NodeKey,
    },
    EndOfDocument,
}

/// A subscriber that receives `DOMUpdate` values and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single update to the subscriber state.
    fn apply_update(&mut self, update: DOMUpdate) -> Result<(), Error>;
}

/// Generic mirror that drains mirrored document batches into a subscriber.
pub struct DOMMirror<T: DOMSubscriber> {
    in_updater: broadcast::Receiver<Vec<DOMUpdate>>,
    mirror: T,
}

impl<T: DOMSubscriber> DOMMirror<T> {
    /// Wrap a subscriber around a receiver obtained from
    /// [`Document::subscribe`](crate::Document::subscribe).
    pub const fn new(in_updater: broadcast::Receiver<Vec<DOMUpdate>>, mirror: T) -> Self {
        Self { in_updater, mirror }
    }

    /// Drain and apply every pending batch. Returns the number of updates applied.
    ///
    /// A lagging receiver skips the overwritten batches and keeps going; a closed
    /// channel (the document was dropped) is only an error if it happens before
    /// anything could be read.
    pub fn try_update_sync(&mut self) -> Result<usize, Error> {
        let mut applied = 0;
        loop {
            match self.in_updater.try_recv() {
                Ok(batch) => {
                    for update in batch {
                        self.mirror.apply_update(update)?;
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(target: "dom::mirror", "mirror lagged; {skipped} batches were dropped");
                }
                Err(TryRecvError::Closed) => {
                    if applied == 0 {
                        return Err(anyhow!("Recv channel was closed before any update arrived"));
                    }
                    break;
                }
            }
        }
        Ok(applied)
    }

    /// Access the inner mirror immutably.
    pub const fn mirror(&self) -> &T {
        &self.mirror
    }

    /// Access the inner mirror mutably.
    pub const fn mirror_mut(&mut self) -> &mut T {
        &mut self.mirror
    }

    /// Consume the mirror and return the subscriber.
    pub fn into_inner(self) -> T {
        self.mirror
    }
}
