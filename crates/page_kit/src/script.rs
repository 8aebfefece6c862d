//! Script element injection with deferred load callbacks.

use std::collections::HashMap;

use dom::NodeKey;
use log::{debug, trace};

use crate::context::PageContext;
use crate::error::PageError;

/// Handle to an injected `<script>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptElement(NodeKey);

impl ScriptElement {
    pub const fn key(self) -> NodeKey {
        self.0
    }
}

type OnLoad = Box<dyn FnOnce(ScriptElement)>;

/// Load callbacks of scripts whose load has not been reported yet.
#[derive(Default)]
pub(crate) struct ScriptRegistry {
    pending: HashMap<NodeKey, OnLoad>,
}

impl ScriptRegistry {
    fn insert(&mut self, script: ScriptElement, on_load: OnLoad) {
        self.pending.insert(script.key(), on_load);
    }

    fn take(&mut self, script: ScriptElement) -> Option<OnLoad> {
        self.pending.remove(&script.key())
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

impl PageContext {
    /// Append `<script src>` to the body and remember `on_load` until the
    /// host reports the script loaded.
    pub fn load_script<F>(&mut self, src: &str, on_load: F) -> Result<ScriptElement, PageError>
    where
        F: FnOnce(ScriptElement) + 'static,
    {
        let document = self.document_mut();
        let node = document.create_element("script");
        document.set_attribute(node, "src", src)?;
        document.append_child(document.body(), node)?;
        let script = ScriptElement(node);
        self.scripts_mut().insert(script, Box::new(on_load));
        debug!(target: "page_kit::script", "injected script {src}");
        Ok(script)
    }

    /// Run the load callback of `script`. Returns `false` when none is pending.
    pub fn notify_script_loaded(&mut self, script: ScriptElement) -> bool {
        let Some(on_load) = self.scripts_mut().take(script) else {
            trace!(target: "page_kit::script", "no pending callback for {:?}", script.key());
            return false;
        };
        on_load(script);
        true
    }

    /// Scripts injected but not yet reported loaded.
    pub fn pending_scripts(&self) -> usize {
        self.scripts().len()
    }
}
