//! Attribute helpers for arbitrary elements and the root `<html>` element.

use std::collections::BTreeMap;

use dom::{DomError, NodeKey};

use crate::context::PageContext;
use crate::error::PageError;

impl PageContext {
    /// All attributes of `element` as a name to value map.
    pub fn attributes_list(&self, element: NodeKey) -> Result<BTreeMap<String, String>, PageError> {
        let document = self.document();
        let Some(attrs) = document.attributes(element) else {
            let error = if document.contains(element) {
                DomError::NotAnElement(element)
            } else {
                DomError::UnknownNode(element)
            };
            return Err(error.into());
        };
        Ok(attrs.iter().cloned().collect())
    }

    /// Same as [`Self::attributes_list`].
    pub fn get_element_attributes(
        &self,
        element: NodeKey,
    ) -> Result<BTreeMap<String, String>, PageError> {
        self.attributes_list(element)
    }

    /// Set every pair on `element`, in order.
    pub fn set_element_attributes<K, V>(
        &mut self,
        element: NodeKey,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), PageError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in attrs {
            self.document_mut()
                .set_attribute(element, name.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /// Set attributes on the document element, e.g. `lang` or `data-theme`.
    pub fn set_html_attributes<K, V>(
        &mut self,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), PageError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let root = self.document().document_element();
        self.set_element_attributes(root, attrs)
    }
}
