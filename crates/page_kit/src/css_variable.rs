//! Inline style properties and custom property (`--*`) lookup.
//!
//! Reads and writes go through the element's `style` attribute. Computed
//! lookups walk the ancestor chain so custom properties inherit, and expand
//! `var()` references with cycle detection.

use std::collections::HashMap;

use dom::{Document, NodeKey};
use log::trace;

use crate::context::PageContext;
use crate::error::PageError;

/// One declaration of an inline `style` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased, except custom properties which are case-sensitive.
    pub property: String,
    pub value: String,
}

/// Custom properties in scope, keyed by name including the leading `--`.
pub type CustomProperties = HashMap<String, String>;

/// Split a `style` attribute into declarations. Items without a colon, a
/// property or a value are skipped.
pub fn parse_style_attribute(input: &str) -> Vec<Declaration> {
    input
        .split(';')
        .filter_map(|item| {
            let (property, value) = item.split_once(':')?;
            let property = property.trim_matches(is_css_whitespace);
            let value = value.trim_matches(is_css_whitespace);
            (!property.is_empty() && !value.is_empty()).then(|| Declaration {
                property: normalize_property(property),
                value: value.to_owned(),
            })
        })
        .collect()
}

/// Serialize declarations back into attribute form: `a: 1; b: 2`.
pub fn serialize_style_attribute(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|decl| format!("{}: {}", decl.property, decl.value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn normalize_property(property: &str) -> String {
    if property.starts_with("--") {
        property.to_owned()
    } else {
        property.to_ascii_lowercase()
    }
}

/// ASCII whitespace per CSS Syntax (TAB, LF, FF, CR, SPACE).
const fn is_css_whitespace(character: char) -> bool {
    matches!(character, '\u{0009}' | '\u{000A}' | '\u{000C}' | '\u{000D}' | '\u{0020}')
}

/// Last value of `property` in the element's inline style.
fn inline_value(document: &Document, element: NodeKey, property: &str) -> Option<String> {
    let style = document.get_attribute(element, "style")?;
    parse_style_attribute(style)
        .into_iter()
        .rev()
        .find(|decl| decl.property == property)
        .map(|decl| decl.value)
}

/// Custom properties visible on `element`: its own inline ones over its ancestors'.
fn custom_properties_in_scope(document: &Document, element: NodeKey) -> CustomProperties {
    let mut chain = Vec::new();
    let mut cursor = Some(element);
    while let Some(node) = cursor {
        chain.push(node);
        cursor = document.parent(node);
    }
    let mut scope = CustomProperties::new();
    for node in chain.into_iter().rev() {
        if let Some(style) = document.get_attribute(node, "style") {
            for decl in parse_style_attribute(style) {
                if decl.property.starts_with("--") {
                    scope.insert(decl.property, decl.value);
                }
            }
        }
    }
    scope
}

/// Expand `var(--name)` and `var(--name, fallback)` references in `value`.
///
/// A reference that is missing or part of a cycle takes its fallback, or the
/// empty string without one. An unclosed `var(` is kept verbatim.
pub fn resolve_vars(value: &str, scope: &CustomProperties) -> String {
    resolve_with_stack(value, scope, &mut Vec::new())
}

fn resolve_with_stack(value: &str, scope: &CustomProperties, stack: &mut Vec<String>) -> String {
    let Some((head, after_open)) = value.split_once("var(") else {
        return value.to_owned();
    };
    let Some(close) = matching_paren(after_open) else {
        return value.to_owned();
    };
    let (args, tail) = after_open.split_at(close);
    let replacement = resolve_reference(args, scope, stack);
    let rest = resolve_with_stack(tail.get(1..).unwrap_or_default(), scope, stack);
    [head, &replacement, &rest].concat()
}

/// Byte offset of the `)` closing an already opened parenthesis.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (offset, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(offset),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn resolve_reference(args: &str, scope: &CustomProperties, stack: &mut Vec<String>) -> String {
    let (name, fallback) = match args.split_once(',') {
        Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
        None => (args.trim(), None),
    };
    let use_fallback = |stack: &mut Vec<String>| {
        fallback.map_or_else(String::new, |fallback| resolve_with_stack(fallback, scope, stack))
    };
    if !name.starts_with("--") || stack.iter().any(|seen| seen == name) {
        return use_fallback(stack);
    }
    match scope.get(name) {
        Some(value) => {
            stack.push(name.to_owned());
            let expanded = resolve_with_stack(value, scope, stack);
            stack.pop();
            expanded
        }
        None => use_fallback(stack),
    }
}

impl PageContext {
    /// Inline style value of `name` on `element` (the document element by
    /// default), or the empty string when unset.
    pub fn get_css_variable(&self, name: &str, element: Option<NodeKey>) -> String {
        let element = element.unwrap_or_else(|| self.document().document_element());
        inline_value(self.document(), element, &normalize_property(name.trim())).unwrap_or_default()
    }

    /// Set `name` in the inline style of `element` (the document element by default).
    pub fn set_css_variable(
        &mut self,
        name: &str,
        value: &str,
        element: Option<NodeKey>,
    ) -> Result<(), PageError> {
        let element = element.unwrap_or_else(|| self.document().document_element());
        let property = normalize_property(name.trim());
        let mut declarations = self
            .document()
            .get_attribute(element, "style")
            .map(parse_style_attribute)
            .unwrap_or_default();
        declarations.retain(|decl| decl.property != property);
        declarations.push(Declaration {
            property,
            value: value.trim().to_owned(),
        });
        let style = serialize_style_attribute(&declarations);
        trace!(target: "page_kit::css", "style of {element:?} is now {style:?}");
        self.document_mut().set_attribute(element, "style", &style)?;
        Ok(())
    }

    /// Read `name` when `value` is absent or empty, otherwise write it.
    ///
    /// Returns the read value, or `None` after a write.
    pub fn css_variable(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<String>, PageError> {
        match value.filter(|value| !value.is_empty()) {
            Some(value) => {
                self.set_css_variable(name, value, None)?;
                Ok(None)
            }
            None => Ok(Some(self.get_css_variable(name, None))),
        }
    }

    /// The value `name` takes on `element` after inheritance and `var()` expansion.
    pub fn computed_css_variable(&self, name: &str, element: Option<NodeKey>) -> String {
        let element = element.unwrap_or_else(|| self.document().document_element());
        let name = normalize_property(name.trim());
        let scope = custom_properties_in_scope(self.document(), element);
        let raw = if name.starts_with("--") {
            scope.get(&name).cloned()
        } else {
            inline_value(self.document(), element, &name)
        };
        raw.map(|raw| resolve_vars(&raw, &scope)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, &str)]) -> CustomProperties {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn parse_keeps_custom_property_case() {
        let decls = parse_style_attribute("--Main: red; COLOR : blue;;bad");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "--Main");
        assert_eq!(decls[1].property, "color");
        assert_eq!(serialize_style_attribute(&decls), "--Main: red; color: blue");
    }

    #[test]
    fn resolves_nested_references_and_fallbacks() {
        let vars = scope(&[("--a", "var(--b)"), ("--b", "10px")]);
        assert_eq!(resolve_vars("calc(var(--a) + 1px)", &vars), "calc(10px + 1px)");
        assert_eq!(resolve_vars("var(--missing, var(--b))", &vars), "10px");
        assert_eq!(resolve_vars("var(--missing)", &vars), "");
    }

    #[test]
    fn cycles_fall_back() {
        let vars = scope(&[("--a", "var(--b, 1)"), ("--b", "var(--a, 2)")]);
        assert_eq!(resolve_vars("var(--a)", &vars), "2");
    }
}
