//! Compound selectors for host-side element lookups.
//!
//! Supports a single compound selector: an optional type selector (or `*`),
//! followed by any number of `#id`, `.class` and `[attr]` / `[attr=value]`
//! parts. Combinators are rejected. Type and attribute names match ASCII
//! case-insensitively; attribute values, ids and classes match exactly.

use core::fmt::{Display, Formatter, Result as FmtResult};
use core::str::FromStr;

use thiserror::Error;

/// Failure to parse selector text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    #[error("combinators are not supported: {0:?}")]
    Combinator(String),
}

/// One `[name]` or `[name="value"]` part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMatch {
    /// Attribute name, lowercased.
    pub name: String,
    /// Required value; `None` only requires presence.
    pub value: Option<String>,
}

/// A parsed compound selector.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Selector {
    /// Selector matching any element with the given tag name.
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    /// Add an `[name="value"]` requirement.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.to_ascii_lowercase(),
            value: Some(value.to_owned()),
        });
        self
    }

    /// Add a bare `[name]` presence requirement.
    #[must_use]
    pub fn with_attribute_present(mut self, name: &str) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.to_ascii_lowercase(),
            value: None,
        });
        self
    }

    /// Add an `#id` requirement.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    /// Parse selector text such as `meta[property="og:title"]`.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        Parser::new(text).parse()
    }

    /// Test an element's tag and attribute list against this selector.
    pub fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        if let Some(wanted) = &self.tag
            && !wanted.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        let lookup = |name: &str| {
            attrs
                .iter()
                .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        };
        if let Some(id) = &self.id
            && lookup("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = lookup("class").unwrap_or_default();
            let has_all = self
                .classes
                .iter()
                .all(|wanted| class_attr.split_ascii_whitespace().any(|token| token == wanted));
            if !has_all {
                return false;
            }
        }
        self.attributes.iter().all(|part| match (lookup(&part.name), &part.value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.tag {
            Some(tag) => f.write_str(tag)?,
            None if self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty() => {
                f.write_str("*")?;
            }
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for part in &self.attributes {
            match &part.value {
                Some(value) => write!(f, "[{}=\"{}\"]", part.name, value.replace('"', "\\\""))?,
                None => write!(f, "[{}]", part.name)?,
            }
        }
        Ok(())
    }
}

/// Hand-written cursor over the selector text.
struct Parser<'text> {
    text: &'text str,
    offset: usize,
}

impl<'text> Parser<'text> {
    const fn new(text: &'text str) -> Self {
        Self { text, offset: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text.get(self.offset..).and_then(|rest| rest.chars().next())
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.offset += next.len_utf8();
        Some(next)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(next) = self.peek() {
            if next.is_alphanumeric() || next == '-' || next == '_' {
                out.push(next);
                self.bump();
            } else if next == '\\' {
                self.bump();
                if let Some(escaped) = self.bump() {
                    out.push(escaped);
                }
            } else {
                break;
            }
        }
        out
    }

    fn unexpected(&self) -> SelectorError {
        self.peek().map_or(SelectorError::UnterminatedAttribute, |found| {
            SelectorError::Unexpected {
                found,
                offset: self.offset,
            }
        })
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }
        self.text = trimmed;
        let mut selector = Selector::default();
        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(next) if next.is_alphabetic() => {
                selector.tag = Some(self.ident().to_ascii_lowercase());
            }
            _ => {}
        }
        while let Some(next) = self.peek() {
            match next {
                '#' => {
                    self.bump();
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.unexpected());
                    }
                    selector.id = Some(id);
                }
                '.' => {
                    self.bump();
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.unexpected());
                    }
                    selector.classes.push(class);
                }
                '[' => {
                    self.bump();
                    let part = self.attribute()?;
                    selector.attributes.push(part);
                }
                ' ' | '>' | '+' | '~' | ',' => {
                    return Err(SelectorError::Combinator(self.text.to_owned()));
                }
                _ => return Err(self.unexpected()),
            }
        }
        Ok(selector)
    }

    fn attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unexpected());
        }
        self.skip_whitespace();
        match self.bump() {
            Some(']') => Ok(AttributeMatch { name, value: None }),
            Some('=') => {
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        self.quoted(quote)?
                    }
                    Some(_) => self.ident(),
                    None => return Err(SelectorError::UnterminatedAttribute),
                };
                self.skip_whitespace();
                match self.bump() {
                    Some(']') => Ok(AttributeMatch {
                        name,
                        value: Some(value),
                    }),
                    Some(found) => Err(SelectorError::Unexpected {
                        found,
                        offset: self.offset - found.len_utf8(),
                    }),
                    None => Err(SelectorError::UnterminatedAttribute),
                }
            }
            Some(found) => Err(SelectorError::Unexpected {
                found,
                offset: self.offset - found.len_utf8(),
            }),
            None => Err(SelectorError::UnterminatedAttribute),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => {
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                }
                Some(next) if next == quote => return Ok(out),
                Some(next) => out.push(next),
                None => return Err(SelectorError::UnterminatedAttribute),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn parses_meta_property_selector() {
        let selector = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
        assert_eq!(selector, Selector::tag("meta").with_attribute("property", "og:title"));
        assert!(selector.matches("META", &attrs(&[("property", "og:title")])));
        assert!(!selector.matches("meta", &attrs(&[("property", "og:image")])));
        assert!(!selector.matches("link", &attrs(&[("property", "og:title")])));
    }

    #[test]
    fn id_class_and_presence_parts() {
        let selector = Selector::parse("link#main.theme[rel='stylesheet'][data-x]").unwrap();
        let good = attrs(&[
            ("id", "main"),
            ("class", "theme dark"),
            ("rel", "stylesheet"),
            ("data-x", ""),
        ]);
        assert!(selector.matches("link", &good));
        let missing = attrs(&[("id", "main"), ("class", "theme"), ("rel", "stylesheet")]);
        assert!(!selector.matches("link", &missing));
    }

    #[test]
    fn rejects_combinators_and_garbage() {
        assert!(matches!(Selector::parse("head meta"), Err(SelectorError::Combinator(_))));
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert_eq!(
            Selector::parse("meta[name=\"x\""),
            Err(SelectorError::UnterminatedAttribute)
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        let selector = Selector::tag("meta").with_attribute("itemprop", "say \"hi\"");
        let reparsed = Selector::parse(&selector.to_string()).unwrap();
        assert_eq!(selector, reparsed);
    }
}
