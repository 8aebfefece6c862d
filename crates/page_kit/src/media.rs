//! Media query evaluation and the dark mode preference.

use log::{debug, trace};

use crate::context::PageContext;

/// Value of the `prefers-color-scheme` media feature.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// User preferences media queries are evaluated against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    pub color_scheme: ColorScheme,
    pub reduced_motion: bool,
}

/// Parse a length such as `600px` or `600` into CSS pixels.
fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
}

impl PageContext {
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        debug!(target: "page_kit::media", "color scheme set to {}", scheme.as_str());
        self.environment_mut().color_scheme = scheme;
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.environment_mut().reduced_motion = reduced;
    }

    /// Whether `(prefers-color-scheme: dark)` matches.
    pub fn user_prefers_dark_mode(&self) -> bool {
        self.match_media("(prefers-color-scheme: dark)")
    }

    /// Evaluate a media query list against the page environment.
    ///
    /// Comma separated queries match when any one matches; each query is a
    /// conjunction of an optional `all`/`screen` type and `(feature: value)`
    /// tests. Unknown features and types never match.
    pub fn match_media(&self, query: &str) -> bool {
        let matched = query
            .split(',')
            .any(|single| self.match_single_query(single.trim()));
        trace!(target: "page_kit::media", "{query:?} -> {matched}");
        matched
    }

    fn match_single_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }
        let lowered = query.to_ascii_lowercase();
        let (negated, body) = match lowered.strip_prefix("not ") {
            Some(rest) => (true, rest.trim()),
            None => (false, lowered.as_str()),
        };
        let result = body
            .split(" and ")
            .map(str::trim)
            .all(|part| self.match_condition(part));
        result != negated
    }

    fn match_condition(&self, part: &str) -> bool {
        match part {
            "all" | "screen" | "only screen" => return true,
            "print" => return false,
            _ => {}
        }
        let Some(inner) = part.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) else {
            return false;
        };
        let (feature, value) = match inner.split_once(':') {
            Some((feature, value)) => (feature.trim(), Some(value.trim())),
            None => (inner.trim(), None),
        };
        let env = self.environment();
        let width = f64::from(self.window_width());
        let height = f64::from(self.window_height());
        match (feature, value) {
            ("prefers-color-scheme", Some(scheme)) => scheme == env.color_scheme.as_str(),
            ("prefers-reduced-motion", Some("reduce")) => env.reduced_motion,
            ("prefers-reduced-motion", Some("no-preference")) => !env.reduced_motion,
            ("width", Some(px)) => parse_px(px).is_some_and(|px| (width - px).abs() < f64::EPSILON),
            ("min-width", Some(px)) => parse_px(px).is_some_and(|px| width >= px),
            ("max-width", Some(px)) => parse_px(px).is_some_and(|px| width <= px),
            ("height", Some(px)) => {
                parse_px(px).is_some_and(|px| (height - px).abs() < f64::EPSILON)
            }
            ("min-height", Some(px)) => parse_px(px).is_some_and(|px| height >= px),
            ("max-height", Some(px)) => parse_px(px).is_some_and(|px| height <= px),
            ("orientation", Some("portrait")) => height >= width,
            ("orientation", Some("landscape")) => width > height,
            ("hover" | "color", None) => true,
            _ => false,
        }
    }
}
