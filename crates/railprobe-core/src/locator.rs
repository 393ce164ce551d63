//! Typed locator candidates.
//!
//! A candidate describes one way of finding a UI target. Lists of candidates
//! are ordered from semantically stable (`name`, `aria-label`) to fragile
//! (position, free text).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    Css,
    Text,
    Attribute,
    Positional,
}

impl LocatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorKind::Css => "css",
            LocatorKind::Text => "text",
            LocatorKind::Attribute => "attribute",
            LocatorKind::Positional => "positional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrMatch {
    #[default]
    Equals,
    Contains,
    Prefix,
}

impl AttrMatch {
    fn operator(&self) -> &'static str {
        match self {
            AttrMatch::Equals => "=",
            AttrMatch::Contains => "*=",
            AttrMatch::Prefix => "^=",
        }
    }
}

/// In YAML a candidate is a single-key map (`- css: "#id"`); fields holding
/// candidates go through `serde_yaml::with::singleton_map_recursive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorCandidate {
    /// Plain CSS selector.
    Css(String),

    /// Element whose normalised text contains `text` (case-insensitive),
    /// or equals it when `exact` is set. Without a scope the innermost
    /// matching element wins.
    Text {
        text: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        exact: bool,
    },

    /// Attribute match, optionally restricted to a tag.
    Attribute {
        #[serde(default)]
        tag: Option<String>,
        name: String,
        #[serde(default)]
        op: AttrMatch,
        value: String,
    },

    /// The `index`-th visible element matching `selector`.
    Positional { selector: String, index: usize },
}

impl LocatorCandidate {
    pub fn css(selector: impl Into<String>) -> Self {
        LocatorCandidate::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        LocatorCandidate::Text {
            text: text.into(),
            scope: None,
            exact: false,
        }
    }

    pub fn text_in(scope: impl Into<String>, text: impl Into<String>) -> Self {
        LocatorCandidate::Text {
            text: text.into(),
            scope: Some(scope.into()),
            exact: false,
        }
    }

    pub fn attr(
        tag: Option<&str>,
        name: impl Into<String>,
        op: AttrMatch,
        value: impl Into<String>,
    ) -> Self {
        LocatorCandidate::Attribute {
            tag: tag.map(str::to_string),
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        LocatorCandidate::Positional {
            selector: selector.into(),
            index,
        }
    }

    pub fn kind(&self) -> LocatorKind {
        match self {
            LocatorCandidate::Css(_) => LocatorKind::Css,
            LocatorCandidate::Text { .. } => LocatorKind::Text,
            LocatorCandidate::Attribute { .. } => LocatorKind::Attribute,
            LocatorCandidate::Positional { .. } => LocatorKind::Positional,
        }
    }

    /// CSS form of the candidate, for kinds that have one.
    pub fn to_css(&self) -> Option<String> {
        match self {
            LocatorCandidate::Css(selector) => Some(selector.clone()),
            LocatorCandidate::Attribute {
                tag,
                name,
                op,
                value,
            } => Some(format!(
                "{}[{}{}'{}']",
                tag.as_deref().unwrap_or(""),
                name,
                op.operator(),
                escape_css_string(value)
            )),
            LocatorCandidate::Positional { selector, .. } => Some(selector.clone()),
            LocatorCandidate::Text { .. } => None,
        }
    }
}

impl fmt::Display for LocatorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorCandidate::Css(selector) => write!(f, "{}", selector),
            LocatorCandidate::Text { text, scope, exact } => {
                let quoted = if *exact {
                    format!("\"{}\"", text)
                } else {
                    format!("'{}'", text)
                };
                match scope {
                    Some(scope) => write!(f, "{}:has-text({})", scope, quoted),
                    None => write!(f, "text={}", quoted),
                }
            }
            LocatorCandidate::Attribute { .. } => {
                write!(f, "{}", self.to_css().unwrap_or_default())
            }
            LocatorCandidate::Positional { selector, index } => {
                write!(f, "{} >> visible >> nth={}", selector, index)
            }
        }
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
