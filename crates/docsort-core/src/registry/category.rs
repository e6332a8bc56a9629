//! Category templates: field schema, layout and keyword patterns

use crate::error::{ClassifyError, Result};
use crate::types::UNKNOWN_LABEL;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid label regex"));

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid key regex"));

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid placeholder regex"));

/// One field of a category's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Human-readable name shown in layouts
    #[serde(rename = "label", alias = "displayName")]
    pub display_name: String,
    /// Identifier used as the layout placeholder
    pub key: String,
}

impl Field {
    pub fn new(display_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            key: key.into(),
        }
    }

    /// Build a field from a free-form name such as `"Employee ID"`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self {
            display_name: title_case(&name.replace('_', " ")),
            key: name.to_lowercase().replace(' ', "_"),
        }
    }
}

/// Tokens that must all occur, case-insensitively, for a pattern to match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordPattern(Vec<String>);

impl KeywordPattern {
    /// Tokens are lowercased; blank tokens are dropped
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Split a space-separated pattern like `"bank statement"`
    pub fn parse(pattern: &str) -> Self {
        Self::new(pattern.split_whitespace())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `haystack` must already be lowercase
    pub fn matches_lowercase(&self, haystack: &str) -> bool {
        !self.0.is_empty() && self.0.iter().all(|token| haystack.contains(token.as_str()))
    }
}

/// A document category as persisted in the template store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub fields: Vec<Field>,
    pub layout: String,
    pub patterns: Vec<KeywordPattern>,
}

impl Category {
    /// Build a category with the given fields and a generated layout
    pub fn new(label: impl Into<String>, fields: Vec<Field>) -> Self {
        let layout = fields
            .iter()
            .map(|f| format!("{}: {{{}}}", f.display_name, f.key))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            label: label.into(),
            fields,
            layout,
            patterns: Vec::new(),
        }
    }

    /// Build a category from free-form field names, normalizing the label and keys
    pub fn from_field_names<I, S>(label: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .filter(|n| !n.as_ref().trim().is_empty())
            .map(|n| Field::from_name(n.as_ref()))
            .collect();
        Self::new(label.trim().to_lowercase(), fields)
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn with_pattern(mut self, pattern: KeywordPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Declared patterns, or the label's `_`-separated tokens when none are declared
    pub fn effective_patterns(&self) -> Vec<KeywordPattern> {
        let declared: Vec<KeywordPattern> = self
            .patterns
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        if declared.is_empty() {
            vec![default_pattern(&self.label)]
        } else {
            declared
        }
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Check the label, the field keys and the layout placeholders
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ClassifyError::InvalidCategory(msg));

        if !LABEL_RE.is_match(&self.label) {
            return invalid(format!(
                "label {:?} must be lowercase letters, digits and underscores, starting with a letter",
                self.label
            ));
        }
        if self.label == UNKNOWN_LABEL {
            return invalid(format!("label {:?} is reserved", UNKNOWN_LABEL));
        }
        if self.fields.is_empty() {
            return invalid(format!("{}: at least one field is required", self.label));
        }

        let mut keys = HashSet::new();
        for field in &self.fields {
            if !KEY_RE.is_match(&field.key) {
                return invalid(format!("{}: field key {:?} is not identifier-safe", self.label, field.key));
            }
            if !keys.insert(field.key.as_str()) {
                return invalid(format!("{}: duplicate field key {:?}", self.label, field.key));
            }
        }

        let placeholders: Vec<&str> = PLACEHOLDER_RE
            .captures_iter(&self.layout)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        for key in &keys {
            let count = placeholders.iter().filter(|p| *p == key).count();
            if count != 1 {
                return invalid(format!(
                    "{}: layout must contain {{{}}} exactly once, found {}",
                    self.label, key, count
                ));
            }
        }
        if let Some(stray) = placeholders.iter().find(|p| !keys.contains(*p)) {
            return invalid(format!("{}: layout placeholder {{{}}} has no field", self.label, stray));
        }

        Ok(())
    }
}

/// On-disk template record; the label comes from the file name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub fields: Vec<Field>,
    pub layout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<KeywordPattern>,
}

impl TemplateRecord {
    pub fn into_category(self, label: impl Into<String>) -> Category {
        Category {
            label: label.into(),
            fields: self.fields,
            layout: self.layout,
            patterns: self
                .patterns
                .into_iter()
                .map(|p| KeywordPattern::new(p.0))
                .collect(),
        }
    }
}

impl From<&Category> for TemplateRecord {
    fn from(category: &Category) -> Self {
        Self {
            fields: category.fields.clone(),
            layout: category.layout.clone(),
            patterns: category.patterns.clone(),
        }
    }
}

fn default_pattern(label: &str) -> KeywordPattern {
    KeywordPattern::new(label.split('_'))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
