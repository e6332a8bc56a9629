//! Result and strategy types shared by every classification path

use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel label for documents no strategy could resolve
pub const UNKNOWN_LABEL: &str = "unknown";

/// Classification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMethod {
    /// Registry keyword patterns over filename, then content
    Heuristic,
    /// Pre-trained model over filename and extracted text
    Statistical,
    /// Remote language model constrained to registry labels
    RemoteInference,
}

impl ClassificationMethod {
    pub const ALL: [ClassificationMethod; 3] = [
        ClassificationMethod::Heuristic,
        ClassificationMethod::Statistical,
        ClassificationMethod::RemoteInference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::Heuristic => "heuristic",
            ClassificationMethod::Statistical => "statistical",
            ClassificationMethod::RemoteInference => "remote-inference",
        }
    }

    /// Whether this strategy always needs extracted text
    pub fn requires_text(&self) -> bool {
        !matches!(self, ClassificationMethod::Heuristic)
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationMethod {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ClassifyError::UnknownMethod(s.to_string()))
    }
}

/// Outcome of one classification call
///
/// The shape is identical for every strategy. `confidence` is only populated
/// by the statistical strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: Option<f64>,
    pub method: ClassificationMethod,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, method: ClassificationMethod) -> Self {
        Self {
            label: label.into(),
            confidence: None,
            method,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}
