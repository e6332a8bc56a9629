//! Pre-trained model artifacts
//!
//! The training pipeline lives outside this crate. It exports a TF-IDF
//! vectorizer and a logistic regression as one JSON document:
//!
//! ```json
//! {
//!   "classes": ["bank_statement", "invoice"],
//!   "vocabulary": {"balance": 0, "invoice": 1},
//!   "idf": [1.69, 1.40],
//!   "coefficients": [[2.1, -0.7]],
//!   "intercepts": [0.05],
//!   "input_layout": "text"
//! }
//! ```
//!
//! A binary model may carry a single coefficient row, scoring the second class.

use crate::error::{ClassifyError, Result};
use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Filename and extracted text as seen by a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInput {
    /// Lowercased, extension stripped, separators replaced by single spaces
    pub filename: String,
    pub text: String,
}

impl FeatureInput {
    pub fn new(filename: &str, text: &str) -> Self {
        Self {
            filename: normalize_filename(filename),
            text: text.to_string(),
        }
    }
}

fn normalize_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    };
    stem.to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A loaded, read-only classification model
///
/// Shared across concurrent calls; implementations must not mutate state in
/// [`ModelHandle::predict_proba`].
pub trait ModelHandle: Send + Sync {
    /// Class labels, in the order of the probability vector
    fn classes(&self) -> &[String];

    /// Probability of each class for the given input
    fn predict_proba(&self, input: &FeatureInput) -> Result<Vec<f64>>;
}

/// Which parts of a [`FeatureInput`] the model was trained on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLayout {
    #[default]
    Text,
    FilenameAndText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    #[serde(default)]
    input_layout: InputLayout,
}

/// TF-IDF features scored by a logistic regression
#[derive(Debug, Clone)]
pub struct TfidfLogisticModel {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
    input_layout: InputLayout,
}

impl TfidfLogisticModel {
    /// Load a model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ClassifyError::ModelUnavailable(format!("reading {}: {}", path.display(), e))
        })?;
        let model = Self::from_json(&bytes)?;
        info!(
            path = %path.display(),
            classes = model.classes.len(),
            vocabulary = model.vocabulary.len(),
            "Model loaded"
        );
        Ok(Arc::new(model))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| ClassifyError::ModelUnavailable(format!("invalid model artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let unavailable = |msg: String| ClassifyError::ModelUnavailable(msg);
        let n_classes = artifact.classes.len();
        let n_features = artifact.idf.len();

        if n_classes < 2 {
            return Err(unavailable(format!("model needs at least 2 classes, has {}", n_classes)));
        }
        if let Some((term, idx)) = artifact.vocabulary.iter().find(|(_, idx)| **idx >= n_features) {
            return Err(unavailable(format!(
                "vocabulary term {:?} maps to column {} but idf has {} entries",
                term, idx, n_features
            )));
        }

        let n_rows = artifact.coefficients.len();
        let expected_rows = if n_classes == 2 { [1, 2] } else { [n_classes, n_classes] };
        if !expected_rows.contains(&n_rows) {
            return Err(unavailable(format!(
                "{} coefficient rows for {} classes",
                n_rows, n_classes
            )));
        }
        if artifact.intercepts.len() != n_rows {
            return Err(unavailable(format!(
                "{} intercepts for {} coefficient rows",
                artifact.intercepts.len(),
                n_rows
            )));
        }
        if let Some(row) = artifact.coefficients.iter().find(|row| row.len() != n_features) {
            return Err(unavailable(format!(
                "coefficient row has {} columns, expected {}",
                row.len(),
                n_features
            )));
        }

        let flat: Vec<f64> = artifact.coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((n_rows, n_features), flat)
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(Self {
            classes: artifact.classes,
            vocabulary: artifact.vocabulary,
            idf: Array1::from(artifact.idf),
            coefficients,
            intercepts: Array1::from(artifact.intercepts),
            input_layout: artifact.input_layout,
        })
    }

    pub fn input_layout(&self) -> InputLayout {
        self.input_layout
    }

    /// L2-normalized TF-IDF vector of a document
    fn vectorize(&self, document: &str) -> Array1<f64> {
        let mut features = Array1::<f64>::zeros(self.idf.len());
        let lowered = document.to_lowercase();
        for token in TOKEN_RE.find_iter(&lowered) {
            if let Some(&idx) = self.vocabulary.get(token.as_str()) {
                features[idx] += 1.0;
            }
        }
        features *= &self.idf;

        let norm = features.dot(&features).sqrt();
        if norm > 0.0 {
            features /= norm;
        }
        features
    }

    fn document_for(&self, input: &FeatureInput) -> String {
        match self.input_layout {
            InputLayout::Text => input.text.clone(),
            InputLayout::FilenameAndText => format!("{} {}", input.filename, input.text),
        }
    }
}

impl ModelHandle for TfidfLogisticModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, input: &FeatureInput) -> Result<Vec<f64>> {
        let features = self.vectorize(&self.document_for(input));
        let scores = self.coefficients.dot(&features) + &self.intercepts;

        if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }
        Ok(softmax(scores.as_slice().unwrap_or(&[])))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
