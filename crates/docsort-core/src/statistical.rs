//! Statistical strategy over a pre-trained model

use crate::error::{ClassifyError, Result};
use crate::model::{FeatureInput, ModelHandle};
use crate::types::{ClassificationMethod, ClassificationResult};
use std::sync::Arc;
use tracing::debug;

/// Classifies with an injected model handle
///
/// Labels come from the model's own class list, fixed at training time. They
/// may lag behind the live registry and are returned as-is; use
/// [`StatisticalModelAdapter::label_space`] to reconcile out of band.
#[derive(Clone, Default)]
pub struct StatisticalModelAdapter {
    model: Option<Arc<dyn ModelHandle>>,
}

impl StatisticalModelAdapter {
    pub fn new(model: Option<Arc<dyn ModelHandle>>) -> Self {
        Self { model }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Classes the loaded model can return
    pub fn label_space(&self) -> Option<&[String]> {
        self.model.as_deref().map(|m| m.classes())
    }

    pub fn classify(&self, filename: &str, text: &str) -> Result<ClassificationResult> {
        let model = self.model.as_ref().ok_or_else(|| {
            ClassifyError::ModelUnavailable("no statistical model is loaded".to_string())
        })?;

        let input = FeatureInput::new(filename, text);
        let probs = model.predict_proba(&input)?;
        let classes = model.classes();

        if probs.len() != classes.len() {
            return Err(ClassifyError::Prediction(format!(
                "model returned {} probabilities for {} classes",
                probs.len(),
                classes.len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(ClassifyError::Prediction(
                "model returned a non-finite probability".to_string(),
            ));
        }

        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                Some((_, top)) if top >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| ClassifyError::Prediction("model has no classes".to_string()))?;

        let label = classes[best].clone();
        debug!(label = %label, confidence, "Statistical prediction");
        Ok(ClassificationResult::new(label, ClassificationMethod::Statistical)
            .with_confidence(confidence.clamp(0.0, 1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel {
        classes: Vec<String>,
        probs: Vec<f64>,
    }

    impl FixedModel {
        fn handle(classes: &[&str], probs: &[f64]) -> Arc<dyn ModelHandle> {
            Arc::new(Self {
                classes: classes.iter().map(|c| c.to_string()).collect(),
                probs: probs.to_vec(),
            })
        }
    }

    impl ModelHandle for FixedModel {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, _input: &FeatureInput) -> Result<Vec<f64>> {
            Ok(self.probs.clone())
        }
    }

    #[test]
    fn test_missing_model() {
        let adapter = StatisticalModelAdapter::new(None);
        assert!(!adapter.is_available());
        assert!(adapter.label_space().is_none());
        let err = adapter.classify("invoice.pdf", "Invoice").unwrap_err();
        assert!(matches!(err, ClassifyError::ModelUnavailable(_)));
    }

    #[test]
    fn test_argmax_and_confidence() {
        let adapter = StatisticalModelAdapter::new(Some(FixedModel::handle(
            &["bank_statement", "invoice", "payslip"],
            &[0.2, 0.7, 0.1],
        )));
        let result = adapter.classify("a.pdf", "text").unwrap();
        assert_eq!(result.label, "invoice");
        assert_eq!(result.confidence, Some(0.7));
        assert_eq!(result.method, ClassificationMethod::Statistical);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let adapter = StatisticalModelAdapter::new(Some(FixedModel::handle(
            &["a", "b", "c"],
            &[0.25, 0.375, 0.375],
        )));
        assert_eq!(adapter.classify("x.pdf", "").unwrap().label, "b");
    }

    #[test]
    fn test_confidence_clamped() {
        let adapter =
            StatisticalModelAdapter::new(Some(FixedModel::handle(&["a", "b"], &[1.0000001, 0.0])));
        assert_eq!(adapter.classify("x.pdf", "").unwrap().confidence, Some(1.0));
    }

    #[test]
    fn test_malformed_distribution() {
        let wrong_len =
            StatisticalModelAdapter::new(Some(FixedModel::handle(&["a", "b"], &[1.0])));
        let nan = StatisticalModelAdapter::new(Some(FixedModel::handle(&["a", "b"], &[f64::NAN, 0.5])));
        for adapter in [wrong_len, nan] {
            let err = adapter.classify("x.pdf", "").unwrap_err();
            assert!(matches!(err, ClassifyError::Prediction(_)));
        }
    }

    #[test]
    fn test_label_space_may_differ_from_registry() {
        let adapter =
            StatisticalModelAdapter::new(Some(FixedModel::handle(&["retired_label"], &[1.0])));
        assert_eq!(adapter.label_space().unwrap(), ["retired_label".to_string()]);
        assert_eq!(adapter.classify("x.pdf", "").unwrap().label, "retired_label");
    }
}
