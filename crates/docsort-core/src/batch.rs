//! Batch classification with pacing for remote inference

use crate::config::BatchConfig;
use crate::dispatcher::Classifier;
use crate::error::Result;
use crate::types::{ClassificationMethod, ClassificationResult};
use docsort_extract::Document;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome for one document of a batch
#[derive(Debug)]
pub struct BatchItem {
    pub filename: String,
    pub result: Result<ClassificationResult>,
}

/// Results of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

/// Label agreement against a known answer key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accuracy {
    /// Documents with an expected label
    pub total: usize,
    pub correct: usize,
    /// Documents whose classification failed
    pub errors: usize,
}

impl Accuracy {
    /// Fraction of labeled documents classified correctly, `None` when nothing was labeled
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ClassificationResult)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().ok().map(|r| (item.filename.as_str(), r)))
    }

    /// Compare against `expected` (filename to label); unlisted files are ignored
    pub fn accuracy(&self, expected: &HashMap<String, String>) -> Accuracy {
        let mut accuracy = Accuracy::default();
        for item in &self.items {
            let Some(want) = expected.get(&item.filename) else {
                continue;
            };
            accuracy.total += 1;
            match &item.result {
                Ok(result) if &result.label == want => accuracy.correct += 1,
                Ok(_) => {}
                Err(_) => accuracy.errors += 1,
            }
        }
        accuracy
    }
}

/// Classifies many documents in chunks
///
/// Documents run one after another. With remote inference, a fixed delay is
/// inserted between chunks to stay under the endpoint's rate limits.
pub struct BatchClassifier {
    classifier: Arc<Classifier>,
    config: BatchConfig,
}

impl BatchClassifier {
    pub fn new(classifier: Arc<Classifier>, config: BatchConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub async fn classify_all(
        &self,
        documents: Vec<Document>,
        method: ClassificationMethod,
    ) -> BatchReport {
        let batch_size = self.config.batch_size.max(1);
        let paced = method == ClassificationMethod::RemoteInference;
        let mut report = BatchReport {
            items: Vec::with_capacity(documents.len()),
        };

        for (i, document) in documents.into_iter().enumerate() {
            if paced && i > 0 && i % batch_size == 0 {
                let delay = self.config.remote_batch_delay();
                debug!(delay_ms = delay.as_millis() as u64, done = i, "Pausing between batches");
                tokio::time::sleep(delay).await;
            }
            let filename = document.filename().to_string();
            let result = self.classifier.classify_with(document, method).await;
            report.items.push(BatchItem { filename, result });
        }

        let failed = report.items.iter().filter(|i| i.result.is_err()).count();
        info!(
            method = %method,
            documents = report.len(),
            failed,
            "Batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifyError;

    fn item(filename: &str, label: Option<&str>) -> BatchItem {
        BatchItem {
            filename: filename.to_string(),
            result: match label {
                Some(label) => Ok(ClassificationResult::new(label, ClassificationMethod::Heuristic)),
                None => Err(ClassifyError::UnsupportedFormat("txt".into())),
            },
        }
    }

    #[test]
    fn test_accuracy() {
        let report = BatchReport {
            items: vec![
                item("a.pdf", Some("invoice")),
                item("b.pdf", Some("unknown")),
                item("c.txt", None),
                item("d.pdf", Some("invoice")),
            ],
        };
        let expected: HashMap<String, String> = [
            ("a.pdf", "invoice"),
            ("b.pdf", "bank_statement"),
            ("c.txt", "invoice"),
        ]
        .into_iter()
        .map(|(f, l)| (f.to_string(), l.to_string()))
        .collect();

        let accuracy = report.accuracy(&expected);
        assert_eq!(
            accuracy,
            Accuracy {
                total: 3,
                correct: 1,
                errors: 1
            }
        );
        assert!((accuracy.ratio().unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.succeeded().count(), 3);
    }

    #[test]
    fn test_empty_accuracy() {
        assert_eq!(BatchReport::default().accuracy(&HashMap::new()).ratio(), None);
    }
}
