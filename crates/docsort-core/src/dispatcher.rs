//! Classification entry point

use crate::config::{DocsortConfig, RemoteConfig};
use crate::error::{ClassifyError, Result};
use crate::matcher;
use crate::model::{ModelHandle, TfidfLogisticModel};
use crate::registry::CategoryRegistry;
use crate::remote::RemoteInferenceAdapter;
use crate::statistical::StatisticalModelAdapter;
use crate::types::{ClassificationMethod, ClassificationResult, UNKNOWN_LABEL};
use docsort_extract::{Document, TextExtractor};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Dispatches a document to one of the classification strategies
///
/// Safe to share across tasks: the registry is read fresh per call and the
/// model handle is read-only.
pub struct Classifier {
    registry: CategoryRegistry,
    extractor: Arc<TextExtractor>,
    statistical: StatisticalModelAdapter,
    remote: RemoteInferenceAdapter,
}

impl Classifier {
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    /// Wire every component from configuration
    ///
    /// A missing or unreadable model file leaves the statistical strategy
    /// unavailable rather than failing construction.
    pub fn from_config(config: &DocsortConfig) -> Result<Self> {
        let model: Option<Arc<dyn ModelHandle>> = if config.model_path.exists() {
            match TfidfLogisticModel::load(&config.model_path) {
                Ok(model) => Some(model as Arc<dyn ModelHandle>),
                Err(e) => {
                    warn!(path = %config.model_path.display(), error = %e, "Statistical model not loaded");
                    None
                }
            }
        } else {
            debug!(path = %config.model_path.display(), "No statistical model file");
            None
        };

        ClassifierBuilder::new()
            .registry(CategoryRegistry::from_dir(&config.templates_dir))
            .extractor(TextExtractor::new(config.extractor.clone()))
            .model_handle(model)
            .remote(config.remote.clone())
            .build()
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub fn statistical(&self) -> &StatisticalModelAdapter {
        &self.statistical
    }

    pub fn remote(&self) -> &RemoteInferenceAdapter {
        &self.remote
    }

    /// Classify with a strategy named by string
    ///
    /// The name is checked before any extraction happens.
    pub async fn classify(&self, document: Document, method: &str) -> Result<ClassificationResult> {
        let method: ClassificationMethod = method.parse()?;
        self.classify_with(document, method).await
    }

    /// Classify with a known strategy
    pub async fn classify_with(
        &self,
        document: Document,
        method: ClassificationMethod,
    ) -> Result<ClassificationResult> {
        let filename = document.filename().to_string();
        let started = Instant::now();
        debug!(filename = %filename, method = %method, "Classifying document");

        let result = match method {
            ClassificationMethod::Heuristic => self.run_heuristic(document).await,
            ClassificationMethod::Statistical => self.run_statistical(document).await,
            ClassificationMethod::RemoteInference => self.run_remote(document).await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(res) => info!(
                filename = %filename,
                method = %method,
                label = %res.label,
                elapsed_ms,
                "Document classified"
            ),
            Err(e) => warn!(
                filename = %filename,
                method = %method,
                kind = %e.kind(),
                elapsed_ms,
                "Classification failed"
            ),
        }
        result
    }

    async fn run_heuristic(&self, document: Document) -> Result<ClassificationResult> {
        let categories = self.registry.categories().await?;
        let label = match matcher::match_text(document.filename(), &categories) {
            Some(label) => label.to_string(),
            None => {
                let text = self.extract(document).await?;
                matcher::match_text(&text, &categories)
                    .unwrap_or(UNKNOWN_LABEL)
                    .to_string()
            }
        };
        Ok(ClassificationResult::new(label, ClassificationMethod::Heuristic))
    }

    async fn run_statistical(&self, document: Document) -> Result<ClassificationResult> {
        if !self.statistical.is_available() {
            return Err(ClassifyError::ModelUnavailable(
                "no statistical model is loaded".to_string(),
            ));
        }
        let filename = document.filename().to_string();
        let text = self.extract(document).await?;
        self.statistical.classify(&filename, &text)
    }

    async fn run_remote(&self, document: Document) -> Result<ClassificationResult> {
        self.remote.credentials()?;
        let text = self.extract(document).await?;
        let labels = self.registry.list_labels().await?;
        self.remote.classify(&text, &labels).await
    }

    /// Run extraction on the blocking pool
    async fn extract(&self, document: Document) -> Result<String> {
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|e| ClassifyError::ExtractionFailure(format!("extraction task failed: {}", e)))??;
        Ok(text)
    }
}

/// Builder for [`Classifier`]
pub struct ClassifierBuilder {
    registry: Option<CategoryRegistry>,
    extractor: Option<Arc<TextExtractor>>,
    model: Option<Arc<dyn ModelHandle>>,
    remote: RemoteConfig,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            extractor: None,
            model: None,
            remote: RemoteConfig::default(),
        }
    }

    pub fn registry(mut self, registry: CategoryRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    pub fn shared_extractor(mut self, extractor: Arc<TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn model(mut self, model: Arc<dyn ModelHandle>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn model_handle(mut self, model: Option<Arc<dyn ModelHandle>>) -> Self {
        self.model = model;
        self
    }

    pub fn remote(mut self, config: RemoteConfig) -> Self {
        self.remote = config;
        self
    }

    pub fn build(self) -> Result<Classifier> {
        Ok(Classifier {
            registry: self
                .registry
                .unwrap_or_else(|| CategoryRegistry::in_memory(Vec::new())),
            extractor: self.extractor.unwrap_or_default(),
            statistical: StatisticalModelAdapter::new(self.model),
            remote: RemoteInferenceAdapter::new(self.remote)?,
        })
    }
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Category, KeywordPattern};
    use crate::ErrorKind;

    fn classifier() -> Classifier {
        Classifier::builder()
            .registry(CategoryRegistry::in_memory(vec![
                Category::from_field_names("invoice", ["Total"])
                    .with_pattern(KeywordPattern::parse("invoice")),
            ]))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_method_before_extraction() {
        // Unsupported bytes would fail extraction; the selector check comes first
        let doc = Document::new("notes.txt", b"garbage".to_vec());
        let err = classifier().classify(doc, "bogus-strategy").await.unwrap_err();
        assert!(matches!(err, ClassifyError::UnknownMethod(ref m) if m == "bogus-strategy"));
    }

    #[tokio::test]
    async fn test_heuristic_filename_skips_extraction() {
        // Not a valid PDF: matching by filename must not touch the bytes
        let doc = Document::new("invoice_2024.pdf", b"not really a pdf".to_vec());
        let result = classifier().classify(doc, "heuristic").await.unwrap();
        assert_eq!(result.label, "invoice");
        assert_eq!(result.confidence, None);
        assert_eq!(result.method, ClassificationMethod::Heuristic);
    }

    #[tokio::test]
    async fn test_heuristic_extraction_failure_propagates() {
        let doc = Document::new("scan_001.pdf", b"not really a pdf".to_vec());
        let err = classifier().classify(doc, "heuristic").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);

        let doc = Document::new("scan_001.txt", b"invoice".to_vec());
        let err = classifier().classify(doc, "heuristic").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[tokio::test]
    async fn test_statistical_without_model() {
        let doc = Document::new("invoice.txt", b"invoice".to_vec());
        let err = classifier().classify(doc, "statistical").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_remote_without_key() {
        let doc = Document::new("invoice.txt", b"invoice".to_vec());
        let err = classifier().classify(doc, "remote-inference").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[tokio::test]
    async fn test_remote_without_endpoint_before_extraction() {
        let classifier = Classifier::builder()
            .remote(
                RemoteConfig::default()
                    .with_api_key("test-key")
                    .with_api_base(""),
            )
            .build()
            .unwrap();
        let doc = Document::new("invoice.txt", b"invoice".to_vec());
        let err = classifier.classify(doc, "remote-inference").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_from_config_without_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocsortConfig {
            templates_dir: dir.path().join("templates"),
            model_path: dir.path().join("model.json"),
            ..DocsortConfig::default()
        };
        let classifier = Classifier::from_config(&config).unwrap();
        assert!(!classifier.statistical().is_available());
    }

    #[test]
    fn test_from_config_with_broken_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        std::fs::write(&model_path, "{}").unwrap();
        let config = DocsortConfig {
            templates_dir: dir.path().join("templates"),
            model_path,
            ..DocsortConfig::default()
        };
        let classifier = Classifier::from_config(&config).unwrap();
        assert!(!classifier.statistical().is_available());
    }
}
