//! # docsort-core
//!
//! Assigns a category label to a document with one of three interchangeable
//! strategies:
//!
//! - **heuristic**: registry keyword patterns over the filename, then the
//!   extracted text
//! - **statistical**: a pre-trained TF-IDF + logistic regression model, with
//!   a confidence score
//! - **remote-inference**: an OpenAI-compatible chat model, constrained to the
//!   registry's labels
//!
//! Every strategy returns the same [`ClassificationResult`]. Labels from the
//! heuristic and remote strategies are always registry labels or
//! [`UNKNOWN_LABEL`]. The statistical strategy answers from its own training
//! classes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docsort_core::{CategoryRegistry, Classifier, Document};
//!
//! # async fn run() -> docsort_core::Result<()> {
//! let registry = CategoryRegistry::from_dir("templates");
//! registry.register_fields("invoice", ["Invoice Number", "Total"]).await?;
//!
//! let classifier = Classifier::builder().registry(registry).build()?;
//! let bytes = std::fs::read("invoice_2024.pdf").unwrap_or_default();
//! let result = classifier
//!     .classify(Document::new("invoice_2024.pdf", bytes), "heuristic")
//!     .await?;
//! assert_eq!(result.label, "invoice");
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod model;
pub mod registry;
pub mod remote;
pub mod statistical;
pub mod types;

pub use batch::{Accuracy, BatchClassifier, BatchItem, BatchReport};
pub use config::{BatchConfig, DocsortConfig, RemoteConfig};
pub use dispatcher::{Classifier, ClassifierBuilder};
pub use error::{ClassifyError, ErrorKind, Result};
pub use model::{FeatureInput, InputLayout, ModelHandle, TfidfLogisticModel};
pub use registry::{
    Category, CategoryRegistry, Field, FsTemplateStore, KeywordPattern, MemoryTemplateStore,
    TemplateStore,
};
pub use remote::RemoteInferenceAdapter;
pub use statistical::StatisticalModelAdapter;
pub use types::{ClassificationMethod, ClassificationResult, UNKNOWN_LABEL};

pub use docsort_extract::{Document, DocumentFormat, ExtractorConfig, TextExtractor};
