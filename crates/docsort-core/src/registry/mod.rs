//! Category registry
//!
//! The registry is the single source of truth for valid output labels. It is
//! a thin view over a [`TemplateStore`] and keeps no copy of its own: every
//! query reads the store, so templates added or removed by an operator are
//! seen by the next classification call without a restart.
//!
//! Reads take no lock across calls. A template change racing with an
//! in-flight classification may be observed either before or after the
//! change.

mod category;
mod store;

pub use category::{Category, Field, KeywordPattern, TemplateRecord};
pub use store::{FsTemplateStore, MemoryTemplateStore, TemplateStore};

use crate::error::{ClassifyError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Registry of document categories backed by a template store
#[derive(Clone)]
pub struct CategoryRegistry {
    store: Arc<dyn TemplateStore>,
}

impl std::fmt::Debug for CategoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryRegistry").finish_non_exhaustive()
    }
}

impl CategoryRegistry {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Registry over a template directory
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsTemplateStore::new(dir)))
    }

    /// Registry over an in-memory store
    pub fn in_memory(categories: Vec<Category>) -> Self {
        Self::new(Arc::new(MemoryTemplateStore::with_categories(categories)))
    }

    /// Ordered snapshot of every category
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.store.list().await
    }

    /// Every current label, in registry order
    pub async fn list_labels(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .map(|c| c.label)
            .collect())
    }

    /// `Ok(None)` when no category has this label
    pub async fn get_category(&self, label: &str) -> Result<Option<Category>> {
        self.store.get(label).await
    }

    pub async fn contains(&self, label: &str) -> Result<bool> {
        Ok(self.store.get(label).await?.is_some())
    }

    /// Validate and persist a category, replacing any existing one with the same label
    pub async fn register(&self, category: Category) -> Result<()> {
        category.validate()?;
        self.store.put(&category).await?;
        info!(label = %category.label, fields = category.fields.len(), "Category registered");
        Ok(())
    }

    /// Register a category from free-form field names
    pub async fn register_fields<I, S>(&self, label: &str, names: I) -> Result<Category>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let category = Category::from_field_names(label, names);
        self.register(category.clone()).await?;
        Ok(category)
    }

    /// Remove a category; fails with `InvalidCategory` when it does not exist
    pub async fn remove(&self, label: &str) -> Result<()> {
        if self.store.remove(label).await? {
            info!(label = %label, "Category removed");
            Ok(())
        } else {
            Err(ClassifyError::InvalidCategory(format!("no category named {:?}", label)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_register_and_get_preserves_field_order() {
        let registry = CategoryRegistry::in_memory(Vec::new());
        registry
            .register_fields("payslip", ["Name", "Employee ID", "Amount", "Date"])
            .await
            .unwrap();

        let category = registry.get_category("payslip").await.unwrap().unwrap();
        let keys: Vec<&str> = category.field_keys().collect();
        assert_eq!(keys, vec!["name", "employee_id", "amount", "date"]);
        for key in keys {
            assert_eq!(category.layout.matches(&format!("{{{}}}", key)).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_absent_label_is_not_found() {
        let registry = CategoryRegistry::in_memory(Vec::new());
        assert_eq!(registry.get_category("unknown").await.unwrap(), None);
        assert!(!registry.contains("invoice").await.unwrap());

        let err = registry.remove("invoice").await.unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidCategory(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_reserved_label() {
        let registry = CategoryRegistry::in_memory(Vec::new());
        let err = registry.register_fields("Unknown", ["Name"]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidCategory(_)));
        assert!(registry.list_labels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_changes_visible_without_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let registry = CategoryRegistry::from_dir(dir.path());
        let other_handle = CategoryRegistry::from_dir(dir.path());

        registry.register_fields("invoice", ["Total"]).await.unwrap();
        assert_eq!(other_handle.list_labels().await.unwrap(), vec!["invoice"]);

        registry.remove("invoice").await.unwrap();
        assert!(other_handle.list_labels().await.unwrap().is_empty());
    }
}
