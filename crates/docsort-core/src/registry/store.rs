//! Persisted template stores

use super::category::{Category, TemplateRecord};
use crate::error::{ClassifyError, Result};
use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Backing storage for category templates
///
/// Implementations answer from their current state on every call; nothing
/// above them caches.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Every readable category, in a stable order
    async fn list(&self) -> Result<Vec<Category>>;

    /// A single category, `None` when absent
    async fn get(&self, label: &str) -> Result<Option<Category>>;

    /// Insert or replace a category
    async fn put(&self, category: &Category) -> Result<()>;

    /// Delete a category, returning whether it existed
    async fn remove(&self, label: &str) -> Result<bool>;
}

/// One `<label>.json` file per category in a directory
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}.json", label))
    }

    async fn read_category(&self, label: &str, path: &Path) -> Result<Option<Category>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(path, e)),
        };
        let record: TemplateRecord = serde_json::from_slice(&bytes)
            .map_err(|e| ClassifyError::TemplateStore(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record.into_category(label)))
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn list(&self) -> Result<Vec<Category>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "Template directory missing, registry is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(store_error(&self.dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(label) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((label.to_string(), path));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut categories = Vec::with_capacity(files.len());
        for (label, path) in files {
            let category = match self.read_category(&label, &path).await {
                Ok(Some(category)) => category,
                // Removed between listing and reading
                Ok(None) => continue,
                Err(e) => {
                    warn!(label = %label, error = %e, "Skipping unreadable template");
                    continue;
                }
            };
            if let Err(e) = category.validate() {
                warn!(label = %label, error = %e, "Skipping invalid template");
                continue;
            }
            categories.push(category);
        }
        Ok(categories)
    }

    async fn get(&self, label: &str) -> Result<Option<Category>> {
        if !is_safe_file_stem(label) {
            return Ok(None);
        }
        let path = self.path_for(label);
        match self.read_category(label, &path).await? {
            Some(category) => {
                category.validate()?;
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, category: &Category) -> Result<()> {
        category.validate()?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| store_error(&self.dir, e))?;

        let json = serde_json::to_vec_pretty(&TemplateRecord::from(category))
            .map_err(|e| ClassifyError::TemplateStore(e.to_string()))?;

        // Scratch file is unique per call and has no `.json` suffix, so
        // concurrent writers never share it and `list` never sees it
        let path = self.path_for(&category.label);
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ClassifyError::TemplateStore(format!("template write task failed: {}", e)))?
        .map_err(|e| store_error(&path, e))?;

        debug!(label = %category.label, path = %path.display(), "Template saved");
        Ok(())
    }

    async fn remove(&self, label: &str) -> Result<bool> {
        if !is_safe_file_stem(label) {
            return Ok(false);
        }
        let path = self.path_for(label);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(label = %label, "Template removed");
                Ok(true)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_error(&path, e)),
        }
    }
}

/// In-memory store keeping insertion order
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    categories: RwLock<Vec<Category>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with categories, skipping validation
    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories: RwLock::new(categories),
        }
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }

    async fn get(&self, label: &str) -> Result<Option<Category>> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|c| c.label == label)
            .cloned())
    }

    async fn put(&self, category: &Category) -> Result<()> {
        category.validate()?;
        let mut categories = self.categories.write().await;
        match categories.iter_mut().find(|c| c.label == category.label) {
            Some(existing) => *existing = category.clone(),
            None => categories.push(category.clone()),
        }
        Ok(())
    }

    async fn remove(&self, label: &str) -> Result<bool> {
        let mut categories = self.categories.write().await;
        let before = categories.len();
        categories.retain(|c| c.label != label);
        Ok(categories.len() != before)
    }
}

fn is_safe_file_stem(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn store_error(path: &Path, err: std::io::Error) -> ClassifyError {
    ClassifyError::TemplateStore(format!("{}: {}", path.display(), err))
}
