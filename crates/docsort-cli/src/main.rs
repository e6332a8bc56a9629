//! `docsort`: classify documents and manage category templates
//!
//! ```text
//! docsort classify invoice_2024.pdf scans/*.jpg --method heuristic
//! docsort category add --label payslip --fields "Name,Employee ID,Net Pay" --pattern "net pay"
//! docsort category list
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docsort_core::{
    config::default_config_path, BatchClassifier, BatchItem, Category, CategoryRegistry,
    ClassificationMethod, Classifier, ClassifyError, DocsortConfig, Document, KeywordPattern,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "docsort")]
#[command(about = "Classify documents by filename, content, model or remote inference")]
struct Args {
    /// Config file (defaults to ~/.docsort/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify files, printing one JSON object per line
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// heuristic, statistical or remote-inference
        #[arg(short, long, default_value = "heuristic")]
        method: String,
    },

    /// Manage category templates
    #[command(subcommand)]
    Category(CategoryCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Create or replace a category template
    Add {
        /// Category label, e.g. payslip
        #[arg(short, long)]
        label: String,

        /// Comma-separated field names, e.g. "Name,Employee ID,Amount"
        #[arg(short, long)]
        fields: String,

        /// Keyword pattern whose space-separated tokens must all appear; repeatable
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,
    },

    /// List category labels
    List,

    /// Print one category template
    Show { label: String },

    /// Delete a category template
    Remove { label: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = DocsortConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?
        .apply_env();
    debug!(config = ?config, "Configuration loaded");

    match args.command {
        Command::Classify { files, method } => classify(&config, &files, &method).await,
        Command::Category(command) => {
            let registry = CategoryRegistry::from_dir(&config.templates_dir);
            category(&registry, command).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn classify(config: &DocsortConfig, files: &[PathBuf], method: &str) -> Result<ExitCode> {
    let method: ClassificationMethod = method.parse()?;
    let classifier = Arc::new(Classifier::from_config(config)?);
    let batch = BatchClassifier::new(classifier, config.batch.clone());

    let mut documents = Vec::with_capacity(files.len());
    let mut failed = false;
    for path in files {
        match tokio::fs::read(path).await {
            Ok(bytes) => documents.push(Document::new(file_name(path), bytes)),
            Err(e) => {
                failed = true;
                println!(
                    "{}",
                    json!({"file": path.display().to_string(), "error": e.to_string(), "kind": "io"})
                );
            }
        }
    }

    let report = batch.classify_all(documents, method).await;
    for item in &report.items {
        failed |= item.result.is_err();
        println!("{}", render_item(item));
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn category(registry: &CategoryRegistry, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::Add {
            label,
            fields,
            patterns,
        } => {
            let category = build_category(&label, &fields, &patterns)?;
            let label = category.label.clone();
            registry.register(category).await?;
            info!(label = %label, "Template saved");
            println!("{}", label);
        }
        CategoryCommand::List => {
            for label in registry.list_labels().await? {
                println!("{}", label);
            }
        }
        CategoryCommand::Show { label } => match registry.get_category(&label).await? {
            Some(category) => println!("{}", serde_json::to_string_pretty(&render_category(&category))?),
            None => bail!("no category named {:?}", label),
        },
        CategoryCommand::Remove { label } => {
            registry.remove(&label).await?;
            println!("{}", label);
        }
    }
    Ok(())
}

fn build_category(label: &str, fields: &str, patterns: &[String]) -> Result<Category> {
    let names: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if names.is_empty() {
        bail!("at least one field is required");
    }

    let category = patterns
        .iter()
        .map(|p| KeywordPattern::parse(p))
        .filter(|p| !p.is_empty())
        .fold(Category::from_field_names(label, names), Category::with_pattern);
    category.validate()?;
    Ok(category)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn render_item(item: &BatchItem) -> Value {
    match &item.result {
        Ok(result) => json!({
            "file": item.filename,
            "label": result.label,
            "confidence": result.confidence,
            "method": result.method,
        }),
        Err(e) => render_error(&item.filename, e),
    }
}

fn render_error(file: &str, err: &ClassifyError) -> Value {
    json!({
        "file": file,
        "error": err.to_string(),
        "kind": err.kind().name(),
    })
}

fn render_category(category: &Category) -> Value {
    json!({
        "label": category.label,
        "fields": category.fields,
        "layout": category.layout,
        "patterns": category.effective_patterns(),
    })
}
