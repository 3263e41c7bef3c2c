//! Soft-failure collection for indexing runs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stage where a file was given up on
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ProcessingStage {
    FileRead,
    Language,
    Parse,
    Embedding,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::FileRead => write!(f, "File Read"),
            ProcessingStage::Language => write!(f, "Language"),
            ProcessingStage::Parse => write!(f, "Parse"),
            ProcessingStage::Embedding => write!(f, "Embedding"),
        }
    }
}

/// Error that occurred while processing a file
#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    /// Repository-relative path, or a batch label for embedding failures
    pub path: String,
    pub error: String,
    pub stage: ProcessingStage,
}

/// Collects errors from parallel workers
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<FileError>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FileError>> {
        // A worker that panicked mid-push leaves the list usable.
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an error that occurred during processing
    pub fn record(
        &self,
        path: impl Into<String>,
        error: impl std::fmt::Display,
        stage: ProcessingStage,
    ) {
        self.lock().push(FileError {
            path: path.into(),
            error: error.to_string(),
            stage,
        });
    }

    pub fn error_count(&self) -> usize {
        self.lock().len()
    }

    /// Generate an error report; errors are sorted by path so reports are stable
    pub fn get_report(&self) -> ErrorReport {
        let mut errors = self.lock().clone();
        errors.sort_by(|a, b| (a.stage, &a.path).cmp(&(b.stage, &b.path)));
        ErrorReport::from_errors(&errors)
    }
}

/// Error summary grouped by stage
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    pub total_errors: usize,
    pub by_stage: BTreeMap<ProcessingStage, Vec<FileError>>,
}

impl ErrorReport {
    pub fn from_errors(errors: &[FileError]) -> Self {
        let mut by_stage: BTreeMap<ProcessingStage, Vec<FileError>> = BTreeMap::new();
        for error in errors {
            by_stage.entry(error.stage).or_default().push(error.clone());
        }
        Self {
            total_errors: errors.len(),
            by_stage,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn summary(&self) -> String {
        if self.total_errors == 0 {
            "No errors occurred during processing".to_string()
        } else {
            format!("Processing completed with {} errors", self.total_errors)
        }
    }

    /// Print a summary of the errors to stdout
    pub fn print_summary(&self) {
        if self.total_errors == 0 {
            println!("✅ {}", self.summary());
            return;
        }

        println!("⚠️  {}", self.summary());
        for (stage, errors) in &self.by_stage {
            println!("  {}: {} errors", stage, errors.len());

            // Show up to 5 examples per stage
            for error in errors.iter().take(5) {
                println!("    - {}: {}", error.path, error.error);
            }
            if errors.len() > 5 {
                println!("    ... and {} more", errors.len() - 5);
            }
        }
    }
}
