//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! resolvers, so request handling never reads process-wide environment
//! variables. That keeps behaviour consistent across multi-threaded runtimes
//! and lets tests construct a config directly.

use std::path::{Path, PathBuf};

use crate::{WidgetError, WidgetResult};

/// Default directory holding the collection files.
pub const DEFAULT_DATA_DIR: &str = "/course_data";
/// Default collection of course documents.
pub const DEFAULT_COURSES_COLLECTION: &str = "courses";
/// Default collection of dataset ingestion records.
pub const DEFAULT_DATASETS_COLLECTION: &str = "datasets";

/// Statistics fields retained by the widget projection.
///
/// The retained-field lists have changed over the system's history (earlier
/// revisions served `question_16`/`question_28`), so they are configuration
/// rather than constants baked into the projector.
#[derive(Clone, Debug)]
pub struct StatsFieldConfig {
    pub employment: Vec<String>,
    pub nss: Vec<String>,
}

impl Default for StatsFieldConfig {
    fn default() -> Self {
        Self {
            employment: to_strings(&["aggregation_level", "in_work_or_study", "subject"]),
            nss: to_strings(&[
                "question_1",
                "question_27",
                "subject",
                "aggregation_level",
            ]),
        }
    }
}

fn to_strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| (*field).to_string()).collect()
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    courses_collection: String,
    datasets_collection: String,
    stats_fields: StatsFieldConfig,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidInput` if either collection name is empty.
    pub fn new(
        data_dir: PathBuf,
        courses_collection: String,
        datasets_collection: String,
        stats_fields: StatsFieldConfig,
    ) -> WidgetResult<Self> {
        if courses_collection.trim().is_empty() {
            return Err(WidgetError::InvalidInput(
                "courses_collection cannot be empty".into(),
            ));
        }
        if datasets_collection.trim().is_empty() {
            return Err(WidgetError::InvalidInput(
                "datasets_collection cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            courses_collection,
            datasets_collection,
            stats_fields,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn courses_collection(&self) -> &str {
        &self.courses_collection
    }

    pub fn datasets_collection(&self) -> &str {
        &self.datasets_collection
    }

    pub fn stats_fields(&self) -> &StatsFieldConfig {
        &self.stats_fields
    }
}

/// Resolve a collection name from an optional environment value.
///
/// Empty or whitespace-only values fall back to the default.
pub fn collection_from_env_value(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
