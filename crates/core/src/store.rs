//! Read-only document store interface.
//!
//! The course and dataset collections live in an external document store. This
//! module defines the query seam the resolvers consume: typed equality
//! predicates over (possibly nested) document fields, rather than filter
//! strings interpolated from request parameters. Parameters are still
//! validated before they reach a query; the typed predicates are the second
//! layer of that defence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("failed to read collection file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to parse collection file {path}: {source}", path = path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("collection file {} must contain a JSON array of documents", .0.display())]
    NotAnArray(PathBuf),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A field value an equality predicate compares against.
///
/// The store keeps string and integer comparisons distinct: `course_mode` and
/// `version` are stored as numbers, identifiers as strings, and a predicate of
/// the wrong type never matches.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
}

/// An equality predicate on a document field.
///
/// `field` is a dotted path; `course.institution.ukprn` addresses the nested
/// legacy identifier.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub field: String,
    pub value: FieldValue,
}

impl Predicate {
    pub fn eq_str(field: &str, value: &str) -> Self {
        Self {
            field: field.into(),
            value: FieldValue::Str(value.into()),
        }
    }

    pub fn eq_int(field: &str, value: i64) -> Self {
        Self {
            field: field.into(),
            value: FieldValue::Int(value),
        }
    }

    fn matches(&self, doc: &Value) -> bool {
        let Some(actual) = lookup_path(doc, &self.field) else {
            return false;
        };

        match &self.value {
            FieldValue::Str(expected) => actual.as_str() == Some(expected.as_str()),
            FieldValue::Int(expected) => actual.as_i64() == Some(*expected),
        }
    }
}

fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.get(key))
}

/// Options carried with every query.
///
/// The collections are partitioned by institution in the hosted store, and the
/// resolvers must scan across partitions; `cross_partition` is always set by
/// this crate's callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryOptions {
    pub cross_partition: bool,
}

impl QueryOptions {
    pub const fn cross_partition() -> Self {
        Self {
            cross_partition: true,
        }
    }
}

/// The store seam consumed by the dataset and course resolvers.
///
/// Implementations are read-only from this crate's perspective: one long-lived
/// handle is constructed at process start and shared by reference across
/// requests.
pub trait DocumentStore: Send + Sync {
    /// Returns every document in `collection` matching all predicates in
    /// `filter`.
    fn query(
        &self,
        collection: &str,
        filter: &[Predicate],
        options: &QueryOptions,
    ) -> StoreResult<Vec<Value>>;
}

/// A document store loaded from JSON files, one array per collection.
///
/// `load` reads `<data_dir>/<collection>.json` for each named collection at
/// startup; the contents are immutable afterwards. Tests build one directly
/// from in-memory documents via [`JsonFileStore::from_collections`].
#[derive(Debug)]
pub struct JsonFileStore {
    collections: HashMap<String, Vec<Value>>,
}

impl JsonFileStore {
    pub fn load(data_dir: &Path, collection_names: &[&str]) -> StoreResult<Self> {
        let mut collections = HashMap::new();

        for name in collection_names {
            let path = data_dir.join(format!("{name}.json"));
            let contents = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
            let parsed: Value = serde_json::from_str(&contents)
                .map_err(|source| StoreError::Deserialization {
                    path: path.clone(),
                    source,
                })?;

            let Value::Array(documents) = parsed else {
                return Err(StoreError::NotAnArray(path));
            };

            tracing::info!(
                collection = *name,
                documents = documents.len(),
                "loaded collection"
            );
            collections.insert((*name).to_string(), documents);
        }

        Ok(Self { collections })
    }

    pub fn from_collections(collections: HashMap<String, Vec<Value>>) -> Self {
        Self { collections }
    }
}

impl DocumentStore for JsonFileStore {
    fn query(
        &self,
        collection: &str,
        filter: &[Predicate],
        _options: &QueryOptions,
    ) -> StoreResult<Vec<Value>> {
        // The in-process store holds each collection whole, so the
        // cross-partition option has nothing to fan out over.
        let documents = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(documents
            .iter()
            .filter(|doc| filter.iter().all(|predicate| predicate.matches(doc)))
            .cloned()
            .collect())
    }
}
