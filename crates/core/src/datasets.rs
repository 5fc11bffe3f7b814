//! Dataset version resolution.
//!
//! Course data is published in atomic snapshots tagged with an integer
//! version. Only snapshots whose ingestion record has `status == "succeeded"`
//! are servable, and requests are always answered from the newest one.

use std::sync::Arc;

use serde_json::Value;

use crate::config::CoreConfig;
use crate::store::{DocumentStore, Predicate, QueryOptions};
use crate::{WidgetError, WidgetResult};

/// Resolves the servable dataset version from the ingestion records.
pub struct DataSetService {
    store: Arc<dyn DocumentStore>,
    cfg: Arc<CoreConfig>,
}

impl DataSetService {
    pub fn new(store: Arc<dyn DocumentStore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Returns the highest `version` among records with `status == "succeeded"`.
    ///
    /// At least one successfully ingested dataset is an operational
    /// precondition; if none exists the error propagates rather than being
    /// defaulted or masked.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Store` if the query fails and
    /// `WidgetError::NoSuccessfulDataset` if no succeeded record exists.
    pub fn highest_successful_version(&self) -> WidgetResult<i64> {
        let filter = [Predicate::eq_str("status", "succeeded")];
        let records = self.store.query(
            self.cfg.datasets_collection(),
            &filter,
            &QueryOptions::cross_partition(),
        )?;

        let version = records
            .iter()
            .filter_map(|record| record.get("version").and_then(Value::as_i64))
            .max()
            .ok_or(WidgetError::NoSuccessfulDataset)?;

        tracing::info!(version, "highest successful dataset version");
        Ok(version)
    }
}
