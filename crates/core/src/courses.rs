//! Course lookup and projection into the public widget shape.
//!
//! Institution identifiers were migrated from a legacy scheme (`ukprn`) to the
//! canonical published one (`pub_ukprn`), and callers may still supply the
//! legacy identifier. Resolution is therefore a two-step strategy: look up by
//! the canonical key, and on a miss resolve the legacy key to its canonical
//! counterpart and retry.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::CoreConfig;
use crate::store::{DocumentStore, Predicate, QueryOptions};
use crate::widget::{multiple_subjects, tidy_widget_stats, LocalisedName, Widget};
use crate::{WidgetError, WidgetResult};

/// The validated lookup parameters, built once per request.
#[derive(Clone, Debug)]
pub struct CourseQuery {
    pub institution_id: String,
    pub course_id: String,
    pub mode: String,
}

/// Handles retrieving courses from the document store.
pub struct CourseService {
    store: Arc<dyn DocumentStore>,
    cfg: Arc<CoreConfig>,
}

impl CourseService {
    pub fn new(store: Arc<dyn DocumentStore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Retrieves one course for `query` at the given dataset version.
    ///
    /// Tries the canonical institution identifier first; on zero rows, resolves
    /// the identifier through the legacy `ukprn` field and retries. Returns
    /// `Ok(None)` when no course matches after both paths.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Store` on a failed query and
    /// `WidgetError::MalformedDocument` if the winning document is missing
    /// fields the widget contract requires.
    pub fn get_course(&self, version: i64, query: &CourseQuery) -> WidgetResult<Option<Widget>> {
        let mode: i64 = query
            .mode
            .parse()
            .map_err(|_| WidgetError::InvalidInput(format!("mode is not numeric: {}", query.mode)))?;

        let mut rows = self.lookup(&query.institution_id, &query.course_id, mode, version)?;

        if rows.is_empty() {
            let Some(pub_ukprn) = self.resolve_legacy_ukprn(query, mode, version)? else {
                return Ok(None);
            };
            tracing::info!(
                legacy_ukprn = %query.institution_id,
                %pub_ukprn,
                "resolved legacy institution identifier"
            );
            rows = self.lookup(&pub_ukprn, &query.course_id, mode, version)?;
        }

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        if rows.len() > 1 {
            // Duplicate course documents indicate upstream data corruption.
            tracing::warn!(
                count = rows.len(),
                course_id = %query.course_id,
                "more than one matching course; proceeding with the first"
            );
        }

        project(row, self.cfg.stats_fields()).map(Some)
    }

    fn lookup(
        &self,
        institution_id: &str,
        course_id: &str,
        mode: i64,
        version: i64,
    ) -> WidgetResult<Vec<Value>> {
        let filter = [
            Predicate::eq_str("institution_id", institution_id),
            Predicate::eq_str("course_id", course_id),
            Predicate::eq_int("course_mode", mode),
            Predicate::eq_int("version", version),
        ];

        Ok(self.store.query(
            self.cfg.courses_collection(),
            &filter,
            &QueryOptions::cross_partition(),
        )?)
    }

    /// Recovers the canonical `pub_ukprn` for a legacy `ukprn` identifier.
    fn resolve_legacy_ukprn(
        &self,
        query: &CourseQuery,
        mode: i64,
        version: i64,
    ) -> WidgetResult<Option<String>> {
        let filter = [
            Predicate::eq_str("course.institution.ukprn", &query.institution_id),
            Predicate::eq_str("course_id", &query.course_id),
            Predicate::eq_int("course_mode", mode),
            Predicate::eq_int("version", version),
        ];

        let rows = self.store.query(
            self.cfg.courses_collection(),
            &filter,
            &QueryOptions::cross_partition(),
        )?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let pub_ukprn = row
            .pointer("/course/institution/pub_ukprn")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WidgetError::MalformedDocument(
                    "course.institution.pub_ukprn missing or not a string".into(),
                )
            })?;

        Ok(Some(pub_ukprn.to_string()))
    }
}

/// Projects a raw course document into the widget shape.
fn project(row: &Value, fields: &crate::config::StatsFieldConfig) -> WidgetResult<Widget> {
    let institution_id = required_str(row, "/institution_id")?;
    let course_id = required_str(row, "/course_id")?;
    let course_mode = row
        .pointer("/course_mode")
        .and_then(Value::as_i64)
        .ok_or_else(|| WidgetError::MalformedDocument("course_mode missing or not numeric".into()))?;

    let course_name = localised_name(row, "/course/title")?;
    let institution_name = localised_name(row, "/course/institution/pub_ukprn_name")?;

    // Courses without a statistics block project to empty lists.
    let empty = Value::Object(Map::new());
    let raw_stats = row.pointer("/course/statistics").unwrap_or(&empty);

    Ok(Widget {
        institution_id,
        course_id,
        course_name,
        course_mode,
        institution_name,
        statistics: tidy_widget_stats(raw_stats, fields),
        multiple_subjects: multiple_subjects(raw_stats),
    })
}

fn required_str(row: &Value, pointer: &str) -> WidgetResult<String> {
    row.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            WidgetError::MalformedDocument(format!("{pointer} missing or not a string"))
        })
}

fn localised_name(row: &Value, pointer: &str) -> WidgetResult<LocalisedName> {
    let name = row
        .pointer(pointer)
        .ok_or_else(|| WidgetError::MalformedDocument(format!("{pointer} missing")))?;

    Ok(LocalisedName {
        english: name.get("english").and_then(Value::as_str).map(str::to_string),
        welsh: name.get("welsh").and_then(Value::as_str).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsFieldConfig;
    use crate::store::JsonFileStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn course_doc(institution_id: &str, ukprn: &str, course_id: &str, title: &str) -> Value {
        json!({
            "institution_id": institution_id,
            "course_id": course_id,
            "course_mode": 1,
            "version": 1,
            "course": {
                "title": {"english": title, "welsh": "Cwrs"},
                "institution": {
                    "ukprn": ukprn,
                    "pub_ukprn": institution_id,
                    "pub_ukprn_name": {"english": "Test University"}
                },
                "statistics": {
                    "employment": [{"aggregation_level": 14, "in_work_or_study": 95, "in_study": 80}],
                    "nss": [{"question_1": {"agree_or_strongly_agree": 79}}]
                }
            }
        })
    }

    fn service_with(courses: Vec<Value>) -> CourseService {
        let cfg = Arc::new(
            CoreConfig::new(
                PathBuf::from("/course_data"),
                "courses".into(),
                "datasets".into(),
                StatsFieldConfig::default(),
            )
            .expect("config"),
        );
        let store = Arc::new(JsonFileStore::from_collections(HashMap::from([(
            "courses".to_string(),
            courses,
        )])));
        CourseService::new(store, cfg)
    }

    fn query(institution_id: &str, course_id: &str, mode: &str) -> CourseQuery {
        CourseQuery {
            institution_id: institution_id.into(),
            course_id: course_id.into(),
            mode: mode.into(),
        }
    }

    #[test]
    fn test_primary_lookup_returns_a_tidied_widget() {
        let service = service_with(vec![course_doc("10000055", "10000055", "AB37", "Biology")]);

        let widget = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed")
            .expect("course should be found");

        assert_eq!(widget.institution_id, "10000055");
        assert_eq!(widget.course_id, "AB37");
        assert_eq!(widget.course_name.english.as_deref(), Some("Biology"));
        assert_eq!(widget.course_mode, 1);
        assert_eq!(
            widget.institution_name.english.as_deref(),
            Some("Test University")
        );
        assert_eq!(widget.statistics.employment.len(), 1);
        assert!(!widget.statistics.employment[0].contains_key("in_study"));
        assert!(!widget.multiple_subjects);
    }

    #[test]
    fn test_legacy_ukprn_falls_back_to_the_canonical_identifier() {
        // Canonical id 99990001; callers still hold the legacy 10000055.
        let service = service_with(vec![course_doc("99990001", "10000055", "AB37", "Biology")]);

        let widget = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed")
            .expect("course should be found via the legacy identifier");

        assert_eq!(widget.institution_id, "99990001");
    }

    #[test]
    fn test_not_found_after_both_lookup_paths() {
        let service = service_with(vec![course_doc("10000055", "10000055", "AB37", "Biology")]);

        let missing = service
            .get_course(1, &query("10000055", "BLAH", "1"))
            .expect("lookup should succeed");

        assert!(missing.is_none());
    }

    #[test]
    fn test_wrong_version_is_not_found() {
        let service = service_with(vec![course_doc("10000055", "10000055", "AB37", "Biology")]);

        let missing = service
            .get_course(2, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed");

        assert!(missing.is_none());
    }

    #[test]
    fn test_duplicate_rows_proceed_with_the_first() {
        let service = service_with(vec![
            course_doc("10000055", "10000055", "AB37", "Biology"),
            course_doc("10000055", "10000055", "AB37", "Biology (duplicate)"),
        ]);

        let widget = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed")
            .expect("course should be found");

        assert_eq!(widget.course_name.english.as_deref(), Some("Biology"));
    }

    #[test]
    fn test_multiple_subject_statistics_are_flagged_and_trimmed() {
        let mut doc = course_doc("10000055", "10000055", "AB37", "Biology");
        doc["course"]["statistics"]["employment"] = json!([
            {"in_work_or_study": 95},
            {"in_work_or_study": 85}
        ]);
        let service = service_with(vec![doc]);

        let widget = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed")
            .expect("course should be found");

        assert_eq!(widget.statistics.employment.len(), 1);
        assert!(widget.multiple_subjects);
    }

    #[test]
    fn test_document_without_title_is_malformed() {
        let mut doc = course_doc("10000055", "10000055", "AB37", "Biology");
        doc["course"]
            .as_object_mut()
            .expect("course object")
            .remove("title");
        let service = service_with(vec![doc]);

        let err = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect_err("should reject a document without a title");

        assert!(matches!(err, WidgetError::MalformedDocument(msg) if msg.contains("title")));
    }

    #[test]
    fn test_document_without_statistics_projects_empty_lists() {
        let mut doc = course_doc("10000055", "10000055", "AB37", "Biology");
        doc["course"]
            .as_object_mut()
            .expect("course object")
            .remove("statistics");
        let service = service_with(vec![doc]);

        let widget = service
            .get_course(1, &query("10000055", "AB37", "1"))
            .expect("lookup should succeed")
            .expect("course should be found");

        assert!(widget.statistics.employment.is_empty());
        assert!(widget.statistics.nss.is_empty());
        assert!(!widget.multiple_subjects);
    }
}
