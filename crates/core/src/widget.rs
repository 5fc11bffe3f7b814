//! The public widget representation and its projection.
//!
//! A stored course document carries far more statistics than the widget
//! contract exposes. The projection here is a pure function: it keeps at most
//! the first entry of each statistics list, filtered to the configured
//! retained fields, and records whether more entries existed via the
//! `multiple_subjects` flag. It never averages or merges ambiguous aggregates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::config::StatsFieldConfig;

/// A name carried in both publication languages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocalisedName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welsh: Option<String>,
}

/// Tidied statistics: zero or one entry per list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WidgetStatistics {
    #[schema(value_type = Vec<Object>)]
    pub employment: Vec<Map<String, Value>>,
    #[schema(value_type = Vec<Object>)]
    pub nss: Vec<Map<String, Value>>,
}

/// The minimal public JSON representation of a course.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Widget {
    pub institution_id: String,
    pub course_id: String,
    pub course_name: LocalisedName,
    pub course_mode: i64,
    pub institution_name: LocalisedName,
    pub statistics: WidgetStatistics,
    pub multiple_subjects: bool,
}

/// True iff the raw statistics are split across more than one subject.
///
/// A course whose employment or survey aggregates cover several subjects has
/// no single unambiguous figure; the projection drops the extra entries and
/// this flag surfaces that they existed.
pub fn multiple_subjects(raw_stats: &Value) -> bool {
    stat_list(raw_stats, "employment").len() > 1 || stat_list(raw_stats, "nss").len() > 1
}

/// Removes unwanted statistics from the raw document.
///
/// Each list keeps only its first entry, and within it only the configured
/// fields that are present in the source. Missing lists project to empty
/// lists. Applying the projection to its own output changes nothing, since it
/// only ever removes fields.
pub fn tidy_widget_stats(raw_stats: &Value, fields: &StatsFieldConfig) -> WidgetStatistics {
    WidgetStatistics {
        employment: tidy_list(stat_list(raw_stats, "employment"), &fields.employment),
        nss: tidy_list(stat_list(raw_stats, "nss"), &fields.nss),
    }
}

fn stat_list<'a>(raw_stats: &'a Value, key: &str) -> &'a [Value] {
    raw_stats
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn tidy_list(entries: &[Value], retained: &[String]) -> Vec<Map<String, Value>> {
    let Some(first) = entries.first() else {
        return Vec::new();
    };

    let mut kept = Map::new();
    for field in retained {
        if let Some(value) = first.get(field) {
            kept.insert(field.clone(), value.clone());
        }
    }

    vec![kept]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_fields() -> StatsFieldConfig {
        StatsFieldConfig::default()
    }

    #[test]
    fn test_employment_in_work_or_study_is_retained() {
        let raw = json!({
            "employment": [{
                "aggregation_level": 14,
                "assumed_to_be_unemployed": 5,
                "in_study": 80,
                "in_work_or_study": 95,
                "number_of_students": 15,
                "response_rate": 100
            }]
        });

        let tidied = tidy_widget_stats(&raw, &default_fields());

        assert_eq!(tidied.employment.len(), 1);
        assert_eq!(tidied.employment[0]["in_work_or_study"], json!(95));
        assert_eq!(tidied.employment[0]["aggregation_level"], json!(14));
        assert!(!tidied.employment[0].contains_key("in_study"));
        assert!(tidied.nss.is_empty());
        assert!(!multiple_subjects(&raw));
    }

    #[test]
    fn test_multiple_employment_entries_keep_only_the_first() {
        let raw = json!({
            "employment": [
                {"aggregation_level": 14, "in_work_or_study": 95},
                {"aggregation_level": 14, "in_work_or_study": 85}
            ]
        });

        let tidied = tidy_widget_stats(&raw, &default_fields());

        assert_eq!(tidied.employment.len(), 1);
        assert_eq!(tidied.employment[0]["in_work_or_study"], json!(95));
        assert!(multiple_subjects(&raw));
    }

    #[test]
    fn test_nss_questions_are_retained() {
        let raw = json!({
            "nss": [{
                "question_1": {
                    "description": "Staff are good at explaining things",
                    "agree_or_strongly_agree": 79
                },
                "question_27": {
                    "description": "Overall, I am satisfied with the quality of the course",
                    "agree_or_strongly_agree": 84
                },
                "number_of_students": 30
            }]
        });

        let tidied = tidy_widget_stats(&raw, &default_fields());

        assert_eq!(tidied.nss.len(), 1);
        assert!(tidied.nss[0].contains_key("question_1"));
        assert!(tidied.nss[0].contains_key("question_27"));
        assert!(!tidied.nss[0].contains_key("number_of_students"));
        assert!(!multiple_subjects(&raw));
    }

    #[test]
    fn test_multiple_nss_entries_keep_only_the_first_and_flag_ambiguity() {
        let raw = json!({
            "nss": [
                {"question_1": {"agree_or_strongly_agree": 79}},
                {"question_1": {"agree_or_strongly_agree": 93}}
            ]
        });

        let tidied = tidy_widget_stats(&raw, &default_fields());

        assert_eq!(tidied.nss.len(), 1);
        assert_eq!(tidied.nss[0]["question_1"]["agree_or_strongly_agree"], json!(79));
        assert!(multiple_subjects(&raw));
    }

    #[test]
    fn test_missing_lists_project_to_empty_lists() {
        let raw = json!({});

        let tidied = tidy_widget_stats(&raw, &default_fields());

        assert!(tidied.employment.is_empty());
        assert!(tidied.nss.is_empty());
        assert!(!multiple_subjects(&raw));
    }

    #[test]
    fn test_tidying_is_idempotent() {
        let raw = json!({
            "employment": [
                {"aggregation_level": 14, "in_work_or_study": 95, "in_study": 80},
                {"aggregation_level": 14, "in_work_or_study": 85}
            ],
            "nss": [{"question_1": {"agree_or_strongly_agree": 79}, "subject": {"code": "CAH09"}}]
        });

        let once = tidy_widget_stats(&raw, &default_fields());
        let as_value = serde_json::to_value(&once).expect("serialize tidied stats");
        let twice = tidy_widget_stats(&as_value, &default_fields());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_retained_fields_follow_configuration() {
        let fields = StatsFieldConfig {
            employment: vec!["in_work_or_study".into()],
            nss: vec!["question_16".into(), "question_28".into()],
        };
        let raw = json!({
            "nss": [{
                "question_16": {"agree_or_strongly_agree": 79},
                "question_1": {"agree_or_strongly_agree": 50}
            }]
        });

        let tidied = tidy_widget_stats(&raw, &fields);

        assert!(tidied.nss[0].contains_key("question_16"));
        assert!(!tidied.nss[0].contains_key("question_1"));
    }
}
