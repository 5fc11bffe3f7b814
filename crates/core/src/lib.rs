//! # Widget Core
//!
//! Core logic for the course widget lookup service:
//! - Parameter validation for the untrusted route parameters
//! - Dataset version resolution (newest successfully published snapshot)
//! - Course lookup with legacy-identifier fallback
//! - Projection of raw course documents into the public widget shape
//!
//! **No API concerns**: HTTP routing, status codes and response envelopes
//! belong in `api-rest`. The document store is an injected read-only
//! dependency behind the [`DocumentStore`] trait.

pub mod config;
pub mod courses;
pub mod datasets;
pub mod error;
pub mod store;
pub mod validation;
pub mod widget;

pub use config::{CoreConfig, StatsFieldConfig};
pub use courses::{CourseQuery, CourseService};
pub use datasets::DataSetService;
pub use error::{WidgetError, WidgetResult};
pub use store::{
    DocumentStore, FieldValue, JsonFileStore, Predicate, QueryOptions, StoreError, StoreResult,
};
pub use validation::valid_course_params;
pub use widget::{multiple_subjects, tidy_widget_stats, LocalisedName, Widget, WidgetStatistics};
