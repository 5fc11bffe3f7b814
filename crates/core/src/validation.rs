//! Course parameter validation.
//!
//! The route parameters end up in store queries, so they are checked before
//! any query is built. The validator is a pure predicate: it reports only
//! whether the full parameter set is acceptable, and the caller decides what
//! to log and how to respond.

use std::collections::HashMap;

const INSTITUTION_ID_LEN: usize = 8;
const COURSE_ID_MIN_LEN: usize = 1;
const COURSE_ID_MAX_LEN: usize = 30;

/// Validates the course lookup parameters.
///
/// Requires `institution_id`, `course_id` and `mode` to all be present:
/// - `institution_id`: exactly 8 ASCII digits
/// - `course_id`: 1–30 characters from `[A-Za-z0-9_~\-()!$]`
/// - `mode`: one of `"1"`, `"2"`, `"3"`
///
/// Returns `false` on any violation without indicating which field failed.
pub fn valid_course_params(params: &HashMap<String, String>) -> bool {
    let (Some(institution_id), Some(course_id), Some(mode)) = (
        params.get("institution_id"),
        params.get("course_id"),
        params.get("mode"),
    ) else {
        return false;
    };

    valid_institution_id(institution_id) && valid_course_id(course_id) && valid_mode(mode)
}

fn valid_institution_id(institution_id: &str) -> bool {
    institution_id.len() == INSTITUTION_ID_LEN
        && institution_id.bytes().all(|b| b.is_ascii_digit())
}

fn valid_course_id(course_id: &str) -> bool {
    (COURSE_ID_MIN_LEN..=COURSE_ID_MAX_LEN).contains(&course_id.len())
        && course_id.bytes().all(|b| {
            matches!(b,
                b'0'..=b'9'
                | b'a'..=b'z'
                | b'A'..=b'Z'
                | b'_' | b'~' | b'-' | b'(' | b')' | b'!' | b'$'
            )
        })
}

fn valid_mode(mode: &str) -> bool {
    matches!(mode, "1" | "2" | "3")
}
