//! Deterministic daily topic rotation.

use chrono::NaiveDate;

/// Used when neither `TOPICS` nor `DEFAULT_TOPICS` yields anything usable
pub const BUILTIN_TOPICS: &str = "Minimalismus,Selbstentwicklung,Frugalismus,Investieren";

/// Day zero of the rotation.
pub fn rotation_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Whole days between the rotation epoch and `date` (negative before it).
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    (date - rotation_epoch()).num_days()
}

/// Resolve the rotation list. The explicit list overrides the default one,
/// and an empty result falls back to [`BUILTIN_TOPICS`].
pub fn resolve_topics(explicit: Option<&str>, default: Option<&str>) -> Vec<String> {
    let raw = explicit
        .filter(|s| !s.trim().is_empty())
        .or(default)
        .unwrap_or(BUILTIN_TOPICS);

    let topics = split_topics(raw);
    if topics.is_empty() {
        return split_topics(BUILTIN_TOPICS);
    }
    topics
}

fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the topic for `date`. Returns `None` only for an empty list.
pub fn pick_for_date(topics: &[String], date: NaiveDate) -> Option<&str> {
    if topics.is_empty() {
        return None;
    }
    let index = days_since_epoch(date).rem_euclid(topics.len() as i64) as usize;
    topics.get(index).map(String::as_str)
}
