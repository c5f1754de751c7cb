/// Value normalization applied to a lead before it is mapped onto the
/// Entrata schema.
///
/// - Free-form move-in dates are rewritten to `MM/DD/YYYY`.
/// - Heterogeneous checkbox values collapse to `"1"` / `"0"`.
/// - Creation timestamps are backdated so Entrata never sees a future date.
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// How far creation timestamps are pushed into the past.
pub const BACKDATE_SECONDS: i64 = 60;

/// Entrata's `createdDate` layout.
pub const ENTRATA_TIMESTAMP_FORMAT: &str = "%m/%d/%YT%H:%M:%S";

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("valid ISO date regex"));

static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid US date regex"));

static DOTTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})\.([0-9]{2})\.([0-9]{4})$").expect("valid dotted date regex"));

const TRUTHY: [&str; 6] = ["1", "true", "yes", "y", "on", "checked"];

/// Normalize a date string to `MM/DD/YYYY`.
///
/// Shapes are checked in order: `YYYY-MM-DD`, `MM/DD/YYYY`, `DD.MM.YYYY`.
/// Matching is lexical only; anything unrecognised is returned as-is and
/// left for Entrata to accept or reject.
pub fn normalize_date(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }

    if let Some(caps) = ISO_DATE.captures(value) {
        return format!("{}/{}/{}", &caps[2], &caps[3], &caps[1]);
    }

    if US_DATE.is_match(value) {
        return value.to_string();
    }

    if let Some(caps) = DOTTED_DATE.captures(value) {
        return format!("{}/{}/{}", &caps[2], &caps[1], &caps[3]);
    }

    tracing::debug!("Unrecognised date format, passing through: {}", value);
    value.to_string()
}

/// True for the checkbox-style values form tools send for "yes".
pub fn is_truthy(raw: &str) -> bool {
    let value = raw.trim().to_ascii_lowercase();
    TRUTHY.contains(&value.as_str())
}

/// Coerce an opt-in flag to Entrata's `"1"` / `"0"` strings.
pub fn coerce_opt_in(raw: Option<&str>) -> &'static str {
    match raw {
        Some(value) if is_truthy(value) => "1",
        _ => "0",
    }
}

/// Creation timestamp guaranteed to be in the past relative to `now`.
pub fn backdated_timestamp(now: DateTime<Utc>) -> String {
    (now - Duration::seconds(BACKDATE_SECONDS))
        .format(ENTRATA_TIMESTAMP_FORMAT)
        .to_string()
}
