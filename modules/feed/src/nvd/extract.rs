use super::NvdDescription;
use serde_json::{Map, Value};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Metric set names in preference order, newest scoring standard first. A
/// record may carry several standards at once; the newest one wins.
const METRIC_PREFERENCE: [&str; 4] = [
    "cvssMetricV40",
    "cvssMetricV31",
    "cvssMetricV30",
    "cvssMetricV2",
];

/// Select a single unscaled base score from the versioned metric sets.
///
/// Walks the preference list; for each name present with a non-empty array,
/// reads the first entry's `cvssData.baseScore` and returns it if it
/// coerces to a finite number. Falls back to `0.0` when no set yields one.
/// Missing or oddly-shaped keys degrade to the fallback, never panic.
pub fn base_score(metrics: &Map<String, Value>) -> f64 {
    for name in METRIC_PREFERENCE {
        let first = metrics
            .get(name)
            .and_then(Value::as_array)
            .and_then(|entries| entries.first());

        let score = first
            .and_then(|entry| entry.get("cvssData"))
            .and_then(|data| data.get("baseScore"))
            .and_then(as_finite);

        if let Some(score) = score {
            return score;
        }
    }

    0.0
}

fn as_finite(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// Prefer the English description, fall back to the first one carrying a
/// value, else empty. The caller substitutes the placeholder for empty.
pub fn pick_description(descriptions: &[NvdDescription]) -> String {
    let en = descriptions
        .iter()
        .find(|d| d.lang.as_deref() == Some("en") && d.value.is_some())
        .and_then(|d| d.value.as_deref());

    let any = descriptions.iter().find_map(|d| d.value.as_deref());

    en.or(any).unwrap_or_default().trim().to_string()
}

/// Parse an upstream publish timestamp. The NVD emits offset-less ISO-8601
/// (`2025-01-01T00:00:00.000`), which is taken as UTC; RFC 3339 with an
/// offset is accepted as well. Anything else is `None` and the record is
/// dropped before storage.
pub fn parse_published(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }

    PrimitiveDateTime::parse(value, &Iso8601::DEFAULT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
