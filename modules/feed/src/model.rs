use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use vigil_cvss::Severity;

/// A normalized feed record, as cached and as served to the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CveRecord {
    /// NVD identifier, e.g. `CVE-2025-12345`
    pub cve_id: String,
    /// CVSS base score scaled by 10: `9.8` is `98`
    pub cvss_score_x10: i32,
    pub severity: Severity,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub published_at: OffsetDateTime,
    pub description: String,
    /// Raw upstream metrics payload, retained for traceability
    #[schema(value_type = Object)]
    pub metrics: serde_json::Value,
}

impl From<vigil_entity::cve::Model> for CveRecord {
    fn from(model: vigil_entity::cve::Model) -> Self {
        // rows are only ever written through normalization, so the stored
        // label parses; the score is the authority if it ever does not
        let severity = model
            .severity
            .parse()
            .unwrap_or_else(|_| Severity::from_f64(f64::from(model.score) / 10.0));

        Self {
            cve_id: model.id,
            cvss_score_x10: model.score,
            severity,
            published_at: model.published,
            description: model.description,
            metrics: model.metrics,
        }
    }
}

/// Where a read answers from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The local cache, no upstream call
    #[default]
    Cache,
    /// A live NVD fetch, persisted before answering
    Nvd,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestParams {
    /// Result cap, clamped to [1, 200]; defaults to 25
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub source: Source,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Result cap, within [1, 200]; defaults to 25
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Outcome of one refresh: how the fetched batch reconciled into the cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefreshSummary {
    pub inserted: u64,
    pub updated: u64,
    pub total: u64,
}

/// Body of a 502 answer when the upstream feed failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpstreamErrorBody {
    pub message: String,
    /// Tag of the upstream that failed
    pub upstream: String,
}

/// Body of a 400 answer when the request failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorBody {
    pub message: String,
    /// The offending field, when determinable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
