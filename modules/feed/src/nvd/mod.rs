pub mod extract;

use reqwest::{StatusCode, header};
use serde::Deserialize;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::instrument;
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
const USER_AGENT: &str = concat!("vigil-threat-feed/", env!("CARGO_PKG_VERSION"));

/// The NVD has no reliable "most recent first" ordering; a trailing publish
/// window is the recency proxy instead.
const WINDOW: Duration = Duration::days(14);

/// One bounded attempt per request, no automatic retries. Retrying is the
/// caller's decision.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub const MAX_RESULTS: i64 = 200;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("unable to reach the NVD service")]
    Unreachable(#[source] reqwest::Error),
    #[error("NVD rejected the request with status {0}")]
    Rejected(StatusCode),
    #[error("NVD returned a response that could not be parsed")]
    Malformed(#[source] reqwest::Error),
}

impl FeedError {
    /// Tag carried in upstream error responses.
    pub const UPSTREAM: &'static str = "nvd";
}

/// One upstream record, mapped and filtered but not yet normalized for
/// storage. Lives only within a single fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedCve {
    pub cve_id: String,
    pub published: OffsetDateTime,
    pub description: String,
    /// Unscaled base score as reported upstream
    pub score: f64,
    pub metrics: Map<String, Value>,
}

#[derive(Clone, Debug)]
pub struct NvdClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl NvdClient {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::with_endpoint(Url::parse(DEFAULT_ENDPOINT)?)
    }

    /// Point the client somewhere else, e.g. a stand-in server in tests.
    pub fn with_endpoint(endpoint: Url) -> Result<Self, anyhow::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Fetch up to `limit` records published within the trailing window.
    ///
    /// An empty upstream result set is a valid success.
    #[instrument(skip(self), err)]
    pub async fn fetch_recent(&self, limit: i64) -> Result<Vec<FetchedCve>, FeedError> {
        let limit = limit.clamp(1, MAX_RESULTS);
        let end = OffsetDateTime::now_utc();
        let start = end - WINDOW;

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("resultsPerPage", limit.to_string()),
                ("pubStartDate", rfc3339(start)),
                ("pubEndDate", rfc3339(end)),
            ])
            .send()
            .await
            .map_err(FeedError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Rejected(status));
        }

        let body: NvdResponse = response.json().await.map_err(FeedError::Malformed)?;

        Ok(map_response(body))
    }
}

fn rfc3339(ts: OffsetDateTime) -> String {
    // formatting a UTC timestamp with the well-known format cannot fail
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Map the raw payload into fetch results, dropping entries without a
/// usable identifier or publish time.
pub fn map_response(body: NvdResponse) -> Vec<FetchedCve> {
    body.vulnerabilities
        .into_iter()
        .filter_map(|entry| entry.cve)
        .filter_map(|cve| {
            let cve_id = cve.id.unwrap_or_default().trim().to_string();
            if cve_id.is_empty() {
                log::debug!("skipping record without an identifier");
                return None;
            }

            let Some(published) = cve.published.as_deref().and_then(extract::parse_published)
            else {
                log::debug!("skipping {cve_id}: no usable publish time");
                return None;
            };

            let metrics = cve.metrics.unwrap_or_default();

            Some(FetchedCve {
                description: extract::pick_description(&cve.descriptions.unwrap_or_default()),
                score: extract::base_score(&metrics),
                cve_id,
                published,
                metrics,
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct NvdResponse {
    #[serde(default)]
    pub vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NvdVulnerability {
    #[serde(default)]
    pub cve: Option<NvdCve>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NvdCve {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub descriptions: Option<Vec<NvdDescription>>,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NvdDescription {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}
