#[cfg(test)]
mod test;

use crate::Error;
use crate::model::{
    CveRecord, LatestParams, RefreshRequest, RefreshSummary, UpstreamErrorBody,
    ValidationErrorBody,
};
use crate::nvd::NvdClient;
use crate::service::FeedService;
use actix_web::{HttpResponse, Responder, get, post, web};
use utoipa::OpenApi;
use vigil_common::db::Database;

pub fn configure(config: &mut web::ServiceConfig, db: Database, client: NvdClient) {
    let service = FeedService::new(db, client);

    config
        .app_data(web::Data::new(service))
        .service(latest)
        .service(refresh);
}

#[derive(OpenApi)]
#[openapi(
    paths(latest, refresh),
    components(schemas(
        CveRecord,
        RefreshSummary,
        UpstreamErrorBody,
        ValidationErrorBody,
        crate::model::Source,
        vigil_cvss::Severity,
    )),
    tags()
)]
pub struct ApiDoc;

#[utoipa::path(
    tag = "threat-feed",
    operation_id = "latestThreatFeed",
    context_path = "/api",
    params(LatestParams),
    responses(
        (status = 200, description = "The most recently published records, newest first", body = [CveRecord]),
        (status = 502, description = "The live fetch failed", body = UpstreamErrorBody),
    ),
)]
#[get("/threat-feed/latest")]
/// Serve the latest records, from the cache or live from the NVD
pub async fn latest(
    service: web::Data<FeedService>,
    web::Query(params): web::Query<LatestParams>,
) -> Result<impl Responder, Error> {
    let records = service.serve_latest(params.limit, params.source).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    tag = "threat-feed",
    operation_id = "refreshThreatFeed",
    context_path = "/api",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fetched and reconciled into the cache", body = RefreshSummary),
        (status = 400, description = "Request failed validation", body = ValidationErrorBody),
        (status = 502, description = "The live fetch failed", body = UpstreamErrorBody),
    ),
)]
#[post("/threat-feed/refresh")]
/// Fetch live records and reconcile them into the cache
pub async fn refresh(
    service: web::Data<FeedService>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    // an absent body means defaults; a malformed one is a caller error
    let request = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body).map_err(|err| Error::Validation {
            message: err.to_string(),
            field: None,
        })?
    };

    let summary = service.refresh(request.limit).await?;
    Ok(HttpResponse::Ok().json(summary))
}
