use super::*;
use actix_http::StatusCode;
use actix_web::App;
use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
use serde_json::{Value, json};
use test_log::test;
use url::Url;

/// The API scope under test. The upstream endpoint is unroutable, so any
/// live fetch fails fast; cache-only paths must never notice.
fn api(db: Database) -> Result<actix_web::Scope, anyhow::Error> {
    let client = NvdClient::with_endpoint(Url::parse("http://127.0.0.1:9/")?)?;
    Ok(web::scope("/api").configure(move |config| configure(config, db, client)))
}

#[test(actix_web::test)]
async fn latest_from_empty_cache_is_an_empty_list() -> Result<(), anyhow::Error> {
    let db = Database::for_test("latest_from_empty_cache").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    // source defaults to cache: no upstream call is made, so the
    // unroutable client cannot turn this into a 502
    let request = TestRequest::get()
        .uri("/api/threat-feed/latest")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_body_json(response).await;
    assert_eq!(body, json!([]));

    Ok(())
}

#[test(actix_web::test)]
async fn latest_clamps_out_of_range_limits() -> Result<(), anyhow::Error> {
    let db = Database::for_test("latest_clamps_limits").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    let request = TestRequest::get()
        .uri("/api/threat-feed/latest?limit=9999")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[test(actix_web::test)]
async fn latest_live_source_reports_upstream_failure() -> Result<(), anyhow::Error> {
    let db = Database::for_test("latest_live_source_upstream_failure").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    let request = TestRequest::get()
        .uri("/api/threat-feed/latest?source=nvd")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: UpstreamErrorBody = read_body_json(response).await;
    assert!(!body.message.is_empty());
    assert_eq!(body.upstream, "nvd");

    Ok(())
}

#[test(actix_web::test)]
async fn refresh_failure_leaves_the_cache_untouched() -> Result<(), anyhow::Error> {
    let db = Database::for_test("refresh_failure_cache_untouched").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    let request = TestRequest::post()
        .uri("/api/threat-feed/refresh")
        .set_json(json!({"limit": 10}))
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: UpstreamErrorBody = read_body_json(response).await;
    assert!(!body.message.is_empty());
    assert_eq!(body.upstream, "nvd");

    // the failed refresh must not have written anything
    let request = TestRequest::get()
        .uri("/api/threat-feed/latest")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_body_json(response).await;
    assert_eq!(body, json!([]));

    Ok(())
}

#[test(actix_web::test)]
async fn refresh_rejects_out_of_range_limit() -> Result<(), anyhow::Error> {
    let db = Database::for_test("refresh_rejects_limit").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    for limit in [0, -1, 201] {
        let request = TestRequest::post()
            .uri("/api/threat-feed/refresh")
            .set_json(json!({"limit": limit}))
            .to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ValidationErrorBody = read_body_json(response).await;
        assert!(!body.message.is_empty());
        assert_eq!(body.field.as_deref(), Some("limit"));
    }

    Ok(())
}

#[test(actix_web::test)]
async fn refresh_rejects_a_malformed_body() -> Result<(), anyhow::Error> {
    let db = Database::for_test("refresh_rejects_malformed_body").await?;
    let app = init_service(App::new().service(api(db)?)).await;

    let request = TestRequest::post()
        .uri("/api/threat-feed/refresh")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"limit": "many"}"#)
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ValidationErrorBody = read_body_json(response).await;
    assert!(!body.message.is_empty());
    assert_eq!(body.field, None);

    Ok(())
}
