//! Tests for extractor error handling.

use super::*;
use actix_web::{App, post, test as actix_test};
use rstest::rstest;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Payload {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    title: String,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    page: u32,
}

#[post("/echo")]
async fn echo(_payload: web::Json<Payload>, _query: web::Query<Paging>) -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn send(request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(json_config())
            .app_data(query_config())
            .service(echo),
    )
    .await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    (status, serde_json::from_slice(&body).expect("error envelope"))
}

#[rstest]
#[actix_web::test]
async fn malformed_json_uses_the_error_envelope() {
    let request = actix_test::TestRequest::post()
        .uri("/echo?page=1")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json");
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "parse_error");
}

#[rstest]
#[actix_web::test]
async fn wrong_content_type_is_reported() {
    let request = actix_test::TestRequest::post()
        .uri("/echo?page=1")
        .insert_header(("content-type", "text/plain"))
        .set_payload("title=x");
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "unsupported_media_type");
}

#[rstest]
#[actix_web::test]
async fn malformed_query_uses_the_error_envelope() {
    let request = actix_test::TestRequest::post()
        .uri("/echo?page=abc")
        .set_json(serde_json::json!({ "title": "x" }));
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("malformed query string"))
    );
}

#[rstest]
fn actix_errors_are_redacted() {
    let err = Error::from(actix_web::error::ErrorBadGateway("upstream secret"));
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
}
