use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, RedemptionEntry, RedemptionSummary, Voucher, DEFAULT_APP_ID, DEFAULT_APP_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-App-Id", DEFAULT_APP_ID)
        .header("X-App-Token", DEFAULT_APP_TOKEN)
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> axum::response::Response {
    app.clone().oneshot(request(method, uri, body)).await.unwrap()
}

async fn create(app: &Router, code: &str, body: &str) -> Voucher {
    let resp = send(app, "POST", &format!("/v1/vouchers/{code}"), body).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/vouchers/").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/vouchers/")
                .header("X-App-Id", DEFAULT_APP_ID)
                .header("X-App-Token", "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn matching_credentials_reach_the_handler() {
    let resp = send(&app(), "GET", "/v1/vouchers/", "").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 0);
}

// --- create / get ---

#[tokio::test]
async fn create_with_code_uses_path_code() {
    let app = app();
    let voucher = create(
        &app,
        "SPRING",
        r#"{"code":"SPRING","discount":{"type":"AMOUNT","amount_off":500}}"#,
    )
    .await;

    assert_eq!(voucher.code, "SPRING");
    assert!(voucher.active);
    assert_eq!(voucher.discount.unwrap()["amount_off"], 500);
}

#[tokio::test]
async fn create_without_code_generates_one() {
    let app = app();
    let resp = send(&app, "POST", "/v1/vouchers/", r#"{"category":"new"}"#).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let voucher: Voucher = body_json(resp).await;
    assert_eq!(voucher.code.len(), 8);
    assert_eq!(voucher.category.as_deref(), Some("new"));
}

#[tokio::test]
async fn duplicate_code_returns_409() {
    let app = app();
    create(&app, "DUP", "{}").await;
    let resp = send(&app, "POST", "/v1/vouchers/DUP", "{}").await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_payload_returns_400() {
    let app = app();
    let resp = send(&app, "POST", "/v1/vouchers/BAD", "{not json").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_voucher_returns_404() {
    let app = app();
    let resp = send(&app, "GET", "/v1/vouchers/NOPE", "").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn get_decodes_percent_encoded_code() {
    let app = app();
    create(&app, "A%20B", "{}").await;
    let resp = send(&app, "GET", "/v1/vouchers/A%20B", "").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let voucher: Voucher = body_json(resp).await;
    assert_eq!(voucher.code, "A B");
}

// --- enable / disable ---

#[tokio::test]
async fn disable_then_enable() {
    let app = app();
    create(&app, "TOGGLE", "{}").await;

    let resp = send(&app, "POST", "/v1/vouchers/TOGGLE/disable", "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let voucher: Voucher = body_json(resp).await;
    assert!(!voucher.active);

    let resp = send(&app, "POST", "/v1/vouchers/TOGGLE/enable", "").await;
    let voucher: Voucher = body_json(resp).await;
    assert!(voucher.active);
}

#[tokio::test]
async fn enable_unknown_returns_404() {
    let app = app();
    let resp = send(&app, "POST", "/v1/vouchers/NOPE/enable", "").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- redeem / rollback ---

#[tokio::test]
async fn redeem_records_entry_and_customer() {
    let app = app();
    create(&app, "R1", "{}").await;

    let resp = send(
        &app,
        "POST",
        "/v1/vouchers/R1/redemption/?tracking_id=t1",
        r#"{"customer":{"source_id":"alice"}}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entry: RedemptionEntry = body_json(resp).await;
    assert_eq!(entry.tracking_id.as_deref(), Some("t1"));
    assert_eq!(entry.customer.unwrap()["source_id"], "alice");

    let resp = send(&app, "GET", "/v1/vouchers/R1/redemption/", "").await;
    let summary: RedemptionSummary = body_json(resp).await;
    assert_eq!(summary.redeemed_quantity, 1);
    assert_eq!(summary.redemption_entries.len(), 1);
}

#[tokio::test]
async fn redeem_disabled_voucher_returns_400() {
    let app = app();
    create(&app, "OFF", r#"{"active":false}"#).await;
    let resp = send(&app, "POST", "/v1/vouchers/OFF/redemption/", "").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redeem_beyond_limit_returns_400() {
    let app = app();
    create(&app, "ONCE", r#"{"redemption":{"quantity":1}}"#).await;

    let first = send(&app, "POST", "/v1/vouchers/ONCE/redemption/", "").await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = send(&app, "POST", "/v1/vouchers/ONCE/redemption/", "").await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let text = body_bytes(second).await;
    assert!(String::from_utf8_lossy(&text).contains("quantity exceeded"));
}

#[tokio::test]
async fn rollback_returns_redemption_to_pool() {
    let app = app();
    create(&app, "ONCE", r#"{"redemption":{"quantity":1}}"#).await;
    let resp = send(&app, "POST", "/v1/vouchers/ONCE/redemption/", "").await;
    let entry: RedemptionEntry = body_json(resp).await;

    let resp = send(
        &app,
        "POST",
        &format!("/v1/redemptions/{}/rollback/?reason=mistake", entry.id),
        "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rollback: RedemptionEntry = body_json(resp).await;
    assert_eq!(rollback.object, "redemption_rollback");
    assert_eq!(rollback.reason.as_deref(), Some("mistake"));
    assert_eq!(rollback.redemption.as_deref(), Some(entry.id.as_str()));

    let again = send(&app, "POST", "/v1/vouchers/ONCE/redemption/", "").await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn rollback_twice_returns_400() {
    let app = app();
    create(&app, "R2", "{}").await;
    let resp = send(&app, "POST", "/v1/vouchers/R2/redemption/", "").await;
    let entry: RedemptionEntry = body_json(resp).await;
    let uri = format!("/v1/redemptions/{}/rollback/", entry.id);

    assert_eq!(send(&app, "POST", &uri, "").await.status(), StatusCode::OK);
    assert_eq!(send(&app, "POST", &uri, "").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rollback_unknown_returns_404() {
    let app = app();
    let resp = send(&app, "POST", "/v1/redemptions/r_missing/rollback/", "").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- lists ---

#[tokio::test]
async fn list_vouchers_filters_and_pages() {
    let app = app();
    create(&app, "A1", r#"{"campaign":"A"}"#).await;
    create(&app, "A2", r#"{"campaign":"A"}"#).await;
    create(&app, "B1", r#"{"campaign":"B"}"#).await;

    let resp = send(&app, "GET", "/v1/vouchers/?campaign=A", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["vouchers"].as_array().unwrap().len(), 2);

    let resp = send(&app, "GET", "/v1/vouchers/?campaign=A&limit=1&skip=1", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["vouchers"][0]["code"], "A2");

    let resp = send(&app, "GET", "/v1/vouchers/?code_query=b", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn list_redemptions_filters_by_result() {
    let app = app();
    create(&app, "OK", "{}").await;
    create(&app, "OFF", r#"{"active":false}"#).await;
    send(&app, "POST", "/v1/vouchers/OK/redemption/", "").await;
    send(&app, "POST", "/v1/vouchers/OFF/redemption/", "").await;
    send(&app, "POST", "/v1/vouchers/GONE/redemption/", "").await;

    let resp = send(&app, "GET", "/v1/redemptions/", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 3);

    let resp = send(&app, "GET", "/v1/redemptions/?result=Failure-Inactive", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["redemptions"][0]["voucher"], "OFF");

    let resp = send(&app, "GET", "/v1/redemptions/?result=Failure-NotExist", "").await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["redemptions"][0]["voucher"], "GONE");
}

#[tokio::test]
async fn list_redemptions_rejects_bad_dates() {
    let app = app();
    let resp = send(&app, "GET", "/v1/redemptions/?start_date=someday", "").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_redemptions_with_huge_page_is_empty() {
    let app = app();
    create(&app, "P1", "{}").await;
    send(&app, "POST", "/v1/vouchers/P1/redemption/", "").await;

    let uri = format!("/v1/redemptions/?page={}&limit=2", u64::MAX);
    let resp = send(&app, "GET", &uri, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert!(body["redemptions"].as_array().unwrap().is_empty());
}
