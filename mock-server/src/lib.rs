use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_APP_ID: &str = "test-app-id";
pub const DEFAULT_APP_TOKEN: &str = "test-app-token";

pub const RESULT_SUCCESS: &str = "Success";
pub const RESULT_NOT_EXIST: &str = "Failure-NotExist";
pub const RESULT_INACTIVE: &str = "Failure-Inactive";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    pub active: bool,
    pub redemption: RedemptionSummary,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RedemptionSummary {
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub redeemed_quantity: u64,
    #[serde(default)]
    pub redemption_entries: Vec<RedemptionEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedemptionEntry {
    pub id: String,
    /// `redemption` or `redemption_rollback`.
    pub object: String,
    pub date: DateTime<Utc>,
    pub voucher: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// For rollbacks: the redemption that was rolled back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redemption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateVoucher {
    pub code: Option<String>,
    pub campaign: Option<String>,
    pub category: Option<String>,
    pub discount: Option<Value>,
    pub start_date: Option<String>,
    pub expiration_date: Option<String>,
    pub redemption: Option<RedemptionLimit>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RedemptionLimit {
    pub quantity: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Store {
    vouchers: BTreeMap<String, Voucher>,
    /// Every redemption attempt and rollback, in order.
    redemptions: Vec<RedemptionEntry>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    app_id: Arc<str>,
    app_token: Arc<str>,
}

/// Error body shaped like the real service's: `{"code": 404, "message": "..."}`.
#[derive(Debug)]
pub struct ServiceError {
    status: StatusCode,
    message: String,
}

impl ServiceError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Cannot find {what} with id {id}"))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({"code": self.status.as_u16(), "message": self.message}));
        (self.status, body).into_response()
    }
}

type ServiceResult<T> = Result<Json<T>, ServiceError>;

pub fn app() -> Router {
    app_with_credentials(DEFAULT_APP_ID, DEFAULT_APP_TOKEN)
}

pub fn app_with_credentials(app_id: &str, app_token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        app_id: Arc::from(app_id),
        app_token: Arc::from(app_token),
    };
    let api = Router::new()
        .route("/vouchers/", get(list_vouchers).post(create_generated_voucher))
        .route("/vouchers/{code}", get(get_voucher).post(create_voucher))
        .route("/vouchers/{code}/enable", post(enable_voucher))
        .route("/vouchers/{code}/disable", post(disable_voucher))
        .route("/vouchers/{code}/redemption/", get(get_redemption).post(redeem_voucher))
        .route("/redemptions/", get(list_redemptions))
        .route("/redemptions/{id}/rollback/", post(rollback_redemption))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_credentials))
        .with_state(state);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_credentials(listener, DEFAULT_APP_ID, DEFAULT_APP_TOKEN).await
}

pub async fn run_with_credentials(
    listener: TcpListener,
    app_id: &str,
    app_token: &str,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_credentials(app_id, app_token)).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

async fn require_credentials(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let app_id = header_value(request.headers(), "x-app-id");
    let app_token = header_value(request.headers(), "x-app-token");
    if app_id.as_deref() != Some(&*state.app_id) || app_token.as_deref() != Some(&*state.app_token) {
        debug!(?app_id, "rejecting request with bad credentials");
        return ServiceError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(request).await
}

/// Decode an optional JSON body; an empty body yields the default value.
fn json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::new(StatusCode::BAD_REQUEST, format!("Invalid payload: {e}")))
}

fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn short_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

async fn insert_voucher(db: &Db, code: String, input: CreateVoucher) -> ServiceResult<Voucher> {
    let mut store = db.write().await;
    if store.vouchers.contains_key(&code) {
        return Err(ServiceError::new(
            StatusCode::CONFLICT,
            format!("Duplicate resource key: {code}"),
        ));
    }
    let voucher = Voucher {
        code: code.clone(),
        campaign: input.campaign,
        category: input.category,
        discount: input.discount,
        start_date: input.start_date,
        expiration_date: input.expiration_date,
        active: input.active.unwrap_or(true),
        redemption: RedemptionSummary {
            quantity: input.redemption.and_then(|r| r.quantity),
            ..RedemptionSummary::default()
        },
    };
    store.vouchers.insert(code, voucher.clone());
    Ok(Json(voucher))
}

async fn create_voucher(
    State(state): State<AppState>,
    Path(code): Path<String>,
    body: Bytes,
) -> ServiceResult<Voucher> {
    let input: CreateVoucher = json_body(&body)?;
    insert_voucher(&state.db, code, input).await
}

async fn create_generated_voucher(State(state): State<AppState>, body: Bytes) -> ServiceResult<Voucher> {
    let mut input: CreateVoucher = json_body(&body)?;
    let code = input.code.take().unwrap_or_else(generate_code);
    insert_voucher(&state.db, code, input).await
}

async fn get_voucher(State(state): State<AppState>, Path(code): Path<String>) -> ServiceResult<Voucher> {
    let store = state.db.read().await;
    store
        .vouchers
        .get(&code)
        .cloned()
        .map(Json)
        .ok_or_else(|| ServiceError::not_found("voucher", &code))
}

async fn set_active(db: &Db, code: &str, active: bool) -> ServiceResult<Voucher> {
    let mut store = db.write().await;
    let voucher = store
        .vouchers
        .get_mut(code)
        .ok_or_else(|| ServiceError::not_found("voucher", code))?;
    voucher.active = active;
    Ok(Json(voucher.clone()))
}

async fn enable_voucher(State(state): State<AppState>, Path(code): Path<String>) -> ServiceResult<Voucher> {
    set_active(&state.db, &code, true).await
}

async fn disable_voucher(State(state): State<AppState>, Path(code): Path<String>) -> ServiceResult<Voucher> {
    set_active(&state.db, &code, false).await
}

async fn get_redemption(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ServiceResult<RedemptionSummary> {
    let store = state.db.read().await;
    store
        .vouchers
        .get(&code)
        .map(|v| Json(v.redemption.clone()))
        .ok_or_else(|| ServiceError::not_found("voucher", &code))
}

#[derive(Debug, Deserialize)]
pub struct TrackingParams {
    pub tracking_id: Option<String>,
    pub reason: Option<String>,
}

async fn redeem_voucher(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<TrackingParams>,
    body: Bytes,
) -> ServiceResult<RedemptionEntry> {
    let context: Map<String, Value> = json_body(&body)?;
    let mut entry = RedemptionEntry {
        id: short_id("r"),
        object: "redemption".to_string(),
        date: Utc::now(),
        voucher: code.clone(),
        result: RESULT_SUCCESS.to_string(),
        tracking_id: params.tracking_id,
        customer: context.get("customer").cloned(),
        reason: None,
        redemption: None,
    };

    let mut store = state.db.write().await;
    let Some(voucher) = store.vouchers.get(&code) else {
        entry.result = RESULT_NOT_EXIST.to_string();
        store.redemptions.push(entry);
        return Err(ServiceError::not_found("voucher", &code));
    };
    if !voucher.active {
        entry.result = RESULT_INACTIVE.to_string();
        store.redemptions.push(entry);
        return Err(ServiceError::new(StatusCode::BAD_REQUEST, "voucher is disabled"));
    }
    if let Some(quantity) = voucher.redemption.quantity {
        if voucher.redemption.redeemed_quantity >= quantity {
            return Err(ServiceError::new(StatusCode::BAD_REQUEST, "quantity exceeded"));
        }
    }

    if let Some(voucher) = store.vouchers.get_mut(&code) {
        voucher.redemption.redeemed_quantity += 1;
        voucher.redemption.redemption_entries.push(entry.clone());
    }
    store.redemptions.push(entry.clone());
    info!(code = %code, id = %entry.id, "voucher redeemed");
    Ok(Json(entry))
}

async fn rollback_redemption(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TrackingParams>,
) -> ServiceResult<RedemptionEntry> {
    let mut store = state.db.write().await;
    let original = store
        .redemptions
        .iter()
        .find(|e| e.id == id && e.object == "redemption" && e.result == RESULT_SUCCESS)
        .cloned()
        .ok_or_else(|| ServiceError::not_found("redemption", &id))?;
    let already = store
        .redemptions
        .iter()
        .any(|e| e.redemption.as_deref() == Some(id.as_str()));
    if already {
        return Err(ServiceError::new(
            StatusCode::BAD_REQUEST,
            format!("Redemption {id} has already been rolled back"),
        ));
    }

    let rollback = RedemptionEntry {
        id: short_id("rr"),
        object: "redemption_rollback".to_string(),
        date: Utc::now(),
        voucher: original.voucher.clone(),
        result: RESULT_SUCCESS.to_string(),
        tracking_id: params.tracking_id.or(original.tracking_id),
        customer: original.customer,
        reason: params.reason,
        redemption: Some(id),
    };
    if let Some(voucher) = store.vouchers.get_mut(&original.voucher) {
        voucher.redemption.redeemed_quantity = voucher.redemption.redeemed_quantity.saturating_sub(1);
        voucher.redemption.redemption_entries.push(rollback.clone());
    }
    store.redemptions.push(rollback.clone());
    Ok(Json(rollback))
}

#[derive(Debug, Deserialize)]
pub struct VoucherQuery {
    pub code_query: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub campaign: Option<String>,
    pub category: Option<String>,
    pub customer: Option<String>,
}

async fn list_vouchers(State(state): State<AppState>, Query(q): Query<VoucherQuery>) -> Json<Value> {
    let store = state.db.read().await;
    let matching: Vec<&Voucher> = store
        .vouchers
        .values()
        .filter(|v| q.campaign.is_none() || v.campaign == q.campaign)
        .filter(|v| q.category.is_none() || v.category == q.category)
        .filter(|v| {
            q.code_query
                .as_deref()
                .is_none_or(|needle| v.code.to_lowercase().contains(&needle.to_lowercase()))
        })
        .collect();
    let page: Vec<&Voucher> = matching
        .iter()
        .copied()
        .skip(q.skip.unwrap_or(0))
        .take(q.limit.unwrap_or(10))
        .collect();
    Json(json!({
        "object": "list",
        "data_ref": "vouchers",
        "vouchers": page,
        "total": matching.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RedemptionQuery {
    pub limit: Option<usize>,
    pub page: Option<usize>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub result: Option<String>,
    pub customer: Option<String>,
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| ServiceError::new(StatusCode::BAD_REQUEST, format!("Invalid date {raw}: {e}")))
}

fn customer_matches(customer: Option<&Value>, wanted: &str) -> bool {
    customer.is_some_and(|c| {
        ["id", "source_id"]
            .iter()
            .any(|key| c.get(key).and_then(Value::as_str) == Some(wanted))
    })
}

async fn list_redemptions(
    State(state): State<AppState>,
    Query(q): Query<RedemptionQuery>,
) -> ServiceResult<Value> {
    let start = q.start_date.as_deref().map(parse_date).transpose()?;
    let end = q.end_date.as_deref().map(parse_date).transpose()?;
    let limit = q.limit.unwrap_or(100);
    let page = q.page.unwrap_or(0);

    let store = state.db.read().await;
    let matching: Vec<&RedemptionEntry> = store
        .redemptions
        .iter()
        .filter(|e| e.object == "redemption")
        .filter(|e| q.result.as_deref().is_none_or(|r| e.result == r))
        .filter(|e| start.is_none_or(|s| e.date >= s))
        .filter(|e| end.is_none_or(|t| e.date <= t))
        .filter(|e| {
            q.customer
                .as_deref()
                .is_none_or(|c| customer_matches(e.customer.as_ref(), c))
        })
        .collect();
    let entries: Vec<&RedemptionEntry> = matching
        .iter()
        .copied()
        .skip(page.saturating_mul(limit))
        .take(limit)
        .collect();
    Ok(Json(json!({
        "object": "list",
        "data_ref": "redemptions",
        "redemptions": entries,
        "total": matching.len(),
    })))
}
