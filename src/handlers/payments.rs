use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::payments::{
    PaymentFilters, PaymentResponse, RecordPaymentRequest, RecordPaymentResponse,
};
use crate::{ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub job_sheet_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Filter by payment method (any casing).
    pub method: Option<String>,
}

/// Record a payment against a job sheet
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<RecordPaymentResponse>),
        (status = 400, description = "Invalid amount or method", body = crate::errors::ErrorResponse),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Job sheet is cancelled", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecordPaymentResponse>>), ServiceError> {
    let recorded = state.services.payments.record_payment(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(recorded))))
}

/// List payments with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Payments retrieved", body = ApiResponse<PaginatedResponse<PaymentResponse>>),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<PaymentResponse>>>, ServiceError> {
    let filters = PaymentFilters {
        job_sheet_id: query.job_sheet_id,
        customer_id: query.customer_id,
        method: query.method,
    };
    let result = state
        .services
        .payments
        .list_payments(filters, query.page, query.limit)
        .await?;
    let total_pages = (result.total + result.per_page - 1) / result.per_page;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.payments,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment retrieved", body = ApiResponse<PaymentResponse>),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    match state.services.payments.get_payment(id).await? {
        Some(payment) => Ok(Json(ApiResponse::success(payment))),
        None => Err(ServiceError::NotFound(format!(
            "Payment with ID {} not found",
            id
        ))),
    }
}

/// Payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_payment))
        .route("/", get(list_payments))
        .route("/:id", get(get_payment))
}
