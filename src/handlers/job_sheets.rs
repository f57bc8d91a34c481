use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::job_sheets::{
    ChangeStatusRequest, ChangeStatusResponse, CreateJobSheetRequest, DashboardSummary,
    JobSheetFilters, JobSheetResponse, StatusHistoryResponse, UpdateJobSheetRequest,
};
use crate::services::payments::PaymentResponse;
use crate::{ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::ledger::QuickAmounts;

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct JobSheetListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Matches against job number, issue description and repair notes.
    pub search: Option<String>,
    /// Filter by status (any casing).
    pub status: Option<String>,
    /// Filter by priority (any casing).
    pub priority: Option<String>,
    pub customer_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Only sheets past their expected completion date.
    #[serde(default)]
    pub overdue: bool,
    pub received_from: Option<NaiveDate>,
    pub received_to: Option<NaiveDate>,
}

impl From<JobSheetListQuery> for JobSheetFilters {
    fn from(query: JobSheetListQuery) -> Self {
        JobSheetFilters {
            status: query.status,
            priority: query.priority,
            customer_id: query.customer_id,
            assigned_to_id: query.assigned_to_id,
            location_id: query.location_id,
            overdue: query.overdue,
            search: query.search,
            received_from: query.received_from,
            received_to: query.received_to,
        }
    }
}

/// Open a new job sheet
#[utoipa::path(
    post,
    path = "/api/v1/job-sheets",
    request_body = CreateJobSheetRequest,
    responses(
        (status = 201, description = "Job sheet created", body = ApiResponse<JobSheetResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn create_job_sheet(
    State(state): State<AppState>,
    Json(request): Json<CreateJobSheetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobSheetResponse>>), ServiceError> {
    let created = state.services.job_sheets.create_job_sheet(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List job sheets with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets",
    params(JobSheetListQuery),
    responses(
        (status = 200, description = "Job sheets retrieved", body = ApiResponse<PaginatedResponse<JobSheetResponse>>),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn list_job_sheets(
    State(state): State<AppState>,
    Query(query): Query<JobSheetListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<JobSheetResponse>>>, ServiceError> {
    let page = query.page;
    let limit = query.limit;
    let result = state
        .services
        .job_sheets
        .list_job_sheets(query.into(), page, limit)
        .await?;
    let total_pages = (result.total + result.per_page - 1) / result.per_page;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.job_sheets,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

/// Workbench dashboard summary
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets/summary",
    responses(
        (status = 200, description = "Summary computed", body = ApiResponse<DashboardSummary>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn job_sheet_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ServiceError> {
    let summary = state.services.job_sheets.dashboard_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Get a job sheet by ID
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets/{id}",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    responses(
        (status = 200, description = "Job sheet retrieved", body = ApiResponse<JobSheetResponse>),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn get_job_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobSheetResponse>>, ServiceError> {
    match state.services.job_sheets.get_job_sheet(id).await? {
        Some(job_sheet) => Ok(Json(ApiResponse::success(job_sheet))),
        None => Err(ServiceError::NotFound(format!(
            "Job sheet with ID {} not found",
            id
        ))),
    }
}

/// Edit an open job sheet
#[utoipa::path(
    put,
    path = "/api/v1/job-sheets/{id}",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    request_body = UpdateJobSheetRequest,
    responses(
        (status = 200, description = "Job sheet updated", body = ApiResponse<JobSheetResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Job sheet is in a terminal status", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn update_job_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobSheetRequest>,
) -> Result<Json<ApiResponse<JobSheetResponse>>, ServiceError> {
    let updated = state
        .services
        .job_sheets
        .update_job_sheet(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Move a job sheet to a new status
#[utoipa::path(
    post,
    path = "/api/v1/job-sheets/{id}/status",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<ChangeStatusResponse>),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn change_job_sheet_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<ChangeStatusResponse>>, ServiceError> {
    let changed = state.services.job_sheets.change_status(id, request).await?;
    Ok(Json(ApiResponse::success(changed)))
}

/// Status history of a job sheet, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets/{id}/history",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<Vec<StatusHistoryResponse>>),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn get_job_sheet_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StatusHistoryResponse>>>, ServiceError> {
    let entries = state.services.job_sheets.get_status_history(id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Payments recorded against a job sheet, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets/{id}/payments",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    responses(
        (status = 200, description = "Payments retrieved", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn get_job_sheet_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ServiceError> {
    let payments = state.services.payments.list_for_job_sheet(id).await?;
    Ok(Json(ApiResponse::success(payments)))
}

/// Suggested cash amounts for settling a job sheet's balance
#[utoipa::path(
    get,
    path = "/api/v1/job-sheets/{id}/payments/quick-amounts",
    params(("id" = Uuid, Path, description = "Job sheet ID")),
    responses(
        (status = 200, description = "Quick amounts computed", body = ApiResponse<QuickAmounts>),
        (status = 404, description = "Job sheet not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Job Sheets"
)]
pub async fn get_quick_amounts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<QuickAmounts>>, ServiceError> {
    let amounts = state.services.payments.quick_amounts(id).await?;
    Ok(Json(ApiResponse::success(amounts)))
}

/// Job sheet routes
pub fn job_sheet_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job_sheet))
        .route("/", get(list_job_sheets))
        .route("/summary", get(job_sheet_summary))
        .route("/:id", get(get_job_sheet))
        .route("/:id", put(update_job_sheet))
        .route("/:id/status", post(change_job_sheet_status))
        .route("/:id/history", get(get_job_sheet_history))
        .route("/:id/payments", get(get_job_sheet_payments))
        .route(
            "/:id/payments/quick-amounts",
            get(get_quick_amounts),
        )
}
