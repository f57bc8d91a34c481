use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::customers::{
    CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest,
};
use crate::{ApiResponse, ListQuery, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

/// Register a new customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<CustomerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponse>>), ServiceError> {
    let created = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List customers with pagination and optional search
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Matches against name, phone and email"),
    ),
    responses(
        (status = 200, description = "Customers retrieved", body = ApiResponse<PaginatedResponse<CustomerResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerResponse>>>, ServiceError> {
    let result = state
        .services
        .customers
        .list_customers(query.search, query.page, query.limit)
        .await?;
    let total_pages = (result.total + result.per_page - 1) / result.per_page;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.customers,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer retrieved", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    match state.services.customers.get_customer(id).await? {
        Some(customer) => Ok(Json(ApiResponse::success(customer))),
        None => Err(ServiceError::NotFound(format!(
            "Customer with ID {} not found",
            id
        ))),
    }
}

/// Edit a customer's contact details
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let updated = state
        .services
        .customers
        .update_customer(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Customer routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer))
        .route("/", get(list_customers))
        .route("/:id", get(get_customer))
        .route("/:id", put(update_customer))
}
