use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepairHub API",
        version = "0.3.0",
        description = r#"
# RepairHub Job Sheet API

An API for running the repair counter of a device service business: job sheets,
status tracking, payments and customer records.

## Features

- **Job Sheets**: Open, edit and track repair jobs from intake to delivery
- **Status Workflow**: Guarded status transitions with a full audit history
- **Payments**: Append-only payment records with running paid and balance amounts
- **Customers**: Customer registry with search
- **Dashboard**: Per-status counts, overdue jobs and outstanding balances

## Error Handling

The API uses consistent error response formats with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "timestamp": "2025-01-01T00:00:00Z"
}
```

## Pagination

List endpoints support pagination with the following query parameters:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 20, max: 100)
- `search`: Search term for filtering results
        "#,
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Job Sheets", description = "Job sheet lifecycle endpoints"),
        (name = "Payments", description = "Payment recording endpoints"),
        (name = "Customers", description = "Customer registry endpoints")
    ),
    paths(
        // Job sheets
        crate::handlers::job_sheets::create_job_sheet,
        crate::handlers::job_sheets::list_job_sheets,
        crate::handlers::job_sheets::job_sheet_summary,
        crate::handlers::job_sheets::get_job_sheet,
        crate::handlers::job_sheets::update_job_sheet,
        crate::handlers::job_sheets::change_job_sheet_status,
        crate::handlers::job_sheets::get_job_sheet_history,
        crate::handlers::job_sheets::get_job_sheet_payments,
        crate::handlers::job_sheets::get_quick_amounts,

        // Payments
        crate::handlers::payments::record_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_payment,

        // Customers
        crate::handlers::customers::create_customer,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Job sheet types
            crate::entities::job_sheet::JobStatus,
            crate::entities::job_sheet::JobPriority,
            crate::services::job_sheets::JobSheetResponse,
            crate::services::job_sheets::CreateJobSheetRequest,
            crate::services::job_sheets::UpdateJobSheetRequest,
            crate::services::job_sheets::ChangeStatusRequest,
            crate::services::job_sheets::ChangeStatusResponse,
            crate::services::job_sheets::StatusHistoryResponse,
            crate::services::job_sheets::DashboardSummary,
            crate::services::job_sheets::StatusCount,

            // Payment types
            crate::entities::payment::PaymentMethod,
            crate::services::payments::RecordPaymentRequest,
            crate::services::payments::RecordPaymentResponse,
            crate::services::payments::PaymentResponse,
            crate::ledger::QuickAmounts,

            // Customer types
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::UpdateCustomerRequest,
            crate::services::customers::CustomerResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
