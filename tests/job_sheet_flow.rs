//! Service-level walk of the job sheet ledger against in-memory sqlite.
//!
//! Covers the full lifecycle: intake, status workflow, payment recording with
//! balance recomputation, overdue evaluation and the dashboard rollup.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use uuid::Uuid;

use repairhub_api::db::{run_migrations, DbPool};
use repairhub_api::entities::job_sheet::JobStatus;
use repairhub_api::errors::ServiceError;
use repairhub_api::services::customers::{CreateCustomerRequest, CustomerService};
use repairhub_api::services::job_sheets::{
    ChangeStatusRequest, CreateJobSheetRequest, JobSheetFilters, JobSheetService,
    UpdateJobSheetRequest,
};
use repairhub_api::services::payments::{PaymentService, RecordPaymentRequest};

struct TestApp {
    job_sheets: JobSheetService,
    payments: PaymentService,
    customers: CustomerService,
}

async fn build_app() -> TestApp {
    // A single pooled connection keeps every query on the same memory db.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db: DbPool = Database::connect(options)
        .await
        .expect("connect in-memory sqlite");
    run_migrations(&db).await.expect("apply migrations");

    let db = Arc::new(db);
    TestApp {
        job_sheets: JobSheetService::new(db.clone(), None),
        payments: PaymentService::new(db.clone(), None),
        customers: CustomerService::new(db, None),
    }
}

async fn seed_customer(app: &TestApp) -> Uuid {
    app.customers
        .create_customer(CreateCustomerRequest {
            name: "Kasun Silva".to_string(),
            phone: Some("0712345678".to_string()),
            email: Some("kasun@example.com".to_string()),
            address: None,
        })
        .await
        .expect("create customer")
        .id
}

fn intake_request(customer_id: Uuid) -> CreateJobSheetRequest {
    CreateJobSheetRequest {
        customer_id,
        device_id: Uuid::new_v4(),
        location_id: Uuid::new_v4(),
        assigned_to_id: None,
        issue_description: "Screen cracked after a fall, touch unresponsive".to_string(),
        priority: Some("high".to_string()),
        labour_cost: Some(dec!(1000)),
        parts_cost: Some(dec!(500)),
        discount_amount: Some(dec!(200)),
        received_date: None,
        expected_completion_date: None,
        warranty_period_days: Some(90),
        diagnosis_notes: None,
    }
}

fn payment_request(job_sheet_id: Uuid, amount: Decimal) -> RecordPaymentRequest {
    RecordPaymentRequest {
        job_sheet_id,
        amount,
        method: "cash".to_string(),
        reference: None,
        notes: None,
        customer_id: None,
    }
}

async fn move_to(app: &TestApp, job_sheet_id: Uuid, status: &str) {
    app.job_sheets
        .change_status(
            job_sheet_id,
            ChangeStatusRequest {
                status: status.to_string(),
                remarks: None,
            },
        )
        .await
        .unwrap_or_else(|e| panic!("transition to {} failed: {}", status, e));
}

#[tokio::test]
async fn intake_computes_totals_and_opens_in_pending() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;

    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    assert_eq!(sheet.status, JobStatus::Pending);
    assert_eq!(sheet.total_amount, dec!(1300));
    assert_eq!(sheet.paid_amount, Decimal::ZERO);
    assert_eq!(sheet.balance_amount, dec!(1300));
    assert!(sheet.job_number.starts_with("JS-"));
    assert!(sheet.completed_date.is_none());
    assert!(sheet.delivered_date.is_none());

    let history = app
        .job_sheets
        .get_status_history(sheet.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].to_status, JobStatus::Pending);
}

#[tokio::test]
async fn short_issue_description_creates_nothing() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;

    let mut request = intake_request(customer_id);
    request.issue_description = "worn".to_string();

    let result = app.job_sheets.create_job_sheet(request).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    let listed = app
        .job_sheets
        .list_job_sheets(JobSheetFilters::default(), 1, 20)
        .await
        .expect("list");
    assert_eq!(listed.total, 0);
}

#[tokio::test]
async fn partial_payments_settle_the_balance() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    let first = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(800)))
        .await
        .expect("first payment");
    assert_eq!(first.paid_amount, dec!(800));
    assert_eq!(first.balance_amount, dec!(500));
    assert!(!first.overpayment);
    assert!(first.payment.payment_number.starts_with("PAY-"));

    let second = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(500)))
        .await
        .expect("second payment");
    assert_eq!(second.paid_amount, dec!(1300));
    assert_eq!(second.balance_amount, Decimal::ZERO);
    assert!(!second.overpayment);

    // Stored amounts match the recomputed sum, and the rows read back oldest
    // first.
    let reloaded = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(reloaded.paid_amount, dec!(1300));
    assert_eq!(reloaded.balance_amount, Decimal::ZERO);

    let rows = app
        .payments
        .list_for_job_sheet(sheet.id)
        .await
        .expect("payments for sheet");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].amount, dec!(800));
    assert_eq!(rows[1].amount, dec!(500));
    let summed: Decimal = rows.iter().map(|p| p.amount).sum();
    assert_eq!(summed, reloaded.paid_amount);
}

#[tokio::test]
async fn overpayment_succeeds_with_warning_and_zero_balance() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    let recorded = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(1500)))
        .await
        .expect("overpayment still succeeds");

    assert!(recorded.overpayment);
    assert_eq!(recorded.paid_amount, dec!(1500));
    assert_eq!(recorded.balance_amount, Decimal::ZERO);
}

#[tokio::test]
async fn non_positive_amounts_leave_the_sheet_untouched() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    let zero = app
        .payments
        .record_payment(payment_request(sheet.id, Decimal::ZERO))
        .await;
    assert!(matches!(zero, Err(ServiceError::InvalidAmount(_))));

    let negative = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(-50)))
        .await;
    assert!(matches!(negative, Err(ServiceError::InvalidAmount(_))));

    let reloaded = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(reloaded.paid_amount, Decimal::ZERO);
    assert_eq!(reloaded.balance_amount, dec!(1300));
    assert!(app
        .payments
        .list_for_job_sheet(sheet.id)
        .await
        .expect("payments")
        .is_empty());
}

#[tokio::test]
async fn payment_against_missing_or_cancelled_sheet_fails() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;

    let missing = app
        .payments
        .record_payment(payment_request(Uuid::new_v4(), dec!(100)))
        .await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));

    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");
    move_to(&app, sheet.id, "cancelled").await;

    let on_cancelled = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(100)))
        .await;
    assert!(matches!(on_cancelled, Err(ServiceError::InvalidTransition(_))));
}

#[tokio::test]
async fn payment_customer_must_match_the_sheet() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    let mut mismatched = payment_request(sheet.id, dec!(100));
    mismatched.customer_id = Some(Uuid::new_v4());
    let result = app.payments.record_payment(mismatched).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Omitted customer id is filled in from the sheet.
    let recorded = app
        .payments
        .record_payment(payment_request(sheet.id, dec!(100)))
        .await
        .expect("payment");
    assert_eq!(recorded.payment.customer_id, customer_id);
}

#[tokio::test]
async fn workflow_walks_the_main_line_and_stamps_dates_once() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    move_to(&app, sheet.id, "in_progress").await;
    move_to(&app, sheet.id, "waiting_parts").await;
    move_to(&app, sheet.id, "in_progress").await;
    move_to(&app, sheet.id, "quality_check").await;
    move_to(&app, sheet.id, "ready_delivery").await;

    let after_ready = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    let completed_date = after_ready.completed_date.expect("completed date set");
    let warranty_expiry = after_ready.warranty_expiry.expect("warranty derived");
    assert_eq!(
        warranty_expiry,
        completed_date.date_naive() + Duration::days(90)
    );

    // Rework loop re-enters ready_delivery; the stamp must not move.
    move_to(&app, sheet.id, "quality_check").await;
    move_to(&app, sheet.id, "ready_delivery").await;
    let after_rework = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(after_rework.completed_date, Some(completed_date));

    move_to(&app, sheet.id, "delivered").await;
    let delivered = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(delivered.status, JobStatus::Delivered);
    assert!(delivered.delivered_date.is_some());
    assert_eq!(delivered.completed_date, Some(completed_date));
}

#[tokio::test]
async fn every_transition_appends_one_history_row() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    // No-op re-assertion still writes a row.
    let noop = app
        .job_sheets
        .change_status(
            sheet.id,
            ChangeStatusRequest {
                status: "pending".to_string(),
                remarks: Some("customer called to confirm".to_string()),
            },
        )
        .await
        .expect("no-op transition");
    assert_eq!(noop.history_entry.from_status, Some(JobStatus::Pending));
    assert_eq!(noop.history_entry.to_status, JobStatus::Pending);

    move_to(&app, sheet.id, "in_progress").await;
    move_to(&app, sheet.id, "on_hold").await;
    move_to(&app, sheet.id, "in_progress").await;

    let history = app
        .job_sheets
        .get_status_history(sheet.id)
        .await
        .expect("history");
    // Opening entry plus four transitions.
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].from_status, None);
    assert_eq!(
        history[1].remarks.as_deref(),
        Some("customer called to confirm")
    );
    assert_eq!(history[3].to_status, JobStatus::OnHold);
    assert_eq!(history[4].from_status, Some(JobStatus::OnHold));
}

#[tokio::test]
async fn terminal_sheets_freeze_status_and_edits() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");
    move_to(&app, sheet.id, "cancelled").await;

    let reopen = app
        .job_sheets
        .change_status(
            sheet.id,
            ChangeStatusRequest {
                status: "in_progress".to_string(),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(reopen, Err(ServiceError::InvalidTransition(_))));

    let edit = app
        .job_sheets
        .update_job_sheet(
            sheet.id,
            UpdateJobSheetRequest {
                labour_cost: Some(dec!(50)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(edit, Err(ServiceError::InvalidTransition(_))));

    // Cancelling preserves the audit rows written so far.
    let history = app
        .job_sheets
        .get_status_history(sheet.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn undefined_status_and_denied_moves_are_rejected() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    let unknown = app
        .job_sheets
        .change_status(
            sheet.id,
            ChangeStatusRequest {
                status: "shipped".to_string(),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(unknown, Err(ServiceError::InvalidTransition(_))));

    // pending cannot jump straight to delivered.
    let jump = app
        .job_sheets
        .change_status(
            sheet.id,
            ChangeStatusRequest {
                status: "delivered".to_string(),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(jump, Err(ServiceError::InvalidTransition(_))));

    let reloaded = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(reloaded.status, JobStatus::Pending);
}

#[tokio::test]
async fn cost_edits_recompute_totals_against_recorded_payments() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    app.payments
        .record_payment(payment_request(sheet.id, dec!(800)))
        .await
        .expect("payment");

    // Parts ended up cheaper than quoted.
    let updated = app
        .job_sheets
        .update_job_sheet(
            sheet.id,
            UpdateJobSheetRequest {
                parts_cost: Some(dec!(300)),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.total_amount, dec!(1100));
    assert_eq!(updated.paid_amount, dec!(800));
    assert_eq!(updated.balance_amount, dec!(300));

    // A discount larger than the remaining cost clamps the total at zero.
    let clamped = app
        .job_sheets
        .update_job_sheet(
            sheet.id,
            UpdateJobSheetRequest {
                discount_amount: Some(dec!(5000)),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(clamped.total_amount, Decimal::ZERO);
    assert_eq!(clamped.balance_amount, Decimal::ZERO);

    let negative = app
        .job_sheets
        .update_job_sheet(
            sheet.id,
            UpdateJobSheetRequest {
                labour_cost: Some(dec!(-10)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(negative, Err(ServiceError::InvalidAmount(_))));
}

#[tokio::test]
async fn overdue_flag_follows_status_and_expected_date() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let yesterday = Utc::now().date_naive() - Duration::days(1);

    let mut request = intake_request(customer_id);
    request.expected_completion_date = Some(yesterday);
    let sheet = app
        .job_sheets
        .create_job_sheet(request)
        .await
        .expect("create job sheet");

    move_to(&app, sheet.id, "in_progress").await;
    let in_progress = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert!(in_progress.is_overdue);

    let overdue_list = app
        .job_sheets
        .list_job_sheets(
            JobSheetFilters {
                overdue: true,
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("list overdue");
    assert_eq!(overdue_list.total, 1);

    move_to(&app, sheet.id, "completed").await;
    let completed = app
        .job_sheets
        .get_job_sheet(sheet.id)
        .await
        .expect("get")
        .expect("exists");
    assert!(!completed.is_overdue);

    let none_overdue = app
        .job_sheets
        .list_job_sheets(
            JobSheetFilters {
                overdue: true,
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("list overdue");
    assert_eq!(none_overdue.total, 0);
}

#[tokio::test]
async fn listing_filters_by_status_and_search() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;

    let cracked = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");
    let mut battery = intake_request(customer_id);
    battery.issue_description = "Battery drains from full within an hour".to_string();
    battery.priority = Some("low".to_string());
    let battery = app
        .job_sheets
        .create_job_sheet(battery)
        .await
        .expect("create job sheet");
    move_to(&app, battery.id, "in_progress").await;

    let pending_only = app
        .job_sheets
        .list_job_sheets(
            JobSheetFilters {
                status: Some("PENDING".to_string()),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("list by status");
    assert_eq!(pending_only.total, 1);
    assert_eq!(pending_only.job_sheets[0].id, cracked.id);

    let searched = app
        .job_sheets
        .list_job_sheets(
            JobSheetFilters {
                search: Some("battery".to_string()),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("search");
    assert_eq!(searched.total, 1);
    assert_eq!(searched.job_sheets[0].id, battery.id);

    let bad_filter = app
        .job_sheets
        .list_job_sheets(
            JobSheetFilters {
                status: Some("shipped".to_string()),
                ..Default::default()
            },
            1,
            20,
        )
        .await;
    assert!(matches!(bad_filter, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn quick_amounts_track_the_persisted_balance() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;
    let sheet = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");

    app.payments
        .record_payment(payment_request(sheet.id, dec!(800)))
        .await
        .expect("payment");

    let amounts = app
        .payments
        .quick_amounts(sheet.id)
        .await
        .expect("quick amounts");
    assert_eq!(amounts.full, dec!(500));
    assert_eq!(amounts.half, dec!(250));
    assert_eq!(
        amounts.denominations,
        vec![dec!(500), dec!(1000), dec!(2000), dec!(5000)]
    );

    let missing = app.payments.quick_amounts(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn dashboard_summary_rolls_up_counts_and_money() {
    let app = build_app().await;
    let customer_id = seed_customer(&app).await;

    // One open overdue sheet with a partial payment.
    let mut overdue = intake_request(customer_id);
    overdue.expected_completion_date = Some(Utc::now().date_naive() - Duration::days(3));
    let overdue = app
        .job_sheets
        .create_job_sheet(overdue)
        .await
        .expect("create job sheet");
    move_to(&app, overdue.id, "in_progress").await;
    app.payments
        .record_payment(payment_request(overdue.id, dec!(300)))
        .await
        .expect("payment");

    // One cancelled sheet whose balance no longer counts.
    let cancelled = app
        .job_sheets
        .create_job_sheet(intake_request(customer_id))
        .await
        .expect("create job sheet");
    move_to(&app, cancelled.id, "cancelled").await;

    let summary = app
        .job_sheets
        .dashboard_summary()
        .await
        .expect("summary");

    assert_eq!(summary.total_job_sheets, 2);
    assert_eq!(summary.open_count, 1);
    assert_eq!(summary.overdue_count, 1);
    assert_eq!(summary.outstanding_balance, dec!(1000));
    assert_eq!(summary.collected_total, dec!(300));

    let in_progress_count = summary
        .by_status
        .iter()
        .find(|entry| entry.status == JobStatus::InProgress)
        .map(|entry| entry.count)
        .unwrap_or_default();
    assert_eq!(in_progress_count, 1);
}

#[tokio::test]
async fn missing_ids_surface_as_not_found() {
    let app = build_app().await;

    let sheet = app
        .job_sheets
        .get_job_sheet(Uuid::new_v4())
        .await
        .expect("lookup succeeds");
    assert!(sheet.is_none());

    let history = app.job_sheets.get_status_history(Uuid::new_v4()).await;
    assert!(matches!(history, Err(ServiceError::NotFound(_))));

    let change = app
        .job_sheets
        .change_status(
            Uuid::new_v4(),
            ChangeStatusRequest {
                status: "in_progress".to_string(),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(change, Err(ServiceError::NotFound(_))));

    let payment = app.payments.get_payment(Uuid::new_v4()).await.expect("lookup");
    assert!(payment.is_none());
}
