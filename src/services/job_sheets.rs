use crate::{
    db::DbPool,
    entities::job_sheet::{
        self, Entity as JobSheetEntity, JobPriority, JobStatus, Model as JobSheetModel,
    },
    entities::status_history::{
        self, Entity as StatusHistoryEntity, Model as StatusHistoryModel,
    },
    entities::customer::Entity as CustomerEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    ledger,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Iterable, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Service for managing job sheets
#[derive(Clone)]
pub struct JobSheetService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

/// Request payload for opening a new job sheet
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateJobSheetRequest {
    pub customer_id: Uuid,
    pub device_id: Uuid,
    pub location_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    #[validate(length(min = 10, message = "issue description must be at least 10 characters"))]
    pub issue_description: String,
    /// Accepts any casing; defaults to medium when omitted.
    pub priority: Option<String>,
    pub labour_cost: Option<Decimal>,
    pub parts_cost: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub received_date: Option<DateTime<Utc>>,
    pub expected_completion_date: Option<NaiveDate>,
    pub warranty_period_days: Option<i32>,
    pub diagnosis_notes: Option<String>,
}

/// Request payload for editing an open job sheet. Absent fields keep their
/// stored value; status and the payment-derived amounts are never editable
/// through this path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateJobSheetRequest {
    pub device_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    #[validate(length(min = 10, message = "issue description must be at least 10 characters"))]
    pub issue_description: Option<String>,
    pub priority: Option<String>,
    pub labour_cost: Option<Decimal>,
    pub parts_cost: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub expected_completion_date: Option<NaiveDate>,
    pub warranty_period_days: Option<i32>,
    pub diagnosis_notes: Option<String>,
    pub repair_notes: Option<String>,
}

/// Request payload for moving a job sheet to a new status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// Target status, accepted in any casing.
    pub status: String,
    pub remarks: Option<String>,
}

/// Filters accepted by the job sheet listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSheetFilters {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub customer_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Restrict to open sheets whose expected completion date has passed.
    pub overdue: bool,
    pub search: Option<String>,
    pub received_from: Option<NaiveDate>,
    pub received_to: Option<NaiveDate>,
}

/// Job sheet response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSheetResponse {
    pub id: Uuid,
    pub job_number: String,
    pub customer_id: Uuid,
    pub device_id: Uuid,
    pub location_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub issue_description: String,
    pub diagnosis_notes: Option<String>,
    pub repair_notes: Option<String>,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub labour_cost: Decimal,
    pub parts_cost: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub received_date: DateTime<Utc>,
    pub expected_completion_date: Option<NaiveDate>,
    pub completed_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub warranty_period_days: Option<i32>,
    pub warranty_expiry: Option<NaiveDate>,
    /// Computed against today at read time, never stored.
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One recorded status transition
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryResponse {
    pub id: Uuid,
    pub job_sheet_id: Uuid,
    pub from_status: Option<JobStatus>,
    pub to_status: JobStatus,
    pub changed_at: DateTime<Utc>,
    pub remarks: Option<String>,
}

/// Response returned after a status change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusResponse {
    pub job_sheet: JobSheetResponse,
    pub history_entry: StatusHistoryResponse,
}

/// Paginated job sheet listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSheetListResponse {
    pub job_sheets: Vec<JobSheetResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Count of job sheets in one status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: u64,
}

/// Workbench summary across all job sheets
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub total_job_sheets: u64,
    pub by_status: Vec<StatusCount>,
    /// Sheets that are neither delivered nor cancelled.
    pub open_count: u64,
    pub overdue_count: u64,
    /// Sum of unpaid balances on sheets that were not cancelled.
    pub outstanding_balance: Decimal,
    /// Everything collected so far, cancelled sheets included.
    pub collected_total: Decimal,
}

impl JobSheetService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Opens a new job sheet in `pending` status and writes the opening
    /// history entry in the same transaction.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, device_id = %request.device_id))]
    pub async fn create_job_sheet(
        &self,
        request: CreateJobSheetRequest,
    ) -> Result<JobSheetResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let issue_description = request.issue_description.trim().to_string();
        if issue_description.chars().count() < 10 {
            return Err(ServiceError::ValidationError(
                "issue description must be at least 10 characters".to_string(),
            ));
        }
        let priority = parse_priority(request.priority.as_deref())?;
        if let Some(days) = request.warranty_period_days {
            if days < 0 {
                return Err(ServiceError::ValidationError(format!(
                    "warranty period must not be negative, got {}",
                    days
                )));
            }
        }

        let labour_cost = request.labour_cost.unwrap_or(Decimal::ZERO);
        let parts_cost = request.parts_cost.unwrap_or(Decimal::ZERO);
        let discount_amount = request.discount_amount.unwrap_or(Decimal::ZERO);
        let total_amount = ledger::compute_total(labour_cost, parts_cost, discount_amount)?;

        let db = &*self.db_pool;

        CustomerEntity::find_by_id(request.customer_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up customer for new job sheet");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(customer_id = %request.customer_id, "Customer not found while creating job sheet");
                ServiceError::NotFound("Customer not found".to_string())
            })?;

        let now = Utc::now();
        let job_sheet_id = Uuid::new_v4();
        let job_number = generate_job_number();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for job sheet creation");
            ServiceError::DatabaseError(e)
        })?;

        let job_sheet = job_sheet::ActiveModel {
            id: Set(job_sheet_id),
            job_number: Set(job_number.clone()),
            customer_id: Set(request.customer_id),
            device_id: Set(request.device_id),
            location_id: Set(request.location_id),
            assigned_to_id: Set(request.assigned_to_id),
            issue_description: Set(issue_description),
            diagnosis_notes: Set(request.diagnosis_notes),
            repair_notes: Set(None),
            status: Set(JobStatus::Pending),
            priority: Set(priority),
            labour_cost: Set(labour_cost),
            parts_cost: Set(parts_cost),
            discount_amount: Set(discount_amount),
            total_amount: Set(total_amount),
            paid_amount: Set(Decimal::ZERO),
            balance_amount: Set(total_amount),
            received_date: Set(request.received_date.unwrap_or(now)),
            expected_completion_date: Set(request.expected_completion_date),
            completed_date: Set(None),
            delivered_date: Set(None),
            warranty_period_days: Set(request.warranty_period_days),
            warranty_expiry: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        };

        let model = job_sheet.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to create job sheet");
            ServiceError::DatabaseError(e)
        })?;

        let opening_entry = status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_sheet_id: Set(job_sheet_id),
            from_status: Set(None),
            to_status: Set(JobStatus::Pending),
            changed_at: Set(now),
            remarks: Set(None),
        };
        opening_entry.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to record opening status history entry");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit job sheet creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            job_sheet_id = %job_sheet_id,
            job_number = %job_number,
            customer_id = %request.customer_id,
            "Job sheet created successfully"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::JobSheetCreated(job_sheet_id)).await {
                warn!(error = %e, job_sheet_id = %job_sheet_id, "Failed to send job sheet created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Gets a job sheet by id
    #[instrument(skip(self))]
    pub async fn get_job_sheet(
        &self,
        job_sheet_id: Uuid,
    ) -> Result<Option<JobSheetResponse>, ServiceError> {
        let db = &*self.db_pool;

        let job_sheet = JobSheetEntity::find_by_id(job_sheet_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to get job sheet");
                ServiceError::DatabaseError(e)
            })?;

        match job_sheet {
            Some(model) => {
                info!(job_sheet_id = %job_sheet_id, "Job sheet retrieved successfully");
                Ok(Some(self.model_to_response(model)))
            }
            None => {
                info!(job_sheet_id = %job_sheet_id, "Job sheet not found");
                Ok(None)
            }
        }
    }

    /// Edits an open job sheet and recomputes the derived amounts. Sheets in a
    /// terminal status reject every edit.
    #[instrument(skip(self, request), fields(job_sheet_id = %job_sheet_id))]
    pub async fn update_job_sheet(
        &self,
        job_sheet_id: Uuid,
        request: UpdateJobSheetRequest,
    ) -> Result<JobSheetResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let issue_description = match request.issue_description {
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.chars().count() < 10 {
                    return Err(ServiceError::ValidationError(
                        "issue description must be at least 10 characters".to_string(),
                    ));
                }
                Some(trimmed)
            }
            None => None,
        };
        let priority = match request.priority.as_deref() {
            Some(raw) => Some(parse_priority(Some(raw))?),
            None => None,
        };
        if let Some(days) = request.warranty_period_days {
            if days < 0 {
                return Err(ServiceError::ValidationError(format!(
                    "warranty period must not be negative, got {}",
                    days
                )));
            }
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for job sheet update");
            ServiceError::DatabaseError(e)
        })?;

        let job_sheet = JobSheetEntity::find_by_id(job_sheet_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch job sheet for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %job_sheet_id, "Job sheet not found for update");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        if job_sheet.status.is_terminal() {
            return Err(ServiceError::InvalidTransition(format!(
                "job sheet is {} and can no longer be edited",
                job_sheet.status
            )));
        }

        let labour_cost = request.labour_cost.unwrap_or(job_sheet.labour_cost);
        let parts_cost = request.parts_cost.unwrap_or(job_sheet.parts_cost);
        let discount_amount = request.discount_amount.unwrap_or(job_sheet.discount_amount);
        let total_amount = ledger::compute_total(labour_cost, parts_cost, discount_amount)?;
        let balance_amount = ledger::recompute_balance(total_amount, job_sheet.paid_amount);
        let warranty_period_days = request
            .warranty_period_days
            .or(job_sheet.warranty_period_days);
        let warranty_expiry = ledger::warranty_expiry(
            job_sheet.completed_date.map(|d| d.date_naive()),
            warranty_period_days,
        );
        let next_version = job_sheet.version + 1;

        let mut active: job_sheet::ActiveModel = job_sheet.into();
        if let Some(device_id) = request.device_id {
            active.device_id = Set(device_id);
        }
        if let Some(location_id) = request.location_id {
            active.location_id = Set(location_id);
        }
        if let Some(assigned_to_id) = request.assigned_to_id {
            active.assigned_to_id = Set(Some(assigned_to_id));
        }
        if let Some(issue_description) = issue_description {
            active.issue_description = Set(issue_description);
        }
        if let Some(priority) = priority {
            active.priority = Set(priority);
        }
        if let Some(diagnosis_notes) = request.diagnosis_notes {
            active.diagnosis_notes = Set(Some(diagnosis_notes));
        }
        if let Some(repair_notes) = request.repair_notes {
            active.repair_notes = Set(Some(repair_notes));
        }
        if let Some(expected_completion_date) = request.expected_completion_date {
            active.expected_completion_date = Set(Some(expected_completion_date));
        }
        active.labour_cost = Set(labour_cost);
        active.parts_cost = Set(parts_cost);
        active.discount_amount = Set(discount_amount);
        active.total_amount = Set(total_amount);
        active.balance_amount = Set(balance_amount);
        active.warranty_period_days = Set(warranty_period_days);
        active.warranty_expiry = Set(warranty_expiry);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(next_version);

        let model = active.update(&txn).await.map_err(|e| {
            error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to update job sheet");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit job sheet update");
            ServiceError::DatabaseError(e)
        })?;

        info!(job_sheet_id = %job_sheet_id, "Job sheet updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::JobSheetUpdated(job_sheet_id)).await {
                warn!(error = %e, job_sheet_id = %job_sheet_id, "Failed to send job sheet updated event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Moves a job sheet to a new status. Every accepted request appends a
    /// history entry, including requests that restate the current status.
    #[instrument(skip(self, request), fields(job_sheet_id = %job_sheet_id, status = %request.status))]
    pub async fn change_status(
        &self,
        job_sheet_id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<ChangeStatusResponse, ServiceError> {
        let target = JobStatus::parse(&request.status).ok_or_else(|| {
            ServiceError::InvalidTransition(format!("unknown status '{}'", request.status))
        })?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for status change");
            ServiceError::DatabaseError(e)
        })?;

        let job_sheet = JobSheetEntity::find_by_id(job_sheet_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch job sheet for status change");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %job_sheet_id, "Job sheet not found for status change");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        let old_status = job_sheet.status;
        ledger::validate_transition(old_status, target)?;

        let now = Utc::now();
        let completed_date = match job_sheet.completed_date {
            None if matches!(target, JobStatus::Completed | JobStatus::ReadyDelivery) => Some(now),
            other => other,
        };
        let delivered_date = match job_sheet.delivered_date {
            None if target == JobStatus::Delivered => Some(now),
            other => other,
        };
        let warranty_expiry = ledger::warranty_expiry(
            completed_date.map(|d| d.date_naive()),
            job_sheet.warranty_period_days,
        );
        let next_version = job_sheet.version + 1;

        let mut active: job_sheet::ActiveModel = job_sheet.into();
        active.status = Set(target);
        active.completed_date = Set(completed_date);
        active.delivered_date = Set(delivered_date);
        active.warranty_expiry = Set(warranty_expiry);
        active.updated_at = Set(Some(now));
        active.version = Set(next_version);

        let model = active.update(&txn).await.map_err(|e| {
            error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to update job sheet status");
            ServiceError::DatabaseError(e)
        })?;

        let history = status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_sheet_id: Set(job_sheet_id),
            from_status: Set(Some(old_status)),
            to_status: Set(target),
            changed_at: Set(now),
            remarks: Set(request.remarks),
        };
        let history_model = history.insert(&txn).await.map_err(|e| {
            error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to record status history entry");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit status change");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            job_sheet_id = %job_sheet_id,
            from_status = %old_status,
            to_status = %target,
            "Job sheet status changed successfully"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::JobSheetStatusChanged {
                    job_sheet_id,
                    from_status: old_status.as_str().to_string(),
                    to_status: target.as_str().to_string(),
                })
                .await
            {
                warn!(error = %e, job_sheet_id = %job_sheet_id, "Failed to send status changed event");
            }
        }

        Ok(ChangeStatusResponse {
            job_sheet: self.model_to_response(model),
            history_entry: history_entry_to_response(history_model),
        })
    }

    /// Lists job sheets with optional filters and pagination
    #[instrument(skip(self, filters))]
    pub async fn list_job_sheets(
        &self,
        filters: JobSheetFilters,
        page: u64,
        per_page: u64,
    ) -> Result<JobSheetListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(raw) = &filters.status {
            let status = JobStatus::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown status filter '{}'", raw))
            })?;
            condition = condition.add(job_sheet::Column::Status.eq(status));
        }
        if let Some(raw) = &filters.priority {
            let priority = JobPriority::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown priority filter '{}'", raw))
            })?;
            condition = condition.add(job_sheet::Column::Priority.eq(priority));
        }
        if let Some(customer_id) = filters.customer_id {
            condition = condition.add(job_sheet::Column::CustomerId.eq(customer_id));
        }
        if let Some(assigned_to_id) = filters.assigned_to_id {
            condition = condition.add(job_sheet::Column::AssignedToId.eq(assigned_to_id));
        }
        if let Some(location_id) = filters.location_id {
            condition = condition.add(job_sheet::Column::LocationId.eq(location_id));
        }
        if filters.overdue {
            condition = condition
                .add(job_sheet::Column::Status.is_not_in([
                    JobStatus::Completed,
                    JobStatus::Delivered,
                    JobStatus::Cancelled,
                ]))
                .add(job_sheet::Column::ExpectedCompletionDate.lt(Utc::now().date_naive()));
        }
        if let Some(from) = filters.received_from {
            condition = condition
                .add(job_sheet::Column::ReceivedDate.gte(from.and_time(NaiveTime::MIN).and_utc()));
        }
        if let Some(to) = filters.received_to {
            let end_exclusive = (to + chrono::Duration::days(1))
                .and_time(NaiveTime::MIN)
                .and_utc();
            condition = condition.add(job_sheet::Column::ReceivedDate.lt(end_exclusive));
        }
        if let Some(search) = filters.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(job_sheet::Column::JobNumber.contains(search))
                        .add(job_sheet::Column::IssueDescription.contains(search))
                        .add(job_sheet::Column::DiagnosisNotes.contains(search))
                        .add(job_sheet::Column::RepairNotes.contains(search)),
                );
            }
        }

        let paginator = JobSheetEntity::find()
            .filter(condition)
            .order_by_desc(job_sheet::Column::ReceivedDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count job sheets");
            ServiceError::DatabaseError(e)
        })?;

        let job_sheets = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, "Failed to fetch job sheets");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            total = total,
            page = page,
            per_page = per_page,
            returned_count = job_sheets.len(),
            "Job sheets listed successfully"
        );

        Ok(JobSheetListResponse {
            job_sheets: job_sheets
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Returns the full status history of a job sheet in chronological order
    #[instrument(skip(self))]
    pub async fn get_status_history(
        &self,
        job_sheet_id: Uuid,
    ) -> Result<Vec<StatusHistoryResponse>, ServiceError> {
        let db = &*self.db_pool;

        JobSheetEntity::find_by_id(job_sheet_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch job sheet for history");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %job_sheet_id, "Job sheet not found for history");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        let entries = StatusHistoryEntity::find()
            .filter(status_history::Column::JobSheetId.eq(job_sheet_id))
            .order_by_asc(status_history::Column::ChangedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch status history");
                ServiceError::DatabaseError(e)
            })?;

        info!(
            job_sheet_id = %job_sheet_id,
            entry_count = entries.len(),
            "Status history retrieved successfully"
        );

        Ok(entries.into_iter().map(history_entry_to_response).collect())
    }

    /// Aggregates the workbench dashboard: counts per status, overdue count
    /// and the outstanding balance across non-cancelled sheets.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ServiceError> {
        let db = &*self.db_pool;

        let total_job_sheets = JobSheetEntity::find().count(db).await.map_err(|e| {
            error!(error = %e, "Failed to count job sheets for summary");
            ServiceError::DatabaseError(e)
        })?;

        let mut by_status = Vec::new();
        let mut open_count = 0;
        for status in JobStatus::iter() {
            let count = JobSheetEntity::find()
                .filter(job_sheet::Column::Status.eq(status))
                .count(db)
                .await
                .map_err(|e| {
                    error!(error = %e, status = %status, "Failed to count job sheets by status");
                    ServiceError::DatabaseError(e)
                })?;
            if !status.is_terminal() {
                open_count += count;
            }
            by_status.push(StatusCount { status, count });
        }

        let overdue_count = JobSheetEntity::find()
            .filter(
                Condition::all()
                    .add(job_sheet::Column::Status.is_not_in([
                        JobStatus::Completed,
                        JobStatus::Delivered,
                        JobStatus::Cancelled,
                    ]))
                    .add(job_sheet::Column::ExpectedCompletionDate.lt(Utc::now().date_naive())),
            )
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count overdue job sheets");
                ServiceError::DatabaseError(e)
            })?;

        let money_rows: Vec<(JobStatus, Decimal, Decimal)> = JobSheetEntity::find()
            .select_only()
            .column(job_sheet::Column::Status)
            .column(job_sheet::Column::PaidAmount)
            .column(job_sheet::Column::BalanceAmount)
            .into_tuple()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to sum job sheet money fields");
                ServiceError::DatabaseError(e)
            })?;
        let mut outstanding_balance = Decimal::ZERO;
        let mut collected_total = Decimal::ZERO;
        for (status, paid, balance) in money_rows {
            collected_total += paid;
            // A cancelled sheet's balance is no longer owed.
            if status != JobStatus::Cancelled {
                outstanding_balance += balance;
            }
        }

        info!(
            total_job_sheets = total_job_sheets,
            open_count = open_count,
            overdue_count = overdue_count,
            "Dashboard summary computed successfully"
        );

        Ok(DashboardSummary {
            total_job_sheets,
            by_status,
            open_count,
            overdue_count,
            outstanding_balance,
            collected_total,
        })
    }

    fn model_to_response(&self, model: JobSheetModel) -> JobSheetResponse {
        let is_overdue = ledger::is_overdue(
            model.status,
            model.expected_completion_date,
            Utc::now().date_naive(),
        );
        JobSheetResponse {
            id: model.id,
            job_number: model.job_number,
            customer_id: model.customer_id,
            device_id: model.device_id,
            location_id: model.location_id,
            assigned_to_id: model.assigned_to_id,
            issue_description: model.issue_description,
            diagnosis_notes: model.diagnosis_notes,
            repair_notes: model.repair_notes,
            status: model.status,
            priority: model.priority,
            labour_cost: model.labour_cost,
            parts_cost: model.parts_cost,
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            paid_amount: model.paid_amount,
            balance_amount: model.balance_amount,
            received_date: model.received_date,
            expected_completion_date: model.expected_completion_date,
            completed_date: model.completed_date,
            delivered_date: model.delivered_date,
            warranty_period_days: model.warranty_period_days,
            warranty_expiry: model.warranty_expiry,
            is_overdue,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn history_entry_to_response(model: StatusHistoryModel) -> StatusHistoryResponse {
    StatusHistoryResponse {
        id: model.id,
        job_sheet_id: model.job_sheet_id,
        from_status: model.from_status,
        to_status: model.to_status,
        changed_at: model.changed_at,
        remarks: model.remarks,
    }
}

fn parse_priority(raw: Option<&str>) -> Result<JobPriority, ServiceError> {
    match raw {
        Some(value) => JobPriority::parse(value)
            .ok_or_else(|| ServiceError::ValidationError(format!("unknown priority '{}'", value))),
        None => Ok(JobPriority::Medium),
    }
}

/// Job numbers carry the intake date so staff can read them over the phone.
fn generate_job_number() -> String {
    format!(
        "JS-{}-{}",
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::DatabaseConnection;

    fn service() -> JobSheetService {
        JobSheetService::new(Arc::new(DatabaseConnection::Disconnected), None)
    }

    fn sample_model() -> JobSheetModel {
        JobSheetModel {
            id: Uuid::new_v4(),
            job_number: "JS-20250301-ABCD1234".to_string(),
            customer_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            assigned_to_id: None,
            issue_description: "Screen cracked after a fall".to_string(),
            diagnosis_notes: None,
            repair_notes: None,
            status: JobStatus::InProgress,
            priority: JobPriority::High,
            labour_cost: dec!(1000),
            parts_cost: dec!(500),
            discount_amount: dec!(200),
            total_amount: dec!(1300),
            paid_amount: dec!(800),
            balance_amount: dec!(500),
            received_date: Utc::now(),
            expected_completion_date: None,
            completed_date: None,
            delivered_date: None,
            warranty_period_days: Some(90),
            warranty_expiry: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 2,
        }
    }

    #[test]
    fn test_model_to_response_maps_fields() {
        let service = service();
        let model = sample_model();
        let id = model.id;

        let response = service.model_to_response(model);

        assert_eq!(response.id, id);
        assert_eq!(response.status, JobStatus::InProgress);
        assert_eq!(response.priority, JobPriority::High);
        assert_eq!(response.total_amount, dec!(1300));
        assert_eq!(response.balance_amount, dec!(500));
        assert!(!response.is_overdue);
    }

    #[test]
    fn test_model_to_response_flags_overdue_sheet() {
        let service = service();
        let mut model = sample_model();
        model.expected_completion_date = Some(Utc::now().date_naive() - chrono::Duration::days(1));

        let response = service.model_to_response(model);

        assert!(response.is_overdue);
    }

    #[tokio::test]
    async fn test_create_rejects_short_issue_description() {
        let service = service();
        let request = CreateJobSheetRequest {
            customer_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            assigned_to_id: None,
            issue_description: "   Wet.   ".to_string(),
            priority: None,
            labour_cost: None,
            parts_cost: None,
            discount_amount: None,
            received_date: None,
            expected_completion_date: None,
            warranty_period_days: None,
            diagnosis_notes: None,
        };

        let result = service.create_job_sheet(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_cost_before_touching_db() {
        let service = service();
        let request = CreateJobSheetRequest {
            customer_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            assigned_to_id: None,
            issue_description: "Battery drains within an hour".to_string(),
            priority: Some("high".to_string()),
            labour_cost: Some(dec!(-50)),
            parts_cost: None,
            discount_amount: None,
            received_date: None,
            expected_completion_date: None,
            warranty_period_days: None,
            diagnosis_notes: None,
        };

        let result = service.create_job_sheet(request).await;
        assert!(matches!(result, Err(ServiceError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_priority() {
        let service = service();
        let request = CreateJobSheetRequest {
            customer_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            assigned_to_id: None,
            issue_description: "Speaker crackles at high volume".to_string(),
            priority: Some("whenever".to_string()),
            labour_cost: None,
            parts_cost: None,
            discount_amount: None,
            received_date: None,
            expected_completion_date: None,
            warranty_period_days: None,
            diagnosis_notes: None,
        };

        let result = service.create_job_sheet(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_change_status_rejects_unknown_status() {
        let service = service();
        let request = ChangeStatusRequest {
            status: "finished".to_string(),
            remarks: None,
        };

        let result = service.change_status(Uuid::new_v4(), request).await;
        assert!(matches!(result, Err(ServiceError::InvalidTransition(_))));
    }

    #[test]
    fn test_generate_job_number_format() {
        let number = generate_job_number();
        assert!(number.starts_with("JS-"));
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[2], parts[2].to_uppercase());
    }
}
