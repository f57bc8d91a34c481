use crate::{
    db::DbPool,
    entities::job_sheet::{self, Entity as JobSheetEntity, JobStatus},
    entities::payment::{self, Entity as PaymentEntity, Model as PaymentModel, PaymentMethod},
    errors::ServiceError,
    events::{Event, EventSender},
    ledger::{self, QuickAmounts},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Service for recording and querying payments
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

/// Request payload for recording a payment against a job sheet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub job_sheet_id: Uuid,
    pub amount: Decimal,
    /// Payment method, accepted in any casing.
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Must match the job sheet's customer when given; filled in from the
    /// sheet when omitted.
    pub customer_id: Option<Uuid>,
}

/// Filters accepted by the payment listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilters {
    pub job_sheet_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub method: Option<String>,
}

/// Payment response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_number: String,
    pub job_sheet_id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response returned after recording a payment, carrying the sheet's
/// recomputed running totals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentResponse {
    pub payment: PaymentResponse,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    /// True when the customer has now paid more than the total.
    pub overpayment: bool,
}

/// Paginated payment listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a payment and folds it into the job sheet's paid and balance
    /// amounts in the same transaction. Payments are append-only; there is no
    /// update or delete path.
    #[instrument(skip(self, request), fields(job_sheet_id = %request.job_sheet_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<RecordPaymentResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                request.amount
            )));
        }
        let method = PaymentMethod::parse(&request.method).ok_or_else(|| {
            ServiceError::ValidationError(format!("unknown payment method '{}'", request.method))
        })?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment");
            ServiceError::DatabaseError(e)
        })?;

        let job_sheet = JobSheetEntity::find_by_id(request.job_sheet_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %request.job_sheet_id, "Failed to fetch job sheet for payment");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %request.job_sheet_id, "Job sheet not found for payment");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        if job_sheet.status == JobStatus::Cancelled {
            return Err(ServiceError::InvalidTransition(
                "payments cannot be recorded against a cancelled job sheet".to_string(),
            ));
        }
        if let Some(customer_id) = request.customer_id {
            if customer_id != job_sheet.customer_id {
                return Err(ServiceError::ValidationError(
                    "payment customer does not match the job sheet customer".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let payment_id = Uuid::new_v4();
        let payment_number = generate_payment_number();

        let new_payment = payment::ActiveModel {
            id: Set(payment_id),
            payment_number: Set(payment_number.clone()),
            job_sheet_id: Set(request.job_sheet_id),
            customer_id: Set(request.customer_id.unwrap_or(job_sheet.customer_id)),
            amount: Set(request.amount),
            method: Set(method),
            reference: Set(request.reference),
            notes: Set(request.notes),
            created_at: Set(now),
        };
        let payment_model = new_payment.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to record payment");
            ServiceError::DatabaseError(e)
        })?;

        // Paid amount is always the sum of the recorded payment rows, never
        // an increment on the stored value.
        let payments = PaymentEntity::find()
            .filter(payment::Column::JobSheetId.eq(request.job_sheet_id))
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to sum payments for job sheet");
                ServiceError::DatabaseError(e)
            })?;
        let paid_amount: Decimal = payments.iter().map(|p| p.amount).sum();
        let total_amount = job_sheet.total_amount;
        let balance_amount = ledger::recompute_balance(total_amount, paid_amount);
        let overpayment = ledger::is_overpaid(total_amount, paid_amount);
        let next_version = job_sheet.version + 1;
        let job_sheet_id = job_sheet.id;

        let mut active: job_sheet::ActiveModel = job_sheet.into();
        active.paid_amount = Set(paid_amount);
        active.balance_amount = Set(balance_amount);
        active.updated_at = Set(Some(now));
        active.version = Set(next_version);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to update job sheet totals after payment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit payment");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            payment_id = %payment_id,
            payment_number = %payment_number,
            job_sheet_id = %job_sheet_id,
            amount = %request.amount,
            paid_amount = %paid_amount,
            balance_amount = %balance_amount,
            "Payment recorded successfully"
        );
        if overpayment {
            warn!(
                job_sheet_id = %job_sheet_id,
                paid_amount = %paid_amount,
                total_amount = %total_amount,
                "Job sheet is now overpaid"
            );
        }

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentRecorded {
                    payment_id,
                    job_sheet_id,
                    amount: request.amount,
                })
                .await
            {
                warn!(error = %e, payment_id = %payment_id, "Failed to send payment recorded event");
            }
        }

        Ok(RecordPaymentResponse {
            payment: self.model_to_response(payment_model),
            paid_amount,
            balance_amount,
            overpayment,
        })
    }

    /// Gets a payment by id
    #[instrument(skip(self))]
    pub async fn get_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<PaymentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let payment = PaymentEntity::find_by_id(payment_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, payment_id = %payment_id, "Failed to get payment");
                ServiceError::DatabaseError(e)
            })?;

        match payment {
            Some(model) => {
                info!(payment_id = %payment_id, "Payment retrieved successfully");
                Ok(Some(self.model_to_response(model)))
            }
            None => {
                info!(payment_id = %payment_id, "Payment not found");
                Ok(None)
            }
        }
    }

    /// Lists payments with optional filters and pagination
    #[instrument(skip(self, filters))]
    pub async fn list_payments(
        &self,
        filters: PaymentFilters,
        page: u64,
        per_page: u64,
    ) -> Result<PaymentListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(job_sheet_id) = filters.job_sheet_id {
            condition = condition.add(payment::Column::JobSheetId.eq(job_sheet_id));
        }
        if let Some(customer_id) = filters.customer_id {
            condition = condition.add(payment::Column::CustomerId.eq(customer_id));
        }
        if let Some(raw) = &filters.method {
            let method = PaymentMethod::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown payment method filter '{}'", raw))
            })?;
            condition = condition.add(payment::Column::Method.eq(method));
        }

        let paginator = PaymentEntity::find()
            .filter(condition)
            .order_by_desc(payment::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count payments");
            ServiceError::DatabaseError(e)
        })?;

        let payments = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, "Failed to fetch payments");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            total = total,
            page = page,
            per_page = per_page,
            returned_count = payments.len(),
            "Payments listed successfully"
        );

        Ok(PaymentListResponse {
            payments: payments
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Lists every payment recorded against one job sheet, oldest first
    #[instrument(skip(self))]
    pub async fn list_for_job_sheet(
        &self,
        job_sheet_id: Uuid,
    ) -> Result<Vec<PaymentResponse>, ServiceError> {
        let db = &*self.db_pool;

        JobSheetEntity::find_by_id(job_sheet_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch job sheet for payments");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %job_sheet_id, "Job sheet not found for payments");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        let payments = PaymentEntity::find()
            .filter(payment::Column::JobSheetId.eq(job_sheet_id))
            .order_by_asc(payment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch payments for job sheet");
                ServiceError::DatabaseError(e)
            })?;

        info!(
            job_sheet_id = %job_sheet_id,
            payment_count = payments.len(),
            "Payments for job sheet retrieved successfully"
        );

        Ok(payments
            .into_iter()
            .map(|model| self.model_to_response(model))
            .collect())
    }

    /// Suggests cash amounts for settling a job sheet's balance
    #[instrument(skip(self))]
    pub async fn quick_amounts(&self, job_sheet_id: Uuid) -> Result<QuickAmounts, ServiceError> {
        let db = &*self.db_pool;

        let job_sheet = JobSheetEntity::find_by_id(job_sheet_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, job_sheet_id = %job_sheet_id, "Failed to fetch job sheet for quick amounts");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(job_sheet_id = %job_sheet_id, "Job sheet not found for quick amounts");
                ServiceError::NotFound("Job sheet not found".to_string())
            })?;

        Ok(ledger::quick_amounts(job_sheet.balance_amount))
    }

    fn model_to_response(&self, model: PaymentModel) -> PaymentResponse {
        PaymentResponse {
            id: model.id,
            payment_number: model.payment_number,
            job_sheet_id: model.job_sheet_id,
            customer_id: model.customer_id,
            amount: model.amount,
            method: model.method,
            reference: model.reference,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// Payment numbers mirror the job number shape so receipts read the same way.
fn generate_payment_number() -> String {
    format!(
        "PAY-{}-{}",
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    )
}
