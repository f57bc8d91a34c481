use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity, Model as CustomerModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

/// Request payload for registering a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Request payload for editing a customer. Absent fields keep their stored
/// value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Customer response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Paginated customer listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a new customer
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let customer_id = Uuid::new_v4();

        let new_customer = customer::ActiveModel {
            id: Set(customer_id),
            name: Set(request.name.trim().to_string()),
            phone: Set(request.phone.map(|p| p.trim().to_string())),
            email: Set(request.email),
            address: Set(request.address),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let model = new_customer.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = %customer_id, "Customer created successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerCreated(customer_id)).await {
                warn!(error = %e, customer_id = %customer_id, "Failed to send customer created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Gets a customer by id
    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerResponse>, ServiceError> {
        let db = &*self.db_pool;

        let found = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, customer_id = %customer_id, "Failed to get customer");
                ServiceError::DatabaseError(e)
            })?;

        match found {
            Some(model) => {
                info!(customer_id = %customer_id, "Customer retrieved successfully");
                Ok(Some(self.model_to_response(model)))
            }
            None => {
                info!(customer_id = %customer_id, "Customer not found");
                Ok(None)
            }
        }
    }

    /// Edits a customer's contact details
    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for customer update");
            ServiceError::DatabaseError(e)
        })?;

        let found = CustomerEntity::find_by_id(customer_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, customer_id = %customer_id, "Failed to fetch customer for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(customer_id = %customer_id, "Customer not found for update");
                ServiceError::NotFound("Customer not found".to_string())
            })?;

        let mut active: customer::ActiveModel = found.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone.trim().to_string()));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Some(Utc::now()));

        let model = active.update(&txn).await.map_err(|e| {
            error!(error = %e, customer_id = %customer_id, "Failed to update customer");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit customer update");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = %customer_id, "Customer updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerUpdated(customer_id)).await {
                warn!(error = %e, customer_id = %customer_id, "Failed to send customer updated event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Lists customers with an optional name, phone or email search
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<CustomerListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(search) = search.as_deref().map(str::trim) {
            if !search.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(customer::Column::Name.contains(search))
                        .add(customer::Column::Phone.contains(search))
                        .add(customer::Column::Email.contains(search)),
                );
            }
        }

        let paginator = CustomerEntity::find()
            .filter(condition)
            .order_by_asc(customer::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count customers");
            ServiceError::DatabaseError(e)
        })?;

        let customers = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, "Failed to fetch customers");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            total = total,
            page = page,
            per_page = per_page,
            returned_count = customers.len(),
            "Customers listed successfully"
        );

        Ok(CustomerListResponse {
            customers: customers
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    fn model_to_response(&self, model: CustomerModel) -> CustomerResponse {
        CustomerResponse {
            id: model.id,
            name: model.name,
            phone: model.phone,
            email: model.email,
            address: model.address,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
