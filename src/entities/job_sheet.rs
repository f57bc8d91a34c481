use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Canonical repair workflow status.
///
/// This is the only status representation in the codebase. Loose strings from
/// the outside world go through [`JobStatus::parse`] exactly once, on the way
/// into the service layer; everything past that point deals in this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "job_status")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "waiting_parts")]
    WaitingParts,
    #[sea_orm(string_value = "quality_check")]
    QualityCheck,
    #[sea_orm(string_value = "ready_delivery")]
    ReadyDelivery,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::WaitingParts => "waiting_parts",
            JobStatus::QualityCheck => "quality_check",
            JobStatus::ReadyDelivery => "ready_delivery",
            JobStatus::Completed => "completed",
            JobStatus::Delivered => "delivered",
            JobStatus::OnHold => "on_hold",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Maps a loose inbound string to the canonical status.
    ///
    /// Accepts any casing and `-`/space separators, plus the long-form
    /// synonyms that show up in imported data. Returns `None` for anything
    /// else; the caller decides which error kind that is.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "waiting_parts" | "waiting_for_parts" => Some(JobStatus::WaitingParts),
            "quality_check" => Some(JobStatus::QualityCheck),
            "ready_delivery" | "ready_for_delivery" => Some(JobStatus::ReadyDelivery),
            "completed" => Some(JobStatus::Completed),
            "delivered" => Some(JobStatus::Delivered),
            "on_hold" => Some(JobStatus::OnHold),
            "cancelled" | "canceled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal sheets accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Delivered | JobStatus::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "job_priority")]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl JobPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPriority::Low => "low",
            JobPriority::Medium => "medium",
            JobPriority::High => "high",
            JobPriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "low" => Some(JobPriority::Low),
            "medium" | "normal" => Some(JobPriority::Medium),
            "high" => Some(JobPriority::High),
            "urgent" => Some(JobPriority::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn normalize(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "job_sheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Job number must be between 1 and 50 characters"
    ))]
    pub job_number: String,

    pub customer_id: Uuid,
    pub device_id: Uuid,
    pub location_id: Uuid,
    pub assigned_to_id: Option<Uuid>,

    #[validate(length(min = 10, message = "Issue description must be at least 10 characters"))]
    pub issue_description: String,
    pub diagnosis_notes: Option<String>,
    pub repair_notes: Option<String>,

    pub status: JobStatus,
    pub priority: JobPriority,

    pub labour_cost: Decimal,
    pub parts_cost: Decimal,
    pub discount_amount: Decimal,
    // Derived by the ledger; never written directly by callers.
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,

    pub received_date: DateTime<Utc>,
    pub expected_completion_date: Option<NaiveDate>,
    pub completed_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,

    pub warranty_period_days: Option<i32>,
    pub warranty_expiry: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    #[sea_orm(has_many = "super::status_history::Entity")]
    StatusHistory,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_loose_casings_and_separators() {
        assert_eq!(JobStatus::parse("PENDING"), Some(JobStatus::Pending));
        assert_eq!(JobStatus::parse("In-Progress"), Some(JobStatus::InProgress));
        assert_eq!(JobStatus::parse("waiting parts"), Some(JobStatus::WaitingParts));
        assert_eq!(
            JobStatus::parse("READY_FOR_DELIVERY"),
            Some(JobStatus::ReadyDelivery)
        );
        assert_eq!(JobStatus::parse("canceled"), Some(JobStatus::Cancelled));
        assert_eq!(JobStatus::parse("shipped"), None);
        assert_eq!(JobStatus::parse(""), None);
    }

    #[test]
    fn parse_round_trips_canonical_strings() {
        use sea_orm::Iterable;
        for status in JobStatus::iter() {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        for priority in JobPriority::iter() {
            assert_eq!(JobPriority::parse(priority.as_str()), Some(priority));
        }
    }

    #[test]
    fn terminal_states_are_delivered_and_cancelled_only() {
        use sea_orm::Iterable;
        let terminal: Vec<JobStatus> = JobStatus::iter().filter(JobStatus::is_terminal).collect();
        assert_eq!(terminal, vec![JobStatus::Delivered, JobStatus::Cancelled]);
    }
}
