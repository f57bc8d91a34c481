use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "mobile_payment")]
    MobilePayment,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "other")]
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::MobilePayment => "mobile_payment",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }

    /// Maps a loose inbound string to the canonical method.
    pub fn parse(value: &str) -> Option<Self> {
        match super::job_sheet::normalize(value).as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "card" | "credit_card" | "debit_card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "mobile_payment" => Some(PaymentMethod::MobilePayment),
            "check" | "cheque" => Some(PaymentMethod::Check),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment recorded against a job sheet.
///
/// Rows are append-only: there is no update or delete path anywhere in the
/// API, so the ledger the rows form stays a faithful audit trail.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Payment number must be between 1 and 50 characters"
    ))]
    pub payment_number: String,

    pub job_sheet_id: Uuid,
    pub customer_id: Uuid,

    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job_sheet::Entity",
        from = "Column::JobSheetId",
        to = "super::job_sheet::Column::Id"
    )]
    JobSheet,
}

impl Related<super::job_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobSheet.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_observed_method_spellings() {
        assert_eq!(PaymentMethod::parse("CASH"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("Bank-Transfer"), Some(PaymentMethod::BankTransfer));
        assert_eq!(PaymentMethod::parse("cheque"), Some(PaymentMethod::Check));
        assert_eq!(PaymentMethod::parse("credit_card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::parse("crypto"), None);
    }
}
