use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Customer name is required"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::job_sheet::Entity")]
    JobSheets,
}

impl Related<super::job_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobSheets.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
