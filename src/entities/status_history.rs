use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job_sheet::JobStatus;

/// One row per status transition, no-op re-assertions included.
///
/// Append-only: entries are never mutated or deleted, which is what makes the
/// table usable as an audit trail.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_sheet_id: Uuid,
    /// None for the entry written at job-sheet creation.
    pub from_status: Option<JobStatus>,
    pub to_status: JobStatus,
    pub changed_at: DateTime<Utc>,
    pub remarks: Option<String>,
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
