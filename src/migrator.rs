use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_job_sheets_table::Migration),
            Box::new(m20240101_000003_create_payments_table::Migration),
            Box::new(m20240101_000004_create_job_status_history_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_customers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create customers table aligned with entities::customer Model
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Customers::Table)
                        .col(Customers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Drop customers table
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        Phone,
        Email,
        Address,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_job_sheets_table {
    use super::m20240101_000001_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_job_sheets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create job_sheets table aligned with entities::job_sheet Model
            manager
                .create_table(
                    Table::create()
                        .table(JobSheets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobSheets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobSheets::JobNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(JobSheets::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(JobSheets::DeviceId).uuid().not_null())
                        .col(ColumnDef::new(JobSheets::LocationId).uuid().not_null())
                        .col(ColumnDef::new(JobSheets::AssignedToId).uuid().null())
                        .col(
                            ColumnDef::new(JobSheets::IssueDescription)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobSheets::DiagnosisNotes).string().null())
                        .col(ColumnDef::new(JobSheets::RepairNotes).string().null())
                        .col(ColumnDef::new(JobSheets::Status).string().not_null())
                        .col(ColumnDef::new(JobSheets::Priority).string().not_null())
                        .col(
                            ColumnDef::new(JobSheets::LabourCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::PartsCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::DiscountAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::PaidAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::BalanceAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobSheets::ReceivedDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobSheets::ExpectedCompletionDate)
                                .date()
                                .null(),
                        )
                        .col(ColumnDef::new(JobSheets::CompletedDate).timestamp().null())
                        .col(ColumnDef::new(JobSheets::DeliveredDate).timestamp().null())
                        .col(
                            ColumnDef::new(JobSheets::WarrantyPeriodDays)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(JobSheets::WarrantyExpiry).date().null())
                        .col(ColumnDef::new(JobSheets::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(JobSheets::UpdatedAt).timestamp().null())
                        .col(
                            ColumnDef::new(JobSheets::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_job_sheets_customer_id")
                                .from(JobSheets::Table, JobSheets::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_sheets_customer_id")
                        .table(JobSheets::Table)
                        .col(JobSheets::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_sheets_status")
                        .table(JobSheets::Table)
                        .col(JobSheets::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_sheets_received_date")
                        .table(JobSheets::Table)
                        .col(JobSheets::ReceivedDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_sheets_expected_completion_date")
                        .table(JobSheets::Table)
                        .col(JobSheets::ExpectedCompletionDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Drop job_sheets table
            manager
                .drop_table(Table::drop().table(JobSheets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum JobSheets {
        Table,
        Id,
        JobNumber,
        CustomerId,
        DeviceId,
        LocationId,
        AssignedToId,
        IssueDescription,
        DiagnosisNotes,
        RepairNotes,
        Status,
        Priority,
        LabourCost,
        PartsCost,
        DiscountAmount,
        TotalAmount,
        PaidAmount,
        BalanceAmount,
        ReceivedDate,
        ExpectedCompletionDate,
        CompletedDate,
        DeliveredDate,
        WarrantyPeriodDays,
        WarrantyExpiry,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20240101_000003_create_payments_table {
    use super::m20240101_000002_create_job_sheets_table::JobSheets;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create payments table aligned with entities::payment Model
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Payments::PaymentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payments::JobSheetId).uuid().not_null())
                        .col(ColumnDef::new(Payments::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(ColumnDef::new(Payments::Notes).string().null())
                        .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_job_sheet_id")
                                .from(Payments::Table, Payments::JobSheetId)
                                .to(JobSheets::Table, JobSheets::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_job_sheet_id")
                        .table(Payments::Table)
                        .col(Payments::JobSheetId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_created_at")
                        .table(Payments::Table)
                        .col(Payments::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Drop payments table
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        PaymentNumber,
        JobSheetId,
        CustomerId,
        Amount,
        Method,
        Reference,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000004_create_job_status_history_table {
    use super::m20240101_000002_create_job_sheets_table::JobSheets;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_job_status_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create job_status_history table aligned with entities::status_history Model
            manager
                .create_table(
                    Table::create()
                        .table(JobStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::JobSheetId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::FromStatus)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::ToStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::ChangedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobStatusHistory::Remarks).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_job_status_history_job_sheet_id")
                                .from(JobStatusHistory::Table, JobStatusHistory::JobSheetId)
                                .to(JobSheets::Table, JobSheets::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_status_history_job_sheet_id")
                        .table(JobStatusHistory::Table)
                        .col(JobStatusHistory::JobSheetId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_status_history_changed_at")
                        .table(JobStatusHistory::Table)
                        .col(JobStatusHistory::ChangedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Drop job_status_history table
            manager
                .drop_table(Table::drop().table(JobStatusHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum JobStatusHistory {
        Table,
        Id,
        JobSheetId,
        FromStatus,
        ToStatus,
        ChangedAt,
        Remarks,
    }
}
