use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601120004_create_attendance"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("worker_id")).big_integer().not_null())
                    // Nullable: admins may punch in without a site.
                    .col(ColumnDef::new(Alias::new("site_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("date")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("punch_in_time")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("punch_in_latitude")).double().null())
                    .col(ColumnDef::new(Alias::new("punch_in_longitude")).double().null())
                    .col(ColumnDef::new(Alias::new("punch_in_selfie_url")).string().null())
                    .col(ColumnDef::new(Alias::new("punch_out_time")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("punch_out_latitude")).double().null())
                    .col(ColumnDef::new(Alias::new("punch_out_longitude")).double().null())
                    .col(ColumnDef::new(Alias::new("punch_out_selfie_url")).string().null())
                    .col(ColumnDef::new(Alias::new("total_hours")).double().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("updated_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_worker")
                            .from(Alias::new("attendance"), Alias::new("worker_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_site")
                            .from(Alias::new("attendance"), Alias::new("site_id"))
                            .to(Alias::new("sites"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one attendance row per worker per calendar day.
        manager
            .create_index(
                Index::create()
                    .name("uq_attendance_worker_id_date")
                    .table(Alias::new("attendance"))
                    .col(Alias::new("worker_id"))
                    .col(Alias::new("date"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("attendance")).to_owned())
            .await
    }
}
