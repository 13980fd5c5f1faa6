use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601120001_create_users"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("users"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("country_code")).string().not_null())
                    .col(ColumnDef::new(Alias::new("mobile_number")).string().not_null())
                    .col(ColumnDef::new(Alias::new("password_hash")).string().null())
                    .col(ColumnDef::new(Alias::new("full_name")).string().null())
                    .col(
                        ColumnDef::new(Alias::new("role"))
                            .string()
                            .not_null()
                            .default("worker"),
                    )
                    .col(ColumnDef::new(Alias::new("profile_image_url")).string().null())
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
                    .col(ColumnDef::new(Alias::new("last_login_at")).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // One account per phone number, scoped by country code.
        manager
            .create_index(
                Index::create()
                    .name("uq_users_country_code_mobile_number")
                    .table(Alias::new("users"))
                    .col(Alias::new("country_code"))
                    .col(Alias::new("mobile_number"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("users")).to_owned())
            .await
    }
}
