use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Houses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Houses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Houses::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Houses::Name).string().not_null())
                    .col(ColumnDef::new(Houses::Location).string().not_null())
                    .col(
                        ColumnDef::new(Houses::Status)
                            .string()
                            .not_null()
                            .default("idle"),
                    )
                    .col(ColumnDef::new(Houses::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Houses::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_houses_owner_id")
                    .table(Houses::Table)
                    .col(Houses::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Houses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Houses {
    Table,
    Id,
    OwnerId,
    Name,
    Location,
    Status,
    CreatedAt,
    UpdatedAt,
}
