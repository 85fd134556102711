use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CultivationCycles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CultivationCycles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CultivationCycles::HouseId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CultivationCycles::State)
                            .string()
                            .not_null()
                            .default("not_started"),
                    )
                    .col(ColumnDef::new(CultivationCycles::StartedAt).string().null())
                    .col(ColumnDef::new(CultivationCycles::StoppedAt).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cultivation_cycles_house_id")
                            .from(CultivationCycles::Table, CultivationCycles::HouseId)
                            .to(Houses::Table, Houses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cultivation_cycles_house_id")
                    .table(CultivationCycles::Table)
                    .col(CultivationCycles::HouseId)
                    .to_owned(),
            )
            .await?;

        // At most one running cycle per house, even across processes.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_cultivation_cycles_one_running \
                 ON cultivation_cycles (house_id) WHERE state = 'running'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CultivationCycles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CultivationCycles {
    Table,
    Id,
    HouseId,
    State,
    StartedAt,
    StoppedAt,
}

#[derive(Iden)]
enum Houses {
    Table,
    Id,
}
