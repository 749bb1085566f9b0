use sea_orm_migration::{prelude::*, schema::*};

use crate::m20220101_000001_create_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(pk_auto(Reports::Id))
                    .col(integer(Reports::AuthorId))
                    .col(integer(Reports::ReportedUserId))
                    .col(string_len(Reports::Message, 2000))
                    .col(date_time(Reports::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_author")
                            .from(Reports::Table, Reports::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reported_user")
                            .from(Reports::Table, Reports::ReportedUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    AuthorId,
    ReportedUserId,
    Message,
    CreatedAt,
}
