use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Username, 150).unique_key())
                    .col(string_len(Users::Email, 254))
                    .col(string(Users::PasswordHash))
                    .col(date_time(Users::DateJoined))
                    .to_owned(),
            )
            .await?;

        // Create profiles table, one row per user
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(pk_auto(Profiles::Id))
                    .col(integer(Profiles::UserId).unique_key())
                    .col(string_len(Profiles::Image, 255).default("default.jpg"))
                    .col(date_time(Profiles::Created))
                    .col(date_time(Profiles::Updated))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_user")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create relationships table
        manager
            .create_table(
                Table::create()
                    .table(Relationships::Table)
                    .if_not_exists()
                    .col(pk_auto(Relationships::Id))
                    .col(integer(Relationships::SenderId))
                    .col(integer(Relationships::ReceiverId))
                    .col(string_len(Relationships::Status, 8).default("send"))
                    .col(integer(Relationships::ProfileLowId))
                    .col(integer(Relationships::ProfileHighId))
                    .col(date_time(Relationships::Created))
                    .col(date_time(Relationships::Updated))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relationship_sender")
                            .from(Relationships::Table, Relationships::SenderId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relationship_receiver")
                            .from(Relationships::Table, Relationships::ReceiverId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One relationship per unordered pair of profiles
        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_pair")
                    .table(Relationships::Table)
                    .col(Relationships::ProfileLowId)
                    .col(Relationships::ProfileHighId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_receiver_status")
                    .table(Relationships::Table)
                    .col(Relationships::ReceiverId)
                    .col(Relationships::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Relationships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    DateJoined,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Image,
    Created,
    Updated,
}

#[derive(DeriveIden)]
enum Relationships {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Status,
    ProfileLowId,
    ProfileHighId,
    Created,
    Updated,
}
