use sea_orm::entity::prelude::*;

/// One user reporting another for abuse.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub author_id: i32,
    pub reported_user_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(2000))")]
    pub message: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReportedUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    ReportedUser,
}

impl ActiveModelBehavior for ActiveModel {}
