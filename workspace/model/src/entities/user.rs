use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::QueryFilter;

/// Represents a registered user of the system.
/// Holds the core identity only; display attributes live on the profile.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the raw password.
    pub password_hash: String,
    pub date_joined: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // Every user owns exactly one profile.
    #[sea_orm(has_one = "super::profile::Entity")]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Case-insensitive username lookup.
    pub fn find_by_username_ci(username: &str) -> Select<Entity> {
        Self::find().filter(
            Expr::expr(Func::lower(Expr::col(Column::Username))).eq(username.to_lowercase()),
        )
    }
}
