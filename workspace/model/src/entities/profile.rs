use super::{relationship, user};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder};
use tracing::trace;

/// Picture reference assigned to every new profile.
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// Per-user extended record beyond the core identity.
/// Created together with its user and never deleted on its own.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The owning user (one-to-one).
    #[sea_orm(unique)]
    pub user_id: i32,
    /// Reference to the profile picture.
    pub image: String,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    pub fn find_by_user(user_id: i32) -> Select<Entity> {
        Self::find().filter(Column::UserId.eq(user_id))
    }

    /// Every profile except the one owned by `user_id`.
    pub fn find_all_except_user(user_id: i32) -> Select<Entity> {
        Self::find()
            .filter(Column::UserId.ne(user_id))
            .order_by_asc(Column::Id)
    }
}

impl Model {
    /// Ids of the profiles holding an accepted relationship with this one.
    pub async fn friend_ids<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<i32>, DbErr> {
        let accepted = relationship::Entity::involving(self.id)
            .filter(relationship::Column::Status.eq(relationship::RelationshipStatus::Accepted))
            .all(db)
            .await?;
        trace!(profile_id = self.id, count = accepted.len(), "Loaded accepted relationships");

        Ok(accepted
            .iter()
            .map(|rel| rel.other_party(self.id))
            .collect())
    }

    /// Profiles this profile's owner has not connected with yet.
    ///
    /// Pending invitations in either direction do not count as a connection,
    /// only accepted relationships remove a profile from the candidates.
    pub async fn profiles_to_invite<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<Model>, DbErr> {
        let friends = self.friend_ids(db).await?;

        let mut query = Entity::find_all_except_user(self.user_id);
        if !friends.is_empty() {
            query = query.filter(Column::Id.is_not_in(friends));
        }
        query.all(db).await
    }

    pub async fn friends<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<Model>, DbErr> {
        let friends = self.friend_ids(db).await?;
        if friends.is_empty() {
            return Ok(Vec::new());
        }

        Entity::find()
            .filter(Column::Id.is_in(friends))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
