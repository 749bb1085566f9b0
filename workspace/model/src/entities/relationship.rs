use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a relationship.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    /// Invitation sent, waiting for the receiver.
    #[sea_orm(string_value = "send")]
    Send,
    #[sea_orm(string_value = "accepted")]
    Accepted,
}

/// Directed friend connection between two profiles.
///
/// Besides the direction (`sender_id` -> `receiver_id`) every row stores the
/// unordered pair as `(profile_low_id, profile_high_id)`. The pair columns are
/// covered by a unique index, so at most one relationship exists for any two
/// profiles and it can be found without caring about the direction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "relationships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub status: RelationshipStatus,
    pub profile_low_id: i32,
    pub profile_high_id: i32,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::SenderId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ReceiverId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

/// Normalizes two profile ids into the `(low, high)` key of their pair.
pub fn pair_key(a: i32, b: i32) -> (i32, i32) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Entity {
    /// The relationship between two profiles, whichever of them sent it.
    pub fn find_between(a: i32, b: i32) -> Select<Entity> {
        let (low, high) = pair_key(a, b);
        Self::find()
            .filter(Column::ProfileLowId.eq(low))
            .filter(Column::ProfileHighId.eq(high))
    }

    /// Pending invitations addressed to `receiver_id`.
    pub fn invitations_received(receiver_id: i32) -> Select<Entity> {
        Self::find()
            .filter(Column::ReceiverId.eq(receiver_id))
            .filter(Column::Status.eq(RelationshipStatus::Send))
            .order_by_asc(Column::Created)
            .order_by_asc(Column::Id)
    }

    /// Every relationship where `profile_id` is either sender or receiver.
    pub fn involving(profile_id: i32) -> Select<Entity> {
        Self::find()
            .filter(
                Condition::any()
                    .add(Column::SenderId.eq(profile_id))
                    .add(Column::ReceiverId.eq(profile_id)),
            )
            .order_by_asc(Column::Id)
    }
}

impl ActiveModel {
    /// A fresh invitation from `sender_id` to `receiver_id`.
    pub fn invitation(sender_id: i32, receiver_id: i32, now: DateTime) -> Self {
        let (low, high) = pair_key(sender_id, receiver_id);
        Self {
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            status: Set(RelationshipStatus::Send),
            profile_low_id: Set(low),
            profile_high_id: Set(high),
            created: Set(now),
            updated: Set(now),
            ..Default::default()
        }
    }
}

impl Model {
    /// The profile on the other end of this relationship, seen from `profile_id`.
    pub fn other_party(&self, profile_id: i32) -> i32 {
        if self.sender_id == profile_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn is_sent_by(&self, profile_id: i32) -> bool {
        self.sender_id == profile_id
    }

    pub fn is_received_by(&self, profile_id: i32) -> bool {
        self.receiver_id == profile_id
    }
}
