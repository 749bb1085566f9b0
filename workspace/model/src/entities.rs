//! Root of the SeaORM entity modules.
//! Users own one profile each; profiles are linked by relationships;
//! reports point from one user to another.

pub mod profile;
pub mod relationship;
pub mod report;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::profile::Entity as Profile;
    pub use super::relationship::Entity as Relationship;
    pub use super::report::Entity as Report;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, PaginatorTrait, Set,
    };

    use super::*;
    use prelude::*;
    use relationship::RelationshipStatus;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn create_member(
        db: &DatabaseConnection,
        username: &str,
    ) -> Result<(user::Model, profile::Model), DbErr> {
        let now = Utc::now().naive_utc();
        let user = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{}@example.com", username)),
            password_hash: Set("not-a-real-hash".to_string()),
            date_joined: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let profile = profile::ActiveModel {
            user_id: Set(user.id),
            image: Set(profile::DEFAULT_IMAGE.to_string()),
            created: Set(now),
            updated: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok((user, profile))
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let (alice, alice_profile) = create_member(&db, "alice").await?;
        let (_, bob_profile) = create_member(&db, "bob").await?;
        let (_, carol_profile) = create_member(&db, "carol").await?;

        // Profile lookup by owner
        let found = Profile::find_by_user(alice.id).one(&db).await?.unwrap();
        assert_eq!(found.id, alice_profile.id);

        // Alice invites Bob
        let now = Utc::now().naive_utc();
        let invite = relationship::ActiveModel::invitation(alice_profile.id, bob_profile.id, now)
            .insert(&db)
            .await?;
        assert_eq!(invite.status, RelationshipStatus::Send);
        assert_eq!(invite.sender_id, alice_profile.id);
        assert_eq!(invite.receiver_id, bob_profile.id);

        // Bob sees it as a received invitation, Alice does not
        let bob_invites = Relationship::invitations_received(bob_profile.id).all(&db).await?;
        assert_eq!(bob_invites.len(), 1);
        let alice_invites = Relationship::invitations_received(alice_profile.id).all(&db).await?;
        assert!(alice_invites.is_empty());

        // The pair is found from both sides
        let from_bob = Relationship::find_between(bob_profile.id, alice_profile.id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(from_bob.id, invite.id);

        // Pending invitations do not remove candidates
        let candidates = alice_profile.profiles_to_invite(&db).await?;
        assert_eq!(candidates.len(), 2);

        // Once accepted, Bob is no longer a candidate but a friend
        let mut accepted: relationship::ActiveModel = invite.into();
        accepted.status = Set(RelationshipStatus::Accepted);
        accepted.update(&db).await?;

        let candidates = alice_profile.profiles_to_invite(&db).await?;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, carol_profile.id);

        let friends = bob_profile.friends(&db).await?;
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, alice_profile.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_reverse_invitation_violates_pair_uniqueness() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let (_, a) = create_member(&db, "first").await?;
        let (_, b) = create_member(&db, "second").await?;
        let now = Utc::now().naive_utc();

        relationship::ActiveModel::invitation(a.id, b.id, now)
            .insert(&db)
            .await?;
        let reverse = relationship::ActiveModel::invitation(b.id, a.id, now)
            .insert(&db)
            .await;
        assert!(reverse.is_err());
        assert_eq!(Relationship::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_user_case_insensitive_lookup() -> Result<(), DbErr> {
        let db = setup_db().await?;
        create_member(&db, "MixedCase").await?;

        assert!(User::find_by_username_ci("mixedcase").one(&db).await?.is_some());
        assert!(User::find_by_username_ci("MIXEDCASE").one(&db).await?.is_some());
        assert!(User::find_by_username_ci("other").one(&db).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_reports_cascade_with_users() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let (author, _) = create_member(&db, "author").await?;
        let (target, _) = create_member(&db, "target").await?;

        report::ActiveModel {
            author_id: Set(author.id),
            reported_user_id: Set(target.id),
            message: Set("Spamming invitations".to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert_eq!(Report::find().count(&db).await?, 1);

        target.delete(&db).await?;
        assert_eq!(Report::find().count(&db).await?, 0);
        // The profile goes with its user
        assert_eq!(Profile::find().count(&db).await?, 1);

        Ok(())
    }
}
