//! Follow-graph rules and aggregate counts.

use std::sync::Arc;

use tracing::debug;

use super::error::{ConflictReason, InvalidReason, ServiceError, ServiceResult};
use super::resolver::IdentityResolver;
use crate::db::repository::FollowRepository;
use crate::models::{FollowStats, UserId, UserKey};

/// Relationship manager.
///
/// Every ordered pair `(actor, target)` is either following or not. Follow
/// and unfollow each require the opposite state and report a conflict
/// otherwise; neither is idempotent.
#[derive(Clone)]
pub struct RelationshipManager {
    resolver: IdentityResolver,
    follows: Arc<dyn FollowRepository>,
}

impl RelationshipManager {
    pub fn new(resolver: IdentityResolver, follows: Arc<dyn FollowRepository>) -> Self {
        Self { resolver, follows }
    }

    /// Make `actor` follow `target`.
    pub async fn follow(&self, actor: UserId, target: UserId) -> ServiceResult<()> {
        self.check_pair(actor, target).await?;

        if self.is_edge(actor, target).await? {
            return Err(ServiceError::conflict(ConflictReason::AlreadyFollowing));
        }

        self.follows
            .insert_edge(actor, target)
            .await
            .map_err(ServiceError::at("insert follow edge"))?;

        debug!(follower = %actor, following = %target, "follow edge created");
        Ok(())
    }

    /// Make `actor` stop following `target`.
    pub async fn unfollow(&self, actor: UserId, target: UserId) -> ServiceResult<()> {
        self.check_pair(actor, target).await?;

        if !self.is_edge(actor, target).await? {
            return Err(ServiceError::conflict(ConflictReason::AlreadyNotFollowing));
        }

        let removed = self
            .follows
            .delete_edge(actor, target)
            .await
            .map_err(ServiceError::at("delete follow edge"))?;
        if !removed {
            return Err(ServiceError::conflict(ConflictReason::AlreadyNotFollowing));
        }

        debug!(follower = %actor, following = %target, "follow edge removed");
        Ok(())
    }

    /// Whether `actor` currently follows `target`.
    pub async fn is_following(&self, actor: UserId, target: UserId) -> ServiceResult<bool> {
        self.check_pair(actor, target).await?;
        self.is_edge(actor, target).await
    }

    /// Ids of the users following `user`.
    pub async fn list_followers(&self, user: UserId) -> ServiceResult<Vec<UserId>> {
        self.resolver
            .require(&UserKey::Id(user), "resolve user")
            .await?;
        self.follows
            .list_followers(user)
            .await
            .map_err(ServiceError::at("list followers"))
    }

    /// Ids of the users `user` follows.
    pub async fn list_following(&self, user: UserId) -> ServiceResult<Vec<UserId>> {
        self.resolver
            .require(&UserKey::Id(user), "resolve user")
            .await?;
        self.follows
            .list_following(user)
            .await
            .map_err(ServiceError::at("list following"))
    }

    /// Follower and following counts, read from the live edge set.
    pub async fn stats(&self, user: UserId) -> ServiceResult<FollowStats> {
        self.resolver
            .require(&UserKey::Id(user), "resolve user")
            .await?;

        let followers_count = self
            .follows
            .count_followers(user)
            .await
            .map_err(ServiceError::at("count followers"))?;
        let following_count = self
            .follows
            .count_following(user)
            .await
            .map_err(ServiceError::at("count following"))?;

        Ok(FollowStats {
            followers_count,
            following_count,
        })
    }

    // Self-follow is rejected before any storage access.
    async fn check_pair(&self, actor: UserId, target: UserId) -> ServiceResult<()> {
        if actor == target {
            return Err(ServiceError::invalid(InvalidReason::SelfFollow));
        }
        self.resolver
            .require(&UserKey::Id(actor), "check follower")
            .await?;
        self.resolver
            .require(&UserKey::Id(target), "check following")
            .await?;
        Ok(())
    }

    async fn is_edge(&self, actor: UserId, target: UserId) -> ServiceResult<bool> {
        self.follows
            .edge_exists(actor, target)
            .await
            .map_err(ServiceError::at("check follow state"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::UserRepository;
    use crate::models::{Entity, NewUser};

    async fn manager_with_users(n: usize) -> (LocalRepository, RelationshipManager) {
        let repo = LocalRepository::new();
        for i in 0..n {
            repo.insert_user(&NewUser {
                username: format!("user{}", i),
                email: format!("user{}@example.com", i),
                display_name: format!("User {}", i),
                profile_image_url: None,
            })
            .await
            .unwrap();
        }
        let shared = Arc::new(repo.clone());
        let manager = RelationshipManager::new(IdentityResolver::new(shared.clone()), shared);
        (repo, manager)
    }

    fn id(n: i64) -> UserId {
        UserId::new(n)
    }

    #[tokio::test]
    async fn test_follow_then_stats() {
        let (_repo, manager) = manager_with_users(2).await;
        manager.follow(id(1), id(2)).await.unwrap();

        assert!(manager.is_following(id(1), id(2)).await.unwrap());
        assert!(!manager.is_following(id(2), id(1)).await.unwrap());
        assert_eq!(
            manager.stats(id(2)).await.unwrap(),
            FollowStats {
                followers_count: 1,
                following_count: 0
            }
        );
        assert_eq!(manager.list_following(id(1)).await.unwrap(), vec![id(2)]);
    }

    #[tokio::test]
    async fn test_self_follow_never_reaches_storage() {
        let (repo, manager) = manager_with_users(1).await;
        repo.set_healthy(false);

        for result in [
            manager.follow(id(1), id(1)).await,
            manager.unfollow(id(1), id(1)).await,
            manager.is_following(id(1), id(1)).await.map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(ServiceError::InvalidInput {
                    reason: InvalidReason::SelfFollow
                })
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let (repo, manager) = manager_with_users(1).await;
        let err = manager.follow(id(1), id(9)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: Entity::User
            }
        ));
        assert_eq!(repo.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_follow_and_unfollow_conflict() {
        let (_repo, manager) = manager_with_users(2).await;
        manager.follow(id(1), id(2)).await.unwrap();
        assert!(matches!(
            manager.follow(id(1), id(2)).await,
            Err(ServiceError::Conflict {
                reason: ConflictReason::AlreadyFollowing
            })
        ));

        manager.unfollow(id(1), id(2)).await.unwrap();
        assert!(matches!(
            manager.unfollow(id(1), id(2)).await,
            Err(ServiceError::Conflict {
                reason: ConflictReason::AlreadyNotFollowing
            })
        ));
    }

    #[tokio::test]
    async fn test_failed_existence_check_names_step() {
        let (repo, manager) = manager_with_users(2).await;
        repo.inject_failure("edge_exists");
        let err = manager.follow(id(1), id(2)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Internal {
                step: "check follow state",
                ..
            }
        ));
    }
}
