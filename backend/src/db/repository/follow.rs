//! Relationship store trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::UserId;

/// Repository trait for directed follow edges.
///
/// At most one edge exists per ordered `(follower, following)` pair; inserting
/// a duplicate fails with `ConflictError`.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn insert_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<()>;

    /// Remove an edge.
    ///
    /// # Returns
    /// * `Ok(true)` if an edge was removed, `Ok(false)` if none existed
    async fn delete_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<bool>;

    async fn edge_exists(&self, follower: UserId, following: UserId) -> RepositoryResult<bool>;

    /// Ids of users following `user`.
    async fn list_followers(&self, user: UserId) -> RepositoryResult<Vec<UserId>>;

    /// Ids of users `user` follows.
    async fn list_following(&self, user: UserId) -> RepositoryResult<Vec<UserId>>;

    async fn count_followers(&self, user: UserId) -> RepositoryResult<i64>;

    async fn count_following(&self, user: UserId) -> RepositoryResult<i64>;
}
