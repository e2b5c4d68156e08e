//! Identity store trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewUser, User, UserId};

/// Repository trait for the core identity record.
///
/// Lookups return `Ok(None)` when no row matches, so callers can tell
/// "no such user" apart from a storage failure.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a user and return the stored row, including the assigned id
    /// and timestamps.
    ///
    /// # Errors
    /// `ConflictError` when the username or email is already taken.
    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User>;

    async fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Persist the mutable columns of `user` and bump `updated_at`.
    ///
    /// # Errors
    /// `NotFound` if the row vanished, `ConflictError` on a uniqueness violation.
    async fn update_user(&self, user: &User) -> RepositoryResult<()>;

    /// Delete a user. Dependent rows are removed by the store itself.
    ///
    /// # Returns
    /// * `Ok(true)` if a row was deleted
    async fn delete_user(&self, id: UserId) -> RepositoryResult<bool>;
}
