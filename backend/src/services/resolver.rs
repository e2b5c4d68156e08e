//! Identity resolution: the single answer to "does this user exist".

use std::sync::Arc;

use super::error::{ServiceError, ServiceResult};
use crate::db::repository::UserRepository;
use crate::models::{Entity, User, UserKey};

/// Looks users up by id, username or email.
///
/// Other services go through this instead of the identity store so that
/// existence is decided in one place.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Resolve `key` to a user, or `NotFound { User }`.
    pub async fn resolve(&self, key: &UserKey) -> ServiceResult<User> {
        self.require(key, "resolve user").await
    }

    pub(crate) async fn require(&self, key: &UserKey, step: &'static str) -> ServiceResult<User> {
        self.lookup(key, step)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::User))
    }

    pub(crate) async fn lookup(
        &self,
        key: &UserKey,
        step: &'static str,
    ) -> ServiceResult<Option<User>> {
        let found = match key {
            UserKey::Id(id) => self.users.get_user_by_id(*id).await,
            UserKey::Username(username) => self.users.get_user_by_username(username).await,
            UserKey::Email(email) => self.users.get_user_by_email(email).await,
        };
        found.map_err(ServiceError::at(step))
    }
}
