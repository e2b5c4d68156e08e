//! Create, update and delete of the core identity record.

use std::sync::Arc;

use tracing::debug;

use super::error::{ConflictReason, ServiceError, ServiceResult};
use super::resolver::IdentityResolver;
use crate::db::repository::UserRepository;
use crate::models::{CreateUserRequest, Entity, NewUser, UpdateUserRequest, User, UserId, UserKey};

/// User lifecycle manager.
///
/// Uniqueness of usernames and emails is checked here before writing; the
/// store's unique constraints catch whatever races past the check.
#[derive(Clone)]
pub struct UserLifecycle {
    resolver: IdentityResolver,
    users: Arc<dyn UserRepository>,
}

impl UserLifecycle {
    pub fn new(resolver: IdentityResolver, users: Arc<dyn UserRepository>) -> Self {
        Self { resolver, users }
    }

    /// Create a user and return it as stored, with its assigned id and timestamps.
    pub async fn create(&self, request: CreateUserRequest) -> ServiceResult<User> {
        self.ensure_username_free(&request.username, None).await?;
        self.ensure_email_free(&request.email, None).await?;

        let inserted = self
            .users
            .insert_user(&NewUser {
                username: request.username,
                email: request.email,
                display_name: request.display_name,
                profile_image_url: None,
            })
            .await
            .map_err(ServiceError::at("insert user"))?;

        let user = self
            .resolver
            .require(&UserKey::Id(inserted.id), "reload user")
            .await?;
        debug!(user_id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    /// Apply the fields present in `request` to user `id`.
    pub async fn update(&self, id: UserId, request: UpdateUserRequest) -> ServiceResult<User> {
        let key = UserKey::Id(id);
        let mut user = self.resolver.require(&key, "resolve user").await?;

        if let Some(username) = request.username {
            self.ensure_username_free(&username, Some(id)).await?;
            user.username = username;
        }
        if let Some(email) = request.email {
            self.ensure_email_free(&email, Some(id)).await?;
            user.email = email;
        }
        if let Some(display_name) = request.display_name {
            user.display_name = display_name;
        }
        request
            .profile_image_url
            .apply_to(&mut user.profile_image_url);

        self.users
            .update_user(&user)
            .await
            .map_err(ServiceError::at("update user"))?;

        let user = self.resolver.require(&key, "reload user").await?;
        debug!(user_id = %id, "updated user");
        Ok(user)
    }

    /// Delete user `id`. Dependent edges and records go with it in the store.
    pub async fn delete(&self, id: UserId) -> ServiceResult<()> {
        self.resolver
            .require(&UserKey::Id(id), "resolve user")
            .await?;

        let deleted = self
            .users
            .delete_user(id)
            .await
            .map_err(ServiceError::at("delete user"))?;
        if !deleted {
            // Removed by a concurrent request between resolve and delete
            return Err(ServiceError::not_found(Entity::User));
        }

        debug!(user_id = %id, "deleted user");
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str, owner: Option<UserId>) -> ServiceResult<()> {
        let existing = self
            .resolver
            .lookup(&UserKey::Username(username.to_string()), "check username")
            .await?;
        ensure_free(existing, owner, ConflictReason::UsernameInUse)
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<UserId>) -> ServiceResult<()> {
        let existing = self
            .resolver
            .lookup(&UserKey::Email(email.to_string()), "check email")
            .await?;
        ensure_free(existing, owner, ConflictReason::EmailInUse)
    }
}

fn ensure_free(
    existing: Option<User>,
    owner: Option<UserId>,
    reason: ConflictReason,
) -> ServiceResult<()> {
    match existing {
        Some(user) if Some(user.id) != owner => Err(ServiceError::conflict(reason)),
        _ => Ok(()),
    }
}
