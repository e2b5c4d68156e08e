//! Service layer for business logic.
//!
//! This module contains the rules between the transport boundary and the
//! storage traits: existence checks, uniqueness, follow-graph state and the
//! merge of partial profile/preference updates. Each component receives its
//! storage collaborators through its constructor.
//!
//! - [`IdentityResolver`]: user lookup by id, username or email
//! - [`UserLifecycle`]: create, update, delete
//! - [`RelationshipManager`]: follow, unfollow, listings and stats
//! - [`RecordMergeEngine`]: upsert/get for profiles and preferences
//! - [`UserService`]: one handle over all of the above

pub mod error;
pub mod records;
pub mod relationships;
pub mod resolver;
pub mod users;

pub use error::{ConflictReason, InvalidReason, ServiceError, ServiceResult};
pub use records::RecordMergeEngine;
pub use relationships::RelationshipManager;
pub use resolver::IdentityResolver;
pub use users::UserLifecycle;

use std::sync::Arc;

use crate::db::repository::{Repositories, UserRepository};
use crate::models::{
    CreateUserRequest, FollowStats, PreferencePatch, ProfilePatch, UpdateUserRequest, User,
    UserId, UserKey, UserPreference, UserProfile,
};

/// Facade wiring every service component over one set of repositories.
#[derive(Clone)]
pub struct UserService {
    resolver: IdentityResolver,
    lifecycle: UserLifecycle,
    relationships: RelationshipManager,
    profiles: RecordMergeEngine<UserProfile>,
    preferences: RecordMergeEngine<UserPreference>,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        let resolver = IdentityResolver::new(repos.users.clone());
        Self {
            lifecycle: UserLifecycle::new(resolver.clone(), repos.users.clone()),
            relationships: RelationshipManager::new(resolver.clone(), repos.follows),
            profiles: RecordMergeEngine::new(resolver.clone(), repos.profiles),
            preferences: RecordMergeEngine::new(resolver.clone(), repos.preferences),
            users: repos.users,
            resolver,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn relationships(&self) -> &RelationshipManager {
        &self.relationships
    }

    /// Whether the identity store is reachable.
    pub async fn health_check(&self) -> ServiceResult<bool> {
        self.users
            .health_check()
            .await
            .map_err(ServiceError::at("check storage health"))
    }

    // ==================== Users ====================

    pub async fn get_user(&self, key: &UserKey) -> ServiceResult<User> {
        self.resolver.resolve(key).await
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> ServiceResult<User> {
        self.lifecycle.create(request).await
    }

    pub async fn update_user(&self, id: UserId, request: UpdateUserRequest) -> ServiceResult<User> {
        self.lifecycle.update(id, request).await
    }

    pub async fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        self.lifecycle.delete(id).await
    }

    // ==================== Relationships ====================

    pub async fn follow(&self, actor: UserId, target: UserId) -> ServiceResult<()> {
        self.relationships.follow(actor, target).await
    }

    pub async fn unfollow(&self, actor: UserId, target: UserId) -> ServiceResult<()> {
        self.relationships.unfollow(actor, target).await
    }

    pub async fn is_following(&self, actor: UserId, target: UserId) -> ServiceResult<bool> {
        self.relationships.is_following(actor, target).await
    }

    pub async fn list_followers(&self, user: UserId) -> ServiceResult<Vec<UserId>> {
        self.relationships.list_followers(user).await
    }

    pub async fn list_following(&self, user: UserId) -> ServiceResult<Vec<UserId>> {
        self.relationships.list_following(user).await
    }

    pub async fn follow_stats(&self, user: UserId) -> ServiceResult<FollowStats> {
        self.relationships.stats(user).await
    }

    // ==================== Profile & Preference ====================

    pub async fn upsert_profile(
        &self,
        user: UserId,
        patch: &ProfilePatch,
    ) -> ServiceResult<UserProfile> {
        self.profiles.upsert(user, patch).await
    }

    pub async fn get_profile(&self, user: UserId) -> ServiceResult<UserProfile> {
        self.profiles.get_by_user_id(user).await
    }

    pub async fn upsert_preference(
        &self,
        user: UserId,
        patch: &PreferencePatch,
    ) -> ServiceResult<UserPreference> {
        self.preferences.upsert(user, patch).await
    }

    pub async fn get_preference(&self, user: UserId) -> ServiceResult<UserPreference> {
        self.preferences.get_by_user_id(user).await
    }
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}
