//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory and the same constraints as the relational schema are enforced:
//! unique usernames and emails, one edge per ordered pair, no self-follow,
//! and cascading deletes from users to their dependent rows.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{FollowEdge, NewUser, User, UserId, UserPreference, UserProfile};

/// In-memory local repository.
///
/// Cloning is cheap and every clone shares the same underlying data.
///
/// # Example
/// ```
/// use yapper_users::db::repositories::LocalRepository;
/// use yapper_users::db::repository::UserRepository;
/// use yapper_users::models::NewUser;
///
/// #[tokio::main]
/// async fn main() {
///     let repo = LocalRepository::new();
///     let user = repo
///         .insert_user(&NewUser {
///             username: "ada".into(),
///             email: "ada@example.com".into(),
///             display_name: "Ada".into(),
///             profile_image_url: None,
///         })
///         .await
///         .unwrap();
///     assert_eq!(user.id.value(), 1);
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    users: BTreeMap<UserId, User>,
    // Insertion order is preserved for listings
    edges: Vec<FollowEdge>,
    profiles: HashMap<UserId, UserProfile>,
    preferences: HashMap<UserId, UserPreference>,

    next_user_id: i64,

    // Connection health and injected failures
    is_healthy: bool,
    failing_operations: HashSet<String>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            edges: Vec::new(),
            profiles: HashMap::new(),
            preferences: HashMap::new(),
            next_user_id: 1,
            is_healthy: true,
            failing_operations: HashSet::new(),
        }
    }
}

impl LocalData {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn require_user(&self, id: UserId, operation: &str) -> RepositoryResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::not_found_with_context(
                format!("User {} does not exist", id),
                ErrorContext::new(operation)
                    .with_entity("user")
                    .with_entity_id(id),
            ))
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every operation fails with a `ConnectionError`.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make a single operation (e.g. `"insert_edge"`) fail with a query error.
    pub fn inject_failure(&self, operation: impl Into<String>) {
        self.data.write().failing_operations.insert(operation.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.data.write().failing_operations.clear();
    }

    /// Get the number of users stored.
    pub fn user_count(&self) -> usize {
        self.data.read().users.len()
    }

    /// Get the number of follow edges stored.
    pub fn edge_count(&self) -> usize {
        self.data.read().edges.len()
    }

    /// Helper to check health and injected failures before an operation.
    fn check(&self, operation: &str) -> RepositoryResult<()> {
        let data = self.data.read();
        if !data.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        if data.failing_operations.contains(operation) {
            return Err(RepositoryError::query_with_context(
                "Injected failure",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Identity Store ====================

#[async_trait]
impl UserRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User> {
        self.check("insert_user")?;
        let mut data = self.data.write();

        if data.username_taken(&user.username, None) {
            return Err(RepositoryError::conflict(
                constraints::USERS_USERNAME,
                format!("Username {} already exists", user.username),
            ));
        }
        if data.email_taken(&user.email, None) {
            return Err(RepositoryError::conflict(
                constraints::USERS_EMAIL,
                format!("Email {} already exists", user.email),
            ));
        }

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;

        let now = Utc::now();
        let stored = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        data.users.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.check("get_user_by_id")?;
        Ok(self.data.read().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.check("get_user_by_username")?;
        let data = self.data.read();
        Ok(data.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.check("get_user_by_email")?;
        let data = self.data.read();
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> RepositoryResult<()> {
        self.check("update_user")?;
        let mut data = self.data.write();
        data.require_user(user.id, "update_user")?;

        if data.username_taken(&user.username, Some(user.id)) {
            return Err(RepositoryError::conflict(
                constraints::USERS_USERNAME,
                format!("Username {} already exists", user.username),
            ));
        }
        if data.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::conflict(
                constraints::USERS_EMAIL,
                format!("Email {} already exists", user.email),
            ));
        }

        if let Some(stored) = data.users.get_mut(&user.id) {
            stored.username = user.username.clone();
            stored.email = user.email.clone();
            stored.display_name = user.display_name.clone();
            stored.profile_image_url = user.profile_image_url.clone();
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<bool> {
        self.check("delete_user")?;
        let mut data = self.data.write();
        if data.users.remove(&id).is_none() {
            return Ok(false);
        }

        // ON DELETE CASCADE
        data.edges
            .retain(|e| e.follower_id != id && e.following_id != id);
        data.profiles.remove(&id);
        data.preferences.remove(&id);
        Ok(true)
    }
}

// ==================== Relationship Store ====================

#[async_trait]
impl FollowRepository for LocalRepository {
    async fn insert_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<()> {
        self.check("insert_edge")?;
        let mut data = self.data.write();

        if follower == following {
            return Err(RepositoryError::conflict(
                constraints::FOLLOWERS_NO_SELF,
                format!("User {} cannot follow itself", follower),
            ));
        }
        data.require_user(follower, "insert_edge")?;
        data.require_user(following, "insert_edge")?;

        if data
            .edges
            .iter()
            .any(|e| e.follower_id == follower && e.following_id == following)
        {
            return Err(RepositoryError::conflict(
                constraints::FOLLOWERS_PAIR,
                format!("Edge {} -> {} already exists", follower, following),
            ));
        }

        data.edges.push(FollowEdge {
            follower_id: follower,
            following_id: following,
            followed_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<bool> {
        self.check("delete_edge")?;
        let mut data = self.data.write();
        let before = data.edges.len();
        data.edges
            .retain(|e| !(e.follower_id == follower && e.following_id == following));
        Ok(data.edges.len() < before)
    }

    async fn edge_exists(&self, follower: UserId, following: UserId) -> RepositoryResult<bool> {
        self.check("edge_exists")?;
        let data = self.data.read();
        Ok(data
            .edges
            .iter()
            .any(|e| e.follower_id == follower && e.following_id == following))
    }

    async fn list_followers(&self, user: UserId) -> RepositoryResult<Vec<UserId>> {
        self.check("list_followers")?;
        let data = self.data.read();
        Ok(data
            .edges
            .iter()
            .filter(|e| e.following_id == user)
            .map(|e| e.follower_id)
            .collect())
    }

    async fn list_following(&self, user: UserId) -> RepositoryResult<Vec<UserId>> {
        self.check("list_following")?;
        let data = self.data.read();
        Ok(data
            .edges
            .iter()
            .filter(|e| e.follower_id == user)
            .map(|e| e.following_id)
            .collect())
    }

    async fn count_followers(&self, user: UserId) -> RepositoryResult<i64> {
        self.check("count_followers")?;
        let data = self.data.read();
        Ok(data.edges.iter().filter(|e| e.following_id == user).count() as i64)
    }

    async fn count_following(&self, user: UserId) -> RepositoryResult<i64> {
        self.check("count_following")?;
        let data = self.data.read();
        Ok(data.edges.iter().filter(|e| e.follower_id == user).count() as i64)
    }
}

// ==================== Profile & Preference Stores ====================

#[async_trait]
impl RecordRepository<UserProfile> for LocalRepository {
    async fn upsert_record(&self, record: &UserProfile) -> RepositoryResult<()> {
        self.check("upsert_profile")?;
        let mut data = self.data.write();
        data.require_user(record.user_id, "upsert_profile")?;

        let mut stored = record.clone();
        stored.updated_at = Utc::now();
        data.profiles.insert(record.user_id, stored);
        Ok(())
    }

    async fn get_record(&self, user_id: UserId) -> RepositoryResult<Option<UserProfile>> {
        self.check("get_profile")?;
        Ok(self.data.read().profiles.get(&user_id).cloned())
    }
}

#[async_trait]
impl RecordRepository<UserPreference> for LocalRepository {
    async fn upsert_record(&self, record: &UserPreference) -> RepositoryResult<()> {
        self.check("upsert_preference")?;
        let mut data = self.data.write();
        data.require_user(record.user_id, "upsert_preference")?;

        let mut stored = record.clone();
        stored.updated_at = Utc::now();
        data.preferences.insert(record.user_id, stored);
        Ok(())
    }

    async fn get_record(&self, user_id: UserId) -> RepositoryResult<Option<UserPreference>> {
        self.check("get_preference")?;
        Ok(self.data.read().preferences.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            display_name: name.to_uppercase(),
            profile_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = LocalRepository::new();
        let a = repo.insert_user(&new_user("a")).await.unwrap();
        let b = repo.insert_user(&new_user("b")).await.unwrap();
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn test_insert_duplicate_username_conflicts() {
        let repo = LocalRepository::new();
        repo.insert_user(&new_user("a")).await.unwrap();

        let mut dup = new_user("a");
        dup.email = "other@example.com".to_string();
        let err = repo.insert_user(&dup).await.unwrap_err();
        assert_eq!(err.conflict_constraint(), Some(constraints::USERS_USERNAME));
    }

    #[tokio::test]
    async fn test_duplicate_edge_conflicts() {
        let repo = LocalRepository::new();
        let a = repo.insert_user(&new_user("a")).await.unwrap();
        let b = repo.insert_user(&new_user("b")).await.unwrap();

        repo.insert_edge(a.id, b.id).await.unwrap();
        let err = repo.insert_edge(a.id, b.id).await.unwrap_err();
        assert_eq!(err.conflict_constraint(), Some(constraints::FOLLOWERS_PAIR));
        assert_eq!(repo.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let repo = LocalRepository::new();
        let a = repo.insert_user(&new_user("a")).await.unwrap();
        let b = repo.insert_user(&new_user("b")).await.unwrap();
        repo.insert_edge(a.id, b.id).await.unwrap();
        repo.insert_edge(b.id, a.id).await.unwrap();
        repo.upsert_record(&UserProfile::with_defaults(a.id))
            .await
            .unwrap();

        assert!(repo.delete_user(a.id).await.unwrap());
        assert_eq!(repo.edge_count(), 0);
        let profile = RecordRepository::<UserProfile>::get_record(&repo, a.id)
            .await
            .unwrap();
        assert!(profile.is_none());
        assert!(!repo.delete_user(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_record_requires_user() {
        let repo = LocalRepository::new();
        let err = repo
            .upsert_record(&UserPreference::with_defaults(UserId::new(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.get_user_by_id(UserId::new(1)).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_injected_failure_targets_one_operation() {
        let repo = LocalRepository::new();
        let a = repo.insert_user(&new_user("a")).await.unwrap();
        repo.inject_failure("count_followers");

        assert!(repo.count_followers(a.id).await.is_err());
        assert_eq!(repo.count_following(a.id).await.unwrap(), 0);

        repo.clear_failures();
        assert_eq!(repo.count_followers(a.id).await.unwrap(), 0);
    }
}
