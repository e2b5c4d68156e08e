//! Repository trait definitions for storage collaborators.
//!
//! Each storage concern has its own focused trait:
//!
//! - [`error`]: Error types for repository operations
//! - [`user`]: Identity store (users)
//! - [`follow`]: Relationship store (follow edges)
//! - [`record`]: Profile and preference stores
//!
//! # Trait Composition
//!
//! A complete backend implements all of them:
//!
//! ```ignore
//! impl UserRepository for MyRepo { ... }
//! impl FollowRepository for MyRepo { ... }
//! impl RecordRepository<UserProfile> for MyRepo { ... }
//! impl RecordRepository<UserPreference> for MyRepo { ... }
//! ```

pub mod error;
pub mod follow;
pub mod record;
pub mod user;

// Re-export error types
pub use error::{constraints, ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use follow::FollowRepository;
pub use record::RecordRepository;
pub use user::UserRepository;

use std::sync::Arc;

use crate::models::{UserPreference, UserProfile};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements every store trait.
pub trait FullRepository:
    UserRepository
    + FollowRepository
    + RecordRepository<UserProfile>
    + RecordRepository<UserPreference>
{
}

// Blanket implementation: any type implementing all store traits automatically implements FullRepository
impl<T> FullRepository for T where
    T: UserRepository
        + FollowRepository
        + RecordRepository<UserProfile>
        + RecordRepository<UserPreference>
{
}

/// Handles to every store, each behind its own trait object.
///
/// Services depend only on the stores they use; this bundle is how a single
/// backend is split into those handles.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub profiles: Arc<dyn RecordRepository<UserProfile>>,
    pub preferences: Arc<dyn RecordRepository<UserPreference>>,
}

impl Repositories {
    /// Split one backend implementing every store into per-store handles.
    pub fn from_backend<R>(backend: Arc<R>) -> Self
    where
        R: FullRepository + 'static,
    {
        Self {
            users: backend.clone(),
            follows: backend.clone(),
            profiles: backend.clone(),
            preferences: backend,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
