//! Data Transfer Objects for the HTTP API.
//!
//! Domain records already derive Serialize/Deserialize and are returned as-is;
//! this module only holds the shapes that exist purely for transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::models::{
    CreateUserRequest, FollowRequest, FollowStats, PreferencePatch, ProfilePatch,
    UpdateUserRequest, User, UserId, UserPreference, UserProfile,
};

/// Response for user creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for CreateUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
        }
    }
}

/// Query string of `GET /user/v1/{id}/isFollowing`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IsFollowingQuery {
    pub following_id: UserId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IsFollowingResponse {
    pub is_following: bool,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    /// API version
    pub version: String,
    /// Storage connection status
    pub database: String,
}
