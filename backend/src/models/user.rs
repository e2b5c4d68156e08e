//! Core identity and relationship records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, UserId);

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a user; the store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
}

/// Key a user can be resolved by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    Id(UserId),
    Username(String),
    Email(String),
}

impl From<UserId> for UserKey {
    fn from(id: UserId) -> Self {
        UserKey::Id(id)
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserKey::Id(id) => write!(f, "id={}", id),
            UserKey::Username(username) => write!(f, "username={}", username),
            UserKey::Email(email) => write!(f, "email={}", email),
        }
    }
}

/// Directed relationship: `follower_id` follows `following_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub following_id: UserId,
    pub followed_at: DateTime<Utc>,
}

/// Follower/following cardinalities, always computed from the live edge set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers_count: i64,
    pub following_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(3),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_serializes_flat_id() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(value["id"], 3);
        assert!(value["profile_image_url"].is_null());
    }
}
