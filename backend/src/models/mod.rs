//! Domain records and request shapes shared by every layer.

pub mod field;
pub mod macros;
pub mod record;
pub mod requests;
pub mod user;

pub use field::Field;
pub use record::{PreferencePatch, ProfilePatch, Record, UserPreference, UserProfile};
pub use requests::{CreateUserRequest, FollowRequest, UpdateUserRequest};
pub use user::{FollowEdge, FollowStats, NewUser, User, UserId, UserKey};

use serde::{Deserialize, Serialize};

/// Kind of record an operation looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    User,
    Profile,
    Preference,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Profile => "user profile",
            Entity::Preference => "user preferences",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
