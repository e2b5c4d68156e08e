//! One-to-one auxiliary records keyed by user, and the merge contract they share.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::field::Field;
use super::user::UserId;
use super::Entity;

/// A per-user record that is created lazily and merged on every upsert.
///
/// `with_defaults` builds the record a user gets before any field is set;
/// `merge` overwrites only the fields the patch carries.
pub trait Record: Clone + Send + Sync + 'static {
    type Patch: Send + Sync;

    /// Entity reported when the record does not exist.
    const ENTITY: Entity;

    fn with_defaults(user_id: UserId) -> Self;

    fn merge(&mut self, patch: &Self::Patch);
}

/// Free-form profile details. Every field is independently nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub bio: Option<String>,
    pub job: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub banner_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub bio: Field<String>,
    #[serde(default)]
    pub job: Field<String>,
    #[serde(default)]
    pub location: Field<String>,
    #[serde(default)]
    pub website_url: Field<String>,
    #[serde(default)]
    pub birth_date: Field<NaiveDate>,
    #[serde(default)]
    pub banner_image_url: Field<String>,
}

impl Record for UserProfile {
    type Patch = ProfilePatch;

    const ENTITY: Entity = Entity::Profile;

    fn with_defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            bio: None,
            job: None,
            location: None,
            website_url: None,
            birth_date: None,
            banner_image_url: None,
            updated_at: Utc::now(),
        }
    }

    fn merge(&mut self, patch: &ProfilePatch) {
        patch.bio.apply_to(&mut self.bio);
        patch.job.apply_to(&mut self.job);
        patch.location.apply_to(&mut self.location);
        patch.website_url.apply_to(&mut self.website_url);
        patch.birth_date.apply_to(&mut self.birth_date);
        patch.banner_image_url.apply_to(&mut self.banner_image_url);
    }
}

/// Account-level switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: UserId,
    pub notifications_enabled: bool,
    pub account_private: bool,
    pub updated_at: DateTime<Utc>,
}

impl UserPreference {
    pub const DEFAULT_NOTIFICATIONS_ENABLED: bool = true;
    pub const DEFAULT_ACCOUNT_PRIVATE: bool = false;
}

/// Partial preference update. The flags are not nullable, so `null` and an
/// omitted key both leave the stored flag untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePatch {
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub account_private: Option<bool>,
}

impl Record for UserPreference {
    type Patch = PreferencePatch;

    const ENTITY: Entity = Entity::Preference;

    fn with_defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            notifications_enabled: Self::DEFAULT_NOTIFICATIONS_ENABLED,
            account_private: Self::DEFAULT_ACCOUNT_PRIVATE,
            updated_at: Utc::now(),
        }
    }

    fn merge(&mut self, patch: &PreferencePatch) {
        if let Some(enabled) = patch.notifications_enabled {
            self.notifications_enabled = enabled;
        }
        if let Some(private) = patch.account_private {
            self.account_private = private;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_defaults() {
        let pref = UserPreference::with_defaults(UserId::new(1));
        assert!(pref.notifications_enabled);
        assert!(!pref.account_private);
    }

    #[test]
    fn test_preference_merge_keeps_unspecified_flags() {
        let mut pref = UserPreference::with_defaults(UserId::new(1));
        pref.notifications_enabled = false;
        pref.account_private = true;

        pref.merge(&PreferencePatch {
            notifications_enabled: None,
            account_private: Some(false),
        });

        assert!(!pref.notifications_enabled);
        assert!(!pref.account_private);
    }

    #[test]
    fn test_profile_merge_three_states() {
        let mut profile = UserProfile::with_defaults(UserId::new(1));
        profile.bio = Some("bio".into());
        profile.job = Some("job".into());

        let patch: ProfilePatch =
            serde_json::from_str(r#"{"job": null, "location": "Oslo"}"#).unwrap();
        profile.merge(&patch);

        assert_eq!(profile.bio.as_deref(), Some("bio"));
        assert_eq!(profile.job, None);
        assert_eq!(profile.location.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_profile_patch_parses_birth_date() {
        let patch: ProfilePatch = serde_json::from_str(r#"{"birth_date": "1990-04-01"}"#).unwrap();
        assert_eq!(
            patch.birth_date,
            Field::Set(NaiveDate::from_ymd_opt(1990, 4, 1).unwrap())
        );
    }
}
