use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{followers, user_preferences, user_profiles, users};
use crate::models::{NewUser, User, UserId, UserPreference, UserProfile};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            profile_image_url: row.profile_image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
}

impl From<&NewUser> for NewUserRow {
    fn from(user: &NewUser) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct UserChangeset {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = followers)]
pub struct NewFollowerRow {
    pub follower_id: i64,
    pub following_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_profiles, primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserProfileRow {
    pub user_id: i64,
    pub bio: Option<String>,
    pub job: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub banner_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        UserProfile {
            user_id: UserId::new(row.user_id),
            bio: row.bio,
            job: row.job,
            location: row.location,
            website_url: row.website_url,
            birth_date: row.birth_date,
            banner_image_url: row.banner_image_url,
            updated_at: row.updated_at,
        }
    }
}

impl From<&UserProfile> for UserProfileRow {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id.value(),
            bio: profile.bio.clone(),
            job: profile.job.clone(),
            location: profile.location.clone(),
            website_url: profile.website_url.clone(),
            birth_date: profile.birth_date,
            banner_image_url: profile.banner_image_url.clone(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_preferences, primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserPreferenceRow {
    pub user_id: i64,
    pub notifications_enabled: bool,
    pub account_private: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<UserPreferenceRow> for UserPreference {
    fn from(row: UserPreferenceRow) -> Self {
        UserPreference {
            user_id: UserId::new(row.user_id),
            notifications_enabled: row.notifications_enabled,
            account_private: row.account_private,
            updated_at: row.updated_at,
        }
    }
}

impl From<&UserPreference> for UserPreferenceRow {
    fn from(pref: &UserPreference) -> Self {
        Self {
            user_id: pref.user_id.value(),
            notifications_enabled: pref.notifications_enabled,
            account_private: pref.account_private,
            updated_at: Utc::now(),
        }
    }
}
