//! Postgres repository implementation using Diesel.
//!
//! This module implements every repository trait against a Postgres database
//! whose schema lives in `migrations/`. Unique, primary-key and check
//! constraints in that schema are the authoritative backstop for the
//! fast-path checks done by the service layer.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Connection health check
//! - Automatic migration execution
//!
//! Failed operations are surfaced immediately; nothing is retried here.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, FollowRepository, RecordRepository, RepositoryError, RepositoryResult,
    UserRepository,
};
use crate::models::{NewUser, User, UserId, UserPreference, UserProfile};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.max_pool_size);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.min_pool_size);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.connection_timeout_sec);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.idle_timeout_sec);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (max_pool_size={})",
            config.max_pool_size
        );

        Ok(Self { pool })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Run a blocking Diesel operation on a pooled connection.
    ///
    /// The blocking work runs on tokio's blocking pool; if the awaiting
    /// request is dropped, the result is discarded.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new(operation).with_details("get_connection"),
                )
            })?;

            f(&mut conn).map_err(|e| e.with_operation(operation))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation).with_details("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

// ==================== Identity Store ====================

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = NewUserRow::from(user);
        self.with_conn("insert_user", move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map(User::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn("get_user_by_id", move |conn| {
            users::table
                .find(id.value())
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let username = username.to_string();
        self.with_conn("get_user_by_username", move |conn| {
            users::table
                .filter(users::username.eq(username))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_string();
        self.with_conn("get_user_by_email", move |conn| {
            users::table
                .filter(users::email.eq(email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_user(&self, user: &User) -> RepositoryResult<()> {
        let id = user.id;
        let changes = UserChangeset {
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            updated_at: Utc::now(),
        };
        self.with_conn("update_user", move |conn| {
            let updated = diesel::update(users::table.find(id.value()))
                .set(&changes)
                .execute(conn)
                .map_err(map_diesel_error)?;
            if updated == 0 {
                return Err(RepositoryError::not_found("User row vanished before update")
                    .with_entity("user", id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<bool> {
        self.with_conn("delete_user", move |conn| {
            diesel::delete(users::table.find(id.value()))
                .execute(conn)
                .map(|deleted| deleted > 0)
                .map_err(map_diesel_error)
        })
        .await
    }
}

// ==================== Relationship Store ====================

#[async_trait]
impl FollowRepository for PostgresRepository {
    async fn insert_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<()> {
        let row = NewFollowerRow {
            follower_id: follower.value(),
            following_id: following.value(),
        };
        self.with_conn("insert_edge", move |conn| {
            diesel::insert_into(followers::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_edge(&self, follower: UserId, following: UserId) -> RepositoryResult<bool> {
        self.with_conn("delete_edge", move |conn| {
            diesel::delete(
                followers::table
                    .filter(followers::follower_id.eq(follower.value()))
                    .filter(followers::following_id.eq(following.value())),
            )
            .execute(conn)
            .map(|deleted| deleted > 0)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn edge_exists(&self, follower: UserId, following: UserId) -> RepositoryResult<bool> {
        self.with_conn("edge_exists", move |conn| {
            diesel::select(diesel::dsl::exists(
                followers::table
                    .filter(followers::follower_id.eq(follower.value()))
                    .filter(followers::following_id.eq(following.value())),
            ))
            .get_result::<bool>(conn)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_followers(&self, user: UserId) -> RepositoryResult<Vec<UserId>> {
        self.with_conn("list_followers", move |conn| {
            followers::table
                .filter(followers::following_id.eq(user.value()))
                .order(followers::followed_at.asc())
                .select(followers::follower_id)
                .load::<i64>(conn)
                .map(|ids| ids.into_iter().map(UserId::new).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_following(&self, user: UserId) -> RepositoryResult<Vec<UserId>> {
        self.with_conn("list_following", move |conn| {
            followers::table
                .filter(followers::follower_id.eq(user.value()))
                .order(followers::followed_at.asc())
                .select(followers::following_id)
                .load::<i64>(conn)
                .map(|ids| ids.into_iter().map(UserId::new).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_followers(&self, user: UserId) -> RepositoryResult<i64> {
        self.with_conn("count_followers", move |conn| {
            followers::table
                .filter(followers::following_id.eq(user.value()))
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_following(&self, user: UserId) -> RepositoryResult<i64> {
        self.with_conn("count_following", move |conn| {
            followers::table
                .filter(followers::follower_id.eq(user.value()))
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }
}

// ==================== Profile & Preference Stores ====================

#[async_trait]
impl RecordRepository<UserProfile> for PostgresRepository {
    async fn upsert_record(&self, record: &UserProfile) -> RepositoryResult<()> {
        let row = UserProfileRow::from(record);
        self.with_conn("upsert_profile", move |conn| {
            diesel::insert_into(user_profiles::table)
                .values(&row)
                .on_conflict(user_profiles::user_id)
                .do_update()
                .set(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_record(&self, user_id: UserId) -> RepositoryResult<Option<UserProfile>> {
        self.with_conn("get_profile", move |conn| {
            user_profiles::table
                .find(user_id.value())
                .select(UserProfileRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(UserProfile::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl RecordRepository<UserPreference> for PostgresRepository {
    async fn upsert_record(&self, record: &UserPreference) -> RepositoryResult<()> {
        let row = UserPreferenceRow::from(record);
        self.with_conn("upsert_preference", move |conn| {
            diesel::insert_into(user_preferences::table)
                .values(&row)
                .on_conflict(user_preferences::user_id)
                .do_update()
                .set(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_record(&self, user_id: UserId) -> RepositoryResult<Option<UserPreference>> {
        self.with_conn("get_preference", move |conn| {
            user_preferences::table
                .find(user_id.value())
                .select(UserPreferenceRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(UserPreference::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_with_url_uses_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/users");
        assert_eq!(config.database_url, "postgres://localhost/users");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.min_pool_size, 1);
    }
}
