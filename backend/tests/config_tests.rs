//! Environment and file driven configuration.

mod support;

use std::str::FromStr;

use yapper_users::db::repository::RepositoryError;
use yapper_users::db::{RepositoryBuilder, RepositoryConfig, RepositoryFactory, RepositoryType};

#[test]
fn test_repository_type_parsing_is_case_insensitive() {
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(
        RepositoryType::from_str("Local").unwrap(),
        RepositoryType::Local
    );
    let err = RepositoryType::from_str("mongo").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_defaults_to_local() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_detects_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/users")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_explicit_repository_type_wins_over_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/users")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_unknown_repository_type_falls_back_to_local() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("cassandra"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local)
    });
}

#[tokio::test]
async fn test_factory_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    std::fs::write(&path, "[repository]\ntype = \"local\"\n").unwrap();

    let repos = RepositoryFactory::from_config_file(&path).await.unwrap();
    assert!(repos.users.health_check().await.unwrap());

    let builder = RepositoryBuilder::new().from_config_file(&path).unwrap();
    let repos = builder.build().await.unwrap();
    assert!(repos.users.health_check().await.unwrap());
}

#[tokio::test]
async fn test_factory_rejects_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    std::fs::write(&path, "[repository]\ntype = \"sqlite\"\n").unwrap();

    let err = RepositoryFactory::from_config_file(&path).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    std::fs::write(&path, "not toml at all [").unwrap();
    assert!(RepositoryConfig::from_file(&path).is_err());
}

#[test]
fn test_bootstrap_prefers_config_file_over_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    std::fs::write(&path, "[repository]\ntype = \"sqlite\"\n").unwrap();
    let path = path.to_string_lossy().into_owned();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    // The file wins even though the environment asks for a local store
    support::with_scoped_env(
        &[
            ("REPOSITORY_CONFIG", Some(path.as_str())),
            ("REPOSITORY_TYPE", Some("local")),
        ],
        || {
            let err = runtime.block_on(RepositoryFactory::bootstrap()).unwrap_err();
            assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
        },
    );

    std::fs::write(dir.path().join("repository.toml"), "[repository]\ntype = \"local\"\n").unwrap();
    support::with_scoped_env(&[("REPOSITORY_CONFIG", Some(path.as_str()))], || {
        let repos = runtime.block_on(RepositoryFactory::bootstrap()).unwrap();
        assert!(runtime.block_on(repos.users.health_check()).unwrap());
    });
}

#[test]
fn test_bootstrap_falls_back_to_env_without_config_file() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_CONFIG", None),
            ("REPOSITORY_TYPE", Some("local")),
        ],
        || {
            assert!(RepositoryConfig::locate().is_none());
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let repos = runtime.block_on(RepositoryFactory::bootstrap()).unwrap();
            assert!(runtime.block_on(repos.users.health_check()).unwrap());
        },
    );
}

#[test]
fn test_explicit_config_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml").to_string_lossy().into_owned();
    support::with_scoped_env(&[("REPOSITORY_CONFIG", Some(missing.as_str()))], || {
        assert!(RepositoryConfig::from_default_location().is_err());
    });
}

#[cfg(feature = "postgres-repo")]
#[test]
fn test_postgres_config_from_env() {
    use yapper_users::db::PostgresConfig;

    support::with_scoped_env(
        &[
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/users")),
            ("PG_POOL_MAX", Some("4")),
            ("PG_POOL_MIN", Some("not-a-number")),
            ("PG_CONN_TIMEOUT_SEC", None),
            ("PG_IDLE_TIMEOUT_SEC", Some("60")),
        ],
        || {
            let config = PostgresConfig::from_env().unwrap();
            assert_eq!(config.database_url, "postgres://localhost/users");
            assert_eq!(config.max_pool_size, 4);
            assert_eq!(config.min_pool_size, 1);
            assert_eq!(config.connection_timeout_sec, 30);
            assert_eq!(config.idle_timeout_sec, 60);
        },
    );

    support::with_scoped_env(&[("DATABASE_URL", None), ("PG_DATABASE_URL", None)], || {
        assert!(PostgresConfig::from_env().is_err());
    });
}

#[cfg(feature = "http-server")]
mod server_config {
    use super::*;
    use std::time::Duration;
    use yapper_users::http::ServerConfig;

    #[test]
    fn test_defaults() {
        support::with_scoped_env(
            &[
                ("HOST", None),
                ("PORT", None),
                ("USER_SERVICE_PORT_NUMBER", None),
                ("REQUEST_TIMEOUT_SECS", None),
                ("EVENTS_ROUTING_KEY", None),
            ],
            || assert_eq!(ServerConfig::from_env(), ServerConfig::default()),
        );
    }

    #[test]
    fn test_service_port_fallback_and_overrides() {
        support::with_scoped_env(
            &[
                ("HOST", Some("127.0.0.1")),
                ("PORT", None),
                ("USER_SERVICE_PORT_NUMBER", Some("9090")),
                ("REQUEST_TIMEOUT_SECS", Some("5")),
                ("EVENTS_ROUTING_KEY", Some("users.audit")),
            ],
            || {
                let config = ServerConfig::from_env();
                assert_eq!(config.port, 9090);
                assert_eq!(config.request_timeout, Duration::from_secs(5));
                assert_eq!(config.events_routing_key, "users.audit");
                assert_eq!(
                    config.bind_addr().unwrap().to_string(),
                    "127.0.0.1:9090"
                );
            },
        );
    }

    #[test]
    fn test_port_takes_precedence() {
        support::with_scoped_env(
            &[
                ("PORT", Some("7000")),
                ("USER_SERVICE_PORT_NUMBER", Some("9090")),
            ],
            || assert_eq!(ServerConfig::from_env().port, 7000),
        );
    }
}
