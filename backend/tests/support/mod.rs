//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use yapper_users::db::{LocalRepository, RepositoryFactory};
use yapper_users::models::{CreateUserRequest, UserId};
use yapper_users::services::UserService;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Service over a fresh in-memory repository, plus a handle to that repository.
pub fn local_service() -> (LocalRepository, UserService) {
    let repo = LocalRepository::new();
    let service = UserService::new(RepositoryFactory::from_local(repo.clone()));
    (repo, service)
}

pub fn create_request(username: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        display_name: format!("{} (display)", username),
    }
}

/// Create `n` users named `user0..user{n-1}` and return their ids in order.
pub async fn seed_users(service: &UserService, n: usize) -> Vec<UserId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let user = service
            .create_user(create_request(&format!("user{}", i)))
            .await
            .expect("seed user");
        ids.push(user.id);
    }
    ids
}
