//! Error taxonomy for the service layer.
//!
//! Every failure a service reports is exactly one of four kinds. `NotFound`,
//! `Conflict` and `InvalidInput` come from deliberate checks; `Internal` wraps
//! an unexpected storage failure together with the step it happened in.

use crate::db::repository::{constraints, RepositoryError};
use crate::models::Entity;

/// Why a mutation conflicts with existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictReason {
    UsernameInUse,
    EmailInUse,
    AlreadyFollowing,
    AlreadyNotFollowing,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::UsernameInUse => "username in use",
            ConflictReason::EmailInUse => "email in use",
            ConflictReason::AlreadyFollowing => "already following",
            ConflictReason::AlreadyNotFollowing => "already not following",
        }
    }

    /// Conflict implied by a violated storage constraint, if any.
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            constraints::USERS_USERNAME => Some(ConflictReason::UsernameInUse),
            constraints::USERS_EMAIL => Some(ConflictReason::EmailInUse),
            constraints::FOLLOWERS_PAIR => Some(ConflictReason::AlreadyFollowing),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was rejected before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    SelfFollow,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::SelfFollow => "users cannot follow themselves",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} not found")]
    NotFound { entity: Entity },

    #[error("{reason}")]
    Conflict { reason: ConflictReason },

    #[error("{reason}")]
    InvalidInput { reason: InvalidReason },

    #[error("storage failure while trying to {step}")]
    Internal {
        step: &'static str,
        #[source]
        source: RepositoryError,
    },
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: Entity) -> Self {
        ServiceError::NotFound { entity }
    }

    pub fn conflict(reason: ConflictReason) -> Self {
        ServiceError::Conflict { reason }
    }

    pub fn invalid(reason: InvalidReason) -> Self {
        ServiceError::InvalidInput { reason }
    }

    /// Translate a storage failure raised during `step`.
    ///
    /// Constraint violations that mean the same thing as a fast-path check
    /// become that check's error. A storage `NotFound` only arises from a
    /// write that references a user deleted after it was resolved, so it is
    /// reported as a missing user. Everything else is `Internal`.
    pub fn from_storage(step: &'static str, err: RepositoryError) -> Self {
        if let Some(constraint) = err.conflict_constraint() {
            if constraint == constraints::FOLLOWERS_NO_SELF {
                return ServiceError::invalid(InvalidReason::SelfFollow);
            }
            if let Some(reason) = ConflictReason::from_constraint(constraint) {
                tracing::warn!(step, constraint, "storage constraint rejected write");
                return ServiceError::conflict(reason);
            }
        }

        if matches!(err, RepositoryError::NotFound { .. }) {
            // The constraint name or entity id tells which user was missing
            let context = err.context();
            tracing::debug!(
                step,
                operation = context.operation.as_deref(),
                entity_id = context.entity_id.as_deref(),
                details = context.details.as_deref(),
                "storage reported a missing row"
            );
            tracing::warn!(step, error = %err, "user vanished during operation");
            return ServiceError::not_found(Entity::User);
        }

        tracing::error!(step, error = %err, "storage failure");
        ServiceError::Internal { step, source: err }
    }

    /// Adapter for `map_err`.
    pub(crate) fn at(step: &'static str) -> impl FnOnce(RepositoryError) -> ServiceError {
        move |err| ServiceError::from_storage(step, err)
    }
}
