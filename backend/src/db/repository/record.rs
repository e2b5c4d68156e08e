//! Store trait shared by the per-user auxiliary records.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Record, UserId};

/// Repository trait for a one-to-one record keyed by user id.
///
/// One trait serves both the profile store and the preference store; a
/// backend implements it once per record type.
#[async_trait]
pub trait RecordRepository<R: Record>: Send + Sync {
    /// Insert the record, or overwrite every column of the existing row.
    async fn upsert_record(&self, record: &R) -> RepositoryResult<()>;

    async fn get_record(&self, user_id: UserId) -> RepositoryResult<Option<R>>;
}
