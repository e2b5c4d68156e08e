//! Generic upsert/merge for the per-user profile and preference records.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::error::{ServiceError, ServiceResult};
use super::resolver::IdentityResolver;
use crate::db::repository::RecordRepository;
use crate::models::{Record, UserId, UserKey};

/// Record merge engine for one record kind.
///
/// A first upsert starts from [`Record::with_defaults`]; later upserts merge
/// into the stored record. Either way the record is re-read after writing so
/// callers see what the store holds.
pub struct RecordMergeEngine<R: Record> {
    resolver: IdentityResolver,
    store: Arc<dyn RecordRepository<R>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for RecordMergeEngine<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> RecordMergeEngine<R> {
    pub fn new(resolver: IdentityResolver, store: Arc<dyn RecordRepository<R>>) -> Self {
        Self {
            resolver,
            store,
            _record: PhantomData,
        }
    }

    /// Create or merge the record for `user_id` and return the stored result.
    pub async fn upsert(&self, user_id: UserId, patch: &R::Patch) -> ServiceResult<R> {
        self.resolver
            .require(&UserKey::Id(user_id), "resolve user")
            .await?;

        let existing = self
            .store
            .get_record(user_id)
            .await
            .map_err(ServiceError::at("load record"))?;
        let created = existing.is_none();

        let mut record = existing.unwrap_or_else(|| R::with_defaults(user_id));
        record.merge(patch);

        self.store
            .upsert_record(&record)
            .await
            .map_err(ServiceError::at("persist record"))?;

        let stored = self
            .store
            .get_record(user_id)
            .await
            .map_err(ServiceError::at("reload record"))?
            .ok_or_else(|| ServiceError::not_found(R::ENTITY))?;

        debug!(user_id = %user_id, entity = R::ENTITY.as_str(), created, "record upserted");
        Ok(stored)
    }

    /// The record for `user_id`, or `NotFound` for this record kind when the
    /// user exists but never set one.
    pub async fn get_by_user_id(&self, user_id: UserId) -> ServiceResult<R> {
        self.resolver
            .require(&UserKey::Id(user_id), "resolve user")
            .await?;

        self.store
            .get_record(user_id)
            .await
            .map_err(ServiceError::at("load record"))?
            .ok_or_else(|| ServiceError::not_found(R::ENTITY))
    }
}
