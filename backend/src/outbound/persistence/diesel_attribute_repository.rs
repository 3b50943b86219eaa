//! PostgreSQL-backed tag and location repositories.
//!
//! One adapter serves both attribute kinds; the port is implemented once per
//! entity so callers pick the kind through the type parameter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AttributeRepositoryError, OwnedAttributeRepository};
use crate::domain::{Location, LocationDraft, Tag, TagDraft, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LocationRow, NewLocationRow, NewTagRow, TagRow};
use super::pool::{DbPool, PoolError};
use super::schema::{locations, tags};

/// Diesel-backed implementation of [`OwnedAttributeRepository`] for tags and
/// locations.
#[derive(Clone)]
pub struct DieselAttributeRepository {
    pool: DbPool,
}

impl DieselAttributeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AttributeRepositoryError {
    map_basic_pool_error(error, AttributeRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AttributeRepositoryError {
    map_basic_diesel_error(
        error,
        AttributeRepositoryError::query,
        AttributeRepositoryError::connection,
    )
}

fn collect<R, A>(rows: Vec<R>) -> Result<Vec<A>, AttributeRepositoryError>
where
    A: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .map(A::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AttributeRepositoryError::query)
}

#[async_trait]
impl OwnedAttributeRepository<Tag> for DieselAttributeRepository {
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Tag>, AttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TagRow> = tags::table
            .filter(tags::user_id.eq(owner.get()))
            .select(TagRow::as_select())
            .order_by((tags::name.desc(), tags::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows)
    }

    async fn insert(&self, owner: UserId, draft: &TagDraft) -> Result<Tag, AttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: TagRow = diesel::insert_into(tags::table)
            .values(&NewTagRow {
                user_id: owner.get(),
                name: draft.name.as_ref(),
            })
            .returning(TagRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Tag::try_from(row).map_err(AttributeRepositoryError::query)
    }
}

#[async_trait]
impl OwnedAttributeRepository<Location> for DieselAttributeRepository {
    async fn list_for_owner(
        &self,
        owner: UserId,
    ) -> Result<Vec<Location>, AttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LocationRow> = locations::table
            .filter(locations::user_id.eq(owner.get()))
            .select(LocationRow::as_select())
            .order_by((locations::name.desc(), locations::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows)
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: &LocationDraft,
    ) -> Result<Location, AttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: LocationRow = diesel::insert_into(locations::table)
            .values(&NewLocationRow {
                user_id: owner.get(),
                name: draft.name.as_ref(),
                description: draft.description.as_ref(),
            })
            .returning(LocationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Location::try_from(row).map_err(AttributeRepositoryError::query)
    }
}
