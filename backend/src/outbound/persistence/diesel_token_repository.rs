//! PostgreSQL-backed `AuthTokenRepository` implementation.
//!
//! `auth_tokens.user_id` is the primary key, so each user has at most one
//! token and issuing a new one overwrites the old digest.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AuthTokenRepository, AuthTokenRepositoryError};
use crate::domain::{TokenDigest, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewAuthTokenRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{auth_tokens, users};

/// Diesel-backed implementation of the `AuthTokenRepository` port.
#[derive(Clone)]
pub struct DieselAuthTokenRepository {
    pool: DbPool,
}

impl DieselAuthTokenRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AuthTokenRepositoryError {
    map_basic_pool_error(error, AuthTokenRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AuthTokenRepositoryError {
    map_basic_diesel_error(
        error,
        AuthTokenRepositoryError::query,
        AuthTokenRepositoryError::connection,
    )
}

#[async_trait]
impl AuthTokenRepository for DieselAuthTokenRepository {
    async fn replace_for_user(
        &self,
        user_id: UserId,
        digest: &TokenDigest,
    ) -> Result<(), AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewAuthTokenRow {
            user_id: user_id.get(),
            digest: digest.as_ref(),
        };

        diesel::insert_into(auth_tokens::table)
            .values(&row)
            .on_conflict(auth_tokens::user_id)
            .do_update()
            .set((
                auth_tokens::digest.eq(excluded(auth_tokens::digest)),
                auth_tokens::created_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_user_by_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<User>, AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::digest.eq(digest.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            row.into_domain()
                .map(|(user, _)| user)
                .map_err(AuthTokenRepositoryError::query)
        })
        .transpose()
    }
}
