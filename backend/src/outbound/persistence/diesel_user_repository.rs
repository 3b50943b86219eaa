//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Emails are stored already normalised, so the unique index on
//! `users.email` enforces case-insensitive uniqueness.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{Email, NewUser, User, UserChanges, UserId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use experiences::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/experiences")).await?;
    /// let repository = DieselUserRepository::new(pool);
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

/// Like [`map_diesel_error`] but reports a clash on the email index.
fn map_write_error(error: diesel::result::Error, email: Option<&Email>) -> UserRepositoryError {
    match (unique_violation(&error), email) {
        (Some(_), Some(email)) => UserRepositoryError::duplicate_email(email.as_ref()),
        _ => map_diesel_error(error),
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row.into_domain()
        .map(|(user, _)| user)
        .map_err(UserRepositoryError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            email: user.email.as_ref(),
            name: user.name.as_ref(),
            password_hash: &user.password_hash,
            is_active: user.flags.is_active,
            is_staff: user.flags.is_staff,
            is_superuser: user.flags.is_superuser,
        };

        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, Some(&user.email)))?;
        row_to_user(row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            row.into_domain()
                .map(|(user, password_hash)| StoredCredentials {
                    user,
                    password_hash,
                })
                .map_err(UserRepositoryError::query)
        })
        .transpose()
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserChangeset {
            email: changes.email.as_ref().map(|email| email.as_ref()),
            name: changes.name.as_ref().map(|name| name.as_ref()),
            password_hash: changes.password_hash.as_deref(),
        };

        let row: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, changes.email.as_ref()))?;
        row.map(row_to_user).transpose()
    }
}
