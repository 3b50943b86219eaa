//! Shared helpers for the PostgreSQL-backed integration suites.
//!
//! Each suite compiles as its own crate, so the helpers live here and are
//! pulled in with `mod support;`.

use std::fmt::Display;

use experiences::domain::UserId;
use experiences::outbound::persistence::run_pending_migrations_blocking;
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use postgres::{Client, NoTls};
use uuid::Uuid;

/// Render a `postgres` error with its SQLSTATE and server message.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`, which
/// is useless in CI logs.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}

/// Whether `SKIP_TEST_CLUSTER` is set to "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip when `SKIP_TEST_CLUSTER` allows it, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Create a uniquely named database on `cluster` with every migration applied.
pub fn provision_database(cluster: &TestCluster) -> Result<TemporaryDatabase, String> {
    let name = format!("experiences_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("create database {name}: {err:?}"))?;
    run_pending_migrations_blocking(database.url()).map_err(|err| err.to_string())?;
    Ok(database)
}

/// Insert a bare account row and return its identifier.
pub fn seed_user(url: &str, email: &str) -> Result<UserId, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let row = client
        .query_one(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'unusable') RETURNING id",
            &[&email],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(UserId::new(row.get(0)))
}

/// Run a scalar `count(*)` query with one `BIGINT` parameter.
pub fn count_rows(url: &str, sql: &str, param: i64) -> Result<i64, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let row = client
        .query_one(sql, &[&param])
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}
