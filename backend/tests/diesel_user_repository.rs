//! Integration tests for the account and token repositories against embedded
//! PostgreSQL.

use experiences::domain::ports::{AuthTokenRepository, UserRepository, UserRepositoryError};
use experiences::domain::{AuthToken, Email, NewUser, UserChanges, UserFlags, UserId, UserName};
use experiences::outbound::persistence::{
    DbPool, DieselAuthTokenRepository, DieselUserRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

mod support;

use pg_embed::test_cluster;
use support::{count_rows, handle_cluster_setup_failure, provision_database, seed_user};

const TOKENS_FOR_USER: &str = "SELECT count(*) FROM auth_tokens WHERE user_id = $1";

struct TestContext {
    runtime: Runtime,
    users: DieselUserRepository,
    tokens: DieselAuthTokenRepository,
    database_url: String,
    _database: TemporaryDatabase,
    _cluster: TestCluster,
}

fn new_user(email: &str, flags: UserFlags) -> NewUser {
    NewUser {
        email: Email::parse(email).expect("email"),
        name: UserName::new("Tester").expect("name"),
        password_hash: "hash-of-secret".to_owned(),
        flags,
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database = provision_database(&cluster)?;
    let database_url = database.url().to_owned();

    let config = PoolConfig::new(&database_url)
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        users: DieselUserRepository::new(pool.clone()),
        tokens: DieselAuthTokenRepository::new(pool),
        database_url,
        _database: database,
        _cluster: cluster,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn inserted_accounts_are_found_by_id_and_email(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: inserted_accounts_are_found_by_id_and_email skipped");
        return;
    };
    let rt = &context.runtime;

    let created = rt
        .block_on(context.users.insert(&new_user("admin@example.com", UserFlags::SUPERUSER)))
        .expect("insert");
    assert!(created.is_superuser());
    assert!(created.is_staff());

    let by_id = rt
        .block_on(context.users.find_by_id(created.id()))
        .expect("find")
        .expect("exists");
    assert_eq!(by_id, created);

    let stored = rt
        .block_on(context.users.find_credentials(created.email()))
        .expect("credentials")
        .expect("exists");
    assert_eq!(stored.user, created);
    assert_eq!(stored.password_hash, "hash-of-secret");

    let unknown = Email::parse("nobody@example.com").expect("email");
    let missing = rt
        .block_on(context.users.find_credentials(&unknown))
        .expect("credentials");
    assert_eq!(missing, None);
}

#[rstest]
fn schema_defaults_apply_to_bare_rows(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: schema_defaults_apply_to_bare_rows skipped");
        return;
    };
    let id = seed_user(&context.database_url, "bare@example.com").expect("seed");

    let user = context
        .runtime
        .block_on(context.users.find_by_id(id))
        .expect("find")
        .expect("exists");
    assert!(user.is_active());
    assert!(!user.is_staff());
    assert!(user.name().as_ref().is_empty());
}

#[rstest]
fn duplicate_emails_are_reported_as_such(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_emails_are_reported_as_such skipped");
        return;
    };
    let rt = &context.runtime;
    let first = rt
        .block_on(context.users.insert(&new_user("dup@example.com", UserFlags::REGULAR)))
        .expect("first insert");

    let err = rt
        .block_on(context.users.insert(&new_user("dup@example.com", UserFlags::REGULAR)))
        .expect_err("second insert");
    assert!(matches!(err, UserRepositoryError::DuplicateEmail { .. }), "{err:?}");

    let other = rt
        .block_on(context.users.insert(&new_user("other@example.com", UserFlags::REGULAR)))
        .expect("other insert");
    let changes = UserChanges {
        email: Some(first.email().clone()),
        ..UserChanges::default()
    };
    let err = rt
        .block_on(context.users.update(other.id(), &changes))
        .expect_err("email clash on update");
    assert!(matches!(err, UserRepositoryError::DuplicateEmail { .. }), "{err:?}");
}

#[rstest]
fn updates_change_only_the_given_fields(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: updates_change_only_the_given_fields skipped");
        return;
    };
    let rt = &context.runtime;
    let created = rt
        .block_on(context.users.insert(&new_user("edit@example.com", UserFlags::REGULAR)))
        .expect("insert");

    let changes = UserChanges {
        name: Some(UserName::new("Renamed").expect("name")),
        password_hash: Some("new-hash".to_owned()),
        ..UserChanges::default()
    };
    let updated = rt
        .block_on(context.users.update(created.id(), &changes))
        .expect("update")
        .expect("exists");
    assert_eq!(updated.name().as_ref(), "Renamed");
    assert_eq!(updated.email(), created.email());

    let stored = rt
        .block_on(context.users.find_credentials(created.email()))
        .expect("credentials")
        .expect("exists");
    assert_eq!(stored.password_hash, "new-hash");

    let missing = rt
        .block_on(context.users.update(UserId::new(i64::MAX), &changes))
        .expect("update of a missing row");
    assert_eq!(missing, None);
}

#[rstest]
fn issuing_a_token_replaces_the_previous_one(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: issuing_a_token_replaces_the_previous_one skipped");
        return;
    };
    let rt = &context.runtime;
    let user = rt
        .block_on(context.users.insert(&new_user("token@example.com", UserFlags::REGULAR)))
        .expect("insert");
    let first = AuthToken::generate();
    let second = AuthToken::generate();

    rt.block_on(context.tokens.replace_for_user(user.id(), &first.digest()))
        .expect("first token");
    let resolved = rt
        .block_on(context.tokens.find_user_by_digest(&first.digest()))
        .expect("lookup")
        .expect("token resolves");
    assert_eq!(resolved.id(), user.id());

    rt.block_on(context.tokens.replace_for_user(user.id(), &second.digest()))
        .expect("second token");
    let stale = rt
        .block_on(context.tokens.find_user_by_digest(&first.digest()))
        .expect("lookup");
    assert_eq!(stale, None);
    let current = rt
        .block_on(context.tokens.find_user_by_digest(&second.digest()))
        .expect("lookup");
    assert_eq!(current.map(|user| user.id()), Some(user.id()));
    let rows = count_rows(&context.database_url, TOKENS_FOR_USER, user.id().get()).expect("count");
    assert_eq!(rows, 1);
}
