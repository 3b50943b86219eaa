//! Integration tests for `DieselAttributeRepository` against embedded PostgreSQL.

use experiences::domain::ports::OwnedAttributeRepository;
use experiences::domain::{
    AttributeName, Location, LocationDescription, LocationDraft, OwnedAttribute, Tag, TagDraft,
    UserId,
};
use experiences::outbound::persistence::{DbPool, DieselAttributeRepository, PoolConfig};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

mod support;

use pg_embed::test_cluster;
use support::{count_rows, handle_cluster_setup_failure, provision_database, seed_user};

const TAGS_FOR_OWNER: &str = "SELECT count(*) FROM tags WHERE user_id = $1";

struct TestContext {
    runtime: Runtime,
    repository: DieselAttributeRepository,
    database_url: String,
    alice: UserId,
    bob: UserId,
    _database: TemporaryDatabase,
    _cluster: TestCluster,
}

impl TestContext {
    fn add_tag(&self, owner: UserId, name: &str) -> Tag {
        let draft = TagDraft {
            name: AttributeName::new(name).expect("name"),
        };
        self.runtime
            .block_on(OwnedAttributeRepository::<Tag>::insert(
                &self.repository,
                owner,
                &draft,
            ))
            .expect("insert tag")
    }

    fn tag_names(&self, owner: UserId) -> Vec<String> {
        names(
            self.runtime
                .block_on(OwnedAttributeRepository::<Tag>::list_for_owner(
                    &self.repository,
                    owner,
                ))
                .expect("list tags"),
        )
    }
}

fn names<A: OwnedAttribute>(attributes: Vec<A>) -> Vec<String> {
    attributes
        .iter()
        .map(|attribute| attribute.attribute_name().as_ref().to_owned())
        .collect()
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database = provision_database(&cluster)?;
    let database_url = database.url().to_owned();
    let alice = seed_user(&database_url, "alice@example.com")?;
    let bob = seed_user(&database_url, "bob@example.com")?;

    let config = PoolConfig::new(&database_url)
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        repository: DieselAttributeRepository::new(pool),
        database_url,
        alice,
        bob,
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
fn tags_list_by_name_descending_per_owner(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: tags_list_by_name_descending_per_owner skipped");
        return;
    };
    let (alice, bob) = (context.alice, context.bob);
    for name in ["hiking", "walking", "cycling"] {
        context.add_tag(alice, name);
    }
    context.add_tag(bob, "zorbing");

    assert_eq!(context.tag_names(alice), ["walking", "hiking", "cycling"]);
    assert_eq!(context.tag_names(bob), ["zorbing"]);
    assert_eq!(
        count_rows(&context.database_url, TAGS_FOR_OWNER, alice.get()).expect("count"),
        3
    );
}

#[rstest]
fn duplicate_names_are_kept_newest_first(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_names_are_kept_newest_first skipped");
        return;
    };
    let alice = context.alice;
    let older = context.add_tag(alice, "music");
    let newer = context.add_tag(alice, "music");

    let listed = context
        .runtime
        .block_on(OwnedAttributeRepository::<Tag>::list_for_owner(
            &context.repository,
            alice,
        ))
        .expect("list tags");
    let ids: Vec<_> = listed.iter().map(Tag::id).collect();
    assert_eq!(ids, [newer.id(), older.id()]);
}

#[rstest]
fn locations_keep_descriptions_and_owner(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: locations_keep_descriptions_and_owner skipped");
        return;
    };
    let (alice, bob) = (context.alice, context.bob);
    let rt = &context.runtime;
    let insert = |owner: UserId, name: &str, description: Option<&str>| {
        let draft = LocationDraft {
            name: AttributeName::new(name).expect("name"),
            description: LocationDescription::new(description).expect("description"),
        };
        rt.block_on(OwnedAttributeRepository::<Location>::insert(
            &context.repository,
            owner,
            &draft,
        ))
        .expect("insert location")
    };

    let harbour = insert(alice, "Harbour", Some("Old port"));
    insert(alice, "Market", None);
    insert(bob, "Quarry", None);

    let listed = rt
        .block_on(OwnedAttributeRepository::<Location>::list_for_owner(
            &context.repository,
            alice,
        ))
        .expect("list locations");
    assert_eq!(names(listed.clone()), ["Market", "Harbour"]);
    let stored = listed
        .iter()
        .find(|location| location.id() == harbour.id())
        .expect("harbour listed");
    assert_eq!(stored, &harbour);
    assert_eq!(stored.description().as_ref(), "Old port");
}
