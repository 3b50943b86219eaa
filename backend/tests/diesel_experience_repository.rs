//! Integration tests for `DieselExperienceRepository` against embedded PostgreSQL.
//!
//! The in-memory adapters cover the HTTP contract; these suites check that the
//! SQL behind it agrees: owner scoping, filter semantics, tag link replacement
//! and reference checks.

use std::collections::BTreeSet;

use experiences::domain::ports::{
    ExperienceRepository, ExperienceRepositoryError, OwnedAttributeRepository,
};
use experiences::domain::{
    AttributeName, Experience, ExperienceDraft, ExperienceFilter, ExperienceId, ExperiencePatch,
    ImagePath, Location, LocationDescription, LocationDraft, LocationId, Price, Tag, TagDraft,
    TagId, TimeMinutes, Title, UserId, Website,
};
use experiences::outbound::persistence::{
    DbPool, DieselAttributeRepository, DieselExperienceRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

mod support;

use pg_embed::test_cluster;
use support::{count_rows, handle_cluster_setup_failure, provision_database, seed_user};

const TAG_LINKS: &str = "SELECT count(*) FROM experience_tags WHERE experience_id = $1";

struct TestContext {
    runtime: Runtime,
    repository: DieselExperienceRepository,
    attributes: DieselAttributeRepository,
    database_url: String,
    alice: UserId,
    bob: UserId,
    _database: TemporaryDatabase,
    _cluster: TestCluster,
}

impl TestContext {
    fn tag(&self, owner: UserId, name: &str) -> TagId {
        let draft = TagDraft {
            name: AttributeName::new(name).expect("tag name"),
        };
        self.runtime
            .block_on(OwnedAttributeRepository::<Tag>::insert(
                &self.attributes,
                owner,
                &draft,
            ))
            .expect("insert tag")
            .id()
    }

    fn location(&self, owner: UserId, name: &str) -> LocationId {
        let draft = LocationDraft {
            name: AttributeName::new(name).expect("location name"),
            description: LocationDescription::default(),
        };
        self.runtime
            .block_on(OwnedAttributeRepository::<Location>::insert(
                &self.attributes,
                owner,
                &draft,
            ))
            .expect("insert location")
            .id()
    }

    fn create(&self, owner: UserId, draft: &ExperienceDraft) -> Experience {
        self.runtime
            .block_on(self.repository.insert(owner, draft))
            .expect("insert experience")
    }

    fn list(&self, owner: UserId, filter: &ExperienceFilter) -> Vec<String> {
        self.runtime
            .block_on(self.repository.list(owner, filter))
            .expect("list experiences")
            .iter()
            .map(|experience| experience.title().as_ref().to_owned())
            .collect()
    }

    fn tag_links(&self, id: ExperienceId) -> i64 {
        count_rows(&self.database_url, TAG_LINKS, id.get()).expect("count tag links")
    }
}

fn draft(title: &str, location: LocationId, tags: &[TagId]) -> ExperienceDraft {
    ExperienceDraft {
        title: Title::new(title).expect("title"),
        time_minutes: TimeMinutes::new(45).expect("minutes"),
        price: Price::parse("12.5").expect("price"),
        website: Website::default(),
        location,
        tags: tags.iter().copied().collect(),
    }
}

fn filter(tags: &[TagId], locations: &[LocationId]) -> ExperienceFilter {
    ExperienceFilter {
        tags: tags.iter().copied().collect(),
        locations: locations.iter().copied().collect(),
    }
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
        repository: DieselExperienceRepository::new(pool.clone()),
        attributes: DieselAttributeRepository::new(pool),
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
fn insert_round_trips_fields_and_tags(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: insert_round_trips_fields_and_tags skipped");
        return;
    };
    let alice = context.alice;
    let beach = context.location(alice, "Beach");
    let swim = context.tag(alice, "swim");
    let sun = context.tag(alice, "sun");

    let created = context.create(alice, &draft("Snorkel", beach, &[swim, sun]));
    let found = context
        .runtime
        .block_on(context.repository.find(alice, created.id()))
        .expect("find")
        .expect("experience exists");

    assert_eq!(found, created);
    assert_eq!(found.title().as_ref(), "Snorkel");
    assert_eq!(found.price().to_string(), "12.50");
    assert_eq!(found.location().id(), beach);
    let tags: BTreeSet<TagId> = found.tags().iter().map(Tag::id).collect();
    assert_eq!(tags, [swim, sun].into_iter().collect());
    assert_eq!(context.tag_links(created.id()), 2);
}

#[rstest]
fn rows_of_other_owners_are_invisible(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: rows_of_other_owners_are_invisible skipped");
        return;
    };
    let (alice, bob) = (context.alice, context.bob);
    let park = context.location(alice, "Park");
    let created = context.create(alice, &draft("Picnic", park, &[]));
    let id = created.id();
    let rt = &context.runtime;
    let repo = &context.repository;

    assert!(context.list(bob, &ExperienceFilter::default()).is_empty());
    assert_eq!(rt.block_on(repo.find(bob, id)).expect("find"), None);
    let patch = ExperiencePatch {
        title: Some(Title::new("Hijacked").expect("title")),
        ..ExperiencePatch::default()
    };
    assert_eq!(rt.block_on(repo.update(bob, id, &patch)).expect("update"), None);
    let image = ImagePath::generate("png");
    assert_eq!(rt.block_on(repo.set_image(bob, id, &image)).expect("set image"), None);
    assert!(!rt.block_on(repo.delete(bob, id)).expect("delete"));

    let untouched = rt.block_on(repo.find(alice, id)).expect("find");
    assert_eq!(untouched, Some(created));
}

#[rstest]
fn filters_or_within_and_across_without_duplicates(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: filters_or_within_and_across_without_duplicates skipped"
        );
        return;
    };
    let alice = context.alice;
    let coast = context.location(alice, "Coast");
    let hills = context.location(alice, "Hills");
    let water = context.tag(alice, "water");
    let family = context.tag(alice, "family");
    let night = context.tag(alice, "night");

    context.create(alice, &draft("Kayak", coast, &[water, family]));
    context.create(alice, &draft("Hike", hills, &[family]));
    context.create(alice, &draft("Stargaze", hills, &[night]));
    context.create(alice, &draft("Sunbathe", coast, &[]));

    assert_eq!(
        context.list(alice, &ExperienceFilter::default()),
        ["Sunbathe", "Stargaze", "Hike", "Kayak"]
    );
    // Kayak carries both tags but appears once.
    assert_eq!(context.list(alice, &filter(&[water, family], &[])), ["Hike", "Kayak"]);
    assert_eq!(context.list(alice, &filter(&[], &[coast])), ["Sunbathe", "Kayak"]);
    assert_eq!(context.list(alice, &filter(&[family], &[hills])), ["Hike"]);
    assert_eq!(
        context.list(alice, &filter(&[family, night], &[coast, hills])),
        ["Stargaze", "Hike", "Kayak"]
    );
    assert!(context.list(alice, &filter(&[night], &[coast])).is_empty());
}

#[rstest]
fn tag_replacement_clears_links_and_partial_updates_keep_them(
    repo_context: Option<TestContext>,
) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: tag_replacement_clears_links_and_partial_updates_keep_them skipped"
        );
        return;
    };
    let alice = context.alice;
    let lake = context.location(alice, "Lake");
    let fish = context.tag(alice, "fish");
    let boat = context.tag(alice, "boat");
    let created = context.create(alice, &draft("Angling", lake, &[fish, boat]));
    let id = created.id();

    let rename = ExperiencePatch {
        title: Some(Title::new("Fly fishing").expect("title")),
        ..ExperiencePatch::default()
    };
    let renamed = context
        .runtime
        .block_on(context.repository.update(alice, id, &rename))
        .expect("patch")
        .expect("exists");
    assert_eq!(renamed.title().as_ref(), "Fly fishing");
    assert_eq!(renamed.tags().len(), 2);
    assert_eq!(context.tag_links(id), 2);

    let full = ExperiencePatch::from(draft("Angling", lake, &[]));
    let replaced = context
        .runtime
        .block_on(context.repository.update(alice, id, &full))
        .expect("put")
        .expect("exists");
    assert!(replaced.tags().is_empty());
    assert_eq!(context.tag_links(id), 0);
}

#[rstest]
fn references_owned_by_someone_else_are_rejected(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: references_owned_by_someone_else_are_rejected skipped");
        return;
    };
    let (alice, bob) = (context.alice, context.bob);
    let own_place = context.location(alice, "Home");
    let foreign_place = context.location(bob, "Elsewhere");
    let own_tag = context.tag(alice, "mine");
    let foreign_tag = context.tag(bob, "theirs");
    let rt = &context.runtime;
    let repo = &context.repository;

    let err = rt
        .block_on(repo.insert(alice, &draft("Visit", foreign_place, &[])))
        .expect_err("foreign location");
    assert_eq!(
        err,
        ExperienceRepositoryError::unknown_location(foreign_place.get())
    );

    let err = rt
        .block_on(repo.insert(alice, &draft("Visit", own_place, &[own_tag, foreign_tag])))
        .expect_err("foreign tag");
    assert_eq!(err, ExperienceRepositoryError::unknown_tags(vec![foreign_tag.get()]));
    assert!(context.list(alice, &ExperienceFilter::default()).is_empty());

    let created = context.create(alice, &draft("Visit", own_place, &[own_tag]));
    let patch = ExperiencePatch {
        tags: Some([foreign_tag].into_iter().collect()),
        ..ExperiencePatch::default()
    };
    let err = rt
        .block_on(repo.update(alice, created.id(), &patch))
        .expect_err("foreign tag on update");
    assert!(matches!(err, ExperienceRepositoryError::UnknownTags { .. }));
    assert_eq!(context.tag_links(created.id()), 1);
}

#[rstest]
fn images_attach_and_deletion_removes_links(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: images_attach_and_deletion_removes_links skipped");
        return;
    };
    let alice = context.alice;
    let museum = context.location(alice, "Museum");
    let art = context.tag(alice, "art");
    let created = context.create(alice, &draft("Gallery", museum, &[art]));
    let id = created.id();
    let rt = &context.runtime;
    let repo = &context.repository;

    let image = ImagePath::generate("jpg");
    let updated = rt
        .block_on(repo.set_image(alice, id, &image))
        .expect("set image")
        .expect("exists");
    assert_eq!(updated.image(), Some(&image));

    assert!(rt.block_on(repo.delete(alice, id)).expect("delete"));
    assert_eq!(rt.block_on(repo.find(alice, id)).expect("find"), None);
    assert_eq!(context.tag_links(id), 0);
    assert!(!rt.block_on(repo.delete(alice, id)).expect("second delete"));
}
