//! PostgreSQL-backed `ExperienceRepository` implementation.
//!
//! Every query filters on `experiences.user_id`, so rows of other owners are
//! indistinguishable from missing ones. Writes run in a transaction that first
//! checks the referenced location and tags belong to the same owner, then
//! writes the experience row and its tag links, then reloads the aggregate.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ExperienceRepository, ExperienceRepositoryError};
use crate::domain::{
    Experience, ExperienceDraft, ExperienceFilter, ExperienceId, ExperiencePatch, ImagePath,
    Location, LocationId, Tag, TagId, UserId,
};

use super::diesel_basic_error_mapping::{
    foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    ExperienceChangeset, ExperienceRow, ExperienceTagRow, LocationRow, NewExperienceRow, TagRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{experience_tags, experiences, locations, tags};

/// Diesel-backed implementation of the `ExperienceRepository` port.
#[derive(Clone)]
pub struct DieselExperienceRepository {
    pool: DbPool,
}

impl DieselExperienceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a transaction: either Diesel or a domain rejection that
/// must roll the transaction back.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Rejected(ExperienceRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<TxError> for ExperienceRepositoryError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(err) => map_diesel_error(err),
            TxError::Rejected(err) => err,
        }
    }
}

fn map_pool_error(error: PoolError) -> ExperienceRepositoryError {
    map_basic_pool_error(error, ExperienceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ExperienceRepositoryError {
    map_basic_diesel_error(
        error,
        ExperienceRepositoryError::query,
        ExperienceRepositoryError::connection,
    )
}

const LOCATION_FK: &str = "experiences_location_id_fkey";
const TAG_FK: &str = "experience_tags_tag_id_fkey";

/// Report a reference removed after `check_references` ran the same way as
/// one that never existed.
fn reference_error(
    error: diesel::result::Error,
    location: Option<LocationId>,
    tag_ids: Option<&BTreeSet<TagId>>,
) -> TxError {
    let constraint = foreign_key_violation(&error).map(str::to_owned);
    match (constraint.as_deref(), location, tag_ids) {
        (Some(LOCATION_FK), Some(location), _) => TxError::Rejected(
            ExperienceRepositoryError::unknown_location(location.get()),
        ),
        (Some(TAG_FK), _, Some(tag_ids)) => TxError::Rejected(
            ExperienceRepositoryError::unknown_tags(tag_ids.iter().map(|id| id.get()).collect::<Vec<_>>()),
        ),
        _ => TxError::Diesel(error),
    }
}

fn corrupt(message: String) -> TxError {
    TxError::Rejected(ExperienceRepositoryError::query(message))
}

/// Load locations and tags for `rows` and assemble the aggregates, keeping
/// the order of `rows`.
async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<ExperienceRow>,
) -> Result<Vec<Experience>, TxError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let experience_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let location_ids: Vec<i64> = rows.iter().map(|row| row.location_id).collect();

    let location_rows: Vec<LocationRow> = locations::table
        .filter(locations::id.eq_any(location_ids))
        .select(LocationRow::as_select())
        .load(conn)
        .await?;
    let tag_rows: Vec<(i64, TagRow)> = experience_tags::table
        .inner_join(tags::table)
        .filter(experience_tags::experience_id.eq_any(experience_ids))
        .select((experience_tags::experience_id, TagRow::as_select()))
        .load(conn)
        .await?;

    let mut locations_by_id = HashMap::with_capacity(location_rows.len());
    for row in location_rows {
        let id = row.id;
        locations_by_id.insert(id, Location::try_from(row).map_err(corrupt)?);
    }
    let mut tags_by_experience: HashMap<i64, Vec<Tag>> = HashMap::new();
    for (experience_id, row) in tag_rows {
        let tag = Tag::try_from(row).map_err(corrupt)?;
        tags_by_experience.entry(experience_id).or_default().push(tag);
    }

    rows.into_iter()
        .map(|row| {
            let fields = row.fields().map_err(corrupt)?;
            let location = locations_by_id.get(&row.location_id).cloned().ok_or_else(|| {
                corrupt(format!(
                    "experience {} references missing location {}",
                    row.id, row.location_id
                ))
            })?;
            let tags = tags_by_experience.remove(&row.id).unwrap_or_default();
            Ok(Experience::new(
                ExperienceId::new(row.id),
                UserId::new(row.user_id),
                fields,
                location,
                tags,
            ))
        })
        .collect()
}

async fn hydrate_one(
    conn: &mut AsyncPgConnection,
    row: ExperienceRow,
) -> Result<Experience, TxError> {
    hydrate(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| corrupt("experience vanished while loading".to_owned()))
}

async fn find_row(
    conn: &mut AsyncPgConnection,
    owner: UserId,
    id: ExperienceId,
) -> Result<Option<ExperienceRow>, TxError> {
    let row = experiences::table
        .filter(experiences::id.eq(id.get()))
        .filter(experiences::user_id.eq(owner.get()))
        .select(ExperienceRow::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

/// Reject references to locations or tags that `owner` does not own.
async fn check_references(
    conn: &mut AsyncPgConnection,
    owner: UserId,
    location: Option<LocationId>,
    tag_ids: Option<&BTreeSet<TagId>>,
) -> Result<(), TxError> {
    if let Some(location) = location {
        let found: Option<i64> = locations::table
            .filter(locations::id.eq(location.get()))
            .filter(locations::user_id.eq(owner.get()))
            .select(locations::id)
            .first(conn)
            .await
            .optional()?;
        if found.is_none() {
            return Err(TxError::Rejected(ExperienceRepositoryError::unknown_location(
                location.get(),
            )));
        }
    }

    if let Some(requested) = tag_ids.filter(|ids| !ids.is_empty()) {
        let wanted: Vec<i64> = requested.iter().map(|id| id.get()).collect();
        let owned: BTreeSet<i64> = tags::table
            .filter(tags::user_id.eq(owner.get()))
            .filter(tags::id.eq_any(wanted.clone()))
            .select(tags::id)
            .load::<i64>(conn)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<i64> = wanted
            .into_iter()
            .filter(|id| !owned.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(TxError::Rejected(ExperienceRepositoryError::unknown_tags(
                missing,
            )));
        }
    }
    Ok(())
}

async fn replace_tags(
    conn: &mut AsyncPgConnection,
    experience_id: i64,
    tag_ids: &BTreeSet<TagId>,
) -> Result<(), TxError> {
    diesel::delete(experience_tags::table.filter(experience_tags::experience_id.eq(experience_id)))
        .execute(conn)
        .await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links: Vec<ExperienceTagRow> = tag_ids
        .iter()
        .map(|tag| ExperienceTagRow {
            experience_id,
            tag_id: tag.get(),
        })
        .collect();
    diesel::insert_into(experience_tags::table)
        .values(&links)
        .execute(conn)
        .await
        .map_err(|err| reference_error(err, None, Some(tag_ids)))?;
    Ok(())
}

#[async_trait]
impl ExperienceRepository for DieselExperienceRepository {
    async fn list(
        &self,
        owner: UserId,
        filter: &ExperienceFilter,
    ) -> Result<Vec<Experience>, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let tag_ids: Vec<i64> = filter.tags.iter().map(|id| id.get()).collect();
        let location_ids: Vec<i64> = filter.locations.iter().map(|id| id.get()).collect();

        let experiences = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    let mut query = experiences::table
                        .filter(experiences::user_id.eq(owner.get()))
                        .select(ExperienceRow::as_select())
                        .order_by(experiences::id.desc())
                        .into_boxed();
                    if !tag_ids.is_empty() {
                        let tagged = experience_tags::table
                            .filter(experience_tags::tag_id.eq_any(tag_ids))
                            .select(experience_tags::experience_id);
                        query = query.filter(experiences::id.eq_any(tagged));
                    }
                    if !location_ids.is_empty() {
                        query = query.filter(experiences::location_id.eq_any(location_ids));
                    }
                    let rows: Vec<ExperienceRow> = query.load(conn).await?;
                    hydrate(conn, rows).await
                }
                .scope_boxed()
            })
            .await?;
        Ok(experiences)
    }

    async fn find(
        &self,
        owner: UserId,
        id: ExperienceId,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let experience = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    match find_row(conn, owner, id).await? {
                        Some(row) => hydrate_one(conn, row).await.map(Some),
                        None => Ok(None),
                    }
                }
                .scope_boxed()
            })
            .await?;
        Ok(experience)
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: &ExperienceDraft,
    ) -> Result<Experience, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let experience = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    check_references(conn, owner, Some(draft.location), Some(&draft.tags)).await?;
                    let row: ExperienceRow = diesel::insert_into(experiences::table)
                        .values(&NewExperienceRow {
                            user_id: owner.get(),
                            title: draft.title.as_ref(),
                            time_minutes: draft.time_minutes.get(),
                            price: draft.price.amount(),
                            website: draft.website.as_ref(),
                            location_id: draft.location.get(),
                        })
                        .returning(ExperienceRow::as_returning())
                        .get_result(conn)
                        .await
                        .map_err(|err| reference_error(err, Some(draft.location), None))?;
                    replace_tags(conn, row.id, &draft.tags).await?;
                    hydrate_one(conn, row).await
                }
                .scope_boxed()
            })
            .await?;
        Ok(experience)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ExperienceId,
        patch: &ExperiencePatch,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let experience = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    let exists: Option<i64> = experiences::table
                        .filter(experiences::id.eq(id.get()))
                        .filter(experiences::user_id.eq(owner.get()))
                        .select(experiences::id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    if exists.is_none() {
                        return Ok(None);
                    }

                    check_references(conn, owner, patch.location, patch.tags.as_ref()).await?;
                    let changeset = ExperienceChangeset {
                        title: patch.title.as_ref().map(|title| title.as_ref()),
                        time_minutes: patch.time_minutes.map(|minutes| minutes.get()),
                        price: patch.price.map(|price| price.amount()),
                        website: patch.website.as_ref().map(|website| website.as_ref()),
                        location_id: patch.location.map(|location| location.get()),
                    };
                    if !changeset.is_empty() {
                        diesel::update(experiences::table.filter(experiences::id.eq(id.get())))
                            .set(&changeset)
                            .execute(conn)
                            .await
                            .map_err(|err| reference_error(err, patch.location, None))?;
                    }
                    if let Some(tag_ids) = &patch.tags {
                        replace_tags(conn, id.get(), tag_ids).await?;
                    }

                    match find_row(conn, owner, id).await? {
                        Some(row) => hydrate_one(conn, row).await.map(Some),
                        None => Ok(None),
                    }
                }
                .scope_boxed()
            })
            .await?;
        Ok(experience)
    }

    async fn delete(
        &self,
        owner: UserId,
        id: ExperienceId,
    ) -> Result<bool, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            experiences::table
                .filter(experiences::id.eq(id.get()))
                .filter(experiences::user_id.eq(owner.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn set_image(
        &self,
        owner: UserId,
        id: ExperienceId,
        image: &ImagePath,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let experience = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    let row: Option<ExperienceRow> = diesel::update(
                        experiences::table
                            .filter(experiences::id.eq(id.get()))
                            .filter(experiences::user_id.eq(owner.get())),
                    )
                    .set(experiences::image.eq(Some(image.as_ref())))
                    .returning(ExperienceRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    match row {
                        Some(row) => hydrate_one(conn, row).await.map(Some),
                        None => Ok(None),
                    }
                }
                .scope_boxed()
            })
            .await?;
        Ok(experience)
    }
}
