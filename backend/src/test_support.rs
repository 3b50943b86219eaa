//! In-memory adapters for HTTP and integration tests.
//!
//! The adapters honour the same ownership rules as the Diesel repositories so
//! handler tests exercise real scoping behaviour without a database. Compiled
//! for unit tests and behind the `test-support` feature.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Cursor};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    AttributeRepositoryError, AuthTokenRepository, AuthTokenRepositoryError, ExperienceRepository,
    ExperienceRepositoryError, ImageStore, ImageStoreError, OwnedAttributeRepository,
    PasswordHasher, PasswordHasherError, StoredCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AttributeCatalogService, Email, Experience, ExperienceCatalogService, ExperienceDraft,
    ExperienceFields, ExperienceFilter, ExperienceId, ExperiencePatch, ImagePath, Location,
    LocationDraft, LocationId, NewUser, Tag, TagDraft, TagId, TokenDigest, User, UserAccountService,
    UserChanges, UserId,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::media::CapStdImageStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<UserId, StoredCredentials>,
    tokens: HashMap<UserId, String>,
}

/// Users and their API token digests.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    table: Mutex<UserTable>,
}

impl InMemoryAccounts {
    /// Deactivate an account, as an administrator would.
    pub fn deactivate(&self, id: UserId) {
        let mut table = lock(&self.table);
        if let Some(stored) = table.rows.get_mut(&id) {
            let user = &stored.user;
            let mut flags = user.flags();
            flags.is_active = false;
            stored.user = User::new(
                user.id(),
                user.email().clone(),
                user.name().clone(),
                flags,
                user.date_joined(),
            );
        }
    }

    /// Stored hash for `email`, used to check that passwords are re-hashed.
    pub fn password_hash(&self, email: &str) -> Option<String> {
        lock(&self.table)
            .rows
            .values()
            .find(|stored| stored.user.email().as_ref() == email)
            .map(|stored| stored.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryAccounts {
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut table = lock(&self.table);
        if table
            .rows
            .values()
            .any(|stored| stored.user.email() == &user.email)
        {
            return Err(UserRepositoryError::duplicate_email(user.email.to_string()));
        }
        table.next_id += 1;
        let created = User::new(
            UserId::new(table.next_id),
            user.email.clone(),
            user.name.clone(),
            user.flags,
            Utc::now(),
        );
        table.rows.insert(
            created.id(),
            StoredCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(lock(&self.table).rows.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        Ok(lock(&self.table)
            .rows
            .values()
            .find(|stored| stored.user.email() == email)
            .cloned())
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut table = lock(&self.table);
        if let Some(email) = &changes.email {
            let taken = table
                .rows
                .values()
                .any(|stored| stored.user.id() != id && stored.user.email() == email);
            if taken {
                return Err(UserRepositoryError::duplicate_email(email.to_string()));
            }
        }
        let Some(stored) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        let current = &stored.user;
        stored.user = User::new(
            current.id(),
            changes.email.clone().unwrap_or_else(|| current.email().clone()),
            changes.name.clone().unwrap_or_else(|| current.name().clone()),
            current.flags(),
            current.date_joined(),
        );
        if let Some(hash) = &changes.password_hash {
            stored.password_hash.clone_from(hash);
        }
        Ok(Some(stored.user.clone()))
    }
}

#[async_trait]
impl AuthTokenRepository for InMemoryAccounts {
    async fn replace_for_user(
        &self,
        user_id: UserId,
        digest: &TokenDigest,
    ) -> Result<(), AuthTokenRepositoryError> {
        lock(&self.table)
            .tokens
            .insert(user_id, digest.as_ref().to_owned());
        Ok(())
    }

    async fn find_user_by_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<User>, AuthTokenRepositoryError> {
        let table = lock(&self.table);
        Ok(table
            .tokens
            .iter()
            .find(|(_, stored)| stored.as_str() == digest.as_ref())
            .and_then(|(id, _)| table.rows.get(id))
            .map(|stored| stored.user.clone()))
    }
}

/// Reversible "hash" keeping tests fast; never use outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextHasher;

const PLAINTEXT_PREFIX: &str = "plain$";

#[async_trait]
impl PasswordHasher for PlaintextHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError> {
        Ok(format!("{PLAINTEXT_PREFIX}{password}"))
    }

    async fn verify(&self, password: &str, encoded: &str) -> Result<bool, PasswordHasherError> {
        encoded
            .strip_prefix(PLAINTEXT_PREFIX)
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHasherError::malformed_hash("missing plain$ prefix"))
    }
}

#[derive(Debug, Clone)]
struct ExperienceRecord {
    owner: UserId,
    fields: ExperienceFields,
    location: LocationId,
    tags: BTreeSet<TagId>,
}

#[derive(Debug, Default)]
struct CatalogTables {
    next_tag: i64,
    next_location: i64,
    next_experience: i64,
    tags: BTreeMap<TagId, Tag>,
    locations: BTreeMap<LocationId, Location>,
    experiences: BTreeMap<ExperienceId, ExperienceRecord>,
}

impl CatalogTables {
    fn check_references(
        &self,
        owner: UserId,
        location: Option<LocationId>,
        tags: Option<&BTreeSet<TagId>>,
    ) -> Result<(), ExperienceRepositoryError> {
        if let Some(id) = location {
            let owned = self
                .locations
                .get(&id)
                .is_some_and(|location| location.owner() == owner);
            if !owned {
                return Err(ExperienceRepositoryError::unknown_location(id.get()));
            }
        }
        let missing: Vec<i64> = tags
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| !self.tags.get(id).is_some_and(|tag| tag.owner() == owner))
            .map(|id| id.get())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExperienceRepositoryError::unknown_tags(missing))
        }
    }

    fn hydrate(&self, id: ExperienceId, record: &ExperienceRecord) -> Option<Experience> {
        let location = self.locations.get(&record.location)?.clone();
        let tags = record
            .tags
            .iter()
            .filter_map(|tag| self.tags.get(tag).cloned())
            .collect();
        Some(Experience::new(
            id,
            record.owner,
            record.fields.clone(),
            location,
            tags,
        ))
    }

    fn owned(&self, owner: UserId, id: ExperienceId) -> Option<Experience> {
        self.experiences
            .get(&id)
            .filter(|record| record.owner == owner)
            .and_then(|record| self.hydrate(id, record))
    }
}

/// Tags, locations and experiences.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: Mutex<CatalogTables>,
}

#[async_trait]
impl OwnedAttributeRepository<Tag> for InMemoryCatalog {
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Tag>, AttributeRepositoryError> {
        let tables = lock(&self.tables);
        let mut tags: Vec<Tag> = tables
            .tags
            .values()
            .filter(|tag| tag.owner() == owner)
            .cloned()
            .collect();
        tags.sort_by(|a, b| {
            b.name()
                .as_ref()
                .cmp(a.name().as_ref())
                .then(b.id().cmp(&a.id()))
        });
        Ok(tags)
    }

    async fn insert(&self, owner: UserId, draft: &TagDraft) -> Result<Tag, AttributeRepositoryError> {
        let mut tables = lock(&self.tables);
        tables.next_tag += 1;
        let tag = Tag::new(TagId::new(tables.next_tag), owner, draft.name.clone());
        tables.tags.insert(tag.id(), tag.clone());
        Ok(tag)
    }
}

#[async_trait]
impl OwnedAttributeRepository<Location> for InMemoryCatalog {
    async fn list_for_owner(
        &self,
        owner: UserId,
    ) -> Result<Vec<Location>, AttributeRepositoryError> {
        let tables = lock(&self.tables);
        let mut locations: Vec<Location> = tables
            .locations
            .values()
            .filter(|location| location.owner() == owner)
            .cloned()
            .collect();
        locations.sort_by(|a, b| {
            b.name()
                .as_ref()
                .cmp(a.name().as_ref())
                .then(b.id().cmp(&a.id()))
        });
        Ok(locations)
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: &LocationDraft,
    ) -> Result<Location, AttributeRepositoryError> {
        let mut tables = lock(&self.tables);
        tables.next_location += 1;
        let location = Location::new(
            LocationId::new(tables.next_location),
            owner,
            draft.name.clone(),
            draft.description.clone(),
        );
        tables.locations.insert(location.id(), location.clone());
        Ok(location)
    }
}

#[async_trait]
impl ExperienceRepository for InMemoryCatalog {
    async fn list(
        &self,
        owner: UserId,
        filter: &ExperienceFilter,
    ) -> Result<Vec<Experience>, ExperienceRepositoryError> {
        let tables = lock(&self.tables);
        Ok(tables
            .experiences
            .iter()
            .rev()
            .filter(|(_, record)| record.owner == owner)
            .filter_map(|(id, record)| tables.hydrate(*id, record))
            .filter(|experience| filter.matches(experience))
            .collect())
    }

    async fn find(
        &self,
        owner: UserId,
        id: ExperienceId,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        Ok(lock(&self.tables).owned(owner, id))
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: &ExperienceDraft,
    ) -> Result<Experience, ExperienceRepositoryError> {
        let mut tables = lock(&self.tables);
        tables.check_references(owner, Some(draft.location), Some(&draft.tags))?;
        tables.next_experience += 1;
        let id = ExperienceId::new(tables.next_experience);
        let record = ExperienceRecord {
            owner,
            fields: ExperienceFields {
                title: draft.title.clone(),
                time_minutes: draft.time_minutes,
                price: draft.price,
                website: draft.website.clone(),
                image: None,
            },
            location: draft.location,
            tags: draft.tags.clone(),
        };
        tables.experiences.insert(id, record);
        tables
            .owned(owner, id)
            .ok_or_else(|| ExperienceRepositoryError::query("inserted experience vanished"))
    }

    async fn update(
        &self,
        owner: UserId,
        id: ExperienceId,
        patch: &ExperiencePatch,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        let mut tables = lock(&self.tables);
        if tables.owned(owner, id).is_none() {
            return Ok(None);
        }
        tables.check_references(owner, patch.location, patch.tags.as_ref())?;
        let Some(record) = tables.experiences.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            record.fields.title = title.clone();
        }
        if let Some(minutes) = patch.time_minutes {
            record.fields.time_minutes = minutes;
        }
        if let Some(price) = patch.price {
            record.fields.price = price;
        }
        if let Some(website) = &patch.website {
            record.fields.website = website.clone();
        }
        if let Some(location) = patch.location {
            record.location = location;
        }
        if let Some(tags) = &patch.tags {
            record.tags = tags.clone();
        }
        Ok(tables.owned(owner, id))
    }

    async fn delete(
        &self,
        owner: UserId,
        id: ExperienceId,
    ) -> Result<bool, ExperienceRepositoryError> {
        let mut tables = lock(&self.tables);
        let owned = tables
            .experiences
            .get(&id)
            .is_some_and(|record| record.owner == owner);
        if owned {
            tables.experiences.remove(&id);
        }
        Ok(owned)
    }

    async fn set_image(
        &self,
        owner: UserId,
        id: ExperienceId,
        image: &ImagePath,
    ) -> Result<Option<Experience>, ExperienceRepositoryError> {
        let mut tables = lock(&self.tables);
        match tables.experiences.get_mut(&id) {
            Some(record) if record.owner == owner => {
                record.fields.image = Some(image.clone());
            }
            _ => return Ok(None),
        }
        Ok(tables.owned(owner, id))
    }
}

/// Image files keyed by their relative path.
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    /// Bytes stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(&self, path: &ImagePath, bytes: &[u8]) -> Result<(), ImageStoreError> {
        lock(&self.files).insert(path.as_ref().to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, path: &ImagePath) -> Result<(), ImageStoreError> {
        lock(&self.files).remove(path.as_ref());
        Ok(())
    }
}

/// Handles onto the adapters behind an in-memory [`HttpState`].
#[derive(Clone)]
pub struct InMemoryAdapters {
    pub accounts: Arc<InMemoryAccounts>,
    pub catalog: Arc<InMemoryCatalog>,
    pub images: Arc<InMemoryImageStore>,
}

impl InMemoryAdapters {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccounts::default()),
            catalog: Arc::new(InMemoryCatalog::default()),
            images: Arc::new(InMemoryImageStore::default()),
        }
    }

    /// Wire the domain services over these adapters.
    pub fn ports(&self) -> HttpStatePorts {
        self.ports_with_store(Arc::clone(&self.images))
    }

    /// Wire the domain services, storing uploads in `images`.
    pub fn ports_with_store<S: ImageStore + 'static>(&self, images: Arc<S>) -> HttpStatePorts {
        HttpStatePorts {
            users: Arc::new(UserAccountService::new(
                Arc::clone(&self.accounts),
                Arc::clone(&self.accounts),
                Arc::new(PlaintextHasher),
            )),
            tags: Arc::new(AttributeCatalogService::<Tag, _>::new(Arc::clone(
                &self.catalog,
            ))),
            locations: Arc::new(AttributeCatalogService::<Location, _>::new(Arc::clone(
                &self.catalog,
            ))),
            experiences: Arc::new(ExperienceCatalogService::new(
                Arc::clone(&self.catalog),
                images,
            )),
        }
    }

    /// HTTP state with default media settings.
    pub fn http_state(&self) -> HttpState {
        HttpState::new(self.ports())
    }
}

impl Default for InMemoryAdapters {
    fn default() -> Self {
        Self::new()
    }
}

/// Filesystem image store rooted in a fresh temporary directory.
///
/// Keep the returned guard alive for as long as the store is used.
pub fn temp_image_store() -> io::Result<(tempfile::TempDir, CapStdImageStore)> {
    let dir = tempfile::tempdir()?;
    let store = CapStdImageStore::open(dir.path())?;
    Ok((dir, store))
}

/// Encode a small PNG for upload tests.
pub fn sample_png() -> Vec<u8> {
    let img: image::RgbImage = image::ImageBuffer::new(10, 10);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode sample png");
    bytes
}

/// Build a `multipart/form-data` body carrying one file part.
///
/// Returns the content type header value and the body.
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "----experiences-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
