//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and never
//! leave it. Conversions into domain types re-run domain validation; a row
//! that fails it is reported as corrupt data.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::domain::{
    AttributeName, Email, ExperienceFields, ImagePath, Location, LocationDescription, LocationId,
    Price, Tag, TagId, TimeMinutes, Title, User, UserFlags, UserId, UserName, Website,
};

use super::schema::{auth_tokens, experience_tags, experiences, locations, tags, users};

/// Error text for a row that violates domain invariants.
pub(crate) fn corrupt(table: &str, id: i64, detail: impl std::fmt::Display) -> String {
    format!("corrupt {table} row {id}: {detail}")
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<(User, String), String> {
        let email = Email::parse(&self.email).map_err(|err| corrupt("users", self.id, err))?;
        let name = UserName::new(&self.name).map_err(|err| corrupt("users", self.id, err))?;
        let flags = UserFlags {
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        };
        let user = User::new(UserId::new(self.id), email, name, flags, self.date_joined);
        Ok((user, self.password_hash))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Only `Some` fields are written.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_tokens)]
pub(crate) struct NewAuthTokenRow<'a> {
    pub user_id: i64,
    pub digest: &'a str,
}

// ---------------------------------------------------------------------------
// Tags and locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TagRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = String;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        let name = AttributeName::new(&row.name).map_err(|err| corrupt("tags", row.id, err))?;
        Ok(Self::new(TagId::new(row.id), UserId::new(row.user_id), name))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub(crate) struct NewTagRow<'a> {
    pub user_id: i64,
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LocationRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
}

impl TryFrom<LocationRow> for Location {
    type Error = String;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let name =
            AttributeName::new(&row.name).map_err(|err| corrupt("locations", row.id, err))?;
        let description = LocationDescription::new(Some(&row.description))
            .map_err(|err| corrupt("locations", row.id, err))?;
        Ok(Self::new(
            LocationId::new(row.id),
            UserId::new(row.user_id),
            name,
            description,
        ))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = locations)]
pub(crate) struct NewLocationRow<'a> {
    pub user_id: i64,
    pub name: &'a str,
    pub description: &'a str,
}

// ---------------------------------------------------------------------------
// Experiences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = experiences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExperienceRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub website: String,
    pub location_id: i64,
    pub image: Option<String>,
}

impl ExperienceRow {
    pub(crate) fn fields(&self) -> Result<ExperienceFields, String> {
        let fail = |err: &dyn std::fmt::Display| corrupt("experiences", self.id, err);
        Ok(ExperienceFields {
            title: Title::new(&self.title).map_err(|err| fail(&err))?,
            time_minutes: TimeMinutes::new(i64::from(self.time_minutes))
                .map_err(|err| fail(&err))?,
            price: Price::new(self.price).map_err(|err| fail(&err))?,
            website: Website::new(Some(&self.website)).map_err(|err| fail(&err))?,
            image: self.image.clone().map(ImagePath::from_stored),
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = experiences)]
pub(crate) struct NewExperienceRow<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub time_minutes: i32,
    pub price: Decimal,
    pub website: &'a str,
    pub location_id: i64,
}

/// Only `Some` fields are written.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = experiences)]
pub(crate) struct ExperienceChangeset<'a> {
    pub title: Option<&'a str>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub website: Option<&'a str>,
    pub location_id: Option<i64>,
}

impl ExperienceChangeset<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.time_minutes.is_none()
            && self.price.is_none()
            && self.website.is_none()
            && self.location_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = experience_tags)]
pub(crate) struct ExperienceTagRow {
    pub experience_id: i64,
    pub tag_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn user_rows_normalise_into_domain() {
        let row = UserRow {
            id: 4,
            email: "ada@example.com".to_owned(),
            name: "Ada".to_owned(),
            password_hash: "$argon2id$...".to_owned(),
            is_active: true,
            is_staff: true,
            is_superuser: true,
            date_joined: Utc::now(),
        };
        let (user, hash) = row.into_domain().expect("valid row");
        assert_eq!(user.id(), UserId::new(4));
        assert!(user.is_superuser());
        assert_eq!(hash, "$argon2id$...");
    }

    #[rstest]
    fn blank_tag_names_are_reported_as_corrupt() {
        let row = TagRow {
            id: 9,
            user_id: 1,
            name: "  ".to_owned(),
        };
        let err = Tag::try_from(row).expect_err("blank name");
        assert!(err.starts_with("corrupt tags row 9"));
    }

    #[rstest]
    fn experience_fields_rescale_price() {
        let row = ExperienceRow {
            id: 1,
            user_id: 1,
            title: "Workshop".to_owned(),
            time_minutes: 45,
            price: Decimal::new(2000, 2),
            website: String::new(),
            location_id: 1,
            image: Some("uploads/experience/a.png".to_owned()),
        };
        let fields = row.fields().expect("valid row");
        assert_eq!(fields.price.to_string(), "20.00");
        assert_eq!(fields.image.as_ref().map(AsRef::as_ref), Some("uploads/experience/a.png"));
    }

    #[rstest]
    fn empty_changeset_is_detected() {
        let changes = ExperienceChangeset {
            title: None,
            time_minutes: None,
            price: None,
            website: None,
            location_id: None,
        };
        assert!(changes.is_empty());
    }
}
