//! Request and response payloads for the experience endpoints.
//!
//! Request fields are captured as raw JSON so that a missing field, an
//! explicit `null` and a value of the wrong type each produce their own
//! field-level error.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Experience, ExperienceDraft, ExperienceFilter, ExperiencePatch, LocationId, Price, TagId,
    TimeMinutes, Title, Website,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::locations::LocationResponse;
use crate::inbound::http::state::MediaUrl;
use crate::inbound::http::tags::TagResponse;
use crate::inbound::http::validation::{
    ErrorCode, FieldName, decimal_text, field_error, map_experience_validation,
    null_field_error, parse_id_list, parse_integer, parse_pk, require,
};

const TITLE: FieldName = FieldName::new("title");
const TIME_MINUTES: FieldName = FieldName::new("time_minutes");
const PRICE: FieldName = FieldName::new("price");
const WEBSITE: FieldName = FieldName::new("website");
const LOCATION: FieldName = FieldName::new("location");
const TAGS: FieldName = FieldName::new("tags");
const LOCATIONS: FieldName = FieldName::new("locations");

/// Keep explicit `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Body of `POST`, `PUT` and `PATCH` on experiences.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ExperienceRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "Workshop")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>, example = 45)]
    pub time_minutes: Option<Value>,
    /// Decimal amount as a number or string, at most two decimal places.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "20.00")]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "https://example.com")]
    pub website: Option<Value>,
    /// Identifier of one of the caller's locations.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub location: Option<Value>,
    /// Identifiers of the caller's tags.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<i64>>)]
    pub tags: Option<Value>,
}

fn parse_title(value: &Value) -> ApiResult<Title> {
    match value {
        Value::String(raw) => Title::new(raw).map_err(map_experience_validation),
        Value::Null => Err(null_field_error(TITLE)),
        _ => Err(field_error(TITLE, ErrorCode::Invalid, "Not a valid string.")),
    }
}

fn parse_time(value: &Value) -> ApiResult<TimeMinutes> {
    let minutes = parse_integer(value, TIME_MINUTES)?;
    TimeMinutes::new(minutes).map_err(map_experience_validation)
}

fn parse_price(value: &Value) -> ApiResult<Price> {
    let text = decimal_text(value, PRICE)?;
    Price::parse(&text).map_err(map_experience_validation)
}

// `null` clears the website like an empty string does.
fn parse_website(value: &Value) -> ApiResult<Website> {
    match value {
        Value::String(raw) => Website::new(Some(raw)).map_err(map_experience_validation),
        Value::Null => Website::new(None).map_err(map_experience_validation),
        _ => Err(field_error(WEBSITE, ErrorCode::Invalid, "Not a valid string.")),
    }
}

fn parse_location(value: &Value) -> ApiResult<LocationId> {
    parse_pk(value, LOCATION).map(LocationId::new)
}

fn parse_tags(value: &Value) -> ApiResult<BTreeSet<TagId>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| parse_pk(item, TAGS).map(TagId::new))
            .collect(),
        Value::Null => Err(null_field_error(TAGS)),
        _ => Err(field_error(
            TAGS,
            ErrorCode::Invalid,
            "Expected a list of items.",
        )),
    }
}

impl ExperienceRequest {
    /// Validate a create or full-replace payload.
    ///
    /// Omitted `website` and `tags` fall back to empty values.
    pub fn parse_full(&self) -> ApiResult<ExperienceDraft> {
        let title = parse_title(require(self.title.as_ref(), TITLE)?)?;
        let time_minutes = parse_time(require(self.time_minutes.as_ref(), TIME_MINUTES)?)?;
        let price = parse_price(require(self.price.as_ref(), PRICE)?)?;
        let location = parse_location(require(self.location.as_ref(), LOCATION)?)?;
        let website = match &self.website {
            Some(value) => parse_website(value)?,
            None => Website::default(),
        };
        let tags = match &self.tags {
            Some(value) => parse_tags(value)?,
            None => BTreeSet::new(),
        };
        Ok(ExperienceDraft {
            title,
            time_minutes,
            price,
            website,
            location,
            tags,
        })
    }

    /// Validate a partial update; only supplied fields are set.
    pub fn parse_partial(&self) -> ApiResult<ExperiencePatch> {
        Ok(ExperiencePatch {
            title: self.title.as_ref().map(parse_title).transpose()?,
            time_minutes: self.time_minutes.as_ref().map(parse_time).transpose()?,
            price: self.price.as_ref().map(parse_price).transpose()?,
            website: self.website.as_ref().map(parse_website).transpose()?,
            location: self.location.as_ref().map(parse_location).transpose()?,
            tags: self.tags.as_ref().map(parse_tags).transpose()?,
        })
    }
}

/// Query parameters accepted by `GET /api/v1/experiences`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExperienceListQuery {
    /// Comma-separated tag ids; matches experiences carrying any of them.
    #[param(example = "1,2")]
    pub tags: Option<String>,
    /// Comma-separated location ids.
    #[param(example = "3")]
    pub locations: Option<String>,
}

impl ExperienceListQuery {
    /// Convert into a domain filter.
    pub fn to_filter(&self) -> ApiResult<ExperienceFilter> {
        let tags = parse_id_list(self.tags.as_deref(), TAGS)?
            .into_iter()
            .map(TagId::new)
            .collect();
        let locations = parse_id_list(self.locations.as_deref(), LOCATIONS)?
            .into_iter()
            .map(LocationId::new)
            .collect();
        Ok(ExperienceFilter { tags, locations })
    }
}

/// List representation: references are plain ids.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExperienceResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(example = "20.00")]
    pub price: String,
    pub website: String,
    pub location: i64,
    pub tags: Vec<i64>,
}

impl From<&Experience> for ExperienceResponse {
    fn from(experience: &Experience) -> Self {
        Self {
            id: experience.id().get(),
            title: experience.title().as_ref().to_owned(),
            time_minutes: experience.time_minutes().get(),
            price: experience.price().to_string(),
            website: experience.website().as_ref().to_owned(),
            location: experience.location().id().get(),
            tags: experience.tags().iter().map(|tag| tag.id().get()).collect(),
        }
    }
}

/// Detail representation with nested location, tags and the image URL.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExperienceDetailResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(example = "20.00")]
    pub price: String,
    pub website: String,
    pub location: LocationResponse,
    pub tags: Vec<TagResponse>,
    pub image: Option<String>,
}

impl ExperienceDetailResponse {
    pub fn new(experience: &Experience, media: &MediaUrl) -> Self {
        Self {
            id: experience.id().get(),
            title: experience.title().as_ref().to_owned(),
            time_minutes: experience.time_minutes().get(),
            price: experience.price().to_string(),
            website: experience.website().as_ref().to_owned(),
            location: LocationResponse::from(experience.location()),
            tags: experience.tags().iter().map(TagResponse::from).collect(),
            image: experience.image().map(|path| media.url_for(path)),
        }
    }
}

/// Response of the image upload action.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExperienceImageResponse {
    pub id: i64,
    #[schema(example = "/media/uploads/experience/4f1c.png")]
    pub image: Option<String>,
}

impl ExperienceImageResponse {
    pub fn new(experience: &Experience, media: &MediaUrl) -> Self {
        Self {
            id: experience.id().get(),
            image: experience.image().map(|path| media.url_for(path)),
        }
    }
}
