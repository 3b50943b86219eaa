//! Experiences: bookable activities owned by a user.
//!
//! An experience has exactly one location and any number of tags. Both must
//! belong to the same owner; the repository enforces this when it writes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::attributes::{Location, LocationId, Tag, TagId};
use super::user::UserId;

/// Maximum length of titles and websites.
pub const EXPERIENCE_TEXT_MAX: usize = 255;
/// Decimal places stored for prices.
pub const PRICE_SCALE: u32 = 2;
/// Total significant digits stored for prices.
pub const PRICE_DIGITS: u32 = 5;
/// Directory, relative to the media root, holding experience images.
pub const IMAGE_UPLOAD_DIR: &str = "uploads/experience";

/// Validation errors for experience input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperienceValidationError {
    /// The title was blank.
    BlankTitle,
    /// The title exceeded [`EXPERIENCE_TEXT_MAX`].
    TitleTooLong { max: usize },
    /// The duration was negative.
    NegativeDuration,
    /// The duration does not fit the stored integer.
    DurationTooLarge,
    /// The price could not be parsed as a decimal number.
    InvalidPrice,
    /// The price had more than [`PRICE_SCALE`] decimal places.
    PriceTooPrecise { max_places: u32 },
    /// The price needed more than [`PRICE_DIGITS`] digits.
    PriceTooLarge { max_digits: u32 },
    /// The website exceeded [`EXPERIENCE_TEXT_MAX`].
    WebsiteTooLong { max: usize },
}

impl fmt::Display for ExperienceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::NegativeDuration => write!(f, "time_minutes must be zero or greater"),
            Self::DurationTooLarge => write!(f, "time_minutes is too large"),
            Self::InvalidPrice => write!(f, "a valid number is required"),
            Self::PriceTooPrecise { max_places } => {
                write!(f, "price must have no more than {max_places} decimal places")
            }
            Self::PriceTooLarge { max_digits } => {
                write!(f, "price must have no more than {max_digits} digits in total")
            }
            Self::WebsiteTooLong { max } => write!(f, "website must be at most {max} characters"),
        }
    }
}

impl std::error::Error for ExperienceValidationError {}

/// Database identifier of an experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExperienceId(i64);

impl ExperienceId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExperienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-blank experience title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Trim and validate a title.
    pub fn new(raw: &str) -> Result<Self, ExperienceValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExperienceValidationError::BlankTitle);
        }
        if trimmed.chars().count() > EXPERIENCE_TEXT_MAX {
            return Err(ExperienceValidationError::TitleTooLong {
                max: EXPERIENCE_TEXT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Duration of an experience in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeMinutes(i32);

impl TimeMinutes {
    /// Validate a duration.
    pub fn new(minutes: i64) -> Result<Self, ExperienceValidationError> {
        if minutes < 0 {
            return Err(ExperienceValidationError::NegativeDuration);
        }
        i32::try_from(minutes)
            .map(Self)
            .map_err(|_| ExperienceValidationError::DurationTooLarge)
    }

    /// Minutes as stored.
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Price with two decimal places and at most five digits.
///
/// # Examples
/// ```
/// use experiences::domain::Price;
///
/// let price = Price::parse("20").expect("valid price");
/// assert_eq!(price.to_string(), "20.00");
/// assert!(Price::parse("1000.00").is_err());
/// assert!(Price::parse("1.234").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    /// Validate a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, ExperienceValidationError> {
        let normalised = amount.normalize();
        if normalised.scale() > PRICE_SCALE {
            return Err(ExperienceValidationError::PriceTooPrecise {
                max_places: PRICE_SCALE,
            });
        }
        let limit = Decimal::from(10_i64.pow(PRICE_DIGITS - PRICE_SCALE));
        if normalised.abs() >= limit {
            return Err(ExperienceValidationError::PriceTooLarge {
                max_digits: PRICE_DIGITS,
            });
        }
        let mut scaled = normalised;
        scaled.rescale(PRICE_SCALE);
        Ok(Self(scaled))
    }

    /// Parse a textual amount such as `"12.5"`.
    pub fn parse(raw: &str) -> Result<Self, ExperienceValidationError> {
        let amount = Decimal::from_str(raw.trim()).map_err(|_| ExperienceValidationError::InvalidPrice)?;
        Self::new(amount)
    }

    /// The amount with exactly [`PRICE_SCALE`] decimal places.
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Website link, empty when the experience has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Website(String);

impl Website {
    /// Validate a website; `None` yields the empty value.
    pub fn new(raw: Option<&str>) -> Result<Self, ExperienceValidationError> {
        let trimmed = raw.unwrap_or_default().trim();
        if trimmed.chars().count() > EXPERIENCE_TEXT_MAX {
            return Err(ExperienceValidationError::WebsiteTooLong {
                max: EXPERIENCE_TEXT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Website {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Path of a stored image, relative to the media root.
///
/// Generated paths follow `uploads/experience/<uuid>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath(String);

impl ImagePath {
    /// Generate a fresh unique path with the given extension.
    ///
    /// # Examples
    /// ```
    /// use experiences::domain::ImagePath;
    ///
    /// let path = ImagePath::generate("jpg");
    /// assert!(path.as_ref().starts_with("uploads/experience/"));
    /// assert!(path.as_ref().ends_with(".jpg"));
    /// ```
    pub fn generate(extension: &str) -> Self {
        Self(format!("{IMAGE_UPLOAD_DIR}/{}.{extension}", Uuid::new_v4()))
    }

    /// Rehydrate a path read from storage.
    pub fn from_stored(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for ImagePath {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// An experience with its location and tags loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experience {
    id: ExperienceId,
    owner: UserId,
    title: Title,
    time_minutes: TimeMinutes,
    price: Price,
    website: Website,
    location: Location,
    tags: Vec<Tag>,
    image: Option<ImagePath>,
}

/// Stored experience fields, grouped to keep [`Experience::new`] readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceFields {
    /// Title.
    pub title: Title,
    /// Duration.
    pub time_minutes: TimeMinutes,
    /// Price.
    pub price: Price,
    /// Website, possibly empty.
    pub website: Website,
    /// Stored image, if uploaded.
    pub image: Option<ImagePath>,
}

impl Experience {
    /// Assemble an experience from stored parts. Tags are sorted by id.
    pub fn new(
        id: ExperienceId,
        owner: UserId,
        fields: ExperienceFields,
        location: Location,
        mut tags: Vec<Tag>,
    ) -> Self {
        tags.sort_by_key(Tag::id);
        tags.dedup_by_key(|tag| tag.id());
        let ExperienceFields {
            title,
            time_minutes,
            price,
            website,
            image,
        } = fields;
        Self {
            id,
            owner,
            title,
            time_minutes,
            price,
            website,
            location,
            tags,
            image,
        }
    }

    /// Identifier.
    pub fn id(&self) -> ExperienceId {
        self.id
    }

    /// Owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Title.
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Duration.
    pub fn time_minutes(&self) -> TimeMinutes {
        self.time_minutes
    }

    /// Price.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Website, possibly empty.
    pub fn website(&self) -> &Website {
        &self.website
    }

    /// Location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Tags ordered by id.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Stored image path.
    pub fn image(&self) -> Option<&ImagePath> {
        self.image.as_ref()
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title.as_ref())
    }
}

/// Validated input for creating or fully replacing an experience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceDraft {
    /// Title.
    pub title: Title,
    /// Duration.
    pub time_minutes: TimeMinutes,
    /// Price.
    pub price: Price,
    /// Website; empty when omitted.
    pub website: Website,
    /// Location reference.
    pub location: LocationId,
    /// Tag references; empty when omitted.
    pub tags: BTreeSet<TagId>,
}

/// Partial update. `None` leaves a field unchanged; `Some` tags replace the
/// whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperiencePatch {
    /// New title.
    pub title: Option<Title>,
    /// New duration.
    pub time_minutes: Option<TimeMinutes>,
    /// New price.
    pub price: Option<Price>,
    /// New website.
    pub website: Option<Website>,
    /// New location reference.
    pub location: Option<LocationId>,
    /// Replacement tag set.
    pub tags: Option<BTreeSet<TagId>>,
}

impl From<ExperienceDraft> for ExperiencePatch {
    fn from(draft: ExperienceDraft) -> Self {
        let ExperienceDraft {
            title,
            time_minutes,
            price,
            website,
            location,
            tags,
        } = draft;
        Self {
            title: Some(title),
            time_minutes: Some(time_minutes),
            price: Some(price),
            website: Some(website),
            location: Some(location),
            tags: Some(tags),
        }
    }
}

/// Filters accepted by the experience listing.
///
/// Within one dimension ids are alternatives; across dimensions every
/// present filter must match. Empty sets mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperienceFilter {
    /// Match experiences carrying any of these tags.
    pub tags: BTreeSet<TagId>,
    /// Match experiences located at any of these locations.
    pub locations: BTreeSet<LocationId>,
}

impl ExperienceFilter {
    /// Whether `experience` satisfies the filter.
    pub fn matches(&self, experience: &Experience) -> bool {
        let tag_ok = self.tags.is_empty()
            || experience
                .tags()
                .iter()
                .any(|tag| self.tags.contains(&tag.id()));
        let location_ok =
            self.locations.is_empty() || self.locations.contains(&experience.location().id());
        tag_ok && location_ok
    }
}
