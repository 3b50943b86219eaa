//! User-owned lookup attributes: tags and locations.
//!
//! Both are small records that classify or place an experience. They share
//! name validation and ownership rules, captured by [`OwnedAttribute`] so a
//! single catalogue service and repository port can serve both.

use std::fmt;

use super::user::UserId;

/// Maximum length of attribute names and descriptions.
pub const ATTRIBUTE_TEXT_MAX: usize = 255;

/// Validation errors for attribute input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValidationError {
    /// The name was empty or only whitespace.
    BlankName,
    /// The name exceeded [`ATTRIBUTE_TEXT_MAX`].
    NameTooLong { max: usize },
    /// The description exceeded [`ATTRIBUTE_TEXT_MAX`].
    DescriptionTooLong { max: usize },
}

impl fmt::Display for AttributeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for AttributeValidationError {}

/// Non-blank attribute name.
///
/// # Examples
/// ```
/// use experiences::domain::AttributeName;
///
/// assert!(AttributeName::new("   ").is_err());
/// assert_eq!(AttributeName::new(" Outdoor ").expect("valid").as_ref(), "Outdoor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeName(String);

impl AttributeName {
    /// Trim and validate a name.
    pub fn new(raw: &str) -> Result<Self, AttributeValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AttributeValidationError::BlankName);
        }
        if trimmed.chars().count() > ATTRIBUTE_TEXT_MAX {
            return Err(AttributeValidationError::NameTooLong {
                max: ATTRIBUTE_TEXT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional free text attached to a location. Empty when not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDescription(String);

impl LocationDescription {
    /// Validate a description; `None` yields the empty description.
    pub fn new(raw: Option<&str>) -> Result<Self, AttributeValidationError> {
        let text = raw.unwrap_or_default();
        if text.chars().count() > ATTRIBUTE_TEXT_MAX {
            return Err(AttributeValidationError::DescriptionTooLong {
                max: ATTRIBUTE_TEXT_MAX,
            });
        }
        Ok(Self(text.to_owned()))
    }
}

impl AsRef<str> for LocationDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

macro_rules! attribute_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

attribute_id!(
    /// Database identifier of a tag.
    TagId
);
attribute_id!(
    /// Database identifier of a location.
    LocationId
);

/// Label classifying experiences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    id: TagId,
    owner: UserId,
    name: AttributeName,
}

impl Tag {
    /// Assemble a tag from stored parts.
    pub fn new(id: TagId, owner: UserId, name: AttributeName) -> Self {
        Self { id, owner, name }
    }

    /// Identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Name.
    pub fn name(&self) -> &AttributeName {
        &self.name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_ref())
    }
}

/// Place where an experience happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    id: LocationId,
    owner: UserId,
    name: AttributeName,
    description: LocationDescription,
}

impl Location {
    /// Assemble a location from stored parts.
    pub fn new(
        id: LocationId,
        owner: UserId,
        name: AttributeName,
        description: LocationDescription,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            description,
        }
    }

    /// Identifier.
    pub fn id(&self) -> LocationId {
        self.id
    }

    /// Owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Name.
    pub fn name(&self) -> &AttributeName {
        &self.name
    }

    /// Description, possibly empty.
    pub fn description(&self) -> &LocationDescription {
        &self.description
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_ref())
    }
}

/// Validated input for a new tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDraft {
    /// Name of the tag.
    pub name: AttributeName,
}

/// Validated input for a new location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDraft {
    /// Name of the location.
    pub name: AttributeName,
    /// Description, empty when omitted.
    pub description: LocationDescription,
}

/// Common shape of user-owned attributes.
pub trait OwnedAttribute: fmt::Display + Clone + Send + Sync + 'static {
    /// Validated creation input.
    type Draft: fmt::Debug + Clone + Send + Sync + 'static;

    /// Singular noun used in messages and logs.
    const KIND: &'static str;

    /// Owning user.
    fn owner_id(&self) -> UserId;

    /// Name used for ordering.
    fn attribute_name(&self) -> &AttributeName;
}

impl OwnedAttribute for Tag {
    type Draft = TagDraft;
    const KIND: &'static str = "tag";

    fn owner_id(&self) -> UserId {
        self.owner
    }

    fn attribute_name(&self) -> &AttributeName {
        &self.name
    }
}

impl OwnedAttribute for Location {
    type Draft = LocationDraft;
    const KIND: &'static str = "location";

    fn owner_id(&self) -> UserId {
        self.owner
    }

    fn attribute_name(&self) -> &AttributeName {
        &self.name
    }
}
