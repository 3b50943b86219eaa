//! User accounts.
//!
//! Users are identified by a normalised email address. The whole address is
//! lowercased so that lookups are case-insensitive end to end.

use std::fmt;

use chrono::{DateTime, Utc};

/// Maximum stored length of an email address.
pub const EMAIL_MAX: usize = 255;
/// Maximum stored length of a user's name.
pub const USER_NAME_MAX: usize = 255;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// No email address was supplied, or it was blank.
    MissingEmail,
    /// The address is not of the form `local@domain`.
    InvalidEmail,
    /// The address exceeds [`EMAIL_MAX`] characters.
    EmailTooLong { max: usize },
    /// The name exceeds [`USER_NAME_MAX`] characters.
    NameTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEmail => write!(f, "users must have an email address"),
            Self::InvalidEmail => write!(f, "enter a valid email address"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Database identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalised email address.
///
/// # Examples
/// ```
/// use experiences::domain::Email;
///
/// let email = Email::parse("  Test@EXAMPLE.com ").expect("valid address");
/// assert_eq!(email.as_ref(), "test@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Trim, lowercase and validate a raw address.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::MissingEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let normalised = trimmed.to_lowercase();
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalised.contains(char::is_whitespace) =>
            {
                Ok(Self(normalised))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }

    /// Parse an optional address, treating `None` as missing.
    pub fn parse_required(raw: Option<&str>) -> Result<Self, UserValidationError> {
        raw.map_or(Err(UserValidationError::MissingEmail), Self::parse)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form user name, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Validate a name. Surrounding whitespace is removed.
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: USER_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Permission flags of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFlags {
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// Whether the account is a staff member.
    pub is_staff: bool,
    /// Whether the account holds every permission.
    pub is_superuser: bool,
}

impl UserFlags {
    /// Flags of an ordinary self-registered account.
    pub const REGULAR: Self = Self {
        is_active: true,
        is_staff: false,
        is_superuser: false,
    };

    /// Flags of an administrative account.
    pub const SUPERUSER: Self = Self {
        is_active: true,
        is_staff: true,
        is_superuser: true,
    };
}

/// Persisted user account.
///
/// ## Invariants
/// - `email` is normalised and unique.
/// - A superuser is always staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    name: UserName,
    flags: UserFlags,
    date_joined: DateTime<Utc>,
}

impl User {
    /// Assemble a user from validated parts.
    pub fn new(
        id: UserId,
        email: Email,
        name: UserName,
        flags: UserFlags,
        date_joined: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            flags,
            date_joined,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Normalised email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Display name, possibly empty.
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Permission flags.
    pub fn flags(&self) -> UserFlags {
        self.flags
    }

    /// Whether the account may authenticate.
    pub fn is_active(&self) -> bool {
        self.flags.is_active
    }

    /// Whether the account is staff.
    pub fn is_staff(&self) -> bool {
        self.flags.is_staff
    }

    /// Whether the account is a superuser.
    pub fn is_superuser(&self) -> bool {
        self.flags.is_superuser
    }

    /// Registration timestamp.
    pub fn date_joined(&self) -> DateTime<Utc> {
        self.date_joined
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.email.as_ref())
    }
}

/// Values required to insert a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Normalised email.
    pub email: Email,
    /// Display name.
    pub name: UserName,
    /// Encoded password hash.
    pub password_hash: String,
    /// Permission flags.
    pub flags: UserFlags,
}

/// Changes applied to an existing account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// Replacement email.
    pub email: Option<Email>,
    /// Replacement name.
    pub name: Option<UserName>,
    /// Replacement password hash.
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Whether no field would change.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.password_hash.is_none()
    }
}
