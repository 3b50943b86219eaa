//! Authentication primitives: passwords, login credentials and API tokens.
//!
//! Plaintext secrets are wrapped in [`Zeroizing`] so they are wiped on drop.
//! API tokens are handed to the client once and only their SHA-256 digest is
//! kept afterwards.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{Email, UserValidationError};

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN: usize = 5;

/// Number of random bytes behind an API token.
const TOKEN_BYTES: usize = 20;

/// Validation errors for credential input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// The email part was invalid.
    Email(UserValidationError),
    /// The password was missing.
    EmptyPassword,
    /// The password was shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) => write!(f, "{err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<UserValidationError> for CredentialValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::Email(value)
    }
}

/// A new password chosen by a user.
///
/// Whitespace is preserved; only the length is checked.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password.
    ///
    /// # Examples
    /// ```
    /// use experiences::domain::Password;
    ///
    /// assert!(Password::new("pw").is_err());
    /// assert!(Password::new("testpass123").is_ok());
    /// ```
    pub fn new(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        if raw.chars().count() < PASSWORD_MIN {
            return Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// The plaintext password.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

/// Email and password presented when requesting a token.
///
/// Unlike [`Password`] no minimum length applies here: the stored hash is
/// the only judge.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Build credentials from raw parts.
    ///
    /// # Examples
    /// ```
    /// use experiences::domain::LoginCredentials;
    ///
    /// let creds = LoginCredentials::try_from_parts(" Ada@Example.com", "secret").expect("valid");
    /// assert_eq!(creds.email().as_ref(), "ada@example.com");
    /// ```
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plaintext password to verify.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Plaintext API token returned to the client exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Generate a fresh random token of 40 lowercase hex characters.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(Zeroizing::new(hex::encode(bytes)))
    }

    /// Wrap a token presented by a client.
    pub fn from_presented(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// The plaintext key.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Digest persisted in place of the key.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Hex-encoded SHA-256 digest of an [`AuthToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Rehydrate a digest read from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TokenDigest {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
