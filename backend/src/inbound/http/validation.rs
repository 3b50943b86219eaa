//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every field failure is reported as `400 invalid_request` with
//! `details = {"field": <name>, "code": <code>}`.

use serde_json::Value;

use crate::domain::{
    AttributeValidationError, CredentialValidationError, Error, ExperienceValidationError,
    ImageValidationError, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    Required,
    Null,
    Blank,
    Invalid,
    MaxLength,
    MinLength,
    MinValue,
    MaxValue,
    MaxDecimalPlaces,
    MaxDigits,
    MaxSize,
    InvalidImage,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::Null => "null",
            ErrorCode::Blank => "blank",
            ErrorCode::Invalid => "invalid",
            ErrorCode::MaxLength => "max_length",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MinValue => "min_value",
            ErrorCode::MaxValue => "max_value",
            ErrorCode::MaxDecimalPlaces => "max_decimal_places",
            ErrorCode::MaxDigits => "max_digits",
            ErrorCode::MaxSize => "max_size",
            ErrorCode::InvalidImage => "invalid_image",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_field(field.as_str(), code.as_str(), message)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(field, ErrorCode::Required, "This field is required.")
}

pub(crate) fn null_field_error(field: FieldName) -> Error {
    field_error(field, ErrorCode::Null, "This field may not be null.")
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Interpret a JSON integer or an integer string as a primary key.
pub(crate) fn parse_pk(value: &Value, field: FieldName) -> Result<i64, Error> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Null => return Err(null_field_error(field)),
        _ => None,
    };
    parsed.ok_or_else(|| {
        field_error(
            field,
            ErrorCode::Invalid,
            format!("Incorrect type. Expected pk value, received {}.", type_name(value)),
        )
    })
}

/// Interpret a JSON number or numeric string as whole minutes.
pub(crate) fn parse_integer(value: &Value, field: FieldName) -> Result<i64, Error> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Null => return Err(null_field_error(field)),
        _ => None,
    };
    parsed.ok_or_else(|| field_error(field, ErrorCode::Invalid, "A valid integer is required."))
}

/// Textual form of a JSON number or string, for decimal parsing.
pub(crate) fn decimal_text(value: &Value, field: FieldName) -> Result<String, Error> {
    match value {
        Value::Number(number) => Ok(number.to_string()),
        Value::String(text) => Ok(text.clone()),
        Value::Null => Err(null_field_error(field)),
        _ => Err(field_error(field, ErrorCode::Invalid, "A valid number is required.")),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Parse a comma-separated id filter such as `"1,2,3"`.
///
/// Empty segments are ignored, so an empty value means "no filter".
pub(crate) fn parse_id_list(raw: Option<&str>, field: FieldName) -> Result<Vec<i64>, Error> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.parse::<i64>().map_err(|_| {
                field_error(
                    field,
                    ErrorCode::Invalid,
                    format!("{} must be a comma-separated list of integers", field.as_str()),
                )
            })
        })
        .collect()
}

pub(crate) fn map_user_validation(err: UserValidationError, name_field: FieldName) -> Error {
    let message = err.to_string();
    match err {
        UserValidationError::MissingEmail => {
            field_error(FieldName::new("email"), ErrorCode::Blank, message)
        }
        UserValidationError::InvalidEmail => {
            field_error(FieldName::new("email"), ErrorCode::Invalid, message)
        }
        UserValidationError::EmailTooLong { .. } => {
            field_error(FieldName::new("email"), ErrorCode::MaxLength, message)
        }
        UserValidationError::NameTooLong { .. } => {
            field_error(name_field, ErrorCode::MaxLength, message)
        }
    }
}

pub(crate) fn map_credential_validation(err: CredentialValidationError) -> Error {
    let password = FieldName::new("password");
    let message = err.to_string();
    match err {
        CredentialValidationError::Email(inner) => {
            map_user_validation(inner, FieldName::new("name"))
        }
        CredentialValidationError::EmptyPassword => {
            field_error(password, ErrorCode::Blank, message)
        }
        CredentialValidationError::PasswordTooShort { .. } => {
            field_error(password, ErrorCode::MinLength, message)
        }
    }
}

pub(crate) fn map_attribute_validation(err: AttributeValidationError) -> Error {
    let message = err.to_string();
    match err {
        AttributeValidationError::BlankName => {
            field_error(FieldName::new("name"), ErrorCode::Blank, message)
        }
        AttributeValidationError::NameTooLong { .. } => {
            field_error(FieldName::new("name"), ErrorCode::MaxLength, message)
        }
        AttributeValidationError::DescriptionTooLong { .. } => {
            field_error(FieldName::new("description"), ErrorCode::MaxLength, message)
        }
    }
}

pub(crate) fn map_experience_validation(err: ExperienceValidationError) -> Error {
    let message = err.to_string();
    let (field, code) = match err {
        ExperienceValidationError::BlankTitle => ("title", ErrorCode::Blank),
        ExperienceValidationError::TitleTooLong { .. } => ("title", ErrorCode::MaxLength),
        ExperienceValidationError::NegativeDuration => ("time_minutes", ErrorCode::MinValue),
        ExperienceValidationError::DurationTooLarge => ("time_minutes", ErrorCode::MaxValue),
        ExperienceValidationError::InvalidPrice => ("price", ErrorCode::Invalid),
        ExperienceValidationError::PriceTooPrecise { .. } => {
            ("price", ErrorCode::MaxDecimalPlaces)
        }
        ExperienceValidationError::PriceTooLarge { .. } => ("price", ErrorCode::MaxDigits),
        ExperienceValidationError::WebsiteTooLong { .. } => ("website", ErrorCode::MaxLength),
    };
    field_error(FieldName::new(field), code, message)
}

pub(crate) fn map_image_validation(err: ImageValidationError) -> Error {
    field_error(FieldName::new("image"), ErrorCode::InvalidImage, err.to_string())
}
