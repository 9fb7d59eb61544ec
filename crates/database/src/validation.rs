//! Input validation for identifiers written to the store.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid phone number.
    InvalidPhone(String),
    /// Invalid client identifier.
    InvalidClientId(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidClientId(msg) => write!(f, "Invalid client id: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// E.164 allows at most 15 digits.
pub const MAX_PHONE_DIGITS: usize = 15;

/// Shortest number accepted (country code plus subscriber number).
pub const MIN_PHONE_DIGITS: usize = 7;

/// Maximum allowed length for client identifiers.
pub const MAX_CLIENT_ID_LENGTH: usize = 64;

/// Normalize and validate a phone number, returning its bare digits.
///
/// Accepts an optional leading `+`, spaces and dashes, or a full
/// `digits@s.whatsapp.net` address.
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Empty("phone number".to_string()));
    }

    let bare = phone.split('@').next().unwrap_or(phone);
    let bare = bare.strip_prefix('+').unwrap_or(bare);

    let mut digits = String::with_capacity(bare.len());
    for c in bare.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' => {}
            _ => {
                return Err(ValidationError::InvalidPhone(format!(
                    "invalid character '{}'",
                    c
                )))
            }
        }
    }

    if digits.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::TooLong {
            field: "phone number".to_string(),
            max: MAX_PHONE_DIGITS,
            actual: digits.len(),
        });
    }

    if digits.len() < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone("too few digits".to_string()));
    }

    Ok(digits)
}

/// Validate a bridge client identifier.
///
/// Client ids are used as primary keys and in log lines, so only ASCII
/// letters, digits, `-` and `_` are allowed.
pub fn validate_client_id(client_id: &str) -> Result<(), ValidationError> {
    if client_id.is_empty() {
        return Err(ValidationError::Empty("client id".to_string()));
    }

    if client_id.len() > MAX_CLIENT_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "client id".to_string(),
            max: MAX_CLIENT_ID_LENGTH,
            actual: client_id.len(),
        });
    }

    if let Some(c) = client_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ValidationError::InvalidClientId(format!(
            "invalid character '{}'",
            c
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_valid() {
        assert_eq!(normalize_phone("5215512345678").unwrap(), "5215512345678");
        assert_eq!(normalize_phone("+52 1 55-1234-5678").unwrap(), "5215512345678");
        assert_eq!(
            normalize_phone("5215512345678@s.whatsapp.net").unwrap(),
            "5215512345678"
        );
        assert_eq!(normalize_phone(" 15551234567 ").unwrap(), "15551234567");
    }

    #[test]
    fn test_normalize_phone_invalid() {
        assert!(matches!(normalize_phone(""), Err(ValidationError::Empty(_))));

        assert!(matches!(
            normalize_phone("55-abc-1234"),
            Err(ValidationError::InvalidPhone(_))
        ));

        assert!(matches!(
            normalize_phone("12345"),
            Err(ValidationError::InvalidPhone(_))
        ));

        assert!(matches!(
            normalize_phone("1234567890123456"),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("tienda-centro").is_ok());
        assert!(validate_client_id("bot_01").is_ok());

        assert!(matches!(
            validate_client_id(""),
            Err(ValidationError::Empty(_))
        ));

        assert!(matches!(
            validate_client_id("tienda centro"),
            Err(ValidationError::InvalidClientId(_))
        ));

        let long_id = "a".repeat(100);
        assert!(matches!(
            validate_client_id(&long_id),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidPhone("too few digits".to_string());
        assert_eq!(err.to_string(), "Invalid phone number: too few digits");

        let err = ValidationError::TooLong {
            field: "client id".to_string(),
            max: 64,
            actual: 100,
        };
        assert_eq!(err.to_string(), "client id is too long (100 chars, max 64)");
    }
}
