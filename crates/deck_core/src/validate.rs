use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error_handler::DeckError;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static address regex"));

/// `0x` followed by exactly 40 hex characters, any case.
pub fn is_address(value: &str) -> bool {
    ADDRESS_RE.is_match(value)
}

/// Validate an address-typed form field.
pub fn require_address(field: &str, value: &str) -> Result<String, DeckError> {
    let trimmed = value.trim();
    if is_address(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(DeckError::Validation(format!(
            "{field} must be a 0x-prefixed 40 character hex address"
        )))
    }
}

pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, DeckError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DeckError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed)
    }
}

/// A point in time entered as unix seconds or RFC 3339.
pub fn parse_timestamp(field: &str, value: &str) -> Result<u64, DeckError> {
    let trimmed = require_non_empty(field, value)?;
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(secs);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .and_then(|dt| u64::try_from(dt.timestamp()).ok())
        .ok_or_else(|| {
            DeckError::Validation(format!(
                "{field} must be unix seconds or an RFC 3339 timestamp"
            ))
        })
}

/// A non-negative duration in whole seconds.
pub fn parse_duration_secs(field: &str, value: &str) -> Result<u64, DeckError> {
    require_non_empty(field, value)?
        .parse::<u64>()
        .map_err(|_| DeckError::Validation(format!("{field} must be a whole number of seconds")))
}
