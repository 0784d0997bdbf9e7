//! Write-time validation shared by ideas, users and reviews.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 1000;
pub const TARGET_AUDIENCE_MAX: usize = 200;
pub const COMPETITIVE_ADVANTAGE_MAX: usize = 500;
pub const CHALLENGES_MAX: usize = 500;
pub const NAME_MAX: usize = 100;
pub const REVIEW_COMMENT_MAX: usize = 1000;

pub const KEY_FEATURES: (usize, usize) = (1, 5);
pub const REVENUE_STREAMS: (usize, usize) = (1, 3);
pub const REQUIRED_SKILLS: (usize, usize) = (1, 5);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` must not be empty")]
    Blank { field: &'static str },

    #[error("`{field}` is {len} characters long (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("`{field}` has {len} entries (expected {min} to {max})")]
    Cardinality {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("`{field}` is not a valid e-mail address: `{value}`")]
    Email { field: &'static str, value: String },

    #[error("`{field}` is not a valid phone number: `{value}`")]
    Phone { field: &'static str, value: String },

    #[error("rating must be between 1 and 5 (got {0})")]
    Rating(u8),
}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .expect("static e-mail pattern")
    })
}

fn phone_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("static phone pattern"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}

/// 7 to 15 digits, optionally prefixed with `+`, separated by spaces or dashes.
pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    phone_pattern().is_match(value) && (7..=15).contains(&digits)
}

pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    max_len(field, value, max)
}

pub(crate) fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }
    Ok(())
}

pub(crate) fn cardinality(
    field: &'static str,
    items: &[String],
    (min, max): (usize, usize),
) -> Result<(), ValidationError> {
    let len = items.len();
    if len < min || len > max {
        return Err(ValidationError::Cardinality {
            field,
            len,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(ValidationError::Email {
            field,
            value: value.to_string(),
        })
    }
}

pub(crate) fn phone(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !is_valid_phone(v) => Err(ValidationError::Phone {
            field,
            value: v.to_string(),
        }),
        _ => Ok(()),
    }
}
