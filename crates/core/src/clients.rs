//! Client identity rules: NDIS numbers, dates of birth, search matching.

use chrono::Datelike;

use crate::error::CoreError;
use crate::types::Date;

/// NDIS participant numbers are nine digits.
pub const NDIS_NUMBER_LENGTH: usize = 9;

/// Oldest plausible date of birth, in years before today.
pub const MAX_AGE_YEARS: i32 = 130;

pub const MAX_CLIENT_NAME_LENGTH: u64 = 200;

/// Strip the spaces people commonly type into NDIS numbers ("430 123 456").
pub fn normalize_ndis_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Validate an already-normalized NDIS number.
pub fn validate_ndis_number(ndis: &str) -> Result<(), CoreError> {
    if ndis.len() != NDIS_NUMBER_LENGTH || !ndis.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::invalid_field(
            "ndis_number",
            format!("NDIS number must be exactly {NDIS_NUMBER_LENGTH} digits"),
        ));
    }
    Ok(())
}

/// Date of birth must be strictly in the past and within a plausible age.
pub fn validate_date_of_birth(dob: Date, today: Date) -> Result<(), CoreError> {
    if dob >= today {
        return Err(CoreError::invalid_field(
            "date_of_birth",
            "Date of birth must be in the past",
        ));
    }
    if today.year() - dob.year() > MAX_AGE_YEARS {
        return Err(CoreError::invalid_field(
            "date_of_birth",
            format!("Date of birth cannot be more than {MAX_AGE_YEARS} years ago"),
        ));
    }
    Ok(())
}

/// Case-insensitive substring match over a client's name and NDIS number.
///
/// An empty (or all-whitespace) term matches everything.
pub fn matches_search(name: &str, ndis_number: Option<&str>, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&term)
        || ndis_number.is_some_and(|n| n.contains(&normalize_ndis_number(&term)))
}
