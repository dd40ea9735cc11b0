use std::sync::OnceLock;

use regex::Regex;

use crate::errors::CookieSyncError;

/// `http`/`https` scheme, at least one host label (alphanumerics and `-`, dot
/// separated), optional port and an optional path/query made of word
/// characters, `-`, `.`, `=`, `&` and `?`.
const ADDRESS_PATTERN: &str =
    r"(?i)^https?://[a-z0-9-]+(\.[a-z0-9-]+)*\.?(:[0-9]+)?(/((\.)?(\?)?=?&?[a-z0-9_-](\?)?)*)*$";

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ADDRESS_PATTERN).expect("address pattern is a valid regex"))
}

/// Returns `true` when `value` is an acceptable target address.
pub fn is_valid_address(value: &str) -> bool {
    address_regex().is_match(value)
}

/// Validates a target address, yielding the user-facing error on rejection.
pub fn validate_target(value: &str) -> Result<(), CookieSyncError> {
    if is_valid_address(value) {
        Ok(())
    } else {
        Err(CookieSyncError::invalid_target(value))
    }
}
