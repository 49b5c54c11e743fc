use crate::error::AdminError;

/// Substrings that cause an ad-hoc query to be refused.
pub const DENIED_KEYWORDS: [&str; 3] = ["drop", "delete", "truncate"];

/// Refuse any query whose lowercased text contains a denied keyword anywhere.
///
/// This is a substring test, not a parser: it also refuses identifiers such as
/// `deleted` and does nothing about multi-statement payloads.
pub fn check(query: &str) -> Result<(), AdminError> {
    let lowered = query.to_lowercase();
    if DENIED_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return Err(AdminError::Forbidden);
    }
    Ok(())
}
