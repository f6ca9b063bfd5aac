//! Admin ID list validation.
//!
//! `ADMIN_IDS` is a comma-separated list of numeric Telegram user IDs.
//! The accepted grammar is digits and commas only, after trimming
//! whitespace around each token; the list must be non-empty.

use crate::error::{DeployError, Result};

/// Parse a comma-separated admin ID list.
///
/// Returns the parsed IDs in input order, or `Validation` when any
/// token is empty or contains a non-digit character.
pub fn parse_admin_ids(input: &str) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(DeployError::Validation(format!(
                "ADMIN_IDS must be comma-separated numeric IDs, got {input:?}"
            )));
        }
        let id: u64 = token
            .parse()
            .map_err(|_| DeployError::Validation(format!("admin ID out of range: {token}")))?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(DeployError::Validation(
            "ADMIN_IDS must contain at least one ID".to_string(),
        ));
    }
    Ok(ids)
}

/// Canonical storage form: trimmed IDs joined with commas.
pub fn normalize_admin_ids(input: &str) -> Result<String> {
    let ids = parse_admin_ids(input)?;
    Ok(ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(","))
}
