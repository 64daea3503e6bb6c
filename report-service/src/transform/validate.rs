use crate::error::{AppError, Result};
use crate::feed::{Entry, Feed};

/// A feed with an identifier and at least one entry.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedFeed<'a> {
    pub id: &'a str,
    pub entries: &'a [Entry],
}

/// Pure structural check of a decoded feed. Must run before any extraction
/// or store access.
pub fn validate_feed(feed: Option<&Feed>) -> Result<ValidatedFeed<'_>> {
    let missing = || {
        AppError::MissingData("Feed or its required fields (id, entries) are missing".to_string())
    };

    let feed = feed.ok_or_else(missing)?;
    let id = feed
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(missing)?;
    let entries = feed
        .entries
        .as_deref()
        .filter(|entries| !entries.is_empty())
        .ok_or_else(missing)?;

    Ok(ValidatedFeed { id, entries })
}
