//! Types for the item catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::normalize_tags;

/// Default upper bound on tags per item.
pub const DEFAULT_MAX_TAGS: usize = 10;

/// Ownership status of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Owned,
    Wishlist,
    Ordered,
    Lent,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Owned,
        ItemStatus::Wishlist,
        ItemStatus::Ordered,
        ItemStatus::Lent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Owned => "OWNED",
            ItemStatus::Wishlist => "WISHLIST",
            ItemStatus::Ordered => "ORDERED",
            ItemStatus::Lent => "LENT",
        }
    }

    /// Parse a status literal where absence means [`ItemStatus::Owned`].
    ///
    /// Used for item writes and CSV rows.
    pub fn parse_or_default(value: Option<&str>) -> Result<Self, CatalogError> {
        match value.map(str::trim) {
            None | Some("") => Ok(ItemStatus::Owned),
            Some(literal) => literal.parse(),
        }
    }

    /// Parse an optional status literal where absence means "no constraint".
    ///
    /// Used for search filters.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, CatalogError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(literal) => literal.parse().map(Some),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(literal))
            .ok_or_else(|| CatalogError::Validation(format!("Invalid status: {}", s)))
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized tags of an item.
///
/// Entries are trimmed, lower-cased, unique and kept in insertion order.
/// The only way to build one is through [`TagSet::from_raw`] (or
/// [`TagSet::new`] for an empty set), so the invariant always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a tag set from raw user input, capping it at `max` entries.
    pub fn from_raw<I, S>(inputs: I, max: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(normalize_tags(inputs, max))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + Clone {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// A cataloged comic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    /// Store-assigned identifier. `None` until the first save.
    pub id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub issue_number: String,
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Store-relative cover path, e.g. `/files/<uuid>.png`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: ItemStatus,
    pub tags: TagSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Item not found: {0}")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("CSV import failed at line {line} after {imported} imported rows: {reason}")]
    Import {
        /// 1-based line of the offending record (0 when the header is unusable).
        line: u64,
        /// Rows persisted before the failure. These stay committed.
        imported: usize,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
