//! Search filter and the per-item matching predicate.

use std::collections::HashSet;

use super::normalize::{normalize, normalize_tags};
use super::{CatalogItem, ItemStatus};

/// Criteria for searching the catalog.
///
/// Every field is optional and an empty filter matches every item. Text
/// fields are stored as given; normalized forms are computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub term: Option<String>,
    pub publisher: Option<String>,
    pub series: Option<String>,
    pub status: Option<ItemStatus>,
    pub tags: Vec<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn normalized_term(&self) -> Option<String> {
        self.term.as_deref().and_then(normalize)
    }

    pub fn normalized_publisher(&self) -> Option<String> {
        self.publisher.as_deref().and_then(normalize)
    }

    pub fn normalized_series(&self) -> Option<String> {
        self.series.as_deref().and_then(normalize)
    }

    /// Requested tags, normalized and deduplicated. Never capped.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags, usize::MAX)
    }

    /// True when no clause would constrain the result.
    pub fn is_empty(&self) -> bool {
        self.normalized_term().is_none()
            && self.normalized_publisher().is_none()
            && self.normalized_series().is_none()
            && self.status.is_none()
            && self.normalized_tags().is_empty()
    }
}

/// Evaluate `item` against `filter`.
///
/// Clauses run in a fixed order (term, publisher, series, status, tags) and
/// evaluation stops at the first one that fails.
pub fn matches(item: &CatalogItem, filter: &SearchFilter) -> bool {
    if let Some(term) = filter.normalized_term() {
        if !matches_term(item, &term) {
            return false;
        }
    }

    if let Some(publisher) = filter.normalized_publisher() {
        if !contains(Some(&item.publisher), &publisher) {
            return false;
        }
    }

    if let Some(series) = filter.normalized_series() {
        if !contains(item.series.as_ref(), &series) {
            return false;
        }
    }

    if let Some(status) = filter.status {
        if item.status != status {
            return false;
        }
    }

    let tags = filter.normalized_tags();
    if !tags.is_empty() && !matches_tags(item, &tags) {
        return false;
    }

    true
}

fn matches_term(item: &CatalogItem, term: &str) -> bool {
    contains(Some(&item.title), term)
        || contains(item.series.as_ref(), term)
        || contains(Some(&item.publisher), term)
        || contains(item.description.as_ref(), term)
        || contains(item.location.as_ref(), term)
        || contains(item.language.as_ref(), term)
        || item_tags(item).any(|tag| tag.contains(term))
}

/// Superset check: every requested tag must be one of the item's tags.
fn matches_tags(item: &CatalogItem, requested: &[String]) -> bool {
    if item.tags.is_empty() {
        return false;
    }
    let owned: HashSet<String> = item_tags(item).collect();
    requested.iter().all(|tag| owned.contains(tag))
}

/// Item tags in normalized form.
///
/// Stored tags are already normalized; normalizing again keeps matching
/// correct for items built outside the request path.
fn item_tags(item: &CatalogItem) -> impl Iterator<Item = String> + '_ {
    item.tags.iter().filter_map(normalize)
}

fn contains(value: Option<&String>, term: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(term))
}
