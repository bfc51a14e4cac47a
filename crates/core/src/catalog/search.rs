//! In-memory search over the full item collection.

use super::filter::{matches, SearchFilter};
use super::CatalogItem;

/// Lazily filter `items` through `filter`.
///
/// The returned iterator keeps the input order and can be cloned to restart
/// the scan from the beginning.
pub fn search<'a>(
    items: &'a [CatalogItem],
    filter: &'a SearchFilter,
) -> impl Iterator<Item = &'a CatalogItem> + Clone + 'a {
    items.iter().filter(move |item| matches(item, filter))
}

/// Every item, in store order.
pub fn find_all(items: &[CatalogItem]) -> impl Iterator<Item = &CatalogItem> + Clone + '_ {
    items.iter()
}
