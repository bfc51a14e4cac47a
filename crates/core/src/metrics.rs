//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog writes (items created and deleted)
//! - CSV import (rows imported, imports rejected)
//! - Cover storage (stores by result, swallowed delete failures)
//! - User accounts (registrations)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Items created, by origin.
pub static ITEMS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("comicshelf_items_created_total", "Total items created"),
        &["origin"], // "api", "import", "seed"
    )
    .unwrap()
});

/// Items deleted.
pub static ITEMS_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("comicshelf_items_deleted_total", "Total items deleted").unwrap()
});

// =============================================================================
// Import Metrics
// =============================================================================

/// Rows saved by CSV import.
pub static IMPORT_ROWS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "comicshelf_import_rows_total",
        "Total rows saved by CSV import",
    )
    .unwrap()
});

/// CSV imports aborted by a bad header or row.
pub static IMPORT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "comicshelf_import_failures_total",
        "Total CSV imports aborted",
    )
    .unwrap()
});

// =============================================================================
// Cover Storage Metrics
// =============================================================================

/// Cover store attempts by result.
pub static COVER_STORES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("comicshelf_cover_stores_total", "Total cover store attempts"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Cover deletions that failed and were ignored.
pub static COVER_DELETE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "comicshelf_cover_delete_failures_total",
        "Total cover deletions that failed",
    )
    .unwrap()
});

// =============================================================================
// Account Metrics
// =============================================================================

/// Accounts created, by role.
pub static ACCOUNTS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("comicshelf_accounts_created_total", "Total user accounts created"),
        &["role"], // "admin", "user"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_CREATED.clone()),
        Box::new(ITEMS_DELETED.clone()),
        Box::new(IMPORT_ROWS.clone()),
        Box::new(IMPORT_FAILURES.clone()),
        Box::new(COVER_STORES.clone()),
        Box::new(COVER_DELETE_FAILURES.clone()),
        Box::new(ACCOUNTS_CREATED.clone()),
    ]
}
