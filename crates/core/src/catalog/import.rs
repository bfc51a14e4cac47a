//! CSV bulk import.
//!
//! Each data row becomes one item and is saved as soon as it is parsed. The
//! first bad row aborts the import; rows saved before it stay saved.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use super::normalize::{clean, TAG_SEPARATOR};
use super::{CatalogError, CatalogItem, ItemRequest, ItemStatus, ItemStore};
use crate::metrics;

/// Column positions resolved from a CSV header row.
///
/// Header names are matched case-insensitively and ignore `_`, `-` and
/// spaces, so `issue_number`, `IssueNumber` and `Issue Number` all resolve to
/// the same column. Two columns that resolve to the same name are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportColumns {
    pub title: usize,
    pub issue_number: usize,
    pub publisher: usize,
    pub series: Option<usize>,
    pub language: Option<usize>,
    pub condition: Option<usize>,
    pub location: Option<usize>,
    pub description: Option<usize>,
    pub image_url: Option<usize>,
    pub status: Option<usize>,
    pub tags: Option<usize>,
}

impl ImportColumns {
    /// Resolve column positions, failing if a required column is absent or
    /// a header name is repeated.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, String> {
        let keys: Vec<String> = headers.iter().map(header_key).collect();
        for (index, key) in keys.iter().enumerate() {
            if !key.is_empty() && keys[..index].contains(key) {
                return Err(format!(
                    "duplicate column '{}'",
                    headers.get(index).unwrap_or_default()
                ));
            }
        }
        let find = |name: &str| keys.iter().position(|key| key == name);
        let require = |label: &str| {
            find(&header_key(label)).ok_or_else(|| format!("missing required column '{}'", label))
        };

        Ok(Self {
            title: require("title")?,
            issue_number: require("issue_number")?,
            publisher: require("publisher")?,
            series: find("series"),
            language: find("language"),
            condition: find("condition"),
            location: find("location"),
            description: find("description"),
            image_url: find("imageurl"),
            status: find("status"),
            tags: find("tags"),
        })
    }

    /// Build the write payload for one data row.
    fn to_request(&self, record: &StringRecord) -> Result<ItemRequest, CatalogError> {
        let optional = |index: Option<usize>| index.and_then(|i| clean(record.get(i)));

        let status = ItemStatus::parse_or_default(optional(self.status).as_deref())?;
        let tags = optional(self.tags)
            .map(|raw| raw.split(TAG_SEPARATOR).map(str::to_string).collect())
            .unwrap_or_default();

        Ok(ItemRequest {
            title: required(record, self.title),
            series: optional(self.series),
            issue_number: required(record, self.issue_number),
            publisher: required(record, self.publisher),
            language: optional(self.language),
            condition: optional(self.condition),
            location: optional(self.location),
            description: optional(self.description),
            image_url: optional(self.image_url),
            status,
            tags,
        })
    }
}

/// Import every data row of a CSV stream into `store`.
///
/// The stream must be UTF-8 and start with a header row naming at least
/// `title`, `issue_number` and `publisher`. Returns the saved items in row
/// order. An unreadable stream or bad header fails before anything is saved;
/// a bad row fails with [`CatalogError::Import`] carrying its line number and
/// the count of rows already saved.
pub fn import_from<R: Read>(
    mut input: R,
    store: &dyn ItemStore,
    max_tags: usize,
) -> Result<Vec<CatalogItem>, CatalogError> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| rejected(0, 0, format!("unreadable input: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| rejected(0, 0, format!("input is not valid UTF-8: {}", e)))?;
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| rejected(0, 0, format!("unreadable header row: {}", e)))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(rejected(0, 0, "missing header row".to_string()));
    }
    let columns = ImportColumns::from_headers(&headers).map_err(|reason| rejected(1, 0, reason))?;
    debug!(?columns, "Resolved CSV columns");

    let mut imported = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            row_failed(line, imported.len(), e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let item = columns
            .to_request(&record)
            .and_then(|request| request.into_item(max_tags))
            .map_err(|e| row_failed(line, imported.len(), reason_of(e)))?;

        let saved = store.save(item)?;
        metrics::IMPORT_ROWS.inc();
        metrics::ITEMS_CREATED.with_label_values(&["import"]).inc();
        imported.push(saved);
    }

    info!(count = imported.len(), "CSV import complete");
    Ok(imported)
}

fn required(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

fn header_key(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn reason_of(error: CatalogError) -> String {
    match error {
        CatalogError::Validation(reason) => reason,
        other => other.to_string(),
    }
}

fn rejected(line: u64, imported: usize, reason: String) -> CatalogError {
    metrics::IMPORT_FAILURES.inc();
    warn!(line, reason = %reason, "CSV import rejected");
    CatalogError::Import {
        line,
        imported,
        reason,
    }
}

fn row_failed(line: u64, imported: usize, reason: String) -> CatalogError {
    metrics::IMPORT_FAILURES.inc();
    warn!(line, imported, reason = %reason, "CSV import stopped at bad row");
    CatalogError::Import {
        line,
        imported,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SqliteItemStore, DEFAULT_MAX_TAGS};

    fn store() -> SqliteItemStore {
        SqliteItemStore::in_memory().unwrap()
    }

    fn import(csv: &str, store: &SqliteItemStore) -> Result<Vec<CatalogItem>, CatalogError> {
        import_from(csv.as_bytes(), store, DEFAULT_MAX_TAGS)
    }

    #[test]
    fn test_imports_rows_in_order() {
        let store = store();
        let csv = "title,issue_number,publisher,status,tags\n\
                   Saga,1,Image,,\"space,family\"\n\
                   Watchmen,1,DC,WISHLIST,dc\n";
        let items = import(csv, &store).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Saga");
        assert_eq!(items[0].status, ItemStatus::Owned);
        assert_eq!(items[0].tags.as_slice(), &["space", "family"]);
        assert_eq!(items[1].status, ItemStatus::Wishlist);
        assert!(items.iter().all(|item| item.id.is_some()));
        assert_eq!(store.all().unwrap().len(), 2);
    }

    #[test]
    fn test_header_names_are_flexible() {
        let store = store();
        let csv = "Title,Issue Number,PUBLISHER,Image_Url\nSaga,1,Image,/files/a.png\n";
        let items = import(csv, &store).unwrap();
        assert_eq!(items[0].issue_number, "1");
        assert_eq!(items[0].image_url.as_deref(), Some("/files/a.png"));
    }

    #[test]
    fn test_optional_columns_may_be_missing_from_short_rows() {
        let store = store();
        let csv = "title,issue_number,publisher,series,location\nSaga,1,Image\n";
        let items = import(csv, &store).unwrap();
        assert_eq!(items[0].series, None);
        assert_eq!(items[0].location, None);
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let store = store();
        let csv = "title,issue_number,publisher,status\nSaga,1,Image,lent\n";
        let items = import(csv, &store).unwrap();
        assert_eq!(items[0].status, ItemStatus::Lent);
    }

    #[test]
    fn test_bad_status_aborts_and_keeps_earlier_rows() {
        let store = store();
        let csv = "title,issue_number,publisher,status\n\
                   Saga,1,Image,OWNED\n\
                   Watchmen,1,DC,BORROWED\n\
                   Maus,1,Pantheon,OWNED\n";
        let err = import(csv, &store).unwrap_err();

        match err {
            CatalogError::Import {
                line,
                imported,
                reason,
            } => {
                assert_eq!(line, 3);
                assert_eq!(imported, 1);
                assert!(reason.contains("BORROWED"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let titles: Vec<String> = store.all().unwrap().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Saga"]);
    }

    #[test]
    fn test_blank_required_field_aborts() {
        let store = store();
        let csv = "title,issue_number,publisher\n ,1,Image\n";
        let err = import(csv, &store).unwrap_err();
        assert!(matches!(err, CatalogError::Import { line: 2, imported: 0, .. }));
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_missing_required_column_fails_before_saving() {
        let store = store();
        let csv = "title,publisher\nSaga,Image\n";
        let err = import(csv, &store).unwrap_err();
        match err {
            CatalogError::Import { imported, reason, .. } => {
                assert_eq!(imported, 0);
                assert!(reason.contains("issue_number"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_header_fails_before_saving() {
        let store = store();
        let csv = "title,issue_number,publisher,Issue Number\nSaga,1,Image,2\n";
        let err = import(csv, &store).unwrap_err();
        match err {
            CatalogError::Import {
                line,
                imported,
                reason,
            } => {
                assert_eq!(line, 1);
                assert_eq!(imported, 0);
                assert!(reason.contains("duplicate column 'Issue Number'"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_blank_header_cells_are_not_duplicates() {
        let store = store();
        let csv = "title,issue_number,publisher,,\nSaga,1,Image,,\n";
        assert_eq!(import(csv, &store).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_stream_is_rejected() {
        let store = store();
        let err = import("", &store).unwrap_err();
        assert!(matches!(err, CatalogError::Import { line: 0, imported: 0, .. }));
    }

    #[test]
    fn test_header_only_imports_nothing() {
        let store = store();
        let items = import("title,issue_number,publisher\n", &store).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_invalid_utf8_saves_nothing() {
        let store = store();
        let mut bytes = b"title,issue_number,publisher\nSaga,1,Image\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b',', b'1', b',', b'X', b'\n']);
        let err = import_from(bytes.as_slice(), &store, DEFAULT_MAX_TAGS).unwrap_err();
        assert!(matches!(err, CatalogError::Import { line: 0, imported: 0, .. }));
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let store = store();
        let csv = "\u{feff}title,issue_number,publisher\nSaga,1,Image\n";
        assert_eq!(import(csv, &store).unwrap().len(), 1);
    }

    #[test]
    fn test_tags_are_capped() {
        let store = store();
        let tags: Vec<String> = (0..12).map(|i| format!("t{}", i)).collect();
        let csv = format!(
            "title,issue_number,publisher,tags\nSaga,1,Image,\"{}\"\n",
            tags.join(",")
        );
        let items = import(&csv, &store).unwrap();
        assert_eq!(items[0].tags.len(), DEFAULT_MAX_TAGS);
    }

    #[test]
    fn test_header_key() {
        assert_eq!(header_key("Issue_Number"), "issuenumber");
        assert_eq!(header_key("image-url"), "imageurl");
        assert_eq!(header_key("Image URL"), "imageurl");
    }
}
