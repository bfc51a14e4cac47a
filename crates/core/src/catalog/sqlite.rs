//! SQLite-backed item store implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::{CatalogError, CatalogItem, ItemStatus, ItemStore, TagSet};

/// SQLite-backed item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

const ITEM_COLUMNS: &str = "id, title, series, issue_number, publisher, language, condition_label,
     location, description, image_url, status, created_at, updated_at";

impl SqliteItemStore {
    /// Create a new SQLite item store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        // The user store holds a second connection to the same file
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite item store (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                series TEXT,
                issue_number TEXT NOT NULL,
                publisher TEXT NOT NULL,
                language TEXT,
                condition_label TEXT,
                location TEXT,
                description TEXT,
                image_url TEXT,
                status TEXT NOT NULL DEFAULT 'OWNED',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);

            -- Tags keep their insertion order through `position`
            CREATE TABLE IF NOT EXISTS item_tags (
                item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (item_id, tag)
            );

            CREATE INDEX IF NOT EXISTS idx_item_tags_item ON item_tags(item_id, position);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn load_tags(conn: &Connection, item_id: i64) -> Result<TagSet, CatalogError> {
        let mut stmt = conn
            .prepare("SELECT tag FROM item_tags WHERE item_id = ? ORDER BY position")
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![item_id], |row| row.get::<_, String>(0))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        // Stored tags are already normalized and capped
        Ok(TagSet::from_raw(tags, usize::MAX))
    }

    fn write_tags(conn: &Connection, item_id: i64, tags: &TagSet) -> Result<(), CatalogError> {
        conn.execute("DELETE FROM item_tags WHERE item_id = ?", params![item_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        for (position, tag) in tags.iter().enumerate() {
            conn.execute(
                "INSERT INTO item_tags (item_id, position, tag) VALUES (?, ?, ?)",
                params![item_id, position as i64, tag],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Convert a row to CatalogItem (without tags).
    ///
    /// Unparseable status or timestamp columns fail the read.
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<CatalogItem> {
        let status_str: String = row.get(10)?;
        let created_at_str: String = row.get(11)?;
        let updated_at_str: String = row.get(12)?;

        let status = status_str
            .parse::<ItemStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;
        let created_at = parse_timestamp(11, &created_at_str)?;
        let updated_at = parse_timestamp(12, &updated_at_str)?;

        Ok(CatalogItem {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            series: row.get(2)?,
            issue_number: row.get(3)?,
            publisher: row.get(4)?,
            language: row.get(5)?,
            condition: row.get(6)?,
            location: row.get(7)?,
            description: row.get(8)?,
            image_url: row.get(9)?,
            status,
            tags: TagSet::new(), // Loaded separately
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl ItemStore for SqliteItemStore {
    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS),
            params![id],
            Self::row_to_item,
        );

        match result {
            Ok(mut item) => {
                item.tags = Self::load_tags(&conn, id)?;
                Ok(Some(item))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn save(&self, mut item: CatalogItem) -> Result<CatalogItem, CatalogError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let id = match item.id {
            Some(id) => {
                let rows_affected = tx
                    .execute(
                        "UPDATE items SET title = ?, series = ?, issue_number = ?, publisher = ?,
                            language = ?, condition_label = ?, location = ?, description = ?,
                            image_url = ?, status = ?, updated_at = ?
                         WHERE id = ?",
                        params![
                            &item.title,
                            &item.series,
                            &item.issue_number,
                            &item.publisher,
                            &item.language,
                            &item.condition,
                            &item.location,
                            &item.description,
                            &item.image_url,
                            item.status.as_str(),
                            item.updated_at.to_rfc3339(),
                            id,
                        ],
                    )
                    .map_err(|e| CatalogError::Database(e.to_string()))?;

                if rows_affected == 0 {
                    return Err(CatalogError::NotFound(id));
                }
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO items (title, series, issue_number, publisher, language,
                        condition_label, location, description, image_url, status,
                        created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        &item.title,
                        &item.series,
                        &item.issue_number,
                        &item.publisher,
                        &item.language,
                        &item.condition,
                        &item.location,
                        &item.description,
                        &item.image_url,
                        item.status.as_str(),
                        item.created_at.to_rfc3339(),
                        item.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| CatalogError::Database(e.to_string()))?;
                tx.last_insert_rowid()
            }
        };

        Self::write_tags(&tx, id, &item.tags)?;
        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        item.id = Some(id);
        Ok(item)
    }

    fn delete(&self, id: i64) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        // Cascades to item_tags
        let rows_affected = conn
            .execute("DELETE FROM items WHERE id = ?", params![id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(CatalogError::NotFound(id));
        }

        Ok(())
    }

    fn exists(&self, id: i64) -> Result<bool, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let found = conn
            .query_row("SELECT 1 FROM items WHERE id = ?", params![id], |_| Ok(()))
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    fn all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_item)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let mut item = row.map_err(|e| CatalogError::Database(e.to_string()))?;
            if let Some(id) = item.id {
                item.tags = Self::load_tags(&conn, id)?;
            }
            items.push(item);
        }

        Ok(items)
    }
}
