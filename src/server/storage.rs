//! SQLite persistence for the content server.
//!
//! The in-memory store is the live engine; this repository is its durable
//! shadow. Every mutation is written through here, and the server hydrates
//! the memory store from this table at startup. Row order (rowid) preserves
//! insertion order, which is the snapshot order consumers see.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::store::Document;

/// Initialize the database connection pool and run migrations
pub async fn init_db(db_path: Option<PathBuf>) -> Result<SqlitePool, sqlx::Error> {
    let path = db_path.expect("database path must be provided");

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create database directory");
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    collection: String,
    id: String,
    data: String,
}

pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a document's fields.
    pub async fn upsert(&self, collection: &str, doc: &Document) -> Result<(), sqlx::Error> {
        let data = serde_json::to_string(&doc.fields)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(collection, id)
            DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(&doc.id)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Loads every collection, documents in insertion order. Rows whose
    /// payload no longer parses are skipped with a warning rather than
    /// failing startup.
    pub async fn load_all(&self) -> Result<HashMap<String, Vec<Document>>, sqlx::Error> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT collection, id, data FROM documents ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        let mut collections: HashMap<String, Vec<Document>> = HashMap::new();
        for row in rows {
            match serde_json::from_str(&row.data) {
                Ok(fields) => {
                    collections
                        .entry(row.collection)
                        .or_default()
                        .push(Document::new(row.id, fields));
                }
                Err(e) => {
                    tracing::warn!(
                        collection = %row.collection,
                        id = %row.id,
                        "skipping unreadable persisted document: {}",
                        e
                    );
                }
            }
        }
        Ok(collections)
    }
}
