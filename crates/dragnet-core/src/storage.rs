use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::{
    entity::{EntityRecord, EntityRef},
    enrich::RecordsByType,
    relationship::Relationship,
    Error, Result,
};

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    content_type TEXT,
    size_bytes INTEGER NOT NULL,
    processed_at TEXT NOT NULL,
    entity_count INTEGER NOT NULL,
    relationship_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS entity_records (
    entity_key TEXT NOT NULL,
    document_id TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    value TEXT NOT NULL,
    record TEXT NOT NULL,
    processed_at TEXT NOT NULL,
    PRIMARY KEY (entity_key, document_id)
);

CREATE INDEX IF NOT EXISTS idx_records_document ON entity_records(document_id);
CREATE INDEX IF NOT EXISTS idx_records_type ON entity_records(entity_type);

CREATE TABLE IF NOT EXISTS relationships (
    key TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    source_value TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_value TEXT NOT NULL,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS relationship_contexts (
    rel_key TEXT NOT NULL REFERENCES relationships(key) ON DELETE CASCADE,
    document_id TEXT NOT NULL,
    sentence_index INTEGER NOT NULL,
    sentiment REAL NOT NULL,
    observed_at TEXT NOT NULL,
    PRIMARY KEY (rel_key, document_id, sentence_index)
);

CREATE INDEX IF NOT EXISTS idx_contexts_document ON relationship_contexts(document_id);
CREATE INDEX IF NOT EXISTS idx_contexts_observed ON relationship_contexts(observed_at);
"#;

/// One processed document's ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub source: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub processed_at: DateTime<Utc>,
    pub entity_count: u32,
    pub relationship_count: u32,
}

/// A persisted per-document entity snapshot.
#[derive(Debug, Clone)]
pub struct StoredEntityRecord {
    pub entity_key: String,
    pub document_id: String,
    pub entity_ref: EntityRef,
    pub record: EntityRecord,
    pub processed_at: DateTime<Utc>,
}

/// An aggregated relationship read back from the corpus: strength is the
/// count of context facts inside the query window, sentiment their mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRelationship {
    pub key: String,
    pub source: EntityRef,
    pub target: EntityRef,
    pub strength: u32,
    pub sentiment: f64,
    pub first_seen: DateTime<Utc>,
}

pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn open(path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}?mode=rwc"))
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Persists one document's extraction output in a single transaction.
    ///
    /// The document's previous entity snapshots and context facts are
    /// cleared first, so re-processing overwrites rather than accumulates.
    /// Relationship endpoint rows merge commutatively (min first_seen, max
    /// last_seen) and each observed context becomes its own fact row, which
    /// lets concurrent writers for different documents interleave freely.
    pub async fn store_document(
        &self,
        document: &DocumentSummary,
        records: &RecordsByType,
        relationships: &[Relationship],
    ) -> Result<()> {
        let stamp = timestamp(document.processed_at);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entity_records WHERE document_id = ?")
            .bind(&document.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM relationship_contexts WHERE document_id = ?")
            .bind(&document.id)
            .execute(&mut *tx)
            .await?;

        for (&entity_type, list) in records {
            for record in list {
                let entity_ref = EntityRef::new(entity_type, &record.value);
                let record_json = serde_json::to_string(record)?;

                sqlx::query(
                    r#"
                    INSERT INTO entity_records (entity_key, document_id, entity_type, value, record, processed_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT(entity_key, document_id) DO UPDATE SET
                        record = excluded.record,
                        processed_at = excluded.processed_at
                    "#,
                )
                .bind(entity_ref.key())
                .bind(&document.id)
                .bind(entity_type.as_str())
                .bind(&record.value)
                .bind(record_json)
                .bind(&stamp)
                .execute(&mut *tx)
                .await?;
            }
        }

        for rel in relationships {
            let key = rel.key();

            sqlx::query(
                r#"
                INSERT INTO relationships (key, source_type, source_value, target_type, target_value, first_seen, last_seen)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    first_seen = min(first_seen, excluded.first_seen),
                    last_seen = max(last_seen, excluded.last_seen)
                "#,
            )
            .bind(&key)
            .bind(rel.source.entity_type.as_str())
            .bind(&rel.source.value)
            .bind(rel.target.entity_type.as_str())
            .bind(&rel.target.value)
            .bind(&stamp)
            .bind(&stamp)
            .execute(&mut *tx)
            .await?;

            for (&index, &sentiment) in &rel.contexts {
                let index = i64::try_from(index)
                    .map_err(|_| Error::CorruptRecord(format!("sentence index {index} overflows")))?;

                sqlx::query(
                    r#"
                    INSERT INTO relationship_contexts (rel_key, document_id, sentence_index, sentiment, observed_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(rel_key, document_id, sentence_index) DO UPDATE SET
                        sentiment = excluded.sentiment,
                        observed_at = excluded.observed_at
                    "#,
                )
                .bind(&key)
                .bind(&document.id)
                .bind(index)
                .bind(sentiment)
                .bind(&stamp)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO documents (id, source, content_type, size_bytes, processed_at, entity_count, relationship_count)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                source = excluded.source,
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                processed_at = excluded.processed_at,
                entity_count = excluded.entity_count,
                relationship_count = excluded.relationship_count
            "#,
        )
        .bind(&document.id)
        .bind(&document.source)
        .bind(&document.content_type)
        .bind(i64::try_from(document.size_bytes).unwrap_or(i64::MAX))
        .bind(&stamp)
        .bind(i64::from(document.entity_count))
        .bind(i64::from(document.relationship_count))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<DocumentSummary>> {
        let row: Option<(String, String, Option<String>, i64, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, source, content_type, size_bytes, processed_at, entity_count, relationship_count
            FROM documents WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_document_row).transpose()
    }

    pub async fn entity_records(&self, document_id: &str) -> Result<Vec<StoredEntityRecord>> {
        let rows: Vec<(String, String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT entity_key, document_id, entity_type, value, record, processed_at
            FROM entity_records WHERE document_id = ?
            ORDER BY entity_type, value
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_record_row).collect()
    }

    /// Aggregated relationships whose context facts fall inside the last
    /// `window_days`, keeping those with at least `min_strength` facts.
    /// Rows come back in corpus order: first observation, then key.
    pub async fn query_relationships(
        &self,
        window_days: i64,
        min_strength: u32,
    ) -> Result<Vec<StoredRelationship>> {
        let cutoff = timestamp(Utc::now() - chrono::Duration::days(window_days));

        let rows: Vec<(String, String, String, String, String, String, i64, f64)> = sqlx::query_as(
            r#"
            SELECT r.key, r.source_type, r.source_value, r.target_type, r.target_value,
                   r.first_seen, COUNT(c.sentence_index) AS strength, AVG(c.sentiment) AS sentiment
            FROM relationships r
            JOIN relationship_contexts c ON c.rel_key = r.key
            WHERE c.observed_at >= ?
            GROUP BY r.key
            HAVING COUNT(c.sentence_index) >= ?
            ORDER BY r.first_seen, r.key
            "#,
        )
        .bind(&cutoff)
        .bind(i64::from(min_strength))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_relationship_row).collect()
    }
}

/// Fixed-width UTC timestamp so lexicographic comparison in SQL matches
/// chronological order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("bad timestamp {raw}: {e}")))
}

fn parse_document_row(
    row: (String, String, Option<String>, i64, String, i64, i64),
) -> Result<DocumentSummary> {
    let (id, source, content_type, size_bytes, processed_at, entity_count, relationship_count) =
        row;

    Ok(DocumentSummary {
        id,
        source,
        content_type,
        size_bytes: u64::try_from(size_bytes).unwrap_or(0),
        processed_at: parse_timestamp(&processed_at)?,
        entity_count: u32::try_from(entity_count).unwrap_or(0),
        relationship_count: u32::try_from(relationship_count).unwrap_or(0),
    })
}

fn parse_record_row(
    row: (String, String, String, String, String, String),
) -> Result<StoredEntityRecord> {
    let (entity_key, document_id, entity_type, value, record_json, processed_at) = row;

    Ok(StoredEntityRecord {
        entity_key,
        document_id,
        entity_ref: EntityRef::new(entity_type.parse()?, value),
        record: serde_json::from_str(&record_json)?,
        processed_at: parse_timestamp(&processed_at)?,
    })
}

fn parse_relationship_row(
    row: (String, String, String, String, String, String, i64, f64),
) -> Result<StoredRelationship> {
    let (key, source_type, source_value, target_type, target_value, first_seen, strength, sentiment) =
        row;

    let strength = u32::try_from(strength)
        .map_err(|_| Error::CorruptRecord(format!("negative strength for {key}")))?;

    Ok(StoredRelationship {
        key,
        source: EntityRef::new(source_type.parse()?, source_value),
        target: EntityRef::new(target_type.parse()?, target_value),
        strength,
        sentiment,
        first_seen: parse_timestamp(&first_seen)?,
    })
}
