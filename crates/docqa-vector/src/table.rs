//! LanceDB connection helpers and the `meta` table.
//!
//! `meta` holds one row per vector table: the schema version it was written
//! with, its fixed embedding dimension and when that was recorded.
use arrow_array::{Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

use docqa_core::error::{Error, Result};

pub const META_TABLE: &str = "meta";

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(|e| Error::storage("connect", e))
}

/// Open `name` if it exists. A missing table is an empty index, not an error.
pub async fn open_table(conn: &Connection, name: &str) -> Result<Option<Table>> {
    let names = conn.table_names().execute().await.map_err(|e| Error::storage("list tables", e))?;
    if !names.iter().any(|n| n == name) { return Ok(None); }
    let table = conn.open_table(name).execute().await.map_err(|e| Error::storage("open table", e))?;
    Ok(Some(table))
}

fn meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("table_name", DataType::Utf8, false),
        Field::new("schema_version", DataType::Int32, false),
        Field::new("dimension", DataType::Int32, false),
        Field::new("recorded_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}

async fn meta_table(conn: &Connection) -> Result<Table> {
    if let Some(t) = open_table(conn, META_TABLE).await? { return Ok(t); }
    let schema = meta_schema();
    let empty = RecordBatchIterator::new(Vec::new().into_iter(), schema);
    conn.create_table(META_TABLE, Box::new(empty)).execute().await.map_err(|e| Error::storage("create meta table", e))
}

/// Upsert the meta row of `table_name`.
pub async fn record_table_meta(conn: &Connection, table_name: &str, schema_version: u32, dim: i32) -> Result<()> {
    let version = i32::try_from(schema_version).map_err(|e| Error::storage("write meta", e))?;
    let row = RecordBatch::try_new(
        meta_schema(),
        vec![
            Arc::new(StringArray::from(vec![table_name])),
            Arc::new(Int32Array::from(vec![version])),
            Arc::new(Int32Array::from(vec![dim])),
            Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
        ],
    )
    .map_err(|e| Error::storage("encode meta", e))?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(row)].into_iter(), meta_schema()));
    let meta = meta_table(conn).await?;
    let mut upsert = meta.merge_insert(&["table_name"]);
    upsert.when_matched_update_all(None).when_not_matched_insert_all();
    upsert.execute(reader).await.map_err(|e| Error::storage("write meta", e))?;
    Ok(())
}

/// Schema version recorded for `table_name`, if any.
pub async fn recorded_schema_version(conn: &Connection, table_name: &str) -> Result<Option<u32>> {
    let Some(meta) = open_table(conn, META_TABLE).await? else { return Ok(None) };
    let mut stream = meta
        .query()
        .only_if(format!("table_name = '{}'", escape(table_name)))
        .execute()
        .await
        .map_err(|e| Error::storage("read meta", e))?;
    while let Some(batch) = stream.try_next().await.map_err(|e| Error::storage("read meta", e))? {
        let Some(versions) = batch.column_by_name("schema_version").and_then(|c| c.as_any().downcast_ref::<Int32Array>()) else {
            return Err(Error::storage("read meta", "meta.schema_version column missing"));
        };
        if let Some(v) = versions.iter().flatten().next() {
            return Ok(u32::try_from(v).ok());
        }
    }
    Ok(None)
}

/// Quote a string literal for a Lance SQL filter.
pub fn escape(s: &str) -> String { s.replace('\'', "''") }
