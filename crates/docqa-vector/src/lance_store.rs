//! `VectorIndex` over an embedded LanceDB table.
//!
//! The vector column is a FixedSizeList, so the dimension is fixed when the
//! table is created and a batch of another length is rejected up front. Rows
//! carry a `seq` column because scan order is not insertion order once
//! fragments have been rewritten. `replace_document` is one `merge_insert`
//! commit, so readers never see the document half-replaced.

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, Table};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorIndex;
use docqa_core::types::{summarize, validate_batch, DocumentSummary, IndexedVector, NewVector};

use crate::schema::{build_arrow_schema, vector_dimension, SCHEMA_VERSION};
use crate::table::{escape, open_db, open_table, record_table_meta, recorded_schema_version};

pub struct LanceVectorIndex {
    rt: Runtime,
    db: Connection,
    table_name: String,
    write_lock: Mutex<()>,
}

impl LanceVectorIndex {
    pub fn open(db_path: &Path, table_name: &str) -> Result<Self> {
        let rt = Runtime::new().map_err(|e| Error::storage("start runtime", e))?;
        let db = rt.block_on(open_db(db_path.to_string_lossy().as_ref()))?;
        if let Some(v) = rt.block_on(recorded_schema_version(&db, table_name))? {
            if v > SCHEMA_VERSION {
                return Err(Error::storage("open table", format!("unsupported schema version {} (max {})", v, SCHEMA_VERSION)));
            }
        }
        Ok(Self { rt, db, table_name: table_name.to_string(), write_lock: Mutex::new(()) })
    }

    async fn table(&self) -> Result<Option<Table>> { open_table(&self.db, &self.table_name).await }

    async fn table_dimension(table: &Table) -> Result<Option<usize>> {
        let schema = table.schema().await.map_err(|e| Error::storage("read schema", e))?;
        Ok(vector_dimension(&schema))
    }

    async fn next_seq(table: &Table) -> Result<i64> {
        let mut max = -1i64;
        let mut stream = table
            .query()
            .select(Select::columns(&["seq"]))
            .execute()
            .await
            .map_err(|e| Error::storage("scan seq", e))?;
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await.map_err(|e| Error::storage("scan seq", e))? {
            let seq = column::<Int64Array>(&batch, "seq")?;
            for i in 0..batch.num_rows() { max = max.max(seq.value(i)); }
        }
        Ok(max + 1)
    }

    async fn scan(&self, filter: Option<String>) -> Result<Vec<IndexedVector>> {
        let Some(table) = self.table().await? else { return Ok(Vec::new()) };
        let mut query = table.query();
        if let Some(filter) = filter { query = query.only_if(filter); }
        let mut stream = query.execute().await.map_err(|e| Error::storage("scan", e))?;
        let mut rows: Vec<(i64, IndexedVector)> = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await.map_err(|e| Error::storage("scan", e))? {
            let doc_ids = column::<StringArray>(&batch, "doc_id")?;
            let positions = column::<Int32Array>(&batch, "position")?;
            let contents = column::<StringArray>(&batch, "content")?;
            let seqs = column::<Int64Array>(&batch, "seq")?;
            let vectors = column::<FixedSizeListArray>(&batch, "vector")?;
            for i in 0..batch.num_rows() {
                let embedding = vectors.value(i).as_primitive::<Float32Type>().values().to_vec();
                rows.push((
                    seqs.value(i),
                    IndexedVector {
                        document_id: doc_ids.value(i).to_string(),
                        position: usize::try_from(positions.value(i)).unwrap_or_default(),
                        text: contents.value(i).to_string(),
                        embedding,
                    },
                ));
            }
        }
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, v)| v).collect())
    }

    async fn create(&self, document_id: &str, vectors: &[NewVector], dim: usize) -> Result<()> {
        let batch = to_record_batch(document_id, vectors, dim, 0)?;
        let dim_i32 = i32::try_from(dim).map_err(|_| Error::InvalidArgument(format!("dimension {} too large", dim)))?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        self.db
            .create_table(&self.table_name, reader)
            .execute()
            .await
            .map_err(|e| Error::storage("create table", e))?;
        record_table_meta(&self.db, &self.table_name, SCHEMA_VERSION, dim_i32).await?;
        tracing::debug!(table = %self.table_name, dim, "created vector table");
        Ok(())
    }

    async fn insert_async(&self, document_id: &str, vectors: &[NewVector]) -> Result<()> {
        let Some(table) = self.table().await? else {
            let dim = validate_batch(document_id, vectors, None)?.unwrap_or_default();
            return self.create(document_id, vectors, dim).await;
        };
        let dim = validate_batch(document_id, vectors, Self::table_dimension(&table).await?)?.unwrap_or_default();
        let batch = to_record_batch(document_id, vectors, dim, Self::next_seq(&table).await?)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        table.add(reader).execute().await.map_err(|e| Error::storage("append", e))?;
        Ok(())
    }

    async fn replace_async(&self, document_id: &str, vectors: &[NewVector]) -> Result<usize> {
        let filter = format!("doc_id = '{}'", escape(document_id));
        let Some(table) = self.table().await? else {
            if vectors.is_empty() { return Ok(0); }
            let dim = validate_batch(document_id, vectors, None)?.unwrap_or_default();
            self.create(document_id, vectors, dim).await?;
            return Ok(0);
        };
        let removed = table.count_rows(Some(filter.clone())).await.map_err(|e| Error::storage("count rows", e))?;
        if vectors.is_empty() {
            if removed > 0 { table.delete(&filter).await.map_err(|e| Error::storage("delete", e))?; }
            return Ok(removed);
        }
        let dim = validate_batch(document_id, vectors, Self::table_dimension(&table).await?)?.unwrap_or_default();
        let batch = to_record_batch(document_id, vectors, dim, Self::next_seq(&table).await?)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None)
            .when_not_matched_insert_all()
            .when_not_matched_by_source_delete(Some(filter));
        mi.execute(reader).await.map_err(|e| Error::storage("merge insert", e))?;
        Ok(removed)
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::storage("decode", format!("column '{}' missing or mistyped", name)))
}

fn to_record_batch(document_id: &str, docs: &[NewVector], dim: usize, first_seq: i64) -> Result<RecordBatch> {
    let dim_i32 = i32::try_from(dim).map_err(|_| Error::InvalidArgument(format!("dimension {} too large", dim)))?;
    let schema = build_arrow_schema(dim_i32);
    let mut ids = Vec::new(); let mut doc_ids = Vec::new(); let mut positions = Vec::new(); let mut contents = Vec::new(); let mut seqs = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
    for (i, doc) in docs.iter().enumerate() {
        let position = i32::try_from(doc.position).map_err(|_| Error::InvalidArgument(format!("position {} too large", doc.position)))?;
        ids.push(format!("{}:{}", document_id, doc.position)); doc_ids.push(document_id.to_string()); positions.push(position); contents.push(doc.text.clone()); seqs.push(first_seq + i as i64); vectors.push(Some(doc.embedding.iter().map(|&x| Some(x)).collect()));
    }
    RecordBatch::try_new(schema, vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(doc_ids)),
        Arc::new(Int32Array::from(positions)),
        Arc::new(StringArray::from(contents)),
        Arc::new(Int64Array::from(seqs)),
        Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), dim_i32)),
    ])
    .map_err(|e| Error::storage("encode batch", e))
}

impl VectorIndex for LanceVectorIndex {
    fn insert(&self, document_id: &str, vectors: &[NewVector]) -> Result<()> {
        if vectors.is_empty() { return Ok(()); }
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.rt.block_on(self.insert_async(document_id, vectors))?;
        tracing::debug!(document_id, inserted = vectors.len(), "inserted vectors");
        Ok(())
    }

    fn delete_by_document(&self, document_id: &str) -> Result<usize> { self.replace_document(document_id, &[]) }

    fn replace_document(&self, document_id: &str, vectors: &[NewVector]) -> Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let removed = self.rt.block_on(self.replace_async(document_id, vectors))?;
        tracing::debug!(document_id, removed, inserted = vectors.len(), "replaced document vectors");
        Ok(removed)
    }

    fn get_by_document(&self, document_id: &str) -> Result<Vec<IndexedVector>> {
        self.rt.block_on(self.scan(Some(format!("doc_id = '{}'", escape(document_id)))))
    }

    fn get_all(&self) -> Result<Vec<IndexedVector>> { self.rt.block_on(self.scan(None)) }

    fn documents(&self) -> Result<Vec<DocumentSummary>> { Ok(summarize(&self.get_all()?)) }

    /// The dimension fixed at table creation; it outlives the table's rows.
    fn dimension(&self) -> Result<Option<usize>> {
        self.rt.block_on(async {
            match self.table().await? {
                Some(table) => Self::table_dimension(&table).await,
                None => Ok(None),
            }
        })
    }
}
