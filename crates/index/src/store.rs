// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: store                                                       ┃
// ┃ Purpose: On-disk inverted index with commit/refresh discipline      ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use tantivy::collector::TopDocs;
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{info, warn};

use crate::query::{self, SearchHit, SearchPlan};
use crate::schema::{build_schema, DocFields, DocMeta};

pub const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHealth {
    pub docs: u64,
    pub segments: usize,
}

/// Persistent inverted index over file documents. One live document per
/// path; staged writes become visible only after `commit` returns.
pub struct IndexStore {
    dir: PathBuf,
    writer_heap: usize,
    inner: RwLock<Inner>,
}

struct Inner {
    _index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: DocFields,
}

impl Inner {
    fn open_dir(dir: &Path, writer_heap: usize) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let (schema, fields) = build_schema();
        let mmap_dir = tantivy::directory::MmapDirectory::open(dir)?;
        let index = match Index::open_or_create(mmap_dir, schema.clone()) {
            Ok(idx) => idx,
            Err(e) => {
                // Corrupt or schema-incompatible index: wipe and recreate.
                warn!(error=%e, dir=%dir.display(), "index open failed, recreating directory");
                fs::remove_dir_all(dir)?;
                fs::create_dir_all(dir)?;
                let mmap_dir = tantivy::directory::MmapDirectory::open(dir)?;
                Index::open_or_create(mmap_dir, schema)?
            }
        };
        Self::from_index(index, fields, writer_heap)
    }

    fn in_ram(writer_heap: usize) -> Result<Self> {
        let (schema, fields) = build_schema();
        Self::from_index(Index::create_in_ram(schema), fields, writer_heap)
    }

    fn from_index(index: Index, fields: DocFields, writer_heap: usize) -> Result<Self> {
        let writer = index.writer(writer_heap)?;
        // Manual reload: visibility flips exactly when commit() refreshes.
        let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
        Ok(Self { _index: index, reader, writer: Mutex::new(writer), fields })
    }
}

impl IndexStore {
    /// Open or create the index under `dir`. Idempotent across restarts; a
    /// corrupt directory is wiped and recreated with a warning.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_heap(dir, DEFAULT_WRITER_HEAP_BYTES)
    }

    pub fn open_with_heap(dir: &Path, writer_heap: usize) -> Result<Self> {
        let inner = Inner::open_dir(dir, writer_heap)?;
        info!(dir=%dir.display(), "index store opened");
        Ok(Self { dir: dir.to_path_buf(), writer_heap, inner: RwLock::new(inner) })
    }

    fn inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn writer<'a>(inner: &'a Inner) -> MutexGuard<'a, IndexWriter> {
        inner.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stage a write superseding any prior document with the same path.
    /// Not visible to searches until `commit` returns.
    pub fn add_or_replace(&self, meta: &DocMeta, content: Option<&str>) -> Result<()> {
        let inner = self.inner();
        let writer = Self::writer(&inner);
        writer.delete_term(Term::from_field_text(inner.fields.path, &meta.path));
        let mut doc = TantivyDocument::default();
        doc.add_text(inner.fields.path, &meta.path);
        doc.add_text(inner.fields.name_tok, &meta.name);
        doc.add_text(inner.fields.name_raw, meta.name.to_lowercase());
        if let Some(ext) = &meta.ext {
            doc.add_text(inner.fields.ext, ext);
        }
        if let Some(content) = content {
            doc.add_text(inner.fields.content, content);
        }
        doc.add_i64(inner.fields.mtime, meta.mtime);
        doc.add_u64(inner.fields.size, meta.size);
        doc.add_u64(inner.fields.inode, meta.inode);
        doc.add_u64(inner.fields.dev, meta.dev);
        writer.add_document(doc)?;
        Ok(())
    }

    /// Flush staged writes into an on-disk segment and refresh the reader so
    /// subsequent searches see them. On failure the prior visible state is
    /// untouched and staged writes stay in the writer.
    pub fn commit(&self) -> Result<()> {
        let inner = self.inner();
        {
            let mut writer = Self::writer(&inner);
            writer.commit()?;
        }
        inner.reader.reload()?;
        Ok(())
    }

    /// Run a plan against the currently visible reader snapshot. Never
    /// blocks writes.
    pub fn search(&self, plan: &SearchPlan) -> Result<Vec<SearchHit>> {
        let inner = self.inner();
        let searcher = inner.reader.searcher();
        query::execute(&searcher, &inner.fields, plan)
    }

    /// Drop reader and writer, delete the on-disk index, reinitialize empty.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        // Swap in a RAM-backed placeholder first so the on-disk writer lock
        // is released before the directory goes away.
        let placeholder = Inner::in_ram(self.writer_heap)?;
        drop(std::mem::replace(&mut *inner, placeholder));
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        *inner = Inner::open_dir(&self.dir, self.writer_heap)?;
        info!(dir=%self.dir.display(), "index store reset");
        Ok(())
    }

    /// Lightweight health info over the visible snapshot.
    pub fn health(&self) -> Result<IndexHealth> {
        let inner = self.inner();
        let searcher = inner.reader.searcher();
        Ok(IndexHealth { docs: searcher.num_docs(), segments: searcher.segment_readers().len() })
    }

    /// Stored content for one path, when the document carries any.
    pub fn content_of(&self, path: &str) -> Result<Option<String>> {
        let inner = self.inner();
        let searcher = inner.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(inner.fields.path, path),
            IndexRecordOption::Basic,
        );
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        for (_score, addr) in top {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let content = doc
                .get_first(inner.fields.content)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            return Ok(content);
        }
        Ok(None)
    }

    /// Walk every live document's stored identity triple. Used to rebuild
    /// the dedup cache at startup.
    pub fn for_each_meta<F: FnMut(&str, i64, u64)>(&self, mut f: F) -> Result<()> {
        let inner = self.inner();
        let searcher = inner.reader.searcher();
        for segment in searcher.segment_readers() {
            let store = segment.get_store_reader(1)?;
            for doc in store.iter::<TantivyDocument>(segment.alive_bitset()) {
                let doc = doc?;
                let Some(path) = doc.get_first(inner.fields.path).and_then(|v| v.as_str()) else {
                    continue;
                };
                let mtime = doc.get_first(inner.fields.mtime).and_then(|v| v.as_i64()).unwrap_or(0);
                let size = doc.get_first(inner.fields.size).and_then(|v| v.as_u64()).unwrap_or(0);
                f(path, mtime, size);
            }
        }
        Ok(())
    }
}

//EOF
