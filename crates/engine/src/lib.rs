// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Crate: engine                                                       ┃
// ┃ Purpose: Typed facade composing the index store and crawl pipeline  ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use common::AppConfig;
use crawl::{CrawlMode, CrawlPipeline, Phase, StatusBoard, StatusSnapshot};
use index::{make_snippet, DedupCache, DocMeta, IndexHealth, IndexStore, SearchHit, SearchPlan};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

/// One engine per index directory. Search runs concurrently with crawls;
/// direct writes go through `add_or_update` + `commit_and_refresh`.
pub struct Engine {
    store: Arc<IndexStore>,
    dedup: Arc<DedupCache>,
    status: Arc<StatusBoard>,
    pipeline: Arc<CrawlPipeline>,
    /// Hard bound on stored content per document, shared with the sampler.
    content_cap: u64,
    /// Writes staged through the facade, recorded in the dedup cache once
    /// a commit makes them visible.
    staged: Mutex<Vec<(String, i64, u64)>>,
}

impl Engine {
    /// Idempotent open-or-create of the index and its crawl bookkeeping.
    pub fn open(cfg: AppConfig) -> Result<Self> {
        let store =
            Arc::new(IndexStore::open_with_heap(&cfg.index.dir, cfg.index.writer_heap_bytes)?);
        let dedup = Arc::new(DedupCache::rebuild_from(&store)?);
        let status = Arc::new(StatusBoard::new(None));
        let pipeline = CrawlPipeline::new(
            Arc::clone(&store),
            Arc::clone(&dedup),
            Arc::clone(&status),
            cfg.crawl.clone(),
            cfg.sampling.clone(),
        );
        Ok(Self {
            store,
            dedup,
            status,
            pipeline,
            content_cap: cfg.sampling.max_bytes,
            staged: Mutex::new(Vec::new()),
        })
    }

    /// Dedup query: true when the observed identity differs from the last
    /// committed one. Unknown paths always reindex.
    pub fn should_reindex(&self, meta: &DocMeta) -> bool {
        self.dedup.needs_reindex(&meta.path, meta.mtime, meta.size)
    }

    /// Stage a document write. Invisible to searches until the next
    /// `commit_and_refresh`. Content past the configured cap is truncated
    /// at a character boundary.
    pub fn add_or_update(&self, meta: &DocMeta, content: Option<&str>) -> Result<()> {
        let content = content.map(|c| crawl::sample::truncate_utf8(c, self.content_cap));
        self.store.add_or_replace(meta, content)?;
        self.staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((meta.path.clone(), meta.mtime, meta.size));
        Ok(())
    }

    pub fn commit_and_refresh(&self) -> Result<()> {
        self.store.commit()?;
        for (path, mtime, size) in
            self.staged.lock().unwrap_or_else(|e| e.into_inner()).drain(..)
        {
            self.dedup.record(&path, mtime, size);
        }
        Ok(())
    }

    pub fn search(&self, plan: &SearchPlan) -> Result<Vec<SearchHit>> {
        self.store.search(plan)
    }

    /// Hits own their storage; dropping releases it. Provided so callers
    /// can release a result page explicitly.
    pub fn free_results(hits: Vec<SearchHit>) {
        drop(hits);
    }

    pub fn start_crawl(&self, roots: Vec<PathBuf>, mode: CrawlMode, phase: Phase) -> bool {
        self.pipeline.start(roots, mode, phase, false)
    }

    pub fn cancel_crawl(&self) {
        self.pipeline.cancel();
    }

    /// Block until the in-flight crawl (if any) reaches a terminal state.
    pub fn wait_for_crawl(&self) {
        self.pipeline.wait();
    }

    /// Wipe the index and start a full initial-phase crawl.
    pub fn reset_and_start(&self, roots: Vec<PathBuf>) -> Result<()> {
        self.pipeline.reset_and_start(roots)
    }

    pub fn request_incremental_if_needed(&self, roots: Vec<PathBuf>) {
        self.pipeline.request_incremental_if_needed(roots)
    }

    pub fn set_schedule_window(&self, enabled: bool) -> Result<()> {
        self.pipeline.set_schedule_window(enabled)
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn subscribe(&self) -> Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    pub fn cloud_placeholders(&self) -> HashSet<PathBuf> {
        self.status.placeholders()
    }

    pub fn health(&self) -> Result<IndexHealth> {
        self.store.health()
    }

    /// Short body excerpt around the first query term, for result display.
    pub fn snippet(&self, path: &str, q: &str) -> Result<Option<String>> {
        Ok(self.store.content_of(path)?.map(|content| make_snippet(&content, q)))
    }
}

//EOF
