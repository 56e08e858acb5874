// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: pipeline                                                    ┃
// ┃ Purpose: Crawl worker driving dedup, sampling, and commits          ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use common::{CrawlSettings, SamplingSettings};
use index::{DedupCache, DocMeta, IndexStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::bucket::{unix_now, Recency};
use crate::sample;
use crate::sched::{self, OneShotTimer};
use crate::state::{CrawlState, StateFile};
use crate::status::{Phase, StatusBoard};
use crate::walk::{self, FileEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Skip files at or before the last completed crawl stamp.
    Incremental,
    /// Reindex every bucket, with per-root resume across interruptions.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

const INITIAL_BUCKETS: &[Recency] = &[Recency::Days90];
const BACKGROUND_BUCKETS: &[Recency] = &[Recency::Days180, Recency::Days365, Recency::Older];

/// Identity triples staged since the last successful commit. Recorded into
/// the dedup cache only once the commit makes them visible.
struct CommitCtx {
    pending: Vec<(String, i64, u64)>,
    last_commit: Instant,
    since_commit: usize,
}

impl CommitCtx {
    fn new() -> Self {
        Self { pending: Vec::new(), last_commit: Instant::now(), since_commit: 0 }
    }
}

/// Owns the single crawl worker slot, cancellation, phasing, bucketing,
/// and commit cadence. Queries run against the store concurrently; the
/// writer's heap budget provides the backpressure on staged documents.
pub struct CrawlPipeline {
    store: Arc<IndexStore>,
    dedup: Arc<DedupCache>,
    status: Arc<StatusBoard>,
    settings: CrawlSettings,
    sampling: SamplingSettings,
    state_file: StateFile,
    state: Mutex<CrawlState>,
    cancel_requested: AtomicBool,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    last_attempt: Mutex<Option<Instant>>,
    deferred: Mutex<Option<OneShotTimer>>,
    ingests: AtomicU64,
}

impl CrawlPipeline {
    pub fn new(
        store: Arc<IndexStore>,
        dedup: Arc<DedupCache>,
        status: Arc<StatusBoard>,
        settings: CrawlSettings,
        sampling: SamplingSettings,
    ) -> Arc<Self> {
        let state_file = StateFile::new(&settings.state_file);
        let state = if state_file.exists() {
            state_file.load()
        } else {
            CrawlState { schedule_window_enabled: settings.schedule_window_enabled, ..Default::default() }
        };
        status.update(|s| s.last_completed_at = state.last_completed_at);
        Arc::new(Self {
            store,
            dedup,
            status,
            settings,
            sampling,
            state_file,
            state: Mutex::new(state),
            cancel_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
            last_attempt: Mutex::new(None),
            deferred: Mutex::new(None),
            ingests: AtomicU64::new(0),
        })
    }

    /// Begin a crawl on a worker thread. Returns false when one is already
    /// in progress; initial and background serialize through this slot.
    pub fn start(self: &Arc<Self>, roots: Vec<PathBuf>, mode: CrawlMode, phase: Phase, scheduled: bool) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("crawl already running, start ignored");
            return false;
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        *self.last_attempt.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        let this = Arc::clone(self);
        let handle = thread::spawn(move || this.run_worker(roots, mode, phase, scheduled));
        let mut guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.replace(handle) {
            let _ = old.join();
        }
        true
    }

    /// Cooperative halt: checked at enumeration steps, before each ingest,
    /// and at commit checkpoints. Also clears any deferred start.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.clear_deferred();
    }

    /// Block until the current worker (if any) has finished.
    pub fn wait(&self) {
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Wipe the index and start over with a full initial-phase crawl.
    pub fn reset_and_start(self: &Arc<Self>, roots: Vec<PathBuf>) -> Result<()> {
        self.cancel();
        self.wait();
        self.store.reset()?;
        self.dedup.forget_all();
        {
            let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
            st.last_completed_at = None;
            st.bucket_progress.clear();
            if let Err(e) = self.state_file.save(&st) {
                warn!(error=?e, "could not persist crawl state");
            }
        }
        self.status.update(|s| {
            s.files_indexed = 0;
            s.last_completed_at = None;
        });
        self.start(roots, CrawlMode::Full, Phase::Initial, false);
        Ok(())
    }

    /// Rate-limited auto trigger used on shell state changes. Suppressed
    /// while a crawl runs or within the minimum interval; outside the
    /// night window (when enabled) it arms a one-shot timer instead.
    pub fn request_incremental_if_needed(self: &Arc<Self>, roots: Vec<PathBuf>) {
        if self.running.load(Ordering::SeqCst) {
            debug!("crawl in progress, auto trigger suppressed");
            return;
        }
        {
            let mut last = self.last_attempt.lock().unwrap_or_else(|e| e.into_inner());
            let min = Duration::from_secs(self.settings.auto_incremental_min_interval_s);
            if let Some(at) = *last {
                if at.elapsed() < min {
                    debug!("auto trigger rate-limited");
                    return;
                }
            }
            *last = Some(Instant::now());
        }

        let window_enabled =
            self.state.lock().unwrap_or_else(|e| e.into_inner()).schedule_window_enabled;
        let now = sched::local_now();
        if window_enabled && !sched::in_window(now) {
            let mut deferred = self.deferred.lock().unwrap_or_else(|e| e.into_inner());
            if deferred.is_some() {
                debug!("deferred crawl already armed");
                return;
            }
            let target = sched::next_window_start(now);
            let delay = sched::delay_until(target, now);
            info!(delay_s = delay.as_secs(), "deferring incremental crawl to the night window");
            let weak = Arc::downgrade(self);
            *deferred = Some(OneShotTimer::arm(delay, move || {
                if let Some(pipeline) = weak.upgrade() {
                    pipeline.deferred.lock().unwrap_or_else(|e| e.into_inner()).take();
                    pipeline.start(roots, CrawlMode::Incremental, Phase::Initial, true);
                }
            }));
        } else {
            self.start(roots, CrawlMode::Incremental, Phase::Initial, false);
        }
    }

    pub fn clear_deferred(&self) {
        let timer = self.deferred.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(mut timer) = timer {
            timer.clear();
        }
    }

    /// Persisted preference controlling the night-window deferral.
    pub fn set_schedule_window(&self, enabled: bool) -> Result<()> {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.schedule_window_enabled = enabled;
        self.state_file.save(&st)?;
        drop(st);
        if !enabled {
            self.clear_deferred();
        }
        Ok(())
    }

    pub fn last_completed_at(&self) -> Option<i64> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).last_completed_at
    }

    /// Total add-or-replace submissions across the pipeline's lifetime.
    pub fn ingest_count(&self) -> u64 {
        self.ingests.load(Ordering::Relaxed)
    }

    fn cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::Relaxed)
    }

    fn run_worker(self: Arc<Self>, roots: Vec<PathBuf>, mode: CrawlMode, phase: Phase, scheduled: bool) {
        info!(?mode, ?phase, scheduled, roots = roots.len(), "crawl starting");
        self.status.update(|s| {
            s.is_running = true;
            s.phase = Some(phase);
            s.files_indexed = 0;
            s.status_text =
                if scheduled { "scheduled crawl starting".into() } else { "crawl starting".into() };
        });

        let mut outcome = self.run_phase(&roots, mode, phase);
        if phase == Phase::Initial && matches!(outcome, Ok(Outcome::Completed)) {
            // Successful initial phases chain straight into background.
            self.status.update(|s| {
                s.phase = Some(Phase::Background);
                s.status_text = "background phase starting".into();
            });
            outcome = self.run_phase(&roots, mode, Phase::Background);
        }

        match outcome {
            Ok(Outcome::Completed) => {
                let now = unix_now();
                {
                    let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    st.last_completed_at = Some(now);
                    if let Err(e) = self.state_file.save(&st) {
                        warn!(error=?e, "could not persist crawl state");
                    }
                }
                self.status.update(|s| {
                    s.is_running = false;
                    s.phase = None;
                    s.status_text = "complete".into();
                    s.last_completed_at = Some(now);
                });
                info!("crawl complete");
            }
            Ok(Outcome::Cancelled) => {
                self.status.update(|s| {
                    s.is_running = false;
                    s.phase = None;
                    s.status_text = "cancelled".into();
                });
                info!("crawl cancelled");
            }
            Err(e) => {
                warn!(error=?e, "crawl aborted");
                self.status.update(|s| {
                    s.is_running = false;
                    s.phase = None;
                    s.status_text = format!("error: {e}");
                });
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn run_phase(&self, roots: &[PathBuf], mode: CrawlMode, phase: Phase) -> Result<Outcome> {
        let since = match mode {
            CrawlMode::Incremental => {
                self.state.lock().unwrap_or_else(|e| e.into_inner()).last_completed_at
            }
            CrawlMode::Full => None,
        };
        let now = unix_now();
        let cap = matches!(phase, Phase::Initial)
            .then_some(self.settings.initial_phase_enumeration_cap);
        let phase_buckets = match phase {
            Phase::Initial => INITIAL_BUCKETS,
            Phase::Background => BACKGROUND_BUCKETS,
        };
        let commit_every = Duration::from_secs(match phase {
            Phase::Initial => self.settings.initial_commit_interval_s,
            Phase::Background => self.settings.background_commit_interval_s,
        });
        let batch_cap = match phase {
            Phase::Initial => self.settings.initial_commit_batch,
            Phase::Background => usize::MAX,
        };

        let mut ctx = CommitCtx::new();
        for root in walk::order_roots(roots) {
            if self.cancelled() {
                break;
            }
            let root_key = root.to_string_lossy().to_string();
            self.status.update(|s| s.status_text = format!("scanning {}", root.display()));
            let entries = match walk::enumerate(&root, cap, &self.cancel_requested) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(root=%root.display(), error=%e, "root unavailable, skipping");
                    continue;
                }
            };

            let mut buckets: [Vec<FileEntry>; Recency::COUNT] = std::array::from_fn(|_| Vec::new());
            for entry in entries {
                buckets[Recency::of(now, entry.mtime).index()].push(entry);
            }

            // Only the background phase ever persists bucket progress, so
            // only it may resume from it. The initial bucket always re-runs;
            // the dedup cache keeps that re-pass cheap.
            let resume_at = match (mode, phase) {
                (CrawlMode::Full, Phase::Background) => self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .bucket_progress
                    .get(&root_key)
                    .copied()
                    .unwrap_or(0),
                _ => 0,
            };

            for &bucket in phase_buckets {
                if bucket.index() < resume_at {
                    debug!(root=%root.display(), bucket = bucket.label(), "bucket already done, resuming past it");
                    continue;
                }
                self.status.update(|s| {
                    s.status_text = format!("indexing {} ({})", root.display(), bucket.label())
                });
                for entry in &buckets[bucket.index()] {
                    if self.cancelled() {
                        self.commit_progress(&mut ctx);
                        return Ok(Outcome::Cancelled);
                    }
                    match self.ingest_file(entry, since) {
                        Ok(true) => {
                            ctx.since_commit += 1;
                            ctx.pending.push((
                                entry.path.to_string_lossy().to_string(),
                                entry.mtime,
                                entry.size,
                            ));
                        }
                        Ok(false) => {}
                        Err(e) => {
                            debug!(path=%entry.path.display(), error=%e, "file skipped");
                        }
                    }
                    if ctx.last_commit.elapsed() >= commit_every || ctx.since_commit >= batch_cap {
                        self.commit_progress(&mut ctx);
                    }
                }
                // Bucket boundary: results appear progressively.
                self.commit_progress(&mut ctx);
                if mode == CrawlMode::Full && phase == Phase::Background {
                    let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    st.bucket_progress.insert(root_key.clone(), bucket.index() + 1);
                    if let Err(e) = self.state_file.save(&st) {
                        warn!(error=?e, "could not persist bucket progress");
                    }
                }
            }

            if mode == CrawlMode::Full && phase == Phase::Background && !self.cancelled() {
                let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
                st.bucket_progress.remove(&root_key);
                if let Err(e) = self.state_file.save(&st) {
                    warn!(error=?e, "could not persist bucket progress");
                }
            }
        }

        self.commit_progress(&mut ctx);
        if self.cancelled() {
            Ok(Outcome::Cancelled)
        } else {
            Ok(Outcome::Completed)
        }
    }

    fn ingest_file(&self, entry: &FileEntry, since: Option<i64>) -> Result<bool> {
        if let Some(cutoff) = since {
            if entry.mtime <= cutoff {
                return Ok(false);
            }
        }
        self.status.set_placeholder(&entry.path, entry.placeholder);
        if entry.size == 0 && !entry.placeholder {
            return Ok(false);
        }
        let path_str = entry.path.to_string_lossy();
        if !self.dedup.needs_reindex(&path_str, entry.mtime, entry.size) {
            return Ok(false);
        }
        // Placeholders have no local bytes: index name only.
        let content = if entry.placeholder {
            None
        } else {
            sample::sample_path(&entry.path, entry.size, &self.sampling)?
        };
        let meta = DocMeta::new(&entry.path, entry.mtime, entry.size, entry.inode, entry.dev);
        self.store.add_or_replace(&meta, content.as_deref())?;
        self.ingests.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Commit staged writes and only then record them in the dedup cache.
    /// A failed commit keeps everything staged for the next checkpoint.
    fn commit_progress(&self, ctx: &mut CommitCtx) {
        ctx.last_commit = Instant::now();
        if ctx.pending.is_empty() {
            return;
        }
        match self.store.commit() {
            Ok(()) => {
                let committed = ctx.pending.len() as u64;
                for (path, mtime, size) in ctx.pending.drain(..) {
                    self.dedup.record(&path, mtime, size);
                }
                ctx.since_commit = 0;
                self.status.update(|s| s.files_indexed += committed);
            }
            Err(e) => {
                warn!(error=?e, "commit failed, retrying at next checkpoint");
            }
        }
    }
}

//EOF
