// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Crate: common                                                       ┃
// ┃ Purpose: Shared logging and configuration utilities                 ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub sampling: SamplingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexSettings {
    /// Directory holding the on-disk index. Opaque to callers.
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_writer_heap_bytes")]
    pub writer_heap_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlSettings {
    /// JSON file for crawl state kept outside the index directory
    /// (completion stamp, per-root bucket progress, schedule preference).
    /// The index directory is wiped on reset; this file is not.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_initial_cap")]
    pub initial_phase_enumeration_cap: usize,
    #[serde(default = "default_initial_commit_interval_s")]
    pub initial_commit_interval_s: u64,
    #[serde(default = "default_initial_commit_batch")]
    pub initial_commit_batch: usize,
    #[serde(default = "default_background_commit_interval_s")]
    pub background_commit_interval_s: u64,
    #[serde(default = "default_auto_incremental_min_interval_s")]
    pub auto_incremental_min_interval_s: u64,
    #[serde(default)]
    pub schedule_window_enabled: bool,
}

/// Per-crawl content coverage policy. Fractions are of total file size;
/// `tail_fraction` is whatever remains of the coverage after the head share.
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingSettings {
    #[serde(default = "default_coverage_fraction")]
    pub coverage_fraction: f64,
    #[serde(default = "default_head_fraction")]
    pub head_fraction: f64,
    #[serde(default = "default_small_file_threshold")]
    pub small_file_threshold: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_min_head_bytes")]
    pub min_head_bytes: u64,
    #[serde(default = "default_min_tail_bytes")]
    pub min_tail_bytes: u64,
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,
}

impl SamplingSettings {
    pub fn tail_fraction(&self) -> f64 {
        (self.coverage_fraction - self.head_fraction).max(0.0)
    }
}

fn default_index_dir() -> PathBuf { PathBuf::from(".search_index") }
fn default_writer_heap_bytes() -> usize { 50_000_000 }
fn default_state_file() -> PathBuf { PathBuf::from(".search_state.json") }
fn default_initial_cap() -> usize { 20_000 }
fn default_initial_commit_interval_s() -> u64 { 2 }
fn default_initial_commit_batch() -> usize { 1_000 }
fn default_background_commit_interval_s() -> u64 { 1_800 }
fn default_auto_incremental_min_interval_s() -> u64 { 60 }
fn default_coverage_fraction() -> f64 { 0.10 }
fn default_head_fraction() -> f64 { 0.08 }
fn default_small_file_threshold() -> u64 { 128 * 1024 }
fn default_max_bytes() -> u64 { 1_572_864 }
fn default_min_head_bytes() -> u64 { 4 * 1024 }
fn default_min_tail_bytes() -> u64 { 1024 }
fn default_sniff_bytes() -> usize { 8192 }

impl Default for IndexSettings {
    fn default() -> Self {
        Self { dir: default_index_dir(), writer_heap_bytes: default_writer_heap_bytes() }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            initial_phase_enumeration_cap: default_initial_cap(),
            initial_commit_interval_s: default_initial_commit_interval_s(),
            initial_commit_batch: default_initial_commit_batch(),
            background_commit_interval_s: default_background_commit_interval_s(),
            auto_incremental_min_interval_s: default_auto_incremental_min_interval_s(),
            schedule_window_enabled: false,
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            coverage_fraction: default_coverage_fraction(),
            head_fraction: default_head_fraction(),
            small_file_threshold: default_small_file_threshold(),
            max_bytes: default_max_bytes(),
            min_head_bytes: default_min_head_bytes(),
            min_tail_bytes: default_min_tail_bytes(),
            sniff_bytes: default_sniff_bytes(),
        }
    }
}

/// Initialize tracing subscriber with env filter.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();
}

/// Load configuration from config/{default,local}.yaml with env overrides.
pub fn load_config() -> Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/default.yaml").required(false))
        .add_source(config::File::with_name("config/local.yaml").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    let cfg: AppConfig = settings.try_deserialize()?;
    Ok(cfg)
}

//EOF
