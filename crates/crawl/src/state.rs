// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: state                                                       ┃
// ┃ Purpose: Crawl bookkeeping persisted outside the index              ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CrawlState {
    /// Stamp of the last successful crawl completion; incremental mode
    /// skips files at or before it.
    pub last_completed_at: Option<i64>,
    /// Full-mode resume: root path to next bucket index. Cleared per root
    /// on successful completion.
    pub bucket_progress: BTreeMap<String, usize>,
    pub schedule_window_enabled: bool,
}

/// JSON file holding `CrawlState`. Missing or unreadable files yield the
/// default state; writes are atomic (temp file then rename).
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> CrawlState {
        match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(state) => state,
                Err(e) => {
                    debug!(file=%self.path.display(), error=%e, "crawl state unreadable, starting fresh");
                    CrawlState::default()
                }
            },
            Err(_) => CrawlState::default(),
        }
    }

    pub fn save(&self, state: &CrawlState) -> Result<()> {
        let parent = self.path.parent().context("state file has no parent directory")?;
        fs::create_dir_all(parent)?;
        let mut tmp = parent.to_path_buf();
        tmp.push(format!(
            ".{}.__state_tmp",
            self.path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
        ));
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(serde_json::to_string_pretty(state)?.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}


//EOF
