// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: status                                                      ┃
// ┃ Purpose: Observable crawl state for the shell                       ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initial,
    Background,
}

/// One consistent record of everything the shell observes live.
#[derive(Debug, Clone, Serialize, Default)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub phase: Option<Phase>,
    pub status_text: String,
    pub files_indexed: u64,
    pub last_completed_at: Option<i64>,
}

/// Mutation is confined to the pipeline; readers get snapshots. Change
/// notifications fan out over plain channels so subscribers never hold
/// the lock.
#[derive(Default)]
pub struct StatusBoard {
    snap: Mutex<StatusSnapshot>,
    subs: Mutex<Vec<Sender<StatusSnapshot>>>,
    placeholders: RwLock<HashSet<PathBuf>>,
}

impl StatusBoard {
    pub fn new(last_completed_at: Option<i64>) -> Self {
        let board = Self::default();
        board
            .snap
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_completed_at = last_completed_at;
        board
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.snap.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn subscribe(&self) -> Receiver<StatusSnapshot> {
        let (tx, rx) = channel();
        self.subs.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
        rx
    }

    /// Apply a mutation and notify subscribers. Dead receivers are dropped.
    pub fn update<F: FnOnce(&mut StatusSnapshot)>(&self, f: F) {
        let snap = {
            let mut guard = self.snap.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard);
            guard.clone()
        };
        let mut subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|tx| tx.send(snap.clone()).is_ok());
    }

    /// Record or clear the cloud-placeholder mark for one path.
    pub fn set_placeholder(&self, path: &Path, placeholder: bool) {
        let mut set = self.placeholders.write().unwrap_or_else(|e| e.into_inner());
        if placeholder {
            set.insert(path.to_path_buf());
        } else {
            set.remove(path);
        }
    }

    pub fn is_placeholder(&self, path: &Path) -> bool {
        self.placeholders.read().unwrap_or_else(|e| e.into_inner()).contains(path)
    }

    pub fn placeholders(&self) -> HashSet<PathBuf> {
        self.placeholders.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_notifies_subscribers() {
        let board = StatusBoard::new(None);
        let rx = board.subscribe();
        board.update(|s| {
            s.is_running = true;
            s.status_text = "working".into();
        });
        let snap = rx.recv().unwrap();
        assert!(snap.is_running);
        assert_eq!(snap.status_text, "working");
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let board = StatusBoard::new(None);
        drop(board.subscribe());
        board.update(|s| s.files_indexed = 1);
        board.update(|s| s.files_indexed = 2);
        assert_eq!(board.snapshot().files_indexed, 2);
    }

    #[test]
    fn placeholder_set_add_remove() {
        let board = StatusBoard::new(None);
        let p = Path::new("/cloud/file.txt");
        board.set_placeholder(p, true);
        assert!(board.is_placeholder(p));
        board.set_placeholder(p, false);
        assert!(!board.is_placeholder(p));
        assert!(board.placeholders().is_empty());
    }
}

//EOF
