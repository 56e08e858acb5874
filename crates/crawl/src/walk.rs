// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: walk                                                        ┃
// ┃ Purpose: Root ordering and depth-first file enumeration             ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::{Context, Result};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// One regular file as observed during enumeration.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: i64,
    pub inode: u64,
    pub dev: u64,
    /// Entry exists but its bytes are not locally materialized.
    pub placeholder: bool,
}

/// Roots named "Documents" go first; the rest sort lexicographically.
/// That folder is the likeliest home of recent user work.
pub fn order_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = roots.to_vec();
    out.sort_by(|a, b| {
        let a_docs = is_documents(a);
        let b_docs = is_documents(b);
        b_docs.cmp(&a_docs).then_with(|| a.cmp(b))
    });
    out
}

fn is_documents(root: &Path) -> bool {
    root.file_name().map(|n| n == "Documents").unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_name().to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

fn unix_secs(meta: &Metadata) -> i64 {
    match meta.modified() {
        Ok(t) => match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        },
        Err(_) => 0,
    }
}

#[cfg(unix)]
fn os_identity(meta: &Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (meta.ino(), meta.dev())
}

#[cfg(not(unix))]
fn os_identity(_meta: &Metadata) -> (u64, u64) {
    (0, 0)
}

/// A file with a reported size but no allocated blocks has not been
/// materialized locally by the sync provider.
#[cfg(unix)]
fn is_placeholder(meta: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    meta.len() > 0 && meta.blocks() == 0
}

#[cfg(not(unix))]
fn is_placeholder(_meta: &Metadata) -> bool {
    false
}

/// Depth-first walk of one root: hidden entries skipped, symlinks never
/// followed. `cap` bounds the number of entries visited (files and
/// directories both count). Unreadable children are logged and skipped;
/// an unreadable root is an error for the caller to handle.
pub fn enumerate(root: &Path, cap: Option<usize>, cancel: &AtomicBool) -> Result<Vec<FileEntry>> {
    root.metadata().with_context(|| format!("cannot open root {}", root.display()))?;

    let mut out = Vec::new();
    let mut visited = 0usize;
    for entry in WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| !is_hidden(e)) {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error=%e, "enumeration error, skipping entry");
                continue;
            }
        };
        visited += 1;
        if let Some(cap) = cap {
            if visited > cap {
                debug!(root=%root.display(), cap, "enumeration cap reached");
                break;
            }
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!(path=%entry.path().display(), error=%e, "stat failed, skipping");
                continue;
            }
        };
        let (inode, dev) = os_identity(&meta);
        out.push(FileEntry {
            path: entry.into_path(),
            size: meta.len(),
            mtime: unix_secs(&meta),
            inode,
            dev,
            placeholder: is_placeholder(&meta),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn documents_sorts_first() {
        let roots = vec![
            PathBuf::from("/home/u/Projects"),
            PathBuf::from("/home/u/Documents"),
            PathBuf::from("/home/u/Archive"),
        ];
        let ordered = order_roots(&roots);
        assert_eq!(ordered[0], PathBuf::from("/home/u/Documents"));
        assert_eq!(ordered[1], PathBuf::from("/home/u/Archive"));
        assert_eq!(ordered[2], PathBuf::from("/home/u/Projects"));
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("seen.txt"), "a").unwrap();
        std::fs::write(tmp.path().join(".hidden.txt"), "b").unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join(".git/config"), "c").unwrap();

        let cancel = AtomicBool::new(false);
        let entries = enumerate(tmp.path(), None, &cancel).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("seen.txt"));
    }

    #[test]
    fn cap_stops_enumeration() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..20 {
            std::fs::write(tmp.path().join(format!("f{i:02}.txt")), "x").unwrap();
        }
        let cancel = AtomicBool::new(false);
        let entries = enumerate(tmp.path(), Some(5), &cancel).unwrap();
        assert!(entries.len() < 20);
    }

    #[test]
    fn missing_root_is_an_error() {
        let cancel = AtomicBool::new(false);
        assert!(enumerate(Path::new("/no/such/root"), None, &cancel).is_err());
    }

    #[test]
    fn cancelled_walk_returns_early() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "x").unwrap();
        let cancel = AtomicBool::new(true);
        let entries = enumerate(tmp.path(), None, &cancel).unwrap();
        assert!(entries.is_empty());
    }
}

//EOF
