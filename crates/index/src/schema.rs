// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: schema                                                      ┃
// ┃ Purpose: Document schema for the file index                         ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use serde::{Deserialize, Serialize};
use std::path::Path;
use tantivy::schema::{Field, Schema, FAST, STORED, STRING, TEXT};

/// Field handles resolved once at open time.
#[derive(Clone, Copy)]
pub struct DocFields {
    /// Absolute file path, identity key. One live document per path.
    pub path: Field,
    /// Tokenized last path component, for term search.
    pub name_tok: Field,
    /// Lower-cased untokenized last path component, for prefix/exact match.
    pub name_raw: Field,
    /// Lower-cased extension without the dot; absent when the name has none.
    pub ext: Field,
    /// Full body or head+tail sample, joined by SLICE_SEPARATOR.
    pub content: Field,
    pub mtime: Field,
    pub size: Field,
    pub inode: Field,
    pub dev: Field,
}

pub fn build_schema() -> (Schema, DocFields) {
    let mut builder = Schema::builder();
    let path = builder.add_text_field("path", STRING | STORED);
    let name_tok = builder.add_text_field("name_tok", TEXT);
    let name_raw = builder.add_text_field("name_raw", STRING);
    let ext = builder.add_text_field("ext", STRING);
    // Content is stored so callers can fetch bodies for snippets.
    let content = builder.add_text_field("content", TEXT | STORED);
    let mtime = builder.add_i64_field("mtime", STORED | FAST);
    let size = builder.add_u64_field("size", STORED | FAST);
    // OS identity, carried for dedup diagnostics only.
    let inode = builder.add_u64_field("inode", STORED);
    let dev = builder.add_u64_field("dev", STORED);
    let fields = DocFields { path, name_tok, name_raw, ext, content, mtime, size, inode, dev };
    (builder.build(), fields)
}

/// Metadata for one file as observed at ingest time. `name` and `ext` are
/// always derived from `path` so the stored document can never disagree
/// with its own identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocMeta {
    pub path: String,
    pub name: String,
    pub ext: Option<String>,
    pub mtime: i64,
    pub size: u64,
    pub inode: u64,
    pub dev: u64,
}

impl DocMeta {
    pub fn new(path: &Path, mtime: i64, size: u64, inode: u64, dev: u64) -> Self {
        let path_str = path.to_string_lossy().to_string();
        let name = basename(&path_str).to_string();
        let ext = extension_of(&name);
        Self { path: path_str, name, ext, mtime, size, inode, dev }
    }
}

pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lower-cased extension without the dot. Dotfiles like ".profile" and
/// bare names have none.
pub fn extension_of(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}


//EOF
