// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Crate: index                                                        ┃
// ┃ Purpose: Persistent full-text index over file documents (Tantivy)   ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

pub mod dedup;
pub mod query;
pub mod schema;
mod store;

pub use dedup::DedupCache;
pub use query::{Scope, SearchHit, SearchPlan};
pub use schema::{basename, extension_of, DocMeta};
pub use store::{IndexHealth, IndexStore, DEFAULT_WRITER_HEAP_BYTES};

/// Joins the head and tail slices of sampled content.
pub const SLICE_SEPARATOR: &str = "\n…\n";

/// Very lightweight snippet: window around the first occurrence of any query
/// term, else the start of the content.
pub fn make_snippet(content: &str, q: &str) -> String {
    let terms: Vec<String> = q.split_whitespace().map(|s| s.to_lowercase()).collect();
    let lc = content.to_lowercase();
    let mut idx = None;
    for t in &terms {
        if t.is_empty() { continue; }
        if let Some(i) = lc.find(t) { idx = Some(i); break; }
    }
    let start = idx.unwrap_or(0);
    let mut window_start = start.saturating_sub(60);
    while window_start > 0 && !content.is_char_boundary(window_start) {
        window_start -= 1;
    }
    let mut window_end = ((start + 200).min(content.len())).max(window_start);
    while window_end < content.len() && !content.is_char_boundary(window_end) {
        window_end += 1;
    }
    let mut snippet = content[window_start..window_end].to_string();
    snippet = snippet.replace('\n', " ").replace('\r', " ");
    if window_end < content.len() { snippet.push_str("..."); }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_centers_on_first_term() {
        let body = "x".repeat(300) + " needle " + &"y".repeat(300);
        let s = make_snippet(&body, "needle");
        assert!(s.contains("needle"));
        assert!(s.ends_with("..."));
    }

    #[test]
    fn snippet_of_miss_takes_head() {
        let s = make_snippet("short body", "absent");
        assert_eq!(s, "short body");
    }
}

//EOF
