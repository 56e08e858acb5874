// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: query                                                       ┃
// ┃ Purpose: Compact query grammar and retrieval planning               ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Searcher, TantivyDocument, Term};

use crate::schema::{basename, DocFields};

// Prefix hits on the raw name outrank name-token hits, which outrank
// content hits (roughly 10 : 2.5 : 1).
const NAME_RAW_PREFIX_BOOST: f32 = 10.0;
const NAME_TOK_BOOST: f32 = 2.5;

/// Which fields a free term searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Name,
    Content,
    #[default]
    Both,
}

impl Scope {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Scope::Name),
            1 => Some(Scope::Content),
            2 => Some(Scope::Both),
            _ => None,
        }
    }

    fn searches_name(self) -> bool {
        matches!(self, Scope::Name | Scope::Both)
    }

    fn searches_content(self) -> bool {
        matches!(self, Scope::Content | Scope::Both)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    pub q: String,
    pub scope: Scope,
    pub glob: Option<String>,
    pub limit: usize,
    /// Stable re-sort of the ranked page by mtime, newest first.
    pub sort_by_mtime: bool,
}

impl SearchPlan {
    pub fn new(q: impl Into<String>, scope: Scope, limit: usize) -> Self {
        Self { q: q.into(), scope, glob: None, limit, sort_by_mtime: false }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
    pub mtime: i64,
    pub size: u64,
    pub score: f32,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Phrase(String),
    Ext(String),
    Or,
}

fn flush_word(buf: &mut String, out: &mut Vec<Token>) {
    if buf.is_empty() {
        return;
    }
    let word = std::mem::take(buf);
    if word == "OR" {
        out.push(Token::Or);
    } else if let Some(ext) = word.strip_prefix("ext:") {
        if !ext.is_empty() {
            out.push(Token::Ext(ext.to_lowercase()));
        }
    } else {
        out.push(Token::Word(word));
    }
}

/// Whitespace-separated tokens; double quotes delimit phrases. An
/// unterminated quote still yields a phrase from whatever followed it.
fn lex(q: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_quote = false;
    for c in q.chars() {
        if in_quote {
            if c == '"' {
                out.push(Token::Phrase(std::mem::take(&mut buf)));
                in_quote = false;
            } else {
                buf.push(c);
            }
        } else if c == '"' {
            flush_word(&mut buf, &mut out);
            in_quote = true;
        } else if c.is_whitespace() {
            flush_word(&mut buf, &mut out);
        } else {
            buf.push(c);
        }
    }
    if in_quote {
        if !buf.is_empty() {
            out.push(Token::Phrase(std::mem::take(&mut buf)));
        }
    } else {
        flush_word(&mut buf, &mut out);
    }
    out
}

/// Split the way the index tokenizer does: non-alphanumeric boundaries,
/// lower-cased.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn collapse(mut alts: Vec<(Occur, Box<dyn Query>)>) -> Option<Box<dyn Query>> {
    match alts.len() {
        0 => None,
        1 => alts.pop().map(|(_, q)| q),
        _ => Some(Box::new(BooleanQuery::new(alts))),
    }
}

/// A free term expands to a boosted disjunction over the scoped fields.
fn word_clause(fields: &DocFields, scope: Scope, word: &str) -> Option<Box<dyn Query>> {
    let lowered = word.to_lowercase();
    let mut alts: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    if scope.searches_name() {
        let prefix =
            FuzzyTermQuery::new_prefix(Term::from_field_text(fields.name_raw, &lowered), 0, true);
        alts.push((
            Occur::Should,
            Box::new(BoostQuery::new(Box::new(prefix), NAME_RAW_PREFIX_BOOST)),
        ));
        for tok in tokenize(&lowered) {
            let term = TermQuery::new(
                Term::from_field_text(fields.name_tok, &tok),
                IndexRecordOption::Basic,
            );
            alts.push((Occur::Should, Box::new(BoostQuery::new(Box::new(term), NAME_TOK_BOOST))));
        }
    }
    if scope.searches_content() {
        for tok in tokenize(&lowered) {
            let term = TermQuery::new(
                Term::from_field_text(fields.content, &tok),
                IndexRecordOption::Basic,
            );
            alts.push((Occur::Should, Box::new(term)));
        }
    }
    collapse(alts)
}

/// A quoted phrase searches the tokenized fields only, in order, no slop.
fn phrase_clause(fields: &DocFields, scope: Scope, phrase: &str) -> Option<Box<dyn Query>> {
    let words = tokenize(phrase);
    if words.is_empty() {
        return None;
    }
    let mut alts: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    if scope.searches_name() {
        alts.push((
            Occur::Should,
            Box::new(BoostQuery::new(field_phrase(fields.name_tok, &words), NAME_TOK_BOOST)),
        ));
    }
    if scope.searches_content() {
        alts.push((Occur::Should, field_phrase(fields.content, &words)));
    }
    collapse(alts)
}

fn field_phrase(field: tantivy::schema::Field, words: &[String]) -> Box<dyn Query> {
    let terms: Vec<Term> = words.iter().map(|w| Term::from_field_text(field, w)).collect();
    if terms.len() == 1 {
        // PhraseQuery needs at least two terms; a one-word phrase is a term.
        let term = terms.into_iter().next();
        match term {
            Some(t) => Box::new(TermQuery::new(t, IndexRecordOption::Basic)),
            None => Box::new(BooleanQuery::new(Vec::new())),
        }
    } else {
        Box::new(PhraseQuery::new(terms))
    }
}

/// Translate a plan into one tantivy query, or None when there is nothing
/// to search. Adjacent clauses AND by default; `OR` folds its neighbors
/// into a single disjunctive group. `ext:` terms are filters and always
/// required.
fn build(fields: &DocFields, plan: &SearchPlan) -> Option<Box<dyn Query>> {
    let mut groups: Vec<Vec<Box<dyn Query>>> = Vec::new();
    let mut filters: Vec<Box<dyn Query>> = Vec::new();
    let mut join_next = false;
    for token in lex(&plan.q) {
        let clause = match token {
            Token::Or => {
                if !groups.is_empty() {
                    join_next = true;
                }
                continue;
            }
            Token::Ext(ext) => {
                filters.push(Box::new(TermQuery::new(
                    Term::from_field_text(fields.ext, &ext),
                    IndexRecordOption::Basic,
                )));
                continue;
            }
            Token::Word(w) => word_clause(fields, plan.scope, &w),
            Token::Phrase(p) => phrase_clause(fields, plan.scope, &p),
        };
        let Some(clause) = clause else { continue };
        match groups.last_mut() {
            Some(group) if join_next => group.push(clause),
            _ => groups.push(vec![clause]),
        }
        join_next = false;
    }

    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for group in groups {
        let q = collapse(group.into_iter().map(|g| (Occur::Should, g)).collect());
        if let Some(q) = q {
            clauses.push((Occur::Must, q));
        }
    }
    for f in filters {
        clauses.push((Occur::Must, f));
    }
    collapse(clauses)
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?
        .compile_matcher())
}

/// Small bump for fresh files, capped well below the name boosts so an
/// exact-name match can never be displaced by recency alone.
fn recency_factor(now: i64, mtime: i64) -> f32 {
    const WINDOW_SECS: i64 = 365 * 86_400;
    let age = (now - mtime).clamp(0, WINDOW_SECS);
    1.0 + 0.05 * (1.0 - age as f32 / WINDOW_SECS as f32)
}

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Retrieve, post-filter by glob, rank, and page. The searcher snapshot is
/// whatever the store's last refresh made visible.
pub(crate) fn execute(
    searcher: &Searcher,
    fields: &DocFields,
    plan: &SearchPlan,
) -> Result<Vec<SearchHit>> {
    if plan.limit == 0 {
        return Ok(Vec::new());
    }
    let Some(query) = build(fields, plan) else { return Ok(Vec::new()) };
    let glob = match plan.glob.as_deref().filter(|g| !g.trim().is_empty()) {
        Some(g) => Some(compile_glob(g)?),
        None => None,
    };
    // Overfetch so the glob post-filter and tie-breaks still fill the page.
    let fetch = if glob.is_some() {
        plan.limit.saturating_mul(8).saturating_add(64)
    } else {
        plan.limit.saturating_mul(2).saturating_add(16)
    };
    let top = searcher.search(&query, &TopDocs::with_limit(fetch))?;

    let now = unix_now();
    let mut hits = Vec::with_capacity(top.len().min(plan.limit));
    for (score, addr) in top {
        let doc: TantivyDocument = searcher.doc(addr)?;
        let Some(path) = doc.get_first(fields.path).and_then(|v| v.as_str()).map(str::to_string)
        else {
            continue;
        };
        if let Some(matcher) = &glob {
            if !matcher.is_match(&path) {
                continue;
            }
        }
        let mtime = doc.get_first(fields.mtime).and_then(|v| v.as_i64()).unwrap_or(0);
        let size = doc.get_first(fields.size).and_then(|v| v.as_u64()).unwrap_or(0);
        let name = basename(&path).to_string();
        hits.push(SearchHit { path, name, mtime, size, score: score * recency_factor(now, mtime) });
    }

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.mtime.cmp(&a.mtime))
            .then_with(|| a.path.cmp(&b.path))
    });
    hits.truncate(plan.limit);
    if plan.sort_by_mtime {
        // Stable, so equal mtimes keep their ranked order.
        hits.sort_by(|a, b| b.mtime.cmp(&a.mtime));
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_words_and_or() {
        assert_eq!(
            lex("alpha OR beta gamma"),
            vec![
                Token::Word("alpha".into()),
                Token::Or,
                Token::Word("beta".into()),
                Token::Word("gamma".into()),
            ]
        );
    }

    #[test]
    fn lex_ext_and_phrase() {
        assert_eq!(
            lex(r#"ext:PDF "quarterly budget" notes"#),
            vec![
                Token::Ext("pdf".into()),
                Token::Phrase("quarterly budget".into()),
                Token::Word("notes".into()),
            ]
        );
    }

    #[test]
    fn lex_unterminated_quote() {
        assert_eq!(lex(r#""open ended"#), vec![Token::Phrase("open ended".into())]);
    }

    #[test]
    fn lex_empty_ext_is_dropped() {
        assert_eq!(lex("ext: hello"), vec![Token::Word("hello".into())]);
    }

    #[test]
    fn tokenize_matches_indexing() {
        assert_eq!(tokenize("Q3-Budget.pdf"), vec!["q3", "budget", "pdf"]);
        assert_eq!(tokenize("...---..."), Vec::<String>::new());
    }

    #[test]
    fn recency_is_monotonic_and_mild() {
        let now = 1_700_000_000;
        let fresh = recency_factor(now, now);
        let old = recency_factor(now, now - 400 * 86_400);
        assert!(fresh > old);
        assert!(fresh <= 1.05 + f32::EPSILON);
        assert!((old - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scope_codes() {
        assert_eq!(Scope::from_code(0), Some(Scope::Name));
        assert_eq!(Scope::from_code(1), Some(Scope::Content));
        assert_eq!(Scope::from_code(2), Some(Scope::Both));
        assert_eq!(Scope::from_code(3), None);
    }
}

//EOF
