// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Binary: search-cli                                                  ┃
// ┃ Purpose: Crawl roots and query the file index                       ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use common::{init_logging, load_config};
use crawl::{CrawlMode, Phase};
use engine::Engine;
use index::{Scope, SearchPlan};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "search-cli", version, about = "Crawl directories and query the file index", long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Crawl the given roots and block until done
    Crawl {
        roots: Vec<PathBuf>,
        /// Reindex every bucket instead of skipping unchanged files
        #[arg(long)]
        full: bool,
        /// Run only the background (older buckets) phase
        #[arg(long)]
        background: bool,
    },
    /// Query the index
    Query {
        q: String,
        /// name, content, or both
        #[arg(long, default_value = "both")]
        scope: String,
        /// Post-filter hit paths by glob
        #[arg(long)]
        glob: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Re-sort the page by modification time
        #[arg(long)]
        sort_mtime: bool,
        /// Print a body excerpt under each hit
        #[arg(long)]
        snippets: bool,
        /// Emit hits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the crawl status record
    Status,
    /// Wipe the index and rebuild from the given roots
    Reset { roots: Vec<PathBuf> },
}

fn parse_scope(s: &str) -> Result<Scope> {
    match s {
        "name" => Ok(Scope::Name),
        "content" => Ok(Scope::Content),
        "both" => Ok(Scope::Both),
        other => bail!("unknown scope '{other}' (use name, content, or both)"),
    }
}

fn main() -> Result<()> {
    init_logging();
    let cfg = load_config().unwrap_or_else(|e| {
        warn!(error=?e, "Config not found; using defaults");
        common::AppConfig::default()
    });
    let engine = Engine::open(cfg)?;

    match Args::parse().cmd {
        Cmd::Crawl { roots, full, background } => {
            if roots.is_empty() {
                bail!("no roots given");
            }
            let mode = if full { CrawlMode::Full } else { CrawlMode::Incremental };
            let phase = if background { Phase::Background } else { Phase::Initial };
            engine.start_crawl(roots, mode, phase);
            engine.wait_for_crawl();
            let snap = engine.status();
            println!("{}: {} files indexed", snap.status_text, snap.files_indexed);
        }
        Cmd::Query { q, scope, glob, limit, sort_mtime, snippets, json } => {
            let mut plan = SearchPlan::new(q.clone(), parse_scope(&scope)?, limit);
            plan.glob = glob;
            plan.sort_by_mtime = sort_mtime;
            let hits = engine.search(&plan)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                for hit in &hits {
                    println!("{:.3}\t{}", hit.score, hit.path);
                    if snippets {
                        if let Some(snippet) = engine.snippet(&hit.path, &q)? {
                            println!("\t{snippet}");
                        }
                    }
                }
            }
        }
        Cmd::Status => {
            println!("{}", serde_json::to_string_pretty(&engine.status())?);
        }
        Cmd::Reset { roots } => {
            if roots.is_empty() {
                bail!("no roots given");
            }
            engine.reset_and_start(roots)?;
            engine.wait_for_crawl();
            let snap = engine.status();
            println!("{}: {} files indexed", snap.status_text, snap.files_indexed);
        }
    }
    Ok(())
}

//EOF
