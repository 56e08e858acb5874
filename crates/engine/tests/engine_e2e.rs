use std::fs;
use std::path::Path;

use common::AppConfig;
use crawl::CrawlMode;
use crawl::Phase;
use engine::Engine;
use index::{DocMeta, Scope, SearchPlan};
use tempfile::tempdir;

fn config_under(work: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.index.dir = work.join("idx");
    cfg.crawl.state_file = work.join("crawl_state.json");
    cfg.crawl.initial_commit_interval_s = 1;
    cfg
}

fn meta(path: &str, mtime: i64, size: u64) -> DocMeta {
    DocMeta::new(Path::new(path), mtime, size, 0, 0)
}

#[test]
fn direct_write_flow_round_trips() {
    let tmp = tempdir().unwrap();
    let engine = Engine::open(config_under(tmp.path())).unwrap();

    let m = meta("/shell/report.txt", 111, 13);
    assert!(engine.should_reindex(&m));
    engine.add_or_update(&m, Some("quarterly numbers")).unwrap();
    engine.commit_and_refresh().unwrap();

    // Committed identity is now deduplicated; a new mtime is not.
    assert!(!engine.should_reindex(&m));
    assert!(engine.should_reindex(&meta("/shell/report.txt", 222, 13)));

    let hits = engine.search(&SearchPlan::new("quarterly", Scope::Content, 10)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "report.txt");
    assert_eq!(hits[0].mtime, 111);
    Engine::free_results(hits);

    assert_eq!(engine.health().unwrap().docs, 1);
}

#[test]
fn facade_writes_respect_the_content_cap() {
    let tmp = tempdir().unwrap();
    let mut cfg = config_under(tmp.path());
    cfg.sampling.max_bytes = 16;
    let engine = Engine::open(cfg).unwrap();

    let m = meta("/shell/long.txt", 1, 100);
    engine.add_or_update(&m, Some(&"a".repeat(100))).unwrap();
    engine.commit_and_refresh().unwrap();

    // The stored body (returned whole by the snippet of a missing term) is
    // bounded by the cap.
    let stored = engine.snippet("/shell/long.txt", "zzz").unwrap().unwrap();
    assert_eq!(stored.len(), 16);
}

#[test]
fn dedup_survives_reopen() {
    let tmp = tempdir().unwrap();
    let m = meta("/shell/persisted.md", 10, 4);
    {
        let engine = Engine::open(config_under(tmp.path())).unwrap();
        engine.add_or_update(&m, Some("body")).unwrap();
        engine.commit_and_refresh().unwrap();
    }
    let engine = Engine::open(config_under(tmp.path())).unwrap();
    assert!(!engine.should_reindex(&m), "dedup cache rebuilds from stored fields");
    assert_eq!(engine.health().unwrap().docs, 1);
}

#[test]
fn crawl_through_facade_and_snippet() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("guide.txt"), "turn the crank to start the engine and mind the flywheel")
        .unwrap();

    let engine = Engine::open(config_under(tmp.path())).unwrap();
    assert!(engine.start_crawl(vec![root.clone()], CrawlMode::Full, Phase::Initial));
    engine.wait_for_crawl();

    let snap = engine.status();
    assert!(!snap.is_running);
    assert_eq!(snap.files_indexed, 1);

    let hits = engine.search(&SearchPlan::new("flywheel", Scope::Content, 10)).unwrap();
    assert_eq!(hits.len(), 1);
    let path = hits[0].path.clone();
    let snippet = engine.snippet(&path, "flywheel").unwrap().unwrap();
    assert!(snippet.contains("flywheel"));

    // Unknown paths have no snippet.
    assert_eq!(engine.snippet("/nowhere.txt", "x").unwrap(), None);
}

#[test]
fn status_subscription_sees_terminal_update() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "content").unwrap();

    let engine = Engine::open(config_under(tmp.path())).unwrap();
    let rx = engine.subscribe();
    engine.start_crawl(vec![root], CrawlMode::Incremental, Phase::Initial);
    engine.wait_for_crawl();

    let mut saw_running = false;
    let mut last = None;
    while let Ok(snap) = rx.try_recv() {
        saw_running |= snap.is_running;
        last = Some(snap);
    }
    let last = last.expect("at least one notification");
    assert!(saw_running);
    assert!(!last.is_running);
    assert_eq!(last.status_text, "complete");
}

#[test]
fn reset_through_facade_rebuilds() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("doc.txt"), "original words").unwrap();

    let engine = Engine::open(config_under(tmp.path())).unwrap();
    engine.start_crawl(vec![root.clone()], CrawlMode::Full, Phase::Initial);
    engine.wait_for_crawl();
    assert_eq!(engine.health().unwrap().docs, 1);

    fs::write(root.join("extra.txt"), "added later").unwrap();
    engine.reset_and_start(vec![root]).unwrap();
    engine.wait_for_crawl();

    assert_eq!(engine.health().unwrap().docs, 2);
    let hits = engine.search(&SearchPlan::new("added", Scope::Content, 10)).unwrap();
    assert_eq!(hits.len(), 1);
}

//EOF
