use common::SamplingSettings;
use crawl::sample::{sample_path, slice_budget};
use std::fs;
use tempfile::tempdir;

const SEPARATOR: &str = "\n…\n";

#[test]
fn large_text_file_gets_head_and_tail() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("big.log");
    let size: usize = 4 * 1024 * 1024;
    let mut data = vec![b'a'; size];
    data[..5].copy_from_slice(b"HEAD!");
    data[size - 5..].copy_from_slice(b"TAIL!");
    fs::write(&path, &data).unwrap();

    let policy = SamplingSettings::default();
    let content = sample_path(&path, size as u64, &policy).unwrap().unwrap();

    let budget = slice_budget(size as u64, &policy);
    assert_eq!(content.len(), (budget.head + budget.tail) as usize + SEPARATOR.len());
    assert!(content.len() as u64 <= policy.max_bytes);
    // Coverage bound: a tenth of the file, plus the separator.
    assert!(content.len() as f64 <= size as f64 * policy.coverage_fraction + SEPARATOR.len() as f64);
    assert!(content.starts_with("HEAD!"));
    assert!(content.ends_with("TAIL!"));
    assert!(content.contains(SEPARATOR));
}

#[test]
fn small_file_reads_in_full() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("note.txt");
    fs::write(&path, "entire body, no separator").unwrap();

    let policy = SamplingSettings::default();
    let content = sample_path(&path, 25, &policy).unwrap().unwrap();
    assert_eq!(content, "entire body, no separator");
    assert!(!content.contains(SEPARATOR));
}

#[test]
fn zero_coverage_means_full_read() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("whole.txt");
    let body = "x".repeat(300 * 1024);
    fs::write(&path, &body).unwrap();

    let mut policy = SamplingSettings::default();
    policy.coverage_fraction = 0.0;
    let content = sample_path(&path, body.len() as u64, &policy).unwrap().unwrap();
    assert_eq!(content.len(), body.len());
    assert!(!content.contains(SEPARATOR));
}

#[test]
fn nul_in_head_skips_content_entirely() {
    let tmp = tempdir().unwrap();

    // Small file: full-read path.
    let small = tmp.path().join("small.bin");
    let mut bytes = vec![0u8; 16];
    bytes.extend_from_slice(b"hello");
    fs::write(&small, &bytes).unwrap();
    let policy = SamplingSettings::default();
    assert_eq!(sample_path(&small, bytes.len() as u64, &policy).unwrap(), None);

    // Large file: sampled path.
    let large = tmp.path().join("large.bin");
    let mut data = vec![b'a'; 512 * 1024];
    data[100] = 0;
    fs::write(&large, &data).unwrap();
    assert_eq!(sample_path(&large, data.len() as u64, &policy).unwrap(), None);
}

#[test]
fn binary_tail_keeps_text_head_alone() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mixed.dat");
    let size: usize = 1024 * 1024;
    let mut data = vec![b't'; size];
    for b in data[size - 30_000..].iter_mut() {
        *b = 0;
    }
    fs::write(&path, &data).unwrap();

    let policy = SamplingSettings::default();
    let content = sample_path(&path, size as u64, &policy).unwrap().unwrap();
    let budget = slice_budget(size as u64, &policy);
    assert_eq!(content.len(), budget.head as usize);
    assert!(!content.contains(SEPARATOR));
    assert!(content.bytes().all(|b| b == b't'));
}

#[test]
fn ill_formed_utf8_is_replaced_not_fatal() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("latin1.txt");
    // 0xE9 is "é" in Latin-1 and ill-formed alone in UTF-8; it is also
    // printable enough to pass the sniff.
    let bytes = b"caf\xE9 menu".to_vec();
    fs::write(&path, &bytes).unwrap();

    let policy = SamplingSettings::default();
    let content = sample_path(&path, bytes.len() as u64, &policy).unwrap().unwrap();
    assert!(content.contains('\u{FFFD}'));
    assert!(content.starts_with("caf"));
    assert!(content.ends_with("menu"));
}

//EOF
