// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: sample                                                      ┃
// ┃ Purpose: Decide full-read vs head+tail sample, sniff, decode        ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use common::SamplingSettings;
use index::SLICE_SEPARATOR;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Byte budget split for a sampled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBudget {
    pub head: u64,
    pub tail: u64,
}

/// Compute the head/tail split for a file of `size` bytes. The head floor
/// is applied first, then the tail is rebalanced, then the tail floor is
/// applied from whatever budget remains. Neither floor may push the total
/// past the budget.
pub fn slice_budget(size: u64, policy: &SamplingSettings) -> SliceBudget {
    let budget = ((size as f64 * policy.coverage_fraction) as u64)
        .min(policy.max_bytes)
        .min(size);
    let head_share = if policy.coverage_fraction > 0.0 {
        policy.head_fraction / policy.coverage_fraction
    } else {
        0.0
    };
    let mut head = (budget as f64 * head_share) as u64;
    let mut tail = budget.saturating_sub(head);

    let head_floor = policy.min_head_bytes.min(budget);
    if head < head_floor {
        head = head_floor;
        tail = budget.saturating_sub(head);
    }
    if tail < policy.min_tail_bytes {
        tail = policy.min_tail_bytes.min(budget.saturating_sub(head));
    }
    SliceBudget { head, tail }
}

/// True when the buffer looks like binary data: any NUL, or more than 10%
/// of bytes outside the printable range (tab through carriage return are
/// fine).
pub fn looks_binary(buf: &[u8]) -> bool {
    if buf.contains(&0) {
        return true;
    }
    if buf.is_empty() {
        return false;
    }
    let suspect = buf.iter().filter(|&&b| b < 9 || (14..32).contains(&b)).count();
    suspect * 10 > buf.len()
}

fn sniff(buf: &[u8], sniff_bytes: usize) -> bool {
    looks_binary(&buf[..buf.len().min(sniff_bytes)])
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Longest prefix of `s` within `cap` bytes, cut at a character boundary.
pub fn truncate_utf8(s: &str, cap: u64) -> &str {
    let cap = cap as usize;
    if s.len() <= cap {
        return s;
    }
    let mut cut = cap;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

/// Lossy decoding can grow the byte length past the cap; trim back to a
/// character boundary.
fn enforce_cap(mut s: String, cap: u64) -> String {
    let keep = truncate_utf8(&s, cap).len();
    s.truncate(keep);
    s
}

fn read_prefix(file: &mut File, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len as usize);
    file.by_ref().take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_full(file: &mut File, size: u64, policy: &SamplingSettings) -> Result<Option<String>> {
    let bytes = read_prefix(file, size.min(policy.max_bytes))?;
    if sniff(&bytes, policy.sniff_bytes) {
        return Ok(None);
    }
    Ok(Some(enforce_cap(decode(&bytes), policy.max_bytes)))
}

/// Sample a file per policy: full text, a head+tail concatenation, or
/// nothing for binary data. The caller supplies the observed size so the
/// decision matches what was enumerated.
pub fn sample_path(path: &Path, size: u64, policy: &SamplingSettings) -> Result<Option<String>> {
    let mut file = File::open(path)?;
    sample_file(&mut file, size, policy)
}

pub fn sample_file(file: &mut File, size: u64, policy: &SamplingSettings) -> Result<Option<String>> {
    if policy.coverage_fraction <= 0.0 || size <= policy.small_file_threshold {
        return read_full(file, size, policy);
    }

    let SliceBudget { head, tail } = slice_budget(size, policy);
    if head.saturating_add(tail) >= size {
        return read_full(file, size, policy);
    }

    let head_bytes = read_prefix(file, head)?;
    if sniff(&head_bytes, policy.sniff_bytes) {
        return Ok(None);
    }

    file.seek(SeekFrom::Start(size - tail))?;
    let tail_bytes = read_prefix(file, tail)?;
    let tail_text = if sniff(&tail_bytes, policy.sniff_bytes) {
        // Binary tail on a text head keeps the head alone.
        String::new()
    } else {
        decode(&tail_bytes)
    };
    let head_text = decode(&head_bytes);

    let joined = if head_text.is_empty() || tail_text.is_empty() {
        format!("{head_text}{tail_text}")
    } else {
        format!("{head_text}{SLICE_SEPARATOR}{tail_text}")
    };
    Ok(Some(enforce_cap(joined, policy.max_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SamplingSettings {
        SamplingSettings::default()
    }

    #[test]
    fn budget_respects_coverage_and_cap() {
        let p = policy();
        // 4 MiB at 10% coverage: ~400 KiB split 8:2.
        let b = slice_budget(4 * 1024 * 1024, &p);
        let budget = b.head + b.tail;
        assert!(budget <= (4 * 1024 * 1024) / 10 + 1);
        assert!(b.head > b.tail);

        // Enormous file: budget stops at max_bytes.
        let b = slice_budget(1 << 33, &p);
        assert!(b.head + b.tail <= p.max_bytes);
    }

    #[test]
    fn floors_apply_head_first() {
        let p = policy();
        // 200 KiB at 10% coverage is a 20 KiB budget; plain split would give
        // the head 16 KiB and the tail 4 KiB, both above their floors.
        let b = slice_budget(200 * 1024, &p);
        assert!(b.head >= p.min_head_bytes);
        assert!(b.tail >= p.min_tail_bytes);
        assert!(b.head + b.tail <= 20 * 1024);
    }

    #[test]
    fn tiny_budget_relaxes_floors() {
        let mut p = policy();
        p.small_file_threshold = 0;
        // 30 KiB at 10% coverage is a 3 KiB budget, below the 4 KiB head
        // floor. The head takes the whole budget, the tail gets nothing.
        let b = slice_budget(30 * 1024, &p);
        assert_eq!(b.head + b.tail, 3 * 1024);
        assert_eq!(b.tail, 0);
    }

    #[test]
    fn binary_sniff_rules() {
        assert!(looks_binary(b"abc\0def"));
        assert!(!looks_binary(b"plain text\nwith lines\tand tabs\r\n"));
        assert!(!looks_binary(b""));
        // 2 of 10 bytes suspect: over the 10% line.
        assert!(looks_binary(&[1, 2, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h']));
        // 1 of 10: under it.
        assert!(!looks_binary(&[1, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i']));
    }

    #[test]
    fn cap_trims_at_char_boundary() {
        let s = "é".repeat(10); // two bytes each
        let out = enforce_cap(s, 5);
        assert_eq!(out.len(), 4);
        assert_eq!(out, "éé");
        assert_eq!(truncate_utf8("abcdef", 10), "abcdef");
    }
}

//EOF
