//! Content sniffing for initial file classification.
//!
//! Classification is driven by leading bytes and size, never by extension
//! alone: extensions on recovered files are unreliable, and a `.dat` can be
//! gzip-framed, a bare tag tree, or stray text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memchr::memchr_iter;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// gzip magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Tag id of a compound root in the binary tag-tree format.
pub const COMPOUND_TAG: u8 = 0x0a;
/// Sample size for the binary/text heuristic.
const BINARY_SAMPLE: usize = 1024;
/// Minimum bytes needed before header magic is trusted.
const MIN_HEADER_LEN: u64 = 3;

/// Result of sniffing a file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// No data, or nothing but whitespace in the leading probe.
    Empty,
    /// gzip-framed; candidate compressed tag tree (decompression must still
    /// succeed before the content is trusted).
    CompressedTree,
    /// Bare compound-root tag tree.
    RawTree,
    /// Plausible text.
    Text,
    /// Binary garbage with no recognized header.
    Binary,
}

/// Classify a probe of a file's leading bytes plus its total size.
pub fn classify_bytes(size: u64, probe: &[u8]) -> ContentKind {
    if size == 0 || probe.is_empty() {
        return ContentKind::Empty;
    }
    if size < MIN_HEADER_LEN {
        return ContentKind::Empty;
    }
    if probe.len() >= 2 && probe[..2] == GZIP_MAGIC {
        return ContentKind::CompressedTree;
    }
    if probe[0] == COMPOUND_TAG {
        return ContentKind::RawTree;
    }
    if probe.iter().all(|b| b.is_ascii_whitespace()) {
        return ContentKind::Empty;
    }
    if is_binary_content(probe) {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}

/// Classify a file on disk by reading a bounded probe of its leading bytes.
pub fn classify(path: &Path) -> std::io::Result<ContentKind> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut probe = [0u8; BINARY_SAMPLE];
    let n = read_up_to(&mut file, &mut probe)?;
    let kind = classify_bytes(size, &probe[..n]);
    debug!(path = %path.display(), ?kind, size, "sniffed");
    Ok(kind)
}

/// Binary/text heuristic over a bounded sample.
///
/// A chunk counts as binary when more than half of it is NUL bytes or more
/// than 70% falls outside printable ASCII plus common whitespace. Empty
/// input is not binary.
pub fn is_binary_content(content: &[u8]) -> bool {
    let chunk = &content[..content.len().min(BINARY_SAMPLE)];
    if chunk.is_empty() {
        return false;
    }

    let null_count = memchr_iter(0, chunk).count();
    let non_text = chunk.iter().filter(|&&b| !is_text_byte(b)).count();

    let null_ratio = null_count as f64 / chunk.len() as f64;
    let non_text_ratio = non_text as f64 / chunk.len() as f64;

    null_ratio > 0.5 || non_text_ratio > 0.7
}

/// True when the file holds no data at all, or only whitespace in its
/// leading probe.
pub fn is_completely_empty(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    match file.metadata() {
        Ok(meta) if meta.len() == 0 => return true,
        Ok(_) => {}
        Err(_) => return false,
    }
    let mut probe = [0u8; BINARY_SAMPLE];
    match read_up_to(&mut file, &mut probe) {
        Ok(n) => probe[..n].iter().all(|b| b.is_ascii_whitespace()),
        Err(_) => false,
    }
}

fn is_text_byte(b: u8) -> bool {
    (32..127).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t' | 0x0c | 0x08)
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn classify_data(data: &[u8]) -> ContentKind {
        let file = NamedTempFile::new().unwrap();
        file.as_file().write_all(data).unwrap();
        classify(file.path()).unwrap()
    }

    #[test]
    fn empty_and_tiny_files_classify_empty() {
        assert_eq!(classify_data(b""), ContentKind::Empty);
        assert_eq!(classify_data(b"a"), ContentKind::Empty);
        assert_eq!(classify_data(&[0x1f, 0x8b]), ContentKind::Empty);
        assert_eq!(classify_data(b"   \n\t "), ContentKind::Empty);
    }

    #[test]
    fn gzip_magic_wins_over_everything() {
        assert_eq!(
            classify_data(&[0x1f, 0x8b, 0x08, 0x00]),
            ContentKind::CompressedTree
        );
    }

    #[test]
    fn compound_root_is_raw_tree() {
        assert_eq!(
            classify_data(&[0x0a, 0x00, 0x00, 0x00]),
            ContentKind::RawTree
        );
    }

    #[test]
    fn text_and_binary_split() {
        assert_eq!(
            classify_data(b"Starting minecraft server version 1.19\n"),
            ContentKind::Text
        );
        let garbage: Vec<u8> = (128u8..=255).cycle().take(512).collect();
        assert_eq!(classify_data(&garbage), ContentKind::Binary);
    }

    #[test]
    fn binary_heuristic_ratios() {
        assert!(!is_binary_content(b""));
        assert!(!is_binary_content(b"hello world\n"));
        // Mostly NULs.
        let nulls = vec![0u8; 100];
        assert!(is_binary_content(&nulls));
        // Under half NULs with otherwise clean text stays text.
        let mut mixed = vec![b'a'; 60];
        mixed.extend(vec![0u8; 40]);
        assert!(!is_binary_content(&mixed));
    }

    #[test]
    fn whitespace_only_file_is_completely_empty() {
        let file = NamedTempFile::new().unwrap();
        file.as_file().write_all(b"  \n\n\t  ").unwrap();
        assert!(is_completely_empty(file.path()));

        let data = NamedTempFile::new().unwrap();
        data.as_file().write_all(b"seed: 1").unwrap();
        assert!(!is_completely_empty(data.path()));
    }
}
