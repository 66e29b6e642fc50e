//! Streaming line miner for plaintext and gzip-framed logs.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::config::SamplingConfig;
use crate::error::Result;
use crate::registry::{Confidence, LeadCandidate, LeadTable};
use crate::sniff::{self, GZIP_MAGIC};

use super::filter::is_meaningful;
use super::patterns::{
    GAMEMODE_PATTERNS, HIGH_VALUE_KEYWORDS, IGNORED_SEEDS, LEAD_DENY, PURE_INT, SCI_NOTATION,
    SEED_CONTEXT_TERMS, SEED_PATTERNS, SEED_SHAPE, STRONG_SEED_TERMS, VERSION_PATTERNS,
};

/// Words of surrounding context kept on each side of a lead token.
const CONTEXT_WINDOW: usize = 5;
/// Shortest pure-integer token worth flagging as a lead.
const MIN_LEAD_DIGITS: usize = 5;
/// Longest token worth testing at all.
const MAX_LEAD_LEN: usize = 20;
/// Longest non-numeric value accepted as a legacy seed.
const MAX_SEED_LEN: usize = 50;

/// One seed extracted from a log line, with the sticky context that was
/// current when the line was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedHit {
    pub seed: String,
    pub line: String,
    pub version: Option<String>,
    pub game_mode: Option<String>,
}

/// Self-contained result of mining one file.
#[derive(Debug, Default)]
pub struct MinedLog {
    pub hits: Vec<SeedHit>,
    pub leads: LeadTable,
}

impl MinedLog {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.leads.is_empty()
    }
}

/// Mine a plaintext file. `Ok(None)` means the content looks binary and was
/// left alone.
pub fn mine_plain_file(
    path: &Path,
    filename: &str,
    dir: &str,
    cfg: &SamplingConfig,
) -> Result<Option<MinedLog>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(None);
    }

    let mut probe = vec![0u8; cfg.probe_chunk];
    let n = read_up_to(&mut file, &mut probe)?;
    probe.truncate(n);
    if sniff::is_binary_content(&probe) {
        debug!(path = %path.display(), "binary content, not mining");
        return Ok(None);
    }

    let file = File::open(path)?;
    let mined = mine_lines(BufReader::new(file), size, filename, dir, cfg);
    Ok(Some(mined))
}

/// Mine a gzip-framed file. Bad or absent gzip framing and binary payloads
/// are silently not applicable.
pub fn mine_gz_file(
    path: &Path,
    filename: &str,
    dir: &str,
    cfg: &SamplingConfig,
) -> Result<Option<MinedLog>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(None);
    }

    let mut magic = [0u8; 2];
    if read_up_to(&mut file, &mut magic)? < 2 || magic != GZIP_MAGIC {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(File::open(path)?);
    let mut probe = vec![0u8; cfg.probe_chunk];
    let n = match read_up_to_reader(&mut decoder, &mut probe) {
        Ok(n) => n,
        // Corrupt gzip streams are not worth an error row.
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable gzip stream");
            return Ok(None);
        }
    };
    probe.truncate(n);
    if sniff::is_binary_content(&probe) {
        return Ok(None);
    }

    let reader = BufReader::new(std::io::Cursor::new(probe).chain(decoder));
    let mined = mine_lines(reader, size, filename, dir, cfg);
    Ok(Some(mined))
}

/// Mine every line of an already-decoded text stream.
///
/// `file_size` drives the sampling policy; pass the on-disk size.
pub fn mine_lines<R: BufRead>(
    mut reader: R,
    file_size: u64,
    filename: &str,
    dir: &str,
    cfg: &SamplingConfig,
) -> MinedLog {
    let mut mined = MinedLog::default();
    let mut current_version: Option<String> = None;
    let mut current_gamemode: Option<String> = None;
    let mut lines_seen = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(filename, error = %e, "stream ended mid-read");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines_seen += 1;

        if !cfg.examine_all(file_size, lines_seen) && !has_high_value_keyword(line) {
            continue;
        }

        for pattern in VERSION_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                current_version = Some(caps[1].to_string());
                break;
            }
        }
        for pattern in GAMEMODE_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                current_gamemode = Some(title_case(&caps[1]));
                break;
            }
        }

        find_potential_seeds(line, filename, dir, &mut mined.leads);

        if !is_meaningful(line) {
            continue;
        }
        if !(line.contains("seed") || line.contains("Seed")) {
            continue;
        }
        for pattern in SEED_PATTERNS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let seed = caps[1].to_string();
            if is_valid_seed(&seed) && !IGNORED_SEEDS.contains(&seed.as_str()) {
                mined.hits.push(SeedHit {
                    seed,
                    line: line.to_string(),
                    version: current_version.clone(),
                    game_mode: current_gamemode.clone(),
                });
            }
            break;
        }
    }

    mined
}

/// Whether a string could be a world seed: a signed integer of up to 19
/// digits, or any legacy string up to 50 characters.
pub fn is_valid_seed(seed: &str) -> bool {
    let seed = seed.trim();
    if seed.is_empty() {
        return false;
    }
    SEED_SHAPE.is_match(seed) || seed.len() <= MAX_SEED_LEN
}

/// Flag plausible seed tokens on a line, with bounded context and a
/// confidence tier from co-occurring vocabulary.
fn find_potential_seeds(line: &str, filename: &str, dir: &str, leads: &mut LeadTable) {
    if line.len() < 3 || !line.bytes().any(|b| b.is_ascii_digit()) {
        return;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let line_lower = line.to_lowercase();
    for (i, word) in words.iter().enumerate() {
        if !is_potential_seed(word) {
            continue;
        }
        let start = i.saturating_sub(CONTEXT_WINDOW);
        let end = (i + CONTEXT_WINDOW + 1).min(words.len());
        leads.observe(LeadCandidate {
            token: word.to_string(),
            filename: filename.to_string(),
            path: dir.to_string(),
            context: words[start..end].join(" "),
            line: line.to_string(),
            confidence: grade_confidence(&line_lower),
        });
    }
}

/// Token-level plausibility: long enough, inside the 64-bit signed range,
/// and not matching any noise shape.
fn is_potential_seed(token: &str) -> bool {
    if token.is_empty() || token.len() > MAX_LEAD_LEN {
        return false;
    }
    if LEAD_DENY.iter().any(|p| p.is_match(token)) {
        return false;
    }
    if PURE_INT.is_match(token) {
        if token.len() < MIN_LEAD_DIGITS {
            return false;
        }
        return token.parse::<i64>().is_ok();
    }
    if SCI_NOTATION.is_match(token) {
        if let Ok(value) = token.parse::<f64>() {
            return value >= i64::MIN as f64 && value <= i64::MAX as f64;
        }
    }
    false
}

fn grade_confidence(line_lower: &str) -> Confidence {
    let hits = SEED_CONTEXT_TERMS
        .iter()
        .filter(|t| line_lower.contains(*t))
        .count();
    if hits == 0 {
        return Confidence::Low;
    }
    if STRONG_SEED_TERMS.iter().any(|t| line_lower.contains(t)) || hits >= 2 {
        return Confidence::High;
    }
    Confidence::Medium
}

fn has_high_value_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    HIGH_VALUE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    read_up_to_reader(file, buf)
}

fn read_up_to_reader<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
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
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn mine_text(text: &str) -> MinedLog {
        let cfg = SamplingConfig::default();
        mine_lines(
            std::io::Cursor::new(text.as_bytes()),
            text.len() as u64,
            "latest.log",
            "/logs",
            &cfg,
        )
    }

    #[test]
    fn extracts_seed_with_sticky_context() {
        let mined = mine_text(
            "Starting Minecraft version 1.18.2\n\
             Default gamemode: creative\n\
             Random Seed: 12345\n",
        );
        assert_eq!(mined.hits.len(), 1);
        let hit = &mined.hits[0];
        assert_eq!(hit.seed, "12345");
        assert_eq!(hit.version.as_deref(), Some("1.18.2"));
        assert_eq!(hit.game_mode.as_deref(), Some("Creative"));
    }

    #[test]
    fn context_is_per_file_and_ordered() {
        let mined = mine_text("Seed: [777]\nMinecraft version 1.20\n");
        // The version line came after the seed; the hit has no version.
        assert_eq!(mined.hits[0].version, None);
    }

    #[test]
    fn ignored_and_invalid_seeds_are_dropped() {
        let mined = mine_text("world seed: 1234567890\n");
        assert!(mined.hits.is_empty());
    }

    #[test]
    fn first_matching_pattern_wins_once_per_line() {
        let mined = mine_text("seed: 11111 and seed: 22222\n");
        assert_eq!(mined.hits.len(), 1);
        assert_eq!(mined.hits[0].seed, "11111");
    }

    #[test]
    fn leads_mined_from_unmeaningful_lines() {
        // No allow-list keyword, but a long numeric token.
        let mined = mine_text("[12:00] player scored 8675309123 points\n");
        assert!(mined.hits.is_empty());
        let lead = mined.leads.get("8675309123").unwrap();
        assert_eq!(lead.confidence, Confidence::Low);
        assert!(lead.context.contains("8675309123"));
    }

    #[test]
    fn lead_confidence_tiers() {
        let mined = mine_text("creating new world with value 987654321\n");
        assert_eq!(
            mined.leads.get("987654321").unwrap().confidence,
            Confidence::High
        );
        let mined = mine_text("spawn point moved by 987654321\n");
        assert_eq!(
            mined.leads.get("987654321").unwrap().confidence,
            Confidence::Medium
        );
    }

    #[test]
    fn short_and_noisy_tokens_are_not_leads() {
        let mined = mine_text("tick 4721 at 23:13:21 took 301ms entity 0x1f2a\n");
        assert!(mined.leads.is_empty());
    }

    #[test]
    fn scientific_notation_leads() {
        let mined = mine_text("observed value 1.5e10 in world data\n");
        assert!(mined.leads.get("1.5e10").is_some());
        // Out of 64-bit range.
        let mined = mine_text("observed value 1.5e30 in world data\n");
        assert!(mined.leads.get("1.5e30").is_none());
    }

    #[test]
    fn sampling_restricts_to_keyword_lines() {
        let cfg = SamplingConfig {
            large_file_threshold: 10,
            small_file_threshold: 5,
            max_sample_lines: 2,
            ..SamplingConfig::default()
        };
        let text = "noise 1111111111\n\
                    noise 2222222222\n\
                    noise 3333333333\n\
                    world seed: 4444444444\n";
        let mined = mine_lines(
            std::io::Cursor::new(text.as_bytes()),
            1000,
            "big.log",
            "/logs",
            &cfg,
        );
        // Line three fell past the cap without keywords; line four survived.
        assert!(mined.leads.get("3333333333").is_none());
        assert_eq!(mined.hits.len(), 1);
        assert_eq!(mined.hits[0].seed, "4444444444");
        assert!(mined.leads.get("1111111111").is_some());
    }

    #[test]
    fn plain_file_with_binary_content_is_skipped() {
        let cfg = SamplingConfig::default();
        let file = NamedTempFile::new().unwrap();
        file.as_file().write_all(&vec![0u8; 512]).unwrap();
        let mined = mine_plain_file(file.path(), "data.txt", "/d", &cfg).unwrap();
        assert!(mined.is_none());
    }

    #[test]
    fn gz_file_round_trip() {
        let cfg = SamplingConfig::default();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"Minecraft version 1.16.5\nRandom Seed: 424242\n")
            .unwrap();
        let file = NamedTempFile::new().unwrap();
        file.as_file().write_all(&enc.finish().unwrap()).unwrap();

        let mined = mine_gz_file(file.path(), "log.gz", "/logs", &cfg)
            .unwrap()
            .unwrap();
        assert_eq!(mined.hits.len(), 1);
        assert_eq!(mined.hits[0].seed, "424242");
        assert_eq!(mined.hits[0].version.as_deref(), Some("1.16.5"));
    }

    #[test]
    fn non_gzip_input_is_not_applicable() {
        let cfg = SamplingConfig::default();
        let file = NamedTempFile::new().unwrap();
        file.as_file().write_all(b"plain text").unwrap();
        assert!(mine_gz_file(file.path(), "x.gz", "/logs", &cfg)
            .unwrap()
            .is_none());
    }

    #[test]
    fn seed_validity_rules() {
        assert!(is_valid_seed("12345"));
        assert!(is_valid_seed("-9223372036854775808"));
        assert!(is_valid_seed("Glacier Bay"));
        assert!(!is_valid_seed(""));
        assert!(!is_valid_seed(&"x".repeat(60)));
    }
}
