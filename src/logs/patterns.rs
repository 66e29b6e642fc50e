//! Precompiled regex patterns for log mining.
//!
//! Patterns are intentionally conservative to avoid catastrophic
//! backtracking; seed captures are bounded at 19 digits (the width of a
//! 64-bit signed integer) and candidates are validated after extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered seed patterns; the first to match on a line wins.
pub static SEED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:seed|Seed)[:|\s]+(-?\d{1,19})",
        r"/seed\s+(-?\d{1,19})",
        r"Seed:\s*\[(-?\d{1,19})\]",
        r"RandomSeed:\s*(-?\d{1,19})",
        r"worldGenSeed:\s*(-?\d{1,19})",
        r"World\s+Seed:\s*(-?\d{1,19})",
        r"Random\s+seed:\s*(-?\d{1,19})",
        r"Seed\s+used:\s*(-?\d{1,19})",
        r"(?i)(?:world|level|map).*?seed.*?(-?\d{1,19})",
        r"(?i)generating\s+(?:world|terrain).*?(-?\d{1,19})",
        r"(?i)seed\s*=\s*(-?\d{1,19})",
        r"(?i)using\s+seed\s*[:\[]?\s*(-?\d{1,19})",
        r"(?i)with\s+seed\s*[:\[]?\s*(-?\d{1,19})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid seed regex"))
    .collect()
});

/// Version hints; the capture updates the file's sticky version context.
pub static VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:Minecraft|MC)\s*(?:version|v\.?|:)\s*([\d\.]+(?:-pre\d+)?(?:\w+)?)",
        r"(?i)(?:Data|Version)\s*(?:version|v\.?|:)\s*([\d\.]+(?:-pre\d+)?(?:\w+)?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid version regex"))
    .collect()
});

/// Game-mode hints; the capture updates the file's sticky game-mode context.
pub static GAMEMODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:gamemode|GameType)[:\s]+(survival|creative|adventure|spectator)",
        r"(?i)/gamemode\s+(survival|creative|adventure|spectator)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid gamemode regex"))
    .collect()
});

/// Shape of a plausible numeric seed.
pub static SEED_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,19}$").expect("valid seed shape regex"));

/// Pure signed integer token.
pub static PURE_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid integer regex"));

/// Scientific-notation numeric token.
pub static SCI_NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.?\d*[eE][+-]?\d+$").expect("valid sci-notation regex"));

/// Token shapes that look numeric but are routine log noise, not seeds:
/// durations, clock times, hex addresses, entity ids, coordinates, and
/// assorted counters.
pub static LEAD_DENY: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\d+\s*m(?:illi)?s(?:ec(?:ond)?s?)?",
        r"\d+:\d+(?::\d+)?",
        r"(?i)0x[0-9a-f]+",
        r"(?i)entity\s+id\s+\d+",
        r"(?i)(?:with\s+)?entity\s+id\s+\d+\s+at\s*\(",
        r"(?i)Thread.*\d+",
        r"-?\d+\.\d+,\s*-?\d+\.\d+",
        r"\(\s*-?\d+\.?\d*,\s*-?\d+\.?\d*",
        r"\d+\.\d+(?:E-?\d+)?,\s*\d+\.?\d*",
        r"(?i)Loaded\s+\d+",
        r"(?i)took\s+\d+",
        r"(?i)optimizations\s+took",
        r"(?i)Worker-Bootstrap-\d+",
        r"(?i)\d+\s*Datafixer",
        r"(?i)id\s+\d+\s+at",
        r"(?i)bytes\s+\d+",
        r"(?i)packet\s+\d+",
        r"(?i)ping\s+\d+",
        r"(?i)fps\s+\d+",
        r"(?i)chunk\s+\d+",
        r"(?i)tick\s+\d+",
        r"(?i)player\s+\d+",
        r"(?i)connection\s+\d+",
        r"(?i)protocol\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid lead deny regex"))
    .collect()
});

/// Seeds known to be placeholders; never recorded.
pub static IGNORED_SEEDS: &[&str] = &["1234567890", "9876543210"];

/// Vocabulary that marks a line as world-generation adjacent.
pub static SEED_CONTEXT_TERMS: &[&str] = &[
    "world",
    "gen",
    "seed",
    "random",
    "create",
    "new",
    "generate",
    "level",
    "map",
    "terrain",
    "dimension",
    "spawn",
    "minecraft",
    "biome",
    "structure",
    "worldgen",
    "generation",
    "creating",
];

/// Strong seed vocabulary; any hit makes a lead high-confidence.
pub static STRONG_SEED_TERMS: &[&str] =
    &["seed", "world seed", "random seed", "generating with"];

/// Keywords that keep a line eligible once large-file sampling kicks in.
pub static HIGH_VALUE_KEYWORDS: &[&str] = &["seed", "world", "version", "minecraft"];

#[cfg(test)]
mod tests {
    use super::*;

    fn first_seed(line: &str) -> Option<String> {
        SEED_PATTERNS
            .iter()
            .find_map(|p| p.captures(line))
            .map(|c| c[1].to_string())
    }

    #[test]
    fn seed_pattern_forms() {
        assert_eq!(first_seed("seed: 12345").as_deref(), Some("12345"));
        assert_eq!(first_seed("Random Seed: 12345").as_deref(), Some("12345"));
        assert_eq!(first_seed("/seed -98765").as_deref(), Some("-98765"));
        assert_eq!(first_seed("Seed: [442211]").as_deref(), Some("442211"));
        assert_eq!(first_seed("RandomSeed: 7").as_deref(), Some("7"));
        assert_eq!(first_seed("using seed 31337").as_deref(), Some("31337"));
        assert_eq!(
            first_seed("Generating world with seed = -1").as_deref(),
            Some("-1")
        );
        assert_eq!(first_seed("no numbers here"), None);
    }

    #[test]
    fn version_and_gamemode_patterns() {
        let version = VERSION_PATTERNS
            .iter()
            .find_map(|p| p.captures("Starting Minecraft version 1.19.4"))
            .map(|c| c[1].to_string());
        assert_eq!(version.as_deref(), Some("1.19.4"));

        let mode = GAMEMODE_PATTERNS
            .iter()
            .find_map(|p| p.captures("Default gamemode: survival"))
            .map(|c| c[1].to_string());
        assert_eq!(mode.as_deref(), Some("survival"));
    }

    #[test]
    fn deny_patterns_reject_noise_tokens() {
        let noisy = ["3371ms", "23:13:21", "0x1ca56800", "12.5,80.0"];
        for token in noisy {
            assert!(
                LEAD_DENY.iter().any(|p| p.is_match(token)),
                "expected {token} to be denied"
            );
        }
        assert!(!LEAD_DENY.iter().any(|p| p.is_match("8675309123")));
    }
}
