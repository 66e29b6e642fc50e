//! World-metadata extraction from decoded tag trees.
//!
//! Seed lookup follows a fixed priority, and every other field goes through
//! a uniform extraction table with a per-field fallback to unknown, so one
//! damaged node never costs the rest of the record.

use std::fs;
use std::path::Path;

use chrono::DateTime;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::registry::{FieldBag, FieldKey, TIMESTAMP_FORMAT};
use crate::sniff::GZIP_MAGIC;

use super::decode::{decode_bytes, inflate_gzip};
use super::value::{Compound, Value};

/// Seed plus whatever metadata survived extraction from one world file.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldRecord {
    pub seed: String,
    pub fields: FieldBag,
}

/// Extract a world record from a candidate tag-tree file.
///
/// `Ok(None)` means the file is not this format, holds no data, or holds no
/// seed; none of which is an error. gzip framing that fails to inflate, or
/// inflates to something that is not a tag tree, is a decode error: the
/// framing promised a format the content did not deliver.
pub fn extract_world(path: &Path) -> Result<Option<WorldRecord>> {
    let raw = fs::read(path)?;
    if raw.is_empty() || raw.iter().take(1024).all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let (payload, was_gzip) = if raw.len() >= 2 && raw[..2] == GZIP_MAGIC {
        let inflated = inflate_gzip(&raw)
            .map_err(|e| ScanError::Decode(format!("gzip inflate failed: {e}")))?;
        (inflated, true)
    } else {
        (raw, false)
    };

    let Some(Value::Compound(root)) = decode_bytes(&payload) else {
        if was_gzip {
            return Err(ScanError::Decode(
                "decompressed content is not a tag tree".to_string(),
            ));
        }
        return Ok(None);
    };

    let data = data_compound(&root);
    let Some(seed) = find_seed(data) else {
        debug!(path = %path.display(), "tag tree carries no seed");
        return Ok(None);
    };

    Ok(Some(WorldRecord {
        seed,
        fields: extract_fields(data),
    }))
}

/// The top-level data compound: conventionally under a "Data" key, otherwise
/// the root itself.
fn data_compound(root: &Compound) -> &Compound {
    root.get("Data").and_then(Value::as_compound).unwrap_or(root)
}

/// Search a compound for a seed value.
///
/// Priority is fixed: direct "RandomSeed", then "seed", then
/// "WorldGenSettings.seed", then each "DimensionData" child, then a generic
/// depth-first sweep over nested compounds and lists. First match wins.
pub fn find_seed(data: &Compound) -> Option<String> {
    if let Some(v) = data.get("RandomSeed").and_then(Value::scalar_string) {
        return Some(v);
    }
    if let Some(v) = data.get("seed").and_then(Value::scalar_string) {
        return Some(v);
    }
    if let Some(settings) = data.get("WorldGenSettings").and_then(Value::as_compound) {
        if let Some(v) = settings.get("seed").and_then(Value::scalar_string) {
            return Some(v);
        }
    }
    if let Some(dims) = data.get("DimensionData").and_then(Value::as_compound) {
        for child in dims.values() {
            if let Some(c) = child.as_compound() {
                if let Some(v) = find_seed(c) {
                    return Some(v);
                }
            }
        }
    }
    for value in data.values() {
        match value {
            Value::Compound(c) => {
                if let Some(v) = find_seed(c) {
                    return Some(v);
                }
            }
            Value::List(items) => {
                for item in items {
                    if let Some(c) = item.as_compound() {
                        if let Some(v) = find_seed(c) {
                            return Some(v);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

type FieldFn = fn(&Compound) -> Option<String>;

/// Ordered extraction table. Each entry is tried independently; a miss just
/// leaves that field unknown.
static FIELD_TABLE: &[(FieldKey, FieldFn)] = &[
    (FieldKey::WorldName, world_name),
    (FieldKey::GameMode, game_mode),
    (FieldKey::Generator, generator),
    (FieldKey::Version, version),
    (FieldKey::LastPlayed, last_played),
    (FieldKey::TimePlayed, time_played),
    (FieldKey::SpawnLocation, spawn_location),
    (FieldKey::DataVersion, data_version),
    (FieldKey::Difficulty, difficulty),
    (FieldKey::Hardcore, hardcore),
    (FieldKey::AllowCommands, allow_commands),
    (FieldKey::SizeOnDisk, size_on_disk),
];

fn extract_fields(data: &Compound) -> FieldBag {
    let mut bag = FieldBag::new();
    for (key, extract) in FIELD_TABLE {
        if let Some(value) = extract(data) {
            bag.set(*key, value);
        }
    }
    bag
}

fn world_name(data: &Compound) -> Option<String> {
    data.get("LevelName").and_then(Value::scalar_string)
}

fn game_mode(data: &Compound) -> Option<String> {
    let code = data.get("GameType")?.as_i64()?;
    Some(render_game_mode(code))
}

fn generator(data: &Compound) -> Option<String> {
    Some(
        data.get("generatorName")
            .and_then(Value::scalar_string)
            .unwrap_or_else(|| "default".to_string()),
    )
}

fn version(data: &Compound) -> Option<String> {
    data.get("Version")
        .and_then(Value::as_compound)?
        .get("Name")
        .and_then(Value::scalar_string)
}

fn last_played(data: &Compound) -> Option<String> {
    let millis = data.get("LastPlayed")?.as_i64()?;
    format_timestamp_millis(millis)
}

fn time_played(data: &Compound) -> Option<String> {
    data.get("Time").and_then(Value::scalar_string)
}

fn spawn_location(data: &Compound) -> Option<String> {
    let x = data.get("SpawnX")?.as_i64()?;
    let y = data.get("SpawnY")?.as_i64()?;
    let z = data.get("SpawnZ")?.as_i64()?;
    Some(format!("X:{x} Y:{y} Z:{z}"))
}

fn data_version(data: &Compound) -> Option<String> {
    data.get("DataVersion").and_then(Value::scalar_string)
}

fn difficulty(data: &Compound) -> Option<String> {
    let code = data.get("Difficulty")?.as_i64()?;
    Some(render_difficulty(code))
}

fn hardcore(data: &Compound) -> Option<String> {
    let flag = data
        .get("hardcore")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(yes_no(flag))
}

fn allow_commands(data: &Compound) -> Option<String> {
    let flag = data.get("allowCommands").and_then(Value::as_bool)?;
    Some(yes_no(flag))
}

fn size_on_disk(data: &Compound) -> Option<String> {
    let bytes = data.get("SizeOnDisk")?.as_i64()?;
    Some(format_byte_size(bytes))
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn render_game_mode(code: i64) -> String {
    match code {
        0 => "Survival".to_string(),
        1 => "Creative".to_string(),
        2 => "Adventure".to_string(),
        3 => "Spectator".to_string(),
        other => format!("Unknown ({other})"),
    }
}

fn render_difficulty(code: i64) -> String {
    match code {
        0 => "Peaceful".to_string(),
        1 => "Easy".to_string(),
        2 => "Normal".to_string(),
        3 => "Hard".to_string(),
        other => format!("Unknown ({other})"),
    }
}

fn format_timestamp_millis(millis: i64) -> Option<String> {
    let ts = DateTime::from_timestamp_millis(millis)?;
    Some(ts.format(TIMESTAMP_FORMAT).to_string())
}

/// Byte counts with binary-threshold unit suffixes.
fn format_byte_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    let b = bytes as f64;
    if b > GB {
        format!("{:.2} GB", b / GB)
    } else if b > MB {
        format!("{:.2} MB", b / MB)
    } else if b > KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{bytes} bytes")
    }
}
