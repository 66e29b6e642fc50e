//! Binary tag-tree (NBT) decoding and world-metadata extraction.
//!
//! The format is a compact self-describing binary structure of nested named
//! compounds, lists, and typed scalars, usually gzip-framed on disk. Decoding
//! here is strictly best-effort: world files recovered from damaged disks are
//! routinely truncated mid-node, and a missing field must never cost the
//! fields that survive.

pub mod decode;
pub mod extract;
pub mod value;

pub use decode::{decode_bytes, inflate_gzip};
pub use extract::{extract_world, find_seed, WorldRecord};
pub use value::{Compound, Value};
