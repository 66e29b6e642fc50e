//! Mining of plaintext and gzip-framed logs for seeds and leads.
//!
//! Lines stream through three layers: sticky context patterns (version and
//! game mode), noise filtering ahead of seed extraction, and generic lead
//! mining that runs on every non-empty line. Results come back as a
//! self-contained value; the caller decides what reaches shared state.

pub mod filter;
pub mod miner;
pub mod patterns;

pub use filter::is_meaningful;
pub use miner::{mine_gz_file, mine_lines, mine_plain_file, MinedLog, SeedHit};
