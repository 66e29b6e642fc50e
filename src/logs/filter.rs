//! Noise filtering for server-log lines.
//!
//! A line is worth seed extraction only when it carries at least one
//! allow-list keyword and no deny-list phrase. The deny list covers
//! connection lifecycle, chat, and routine command chatter, and it takes
//! precedence over the allow list.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

/// Routine server-log phrases that disqualify a line.
static DENY_PHRASES: &[&str] = &[
    "RCON running on",
    "Starting minecraft server version",
    "Starting Minecraft server on",
    "Starting integrated minecraft server",
    "Starting integrated server",
    "Loading properties",
    "Default game type:",
    "Preparing level",
    "Preparing start region",
    "Preparing spawn area",
    "Preparing spawn region",
    "Preparing dimension",
    "Loading dimension",
    "Time elapsed",
    "Done (",
    "[Server thread/INFO]",
    "[Server thread/WARN]",
    "[Server thread/ERROR]",
    "[Server Shutdown Thread/INFO]",
    "Using epoll channel type",
    "Starting GS4 status listener",
    "Thread RCON Listener started",
    "Stopping server",
    "Stopping the server",
    "Stopping singleplayer server",
    "Commencing server shutdown",
    "Saving players",
    "Saving worlds",
    "Saving chunks",
    "Saving chunks for level",
    "Saving and pausing game",
    "Saving the game",
    "Saving crash report",
    "ThreadedAnvilChunkStorage",
    "Connection #",
    "UUID of player",
    "logged in with entity id",
    "logged in successfully",
    "lost connection:",
    "left the game",
    "joined the game",
    "[Not Secure]",
    "[Async Chat Thread",
    "[User Authenticator",
    "moved wrongly!",
    "moved too quickly!",
    "moved too far!",
    "Playing effect",
    "Changing view distance to",
    "tried command",
    "issued server command",
    "Fetching addPacket",
    "handleDisconnection",
    "Reached end of stream",
    "closed connection",
    "For help",
    "Unknown command",
    "Invalid command syntax",
    "/tp ",
    "/teleport ",
    "/give ",
    "/kill ",
    "/me ",
    "/say ",
    "/tell ",
    "/msg ",
    "/op ",
    "/deop ",
    "/xp ",
    "/experience ",
    "/whitelist ",
    "/gamerule ",
    "/defaultgamemode ",
    "/toggledownfall ",
    "/spreadplayers ",
    "/setworldspawn ",
    "/spawnpoint ",
    "/worldborder ",
    "/playsound ",
    "/stopsound ",
    "/enchant ",
    "/summon ",
    "/setblock ",
    "/fill ",
    "/clear ",
    "/effect ",
    "/replaceitem ",
    "/testfor ",
    "/scoreboard ",
    "/advancement ",
    "/recipe ",
    "/trigger ",
    "/title ",
    "/weather ",
    "/time set ",
    "/save-all",
    "/save-off",
    "/save-on",
];

/// Keywords that make a line worth keeping.
static ALLOW_KEYWORDS: &[&str] = &[
    "seed",
    "Seed",
    "/seed",
    "minecraft",
    "world",
    "generate",
    "creating",
    "version",
    "gamemode",
    "GameType",
    "difficulty",
    "hardcore",
    "cheats",
    "allowCommands",
    "DataVersion",
    "WanderingTrader",
    "SpawnX",
    "SpawnY",
    "SpawnZ",
    "Time",
    "LastPlayed",
    "SizeOnDisk",
    "World Settings",
    "World Generation",
    "Random seed",
    "World seed",
];

static DENY: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(DENY_PHRASES).expect("valid deny phrase set"));

static ALLOW: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(ALLOW_KEYWORDS).expect("valid allow keyword set"));

/// Whether a log line is worth seed extraction. Deny wins over allow.
pub fn is_meaningful(line: &str) -> bool {
    if DENY.is_match(line) {
        return false;
    }
    ALLOW.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_lines_pass() {
        assert!(is_meaningful("Random Seed: 12345"));
        assert!(is_meaningful("World seed is 98765"));
        assert!(is_meaningful("Generating world with seed -42"));
    }

    #[test]
    fn routine_chatter_is_denied() {
        assert!(!is_meaningful("Steve joined the game"));
        assert!(!is_meaningful("Alex lost connection: Disconnected"));
        assert!(!is_meaningful("Preparing start region for dimension"));
        assert!(!is_meaningful("Done (3.371s)! For help, type \"help\""));
    }

    #[test]
    fn deny_takes_precedence_over_allow() {
        // Carries the "world" keyword but also a deny phrase.
        assert!(!is_meaningful("Saving chunks for level 'world'/overworld"));
    }

    #[test]
    fn keyword_free_lines_are_noise() {
        assert!(!is_meaningful("[12:00:00] some unrelated output"));
        assert!(!is_meaningful(""));
    }
}
