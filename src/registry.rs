//! Deduplicating seed registry and lead table.
//!
//! The registry is keyed by seed value as a string: seeds are 64-bit signed
//! integers in practice, but legacy saves and log-derived values can be
//! arbitrary short strings. Records accumulate the best-known value of every
//! field across observations; `times_found` counts every merge.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

/// Rendering of a field with no recovered value.
pub const UNKNOWN: &str = "Unknown";

/// Timestamp rendering used for LastPlayed fields (and parsed back for the
/// recency tie-break).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Named fields carried by a seed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    FirstFoundIn,
    WorldName,
    GameMode,
    Generator,
    Version,
    LastPlayed,
    Path,
    TimePlayed,
    SpawnLocation,
    DataVersion,
    Difficulty,
    Hardcore,
    AllowCommands,
    SizeOnDisk,
}

impl FieldKey {
    pub const ALL: [FieldKey; 14] = [
        FieldKey::FirstFoundIn,
        FieldKey::WorldName,
        FieldKey::GameMode,
        FieldKey::Generator,
        FieldKey::Version,
        FieldKey::LastPlayed,
        FieldKey::Path,
        FieldKey::TimePlayed,
        FieldKey::SpawnLocation,
        FieldKey::DataVersion,
        FieldKey::Difficulty,
        FieldKey::Hardcore,
        FieldKey::AllowCommands,
        FieldKey::SizeOnDisk,
    ];

    /// Column name in the seed sheet.
    pub fn column_name(self) -> &'static str {
        match self {
            FieldKey::FirstFoundIn => "First Found In",
            FieldKey::WorldName => "World Name",
            FieldKey::GameMode => "Game Mode",
            FieldKey::Generator => "Generator",
            FieldKey::Version => "Version",
            FieldKey::LastPlayed => "Last Played",
            FieldKey::Path => "Path",
            FieldKey::TimePlayed => "Time Played",
            FieldKey::SpawnLocation => "Spawn Location",
            FieldKey::DataVersion => "Data Version",
            FieldKey::Difficulty => "Difficulty",
            FieldKey::Hardcore => "Hardcore",
            FieldKey::AllowCommands => "Allow Commands",
            FieldKey::SizeOnDisk => "Size on Disk",
        }
    }
}

/// Extracted field values for one parsed file. Absent keys are unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    values: BTreeMap<FieldKey, String>,
}

impl FieldBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Value for display, with the unknown sentinel for absent fields.
    pub fn display(&self, key: FieldKey) -> &str {
        self.get(key).unwrap_or(UNKNOWN)
    }

    pub fn is_known(&self, key: FieldKey) -> bool {
        self.values.contains_key(&key)
    }
}

/// Best-known information about one seed, accumulated across observations.
#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub fields: FieldBag,
    pub times_found: u64,
}

/// Deduplicating store keyed by seed value.
#[derive(Debug, Default)]
pub struct SeedRegistry {
    records: HashMap<String, SeedRecord>,
    order: Vec<String>,
}

impl SeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an observation of `seed` into the registry.
    ///
    /// `times_found` increments on every call including the first. A field
    /// that already holds a value is only replaced by another known value,
    /// and only when the field-specific tie-break prefers the newcomer:
    /// recency for LastPlayed, ordinal comparison for Version, otherwise the
    /// first write wins.
    pub fn merge(&mut self, seed: &str, fields: FieldBag) {
        match self.records.get_mut(seed) {
            None => {
                self.records.insert(
                    seed.to_string(),
                    SeedRecord {
                        fields,
                        times_found: 1,
                    },
                );
                self.order.push(seed.to_string());
            }
            Some(record) => {
                record.times_found += 1;
                for key in FieldKey::ALL {
                    merge_field(&mut record.fields, key, fields.get(key));
                }
            }
        }
    }

    pub fn get(&self, seed: &str) -> Option<&SeedRecord> {
        self.records.get(seed)
    }

    pub fn contains(&self, seed: &str) -> bool {
        self.records.contains_key(seed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records ordered by `times_found` descending, ties broken by
    /// first-insertion order.
    pub fn all(&self) -> Vec<(&str, &SeedRecord)> {
        let mut entries: Vec<(&str, &SeedRecord)> = self
            .order
            .iter()
            .map(|seed| (seed.as_str(), &self.records[seed]))
            .collect();
        entries.sort_by(|a, b| b.1.times_found.cmp(&a.1.times_found));
        entries
    }
}

fn merge_field(current: &mut FieldBag, key: FieldKey, incoming: Option<&str>) {
    let Some(new_value) = incoming else {
        return;
    };
    let Some(cur_value) = current.get(key) else {
        current.set(key, new_value);
        return;
    };
    match key {
        FieldKey::LastPlayed => {
            let cur = NaiveDateTime::parse_from_str(cur_value, TIMESTAMP_FORMAT);
            let new = NaiveDateTime::parse_from_str(new_value, TIMESTAMP_FORMAT);
            if let (Ok(cur), Ok(new)) = (cur, new) {
                if new > cur {
                    current.set(key, new_value);
                }
            }
        }
        FieldKey::Version => {
            if new_value > cur_value {
                current.set(key, new_value);
            }
        }
        _ => {}
    }
}

/// Confidence tier attached to a lead. Only ever upgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

/// A numeric token flagged as possibly being a seed, pending human review.
#[derive(Debug, Clone)]
pub struct LeadCandidate {
    pub token: String,
    pub filename: String,
    pub path: String,
    pub context: String,
    pub line: String,
    pub confidence: Confidence,
}

/// Deduplicating store of leads, keyed by raw token.
#[derive(Debug, Default)]
pub struct LeadTable {
    leads: HashMap<String, LeadCandidate>,
    order: Vec<String>,
}

impl LeadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation. A token already present keeps its original
    /// source; only a strictly higher-confidence observation refreshes the
    /// context, line, and tier.
    pub fn observe(&mut self, lead: LeadCandidate) {
        match self.leads.get_mut(&lead.token) {
            None => {
                self.order.push(lead.token.clone());
                self.leads.insert(lead.token.clone(), lead);
            }
            Some(existing) if lead.confidence > existing.confidence => {
                existing.context = lead.context;
                existing.line = lead.line;
                existing.confidence = lead.confidence;
            }
            Some(_) => {}
        }
    }

    /// Absorb every lead from another table, preserving upgrade-only rules.
    pub fn absorb(&mut self, other: LeadTable) {
        for lead in other.into_leads() {
            self.observe(lead);
        }
    }

    pub fn get(&self, token: &str) -> Option<&LeadCandidate> {
        self.leads.get(token)
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Leads in first-observation order.
    pub fn all(&self) -> impl Iterator<Item = &LeadCandidate> {
        self.order.iter().map(|token| &self.leads[token])
    }

    pub fn into_leads(mut self) -> Vec<LeadCandidate> {
        self.order
            .iter()
            .filter_map(|token| self.leads.remove(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(FieldKey, &str)]) -> FieldBag {
        let mut bag = FieldBag::new();
        for (key, value) in pairs {
            bag.set(*key, *value);
        }
        bag
    }

    #[test]
    fn double_merge_counts_twice_and_never_regresses() {
        let mut registry = SeedRegistry::new();
        registry.merge("42", bag(&[(FieldKey::WorldName, "Alpha")]));
        registry.merge("42", bag(&[]));
        let record = registry.get("42").unwrap();
        assert_eq!(record.times_found, 2);
        assert_eq!(record.fields.display(FieldKey::WorldName), "Alpha");
        assert_eq!(record.fields.display(FieldKey::GameMode), UNKNOWN);
    }

    #[test]
    fn unknown_fields_fill_in_from_later_observations() {
        let mut registry = SeedRegistry::new();
        registry.merge("7", bag(&[(FieldKey::WorldName, "Base")]));
        registry.merge("7", bag(&[(FieldKey::GameMode, "Creative")]));
        let fields = &registry.get("7").unwrap().fields;
        assert_eq!(fields.display(FieldKey::WorldName), "Base");
        assert_eq!(fields.display(FieldKey::GameMode), "Creative");
    }

    #[test]
    fn first_write_wins_for_plain_fields() {
        let mut registry = SeedRegistry::new();
        registry.merge("7", bag(&[(FieldKey::WorldName, "First")]));
        registry.merge("7", bag(&[(FieldKey::WorldName, "Second")]));
        assert_eq!(
            registry.get("7").unwrap().fields.display(FieldKey::WorldName),
            "First"
        );
    }

    #[test]
    fn last_played_prefers_recency() {
        let mut registry = SeedRegistry::new();
        registry.merge("7", bag(&[(FieldKey::LastPlayed, "2020-01-01 10:00:00")]));
        registry.merge("7", bag(&[(FieldKey::LastPlayed, "2023-06-15 09:30:00")]));
        registry.merge("7", bag(&[(FieldKey::LastPlayed, "2019-12-31 23:59:59")]));
        assert_eq!(
            registry.get("7").unwrap().fields.display(FieldKey::LastPlayed),
            "2023-06-15 09:30:00"
        );
    }

    #[test]
    fn version_prefers_ordinally_greater() {
        let mut registry = SeedRegistry::new();
        registry.merge("7", bag(&[(FieldKey::Version, "1.18.2")]));
        registry.merge("7", bag(&[(FieldKey::Version, "1.19")]));
        registry.merge("7", bag(&[(FieldKey::Version, "1.16.5")]));
        assert_eq!(
            registry.get("7").unwrap().fields.display(FieldKey::Version),
            "1.19"
        );
    }

    #[test]
    fn all_orders_by_times_found_then_insertion() {
        let mut registry = SeedRegistry::new();
        registry.merge("first", FieldBag::new());
        registry.merge("popular", FieldBag::new());
        registry.merge("popular", FieldBag::new());
        registry.merge("second", FieldBag::new());
        let seeds: Vec<&str> = registry.all().into_iter().map(|(s, _)| s).collect();
        assert_eq!(seeds, vec!["popular", "first", "second"]);
    }

    fn lead(token: &str, confidence: Confidence) -> LeadCandidate {
        LeadCandidate {
            token: token.to_string(),
            filename: "latest.log".to_string(),
            path: "/logs".to_string(),
            context: format!("ctx {token}"),
            line: format!("line {token}"),
            confidence,
        }
    }

    #[test]
    fn lead_confidence_only_upgrades() {
        let mut table = LeadTable::new();
        table.observe(lead("123456789", Confidence::High));
        table.observe(lead("123456789", Confidence::Low));
        table.observe(lead("123456789", Confidence::Medium));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("123456789").unwrap().confidence,
            Confidence::High
        );
    }

    #[test]
    fn lead_upgrade_refreshes_context() {
        let mut table = LeadTable::new();
        let mut low = lead("99999", Confidence::Low);
        low.context = "old ctx".into();
        table.observe(low);
        let mut high = lead("99999", Confidence::High);
        high.context = "new ctx".into();
        table.observe(high);
        let stored = table.get("99999").unwrap();
        assert_eq!(stored.confidence, Confidence::High);
        assert_eq!(stored.context, "new ctx");
    }

    #[test]
    fn absorb_preserves_order_and_rules() {
        let mut a = LeadTable::new();
        a.observe(lead("111111", Confidence::Low));
        let mut b = LeadTable::new();
        b.observe(lead("222222", Confidence::Medium));
        b.observe(lead("111111", Confidence::High));
        a.absorb(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("111111").unwrap().confidence, Confidence::High);
        let tokens: Vec<&str> = a.all().map(|l| l.token.as_str()).collect();
        assert_eq!(tokens, vec!["111111", "222222"]);
    }
}
