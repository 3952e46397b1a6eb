//! Command catalogue
//!
//! Immutable zone → command → value tables. Loaded once, either from the
//! built-in definitions or from a JSON document shaped like:
//!
//! ```text
//! { "zones": [
//!     { "name": "main", "aliases": ["zone1"], "commands": [
//!         { "prefix": "PWR", "names": ["system-power", "power"],
//!           "description": "System Power Command",
//!           "values": [
//!             { "code": "01", "names": ["on"] },
//!             { "range": [0, 100], "names": ["level"] },
//!             { "pattern": "nnnnn", "names": ["frequency"] } ] } ] } ] }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use super::builtin;
use crate::error::{EiscpError, Result};
use crate::protocol::PREFIX_LEN;

/// Inclusive numeric range accepted by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub start: i64,
    pub end: i64,
}

impl ValueRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// What a value table entry matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKey {
    /// A literal wire code, e.g. `01` or `QSTN`
    Code(String),

    /// Any integer inside the range, hex encoded on the wire
    Range(ValueRange),

    /// A free-form pattern such as `nnnnn` (not encodable)
    Pattern(String),
}

/// One entry of a command's value table
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub key: ValueKey,

    /// Names and aliases, primary name first
    pub names: Vec<String>,

    pub description: String,
}

impl ValueSpec {
    /// Primary name (falls back to the wire code)
    pub fn name(&self) -> &str {
        match (self.names.first(), &self.key) {
            (Some(name), _) => name,
            (None, ValueKey::Code(code)) => code,
            (None, ValueKey::Pattern(pattern)) => pattern,
            (None, ValueKey::Range(_)) => "",
        }
    }
}

/// A command descriptor: prefix, names and value table
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// 3-character wire prefix
    pub prefix: String,

    /// Names and aliases, primary name first
    pub names: Vec<String>,

    pub description: String,

    pub values: Vec<ValueSpec>,
}

impl CommandSpec {
    /// Primary name (falls back to the prefix)
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.prefix)
    }

    /// Find the literal value with the given name or alias
    pub fn value_by_name(&self, name: &str) -> Option<&ValueSpec> {
        self.values.iter().find(|v| {
            matches!(v.key, ValueKey::Code(_)) && v.names.iter().any(|n| n == name)
        })
    }

    /// Find the literal value with the given wire code
    pub fn value_by_code(&self, code: &str) -> Option<&ValueSpec> {
        self.values
            .iter()
            .find(|v| matches!(&v.key, ValueKey::Code(c) if c == code))
    }

    /// Declared numeric ranges, in table order
    pub fn ranges(&self) -> impl Iterator<Item = &ValueRange> {
        self.values.iter().filter_map(|v| match &v.key {
            ValueKey::Range(range) => Some(range),
            _ => None,
        })
    }
}

/// Commands of one zone, indexed by prefix and by name
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    commands: Vec<CommandSpec>,
    by_prefix: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl Zone {
    fn new(name: String, commands: Vec<CommandSpec>) -> Self {
        let mut by_prefix = HashMap::with_capacity(commands.len());
        let mut by_name = HashMap::new();
        for (idx, command) in commands.iter().enumerate() {
            by_prefix.insert(command.prefix.clone(), idx);
            for name in &command.names {
                by_name.entry(name.clone()).or_insert(idx);
            }
        }
        Self {
            name,
            commands,
            by_prefix,
            by_name,
        }
    }

    /// Look up a command by its wire prefix
    pub fn command(&self, prefix: &str) -> Option<&CommandSpec> {
        self.by_prefix.get(prefix).map(|&idx| &self.commands[idx])
    }

    /// Look up a command by name or alias
    pub fn command_by_name(&self, name: &str) -> Option<&CommandSpec> {
        self.by_name.get(name).map(|&idx| &self.commands[idx])
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }
}

/// The complete zone/command/value catalogue
#[derive(Debug, Clone)]
pub struct Catalogue {
    /// Zones in declaration order (reverse lookups scan in this order)
    zones: Vec<Zone>,

    /// Zone name or alias → index into `zones`
    zone_index: HashMap<String, usize>,
}

static BUILTIN: OnceLock<Arc<Catalogue>> = OnceLock::new();

impl Catalogue {
    /// The built-in catalogue of common commands
    pub fn builtin() -> Arc<Catalogue> {
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(builtin::catalogue())))
    }

    /// Load a catalogue from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalogue = serde_json::from_str(json)
            .map_err(|e| EiscpError::Catalogue(format!("Invalid catalogue JSON: {}", e)))?;
        raw.validate()
    }

    pub(crate) fn from_zones(zones: Vec<(Zone, Vec<String>)>) -> Self {
        let mut zone_index = HashMap::new();
        let mut ordered = Vec::with_capacity(zones.len());
        for (idx, (zone, aliases)) in zones.into_iter().enumerate() {
            zone_index.insert(zone.name.clone(), idx);
            for alias in aliases {
                zone_index.entry(alias).or_insert(idx);
            }
            ordered.push(zone);
        }
        Self {
            zones: ordered,
            zone_index,
        }
    }

    /// Resolve a zone by name or alias
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zone_index.get(name).map(|&idx| &self.zones[idx])
    }

    /// All zones in declaration order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

// =============================================================================
// Construction helpers shared by the built-in tables and JSON loading
// =============================================================================

pub(crate) fn build_zone(name: &str, commands: Vec<CommandSpec>) -> Zone {
    Zone::new(name.to_lowercase(), commands)
}

// =============================================================================
// JSON representation
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawCatalogue {
    zones: Vec<RawZone>,
}

#[derive(Debug, Deserialize)]
struct RawZone {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    commands: Vec<RawCommand>,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    prefix: String,
    names: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    values: Vec<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    code: Option<String>,
    range: Option<(i64, i64)>,
    pattern: Option<String>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    description: String,
}

fn lowercase_all(names: Vec<String>) -> Vec<String> {
    names.into_iter().map(|n| n.trim().to_lowercase()).collect()
}

impl RawCatalogue {
    fn validate(self) -> Result<Catalogue> {
        let mut zones = Vec::with_capacity(self.zones.len());
        for raw_zone in self.zones {
            let mut commands = Vec::with_capacity(raw_zone.commands.len());
            for raw_command in raw_zone.commands {
                commands.push(raw_command.validate(&raw_zone.name)?);
            }
            zones.push((
                build_zone(&raw_zone.name, commands),
                lowercase_all(raw_zone.aliases),
            ));
        }
        Ok(Catalogue::from_zones(zones))
    }
}

impl RawCommand {
    fn validate(self, zone: &str) -> Result<CommandSpec> {
        if self.prefix.chars().count() != PREFIX_LEN {
            return Err(EiscpError::Catalogue(format!(
                "Command prefix \"{}\" in zone \"{}\" must be {} characters",
                self.prefix, zone, PREFIX_LEN
            )));
        }

        let mut values = Vec::with_capacity(self.values.len());
        for raw_value in self.values {
            let key = match (raw_value.code, raw_value.range, raw_value.pattern) {
                (Some(code), None, None) => ValueKey::Code(code),
                (None, Some((start, end)), None) if start <= end => {
                    ValueKey::Range(ValueRange::new(start, end))
                }
                (None, None, Some(pattern)) => ValueKey::Pattern(pattern),
                _ => {
                    return Err(EiscpError::Catalogue(format!(
                        "Value of command \"{}\" needs exactly one of code, range (start <= end) or pattern",
                        self.prefix
                    )))
                }
            };
            values.push(ValueSpec {
                key,
                names: lowercase_all(raw_value.names),
                description: raw_value.description,
            });
        }

        Ok(CommandSpec {
            prefix: self.prefix,
            names: lowercase_all(self.names),
            description: self.description,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "zones": [
            { "name": "main", "aliases": ["zone1"], "commands": [
                { "prefix": "PWR", "names": ["System-Power", "power"],
                  "values": [
                    { "code": "00", "names": ["standby", "off"] },
                    { "code": "01", "names": ["on"] }
                  ] },
                { "prefix": "MVL", "names": ["master-volume", "volume"],
                  "values": [ { "range": [0, 100], "names": ["level"] } ] }
            ] },
            { "name": "zone2", "aliases": ["z2"], "commands": [
                { "prefix": "ZPW", "names": ["power"], "values": [] }
            ] }
        ]
    }"#;

    #[test]
    fn test_from_json_lookups() {
        let catalogue = Catalogue::from_json(SMALL).unwrap();

        let main = catalogue.zone("zone1").unwrap();
        assert_eq!(main.name, "main");

        let power = main.command_by_name("power").unwrap();
        assert_eq!(power.prefix, "PWR");
        assert_eq!(power.name(), "system-power");
        assert_eq!(power.value_by_name("off").unwrap().name(), "standby");
        assert_eq!(power.value_by_code("01").unwrap().name(), "on");

        let volume = main.command("MVL").unwrap();
        assert!(volume.ranges().any(|r| r.contains(100)));
        assert!(!volume.ranges().any(|r| r.contains(101)));

        assert_eq!(catalogue.zone("z2").unwrap().name, "zone2");
        assert!(catalogue.zone("zone9").is_none());
    }

    #[test]
    fn test_zone_order_preserved() {
        let catalogue = Catalogue::from_json(SMALL).unwrap();
        let names: Vec<_> = catalogue.zones().iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["main", "zone2"]);
    }

    #[test]
    fn test_from_json_rejects_bad_prefix() {
        let json = r#"{ "zones": [ { "name": "main", "commands": [
            { "prefix": "PW", "names": ["power"] } ] } ] }"#;
        assert!(matches!(
            Catalogue::from_json(json),
            Err(EiscpError::Catalogue(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_ambiguous_value() {
        let json = r#"{ "zones": [ { "name": "main", "commands": [
            { "prefix": "PWR", "names": ["power"],
              "values": [ { "code": "00", "range": [0, 1] } ] } ] } ] }"#;
        assert!(matches!(
            Catalogue::from_json(json),
            Err(EiscpError::Catalogue(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            Catalogue::from_json("{ not json"),
            Err(EiscpError::Catalogue(_))
        ));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = Catalogue::builtin();
        let b = Catalogue::builtin();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.zone("main").is_some());
    }
}
