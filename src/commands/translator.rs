//! Command translation
//!
//! Maps human-readable ("pretty") commands to ISCP wire codes and back.
//!
//! ```text
//! ("main", "volume", "42")  ──to_protocol──▶  "MVL2A"
//! "MVL2A"                   ──from_protocol─▶ ("main", "master-volume", 42)
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use super::catalogue::Catalogue;
use super::value::{is_signed_hex, numeric_codec_for, AliasCodec, ValueCodec};
use crate::error::{EiscpError, Result};
use crate::protocol::{prefix_of, PREFIX_LEN};

/// Zone used when a command string does not name one
pub const DEFAULT_ZONE: &str = "main";

fn norm(token: &str) -> String {
    token.trim().to_lowercase()
}

fn split_tokens<'a>(text: &'a str, separators: &'a [char]) -> impl Iterator<Item = String> + 'a {
    text.split(separators).map(norm).filter(|t| !t.is_empty())
}

/// A command in pretty form: zone, command name, arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrettyCommand {
    pub zone: String,
    pub command: String,
    pub arguments: Vec<String>,
}

impl PrettyCommand {
    /// Build a command from explicit parts
    pub fn new<I, S>(zone: &str, command: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            zone: norm(zone),
            command: norm(command),
            arguments: arguments.into_iter().map(|a| norm(a.as_ref())).collect(),
        }
    }

    /// Parse one of the single-string shapes
    ///
    /// - `"zone.command=arg1,arg2"` / `"command:arg"`
    /// - `"zone command arg"` / `"command arg"` (space or dot separated)
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(split_at) = input.find(|c: char| c == ':' || c == '=') {
            let (base, rest) = input.split_at(split_at);
            let parts: Vec<String> = split_tokens(base, &['.', ' ']).collect();
            let (zone, command) = match parts.as_slice() {
                [zone, command] => (zone.clone(), command.clone()),
                [command, ..] => (DEFAULT_ZONE.to_string(), command.clone()),
                [] => {
                    return Err(EiscpError::translation(format!(
                        "No command given in \"{}\"",
                        input
                    )))
                }
            };
            let arguments = split_tokens(&rest[1..], &[' ', ',']).collect();
            return Ok(Self {
                zone,
                command,
                arguments,
            });
        }

        let mut parts: Vec<String> = split_tokens(input, &['.', ' ']).collect();
        match parts.len() {
            0 | 1 => Err(EiscpError::translation(format!(
                "Need at least command and argument, got \"{}\"",
                input
            ))),
            2 => {
                let argument = parts.pop().unwrap_or_default();
                let command = parts.pop().unwrap_or_default();
                Ok(Self {
                    zone: DEFAULT_ZONE.to_string(),
                    command,
                    arguments: vec![argument],
                })
            }
            _ => {
                let arguments = parts.split_off(2);
                let command = parts.pop().unwrap_or_default();
                let zone = parts.pop().unwrap_or_default();
                Ok(Self {
                    zone,
                    command,
                    arguments,
                })
            }
        }
    }
}

impl FromStr for PrettyCommand {
    type Err = EiscpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A decoded value from a receiver message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    /// Named value from the catalogue (e.g. `on`)
    Name(String),

    /// Hex-encoded number (e.g. volume level)
    Number(i64),

    /// Anything else, passed through verbatim
    Raw(String),
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Name(name) => f.write_str(name),
            CommandValue::Number(n) => write!(f, "{}", n),
            CommandValue::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Result of translating a wire message back to pretty form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translated {
    pub zone: String,
    pub command: String,
    pub value: CommandValue,
}

/// Bidirectional pretty ⇄ wire translation over a catalogue
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    catalogue: Arc<Catalogue>,
}

impl Default for CommandTranslator {
    fn default() -> Self {
        Self::new(Catalogue::builtin())
    }
}

impl CommandTranslator {
    pub fn new(catalogue: Arc<Catalogue>) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Translate a pretty command into a wire message body
    pub fn to_protocol(&self, command: &PrettyCommand) -> Result<String> {
        let zone = self.catalogue.zone(&command.zone).ok_or_else(|| {
            EiscpError::translation(format!("\"{}\" is not a valid zone", command.zone))
        })?;

        let spec = zone.command_by_name(&command.command).ok_or_else(|| {
            EiscpError::translation(format!(
                "\"{}\" is not a valid command in zone \"{}\"",
                command.command, command.zone
            ))
        })?;

        // Only the first argument is used
        let argument = command.arguments.first().ok_or_else(|| {
            EiscpError::translation(format!(
                "Command \"{}\" needs an argument",
                command.command
            ))
        })?;

        let codecs: [&dyn ValueCodec; 2] = [&AliasCodec, numeric_codec_for(&spec.prefix)];
        let value = codecs
            .iter()
            .find_map(|codec| codec.encode(spec, argument))
            .unwrap_or_else(|| {
                Err(EiscpError::translation(format!(
                    "\"{}\" is not a valid argument for command \"{}\" in zone \"{}\"",
                    argument, command.command, command.zone
                )))
            })?;

        Ok(format!("{}{}", spec.prefix, value))
    }

    /// Parse a pretty command string and translate it
    pub fn to_protocol_str(&self, input: &str) -> Result<String> {
        self.to_protocol(&PrettyCommand::parse(input)?)
    }

    /// Translate a wire message body into pretty form
    ///
    /// Zones are scanned in catalogue order; the first zone that knows the
    /// prefix wins.
    pub fn from_protocol(&self, message: &str) -> Result<Translated> {
        let prefix = prefix_of(message);
        if prefix.chars().count() < PREFIX_LEN {
            return Err(EiscpError::translation(format!(
                "Cannot convert ISCP message to command: {}",
                message
            )));
        }
        let suffix = &message[prefix.len()..];

        for zone in self.catalogue.zones() {
            let Some(spec) = zone.command(prefix) else {
                continue;
            };

            let value = if let Some(known) = spec.value_by_code(suffix) {
                CommandValue::Name(known.name().to_string())
            } else if is_signed_hex(suffix) {
                i64::from_str_radix(suffix, 16)
                    .map(CommandValue::Number)
                    .unwrap_or_else(|_| CommandValue::Raw(suffix.to_string()))
            } else {
                CommandValue::Raw(suffix.to_string())
            };

            return Ok(Translated {
                zone: zone.name.clone(),
                command: spec.name().to_string(),
                value,
            });
        }

        Err(EiscpError::translation(format!(
            "Cannot convert ISCP message to command: {}",
            message
        )))
    }
}
