//! Value codecs
//!
//! Turn a pretty argument (`on`, `42`, `-3`) into the value part of a wire
//! command. Each codec covers one encoding family:
//!
//! | Codec            | Argument        | Wire value            |
//! |------------------|-----------------|-----------------------|
//! | `AliasCodec`     | `on`            | `01`                  |
//! | `HexCodec`       | `42`            | `2A`                  |
//! | `SignedHexCodec` | `0`, `3`, `-12` | `000`, `+03`, `-0C`   |

use super::catalogue::CommandSpec;
use crate::error::{EiscpError, Result};

/// Prefixes whose numeric values use signed-offset display
pub const SIGNED_OFFSET_PREFIXES: [&str; 2] = ["SWL", "CTL"];

/// Encoding of an argument into a wire value
pub trait ValueCodec: Send + Sync {
    /// Returns `None` when the codec does not apply to `argument`,
    /// `Some(Err(..))` when it applies but the argument is invalid.
    fn encode(&self, command: &CommandSpec, argument: &str) -> Option<Result<String>>;
}

/// Literal alias lookup in the command's value table
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasCodec;

impl ValueCodec for AliasCodec {
    fn encode(&self, command: &CommandSpec, argument: &str) -> Option<Result<String>> {
        command.value_by_name(argument).map(|value| match &value.key {
            super::ValueKey::Code(code) => Ok(code.clone()),
            _ => Err(EiscpError::translation(format!(
                "\"{}\" has no literal code",
                argument
            ))),
        })
    }
}

/// Two-digit uppercase hex for integers inside a declared range
#[derive(Debug, Clone, Copy, Default)]
pub struct HexCodec;

impl ValueCodec for HexCodec {
    fn encode(&self, command: &CommandSpec, argument: &str) -> Option<Result<String>> {
        let n = parse_integer(argument)?;
        Some(check_range(command, n).and_then(|n| {
            if n < 0 {
                return Err(EiscpError::translation(format!(
                    "{} cannot be hex encoded for command \"{}\"",
                    n,
                    command.name()
                )));
            }
            Ok(format!("{:02X}", n))
        }))
    }
}

/// Signed-offset hex: `000` for zero, `+XX` above, `-XX` below
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedHexCodec;

impl ValueCodec for SignedHexCodec {
    fn encode(&self, command: &CommandSpec, argument: &str) -> Option<Result<String>> {
        let n = parse_integer(argument)?;
        Some(check_range(command, n).map(|n| match n {
            0 => "000".to_string(),
            n if n > 0 => format!("+{:02X}", n),
            n => format!("-{:02X}", n.unsigned_abs()),
        }))
    }
}

/// The numeric codec used for a command prefix
pub fn numeric_codec_for(prefix: &str) -> &'static dyn ValueCodec {
    if SIGNED_OFFSET_PREFIXES.contains(&prefix) {
        &SignedHexCodec
    } else {
        &HexCodec
    }
}

fn check_range(command: &CommandSpec, n: i64) -> Result<i64> {
    if command.ranges().any(|range| range.contains(n)) {
        Ok(n)
    } else {
        Err(EiscpError::translation(format!(
            "{} is outside every range of command \"{}\"",
            n,
            command.name()
        )))
    }
}

/// Integer literal: optional leading `-` followed by decimal digits
pub fn parse_integer(argument: &str) -> Option<i64> {
    let digits = argument.strip_prefix('-').unwrap_or(argument);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    argument.parse().ok()
}

/// Matches `[+-]?[0-9a-fA-F]+`
pub fn is_signed_hex(text: &str) -> bool {
    let digits = text
        .strip_prefix('+')
        .or_else(|| text.strip_prefix('-'))
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandSpec, ValueKey, ValueRange, ValueSpec};

    fn command(prefix: &str, ranges: &[(i64, i64)]) -> CommandSpec {
        let mut values: Vec<ValueSpec> = ranges
            .iter()
            .map(|&(start, end)| ValueSpec {
                key: ValueKey::Range(ValueRange::new(start, end)),
                names: Vec::new(),
                description: String::new(),
            })
            .collect();
        values.push(ValueSpec {
            key: ValueKey::Code("QSTN".into()),
            names: vec!["query".into()],
            description: String::new(),
        });
        CommandSpec {
            prefix: prefix.into(),
            names: vec!["test".into()],
            description: String::new(),
            values,
        }
    }

    #[test]
    fn test_alias_codec() {
        let cmd = command("MVL", &[(0, 100)]);
        assert_eq!(AliasCodec.encode(&cmd, "query").unwrap().unwrap(), "QSTN");
        assert!(AliasCodec.encode(&cmd, "nope").is_none());
    }

    #[test]
    fn test_hex_codec() {
        let cmd = command("MVL", &[(0, 100)]);
        assert_eq!(HexCodec.encode(&cmd, "0").unwrap().unwrap(), "00");
        assert_eq!(HexCodec.encode(&cmd, "42").unwrap().unwrap(), "2A");
        assert_eq!(HexCodec.encode(&cmd, "100").unwrap().unwrap(), "64");
        assert!(HexCodec.encode(&cmd, "101").unwrap().is_err());
        assert!(HexCodec.encode(&cmd, "up").is_none());
    }

    #[test]
    fn test_hex_codec_rejects_negative() {
        let cmd = command("XYZ", &[(-5, 5)]);
        assert!(HexCodec.encode(&cmd, "-1").unwrap().is_err());
    }

    #[test]
    fn test_signed_hex_codec() {
        let cmd = command("SWL", &[(-15, 12)]);
        assert_eq!(SignedHexCodec.encode(&cmd, "0").unwrap().unwrap(), "000");
        assert_eq!(SignedHexCodec.encode(&cmd, "3").unwrap().unwrap(), "+03");
        assert_eq!(SignedHexCodec.encode(&cmd, "12").unwrap().unwrap(), "+0C");
        assert_eq!(SignedHexCodec.encode(&cmd, "-3").unwrap().unwrap(), "-03");
        assert_eq!(SignedHexCodec.encode(&cmd, "-15").unwrap().unwrap(), "-0F");
        assert!(SignedHexCodec.encode(&cmd, "13").unwrap().is_err());
    }

    #[test]
    fn test_numeric_codec_selection() {
        let swl = command("SWL", &[(-15, 12)]);
        let mvl = command("MVL", &[(0, 100)]);
        assert_eq!(
            numeric_codec_for("SWL").encode(&swl, "5").unwrap().unwrap(),
            "+05"
        );
        assert_eq!(
            numeric_codec_for("MVL").encode(&mvl, "5").unwrap().unwrap(),
            "05"
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("+7"), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer("4a"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn test_is_signed_hex() {
        assert!(is_signed_hex("2A"));
        assert!(is_signed_hex("+0c"));
        assert!(is_signed_hex("-0C"));
        assert!(!is_signed_hex("QSTN"));
        assert!(!is_signed_hex("+"));
        assert!(!is_signed_hex(""));
    }
}
