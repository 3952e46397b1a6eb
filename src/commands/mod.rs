//! Commands Module
//!
//! Human-readable command translation.
//!
//! ## Pieces
//! - `Catalogue`: immutable zone/command/value tables (pure data)
//! - `ValueCodec`: per-family value encoding (alias, hex, signed-offset hex)
//! - `CommandTranslator`: pretty command ⇄ wire message

mod builtin;
mod catalogue;
mod translator;
mod value;

pub use catalogue::{Catalogue, CommandSpec, ValueKey, ValueRange, ValueSpec, Zone};
pub use translator::{CommandTranslator, CommandValue, PrettyCommand, Translated, DEFAULT_ZONE};
pub use value::{
    numeric_codec_for, AliasCodec, HexCodec, SignedHexCodec, ValueCodec, SIGNED_OFFSET_PREFIXES,
};
