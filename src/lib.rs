//! Reader and immutable value model for EDN (Extensible Data Notation).
//!
//! [`parse`] reads the first value of a UTF-8 byte buffer into a
//! [`Document`]: an arena of nodes plus the root. Values are inspected
//! through [`ValueRef`] handles; equality, ordering and hashing are
//! structural, so `#{1 2}` equals `#{2 1}` and `{:a 1 :b 2}` equals
//! `{:b 2 :a 1}`.
//!
//! ```
//! let doc = edn_rs::parse(br#"{:name "Ada" :langs #{:en :fr}}"#).unwrap();
//! let root = doc.root();
//! assert_eq!(root.get_keyword("name").and_then(|v| v.as_str()), Some("Ada"));
//! assert_eq!(root.get_keyword("langs").map(|v| v.len()), Some(2));
//! ```
//!
//! Tagged literals (`#tag value`) are handed to the readers of a
//! [`ReaderRegistry`]; tags without a reader are handled according to
//! [`DefaultMode`]. Reader extensions that are not part of base EDN
//! (radix integers, ratios, metadata, digit separators, text blocks) are
//! switched on and off through [`ParseOptions`].

mod arena;
mod builtin;
mod error;
mod external;
mod options;
mod read;
mod registry;
mod scan;
mod value;

use memchr::memchr;
use tracing::debug;

pub use crate::{
    arena::{AllocError, Arena, NodeId},
    builtin::{INST_TYPE_ID, Instant, InstantError, UUID_TYPE_ID, Uuid, UuidError},
    error::{Error, ErrorKind, Result, Span},
    external::{
        EqualFn, External, ExternalData, HashFn, equal_as, hash_as, register_external_type,
        unregister_external_type,
    },
    options::{DEFAULT_MAX_DEPTH, EofFn, ParseOptions},
    read::{Document, Reader},
    registry::{DefaultMode, ReaderError, ReaderFn, ReaderRegistry},
    value::{
        BigDecValue, BigIntValue, BigRatioValue, EdnString, Entries, Ident, Items, Ratio, Tagged,
        Value, ValueKind, ValueRef,
    },
};

/// Parses the first value of `input` with default options.
///
/// Anything after the first value is ignored; use [`Reader`] to read every
/// top-level value.
pub fn parse(input: &[u8]) -> Result<Document<'_>> {
    parse_with_options(input, &ParseOptions::default())
}

/// Like [`parse`], but the input ends at the first NUL byte if it has one.
pub fn parse_nul_terminated(input: &[u8]) -> Result<Document<'_>> {
    let len = memchr(0, input).unwrap_or(input.len());
    parse(&input[..len])
}

/// Parses the first value of `input`.
///
/// ```
/// use edn_rs::{DefaultMode, ErrorKind, ParseOptions};
///
/// let strict = ParseOptions::new().default_mode(DefaultMode::Error);
/// let err = edn_rs::parse_with_options(b"#unknown 1", &strict).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::UnknownTag);
/// ```
pub fn parse_with_options<'a>(input: &'a [u8], options: &ParseOptions<'_>) -> Result<Document<'a>> {
    debug!(
        len = input.len(),
        max_depth = options.max_depth,
        default_mode = ?options.default_mode,
        has_registry = options.registry.is_some(),
        "parsing EDN"
    );
    let result = read::Parser::new(input, *options).and_then(read::Parser::parse_document);
    if let Err(err) = &result {
        debug!(kind = %err.kind(), span = ?err.span(), "EDN parse failed");
    }
    result
}
