//! Readers for the two tags every EDN implementation is expected to know:
//! `#inst` and `#uuid`.
//!
//! They are opt-in. Build a registry with [`ReaderRegistry::with_builtins`]
//! (and register further tags on it) to have `#inst "..."` produce an
//! [`Instant`] and `#uuid "..."` a [`Uuid`], both as external values.

mod inst;
mod uuid;

pub use inst::{Instant, InstantError};
pub use uuid::{Uuid, UuidError};

use crate::{
    arena::{Arena, NodeId},
    error::Span,
    external::{equal_as, hash_as, register_external_type},
    registry::{ReaderError, ReaderRegistry},
};

/// External type-id of values produced by `#inst`.
pub const INST_TYPE_ID: u32 = 0x696e_7374;
/// External type-id of values produced by `#uuid`.
pub const UUID_TYPE_ID: u32 = 0x7575_6964;

impl ReaderRegistry {
    /// Registry with readers for `#inst` and `#uuid`.
    ///
    /// Also registers equality and hash callbacks for both external types,
    /// so that two instants denoting the same moment compare equal.
    pub fn with_builtins() -> Self {
        register_external_type(INST_TYPE_ID, equal_as::<Instant>, hash_as::<Instant>);
        register_external_type(UUID_TYPE_ID, equal_as::<Uuid>, hash_as::<Uuid>);

        let mut registry = Self::new();
        registry.register("inst", read_inst);
        registry.register("uuid", read_uuid);
        registry
    }
}

fn string_operand<'d>(arena: &'d Arena<'_>, id: NodeId) -> Result<&'d str, ReaderError> {
    let value = arena.get(id);
    value
        .as_str()
        .ok_or_else(|| ReaderError::message(format!("expected a string, found {}", value.kind())))
}

fn read_inst(arena: &mut Arena<'_>, id: NodeId) -> Result<NodeId, ReaderError> {
    let instant: Instant = string_operand(arena, id)?
        .parse()
        .map_err(|err: InstantError| ReaderError::message(err.to_string()))?;
    Ok(arena.alloc_external(INST_TYPE_ID, instant, Span::default())?)
}

fn read_uuid(arena: &mut Arena<'_>, id: NodeId) -> Result<NodeId, ReaderError> {
    let uuid: Uuid = string_operand(arena, id)?
        .parse()
        .map_err(|err: UuidError| ReaderError::message(err.to_string()))?;
    Ok(arena.alloc_external(UUID_TYPE_ID, uuid, Span::default())?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        error::ErrorKind,
        options::ParseOptions,
        read::tests::parse_with,
        value::ValueKind,
    };

    #[test]
    fn inst_and_uuid_become_externals() {
        let registry = ReaderRegistry::with_builtins();
        let options = ParseOptions::default().registry(&registry);
        let doc = parse_with(
            r#"[#inst "1985-04-12T23:20:50.52Z" #uuid "f81d4fae-7dec-11d0-a765-00a0c91e6bf6"]"#,
            options,
        )
        .unwrap();

        let inst = doc.root().get(0).unwrap();
        assert_eq!(inst.kind(), ValueKind::External);
        assert!(inst.is_external_type(INST_TYPE_ID));
        let instant = inst.external_get::<Instant>(INST_TYPE_ID).unwrap();
        assert_eq!(instant.unix_nanos(), 482_196_050_520_000_000);
        assert_eq!(inst.span(), Span::new(1, 32));

        let uuid = doc.root().get(1).unwrap();
        assert_eq!(
            uuid.external_get::<Uuid>(UUID_TYPE_ID).map(ToString::to_string).as_deref(),
            Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")
        );
    }

    #[test]
    fn same_moment_is_equal_across_offsets() {
        let registry = ReaderRegistry::with_builtins();
        let options = ParseOptions::default().registry(&registry);
        let a = parse_with(r#"#inst "1996-12-19T16:39:57-08:00""#, options).unwrap();
        let b = parse_with(r#"#inst "1996-12-20T00:39:57Z""#, options).unwrap();
        assert_eq!(a.root(), b.root());
        assert_eq!(a.root().hash64(), b.root().hash64());

        let err = parse_with(r#"#{#uuid "00000000-0000-0000-0000-00000000000A" #uuid "00000000-0000-0000-0000-00000000000a"}"#, options)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateElement);
    }

    #[test]
    fn malformed_operands_are_rejected() {
        let registry = ReaderRegistry::with_builtins();
        let options = ParseOptions::default().registry(&registry);
        for input in [
            "#inst 42",
            r#"#inst "1985-13-01""#,
            r#"#inst "yesterday""#,
            r#"#uuid "f81d4fae""#,
            "#uuid :k",
        ] {
            let err = parse_with(input, options).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownTag, "{input}");
        }
        let err = parse_with("#inst 42", options).unwrap_err();
        assert_eq!(err.message(), "#inst: expected a string, found integer");
    }
}
