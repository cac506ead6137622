use tracing::trace;

use super::Parser;
use crate::{
    arena::{AllocError, NodeId},
    error::{Error, ErrorKind, Result, Span},
    registry::{DefaultMode, ReaderError},
    scan,
    value::{Tagged, Value},
};

impl<'a> Parser<'a, '_> {
    /// Everything introduced by `#` except the discard form.
    pub(super) fn read_dispatch(&mut self) -> Result<NodeId> {
        let start = self.pos;
        let Some(next) = self.text[start + 1..].chars().next() else {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "`#` at end of input",
                Span::new(start, start + 1),
            ));
        };

        match next {
            '{' => self.read_set(),
            '#' => self.read_symbolic_float(),
            '"' => Err(self.error(
                ErrorKind::InvalidSyntax,
                "`#\"` is reserved and not valid EDN",
                Span::new(start, start + 2),
            )),
            c if c.is_alphabetic() => self.read_tagged(),
            c => Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("unexpected `{}` after `#`", c.escape_debug()),
                Span::new(start, start + 1 + c.len_utf8()),
            )),
        }
    }

    fn read_symbolic_float(&mut self) -> Result<NodeId> {
        let start = self.pos;
        let end = scan::token_end(self.bytes, start + 2);
        let span = Span::new(start, end);
        let value = match &self.text[start + 2..end] {
            "Inf" => f64::INFINITY,
            "-Inf" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            other => {
                return Err(self.error(
                    ErrorKind::InvalidSyntax,
                    format!("unknown symbolic value `##{other}`"),
                    span,
                ));
            }
        };
        self.pos = end;
        self.alloc(Value::Float(value), span)
    }

    fn read_tagged(&mut self) -> Result<NodeId> {
        let start = self.pos;
        let tag = self.ident_token(start + 1)?;
        self.split_ident(tag, Span::new(start, self.pos), "tag")?;

        let value = self.nested(start, |parser| parser.read_operand("tagged literal", start))?;
        let span = Span::new(start, self.pos);
        self.dispatch_tag(tag, value, span)
    }

    /// Hands a tagged literal to its registered reader, or applies the
    /// default mode when there is none.
    fn dispatch_tag(&mut self, tag: &'a str, value: NodeId, span: Span) -> Result<NodeId> {
        let Some(reader) = self.options.registry.and_then(|registry| registry.lookup(tag)) else {
            return match self.options.default_mode {
                DefaultMode::Passthrough => self.alloc(Value::Tagged(Tagged::new(tag, value)), span),
                DefaultMode::Unwrap => Ok(value),
                DefaultMode::Error => Err(self.error(
                    ErrorKind::UnknownTag,
                    format!("no reader registered for `#{tag}`"),
                    span,
                )),
            };
        };

        trace!(tag, "dispatching tagged literal");
        let mark = self.arena.len();
        let id = reader(&mut self.arena, value).map_err(|err| match err {
            ReaderError::Rejected(_) | ReaderError::OutOfMemory(AllocError::UnknownNode(_)) => {
                Error::new(ErrorKind::UnknownTag, format!("#{tag}: {err}"), span)
            }
            ReaderError::OutOfMemory(alloc) => Error::from_alloc(&alloc, span),
        })?;

        if id >= self.arena.len() {
            return Err(self.error(
                ErrorKind::UnknownTag,
                format!("reader for `#{tag}` returned node {id}, which it never allocated"),
                span,
            ));
        }
        if id >= mark {
            self.arena.set_span(id, span);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        arena::Arena,
        options::ParseOptions,
        read::tests::{error_kind, parse, parse_with},
        registry::ReaderRegistry,
        value::ValueKind,
    };

    #[test]
    fn symbolic_floats() {
        assert_eq!(parse("##Inf").unwrap().root().as_float(), Some(f64::INFINITY));
        assert_eq!(parse("##-Inf").unwrap().root().as_float(), Some(f64::NEG_INFINITY));
        assert!(parse("##NaN").unwrap().root().as_float().unwrap().is_nan());
        assert_eq!(error_kind("##nan"), ErrorKind::InvalidSyntax);
        assert_eq!(error_kind("##"), ErrorKind::InvalidSyntax);
    }

    #[test]
    fn reserved_and_malformed_dispatch() {
        assert_eq!(error_kind("#\"a*\""), ErrorKind::InvalidSyntax);
        assert_eq!(error_kind("#"), ErrorKind::UnexpectedEof);
        assert_eq!(error_kind("#1 2"), ErrorKind::InvalidSyntax);
        assert_eq!(error_kind("#:ns{:a 1}"), ErrorKind::InvalidSyntax);
        assert_eq!(error_kind("#inst"), ErrorKind::UnexpectedEof);
        assert_eq!(error_kind("[#inst]"), ErrorKind::InvalidSyntax);
        assert_eq!(error_kind("#foo/ 1"), ErrorKind::InvalidSyntax);
    }

    #[test]
    fn default_modes() {
        let doc = parse("#myapp/point [1 2]").unwrap();
        let root = doc.root();
        assert_eq!(root.kind(), ValueKind::Tagged);
        assert_eq!(root.tag(), Some("myapp/point"));
        assert_eq!(root.tagged_value().map(|v| v.len()), Some(2));
        assert_eq!(root.span(), Span::new(0, 18));

        let unwrap = ParseOptions::default().default_mode(DefaultMode::Unwrap);
        let doc = parse_with("#point [1 2]", unwrap).unwrap();
        assert_eq!(doc.root().kind(), ValueKind::Vector);

        let strict = ParseOptions::default().default_mode(DefaultMode::Error);
        let err = parse_with("[#point [1 2]]", strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTag);
        assert_eq!(err.span(), Span::new(1, 13));
    }

    #[test]
    fn nested_tags_apply_inside_out() {
        let doc = parse("#a #b 1").unwrap();
        let outer = doc.root();
        assert_eq!(outer.tag(), Some("a"));
        assert_eq!(outer.tagged_value().and_then(|v| v.tag()), Some("b"));
    }

    #[test]
    fn readers_replace_the_literal() {
        let mut registry = ReaderRegistry::new();
        registry.register("double", |arena: &mut Arena<'_>, id| {
            let Some(n) = arena.get(id).as_int() else {
                return Err(ReaderError::message("expected an integer"));
            };
            Ok(arena.alloc(Value::Int(n * 2), Span::default())?)
        });
        registry.register("same", |_: &mut Arena<'_>, id| Ok(id));
        registry.register("bogus", |_: &mut Arena<'_>, _| Ok(usize::MAX));
        let options = ParseOptions::default().registry(&registry);

        let doc = parse_with("[#double 21 #same :k]", options).unwrap();
        let root = doc.root();
        assert_eq!(root.get(0).and_then(|v| v.as_int()), Some(42));
        assert_eq!(root.get(0).unwrap().span(), Span::new(1, 11));
        assert_eq!(root.get(1).unwrap().span(), Span::new(18, 20));

        let err = parse_with("#double :x", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTag);
        assert_eq!(err.message(), "#double: expected an integer");

        assert_eq!(
            parse_with("#bogus 1", options).unwrap_err().kind(),
            ErrorKind::UnknownTag
        );
    }

    #[test]
    fn reader_allocation_failure_is_out_of_memory() {
        let mut registry = ReaderRegistry::new();
        registry.register("wrap", |arena: &mut Arena<'_>, id| {
            Ok(arena.alloc_vector(vec![id], Span::default())?)
        });
        let options = ParseOptions::default().registry(&registry).max_nodes(1);
        assert_eq!(
            parse_with("#wrap 1", options).unwrap_err().kind(),
            ErrorKind::OutOfMemory
        );
    }

    #[test]
    fn reader_children_must_exist() {
        let mut registry = ReaderRegistry::new();
        registry.register("dangling", |arena: &mut Arena<'_>, id| {
            Ok(arena.alloc_list(vec![id, 999], Span::default())?)
        });
        let options = ParseOptions::default().registry(&registry);
        let err = parse_with("[#dangling 1]", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTag);
        assert_eq!(err.message(), "#dangling: node 999 is not part of this arena");
        assert_eq!(err.span(), Span::new(1, 12));
    }
}
