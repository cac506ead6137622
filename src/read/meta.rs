use super::Parser;
use crate::{
    arena::NodeId,
    error::{ErrorKind, Result, Span},
    value::{Ident, Value, ValueKind},
};

impl Parser<'_, '_> {
    /// `^meta target`. The metadata is normalized to a map and attached to
    /// the target node; metadata already on the target wins on key clashes.
    pub(super) fn read_meta(&mut self) -> Result<NodeId> {
        let start = self.pos;
        if !self.options.metadata {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "metadata is disabled",
                Span::new(start, start + 1),
            ));
        }
        self.pos += 1;

        let meta = self.nested(start, |parser| parser.read_operand("metadata `^`", start))?;
        let meta = self.expand_meta(meta)?;
        let target = self.nested(start, |parser| parser.read_operand("metadata `^`", start))?;

        let node = self.arena.get(target);
        if !matches!(
            node.kind(),
            ValueKind::List
                | ValueKind::Vector
                | ValueKind::Set
                | ValueKind::Map
                | ValueKind::Symbol
                | ValueKind::Tagged
        ) {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("metadata cannot be attached to {}", node.kind()),
                node.span(),
            ));
        }

        let existing = node.meta().map(|existing| existing.id());
        let merged = match existing {
            Some(existing) => self.merge_meta(meta, existing)?,
            None => meta,
        };
        self.arena.set_meta(target, merged);
        Ok(target)
    }

    /// Expands the shorthand forms into a map node.
    fn expand_meta(&mut self, meta: NodeId) -> Result<NodeId> {
        let node = self.arena.get(meta);
        let span = node.span();
        let key = match node.kind() {
            ValueKind::Map => return Ok(meta),
            ValueKind::Keyword => {
                let flag = self.alloc(Value::Bool(true), span)?;
                return self.alloc(Value::Map(vec![(meta, flag)]), span);
            }
            ValueKind::String | ValueKind::Symbol => "tag",
            ValueKind::Vector => "param-tags",
            other => {
                return Err(self.error(
                    ErrorKind::InvalidSyntax,
                    format!("metadata must be a map, keyword, string, symbol or vector, found {other}"),
                    span,
                ));
            }
        };
        let key = self.alloc(Value::Keyword(Ident::new(None, key)), span)?;
        self.alloc(Value::Map(vec![(key, meta)]), span)
    }

    fn merge_meta(&mut self, outer: NodeId, inner: NodeId) -> Result<NodeId> {
        let inner_node = self.arena.get(inner);
        let outer_node = self.arena.get(outer);
        let span = Span::new(outer_node.span().start, inner_node.span().end);

        let mut entries: Vec<(NodeId, NodeId)> = outer_node
            .entries()
            .filter(|&(key, _)| inner_node.map_get(key).is_none())
            .map(|(key, value)| (key.id(), value.id()))
            .collect();
        entries.extend(inner_node.entries().map(|(key, value)| (key.id(), value.id())));
        self.alloc(Value::Map(entries), span)
    }
}
