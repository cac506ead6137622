use tracing::trace;

use super::{Form, Parser};
use crate::{
    arena::{Arena, NodeId},
    error::{ErrorKind, Result, Span},
    value::Value,
};

/// Collections up to this size are checked for duplicates pairwise.
const PAIRWISE_LIMIT: usize = 16;

#[derive(Copy, Clone)]
enum Shape {
    List,
    Vector,
    Map,
    Set,
}

impl Shape {
    fn close(self) -> u8 {
        match self {
            Shape::List => b')',
            Shape::Vector => b']',
            Shape::Map | Shape::Set => b'}',
        }
    }

    fn name(self) -> &'static str {
        match self {
            Shape::List => "list",
            Shape::Vector => "vector",
            Shape::Map => "map",
            Shape::Set => "set",
        }
    }
}

impl Parser<'_, '_> {
    pub(super) fn read_collection(&mut self, open: u8) -> Result<NodeId> {
        let shape = match open {
            b'(' => Shape::List,
            b'[' => Shape::Vector,
            _ => Shape::Map,
        };
        let start = self.pos;
        self.pos += 1;
        let items = self.nested(start, |parser| parser.read_items(start, shape))?;
        let span = Span::new(start, self.pos);

        match shape {
            Shape::List => self.alloc(Value::List(items), span),
            Shape::Vector => self.alloc(Value::Vector(items), span),
            _ => self.build_map(items, span),
        }
    }

    /// `#{ ... }`; the cursor is on the `#`.
    pub(super) fn read_set(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.pos += 2;
        let items = self.nested(start, |parser| parser.read_items(start, Shape::Set))?;
        let span = Span::new(start, self.pos);

        if let Some(index) = find_duplicate(&self.arena, &items) {
            let element = self.arena.get(items[index]).span();
            return Err(self.error(
                ErrorKind::DuplicateElement,
                format!("duplicate set element `{}`", &self.text[element.start..element.end]),
                element,
            ));
        }
        self.alloc(Value::Set(items), span)
    }

    fn read_items(&mut self, start: usize, shape: Shape) -> Result<Vec<NodeId>> {
        let close = shape.close();
        let mut items = Vec::new();
        loop {
            match self.read_form()? {
                Form::Value(id) => items.push(id),
                Form::Close(byte) if byte == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Form::Close(byte) => {
                    return Err(self.error(
                        ErrorKind::UnmatchedDelimiter,
                        format!(
                            "expected `{}` to close the {} opened at byte {start}, found `{}`",
                            char::from(close),
                            shape.name(),
                            char::from(byte)
                        ),
                        Span::new(self.pos, self.pos + 1),
                    ));
                }
                Form::Eof => {
                    return Err(self.error(
                        ErrorKind::UnexpectedEof,
                        format!("unterminated {}", shape.name()),
                        Span::new(start, self.pos),
                    ));
                }
            }
        }
    }

    fn build_map(&mut self, items: Vec<NodeId>, span: Span) -> Result<NodeId> {
        if items.len() % 2 != 0 {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "map literal has a key without a value",
                span,
            ));
        }
        let entries: Vec<(NodeId, NodeId)> = items
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        let keys: Vec<NodeId> = entries.iter().map(|&(key, _)| key).collect();

        if let Some(index) = find_duplicate(&self.arena, &keys) {
            let key = self.arena.get(keys[index]).span();
            return Err(self.error(
                ErrorKind::DuplicateKey,
                format!("duplicate map key `{}`", &self.text[key.start..key.end]),
                key,
            ));
        }
        self.alloc(Value::Map(entries), span)
    }
}

/// Index of the first element equal to an earlier one.
///
/// Large collections are ordered by hash then by the total value order, so
/// equal elements end up adjacent; ties keep insertion order.
pub(crate) fn find_duplicate(arena: &Arena<'_>, ids: &[NodeId]) -> Option<usize> {
    if ids.len() <= PAIRWISE_LIMIT {
        return (1..ids.len())
            .find(|&later| (0..later).any(|earlier| arena.get(ids[earlier]) == arena.get(ids[later])));
    }

    trace!(len = ids.len(), "sorting collection to find duplicates");
    let hashes: Vec<u64> = ids.iter().map(|&id| arena.get(id).hash64()).collect();
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_unstable_by(|&x, &y| {
        hashes[x]
            .cmp(&hashes[y])
            .then_with(|| arena.get(ids[x]).compare(arena.get(ids[y])))
            .then(x.cmp(&y))
    });

    order
        .windows(2)
        .filter(|pair| {
            hashes[pair[0]] == hashes[pair[1]] && arena.get(ids[pair[0]]) == arena.get(ids[pair[1]])
        })
        .map(|pair| pair[1])
        .min()
}
