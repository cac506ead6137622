use std::{
    any::Any,
    collections::TryReserveError,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    error::Span,
    external::External,
    value::{Value, ValueRef},
};

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("arena node budget of {0} nodes exhausted")]
    Budget(usize),
    #[error("arena allocation failed: {0}")]
    Reserve(#[from] TryReserveError),
    #[error("node {0} is not part of this arena")]
    UnknownNode(NodeId),
}

#[derive(Debug)]
pub(crate) struct Node<'a> {
    pub(crate) value: Value<'a>,
    pub(crate) span: Span,
    pub(crate) meta: Option<NodeId>,
    /// Lazily computed structural hash; zero means not computed yet.
    pub(crate) hash: AtomicU64,
}

/// Region owning every value produced by one parse.
///
/// Nodes are only ever appended, so a `NodeId` handed out by [`Arena::alloc`]
/// stays valid until the arena is dropped, which releases all nodes at once.
#[derive(Debug)]
pub struct Arena<'a> {
    nodes: Vec<Node<'a>>,
    limit: usize,
}

impl Default for Arena<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Arena<'a> {
    pub fn new() -> Self {
        Self::with_limit(0, usize::MAX)
    }

    #[inline]
    pub(crate) fn with_limit(cap: usize, limit: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(cap.min(limit)),
            limit,
        }
    }

    pub fn alloc(&mut self, value: Value<'a>, span: Span) -> Result<NodeId, AllocError> {
        if self.nodes.len() >= self.limit {
            return Err(AllocError::Budget(self.limit));
        }
        if let Some(child) = self.dangling_child(&value) {
            return Err(AllocError::UnknownNode(child));
        }
        self.nodes.try_reserve(1)?;

        let id = self.nodes.len();
        self.nodes.push(Node {
            value,
            span,
            meta: None,
            hash: AtomicU64::new(0),
        });
        Ok(id)
    }

    /// First child of `value` that does not name an existing node.
    fn dangling_child(&self, value: &Value<'a>) -> Option<NodeId> {
        let len = self.nodes.len();
        match value {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => {
                items.iter().copied().find(|&id| id >= len)
            }
            Value::Map(entries) => entries
                .iter()
                .flat_map(|&(key, value)| [key, value])
                .find(|&id| id >= len),
            Value::Tagged(tagged) => Some(tagged.value()).filter(|&id| id >= len),
            _ => None,
        }
    }

    /// Wraps `data` as an external value tagged with `type_id`. `data` is
    /// dropped together with the arena.
    pub fn alloc_external<T>(
        &mut self,
        type_id: u32,
        data: T,
        span: Span,
    ) -> Result<NodeId, AllocError>
    where
        T: Any + Send + Sync,
    {
        self.alloc(Value::External(External::new(type_id, data)), span)
    }

    pub fn alloc_list(&mut self, items: Vec<NodeId>, span: Span) -> Result<NodeId, AllocError> {
        self.alloc(Value::List(items), span)
    }

    pub fn alloc_vector(&mut self, items: Vec<NodeId>, span: Span) -> Result<NodeId, AllocError> {
        self.alloc(Value::Vector(items), span)
    }

    /// Allocates a map; the caller is responsible for key uniqueness.
    pub fn alloc_map(
        &mut self,
        entries: Vec<(NodeId, NodeId)>,
        span: Span,
    ) -> Result<NodeId, AllocError> {
        self.alloc(Value::Map(entries), span)
    }

    /// Read-only view of a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    #[inline]
    pub fn get(&self, id: NodeId) -> ValueRef<'_, 'a> {
        assert!(id < self.nodes.len(), "node {id} is not part of this arena");
        ValueRef::new(self, id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<'a> {
        &self.nodes[id]
    }

    #[inline]
    pub(crate) fn set_meta(&mut self, id: NodeId, meta: NodeId) {
        self.nodes[id].meta = Some(meta);
    }

    #[inline]
    pub(crate) fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id].span = span;
    }

    /// Drops every node allocated after `mark`.
    #[inline]
    pub(crate) fn rewind(&mut self, mark: usize) {
        self.nodes.truncate(mark);
    }

    #[inline]
    pub(crate) fn cached_hash(&self, id: NodeId) -> u64 {
        self.nodes[id].hash.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn store_hash(&self, id: NodeId, hash: u64) {
        self.nodes[id].hash.store(hash, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Tagged;

    #[test]
    fn ids_are_sequential() {
        let mut arena = Arena::new();
        let a = arena.alloc(Value::Int(1), Span::new(0, 1)).unwrap();
        let b = arena.alloc(Value::Int(2), Span::new(2, 3)).unwrap();
        let list = arena.alloc_list(vec![a, b], Span::new(0, 4)).unwrap();
        assert_eq!((a, b, list), (0, 1, 2));
        assert_eq!(arena.get(list).len(), 2);
        assert_eq!(arena.get(b).span(), Span::new(2, 3));
    }

    #[test]
    fn budget_exhaustion_is_an_error() {
        let mut arena = Arena::with_limit(0, 1);
        assert!(arena.alloc(Value::Nil, Span::default()).is_ok());
        assert_eq!(
            arena.alloc(Value::Nil, Span::default()),
            Err(AllocError::Budget(1))
        );
    }

    #[test]
    fn children_must_already_exist() {
        let mut arena = Arena::new();
        let one = arena.alloc(Value::Int(1), Span::default()).unwrap();
        assert_eq!(
            arena.alloc_list(vec![one, 999], Span::default()),
            Err(AllocError::UnknownNode(999))
        );
        assert_eq!(
            arena.alloc_map(vec![(one, 1)], Span::default()),
            Err(AllocError::UnknownNode(1))
        );
        assert_eq!(
            arena.alloc(Value::Tagged(Tagged::new("t", 7)), Span::default()),
            Err(AllocError::UnknownNode(7))
        );
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.alloc_vector(vec![one, one], Span::default()), Ok(1));
    }

    #[test]
    fn rewind_discards_trailing_nodes() {
        let mut arena = Arena::new();
        arena.alloc(Value::Nil, Span::default()).unwrap();
        let mark = arena.len();
        arena.alloc(Value::Bool(true), Span::default()).unwrap();
        arena.rewind(mark);
        assert_eq!(arena.len(), 1);
    }
}
