use std::{borrow::Cow, fmt};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::{AllocError, Arena, NodeId};

/// What to do with a tagged literal whose tag has no registered reader.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DefaultMode {
    /// Keep the literal as a `Tagged` value.
    #[default]
    Passthrough,
    /// Drop the tag and keep the wrapped value.
    Unwrap,
    /// Fail with `UnknownTag`.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    #[error("{}", .0.as_deref().unwrap_or("tag reader rejected its value"))]
    Rejected(Option<Cow<'static, str>>),
    #[error(transparent)]
    OutOfMemory(#[from] AllocError),
}

impl ReaderError {
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        ReaderError::Rejected(Some(message.into()))
    }
}

/// Tag reader: receives the arena and the wrapped value, returns the node that
/// replaces the tagged literal.
pub type ReaderFn =
    dyn for<'a> Fn(&mut Arena<'a>, NodeId) -> Result<NodeId, ReaderError> + Send + Sync;

/// Tag name → reader mapping consulted for every `#tag value` literal.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: FxHashMap<Box<str>, Box<ReaderFn>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `reader` for `tag` (written without `#`), replacing any
    /// previous reader. Returns whether one was replaced.
    pub fn register<F>(&mut self, tag: impl Into<Box<str>>, reader: F) -> bool
    where
        F: for<'a> Fn(&mut Arena<'a>, NodeId) -> Result<NodeId, ReaderError>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        debug!(tag = &*tag, "registering tag reader");
        self.readers.insert(tag, Box::new(reader)).is_some()
    }

    pub fn unregister(&mut self, tag: &str) -> bool {
        self.readers.remove(tag).is_some()
    }

    pub fn lookup(&self, tag: &str) -> Option<&ReaderFn> {
        self.readers.get(tag).map(|reader| &**reader)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.readers.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.readers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Span, value::Value};

    #[test]
    fn register_lookup_unregister() {
        let mut registry = ReaderRegistry::new();
        assert!(!registry.register("answer", |arena: &mut Arena<'_>, _| {
            Ok(arena.alloc(Value::Int(42), Span::default())?)
        }));
        assert!(registry.contains("answer"));
        assert_eq!(registry.len(), 1);

        let mut arena = Arena::new();
        let nil = arena.alloc(Value::Nil, Span::default()).unwrap();
        let reader = registry.lookup("answer").unwrap();
        let id = reader(&mut arena, nil).unwrap();
        assert_eq!(arena.get(id).as_int(), Some(42));

        assert!(registry.unregister("answer"));
        assert!(registry.lookup("answer").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn rejected_message_falls_back_to_generic_text() {
        assert_eq!(
            ReaderError::Rejected(None).to_string(),
            "tag reader rejected its value"
        );
        assert_eq!(ReaderError::message("bad point").to_string(), "bad point");
    }
}
