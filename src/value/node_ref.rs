use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    ptr, slice,
};

use crate::{
    arena::{Arena, NodeId},
    error::Span,
    external::External,
    value::{
        BigDecValue, BigIntValue, BigRatioValue, EdnString, Ident, Ratio, Value, ValueKind,
        equal::{compare, equal},
        hash::hash_value,
    },
};

/// Borrowed handle to one node of an arena.
///
/// Equality, ordering and hashing follow EDN semantics and work across
/// handles from different arenas.
#[derive(Copy, Clone)]
pub struct ValueRef<'d, 'a> {
    arena: &'d Arena<'a>,
    id: NodeId,
}

impl<'d, 'a> ValueRef<'d, 'a> {
    #[inline]
    pub(crate) fn new(arena: &'d Arena<'a>, id: NodeId) -> Self {
        Self { arena, id }
    }

    /// Another node of the same arena.
    #[inline]
    pub(crate) fn sibling(self, id: NodeId) -> Self {
        Self::new(self.arena, id)
    }

    #[inline]
    pub(crate) fn same_node(self, other: ValueRef<'_, '_>) -> bool {
        self.id == other.id && ptr::addr_eq(self.arena, other.arena)
    }

    #[inline]
    pub(crate) fn cached_hash(self) -> u64 {
        self.arena.cached_hash(self.id)
    }

    #[inline]
    pub fn id(self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn arena(self) -> &'d Arena<'a> {
        self.arena
    }

    #[inline]
    pub fn value(self) -> &'d Value<'a> {
        &self.arena.node(self.id).value
    }

    #[inline]
    pub fn kind(self) -> ValueKind {
        self.value().kind()
    }

    /// Byte range of the value in the parsed input.
    #[inline]
    pub fn span(self) -> Span {
        self.arena.node(self.id).span
    }

    pub fn is_nil(self) -> bool {
        matches!(self.value(), Value::Nil)
    }

    pub fn is_string(self) -> bool {
        matches!(self.value(), Value::String(_))
    }

    /// Any numeric kind, including ratios and big decimals.
    pub fn is_number(self) -> bool {
        matches!(
            self.value(),
            Value::Int(_)
                | Value::BigInt(_)
                | Value::Float(_)
                | Value::BigDec(_)
                | Value::Ratio(_)
                | Value::BigRatio(_)
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self.value(), Value::Int(_) | Value::BigInt(_))
    }

    pub fn is_collection(self) -> bool {
        matches!(
            self.value(),
            Value::List(_) | Value::Vector(_) | Value::Set(_) | Value::Map(_)
        )
    }

    pub fn as_bool(self) -> Option<bool> {
        match self.value() {
            Value::Bool(bool) => Some(*bool),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i64> {
        match self.value() {
            Value::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_bigint(self) -> Option<&'d BigIntValue<'a>> {
        match self.value() {
            Value::BigInt(big) => Some(big),
            _ => None,
        }
    }

    pub fn as_float(self) -> Option<f64> {
        match self.value() {
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_bigdec(self) -> Option<&'d BigDecValue<'a>> {
        match self.value() {
            Value::BigDec(dec) => Some(dec),
            _ => None,
        }
    }

    pub fn as_ratio(self) -> Option<Ratio> {
        match self.value() {
            Value::Ratio(ratio) => Some(*ratio),
            _ => None,
        }
    }

    pub fn as_big_ratio(self) -> Option<&'d BigRatioValue<'a>> {
        match self.value() {
            Value::BigRatio(ratio) => Some(ratio),
            _ => None,
        }
    }

    pub fn as_char(self) -> Option<char> {
        match self.value() {
            Value::Char(char) => Some(*char),
            _ => None,
        }
    }

    pub fn as_string(self) -> Option<&'d EdnString<'a>> {
        match self.value() {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'d str> {
        self.as_string().map(EdnString::as_str)
    }

    pub fn as_symbol(self) -> Option<&'d Ident<'a>> {
        match self.value() {
            Value::Symbol(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_keyword(self) -> Option<&'d Ident<'a>> {
        match self.value() {
            Value::Keyword(ident) => Some(ident),
            _ => None,
        }
    }

    /// Number of elements of a list, vector or set, or of entries of a map;
    /// zero for every other kind.
    pub fn len(self) -> usize {
        match self.value() {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => items.len(),
            Value::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    fn items(self) -> &'d [NodeId] {
        match self.value() {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => items,
            _ => &[],
        }
    }

    fn map_entries(self) -> &'d [(NodeId, NodeId)] {
        match self.value() {
            Value::Map(entries) => entries,
            _ => &[],
        }
    }

    /// Element `index` of a list, vector or set (in source order).
    pub fn get(self, index: usize) -> Option<Self> {
        self.items().get(index).map(|&id| self.sibling(id))
    }

    /// Entry `index` of a map (in source order).
    pub fn entry(self, index: usize) -> Option<(Self, Self)> {
        self.map_entries()
            .get(index)
            .map(|&(k, v)| (self.sibling(k), self.sibling(v)))
    }

    /// Elements of a list, vector or set; empty for other kinds.
    pub fn iter(self) -> Items<'d, 'a> {
        Items {
            arena: self.arena,
            inner: self.items().iter(),
        }
    }

    /// Entries of a map; empty for other kinds.
    pub fn entries(self) -> Entries<'d, 'a> {
        Entries {
            arena: self.arena,
            inner: self.map_entries().iter(),
        }
    }

    /// Value stored under a structurally equal key.
    pub fn map_get(self, key: ValueRef<'_, '_>) -> Option<Self> {
        let hash = key.hash64();
        self.entries()
            .find(|&(k, _)| k.hash64() == hash && k == key)
            .map(|(_, v)| v)
    }

    /// Value stored under the keyword `ns/name` or `name` (no leading colon).
    pub fn get_keyword(self, keyword: &str) -> Option<Self> {
        let (namespace, name) = match keyword.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                (Some(namespace), name)
            }
            _ => (None, keyword),
        };
        self.entries()
            .find(|&(k, _)| {
                k.as_keyword()
                    .is_some_and(|kw| kw.namespace() == namespace && kw.name() == name)
            })
            .map(|(_, v)| v)
    }

    /// Value stored under the string key `key`.
    pub fn get_str(self, key: &str) -> Option<Self> {
        self.entries()
            .find(|&(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Set membership; `false` for every other kind.
    pub fn contains(self, element: ValueRef<'_, '_>) -> bool {
        if !matches!(self.value(), Value::Set(_)) {
            return false;
        }
        let hash = element.hash64();
        self.iter().any(|item| item.hash64() == hash && item == element)
    }

    pub fn tag(self) -> Option<&'d str> {
        match self.value() {
            Value::Tagged(tagged) => Some(tagged.tag()),
            _ => None,
        }
    }

    pub fn tagged_value(self) -> Option<Self> {
        match self.value() {
            Value::Tagged(tagged) => Some(self.sibling(tagged.value())),
            _ => None,
        }
    }

    pub fn external(self) -> Option<&'d External> {
        match self.value() {
            Value::External(external) => Some(external),
            _ => None,
        }
    }

    pub fn external_type_id(self) -> Option<u32> {
        self.external().map(External::type_id)
    }

    pub fn is_external_type(self, type_id: u32) -> bool {
        self.external_type_id() == Some(type_id)
    }

    /// Data of an external value of `type_id`, downcast to `T`.
    pub fn external_get<T: 'static>(self, type_id: u32) -> Option<&'d T> {
        self.external()
            .filter(|external| external.type_id() == type_id)
            .and_then(External::downcast_ref::<T>)
    }

    /// Metadata map attached with `^`.
    pub fn meta(self) -> Option<Self> {
        self.arena.node(self.id).meta.map(|id| self.sibling(id))
    }

    pub fn has_meta(self) -> bool {
        self.arena.node(self.id).meta.is_some()
    }

    /// 64-bit structural hash, computed once and cached on the node.
    pub fn hash64(self) -> u64 {
        hash_value(self)
    }

    /// Total order suitable for sorting; consistent with equality.
    pub fn compare(self, other: ValueRef<'_, '_>) -> Ordering {
        compare(self, other)
    }
}

impl PartialEq<ValueRef<'_, '_>> for ValueRef<'_, '_> {
    fn eq(&self, other: &ValueRef<'_, '_>) -> bool {
        equal(*self, *other)
    }
}

impl Eq for ValueRef<'_, '_> {}

impl PartialOrd<ValueRef<'_, '_>> for ValueRef<'_, '_> {
    fn partial_cmp(&self, other: &ValueRef<'_, '_>) -> Option<Ordering> {
        Some(compare(*self, *other))
    }
}

impl Ord for ValueRef<'_, '_> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(*self, *other)
    }
}

impl Hash for ValueRef<'_, '_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash64());
    }
}

impl fmt::Debug for ValueRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(bool) => f.debug_tuple("Bool").field(bool).finish(),
            Value::Int(int) => f.debug_tuple("Int").field(int).finish(),
            Value::BigInt(big) => f.debug_tuple("BigInt").field(big).finish(),
            Value::Float(float) => f.debug_tuple("Float").field(float).finish(),
            Value::BigDec(dec) => f.debug_tuple("BigDec").field(dec).finish(),
            Value::Ratio(ratio) => f.debug_tuple("Ratio").field(ratio).finish(),
            Value::BigRatio(ratio) => f.debug_tuple("BigRatio").field(ratio).finish(),
            Value::Char(char) => f.debug_tuple("Char").field(char).finish(),
            Value::String(string) => f.debug_tuple("String").field(&string.as_str()).finish(),
            Value::Symbol(ident) => write!(f, "Symbol({ident})"),
            Value::Keyword(ident) => write!(f, "Keyword({ident})"),
            Value::List(_) => f.debug_tuple("List").field(&DebugItems(*self)).finish(),
            Value::Vector(_) => f.debug_tuple("Vector").field(&DebugItems(*self)).finish(),
            Value::Set(_) => f.debug_tuple("Set").field(&DebugItems(*self)).finish(),
            Value::Map(_) => f.debug_map().entries(self.entries()).finish(),
            Value::Tagged(tagged) => f
                .debug_tuple("Tagged")
                .field(&tagged.tag())
                .field(&self.sibling(tagged.value()))
                .finish(),
            Value::External(external) => fmt::Debug::fmt(external, f),
        }
    }
}

struct DebugItems<'d, 'a>(ValueRef<'d, 'a>);

impl fmt::Debug for DebugItems<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Iterator over collection elements.
#[derive(Clone, Debug)]
pub struct Items<'d, 'a> {
    arena: &'d Arena<'a>,
    inner: slice::Iter<'d, NodeId>,
}

impl<'d, 'a> Iterator for Items<'d, 'a> {
    type Item = ValueRef<'d, 'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|&id| ValueRef::new(self.arena, id))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Items<'_, '_> {}
impl FusedIterator for Items<'_, '_> {}

/// Iterator over map entries.
#[derive(Clone, Debug)]
pub struct Entries<'d, 'a> {
    arena: &'d Arena<'a>,
    inner: slice::Iter<'d, (NodeId, NodeId)>,
}

impl<'d, 'a> Iterator for Entries<'d, 'a> {
    type Item = (ValueRef<'d, 'a>, ValueRef<'d, 'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|&(k, v)| (ValueRef::new(self.arena, k), ValueRef::new(self.arena, v)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_, '_> {}
impl FusedIterator for Entries<'_, '_> {}
