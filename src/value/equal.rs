use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::{
    arena::NodeId,
    value::{BigIntValue, Ident, Value, ValueRef},
};

/// Collections up to this size are compared pairwise instead of through hash buckets.
const LINEAR_SCAN_LIMIT: usize = 16;

pub(crate) fn equal(a: ValueRef<'_, '_>, b: ValueRef<'_, '_>) -> bool {
    if a.same_node(b) {
        return true;
    }
    let (ha, hb) = (a.cached_hash(), b.cached_hash());
    if ha != 0 && hb != 0 && ha != hb {
        return false;
    }

    match (a.value(), b.value()) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => big_int_cmp(x, y) == Ordering::Equal,
        (Value::Float(x), Value::Float(y)) => float_equal(*x, *y),
        (Value::BigDec(x), Value::BigDec(y)) => x == y,
        (Value::Ratio(x), Value::Ratio(y)) => x == y,
        (Value::BigRatio(x), Value::BigRatio(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::String(x), Value::String(y)) => x.as_str() == y.as_str(),
        (Value::Symbol(x), Value::Symbol(y)) | (Value::Keyword(x), Value::Keyword(y)) => x == y,
        (Value::List(x) | Value::Vector(x), Value::List(y) | Value::Vector(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|(&i, &j)| equal(a.sibling(i), b.sibling(j)))
        }
        (Value::Set(x), Value::Set(y)) => set_equal(a, x, b, y),
        (Value::Map(x), Value::Map(y)) => map_equal(a, x, b, y),
        (Value::Tagged(x), Value::Tagged(y)) => {
            x.tag() == y.tag() && equal(a.sibling(x.value()), b.sibling(y.value()))
        }
        (Value::External(x), Value::External(y)) => x.equals(y),
        _ => false,
    }
}

#[inline]
fn float_equal(x: f64, y: f64) -> bool {
    (x.is_nan() && y.is_nan()) || x == y
}

/// Positions of `ids` bucketed by hash, for membership probes on large collections.
fn buckets(owner: ValueRef<'_, '_>, ids: impl Iterator<Item = NodeId>) -> FxHashMap<u64, Vec<usize>> {
    let mut buckets: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    for (pos, id) in ids.enumerate() {
        buckets.entry(owner.sibling(id).hash64()).or_default().push(pos);
    }
    buckets
}

fn set_equal(a: ValueRef<'_, '_>, x: &[NodeId], b: ValueRef<'_, '_>, y: &[NodeId]) -> bool {
    if x.len() != y.len() {
        return false;
    }
    if x.len() <= LINEAR_SCAN_LIMIT {
        return x
            .iter()
            .all(|&i| y.iter().any(|&j| equal(a.sibling(i), b.sibling(j))));
    }

    let index = buckets(b, y.iter().copied());
    x.iter().all(|&i| {
        let item = a.sibling(i);
        index
            .get(&item.hash64())
            .is_some_and(|bucket| bucket.iter().any(|&pos| equal(item, b.sibling(y[pos]))))
    })
}

fn map_equal(
    a: ValueRef<'_, '_>,
    x: &[(NodeId, NodeId)],
    b: ValueRef<'_, '_>,
    y: &[(NodeId, NodeId)],
) -> bool {
    if x.len() != y.len() {
        return false;
    }
    if x.len() <= LINEAR_SCAN_LIMIT {
        return x.iter().all(|&(k, v)| {
            let key = a.sibling(k);
            y.iter()
                .find(|&&(k2, _)| equal(key, b.sibling(k2)))
                .is_some_and(|&(_, w)| equal(a.sibling(v), b.sibling(w)))
        });
    }

    let index = buckets(b, y.iter().map(|&(k, _)| k));
    x.iter().all(|&(k, v)| {
        let key = a.sibling(k);
        let found = index.get(&key.hash64()).and_then(|bucket| {
            bucket
                .iter()
                .map(|&pos| y[pos])
                .find(|&(k2, _)| equal(key, b.sibling(k2)))
        });
        found.is_some_and(|(_, w)| equal(a.sibling(v), b.sibling(w)))
    })
}

/// Position of each kind in the total order. Lists and vectors share a rank
/// because they can be equal.
fn rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::BigInt(_) => 3,
        Value::Ratio(_) => 4,
        Value::BigRatio(_) => 5,
        Value::Float(_) => 6,
        Value::BigDec(_) => 7,
        Value::Char(_) => 8,
        Value::String(_) => 9,
        Value::Symbol(_) => 10,
        Value::Keyword(_) => 11,
        Value::List(_) | Value::Vector(_) => 12,
        Value::Set(_) => 13,
        Value::Map(_) => 14,
        Value::Tagged(_) => 15,
        Value::External(_) => 16,
    }
}

/// Total order consistent with [`equal`]: equal values compare `Equal`.
pub(crate) fn compare(a: ValueRef<'_, '_>, b: ValueRef<'_, '_>) -> Ordering {
    if a.same_node(b) {
        return Ordering::Equal;
    }
    let (va, vb) = (a.value(), b.value());

    match (va, vb) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::BigInt(x), Value::BigInt(y)) => big_int_cmp(x, y),
        (Value::Float(x), Value::Float(y)) => float_cmp(*x, *y),
        (Value::BigDec(x), Value::BigDec(y)) => y
            .is_negative()
            .cmp(&x.is_negative())
            .then_with(|| x.digits().cmp(y.digits())),
        (Value::Ratio(x), Value::Ratio(y)) => {
            let lhs = i128::from(x.numer()) * i128::from(y.denom());
            let rhs = i128::from(y.numer()) * i128::from(x.denom());
            lhs.cmp(&rhs)
        }
        (Value::BigRatio(x), Value::BigRatio(y)) => {
            let ((xn, xd), (yn, yd)) = (x.to_bigints(), y.to_bigints());
            (xn * yd).cmp(&(yn * xd))
        }
        (Value::Char(x), Value::Char(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.as_str().cmp(y.as_str()),
        (Value::Symbol(x), Value::Symbol(y)) | (Value::Keyword(x), Value::Keyword(y)) => {
            ident_cmp(x, y)
        }
        (Value::List(x) | Value::Vector(x), Value::List(y) | Value::Vector(y)) => {
            for (&i, &j) in x.iter().zip(y) {
                match compare(a.sibling(i), b.sibling(j)) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Set(x), Value::Set(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| a.hash64().cmp(&b.hash64()))
            .then_with(|| {
                let xs = sorted(a, x.iter().copied());
                let ys = sorted(b, y.iter().copied());
                xs.iter()
                    .zip(&ys)
                    .map(|(&i, &j)| compare(i, j))
                    .find(|order| order.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
        (Value::Map(x), Value::Map(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| a.hash64().cmp(&b.hash64()))
            .then_with(|| {
                let xs = sorted_entries(a, x);
                let ys = sorted_entries(b, y);
                xs.iter()
                    .zip(&ys)
                    .map(|(&(k1, v1), &(k2, v2))| compare(k1, k2).then_with(|| compare(v1, v2)))
                    .find(|order| order.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
        (Value::Tagged(x), Value::Tagged(y)) => x
            .tag()
            .cmp(y.tag())
            .then_with(|| compare(a.sibling(x.value()), b.sibling(y.value()))),
        (Value::External(x), Value::External(y)) => {
            if x.equals(y) {
                Ordering::Equal
            } else {
                x.type_id()
                    .cmp(&y.type_id())
                    .then_with(|| x.hash_code().cmp(&y.hash_code()))
                    .then_with(|| x.identity().cmp(&y.identity()))
            }
        }
        _ => rank(va).cmp(&rank(vb)),
    }
}

/// NaN equals NaN and sorts after every other float.
fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn ident_cmp(x: &Ident<'_>, y: &Ident<'_>) -> Ordering {
    x.namespace()
        .cmp(&y.namespace())
        .then_with(|| x.name().cmp(y.name()))
}

fn big_int_cmp(x: &BigIntValue<'_>, y: &BigIntValue<'_>) -> Ordering {
    if x.radix() != y.radix() {
        return x.to_bigint().cmp(&y.to_bigint());
    }
    // Normalized digits without leading zeros: longer means larger, and
    // lowercase ASCII digits sort in value order.
    let magnitude = x
        .digits()
        .len()
        .cmp(&y.digits().len())
        .then_with(|| x.digits().cmp(y.digits()));

    match (x.is_negative(), y.is_negative()) {
        (false, false) => magnitude,
        (true, true) => magnitude.reverse(),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
    }
}

fn sorted<'d, 'a>(owner: ValueRef<'d, 'a>, ids: impl Iterator<Item = NodeId>) -> Vec<ValueRef<'d, 'a>> {
    let mut items: Vec<_> = ids.map(|id| owner.sibling(id)).collect();
    items.sort_by(|&x, &y| compare(x, y));
    items
}

fn sorted_entries<'d, 'a>(
    owner: ValueRef<'d, 'a>,
    entries: &[(NodeId, NodeId)],
) -> Vec<(ValueRef<'d, 'a>, ValueRef<'d, 'a>)> {
    let mut pairs: Vec<_> = entries
        .iter()
        .map(|&(k, v)| (owner.sibling(k), owner.sibling(v)))
        .collect();
    pairs.sort_by(|&(x, _), &(y, _)| compare(x, y));
    pairs
}
