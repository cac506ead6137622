use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::value::{Value, ValueRef};

/// Stored in place of a computed hash of zero, which marks an empty cache slot.
const ZERO_HASH: u64 = 0x9e37_79b9_7f4a_7c15;
const NAN_HASH: u64 = 0x7ff8_0000_dead_beef;

const SEED_NIL: u8 = 0;
const SEED_BOOL: u8 = 1;
const SEED_INT: u8 = 2;
const SEED_BIG_INT: u8 = 3;
const SEED_FLOAT: u8 = 4;
const SEED_BIG_DEC: u8 = 5;
const SEED_RATIO: u8 = 6;
const SEED_BIG_RATIO: u8 = 7;
const SEED_CHAR: u8 = 8;
const SEED_STRING: u8 = 9;
const SEED_SYMBOL: u8 = 10;
const SEED_KEYWORD: u8 = 11;
const SEED_SEQUENCE: u8 = 12;
const SEED_SET: u8 = 13;
const SEED_MAP: u8 = 14;
const SEED_TAGGED: u8 = 15;
const SEED_EXTERNAL: u8 = 16;

/// Finalizer from MurmurHash3; spreads `FxHasher` output before the
/// commutative set and map reductions.
#[inline]
const fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

#[inline]
fn seeded<T: Hash + ?Sized>(seed: u8, value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    value.hash(&mut hasher);
    fmix64(hasher.finish())
}

#[inline]
fn hash_str(text: &str) -> u64 {
    seeded(SEED_STRING, text)
}

fn hash_float(value: f64) -> u64 {
    if value.is_nan() {
        NAN_HASH
    } else if value == 0.0 {
        // 0.0 and -0.0 are equal.
        seeded(SEED_FLOAT, &0u64)
    } else {
        seeded(SEED_FLOAT, &value.to_bits())
    }
}

/// Cached 64-bit structural hash of `value`.
pub(crate) fn hash_value(value: ValueRef<'_, '_>) -> u64 {
    let arena = value.arena();
    let cached = arena.cached_hash(value.id());
    if cached != 0 {
        return cached;
    }

    let mut hash = compute(value);
    if hash == 0 {
        hash = ZERO_HASH;
    }
    arena.store_hash(value.id(), hash);
    hash
}

fn compute(value: ValueRef<'_, '_>) -> u64 {
    let arena = value.arena();
    match value.value() {
        Value::Nil => seeded(SEED_NIL, &()),
        Value::Bool(bool) => seeded(SEED_BOOL, bool),
        Value::Int(int) => seeded(SEED_INT, int),
        Value::BigInt(big) => seeded(SEED_BIG_INT, &(big.is_negative(), &*big.decimal_digits())),
        Value::Float(float) => hash_float(*float),
        Value::BigDec(dec) => seeded(SEED_BIG_DEC, &(dec.is_negative(), dec.digits())),
        Value::Ratio(ratio) => seeded(SEED_RATIO, ratio),
        Value::BigRatio(ratio) => seeded(
            SEED_BIG_RATIO,
            &(ratio.is_negative(), ratio.numer(), ratio.denom()),
        ),
        Value::Char(char) => seeded(SEED_CHAR, char),
        Value::String(string) => hash_str(string.as_str()),
        Value::Symbol(ident) => seeded(SEED_SYMBOL, ident),
        Value::Keyword(ident) => seeded(SEED_KEYWORD, ident),
        Value::List(items) | Value::Vector(items) => {
            let mut hash = u64::from(SEED_SEQUENCE);
            for &item in items {
                hash = hash
                    .wrapping_mul(31)
                    .wrapping_add(hash_value(arena.get(item)));
            }
            fmix64(hash ^ items.len() as u64)
        }
        Value::Set(items) => {
            let sum = items.iter().fold(0u64, |acc, &item| {
                acc.wrapping_add(hash_value(arena.get(item)))
            });
            seeded(SEED_SET, &(sum, items.len()))
        }
        Value::Map(entries) => {
            let sum = entries.iter().fold(0u64, |acc, &(key, val)| {
                let pair = hash_value(arena.get(key)) ^ hash_value(arena.get(val)).rotate_left(29);
                acc.wrapping_add(fmix64(pair))
            });
            seeded(SEED_MAP, &(sum, entries.len()))
        }
        Value::Tagged(tagged) => {
            let tag = seeded(SEED_TAGGED, tagged.tag());
            fmix64(tag ^ hash_value(arena.get(tagged.value())).rotate_left(17))
        }
        Value::External(external) => {
            seeded(SEED_EXTERNAL, &(external.type_id(), external.hash_code()))
        }
    }
}
