mod equal;
mod hash;
mod node_ref;

use std::{borrow::Cow, fmt};

use num_bigint::{BigInt, BigUint, Sign};

pub use self::node_ref::{Entries, Items, ValueRef};
use crate::{arena::NodeId, external::External};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Int,
    BigInt,
    Float,
    BigDec,
    Ratio,
    BigRatio,
    Char,
    String,
    Symbol,
    Keyword,
    List,
    Vector,
    Set,
    Map,
    Tagged,
    External,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::BigInt => "big integer",
            ValueKind::Float => "float",
            ValueKind::BigDec => "big decimal",
            ValueKind::Ratio => "ratio",
            ValueKind::BigRatio => "big ratio",
            ValueKind::Char => "character",
            ValueKind::String => "string",
            ValueKind::Symbol => "symbol",
            ValueKind::Keyword => "keyword",
            ValueKind::List => "list",
            ValueKind::Vector => "vector",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Tagged => "tagged literal",
            ValueKind::External => "external value",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Int(i64),
    BigInt(BigIntValue<'a>),
    Float(f64),
    BigDec(BigDecValue<'a>),
    Ratio(Ratio),
    BigRatio(BigRatioValue<'a>),
    Char(char),
    String(EdnString<'a>),
    Symbol(Ident<'a>),
    Keyword(Ident<'a>),
    List(Vec<NodeId>),
    Vector(Vec<NodeId>),
    Set(Vec<NodeId>),
    Map(Vec<(NodeId, NodeId)>),
    Tagged(Tagged<'a>),
    External(External),
}

impl Value<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::Float(_) => ValueKind::Float,
            Value::BigDec(_) => ValueKind::BigDec,
            Value::Ratio(_) => ValueKind::Ratio,
            Value::BigRatio(_) => ValueKind::BigRatio,
            Value::Char(_) => ValueKind::Char,
            Value::String(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Keyword(_) => ValueKind::Keyword,
            Value::List(_) => ValueKind::List,
            Value::Vector(_) => ValueKind::Vector,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Tagged(_) => ValueKind::Tagged,
            Value::External(_) => ValueKind::External,
        }
    }
}

/// Arbitrary-precision integer kept as a normalized digit string.
///
/// Digits carry no sign, no radix prefix, no underscores and no leading
/// zeros (zero itself is `"0"`); letters are lowercase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BigIntValue<'a> {
    digits: Cow<'a, str>,
    negative: bool,
    radix: u32,
}

impl<'a> BigIntValue<'a> {
    /// Builds a big integer from digits in `radix` (2..=36), normalizing them.
    /// Returns `None` for an empty digit string or a digit outside the radix.
    pub fn new(digits: impl Into<Cow<'a, str>>, negative: bool, radix: u32) -> Option<Self> {
        let digits = digits.into();
        if !(2..=36).contains(&radix)
            || digits.is_empty()
            || !digits.chars().all(|c| c.is_digit(radix))
        {
            return None;
        }
        Some(Self::from_valid(digits, negative, radix))
    }

    /// `digits` must already be valid in `radix`.
    pub(crate) fn from_valid(digits: Cow<'a, str>, negative: bool, radix: u32) -> Self {
        let digits = normalize_digits(digits);
        let negative = negative && digits != "0";
        Self {
            digits,
            negative,
            radix,
        }
    }

    #[inline]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    #[inline]
    pub fn radix(&self) -> u32 {
        self.radix
    }

    pub fn to_bigint(&self) -> BigInt {
        let magnitude =
            BigUint::parse_bytes(self.digits.as_bytes(), self.radix).unwrap_or_default();
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, magnitude)
    }

    /// Base-10 digits of the magnitude.
    pub(crate) fn decimal_digits(&self) -> Cow<'_, str> {
        if self.radix == 10 {
            Cow::Borrowed(&self.digits)
        } else {
            Cow::Owned(
                BigUint::parse_bytes(self.digits.as_bytes(), self.radix)
                    .unwrap_or_default()
                    .to_str_radix(10),
            )
        }
    }
}

fn normalize_digits(digits: Cow<'_, str>) -> Cow<'_, str> {
    let zeros = digits.len() - digits.trim_start_matches('0').len();
    if zeros == digits.len() {
        return Cow::Borrowed("0");
    }
    let lowercase = !digits.bytes().any(|b| b.is_ascii_uppercase());

    match digits {
        Cow::Borrowed(text) if lowercase => Cow::Borrowed(&text[zeros..]),
        Cow::Borrowed(text) => Cow::Owned(text[zeros..].to_ascii_lowercase()),
        Cow::Owned(mut text) => {
            text.drain(..zeros);
            text.make_ascii_lowercase();
            Cow::Owned(text)
        }
    }
}

/// Arbitrary-precision decimal kept as written, minus sign, `M` suffix and underscores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BigDecValue<'a> {
    digits: Cow<'a, str>,
    negative: bool,
}

impl<'a> BigDecValue<'a> {
    pub fn new(digits: impl Into<Cow<'a, str>>, negative: bool) -> Self {
        Self {
            digits: digits.into(),
            negative,
        }
    }

    #[inline]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }
}

/// Exact rational in lowest terms with a denominator greater than one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ratio {
    numer: i64,
    denom: i64,
}

impl Ratio {
    /// `numer / denom` must already be reduced with `denom > 1`.
    pub(crate) const fn from_reduced(numer: i64, denom: i64) -> Self {
        Self { numer, denom }
    }

    #[inline]
    pub fn numer(self) -> i64 {
        self.numer
    }

    #[inline]
    pub fn denom(self) -> i64 {
        self.denom
    }
}

/// Rational whose reduced terms do not fit in `i64`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BigRatioValue<'a> {
    numer: Cow<'a, str>,
    denom: Cow<'a, str>,
    negative: bool,
}

impl<'a> BigRatioValue<'a> {
    pub(crate) fn from_reduced(numer: String, denom: String, negative: bool) -> Self {
        Self {
            numer: Cow::Owned(numer),
            denom: Cow::Owned(denom),
            negative,
        }
    }

    /// Decimal digits of the numerator magnitude.
    #[inline]
    pub fn numer(&self) -> &str {
        &self.numer
    }

    #[inline]
    pub fn denom(&self) -> &str {
        &self.denom
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn to_bigints(&self) -> (BigInt, BigInt) {
        let numer = BigUint::parse_bytes(self.numer.as_bytes(), 10).unwrap_or_default();
        let denom = BigUint::parse_bytes(self.denom.as_bytes(), 10).unwrap_or_default();
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        (
            BigInt::from_biguint(sign, numer),
            BigInt::from_biguint(Sign::Plus, denom),
        )
    }
}

/// String contents; borrowed from the input unless escapes had to be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnString<'a> {
    text: Cow<'a, str>,
    escaped: bool,
}

impl<'a> EdnString<'a> {
    pub fn new(text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            text: text.into(),
            escaped: false,
        }
    }

    pub(crate) fn decoded(text: String, escaped: bool) -> Self {
        Self {
            text: Cow::Owned(text),
            escaped,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the literal contained escape sequences.
    #[inline]
    pub fn has_escapes(&self) -> bool {
        self.escaped
    }

    /// Whether the text points into the original input.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.text, Cow::Borrowed(_))
    }
}

/// Symbol or keyword name with optional namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident<'a> {
    namespace: Option<Cow<'a, str>>,
    name: Cow<'a, str>,
}

impl<'a> Ident<'a> {
    pub fn new(namespace: Option<Cow<'a, str>>, name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tagged<'a> {
    tag: Cow<'a, str>,
    value: NodeId,
}

impl<'a> Tagged<'a> {
    pub fn new(tag: impl Into<Cow<'a, str>>, value: NodeId) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn value(&self) -> NodeId {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_int_digits_are_normalized() {
        let big = BigIntValue::new("000FF", false, 16).unwrap();
        assert_eq!(big.digits(), "ff");
        assert_eq!(big.decimal_digits(), "255");

        let zero = BigIntValue::new("000", true, 10).unwrap();
        assert_eq!(zero.digits(), "0");
        assert!(!zero.is_negative());

        assert!(BigIntValue::new("12", false, 2).is_none());
        assert!(BigIntValue::new("", false, 10).is_none());
    }

    #[test]
    fn borrowed_digits_stay_borrowed() {
        let big = BigIntValue::new("0012", false, 10).unwrap();
        assert!(matches!(big.digits, Cow::Borrowed("12")));
    }

    #[test]
    fn big_int_converts_to_num_bigint() {
        let big = BigIntValue::new("9223372036854775808", true, 10).unwrap();
        assert_eq!(big.to_bigint().to_string(), "-9223372036854775808");
    }

    #[test]
    fn ident_display() {
        let ident = Ident::new(Some("my.ns".into()), "name");
        assert_eq!(ident.to_string(), "my.ns/name");
        assert_eq!(Ident::new(None, "/").to_string(), "/");
    }
}
