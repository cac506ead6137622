use std::borrow::Cow;

use num_bigint::BigUint;

use super::{Parser, dec2flt::Decimal};
use crate::{
    arena::NodeId,
    error::{Error, ErrorKind, Result, Span},
    options::ParseOptions,
    scan,
    value::{BigDecValue, BigIntValue, BigRatioValue, Ratio, Value},
};

type Parsed<'a> = std::result::Result<Value<'a>, Cow<'static, str>>;

const ZERO_DENOMINATOR: &str = "ratio denominator is zero";

impl<'a> Parser<'a, '_> {
    pub(super) fn read_number(&mut self) -> Result<NodeId> {
        let text = self.text;
        let start = self.pos;
        let end = scan::token_end(self.bytes, start);
        self.pos = end;

        let span = Span::new(start, end);
        let value = parse_number(&text[start..end], &self.options)
            .map_err(|message| Error::new(ErrorKind::InvalidNumber, message, span))?;
        self.alloc(value, span)
    }
}

/// Parses one complete numeric token.
pub(crate) fn parse_number<'a>(token: &'a str, options: &ParseOptions<'_>) -> Parsed<'a> {
    let syntax = Syntax {
        extended: options.extended_integers,
        ratios: options.ratios,
        underscores: options.underscores,
    };
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let bytes = body.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_digit) {
        return Err("number must start with a digit".into());
    }

    if scan::contains_byte(b'/', bytes) {
        if !syntax.ratios {
            return Err("ratio literals are disabled".into());
        }
        return syntax.ratio(body, negative);
    }
    if syntax.extended {
        if let [b'0', b'x' | b'X', ..] = bytes {
            return syntax.radix_integer(body, 2, 16, negative);
        }
        if let Some(marker) = radix_marker(bytes) {
            let radix = bytes[..marker]
                .iter()
                .fold(0, |acc, &digit| acc * 10 + u32::from(digit - b'0'));
            if !(2..=36).contains(&radix) {
                return Err(format!("radix {radix} is outside 2..=36").into());
            }
            return syntax.radix_integer(body, marker + 1, radix, negative);
        }
    }
    syntax.decimal(body, negative)
}

/// Position of the `r` in `NrDDD` or `NNrDDD`.
fn radix_marker(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [_, b'r' | b'R', ..] => Some(1),
        [_, b'0'..=b'9', b'r' | b'R', ..] => Some(2),
        _ => None,
    }
}

struct Syntax {
    extended: bool,
    ratios: bool,
    underscores: bool,
}

impl Syntax {
    /// End of the run of `radix` digits (and separators, when enabled) at `pos`.
    fn run_end(&self, bytes: &[u8], pos: usize, radix: u32) -> usize {
        if radix == 10 && !self.underscores {
            return scan::digit_run(bytes, pos);
        }
        let mut end = pos;
        while let Some(&byte) = bytes.get(end) {
            if !(char::from(byte).is_digit(radix) || (self.underscores && byte == b'_')) {
                break;
            }
            end += 1;
        }
        end
    }

    /// Digits of a run that must not be empty, with separators removed.
    fn required<'a>(&self, run: &'a str, what: &str) -> std::result::Result<Cow<'a, str>, Cow<'static, str>> {
        if run.is_empty() {
            return Err(format!("{what} has no digits").into());
        }
        self.optional(run, what)
    }

    fn optional<'a>(&self, run: &'a str, what: &str) -> std::result::Result<Cow<'a, str>, Cow<'static, str>> {
        if run.starts_with('_') || run.ends_with('_') {
            return Err(format!("`_` must sit between digits of the {what}").into());
        }
        Ok(strip_underscores(run))
    }

    fn radix_integer<'a>(&self, body: &'a str, start: usize, radix: u32, negative: bool) -> Parsed<'a> {
        let bytes = body.as_bytes();
        let end = self.run_end(bytes, start, radix);
        if end < bytes.len() {
            if end + 1 == bytes.len() && matches!(bytes[end], b'N' | b'M') {
                return Err("`N` and `M` suffixes only apply to decimal numbers".into());
            }
            return Err(unexpected(body, end));
        }
        let digits = self.required(&body[start..end], "integer")?;
        Ok(integer_value(digits, radix, negative, false))
    }

    fn decimal<'a>(&self, body: &'a str, negative: bool) -> Parsed<'a> {
        let bytes = body.as_bytes();
        let int_end = self.run_end(bytes, 0, 10);
        let mut pos = int_end;

        let mut fraction = None;
        if bytes.get(pos) == Some(&b'.') {
            let end = self.run_end(bytes, pos + 1, 10);
            fraction = Some(&body[pos + 1..end]);
            pos = end;
        }

        let mut exponent = None;
        if let Some(b'e' | b'E') = bytes.get(pos) {
            let exponent_negative = bytes.get(pos + 1) == Some(&b'-');
            let digits_start = pos + 1 + usize::from(matches!(bytes.get(pos + 1), Some(b'+' | b'-')));
            let end = self.run_end(bytes, digits_start, 10);
            exponent = Some((exponent_negative, &body[digits_start..end]));
            pos = end;
        }

        let suffix = match bytes.get(pos) {
            Some(&suffix @ (b'N' | b'M')) => {
                pos += 1;
                Some(suffix)
            }
            _ => None,
        };
        if pos < bytes.len() {
            return Err(unexpected(body, pos));
        }

        let integer = self.required(&body[..int_end], "integer part")?;
        let fraction = fraction
            .map(|run| self.optional(run, "fraction"))
            .transpose()?;
        let exponent = exponent
            .map(|(exponent_negative, run)| {
                self.required(run, "exponent")
                    .map(|digits| (exponent_negative, digits))
            })
            .transpose()?;
        let is_float = fraction.is_some() || exponent.is_some();

        match suffix {
            Some(b'M') if !is_float && integer.len() > 1 && integer.starts_with('0') => {
                Err("`M` suffix is not allowed on an octal literal".into())
            }
            Some(b'M') => {
                let text = strip_underscores(&body[..pos - 1]);
                let zero = !text
                    .bytes()
                    .take_while(|&byte| byte != b'e' && byte != b'E')
                    .any(|byte| matches!(byte, b'1'..=b'9'));
                Ok(Value::BigDec(BigDecValue::new(text, negative && !zero)))
            }
            Some(_) if is_float => Err("`N` suffix is not allowed on a float".into()),
            suffix if !is_float => self.decimal_integer(body, int_end, integer, negative, suffix.is_some()),
            _ => {
                let (exponent_negative, exponent) = exponent.unwrap_or((false, Cow::Borrowed("")));
                let fraction = fraction.unwrap_or(Cow::Borrowed(""));
                Decimal {
                    negative,
                    integer: &integer,
                    fraction: &fraction,
                    exponent_negative,
                    exponent: &exponent,
                }
                .to_f64()
                .map(Value::Float)
                .ok_or_else(|| "float literal is out of range".into())
            }
        }
    }

    /// Decimal digits, or octal when a leading zero is followed by more digits.
    fn decimal_integer<'a>(
        &self,
        body: &'a str,
        int_end: usize,
        digits: Cow<'a, str>,
        negative: bool,
        force_big: bool,
    ) -> Parsed<'a> {
        if digits.len() == 1 || !digits.starts_with('0') {
            return Ok(integer_value(digits, 10, negative, force_big));
        }
        if !self.extended {
            return Err("leading zeros are not allowed".into());
        }
        if body[1..int_end].starts_with('_') {
            return Err("`_` must not follow the octal prefix `0`".into());
        }
        if let Some(bad) = digits.bytes().find(|byte| !(b'0'..=b'7').contains(byte)) {
            return Err(format!("invalid digit `{}` in octal literal", char::from(bad)).into());
        }
        if force_big {
            return Err("`N` suffix is not allowed on an octal literal".into());
        }
        Ok(integer_value(tail(digits, 1), 8, negative, false))
    }

    fn ratio<'a>(&self, body: &'a str, negative: bool) -> Parsed<'a> {
        let bytes = body.as_bytes();
        let slash = self.run_end(bytes, 0, 10);
        if bytes.get(slash) != Some(&b'/') {
            return Err(unexpected(body, slash));
        }
        let end = self.run_end(bytes, slash + 1, 10);
        if end < bytes.len() {
            return Err(unexpected(body, end));
        }

        // A leading zero on the numerator does not select octal here.
        let numer = self.required(&body[..slash], "ratio numerator")?;
        let denom = self.required(&body[slash + 1..end], "ratio denominator")?;
        reduce(&numer, &denom, negative)
    }
}

fn unexpected(body: &str, pos: usize) -> Cow<'static, str> {
    match body[pos..].chars().next() {
        Some(found) => format!("unexpected `{found}` in number").into(),
        None => "number ends unexpectedly".into(),
    }
}

fn strip_underscores(text: &str) -> Cow<'_, str> {
    if !scan::contains_byte(b'_', text.as_bytes()) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('_', ""))
}

fn tail(text: Cow<'_, str>, from: usize) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(text) => Cow::Borrowed(&text[from..]),
        Cow::Owned(mut text) => {
            text.drain(..from);
            Cow::Owned(text)
        }
    }
}

/// Folds digits valid in `radix` into a `u64`, or `None` on overflow.
fn parse_u64(digits: &[u8], radix: u32) -> Option<u64> {
    if radix == 10 && digits.len() <= 19 {
        return Some(scan::accumulate_digits(0, digits));
    }
    digits.iter().try_fold(0u64, |acc, &byte| {
        let digit = char::from(byte).to_digit(radix)?;
        acc.checked_mul(u64::from(radix))?
            .checked_add(u64::from(digit))
    })
}

fn signed(magnitude: u64, negative: bool) -> Option<i64> {
    if negative {
        (magnitude <= i64::MIN.unsigned_abs()).then(|| 0i64.wrapping_sub_unsigned(magnitude))
    } else {
        i64::try_from(magnitude).ok()
    }
}

fn integer_value<'a>(digits: Cow<'a, str>, radix: u32, negative: bool, force_big: bool) -> Value<'a> {
    if !force_big {
        if let Some(value) = parse_u64(digits.as_bytes(), radix).and_then(|m| signed(m, negative)) {
            return Value::Int(value);
        }
    }
    Value::BigInt(BigIntValue::from_valid(digits, negative, radix))
}

fn integer_from_u64<'a>(magnitude: u64, negative: bool) -> Value<'a> {
    match signed(magnitude, negative) {
        Some(value) => Value::Int(value),
        None => Value::BigInt(BigIntValue::from_valid(
            Cow::Owned(magnitude.to_string()),
            negative,
            10,
        )),
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn big_gcd(mut a: BigUint, mut b: BigUint) -> BigUint {
    while b != BigUint::ZERO {
        let rem = &a % &b;
        a = b;
        b = rem;
    }
    a
}

fn small(value: &BigUint) -> Option<u64> {
    match value.to_u64_digits().as_slice() {
        [] => Some(0),
        &[digit] => Some(digit),
        _ => None,
    }
}

/// Reduces `numer / denom` to lowest terms. A unit denominator yields an
/// integer instead of a ratio.
fn reduce<'a>(numer: &str, denom: &str, negative: bool) -> Parsed<'a> {
    if let (Some(numer), Some(denom)) = (parse_u64(numer.as_bytes(), 10), parse_u64(denom.as_bytes(), 10)) {
        return reduce_small(numer, denom, negative);
    }

    let (Some(numer), Some(denom)) = (
        BigUint::parse_bytes(numer.as_bytes(), 10),
        BigUint::parse_bytes(denom.as_bytes(), 10),
    ) else {
        return Err("malformed ratio".into());
    };
    if denom == BigUint::ZERO {
        return Err(ZERO_DENOMINATOR.into());
    }
    if numer == BigUint::ZERO {
        return Ok(Value::Int(0));
    }

    let divisor = big_gcd(numer.clone(), denom.clone());
    let (numer, denom) = (numer / &divisor, denom / &divisor);
    match (small(&numer), small(&denom)) {
        (Some(numer), Some(denom)) => reduce_small(numer, denom, negative),
        (_, Some(1)) => Ok(Value::BigInt(BigIntValue::from_valid(
            Cow::Owned(numer.to_str_radix(10)),
            negative,
            10,
        ))),
        _ => Ok(Value::BigRatio(BigRatioValue::from_reduced(
            numer.to_str_radix(10),
            denom.to_str_radix(10),
            negative,
        ))),
    }
}

fn reduce_small<'a>(numer: u64, denom: u64, negative: bool) -> Parsed<'a> {
    if denom == 0 {
        return Err(ZERO_DENOMINATOR.into());
    }
    if numer == 0 {
        return Ok(Value::Int(0));
    }

    let divisor = gcd(numer, denom);
    let (numer, denom) = (numer / divisor, denom / divisor);
    if denom == 1 {
        return Ok(integer_from_u64(numer, negative));
    }
    Ok(match (signed(numer, negative), i64::try_from(denom)) {
        (Some(numer), Ok(denom)) => Value::Ratio(Ratio::from_reduced(numer, denom)),
        _ => Value::BigRatio(BigRatioValue::from_reduced(
            numer.to_string(),
            denom.to_string(),
            negative,
        )),
    })
}
