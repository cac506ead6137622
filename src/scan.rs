//! Byte-level scanning shared by the reader.
//!
//! Every helper works on the raw input bytes with explicit positions; the
//! `memchr` routines and the 8-byte digit checks are the accelerated forms
//! of the plain loops they replace and must stay bit-identical to them.

use memchr::{memchr, memchr_iter, memchr2, memrchr};

/// `,` is whitespace in EDN.
#[inline]
pub(crate) const fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b',')
}

#[inline]
pub(crate) const fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'"' | b';'
    )
}

/// Bytes that end a number, symbol or keyword token.
#[inline]
pub(crate) const fn is_terminator(byte: u8) -> bool {
    is_whitespace(byte) || is_delimiter(byte)
}

/// Position of the first byte at or after `pos` that is neither whitespace nor
/// part of a `;` line comment.
pub(crate) fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        match bytes.get(pos) {
            Some(&byte) if is_whitespace(byte) => pos += 1,
            Some(b';') => {
                pos = memchr(b'\n', &bytes[pos..]).map_or(bytes.len(), |offset| pos + offset + 1);
            }
            _ => return pos,
        }
    }
}

/// End of a token starting at `pos`: the first terminator byte, or the input end.
#[inline]
pub(crate) fn token_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&byte| is_terminator(byte))
        .map_or(bytes.len(), |offset| pos + offset)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct QuoteScan {
    /// Index of the closing quote.
    pub(crate) end: usize,
    /// Whether a backslash occurs between the opening and closing quote.
    pub(crate) escaped: bool,
}

/// Finds the quote closing a string body that starts at `pos`, skipping
/// escaped bytes. `None` means the input ends first.
pub(crate) fn find_closing_quote(bytes: &[u8], pos: usize) -> Option<QuoteScan> {
    let mut index = pos;
    let mut escaped = false;

    while index < bytes.len() {
        let at = index + memchr2(b'"', b'\\', &bytes[index..])?;
        if bytes[at] == b'"' {
            return Some(QuoteScan { end: at, escaped });
        }
        escaped = true;
        index = at + 2;
    }
    None
}

/// Finds the `"""` closing a text block whose content starts at `pos`.
/// Returns the index of the first closing quote.
pub(crate) fn find_text_block_end(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut index = pos;

    while index < bytes.len() {
        let at = index + memchr2(b'"', b'\\', &bytes[index..])?;
        if bytes[at] == b'\\' {
            index = at + 2;
        } else if bytes.get(at + 1) == Some(&b'"') && bytes.get(at + 2) == Some(&b'"') {
            return Some(at);
        } else {
            index = at + 1;
        }
    }
    None
}

#[inline]
pub(crate) fn contains_byte(needle: u8, haystack: &[u8]) -> bool {
    memchr(needle, haystack).is_some()
}

// Determine if all characters in an 8-byte byte string (represented as a `u64`) are all decimal
// digits.
//
// This does not care about the order in which the bytes were loaded.
#[inline]
pub(crate) const fn is_8digits(v: u64) -> bool {
    let a = v.wrapping_add(0x4646_4646_4646_4646);
    let b = v.wrapping_sub(0x3030_3030_3030_3030);
    (a | b) & 0x8080_8080_8080_8080 == 0
}

// Parse 8 digits, loaded as bytes in little-endian order.
//
// This uses the trick where every digit is in [0x030, 0x39],
// and therefore can be parsed in 3 multiplications, much
// faster than the normal 8.
#[inline]
pub(crate) const fn parse_8digits(mut v: u64) -> u64 {
    const MASK: u64 = 0x0000_00FF_0000_00FF;
    const MUL1: u64 = 0x000F_4240_0000_0064;
    const MUL2: u64 = 0x0000_2710_0000_0001;

    v -= 0x3030_3030_3030_3030;
    v = (v * 10) + (v >> 8); // will not overflow, fits in 63 bits
    let v1 = (v & MASK).wrapping_mul(MUL1);
    let v2 = ((v >> 16) & MASK).wrapping_mul(MUL2);
    (v1.wrapping_add(v2) >> 32) as u32 as u64
}

#[inline]
fn load_8(bytes: &[u8], pos: usize) -> Option<u64> {
    bytes
        .get(pos..)
        .and_then(<[u8]>::first_chunk::<8>)
        .map(|chunk| u64::from_le_bytes(*chunk))
}

/// End of the run of ASCII decimal digits starting at `pos`.
pub(crate) fn digit_run(bytes: &[u8], mut pos: usize) -> usize {
    while let Some(word) = load_8(bytes, pos) {
        if !is_8digits(word) {
            break;
        }
        pos += 8;
    }
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos
}

/// Folds a run of ASCII decimal digits into `acc`. The caller guarantees the
/// result fits in `u64`.
pub(crate) fn accumulate_digits(mut acc: u64, digits: &[u8]) -> u64 {
    let mut index = 0;
    while let Some(word) = load_8(digits, index) {
        if !is_8digits(word) {
            break;
        }
        acc = acc * 100_000_000 + parse_8digits(word);
        index += 8;
    }
    for &byte in &digits[index..] {
        acc = acc * 10 + u64::from(byte - b'0');
    }
    acc
}

/// Number of code points in a UTF-8 byte slice.
#[inline]
pub(crate) fn char_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&byte| byte & 0xC0 != 0x80).count()
}

/// 1-based line and column (in code points) of byte `offset`.
pub(crate) fn line_col(input: &[u8], offset: usize) -> (usize, usize) {
    let head = &input[..offset.min(input.len())];
    let line = memchr_iter(b'\n', head).count() + 1;
    let line_start = memrchr(b'\n', head).map_or(0, |index| index + 1);
    (line, char_count(&head[line_start..]) + 1)
}

/// Validates the whole input as UTF-8, returning the invalid byte range on failure.
pub(crate) fn validate_utf8(input: &[u8]) -> Result<&str, (usize, usize)> {
    simdutf8::compat::from_utf8(input).map_err(|err| {
        let start = err.valid_up_to();
        let end = err.error_len().map_or(input.len(), |len| start + len);
        (start, end)
    })
}
