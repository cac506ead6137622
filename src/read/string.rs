use memchr::memchr;

use super::Parser;
use crate::{
    arena::NodeId,
    error::{Error, ErrorKind, Result, Span},
    scan,
    value::{EdnString, Value},
};

const TEXT_BLOCK_QUOTES: &[u8] = b"\"\"\"";

impl<'a> Parser<'a, '_> {
    /// Reads a `"..."` literal. Escape-free strings borrow the input; anything
    /// with a backslash is decoded now so escape errors carry their position.
    pub(super) fn read_string(&mut self) -> Result<NodeId> {
        let start = self.pos;
        if self.options.text_blocks && self.bytes[start..].starts_with(TEXT_BLOCK_QUOTES) {
            return self.read_text_block();
        }

        let text = self.text;
        let body = start + 1;
        let Some(quote) = scan::find_closing_quote(self.bytes, body) else {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "unterminated string",
                Span::new(start, self.bytes.len()),
            ));
        };
        self.pos = quote.end + 1;

        let raw = &text[body..quote.end];
        let string = if quote.escaped {
            EdnString::decoded(decode_escapes(raw, body)?, true)
        } else {
            EdnString::new(raw)
        };
        self.alloc(Value::String(string), Span::new(start, self.pos))
    }

    /// `"""` block: the common indentation of the content lines and of the
    /// closing line is removed, trailing blanks are trimmed, and a final
    /// newline is kept only when the closing quotes sit on their own line.
    fn read_text_block(&mut self) -> Result<NodeId> {
        let text = self.text;
        let bytes = self.bytes;
        let start = self.pos;

        let mut pos = start + TEXT_BLOCK_QUOTES.len();
        while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
            pos += 1;
        }
        if bytes.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        match bytes.get(pos) {
            Some(b'\n') => pos += 1,
            None => {
                return Err(self.error(
                    ErrorKind::UnexpectedEof,
                    "unterminated text block",
                    Span::new(start, bytes.len()),
                ));
            }
            Some(_) => {
                return Err(self.error(
                    ErrorKind::InvalidString,
                    "text block opening quotes must end their line",
                    Span::new(start, pos + 1),
                ));
            }
        }

        let Some(end) = scan::find_text_block_end(bytes, pos) else {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "unterminated text block",
                Span::new(start, bytes.len()),
            ));
        };
        self.pos = end + TEXT_BLOCK_QUOTES.len();

        let (content, escaped) = strip_text_block(&text[pos..end], pos)?;
        self.alloc(
            Value::String(EdnString::decoded(content, escaped)),
            Span::new(start, self.pos),
        )
    }
}

fn is_blank(line: &str) -> bool {
    line.bytes().all(|byte| matches!(byte, b' ' | b'\t' | b'\r'))
}

fn indent(line: &str) -> usize {
    line.bytes()
        .take_while(|&byte| matches!(byte, b' ' | b'\t'))
        .count()
}

/// Applies the text block layout rules to the raw content starting at input
/// offset `offset`. Returns the text and whether any escape was decoded.
fn strip_text_block(raw: &str, offset: usize) -> Result<(String, bool)> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    for line in raw.split('\n') {
        lines.push((offset + line_start, line));
        line_start += line.len() + 1;
    }

    let closing_alone = lines.last().is_some_and(|&(_, line)| is_blank(line));
    let content = if closing_alone {
        &lines[..lines.len() - 1]
    } else {
        &lines[..]
    };
    if content.is_empty() {
        return Ok((String::new(), false));
    }

    let closing_indent = lines
        .last()
        .filter(|_| closing_alone)
        .map(|&(_, line)| indent(line));
    let common = content
        .iter()
        .filter(|&&(_, line)| !is_blank(line))
        .map(|&(_, line)| indent(line))
        .chain(closing_indent)
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for (index, &(line_offset, line)) in content.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        if is_blank(line) {
            continue;
        }
        let line = line[common..].trim_end_matches([' ', '\t', '\r']);
        if memchr(b'\\', line.as_bytes()).is_some() {
            out.push_str(&decode_escapes(line, line_offset + common)?);
            escaped = true;
        } else {
            out.push_str(line);
        }
    }
    if closing_alone {
        out.push('\n');
    }
    Ok((out, escaped))
}

/// Decodes every escape in `raw`, whose first byte sits at input offset `offset`.
pub(super) fn decode_escapes(raw: &str, offset: usize) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;

    while let Some(found) = memchr(b'\\', &bytes[pos..]) {
        let at = pos + found;
        out.push_str(&raw[pos..at]);
        let (decoded, len) = escape(raw, at).map_err(|(message, len)| {
            Error::new(
                ErrorKind::InvalidEscape,
                message,
                Span::new(offset + at, offset + at + len),
            )
        })?;
        out.push(decoded);
        pos = at + len;
    }
    out.push_str(&raw[pos..]);
    Ok(out)
}

/// Decodes the escape whose backslash is at `at`. Returns the character and
/// the escape length in bytes; errors carry the length to underline.
fn escape(raw: &str, at: usize) -> std::result::Result<(char, usize), (String, usize)> {
    let bytes = raw.as_bytes();
    let Some(&byte) = bytes.get(at + 1) else {
        return Err(("backslash at end of string".to_owned(), 1));
    };

    let simple = match byte {
        b'"' => Some('"'),
        b'\\' => Some('\\'),
        b'n' => Some('\n'),
        b't' => Some('\t'),
        b'r' => Some('\r'),
        b'f' => Some('\u{c}'),
        b'b' => Some('\u{8}'),
        _ => None,
    };
    if let Some(decoded) = simple {
        return Ok((decoded, 2));
    }

    match byte {
        b'u' => {
            let hex = raw
                .get(at + 2..at + 6)
                .filter(|hex| hex.bytes().all(|byte| byte.is_ascii_hexdigit()))
                .ok_or_else(|| ("`\\u` needs exactly four hex digits".to_owned(), 2))?;
            let code = u32::from_str_radix(hex, 16).map_err(|err| (err.to_string(), 6))?;
            char::from_u32(code)
                .map(|decoded| (decoded, 6))
                .ok_or_else(|| (format!("`\\u{hex}` is a surrogate code point"), 6))
        }
        b'0'..=b'7' => {
            let mut value = 0u32;
            let mut len = 0;
            while len < 3 {
                let Some(&digit) = bytes.get(at + 1 + len) else {
                    break;
                };
                if !matches!(digit, b'0'..=b'7') {
                    break;
                }
                let next = value * 8 + u32::from(digit - b'0');
                if next > 0xFF {
                    break;
                }
                value = next;
                len += 1;
            }
            char::from_u32(value)
                .map(|decoded| (decoded, len + 1))
                .ok_or_else(|| ("invalid octal escape".to_owned(), len + 1))
        }
        _ => {
            let found = raw[at + 1..].chars().next().unwrap_or('\\');
            Err((format!("unknown escape `\\{found}`"), 1 + found.len_utf8()))
        }
    }
}
