use super::Parser;
use crate::{
    arena::NodeId,
    error::{ErrorKind, Result, Span},
    scan,
    value::Value,
};

impl Parser<'_, '_> {
    pub(super) fn read_char(&mut self) -> Result<NodeId> {
        let text = self.text;
        let start = self.pos;
        let Some(first) = text[start + 1..].chars().next() else {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "character literal is missing its character",
                Span::new(start, start + 1),
            ));
        };
        if matches!(first, ' ' | '\t' | '\n' | '\r') {
            return Err(self.error(
                ErrorKind::InvalidCharacter,
                "`\\` must be followed by a character, not whitespace",
                Span::new(start, start + 2),
            ));
        }

        // The first character is taken as is, so `\(` and `\\` are literals.
        let mut end = start + 1 + first.len_utf8();
        while let Some(&byte) = self.bytes.get(end) {
            if scan::is_terminator(byte) || byte == b'\\' {
                break;
            }
            end += 1;
        }
        self.pos = end;

        let span = Span::new(start, end);
        let token = &text[start + 1..end];
        let decoded = if token.len() == first.len_utf8() {
            Some(first)
        } else {
            self.char_name(token).map_err(|message| self.error(ErrorKind::InvalidCharacter, message, span))?
        };
        let Some(decoded) = decoded else {
            return Err(self.error(
                ErrorKind::InvalidCharacter,
                format!("unknown character name `\\{token}`"),
                span,
            ));
        };
        self.alloc(Value::Char(decoded), span)
    }

    /// Resolves a multi-character literal body. `Ok(None)` means the name is
    /// not recognized at all.
    fn char_name(&self, token: &str) -> std::result::Result<Option<char>, String> {
        let extended = self.options.extended_characters;
        let named = match token {
            "newline" => Some('\n'),
            "space" => Some(' '),
            "tab" => Some('\t'),
            "return" => Some('\r'),
            "formfeed" if extended => Some('\u{c}'),
            "backspace" if extended => Some('\u{8}'),
            _ => None,
        };
        if named.is_some() {
            return Ok(named);
        }

        if let Some(hex) = token.strip_prefix('u') {
            if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
                return Ok(None);
            }
            if hex.len() != 4 {
                return Err(format!("`\\u{hex}` needs exactly four hex digits"));
            }
            let code = u32::from_str_radix(hex, 16).map_err(|err| err.to_string())?;
            return char::from_u32(code)
                .map(Some)
                .ok_or_else(|| format!("`\\u{hex}` is a surrogate code point"));
        }

        if let Some(octal) = token.strip_prefix('o').filter(|_| extended) {
            if octal.len() > 3 || !octal.bytes().all(|byte| matches!(byte, b'0'..=b'7')) {
                return Err(format!("`\\o{octal}` needs one to three octal digits"));
            }
            let code = u32::from_str_radix(octal, 8).map_err(|err| err.to_string())?;
            if code > 0o377 {
                return Err(format!("`\\o{octal}` is above \\o377"));
            }
            return Ok(char::from_u32(code));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::ParseOptions,
        read::tests::{error_kind, parse, parse_with},
    };

    fn char_of(input: &str) -> char {
        parse(input).unwrap().root().as_char().unwrap()
    }

    #[test]
    fn single_characters() {
        assert_eq!(char_of(r"\a"), 'a');
        assert_eq!(char_of(r"\("), '(');
        assert_eq!(char_of(r"\\"), '\\');
        assert_eq!(char_of(r"\1"), '1');
        assert_eq!(char_of(r"\u"), 'u');
        assert_eq!(char_of(r"\o"), 'o');
        assert_eq!(char_of("\\é"), 'é');
        assert_eq!(char_of("\\😀 "), '😀');
    }

    #[test]
    fn named_characters() {
        assert_eq!(char_of(r"\newline"), '\n');
        assert_eq!(char_of(r"\space"), ' ');
        assert_eq!(char_of(r"\tab"), '\t');
        assert_eq!(char_of(r"\return"), '\r');
        assert_eq!(char_of(r"\formfeed"), '\u{c}');
        assert_eq!(char_of(r"\backspace"), '\u{8}');

        let plain = ParseOptions::default().extended_characters(false);
        assert_eq!(
            parse_with(r"\formfeed", plain).unwrap_err().kind(),
            ErrorKind::InvalidCharacter
        );
        assert_eq!(
            parse_with(r"\o101", plain).unwrap_err().kind(),
            ErrorKind::InvalidCharacter
        );
    }

    #[test]
    fn unicode_and_octal_forms() {
        assert_eq!(char_of(r"\u00E9"), 'é');
        assert_eq!(char_of(r"\o101"), 'A');
        assert_eq!(char_of(r"\o0"), '\0');
        assert_eq!(char_of(r"\o377"), '\u{ff}');
        for input in [r"\u12", r"\u123456", r"\uD800", r"\o400", r"\o8", r"\o1234", r"\foo"] {
            assert_eq!(error_kind(input), ErrorKind::InvalidCharacter, "{input}");
        }
    }

    #[test]
    fn token_boundaries() {
        let doc = parse(r"[\a\b \c,\d]").unwrap();
        let chars: Vec<char> = doc.root().iter().filter_map(|v| v.as_char()).collect();
        assert_eq!(chars, ['a', 'b', 'c', 'd']);
        assert_eq!(doc.root().get(1).unwrap().span(), Span::new(3, 5));
    }

    #[test]
    fn whitespace_is_not_a_character() {
        assert_eq!(error_kind("\\ "), ErrorKind::InvalidCharacter);
        assert_eq!(error_kind("\\\t"), ErrorKind::InvalidCharacter);
        assert_eq!(error_kind("\\"), ErrorKind::UnexpectedEof);
    }
}
