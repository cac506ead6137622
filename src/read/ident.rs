use std::borrow::Cow;

use super::Parser;
use crate::{
    arena::NodeId,
    error::{ErrorKind, Result, Span},
    scan,
    value::{Ident, Value},
};

/// Characters allowed in symbols and keywords besides letters and digits.
/// Backspace is accepted for compatibility with older writers.
#[inline]
fn is_constituent(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '.' | '*' | '+' | '!' | '-' | '_' | '?' | '$' | '%' | '&' | '=' | '<' | '>' | ':' | '#' | '/' | '\u{8}'
        )
}

impl<'a> Parser<'a, '_> {
    pub(super) fn read_symbol(&mut self) -> Result<NodeId> {
        let start = self.pos;
        let token = self.ident_token(start)?;
        let span = Span::new(start, self.pos);

        let first = token.as_bytes()[0];
        if first == b'.' && token.as_bytes().get(1).is_some_and(u8::is_ascii_digit) {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "a number must not start with `.`",
                span,
            ));
        }

        let value = match token {
            "nil" => Value::Nil,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Symbol(self.split_ident(token, span, "symbol")?),
        };
        self.alloc(value, span)
    }

    pub(super) fn read_keyword(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let end = scan::token_end(self.bytes, self.pos);
        let span = Span::new(start, end);

        if end == self.pos {
            return Err(self.error(ErrorKind::InvalidSyntax, "`:` alone is not a keyword", span));
        }
        if self.bytes[self.pos] == b':' {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "`::` auto-resolved keywords are not supported",
                span,
            ));
        }
        let token = self.ident_token(self.pos)?;
        let ident = self.split_ident(token, span, "keyword")?;
        self.alloc(Value::Keyword(ident), span)
    }

    /// Reads an identifier token starting at `start` and checks every
    /// character; leaves the cursor after the token.
    pub(super) fn ident_token(&mut self, start: usize) -> Result<&'a str> {
        let text = self.text;
        let end = scan::token_end(self.bytes, start);
        let token = &text[start..end];

        if let Some((offset, bad)) = token.char_indices().find(|&(_, c)| !is_constituent(c)) {
            let at = start + offset;
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("unexpected character `{}`", bad.escape_debug()),
                Span::new(at, at + bad.len_utf8()),
            ));
        }
        self.pos = end;
        Ok(token)
    }

    /// Splits `ns/name` at the first slash; the name keeps any later slashes.
    pub(super) fn split_ident(&self, token: &'a str, span: Span, what: &str) -> Result<Ident<'a>> {
        if token == "/" {
            return Ok(Ident::new(None, token));
        }
        let Some((namespace, name)) = token.split_once('/') else {
            return Ok(Ident::new(None, token));
        };
        if namespace.is_empty() {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("{what} namespace must not be empty"),
                span,
            ));
        }
        if name.is_empty() {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("{what} name must not be empty"),
                span,
            ));
        }
        Ok(Ident::new(Some(Cow::Borrowed(namespace)), name))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::read::tests::{error_kind, parse};

    fn symbol(input: &str) -> (Option<String>, String) {
        let doc = parse(input).unwrap();
        let ident = doc.root().as_symbol().unwrap();
        (ident.namespace().map(str::to_owned), ident.name().to_owned())
    }

    fn keyword(input: &str) -> (Option<String>, String) {
        let doc = parse(input).unwrap();
        let ident = doc.root().as_keyword().unwrap();
        (ident.namespace().map(str::to_owned), ident.name().to_owned())
    }

    #[test]
    fn reserved_words() {
        assert!(parse("nil").unwrap().root().is_nil());
        assert_eq!(parse("true").unwrap().root().as_bool(), Some(true));
        assert_eq!(parse("false").unwrap().root().as_bool(), Some(false));
        assert_eq!(symbol("foo/nil"), (Some("foo".into()), "nil".into()));
        assert_eq!(keyword(":nil"), (None, "nil".into()));
        assert_eq!(symbol("nil?"), (None, "nil?".into()));
    }

    #[test]
    fn symbols() {
        assert_eq!(symbol("foo"), (None, "foo".into()));
        assert_eq!(symbol("my.ns/foo-bar"), (Some("my.ns".into()), "foo-bar".into()));
        assert_eq!(symbol("/"), (None, "/".into()));
        assert_eq!(symbol("foo/bar/baz"), (Some("foo".into()), "bar/baz".into()));
        assert_eq!(symbol("foo//"), (Some("foo".into()), "/".into()));
        assert_eq!(symbol("-.5"), (None, "-.5".into()));
        assert_eq!(symbol("+"), (None, "+".into()));
        assert_eq!(symbol("<=>?!*$%&_"), (None, "<=>?!*$%&_".into()));
        assert_eq!(symbol("a#b:c"), (None, "a#b:c".into()));
        assert_eq!(symbol("größe"), (None, "größe".into()));
    }

    #[test]
    fn keywords() {
        assert_eq!(keyword(":name"), (None, "name".into()));
        assert_eq!(keyword(":person/name"), (Some("person".into()), "name".into()));
        assert_eq!(keyword(":1"), (None, "1".into()));
        assert_eq!(keyword(":a/b/c"), (Some("a".into()), "b/c".into()));
    }

    #[test]
    fn identifiers_borrow_the_input() {
        let input = ":person/name";
        let doc = parse(input).unwrap();
        let ident = doc.root().as_keyword().unwrap();
        assert_eq!(ident.namespace().unwrap().as_ptr(), input[1..].as_ptr());
    }

    #[test]
    fn malformed_identifiers() {
        for input in [":", "::foo", "/foo", "foo/", ":/foo", ":foo/", ".5", "a@b", "~x", "a\\b"] {
            assert_eq!(error_kind(input), ErrorKind::InvalidSyntax, "{input}");
        }
    }

    #[test]
    fn bad_character_is_positioned() {
        let err = parse("[ab@c]").unwrap_err();
        assert_eq!(err.span(), Span::new(3, 4));
    }
}
