mod character;
mod collection;
mod dec2flt;
mod dispatch;
mod ident;
mod meta;
mod number;
mod string;

use std::borrow::Cow;

use tracing::debug;

use crate::{
    arena::{AllocError, Arena, NodeId},
    error::{Error, ErrorKind, Result, Span},
    options::ParseOptions,
    scan,
    value::{Value, ValueRef},
};

/// One parsed top-level value together with the arena that owns it.
///
/// Dropping the document releases every node at once. String and identifier
/// payloads may borrow from the input, which must outlive the document.
#[derive(Debug)]
pub struct Document<'a> {
    arena: Arena<'a>,
    root: NodeId,
}

impl<'a> Document<'a> {
    #[inline]
    pub fn root(&self) -> ValueRef<'_, 'a> {
        self.arena.get(self.root)
    }

    #[inline]
    pub fn arena(&self) -> &Arena<'a> {
        &self.arena
    }
}

/// Outcome of reading one form: a value, a closing delimiter that belongs to
/// an enclosing collection (not consumed), or the end of input.
enum Form {
    Value(NodeId),
    Close(u8),
    Eof,
}

pub(crate) struct Parser<'a, 'r> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    arena: Arena<'a>,
    options: ParseOptions<'r>,
}

impl<'a, 'r> Parser<'a, 'r> {
    pub(crate) fn new(input: &'a [u8], options: ParseOptions<'r>) -> Result<Self> {
        let text = scan::validate_utf8(input).map_err(|(start, end)| {
            Error::new(
                ErrorKind::InvalidUtf8,
                "input is not valid UTF-8",
                Span::new(start, end),
            )
        })?;

        Ok(Self {
            text,
            bytes: input,
            pos: 0,
            depth: 0,
            arena: Self::fresh_arena(input.len(), &options),
            options,
        })
    }

    fn fresh_arena(len: usize, options: &ParseOptions<'_>) -> Arena<'a> {
        Arena::with_limit((len / 8).max(64), options.max_nodes)
    }

    /// Reads the first value of the input; the rest of the input is ignored.
    pub(crate) fn parse_document(mut self) -> Result<Document<'a>> {
        let root = match self.read_form() {
            Ok(Form::Value(id)) => Ok(id),
            Ok(Form::Eof) => self.eof_value(),
            Ok(Form::Close(byte)) => Err(self.unmatched(byte)),
            Err(err) => Err(err),
        };
        debug_assert_eq!(self.depth, 0);

        root.map(|root| Document {
            arena: self.arena,
            root,
        })
    }

    /// Reads the next top-level value into its own arena.
    pub(crate) fn next_document(&mut self) -> Result<Option<Document<'a>>> {
        let result = self.read_form();
        debug_assert_eq!(self.depth, 0);

        match result? {
            Form::Value(root) => {
                let fresh = Self::fresh_arena(self.bytes.len() - self.pos, &self.options);
                let arena = std::mem::replace(&mut self.arena, fresh);
                Ok(Some(Document { arena, root }))
            }
            Form::Eof => Ok(None),
            Form::Close(byte) => Err(self.unmatched(byte)),
        }
    }

    fn eof_value(&mut self) -> Result<NodeId> {
        let Some(build) = self.options.eof_value else {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "input contains no value",
                Span::new(self.pos, self.pos),
            ));
        };
        let span = Span::new(self.pos, self.pos);
        let id = build(&mut self.arena).map_err(|err| Error::from_alloc(&err, span))?;
        if id >= self.arena.len() {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("eof value builder returned node {id}, which it never allocated"),
                span,
            ));
        }
        Ok(id)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn error(&self, kind: ErrorKind, message: impl Into<Cow<'static, str>>, span: Span) -> Error {
        Error::new(kind, message, span)
    }

    fn unmatched(&self, byte: u8) -> Error {
        self.error(
            ErrorKind::UnmatchedDelimiter,
            format!("unmatched delimiter `{}`", byte as char),
            Span::new(self.pos, self.pos + 1),
        )
    }

    fn alloc(&mut self, value: Value<'a>, span: Span) -> Result<NodeId> {
        self.arena
            .alloc(value, span)
            .map_err(|err: AllocError| Error::from_alloc(&err, span))
    }

    /// Runs `read` one nesting level deeper. The depth is restored on every
    /// return path.
    fn nested<T>(&mut self, start: usize, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("nesting exceeds the maximum depth of {}", self.options.max_depth),
                Span::new(start, start + 1),
            ));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Skips whitespace, comments and discarded forms, then reads one form.
    fn read_form(&mut self) -> Result<Form> {
        loop {
            self.pos = scan::skip_whitespace(self.bytes, self.pos);
            let Some(byte) = self.peek() else {
                return Ok(Form::Eof);
            };

            match byte {
                b')' | b']' | b'}' => return Ok(Form::Close(byte)),
                b'#' if self.peek_at(1) == Some(b'_') => self.discard()?,
                _ => return self.read_value(byte).map(Form::Value),
            }
        }
    }

    /// `#_ form`: reads and validates the next form, then drops its nodes.
    fn discard(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 2;
        let mark = self.arena.len();
        self.nested(start, |parser| parser.read_operand("discard form `#_`", start))?;
        self.arena.rewind(mark);
        Ok(())
    }

    /// Reads the form that must follow a prefix such as `#tag`, `#_` or `^`.
    fn read_operand(&mut self, what: &str, start: usize) -> Result<NodeId> {
        match self.read_form()? {
            Form::Value(id) => Ok(id),
            Form::Eof => Err(self.error(
                ErrorKind::UnexpectedEof,
                format!("{what} is missing its value"),
                Span::new(start, self.pos),
            )),
            Form::Close(byte) => Err(self.error(
                ErrorKind::InvalidSyntax,
                format!("{what} is missing its value before `{}`", byte as char),
                Span::new(start, self.pos + 1),
            )),
        }
    }

    fn read_value(&mut self, byte: u8) -> Result<NodeId> {
        match byte {
            b'(' | b'[' | b'{' => self.read_collection(byte),
            b'"' => self.read_string(),
            b'\\' => self.read_char(),
            b'#' => self.read_dispatch(),
            b'^' => self.read_meta(),
            b':' => self.read_keyword(),
            b'0'..=b'9' => self.read_number(),
            b'+' | b'-' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.read_number()
            }
            _ => self.read_symbol(),
        }
    }
}

/// Iterator over every top-level value of one input.
///
/// ```
/// let values: Vec<i64> = edn_rs::Reader::new(b"1 2 ; three\n 3", &Default::default())
///     .unwrap()
///     .map(|doc| doc.unwrap().root().as_int().unwrap())
///     .collect();
/// assert_eq!(values, [1, 2, 3]);
/// ```
pub struct Reader<'a, 'r> {
    parser: Parser<'a, 'r>,
    done: bool,
}

impl<'a, 'r> Reader<'a, 'r> {
    pub fn new(input: &'a [u8], options: &ParseOptions<'r>) -> Result<Self> {
        Ok(Self {
            parser: Parser::new(input, *options)?,
            done: false,
        })
    }

    /// Byte offset just past the last value read.
    pub fn position(&self) -> usize {
        self.parser.pos
    }
}

impl<'a> Iterator for Reader<'a, '_> {
    type Item = Result<Document<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.next_document() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                debug!(kind = %err.kind(), start = err.span().start, "read failed");
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
