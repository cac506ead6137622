use edn_rs::{
    ErrorKind, ParseOptions, Reader, Span, Value, ValueKind, parse, parse_with_options,
};
use pretty_assertions::assert_eq;

fn kind_of_error(input: &str) -> ErrorKind {
    parse(input.as_bytes()).unwrap_err().kind()
}

#[test]
fn map_lookup_by_keyword() {
    let doc = parse(br#"{:name "Alice" :age 30}"#).unwrap();
    let root = doc.root();
    assert_eq!(root.kind(), ValueKind::Map);
    assert_eq!(root.len(), 2);
    assert_eq!(root.get_keyword("name").and_then(|v| v.as_str()), Some("Alice"));
    assert_eq!(root.get_keyword("age").and_then(|v| v.as_int()), Some(30));
    assert!(root.get_keyword("email").is_none());
}

#[test]
fn sets_ignore_element_order() {
    let a = parse(b"#{1 2 3}").unwrap();
    let b = parse(b"#{3 2 1}").unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.root().hash64(), b.root().hash64());
}

#[test]
fn nested_vectors() {
    let doc = parse(b"[[1 2] [3 4] [5 6]]").unwrap();
    let root = doc.root();
    assert_eq!(root.kind(), ValueKind::Vector);
    assert_eq!(root.len(), 3);
    let second = root.get(1).unwrap();
    assert_eq!(second.kind(), ValueKind::Vector);
    assert_eq!(second.len(), 2);
    assert_eq!(root.get(0).and_then(|v| v.get(1)).and_then(|v| v.as_int()), Some(2));
}

#[test]
fn ratios_are_reduced() {
    let ratio = parse(b"22/7").unwrap();
    let ratio = ratio.root().as_ratio().unwrap();
    assert_eq!((ratio.numer(), ratio.denom()), (22, 7));

    let reduced = parse(b"6/9").unwrap();
    let reduced = reduced.root().as_ratio().unwrap();
    assert_eq!((reduced.numer(), reduced.denom()), (2, 3));

    let whole = parse(b"10/5").unwrap();
    assert_eq!(whole.root().kind(), ValueKind::Int);
    assert_eq!(whole.root().as_int(), Some(2));
}

#[test]
fn text_block_strips_indent_of_closing_delimiter() {
    let options = ParseOptions::new().text_blocks(true);
    let doc = parse_with_options(b"\"\"\"\n  hello\n  world\n  \"\"\"", &options).unwrap();
    assert_eq!(doc.root().as_str(), Some("hello\nworld\n"));
}

#[test]
fn integer_boundaries() {
    let max = parse(b"9223372036854775807").unwrap();
    assert_eq!(max.root().as_int(), Some(i64::MAX));
    let min = parse(b"-9223372036854775808").unwrap();
    assert_eq!(min.root().as_int(), Some(i64::MIN));

    let over = parse(b"9223372036854775808").unwrap();
    assert_eq!(over.root().kind(), ValueKind::BigInt);
    assert_eq!(
        over.root().as_bigint().map(|big| big.to_bigint().to_string()),
        Some("9223372036854775808".to_owned())
    );

    assert_eq!(kind_of_error("08"), ErrorKind::InvalidNumber);
    assert_eq!(kind_of_error("09"), ErrorKind::InvalidNumber);
    assert_eq!(parse(b"0").unwrap().root().as_int(), Some(0));
}

#[test]
fn structural_errors() {
    assert_eq!(kind_of_error("{:a 1 :a 2}"), ErrorKind::DuplicateKey);
    assert_eq!(kind_of_error("#{1 2 1}"), ErrorKind::DuplicateElement);
    assert_eq!(kind_of_error("(1]"), ErrorKind::UnmatchedDelimiter);

    let deep = format!("{}{}", "[".repeat(257), "]".repeat(257));
    assert_eq!(kind_of_error(&deep), ErrorKind::InvalidSyntax);
    let ok = format!("{}{}", "(".repeat(256), ")".repeat(256));
    assert!(parse(ok.as_bytes()).is_ok());
}

#[test]
fn sequential_equality() {
    let list = parse(b"()").unwrap();
    let vector = parse(b"[]").unwrap();
    assert_eq!(list.root(), vector.root());
    assert_eq!(list.root().hash64(), vector.root().hash64());

    let one = parse(b"(1)").unwrap();
    let two = parse(b"[1 2]").unwrap();
    assert_ne!(one.root(), two.root());

    let nan = parse(b"##NaN").unwrap();
    let other = parse(b"##NaN").unwrap();
    assert_eq!(nan.root(), other.root());
}

#[test]
fn numeric_kinds_stay_distinct() {
    let docs: Vec<_> = ["1", "1N", "1.0", "1M"]
        .iter()
        .map(|input| parse(input.as_bytes()).unwrap())
        .collect();
    for (i, a) in docs.iter().enumerate() {
        for (j, b) in docs.iter().enumerate() {
            assert_eq!(a.root() == b.root(), i == j);
        }
    }
}

#[test]
fn strings_borrow_the_input_unless_escaped() {
    let input = br#"["plain" "tab\there"]"#;
    let doc = parse(input).unwrap();
    let plain = doc.root().get(0).unwrap().as_string().unwrap();
    assert!(plain.is_borrowed());
    assert_eq!(plain.as_str().as_ptr(), input[2..].as_ptr());

    let escaped = doc.root().get(1).unwrap().as_string().unwrap();
    assert!(escaped.has_escapes());
    assert_eq!(escaped.as_str(), "tab\there");
}

#[test]
fn spans_cover_the_value_after_leading_trivia() {
    let input = b"  ; comment\n #_ ignored {:a [1 2]}";
    let doc = parse(input).unwrap();
    let span = doc.root().span();
    assert_eq!(span, Span::new(24, 34));
    assert_eq!(&input[span.start..span.end], b"{:a [1 2]}");
}

#[test]
fn errors_report_position() {
    let input = b"{:a 1\n :b \"unterminated}";
    let err = parse(input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    assert_eq!(err.line_col(input), (2, 5));
    let rendered = err.render(input);
    assert!(rendered.starts_with("2:5: "), "{rendered}");
}

#[test]
fn empty_input() {
    assert_eq!(kind_of_error("  ; nothing\n"), ErrorKind::UnexpectedEof);
    assert_eq!(kind_of_error("#_ 1"), ErrorKind::UnexpectedEof);

    let nil = |arena: &mut edn_rs::Arena<'_>| arena.alloc(Value::Nil, Span::default());
    let options = ParseOptions::new().eof_value(&nil);
    let doc = parse_with_options(b"   ", &options).unwrap();
    assert!(doc.root().is_nil());
}

#[test]
fn invalid_utf8_is_rejected() {
    let err = parse(b"[\"a\xff\"]").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUtf8);
    assert_eq!(err.span(), Span::new(3, 4));
}

#[test]
fn reader_yields_every_top_level_value() {
    let input = b"{:a 1} [2] #_ skipped :three";
    let kinds: Vec<ValueKind> = Reader::new(input, &ParseOptions::default())
        .unwrap()
        .map(|doc| doc.unwrap().root().kind())
        .collect();
    assert_eq!(kinds, [ValueKind::Map, ValueKind::Vector, ValueKind::Keyword]);

    let mut reader = Reader::new(b"1 (2", &ParseOptions::default()).unwrap();
    assert_eq!(reader.next().unwrap().unwrap().root().as_int(), Some(1));
    assert_eq!(reader.next().unwrap().unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert!(reader.next().is_none());
}

#[test]
fn feature_switches() {
    let plain = ParseOptions::new()
        .extended_integers(false)
        .ratios(false)
        .metadata(false);
    for input in ["0x1F", "2r101", "1/2", "^:k x"] {
        assert!(parse_with_options(input.as_bytes(), &plain).is_err(), "{input}");
    }
    assert_eq!(parse(b"0x1F").unwrap().root().as_int(), Some(31));
    assert_eq!(parse(b"2r101").unwrap().root().as_int(), Some(5));
    assert_eq!(parse(b"017").unwrap().root().as_int(), Some(15));

    let underscores = ParseOptions::new().underscores(true);
    let doc = parse_with_options(b"1_000_000", &underscores).unwrap();
    assert_eq!(doc.root().as_int(), Some(1_000_000));
    assert_eq!(kind_of_error("1_000"), ErrorKind::InvalidNumber);
}
