use edn_rs::{
    Arena, DefaultMode, ErrorKind, INST_TYPE_ID, Instant, NodeId, ParseOptions, ReaderError,
    ReaderRegistry, Span, UUID_TYPE_ID, Uuid, ValueKind, equal_as, hash_as, parse,
    parse_with_options, register_external_type,
};
use pretty_assertions::assert_eq;

const POINT_ID: u32 = 0x706f_696e;

#[derive(Debug, PartialEq, Hash)]
struct Point {
    x: u64,
    y: u64,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.to_bits(),
            y: y.to_bits(),
        }
    }
}

fn read_point(arena: &mut Arena<'_>, id: NodeId) -> Result<NodeId, ReaderError> {
    let value = arena.get(id);
    let coordinate = |index| {
        value.get(index).and_then(|v| {
            v.as_float()
                .or_else(|| v.as_int().map(|n| n as f64))
        })
    };
    let (Some(x), Some(y), 2) = (coordinate(0), coordinate(1), value.len()) else {
        return Err(ReaderError::message("point needs two numbers"));
    };
    Ok(arena.alloc_external(POINT_ID, Point::new(x, y), Span::default())?)
}

fn point_registry() -> ReaderRegistry {
    register_external_type(POINT_ID, equal_as::<Point>, hash_as::<Point>);
    let mut registry = ReaderRegistry::new();
    registry.register("point", read_point);
    registry
}

#[test]
fn reader_builds_external_value() {
    let registry = point_registry();
    let options = ParseOptions::new().registry(&registry);
    let doc = parse_with_options(b"#point [1.0 2.0]", &options).unwrap();
    let root = doc.root();

    assert_eq!(root.kind(), ValueKind::External);
    assert_eq!(root.external_type_id(), Some(POINT_ID));
    assert!(root.is_external_type(POINT_ID));
    assert_eq!(root.external_get::<Point>(POINT_ID), Some(&Point::new(1.0, 2.0)));
    assert_eq!(root.external_get::<Point>(POINT_ID + 1), None);
    assert_eq!(root.span(), Span::new(0, 16));
}

#[test]
fn externals_use_registered_equality() {
    let registry = point_registry();
    let options = ParseOptions::new().registry(&registry);
    let a = parse_with_options(b"{:at #point [1 2]}", &options).unwrap();
    let b = parse_with_options(b"{:at #point [1.0 2.0]}", &options).unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.root().hash64(), b.root().hash64());

    let err = parse_with_options(b"#{#point [0 0] #point [0.0 0.0]}", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateElement);
}

#[test]
fn rejected_value_is_unknown_tag() {
    let registry = point_registry();
    let options = ParseOptions::new().registry(&registry);
    let err = parse_with_options(b"[#point [1 2 3]]", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
    assert_eq!(err.message(), "#point: point needs two numbers");
    assert_eq!(err.span(), Span::new(1, 15));
}

#[test]
fn default_modes_apply_to_unregistered_tags() {
    let registry = point_registry();
    let input = b"[#point [1 2] #color :red]";

    let passthrough = ParseOptions::new().registry(&registry);
    let doc = parse_with_options(input, &passthrough).unwrap();
    let color = doc.root().get(1).unwrap();
    assert_eq!(color.kind(), ValueKind::Tagged);
    assert_eq!(color.tag(), Some("color"));
    assert_eq!(
        color.tagged_value().and_then(|v| v.as_keyword()).map(|k| k.name()),
        Some("red")
    );

    let unwrap = passthrough.default_mode(DefaultMode::Unwrap);
    let doc = parse_with_options(input, &unwrap).unwrap();
    assert_eq!(doc.root().get(1).map(|v| v.kind()), Some(ValueKind::Keyword));
    assert_eq!(doc.root().get(0).map(|v| v.kind()), Some(ValueKind::External));

    let strict = passthrough.default_mode(DefaultMode::Error);
    let err = parse_with_options(input, &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
    assert_eq!(err.span(), Span::new(14, 25));
}

#[test]
fn unregistering_restores_default_handling() {
    let mut registry = point_registry();
    assert!(registry.contains("point"));
    assert!(registry.unregister("point"));
    assert!(!registry.unregister("point"));

    let options = ParseOptions::new().registry(&registry);
    let doc = parse_with_options(b"#point [1 2]", &options).unwrap();
    assert_eq!(doc.root().kind(), ValueKind::Tagged);
}

#[test]
fn tagged_values_compare_structurally() {
    let a = parse(b"#my/tag [1 2]").unwrap();
    let b = parse(b"#my/tag (1 2)").unwrap();
    let c = parse(b"#other [1 2]").unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.root().hash64(), b.root().hash64());
    assert_ne!(a.root(), c.root());
}

#[test]
fn builtin_readers() {
    let registry = ReaderRegistry::with_builtins();
    assert!(registry.contains("inst"));
    assert!(registry.contains("uuid"));

    let options = ParseOptions::new().registry(&registry);
    let doc = parse_with_options(
        br#"{:created #inst "2024-02-29T12:30:00+01:00" :id #uuid "123e4567-e89b-12d3-a456-426614174000"}"#,
        &options,
    )
    .unwrap();

    let created = doc.root().get_keyword("created").unwrap();
    let instant = created.external_get::<Instant>(INST_TYPE_ID).unwrap();
    assert_eq!((instant.month(), instant.day()), (2, 29));
    assert_eq!(instant.offset_minutes(), 60);
    assert_eq!(instant.to_string(), "2024-02-29T12:30:00+01:00");

    let id = doc.root().get_keyword("id").unwrap();
    let uuid = id.external_get::<Uuid>(UUID_TYPE_ID).unwrap();
    assert_eq!(uuid.as_bytes()[0], 0x12);
}
