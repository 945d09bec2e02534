use knotwire::derive::Codable;
use knotwire::{Codec, DecodeError, EncodeError, TypeRegistry, Value, Wire, obj};

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Person {
    #[codable(rename = "full_name", required)]
    name: String,
    #[codable(required)]
    age: i32,
}

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Orphan {
    id: i32,
}

// No `#[codable(default)]`: decodable metadata without a constructor.
#[derive(Codable, Default, Debug)]
struct Sealed {
    id: i32,
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<Person>();
    registry.register::<Sealed>();
    registry
}

#[test]
fn unregistered_type_is_not_serializable() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let err = codec.encode_obj(&obj(Orphan { id: 1 })).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::NotSerializable { type_name: "Orphan" }
    ));
}

#[test]
fn missing_required_field_fails() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let err = codec
        .decode_obj::<Person>(r#"{"$id":"ref_1","full_name":"Ann"}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MissingRequiredField {
            type_name: "Person",
            field: "age",
        }
    ));
}

#[test]
fn type_without_constructor_fails_to_instantiate() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let err = codec
        .decode_obj::<Sealed>(r#"{"$id":"ref_1","id":1}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InstantiationFailure { type_name: "Sealed" }
    ));
}

#[test]
fn bad_literal_in_field_reports_type_and_field() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let err = codec
        .decode_obj::<Person>(r#"{"$id":"ref_1","full_name":"Ann","age":"thirty"}"#)
        .unwrap_err();

    let DecodeError::Field {
        type_name,
        field,
        source,
    } = err
    else {
        panic!("expected a field-context error, got {err:?}");
    };
    assert_eq!(type_name, "Person");
    assert_eq!(field, "age");
    assert!(matches!(*source, DecodeError::TypeMismatch { .. }));
}

#[test]
fn malformed_literals_mismatch_at_the_root() {
    let registry = TypeRegistry::new();
    let codec = Codec::new(&registry);

    assert!(matches!(
        codec.decode("nope", &<bool as Wire>::kind()).unwrap_err(),
        DecodeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        codec.decode("1.5", &<i64 as Wire>::kind()).unwrap_err(),
        DecodeError::TypeMismatch { .. }
    ));
    // Strings must be quoted.
    assert!(matches!(
        codec.decode("bare", &<String as Wire>::kind()).unwrap_err(),
        DecodeError::TypeMismatch { .. }
    ));
    // A char is a one-character string.
    assert!(matches!(
        codec.decode(r#""ab""#, &<char as Wire>::kind()).unwrap_err(),
        DecodeError::TypeMismatch { .. }
    ));
}

#[test]
fn fixed_array_length_is_enforced() {
    let registry = TypeRegistry::new();
    let codec = Codec::new(&registry);

    let err = codec
        .decode("[1,2,3]", &<[u8; 2] as Wire>::kind())
        .unwrap_err();
    assert!(matches!(err, DecodeError::TypeMismatch { .. }));
}

#[test]
fn structurally_broken_text_is_malformed() {
    let registry = registry();
    let codec = Codec::new(&registry);

    // Missing closing bracket.
    assert!(matches!(
        codec.decode("[1,2", &<Vec<i64> as Wire>::kind()).unwrap_err(),
        DecodeError::MalformedInput { .. }
    ));
    // Missing closing brace.
    assert!(matches!(
        codec
            .decode_obj::<Person>(r#"{"$id":"ref_1""#)
            .unwrap_err(),
        DecodeError::MalformedInput { .. }
    ));
    // Missing colon in an object entry.
    assert!(matches!(
        codec
            .decode_obj::<Person>(r#"{"$id" "ref_1"}"#)
            .unwrap_err(),
        DecodeError::MalformedInput { .. }
    ));
    // Unterminated string.
    assert!(matches!(
        codec.decode(r#""open"#, &<String as Wire>::kind()).unwrap_err(),
        DecodeError::MalformedInput { .. }
    ));
    // Unsupported escape.
    assert!(matches!(
        codec
            .decode(r#""bad \x escape""#, &<String as Wire>::kind())
            .unwrap_err(),
        DecodeError::MalformedInput { .. }
    ));
}

#[test]
fn unknown_type_names_fail_both_directions() {
    let registry = registry();
    let codec = Codec::new(&registry);

    assert!(matches!(
        codec.decode_as_type("null", "Ghost").unwrap_err(),
        DecodeError::UnknownType { .. }
    ));
    assert!(matches!(
        codec.encode_as_type("Ghost", &Value::Null).unwrap_err(),
        EncodeError::UnknownType { .. }
    ));
}

#[test]
fn encode_as_type_rejects_foreign_values() {
    let registry = registry();
    let codec = Codec::new(&registry);

    // Resolvable name, but the value is not an instance of it.
    assert!(matches!(
        codec.encode_as_type("Person", &Value::Int(3)).unwrap_err(),
        EncodeError::UnknownType { .. }
    ));

    let sealed = obj(Sealed { id: 1 });
    let err = codec
        .encode_as_type("Person", &sealed.to_value())
        .unwrap_err();
    assert!(matches!(err, EncodeError::UnknownType { .. }));
}
