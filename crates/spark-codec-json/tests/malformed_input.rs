//! 损坏输入与重复键测试。
//!
//! 委托报告的错误必须原样穿过转换适配器，且不产生任何部分结果。

use spark_codec_json::error::codes;
use spark_codec_json::{
    CodecConfig, CodecError, DuplicateKeyPolicy, Record, RecordSchema, TypeDescriptor, Value,
    provide_registry, provide_registry_with, registry_builder, stream,
};

#[test]
fn truncated_document_is_malformed() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_list(TypeDescriptor::int());
    let err = registry.from_json("[1, 2", &ty).unwrap_err();
    assert_eq!(err.code(), codes::CODEC_MALFORMED_INPUT);
}

#[test]
fn wrong_token_reports_the_path() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_map(
        TypeDescriptor::string(),
        TypeDescriptor::immutable_list(TypeDescriptor::int()),
    );
    let err = registry
        .from_json(r#"{"ok": [1], "bad": [2, "x"]}"#, &ty)
        .unwrap_err();
    match err {
        CodecError::MalformedInput { path, detail } => {
            assert_eq!(path, "$.bad[1]");
            assert!(detail.contains("an int"), "{detail}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn set_given_an_object_is_malformed() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_set(TypeDescriptor::string());
    let err = registry.from_json(r#"{"a": "b"}"#, &ty).unwrap_err();
    match err {
        CodecError::MalformedInput { detail, .. } => {
            assert!(detail.contains("BEGIN_ARRAY"), "{detail}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn multimap_with_a_non_list_group_is_malformed() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_multimap(TypeDescriptor::string(), TypeDescriptor::int());
    let err = registry.from_json(r#"{"a": 1}"#, &ty).unwrap_err();
    match err {
        CodecError::MalformedInput { detail, .. } => {
            assert!(detail.contains("BEGIN_ARRAY"), "{detail}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn sorted_map_given_an_array_of_scalars_is_malformed() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_sorted_map(TypeDescriptor::string(), TypeDescriptor::int());
    assert_eq!(
        registry.from_json("[1]", &ty).unwrap_err().code(),
        codes::CODEC_MALFORMED_INPUT
    );
    assert_eq!(
        registry.from_json(r#"{"a": "x"}"#, &ty).unwrap_err().code(),
        codes::CODEC_MALFORMED_INPUT
    );
}

#[test]
fn reject_policy_applies_to_repeated_multimap_keys() {
    let registry = provide_registry_with(
        CodecConfig::default().with_duplicate_keys(DuplicateKeyPolicy::Reject),
    );
    let ty = TypeDescriptor::immutable_multimap(TypeDescriptor::string(), TypeDescriptor::int());
    let err = registry
        .from_json(r#"{"k": [1], "k": [2]}"#, &ty)
        .unwrap_err();
    assert_eq!(err.code(), codes::CODEC_DUPLICATE_KEY);
}

#[test]
fn duplicate_keys_take_the_last_value_by_default() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_map(TypeDescriptor::string(), TypeDescriptor::int());
    let value = registry
        .from_json(r#"{"a": 1, "b": 2, "a": 3}"#, &ty)
        .unwrap();
    assert_eq!(registry.to_json(&value, &ty).unwrap(), r#"{"a":3,"b":2}"#);
}

#[test]
fn reject_policy_surfaces_duplicate_key_conflict() {
    let registry = provide_registry_with(
        CodecConfig::default().with_duplicate_keys(DuplicateKeyPolicy::Reject),
    );
    let ty = TypeDescriptor::immutable_sorted_map(TypeDescriptor::string(), TypeDescriptor::int());
    let err = registry
        .from_json(r#"{"a": 1, "a": 2}"#, &ty)
        .unwrap_err();
    assert_eq!(err.code(), codes::CODEC_DUPLICATE_KEY);
    assert!(!err.is_fatal_configuration());
}

#[test]
fn reject_policy_accepts_distinct_keys() {
    let registry = provide_registry_with(
        CodecConfig::default().with_duplicate_keys(DuplicateKeyPolicy::Reject),
    );
    let ty = TypeDescriptor::immutable_multimap(TypeDescriptor::string(), TypeDescriptor::int());
    let value = registry.from_json(r#"{"a": [1, 1], "b": [2]}"#, &ty).unwrap();
    let Value::Multimap(map) = value else {
        panic!("expected a multimap");
    };
    assert_eq!(map.len(), 3);
}

#[test]
fn encoding_the_wrong_family_is_a_type_mismatch() {
    let registry = provide_registry();
    let ty = TypeDescriptor::immutable_set(TypeDescriptor::int());
    let list = Value::List(vec![Value::Int(1)].into());
    let err = registry.to_json(&list, &ty).unwrap_err();
    match err {
        CodecError::TypeMismatch { expected, found } => {
            assert_eq!(expected, ty);
            assert_eq!(found, "immutable list");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

fn item_schema() -> RecordSchema {
    RecordSchema::new("Item")
        .field("id", TypeDescriptor::int())
        .field("tags", TypeDescriptor::immutable_set(TypeDescriptor::string()))
}

#[test]
fn stream_round_trips_records() {
    let registry = registry_builder().register_record(item_schema()).build();
    let ty = item_schema().descriptor();
    let items: Vec<Value> = (1..=2_i64)
        .map(|id| {
            Value::Record(
                Record::new("Item")
                    .with_field("id", id)
                    .with_field(
                        "tags",
                        Value::Set([Value::from("x")].into_iter().collect()),
                    ),
            )
        })
        .collect();

    let mut out = Vec::new();
    stream::write_json_stream(&registry, &mut out, &ty, &items).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("[\n  {\n    \"id\": 1,"), "{text}");

    let decoded = stream::read_json_stream(&registry, text.as_bytes(), &ty).unwrap();
    assert_eq!(decoded.as_slice(), items.as_slice());
}

#[test]
fn stream_with_a_malformed_second_element_returns_only_the_error() {
    let registry = registry_builder().register_record(item_schema()).build();
    let ty = item_schema().descriptor();
    let text = r#"[{"id": 1, "tags": ["x"]}, {"id": 2, "tags": "x"}, {"id": 3}]"#;

    let err = stream::read_json_stream(&registry, text.as_bytes(), &ty).unwrap_err();
    match err {
        CodecError::MalformedInput { path, .. } => assert_eq!(path, "$[1].tags"),
        other => panic!("unexpected error {other:?}"),
    }
}
