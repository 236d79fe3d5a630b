use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Codec, CodecFactory, mismatch, read_null};
use crate::config::DuplicateKeyPolicy;
use crate::descriptor::{RawType, TypeDescriptor};
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{JsonNode, TokenKind, TokenReader, TokenWriter, TreeWriter, write_node};
use crate::value::Value;

/// 可变映射的编解码器：`LinkedHashMap<K, V>` 与 `TreeMap<K, V>`。
///
/// # 教案式说明
/// - **意图 (Why)**：映射是不可变映射族（含多值映射）的共同委托，键编码与重复键判定集中在此处；
/// - **契约 (What)**：
///   - 键编码为标量时输出 JSON 对象，成员名取标量的文本形式；
///   - 存在非标量键时，若开启 `complex_map_keys` 则输出 `[[键, 值], ...]`，否则返回
///     [`CodecError::Unencodable`]；
///   - 解码同时接受对象与键值对数组两种形态；
///   - 重复键按 [`DuplicateKeyPolicy`] 处理：覆盖时保留键的首次位置，拒绝时报告
///     [`CodecError::DuplicateKeyConflict`]；
///   - [`Codec::read_entries`] 交出未合并的键值对，供多值映射拼接重复分组；
/// - **实现 (How)**：先用 [`TreeWriter`] 把每个键编码成节点，再决定整体形态，避免写出一半后回退。
pub struct MapCodec {
    descriptor: TypeDescriptor,
    key: Arc<dyn Codec>,
    value: Arc<dyn Codec>,
    duplicate_keys: DuplicateKeyPolicy,
    complex_keys: bool,
}

enum Entries {
    Linked(IndexMap<Value, Value>),
    Tree(BTreeMap<Value, Value>),
}

impl Entries {
    fn contains(&self, key: &Value) -> bool {
        match self {
            Entries::Linked(map) => map.contains_key(key),
            Entries::Tree(map) => map.contains_key(key),
        }
    }

    fn insert(&mut self, key: Value, value: Value) {
        match self {
            Entries::Linked(map) => {
                map.insert(key, value);
            }
            Entries::Tree(map) => {
                map.insert(key, value);
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Entries::Linked(map) => Value::LinkedMap(map),
            Entries::Tree(map) => Value::TreeMap(map),
        }
    }
}

impl MapCodec {
    pub fn new(
        descriptor: TypeDescriptor,
        key: Arc<dyn Codec>,
        value: Arc<dyn Codec>,
        duplicate_keys: DuplicateKeyPolicy,
        complex_keys: bool,
    ) -> Self {
        Self {
            descriptor,
            key,
            value,
            duplicate_keys,
            complex_keys,
        }
    }

    fn is_tree(&self) -> bool {
        *self.descriptor.raw_type() == RawType::TreeMap
    }

    fn empty_entries(&self) -> Entries {
        if self.is_tree() {
            Entries::Tree(BTreeMap::new())
        } else {
            Entries::Linked(IndexMap::new())
        }
    }

    fn encode_key(&self, key: &Value) -> Result<JsonNode, CodecError> {
        let mut writer = TreeWriter::new();
        self.key.write(&mut writer, key)?;
        writer.into_node()
    }

    fn write_entries<'a>(
        &self,
        out: &mut dyn TokenWriter,
        entries: impl Iterator<Item = (&'a Value, &'a Value)>,
    ) -> Result<(), CodecError> {
        let mut encoded = Vec::new();
        for (key, value) in entries {
            encoded.push((self.encode_key(key)?, value));
        }

        if encoded.iter().any(|(key, _)| !key.is_scalar()) {
            if !self.complex_keys {
                return Err(CodecError::Unencodable {
                    detail: format!(
                        "non-scalar keys of `{}` without complex_map_keys",
                        self.descriptor
                    ),
                });
            }
            out.begin_array()?;
            for (key, value) in &encoded {
                out.begin_array()?;
                write_node(out, key)?;
                self.value.write(out, value)?;
                out.end_array()?;
            }
            return out.end_array();
        }

        out.begin_object()?;
        for (key, value) in &encoded {
            out.name(&member_name(key))?;
            self.value.write(out, value)?;
        }
        out.end_object()
    }

    fn check_duplicate(
        &self,
        input: &dyn TokenReader,
        seen: bool,
        key: &Value,
    ) -> Result<(), CodecError> {
        if seen && self.duplicate_keys == DuplicateKeyPolicy::Reject {
            return Err(CodecError::DuplicateKeyConflict {
                path: input.path(),
                key: describe_key(key),
            });
        }
        Ok(())
    }

    /// 逐个读取键值对交给 `sink`，接受对象与键值对数组两种形态。
    fn read_pairs(
        &self,
        input: &mut dyn TokenReader,
        mut sink: impl FnMut(&dyn TokenReader, Value, Value) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        match input.peek()? {
            TokenKind::BeginArray => {
                input.begin_array()?;
                while input.has_next()? {
                    input.begin_array()?;
                    let key = self.key.read(input)?;
                    let value = self.value.read(input)?;
                    input.end_array()?;
                    sink(&*input, key, value)?;
                }
                input.end_array()
            }
            TokenKind::BeginObject => {
                input.begin_object()?;
                while input.has_next()? {
                    input.promote_name_to_value()?;
                    let key = self.key.read(input)?;
                    let value = self.value.read(input)?;
                    sink(&*input, key, value)?;
                }
                input.end_object()
            }
            other => Err(CodecError::malformed(
                input.path(),
                format!("expected BEGIN_OBJECT but was {}", other.label()),
            )),
        }
    }
}

impl Codec for MapCodec {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Null => out.null_value(),
            Value::LinkedMap(map) if !self.is_tree() => self.write_entries(out, map.iter()),
            Value::TreeMap(map) if self.is_tree() => self.write_entries(out, map.iter()),
            other => Err(mismatch(&self.descriptor, other)),
        }
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        if read_null(input)? {
            return Ok(Value::Null);
        }
        let mut entries = self.empty_entries();
        self.read_pairs(input, |input, key, value| {
            self.check_duplicate(input, entries.contains(&key), &key)?;
            entries.insert(key, value);
            Ok(())
        })?;
        Ok(entries.into_value())
    }

    fn read_entries(
        &self,
        input: &mut dyn TokenReader,
    ) -> Result<Option<Vec<(Value, Value)>>, CodecError> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        self.read_pairs(input, |input, key, value| {
            self.check_duplicate(input, !seen.insert(key.clone()), &key)?;
            pairs.push((key, value));
            Ok(())
        })?;
        Ok(Some(pairs))
    }
}

fn member_name(key: &JsonNode) -> String {
    match key {
        JsonNode::String(s) => s.clone(),
        JsonNode::Number(n) => n.to_string(),
        JsonNode::Bool(b) => b.to_string(),
        JsonNode::Null => "null".to_owned(),
        JsonNode::Array(_) | JsonNode::Object(_) => String::new(),
    }
}

fn describe_key(key: &Value) -> String {
    match key {
        Value::String(s) => format!("\"{s}\""),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

/// 认领 `LinkedHashMap<K, V>` 与 `TreeMap<K, V>` 的工厂。
///
/// 重复键策略与复杂键开关取自注册中心配置。
#[derive(Clone, Copy, Debug, Default)]
pub struct MapFactory;

impl CodecFactory for MapFactory {
    fn name(&self) -> &'static str {
        "map"
    }

    fn create(
        &self,
        registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
        if !matches!(
            descriptor.raw_type(),
            RawType::LinkedHashMap | RawType::TreeMap
        ) {
            return Ok(None);
        }
        let [key, value] = descriptor.args() else {
            return Ok(None);
        };
        let key = registry.get_adapter(key)?;
        let value = registry.get_adapter(value)?;
        let config = registry.config();
        Ok(Some(Arc::new(MapCodec::new(
            descriptor.clone(),
            key,
            value,
            config.duplicate_keys,
            config.complex_map_keys,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    fn linked(entries: &[(i64, &str)]) -> Value {
        Value::LinkedMap(
            entries
                .iter()
                .map(|(k, v)| (Value::Int(*k), Value::from(*v)))
                .collect(),
        )
    }

    #[test]
    fn scalar_keys_become_member_names() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::linked_hash_map(TypeDescriptor::int(), TypeDescriptor::string());
        let json = registry.to_json(&linked(&[(2, "b"), (1, "a")]), &ty).unwrap();
        assert_eq!(json, r#"{"2":"b","1":"a"}"#);
        assert_eq!(registry.from_json(&json, &ty).unwrap(), linked(&[(2, "b"), (1, "a")]));
    }

    #[test]
    fn last_write_wins_keeps_first_position() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::linked_hash_map(TypeDescriptor::string(), TypeDescriptor::int());
        let value = registry
            .from_json(r#"{"a": 1, "b": 2, "a": 3}"#, &ty)
            .unwrap();
        let Value::LinkedMap(map) = value else {
            panic!("expected a linked map");
        };
        let entries: Vec<(&str, i64)> = map
            .iter()
            .filter_map(|(k, v)| Some((k.as_str()?, v.as_i64()?)))
            .collect();
        assert_eq!(entries, vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn reject_policy_reports_the_key() {
        let registry = CodecRegistry::builder()
            .with_config(CodecConfig::default().with_duplicate_keys(DuplicateKeyPolicy::Reject))
            .build();
        let ty = TypeDescriptor::tree_map(TypeDescriptor::string(), TypeDescriptor::int());
        let err = registry
            .from_json(r#"{"a": 1, "a": 2}"#, &ty)
            .unwrap_err();
        match err {
            CodecError::DuplicateKeyConflict { key, .. } => assert_eq!(key, "\"a\""),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn read_entries_keeps_repeated_keys() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::linked_hash_map(TypeDescriptor::string(), TypeDescriptor::int());
        let codec = registry.get_adapter(&ty).unwrap();
        let node: JsonNode = serde_json::from_str(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        let mut reader = crate::token::TreeReader::new(node);
        let pairs = codec.read_entries(&mut reader).unwrap().unwrap();
        let pairs: Vec<(&str, i64)> = pairs
            .iter()
            .filter_map(|(k, v)| Some((k.as_str()?, v.as_i64()?)))
            .collect();
        assert_eq!(pairs, vec![("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(reader.peek().unwrap(), TokenKind::EndDocument);
    }

    #[test]
    fn complex_keys_need_opt_in() {
        let key_ty = TypeDescriptor::array_list(TypeDescriptor::int());
        let ty = TypeDescriptor::linked_hash_map(key_ty, TypeDescriptor::bool());
        let value = Value::LinkedMap(
            [(Value::Array(vec![Value::Int(1)]), Value::Bool(true))]
                .into_iter()
                .collect(),
        );

        let strict = CodecRegistry::builder().build();
        assert!(matches!(
            strict.to_json(&value, &ty),
            Err(CodecError::Unencodable { .. })
        ));

        let lenient = CodecRegistry::builder()
            .with_config(CodecConfig::default().with_complex_map_keys(true))
            .build();
        let json = lenient.to_json(&value, &ty).unwrap();
        assert_eq!(json, "[[[1],true]]");
        assert_eq!(lenient.from_json(&json, &ty).unwrap(), value);
        // 键值对数组形态无论开关如何都可以读取。
        assert_eq!(strict.from_json(&json, &ty).unwrap(), value);
    }

    #[test]
    fn arrays_of_scalars_are_not_maps() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::tree_map(TypeDescriptor::string(), TypeDescriptor::int());
        assert!(matches!(
            registry.from_json("\"a\"", &ty),
            Err(CodecError::MalformedInput { .. })
        ));
        assert!(matches!(
            registry.from_json(r#"["a", 1]"#, &ty),
            Err(CodecError::MalformedInput { .. })
        ));
    }
}
