use std::sync::Arc;

use super::{Codec, CodecFactory, mismatch, read_null};
use crate::descriptor::{RawType, TypeDescriptor};
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{TokenReader, TokenWriter};
use crate::value::Value;

/// 布尔、整数、浮点、字符串四种标量的编解码器。
///
/// 浮点编解码器接受整数值并按浮点写出；读取时沿用令牌读取器的宽松转换（数字字符串等）。
pub struct ScalarCodec {
    descriptor: TypeDescriptor,
}

impl ScalarCodec {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Codec for ScalarCodec {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        match (self.descriptor.raw_type(), value) {
            (_, Value::Null) => out.null_value(),
            (RawType::Bool, Value::Bool(b)) => out.bool_value(*b),
            (RawType::Int, Value::Int(i)) => out.i64_value(*i),
            (RawType::Float, Value::Float(f)) => out.f64_value(*f),
            (RawType::Float, Value::Int(i)) => out.f64_value(*i as f64),
            (RawType::String, Value::String(s)) => out.string_value(s),
            _ => Err(mismatch(&self.descriptor, value)),
        }
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        if read_null(input)? {
            return Ok(Value::Null);
        }
        match self.descriptor.raw_type() {
            RawType::Bool => input.next_bool().map(Value::Bool),
            RawType::Int => input.next_i64().map(Value::Int),
            RawType::Float => input.next_f64().map(Value::Float),
            RawType::String => input.next_string().map(Value::from),
            _ => Err(CodecError::NoAdapter {
                descriptor: self.descriptor.clone(),
            }),
        }
    }
}

/// 认领标量描述符的工厂。
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarFactory;

impl CodecFactory for ScalarFactory {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn create(
        &self,
        _registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
        let scalar = matches!(
            descriptor.raw_type(),
            RawType::Bool | RawType::Int | RawType::Float | RawType::String
        );
        if !scalar || !descriptor.args().is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(ScalarCodec::new(descriptor.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{JsonNode, TreeReader, TreeWriter};

    fn encode(codec: &ScalarCodec, value: &Value) -> Result<JsonNode, CodecError> {
        let mut writer = TreeWriter::new();
        codec.write(&mut writer, value)?;
        writer.into_node()
    }

    fn decode(codec: &ScalarCodec, text: &str) -> Result<Value, CodecError> {
        let mut reader = TreeReader::new(serde_json::from_str(text)?);
        codec.read(&mut reader)
    }

    #[test]
    fn float_codec_widens_ints() {
        let codec = ScalarCodec::new(TypeDescriptor::float());
        let node = encode(&codec, &Value::Int(2)).unwrap();
        assert_eq!(serde_json::to_string(&node).unwrap(), "2.0");
    }

    #[test]
    fn string_codec_rejects_ints() {
        let codec = ScalarCodec::new(TypeDescriptor::string());
        let err = encode(&codec, &Value::Int(2)).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { found: "int", .. }));
    }

    #[test]
    fn nulls_pass_through() {
        let codec = ScalarCodec::new(TypeDescriptor::int());
        assert_eq!(decode(&codec, "null").unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_string(&encode(&codec, &Value::Null).unwrap()).unwrap(),
            "null"
        );
    }

    #[test]
    fn bool_codec_reads_boolean_strings() {
        let codec = ScalarCodec::new(TypeDescriptor::bool());
        assert_eq!(decode(&codec, "\"true\"").unwrap(), Value::Bool(true));
        assert!(decode(&codec, "[true]").is_err());
    }
}
