use std::collections::HashMap;
use std::sync::Arc;

use super::{Codec, CodecFactory, mismatch, read_null};
use crate::descriptor::{RawType, TypeDescriptor};
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{TokenReader, TokenWriter};
use crate::value::{Record, Value};

/// 记录字段声明。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    name: Arc<str>,
    descriptor: TypeDescriptor,
}

impl FieldSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

/// 记录类型的结构声明：类型名与有序字段表。
///
/// ```
/// use spark_codec_json::{RecordSchema, TypeDescriptor};
///
/// let schema = RecordSchema::new("Person")
///     .field("name", TypeDescriptor::string())
///     .field("tags", TypeDescriptor::immutable_set(TypeDescriptor::string()));
/// assert_eq!(schema.fields().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSchema {
    name: Arc<str>,
    fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// 追加字段；同名字段以后声明者为准。
    pub fn field(mut self, name: impl Into<Arc<str>>, descriptor: TypeDescriptor) -> Self {
        let name = name.into();
        self.fields.retain(|field| field.name != name);
        self.fields.push(FieldSchema { name, descriptor });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::record(Arc::clone(&self.name))
    }
}

/// 记录编解码器：按声明顺序把字段写成 JSON 对象。
///
/// - 值为 `null` 的字段默认省略，开启 `serialize_nulls` 后输出；
/// - 解码时跳过未声明的成员，缺失的成员在结果中同样缺失。
pub struct RecordCodec {
    descriptor: TypeDescriptor,
    schema: RecordSchema,
    fields: Vec<Arc<dyn Codec>>,
    serialize_nulls: bool,
}

impl RecordCodec {
    pub fn new(
        schema: RecordSchema,
        fields: Vec<Arc<dyn Codec>>,
        serialize_nulls: bool,
    ) -> Self {
        Self {
            descriptor: schema.descriptor(),
            schema,
            fields,
            serialize_nulls,
        }
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.schema
            .fields
            .iter()
            .position(|field| &*field.name == name)
    }
}

impl Codec for RecordCodec {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        let record = match value {
            Value::Null => return out.null_value(),
            Value::Record(record) if record.type_name() == self.schema.name() => record,
            other => return Err(mismatch(&self.descriptor, other)),
        };
        out.begin_object()?;
        for (field, codec) in self.schema.fields.iter().zip(&self.fields) {
            match record.get(&field.name) {
                None => continue,
                Some(Value::Null) if !self.serialize_nulls => continue,
                Some(value) => {
                    out.name(&field.name)?;
                    codec.write(out, value)?;
                }
            }
        }
        out.end_object()
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        if read_null(input)? {
            return Ok(Value::Null);
        }
        let mut record = Record::new(Arc::clone(&self.schema.name));
        input.begin_object()?;
        while input.has_next()? {
            let member = input.next_name()?;
            match self.field_index(&member) {
                Some(index) => {
                    let value = self.fields[index].read(input)?;
                    record.insert(Arc::clone(&self.schema.fields[index].name), value);
                }
                None => input.skip_value()?,
            }
        }
        input.end_object()?;
        Ok(Value::Record(record))
    }
}

/// 认领已登记记录类型的工厂；字段编解码器经注册中心递归解析，因此记录可以自引用。
#[derive(Debug, Default)]
pub struct RecordFactory {
    schemas: HashMap<Arc<str>, RecordSchema>,
}

impl RecordFactory {
    pub fn new(schemas: impl IntoIterator<Item = RecordSchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (Arc::clone(&schema.name), schema))
                .collect(),
        }
    }
}

impl CodecFactory for RecordFactory {
    fn name(&self) -> &'static str {
        "record"
    }

    fn create(
        &self,
        registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
        let RawType::Record(name) = descriptor.raw_type() else {
            return Ok(None);
        };
        let Some(schema) = self.schemas.get(name) else {
            return Ok(None);
        };
        let fields = schema
            .fields
            .iter()
            .map(|field| registry.get_adapter(&field.descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Arc::new(RecordCodec::new(
            schema.clone(),
            fields,
            registry.config().serialize_nulls,
        ))))
    }
}
