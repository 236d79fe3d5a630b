use std::sync::Arc;

use indexmap::IndexSet;

use super::{Codec, CodecFactory, mismatch, read_null};
use crate::descriptor::{RawType, TypeDescriptor};
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{TokenReader, TokenWriter};
use crate::value::Value;

/// 可变序列容器的编解码器：`ArrayList<E>` 与 `LinkedHashSet<E>`。
///
/// # 契约说明（What）
/// - 编码为 JSON 数组，元素按迭代顺序逐个交给元素编解码器；
/// - `LinkedHashSet` 解码时按首次出现顺序去重，`ArrayList` 保留全部元素。
pub struct CollectionCodec {
    descriptor: TypeDescriptor,
    element: Arc<dyn Codec>,
}

impl CollectionCodec {
    pub fn new(descriptor: TypeDescriptor, element: Arc<dyn Codec>) -> Self {
        Self {
            descriptor,
            element,
        }
    }

    fn is_set(&self) -> bool {
        *self.descriptor.raw_type() == RawType::LinkedHashSet
    }

    fn write_items<'a>(
        &self,
        out: &mut dyn TokenWriter,
        items: impl Iterator<Item = &'a Value>,
    ) -> Result<(), CodecError> {
        out.begin_array()?;
        for item in items {
            self.element.write(out, item)?;
        }
        out.end_array()
    }
}

impl Codec for CollectionCodec {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Null => out.null_value(),
            Value::Array(items) if !self.is_set() => self.write_items(out, items.iter()),
            Value::LinkedSet(items) if self.is_set() => self.write_items(out, items.iter()),
            other => Err(mismatch(&self.descriptor, other)),
        }
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        if read_null(input)? {
            return Ok(Value::Null);
        }
        input.begin_array()?;
        let value = if self.is_set() {
            let mut items = IndexSet::new();
            while input.has_next()? {
                items.insert(self.element.read(input)?);
            }
            Value::LinkedSet(items)
        } else {
            let mut items = Vec::new();
            while input.has_next()? {
                items.push(self.element.read(input)?);
            }
            Value::Array(items)
        };
        input.end_array()?;
        Ok(value)
    }
}

/// 认领 `ArrayList<E>` 与 `LinkedHashSet<E>` 的工厂，元素编解码器经注册中心递归解析。
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectionFactory;

impl CodecFactory for CollectionFactory {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn create(
        &self,
        registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
        if !matches!(
            descriptor.raw_type(),
            RawType::ArrayList | RawType::LinkedHashSet
        ) {
            return Ok(None);
        }
        let [element] = descriptor.args() else {
            return Ok(None);
        };
        let element = registry.get_adapter(element)?;
        Ok(Some(Arc::new(CollectionCodec::new(
            descriptor.clone(),
            element,
        ))))
    }
}
