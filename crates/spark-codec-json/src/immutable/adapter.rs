use std::sync::Arc;

use super::ContainerKind;
use crate::codec::Codec;
use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::token::{TokenKind, TokenReader, TokenWriter};
use crate::value::Value;

/// 不可变容器与其可变对应类型之间的转换适配器。
///
/// # 教案式说明
/// - **意图 (Why)**：JSON 形态完全由委托决定，适配器只负责“展开/冻结”，
///   因此不可变容器与可变容器产出的 JSON 完全一致；
/// - **契约 (What)**：
///   - 写出时先展开为可变值，再整体交给委托；读取时委托产出完整可变值后再一次性冻结；
///   - `null` 原样透传，不做转换；
///   - 多值映射优先向委托索取未合并的键值对，同一键的多个分组按出现顺序拼接；
///   - 委托报错原样返回，不产生部分结果；
/// - **风险 (Trade-offs)**：展开与冻结各复制一次元素句柄，换取委托与适配器的完全解耦。
pub struct ConversionAdapter {
    kind: ContainerKind,
    descriptor: TypeDescriptor,
    delegate: Arc<dyn Codec>,
}

impl ConversionAdapter {
    pub fn new(kind: ContainerKind, descriptor: TypeDescriptor, delegate: Arc<dyn Codec>) -> Self {
        Self {
            kind,
            descriptor,
            delegate,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn delegate(&self) -> &Arc<dyn Codec> {
        &self.delegate
    }
}

impl Codec for ConversionAdapter {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        if value.is_null() {
            return self.delegate.write(out, value);
        }
        let mutable = self
            .kind
            .to_mutable(value)
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: self.descriptor.clone(),
                found: value.kind_name(),
            })?;
        self.delegate.write(out, &mutable)
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        if self.kind == ContainerKind::MultiMap
            && input.peek()? != TokenKind::Null
            && let Some(entries) = self.delegate.read_entries(input)?
        {
            return ContainerKind::group_entries(entries).ok_or_else(|| CodecError::TypeMismatch {
                expected: self.delegate.descriptor().clone(),
                found: "map with non-list values",
            });
        }
        let mutable = self.delegate.read(input)?;
        if mutable.is_null() {
            return Ok(Value::Null);
        }
        let found = mutable.kind_name();
        self.kind
            .from_mutable(mutable)
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: self.delegate.descriptor().clone(),
                found,
            })
    }
}
