//! 顶层数组的流式读写便捷函数。
//!
//! # 契约说明（What）
//! - [`write_json_stream`] 把每个元素独立编码后写成一个顶层 JSON 数组，缩进取自注册中心配置；
//!   任一元素编码失败时不写出任何字节；
//! - [`read_json_stream`] 读取顶层数组并逐个解码元素，返回 [`ImmutableList`]；
//!   遇到第一个失败立即返回该错误，已解码的元素被丢弃。

use std::io::{Read, Write};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::collections::ImmutableList;
use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{JsonNode, TokenKind, TokenReader, TreeReader, TreeWriter};
use crate::value::Value;

/// 把元素序列写成顶层 JSON 数组。
///
/// ```
/// use spark_codec_json::{TypeDescriptor, Value, provide_registry, stream};
///
/// let registry = provide_registry();
/// let mut out = Vec::new();
/// stream::write_json_stream(&registry, &mut out, &TypeDescriptor::int(), &[Value::Int(1)])?;
/// assert_eq!(String::from_utf8(out).unwrap(), "[\n  1\n]");
/// # Ok::<(), spark_codec_json::CodecError>(())
/// ```
pub fn write_json_stream<'a, W, I>(
    registry: &CodecRegistry,
    mut out: W,
    element_type: &TypeDescriptor,
    values: I,
) -> Result<(), CodecError>
where
    W: Write,
    I: IntoIterator<Item = &'a Value>,
{
    let codec = registry.get_adapter(element_type)?;
    let mut elements = Vec::new();
    for value in values {
        let mut writer = TreeWriter::new();
        codec.write(&mut writer, value)?;
        elements.push(writer.into_node()?);
    }
    let document = JsonNode::Array(elements);

    let indent = registry.config().indent.as_str();
    if indent.is_empty() {
        serde_json::to_writer(&mut out, &document)?;
    } else {
        let mut serializer =
            Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
        document.serialize(&mut serializer)?;
    }
    out.flush()?;
    Ok(())
}

/// 读取顶层 JSON 数组并逐个解码元素。
pub fn read_json_stream<R>(
    registry: &CodecRegistry,
    input: R,
    element_type: &TypeDescriptor,
) -> Result<ImmutableList<Value>, CodecError>
where
    R: Read,
{
    let codec = registry.get_adapter(element_type)?;
    let document: JsonNode = serde_json::from_reader(input)?;
    let mut reader = TreeReader::new(document);

    let mut elements = Vec::new();
    reader.begin_array()?;
    while reader.has_next()? {
        let element = codec.read(&mut reader)?;
        debug!(
            index = elements.len(),
            element_type = %element_type,
            "decoded stream element"
        );
        elements.push(element);
    }
    reader.end_array()?;

    let next = reader.peek()?;
    if next != TokenKind::EndDocument {
        return Err(CodecError::malformed(
            reader.path(),
            format!("expected END_DOCUMENT but was {}", next.label()),
        ));
    }
    Ok(ImmutableList::from(elements))
}
