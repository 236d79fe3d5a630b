//! 结构化令牌流。
//!
//! # 设计背景（Why）
//! - 编解码器只面向“开始/结束数组、开始/结束对象、成员名、标量”这一抽象令牌流工作，
//!   从不直接接触字节或文本；
//! - 文本的解析与打印交给 `serde_json`，本模块在其之上提供逐令牌的读写视图。
//!
//! # 结构说明（How）
//! - [`TokenWriter`] / [`TokenReader`]：对象安全的令牌读写契约；
//! - [`TreeWriter`]：把令牌累积为 [`JsonNode`] 文档树；
//! - [`TreeReader`]：按令牌顺序遍历一棵 [`JsonNode`]，出错时附带 `$` 路径。

mod node;
mod reader;
mod writer;

pub use node::JsonNode;
pub use reader::TreeReader;
pub use writer::TreeWriter;

use crate::error::CodecError;

/// 令牌种类，`TokenReader::peek` 的返回值。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name,
    String,
    Number,
    Bool,
    Null,
    EndDocument,
}

impl TokenKind {
    /// 错误信息中使用的令牌名。
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::BeginArray => "BEGIN_ARRAY",
            TokenKind::EndArray => "END_ARRAY",
            TokenKind::BeginObject => "BEGIN_OBJECT",
            TokenKind::EndObject => "END_OBJECT",
            TokenKind::Name => "NAME",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Bool => "BOOLEAN",
            TokenKind::Null => "NULL",
            TokenKind::EndDocument => "END_DOCUMENT",
        }
    }
}

/// 令牌写入契约。
///
/// # 契约说明（What）
/// - 调用顺序必须构成合法文档：对象内每个值之前先写成员名，数组与对象成对闭合；
/// - 顺序违例返回 [`CodecError::Unencodable`]，实现不得静默修补。
pub trait TokenWriter {
    fn begin_array(&mut self) -> Result<(), CodecError>;
    fn end_array(&mut self) -> Result<(), CodecError>;
    fn begin_object(&mut self) -> Result<(), CodecError>;
    fn end_object(&mut self) -> Result<(), CodecError>;
    fn name(&mut self, name: &str) -> Result<(), CodecError>;
    fn string_value(&mut self, value: &str) -> Result<(), CodecError>;
    fn i64_value(&mut self, value: i64) -> Result<(), CodecError>;
    /// 非有限浮点数没有 JSON 表示，返回 [`CodecError::Unencodable`]。
    fn f64_value(&mut self, value: f64) -> Result<(), CodecError>;
    fn bool_value(&mut self, value: bool) -> Result<(), CodecError>;
    fn null_value(&mut self) -> Result<(), CodecError>;
}

/// 令牌读取契约。
///
/// # 契约说明（What）
/// - `next_*` 在令牌种类不符时返回 [`CodecError::MalformedInput`]，并携带当前路径；
/// - `next_string` 接受数字令牌，`next_i64`/`next_f64`/`next_bool` 接受内容可解析的字符串令牌，
///   与成员名提升配合即可解码数字键、布尔键；
/// - `promote_name_to_value` 把下一个成员名当作字符串值交付，随后才是该成员的值。
pub trait TokenReader {
    fn peek(&mut self) -> Result<TokenKind, CodecError>;
    fn begin_array(&mut self) -> Result<(), CodecError>;
    fn end_array(&mut self) -> Result<(), CodecError>;
    fn begin_object(&mut self) -> Result<(), CodecError>;
    fn end_object(&mut self) -> Result<(), CodecError>;
    /// 当前数组或对象是否还有元素。
    fn has_next(&mut self) -> Result<bool, CodecError>;
    fn next_name(&mut self) -> Result<String, CodecError>;
    fn next_string(&mut self) -> Result<String, CodecError>;
    fn next_i64(&mut self) -> Result<i64, CodecError>;
    fn next_f64(&mut self) -> Result<f64, CodecError>;
    fn next_bool(&mut self) -> Result<bool, CodecError>;
    fn next_null(&mut self) -> Result<(), CodecError>;
    fn promote_name_to_value(&mut self) -> Result<(), CodecError>;
    /// 跳过下一个完整的值（含其子树）。
    fn skip_value(&mut self) -> Result<(), CodecError>;
    /// 当前位置的 `$` 路径，例如 `$[1].name`。
    fn path(&self) -> String;
}

/// 把一棵文档树按令牌重放到任意写入器。
pub fn write_node(out: &mut dyn TokenWriter, node: &JsonNode) -> Result<(), CodecError> {
    match node {
        JsonNode::Null => out.null_value(),
        JsonNode::Bool(b) => out.bool_value(*b),
        JsonNode::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.i64_value(i)
            } else if let Some(f) = n.as_f64() {
                out.f64_value(f)
            } else {
                Err(CodecError::Unencodable {
                    detail: format!("number {n}"),
                })
            }
        }
        JsonNode::String(s) => out.string_value(s),
        JsonNode::Array(items) => {
            out.begin_array()?;
            for item in items {
                write_node(out, item)?;
            }
            out.end_array()
        }
        JsonNode::Object(members) => {
            out.begin_object()?;
            for (name, value) in members {
                out.name(name)?;
                write_node(out, value)?;
            }
            out.end_object()
        }
    }
}
