use serde_json::Number;

use super::{JsonNode, TokenWriter};
use crate::error::CodecError;

enum Frame {
    Array(Vec<JsonNode>),
    Object {
        members: Vec<(String, JsonNode)>,
        name: Option<String>,
    },
}

/// 把令牌累积为 [`JsonNode`] 的写入器。
///
/// 顶层只接受一个值；写完后用 [`TreeWriter::into_node`] 取回文档树。
#[derive(Default)]
pub struct TreeWriter {
    stack: Vec<Frame>,
    root: Option<JsonNode>,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取回完整文档；容器未闭合或尚未写入任何值时报错。
    pub fn into_node(self) -> Result<JsonNode, CodecError> {
        if !self.stack.is_empty() {
            return Err(unencodable("document has unclosed arrays or objects"));
        }
        self.root
            .ok_or_else(|| unencodable("document is empty"))
    }

    fn push(&mut self, node: JsonNode) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(unencodable("document already holds a top-level value"));
                }
                self.root = Some(node);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(node);
                Ok(())
            }
            Some(Frame::Object { members, name }) => match name.take() {
                Some(name) => {
                    members.push((name, node));
                    Ok(())
                }
                None => Err(unencodable("object member written without a name")),
            },
        }
    }
}

impl TokenWriter for TreeWriter {
    fn begin_array(&mut self) -> Result<(), CodecError> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), CodecError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push(JsonNode::Array(items)),
            _ => Err(unencodable("END_ARRAY without a matching BEGIN_ARRAY")),
        }
    }

    fn begin_object(&mut self) -> Result<(), CodecError> {
        self.stack.push(Frame::Object {
            members: Vec::new(),
            name: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), CodecError> {
        match self.stack.pop() {
            Some(Frame::Object { members, name: None }) => self.push(JsonNode::Object(members)),
            Some(Frame::Object { name: Some(name), .. }) => Err(unencodable(format!(
                "member `{name}` has no value"
            ))),
            _ => Err(unencodable("END_OBJECT without a matching BEGIN_OBJECT")),
        }
    }

    fn name(&mut self, value: &str) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Frame::Object { name, .. }) => {
                if name.is_some() {
                    return Err(unencodable("two member names in a row"));
                }
                *name = Some(value.to_owned());
                Ok(())
            }
            _ => Err(unencodable("member name outside of an object")),
        }
    }

    fn string_value(&mut self, value: &str) -> Result<(), CodecError> {
        self.push(JsonNode::String(value.to_owned()))
    }

    fn i64_value(&mut self, value: i64) -> Result<(), CodecError> {
        self.push(JsonNode::Number(value.into()))
    }

    fn f64_value(&mut self, value: f64) -> Result<(), CodecError> {
        let number = Number::from_f64(value)
            .ok_or_else(|| unencodable(format!("non-finite number {value}")))?;
        self.push(JsonNode::Number(number))
    }

    fn bool_value(&mut self, value: bool) -> Result<(), CodecError> {
        self.push(JsonNode::Bool(value))
    }

    fn null_value(&mut self) -> Result<(), CodecError> {
        self.push(JsonNode::Null)
    }
}

fn unencodable(detail: impl Into<String>) -> CodecError {
    CodecError::Unencodable {
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_floats() {
        let mut writer = TreeWriter::new();
        let err = writer.f64_value(f64::NAN).unwrap_err();
        assert!(matches!(err, CodecError::Unencodable { .. }));
    }

    #[test]
    fn rejects_values_without_member_names() {
        let mut writer = TreeWriter::new();
        writer.begin_object().unwrap();
        assert!(writer.string_value("orphan").is_err());
    }

    #[test]
    fn unclosed_documents_are_incomplete() {
        let mut writer = TreeWriter::new();
        writer.begin_array().unwrap();
        assert!(writer.into_node().is_err());
    }
}
