use std::collections::VecDeque;
use std::fmt::Write as _;

use super::{JsonNode, TokenKind, TokenReader};
use crate::error::CodecError;

enum Frame {
    Array {
        items: VecDeque<JsonNode>,
        taken: usize,
    },
    Object {
        members: VecDeque<(String, JsonNode)>,
        /// 已交出成员名、尚未被读取的值；成员名提升后这里依次是名字本身与原值。
        pending: VecDeque<JsonNode>,
        name: Option<String>,
    },
}

/// 按令牌顺序遍历 [`JsonNode`] 的读取器。
///
/// # 教案式说明
/// - **意图 (Why)**：让编解码器以流式令牌的方式消费已解析的文档，同时在类型不符时给出精确路径；
/// - **契约 (What)**：读取前先 `peek` 校验令牌种类，种类不符时不消费任何节点并返回
///   [`CodecError::MalformedInput`]；
/// - **实现 (How)**：以帧栈记录当前所处的数组/对象，每帧持有尚未消费的子节点队列。
pub struct TreeReader {
    stack: Vec<Frame>,
    root: Option<JsonNode>,
}

impl TreeReader {
    pub fn new(root: JsonNode) -> Self {
        Self {
            stack: Vec::new(),
            root: Some(root),
        }
    }

    /// 渲染 `$` 路径；`consumed` 为真时最内层数组指向刚取出的元素，而不是下一个。
    fn render_path(&self, consumed: bool) -> String {
        let mut path = String::from("$");
        let depth = self.stack.len();
        for (position, frame) in self.stack.iter().enumerate() {
            let innermost = position + 1 == depth;
            match frame {
                Frame::Array { taken, .. } => {
                    let index = if innermost && !consumed {
                        *taken
                    } else {
                        taken.saturating_sub(1)
                    };
                    let _ = write!(path, "[{index}]");
                }
                Frame::Object { name, .. } => {
                    path.push('.');
                    if let Some(name) = name {
                        path.push_str(name);
                    }
                }
            }
        }
        path
    }

    /// 已取出的值内容不合法。
    fn invalid(&self, detail: String) -> CodecError {
        CodecError::malformed(self.render_path(true), detail)
    }

    fn unexpected(&self, expected: &str, kind: TokenKind) -> CodecError {
        CodecError::malformed(
            self.path(),
            format!("expected {expected} but was {}", kind.label()),
        )
    }

    fn take(&mut self) -> Option<JsonNode> {
        match self.stack.last_mut() {
            None => self.root.take(),
            Some(Frame::Array { items, taken }) => {
                let node = items.pop_front();
                if node.is_some() {
                    *taken += 1;
                }
                node
            }
            Some(Frame::Object { pending, .. }) => pending.pop_front(),
        }
    }

    fn expect(&mut self, expected: &str, allowed: &[TokenKind]) -> Result<JsonNode, CodecError> {
        let kind = self.peek()?;
        if !allowed.contains(&kind) {
            return Err(self.unexpected(expected, kind));
        }
        match self.take() {
            Some(node) => Ok(node),
            None => Err(self.unexpected(expected, kind)),
        }
    }

    fn take_member(&mut self) -> Result<(String, JsonNode), CodecError> {
        let kind = self.peek()?;
        if kind != TokenKind::Name {
            return Err(self.unexpected("a name", kind));
        }
        match self.stack.last_mut() {
            Some(Frame::Object { members, name, .. }) => match members.pop_front() {
                Some((member, node)) => {
                    *name = Some(member.clone());
                    Ok((member, node))
                }
                None => Err(CodecError::malformed(self.path(), "object has no more members")),
            },
            _ => Err(self.unexpected("a name", kind)),
        }
    }

    fn parse_scalar<T: std::str::FromStr>(&self, text: &str, what: &str) -> Result<T, CodecError> {
        text.parse::<T>()
            .map_err(|_| self.invalid(format!("expected {what} but was \"{text}\"")))
    }
}

fn kind_of(node: &JsonNode) -> TokenKind {
    match node {
        JsonNode::Null => TokenKind::Null,
        JsonNode::Bool(_) => TokenKind::Bool,
        JsonNode::Number(_) => TokenKind::Number,
        JsonNode::String(_) => TokenKind::String,
        JsonNode::Array(_) => TokenKind::BeginArray,
        JsonNode::Object(_) => TokenKind::BeginObject,
    }
}

impl TokenReader for TreeReader {
    fn peek(&mut self) -> Result<TokenKind, CodecError> {
        Ok(match self.stack.last() {
            None => self.root.as_ref().map_or(TokenKind::EndDocument, kind_of),
            Some(Frame::Array { items, .. }) => items.front().map_or(TokenKind::EndArray, kind_of),
            Some(Frame::Object {
                members, pending, ..
            }) => match pending.front() {
                Some(node) => kind_of(node),
                None if members.is_empty() => TokenKind::EndObject,
                None => TokenKind::Name,
            },
        })
    }

    fn begin_array(&mut self) -> Result<(), CodecError> {
        match self.expect("BEGIN_ARRAY", &[TokenKind::BeginArray])? {
            JsonNode::Array(items) => {
                self.stack.push(Frame::Array {
                    items: items.into(),
                    taken: 0,
                });
                Ok(())
            }
            other => Err(self.unexpected("BEGIN_ARRAY", kind_of(&other))),
        }
    }

    fn end_array(&mut self) -> Result<(), CodecError> {
        let kind = self.peek()?;
        if kind != TokenKind::EndArray {
            return Err(self.unexpected("END_ARRAY", kind));
        }
        self.stack.pop();
        Ok(())
    }

    fn begin_object(&mut self) -> Result<(), CodecError> {
        match self.expect("BEGIN_OBJECT", &[TokenKind::BeginObject])? {
            JsonNode::Object(members) => {
                self.stack.push(Frame::Object {
                    members: members.into(),
                    pending: VecDeque::new(),
                    name: None,
                });
                Ok(())
            }
            other => Err(self.unexpected("BEGIN_OBJECT", kind_of(&other))),
        }
    }

    fn end_object(&mut self) -> Result<(), CodecError> {
        let kind = self.peek()?;
        if kind != TokenKind::EndObject {
            return Err(self.unexpected("END_OBJECT", kind));
        }
        self.stack.pop();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, CodecError> {
        let kind = self.peek()?;
        Ok(!matches!(
            kind,
            TokenKind::EndArray | TokenKind::EndObject | TokenKind::EndDocument
        ))
    }

    fn next_name(&mut self) -> Result<String, CodecError> {
        let (member, node) = self.take_member()?;
        if let Some(Frame::Object { pending, .. }) = self.stack.last_mut() {
            pending.push_back(node);
        }
        Ok(member)
    }

    fn next_string(&mut self) -> Result<String, CodecError> {
        match self.expect("a string", &[TokenKind::String, TokenKind::Number])? {
            JsonNode::String(s) => Ok(s),
            JsonNode::Number(n) => Ok(n.to_string()),
            other => Err(self.unexpected("a string", kind_of(&other))),
        }
    }

    fn next_i64(&mut self) -> Result<i64, CodecError> {
        match self.expect("an int", &[TokenKind::Number, TokenKind::String])? {
            JsonNode::Number(n) => match n.as_i64() {
                Some(i) => Ok(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                        Ok(f as i64)
                    }
                    _ => Err(self.invalid(format!("expected an int but was {n}"))),
                },
            },
            JsonNode::String(s) => self.parse_scalar(&s, "an int"),
            other => Err(self.unexpected("an int", kind_of(&other))),
        }
    }

    fn next_f64(&mut self) -> Result<f64, CodecError> {
        let value = match self.expect("a float", &[TokenKind::Number, TokenKind::String])? {
            JsonNode::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            JsonNode::String(s) => self.parse_scalar(&s, "a float")?,
            other => return Err(self.unexpected("a float", kind_of(&other))),
        };
        if !value.is_finite() {
            return Err(self.invalid(format!("expected a finite float but was {value}")));
        }
        Ok(value)
    }

    fn next_bool(&mut self) -> Result<bool, CodecError> {
        match self.expect("a boolean", &[TokenKind::Bool, TokenKind::String])? {
            JsonNode::Bool(b) => Ok(b),
            JsonNode::String(s) => self.parse_scalar(&s, "a boolean"),
            other => Err(self.unexpected("a boolean", kind_of(&other))),
        }
    }

    fn next_null(&mut self) -> Result<(), CodecError> {
        self.expect("null", &[TokenKind::Null]).map(|_| ())
    }

    fn promote_name_to_value(&mut self) -> Result<(), CodecError> {
        let (member, node) = self.take_member()?;
        if let Some(Frame::Object { pending, .. }) = self.stack.last_mut() {
            pending.push_back(JsonNode::String(member));
            pending.push_back(node);
        }
        Ok(())
    }

    fn skip_value(&mut self) -> Result<(), CodecError> {
        match self.peek()? {
            TokenKind::Name => self.take_member().map(|_| ()),
            kind @ (TokenKind::EndArray | TokenKind::EndObject | TokenKind::EndDocument) => {
                Err(self.unexpected("a value", kind))
            }
            _ => {
                self.take();
                Ok(())
            }
        }
    }

    fn path(&self) -> String {
        self.render_path(false)
    }
}
