//! 编解码契约与内建工厂。
//!
//! # 设计背景（Why）
//! - 注册中心按描述符存放对象安全的 [`Codec`]，运行时才知道具体类型，因此统一以 [`Value`] 交换数据；
//! - [`CodecFactory`] 让新的类型族无需修改中心调度即可接入：工厂对不认识的描述符返回 `Ok(None)`，
//!   表示“无意见”，由后续工厂继续尝试。
//!
//! # 契约说明（What）
//! - 编解码器构造后不可变，实现 `Send + Sync`，可被多个线程同时复用；
//! - 工厂返回 `Err` 表示致命失败（例如嵌套类型无法解析），注册中心不会再尝试后续工厂；
//! - 内建编解码器对 [`Value::Null`] 一律写出 `null`，读到 `null` 令牌时返回 [`Value::Null`]。

mod collection;
mod map;
mod record;
mod scalar;

pub use collection::{CollectionCodec, CollectionFactory};
pub use map::{MapCodec, MapFactory};
pub use record::{FieldSchema, RecordCodec, RecordFactory, RecordSchema};
pub use scalar::{ScalarCodec, ScalarFactory};

use std::sync::Arc;

use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::token::{TokenReader, TokenWriter};
use crate::value::Value;

/// 对象安全的编解码器。
///
/// # 教案式说明
/// - **意图 (Why)**：作为注册中心缓存的统一形态，屏蔽标量、容器、记录之间的差异；
/// - **契约 (What)**：
///   - `write` 只接受与 `descriptor` 形状一致的值，否则返回 [`CodecError::TypeMismatch`]；
///   - `read` 消费恰好一个完整的值；令牌不符时返回 [`CodecError::MalformedInput`]，不返回部分结果；
/// - **风险 (Trade-offs)**：动态值带来一次额外的匹配分支，换取运行时描述符驱动的组合能力。
pub trait Codec: Send + Sync + 'static {
    /// 编解码器负责的描述符。
    fn descriptor(&self) -> &TypeDescriptor;

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError>;

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError>;

    /// 以键值对序列读取一个非 `null` 的映射，重复键逐一保留。
    ///
    /// 不是映射编解码器时返回 `Ok(None)` 且不消费任何令牌。
    fn read_entries(
        &self,
        input: &mut dyn TokenReader,
    ) -> Result<Option<Vec<(Value, Value)>>, CodecError> {
        let _ = input;
        Ok(None)
    }
}

/// 编解码器工厂。
///
/// # 契约说明（What）
/// - `create` 必须无副作用且可重复调用；缓存由注册中心负责；
/// - 需要嵌套编解码器时，通过传入的 `registry` 递归查找，保证嵌套泛型走同一条解析路径；
/// - 返回 `Ok(None)` 表示不认识该描述符。
pub trait CodecFactory: Send + Sync + 'static {
    /// 日志中使用的工厂名。
    fn name(&self) -> &'static str;

    fn create(
        &self,
        registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError>;
}

pub(crate) fn mismatch(descriptor: &TypeDescriptor, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected: descriptor.clone(),
        found: value.kind_name(),
    }
}

/// 读取可能为 `null` 的值：遇到 `null` 令牌时消费并返回 `true`。
pub(crate) fn read_null(input: &mut dyn TokenReader) -> Result<bool, CodecError> {
    if input.peek()? == crate::token::TokenKind::Null {
        input.next_null()?;
        return Ok(true);
    }
    Ok(false)
}
