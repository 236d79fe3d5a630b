//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为注册中心、容器适配器与令牌读写器提供统一的错误语义；
//! - 区分“配置缺失”（致命，需要修正注册代码）与“输入损坏”（调用方数据问题）两大类，
//!   方便上层决定是中止启动还是拒绝单次请求。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `thiserror::Error`，可直接与 `std::error::Error` 生态互通；
//! - 每个变体映射到 [`codes`] 中的稳定错误码，用于日志检索与告警聚合；
//! - 核心层不做任何重试、吞错或部分恢复，错误一律同步向上冒泡。

use thiserror::Error;

use crate::descriptor::TypeDescriptor;

/// 编解码错误码常量。
///
/// 错误码遵循 `<领域>.<语义>` 命名约定，与 `CodecError::code` 一一对应。
pub mod codes {
    /// 注册中心中没有任何工厂认领该类型。
    pub const CODEC_NO_ADAPTER: &str = "codec.no_adapter";
    /// 不可变容器的可变对应类型缺少编解码器。
    pub const CODEC_UNRESOLVABLE_DELEGATE: &str = "codec.unresolvable_delegate";
    /// 输入截断、语法错误或令牌类型不匹配。
    pub const CODEC_MALFORMED_INPUT: &str = "codec.malformed_input";
    /// 映射解码时遇到重复键且策略为拒绝。
    pub const CODEC_DUPLICATE_KEY: &str = "codec.duplicate_key";
    /// 交给编解码器的值与其描述符不符。
    pub const CODEC_TYPE_MISMATCH: &str = "codec.type_mismatch";
    /// 值没有合法的 JSON 表示。
    pub const CODEC_UNENCODABLE: &str = "codec.unencodable";
    /// 配置文本无法解析。
    pub const CODEC_CONFIG: &str = "codec.config";
    /// 底层读写器失败。
    pub const CODEC_IO: &str = "codec.io";
}

/// 编解码核心错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：聚合类型解析、委托定位、令牌读写三条路径上的失败，调用方只需匹配一个枚举；
/// - **契约 (What)**：
///   - `UnresolvableDelegate` 是致命配置错误，说明缺少必要的编解码器注册，不应重试；
///   - `MalformedInput` 来自委托编解码器或令牌读取器，原样传播，核心层不做部分恢复；
///   - `DuplicateKeyConflict` 仅在 [`DuplicateKeyPolicy::Reject`](crate::config::DuplicateKeyPolicy::Reject)
///     下出现；
/// - **设计权衡 (Trade-offs)**：上下文使用 `String` 保存路径与细节，牺牲少量分配换取可读性。
#[derive(Debug, Error)]
pub enum CodecError {
    /// 注册中心所有工厂都对该描述符“无意见”。
    #[error("no codec registered for `{descriptor}`")]
    NoAdapter { descriptor: TypeDescriptor },

    /// 不可变容器的可变对应类型无法解析。
    ///
    /// - **契约 (What)**：`requested` 为原始请求的不可变类型，`mutable` 为合成的可变对应类型，
    ///   `source` 保留注册中心返回的根因。
    #[error("cannot resolve delegate `{mutable}` for `{requested}`")]
    UnresolvableDelegate {
        requested: TypeDescriptor,
        mutable: TypeDescriptor,
        #[source]
        source: Box<CodecError>,
    },

    /// 输入损坏或令牌类型与预期不符。
    #[error("malformed input at {path}: {detail}")]
    MalformedInput { path: String, detail: String },

    /// 拒绝策略下遇到重复的映射键。
    #[error("duplicate map key {key} at {path}")]
    DuplicateKeyConflict { path: String, key: String },

    /// 编码时值的形状与编解码器不符。
    #[error("expected a value of `{expected}`, found {found}")]
    TypeMismatch {
        expected: TypeDescriptor,
        found: &'static str,
    },

    /// 值没有合法的 JSON 表示，例如 NaN 或关闭复杂键时的容器键。
    #[error("cannot encode {detail}")]
    Unencodable { detail: String },

    /// 配置解析失败。
    #[error("invalid codec configuration: {0}")]
    Config(String),

    /// 底层 I/O 失败。
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// 构造输入损坏错误。
    pub fn malformed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        CodecError::MalformedInput {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::NoAdapter { .. } => codes::CODEC_NO_ADAPTER,
            CodecError::UnresolvableDelegate { .. } => codes::CODEC_UNRESOLVABLE_DELEGATE,
            CodecError::MalformedInput { .. } => codes::CODEC_MALFORMED_INPUT,
            CodecError::DuplicateKeyConflict { .. } => codes::CODEC_DUPLICATE_KEY,
            CodecError::TypeMismatch { .. } => codes::CODEC_TYPE_MISMATCH,
            CodecError::Unencodable { .. } => codes::CODEC_UNENCODABLE,
            CodecError::Config(_) => codes::CODEC_CONFIG,
            CodecError::Io(_) => codes::CODEC_IO,
        }
    }

    /// 是否属于配置类致命错误。
    ///
    /// 配置错误意味着注册代码缺失必要的编解码器，重试不会改变结果。
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            CodecError::NoAdapter { .. }
                | CodecError::UnresolvableDelegate { .. }
                | CodecError::Config(_)
        )
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return CodecError::Io(err.into());
        }
        let path = format!("line {} column {}", err.line(), err.column());
        CodecError::MalformedInput {
            path,
            detail: err.to_string(),
        }
    }
}
