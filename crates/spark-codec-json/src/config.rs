//! 编解码配置。
//!
//! # 设计背景（Why）
//! - 重复键策略、复杂键编码、缩进等行为需要由部署方决定，而不是硬编码在编解码器中；
//! - 配置可直接由 TOML 文本加载，便于与宿主应用的配置文件合并。
//!
//! # 契约说明（What）
//! - 所有字段均有默认值，缺省字段按默认值补齐，未知字段报错；
//! - 配置在注册中心构建时固定，之后只读共享。

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// 映射解码遇到重复键时的处理策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    /// 后出现的值覆盖先前的值，键保留首次出现的位置。
    #[default]
    LastWriteWins,
    /// 视为输入损坏，返回 [`CodecError::DuplicateKeyConflict`]。
    Reject,
}

/// 注册中心级别的编解码配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// 流式输出的缩进字符串；空串表示紧凑输出。
    pub indent: String,
    pub duplicate_keys: DuplicateKeyPolicy,
    /// 映射存在非标量键时，改为输出 `[键, 值]` 对组成的数组。
    pub complex_map_keys: bool,
    /// 记录字段为 `null` 时仍然输出该成员。
    pub serialize_nulls: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_owned(),
            duplicate_keys: DuplicateKeyPolicy::default(),
            complex_map_keys: false,
            serialize_nulls: false,
        }
    }
}

impl CodecConfig {
    /// 从 TOML 文本解析配置。
    pub fn from_toml_str(text: &str) -> Result<Self, CodecError> {
        toml::from_str(text).map_err(|err| CodecError::Config(err.to_string()))
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn with_complex_map_keys(mut self, enabled: bool) -> Self {
        self.complex_map_keys = enabled;
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_serialize_nulls(mut self, enabled: bool) -> Self {
        self.serialize_nulls = enabled;
        self
    }
}
