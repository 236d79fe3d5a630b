#![deny(unsafe_code)]

//! # spark-codec-json
//!
//! ## 定位与职责（Why）
//! - 提供以运行时类型描述符驱动的 JSON 编解码注册中心，并为不可变容器（列表、集合、映射、
//!   有序映射、多值映射）补齐编解码能力；
//! - 不可变容器不直接拥有 JSON 形态，而是借用其可变对应容器的编解码器：编码前展开，解码后冻结，
//!   因而两者产出的 JSON 完全一致。
//!
//! ## 架构嵌入（Where）
//! - `descriptor` / `value` / `collections`：类型描述符、动态值与不可变容器；
//! - `token`：令牌读写契约与基于 `serde_json` 文档树的实现；
//! - `codec` / `registry`：编解码契约、内建工厂与带缓存的注册中心；
//! - `immutable`：容器族分类、委托定位、转换适配器与对应工厂；
//! - `stream`：顶层数组的读写便捷函数；
//! - `config` / `error`：配置与统一错误域。
//!
//! ## 使用方式（How）
//! ```
//! use spark_codec_json::{TypeDescriptor, Value, provide_registry};
//!
//! let registry = provide_registry();
//! let ty = TypeDescriptor::immutable_sorted_map(TypeDescriptor::string(), TypeDescriptor::int());
//! let value = registry.from_json(r#"{"b": 2, "a": 1}"#, &ty)?;
//! assert_eq!(registry.to_json(&value, &ty)?, r#"{"a":1,"b":2}"#);
//! # Ok::<(), spark_codec_json::CodecError>(())
//! ```

pub mod codec;
pub mod collections;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod immutable;
pub mod registry;
pub mod stream;
pub mod token;
pub mod value;

pub use codec::{Codec, CodecFactory, RecordSchema};
pub use collections::{
    ImmutableList, ImmutableMap, ImmutableMultimap, ImmutableSet, ImmutableSortedMap,
};
pub use config::{CodecConfig, DuplicateKeyPolicy};
pub use descriptor::{RawType, TypeDescriptor};
pub use error::CodecError;
pub use immutable::{
    ContainerKind, ConversionAdapter, ImmutableCollectionsFactory, classify, mutable_counterpart,
    resolve_delegate,
};
pub use registry::{CodecRegistry, CodecRegistryBuilder};
pub use value::{Record, Value};

/// 已注册不可变容器工厂的构建器，可继续登记记录类型或自定义工厂。
pub fn registry_builder() -> CodecRegistryBuilder {
    CodecRegistry::builder().register_factory(ImmutableCollectionsFactory::standard())
}

/// 使用默认配置构建注册中心。
pub fn provide_registry() -> CodecRegistry {
    provide_registry_with(CodecConfig::default())
}

/// 使用给定配置构建注册中心。
pub fn provide_registry_with(config: CodecConfig) -> CodecRegistry {
    registry_builder().with_config(config).build()
}
