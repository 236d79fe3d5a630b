//! 不可变容器适配层。
//!
//! # 设计背景（Why）
//! - 不可变容器没有“逐个插入”的构造方式，无法直接复用可变容器的解码流程；
//! - 本模块为每个不可变容器族合成一个可变对应类型，借注册中心拿到该类型的编解码器作为委托，
//!   编码时展开、解码后冻结，JSON 形态因此与可变容器完全一致。
//!
//! # 组成（What）
//! - [`ContainerKind`] / [`classify`]：判定描述符属于哪个容器族，并给出类型参数；
//! - [`mutable_counterpart`] / [`resolve_delegate`]：合成可变对应描述符并经注册中心解析委托；
//! - [`ConversionAdapter`]：以委托为核心的展开/冻结编解码器；
//! - [`ImmutableCollectionsFactory`]：把以上三者串成一个可注册的工厂。
//!
//! # 风险提示（Trade-offs）
//! - 适配器从不自行构造元素、键或值的编解码器，所有嵌套类型都经注册中心解析；
//!   这保证了调用方覆盖某个可变容器的编解码器时，对应的不可变容器自动沿用该覆盖。

mod adapter;
mod factory;
mod kind;
mod locator;

pub use adapter::ConversionAdapter;
pub use factory::ImmutableCollectionsFactory;
pub use kind::{ContainerKind, classify};
pub use locator::{mutable_counterpart, resolve_delegate};
