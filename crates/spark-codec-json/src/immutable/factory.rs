use std::sync::Arc;

use super::{ContainerKind, ConversionAdapter, resolve_delegate};
use crate::codec::{Codec, CodecFactory};
use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::registry::CodecRegistry;

/// 为不可变容器族构造转换适配器的工厂。
///
/// # 契约说明（What）
/// - 按内部顺序逐个尝试容器族，第一个识别出描述符的族胜出；
/// - 未识别的描述符返回 `Ok(None)`，交给注册中心的后续工厂；
/// - 委托解析失败时返回 [`CodecError::UnresolvableDelegate`]，注册中心不会再尝试其他工厂。
#[derive(Clone, Debug)]
pub struct ImmutableCollectionsFactory {
    kinds: Vec<ContainerKind>,
}

impl ImmutableCollectionsFactory {
    /// 标准顺序：序列、唯一键映射、有序映射、多值映射、集合。
    pub fn standard() -> Self {
        Self::with_kinds([
            ContainerKind::Sequence,
            ContainerKind::UniqueKeyMap,
            ContainerKind::SortedMap,
            ContainerKind::MultiMap,
            ContainerKind::Set,
        ])
    }

    /// 仅处理给定的容器族，重复项只保留首次出现。
    pub fn with_kinds(kinds: impl IntoIterator<Item = ContainerKind>) -> Self {
        let mut unique = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self { kinds: unique }
    }

    pub fn kinds(&self) -> &[ContainerKind] {
        &self.kinds
    }
}

impl Default for ImmutableCollectionsFactory {
    fn default() -> Self {
        Self::standard()
    }
}

impl CodecFactory for ImmutableCollectionsFactory {
    fn name(&self) -> &'static str {
        "immutable-collections"
    }

    fn create(
        &self,
        registry: &CodecRegistry,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
        for &kind in &self.kinds {
            let Some(args) = kind.classify(descriptor) else {
                continue;
            };
            let delegate = resolve_delegate(kind, &args, registry)?;
            return Ok(Some(Arc::new(ConversionAdapter::new(
                kind,
                descriptor.clone(),
                delegate,
            ))));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_factory_leaves_other_families_alone() {
        let registry = CodecRegistry::builder()
            .register_factory(ImmutableCollectionsFactory::with_kinds([ContainerKind::Set]))
            .build();
        assert!(
            registry
                .get_adapter(&TypeDescriptor::immutable_set(TypeDescriptor::int()))
                .is_ok()
        );
        assert!(matches!(
            registry.get_adapter(&TypeDescriptor::immutable_list(TypeDescriptor::int())),
            Err(CodecError::NoAdapter { .. })
        ));
    }

    #[test]
    fn standard_order_is_stable() {
        assert_eq!(
            ImmutableCollectionsFactory::standard().kinds(),
            &[
                ContainerKind::Sequence,
                ContainerKind::UniqueKeyMap,
                ContainerKind::SortedMap,
                ContainerKind::MultiMap,
                ContainerKind::Set,
            ]
        );
    }

    #[test]
    fn scalars_get_no_opinion() {
        let registry = CodecRegistry::builder().build();
        let factory = ImmutableCollectionsFactory::standard();
        assert!(
            factory
                .create(&registry, &TypeDescriptor::string())
                .unwrap()
                .is_none()
        );
    }
}
