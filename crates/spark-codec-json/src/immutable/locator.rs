use std::sync::Arc;

use super::ContainerKind;
use crate::codec::Codec;
use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::registry::CodecRegistry;

/// 合成不可变容器的可变对应描述符。
///
/// 多值映射的值参数会包一层 `ArrayList`，其余族直接沿用参数。
pub fn mutable_counterpart(kind: ContainerKind, args: &[TypeDescriptor]) -> TypeDescriptor {
    kind.mutable_descriptor(args)
}

/// 通过注册中心解析可变对应类型的编解码器。
///
/// # 契约说明（What）
/// - 只经由 `registry` 查找，适配器自身不构造任何元素或键值编解码器；
/// - 失败时返回 [`CodecError::UnresolvableDelegate`]，同时携带原始请求类型、合成类型与根因；
///   这属于配置缺失，调用方不应重试。
pub fn resolve_delegate(
    kind: ContainerKind,
    args: &[TypeDescriptor],
    registry: &CodecRegistry,
) -> Result<Arc<dyn Codec>, CodecError> {
    let mutable = mutable_counterpart(kind, args);
    registry
        .get_adapter(&mutable)
        .map_err(|source| CodecError::UnresolvableDelegate {
            requested: kind.immutable_descriptor(args),
            mutable,
            source: Box::new(source),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RecordSchema;

    #[test]
    fn missing_element_codec_is_reported_with_both_types() {
        let registry = CodecRegistry::builder().build();
        let args = [TypeDescriptor::record("Unknown")];
        let err = match resolve_delegate(ContainerKind::Sequence, &args, &registry) {
            Err(err) => err,
            Ok(_) => panic!("delegate should not resolve"),
        };
        match &err {
            CodecError::UnresolvableDelegate {
                requested,
                mutable,
                source,
            } => {
                assert_eq!(requested.to_string(), "ImmutableList<Unknown>");
                assert_eq!(mutable.to_string(), "ArrayList<Unknown>");
                assert!(matches!(**source, CodecError::NoAdapter { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn resolves_through_the_registry() {
        let registry = CodecRegistry::builder()
            .register_record(RecordSchema::new("Known").field("id", TypeDescriptor::int()))
            .build();
        let args = [TypeDescriptor::string(), TypeDescriptor::record("Known")];
        let delegate = resolve_delegate(ContainerKind::MultiMap, &args, &registry).unwrap();
        assert_eq!(
            delegate.descriptor(),
            &TypeDescriptor::linked_hash_map(
                TypeDescriptor::string(),
                TypeDescriptor::array_list(TypeDescriptor::record("Known"))
            )
        );
    }
}
