//! 编解码注册中心。
//!
//! # 设计背景（Why）
//! - 编解码器按描述符懒构造并缓存：首次请求时依次询问工厂，第一个给出编解码器的工厂胜出；
//! - 工厂在构造嵌套类型时会回调注册中心，自引用类型（例如树节点包含子节点列表）因此会重入同一描述符的解析。
//!
//! # 逻辑解析（How）
//! - 缓存为 `DashMap<TypeDescriptor, Arc<dyn Codec>>`，读取时立即克隆 `Arc` 释放分片锁，构造期间不持有任何锁；
//! - 同一线程内正在构造的描述符登记在线程局部表中；重入时返回 [`DeferredCodec`]，待外层构造完成后指向最终实例；
//! - 嵌套构造期间产出的编解码器可能引用尚未落定的占位者，先暂存在线程局部表中；
//!   最外层构造成功后一并写入缓存，失败则整体丢弃；
//! - 两个线程并发构造同一描述符时各自完成，后写入者覆盖缓存，两份实例行为一致。
//!
//! # 契约说明（What）
//! - 工厂顺序固定为：标量、调用方注册的工厂（按注册顺序）、集合、映射、记录；
//! - 没有任何工厂认领时返回 [`CodecError::NoAdapter`]；工厂返回错误时立即向上传播，不再询问后续工厂；
//! - 失败的解析不会写入缓存。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::codec::{
    Codec, CodecFactory, CollectionFactory, MapFactory, RecordFactory, RecordSchema,
    ScalarFactory,
};
use crate::config::CodecConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::CodecError;
use crate::token::{JsonNode, TokenKind, TokenReader, TokenWriter, TreeReader, TreeWriter};
use crate::value::Value;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static IN_FLIGHT: RefCell<HashMap<(u64, TypeDescriptor), Arc<DeferredCodec>>> =
        RefCell::new(HashMap::new());
    static PROVISIONAL: RefCell<Vec<(u64, TypeDescriptor, Arc<dyn Codec>)>> =
        const { RefCell::new(Vec::new()) };
}

/// 描述符驱动的编解码注册中心。
///
/// # 教案式说明
/// - **意图 (Why)**：为任意描述符提供唯一的查找入口，使嵌套泛型（如 `ImmutableMap<String, ImmutableSet<Int>>`）
///   逐层复用同一套解析规则；
/// - **契约 (What)**：构建后只读，可在线程间共享（`Arc<CodecRegistry>` 或直接借用）；
/// - **风险 (Trade-offs)**：缓存不设上限，描述符种类由调用方的类型集合决定，通常是有限的。
pub struct CodecRegistry {
    id: u64,
    config: CodecConfig,
    factories: Vec<Arc<dyn CodecFactory>>,
    cache: DashMap<TypeDescriptor, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// 创建仅包含内建工厂的构建器。
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// 已缓存的编解码器数量。
    pub fn cached_adapters(&self) -> usize {
        self.cache.len()
    }

    /// 查找（必要时构造）描述符对应的编解码器。
    ///
    /// # 契约说明（What）
    /// - 命中缓存时不调用任何工厂；
    /// - 同一线程重入同一描述符时返回延迟编解码器，外层构造完成后即可使用；
    /// - 错误原样返回，例如 [`CodecError::NoAdapter`] 或包装后的 [`CodecError::UnresolvableDelegate`]。
    pub fn get_adapter(&self, descriptor: &TypeDescriptor) -> Result<Arc<dyn Codec>, CodecError> {
        let cached = self.cache.get(descriptor).map(|entry| Arc::clone(entry.value()));
        if let Some(codec) = cached {
            trace!(descriptor = %descriptor, "codec cache hit");
            return Ok(codec);
        }

        let key = (self.id, descriptor.clone());
        let pending = IN_FLIGHT.with(|in_flight| in_flight.borrow().get(&key).cloned());
        if let Some(deferred) = pending {
            trace!(descriptor = %descriptor, "re-entrant lookup, handing out deferred codec");
            return Ok(deferred);
        }
        if let Some(codec) = self.provisional(descriptor) {
            return Ok(codec);
        }

        let outermost = !InFlightGuard::any_for(self.id);
        let guard = InFlightGuard::enter(key);
        let codec = match self.create(descriptor) {
            Ok(codec) => codec,
            Err(err) => {
                if outermost {
                    self.take_provisional();
                }
                return Err(err);
            }
        };
        guard.complete(&codec);
        drop(guard);

        if outermost {
            for (nested, built) in self.take_provisional() {
                self.cache.insert(nested, built);
            }
            self.cache.insert(descriptor.clone(), Arc::clone(&codec));
        } else {
            PROVISIONAL.with(|provisional| {
                provisional
                    .borrow_mut()
                    .push((self.id, descriptor.clone(), Arc::clone(&codec)));
            });
        }
        Ok(codec)
    }

    fn provisional(&self, descriptor: &TypeDescriptor) -> Option<Arc<dyn Codec>> {
        PROVISIONAL.with(|provisional| {
            provisional
                .borrow()
                .iter()
                .find(|(id, built, _)| *id == self.id && built == descriptor)
                .map(|(_, _, codec)| Arc::clone(codec))
        })
    }

    /// 取出本注册中心暂存的全部编解码器。
    fn take_provisional(&self) -> Vec<(TypeDescriptor, Arc<dyn Codec>)> {
        PROVISIONAL.with(|provisional| {
            let mut provisional = provisional.borrow_mut();
            let (mine, others): (Vec<_>, Vec<_>) = provisional
                .drain(..)
                .partition(|(id, _, _)| *id == self.id);
            *provisional = others;
            mine.into_iter()
                .map(|(_, descriptor, codec)| (descriptor, codec))
                .collect()
        })
    }

    fn create(&self, descriptor: &TypeDescriptor) -> Result<Arc<dyn Codec>, CodecError> {
        for factory in &self.factories {
            if let Some(codec) = factory.create(self, descriptor)? {
                debug!(
                    descriptor = %descriptor,
                    factory = factory.name(),
                    "codec created"
                );
                return Ok(codec);
            }
        }
        debug!(descriptor = %descriptor, "no factory claimed descriptor");
        Err(CodecError::NoAdapter {
            descriptor: descriptor.clone(),
        })
    }

    /// 以描述符对应的编解码器写出一个值。
    pub fn write_value(
        &self,
        out: &mut dyn TokenWriter,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<(), CodecError> {
        self.get_adapter(descriptor)?.write(out, value)
    }

    /// 以描述符对应的编解码器读取一个值。
    pub fn read_value(
        &self,
        input: &mut dyn TokenReader,
        descriptor: &TypeDescriptor,
    ) -> Result<Value, CodecError> {
        self.get_adapter(descriptor)?.read(input)
    }

    pub fn to_node(&self, value: &Value, descriptor: &TypeDescriptor) -> Result<JsonNode, CodecError> {
        let mut writer = TreeWriter::new();
        self.write_value(&mut writer, value, descriptor)?;
        writer.into_node()
    }

    /// 解码整个文档；值之后仍有剩余内容时视为输入损坏。
    pub fn from_node(&self, node: JsonNode, descriptor: &TypeDescriptor) -> Result<Value, CodecError> {
        let mut reader = TreeReader::new(node);
        let value = self.read_value(&mut reader, descriptor)?;
        let next = reader.peek()?;
        if next != TokenKind::EndDocument {
            return Err(CodecError::malformed(
                reader.path(),
                format!("expected END_DOCUMENT but was {}", next.label()),
            ));
        }
        Ok(value)
    }

    /// 编码为紧凑 JSON 文本。
    pub fn to_json(&self, value: &Value, descriptor: &TypeDescriptor) -> Result<String, CodecError> {
        let node = self.to_node(value, descriptor)?;
        Ok(serde_json::to_string(&node)?)
    }

    /// 从 JSON 文本解码。
    pub fn from_json(&self, text: &str, descriptor: &TypeDescriptor) -> Result<Value, CodecError> {
        let node: JsonNode = serde_json::from_str(text)?;
        self.from_node(node, descriptor)
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("id", &self.id)
            .field("config", &self.config)
            .field(
                "factories",
                &self.factories.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// 注册中心构建器。
///
/// 调用方注册的工厂排在标量之后、内建容器之前，因此可以接管任意容器描述符。
#[derive(Default)]
pub struct CodecRegistryBuilder {
    config: CodecConfig,
    factories: Vec<Arc<dyn CodecFactory>>,
    records: Vec<RecordSchema>,
}

impl CodecRegistryBuilder {
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// 追加工厂；先注册者优先。
    pub fn register_factory(mut self, factory: impl CodecFactory) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// 登记记录类型，同名记录以后登记者为准。
    pub fn register_record(mut self, schema: RecordSchema) -> Self {
        self.records.retain(|existing| existing.name() != schema.name());
        self.records.push(schema);
        self
    }

    pub fn build(self) -> CodecRegistry {
        let mut factories: Vec<Arc<dyn CodecFactory>> = Vec::with_capacity(self.factories.len() + 4);
        factories.push(Arc::new(ScalarFactory));
        factories.extend(self.factories);
        factories.push(Arc::new(CollectionFactory));
        factories.push(Arc::new(MapFactory));
        factories.push(Arc::new(RecordFactory::new(self.records)));

        let registry = CodecRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            config: self.config,
            factories,
            cache: DashMap::new(),
        };
        debug!(
            registry = registry.id,
            factories = registry.factories.len(),
            "codec registry built"
        );
        registry
    }
}

/// 自引用解析期间交出的占位编解码器。
///
/// 外层解析成功后指向最终实例。持有占位者的编解码器只有在外层成功后才进入缓存，
/// 因此空置的占位者不会被后续查找拿到；直接使用空置占位者时返回 [`CodecError::NoAdapter`]。
pub struct DeferredCodec {
    descriptor: TypeDescriptor,
    target: OnceLock<Arc<dyn Codec>>,
}

impl DeferredCodec {
    fn target(&self) -> Result<&Arc<dyn Codec>, CodecError> {
        self.target.get().ok_or_else(|| CodecError::NoAdapter {
            descriptor: self.descriptor.clone(),
        })
    }
}

impl Codec for DeferredCodec {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn write(&self, out: &mut dyn TokenWriter, value: &Value) -> Result<(), CodecError> {
        self.target()?.write(out, value)
    }

    fn read(&self, input: &mut dyn TokenReader) -> Result<Value, CodecError> {
        self.target()?.read(input)
    }

    fn read_entries(
        &self,
        input: &mut dyn TokenReader,
    ) -> Result<Option<Vec<(Value, Value)>>, CodecError> {
        self.target()?.read_entries(input)
    }
}

struct InFlightGuard {
    key: (u64, TypeDescriptor),
    deferred: Arc<DeferredCodec>,
}

impl InFlightGuard {
    fn enter(key: (u64, TypeDescriptor)) -> Self {
        let deferred = Arc::new(DeferredCodec {
            descriptor: key.1.clone(),
            target: OnceLock::new(),
        });
        IN_FLIGHT.with(|in_flight| {
            in_flight
                .borrow_mut()
                .insert(key.clone(), Arc::clone(&deferred));
        });
        Self { key, deferred }
    }

    fn any_for(registry: u64) -> bool {
        IN_FLIGHT.with(|in_flight| in_flight.borrow().keys().any(|(id, _)| *id == registry))
    }

    fn complete(&self, codec: &Arc<dyn Codec>) {
        let _ = self.deferred.target.set(Arc::clone(codec));
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|in_flight| {
            in_flight.borrow_mut().remove(&self.key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RawType;
    use crate::immutable::ImmutableCollectionsFactory;
    use std::sync::atomic::AtomicUsize;

    struct CountingFactory {
        calls: Arc<AtomicUsize>,
    }

    impl CodecFactory for CountingFactory {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn create(
            &self,
            _registry: &CodecRegistry,
            descriptor: &TypeDescriptor,
        ) -> Result<Option<Arc<dyn Codec>>, CodecError> {
            if *descriptor.raw_type() != RawType::Record(Arc::from("Counted")) {
                return Ok(None);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Arc::new(crate::codec::ScalarCodec::new(
                TypeDescriptor::string(),
            ))))
        }
    }

    #[test]
    fn adapters_are_cached_per_descriptor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = CodecRegistry::builder()
            .register_factory(CountingFactory {
                calls: Arc::clone(&calls),
            })
            .build();
        let ty = TypeDescriptor::record("Counted");
        let first = registry.get_adapter(&ty).unwrap();
        let second = registry.get_adapter(&ty).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_descriptors_are_not_cached() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::record("Missing");
        assert!(matches!(
            registry.get_adapter(&ty),
            Err(CodecError::NoAdapter { .. })
        ));
        assert_eq!(registry.cached_adapters(), 0);
    }

    #[test]
    fn self_referential_records_resolve() {
        let node = RecordSchema::new("Node")
            .field("name", TypeDescriptor::string())
            .field(
                "children",
                TypeDescriptor::array_list(TypeDescriptor::record("Node")),
            );
        let registry = CodecRegistry::builder().register_record(node).build();
        let ty = TypeDescriptor::record("Node");
        let text = r#"{"name":"root","children":[{"name":"leaf","children":[]}]}"#;
        let value = registry.from_json(text, &ty).unwrap();
        assert_eq!(registry.to_json(&value, &ty).unwrap(), text);
    }

    #[test]
    fn failed_self_referential_build_caches_nothing() {
        let node = RecordSchema::new("Node")
            .field(
                "children",
                TypeDescriptor::array_list(TypeDescriptor::record("Node")),
            )
            .field("bad", TypeDescriptor::record("Missing"));
        let registry = CodecRegistry::builder()
            .register_factory(ImmutableCollectionsFactory::standard())
            .register_record(node)
            .build();

        match registry.get_adapter(&TypeDescriptor::record("Node")) {
            Err(CodecError::NoAdapter { descriptor }) => {
                assert_eq!(descriptor, TypeDescriptor::record("Missing"));
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("Node must not resolve"),
        }
        assert_eq!(registry.cached_adapters(), 0);

        let list = TypeDescriptor::immutable_list(TypeDescriptor::record("Node"));
        assert!(matches!(
            registry.get_adapter(&list),
            Err(CodecError::UnresolvableDelegate { .. })
        ));
        assert!(matches!(
            registry.from_json("[]", &list),
            Err(CodecError::UnresolvableDelegate { .. })
        ));
    }

    #[test]
    fn nested_adapters_are_cached_after_the_outer_build() {
        let node = RecordSchema::new("Node").field(
            "children",
            TypeDescriptor::array_list(TypeDescriptor::record("Node")),
        );
        let registry = CodecRegistry::builder().register_record(node).build();
        registry.get_adapter(&TypeDescriptor::record("Node")).unwrap();
        let children = TypeDescriptor::array_list(TypeDescriptor::record("Node"));
        let first = registry.get_adapter(&children).unwrap();
        let second = registry.get_adapter(&children).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.cached_adapters() >= 2);
    }

    #[test]
    fn trailing_content_is_malformed() {
        let registry = CodecRegistry::builder().build();
        let ty = TypeDescriptor::array_list(TypeDescriptor::int());
        assert_eq!(
            registry.from_json("[1]", &ty).unwrap(),
            Value::Array(vec![Value::Int(1)])
        );
        assert!(matches!(
            registry.from_json("[1] [2]", &ty),
            Err(CodecError::MalformedInput { .. })
        ));
    }
}
