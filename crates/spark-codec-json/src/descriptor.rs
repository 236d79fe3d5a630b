//! 泛型类型描述符。
//!
//! # 设计背景（Why）
//! - 编解码器查找需要“原始容器种类 + 有序类型实参”这一完整信息，嵌套泛型（如集合的列表）
//!   必须递归表达；
//! - Rust 没有运行时反射，因此描述符在调用点显式构造，并作为注册中心缓存的查找键。
//!
//! # 契约说明（What）
//! - [`TypeDescriptor`] 构造后不可变，实现 `Eq + Hash + Ord`，可安全跨线程共享；
//! - 容器原始类型若没有类型实参，视为“擦除”描述符，分类器一律拒绝。

use std::fmt;
use std::sync::Arc;

/// 描述符的原始类型。
///
/// 标量与记录类型不携带实参；容器类型分为不可变容器与其可变对应类型两组。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawType {
    Bool,
    Int,
    Float,
    String,
    ImmutableList,
    ImmutableSet,
    ImmutableMap,
    ImmutableSortedMap,
    ImmutableMultimap,
    ArrayList,
    LinkedHashSet,
    LinkedHashMap,
    TreeMap,
    /// 按名称注册的记录类型。
    Record(Arc<str>),
}

impl RawType {
    /// 该原始类型是否为需要类型实参的容器。
    pub fn is_container(&self) -> bool {
        !matches!(
            self,
            RawType::Bool | RawType::Int | RawType::Float | RawType::String | RawType::Record(_)
        )
    }

    /// 人类可读的类型名。
    pub fn name(&self) -> &str {
        match self {
            RawType::Bool => "Bool",
            RawType::Int => "Int",
            RawType::Float => "Float",
            RawType::String => "String",
            RawType::ImmutableList => "ImmutableList",
            RawType::ImmutableSet => "ImmutableSet",
            RawType::ImmutableMap => "ImmutableMap",
            RawType::ImmutableSortedMap => "ImmutableSortedMap",
            RawType::ImmutableMultimap => "ImmutableMultimap",
            RawType::ArrayList => "ArrayList",
            RawType::LinkedHashSet => "LinkedHashSet",
            RawType::LinkedHashMap => "LinkedHashMap",
            RawType::TreeMap => "TreeMap",
            RawType::Record(name) => name,
        }
    }
}

/// 结构化、可比较的泛型类型描述符。
///
/// # 教案式说明
/// - **意图 (Why)**：以显式数据代替反射，注册中心据此定位或构造编解码器；
/// - **契约 (What)**：`raw` 为原始类型，`args` 为按声明顺序排列的类型实参，递归同构；
/// - **实现 (How)**：实参以 `Arc<[TypeDescriptor]>` 共享，克隆只增加引用计数，适合作为缓存键反复复制。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor {
    raw: RawType,
    args: Arc<[TypeDescriptor]>,
}

impl TypeDescriptor {
    /// 由原始类型与实参构造描述符。
    pub fn new(raw: RawType, args: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self {
            raw,
            args: args.into_iter().collect(),
        }
    }

    /// 仅有原始类型、不带实参的描述符；对容器而言即擦除形式。
    pub fn raw(raw: RawType) -> Self {
        Self::new(raw, [])
    }

    pub fn bool() -> Self {
        Self::raw(RawType::Bool)
    }

    pub fn int() -> Self {
        Self::raw(RawType::Int)
    }

    pub fn float() -> Self {
        Self::raw(RawType::Float)
    }

    pub fn string() -> Self {
        Self::raw(RawType::String)
    }

    /// 按名称引用已注册的记录类型。
    pub fn record(name: impl Into<Arc<str>>) -> Self {
        Self::raw(RawType::Record(name.into()))
    }

    pub fn immutable_list(element: TypeDescriptor) -> Self {
        Self::new(RawType::ImmutableList, [element])
    }

    pub fn immutable_set(element: TypeDescriptor) -> Self {
        Self::new(RawType::ImmutableSet, [element])
    }

    pub fn immutable_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(RawType::ImmutableMap, [key, value])
    }

    pub fn immutable_sorted_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(RawType::ImmutableSortedMap, [key, value])
    }

    pub fn immutable_multimap(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(RawType::ImmutableMultimap, [key, value])
    }

    pub fn array_list(element: TypeDescriptor) -> Self {
        Self::new(RawType::ArrayList, [element])
    }

    pub fn linked_hash_set(element: TypeDescriptor) -> Self {
        Self::new(RawType::LinkedHashSet, [element])
    }

    pub fn linked_hash_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(RawType::LinkedHashMap, [key, value])
    }

    pub fn tree_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(RawType::TreeMap, [key, value])
    }

    /// 原始类型。
    pub fn raw_type(&self) -> &RawType {
        &self.raw
    }

    /// 类型实参。
    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    /// 容器原始类型缺少实参时返回 `true`。
    pub fn is_erased(&self) -> bool {
        self.raw.is_container() && self.args.is_empty()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw.name())?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(arg, f)?;
        }
        f.write_str(">")
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}
