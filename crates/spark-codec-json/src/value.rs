//! 动态值模型。
//!
//! # 设计背景（Why）
//! - 描述符在运行时才确定，编解码器因此以统一的 [`Value`] 交换数据，而不是静态泛型；
//! - 不可变容器与其可变对应类型都是 `Value` 的变体，转换适配器在二者之间搬运数据。
//!
//! # 契约说明（What）
//! - `Value` 实现 `Eq + Hash + Ord`，任意值都可以作为集合元素或映射键；
//! - 相等性遵循各容器自身的规则：集合与映射与顺序无关，序列逐位置比较，浮点按全序比较；
//! - 哈希与排序同相等性保持一致：集合、映射的哈希与迭代顺序无关，排序先比较变体再比较排序后的内容。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::collections::{
    ImmutableList, ImmutableMap, ImmutableMultimap, ImmutableSet, ImmutableSortedMap,
};

/// 编解码器之间流转的动态值。
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    List(ImmutableList<Value>),
    Set(ImmutableSet<Value>),
    Map(ImmutableMap<Value, Value>),
    SortedMap(ImmutableSortedMap<Value, Value>),
    Multimap(ImmutableMultimap<Value, Value>),
    /// 可变的有序列表，`ArrayList` 的值形态。
    Array(Vec<Value>),
    /// 可变的插入有序集合，`LinkedHashSet` 的值形态。
    LinkedSet(IndexSet<Value>),
    /// 可变的插入有序映射，`LinkedHashMap` 的值形态。
    LinkedMap(IndexMap<Value, Value>),
    /// 可变的有序树映射，`TreeMap` 的值形态。
    TreeMap(BTreeMap<Value, Value>),
    Record(Record),
}

impl Value {
    /// 变体名称，用于错误信息。
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "immutable list",
            Value::Set(_) => "immutable set",
            Value::Map(_) => "immutable map",
            Value::SortedMap(_) => "immutable sorted map",
            Value::Multimap(_) => "immutable multimap",
            Value::Array(_) => "array list",
            Value::LinkedSet(_) => "linked hash set",
            Value::LinkedMap(_) => "linked hash map",
            Value::TreeMap(_) => "tree map",
            Value::Record(_) => "record",
        }
    }

    /// 是否为不可变容器变体。
    pub fn is_immutable_container(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Set(_) | Value::Map(_) | Value::SortedMap(_) | Value::Multimap(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::List(_) => 5,
            Value::Set(_) => 6,
            Value::Map(_) => 7,
            Value::SortedMap(_) => 8,
            Value::Multimap(_) => 9,
            Value::Array(_) => 10,
            Value::LinkedSet(_) => 11,
            Value::LinkedMap(_) => 12,
            Value::TreeMap(_) => 13,
            Value::Record(_) => 14,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::SortedMap(a), Value::SortedMap(b)) => a == b,
            (Value::Multimap(a), Value::Multimap(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::LinkedSet(a), Value::LinkedSet(b)) => a == b,
            (Value::LinkedMap(a), Value::LinkedMap(b)) => a == b,
            (Value::TreeMap(a), Value::TreeMap(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(items) => hash_ordered(items.iter(), state),
            Value::Array(items) => hash_ordered(items.iter(), state),
            Value::Set(items) => hash_unordered(items.iter(), state),
            Value::LinkedSet(items) => hash_unordered(items.iter(), state),
            Value::Map(entries) => hash_unordered(entries.iter(), state),
            Value::LinkedMap(entries) => hash_unordered(entries.iter(), state),
            Value::SortedMap(entries) => hash_ordered(entries.iter(), state),
            Value::TreeMap(entries) => hash_ordered(entries.iter(), state),
            Value::Multimap(multimap) => hash_unordered(multimap.groups(), state),
            Value::Record(record) => record.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => sorted(a.iter()).cmp(&sorted(b.iter())),
            (Value::LinkedSet(a), Value::LinkedSet(b)) => sorted(a.iter()).cmp(&sorted(b.iter())),
            (Value::Map(a), Value::Map(b)) => sorted(a.iter()).cmp(&sorted(b.iter())),
            (Value::LinkedMap(a), Value::LinkedMap(b)) => sorted(a.iter()).cmp(&sorted(b.iter())),
            (Value::SortedMap(a), Value::SortedMap(b)) => a.cmp(b),
            (Value::TreeMap(a), Value::TreeMap(b)) => a.cmp(b),
            (Value::Multimap(a), Value::Multimap(b)) => {
                sorted(a.groups()).cmp(&sorted(b.groups()))
            }
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn sorted<T: Ord>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort();
    items
}

fn hash_ordered<T: Hash, H: Hasher>(items: impl ExactSizeIterator<Item = T>, state: &mut H) {
    state.write_usize(items.len());
    for item in items {
        item.hash(state);
    }
}

/// 与迭代顺序无关的哈希：逐项独立哈希后求和。
fn hash_unordered<T: Hash, H: Hasher>(items: impl Iterator<Item = T>, state: &mut H) {
    let mut count = 0usize;
    let mut sum = 0u64;
    for item in items {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        sum = sum.wrapping_add(hasher.finish());
        count += 1;
    }
    state.write_usize(count);
    state.write_u64(sum);
}

/// 记录类型的值：类型名加字段表。
///
/// 字段按写入顺序保存；相等性比较类型名与字段集合，不比较字段顺序。
#[derive(Clone, Debug)]
pub struct Record {
    type_name: Arc<str>,
    fields: IndexMap<Arc<str>, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// 追加或覆盖字段，返回自身以便链式构造。
    pub fn with_field(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_ref(), value))
    }

    pub(crate) fn insert(&mut self, name: Arc<str>, value: Value) {
        self.fields.insert(name, value);
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        hash_unordered(self.fields.iter(), state);
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_name
            .cmp(&other.type_name)
            .then_with(|| sorted(self.fields.iter()).cmp(&sorted(other.fields.iter())))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<ImmutableList<Value>> for Value {
    fn from(value: ImmutableList<Value>) -> Self {
        Value::List(value)
    }
}

impl From<ImmutableSet<Value>> for Value {
    fn from(value: ImmutableSet<Value>) -> Self {
        Value::Set(value)
    }
}

impl From<ImmutableMap<Value, Value>> for Value {
    fn from(value: ImmutableMap<Value, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<ImmutableSortedMap<Value, Value>> for Value {
    fn from(value: ImmutableSortedMap<Value, Value>) -> Self {
        Value::SortedMap(value)
    }
}

impl From<ImmutableMultimap<Value, Value>> for Value {
    fn from(value: ImmutableMultimap<Value, Value>) -> Self {
        Value::Multimap(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}
