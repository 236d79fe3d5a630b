//! 不可变容器。
//!
//! # 设计背景（Why）
//! - 客户端交给引擎的集合值一经构造便不可修改，任何“修改”都意味着构造新实例；
//! - 各容器通过 `Arc` 共享底层存储，克隆廉价，可安全跨线程传递。
//!
//! # 契约说明（What）
//! - [`ImmutableList`]：允许重复，保持位置顺序；
//! - [`ImmutableSet`]：元素唯一，迭代顺序为首次出现顺序，相等性按集合语义；
//! - [`ImmutableMap`]：键唯一，保持插入顺序，相等性按映射语义；
//! - [`ImmutableSortedMap`]：键唯一，按自然顺序迭代；
//! - [`ImmutableMultimap`]：键映射到非空、有序、允许重复的值序列，键按首次出现顺序迭代。

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

/// 有序、允许重复的不可变序列。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImmutableList<T> {
    items: Arc<[T]>,
}

impl<T> ImmutableList<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for ImmutableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ImmutableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: Arc::from(items),
        }
    }
}

impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a ImmutableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 元素唯一的不可变集合。
///
/// # 教案式说明
/// - **契约 (What)**：构造时按首次出现顺序去重；迭代顺序稳定，但相等性与顺序无关；
/// - **实现 (How)**：底层为 `IndexSet`，其 `PartialEq` 本身即集合语义。
#[derive(Clone, Debug)]
pub struct ImmutableSet<T> {
    items: Arc<IndexSet<T>>,
}

impl<T: Hash + Eq> ImmutableSet<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(IndexSet::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Hash + Eq> Default for ImmutableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> PartialEq for ImmutableSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Hash + Eq> Eq for ImmutableSet<T> {}

impl<T: Hash + Eq> FromIterator<T> for ImmutableSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<T: Hash + Eq> From<IndexSet<T>> for ImmutableSet<T> {
    fn from(items: IndexSet<T>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a ImmutableSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 键唯一、保持插入顺序的不可变映射。
///
/// 由迭代器构造时，重复键保留首次出现的位置并取最后一次出现的值。
#[derive(Clone, Debug)]
pub struct ImmutableMap<K, V> {
    entries: Arc<IndexMap<K, V>>,
}

impl<K: Hash + Eq, V> ImmutableMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(IndexMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.entries.keys()
    }
}

impl<K: Hash + Eq, V> Default for ImmutableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for ImmutableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Hash + Eq, V: Eq> Eq for ImmutableMap<K, V> {}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for ImmutableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<K: Hash + Eq, V> From<IndexMap<K, V>> for ImmutableMap<K, V> {
    fn from(entries: IndexMap<K, V>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a ImmutableMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 按键自然顺序迭代的不可变映射。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImmutableSortedMap<K, V> {
    entries: Arc<BTreeMap<K, V>>,
}

impl<K: Ord, V> ImmutableSortedMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> std::collections::btree_map::Keys<'_, K, V> {
        self.entries.keys()
    }
}

impl<K: Ord, V> Default for ImmutableSortedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for ImmutableSortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for ImmutableSortedMap<K, V> {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a ImmutableSortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::collections::btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 一键多值的不可变映射。
///
/// # 教案式说明
/// - **意图 (Why)**：表达“键 → 有序、允许重复的值序列”，对应列表型多值映射；
/// - **契约 (What)**：
///   - 每个键至少对应一个值，空序列的键在构造时被丢弃；
///   - 键按首次出现顺序迭代，同一键下的值保持出现顺序；
///   - 相等性要求键集合相同且逐键值序列相同，不比较键顺序；
/// - **实现 (How)**：底层为 `IndexMap<K, Vec<V>>`，由 [`ImmutableMultimap::from_pairs`] 分组构造。
#[derive(Clone, Debug)]
pub struct ImmutableMultimap<K, V> {
    groups: Arc<IndexMap<K, Vec<V>>>,
}

impl<K: Hash + Eq, V> ImmutableMultimap<K, V> {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(IndexMap::new()),
        }
    }

    /// 按键分组 `(键, 值)` 序列。
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut groups: IndexMap<K, Vec<V>> = IndexMap::new();
        for (key, value) in pairs {
            groups.entry(key).or_default().push(value);
        }
        Self {
            groups: Arc::new(groups),
        }
    }

    /// 由已分组的序列构造，追加同一键的后续分组并丢弃空分组。
    pub fn from_groups(groups: impl IntoIterator<Item = (K, Vec<V>)>) -> Self {
        let mut merged: IndexMap<K, Vec<V>> = IndexMap::new();
        for (key, values) in groups {
            if values.is_empty() {
                continue;
            }
            merged.entry(key).or_default().extend(values);
        }
        Self {
            groups: Arc::new(merged),
        }
    }

    /// 键值对总数。
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 键的个数。
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }

    /// 某键对应的值序列；键不存在时为空切片。
    pub fn get(&self, key: &K) -> &[V] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, Vec<V>> {
        self.groups.keys()
    }

    /// 按键分组迭代。
    pub fn groups(&self) -> impl Iterator<Item = (&K, &[V])> + '_ {
        self.groups
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }

    /// 按键分组顺序展开为 `(键, 值)` 对。
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.groups
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key, value)))
    }
}

impl<K: Hash + Eq, V> Default for ImmutableMultimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for ImmutableMultimap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl<K: Hash + Eq, V: Eq> Eq for ImmutableMultimap<K, V> {}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for ImmutableMultimap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_dedups_in_first_seen_order() {
        let set: ImmutableSet<&str> = ["a", "b", "a", "c", "b"].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn set_equality_ignores_order() {
        let left: ImmutableSet<i32> = [1, 2, 3].into_iter().collect();
        let right: ImmutableSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(left, right);
    }

    #[test]
    fn list_keeps_duplicates_and_positions() {
        let list: ImmutableList<&str> = vec!["x", "y", "y", "z"].into();
        assert_eq!(list.as_slice(), &["x", "y", "y", "z"]);
        assert_ne!(list, ImmutableList::from(vec!["x", "y", "z", "y"]));
    }

    #[test]
    fn map_keeps_first_position_and_last_value() {
        let map: ImmutableMap<&str, i32> = [("k", 1), ("j", 2), ("k", 3)].into_iter().collect();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["k", "j"]);
        assert_eq!(map.get(&"k"), Some(&3));
    }

    #[test]
    fn sorted_map_iterates_in_key_order() {
        let map: ImmutableSortedMap<&str, i32> = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn multimap_groups_values_per_key() {
        let multimap =
            ImmutableMultimap::from_pairs([("k", "v1"), ("k2", "v3"), ("k", "v2")]);
        assert_eq!(multimap.keys().copied().collect::<Vec<_>>(), vec!["k", "k2"]);
        assert_eq!(multimap.get(&"k"), &["v1", "v2"]);
        assert_eq!(multimap.len(), 3);
        assert_eq!(
            multimap.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![("k", "v1"), ("k", "v2"), ("k2", "v3")]
        );
    }

    #[test]
    fn multimap_drops_empty_groups() {
        let multimap = ImmutableMultimap::from_groups([("k", vec![]), ("j", vec![1])]);
        assert_eq!(multimap.key_count(), 1);
        assert!(multimap.get(&"k").is_empty());
    }
}
