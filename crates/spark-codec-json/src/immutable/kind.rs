use crate::collections::{ImmutableMultimap, ImmutableSortedMap};
use crate::descriptor::{RawType, TypeDescriptor};
use crate::value::Value;

/// 不可变容器族。
///
/// 每个族对应一个不可变原始类型与一个可变对应类型，转换适配器在二者之间搬运数据。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `ImmutableSet<E>`，委托 `LinkedHashSet<E>`。
    Set,
    /// `ImmutableList<E>`，委托 `ArrayList<E>`。
    Sequence,
    /// `ImmutableMap<K, V>`，委托 `LinkedHashMap<K, V>`。
    UniqueKeyMap,
    /// `ImmutableSortedMap<K, V>`，委托 `TreeMap<K, V>`。
    SortedMap,
    /// `ImmutableMultimap<K, V>`，委托 `LinkedHashMap<K, ArrayList<V>>`。
    MultiMap,
}

struct Counterpart {
    immutable: RawType,
    mutable: RawType,
    arity: usize,
    /// 值参数包一层 `ArrayList`，多值映射专用。
    values_as_sequence: bool,
}

static COUNTERPARTS: [Counterpart; 5] = [
    Counterpart {
        immutable: RawType::ImmutableSet,
        mutable: RawType::LinkedHashSet,
        arity: 1,
        values_as_sequence: false,
    },
    Counterpart {
        immutable: RawType::ImmutableList,
        mutable: RawType::ArrayList,
        arity: 1,
        values_as_sequence: false,
    },
    Counterpart {
        immutable: RawType::ImmutableMap,
        mutable: RawType::LinkedHashMap,
        arity: 2,
        values_as_sequence: false,
    },
    Counterpart {
        immutable: RawType::ImmutableSortedMap,
        mutable: RawType::TreeMap,
        arity: 2,
        values_as_sequence: false,
    },
    Counterpart {
        immutable: RawType::ImmutableMultimap,
        mutable: RawType::LinkedHashMap,
        arity: 2,
        values_as_sequence: true,
    },
];

impl ContainerKind {
    /// 全部容器族，按声明顺序。
    pub const ALL: [ContainerKind; 5] = [
        ContainerKind::Set,
        ContainerKind::Sequence,
        ContainerKind::UniqueKeyMap,
        ContainerKind::SortedMap,
        ContainerKind::MultiMap,
    ];

    fn counterpart(self) -> &'static Counterpart {
        let index = match self {
            ContainerKind::Set => 0,
            ContainerKind::Sequence => 1,
            ContainerKind::UniqueKeyMap => 2,
            ContainerKind::SortedMap => 3,
            ContainerKind::MultiMap => 4,
        };
        &COUNTERPARTS[index]
    }

    /// 类型参数个数：集合与序列为 1，映射族为 2。
    pub fn arity(self) -> usize {
        self.counterpart().arity
    }

    pub fn immutable_raw(self) -> &'static RawType {
        &self.counterpart().immutable
    }

    pub fn mutable_raw(self) -> &'static RawType {
        &self.counterpart().mutable
    }

    /// 判断描述符是否属于本族，是则返回其类型参数。
    ///
    /// 原始类型必须完全一致；参数被擦除或个数不符的描述符不属于任何族。
    pub fn classify(self, descriptor: &TypeDescriptor) -> Option<Vec<TypeDescriptor>> {
        let counterpart = self.counterpart();
        if *descriptor.raw_type() != counterpart.immutable
            || descriptor.is_erased()
            || descriptor.args().len() != counterpart.arity
        {
            return None;
        }
        Some(descriptor.args().to_vec())
    }

    /// 以给定参数组装本族的不可变描述符。
    pub fn immutable_descriptor(self, args: &[TypeDescriptor]) -> TypeDescriptor {
        TypeDescriptor::new(self.immutable_raw().clone(), args.iter().cloned())
    }

    /// 以给定参数组装本族的可变对应描述符。
    pub fn mutable_descriptor(self, args: &[TypeDescriptor]) -> TypeDescriptor {
        let counterpart = self.counterpart();
        let args = args.iter().cloned().enumerate().map(|(index, arg)| {
            if counterpart.values_as_sequence && index == 1 {
                TypeDescriptor::array_list(arg)
            } else {
                arg
            }
        });
        TypeDescriptor::new(counterpart.mutable.clone(), args)
    }

    /// 把不可变值展开为可变对应值；形状不属于本族时返回 `None`。
    pub fn to_mutable(self, value: &Value) -> Option<Value> {
        let converted = match (self, value) {
            (ContainerKind::Sequence, Value::List(items)) => {
                Value::Array(items.iter().cloned().collect())
            }
            (ContainerKind::Set, Value::Set(items)) => {
                Value::LinkedSet(items.iter().cloned().collect())
            }
            (ContainerKind::UniqueKeyMap, Value::Map(entries)) => Value::LinkedMap(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            (ContainerKind::SortedMap, Value::SortedMap(entries)) => Value::TreeMap(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            (ContainerKind::MultiMap, Value::Multimap(groups)) => Value::LinkedMap(
                groups
                    .groups()
                    .map(|(k, values)| (k.clone(), Value::Array(values.to_vec())))
                    .collect(),
            ),
            _ => return None,
        };
        Some(converted)
    }

    /// 把委托解码出的可变值冻结为不可变值；形状不属于本族时返回 `None`。
    ///
    /// 集合也接受普通列表（按首次出现去重），有序映射也接受插入有序映射（重新排序）。
    pub fn from_mutable(self, value: Value) -> Option<Value> {
        let converted = match (self, value) {
            (ContainerKind::Sequence, Value::Array(items)) => Value::List(items.into()),
            (ContainerKind::Set, Value::LinkedSet(items)) => Value::Set(items.into()),
            (ContainerKind::Set, Value::Array(items)) => Value::Set(items.into_iter().collect()),
            (ContainerKind::UniqueKeyMap, Value::LinkedMap(entries)) => Value::Map(entries.into()),
            (ContainerKind::UniqueKeyMap, Value::TreeMap(entries)) => {
                Value::Map(entries.into_iter().collect())
            }
            (ContainerKind::SortedMap, Value::TreeMap(entries)) => {
                Value::SortedMap(entries.into())
            }
            (ContainerKind::SortedMap, Value::LinkedMap(entries)) => {
                Value::SortedMap(entries.into_iter().collect::<ImmutableSortedMap<_, _>>())
            }
            (ContainerKind::MultiMap, Value::LinkedMap(entries)) => {
                return Self::group_entries(entries);
            }
            _ => return None,
        };
        Some(converted)
    }

    /// 把 `键 -> 列表` 的分组冻结为多值映射；重复键的分组按出现顺序拼接，空分组被丢弃。
    ///
    /// 任一分组不是列表时返回 `None`。
    pub fn group_entries(entries: impl IntoIterator<Item = (Value, Value)>) -> Option<Value> {
        let groups = entries
            .into_iter()
            .map(|(key, values)| match values {
                Value::Array(values) => Some((key, values)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Value::Multimap(ImmutableMultimap::from_groups(groups)))
    }
}

/// 在全部容器族中查找描述符所属的族。
///
/// ```
/// use spark_codec_json::{ContainerKind, TypeDescriptor, classify};
///
/// let ty = TypeDescriptor::immutable_list(TypeDescriptor::string());
/// assert_eq!(
///     classify(&ty),
///     Some((ContainerKind::Sequence, vec![TypeDescriptor::string()]))
/// );
/// assert_eq!(classify(&TypeDescriptor::array_list(TypeDescriptor::string())), None);
/// ```
pub fn classify(descriptor: &TypeDescriptor) -> Option<(ContainerKind, Vec<TypeDescriptor>)> {
    ContainerKind::ALL
        .into_iter()
        .find_map(|kind| kind.classify(descriptor).map(|args| (kind, args)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::ImmutableList;

    #[test]
    fn classifies_each_family() {
        let s = TypeDescriptor::string;
        let cases = [
            (TypeDescriptor::immutable_set(s()), ContainerKind::Set),
            (TypeDescriptor::immutable_list(s()), ContainerKind::Sequence),
            (TypeDescriptor::immutable_map(s(), s()), ContainerKind::UniqueKeyMap),
            (TypeDescriptor::immutable_sorted_map(s(), s()), ContainerKind::SortedMap),
            (TypeDescriptor::immutable_multimap(s(), s()), ContainerKind::MultiMap),
        ];
        for (ty, kind) in cases {
            let (found, args) = classify(&ty).unwrap();
            assert_eq!(found, kind);
            assert_eq!(args.len(), kind.arity());
        }
    }

    #[test]
    fn erased_and_mutable_descriptors_are_unrecognized() {
        assert_eq!(classify(&TypeDescriptor::raw(RawType::ImmutableList)), None);
        assert_eq!(
            classify(&TypeDescriptor::new(
                RawType::ImmutableMap,
                [TypeDescriptor::string()]
            )),
            None
        );
        assert_eq!(
            classify(&TypeDescriptor::linked_hash_set(TypeDescriptor::int())),
            None
        );
        assert_eq!(classify(&TypeDescriptor::record("ImmutableList")), None);
    }

    #[test]
    fn multimap_counterpart_wraps_values() {
        let mutable = ContainerKind::MultiMap
            .mutable_descriptor(&[TypeDescriptor::string(), TypeDescriptor::int()]);
        assert_eq!(
            mutable,
            TypeDescriptor::linked_hash_map(
                TypeDescriptor::string(),
                TypeDescriptor::array_list(TypeDescriptor::int())
            )
        );
    }

    #[test]
    fn set_accepts_plain_arrays() {
        let frozen = ContainerKind::Set
            .from_mutable(Value::Array(vec![Value::Int(2), Value::Int(1), Value::Int(2)]))
            .unwrap();
        let Value::Set(items) = frozen else {
            panic!("expected a set");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().next(), Some(&Value::Int(2)));
    }

    #[test]
    fn multimap_drops_empty_groups() {
        let mutable = Value::LinkedMap(
            [
                (Value::from("a"), Value::Array(vec![Value::Int(1)])),
                (Value::from("b"), Value::Array(Vec::new())),
            ]
            .into_iter()
            .collect(),
        );
        let Some(Value::Multimap(frozen)) = ContainerKind::MultiMap.from_mutable(mutable) else {
            panic!("expected a multimap");
        };
        assert_eq!(frozen.key_count(), 1);
        assert_eq!(frozen.get(&Value::from("a")), &[Value::Int(1)]);
    }

    #[test]
    fn wrong_shapes_are_refused() {
        let list = Value::List(ImmutableList::from(vec![Value::Int(1)]));
        assert_eq!(ContainerKind::Set.to_mutable(&list), None);
        assert_eq!(
            ContainerKind::MultiMap.from_mutable(Value::LinkedMap(
                [(Value::from("a"), Value::Int(1))].into_iter().collect()
            )),
            None
        );
    }
}
