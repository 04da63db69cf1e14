//! Fixed tables of types the resolver treats specially.
//!
//! Embedded types terminate the walk and never get an entry. Known generic
//! shapes map to a built-in formatter stem.
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::type_ref::TypeRef;

// ------------------------------- Paths ----------------------------------- //

pub const BYTE_PATH: &str = "System.Byte";
pub const ARRAY_SEGMENT_PATH: &str = "System.ArraySegment";
pub const LOOKUP_PATH: &str = "System.Linq.ILookup";
pub const GROUPING_PATH: &str = "System.Linq.IGrouping";
pub const ENUMERABLE_PATH: &str = "System.Collections.Generic.IEnumerable";

pub const DEFAULT_FORMATTER_NAMESPACE: &str = "MessagePack.Formatters";
pub const NULLABLE_FORMATTER: &str = "NullableFormatter";

/// Array formatter stems indexed by `rank - 1`.
pub const ARRAY_FORMATTERS: [&str; 4] = [
    "ArrayFormatter",
    "TwoDimensionalArrayFormatter",
    "ThreeDimensionalArrayFormatter",
    "FourDimensionalArrayFormatter",
];

// ------------------------------- Tables ---------------------------------- //

const PRIMITIVES: &[&str] = &[
    "System.Int16",
    "System.Int32",
    "System.Int64",
    "System.UInt16",
    "System.UInt32",
    "System.UInt64",
    "System.Single",
    "System.Double",
    "System.Boolean",
    "System.Byte",
    "System.SByte",
    "System.Char",
];

const EMBEDDED_SCALARS: &[&str] = &[
    "System.Decimal",
    "System.String",
    "System.Object",
    "System.Guid",
    "System.TimeSpan",
    "System.DateTime",
    "System.DateTimeOffset",
    "MessagePack.Nil",
    // engine math types with hand-written formatters
    "UnityEngine.Vector2",
    "UnityEngine.Vector3",
    "UnityEngine.Vector4",
    "UnityEngine.Quaternion",
    "UnityEngine.Color",
    "UnityEngine.Bounds",
    "UnityEngine.Rect",
    "UnityEngine.AnimationCurve",
    "UnityEngine.RectOffset",
    "UnityEngine.Gradient",
    "UnityEngine.WrapMode",
    "UnityEngine.GradientMode",
    "UnityEngine.Keyframe",
    "UnityEngine.Matrix4x4",
    "UnityEngine.GradientColorKey",
    "UnityEngine.GradientAlphaKey",
    "UnityEngine.Color32",
    "UnityEngine.LayerMask",
    "UnityEngine.Vector2Int",
    "UnityEngine.Vector3Int",
    "UnityEngine.RangeInt",
    "UnityEngine.RectInt",
    "UnityEngine.BoundsInt",
];

/// Element types whose rank-1 arrays are embedded.
const EMBEDDED_ARRAY_ELEMENTS: &[&str] = &[
    "System.Int16",
    "System.Int32",
    "System.Int64",
    "System.UInt16",
    "System.UInt32",
    "System.UInt64",
    "System.Single",
    "System.Double",
    "System.Boolean",
    "System.Byte",
    "System.SByte",
    "System.Decimal",
    "System.Char",
    "System.String",
    "System.DateTime",
];

/// `(definition path, arity) -> formatter stem`.
const KNOWN_GENERICS: &[(&str, usize, &str)] = &[
    ("System.Collections.Generic.List", 1, "ListFormatter"),
    ("System.Collections.Generic.LinkedList", 1, "LinkedListFormatter"),
    ("System.Collections.Generic.Queue", 1, "QueueFormatter"),
    ("System.Collections.Generic.Stack", 1, "StackFormatter"),
    ("System.Collections.Generic.HashSet", 1, "HashSetFormatter"),
    ("System.Collections.Generic.SortedSet", 1, "SortedSetFormatter"),
    ("System.Collections.ObjectModel.ReadOnlyCollection", 1, "ReadOnlyCollectionFormatter"),
    ("System.Collections.Generic.IList", 1, "InterfaceListFormatter2"),
    ("System.Collections.Generic.ICollection", 1, "InterfaceCollectionFormatter2"),
    ("System.Collections.Generic.IEnumerable", 1, "InterfaceEnumerableFormatter"),
    ("System.Collections.Generic.Dictionary", 2, "DictionaryFormatter"),
    ("System.Collections.Generic.IDictionary", 2, "InterfaceDictionaryFormatter"),
    ("System.Collections.Generic.SortedDictionary", 2, "SortedDictionaryFormatter"),
    ("System.Collections.Generic.SortedList", 2, "SortedListFormatter"),
    ("System.Linq.ILookup", 2, "InterfaceLookupFormatter"),
    ("System.Linq.IGrouping", 2, "InterfaceGroupingFormatter"),
    ("System.Collections.ObjectModel.ObservableCollection", 1, "ObservableCollectionFormatter"),
    ("System.Collections.ObjectModel.ReadOnlyObservableCollection", 1, "ReadOnlyObservableCollectionFormatter"),
    ("System.Collections.Generic.IReadOnlyList", 1, "InterfaceReadOnlyListFormatter"),
    ("System.Collections.Generic.IReadOnlyCollection", 1, "InterfaceReadOnlyCollectionFormatter"),
    ("System.Collections.Generic.ISet", 1, "InterfaceSetFormatter"),
    ("System.Collections.Concurrent.ConcurrentBag", 1, "ConcurrentBagFormatter"),
    ("System.Collections.Concurrent.ConcurrentQueue", 1, "ConcurrentQueueFormatter"),
    ("System.Collections.Concurrent.ConcurrentStack", 1, "ConcurrentStackFormatter"),
    ("System.Collections.ObjectModel.ReadOnlyDictionary", 2, "ReadOnlyDictionaryFormatter"),
    ("System.Collections.Generic.IReadOnlyDictionary", 2, "InterfaceReadOnlyDictionaryFormatter"),
    ("System.Collections.Concurrent.ConcurrentDictionary", 2, "ConcurrentDictionaryFormatter"),
    ("System.Lazy", 1, "LazyFormatter"),
    ("System.Collections.Generic.KeyValuePair", 2, "KeyValuePairFormatter"),
    ("System.ArraySegment", 1, "ArraySegmentFormatter"),
];

/// How an implemented interface's arguments derive from the container's.
#[derive(Debug, Clone, Copy)]
enum Projection {
    /// Same arguments: `List<T>` is an `IList<T>`.
    Args,
    /// Sequence of pairs: `Dictionary<K, V>` is an `IEnumerable<KeyValuePair<K, V>>`.
    Pairs,
    /// Sequence of groupings: `ILookup<K, V>` is an `IEnumerable<IGrouping<K, V>>`.
    Groupings,
    /// The last argument: `IGrouping<K, V>` is an `IEnumerable<V>`.
    Values,
}

const ICOLLECTION: &str = "System.Collections.Generic.ICollection";
const ILIST: &str = "System.Collections.Generic.IList";
const IREADONLY_COLLECTION: &str = "System.Collections.Generic.IReadOnlyCollection";
const IREADONLY_LIST: &str = "System.Collections.Generic.IReadOnlyList";
const ISET: &str = "System.Collections.Generic.ISet";
const IDICTIONARY: &str = "System.Collections.Generic.IDictionary";
const IREADONLY_DICTIONARY: &str = "System.Collections.Generic.IReadOnlyDictionary";
const KEY_VALUE_PAIR: &str = "System.Collections.Generic.KeyValuePair";

const LIST_LIKE: &[(&str, Projection)] = &[
    (ILIST, Projection::Args),
    (ICOLLECTION, Projection::Args),
    (ENUMERABLE_PATH, Projection::Args),
    (IREADONLY_LIST, Projection::Args),
    (IREADONLY_COLLECTION, Projection::Args),
];
const SET_LIKE: &[(&str, Projection)] = &[
    (ISET, Projection::Args),
    (ICOLLECTION, Projection::Args),
    (ENUMERABLE_PATH, Projection::Args),
    (IREADONLY_COLLECTION, Projection::Args),
];
const SEQUENCE_LIKE: &[(&str, Projection)] = &[(ENUMERABLE_PATH, Projection::Args), (IREADONLY_COLLECTION, Projection::Args)];
const DICTIONARY_LIKE: &[(&str, Projection)] = &[
    (IDICTIONARY, Projection::Args),
    (IREADONLY_DICTIONARY, Projection::Args),
    (ICOLLECTION, Projection::Pairs),
    (ENUMERABLE_PATH, Projection::Pairs),
    (IREADONLY_COLLECTION, Projection::Pairs),
];

/// `(definition path, arity) -> implemented generic interfaces`. Rank-1
/// arrays implement [`LIST_LIKE`] over their element.
const KNOWN_INTERFACES: &[(&str, usize, &[(&str, Projection)])] = &[
    ("System.Collections.Generic.List", 1, LIST_LIKE),
    ("System.Collections.ObjectModel.ReadOnlyCollection", 1, LIST_LIKE),
    ("System.Collections.ObjectModel.ObservableCollection", 1, LIST_LIKE),
    ("System.Collections.ObjectModel.ReadOnlyObservableCollection", 1, LIST_LIKE),
    ("System.Collections.Generic.LinkedList", 1, &[
        (ICOLLECTION, Projection::Args),
        (ENUMERABLE_PATH, Projection::Args),
        (IREADONLY_COLLECTION, Projection::Args),
    ]),
    ("System.Collections.Generic.Queue", 1, SEQUENCE_LIKE),
    ("System.Collections.Generic.Stack", 1, SEQUENCE_LIKE),
    ("System.Collections.Concurrent.ConcurrentBag", 1, SEQUENCE_LIKE),
    ("System.Collections.Concurrent.ConcurrentQueue", 1, SEQUENCE_LIKE),
    ("System.Collections.Concurrent.ConcurrentStack", 1, SEQUENCE_LIKE),
    ("System.Collections.Generic.HashSet", 1, SET_LIKE),
    ("System.Collections.Generic.SortedSet", 1, SET_LIKE),
    (ILIST, 1, &[(ICOLLECTION, Projection::Args), (ENUMERABLE_PATH, Projection::Args)]),
    (ICOLLECTION, 1, &[(ENUMERABLE_PATH, Projection::Args)]),
    (ISET, 1, &[(ICOLLECTION, Projection::Args), (ENUMERABLE_PATH, Projection::Args)]),
    (IREADONLY_LIST, 1, &[(IREADONLY_COLLECTION, Projection::Args), (ENUMERABLE_PATH, Projection::Args)]),
    (IREADONLY_COLLECTION, 1, &[(ENUMERABLE_PATH, Projection::Args)]),
    ("System.Collections.Generic.Dictionary", 2, DICTIONARY_LIKE),
    ("System.Collections.Generic.SortedDictionary", 2, DICTIONARY_LIKE),
    ("System.Collections.Generic.SortedList", 2, DICTIONARY_LIKE),
    ("System.Collections.ObjectModel.ReadOnlyDictionary", 2, DICTIONARY_LIKE),
    ("System.Collections.Concurrent.ConcurrentDictionary", 2, DICTIONARY_LIKE),
    (IDICTIONARY, 2, &[(ICOLLECTION, Projection::Pairs), (ENUMERABLE_PATH, Projection::Pairs)]),
    (IREADONLY_DICTIONARY, 2, &[(IREADONLY_COLLECTION, Projection::Pairs), (ENUMERABLE_PATH, Projection::Pairs)]),
    (LOOKUP_PATH, 2, &[(ENUMERABLE_PATH, Projection::Groupings)]),
    (GROUPING_PATH, 2, &[(ENUMERABLE_PATH, Projection::Values)]),
];

static EMBEDDED_TYPES: Lazy<HashSet<TypeRef>> = Lazy::new(|| {
    let byte_segment = TypeRef::generic(ARRAY_SEGMENT_PATH, vec![TypeRef::named(BYTE_PATH)]);
    PRIMITIVES
        .iter()
        .chain(EMBEDDED_SCALARS)
        .map(|path| TypeRef::named(*path))
        .chain(EMBEDDED_ARRAY_ELEMENTS.iter().map(|path| TypeRef::array(TypeRef::named(*path), 1)))
        .chain([TypeRef::nullable(byte_segment.clone()), byte_segment])
        .collect()
});

static PRIMITIVE_TYPES: Lazy<HashSet<TypeRef>> = Lazy::new(|| {
    PRIMITIVES
        .iter()
        .map(|path| TypeRef::named(*path))
        .chain([TypeRef::array(TypeRef::named(BYTE_PATH), 1)])
        .collect()
});

/// `path -> arity -> stem`.
static KNOWN_GENERIC_FORMATTERS: Lazy<HashMap<&'static str, HashMap<usize, &'static str>>> =
    Lazy::new(|| {
        let mut table: HashMap<&'static str, HashMap<usize, &'static str>> = HashMap::new();
        for (path, arity, stem) in KNOWN_GENERICS {
            table.entry(*path).or_default().insert(*arity, *stem);
        }
        for arity in 1..=8 {
            table.entry("System.Tuple").or_default().insert(arity, "TupleFormatter");
            table.entry("System.ValueTuple").or_default().insert(arity, "ValueTupleFormatter");
        }
        table
    });

// ------------------------------- Queries --------------------------------- //

/// Has a built-in encode/decode routine; never receives an entry.
pub fn is_embedded(ty: &TypeRef) -> bool {
    EMBEDDED_TYPES.contains(ty)
}

/// Written directly by the emitter, bypassing formatter lookup.
pub fn is_primitive(ty: &TypeRef) -> bool {
    PRIMITIVE_TYPES.contains(ty)
}

/// `ArraySegment<byte>` and its nullable wrapper.
pub fn is_byte_segment(ty: &TypeRef) -> bool {
    let inner = ty.nullable_inner().unwrap_or(ty);
    matches!(inner, TypeRef::Named { path, args }
        if path == ARRAY_SEGMENT_PATH && args.as_slice() == [TypeRef::named(BYTE_PATH)])
}

/// Formatter stem for a well-known generic container shape.
pub fn known_formatter(ty: &TypeRef) -> Option<&'static str> {
    let (path, arity) = ty.definition_key()?;
    KNOWN_GENERIC_FORMATTERS.get(path)?.get(&arity).copied()
}

/// Generic interfaces a built-in container or rank-1 array implements, with
/// arguments filled in. Empty for anything else.
pub fn known_interfaces(ty: &TypeRef) -> Vec<TypeRef> {
    let (interfaces, args): (&[(&str, Projection)], &[TypeRef]) = match ty {
        TypeRef::Array { element, rank: 1 } => (LIST_LIKE, std::slice::from_ref(element.as_ref())),
        TypeRef::Named { path, args } => {
            match KNOWN_INTERFACES.iter().find(|(p, arity, _)| *p == path.as_str() && *arity == args.len()) {
                Some((_, _, interfaces)) => (*interfaces, args.as_slice()),
                None => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };
    interfaces
        .iter()
        .map(|(path, projection)| {
            let args = match projection {
                Projection::Args => args.to_vec(),
                Projection::Pairs => vec![TypeRef::generic(KEY_VALUE_PAIR, args.to_vec())],
                Projection::Groupings => vec![TypeRef::generic(GROUPING_PATH, args.to_vec())],
                Projection::Values => args.last().cloned().into_iter().collect(),
            };
            TypeRef::generic(*path, args)
        })
        .collect()
}

pub fn array_formatter(rank: u8) -> Option<&'static str> {
    let ix = usize::from(rank).checked_sub(1)?;
    ARRAY_FORMATTERS.get(ix).copied()
}
