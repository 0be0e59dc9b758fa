//! Typed node layer over decoded JSON.
//!
//! A [`Node`] is built once, recursively, from a decoded value and never
//! changes afterwards. Domain views ([`MapView`], [`ListView`]) borrow into
//! the tree and provide keyed, typed access with validation errors.

use crate::models::error::ModelError;
use core::fmt;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Closed set of shapes a snapshot value may take.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Node>),
    Map(BTreeMap<String, Node>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::String => "string",
            NodeKind::List => "list",
            NodeKind::Map => "map",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    /// Classify an already decoded JSON value.
    ///
    /// Integers that do not fit `i64` are rejected rather than silently
    /// turned into floats.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        match value {
            Value::Null => Ok(Node::Null),
            Value::Bool(b) => Ok(Node::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Node::Int(i))
                } else if n.is_u64() {
                    Err(data_error(format!("integer {} out of range", n)))
                } else {
                    n.as_f64()
                        .map(Node::Float)
                        .ok_or_else(|| data_error(format!("number {} not representable", n)))
                }
            }
            Value::String(s) => Ok(Node::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Node::from_value(item).map_err(|e| nest(e, &format!("[{}]", i))))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::List),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    Node::from_value(v)
                        .map(|n| (k.clone(), n))
                        .map_err(|e| nest(e, k))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Node::Map),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::from(*i),
            Node::Float(x) => Value::from(*x),
            Node::String(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Node::Map(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Bool(_) => NodeKind::Bool,
            Node::Int(_) => NodeKind::Int,
            Node::Float(_) => NodeKind::Float,
            Node::String(_) => NodeKind::String,
            Node::List(_) => NodeKind::List,
            Node::Map(_) => NodeKind::Map,
        }
    }

    /// Keyed child of a map node; `None` for absent keys and non-maps.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Indexed child of a list node.
    pub fn at(&self, index: usize) -> Option<&Node> {
        self.as_list().and_then(|l| l.get(index))
    }

    /// Number of children of a list or map; scalars have none.
    pub fn len(&self) -> usize {
        match self {
            Node::List(items) => items.len(),
            Node::Map(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with integers widened: JSON does not distinguish `20` from `20.0`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(x) => Some(*x),
            Node::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl TryFrom<&Value> for Node {
    type Error = ModelError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Node::from_value(value)
    }
}

impl TryFrom<Value> for Node {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Node::from_value(&value)
    }
}

fn data_error(reason: String) -> ModelError {
    ModelError::Data {
        path: String::new(),
        reason,
    }
}

/// Prefix the path of a data error with the segment of its parent.
fn nest(err: ModelError, segment: &str) -> ModelError {
    match err {
        ModelError::Data { path, reason } => {
            let path = if path.is_empty() || path.starts_with('[') {
                format!("{}{}", segment, path)
            } else {
                format!("{}.{}", segment, path)
            };
            ModelError::Data { path, reason }
        }
        other => other,
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Node;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "null, bool, integer, float, string, list or string-keyed map")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Node::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Node::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Node::deserialize(deserializer)
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Node::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Node::Int(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(Node::Int)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Node::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Node::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Node::String(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Node::List(items))
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Node>()? {
                    map.insert(key, value);
                }
                Ok(Node::Map(map))
            }
        }

        deserializer.deserialize_any(V)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Int(i) => serializer.serialize_i64(*i),
            Node::Float(x) => serializer.serialize_f64(*x),
            Node::String(s) => serializer.serialize_str(s),
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Map(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

/// Conversion from a borrowed node into a requested scalar or container.
///
/// `from_node` returns `None` when the node is of another kind.
pub trait FromNode<'a>: Sized {
    const EXPECTED: &'static str;

    fn from_node(node: &'a Node) -> Option<Self>;
}

impl<'a> FromNode<'a> for bool {
    const EXPECTED: &'static str = "bool";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_bool()
    }
}

impl<'a> FromNode<'a> for i64 {
    const EXPECTED: &'static str = "int";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_i64()
    }
}

/// Float fields accept integer nodes, widened: a reading of `20` is the
/// same temperature as `20.0`. The reverse is a type error.
impl<'a> FromNode<'a> for f64 {
    const EXPECTED: &'static str = "float";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_f64()
    }
}

impl<'a> FromNode<'a> for &'a str {
    const EXPECTED: &'static str = "string";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_str()
    }
}

impl<'a> FromNode<'a> for String {
    const EXPECTED: &'static str = "string";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_str().map(str::to_string)
    }
}

impl<'a> FromNode<'a> for &'a [Node] {
    const EXPECTED: &'static str = "list";

    fn from_node(node: &'a Node) -> Option<Self> {
        node.as_list()
    }
}

impl<'a> FromNode<'a> for &'a Node {
    const EXPECTED: &'static str = "any";

    fn from_node(node: &'a Node) -> Option<Self> {
        Some(node)
    }
}

/// Nullable field contract: `null` reads as `None` instead of a type error.
impl<'a, T: FromNode<'a>> FromNode<'a> for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_node(node: &'a Node) -> Option<Self> {
        if node.is_null() {
            Some(None)
        } else {
            T::from_node(node).map(Some)
        }
    }
}

/// Read-only projection over a map-shaped node.
#[derive(Debug, Clone, Copy)]
pub struct MapView<'a> {
    entity: &'static str,
    map: &'a BTreeMap<String, Node>,
}

impl<'a> MapView<'a> {
    pub fn new(entity: &'static str, node: &'a Node) -> Result<Self, ModelError> {
        match node {
            Node::Map(map) => Ok(MapView { entity, map }),
            other => Err(ModelError::Shape {
                entity,
                expected: NodeKind::Map,
                found: other.kind(),
            }),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn node(&self, key: &str) -> Option<&'a Node> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required field: absent key is an attribute error, any other kind a type error.
    pub fn get<T: FromNode<'a>>(&self, key: &str) -> Result<T, ModelError> {
        let node = self.map.get(key).ok_or_else(|| ModelError::Attribute {
            entity: self.entity,
            key: key.to_string(),
        })?;
        self.convert(key, node)
    }

    /// Optional field: an absent key reads as `None`.
    pub fn find<T: FromNode<'a>>(&self, key: &str) -> Result<Option<T>, ModelError> {
        self.map.get(key).map(|node| self.convert(key, node)).transpose()
    }

    /// Optional and nullable field: absent and `null` both read as `None`.
    pub fn optional<T: FromNode<'a>>(&self, key: &str) -> Result<Option<T>, ModelError> {
        Ok(self.find::<Option<T>>(key)?.flatten())
    }

    /// Child list; absent and `null` both read as empty.
    pub fn list(&self, key: &str) -> Result<&'a [Node], ModelError> {
        Ok(self.optional::<&'a [Node]>(key)?.unwrap_or(&[]))
    }

    /// Independent deep copy of the underlying map.
    pub fn to_node(&self) -> Node {
        Node::Map(self.map.clone())
    }

    fn convert<T: FromNode<'a>>(&self, key: &str, node: &'a Node) -> Result<T, ModelError> {
        T::from_node(node).ok_or_else(|| ModelError::Type {
            entity: self.entity,
            key: key.to_string(),
            expected: T::EXPECTED,
            found: node.kind(),
        })
    }
}

/// Read-only projection over a list-shaped node.
#[derive(Debug, Clone, Copy)]
pub struct ListView<'a> {
    entity: &'static str,
    items: &'a [Node],
}

impl<'a> ListView<'a> {
    pub fn new(entity: &'static str, node: &'a Node) -> Result<Self, ModelError> {
        match node {
            Node::List(items) => Ok(ListView { entity, items }),
            other => Err(ModelError::Shape {
                entity,
                expected: NodeKind::List,
                found: other.kind(),
            }),
        }
    }

    pub fn from_slice(entity: &'static str, items: &'a [Node]) -> Self {
        ListView { entity, items }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn get(&self, index: usize) -> Option<&'a Node> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Node> {
        self.items.iter()
    }

    pub fn to_node(&self) -> Node {
        Node::List(self.items.to_vec())
    }
}
