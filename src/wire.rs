//! The tagged wire format the backend uses to ship its state to the dashboard.
//!
//! Every node carries its `full_access_path`, optional `doc` and `readonly` flag next to a
//! `type` tag and a `value`. Children of containers are reference counted so that a patched
//! tree can share every subtree it did not touch with the tree it was derived from.

use std::{collections::BTreeMap, rc::Rc};

use parse_display::{Display, FromStr};
use serde::{
    de::{self, DeserializeOwned},
    ser::SerializeStruct,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};


/// Mapping of member name to node, used for `dict`, service nodes and the cached tree root.
pub type WireMap = BTreeMap<String, Rc<WireValue>>;

/// Tags with a known meaning on the wire.
#[derive(Display, FromStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireTag {
    #[display("int")]
    Int,
    #[display("float")]
    Float,
    #[display("bool")]
    Bool,
    #[display("str")]
    Str,
    NoneType,
    None,
    Enum,
    ColouredEnum,
    #[display("list")]
    List,
    #[display("dict")]
    Dict,
    Exception,
    Quantity,
    #[display("{0}")]
    Service(ServiceKind),
}

/// Tags that behave like `dict` but also carry an object `name`.
#[derive(Display, FromStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    DataService,
    Image,
    NumberSlider,
    DeviceConnection,
    Task,
}

/// A single node of a serialized backend object.
#[derive(Clone, Debug, PartialEq)]
pub struct WireValue {
    pub full_access_path: String,
    pub doc: Option<String>,
    pub readonly: bool,
    pub kind: WireKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WireKind {
    Int(i64),
    /// Raw wire form: a JSON number or a numeric string. Parsed on decode.
    Float(Value),
    Bool(bool),
    Str(String),
    NoneType,
    /// No-value marker, distinct from `NoneType`.
    None,
    Enum {
        coloured: bool,
        name: String,
        key: String,
        variants: BTreeMap<String, String>,
    },
    List(Vec<Rc<WireValue>>),
    Dict(WireMap),
    Service {
        kind: ServiceKind,
        name: String,
        members: WireMap,
    },
    Exception {
        name: String,
        message: String,
    },
    /// Magnitude/unit pair. Kept raw; there is no decoder for it.
    Quantity(Value),
    /// A tag this crate does not know about, kept verbatim.
    Unknown {
        tag: String,
        value: Value,
    },
}

impl WireValue {
    pub fn new(full_access_path: impl Into<String>, kind: WireKind) -> Self {
        Self {
            full_access_path: full_access_path.into(),
            doc: None,
            readonly: false,
            kind,
        }
    }

    /// Empty node (`None` tag, null value) inserted where a patch introduces a new member.
    pub fn placeholder(full_access_path: impl Into<String>) -> Self {
        Self::new(full_access_path, WireKind::None)
    }

    /// The tag string as it appears on the wire.
    pub fn tag(&self) -> String {
        match &self.kind {
            WireKind::Unknown { tag, .. } => tag.clone(),
            kind => kind.known_tag().map(|t| t.to_string()).unwrap_or_default(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            WireKind::List(_) | WireKind::Dict(_) | WireKind::Service { .. }
        )
    }
}

impl WireKind {
    pub fn known_tag(&self) -> Option<WireTag> {
        Some(match self {
            WireKind::Int(_) => WireTag::Int,
            WireKind::Float(_) => WireTag::Float,
            WireKind::Bool(_) => WireTag::Bool,
            WireKind::Str(_) => WireTag::Str,
            WireKind::NoneType => WireTag::NoneType,
            WireKind::None => WireTag::None,
            WireKind::Enum { coloured: false, .. } => WireTag::Enum,
            WireKind::Enum { coloured: true, .. } => WireTag::ColouredEnum,
            WireKind::List(_) => WireTag::List,
            WireKind::Dict(_) => WireTag::Dict,
            WireKind::Service { kind, .. } => WireTag::Service(*kind),
            WireKind::Exception { .. } => WireTag::Exception,
            WireKind::Quantity(_) => WireTag::Quantity,
            WireKind::Unknown { .. } => return None,
        })
    }
}

impl WireValue {
    /// Builds a node from its JSON form. Children are moved out of `json`, so the whole tree
    /// is converted in one pass.
    pub fn from_json(json: Value) -> Result<Self, serde_json::Error> {
        let mut fields = match json {
            Value::Object(fields) => fields,
            other => {
                let found = json_kind(&other);
                return Err(de::Error::custom(format_args!(
                    "wire node must be an object, found {found}"
                )));
            }
        };
        let Some(tag) = take::<String>(&mut fields, "type")? else {
            return Err(de::Error::missing_field("type"));
        };
        let value = fields.remove("value").unwrap_or(Value::Null);
        let name: Option<String> = take(&mut fields, "name")?;
        let kind = match tag.parse::<WireTag>() {
            Ok(WireTag::Int) => WireKind::Int(serde_json::from_value(value)?),
            Ok(WireTag::Float) => WireKind::Float(value),
            Ok(WireTag::Bool) => WireKind::Bool(serde_json::from_value(value)?),
            Ok(WireTag::Str) => WireKind::Str(serde_json::from_value(value)?),
            Ok(WireTag::NoneType) => WireKind::NoneType,
            Ok(WireTag::None) => WireKind::None,
            Ok(t @ (WireTag::Enum | WireTag::ColouredEnum)) => WireKind::Enum {
                coloured: t == WireTag::ColouredEnum,
                name: name.unwrap_or_default(),
                key: serde_json::from_value(value)?,
                variants: take(&mut fields, "enum")?.unwrap_or_default(),
            },
            Ok(WireTag::List) => match value {
                Value::Array(items) => WireKind::List(
                    items
                        .into_iter()
                        .map(|item| Self::from_json(item).map(Rc::new))
                        .collect::<Result<_, _>>()?,
                ),
                other => return Err(invalid(&tag, "an array", &other)),
            },
            Ok(WireTag::Dict) => WireKind::Dict(members_from_json(&tag, value)?),
            Ok(WireTag::Service(kind)) => WireKind::Service {
                kind,
                name: name.unwrap_or_default(),
                members: members_from_json(&tag, value)?,
            },
            Ok(WireTag::Exception) => WireKind::Exception {
                name: name.unwrap_or_default(),
                message: serde_json::from_value(value)?,
            },
            Ok(WireTag::Quantity) => WireKind::Quantity(value),
            Err(_) => WireKind::Unknown { tag, value },
        };
        Ok(WireValue {
            full_access_path: take(&mut fields, "full_access_path")?.unwrap_or_default(),
            doc: take(&mut fields, "doc")?,
            readonly: take(&mut fields, "readonly")?.unwrap_or_default(),
            kind,
        })
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_json(Value::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("WireValue", 7)?;
        s.serialize_field("type", &self.tag())?;
        s.serialize_field("value", &Payload(&self.kind))?;
        match &self.kind {
            WireKind::Enum { name, variants, .. } => {
                s.serialize_field("name", name)?;
                s.serialize_field("enum", variants)?;
            }
            WireKind::Service { name, .. } | WireKind::Exception { name, .. } => {
                s.serialize_field("name", name)?;
            }
            _ => {}
        }
        s.serialize_field("full_access_path", &self.full_access_path)?;
        s.serialize_field("doc", &self.doc)?;
        s.serialize_field("readonly", &self.readonly)?;
        s.end()
    }
}

/// The `value` field of a node. Children serialize straight into the output.
struct Payload<'a>(&'a WireKind);

impl Serialize for Payload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            WireKind::Int(v) => v.serialize(serializer),
            WireKind::Float(v) | WireKind::Quantity(v) | WireKind::Unknown { value: v, .. } => {
                v.serialize(serializer)
            }
            WireKind::Bool(v) => v.serialize(serializer),
            WireKind::Str(v) => v.serialize(serializer),
            WireKind::NoneType | WireKind::None => serializer.serialize_unit(),
            WireKind::Enum { key, .. } => key.serialize(serializer),
            WireKind::List(items) => serializer.collect_seq(items),
            WireKind::Dict(members) | WireKind::Service { members, .. } => {
                serializer.collect_map(members)
            }
            WireKind::Exception { message, .. } => message.serialize(serializer),
        }
    }
}

fn members_from_json(tag: &str, value: Value) -> Result<WireMap, serde_json::Error> {
    match value {
        Value::Object(members) => members
            .into_iter()
            .map(|(k, v)| WireValue::from_json(v).map(|node| (k, Rc::new(node))))
            .collect(),
        other => Err(invalid(tag, "an object", &other)),
    }
}

// Absent and null fields both read as `None`.
fn take<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, serde_json::Error> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v).map(Some),
    }
}

fn invalid(tag: &str, expected: &str, found: &Value) -> serde_json::Error {
    let found = json_kind(found);
    de::Error::custom(format_args!("`{tag}` value must be {expected}, found {found}"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
