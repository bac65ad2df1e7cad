use std::collections::BTreeMap;

use parse_display::Display;
use serde_json::Value;

use crate::wire::{WireKind, WireValue};


/// Plain projection of a [`WireValue`], as consumed by display code.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Sentinel for nodes that could not be decoded. Distinct from `Null`.
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Decoded>),
    Map(BTreeMap<String, Decoded>),
    Error(RemoteError),
}

impl Decoded {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Decoded::Undefined)
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Decoded::Int(v) => Some(*v as f64),
            Decoded::Float(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Decoded::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// An exception raised on the backend and shipped as a value.
#[derive(Display, Clone, Debug, PartialEq, Eq)]
#[display("{name}: {message}")]
pub struct RemoteError {
    pub name: String,
    pub message: String,
}

impl std::error::Error for RemoteError {}

/// Something that made a node decode to [`Decoded::Undefined`].
#[derive(Display, Clone, Debug, PartialEq, Eq)]
pub enum DecodeIssue {
    #[display("no decoder for type `{tag}` at `{path}`")]
    UnknownTag { tag: String, path: String },
    #[display("enum key `{key}` is not a member of `{name}` at `{path}`")]
    EnumKey {
        key: String,
        name: String,
        path: String,
    },
}

/// Decodes a node into its plain value.
///
/// Never fails: unknown tags (including `Quantity`) and enum keys missing from their
/// mapping decode to [`Decoded::Undefined`] and are logged as warnings.
pub fn decode(node: &WireValue) -> Decoded {
    decode_into(node, &mut Vec::new())
}

/// Like [`decode`], but also returns every issue encountered.
pub fn decode_reporting(node: &WireValue) -> (Decoded, Vec<DecodeIssue>) {
    let mut issues = Vec::new();
    let value = decode_into(node, &mut issues);
    (value, issues)
}

fn decode_into(node: &WireValue, issues: &mut Vec<DecodeIssue>) -> Decoded {
    match &node.kind {
        WireKind::Int(v) => Decoded::Int(*v),
        WireKind::Float(raw) => Decoded::Float(parse_float(raw)),
        WireKind::Bool(v) => Decoded::Bool(*v),
        WireKind::Str(v) => Decoded::Str(v.clone()),
        WireKind::NoneType | WireKind::None => Decoded::Null,
        WireKind::Enum {
            name,
            key,
            variants,
            ..
        } => match variants.get(key) {
            Some(label) => Decoded::Str(label.clone()),
            None => report(
                issues,
                DecodeIssue::EnumKey {
                    key: key.clone(),
                    name: name.clone(),
                    path: node.full_access_path.clone(),
                },
            ),
        },
        WireKind::List(items) => {
            Decoded::List(items.iter().map(|n| decode_into(n, issues)).collect())
        }
        WireKind::Dict(members) | WireKind::Service { members, .. } => Decoded::Map(
            members
                .iter()
                .map(|(k, n)| (k.clone(), decode_into(n, issues)))
                .collect(),
        ),
        WireKind::Exception { name, message } => Decoded::Error(RemoteError {
            name: name.clone(),
            message: message.clone(),
        }),
        WireKind::Quantity(_) | WireKind::Unknown { .. } => report(
            issues,
            DecodeIssue::UnknownTag {
                tag: node.tag(),
                path: node.full_access_path.clone(),
            },
        ),
    }
}

fn report(issues: &mut Vec<DecodeIssue>, issue: DecodeIssue) -> Decoded {
    log::warn!("{issue}");
    issues.push(issue);
    Decoded::Undefined
}

// Backend number formatting drifts between numbers and strings; always re-parse.
fn parse_float(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
