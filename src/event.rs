//! Payloads the backend pushes to the dashboard without being asked.

use serde::{Deserialize, Serialize};

use crate::{store::ParamValue, wire::WireValue};

#[cfg(test)]
mod tests;

/// A pushed event, distinguished by shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushEvent {
    /// A flat parameter changed.
    Parameter(ParameterUpdate),
    /// One node of a service's state tree changed.
    Tree { data: TreeUpdate },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub id: String,
    pub value: ParamValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeUpdate {
    pub full_access_path: String,
    pub value: WireValue,
}

impl PushEvent {
    pub fn from_json(payload: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(payload)
    }
}
