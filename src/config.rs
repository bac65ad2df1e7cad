use serde::{Deserialize, Serialize};

/// Settings for a [`Session`](crate::Session).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Services whose state trees are cached. Each is the first segment of its access paths.
    pub services: Vec<String>,
    /// Method called on a service to fetch a full snapshot, as `"{service}.{snapshot_method}"`.
    pub snapshot_method: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            services: vec!["devices".to_owned()],
            snapshot_method: "serialize".to_owned(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn snapshot_method_for(&self, service: &str) -> String {
        format!("{service}.{}", self.snapshot_method)
    }

    pub fn is_known_service(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }
}
