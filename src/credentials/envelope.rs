use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CliError, Result};

/// Version tag written into every envelope this CLI produces.
pub const CURRENT_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub auth_token: String,
}

/// `None` marks a host whose credential was cleared.
pub type ConfigPerHost = BTreeMap<String, Option<UserRecord>>;

/// What the envelope knows about a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEntry<'a> {
    Absent,
    Cleared,
    Present(&'a UserRecord),
}

impl<'a> HostEntry<'a> {
    pub fn user(self) -> Option<&'a UserRecord> {
        match self {
            HostEntry::Present(user) => Some(user),
            HostEntry::Absent | HostEntry::Cleared => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V1Envelope {
    pub version: String,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub auth_config_per_host: ConfigPerHost,
}

impl V1Envelope {
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            last_update: Utc::now(),
            auth_config_per_host: ConfigPerHost::new(),
        }
    }

    pub fn entry(&self, host: &str) -> HostEntry<'_> {
        match self.auth_config_per_host.get(host) {
            None => HostEntry::Absent,
            Some(None) => HostEntry::Cleared,
            Some(Some(user)) => HostEntry::Present(user),
        }
    }

    pub fn insert(&mut self, host: &str, user: UserRecord) {
        self.auth_config_per_host
            .insert(host.to_string(), Some(user));
        self.last_update = Utc::now();
    }

    /// Returns whether the host key was present.
    pub fn remove(&mut self, host: &str) -> bool {
        let removed = self.auth_config_per_host.remove(host).is_some();
        if removed {
            self.last_update = Utc::now();
        }
        removed
    }
}

/// Pre-versioning file: one implicit user, no host keying.
///
/// The payload stays undecoded until the migrator knows which host it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyEnvelope {
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auth_config_per_host: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Legacy(LegacyEnvelope),
    V1(V1Envelope),
}

impl From<V1Envelope> for Envelope {
    fn from(envelope: V1Envelope) -> Self {
        Envelope::V1(envelope)
    }
}

impl Envelope {
    /// Decode raw file content, dispatching once on the `version` field.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CliError::corruption(format!("not valid JSON ({e})")))?;

        if !value.is_object() {
            return Err(CliError::corruption("top-level value is not an object"));
        }

        let version = match value.get("version") {
            None | Some(Value::Null) => "",
            Some(Value::String(v)) => v.as_str(),
            Some(other) => {
                return Err(CliError::corruption(format!(
                    "unexpected version tag {other}"
                )));
            }
        };

        match version {
            "" => serde_json::from_value(value)
                .map(Envelope::Legacy)
                .map_err(|e| CliError::corruption(format!("legacy envelope: {e}"))),
            CURRENT_VERSION => serde_json::from_value(value)
                .map(Envelope::V1)
                .map_err(|e| CliError::corruption(format!("{CURRENT_VERSION} envelope: {e}"))),
            other => Err(CliError::UnsupportedVersion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bob() -> UserRecord {
        UserRecord {
            username: "bob".to_string(),
            auth_token: "t".to_string(),
        }
    }

    #[test]
    fn decodes_v1_envelope_with_cleared_host() {
        let raw = json!({
            "version": "v1",
            "last_update": "2024-03-01T10:00:00Z",
            "auth_config_per_host": {
                "api.example.com": { "username": "bob", "auth_token": "t" },
                "api.old.example.com": null
            }
        });

        let Envelope::V1(envelope) = Envelope::decode(raw.to_string().as_bytes()).unwrap() else {
            panic!("expected a v1 envelope");
        };

        assert_eq!(envelope.entry("api.example.com"), HostEntry::Present(&bob()));
        assert_eq!(envelope.entry("api.old.example.com"), HostEntry::Cleared);
        assert_eq!(envelope.entry("api.other.com"), HostEntry::Absent);
        assert_eq!(envelope.entry("api.old.example.com").user(), None);
    }

    #[test]
    fn missing_version_is_legacy() {
        let raw = json!({
            "last_update": "2016-01-01T00:00:00Z",
            "auth_config_per_host": { "username": "bob", "auth_token": "t" }
        });

        let envelope = Envelope::decode(raw.to_string().as_bytes()).unwrap();
        assert!(matches!(envelope, Envelope::Legacy(_)));

        let raw = json!({ "version": "", "auth_config_per_host": {} });
        let envelope = Envelope::decode(raw.to_string().as_bytes()).unwrap();
        assert!(matches!(envelope, Envelope::Legacy(_)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Envelope::decode(b"{\"version\": \"v1\", \"auth_co"),
            Err(CliError::DataCorruption(_))
        ));
        assert!(matches!(
            Envelope::decode(b"[1, 2, 3]"),
            Err(CliError::DataCorruption(_))
        ));
        assert!(matches!(
            Envelope::decode(br#"{"version": 2, "auth_config_per_host": {}}"#),
            Err(CliError::DataCorruption(_))
        ));
    }

    #[test]
    fn unknown_version_is_not_corruption() {
        assert!(matches!(
            Envelope::decode(br#"{"version": "v9", "auth_config_per_host": {}}"#),
            Err(CliError::UnsupportedVersion(version)) if version == "v9"
        ));
    }

    #[test]
    fn v1_serializes_with_wire_field_names() {
        let mut envelope = V1Envelope::empty();
        envelope.insert("api.example.com", bob());

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["version"], "v1");
        assert!(value["last_update"].is_string());
        assert_eq!(
            value["auth_config_per_host"]["api.example.com"],
            json!({ "username": "bob", "auth_token": "t" })
        );
    }

    #[test]
    fn remove_reports_presence() {
        let mut envelope = V1Envelope::empty();
        envelope.insert("a", bob());
        assert!(envelope.remove("a"));
        assert!(!envelope.remove("a"));
        assert_eq!(envelope.entry("a"), HostEntry::Absent);
    }
}
