use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parsed target configuration handed to [`crate::Target::set_config`].
pub type TargetSettings = serde_json::Map<String, serde_json::Value>;

/// Configuration of one export instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Identity of the current wiki instance, the first component of every id base.
    pub wiki_id: String,
    pub target: Option<TargetDescriptor>,
    /// Data provider keys, in pipeline order.
    pub pipeline: Vec<String>,
    /// Change observer and context provider registry keys to skip.
    pub disabled: Vec<String>,
    pub queue: QueueSettings,
    /// `group -> permission -> granted`, read by the `acl` provider.
    pub group_permissions: BTreeMap<String, BTreeMap<String, bool>>,
    /// Page holding the analyzer prompt for the `analyze` context provider.
    pub prompt_title: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            wiki_id: "wiki".to_string(),
            target: None,
            pipeline: Vec::new(),
            disabled: Vec::new(),
            queue: QueueSettings::default(),
            group_permissions: BTreeMap::new(),
            prompt_title: None,
        }
    }
}

impl ExportConfig {
    pub fn new(wiki_id: impl Into<String>) -> Self {
        Self {
            wiki_id: wiki_id.into(),
            ..Self::default()
        }
    }

    /// Registry entries are skipped when `@`-prefixed or listed in `disabled`.
    pub fn is_disabled(&self, registry_key: &str) -> bool {
        registry_key.starts_with('@') || self.disabled.iter().any(|key| key == registry_key)
    }
}

/// `type` names a registered target; `configuration` is a JSON object or a
/// string containing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub database: PathBuf,
    /// How long a drain lease stays valid without a heartbeat.
    pub lease_ttl_secs: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            database: PathBuf::from("wikirag.sqlite3"),
            lease_ttl_secs: 600,
        }
    }
}
