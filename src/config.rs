//! Live-view configuration.

use serde::{Deserialize, Serialize};

use crate::Result;

/// How a live view reacts to property-change events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyChangePolicy {
    /// Re-test the owning object on every event, drop the subtrees of
    /// objects that left the tree and add the matches of objects that
    /// entered it. Keeps the view equal to a fresh `select_from_root`.
    #[default]
    Recompute,
    /// Only add a reassigned value when it is a matching object reference;
    /// never remove on property changes. List edits touch only their direct
    /// elements. Can leave stale entries behind.
    NewReferenceOnly,
}

/// Options for `ObjectSelector::sync_with_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub policy: PropertyChangePolicy,
    /// Union the current matches into the target before listening.
    pub seed: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: PropertyChangePolicy::default(),
            seed: true,
        }
    }
}

impl SyncConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_policy(mut self, policy: PropertyChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.policy, PropertyChangePolicy::Recompute);
        assert!(cfg.seed);
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = SyncConfig::from_json(r#"{"policy": "new_reference_only"}"#).unwrap();
        assert_eq!(cfg.policy, PropertyChangePolicy::NewReferenceOnly);
        assert!(cfg.seed);

        let cfg = SyncConfig::from_json("{}").unwrap();
        assert_eq!(cfg, SyncConfig::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_policy() {
        assert!(matches!(
            SyncConfig::from_json(r#"{"policy": "sometimes"}"#),
            Err(crate::Error::Config(_))
        ));
    }
}
