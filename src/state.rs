use crate::model::{AssetModel, ContractDefinitionModel, PolicyModel};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Last-known records of every managed resource, keyed by resource name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct State {
    pub version: u32,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub assets: BTreeMap<String, AssetModel>,

    #[serde(default)]
    pub policies: BTreeMap<String, PolicyModel>,

    #[serde(default)]
    pub contract_definitions: BTreeMap<String, ContractDefinitionModel>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            assets: BTreeMap::new(),
            policies: BTreeMap::new(),
            contract_definitions: BTreeMap::new(),
        }
    }
}

// ============================================================================
// State Implementation
// ============================================================================

impl State {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using empty state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: State = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            anyhow::bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    /// Number of managed resources
    pub fn len(&self) -> usize {
        self.assets.len() + self.policies.len() + self.contract_definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attr, CriterionModel};

    fn definition() -> ContractDefinitionModel {
        ContractDefinitionModel {
            id: "cd-1".into(),
            access_policy_id: "p".into(),
            contract_policy_id: "p".into(),
            validity: Attr::Value(600),
            criteria: Some(Vec::<CriterionModel>::new()),
            created_at: Attr::Value(1_700_000_000_000),
        }
    }

    #[test]
    fn test_default_state() {
        let state = State::default();
        assert_eq!(state.version, STATE_VERSION);
        assert!(state.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("edcform.state.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("edcform.state.json");

        let mut state = State::default();
        state
            .contract_definitions
            .insert("offer".to_string(), definition());
        state.touch(&path).unwrap();

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded, state);
        // Empty criteria survive the round trip.
        assert_eq!(loaded.contract_definitions["offer"].criteria, Some(vec![]));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = State {
            version: STATE_VERSION + 1,
            ..Default::default()
        };
        state.save(&path).unwrap();
        assert!(State::load(&path).is_err());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = State::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }
}
