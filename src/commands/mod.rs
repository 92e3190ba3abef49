//! Command implementations
//!
//! - `lifecycle` - plan, apply, refresh, destroy and import
//! - `inspect` - validate, get and schema

pub mod inspect;
pub mod lifecycle;

use anyhow::{Context as AnyhowContext, Result};
use edc_client::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::{self, ProviderBlock};
use crate::manifest::{Manifest, ManifestError};
use crate::model::{AssetModel, ContractDefinitionModel, PolicyModel};
use crate::state::State;
use crate::ui;

// ============================================================================
// Workspace
// ============================================================================

/// The manifest and state a command works on
pub struct Workspace {
    pub manifest: Manifest,
    pub state: State,
    state_path: PathBuf,
}

impl Workspace {
    pub fn load(ctx: &Context) -> Result<Self> {
        Ok(Self {
            manifest: load_manifest(&ctx.manifest_path)?,
            state: State::load(&ctx.state_path)?,
            state_path: ctx.state_path.clone(),
        })
    }

    /// Build the connector client from the manifest's provider block
    pub fn client(&self) -> Result<Client> {
        connect(&self.manifest.provider)
    }

    pub fn save(&mut self) -> Result<()> {
        self.state.touch(&self.state_path)
    }
}

/// Load a manifest, printing every schema diagnostic on failure
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    match Manifest::load(path) {
        Ok(manifest) => Ok(manifest),
        Err(ManifestError::Invalid(diagnostics)) => {
            ui::diagnostics(None, &diagnostics);
            anyhow::bail!(
                "{} has {} error(s)",
                path.display(),
                diagnostics.errors().count()
            )
        }
        Err(err) => Err(err.into()),
    }
}

/// Resolve the provider configuration and create a client
pub fn connect(provider: &ProviderBlock) -> Result<Client> {
    let config = match config::resolve(provider, |name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(diagnostics) => {
            ui::diagnostics(Some("provider"), &diagnostics);
            anyhow::bail!("Provider configuration is incomplete");
        }
    };
    Client::new(&config).context("Failed to create the EDC client")
}

// ============================================================================
// Tracked Records
// ============================================================================

/// A record kept both in the manifest and in the state file
pub trait Tracked: Clone + PartialEq + fmt::Debug + Serialize + Send + Sync {
    fn declared_in(manifest: &Manifest) -> &BTreeMap<String, Self>;

    fn recorded_in(state: &mut State) -> &mut BTreeMap<String, Self>;

    /// Pretty JSON without connector-assigned attributes, for plan output
    fn render(&self) -> String;
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default() + "\n"
}

impl Tracked for AssetModel {
    fn declared_in(manifest: &Manifest) -> &BTreeMap<String, Self> {
        &manifest.assets
    }

    fn recorded_in(state: &mut State) -> &mut BTreeMap<String, Self> {
        &mut state.assets
    }

    fn render(&self) -> String {
        pretty(&self.declared())
    }
}

impl Tracked for PolicyModel {
    fn declared_in(manifest: &Manifest) -> &BTreeMap<String, Self> {
        &manifest.policies
    }

    fn recorded_in(state: &mut State) -> &mut BTreeMap<String, Self> {
        &mut state.policies
    }

    fn render(&self) -> String {
        pretty(&self.declared(false))
    }
}

impl Tracked for ContractDefinitionModel {
    fn declared_in(manifest: &Manifest) -> &BTreeMap<String, Self> {
        &manifest.contract_definitions
    }

    fn recorded_in(state: &mut State) -> &mut BTreeMap<String, Self> {
        &mut state.contract_definitions
    }

    fn render(&self) -> String {
        pretty(&self.declared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attr;

    #[test]
    fn test_render_hides_connector_attributes() {
        let recorded = ContractDefinitionModel {
            id: "cd-1".into(),
            validity: Attr::Value(600),
            created_at: Attr::Value(1),
            ..Default::default()
        };
        let planned = ContractDefinitionModel {
            id: Attr::Unknown,
            created_at: Attr::Unknown,
            ..recorded.clone()
        };
        assert_eq!(recorded.render(), planned.render());
        assert!(!recorded.render().contains("cd-1"));
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edcform.toml");
        std::fs::write(&path, "[assets.raw]\n").unwrap();
        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }
}
