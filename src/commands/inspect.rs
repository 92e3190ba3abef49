//! Read-only commands: validate, get and schema

use anyhow::{Context as AnyhowContext, Result};
use declarative::ResourceKind;
use serde::Serialize;
use std::collections::BTreeSet;

use super::{connect, load_manifest};
use crate::Context;
use crate::config;
use crate::manifest::Manifest;
use crate::resources::{self, AssetResource, ContractDefinitionResource, Kind, PolicyResource};
use crate::ui;

/// Check the manifest and the provider configuration
pub fn validate(ctx: &Context) -> Result<()> {
    let manifest = load_manifest(&ctx.manifest_path)?;

    for warning in reference_warnings(&manifest) {
        ui::warn(&warning);
    }

    if let Err(diagnostics) = config::resolve(&manifest.provider, |name| std::env::var(name).ok())
    {
        ui::diagnostics(Some("provider"), &diagnostics);
        anyhow::bail!("Provider configuration is incomplete");
    }

    if manifest.is_empty() {
        ui::warn("The manifest declares no resources");
    }

    ui::success(&format!("{} is valid", ctx.manifest_path.display()));
    if !ctx.quiet {
        ui::kv("assets", &manifest.assets.len().to_string());
        ui::kv("policies", &manifest.policies.len().to_string());
        ui::kv(
            "contract definitions",
            &manifest.contract_definitions.len().to_string(),
        );
    }
    Ok(())
}

/// Contract definitions pointing at policy ids no declared policy carries
///
/// The referenced policy may exist on the connector already, so these are
/// warnings only.
fn reference_warnings(manifest: &Manifest) -> Vec<String> {
    let declared: BTreeSet<&str> = manifest
        .policies
        .values()
        .filter_map(|policy| policy.id.value().map(String::as_str))
        .collect();

    let mut warnings = Vec::new();
    for (name, definition) in &manifest.contract_definitions {
        for (attribute, id) in [
            ("access_policy_id", &definition.access_policy_id),
            ("contract_policy_id", &definition.contract_policy_id),
        ] {
            if let Some(id) = id.value()
                && !declared.contains(id.as_str())
            {
                warnings.push(format!(
                    "contract_definition.{name}: {attribute} \"{id}\" is not declared by any policy in this manifest"
                ));
            }
        }
    }
    warnings
}

/// Look up a remote record by identifier and print it as JSON
pub fn get(ctx: &Context, kind: Kind, id: &str) -> Result<()> {
    let manifest = if ctx.manifest_path.exists() {
        load_manifest(&ctx.manifest_path)?
    } else {
        log::debug!(
            "{} not found, using environment for the provider",
            ctx.manifest_path.display()
        );
        Manifest::default()
    };
    let client = connect(&manifest.provider)?;

    let rendered = match kind {
        Kind::Asset => lookup_json(&AssetResource::new(&client), id)?,
        Kind::Policy => lookup_json(&PolicyResource::new(&client), id)?,
        Kind::ContractDefinition => lookup_json(&ContractDefinitionResource::new(&client), id)?,
    };
    println!("{rendered}");
    Ok(())
}

fn lookup_json<K>(kind: &K, id: &str) -> Result<String>
where
    K: ResourceKind,
    K::Record: Serialize,
{
    match resources::lookup(kind, id) {
        Ok(record) => serde_json::to_string_pretty(&record).context("Failed to render record"),
        Err(failure) => {
            let address = format!("{}.{id}", kind.type_name());
            ui::diagnostic(Some(address.as_str()), &failure.to_diagnostic());
            anyhow::bail!("Lookup of {} {id} failed", kind.type_name())
        }
    }
}

/// Print the schema of a resource kind
pub fn schema(kind: Kind) -> Result<()> {
    let schema = kind.schema();
    log::debug!("{} schema nests {} levels deep", kind.type_name(), schema.depth());
    let rendered =
        serde_json::to_string_pretty(&schema.to_json()).context("Failed to render schema")?;
    println!("{rendered}");
    Ok(())
}
