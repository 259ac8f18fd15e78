use crate::error::{Result, SplitError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub manifest: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registry {
    pub default: String,
    pub models: Vec<RegistryEntry>,
}

const REGISTRY_JSON: &str = include_str!("../../models/registry.json");

/// The registry bundled into the binary.
pub fn bundled_registry() -> Result<Registry> {
    Ok(serde_json::from_str(REGISTRY_JSON)?)
}

impl Registry {
    /// An empty name selects the registry default.
    pub fn resolve(&self, model_name: &str) -> Result<&RegistryEntry> {
        let target = if model_name.is_empty() {
            self.default.as_str()
        } else {
            model_name
        };

        self.models
            .iter()
            .find(|m| m.name == target)
            .ok_or_else(|| SplitError::Registry(format!("Model `{target}` not found in registry")))
    }
}

pub fn resolve_manifest_url(model_name: &str) -> Result<String> {
    let reg = bundled_registry()?;
    let entry = reg.resolve(model_name)?;
    Ok(entry.manifest.clone())
}
