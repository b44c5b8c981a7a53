//! YAML configuration: render defaults and named input profiles.
//!
//! ```yaml
//! render:
//!   layout: tb
//!   detail: medium
//!   palette:
//!     hard: darkred
//! profiles:
//!   shop:
//!     input: /srv/dumps/shop.sql.gz
//!     database_name: shop
//!     soft_fk_detector: target-table-name-us-id
//! ```

use crate::graph::{Detail, Layout, Palette};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Render settings applied when the command line does not override them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    pub layout: Layout,
    pub detail: Detail,
    pub palette: Palette,
}

/// A named input to load the entity model from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Schema dump path
    pub input: Option<PathBuf>,
    /// Database name shown in output (defaults to the dump's file stem)
    pub database_name: Option<String>,
    /// Soft foreign key detector to apply
    pub soft_fk_detector: Option<String>,
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbviewConfig {
    pub render: RenderDefaults,
    pub profiles: BTreeMap<String, Profile>,
}

impl DbviewConfig {
    /// `<config_dir>/dbview/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dbview").join("config.yaml"))
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DbviewConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write configuration, creating parent directories
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Profile names in sorted order
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn add_profile(&mut self, name: &str, profile: Profile) -> anyhow::Result<()> {
        if self.profiles.contains_key(name) {
            bail!("Profile already exists: {}", name);
        }
        self.profiles.insert(name.to_string(), profile);
        Ok(())
    }

    /// Merge the set fields of `changes` into an existing profile
    pub fn update_profile(&mut self, name: &str, changes: Profile) -> anyhow::Result<()> {
        let Some(profile) = self.profiles.get_mut(name) else {
            bail!("Unknown profile: {}", name);
        };
        if changes.input.is_some() {
            profile.input = changes.input;
        }
        if changes.database_name.is_some() {
            profile.database_name = changes.database_name;
        }
        if changes.soft_fk_detector.is_some() {
            profile.soft_fk_detector = changes.soft_fk_detector;
        }
        Ok(())
    }

    pub fn remove_profile(&mut self, name: &str) -> anyhow::Result<Profile> {
        match self.profiles.remove(name) {
            Some(profile) => Ok(profile),
            None => bail!("Unknown profile: {}", name),
        }
    }
}
