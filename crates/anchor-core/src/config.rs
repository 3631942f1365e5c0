//! Configuration for graph construction.
//!
//! Load order: `.anchor/config.toml` → environment variables → defaults.

use crate::graph::BuildOptions;
use crate::node_set::GroupMergePolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub build: BuildConfig,
}

/// Graph construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Field whose value becomes the anchor node of each record.
    pub root_name: String,
    /// Fields resolved into branch nodes and wired to the roots.
    pub branch_names: Vec<String>,
    /// Merge behavior when a root value recurs in another group.
    pub root_groups: GroupMergePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_name: "id".to_string(),
            branch_names: Vec::new(),
            root_groups: GroupMergePolicy::Union,
        }
    }
}

impl BuildConfig {
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            root_groups: self.root_groups,
        }
    }

    /// Apply command-line overrides and validate the result.
    ///
    /// An empty `branch_names` keeps the configured branch list.
    pub fn with_overrides(&self, root_name: Option<&str>, branch_names: &[String]) -> Result<Self> {
        let mut build = self.clone();
        if let Some(root) = root_name {
            build.root_name = root.to_string();
        }
        if !branch_names.is_empty() {
            build.branch_names = branch_names.to_vec();
        }
        build.validate()?;
        Ok(build)
    }

    /// Check that the root and branch fields are usable together.
    pub fn validate(&self) -> Result<()> {
        if self.root_name.trim().is_empty() {
            anyhow::bail!("root_name must not be empty");
        }
        if self.branch_names.iter().any(|b| *b == self.root_name) {
            anyhow::bail!(
                "root field `{}` cannot also be a branch field",
                self.root_name
            );
        }
        Ok(())
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

/// Split a comma-separated list, dropping empty entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl AnchorConfig {
    /// Load config from `.anchor/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".anchor").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("ANCHOR_ROOT_NAME", &mut config.build.root_name);
        env_override("ANCHOR_ROOT_GROUPS", &mut config.build.root_groups);
        if let Ok(raw) = std::env::var("ANCHOR_BRANCH_NAMES") {
            config.build.branch_names = split_list(&raw);
        }

        config.build.validate()?;
        Ok(config)
    }
}
