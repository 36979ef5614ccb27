use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use super::collections::BTreeMap;
use crate::layout_engine::WORKSPACES;

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tiley")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Strategy used by every workspace without an override.
    #[serde(default)]
    pub mode: LayoutMode,
    /// Cosmetic inset applied on every side of a tiled window. It does not
    /// change how space is partitioned between siblings.
    #[serde(default = "default_window_gap")]
    pub window_gap: i32,
    /// Floor for the width and height a tiled window is configured with.
    #[serde(default = "default_min_window_size")]
    pub min_window_size: i32,
    #[serde(default = "default_split_ratio")]
    pub default_split_ratio: f32,
    #[serde(default)]
    pub grid: GridSettings,
}

/// Layout strategy.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Binary split tiling.
    #[default]
    Dynamic,
    /// Fixed-capacity grid placement.
    Grid,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GridSettings {
    #[serde(default = "default_grid_side")]
    pub rows: u32,
    #[serde(default = "default_grid_side")]
    pub columns: u32,
    #[serde(default)]
    pub flow: GridFlow,
}

/// Order in which grid cells are handed out.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridFlow {
    /// Left to right, then top to bottom.
    #[default]
    Horizontal,
    /// Top to bottom, then left to right.
    Vertical,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Display names, index-aligned with workspaces. Missing names fall back
    /// to the 1-based workspace number.
    #[serde(default)]
    pub names: Vec<String>,
    /// Per-workspace strategy overrides keyed by workspace index.
    #[serde(default, with = "index_keys")]
    pub modes: BTreeMap<usize, LayoutMode>,
}

/// TOML table keys are always strings; workspace indices are stored as
/// their decimal form.
mod index_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{BTreeMap, LayoutMode};

    pub fn serialize<S: Serializer>(
        modes: &BTreeMap<usize, LayoutMode>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, LayoutMode> =
            modes.iter().map(|(index, mode)| (index.to_string(), *mode)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<usize, LayoutMode>, D::Error> {
        BTreeMap::<String, LayoutMode>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, mode)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, mode))
                    .map_err(|_| D::Error::custom(format!("invalid workspace index `{key}`")))
            })
            .collect()
    }
}

fn default_window_gap() -> i32 { 5 }
fn default_min_window_size() -> i32 { 50 }
fn default_split_ratio() -> f32 { 0.5 }
fn default_grid_side() -> u32 { 4 }

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            window_gap: default_window_gap(),
            min_window_size: default_min_window_size(),
            default_split_ratio: default_split_ratio(),
            grid: GridSettings::default(),
        }
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            rows: default_grid_side(),
            columns: default_grid_side(),
            flow: GridFlow::default(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.window_gap < 0 {
            issues.push(format!("window_gap must not be negative (got {})", self.window_gap));
        }
        if self.min_window_size < 1 {
            issues.push(format!(
                "min_window_size must be at least 1 (got {})",
                self.min_window_size
            ));
        }
        if !(self.default_split_ratio > 0.0 && self.default_split_ratio < 1.0) {
            issues.push(format!(
                "default_split_ratio must be between 0 and 1 exclusive (got {})",
                self.default_split_ratio
            ));
        }

        issues.extend(self.grid.validate());

        issues
    }
}

impl GridSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.rows == 0 {
            issues.push("grid.rows must be at least 1".to_string());
        }
        if self.columns == 0 {
            issues.push("grid.columns must be at least 1".to_string());
        }
        issues
    }

    pub fn capacity(&self) -> usize { self.rows as usize * self.columns as usize }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.names.len() > WORKSPACES {
            issues.push(format!(
                "{} workspace names given but there are only {} workspaces",
                self.names.len(),
                WORKSPACES
            ));
        }
        for &index in self.modes.keys() {
            if index >= WORKSPACES {
                issues.push(format!(
                    "layout override for workspace {index} is out of range (0..{WORKSPACES})"
                ));
            }
        }
        issues
    }

    pub fn name(&self, index: usize) -> String {
        self.names
            .get(index)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| (index + 1).to_string())
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("{e}"),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.workspaces.validate());
        issues
    }

    /// Strategy for a given workspace, honouring per-workspace overrides.
    pub fn mode_for(&self, workspace: usize) -> LayoutMode {
        self.workspaces.modes.get(&workspace).copied().unwrap_or(self.layout.mode)
    }
}
