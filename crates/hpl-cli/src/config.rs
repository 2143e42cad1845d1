use std::path::{Path, PathBuf};

use hpl_core::{EngineConfig, KdfParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HplConfig {
    #[serde(default)]
    pub document: DocumentSection,
    #[serde(default)]
    pub security: SecuritySection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SecuritySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdf_iterations: Option<u32>,
}

impl HplConfig {
    pub fn with_document(path: &Path) -> Self {
        Self {
            document: DocumentSection {
                path: Some(path.to_string_lossy().to_string()),
            },
            security: SecuritySection::default(),
        }
    }

    /// Engine settings for this configuration.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let kdf = match self.security.kdf_iterations {
            Some(iterations) => KdfParams::new(iterations)
                .map_err(|e| anyhow::anyhow!("Invalid [security] kdf_iterations: {}", e))?,
            None => KdfParams::default(),
        };
        Ok(EngineConfig {
            kdf,
            ..EngineConfig::default()
        })
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_document_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("accounts.hpl.xml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<HplConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

/// Read the config file, falling back to defaults when there is none.
pub fn read_config_or_default(path: &Path) -> anyhow::Result<HplConfig> {
    if path.exists() {
        read_config(path)
    } else {
        Ok(HplConfig::default())
    }
}

pub fn write_config(path: &Path, config: &HplConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("hpl"));
        }
    }
    Ok(home_dir()?.join(".config").join("hpl"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("hpl"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("hpl"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
