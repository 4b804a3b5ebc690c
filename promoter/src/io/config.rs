//! Engine configuration stored as TOML (e.g. `promoter.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Engine configuration (TOML).
///
/// Missing fields default to values suitable for local runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the UI, handed to promotion steps for building links.
    pub ui_base_url: String,

    /// Root under which per-promotion working directories are created.
    /// Defaults to `<system temp>/promoter`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir_root: Option<PathBuf>,

    pub promotion: PromotionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromotionConfig {
    /// Consecutive failures tolerated when neither the step nor its runner
    /// declares a threshold.
    pub default_error_threshold: u32,

    /// Step timeout in seconds when neither the step nor its runner declares
    /// one. `0` disables the engine-level timeout.
    pub default_step_timeout_secs: u64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            default_error_threshold: 1,
            default_step_timeout_secs: 0,
        }
    }
}

impl PromotionConfig {
    pub fn default_step_timeout(&self) -> Option<Duration> {
        (self.default_step_timeout_secs > 0)
            .then(|| Duration::from_secs(self.default_step_timeout_secs))
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.promotion.default_error_threshold == 0 {
            return Err(anyhow!("promotion.default_error_threshold must be > 0"));
        }
        if self
            .workdir_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err(anyhow!("workdir_root must not be empty when set"));
        }
        Ok(())
    }

    pub fn workdir_root(&self) -> PathBuf {
        self.workdir_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("promoter"))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
