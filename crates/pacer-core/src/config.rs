use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::event::CategoryHints;
use crate::job::Family;

/// Concurrency knobs for one family, as written by the user.
///
/// Values are kept loosely typed so a hand-edited `"4"` or `"0.5"` still works;
/// `policy::resolve` does the coercion and falls back to safe defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyConcurrency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_delay_seconds: Option<toml::Value>,
}

impl FamilyConcurrency {
    pub fn new(enabled: bool, max_concurrency: i64, launch_delay_seconds: f64) -> Self {
        Self {
            enabled: Some(toml::Value::Boolean(enabled)),
            max_concurrency: Some(toml::Value::Integer(max_concurrency)),
            launch_delay_seconds: Some(toml::Value::Float(launch_delay_seconds)),
        }
    }
}

/// Site-wide limits that may only tighten family settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnforcementOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency_cap: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_delay_seconds_min: Option<toml::Value>,
}

impl EnforcementOverlay {
    pub fn new(enforce: bool, max_concurrency_cap: i64, launch_delay_seconds_min: f64) -> Self {
        Self {
            enforce: Some(toml::Value::Boolean(enforce)),
            max_concurrency_cap: Some(toml::Value::Integer(max_concurrency_cap)),
            launch_delay_seconds_min: Some(toml::Value::Float(launch_delay_seconds_min)),
        }
    }
}

/// `[concurrency]` section: one optional table per family plus the overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiered: Option<FamilyConcurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub independent: Option<FamilyConcurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_dependent: Option<FamilyConcurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_dependent: Option<FamilyConcurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<EnforcementOverlay>,
}

impl ConcurrencyConfig {
    pub fn family(&self, family: Family) -> Option<&FamilyConcurrency> {
        match family {
            Family::Tiered => self.tiered.as_ref(),
            Family::Independent => self.independent.as_ref(),
            Family::FirstDependent => self.first_dependent.as_ref(),
            Family::SecondDependent => self.second_dependent.as_ref(),
        }
    }

    pub fn set_family(&mut self, family: Family, settings: FamilyConcurrency) {
        let slot = match family {
            Family::Tiered => &mut self.tiered,
            Family::Independent => &mut self.independent,
            Family::FirstDependent => &mut self.first_dependent,
            Family::SecondDependent => &mut self.second_dependent,
        };
        *slot = Some(settings);
    }
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_headroom_poll_ms() -> u64 {
    500
}

/// Global configuration loaded from `~/.config/pacer/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacerConfig {
    /// Seconds between heartbeat log lines while a unit runs.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Milliseconds between headroom polls before a dependent family starts.
    #[serde(default = "default_headroom_poll_ms")]
    pub headroom_poll_ms: u64,
    /// Safety margin below the concurrency ceiling; `None` = any slack is enough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_watermark: Option<usize>,
    /// Wait for the secondary tiered batch before returning a unit report.
    #[serde(default)]
    pub await_secondary: bool,
    #[serde(default)]
    pub hints: CategoryHints,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

impl Default for PacerConfig {
    fn default() -> Self {
        let mut concurrency = ConcurrencyConfig::default();
        concurrency.set_family(Family::Tiered, FamilyConcurrency::new(true, 4, 0.5));
        concurrency.set_family(Family::Independent, FamilyConcurrency::new(true, 2, 0.0));
        concurrency.set_family(Family::FirstDependent, FamilyConcurrency::new(true, 2, 1.0));
        concurrency.set_family(Family::SecondDependent, FamilyConcurrency::new(true, 2, 1.0));
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            headroom_poll_ms: default_headroom_poll_ms(),
            low_watermark: Some(1),
            await_secondary: false,
            hints: CategoryHints::default(),
            concurrency,
        }
    }
}

impl PacerConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn headroom_poll_interval(&self) -> Duration {
        Duration::from_millis(self.headroom_poll_ms.max(10))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pacer")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PacerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PacerConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<PacerConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: PacerConfig = toml::from_str(&data)?;
    Ok(cfg)
}
