//! Runtime configuration from environment variables.

use std::path::PathBuf;

use anyhow::Result;

use crate::manifest::ValidatorConfig;
use crate::patterns::{PatternConfig, TrackedMetric};

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Directory scanned for project manifests.
    pub manifest_dir: PathBuf,
    pub validator: ValidatorConfig,
    pub patterns: PatternConfig,
}

impl HubConfig {
    /// Load configuration from environment variables.
    ///
    /// - `FOUNDRY_HUB_DIR` — manifest directory (default: the platform data
    ///   directory, e.g. `~/.local/share/foundry-hub/projects`)
    /// - `FOUNDRY_HUB_ALLOWED_TYPES` — comma-separated project-type
    ///   allow-list; unset leaves the taxonomy open
    /// - `FOUNDRY_HUB_PATTERN_THRESHOLD` — improvement fraction (default 0.25)
    /// - `FOUNDRY_HUB_PATTERN_METRIC` — `completion_rate`, `revenue_per_user`,
    ///   or `revenue` (default `completion_rate`)
    pub fn from_env() -> Result<Self> {
        let manifest_dir = match std::env::var("FOUNDRY_HUB_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_manifest_dir()?,
        };

        let allowed_types = std::env::var("FOUNDRY_HUB_ALLOWED_TYPES")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty());

        let threshold = std::env::var("FOUNDRY_HUB_PATTERN_THRESHOLD")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or_else(|| PatternConfig::default().threshold);

        let metric = std::env::var("FOUNDRY_HUB_PATTERN_METRIC")
            .ok()
            .and_then(|s| TrackedMetric::from_str(&s))
            .unwrap_or_else(|| PatternConfig::default().metric);

        Ok(Self {
            manifest_dir,
            validator: ValidatorConfig { allowed_types },
            patterns: PatternConfig { threshold, metric },
        })
    }
}

fn default_manifest_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "foundry-hub")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("projects"))
}
