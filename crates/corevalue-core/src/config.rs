use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ranking::{DEFAULT_ALPHA, RankingMode};

/// File name of the per-directory config.
pub const PROJECT_CONFIG_FILE: &str = "corevalue.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    #[default]
    Degree,
    Transitive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub mode: ModeName,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            mode: ModeName::default(),
            alpha: default_alpha(),
        }
    }
}

impl RankingConfig {
    /// Resolve the configured strategy, applying optional overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective alpha lies outside `(0, 1]`.
    pub fn resolve(&self, mode: Option<ModeName>, alpha: Option<f64>) -> Result<RankingMode> {
        match mode.unwrap_or(self.mode) {
            ModeName::Degree => Ok(RankingMode::Degree),
            ModeName::Transitive => {
                let alpha = validate_alpha(alpha.unwrap_or(self.alpha))?;
                Ok(RankingMode::Transitive { alpha })
            }
        }
    }
}

/// Per-session settings.
///
/// Sessions are always checkpointed after every recorded comparison; there is
/// no switch for it, so an interrupt never loses more than the pending answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_true")]
    pub show_descriptions: bool,
    /// Number of comparisons per session; `n * n` when unset.
    #[serde(default)]
    pub rounds: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            show_descriptions: default_true(),
            rounds: None,
            max_retries: default_max_retries(),
        }
    }
}

impl SessionConfig {
    /// Comparisons to run for `items` values.
    #[must_use]
    pub fn rounds_for(&self, items: usize) -> usize {
        self.rounds.unwrap_or(items * items)
    }
}

/// Reject decay factors outside `(0, 1]`.
///
/// # Errors
///
/// Returns an error naming the offending value.
pub fn validate_alpha(alpha: f64) -> Result<f64> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(alpha)
    } else {
        bail!("alpha must be in (0, 1], got {alpha}")
    }
}

/// Location of the per-user config file, if the platform has one.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("corevalue/config.toml"))
}

/// Load config for `workdir`.
///
/// `<workdir>/corevalue.toml` wins over the user config; defaults apply when
/// neither exists.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed,
/// or if it sets an invalid alpha.
pub fn load_config(workdir: &Path) -> Result<Config> {
    load_config_from(&workdir.join(PROJECT_CONFIG_FILE), user_config_path().as_deref())
}

fn load_config_from(project: &Path, user: Option<&Path>) -> Result<Config> {
    let path = if project.exists() {
        project
    } else if let Some(user) = user.filter(|p| p.exists()) {
        user
    } else {
        return Ok(Config::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    validate_alpha(config.ranking.alpha)
        .with_context(|| format!("Invalid [ranking] alpha in {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

const fn default_true() -> bool {
    true
}

const fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

const fn default_max_retries() -> u32 {
    5
}
