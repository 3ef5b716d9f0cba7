use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toolgen::loader::DEFAULT_PROVENANCE_BASE_URL;
use toolgen::sync::DEFAULT_MAX_CONCURRENT_FETCHES;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub output: OutputConfig,
    pub references: ReferencesConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root under which `<Tool.Name>/` directories are created.
    pub out_dir: PathBuf,
    pub provenance_base_url: String,
    pub verify_determinism: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            provenance_base_url: DEFAULT_PROVENANCE_BASE_URL.to_string(),
            verify_determinism: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    pub enabled: bool,
    pub fetch_timeout_ms: u64,
    pub max_concurrent_fetches: usize,
    pub user_agent: String,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout_ms: 30000,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReferencesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub fail_fast: bool,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            output: OutputConfig::default(),
            references: ReferencesConfig::default(),
            run: RunConfig::default(),
        }
    }
}

/// A loaded configuration and what happened on the way.
///
/// Loading runs before the logger exists, so the caller reports these.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the configuration was read from; `None` means defaults.
    pub source: Option<PathBuf>,
    /// Fallback files that exist but could not be used, with the reason.
    pub skipped: Vec<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
        if let Some(path) = config_path {
            let config =
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            return Ok(LoadedConfig {
                config,
                source: Some(path.clone()),
                skipped: Vec::new(),
            });
        }

        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));

        Ok(Self::load_first_usable(&candidates))
    }

    /// First existing candidate that parses, else defaults.
    fn load_first_usable(candidates: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();
        for candidate in candidates.iter().filter(|c| c.exists()) {
            match Self::load_from_file(candidate) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(candidate.clone()),
                        skipped,
                    };
                }
                Err(e) => skipped.push(format!("Failed to load config from {}: {:#}", candidate.display(), e)),
            }
        }

        LoadedConfig {
            config: Self::default(),
            source: None,
            skipped,
        }
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }
}
