//! Configuration loading
//!
//! Resolution order for the config file:
//! 1. An explicit path (CLI `--config`)
//! 2. `WAYFARER_CONFIG`
//! 3. `~/.config/wayfarer/config.toml` (platform config dir)
//! 4. Embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file won, so a
//! deployment can keep the API key out of the file entirely.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::{BackendKind, GenerationParams, RetryPolicy};
use crate::error::{Error, Result};
use crate::fallback::AllocationTable;
use crate::reconcile::TargetStrategy;

/// Default configuration (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/wayfarer.toml");

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "WAYFARER_CONFIG";

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayfarerConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default = "GenerationParams::plan")]
    pub generation: GenerationParams,
    #[serde(default = "GenerationParams::chat")]
    pub chat_generation: GenerationParams,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "RetryPolicy::no_retry")]
    pub chat_retry: RetryPolicy,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub allocation: AllocationTable,
    #[serde(default)]
    pub pricing: PriceGuide,
    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for WayfarerConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            generation: GenerationParams::plan(),
            chat_generation: GenerationParams::chat(),
            retry: RetryPolicy::default(),
            chat_retry: RetryPolicy::no_retry(),
            budget: BudgetConfig::default(),
            allocation: AllocationTable::default(),
            pricing: PriceGuide::default(),
            server: ServerSettings::default(),
        }
    }
}

/// `[ai]` section: which backend and how to reach it
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub backend: BackendKind,
    pub model: Option<String>,
    pub host: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `[budget]` section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub target: TargetStrategy,
}

/// Inclusive price band in rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: u64,
    pub max: u64,
}

impl PriceBand {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

/// `[pricing]` section: reference prices quoted to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceGuide {
    pub hotel_per_night: PriceBand,
    pub train_per_person: PriceBand,
    pub local_transport_per_day: PriceBand,
    pub food_per_meal: PriceBand,
    pub activity: PriceBand,
}

impl Default for PriceGuide {
    fn default() -> Self {
        Self {
            hotel_per_night: PriceBand::new(800, 3000),
            train_per_person: PriceBand::new(200, 1500),
            local_transport_per_day: PriceBand::new(100, 400),
            food_per_meal: PriceBand::new(150, 800),
            activity: PriceBand::new(0, 1000),
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub allowed_headers: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origin: "*".to_string(),
            allowed_headers: ["authorization", "x-client-info", "apikey", "content-type"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl WayfarerConfig {
    /// Load configuration from disk (or defaults) and apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = load_config(explicit, env_path.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent sections take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// The embedded default configuration
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Apply environment overrides using `lookup` to read variables
    ///
    /// Host and model variables only apply to the backend they name.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.ai.backend = kind,
                Err(e) => tracing::warn!(error = %e, "Ignoring AI_BACKEND"),
            }
        }

        if let Some(key) = get("GEMINI_API_KEY") {
            self.ai.api_key = Some(key);
        }

        let (host_var, model_var) = match self.ai.backend {
            BackendKind::Gemini => ("GEMINI_HOST", "GEMINI_MODEL"),
            BackendKind::Ollama => ("OLLAMA_HOST", "OLLAMA_MODEL"),
            BackendKind::Mock => return,
        };
        if let Some(host) = get(host_var) {
            self.ai.host = Some(host);
        }
        if let Some(model) = get(model_var) {
            self.ai.model = Some(model);
        }
    }

    /// Reject settings that would break budget invariants
    pub fn validate(&self) -> Result<()> {
        self.allocation.validate()?;
        if let TargetStrategy::FractionOfMax(percent) = self.budget.target {
            if percent > 100 {
                return Err(Error::Config(format!(
                    "budget target fraction {}% exceeds 100%",
                    percent
                )));
            }
        }
        Ok(())
    }

    /// Render as TOML (the API key is never written out)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wayfarer").join("config.toml"))
}

/// Pick the config file to read and parse it
///
/// An explicitly named file (argument or environment) must exist; the
/// per-user default is optional.
fn load_config(explicit: Option<&Path>, env_path: Option<&Path>) -> Result<WayfarerConfig> {
    if let Some(path) = explicit.or(env_path) {
        return read_config(path);
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            return read_config(&default_path);
        }
    }

    debug!("No config file found, using embedded defaults");
    WayfarerConfig::embedded()
}

fn read_config(path: &Path) -> Result<WayfarerConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "Loaded config file");
    WayfarerConfig::from_toml(&content)
}
