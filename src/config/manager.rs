use super::{
    evolution::EvolutionConfig, genome::GenomeConfig, operators::OperatorConfig,
    traits::ConfigSection,
};
use crate::error::MoeecError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `MOEEC__EVOLUTION__MAX_EPOCH=10`.
pub const ENV_PREFIX: &str = "MOEEC";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub operators: OperatorConfig,
    pub genome: GenomeConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), MoeecError> {
        self.evolution.validate()?;
        self.operators.validate()?;
        self.genome.validate()?;
        Ok(())
    }

    pub fn section_names() -> [&'static str; 3] {
        [
            EvolutionConfig::section_name(),
            OperatorConfig::section_name(),
            GenomeConfig::section_name(),
        ]
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self, MoeecError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| MoeecError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML file layered with `MOEEC__SECTION__FIELD` environment
    /// overrides, then validate.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MoeecError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MoeecError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MoeecError::Configuration(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());

        *self.write_lock()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MoeecError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| MoeecError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, MoeecError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| MoeecError::Configuration("config lock poisoned".to_string()))
    }

    /// Apply `f` and keep the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), MoeecError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.write_lock()?;
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, MoeecError> {
        self.config
            .write()
            .map_err(|_| MoeecError::Configuration("config lock poisoned".to_string()))
    }
}
