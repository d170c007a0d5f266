use super::traits::ConfigSection;
use crate::engines::generation::genome::GeneBounds;
use crate::error::MoeecError;
use serde::{Deserialize, Serialize};

/// Length policy and field bounds of the chromosomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    pub min_initial_length: usize,
    pub max_initial_length: usize,
    pub max_length: usize,
    /// When set every genome keeps exactly this many rows.
    pub fixed_length: Option<usize>,
    pub bounds: GeneBounds,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            min_initial_length: 1,
            max_initial_length: 20,
            max_length: 40,
            fixed_length: None,
            bounds: GeneBounds::default(),
        }
    }
}

impl ConfigSection for GenomeConfig {
    fn section_name() -> &'static str {
        "genome"
    }

    fn validate(&self) -> Result<(), MoeecError> {
        self.bounds.validate()?;
        if self.min_initial_length == 0 || self.min_initial_length > self.max_initial_length {
            return Err(MoeecError::Configuration(format!(
                "Initial length range {}..={} is empty or starts at zero",
                self.min_initial_length, self.max_initial_length
            )));
        }
        if self.max_initial_length > self.max_length {
            return Err(MoeecError::Configuration(
                "Initial length cannot exceed the maximum length".to_string(),
            ));
        }
        if self.fixed_length == Some(0) {
            return Err(MoeecError::Configuration(
                "Fixed length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
