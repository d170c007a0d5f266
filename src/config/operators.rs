use super::traits::ConfigSection;
use crate::error::{check_probability, MoeecError};
use serde::{Deserialize, Serialize};

/// Trigger probabilities and distribution indices of the variation operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub crossover_probability: f64,
    pub gene_crossover_probability: f64,
    pub sbx_distribution_index: f64,
    pub mutation_probability: f64,
    pub gene_mutation_probability: f64,
    pub polynomial_distribution_index: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            crossover_probability: 1.0,
            gene_crossover_probability: 1.0,
            sbx_distribution_index: 20.0,
            mutation_probability: 0.1,
            gene_mutation_probability: 0.5,
            polynomial_distribution_index: 0.2,
        }
    }
}

impl ConfigSection for OperatorConfig {
    fn section_name() -> &'static str {
        "operators"
    }

    fn validate(&self) -> Result<(), MoeecError> {
        check_probability(self.crossover_probability)?;
        check_probability(self.gene_crossover_probability)?;
        check_probability(self.mutation_probability)?;
        check_probability(self.gene_mutation_probability)?;
        let indices = [self.sbx_distribution_index, self.polynomial_distribution_index];
        if indices.iter().any(|eta| eta.is_nan() || *eta < 0.0) {
            return Err(MoeecError::Configuration(
                "Distribution indices must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
