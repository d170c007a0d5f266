use super::traits::ConfigSection;
use crate::error::{check_probability, MoeecError};
use crate::types::{CrossoverMethod, InterClusterMode, SlackVariant, TruncationPolicy};
use serde::{Deserialize, Serialize};

/// Number of clusters the mating scheme is built around.
pub const CLUSTER_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_epoch: usize,
    pub seed: Option<u64>,
    pub selection_method: SelectionMethod,
    pub slack_variant: SlackVariant,
    pub crossover_method: CrossoverMethod,
    pub inter_cluster_mode: InterClusterMode,
    pub length_variation: LengthVariationMode,
    /// Window length (in generations) of the adaptive deciders.
    pub learning_period: usize,
    pub replacement: ReplacementMethod,
    pub truncation_policy: TruncationPolicy,
    pub elite_ratio: f64,
    pub cluster_count: usize,
    pub kmeans_restarts: usize,
    pub kmeans_max_iter: usize,
    /// Fraction of each objective's range under which two values tie.
    pub threshold_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Roulette,
    Best,
    Random,
    BinaryTournament,
    /// Knowledge-guided slack tournament, see `slack_variant`.
    SlackBinaryTournament,
}

/// How the length variation of the intra-cluster pass is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthVariationMode {
    Fixed,
    Variation1,
    Variation2,
    Random,
    EpochBased,
    Adaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementMethod {
    RankingAndCrowding,
    EliteSlackTournament,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            max_epoch: 50,
            seed: None,
            selection_method: SelectionMethod::SlackBinaryTournament,
            slack_variant: SlackVariant::PreferredThenDominance,
            crossover_method: CrossoverMethod::Adaptive,
            inter_cluster_mode: InterClusterMode::HalfPool,
            length_variation: LengthVariationMode::Adaptive,
            learning_period: 5,
            replacement: ReplacementMethod::RankingAndCrowding,
            truncation_policy: TruncationPolicy::Sequential,
            elite_ratio: 0.1,
            cluster_count: CLUSTER_COUNT,
            kmeans_restarts: 10,
            kmeans_max_iter: 300,
            threshold_ratio: 0.005,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), MoeecError> {
        if self.population_size < CLUSTER_COUNT {
            return Err(MoeecError::Configuration(format!(
                "Population size must be at least {}",
                CLUSTER_COUNT
            )));
        }
        if self.cluster_count != CLUSTER_COUNT {
            return Err(MoeecError::Configuration(format!(
                "Cluster count is fixed at {}, got {}",
                CLUSTER_COUNT, self.cluster_count
            )));
        }
        if self.learning_period == 0 {
            return Err(MoeecError::Configuration(
                "Learning period must be at least 1".to_string(),
            ));
        }
        if self.kmeans_restarts == 0 || self.kmeans_max_iter == 0 {
            return Err(MoeecError::Configuration(
                "K-means restarts and iterations must be positive".to_string(),
            ));
        }
        if self.threshold_ratio.is_nan() || self.threshold_ratio < 0.0 {
            return Err(MoeecError::Configuration(
                "Threshold ratio must be non-negative".to_string(),
            ));
        }
        check_probability(self.elite_ratio)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_cluster_count_is_fixed() {
        let config = EvolutionConfig {
            cluster_count: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MoeecError::Configuration(_))));
    }

    #[test]
    fn test_elite_ratio_range() {
        let config = EvolutionConfig {
            elite_ratio: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MoeecError::InvalidProbability(_))));
    }
}
