use super::problem::Problem;
use super::repair::RepairPolicy;
use crate::config::GenomeConfig;
use crate::engines::generation::genome::{GeneBounds, Genome, ModelHandle, ENSEMBLE_WEIGHT, POLY_DEGREE};
use crate::error::{MoeecError, Result};
use rand::{Rng, RngCore};
use rayon::prelude::*;

/// Kernel width fields summarised into a genome signature:
/// poly_gamma, rbf_gamma, laplace_gamma, sigmoid_gamma.
const SIGNATURE_FIELDS: [usize; 4] = [0, 3, 4, 5];
const SIGNATURE_TARGET: [f64; 4] = [0.6, 0.3, 0.5, 0.2];
const ACCURACY_FLOOR: f64 = 0.05;

/// Fitted state attached to each evaluated genome.
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateFit {
    pub signature: [f64; 4],
    pub ensemble_weights: Vec<f64>,
}

/// Cheap deterministic stand-in for the ensemble evaluator.
///
/// Accuracy is the squared distance of the ensemble-weighted kernel widths
/// from a fixed target, plus a term that shrinks with more learners.
/// Diversity depends on the whole population: genomes whose signature is
/// far from everyone else's score lower. Complexity grows with the number
/// of learners and their polynomial degree.
#[derive(Debug, Clone)]
pub struct SurrogateProblem {
    bounds: GeneBounds,
    min_initial_length: usize,
    max_initial_length: usize,
    fixed_length: Option<usize>,
    repair: RepairPolicy,
}

impl Default for SurrogateProblem {
    fn default() -> Self {
        Self::from_config(&GenomeConfig::default())
    }
}

impl SurrogateProblem {
    pub fn from_config(config: &GenomeConfig) -> Self {
        Self {
            bounds: config.bounds,
            min_initial_length: config.min_initial_length,
            max_initial_length: config.max_initial_length,
            fixed_length: config.fixed_length,
            repair: RepairPolicy::from_config(config),
        }
    }

    fn fit(genome: &Genome) -> SurrogateFit {
        let weights: Vec<f64> = genome.rows().iter().map(|row| row[ENSEMBLE_WEIGHT]).collect();
        let total: f64 = weights.iter().sum();
        let weights: Vec<f64> = if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / genome.k() as f64; genome.k()]
        };

        let mut signature = [0.0; 4];
        for (row, w) in genome.rows().iter().zip(&weights) {
            for (slot, &field) in signature.iter_mut().zip(SIGNATURE_FIELDS.iter()) {
                *slot += w * row[field];
            }
        }
        SurrogateFit {
            signature,
            ensemble_weights: weights,
        }
    }
}

fn distance(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

impl Problem for SurrogateProblem {
    fn name(&self) -> &str {
        "surrogate"
    }

    fn evaluate(&self, population: &mut [Genome]) -> Result<()> {
        let fits: Vec<SurrogateFit> = population.par_iter().map(Self::fit).collect();
        let signatures: Vec<[f64; 4]> = fits.iter().map(|f| f.signature).collect();

        population
            .par_iter_mut()
            .zip(fits.into_par_iter())
            .enumerate()
            .try_for_each(|(i, (genome, fit))| {
                let accuracy = ACCURACY_FLOOR
                    + distance(&fit.signature, &SIGNATURE_TARGET).powi(2)
                    + 0.5 / (genome.k() as f64 + 1.0);

                let others = signatures.len().saturating_sub(1);
                let spread = if others == 0 {
                    0.0
                } else {
                    signatures
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, s)| distance(&fit.signature, s))
                        .sum::<f64>()
                        / others as f64
                };
                let diversity = 1.0 / (1.0 + spread);

                let complexity = genome
                    .rows()
                    .iter()
                    .map(|row| 1.0 + row[POLY_DEGREE] / 10.0)
                    .sum::<f64>();

                let objectives = [accuracy, diversity, complexity];
                if objectives.iter().any(|v| !v.is_finite()) {
                    return Err(MoeecError::Evaluation(format!(
                        "non-finite objectives {:?} for genome {}",
                        objectives, i
                    )));
                }
                genome.set_objectives(objectives);
                genome.set_model(ModelHandle::new(fit));
                Ok(())
            })
    }

    fn fix_solution(&self, genome: Genome, rng: &mut dyn RngCore) -> Result<Genome> {
        self.repair.repair(genome, rng)
    }

    fn create_solution(&self, rng: &mut dyn RngCore) -> Result<Genome> {
        let k = match self.fixed_length {
            Some(k) => k,
            None => rng.gen_range(self.min_initial_length..=self.max_initial_length),
        };
        let rows = (0..k).map(|_| self.bounds.sample_row(rng)).collect();
        self.repair.repair(Genome::new(rows)?, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_evaluate_is_deterministic_and_positive() {
        let problem = SurrogateProblem::default();
        let mut rng = StdRng::seed_from_u64(10);
        let mut population: Vec<Genome> = (0..8)
            .map(|_| problem.create_solution(&mut rng).unwrap())
            .collect();
        problem.evaluate(&mut population).unwrap();
        let first: Vec<[f64; 3]> = population.iter().map(|g| g.objectives().unwrap()).collect();

        problem.evaluate(&mut population).unwrap();
        let second: Vec<[f64; 3]> = population.iter().map(|g| g.objectives().unwrap()).collect();

        assert_eq!(first, second);
        assert!(first.iter().flatten().all(|&v| v > 0.0));
        assert!(population
            .iter()
            .all(|g| g.model().and_then(|m| m.downcast_ref::<SurrogateFit>()).is_some()));
    }

    #[test]
    fn test_create_solution_respects_length_policy() {
        let mut config = GenomeConfig::default();
        config.min_initial_length = 2;
        config.max_initial_length = 4;
        let problem = SurrogateProblem::from_config(&config);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let k = problem.create_solution(&mut rng).unwrap().k();
            assert!((2..=4).contains(&k));
        }

        config.fixed_length = Some(6);
        let fixed = SurrogateProblem::from_config(&config);
        assert_eq!(fixed.create_solution(&mut rng).unwrap().k(), 6);
    }

    #[test]
    fn test_single_genome_has_unit_diversity() {
        let problem = SurrogateProblem::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut population = vec![problem.create_solution(&mut rng).unwrap()];
        problem.evaluate(&mut population).unwrap();
        assert_eq!(population[0].objective(crate::types::Objective::Diversity).unwrap(), 1.0);
    }
}
