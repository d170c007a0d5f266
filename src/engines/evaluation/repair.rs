use crate::config::GenomeConfig;
use crate::engines::generation::genome::{Genome, ENSEMBLE_WEIGHT, KERNEL_WEIGHTS, POLY_DEGREE};
use crate::error::Result;
use rand::seq::index;
use rand::Rng;

/// Post-operator repair shared by problem implementations.
///
/// - oversized chromosomes keep a random subset of `max_length` rows
///   (variable-length mode only)
/// - `poly_degree` is rounded to an integer
/// - `w1..w5` are normalized within each row, `W` across rows
#[derive(Debug, Clone)]
pub struct RepairPolicy {
    max_length: usize,
    fixed_length: bool,
}

impl RepairPolicy {
    pub fn new(max_length: usize, fixed_length: bool) -> Self {
        Self {
            max_length,
            fixed_length,
        }
    }

    pub fn from_config(config: &GenomeConfig) -> Self {
        Self::new(config.max_length, config.fixed_length.is_some())
    }

    pub fn repair<R: Rng + ?Sized>(&self, mut genome: Genome, rng: &mut R) -> Result<Genome> {
        if !self.fixed_length && genome.k() > self.max_length {
            let keep: Vec<_> = index::sample(rng, genome.k(), self.max_length)
                .into_iter()
                .map(|i| genome.rows()[i])
                .collect();
            log::debug!("truncating genome from {} to {} rows", genome.k(), keep.len());
            genome.set_rows(keep)?;
        }

        let rows = genome.rows_mut();
        for row in rows.iter_mut() {
            row[POLY_DEGREE] = row[POLY_DEGREE].round_ties_even();

            let weights = &mut row[KERNEL_WEIGHTS];
            normalize(weights);
        }

        let mut ensemble: Vec<f64> = rows.iter().map(|row| row[ENSEMBLE_WEIGHT]).collect();
        normalize(&mut ensemble);
        for (row, w) in rows.iter_mut().zip(ensemble) {
            row[ENSEMBLE_WEIGHT] = w;
        }

        Ok(genome)
    }
}

/// Scale to unit sum; a zero (or non-finite) sum becomes uniform.
fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 && total.is_finite() {
        values.iter_mut().for_each(|v| *v /= total);
    } else {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::genome::GeneBounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genome(k: usize, rng: &mut StdRng) -> Genome {
        let bounds = GeneBounds::default();
        Genome::new((0..k).map(|_| bounds.sample_row(rng)).collect()).unwrap()
    }

    #[test]
    fn test_weights_normalized() {
        let mut rng = StdRng::seed_from_u64(2);
        let fixed = RepairPolicy::new(40, false).repair(genome(5, &mut rng), &mut rng).unwrap();

        for row in fixed.rows() {
            let sum: f64 = row[KERNEL_WEIGHTS].iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert_eq!(row[POLY_DEGREE], row[POLY_DEGREE].round());
        }
        let total: f64 = fixed.rows().iter().map(|r| r[ENSEMBLE_WEIGHT]).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_become_uniform() {
        let mut row = GeneBounds::default().low;
        row[POLY_DEGREE] = 2.5;
        let mut rng = StdRng::seed_from_u64(0);
        let fixed = RepairPolicy::new(40, false)
            .repair(Genome::new(vec![row, row]).unwrap(), &mut rng)
            .unwrap();
        assert!(fixed.rows()[0][KERNEL_WEIGHTS].iter().all(|&w| (w - 0.2).abs() < 1e-12));
        assert!(fixed.rows().iter().all(|r| (r[ENSEMBLE_WEIGHT] - 0.5).abs() < 1e-12));
        // ties round to even
        assert_eq!(fixed.rows()[0][POLY_DEGREE], 2.0);
    }

    #[test]
    fn test_truncation_only_in_variable_mode() {
        let mut rng = StdRng::seed_from_u64(5);
        let long = genome(12, &mut rng);
        let truncated = RepairPolicy::new(8, false).repair(long.clone(), &mut rng).unwrap();
        assert_eq!(truncated.k(), 8);
        let kept = RepairPolicy::new(8, true).repair(long, &mut rng).unwrap();
        assert_eq!(kept.k(), 12);
    }

    #[test]
    fn test_idempotent() {
        let mut rng = StdRng::seed_from_u64(9);
        let policy = RepairPolicy::new(40, false);
        let once = policy.repair(genome(6, &mut rng), &mut rng).unwrap();
        let twice = policy.repair(once.clone(), &mut rng).unwrap();
        for (a, b) in once.rows().iter().zip(twice.rows()) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }
}
