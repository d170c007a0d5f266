use crate::config::OperatorConfig;
use crate::engines::generation::genome::{GeneBounds, GeneRow, Genome, GENE_WIDTH};
use crate::error::{check_probability, MoeecError, Result};
use crate::types::{GeneCrossover, LengthVariation};
use rand::seq::SliceRandom;
use rand::Rng;

/// Parent values closer than this are treated as identical.
const SBX_EPS: f64 = 1.0e-14;

/// Simulated binary crossover on a pair of aligned gene rows.
#[derive(Debug, Clone)]
pub struct SbxCrossover {
    bounds: GeneBounds,
    probability: f64,
    distribution_index: f64,
}

impl SbxCrossover {
    pub fn new(bounds: GeneBounds, probability: f64, distribution_index: f64) -> Result<Self> {
        check_probability(probability)?;
        if distribution_index.is_nan() || distribution_index < 0.0 {
            return Err(MoeecError::InvalidInput(format!(
                "SBX distribution index is negative: {}",
                distribution_index
            )));
        }
        Ok(Self {
            bounds,
            probability,
            distribution_index,
        })
    }

    pub fn execute<R: Rng + ?Sized>(&self, mut a: GeneRow, mut b: GeneRow, rng: &mut R) -> (GeneRow, GeneRow) {
        for i in 0..GENE_WIDTH {
            if rng.gen::<f64>() > self.probability {
                continue;
            }
            let (x1, x2) = (a[i], b[i]);
            if (x1 - x2).abs() <= SBX_EPS {
                continue;
            }

            let (y1, y2) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
            let (lower, upper) = (self.bounds.low[i], self.bounds.high[i]);
            let rand = rng.gen::<f64>();

            let beta = 1.0 + 2.0 * (y1 - lower) / (y2 - y1);
            let c1 = 0.5 * (y1 + y2 - self.spread(beta, rand) * (y2 - y1));

            let beta = 1.0 + 2.0 * (upper - y2) / (y2 - y1);
            let c2 = 0.5 * (y1 + y2 + self.spread(beta, rand) * (y2 - y1));

            let (c1, c2) = (self.bounds.clip(i, c1), self.bounds.clip(i, c2));
            if rng.gen::<f64>() <= 0.5 {
                a[i] = c2;
                b[i] = c1;
            } else {
                a[i] = c1;
                b[i] = c2;
            }
        }
        (a, b)
    }

    fn spread(&self, beta: f64, rand: f64) -> f64 {
        let exponent = 1.0 / (self.distribution_index + 1.0);
        let alpha = 2.0 - beta.powf(-(self.distribution_index + 1.0));
        if rand <= 1.0 / alpha {
            (rand * alpha).powf(exponent)
        } else {
            (1.0 / (2.0 - rand * alpha)).powf(exponent)
        }
    }
}

/// Exchanges two whole rows with a fixed probability.
#[derive(Debug, Clone)]
pub struct SwapCrossover {
    probability: f64,
}

impl SwapCrossover {
    pub fn new(probability: f64) -> Result<Self> {
        Ok(Self {
            probability: check_probability(probability)?,
        })
    }

    pub fn execute<R: Rng + ?Sized>(&self, a: GeneRow, b: GeneRow, rng: &mut R) -> (GeneRow, GeneRow) {
        if rng.gen::<f64>() <= self.probability {
            (b, a)
        } else {
            (a, b)
        }
    }
}

/// Recombination of two genomes with different row counts.
///
/// The shorter parent is aligned with a random subset of the longer parent's
/// rows, the aligned pairs go through the gene crossover, and the leftover
/// rows are placed according to the length variation:
/// - `Fixed` appends them back to the longer child, so lengths are kept
/// - `Variation1` pools every row, shuffles and splits at a random point
/// - `Variation2` sends each leftover row to either child with p = 0.5
///
/// Children come back as (shorter parent's child, longer parent's child).
#[derive(Debug, Clone)]
pub struct VariableLengthCrossover {
    probability: f64,
    sbx: SbxCrossover,
    swap: SwapCrossover,
}

impl VariableLengthCrossover {
    pub fn new(
        probability: f64,
        gene_crossover_probability: f64,
        distribution_index: f64,
        bounds: GeneBounds,
    ) -> Result<Self> {
        Ok(Self {
            probability: check_probability(probability)?,
            sbx: SbxCrossover::new(bounds, gene_crossover_probability, distribution_index)?,
            swap: SwapCrossover::new(0.5)?,
        })
    }

    pub fn from_config(config: &OperatorConfig, bounds: GeneBounds) -> Result<Self> {
        Self::new(
            config.crossover_probability,
            config.gene_crossover_probability,
            config.sbx_distribution_index,
            bounds,
        )
    }

    pub fn execute<R: Rng + ?Sized>(
        &self,
        first: Genome,
        second: Genome,
        variation: LengthVariation,
        gene_crossover: GeneCrossover,
        rng: &mut R,
    ) -> Result<(Genome, Genome)> {
        if rng.gen::<f64>() > self.probability {
            return Ok((first, second));
        }

        let (mut shorter, mut longer) = if first.k() < second.k() {
            (first, second)
        } else {
            (second, first)
        };
        let k1 = shorter.k();

        let mut order: Vec<usize> = (0..longer.k()).collect();
        order.shuffle(rng);
        let mut a: Vec<GeneRow> = shorter.rows().to_vec();
        let mut b1: Vec<GeneRow> = order[..k1].iter().map(|&i| longer.rows()[i]).collect();
        let b2: Vec<GeneRow> = order[k1..].iter().map(|&i| longer.rows()[i]).collect();

        for (row_a, row_b) in a.iter_mut().zip(b1.iter_mut()) {
            let (x, y) = self.cross_rows(*row_a, *row_b, gene_crossover, rng);
            *row_a = x;
            *row_b = y;
        }

        match variation {
            LengthVariation::Fixed => b1.extend(b2),
            LengthVariation::Variation1 => {
                let mut pooled = a;
                pooled.extend(b1);
                pooled.extend(b2);
                pooled.shuffle(rng);
                let split = rng.gen_range(1..pooled.len());
                b1 = pooled.split_off(split);
                a = pooled;
            }
            LengthVariation::Variation2 => {
                for row in b2 {
                    if rng.gen::<f64>() <= 0.5 {
                        a.push(row);
                    } else {
                        b1.push(row);
                    }
                }
            }
        }

        shorter.set_rows(a)?;
        longer.set_rows(b1)?;
        Ok((shorter, longer))
    }

    fn cross_rows<R: Rng + ?Sized>(
        &self,
        a: GeneRow,
        b: GeneRow,
        gene_crossover: GeneCrossover,
        rng: &mut R,
    ) -> (GeneRow, GeneRow) {
        match gene_crossover {
            GeneCrossover::Sbx => self.sbx.execute(a, b, rng),
            GeneCrossover::Swap => self.swap.execute(a, b, rng),
            GeneCrossover::Nothing => (a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_genome(k: usize, rng: &mut StdRng) -> Genome {
        let bounds = GeneBounds::default();
        Genome::new((0..k).map(|_| bounds.sample_row(rng)).collect()).unwrap()
    }

    fn crossover() -> VariableLengthCrossover {
        VariableLengthCrossover::new(1.0, 1.0, 20.0, GeneBounds::default()).unwrap()
    }

    fn sorted_rows(rows: &[GeneRow]) -> Vec<GeneRow> {
        let mut rows = rows.to_vec();
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
        rows
    }

    #[test]
    fn test_fixed_nothing_keeps_lengths_and_rows() {
        let mut rng = StdRng::seed_from_u64(17);
        let short = random_genome(2, &mut rng);
        let long = random_genome(5, &mut rng);

        let (c1, c2) = crossover()
            .execute(long.clone(), short.clone(), LengthVariation::Fixed, GeneCrossover::Nothing, &mut rng)
            .unwrap();

        assert_eq!((c1.k(), c2.k()), (2, 5));
        assert_eq!(c1.rows(), short.rows());
        assert_eq!(sorted_rows(c2.rows()), sorted_rows(long.rows()));
    }

    #[test]
    fn test_fixed_preserves_total_rows() {
        let mut rng = StdRng::seed_from_u64(5);
        for (k1, k2) in [(1, 1), (3, 7), (6, 2), (4, 4)] {
            let (c1, c2) = crossover()
                .execute(
                    random_genome(k1, &mut rng),
                    random_genome(k2, &mut rng),
                    LengthVariation::Fixed,
                    GeneCrossover::Sbx,
                    &mut rng,
                )
                .unwrap();
            assert_eq!(c1.k() + c2.k(), k1 + k2);
            assert_eq!(c1.k(), k1.min(k2));
        }
    }

    #[test]
    fn test_variable_lengths_sum_and_stay_non_empty() {
        let mut rng = StdRng::seed_from_u64(99);
        for variation in [LengthVariation::Variation1, LengthVariation::Variation2] {
            for _ in 0..50 {
                let (c1, c2) = crossover()
                    .execute(
                        random_genome(3, &mut rng),
                        random_genome(6, &mut rng),
                        variation,
                        GeneCrossover::Swap,
                        &mut rng,
                    )
                    .unwrap();
                assert_eq!(c1.k() + c2.k(), 9);
                assert!(c1.k() >= 1 && c2.k() >= 1);
            }
        }
    }

    #[test]
    fn test_not_triggered_returns_parents() {
        let mut rng = StdRng::seed_from_u64(1);
        let op = VariableLengthCrossover::new(0.0, 1.0, 20.0, GeneBounds::default()).unwrap();
        let a = random_genome(4, &mut rng);
        let b = random_genome(2, &mut rng);
        let (c1, c2) = op
            .execute(a.clone(), b.clone(), LengthVariation::Variation1, GeneCrossover::Sbx, &mut rng)
            .unwrap();
        assert_eq!(c1.rows(), a.rows());
        assert_eq!(c2.rows(), b.rows());
    }

    #[test]
    fn test_sbx_children_within_bounds() {
        let bounds = GeneBounds::default();
        let sbx = SbxCrossover::new(bounds, 1.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            let (a, b) = sbx.execute(bounds.sample_row(&mut rng), bounds.sample_row(&mut rng), &mut rng);
            assert!(bounds.contains(&a));
            assert!(bounds.contains(&b));
        }
    }

    #[test]
    fn test_sbx_identical_parents_unchanged() {
        let bounds = GeneBounds::default();
        let sbx = SbxCrossover::new(bounds, 1.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let row = bounds.sample_row(&mut rng);
        assert_eq!(sbx.execute(row, row, &mut rng), (row, row));
    }

    #[test]
    fn test_invalid_probability() {
        assert!(matches!(
            VariableLengthCrossover::new(1.2, 1.0, 20.0, GeneBounds::default()),
            Err(MoeecError::InvalidProbability(_))
        ));
        assert!(SwapCrossover::new(-0.1).is_err());
        assert!(SbxCrossover::new(GeneBounds::default(), 0.5, -1.0).is_err());
    }
}
