use crate::config::OperatorConfig;
use crate::engines::generation::genome::{GeneBounds, GeneRow, Genome, GENE_WIDTH};
use crate::error::{check_probability, MoeecError, Result};
use crate::types::MutationKind;
use rand::Rng;

/// Bounded polynomial mutation of a single gene row.
#[derive(Debug, Clone)]
pub struct PolynomialMutation {
    bounds: GeneBounds,
    probability: f64,
    distribution_index: f64,
}

impl PolynomialMutation {
    pub fn new(bounds: GeneBounds, probability: f64, distribution_index: f64) -> Result<Self> {
        check_probability(probability)?;
        if distribution_index.is_nan() || distribution_index < 0.0 {
            return Err(MoeecError::InvalidInput(format!(
                "polynomial distribution index is negative: {}",
                distribution_index
            )));
        }
        Ok(Self {
            bounds,
            probability,
            distribution_index,
        })
    }

    pub fn execute<R: Rng + ?Sized>(&self, mut row: GeneRow, rng: &mut R) -> GeneRow {
        let eta = self.distribution_index;
        let mut_pow = 1.0 / (eta + 1.0);

        for i in 0..GENE_WIDTH {
            if rng.gen::<f64>() > self.probability {
                continue;
            }
            let (yl, yu) = (self.bounds.low[i], self.bounds.high[i]);
            if yl == yu {
                row[i] = yl;
                continue;
            }

            let y = row[i];
            let delta1 = (y - yl) / (yu - yl);
            let delta2 = (yu - y) / (yu - yl);
            let rnd = rng.gen::<f64>();
            let deltaq = if rnd <= 0.5 {
                let xy = 1.0 - delta1;
                let val = 2.0 * rnd + (1.0 - 2.0 * rnd) * xy.powf(eta + 1.0);
                val.powf(mut_pow) - 1.0
            } else {
                let xy = 1.0 - delta2;
                let val = 2.0 * (1.0 - rnd) + 2.0 * (rnd - 0.5) * xy.powf(eta + 1.0);
                1.0 - val.powf(mut_pow)
            };

            row[i] = self.bounds.clip(i, y + deltaq * (yu - yl));
        }
        row
    }
}

/// Structural mutation that adds, deletes or perturbs one gene row.
#[derive(Debug, Clone)]
pub struct VariableLengthMutation {
    probability: f64,
    bounds: GeneBounds,
    gene_mutator: PolynomialMutation,
}

impl VariableLengthMutation {
    pub fn new(
        probability: f64,
        gene_mutation_probability: f64,
        distribution_index: f64,
        bounds: GeneBounds,
    ) -> Result<Self> {
        Ok(Self {
            probability: check_probability(probability)?,
            bounds,
            gene_mutator: PolynomialMutation::new(bounds, gene_mutation_probability, distribution_index)?,
        })
    }

    pub fn execute<R: Rng + ?Sized>(&self, genome: Genome, rng: &mut R) -> Result<Genome> {
        if rng.gen::<f64>() > self.probability {
            return Ok(genome);
        }
        let kind = MutationKind::ALL[rng.gen_range(0..MutationKind::ALL.len())];
        self.apply(kind, genome, rng)
    }

    /// Run one mutation branch unconditionally.
    pub fn apply<R: Rng + ?Sized>(&self, kind: MutationKind, mut genome: Genome, rng: &mut R) -> Result<Genome> {
        match kind {
            MutationKind::Add => {
                genome.push_row(self.bounds.sample_row(rng));
            }
            MutationKind::Delete => {
                if genome.k() > 1 {
                    let point = rng.gen_range(0..genome.k());
                    genome.remove_row(point)?;
                }
            }
            MutationKind::Modify => {
                let point = rng.gen_range(0..genome.k());
                let mutated = self.gene_mutator.execute(*genome.row(point)?, rng);
                genome.rows_mut()[point] = mutated;
            }
        }
        log::trace!("{:?} mutation, genome now has {} rows", kind, genome.k());
        Ok(genome)
    }
}

/// Polynomial mutation over every row, leaving the length alone.
#[derive(Debug, Clone)]
pub struct FixedLengthMutation {
    gene_mutator: PolynomialMutation,
}

impl FixedLengthMutation {
    pub fn new(probability: f64, distribution_index: f64, bounds: GeneBounds) -> Result<Self> {
        Ok(Self {
            gene_mutator: PolynomialMutation::new(bounds, probability, distribution_index)?,
        })
    }

    pub fn execute<R: Rng + ?Sized>(&self, mut genome: Genome, rng: &mut R) -> Result<Genome> {
        for row in genome.rows_mut() {
            *row = self.gene_mutator.execute(*row, rng);
        }
        Ok(genome)
    }
}

/// Mutation used by the driver, picked by the genome length policy.
#[derive(Debug, Clone)]
pub enum MutationOperator {
    VariableLength(VariableLengthMutation),
    FixedLength(FixedLengthMutation),
}

impl MutationOperator {
    pub fn from_config(config: &OperatorConfig, bounds: GeneBounds, fixed_length: bool) -> Result<Self> {
        if fixed_length {
            Ok(MutationOperator::FixedLength(FixedLengthMutation::new(
                config.mutation_probability,
                config.polynomial_distribution_index,
                bounds,
            )?))
        } else {
            Ok(MutationOperator::VariableLength(VariableLengthMutation::new(
                config.mutation_probability,
                config.gene_mutation_probability,
                config.polynomial_distribution_index,
                bounds,
            )?))
        }
    }

    pub fn execute<R: Rng + ?Sized>(&self, genome: Genome, rng: &mut R) -> Result<Genome> {
        match self {
            MutationOperator::VariableLength(op) => op.execute(genome, rng),
            MutationOperator::FixedLength(op) => op.execute(genome, rng),
        }
    }
}
