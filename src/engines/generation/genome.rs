/// Variable-length genome representation
///
/// A genome encodes one candidate ensemble as an ordered list of gene rows.
/// Every row describes a single base learner with the same 13 numeric fields:
///
/// | idx  | field          | default bounds |
/// |------|----------------|----------------|
/// | 0    | poly_gamma     | [0, 1]         |
/// | 1    | poly_coef0     | [0, 10]        |
/// | 2    | poly_degree    | [2, 6]         |
/// | 3    | rbf_gamma      | [0, 1]         |
/// | 4    | laplace_gamma  | [0, 1]         |
/// | 5    | sigmoid_gamma  | [0, 1]         |
/// | 6    | sigmoid_coef0  | [0, 10]        |
/// | 7-11 | w1..w5         | [0, 1]         |
/// | 12   | W              | [0, 1]         |
///
/// Genetic operators only ever move, swap, add or perturb rows. Weight
/// normalization and length capping belong to the problem's repair step.
use crate::error::{MoeecError, Result};
use crate::types::{CrossoverStrategy, LengthVariation, Objective};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

pub const GENE_WIDTH: usize = 13;

pub type GeneRow = [f64; GENE_WIDTH];

pub const FIELD_NAMES: [&str; GENE_WIDTH] = [
    "poly_gamma",
    "poly_coef0",
    "poly_degree",
    "rbf_gamma",
    "laplace_gamma",
    "sigmoid_gamma",
    "sigmoid_coef0",
    "w1",
    "w2",
    "w3",
    "w4",
    "w5",
    "W",
];

/// Integer-valued field (polynomial kernel degree).
pub const POLY_DEGREE: usize = 2;
/// Inter-kernel weights, normalized per row.
pub const KERNEL_WEIGHTS: Range<usize> = 7..12;
/// Ensemble weight, normalized across rows.
pub const ENSEMBLE_WEIGHT: usize = 12;

/// Per-field bounds, shared by every row of every genome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneBounds {
    pub low: GeneRow,
    pub high: GeneRow,
}

impl Default for GeneBounds {
    fn default() -> Self {
        Self {
            low: [0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            high: [1.0, 10.0, 6.0, 1.0, 1.0, 1.0, 10.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl GeneBounds {
    pub fn validate(&self) -> Result<()> {
        for i in 0..GENE_WIDTH {
            if !(self.low[i].is_finite() && self.high[i].is_finite()) || self.low[i] > self.high[i] {
                return Err(MoeecError::Configuration(format!(
                    "Invalid bounds for {}: [{}, {}]",
                    FIELD_NAMES[i], self.low[i], self.high[i]
                )));
            }
        }
        Ok(())
    }

    /// Uniformly sample a row inside the bounds.
    pub fn sample_row<R: Rng + ?Sized>(&self, rng: &mut R) -> GeneRow {
        let mut row = [0.0; GENE_WIDTH];
        for (i, value) in row.iter_mut().enumerate() {
            *value = self.low[i] + rng.gen::<f64>() * (self.high[i] - self.low[i]);
        }
        row
    }

    pub fn clip(&self, field: usize, value: f64) -> f64 {
        value.max(self.low[field]).min(self.high[field])
    }

    pub fn contains(&self, row: &GeneRow) -> bool {
        row.iter()
            .enumerate()
            .all(|(i, v)| *v >= self.low[i] && *v <= self.high[i])
    }
}

/// Algorithm bookkeeping attached to a genome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub cluster_label: Option<usize>,
    pub crowding_distance: Option<f64>,
    pub dominance_rank: Option<usize>,
    pub strategy: Option<CrossoverStrategy>,
    pub variation_strategy: Option<LengthVariation>,
    /// Set on children produced this generation; parents carry `false`.
    pub strategy_flag: bool,
    pub knee_distance: Option<f64>,
}

impl Attributes {
    pub fn clear_strategy(&mut self) {
        self.strategy = None;
        self.variation_strategy = None;
        self.strategy_flag = false;
    }
}

/// Opaque fitted model attached by the evaluator.
#[derive(Clone)]
pub struct ModelHandle(Arc<dyn Any + Send + Sync>);

impl ModelHandle {
    pub fn new<M: Any + Send + Sync>(model: M) -> Self {
        Self(Arc::new(model))
    }

    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.0.downcast_ref::<M>()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModelHandle(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    rows: Vec<GeneRow>,
    objectives: Option<[f64; 3]>,
    pub attributes: Attributes,
    #[serde(skip)]
    model: Option<ModelHandle>,
}

impl Genome {
    pub fn new(rows: Vec<GeneRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(MoeecError::InvalidInput(
                "a genome needs at least one gene row".to_string(),
            ));
        }
        Ok(Self {
            rows,
            objectives: None,
            attributes: Attributes::default(),
            model: None,
        })
    }

    /// Number of gene rows.
    pub fn k(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[GeneRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Result<&GeneRow> {
        self.rows.get(index).ok_or(MoeecError::IndexOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    /// Mutable access to row values. Stored objectives no longer describe
    /// the genome afterwards and are dropped.
    pub fn rows_mut(&mut self) -> &mut [GeneRow] {
        self.invalidate();
        &mut self.rows
    }

    pub fn push_row(&mut self, row: GeneRow) {
        self.invalidate();
        self.rows.push(row);
    }

    pub fn remove_row(&mut self, index: usize) -> Result<GeneRow> {
        if index >= self.rows.len() {
            return Err(MoeecError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        if self.rows.len() == 1 {
            return Err(MoeecError::InvalidInput(
                "cannot remove the last gene row".to_string(),
            ));
        }
        self.invalidate();
        Ok(self.rows.remove(index))
    }

    /// Replace every row, keeping the attributes.
    pub fn set_rows(&mut self, rows: Vec<GeneRow>) -> Result<()> {
        if rows.is_empty() {
            return Err(MoeecError::InvalidInput(
                "a genome needs at least one gene row".to_string(),
            ));
        }
        self.invalidate();
        self.rows = rows;
        Ok(())
    }

    /// Positional labels of the base learners (`mkSVR0`, `mkSVR1`, ...).
    pub fn row_labels(&self) -> Vec<String> {
        (0..self.rows.len()).map(|i| format!("mkSVR{}", i)).collect()
    }

    pub fn is_evaluated(&self) -> bool {
        self.objectives.is_some()
    }

    pub fn objectives(&self) -> Result<[f64; 3]> {
        self.objectives
            .ok_or_else(|| MoeecError::InvalidInput("genome has not been evaluated".to_string()))
    }

    pub fn objective(&self, objective: Objective) -> Result<f64> {
        Ok(self.objectives()?[objective.index()])
    }

    pub fn set_objectives(&mut self, objectives: [f64; 3]) {
        self.objectives = Some(objectives);
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref()
    }

    pub fn set_model(&mut self, model: ModelHandle) {
        self.model = Some(model);
    }

    fn invalidate(&mut self) {
        self.objectives = None;
        self.model = None;
    }
}

/// Objective vectors of a whole population, failing on the first
/// unevaluated genome.
pub fn objective_matrix(population: &[Genome]) -> Result<Vec<[f64; 3]>> {
    population.iter().map(Genome::objectives).collect()
}
