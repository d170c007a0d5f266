/// Pairwise ordering primitives for minimized objective triples.
///
/// Every comparator returns `Ordering::Less` when the first argument is
/// preferred, `Greater` when the second one is, and `Equal` otherwise.
use super::genome::{objective_matrix, Genome};
use crate::error::{MoeecError, Result};
use crate::types::{Objective, SlackVariant};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Check if objective vector A dominates B (all objectives minimized).
/// A dominates B if A is no worse than B in all objectives and strictly better in at least one
pub fn dominates(a: &[f64; 3], b: &[f64; 3]) -> bool {
    let mut at_least_one_better = false;

    for i in 0..3 {
        if b[i] < a[i] {
            return false;
        }
        if a[i] < b[i] {
            at_least_one_better = true;
        }
    }

    at_least_one_better
}

/// Pareto dominance as an ordering: `Less` if `a` dominates `b`.
pub fn dominance(a: &[f64; 3], b: &[f64; 3]) -> Ordering {
    if dominates(a, b) {
        Ordering::Less
    } else if dominates(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DominanceComparator;

impl DominanceComparator {
    pub fn compare(&self, a: &Genome, b: &Genome) -> Result<Ordering> {
        Ok(dominance(&a.objectives()?, &b.objectives()?))
    }
}

/// Per-objective tie tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlackThresholds(pub [f64; 3]);

impl SlackThresholds {
    /// `ratio * (max - min)` of every objective over `population`.
    pub fn from_population(population: &[Genome], ratio: f64) -> Result<Self> {
        if population.is_empty() {
            return Err(MoeecError::InvalidInput(
                "cannot derive slack thresholds from an empty population".to_string(),
            ));
        }
        let objectives = objective_matrix(population)?;
        let mut thresholds = [0.0; 3];
        for (m, threshold) in thresholds.iter_mut().enumerate() {
            let (min, max) = objectives
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
                    (lo.min(o[m]), hi.max(o[m]))
                });
            *threshold = ratio * (max - min);
        }
        Ok(Self(thresholds))
    }

    pub fn get(&self, objective: Objective) -> f64 {
        self.0[objective.index()]
    }
}

/// Preference-driven comparison that treats near-equal values as ties.
#[derive(Debug, Clone, Copy)]
pub struct SlackComparator {
    pub thresholds: SlackThresholds,
    pub variant: SlackVariant,
}

impl SlackComparator {
    pub fn new(thresholds: SlackThresholds, variant: SlackVariant) -> Self {
        Self { thresholds, variant }
    }

    pub fn compare(&self, a: &Genome, b: &Genome, preferred: Objective) -> Result<Ordering> {
        Ok(self.compare_objectives(&a.objectives()?, &b.objectives()?, preferred))
    }

    pub fn compare_objectives(&self, a: &[f64; 3], b: &[f64; 3], preferred: Objective) -> Ordering {
        match self.variant {
            SlackVariant::Lexicographic => {
                for objective in preferred.priority() {
                    let ordering = self.compare_one(a, b, objective);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            }
            SlackVariant::PreferredOnly => self.compare_one(a, b, preferred),
            SlackVariant::PreferredThenDominance => match self.compare_one(a, b, preferred) {
                Ordering::Equal => dominance(a, b),
                ordering => ordering,
            },
        }
    }

    fn compare_one(&self, a: &[f64; 3], b: &[f64; 3], objective: Objective) -> Ordering {
        let i = objective.index();
        if (a[i] - b[i]).abs() <= self.thresholds.get(objective) {
            Ordering::Equal
        } else if a[i] < b[i] {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

/// Single-objective ordering used to pick elites and reported solutions.
pub fn compare_objective(a: &[f64; 3], b: &[f64; 3], objective: Objective) -> Ordering {
    let i = objective.index();
    a[i].partial_cmp(&b[i]).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluated(objectives: [f64; 3]) -> Genome {
        let mut genome = Genome::new(vec![[0.5; 13]]).unwrap();
        genome.set_objectives(objectives);
        genome
    }

    #[test]
    fn test_dominance() {
        assert_eq!(dominance(&[1.0, 1.0, 1.0], &[2.0, 1.0, 1.0]), Ordering::Less);
        assert_eq!(dominance(&[2.0, 1.0, 1.0], &[1.0, 1.0, 1.0]), Ordering::Greater);
        assert_eq!(dominance(&[1.0, 5.0, 2.0], &[3.0, 3.0, 3.0]), Ordering::Equal);
        assert_eq!(dominance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), Ordering::Equal);
    }

    #[test]
    fn test_dominance_antisymmetric() {
        let points = [
            [1.0, 5.0, 2.0],
            [2.0, 1.0, 9.0],
            [3.0, 3.0, 3.0],
            [0.5, 0.5, 0.5],
            [4.0, 6.0, 10.0],
        ];
        for a in &points {
            assert_eq!(dominance(a, a), Ordering::Equal);
            for b in &points {
                assert_eq!(dominance(a, b), dominance(b, a).reverse());
            }
        }
    }

    #[test]
    fn test_thresholds_from_population() {
        let population = vec![evaluated([0.0, 10.0, 1.0]), evaluated([2.0, 0.0, 1.0])];
        let thresholds = SlackThresholds::from_population(&population, 0.005).unwrap();
        assert!((thresholds.0[0] - 0.01).abs() < 1e-12);
        assert!((thresholds.0[1] - 0.05).abs() < 1e-12);
        assert_eq!(thresholds.0[2], 0.0);
        assert!(SlackThresholds::from_population(&[], 0.005).is_err());
    }

    #[test]
    fn test_lexicographic_falls_through_ties() {
        let comparator = SlackComparator::new(SlackThresholds([0.1, 0.1, 0.1]), SlackVariant::Lexicographic);
        let a = [1.00, 5.0, 2.0];
        let b = [1.05, 1.0, 3.0];
        // accuracy ties, complexity decides before diversity
        assert_eq!(comparator.compare_objectives(&a, &b, Objective::Accuracy), Ordering::Less);
        // diversity decides first
        assert_eq!(comparator.compare_objectives(&a, &b, Objective::Diversity), Ordering::Greater);
        let c = [1.05, 5.05, 2.05];
        assert_eq!(comparator.compare_objectives(&a, &c, Objective::Complexity), Ordering::Equal);
    }

    #[test]
    fn test_preferred_variants_on_tie() {
        let thresholds = SlackThresholds([0.5, 0.5, 0.5]);
        let a = [1.0, 1.0, 1.0];
        let b = [1.2, 2.0, 2.0];
        let only = SlackComparator::new(thresholds, SlackVariant::PreferredOnly);
        let then_dominance = SlackComparator::new(thresholds, SlackVariant::PreferredThenDominance);
        assert_eq!(only.compare_objectives(&a, &b, Objective::Accuracy), Ordering::Equal);
        assert_eq!(then_dominance.compare_objectives(&a, &b, Objective::Accuracy), Ordering::Less);
        assert_eq!(only.compare_objectives(&a, &b, Objective::Diversity), Ordering::Less);
    }

    #[test]
    fn test_unevaluated_genome_is_an_error() {
        let genome = Genome::new(vec![[0.5; 13]]).unwrap();
        let other = evaluated([1.0, 1.0, 1.0]);
        assert!(DominanceComparator.compare(&genome, &other).is_err());
    }
}
