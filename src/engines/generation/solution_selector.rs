//! Picking one solution out of a final Pareto front.
use super::genome::Genome;
use crate::error::{MoeecError, Result};
use crate::types::Objective;
use std::cmp::Ordering;

/// Indices of `front` ordered by one objective.
fn order_by(front: &[Genome], objective: Objective, lowest_is_best: bool) -> Result<Vec<usize>> {
    let values: Vec<f64> = front
        .iter()
        .map(|g| g.objective(objective))
        .collect::<Result<_>>()?;
    let mut order: Vec<usize> = (0..front.len()).collect();
    order.sort_by(|&a, &b| {
        let ordering = values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal);
        if lowest_is_best {
            ordering
        } else {
            ordering.reverse()
        }
    });
    Ok(order)
}

/// The `n`-th best genome (0 = best) by a single objective.
pub fn nth_best(front: &[Genome], objective: Objective, lowest_is_best: bool, n: usize) -> Result<&Genome> {
    let order = order_by(front, objective, lowest_is_best)?;
    order
        .get(n)
        .map(|&idx| &front[idx])
        .ok_or(MoeecError::IndexOutOfRange {
            index: n,
            len: front.len(),
        })
}

pub fn best_objective(front: &[Genome], objective: Objective, lowest_is_best: bool) -> Result<&Genome> {
    nth_best(front, objective, lowest_is_best, 0)
}

/// Plane through three points, `a*x + b*y + c*z + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Plane {
    normal: [f64; 3],
    offset: f64,
    norm: f64,
}

impl Plane {
    fn through(p: [f64; 3], q: [f64; 3], r: [f64; 3]) -> Self {
        let u = [q[0] - p[0], q[1] - p[1], q[2] - p[2]];
        let v = [r[0] - p[0], r[1] - p[1], r[2] - p[2]];
        let normal = [
            u[1] * v[2] - v[1] * u[2],
            u[2] * v[0] - v[2] * u[0],
            u[0] * v[1] - v[0] * u[1],
        ];
        let offset = -(normal[0] * p[0] + normal[1] * p[1] + normal[2] * p[2]);
        let norm = normal.iter().map(|n| n * n).sum::<f64>().sqrt();
        Self { normal, offset, norm }
    }

    /// Signed distance, positive on the side below the plane.
    fn knee_distance(&self, point: &[f64; 3]) -> f64 {
        let value = self.normal[0] * point[0] + self.normal[1] * point[1] + self.normal[2] * point[2] + self.offset;
        -value.signum() * value.abs() / self.norm
    }
}

/// Knee point of a three-objective front.
///
/// The extreme plane passes through the genomes with the largest accuracy,
/// diversity and complexity. When two or three of those coincide, the
/// runner-up of the affected objective is used instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct KneePointSelector;

impl KneePointSelector {
    /// Store `knee_distance` on every genome of `front` and return the index
    /// of the genome farthest below the extreme plane.
    pub fn execute(&self, front: &mut [Genome]) -> Result<usize> {
        if front.len() < 3 {
            return Err(MoeecError::InvalidInput(format!(
                "knee point needs at least 3 solutions, got {}",
                front.len()
            )));
        }
        let plane = self.extreme_plane(front)?;
        if plane.norm == 0.0 || !plane.norm.is_finite() {
            return Err(MoeecError::InvalidInput(
                "extreme points do not span a plane".to_string(),
            ));
        }

        let mut best = 0;
        let mut best_distance = f64::NEG_INFINITY;
        for (idx, genome) in front.iter_mut().enumerate() {
            let distance = plane.knee_distance(&genome.objectives()?);
            genome.attributes.knee_distance = Some(distance);
            if distance > best_distance {
                best_distance = distance;
                best = idx;
            }
        }
        log::debug!("knee point {} at distance {:.6}", best, best_distance);
        Ok(best)
    }

    fn extreme_plane(&self, front: &[Genome]) -> Result<Plane> {
        let worst = |objective: Objective, n: usize| -> Result<[f64; 3]> {
            nth_best(front, objective, false, n)?.objectives()
        };

        let mut a = worst(Objective::Accuracy, 0)?;
        let mut b = worst(Objective::Diversity, 0)?;
        let mut c = worst(Objective::Complexity, 0)?;

        if a == b {
            if b == c {
                c = worst(Objective::Complexity, 1)?;
                b = worst(Objective::Diversity, 1)?;
                if b == c {
                    c = worst(Objective::Complexity, 2)?;
                }
            } else {
                a = worst(Objective::Accuracy, 1)?;
            }
        } else if a == c || b == c {
            c = worst(Objective::Complexity, 1)?;
        }

        Ok(Plane::through(a, b, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front(objectives: &[[f64; 3]]) -> Vec<Genome> {
        objectives
            .iter()
            .map(|o| {
                let mut genome = Genome::new(vec![[0.5; 13]]).unwrap();
                genome.set_objectives(*o);
                genome
            })
            .collect()
    }

    #[test]
    fn test_best_and_nth_best() {
        let front = front(&[[3.0, 1.0, 2.0], [1.0, 3.0, 2.0], [2.0, 2.0, 1.0]]);
        assert_eq!(best_objective(&front, Objective::Accuracy, true).unwrap().objectives().unwrap()[0], 1.0);
        assert_eq!(best_objective(&front, Objective::Accuracy, false).unwrap().objectives().unwrap()[0], 3.0);
        assert_eq!(nth_best(&front, Objective::Diversity, true, 1).unwrap().objectives().unwrap()[1], 2.0);
        assert!(matches!(
            nth_best(&front, Objective::Diversity, true, 3),
            Err(MoeecError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_knee_point_below_plane() {
        // extremes on the unit simplex, a knee close to the origin
        let mut front = front(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.2, 0.2, 0.2],
            [0.3, 0.3, 0.35],
        ]);
        let knee = KneePointSelector.execute(&mut front).unwrap();
        assert_eq!(knee, 3);
        assert!(front[3].attributes.knee_distance.unwrap() > 0.0);
        assert!(front[0].attributes.knee_distance.unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_knee_point_needs_three_solutions() {
        let mut small = front(&[[1.0, 2.0, 3.0], [2.0, 1.0, 3.0]]);
        assert!(KneePointSelector.execute(&mut small).is_err());
    }
}
