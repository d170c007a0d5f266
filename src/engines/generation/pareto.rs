/// Pareto utilities for the three-objective search
/// Implements NSGA-II style fast non-dominated sorting and crowding distance

use super::comparator::dominates;
use super::genome::{objective_matrix, Genome};
use crate::error::{MoeecError, Result};

/// Fronts of a population, front 0 being the non-dominated set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    fronts: Vec<Vec<usize>>,
}

impl Ranking {
    /// Rank `population`, writing `dominance_rank` on every genome.
    pub fn compute(population: &mut [Genome]) -> Result<Self> {
        Ok(Self {
            fronts: fast_non_dominated_sort(population)?,
        })
    }

    pub fn number_of_fronts(&self) -> usize {
        self.fronts.len()
    }

    pub fn fronts(&self) -> &[Vec<usize>] {
        &self.fronts
    }

    /// Population indices of front `index`.
    pub fn subfront(&self, index: usize) -> Result<&[usize]> {
        self.fronts
            .get(index)
            .map(Vec::as_slice)
            .ok_or(MoeecError::IndexOutOfRange {
                index,
                len: self.fronts.len(),
            })
    }
}

/// Fast non-dominated sorting (NSGA-II algorithm)
/// Returns population indices grouped by Pareto front (0 = best, 1 = second best, etc.)
pub fn fast_non_dominated_sort(population: &mut [Genome]) -> Result<Vec<Vec<usize>>> {
    let objectives = objective_matrix(population)?;
    let n = population.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    // For each genome, track:
    // - domination_count: how many genomes dominate it
    // - dominated_solutions: indices of genomes it dominates
    let mut domination_count = vec![0usize; n];
    let mut dominated_solutions: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();

    let mut first_front = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }

            if dominates(&objectives[i], &objectives[j]) {
                dominated_solutions[i].push(j);
            } else if dominates(&objectives[j], &objectives[i]) {
                domination_count[i] += 1;
            }
        }

        if domination_count[i] == 0 {
            population[i].attributes.dominance_rank = Some(0);
            first_front.push(i);
        }
    }

    fronts.push(first_front);

    // Peel subsequent fronts
    let mut front_index = 0;
    while front_index < fronts.len() {
        let mut next_front = Vec::new();

        for &i in &fronts[front_index] {
            for &j in &dominated_solutions[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    population[j].attributes.dominance_rank = Some(front_index + 1);
                    next_front.push(j);
                }
            }
        }

        if !next_front.is_empty() {
            fronts.push(next_front);
        }
        front_index += 1;
    }

    Ok(fronts)
}

/// Calculate crowding distance for the genomes of one front
/// Higher values indicate more isolated genomes; boundary genomes get +inf
pub fn crowding_distance(population: &mut [Genome], front: &[usize]) -> Result<()> {
    for &idx in front {
        if idx >= population.len() {
            return Err(MoeecError::IndexOutOfRange {
                index: idx,
                len: population.len(),
            });
        }
    }

    if front.len() <= 2 {
        for &idx in front {
            population[idx].attributes.crowding_distance = Some(f64::INFINITY);
        }
        return Ok(());
    }

    let objectives: Vec<[f64; 3]> = front
        .iter()
        .map(|&idx| population[idx].objectives())
        .collect::<Result<_>>()?;
    let mut distances = vec![0.0; front.len()];

    for m in 0..3 {
        // Positions inside `front`, sorted by objective m
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| {
            objectives[a][m]
                .partial_cmp(&objectives[b][m])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let first = order[0];
        let last = order[order.len() - 1];
        distances[first] = f64::INFINITY;
        distances[last] = f64::INFINITY;

        let range = objectives[last][m] - objectives[first][m];
        if range == 0.0 {
            continue;
        }

        for w in order.windows(3) {
            let (prev, current, next) = (w[0], w[1], w[2]);
            distances[current] += (objectives[next][m] - objectives[prev][m]) / range;
        }
    }

    for (position, &idx) in front.iter().enumerate() {
        population[idx].attributes.crowding_distance = Some(distances[position]);
    }

    Ok(())
}

/// Mutually non-dominated genomes with distinct objective vectors, in the
/// order they were first accepted.
pub fn non_dominated(population: &[Genome]) -> Result<Vec<Genome>> {
    let mut archive: Vec<(usize, [f64; 3])> = Vec::new();

    for (idx, genome) in population.iter().enumerate() {
        let candidate = genome.objectives()?;
        let rejected = archive
            .iter()
            .any(|(_, kept)| dominates(kept, &candidate) || *kept == candidate);
        if rejected {
            continue;
        }
        archive.retain(|(_, kept)| !dominates(&candidate, kept));
        archive.push((idx, candidate));
    }

    Ok(archive
        .into_iter()
        .map(|(idx, _)| population[idx].clone())
        .collect())
}
