use crate::engines::generation::comparator::{dominance, SlackComparator, SlackThresholds};
use crate::engines::generation::genome::{objective_matrix, Genome};
use crate::error::{MoeecError, Result};
use crate::types::{Objective, SlackVariant};
use rand::seq::index::sample;
use rand::Rng;
use std::cmp::Ordering;

/// Picks a single genome out of a candidate pool.
#[derive(Debug, Clone)]
pub enum SelectionOperator {
    /// Probability proportional to `1 / accuracy`.
    RouletteWheel,
    /// Linear scan keeping the dominance winner.
    BestSolution,
    Random,
    BinaryTournament,
    SlackBinaryTournament(SlackComparator),
}

impl SelectionOperator {
    pub fn slack(variant: SlackVariant) -> Self {
        SelectionOperator::SlackBinaryTournament(SlackComparator::new(
            SlackThresholds::default(),
            variant,
        ))
    }

    pub fn is_slack(&self) -> bool {
        matches!(self, SelectionOperator::SlackBinaryTournament(_))
    }

    /// Refresh the tie tolerances of a slack tournament; other operators
    /// ignore them.
    pub fn update_thresholds(&mut self, thresholds: SlackThresholds) {
        if let SelectionOperator::SlackBinaryTournament(comparator) = self {
            comparator.thresholds = thresholds;
        }
    }

    pub fn execute<'a, R: Rng + ?Sized>(&self, pool: &'a [Genome], rng: &mut R) -> Result<&'a Genome> {
        self.execute_preferring(pool, Objective::Accuracy, rng)
    }

    /// Like `execute`, with the objective a slack tournament should favour.
    pub fn execute_preferring<'a, R: Rng + ?Sized>(
        &self,
        pool: &'a [Genome],
        preferred: Objective,
        rng: &mut R,
    ) -> Result<&'a Genome> {
        if pool.is_empty() {
            return Err(MoeecError::InvalidInput(
                "selection pool is empty".to_string(),
            ));
        }

        match self {
            SelectionOperator::RouletteWheel => roulette_wheel(pool, rng),
            SelectionOperator::BestSolution => {
                let mut best = &pool[0];
                for candidate in &pool[1..] {
                    if dominance(&candidate.objectives()?, &best.objectives()?) == Ordering::Less {
                        best = candidate;
                    }
                }
                Ok(best)
            }
            SelectionOperator::Random => Ok(&pool[rng.gen_range(0..pool.len())]),
            SelectionOperator::BinaryTournament => binary_tournament(pool, rng, |a, b| {
                Ok(dominance(&a.objectives()?, &b.objectives()?))
            }),
            SelectionOperator::SlackBinaryTournament(comparator) => {
                binary_tournament(pool, rng, |a, b| comparator.compare(a, b, preferred))
            }
        }
    }
}

fn roulette_wheel<'a, R: Rng + ?Sized>(pool: &'a [Genome], rng: &mut R) -> Result<&'a Genome> {
    let weights: Vec<f64> = pool
        .iter()
        .map(|g| g.objective(Objective::Accuracy).map(|acc| 1.0 / acc))
        .collect::<Result<_>>()?;
    if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return Err(MoeecError::InvalidInput(
            "roulette wheel needs strictly positive, finite accuracy values".to_string(),
        ));
    }

    let maximum: f64 = weights.iter().sum();
    let spin = rng.gen::<f64>() * maximum;
    let mut value = 0.0;
    for (genome, weight) in pool.iter().zip(&weights) {
        value += weight;
        if value > spin {
            return Ok(genome);
        }
    }

    Ok(&pool[pool.len() - 1])
}

/// Two distinct candidates, winner by `compare`, coin flip on a tie.
fn binary_tournament<'a, R, F>(pool: &'a [Genome], rng: &mut R, compare: F) -> Result<&'a Genome>
where
    R: Rng + ?Sized,
    F: Fn(&Genome, &Genome) -> Result<Ordering>,
{
    if pool.len() == 1 {
        return Ok(&pool[0]);
    }

    let picks = sample(rng, pool.len(), 2);
    let (first, second) = (&pool[picks.index(0)], &pool[picks.index(1)]);

    Ok(match compare(first, second)? {
        Ordering::Less => first,
        Ordering::Greater => second,
        Ordering::Equal => {
            if rng.gen::<f64>() < 0.5 {
                second
            } else {
                first
            }
        }
    })
}

/// Rank of every value in ascending order (0 = smallest), ties broken by
/// position.
pub fn argsort_rank(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    let mut rank = vec![0; values.len()];
    for (position, &idx) in order.iter().enumerate() {
        rank[idx] = position;
    }
    rank
}

/// Advantage objective of every cluster.
///
/// Each objective is ranked across the whole population, the ranks are
/// averaged over every cluster's members, and the per-cluster means are
/// ranked against each other objective by objective. A cluster's advantage
/// objective is the one where it ranks best; when all three tie accuracy
/// wins, when two tie and one is accuracy accuracy wins, and a
/// diversity/complexity tie goes to complexity. Empty clusters rank last.
pub fn advantage_objectives(population: &[Genome], members: &[Vec<usize>]) -> Result<Vec<Objective>> {
    let objectives = objective_matrix(population)?;
    let column_ranks: Vec<Vec<usize>> = (0..3)
        .map(|m| argsort_rank(&objectives.iter().map(|o| o[m]).collect::<Vec<_>>()))
        .collect();

    let mut mean_ranks = vec![[f64::INFINITY; 3]; members.len()];
    for (cluster, indices) in members.iter().enumerate() {
        if indices.is_empty() {
            continue;
        }
        for m in 0..3 {
            let mut total = 0.0;
            for &idx in indices {
                total += *column_ranks[m].get(idx).ok_or(MoeecError::IndexOutOfRange {
                    index: idx,
                    len: population.len(),
                })? as f64;
            }
            mean_ranks[cluster][m] = total / indices.len() as f64;
        }
    }

    // Rank the clusters against each other, one objective at a time
    let mut cluster_ranks = vec![[0usize; 3]; members.len()];
    for m in 0..3 {
        let column: Vec<f64> = mean_ranks.iter().map(|r| r[m]).collect();
        for (cluster, rank) in argsort_rank(&column).into_iter().enumerate() {
            cluster_ranks[cluster][m] = rank;
        }
    }

    Ok(cluster_ranks.iter().map(|ranks| pick_advantage(*ranks)).collect())
}

fn pick_advantage(ranks: [usize; 3]) -> Objective {
    let mut sorted: Vec<(usize, Objective)> = Objective::ALL
        .iter()
        .map(|o| (ranks[o.index()], *o))
        .collect();
    sorted.sort_by_key(|(rank, _)| *rank);

    if sorted[0].0 != sorted[1].0 {
        return sorted[0].1;
    }
    if sorted[1].0 == sorted[2].0 {
        return Objective::Accuracy;
    }
    if sorted[2].1 == Objective::Accuracy {
        Objective::Complexity
    } else {
        Objective::Accuracy
    }
}

/// Draw, per cluster and with replacement, as many genomes as the cluster
/// holds. With `advantage` set each cluster's draws favour its advantage
/// objective.
pub fn cluster_aware_selection<R: Rng + ?Sized>(
    population: &[Genome],
    members: &[Vec<usize>],
    operator: &SelectionOperator,
    advantage: Option<&[Objective]>,
    rng: &mut R,
) -> Result<Vec<Genome>> {
    if let Some(advantage) = advantage {
        if advantage.len() != members.len() {
            return Err(MoeecError::InvalidInput(format!(
                "{} advantage objectives for {} clusters",
                advantage.len(),
                members.len()
            )));
        }
    }

    let mut mating_pool = Vec::with_capacity(population.len());
    for (cluster, indices) in members.iter().enumerate() {
        let sub_population: Vec<Genome> = indices
            .iter()
            .map(|&idx| {
                population.get(idx).cloned().ok_or(MoeecError::IndexOutOfRange {
                    index: idx,
                    len: population.len(),
                })
            })
            .collect::<Result<_>>()?;
        let preferred = advantage.map_or(Objective::Accuracy, |a| a[cluster]);

        for _ in 0..sub_population.len() {
            let chosen = operator.execute_preferring(&sub_population, preferred, rng)?;
            mating_pool.push(chosen.clone());
        }
    }

    Ok(mating_pool)
}
