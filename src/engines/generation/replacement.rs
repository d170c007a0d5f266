/// Environmental replacement: pick the next population out of parents plus
/// offspring.
use super::comparator::{SlackComparator, SlackThresholds};
use super::genome::Genome;
use super::operators::SelectionOperator;
use super::pareto::{crowding_distance, Ranking};
use crate::config::{EvolutionConfig, ReplacementMethod};
use crate::error::{MoeecError, Result};
use crate::types::{Objective, SlackVariant, TruncationPolicy};
use rand::Rng;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum Replacement {
    /// NSGA-II: whole fronts while they fit, crowding truncation on the
    /// front that overflows.
    RankingAndCrowding { policy: TruncationPolicy },
    /// Best `round(elite_ratio * N)` by accuracy, the rest by slack
    /// tournaments over the remaining genomes.
    EliteSlackTournament {
        elite_ratio: f64,
        variant: SlackVariant,
        threshold_ratio: f64,
    },
}

impl Replacement {
    pub fn from_config(config: &EvolutionConfig) -> Self {
        match config.replacement {
            ReplacementMethod::RankingAndCrowding => Replacement::RankingAndCrowding {
                policy: config.truncation_policy,
            },
            ReplacementMethod::EliteSlackTournament => Replacement::EliteSlackTournament {
                elite_ratio: config.elite_ratio,
                variant: config.slack_variant,
                threshold_ratio: config.threshold_ratio,
            },
        }
    }

    /// Returns exactly `population.len()` genomes.
    pub fn replace<R: Rng + ?Sized>(
        &self,
        population: Vec<Genome>,
        offspring: Vec<Genome>,
        rng: &mut R,
    ) -> Result<Vec<Genome>> {
        let size = population.len();
        let mut merged = population;
        merged.extend(offspring);

        match self {
            Replacement::RankingAndCrowding { policy } => ranking_and_crowding(merged, size, *policy),
            Replacement::EliteSlackTournament {
                elite_ratio,
                variant,
                threshold_ratio,
            } => elite_slack_tournament(merged, size, *elite_ratio, *variant, *threshold_ratio, rng),
        }
    }
}

fn ranking_and_crowding(mut merged: Vec<Genome>, size: usize, policy: TruncationPolicy) -> Result<Vec<Genome>> {
    let ranking = Ranking::compute(&mut merged)?;
    let mut chosen: Vec<usize> = Vec::with_capacity(size);
    let mut remaining = size;

    for front in ranking.fronts() {
        if remaining == 0 {
            break;
        }
        crowding_distance(&mut merged, front)?;
        if front.len() <= remaining {
            chosen.extend_from_slice(front);
            remaining -= front.len();
            continue;
        }

        let kept = match policy {
            TruncationPolicy::Sequential => sequential_truncation(&mut merged, front, remaining)?,
            TruncationPolicy::OneShot => {
                let mut sorted = front.clone();
                sort_by_crowding(&merged, &mut sorted);
                sorted.truncate(remaining);
                sorted
            }
        };
        log::debug!(
            "front of {} truncated to {} ({:?})",
            front.len(),
            kept.len(),
            policy
        );
        chosen.extend(kept);
        remaining = 0;
    }

    if remaining > 0 {
        return Err(MoeecError::InvalidInput(format!(
            "cannot fill {} slots from {} genomes",
            size,
            merged.len()
        )));
    }

    let mut slots: Vec<Option<Genome>> = merged.into_iter().map(Some).collect();
    Ok(chosen.into_iter().filter_map(|idx| slots[idx].take()).collect())
}

/// Drop the least crowded member one at a time, recomputing distances
/// after every removal.
fn sequential_truncation(population: &mut [Genome], front: &[usize], size: usize) -> Result<Vec<usize>> {
    let mut kept = front.to_vec();
    while kept.len() > size {
        sort_by_crowding(population, &mut kept);
        kept.pop();
        crowding_distance(population, &kept)?;
    }
    Ok(kept)
}

/// Descending crowding distance, stable on ties.
fn sort_by_crowding(population: &[Genome], indices: &mut [usize]) {
    let distance = |idx: usize| population[idx].attributes.crowding_distance.unwrap_or(0.0);
    indices.sort_by(|&a, &b| distance(b).partial_cmp(&distance(a)).unwrap_or(Ordering::Equal));
}

fn elite_slack_tournament<R: Rng + ?Sized>(
    merged: Vec<Genome>,
    size: usize,
    elite_ratio: f64,
    variant: SlackVariant,
    threshold_ratio: f64,
    rng: &mut R,
) -> Result<Vec<Genome>> {
    if merged.is_empty() {
        return Ok(merged);
    }
    let thresholds = SlackThresholds::from_population(&merged, threshold_ratio)?;
    let selector = SelectionOperator::SlackBinaryTournament(SlackComparator::new(thresholds, variant));

    let mut keyed: Vec<(f64, Genome)> = merged
        .into_iter()
        .map(|g| Ok((g.objective(Objective::Accuracy)?, g)))
        .collect::<Result<_>>()?;
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let elite_count = ((elite_ratio * size as f64).round() as usize).min(keyed.len());
    let mut result: Vec<Genome> = keyed.into_iter().map(|(_, g)| g).collect();
    let rest = result.split_off(elite_count);

    while result.len() < size {
        let winner = selector.execute(&rest, rng)?.clone();
        result.push(winner);
    }
    result.truncate(size);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn evaluated(objectives: [f64; 3]) -> Genome {
        let mut genome = Genome::new(vec![[0.5; 13]]).unwrap();
        genome.set_objectives(objectives);
        genome
    }

    fn random_population(n: usize, rng: &mut StdRng) -> Vec<Genome> {
        (0..n)
            .map(|_| evaluated([rng.gen::<f64>() + 0.1, rng.gen::<f64>() + 0.1, rng.gen::<f64>() + 0.1]))
            .collect()
    }

    #[test]
    fn test_output_size_for_any_offspring_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let strategies = [
            Replacement::RankingAndCrowding {
                policy: TruncationPolicy::Sequential,
            },
            Replacement::RankingAndCrowding {
                policy: TruncationPolicy::OneShot,
            },
            Replacement::EliteSlackTournament {
                elite_ratio: 0.1,
                variant: SlackVariant::PreferredThenDominance,
                threshold_ratio: 0.005,
            },
        ];
        for replacement in &strategies {
            for m in [0, 1, 7, 10, 25] {
                let parents = random_population(10, &mut rng);
                let offspring = random_population(m, &mut rng);
                let next = replacement.replace(parents, offspring, &mut rng).unwrap();
                assert_eq!(next.len(), 10);
            }
        }
    }

    #[test]
    fn test_first_front_preferred() {
        let mut rng = StdRng::seed_from_u64(0);
        let parents = vec![evaluated([5.0, 5.0, 5.0]), evaluated([6.0, 6.0, 6.0])];
        let offspring = vec![evaluated([1.0, 1.0, 1.0]), evaluated([2.0, 2.0, 2.0])];
        let replacement = Replacement::RankingAndCrowding {
            policy: TruncationPolicy::Sequential,
        };
        let next = replacement.replace(parents, offspring, &mut rng).unwrap();
        let objectives: Vec<[f64; 3]> = next.iter().map(|g| g.objectives().unwrap()).collect();
        assert_eq!(objectives, vec![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    }

    #[test]
    fn test_truncation_keeps_extremes() {
        let mut rng = StdRng::seed_from_u64(0);
        // one front on a line, the middle point is the most crowded
        let front = vec![
            evaluated([1.0, 5.0, 3.0]),
            evaluated([2.0, 4.0, 3.0]),
            evaluated([2.1, 3.9, 3.0]),
            evaluated([5.0, 1.0, 3.0]),
        ];
        for policy in [TruncationPolicy::Sequential, TruncationPolicy::OneShot] {
            let replacement = Replacement::RankingAndCrowding { policy };
            let next = replacement.replace(front[..3].to_vec(), front[3..].to_vec(), &mut rng).unwrap();
            let accuracies: Vec<f64> = next.iter().map(|g| g.objectives().unwrap()[0]).collect();
            assert!(accuracies.contains(&1.0));
            assert!(accuracies.contains(&5.0));
            assert_eq!(next.len(), 3);
        }
    }

    #[test]
    fn test_elite_keeps_best_accuracy() {
        let mut rng = StdRng::seed_from_u64(3);
        let parents: Vec<Genome> = (0..10).map(|i| evaluated([i as f64 + 1.0, 1.0, 1.0])).collect();
        let offspring = vec![evaluated([0.5, 9.0, 9.0])];
        let replacement = Replacement::EliteSlackTournament {
            elite_ratio: 0.2,
            variant: SlackVariant::Lexicographic,
            threshold_ratio: 0.0,
        };
        let next = replacement.replace(parents, offspring, &mut rng).unwrap();
        assert_eq!(next.len(), 10);
        assert_eq!(next[0].objectives().unwrap()[0], 0.5);
        assert_eq!(next[1].objectives().unwrap()[0], 1.0);
    }

    #[test]
    fn test_unevaluated_offspring_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let parents = random_population(4, &mut rng);
        let offspring = vec![Genome::new(vec![[0.5; 13]]).unwrap()];
        let replacement = Replacement::RankingAndCrowding {
            policy: TruncationPolicy::OneShot,
        };
        assert!(replacement.replace(parents, offspring, &mut rng).is_err());
    }
}
