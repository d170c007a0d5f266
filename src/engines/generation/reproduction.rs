/// Cluster-structured crossover and mutation.
///
/// The mating pool is split back into its clusters. The intra-cluster pass
/// pairs neighbours inside a cluster and recombines them with SBX; the
/// inter-cluster passes exchange rows between clusters and write the
/// children back into the parents' slots. Every child is then mutated and
/// repaired by the problem.
use super::clustering::cluster_members;
use super::genome::Genome;
use super::operators::{MutationOperator, VariableLengthCrossover};
use super::strategy::AdaptiveDecider;
use crate::engines::evaluation::Problem;
use crate::error::{MoeecError, Result};
use crate::types::{CrossoverMethod, CrossoverStrategy, GeneCrossover, InterClusterMode, LengthVariation};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// (cluster, position) inside the per-cluster pools.
type Slot = (usize, usize);

/// Half-pool pairings: (c0 first half, c2 first half), (c0 second, c1 first),
/// (c1 second, c2 second).
const HALF_POOL_PAIRS: [(usize, usize); 3] = [(0, 4), (1, 2), (3, 5)];

#[derive(Debug, Clone)]
pub struct Reproduction {
    crossover: VariableLengthCrossover,
    mutation: MutationOperator,
    method: CrossoverMethod,
    inter_cluster_mode: InterClusterMode,
    preserve_length: bool,
}

impl Reproduction {
    pub fn new(
        crossover: VariableLengthCrossover,
        mutation: MutationOperator,
        method: CrossoverMethod,
        inter_cluster_mode: InterClusterMode,
    ) -> Self {
        Self {
            crossover,
            mutation,
            method,
            inter_cluster_mode,
            preserve_length: false,
        }
    }

    /// Force `Fixed` length variation in every pass so genome lengths never change.
    pub fn preserving_length(mut self, preserve: bool) -> Self {
        self.preserve_length = preserve;
        self
    }

    fn effective(&self, variation: LengthVariation) -> LengthVariation {
        if self.preserve_length {
            LengthVariation::Fixed
        } else {
            variation
        }
    }

    /// Produce one child per mating-pool member.
    ///
    /// `decider` is required when the crossover method is adaptive.
    pub fn execute<P, R>(
        &self,
        mating_pool: Vec<Genome>,
        cluster_count: usize,
        variation: LengthVariation,
        decider: Option<&AdaptiveDecider<CrossoverStrategy>>,
        problem: &P,
        rng: &mut R,
    ) -> Result<Vec<Genome>>
    where
        P: Problem + ?Sized,
        R: RngCore,
    {
        let mut pools = split_by_cluster(mating_pool, cluster_count)?;
        let variation = self.effective(variation);

        let (inside, outside) = match self.method {
            CrossoverMethod::Both => (true, true),
            CrossoverMethod::Inside => (true, false),
            CrossoverMethod::Outside => (false, true),
            CrossoverMethod::Random => {
                let inside = rng.gen::<f64>() < 0.5;
                (inside, !inside)
            }
            CrossoverMethod::Adaptive => {
                let decider = decider.ok_or_else(|| {
                    MoeecError::InvalidInput(
                        "adaptive crossover needs a strategy decider".to_string(),
                    )
                })?;
                match decider.execute(rng)? {
                    CrossoverStrategy::Inside => (true, false),
                    CrossoverStrategy::Outside => (false, true),
                }
            }
        };
        log::debug!(
            "reproduction: method {:?}, inside {}, outside {}, variation {}",
            self.method,
            inside,
            outside,
            variation
        );

        if inside {
            pools = self.intra_cluster(pools, variation, rng)?;
        }
        if outside {
            match self.inter_cluster_mode {
                InterClusterMode::PairwiseSwap => self.pairwise_swap(&mut pools, variation, rng)?,
                InterClusterMode::HalfPool => self.half_pool(&mut pools, rng)?,
            }
        }

        let mut offspring = Vec::with_capacity(pools.iter().map(Vec::len).sum());
        for genome in pools.into_iter().flatten() {
            let mutated = self.mutation.execute(genome, rng)?;
            offspring.push(problem.fix_solution(mutated, rng)?);
        }
        Ok(offspring)
    }

    /// Sequential pairs inside each cluster; an odd leftover is passed
    /// through ahead of the children.
    fn intra_cluster<R: Rng + ?Sized>(
        &self,
        pools: Vec<Vec<Genome>>,
        variation: LengthVariation,
        rng: &mut R,
    ) -> Result<Vec<Vec<Genome>>> {
        let mut result = Vec::with_capacity(pools.len());

        for pool in pools {
            let mut children = Vec::with_capacity(pool.len());
            let paired = pool.len() - pool.len() % 2;
            let mut parents = pool.into_iter();
            let mut pairs = Vec::with_capacity(paired / 2);
            for _ in 0..paired / 2 {
                if let (Some(a), Some(b)) = (parents.next(), parents.next()) {
                    pairs.push((a, b));
                }
            }
            children.extend(parents);

            for (a, b) in pairs {
                let (mut x, mut y) = self.crossover.execute(a, b, variation, GeneCrossover::Sbx, rng)?;
                tag(&mut x, CrossoverStrategy::Inside, variation);
                tag(&mut y, CrossoverStrategy::Inside, variation);
                children.push(x);
                children.push(y);
            }
            result.push(children);
        }

        Ok(result)
    }

    /// Every pair of clusters is shuffled and crossed position by position
    /// with whole-row swaps.
    fn pairwise_swap<R: Rng + ?Sized>(
        &self,
        pools: &mut [Vec<Genome>],
        variation: LengthVariation,
        rng: &mut R,
    ) -> Result<()> {
        for c1 in 0..pools.len() {
            for c2 in (c1 + 1)..pools.len() {
                pools[c1].shuffle(rng);
                pools[c2].shuffle(rng);
                for i in 0..pools[c1].len().min(pools[c2].len()) {
                    exchange_slots(pools, (c1, i), (c2, i), |a, b| {
                        let (mut x, mut y) = self.crossover.execute(a, b, variation, GeneCrossover::Swap, rng)?;
                        tag(&mut x, CrossoverStrategy::Outside, variation);
                        tag(&mut y, CrossoverStrategy::Outside, variation);
                        Ok((x, y))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Each cluster is shuffled and halved; three fixed half pairings pool
    /// and redistribute their rows.
    fn half_pool<R: Rng + ?Sized>(&self, pools: &mut [Vec<Genome>], rng: &mut R) -> Result<()> {
        let mut halves: Vec<Vec<Slot>> = Vec::with_capacity(pools.len() * 2);
        for (cluster, pool) in pools.iter_mut().enumerate() {
            pool.shuffle(rng);
            let half = pool.len() / 2;
            halves.push((0..half).map(|i| (cluster, i)).collect());
            halves.push((half..pool.len()).map(|i| (cluster, i)).collect());
        }

        for (h1, h2) in HALF_POOL_PAIRS {
            let (Some(first), Some(second)) = (halves.get(h1), halves.get(h2)) else {
                continue;
            };
            let variation = self.effective(LengthVariation::Variation1);
            for (&slot_a, &slot_b) in first.iter().zip(second.iter()) {
                exchange_slots(pools, slot_a, slot_b, |a, b| {
                    let (mut x, mut y) =
                        self.crossover.execute(a, b, variation, GeneCrossover::Nothing, rng)?;
                    tag(&mut x, CrossoverStrategy::Outside, variation);
                    tag(&mut y, CrossoverStrategy::Outside, variation);
                    Ok((x, y))
                })?;
            }
        }
        Ok(())
    }
}

fn tag(genome: &mut Genome, strategy: CrossoverStrategy, variation: LengthVariation) {
    genome.attributes.strategy = Some(strategy);
    genome.attributes.variation_strategy = Some(variation);
    genome.attributes.strategy_flag = true;
}

/// Replace the genomes at two slots by the pair `produce` derives from them.
fn exchange_slots<F>(pools: &mut [Vec<Genome>], first: Slot, second: Slot, produce: F) -> Result<()>
where
    F: FnOnce(Genome, Genome) -> Result<(Genome, Genome)>,
{
    let a = slot(pools, first)?.clone();
    let b = slot(pools, second)?.clone();
    let (x, y) = produce(a, b)?;
    *slot(pools, first)? = x;
    *slot(pools, second)? = y;
    Ok(())
}

fn slot(pools: &mut [Vec<Genome>], (cluster, index): Slot) -> Result<&mut Genome> {
    let clusters = pools.len();
    let pool = pools.get_mut(cluster).ok_or(MoeecError::IndexOutOfRange {
        index: cluster,
        len: clusters,
    })?;
    let len = pool.len();
    pool.get_mut(index)
        .ok_or(MoeecError::IndexOutOfRange { index, len })
}

/// Regroup a mating pool by cluster label, clearing strategy tags so only
/// this generation's children carry them.
fn split_by_cluster(mating_pool: Vec<Genome>, cluster_count: usize) -> Result<Vec<Vec<Genome>>> {
    let members = cluster_members(&mating_pool, cluster_count)?;
    let mut slots: Vec<Option<Genome>> = mating_pool.into_iter().map(Some).collect();
    let mut pools = Vec::with_capacity(cluster_count);
    for indices in members {
        let mut pool = Vec::with_capacity(indices.len());
        for idx in indices {
            if let Some(mut genome) = slots[idx].take() {
                genome.attributes.clear_strategy();
                pool.push(genome);
            }
        }
        pools.push(pool);
    }
    Ok(pools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::SurrogateProblem;
    use crate::engines::generation::genome::GeneBounds;
    use crate::engines::generation::operators::VariableLengthMutation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mating_pool(sizes: [usize; 3], rng: &mut StdRng) -> Vec<Genome> {
        let bounds = GeneBounds::default();
        let mut pool = Vec::new();
        for (label, &size) in sizes.iter().enumerate() {
            for i in 0..size {
                let rows = (0..(i % 4 + 1)).map(|_| bounds.sample_row(rng)).collect();
                let mut genome = Genome::new(rows).unwrap();
                genome.attributes.cluster_label = Some(label);
                genome.attributes.strategy_flag = true;
                pool.push(genome);
            }
        }
        pool
    }

    fn reproduction(method: CrossoverMethod, mode: InterClusterMode) -> Reproduction {
        let bounds = GeneBounds::default();
        Reproduction::new(
            VariableLengthCrossover::new(1.0, 1.0, 20.0, bounds).unwrap(),
            MutationOperator::VariableLength(VariableLengthMutation::new(0.0, 0.5, 0.2, bounds).unwrap()),
            method,
            mode,
        )
    }

    #[test]
    fn test_inside_tags_only_pairs() {
        let mut rng = StdRng::seed_from_u64(3);
        let problem = SurrogateProblem::default();
        let pool = mating_pool([3, 4, 2], &mut rng);
        let offspring = reproduction(CrossoverMethod::Inside, InterClusterMode::HalfPool)
            .execute(pool, 3, LengthVariation::Fixed, None, &problem, &mut rng)
            .unwrap();

        assert_eq!(offspring.len(), 9);
        let flagged = offspring.iter().filter(|g| g.attributes.strategy_flag).count();
        // one leftover in the cluster of three
        assert_eq!(flagged, 8);
        assert!(offspring
            .iter()
            .filter(|g| g.attributes.strategy_flag)
            .all(|g| g.attributes.strategy == Some(CrossoverStrategy::Inside)));
    }

    #[test]
    fn test_half_pool_keeps_size_and_rows() {
        let mut rng = StdRng::seed_from_u64(8);
        let problem = SurrogateProblem::default();
        let pool = mating_pool([4, 4, 4], &mut rng);
        let rows_before: usize = pool.iter().map(Genome::k).sum();
        let offspring = reproduction(CrossoverMethod::Outside, InterClusterMode::HalfPool)
            .execute(pool, 3, LengthVariation::Fixed, None, &problem, &mut rng)
            .unwrap();

        assert_eq!(offspring.len(), 12);
        let rows_after: usize = offspring.iter().map(Genome::k).sum();
        assert_eq!(rows_before, rows_after);
        assert!(offspring
            .iter()
            .all(|g| g.attributes.strategy == Some(CrossoverStrategy::Outside)));
    }

    #[test]
    fn test_both_with_pairwise_swap() {
        let mut rng = StdRng::seed_from_u64(13);
        let problem = SurrogateProblem::default();
        let pool = mating_pool([5, 3, 4], &mut rng);
        let offspring = reproduction(CrossoverMethod::Both, InterClusterMode::PairwiseSwap)
            .execute(pool, 3, LengthVariation::Variation2, None, &problem, &mut rng)
            .unwrap();
        assert_eq!(offspring.len(), 12);
        assert!(offspring.iter().all(|g| g.k() == g.rows().len() && g.k() >= 1));
    }

    #[test]
    fn test_preserving_length_keeps_every_length() {
        let mut rng = StdRng::seed_from_u64(21);
        let problem = SurrogateProblem::default();
        let bounds = GeneBounds::default();
        let mut pool = Vec::new();
        for label in 0..3 {
            for _ in 0..4 {
                let rows = (0..3).map(|_| bounds.sample_row(&mut rng)).collect();
                let mut genome = Genome::new(rows).unwrap();
                genome.attributes.cluster_label = Some(label);
                pool.push(genome);
            }
        }
        let offspring = reproduction(CrossoverMethod::Both, InterClusterMode::HalfPool)
            .preserving_length(true)
            .execute(pool, 3, LengthVariation::Variation1, None, &problem, &mut rng)
            .unwrap();
        assert!(offspring.iter().all(|g| g.k() == 3));
    }

    #[test]
    fn test_adaptive_requires_decider() {
        let mut rng = StdRng::seed_from_u64(1);
        let problem = SurrogateProblem::default();
        let pool = mating_pool([2, 2, 2], &mut rng);
        let err = reproduction(CrossoverMethod::Adaptive, InterClusterMode::HalfPool)
            .execute(pool, 3, LengthVariation::Fixed, None, &problem, &mut rng)
            .unwrap_err();
        assert!(matches!(err, MoeecError::InvalidInput(_)));
    }

    #[test]
    fn test_adaptive_with_decider() {
        let mut rng = StdRng::seed_from_u64(1);
        let problem = SurrogateProblem::default();
        let decider = AdaptiveDecider::<CrossoverStrategy>::new(2).unwrap();
        let pool = mating_pool([2, 3, 2], &mut rng);
        let offspring = reproduction(CrossoverMethod::Adaptive, InterClusterMode::HalfPool)
            .execute(pool, 3, LengthVariation::Fixed, Some(&decider), &problem, &mut rng)
            .unwrap();
        assert_eq!(offspring.len(), 7);
    }

    #[test]
    fn test_unlabelled_pool_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let problem = SurrogateProblem::default();
        let mut pool = mating_pool([2, 2, 2], &mut rng);
        pool[0].attributes.cluster_label = None;
        assert!(reproduction(CrossoverMethod::Inside, InterClusterMode::HalfPool)
            .execute(pool, 3, LengthVariation::Fixed, None, &problem, &mut rng)
            .is_err());
    }
}
