/// Strategy deciders for the reproduction step.
///
/// `AdaptiveDecider` learns selection probabilities from how many tagged
/// children of each strategy survive replacement, over a sliding window of
/// `learning_period` generations. Until the window is full the
/// probabilities stay uniform.
use super::genome::Genome;
use crate::config::LengthVariationMode;
use crate::error::{MoeecError, Result};
use crate::types::{CrossoverStrategy, LengthVariation};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::VecDeque;
use std::fmt::Debug;

/// Success ratio used when a strategy has no successes (or no children).
pub const SUCCESS_FLOOR: f64 = 1e-2;

/// A closed set of strategies a decider can choose from.
pub trait StrategySet: Copy + Eq + Debug + 'static {
    const ALL: &'static [Self];

    fn position(self) -> usize;

    /// The strategy a genome was produced with, if any.
    fn tag_of(genome: &Genome) -> Option<Self>;
}

impl StrategySet for LengthVariation {
    const ALL: &'static [Self] = &LengthVariation::ALL;

    fn position(self) -> usize {
        match self {
            LengthVariation::Variation1 => 0,
            LengthVariation::Variation2 => 1,
            LengthVariation::Fixed => 2,
        }
    }

    fn tag_of(genome: &Genome) -> Option<Self> {
        genome.attributes.variation_strategy
    }
}

impl StrategySet for CrossoverStrategy {
    const ALL: &'static [Self] = &CrossoverStrategy::ALL;

    fn position(self) -> usize {
        match self {
            CrossoverStrategy::Inside => 0,
            CrossoverStrategy::Outside => 1,
        }
    }

    fn tag_of(genome: &Genome) -> Option<Self> {
        genome.attributes.strategy
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveDecider<S: StrategySet> {
    learning_period: usize,
    success_memory: VecDeque<Vec<usize>>,
    fail_memory: VecDeque<Vec<usize>>,
    probabilities: Vec<f64>,
    _strategies: std::marker::PhantomData<S>,
}

impl<S: StrategySet> AdaptiveDecider<S> {
    pub fn new(learning_period: usize) -> Result<Self> {
        if learning_period == 0 {
            return Err(MoeecError::InvalidInput(
                "learning period must be at least 1".to_string(),
            ));
        }
        let n = S::ALL.len();
        Ok(Self {
            learning_period,
            success_memory: VecDeque::with_capacity(learning_period),
            fail_memory: VecDeque::with_capacity(learning_period),
            probabilities: vec![1.0 / n as f64; n],
            _strategies: std::marker::PhantomData,
        })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Count flagged children per strategy in `offspring` (produced) and in
    /// `survivors` (successes, capped at produced), then refresh the
    /// probabilities once the window is full.
    pub fn update_memory(&mut self, offspring: &[Genome], survivors: &[Genome]) {
        let produced = count_tagged::<S>(offspring);
        let mut successes = count_tagged::<S>(survivors);
        for (s, p) in successes.iter_mut().zip(&produced) {
            *s = (*s).min(*p);
        }
        let failures: Vec<usize> = produced.iter().zip(&successes).map(|(p, s)| p - s).collect();

        if self.success_memory.len() < self.learning_period {
            self.success_memory.push_back(successes);
            self.fail_memory.push_back(failures);
            return;
        }

        self.success_memory.pop_front();
        self.fail_memory.pop_front();
        self.success_memory.push_back(successes);
        self.fail_memory.push_back(failures);

        let n = S::ALL.len();
        let mut ratios = vec![0.0; n];
        for (i, ratio) in ratios.iter_mut().enumerate() {
            let s: usize = self.success_memory.iter().map(|row| row[i]).sum();
            let f: usize = self.fail_memory.iter().map(|row| row[i]).sum();
            let value = s as f64 / (s + f) as f64;
            *ratio = if value.is_nan() || value == 0.0 { SUCCESS_FLOOR } else { value };
        }

        let total: f64 = ratios.iter().sum();
        self.probabilities = ratios.into_iter().map(|r| r / total).collect();
        log::debug!("adaptive probabilities {:?} over {:?}", self.probabilities, S::ALL);
    }

    pub fn execute<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<S> {
        let distribution = WeightedIndex::new(&self.probabilities)
            .map_err(|e| MoeecError::InvalidInput(format!("invalid strategy weights: {}", e)))?;
        Ok(S::ALL[distribution.sample(rng)])
    }
}

fn count_tagged<S: StrategySet>(population: &[Genome]) -> Vec<usize> {
    let mut counts = vec![0; S::ALL.len()];
    for genome in population.iter().filter(|g| g.attributes.strategy_flag) {
        if let Some(strategy) = S::tag_of(genome) {
            counts[strategy.position()] += 1;
        }
    }
    counts
}

/// Chooses the length variation of the intra-cluster pass.
#[derive(Debug, Clone)]
pub enum VariationDecider {
    Fixed(LengthVariation),
    /// Uniform thirds every generation.
    Random,
    /// Fixed early, variation2 mid-run, variation1 late.
    EpochBased { max_epoch: usize },
    Adaptive(AdaptiveDecider<LengthVariation>),
}

impl VariationDecider {
    pub fn from_mode(mode: LengthVariationMode, max_epoch: usize, learning_period: usize) -> Result<Self> {
        Ok(match mode {
            LengthVariationMode::Fixed => VariationDecider::Fixed(LengthVariation::Fixed),
            LengthVariationMode::Variation1 => VariationDecider::Fixed(LengthVariation::Variation1),
            LengthVariationMode::Variation2 => VariationDecider::Fixed(LengthVariation::Variation2),
            LengthVariationMode::Random => VariationDecider::Random,
            LengthVariationMode::EpochBased => VariationDecider::EpochBased { max_epoch },
            LengthVariationMode::Adaptive => VariationDecider::Adaptive(AdaptiveDecider::new(learning_period)?),
        })
    }

    pub fn decide<R: Rng + ?Sized>(&self, epoch: usize, rng: &mut R) -> Result<LengthVariation> {
        match self {
            VariationDecider::Fixed(variation) => Ok(*variation),
            VariationDecider::Random => {
                Ok(LengthVariation::ALL[rng.gen_range(0..LengthVariation::ALL.len())])
            }
            VariationDecider::EpochBased { max_epoch } => {
                let level = evolving_level(epoch, *max_epoch);
                Ok(if level < 1.0 / 3.0 {
                    LengthVariation::Fixed
                } else if level < 2.0 / 3.0 {
                    LengthVariation::Variation2
                } else {
                    LengthVariation::Variation1
                })
            }
            VariationDecider::Adaptive(decider) => decider.execute(rng),
        }
    }

    pub fn update(&mut self, offspring: &[Genome], survivors: &[Genome]) {
        if let VariationDecider::Adaptive(decider) = self {
            decider.update_memory(offspring, survivors);
        }
    }

    pub fn probabilities(&self) -> Option<&[f64]> {
        match self {
            VariationDecider::Adaptive(decider) => Some(decider.probabilities()),
            _ => None,
        }
    }
}

/// Search progress in `[0, 1]` measured by epochs.
pub fn evolving_level(epoch: usize, max_epoch: usize) -> f64 {
    if max_epoch == 0 {
        return 1.0;
    }
    (epoch as f64 / max_epoch as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tagged(strategy: CrossoverStrategy, flag: bool) -> Genome {
        let mut genome = Genome::new(vec![[0.5; 13]]).unwrap();
        genome.attributes.strategy = Some(strategy);
        genome.attributes.strategy_flag = flag;
        genome
    }

    #[test]
    fn test_uniform_until_window_full() {
        let mut decider = AdaptiveDecider::<CrossoverStrategy>::new(2).unwrap();
        let offspring = vec![tagged(CrossoverStrategy::Inside, true)];
        decider.update_memory(&offspring, &offspring);
        decider.update_memory(&offspring, &offspring);
        assert_eq!(decider.probabilities(), &[0.5, 0.5]);
    }

    #[test]
    fn test_probabilities_follow_success() {
        let mut decider = AdaptiveDecider::<CrossoverStrategy>::new(1).unwrap();
        let offspring = vec![
            tagged(CrossoverStrategy::Inside, true),
            tagged(CrossoverStrategy::Inside, true),
            tagged(CrossoverStrategy::Outside, true),
            tagged(CrossoverStrategy::Outside, true),
        ];
        let survivors = vec![
            tagged(CrossoverStrategy::Inside, true),
            tagged(CrossoverStrategy::Inside, true),
            tagged(CrossoverStrategy::Outside, true),
            // parents do not count
            tagged(CrossoverStrategy::Outside, false),
        ];
        decider.update_memory(&offspring, &survivors);
        decider.update_memory(&offspring, &survivors);

        let p = decider.probabilities();
        assert!((p[0] - 1.0 / 1.5).abs() < 1e-12);
        assert!((p[1] - 0.5 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_successes_capped_by_produced() {
        let mut decider = AdaptiveDecider::<CrossoverStrategy>::new(1).unwrap();
        let offspring = vec![tagged(CrossoverStrategy::Inside, true)];
        let survivors = vec![
            tagged(CrossoverStrategy::Inside, true),
            tagged(CrossoverStrategy::Inside, true),
        ];
        decider.update_memory(&offspring, &survivors);
        decider.update_memory(&offspring, &survivors);
        let p = decider.probabilities();
        assert!((p[0] - 1.0 / 1.01).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_sum_to_one_with_zero_counts() {
        let mut decider = AdaptiveDecider::<LengthVariation>::new(3).unwrap();
        for _ in 0..5 {
            decider.update_memory(&[], &[]);
            let total: f64 = decider.probabilities().iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert_eq!(decider.probabilities().len(), 3);
    }

    #[test]
    fn test_execute_respects_weights() {
        let mut decider = AdaptiveDecider::<CrossoverStrategy>::new(1).unwrap();
        decider.probabilities = vec![1.0, 0.0];
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(decider.execute(&mut rng).unwrap(), CrossoverStrategy::Inside);
        }
    }

    #[test]
    fn test_epoch_based_schedule() {
        let decider = VariationDecider::EpochBased { max_epoch: 9 };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(decider.decide(0, &mut rng).unwrap(), LengthVariation::Fixed);
        assert_eq!(decider.decide(4, &mut rng).unwrap(), LengthVariation::Variation2);
        assert_eq!(decider.decide(8, &mut rng).unwrap(), LengthVariation::Variation1);
    }

    #[test]
    fn test_zero_learning_period_rejected() {
        assert!(AdaptiveDecider::<LengthVariation>::new(0).is_err());
    }
}
