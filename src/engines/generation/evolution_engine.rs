use crate::config::{AppConfig, SelectionMethod};
use crate::engines::evaluation::Problem;
use crate::engines::generation::{
    clustering::{assign_clusters, KMeans},
    comparator::SlackThresholds,
    genome::Genome,
    initializer::Initializer,
    operators::{advantage_objectives, cluster_aware_selection, MutationOperator, SelectionOperator, VariableLengthCrossover},
    pareto::non_dominated,
    progress::{DeciderKind, Recorder},
    replacement::Replacement,
    reproduction::Reproduction,
    strategy::{AdaptiveDecider, VariationDecider},
};
use crate::error::{MoeecError, Result};
use crate::types::{CrossoverMethod, CrossoverStrategy};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where the engine is inside a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    Initialized,
    Evaluated,
    Clustered,
    Selected,
    Reproduced,
    OffspringEvaluated,
    Replaced,
}

/// Clustering-guided NSGA-II driver.
///
/// Every generation clusters the population in objective space, selects a
/// mating pool per cluster, reproduces inside and across clusters, evaluates
/// the offspring and keeps the best `population_size` genomes of parents
/// plus offspring. The live population only changes once a generation has
/// fully succeeded.
pub struct EvolutionEngine<P: Problem> {
    config: AppConfig,
    problem: P,
    initializer: Initializer,
    kmeans: KMeans,
    selection: SelectionOperator,
    reproduction: Reproduction,
    replacement: Replacement,
    variation_decider: VariationDecider,
    crossover_decider: Option<AdaptiveDecider<CrossoverStrategy>>,
    population: Vec<Genome>,
    epoch: usize,
    state: EngineState,
    rng: StdRng,
}

fn selection_operator(config: &AppConfig) -> SelectionOperator {
    match config.evolution.selection_method {
        SelectionMethod::Roulette => SelectionOperator::RouletteWheel,
        SelectionMethod::Best => SelectionOperator::BestSolution,
        SelectionMethod::Random => SelectionOperator::Random,
        SelectionMethod::BinaryTournament => SelectionOperator::BinaryTournament,
        SelectionMethod::SlackBinaryTournament => SelectionOperator::slack(config.evolution.slack_variant),
    }
}

impl<P: Problem> EvolutionEngine<P> {
    pub fn new(config: AppConfig, problem: P) -> Result<Self> {
        config.validate()?;

        let evolution = &config.evolution;
        let bounds = config.genome.bounds;
        let fixed_length = config.genome.fixed_length.is_some();

        let reproduction = Reproduction::new(
            VariableLengthCrossover::from_config(&config.operators, bounds)?,
            MutationOperator::from_config(&config.operators, bounds, fixed_length)?,
            evolution.crossover_method,
            evolution.inter_cluster_mode,
        )
        .preserving_length(fixed_length);

        let crossover_decider = match evolution.crossover_method {
            CrossoverMethod::Adaptive => Some(AdaptiveDecider::new(evolution.learning_period)?),
            _ => None,
        };

        let rng = match evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            initializer: Initializer::Random {
                population_size: evolution.population_size,
            },
            kmeans: KMeans::new(evolution.cluster_count, evolution.kmeans_restarts, evolution.kmeans_max_iter),
            selection: selection_operator(&config),
            replacement: Replacement::from_config(evolution),
            variation_decider: VariationDecider::from_mode(
                evolution.length_variation,
                evolution.max_epoch,
                evolution.learning_period,
            )?,
            crossover_decider,
            reproduction,
            config,
            problem,
            population: Vec::new(),
            epoch: 0,
            state: EngineState::Created,
            rng,
        })
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Completed generations.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn transition(&mut self, next: EngineState) {
        log::debug!("generation {}: {:?} -> {:?}", self.epoch + 1, self.state, next);
        self.state = next;
    }

    /// Create and evaluate the first population and record it as epoch 0.
    pub fn initialize<C: Recorder + ?Sized>(&mut self, recorder: &mut C) -> Result<()> {
        let size = self.config.evolution.population_size;
        let mut population = self.initializer.create(&self.problem, size, &mut self.rng)?;
        self.state = EngineState::Initialized;

        self.problem.evaluate(&mut population)?;
        for genome in &mut population {
            genome.attributes.clear_strategy();
        }

        self.population = population;
        self.epoch = 0;
        self.state = EngineState::Evaluated;
        recorder.record_population(0, &self.population);
        log::info!(
            "Initialized {} genomes on problem '{}'",
            self.population.len(),
            self.problem.name()
        );
        Ok(())
    }

    /// Run one generation.
    pub fn step<C: Recorder + ?Sized>(&mut self, recorder: &mut C) -> Result<()> {
        if self.state == EngineState::Created {
            return Err(MoeecError::InvalidInput(
                "engine must be initialized before stepping".to_string(),
            ));
        }
        let generation = self.epoch + 1;
        let cluster_count = self.config.evolution.cluster_count;

        let mut population = self.population.clone();
        let members = assign_clusters(&mut population, &self.kmeans, &mut self.rng)?;
        self.transition(EngineState::Clustered);

        let mut parents = population.clone();
        for genome in &mut parents {
            genome.attributes.clear_strategy();
        }

        let mating_pool = if self.selection.is_slack() {
            let thresholds = SlackThresholds::from_population(&population, self.config.evolution.threshold_ratio)?;
            recorder.record_thresholds(generation, &thresholds);
            self.selection.update_thresholds(thresholds);

            let advantage = advantage_objectives(&population, &members)?;
            recorder.record_cluster_advantage(generation, &advantage);
            log::debug!("cluster advantage objectives {:?}", advantage);
            cluster_aware_selection(&population, &members, &self.selection, Some(&advantage), &mut self.rng)?
        } else {
            cluster_aware_selection(&population, &members, &self.selection, None, &mut self.rng)?
        };
        self.transition(EngineState::Selected);

        let variation = self.variation_decider.decide(self.epoch, &mut self.rng)?;
        let mut offspring = self.reproduction.execute(
            mating_pool,
            cluster_count,
            variation,
            self.crossover_decider.as_ref(),
            &self.problem,
            &mut self.rng,
        )?;
        self.transition(EngineState::Reproduced);

        self.problem.evaluate(&mut offspring)?;
        self.transition(EngineState::OffspringEvaluated);

        let survivors = self.replacement.replace(parents, offspring.clone(), &mut self.rng)?;

        if let Some(decider) = self.crossover_decider.as_mut() {
            decider.update_memory(&offspring, &survivors);
            recorder.record_strategy_probabilities(generation, DeciderKind::Crossover, decider.probabilities());
        }
        self.variation_decider.update(&offspring, &survivors);
        if let Some(probabilities) = self.variation_decider.probabilities() {
            recorder.record_strategy_probabilities(generation, DeciderKind::LengthVariation, probabilities);
        }

        self.population = survivors;
        self.epoch = generation;
        self.transition(EngineState::Replaced);
        recorder.record_population(generation, &self.population);

        log::info!(
            "Generation {}/{} complete, {} survivors, {} offspring kept",
            generation,
            self.config.evolution.max_epoch,
            self.population.len(),
            self.population.iter().filter(|g| g.attributes.strategy_flag).count()
        );
        Ok(())
    }

    /// Initialize, then run exactly `max_epoch` generations and return the
    /// final population.
    pub fn run<C: Recorder + ?Sized>(&mut self, recorder: &mut C) -> Result<Vec<Genome>> {
        self.initialize(recorder)?;
        for _ in 0..self.config.evolution.max_epoch {
            self.step(recorder)?;
        }
        Ok(self.population.clone())
    }

    /// Non-dominated genomes of the current population.
    pub fn pareto_front(&self) -> Result<Vec<Genome>> {
        non_dominated(&self.population)
    }
}
