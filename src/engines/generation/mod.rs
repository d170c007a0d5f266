pub mod genome;
pub mod comparator;
pub mod pareto;
pub mod clustering;
pub mod operators;
pub mod strategy;
pub mod reproduction;
pub mod replacement;
pub mod initializer;
pub mod solution_selector;
pub mod evolution_engine;
pub mod progress;

pub use genome::{GeneBounds, GeneRow, Genome};
pub use comparator::{DominanceComparator, SlackComparator, SlackThresholds};
pub use pareto::{crowding_distance, fast_non_dominated_sort, non_dominated, Ranking};
pub use clustering::KMeans;
pub use strategy::{AdaptiveDecider, VariationDecider};
pub use reproduction::Reproduction;
pub use replacement::Replacement;
pub use initializer::Initializer;
pub use solution_selector::{best_objective, nth_best, KneePointSelector};
pub use evolution_engine::{EngineState, EvolutionEngine};
pub use progress::{
    ChannelRecorder, ConsoleRecorder, DeciderKind, MemoryRecorder, NullRecorder, Recorder, RecorderMessage,
};
