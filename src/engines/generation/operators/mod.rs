pub mod selection;
pub mod crossover;
pub mod mutation;

pub use selection::{advantage_objectives, cluster_aware_selection, SelectionOperator};
pub use crossover::{SbxCrossover, SwapCrossover, VariableLengthCrossover};
pub use mutation::{FixedLengthMutation, MutationOperator, PolynomialMutation, VariableLengthMutation};
