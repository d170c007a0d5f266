pub mod traits;
pub mod evolution;
pub mod operators;
pub mod genome;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use evolution::{EvolutionConfig, LengthVariationMode, ReplacementMethod, SelectionMethod};
pub use operators::OperatorConfig;
pub use genome::GenomeConfig;
