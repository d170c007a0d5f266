use crate::engines::generation::genome::Genome;
use crate::error::Result;
use rand::RngCore;

/// The optimization problem the engine drives.
///
/// Implementations own model fitting and objective computation. The engine
/// only calls these four hooks and never inspects the fitted model.
pub trait Problem: Send + Sync {
    fn name(&self) -> &str;

    /// Set `objectives` (and optionally the model handle) on every genome.
    /// Population order must be kept.
    fn evaluate(&self, population: &mut [Genome]) -> Result<()>;

    /// Restore validity after the genetic operators ran. Must be idempotent.
    fn fix_solution(&self, genome: Genome, rng: &mut dyn RngCore) -> Result<Genome>;

    fn create_solution(&self, rng: &mut dyn RngCore) -> Result<Genome>;
}
