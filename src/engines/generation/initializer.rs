use super::genome::Genome;
use crate::engines::evaluation::Problem;
use crate::error::{MoeecError, Result};
use rand::RngCore;

/// Source of the first population.
#[derive(Debug, Clone)]
pub enum Initializer {
    /// `population_size` fresh genomes from `Problem::create_solution`.
    Random { population_size: usize },
    /// A caller-provided population, used as is.
    Preset(Vec<Genome>),
}

impl Initializer {
    pub fn create<P: Problem + ?Sized>(
        &self,
        problem: &P,
        population_size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>> {
        let population = match self {
            Initializer::Random { population_size: size } => {
                if *size != population_size {
                    return Err(MoeecError::InvalidInput(format!(
                        "initializer creates {} genomes, population size is {}",
                        size, population_size
                    )));
                }
                (0..*size)
                    .map(|_| problem.create_solution(rng))
                    .collect::<Result<Vec<_>>>()?
            }
            Initializer::Preset(genomes) => {
                if genomes.len() != population_size {
                    return Err(MoeecError::InvalidInput(format!(
                        "preset population has {} genomes, expected {}",
                        genomes.len(),
                        population_size
                    )));
                }
                genomes.clone()
            }
        };
        log::debug!("initial population of {} genomes for {}", population.len(), problem.name());
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::SurrogateProblem;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_initializer() {
        let problem = SurrogateProblem::default();
        let mut rng = StdRng::seed_from_u64(7);
        let population = Initializer::Random { population_size: 12 }
            .create(&problem, 12, &mut rng)
            .unwrap();
        assert_eq!(population.len(), 12);
        assert!(population.iter().all(|g| !g.is_evaluated()));
    }

    #[test]
    fn test_preset_size_mismatch() {
        let problem = SurrogateProblem::default();
        let mut rng = StdRng::seed_from_u64(7);
        let genomes = vec![Genome::new(vec![[0.5; 13]]).unwrap(); 4];
        let preset = Initializer::Preset(genomes);
        assert!(preset.create(&problem, 4, &mut rng).is_ok());
        assert!(matches!(
            preset.create(&problem, 5, &mut rng),
            Err(MoeecError::InvalidInput(_))
        ));
    }
}
