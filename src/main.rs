use anyhow::Context;
use moeec::config::ConfigManager;
use moeec::engines::evaluation::SurrogateProblem;
use moeec::engines::generation::{best_objective, ConsoleRecorder, EvolutionEngine, KneePointSelector};
use moeec::types::Objective;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let manager = ConfigManager::new();
    if let Some(path) = std::env::args().nth(1) {
        manager
            .load_from_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?;
    }
    let config = manager.get()?;

    let problem = SurrogateProblem::from_config(&config.genome);
    let mut engine = EvolutionEngine::new(config, problem)?;
    engine.run(&mut ConsoleRecorder)?;

    let mut front = engine.pareto_front()?;
    if front.len() >= 3 {
        let knee = KneePointSelector.execute(&mut front)?;
        log::info!("Knee point: {:?}", front[knee].objectives()?);
    }
    if !front.is_empty() {
        let best = best_objective(&front, Objective::Accuracy, true)?;
        log::info!("Best accuracy: {:?} with {} learners", best.objectives()?, best.k());
    }

    println!("{}", serde_json::to_string_pretty(&front)?);
    Ok(())
}
