use super::comparator::SlackThresholds;
use super::genome::Genome;
use crate::error::Result;
use crate::types::Objective;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

/// Which adaptive decider a probability vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeciderKind {
    Crossover,
    LengthVariation,
}

/// One genome as seen by the telemetry sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub objectives: Option<[f64; 3]>,
    pub cluster_label: Option<usize>,
    pub length: usize,
}

impl From<&Genome> for GenomeRecord {
    fn from(genome: &Genome) -> Self {
        Self {
            objectives: genome.objectives().ok(),
            cluster_label: genome.attributes.cluster_label,
            length: genome.k(),
        }
    }
}

pub fn snapshot(population: &[Genome]) -> Vec<GenomeRecord> {
    population.iter().map(GenomeRecord::from).collect()
}

/// Write-only per-generation telemetry. The engine never reads it back.
pub trait Recorder {
    fn record_population(&mut self, epoch: usize, population: &[Genome]);
    fn record_cluster_advantage(&mut self, epoch: usize, advantage: &[Objective]);
    fn record_strategy_probabilities(&mut self, epoch: usize, decider: DeciderKind, probabilities: &[f64]);
    fn record_thresholds(&mut self, epoch: usize, thresholds: &SlackThresholds);
}

/// Keeps every record in memory, keyed by epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecorder {
    pub populations: BTreeMap<usize, Vec<GenomeRecord>>,
    pub cluster_advantage: BTreeMap<usize, Vec<Objective>>,
    pub strategy_probabilities: BTreeMap<usize, BTreeMap<DeciderKind, Vec<f64>>>,
    pub thresholds: BTreeMap<usize, [f64; 3]>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Recorder for MemoryRecorder {
    fn record_population(&mut self, epoch: usize, population: &[Genome]) {
        self.populations.insert(epoch, snapshot(population));
    }

    fn record_cluster_advantage(&mut self, epoch: usize, advantage: &[Objective]) {
        self.cluster_advantage.insert(epoch, advantage.to_vec());
    }

    fn record_strategy_probabilities(&mut self, epoch: usize, decider: DeciderKind, probabilities: &[f64]) {
        self.strategy_probabilities
            .entry(epoch)
            .or_default()
            .insert(decider, probabilities.to_vec());
    }

    fn record_thresholds(&mut self, epoch: usize, thresholds: &SlackThresholds) {
        self.thresholds.insert(epoch, thresholds.0);
    }
}

/// Logs a one-line summary per record through `log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleRecorder;

impl Recorder for ConsoleRecorder {
    fn record_population(&mut self, epoch: usize, population: &[Genome]) {
        let mut best = [f64::INFINITY; 3];
        for objectives in population.iter().filter_map(|g| g.objectives().ok()) {
            for (b, v) in best.iter_mut().zip(objectives) {
                *b = b.min(v);
            }
        }
        let mean_length = population.iter().map(Genome::k).sum::<usize>() as f64 / population.len().max(1) as f64;
        log::info!(
            "Epoch {}: best accuracy {:.6}, diversity {:.6}, complexity {:.6}, mean length {:.1}",
            epoch,
            best[0],
            best[1],
            best[2],
            mean_length
        );
    }

    fn record_cluster_advantage(&mut self, epoch: usize, advantage: &[Objective]) {
        log::info!("Epoch {}: cluster advantage {:?}", epoch, advantage);
    }

    fn record_strategy_probabilities(&mut self, epoch: usize, decider: DeciderKind, probabilities: &[f64]) {
        log::info!("Epoch {}: {:?} probabilities {:?}", epoch, decider, probabilities);
    }

    fn record_thresholds(&mut self, epoch: usize, thresholds: &SlackThresholds) {
        log::debug!("Epoch {}: slack thresholds {:?}", epoch, thresholds.0);
    }
}

pub enum RecorderMessage {
    Population { epoch: usize, genomes: Vec<GenomeRecord> },
    ClusterAdvantage { epoch: usize, advantage: Vec<Objective> },
    StrategyProbabilities { epoch: usize, decider: DeciderKind, probabilities: Vec<f64> },
    Thresholds { epoch: usize, thresholds: [f64; 3] },
}

/// Forwards every record to another thread.
pub struct ChannelRecorder {
    sender: Sender<RecorderMessage>,
}

impl ChannelRecorder {
    pub fn new(sender: Sender<RecorderMessage>) -> Self {
        Self { sender }
    }
}

impl Recorder for ChannelRecorder {
    fn record_population(&mut self, epoch: usize, population: &[Genome]) {
        let _ = self.sender.send(RecorderMessage::Population {
            epoch,
            genomes: snapshot(population),
        });
    }

    fn record_cluster_advantage(&mut self, epoch: usize, advantage: &[Objective]) {
        let _ = self.sender.send(RecorderMessage::ClusterAdvantage {
            epoch,
            advantage: advantage.to_vec(),
        });
    }

    fn record_strategy_probabilities(&mut self, epoch: usize, decider: DeciderKind, probabilities: &[f64]) {
        let _ = self.sender.send(RecorderMessage::StrategyProbabilities {
            epoch,
            decider,
            probabilities: probabilities.to_vec(),
        });
    }

    fn record_thresholds(&mut self, epoch: usize, thresholds: &SlackThresholds) {
        let _ = self.sender.send(RecorderMessage::Thresholds {
            epoch,
            thresholds: thresholds.0,
        });
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record_population(&mut self, _epoch: usize, _population: &[Genome]) {}
    fn record_cluster_advantage(&mut self, _epoch: usize, _advantage: &[Objective]) {}
    fn record_strategy_probabilities(&mut self, _epoch: usize, _decider: DeciderKind, _probabilities: &[f64]) {}
    fn record_thresholds(&mut self, _epoch: usize, _thresholds: &SlackThresholds) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn population() -> Vec<Genome> {
        let mut a = Genome::new(vec![[0.5; 13]; 2]).unwrap();
        a.set_objectives([1.0, 2.0, 3.0]);
        a.attributes.cluster_label = Some(1);
        let b = Genome::new(vec![[0.5; 13]]).unwrap();
        vec![a, b]
    }

    #[test]
    fn test_memory_recorder_snapshot() {
        let mut recorder = MemoryRecorder::new();
        recorder.record_population(0, &population());
        recorder.record_strategy_probabilities(1, DeciderKind::Crossover, &[0.5, 0.5]);
        recorder.record_strategy_probabilities(1, DeciderKind::LengthVariation, &[0.2, 0.3, 0.5]);

        let records = &recorder.populations[&0];
        assert_eq!(records[0].objectives, Some([1.0, 2.0, 3.0]));
        assert_eq!(records[0].cluster_label, Some(1));
        assert_eq!(records[0].length, 2);
        assert_eq!(records[1].objectives, None);
        assert_eq!(recorder.strategy_probabilities[&1].len(), 2);

        let json = recorder.to_json().unwrap();
        let back: MemoryRecorder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.populations, recorder.populations);
    }

    #[test]
    fn test_channel_recorder_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut recorder = ChannelRecorder::new(tx);
        recorder.record_thresholds(3, &SlackThresholds([0.1, 0.2, 0.3]));
        recorder.record_cluster_advantage(3, &[Objective::Accuracy, Objective::Complexity, Objective::Diversity]);

        match rx.recv().unwrap() {
            RecorderMessage::Thresholds { epoch, thresholds } => {
                assert_eq!(epoch, 3);
                assert_eq!(thresholds, [0.1, 0.2, 0.3]);
            }
            _ => panic!("expected thresholds first"),
        }
        assert!(matches!(rx.recv().unwrap(), RecorderMessage::ClusterAdvantage { epoch: 3, .. }));
    }
}
