use crate::error::MoeecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three minimized objectives, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Accuracy,
    Diversity,
    Complexity,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Accuracy, Objective::Diversity, Objective::Complexity];

    /// Position of this objective inside an objective triple.
    pub fn index(self) -> usize {
        match self {
            Objective::Accuracy => 0,
            Objective::Diversity => 1,
            Objective::Complexity => 2,
        }
    }

    /// Comparison order used by the slack comparator when `self` is preferred.
    pub fn priority(self) -> [Objective; 3] {
        match self {
            Objective::Accuracy => [Objective::Accuracy, Objective::Complexity, Objective::Diversity],
            Objective::Diversity => [Objective::Diversity, Objective::Accuracy, Objective::Complexity],
            Objective::Complexity => [Objective::Complexity, Objective::Accuracy, Objective::Diversity],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Objective::Accuracy => "accuracy",
            Objective::Diversity => "diversity",
            Objective::Complexity => "complexity",
        }
    }
}

/// How the unaligned tail of the longer parent is distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthVariation {
    Variation1,
    Variation2,
    Fixed,
}

impl LengthVariation {
    pub const ALL: [LengthVariation; 3] = [
        LengthVariation::Variation1,
        LengthVariation::Variation2,
        LengthVariation::Fixed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LengthVariation::Variation1 => "variation1",
            LengthVariation::Variation2 => "variation2",
            LengthVariation::Fixed => "fixed",
        }
    }
}

/// Row-level recombination applied to aligned gene rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneCrossover {
    Sbx,
    Swap,
    Nothing,
}

/// Where a child was produced: inside its own cluster or across clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverStrategy {
    Inside,
    Outside,
}

impl CrossoverStrategy {
    pub const ALL: [CrossoverStrategy; 2] = [CrossoverStrategy::Inside, CrossoverStrategy::Outside];

    pub fn as_str(self) -> &'static str {
        match self {
            CrossoverStrategy::Inside => "inside",
            CrossoverStrategy::Outside => "outside",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    /// Intra-cluster pass followed by the inter-cluster pass.
    Both,
    Inside,
    Outside,
    /// Coin flip between inside and outside every generation.
    Random,
    /// Inside/outside drawn from the adaptive decider.
    Adaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterClusterMode {
    PairwiseSwap,
    HalfPool,
}

/// Crowding-based truncation of the overflowing front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Drop the most crowded member, recompute, repeat.
    Sequential,
    /// One crowding pass, keep the top members.
    OneShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlackVariant {
    /// Priority walk over all three objectives.
    Lexicographic,
    /// Only the preferred objective counts.
    PreferredOnly,
    /// Preferred objective, then Pareto dominance on a tie.
    PreferredThenDominance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Add,
    Delete,
    Modify,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [MutationKind::Add, MutationKind::Delete, MutationKind::Modify];
}

fn unsupported(kind: &str, value: &str) -> MoeecError {
    MoeecError::UnsupportedOption(format!("unknown {} '{}'", kind, value))
}

impl FromStr for Objective {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accuracy" => Ok(Objective::Accuracy),
            "diversity" => Ok(Objective::Diversity),
            "complexity" => Ok(Objective::Complexity),
            _ => Err(unsupported("objective", s)),
        }
    }
}

impl FromStr for LengthVariation {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "variation1" => Ok(LengthVariation::Variation1),
            "variation2" => Ok(LengthVariation::Variation2),
            "fixed" => Ok(LengthVariation::Fixed),
            _ => Err(unsupported("length variation", s)),
        }
    }
}

impl FromStr for GeneCrossover {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sbx" => Ok(GeneCrossover::Sbx),
            "swap" => Ok(GeneCrossover::Swap),
            "nothing" => Ok(GeneCrossover::Nothing),
            _ => Err(unsupported("gene crossover", s)),
        }
    }
}

impl FromStr for CrossoverStrategy {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inside" => Ok(CrossoverStrategy::Inside),
            "outside" => Ok(CrossoverStrategy::Outside),
            _ => Err(unsupported("crossover strategy", s)),
        }
    }
}

impl FromStr for CrossoverMethod {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "both" => Ok(CrossoverMethod::Both),
            "inside" => Ok(CrossoverMethod::Inside),
            "outside" => Ok(CrossoverMethod::Outside),
            "random" => Ok(CrossoverMethod::Random),
            "adaptive" => Ok(CrossoverMethod::Adaptive),
            _ => Err(unsupported("crossover method", s)),
        }
    }
}

impl FromStr for TruncationPolicy {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(TruncationPolicy::Sequential),
            "one_shot" | "oneshot" => Ok(TruncationPolicy::OneShot),
            _ => Err(unsupported("truncation policy", s)),
        }
    }
}

impl FromStr for MutationKind {
    type Err = MoeecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(MutationKind::Add),
            "delete" => Ok(MutationKind::Delete),
            "modify" => Ok(MutationKind::Modify),
            _ => Err(unsupported("mutation kind", s)),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LengthVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CrossoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
