//! NEAT hyperparameters
//!
//! Defaults mirror the usual flappy-bird NEAT setup: 50 genomes, tanh
//! outputs, fully connected 3-input/1-output start networks.

use serde::{Deserialize, Serialize};

use super::activation::ActivationFunction;
use crate::error::ConfigError;

/// How a set of fitness values is reduced to a single number
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FitnessCriterion {
    Max,
    Min,
    Mean,
}

impl FitnessCriterion {
    /// Reduce `values`; returns `None` for an empty iterator
    pub fn reduce(&self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let mut count = 0usize;
        let mut acc: Option<f64> = None;
        for value in values {
            count += 1;
            acc = Some(match (self, acc) {
                (_, None) => value,
                (Self::Max, Some(a)) => a.max(value),
                (Self::Min, Some(a)) => a.min(value),
                (Self::Mean, Some(a)) => a + value,
            });
        }
        match self {
            Self::Mean => acc.map(|sum| sum / count as f64),
            _ => acc,
        }
    }

    /// True when `fitness` satisfies `threshold` under this criterion
    pub fn meets(&self, fitness: f64, threshold: f64) -> bool {
        match self {
            Self::Min => fitness <= threshold,
            Self::Max | Self::Mean => fitness >= threshold,
        }
    }
}

/// Everything the optimizer needs, passed through from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeatConfig {
    pub fitness_criterion: FitnessCriterion,
    pub fitness_threshold: f64,
    pub no_fitness_termination: bool,
    pub pop_size: usize,
    pub reset_on_extinction: bool,
    pub genome: GenomeConfig,
    pub species: SpeciesConfig,
    pub stagnation: StagnationConfig,
    pub reproduction: ReproductionConfig,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            fitness_criterion: FitnessCriterion::Max,
            fitness_threshold: 1000.0,
            no_fitness_termination: false,
            pop_size: 50,
            reset_on_extinction: false,
            genome: GenomeConfig::default(),
            species: SpeciesConfig::default(),
            stagnation: StagnationConfig::default(),
            reproduction: ReproductionConfig::default(),
        }
    }
}

/// Bounds and mutation behaviour of a float gene attribute (bias, weight)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatAttribute {
    pub init_mean: f64,
    pub init_stdev: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Standard deviation of a perturbation
    pub mutate_power: f64,
    /// Probability of perturbing the value
    pub mutate_rate: f64,
    /// Probability of replacing the value with a fresh draw
    pub replace_rate: f64,
}

impl FloatAttribute {
    fn standard() -> Self {
        Self {
            init_mean: 0.0,
            init_stdev: 1.0,
            min_value: -30.0,
            max_value: 30.0,
            mutate_power: 0.5,
            mutate_rate: 0.8,
            replace_rate: 0.1,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_value, self.max_value)
    }
}

/// Genome structure and mutation probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_hidden: usize,
    pub activation_default: ActivationFunction,
    pub activation_options: Vec<ActivationFunction>,
    pub activation_mutate_rate: f64,
    pub bias: FloatAttribute,
    pub weight: FloatAttribute,
    pub conn_add_prob: f64,
    pub conn_delete_prob: f64,
    pub node_add_prob: f64,
    pub node_delete_prob: f64,
    pub enabled_default: bool,
    pub enabled_mutate_rate: f64,
    pub compatibility_disjoint_coefficient: f64,
    pub compatibility_weight_coefficient: f64,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            num_inputs: 3,
            num_outputs: 1,
            num_hidden: 0,
            activation_default: ActivationFunction::Tanh,
            activation_options: vec![ActivationFunction::Tanh],
            activation_mutate_rate: 0.0,
            bias: FloatAttribute {
                mutate_rate: 0.7,
                ..FloatAttribute::standard()
            },
            weight: FloatAttribute::standard(),
            conn_add_prob: 0.5,
            conn_delete_prob: 0.5,
            node_add_prob: 0.2,
            node_delete_prob: 0.2,
            enabled_default: true,
            enabled_mutate_rate: 0.01,
            compatibility_disjoint_coefficient: 1.0,
            compatibility_weight_coefficient: 0.5,
        }
    }
}

impl GenomeConfig {
    /// Node ids of the network inputs (`-1, -2, ...`)
    pub fn input_keys(&self) -> Vec<i64> {
        (1..=self.num_inputs as i64).map(|i| -i).collect()
    }

    /// Node ids of the network outputs (`0, 1, ...`)
    pub fn output_keys(&self) -> Vec<i64> {
        (0..self.num_outputs as i64).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesConfig {
    /// Genomes closer than this belong to the same species
    pub compatibility_threshold: f64,
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            compatibility_threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagnationConfig {
    /// How a species' member fitnesses are reduced to the species fitness
    pub species_fitness_func: FitnessCriterion,
    /// Generations without improvement before a species is removed
    pub max_stagnation: usize,
    /// Number of best species protected from stagnation
    pub species_elitism: usize,
}

impl Default for StagnationConfig {
    fn default() -> Self {
        Self {
            species_fitness_func: FitnessCriterion::Max,
            max_stagnation: 20,
            species_elitism: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Champions copied unchanged per species
    pub elitism: usize,
    /// Fraction of each species allowed to breed
    pub survival_threshold: f64,
    pub min_species_size: usize,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            elitism: 2,
            survival_threshold: 0.2,
            min_species_size: 2,
        }
    }
}

impl NeatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pop_size == 0 {
            return Err(ConfigError::invalid("neat.pop_size", "must be at least 1"));
        }
        if self.genome.num_inputs == 0 || self.genome.num_outputs == 0 {
            return Err(ConfigError::invalid(
                "neat.genome.num_inputs",
                "networks need at least one input and one output",
            ));
        }
        if self.genome.activation_options.is_empty() {
            return Err(ConfigError::invalid(
                "neat.genome.activation_options",
                "at least one activation function is required",
            ));
        }
        let survival = self.reproduction.survival_threshold;
        if !(survival > 0.0 && survival <= 1.0) {
            return Err(ConfigError::invalid(
                "neat.reproduction.survival_threshold",
                format!("{survival} is outside (0, 1]"),
            ));
        }
        if self.species.compatibility_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "neat.species.compatibility_threshold",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitness_criterion_reduce() {
        let values = [1.0, 4.0, 2.5];
        assert_eq!(FitnessCriterion::Max.reduce(values), Some(4.0));
        assert_eq!(FitnessCriterion::Min.reduce(values), Some(1.0));
        assert_eq!(FitnessCriterion::Mean.reduce(values), Some(2.5));
        assert_eq!(FitnessCriterion::Max.reduce(std::iter::empty()), None);
    }

    #[test]
    fn test_fitness_criterion_meets() {
        assert!(FitnessCriterion::Max.meets(1000.0, 1000.0));
        assert!(!FitnessCriterion::Max.meets(999.9, 1000.0));
        assert!(FitnessCriterion::Min.meets(0.5, 1.0));
    }

    #[test]
    fn test_io_keys() {
        let config = GenomeConfig::default();
        assert_eq!(config.input_keys(), vec![-1, -2, -3]);
        assert_eq!(config.output_keys(), vec![0]);
    }

    #[test]
    fn test_validate_rejects_bad_survival_threshold() {
        let mut config = NeatConfig::default();
        config.reproduction.survival_threshold = 0.0;
        assert!(config.validate().is_err());
        config.reproduction.survival_threshold = 1.0;
        assert!(config.validate().is_ok());
    }
}
