//! NeuroEvolution of Augmenting Topologies
//!
//! Evolves feed-forward networks whose structure grows over generations.
//! [`Population::run`] drives the loop; the caller supplies the fitness
//! evaluation and may stop the run early through [`std::ops::ControlFlow`].

pub mod activation;
pub mod config;
pub mod genome;
pub mod network;
pub mod population;
pub mod reporter;
pub mod reproduction;
pub mod species;
pub mod stagnation;

pub use self::config::{
    FitnessCriterion, FloatAttribute, GenomeConfig, NeatConfig, ReproductionConfig,
    SpeciesConfig, StagnationConfig,
};
pub use activation::ActivationFunction;
pub use genome::{ConnectionGene, Genome, GenomeId, InnovationTracker, NodeGene, NodeKey};
pub use network::FeedForwardNetwork;
pub use population::{Population, RunSummary, StopReason};
pub use reporter::{GenerationStats, LogReporter, Reporter, StatisticsReporter};
pub use species::{Species, SpeciesId, SpeciesSet};
