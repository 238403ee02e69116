//! # flapneat - a Flappy-Bird clone flown by evolved networks
//!
//! A population of agents flies through scrolling obstacles; each agent is
//! steered by a feed-forward network whose genome is evolved with NEAT.

pub mod config;
pub mod entity;
pub mod error;
pub mod frontend;
pub mod neat;
pub mod render;
pub mod simulation;
pub mod training;

pub use crate::config::FlapConfig;
pub use training::Trainer;

/// Common imports for internal use
pub mod prelude {
    pub use crate::config::{FlapConfig, GameConfig};
    pub use crate::entity::{Agent, Ground, Obstacle};
    pub use crate::frontend::{Frontend, HeadlessFrontend};
    pub use crate::render::SpriteSet;
    pub use crate::simulation::{
        Controller, GenerationReport, GenerationSimulator, Participant, RunContext, Termination,
    };
}
