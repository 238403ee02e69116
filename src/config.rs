//! Configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `flapneat.ron` in the working directory (or an explicit `--config` file)
//! 3. Environment variables prefixed with `FLAPNEAT_`
//!
//! Example environment variable: `FLAPNEAT_NEAT__POP_SIZE=100`

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::neat::NeatConfig;

/// Values in an agent's observation, and so network inputs
pub const OBSERVATION_SIZE: usize = 3;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FlapConfig {
    #[serde(default)]
    pub game: GameConfig,

    #[serde(default)]
    pub neat: NeatConfig,

    #[serde(default)]
    pub run: RunConfig,
}

/// Playfield geometry, physics and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Simulation ticks per second for paced frontends
    pub tick_rate: u32,
    pub agent_start_x: f32,
    pub agent_start_y: f32,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_velocity: f32,
    /// Quadratic coefficient of the fall displacement
    pub gravity: f32,
    /// Largest downward displacement per tick
    pub max_fall_displacement: f32,
    /// Extra lift added to any upward displacement
    pub lift_padding: f32,
    /// Vertical opening between the two barriers
    pub obstacle_gap: f32,
    pub obstacle_speed: f32,
    /// Gap-center is drawn uniformly from `[gap_center_min, gap_center_max)`
    pub gap_center_min: i32,
    pub gap_center_max: i32,
    pub first_obstacle_x: f32,
    pub spawn_obstacle_x: f32,
    /// Floor collision y-threshold (top of the ground strip)
    pub ground_y: f32,
    pub ground_speed: f32,
    /// Fitness granted to every live agent each tick
    pub survival_reward: f64,
    /// Fitness granted to every live agent when an obstacle is passed
    pub pass_reward: f64,
    /// Controller outputs above this make the agent jump
    pub jump_threshold: f64,
    /// A generation stops once any agent reaches this fitness
    pub termination_fitness: f64,
    /// Directory with sprite PNGs; procedural sprites are used when unset
    pub assets_dir: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 500,
            screen_height: 800,
            tick_rate: 30,
            agent_start_x: 230.0,
            agent_start_y: 350.0,
            jump_velocity: -10.5,
            gravity: 1.5,
            max_fall_displacement: 16.0,
            lift_padding: 2.0,
            obstacle_gap: 200.0,
            obstacle_speed: 5.0,
            gap_center_min: 50,
            gap_center_max: 450,
            first_obstacle_x: 700.0,
            spawn_obstacle_x: 600.0,
            ground_y: 730.0,
            ground_speed: 5.0,
            survival_reward: 0.1,
            pass_reward: 5.0,
            jump_threshold: 0.5,
            termination_fitness: 1000.0,
            assets_dir: None,
        }
    }
}

/// Training run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Generations to evolve before giving up
    pub max_generations: usize,
    /// RNG seed (random when unset)
    pub seed: Option<u64>,
    /// Where the winner genome and GIF captures are written
    pub output_dir: PathBuf,
    /// Capture every Nth tick into GIFs
    pub gif_frame_interval: usize,
    /// Capture every Nth generation into a GIF (0 = only the first)
    pub gif_generation_interval: usize,
    /// GIF playback speed
    pub gif_fps: u16,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_generations: 50,
            seed: None,
            output_dir: PathBuf::from("flapneat_output"),
            gif_frame_interval: 2,
            gif_generation_interval: 10,
            gif_fps: 15,
        }
    }
}

impl FlapConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path` if given (must exist), otherwise `flapneat.ron` if present
    /// 3. Environment variables prefixed with `FLAPNEAT_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                File::from(path).format(FileFormat::Ron).required(true)
            }
            None => File::with_name("flapneat")
                .format(FileFormat::Ron)
                .required(false),
        };

        let config: FlapConfig = Config::builder()
            // Layer 1: Compiled defaults
            .add_source(Config::try_from(&FlapConfig::default())?)
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (FLAPNEAT_GAME__TICK_RATE, etc.)
            .add_source(
                Environment::with_prefix("FLAPNEAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation or optimizer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.screen_width == 0 || game.screen_height == 0 {
            return Err(ConfigError::invalid(
                "game.screen_width",
                "screen must not be empty",
            ));
        }
        if game.obstacle_gap <= 0.0 {
            return Err(ConfigError::invalid(
                "game.obstacle_gap",
                "gap must be positive",
            ));
        }
        if game.gap_center_min >= game.gap_center_max {
            return Err(ConfigError::invalid(
                "game.gap_center_min",
                format!(
                    "range [{}, {}) is empty",
                    game.gap_center_min, game.gap_center_max
                ),
            ));
        }
        if game.obstacle_speed <= 0.0 || game.ground_speed <= 0.0 {
            return Err(ConfigError::invalid(
                "game.obstacle_speed",
                "speeds must be positive",
            ));
        }
        if game.spawn_obstacle_x <= game.agent_start_x {
            return Err(ConfigError::invalid(
                "game.spawn_obstacle_x",
                "obstacles must spawn ahead of the agents",
            ));
        }
        if game.tick_rate == 0 {
            return Err(ConfigError::invalid("game.tick_rate", "must be at least 1"));
        }
        if self.neat.genome.num_inputs != OBSERVATION_SIZE {
            return Err(ConfigError::invalid(
                "neat.genome.num_inputs",
                format!("agents observe {OBSERVATION_SIZE} values"),
            ));
        }
        self.neat.validate()
    }
}
