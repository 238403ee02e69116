//! Decision functions that make agents jump

use crate::neat::FeedForwardNetwork;

/// What an agent sees each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Vertical position of the agent
    pub y: f64,
    /// Absolute vertical distance to the reference obstacle's gap-center
    pub gap_center_distance: f64,
    /// Absolute vertical distance to the top of the lower barrier
    pub bottom_distance: f64,
}

impl Observation {
    pub fn new(y: f64, gap_center: f64, bottom: f64) -> Self {
        Self {
            y,
            gap_center_distance: (y - gap_center).abs(),
            bottom_distance: (y - bottom).abs(),
        }
    }

    /// Network input vector
    pub fn to_array(&self) -> [f64; 3] {
        [self.y, self.gap_center_distance, self.bottom_distance]
    }
}

/// Input polled from the frontend once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub quit: bool,
    pub jump: bool,
}

/// Maps an observation to a jump signal; values above the jump threshold jump
pub trait Controller {
    fn decide(&mut self, observation: &Observation, input: &TickInput) -> f64;
}

impl Controller for FeedForwardNetwork {
    fn decide(&mut self, observation: &Observation, _input: &TickInput) -> f64 {
        match self.activate(&observation.to_array()) {
            Ok(outputs) => outputs.first().copied().unwrap_or(0.0),
            Err(e) => {
                log::warn!("Network evaluation failed: {e}");
                0.0
            }
        }
    }
}

/// Controller backed by a closure over the observation
pub struct FnController<F>(pub F);

impl<F> Controller for FnController<F>
where
    F: FnMut(&Observation) -> f64,
{
    fn decide(&mut self, observation: &Observation, _input: &TickInput) -> f64 {
        (self.0)(observation)
    }
}

/// Wrap a closure as a [`Controller`]
pub fn from_fn<F>(f: F) -> FnController<F>
where
    F: FnMut(&Observation) -> f64,
{
    FnController(f)
}

/// Jumps whenever the player pressed the jump key this tick
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanController;

impl Controller for HumanController {
    fn decide(&mut self, _observation: &Observation, input: &TickInput) -> f64 {
        if input.jump {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neat::{ActivationFunction, ConnectionGene, Genome, GenomeConfig, NodeGene};

    #[test]
    fn test_observation_distances_are_absolute() {
        let obs = Observation::new(350.0, 400.0, 300.0);
        assert_eq!(obs.to_array(), [350.0, 50.0, 50.0]);
    }

    #[test]
    fn test_network_controller_uses_first_output() {
        let config = GenomeConfig {
            activation_default: ActivationFunction::Linear,
            ..GenomeConfig::default()
        };
        let mut genome = Genome::new(1);
        genome.nodes.insert(
            0,
            NodeGene {
                key: 0,
                bias: 0.0,
                activation: ActivationFunction::Linear,
            },
        );
        genome.connections.insert(
            (-2, 0),
            ConnectionGene {
                key: (-2, 0),
                weight: 0.01,
                enabled: true,
            },
        );
        let mut net = FeedForwardNetwork::create(&genome, &config).unwrap();
        let obs = Observation::new(350.0, 300.0, 500.0);
        let out = net.decide(&obs, &TickInput::default());
        assert!((out - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closure_and_human_controllers() {
        let mut always = from_fn(|_: &Observation| 1.0);
        let obs = Observation::new(0.0, 0.0, 0.0);
        assert_eq!(always.decide(&obs, &TickInput::default()), 1.0);

        let mut human = HumanController;
        assert_eq!(human.decide(&obs, &TickInput::default()), 0.0);
        let pressed = TickInput {
            jump: true,
            ..TickInput::default()
        };
        assert_eq!(human.decide(&obs, &pressed), 1.0);
    }
}
