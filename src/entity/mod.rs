//! Game entities: the agent, obstacles and the ground strip

pub mod agent;
pub mod ground;
pub mod obstacle;

pub use agent::{Agent, AgentPhysics};
pub use ground::Ground;
pub use obstacle::{Obstacle, ObstacleParams};
