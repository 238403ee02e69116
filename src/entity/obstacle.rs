//! Pipe-style obstacle: two barriers around a randomly placed gap

use rand::Rng;

use super::agent::Agent;
use crate::config::GameConfig;
use crate::render::SpriteSet;

/// Geometry and motion shared by every obstacle of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleParams {
    pub gap: f32,
    pub speed: f32,
    pub gap_center_min: i32,
    pub gap_center_max: i32,
    /// Height of one barrier sprite
    pub barrier_height: f32,
    pub width: f32,
}

impl ObstacleParams {
    pub fn new(config: &GameConfig, sprites: &SpriteSet) -> Self {
        Self {
            gap: config.obstacle_gap,
            speed: config.obstacle_speed,
            gap_center_min: config.gap_center_min,
            gap_center_max: config.gap_center_max,
            barrier_height: sprites.obstacle_height() as f32,
            width: sprites.obstacle_width() as f32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub gap_center: f32,
    /// Top edge of the upper barrier (usually above the screen)
    pub top: f32,
    /// Top edge of the lower barrier
    pub bottom: f32,
    pub passed: bool,
    params: ObstacleParams,
}

impl Obstacle {
    /// Obstacle at `x` with a random gap
    pub fn new<R: Rng + ?Sized>(x: f32, params: ObstacleParams, rng: &mut R) -> Self {
        let mut obstacle = Self::with_gap_center(x, params.gap_center_min as f32, params);
        obstacle.randomize_gap(rng);
        obstacle
    }

    /// Obstacle at `x` with a fixed gap
    pub fn with_gap_center(x: f32, gap_center: f32, params: ObstacleParams) -> Self {
        let mut obstacle = Self {
            x,
            gap_center: 0.0,
            top: 0.0,
            bottom: 0.0,
            passed: false,
            params,
        };
        obstacle.set_gap_center(gap_center);
        obstacle
    }

    fn set_gap_center(&mut self, gap_center: f32) {
        self.gap_center = gap_center;
        self.top = gap_center - self.params.barrier_height;
        self.bottom = gap_center + self.params.gap;
    }

    /// Draw a new gap position from `[gap_center_min, gap_center_max)`
    pub fn randomize_gap<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (min, max) = (self.params.gap_center_min, self.params.gap_center_max);
        let center = if max > min {
            rng.random_range(min..max)
        } else {
            min
        };
        self.set_gap_center(center as f32);
    }

    pub fn advance_tick(&mut self) {
        self.x -= self.params.speed;
    }

    /// Pixel-exact overlap of the agent with either barrier
    pub fn collides_with(&self, agent: &Agent, sprites: &SpriteSet) -> bool {
        let agent_mask = agent.collision_mask(sprites);
        let (ax, ay) = agent.pixel_position();
        let dx = self.x.round_ties_even() as i32 - ax;
        let top_dy = self.top.round_ties_even() as i32 - ay;
        let bottom_dy = self.bottom.round_ties_even() as i32 - ay;

        agent_mask
            .overlap(sprites.obstacle_top_mask(), (dx, top_dy))
            .is_some()
            || agent_mask
                .overlap(sprites.obstacle_bottom_mask(), (dx, bottom_dy))
                .is_some()
    }

    /// Fully scrolled past the left screen edge
    pub fn is_offscreen(&self) -> bool {
        self.x + self.params.width < 0.0
    }

    pub fn width(&self) -> f32 {
        self.params.width
    }
}
