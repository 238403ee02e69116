//! The flapping agent

use crate::config::GameConfig;
use crate::render::{CollisionMask, SpriteSet};

/// Tilt while rising or shortly after a jump
pub const MAX_ROTATION: f32 = 25.0;
/// Nose-down rotation per tick
pub const ROTATION_SPEED: f32 = 20.0;
/// Nose-down rotation never goes below this
pub const MIN_ROTATION: f32 = -90.0;
/// Ticks per animation frame
pub const ANIMATION_TIME: u32 = 5;
/// At or below this tilt the wings stop flapping
const DIVE_TILT: f32 = -80.0;
/// The agent keeps its nose up until it falls this far below its last jump
const TILT_HOLD_DISTANCE: f32 = 50.0;

/// Kinematic constants of the jump/fall model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentPhysics {
    pub jump_velocity: f32,
    pub gravity: f32,
    pub max_fall_displacement: f32,
    pub lift_padding: f32,
}

impl Default for AgentPhysics {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

impl From<&GameConfig> for AgentPhysics {
    fn from(config: &GameConfig) -> Self {
        Self {
            jump_velocity: config.jump_velocity,
            gravity: config.gravity,
            max_fall_displacement: config.max_fall_displacement,
            lift_padding: config.lift_padding,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    /// Ticks since the last jump
    pub tick_count: u32,
    /// Degrees, positive is nose up
    pub tilt: f32,
    /// Vertical position at the last jump
    pub jump_height: f32,
    frame: usize,
    animation_count: u32,
    physics: AgentPhysics,
}

impl Agent {
    pub fn new(x: f32, y: f32, physics: AgentPhysics) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            tick_count: 0,
            tilt: 0.0,
            jump_height: y,
            frame: 0,
            animation_count: 0,
            physics,
        }
    }

    /// Apply the jump impulse and restart the fall timer
    pub fn jump(&mut self) {
        self.velocity = self.physics.jump_velocity;
        self.tick_count = 0;
        self.jump_height = self.y;
    }

    /// One physics step
    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        let t = self.tick_count as f32;

        let mut displacement = self.physics.gravity * t * t + self.velocity * t;
        if displacement > self.physics.max_fall_displacement {
            displacement = self.physics.max_fall_displacement;
        } else if displacement < 0.0 {
            displacement -= self.physics.lift_padding;
        }
        self.y += displacement;

        if displacement < 0.0 || self.y < self.jump_height + TILT_HOLD_DISTANCE {
            if self.tilt < MAX_ROTATION {
                self.tilt = MAX_ROTATION;
            }
        } else if self.tilt > MIN_ROTATION {
            self.tilt = (self.tilt - ROTATION_SPEED).max(MIN_ROTATION);
        }

        self.advance_animation();
    }

    /// Wing cycle up, level, down, level, up
    fn advance_animation(&mut self) {
        self.animation_count += 1;
        let count = self.animation_count;
        if count < ANIMATION_TIME {
            self.frame = 0;
        } else if count < ANIMATION_TIME * 2 {
            self.frame = 1;
        } else if count < ANIMATION_TIME * 3 {
            self.frame = 2;
        } else if count < ANIMATION_TIME * 4 {
            self.frame = 1;
        } else if count > ANIMATION_TIME * 4 {
            self.frame = 0;
            self.animation_count = 0;
        }

        if self.tilt <= DIVE_TILT {
            self.frame = 1;
            self.animation_count = ANIMATION_TIME * 2;
        }
    }

    /// Index of the current animation frame (0..3)
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Solid pixels of the current frame
    pub fn collision_mask<'a>(&self, sprites: &'a SpriteSet) -> &'a CollisionMask {
        sprites.agent_mask(self.frame)
    }

    /// Integer screen position used for collision offsets
    pub fn pixel_position(&self) -> (i32, i32) {
        (
            self.x.round_ties_even() as i32,
            self.y.round_ties_even() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent::new(230.0, 350.0, AgentPhysics::default())
    }

    #[test]
    fn test_new_agent_is_at_rest() {
        let a = agent();
        assert_eq!((a.x, a.y), (230.0, 350.0));
        assert_eq!(a.velocity, 0.0);
        assert_eq!(a.tick_count, 0);
    }

    #[test]
    fn test_jump_resets_velocity_and_timer_together() {
        let mut a = agent();
        for _ in 0..5 {
            a.advance_tick();
        }
        a.jump();
        assert_eq!(a.velocity, -10.5);
        assert_eq!(a.tick_count, 0);
        assert_eq!(a.jump_height, a.y);
    }

    #[test]
    fn test_fall_displacement_is_clamped() {
        let mut a = agent();
        // 1.5, 6, 13.5, then capped at 16
        let expected = [351.5, 357.5, 371.0, 387.0, 403.0];
        for y in expected {
            a.advance_tick();
            assert_eq!(a.y, y);
        }
    }

    #[test]
    fn test_upward_displacement_gets_extra_lift() {
        let mut a = agent();
        a.jump();
        a.advance_tick();
        // 1.5 - 10.5 = -9, padded by 2
        assert_eq!(a.y, 350.0 - 11.0);
        assert_eq!(a.tilt, MAX_ROTATION);
    }

    #[test]
    fn test_tilt_dives_and_is_clamped() {
        let mut a = agent();
        for _ in 0..40 {
            a.advance_tick();
        }
        assert_eq!(a.tilt, MIN_ROTATION);
        // Diving holds the level-wing frame
        assert_eq!(a.frame(), 1);
    }

    #[test]
    fn test_animation_cycle() {
        let mut a = agent();
        // Keep the nose up so the dive rule never kicks in
        let mut frames = Vec::new();
        for _ in 0..22 {
            a.jump();
            a.advance_tick();
            frames.push(a.frame());
        }
        assert_eq!(
            frames,
            vec![
                0, 0, 0, 0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 0, 0
            ]
        );
    }
}
