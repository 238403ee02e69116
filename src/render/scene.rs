//! Draws one tick of the game into a pixel buffer

use super::pixel_renderer::PixelRenderer;
use super::sprite::SpriteSet;
use crate::entity::{Agent, Ground, Obstacle};

const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const TEXT_SCALE: i32 = 4;
const TEXT_MARGIN: i32 = 10;

/// Read-only snapshot of the simulation handed to frontends after each tick
pub struct SceneView<'a> {
    pub sprites: &'a SpriteSet,
    pub agents: Vec<&'a Agent>,
    pub obstacles: &'a [Obstacle],
    pub ground: &'a Ground,
    pub score: u32,
    /// Zero-based index; the HUD counts from one
    pub generation: usize,
    pub ai_playing: bool,
    pub tick: u64,
}

fn generation_label(generation: usize) -> String {
    format!("GEN: {}", generation + 1)
}

pub struct SceneRenderer {
    pixels: PixelRenderer,
}

impl SceneRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: PixelRenderer::new(width, height),
        }
    }

    pub fn pixels(&self) -> &PixelRenderer {
        &self.pixels
    }

    /// Background, agents, obstacles, counters, then the ground on top
    pub fn draw(&mut self, view: &SceneView) -> &PixelRenderer {
        let sprites = view.sprites;
        let pixels = &mut self.pixels;

        pixels.clear([0, 0, 0, 255]);
        pixels.blit(&sprites.background, 0, 0);

        for agent in &view.agents {
            let sprite = &sprites.agent_frames[agent.frame()];
            let (x, y) = agent.pixel_position();
            pixels.blit_rotated(sprite, x, y, agent.tilt);
        }

        for obstacle in view.obstacles {
            let x = obstacle.x.round() as i32;
            pixels.blit(&sprites.obstacle_top, x, obstacle.top.round() as i32);
            pixels.blit(&sprites.obstacle_bottom, x, obstacle.bottom.round() as i32);
        }

        let score = format!("SCORE: {}", view.score);
        let score_x =
            pixels.width as i32 - TEXT_MARGIN - PixelRenderer::text_width(&score, TEXT_SCALE);
        pixels.draw_text(score_x, TEXT_MARGIN, &score, TEXT_COLOR, TEXT_SCALE);

        if view.ai_playing {
            let generation = generation_label(view.generation);
            pixels.draw_text(
                TEXT_MARGIN,
                TEXT_MARGIN,
                &generation,
                TEXT_COLOR,
                TEXT_SCALE,
            );
        }

        let ground_y = view.ground.y.round() as i32;
        for x in view.ground.segments() {
            pixels.blit(&sprites.ground, x.round() as i32, ground_y);
        }

        &self.pixels
    }
}
