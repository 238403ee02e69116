//! Sprite images and their collision masks

use std::path::Path;

use image::imageops::FilterType;

use super::mask::{CollisionMask, ALPHA_THRESHOLD};
use crate::error::AssetError;

/// An RGBA image
#[derive(Debug, Clone)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
}

impl Sprite {
    /// Build a sprite by evaluating `color` for every pixel
    pub fn from_fn(width: u32, height: u32, mut color: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&color(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Decode PNG bytes and scale the image up 2x (nearest neighbour)
    pub fn from_png_bytes_2x(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let scaled = image::imageops::resize(
            &img,
            img.width() * 2,
            img.height() * 2,
            FilterType::Nearest,
        );
        Ok(Self {
            width: scaled.width(),
            height: scaled.height(),
            data: scaled.into_raw(),
        })
    }

    fn load_2x(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_png_bytes_2x(&bytes).map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// RGBA at `(x, y)`; transparent outside the image
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn flip_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| {
            self.get_pixel(x, self.height - 1 - y)
        })
    }

    pub fn mask(&self) -> CollisionMask {
        CollisionMask::from_fn(self.width, self.height, |x, y| {
            self.get_pixel(x, y)[3] > ALPHA_THRESHOLD
        })
    }
}

/// All images of the game plus precomputed masks
#[derive(Debug, Clone)]
pub struct SpriteSet {
    /// Wing-up, wing-level, wing-down
    pub agent_frames: [Sprite; 3],
    pub obstacle_bottom: Sprite,
    pub obstacle_top: Sprite,
    pub ground: Sprite,
    pub background: Sprite,
    agent_masks: [CollisionMask; 3],
    obstacle_bottom_mask: CollisionMask,
    obstacle_top_mask: CollisionMask,
}

impl SpriteSet {
    pub const AGENT_FILES: [&'static str; 3] = ["bird1.png", "bird2.png", "bird3.png"];
    pub const OBSTACLE_FILE: &'static str = "pipe.png";
    pub const GROUND_FILE: &'static str = "base.png";
    pub const BACKGROUND_FILE: &'static str = "bg.png";

    /// Assemble a set; the top obstacle is the vertical flip of `obstacle`
    pub fn new(
        agent_frames: [Sprite; 3],
        obstacle: Sprite,
        ground: Sprite,
        background: Sprite,
    ) -> Self {
        let agent_masks = [
            agent_frames[0].mask(),
            agent_frames[1].mask(),
            agent_frames[2].mask(),
        ];
        let obstacle_top = obstacle.flip_vertical();
        let obstacle_bottom_mask = obstacle.mask();
        let obstacle_top_mask = obstacle_bottom_mask.flip_vertical();
        Self {
            agent_frames,
            obstacle_bottom: obstacle,
            obstacle_top,
            ground,
            background,
            agent_masks,
            obstacle_bottom_mask,
            obstacle_top_mask,
        }
    }

    /// Load the PNG sprites from `dir`, scaled 2x
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let agent_frames = [
            Sprite::load_2x(&dir.join(Self::AGENT_FILES[0]))?,
            Sprite::load_2x(&dir.join(Self::AGENT_FILES[1]))?,
            Sprite::load_2x(&dir.join(Self::AGENT_FILES[2]))?,
        ];
        let obstacle = Sprite::load_2x(&dir.join(Self::OBSTACLE_FILE))?;
        let ground = Sprite::load_2x(&dir.join(Self::GROUND_FILE))?;
        let background = Sprite::load_2x(&dir.join(Self::BACKGROUND_FILE))?;
        log::info!("Loaded sprites from {}", dir.display());
        Ok(Self::new(agent_frames, obstacle, ground, background))
    }

    /// Load from `dir` when given, otherwise draw the built-in sprites
    pub fn load_or_procedural(dir: Option<&Path>) -> Result<Self, AssetError> {
        match dir {
            Some(dir) => Self::load(dir),
            None => Ok(Self::procedural()),
        }
    }

    /// Built-in sprites with the same sizes and silhouettes as the PNG set
    pub fn procedural() -> Self {
        let agent_frames = [
            procedural::agent(procedural::WING_UP),
            procedural::agent(procedural::WING_LEVEL),
            procedural::agent(procedural::WING_DOWN),
        ];
        Self::new(
            agent_frames,
            procedural::obstacle(),
            procedural::ground(),
            procedural::background(),
        )
    }

    pub fn agent_mask(&self, frame: usize) -> &CollisionMask {
        &self.agent_masks[frame.min(2)]
    }

    pub fn obstacle_top_mask(&self) -> &CollisionMask {
        &self.obstacle_top_mask
    }

    pub fn obstacle_bottom_mask(&self) -> &CollisionMask {
        &self.obstacle_bottom_mask
    }

    /// Height of an agent frame
    pub fn agent_height(&self) -> u32 {
        self.agent_frames[0].height
    }

    pub fn obstacle_width(&self) -> u32 {
        self.obstacle_bottom.width
    }

    pub fn obstacle_height(&self) -> u32 {
        self.obstacle_bottom.height
    }

    pub fn ground_width(&self) -> u32 {
        self.ground.width
    }
}

mod procedural {
    use super::Sprite;

    pub const AGENT_SIZE: (u32, u32) = (68, 48);
    pub const OBSTACLE_SIZE: (u32, u32) = (104, 640);
    pub const GROUND_SIZE: (u32, u32) = (672, 224);
    pub const BACKGROUND_SIZE: (u32, u32) = (576, 1024);

    /// Vertical wing offset from the body centre
    pub const WING_UP: f32 = -7.0;
    pub const WING_LEVEL: f32 = 0.0;
    pub const WING_DOWN: f32 = 7.0;

    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    fn ellipse(x: u32, y: u32, cx: f32, cy: f32, rx: f32, ry: f32) -> f32 {
        let dx = (x as f32 + 0.5 - cx) / rx;
        let dy = (y as f32 + 0.5 - cy) / ry;
        dx * dx + dy * dy
    }

    /// Elliptical body; all detail stays inside the outline so every frame
    /// has the same mask
    pub fn agent(wing: f32) -> Sprite {
        let (w, h) = AGENT_SIZE;
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        Sprite::from_fn(w, h, |x, y| {
            let body = ellipse(x, y, cx, cy, cx, cy);
            if body > 1.0 {
                return CLEAR;
            }
            if body > 0.8 {
                return [84, 56, 71, 255];
            }
            if ellipse(x, y, cx + 14.0, cy - 8.0, 7.0, 7.0) <= 1.0 {
                return if ellipse(x, y, cx + 17.0, cy - 8.0, 3.0, 3.0) <= 1.0 {
                    [30, 30, 30, 255]
                } else {
                    [250, 250, 250, 255]
                };
            }
            if ellipse(x, y, cx + 22.0, cy + 6.0, 9.0, 4.0) <= 1.0 {
                return [242, 110, 50, 255];
            }
            if ellipse(x, y, cx - 14.0, cy + wing, 12.0, 6.0) <= 1.0 {
                return [250, 240, 200, 255];
            }
            [248, 196, 40, 255]
        })
    }

    /// Fully opaque pipe with a wider-looking lip at the open end
    pub fn obstacle() -> Sprite {
        let (w, h) = OBSTACLE_SIZE;
        Sprite::from_fn(w, h, |x, y| {
            let edge = x < 4 || x >= w - 4 || y < 4;
            let lip = y < 40;
            if edge || (lip && y >= 36) {
                [84, 56, 71, 255]
            } else if x < 16 {
                [156, 230, 90, 255]
            } else if lip {
                [115, 191, 46, 255]
            } else {
                [99, 170, 40, 255]
            }
        })
    }

    pub fn ground() -> Sprite {
        let (w, h) = GROUND_SIZE;
        Sprite::from_fn(w, h, |x, y| {
            if y < 4 {
                [84, 56, 71, 255]
            } else if y < 24 {
                if (x + y) / 12 % 2 == 0 {
                    [115, 191, 46, 255]
                } else {
                    [156, 230, 90, 255]
                }
            } else if y < 30 {
                [85, 128, 34, 255]
            } else {
                [222, 216, 149, 255]
            }
        })
    }

    pub fn background() -> Sprite {
        let (w, h) = BACKGROUND_SIZE;
        Sprite::from_fn(w, h, |x, y| {
            let skyline = 760 - ((x / 36) * 53 % 7) * 18;
            if y > skyline {
                [170, 218, 196, 255]
            } else {
                let t = y as f32 / h as f32;
                [
                    (78.0 + 60.0 * t) as u8,
                    (192.0 + 30.0 * t) as u8,
                    (202.0 + 20.0 * t) as u8,
                    255,
                ]
            }
        })
    }
}
