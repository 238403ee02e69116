//! Sprites, collision masks and CPU rendering of the game scene

mod gif_capture;
pub mod mask;
mod pixel_renderer;
mod scene;
pub mod sprite;

pub use gif_capture::GifCapture;
pub use mask::CollisionMask;
pub use pixel_renderer::PixelRenderer;
pub use scene::{SceneRenderer, SceneView};
pub use sprite::{Sprite, SpriteSet};
