//! GIF capture of rendered generations
//!
//! Collects RGB frames from a [`PixelRenderer`] and encodes them as an
//! animated GIF.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use gif::{Encoder, Frame, Repeat};

use super::PixelRenderer;

/// NeuQuant sampling factor; 1 is best quality, 30 is fastest
const QUANTIZE_SPEED: i32 = 10;

/// Captures frames and encodes them as GIF
pub struct GifCapture {
    /// Collected frames (RGB data)
    frames: Vec<Vec<u8>>,
    width: u16,
    height: u16,
    /// Delay between frames in centiseconds
    frame_delay: u16,
}

impl GifCapture {
    /// Capture for `width` x `height` frames played back at `fps`
    pub fn new(width: u16, height: u16, fps: u16) -> Self {
        let frame_delay = if fps > 0 { 100 / fps } else { 10 };

        Self {
            frames: Vec::new(),
            width,
            height,
            frame_delay,
        }
    }

    /// Capture a frame from a pixel renderer of the capture's size
    pub fn capture_frame(&mut self, renderer: &PixelRenderer) {
        debug_assert_eq!(renderer.width, self.width as usize);
        debug_assert_eq!(renderer.height, self.height as usize);
        self.frames.push(renderer.get_rgb_buffer());
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Save captured frames as an animated GIF
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.frames.is_empty() {
            anyhow::bail!("No frames to save");
        }

        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create GIF file {}", path.display()))?;

        let mut encoder = Encoder::new(file, self.width, self.height, &[])
            .context("Failed to create GIF encoder")?;

        encoder
            .set_repeat(Repeat::Infinite)
            .context("Failed to set GIF repeat")?;

        for frame_data in &self.frames {
            let mut frame =
                Frame::from_rgb_speed(self.width, self.height, frame_data, QUANTIZE_SPEED);
            frame.delay = self.frame_delay;

            encoder
                .write_frame(&frame)
                .context("Failed to write GIF frame")?;
        }

        Ok(())
    }
}
