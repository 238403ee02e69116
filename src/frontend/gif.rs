//! Headless frontend that records selected generations as animated GIFs

use std::path::PathBuf;

use anyhow::Context;

use super::Frontend;
use crate::config::{GameConfig, RunConfig};
use crate::render::{GifCapture, SceneRenderer, SceneView};
use crate::simulation::{GenerationReport, RunContext, TickInput};

pub struct GifFrontend {
    scene: SceneRenderer,
    capture: GifCapture,
    output_dir: PathBuf,
    frame_interval: u64,
    generation_interval: usize,
    generation: usize,
    recording: bool,
}

impl GifFrontend {
    pub fn new(game: &GameConfig, run: &RunConfig) -> anyhow::Result<Self> {
        let width = u16::try_from(game.screen_width).context("screen width exceeds GIF limits")?;
        let height =
            u16::try_from(game.screen_height).context("screen height exceeds GIF limits")?;
        std::fs::create_dir_all(&run.output_dir).with_context(|| {
            format!("Failed to create output directory {}", run.output_dir.display())
        })?;

        Ok(Self {
            scene: SceneRenderer::new(width as usize, height as usize),
            capture: GifCapture::new(width, height, run.gif_fps),
            output_dir: run.output_dir.clone(),
            frame_interval: run.gif_frame_interval.max(1) as u64,
            generation_interval: run.gif_generation_interval,
            generation: 0,
            recording: false,
        })
    }

    /// Whether `generation` is captured (0 interval: only the first)
    pub fn records(&self, generation: usize) -> bool {
        match self.generation_interval {
            0 => generation == 0,
            n => generation % n == 0,
        }
    }

    pub fn gif_path(&self, generation: usize) -> PathBuf {
        self.output_dir
            .join(format!("generation_{generation:04}.gif"))
    }
}

impl Frontend for GifFrontend {
    fn poll(&mut self) -> TickInput {
        TickInput::default()
    }

    fn present(&mut self, view: &SceneView) {
        if self.recording && view.tick % self.frame_interval == 0 {
            let pixels = self.scene.draw(view);
            self.capture.capture_frame(pixels);
        }
    }

    fn begin_generation(&mut self, context: &RunContext) {
        self.generation = context.generation;
        self.recording = self.records(context.generation);
        self.capture.clear();
    }

    fn finish_generation(&mut self, report: &GenerationReport) -> anyhow::Result<()> {
        if !self.recording || self.capture.frame_count() == 0 {
            return Ok(());
        }
        let path = self.gif_path(self.generation);
        self.capture.save(&path)?;
        log::info!(
            "Saved {} frames of generation {} (score {}) to {}",
            self.capture.frame_count(),
            self.generation,
            report.score,
            path.display()
        );
        self.capture.clear();
        self.recording = false;
        Ok(())
    }
}
