//! Where ticks go: nowhere, to the terminal, or into GIF files
//!
//! A [`Frontend`] is polled for input once per tick and shown every frame
//! the simulator produces.

mod gif;
mod headless;
mod terminal;

pub use self::gif::GifFrontend;
pub use headless::HeadlessFrontend;
pub use terminal::TerminalFrontend;

use crate::render::SceneView;
use crate::simulation::{GenerationReport, RunContext, TickInput};

pub trait Frontend {
    /// Input gathered since the previous tick
    fn poll(&mut self) -> TickInput;

    /// Show the state after a completed tick
    fn present(&mut self, view: &SceneView);

    fn begin_generation(&mut self, _context: &RunContext) {}

    /// Flush anything buffered for the finished generation
    fn finish_generation(&mut self, _report: &GenerationReport) -> anyhow::Result<()> {
        Ok(())
    }
}
