use super::Frontend;
use crate::render::SceneView;
use crate::simulation::TickInput;

/// Never quits and renders nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessFrontend;

impl Frontend for HeadlessFrontend {
    fn poll(&mut self) -> TickInput {
        TickInput::default()
    }

    fn present(&mut self, _view: &SceneView) {}
}
