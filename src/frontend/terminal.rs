//! Live view in the terminal
//!
//! The scene is rendered at full resolution, scaled to the terminal and
//! printed with upper-half-block characters, two pixel rows per text row.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Color},
    terminal,
};
use web_time::Instant;

use super::Frontend;
use crate::config::GameConfig;
use crate::render::{PixelRenderer, SceneRenderer, SceneView};
use crate::simulation::{GenerationReport, TickInput};

pub struct TerminalFrontend {
    out: Stdout,
    scene: SceneRenderer,
    /// Terminal size in cells
    cols: usize,
    rows: usize,
    tick_duration: Duration,
    last_frame: Instant,
    /// First I/O failure; reported as a quit request and surfaced after the generation
    failure: Option<io::Error>,
}

impl TerminalFrontend {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new(game: &GameConfig) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
        )?;
        let (cols, rows) = terminal::size()?;

        Ok(Self {
            out,
            scene: SceneRenderer::new(game.screen_width as usize, game.screen_height as usize),
            cols: cols as usize,
            rows: rows as usize,
            tick_duration: Duration::from_secs_f64(1.0 / game.tick_rate.max(1) as f64),
            last_frame: Instant::now(),
            failure: None,
        })
    }

    fn read_input(&mut self) -> io::Result<TickInput> {
        let mut input = TickInput::default();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => input.quit = true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        input.quit = true
                    }
                    KeyCode::Char(' ') | KeyCode::Up => input.jump = true,
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    self.cols = cols as usize;
                    self.rows = rows as usize;
                    queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
                }
                _ => {}
            }
        }
        Ok(input)
    }

    fn render(&mut self, view: &SceneView) -> io::Result<()> {
        let pixels = self.scene.draw(view);
        write_half_blocks(&mut self.out, pixels, self.cols, self.rows)
    }

    /// Hold each tick for `1 / tick_rate` seconds
    fn pace(&mut self) {
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.tick_duration {
            std::thread::sleep(self.tick_duration - elapsed);
        }
        self.last_frame = Instant::now();
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            log::warn!("Terminal output failed: {e}");
            self.failure.get_or_insert(e);
        }
    }
}

impl Frontend for TerminalFrontend {
    fn poll(&mut self) -> TickInput {
        if self.failure.is_some() {
            return TickInput {
                quit: true,
                jump: false,
            };
        }
        match self.read_input() {
            Ok(input) => input,
            Err(e) => {
                self.record(Err(e));
                TickInput {
                    quit: true,
                    jump: false,
                }
            }
        }
    }

    fn present(&mut self, view: &SceneView) {
        let result = self.render(view);
        self.record(result);
        self.pace();
    }

    fn finish_generation(&mut self, _report: &GenerationReport) -> anyhow::Result<()> {
        match self.failure.take() {
            Some(e) => Err(anyhow::Error::new(e).context("Terminal frontend failed")),
            None => Ok(()),
        }
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Largest `(width, height)` in pixels that fits the terminal at the scene's aspect ratio
fn fit(scene_w: usize, scene_h: usize, cols: usize, rows: usize) -> (usize, usize) {
    let max_h = rows * 2;
    if scene_w == 0 || scene_h == 0 || cols == 0 || max_h == 0 {
        return (0, 0);
    }
    let scale = (cols as f64 / scene_w as f64).min(max_h as f64 / scene_h as f64);
    let w = ((scene_w as f64 * scale) as usize).clamp(1, cols);
    let h = ((scene_h as f64 * scale) as usize).clamp(1, max_h);
    (w, h)
}

fn color(rgba: [u8; 4]) -> Color {
    Color::Rgb {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
    }
}

/// Print `pixels` scaled down to the terminal; the upper pixel of a cell is the
/// foreground of `▀`, the lower one its background
fn write_half_blocks(
    out: &mut impl Write,
    pixels: &PixelRenderer,
    cols: usize,
    rows: usize,
) -> io::Result<()> {
    let (w, h) = fit(pixels.width, pixels.height, cols, rows);
    let sample = |x: usize, y: usize| {
        let sx = x * pixels.width / w.max(1);
        let sy = y * pixels.height / h.max(1);
        pixels.get_pixel(sx as i32, sy as i32)
    };

    queue!(out, cursor::MoveTo(0, 0))?;
    let mut prev: Option<([u8; 4], [u8; 4])> = None;
    for row in 0..h.div_ceil(2) {
        queue!(out, cursor::MoveTo(0, row as u16))?;
        for col in 0..w {
            let top = sample(col, row * 2);
            let bottom = if row * 2 + 1 < h {
                sample(col, row * 2 + 1)
            } else {
                [0, 0, 0, 255]
            };
            if prev != Some((top, bottom)) {
                queue!(
                    out,
                    style::SetForegroundColor(color(top)),
                    style::SetBackgroundColor(color(bottom))
                )?;
                prev = Some((top, bottom));
            }
            queue!(out, style::Print('\u{2580}'))?;
        }
    }
    queue!(out, style::ResetColor)?;
    out.flush()
}
