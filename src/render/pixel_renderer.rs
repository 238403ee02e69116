//! CPU pixel buffer renderer
//!
//! Shared by the terminal and GIF frontends; no GPU involved.

use super::sprite::Sprite;

/// CPU-based renderer that outputs to an RGBA pixel buffer
pub struct PixelRenderer {
    pub width: usize,
    pub height: usize,
    /// RGBA pixel buffer (4 bytes per pixel)
    pub buffer: Vec<u8>,
}

impl PixelRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u8; width * height * 4],
        }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.buffer.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Set a single pixel at screen coordinates
    pub fn set_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = (y as usize * self.width + x as usize) * 4;
            self.buffer[idx..idx + 4].copy_from_slice(&color);
        }
    }

    /// RGBA at screen coordinates, black outside the buffer
    pub fn get_pixel(&self, x: i32, y: i32) -> [u8; 4] {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = (y as usize * self.width + x as usize) * 4;
            [
                self.buffer[idx],
                self.buffer[idx + 1],
                self.buffer[idx + 2],
                self.buffer[idx + 3],
            ]
        } else {
            [0, 0, 0, 0]
        }
    }

    /// Alpha-blend `color` over the pixel at `(x, y)`
    fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        match color[3] {
            0 => {}
            255 => self.set_pixel(x, y, color),
            alpha => {
                let dst = self.get_pixel(x, y);
                let a = alpha as u32;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
                self.set_pixel(
                    x,
                    y,
                    [
                        mix(color[0], dst[0]),
                        mix(color[1], dst[1]),
                        mix(color[2], dst[2]),
                        255,
                    ],
                );
            }
        }
    }

    /// Draw `sprite` with its top-left corner at `(x, y)`
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + sprite.width as i32).min(self.width as i32);
        let y1 = (y + sprite.height as i32).min(self.height as i32);
        for sy in y0..y1 {
            for sx in x0..x1 {
                let color = sprite.get_pixel((sx - x) as u32, (sy - y) as u32);
                self.blend_pixel(sx, sy, color);
            }
        }
    }

    /// Draw `sprite` rotated counter-clockwise by `degrees` about its centre,
    /// keeping the centre where an unrotated blit at `(x, y)` would put it
    pub fn blit_rotated(&mut self, sprite: &Sprite, x: i32, y: i32, degrees: f32) {
        if degrees == 0.0 {
            self.blit(sprite, x, y);
            return;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let half_w = sprite.width as f32 / 2.0;
        let half_h = sprite.height as f32 / 2.0;
        let cx = x as f32 + half_w;
        let cy = y as f32 + half_h;
        let reach = (half_w * half_w + half_h * half_h).sqrt().ceil() as i32;

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                // Destination pixel centre relative to the sprite centre
                let px = dx as f32 + 0.5;
                let py = dy as f32 + 0.5;
                let src_x = px * cos - py * sin + half_w;
                let src_y = px * sin + py * cos + half_h;
                if src_x < 0.0 || src_y < 0.0 {
                    continue;
                }
                let color = sprite.get_pixel(src_x as u32, src_y as u32);
                let screen_x = (cx + px).floor() as i32;
                let screen_y = (cy + py).floor() as i32;
                self.blend_pixel(screen_x, screen_y, color);
            }
        }
    }

    /// Draw text with the 5x7 bitmap font, each font pixel `scale` wide
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: [u8; 4], scale: i32) {
        let mut cursor_x = x;
        for c in text.chars() {
            self.draw_char(cursor_x, y, c, color, scale);
            cursor_x += 6 * scale;
        }
    }

    /// Width in pixels of `text` drawn at `scale`
    pub fn text_width(text: &str, scale: i32) -> i32 {
        let n = text.chars().count() as i32;
        if n == 0 {
            0
        } else {
            (n * 6 - 1) * scale
        }
    }

    fn draw_char(&mut self, x: i32, y: i32, c: char, color: [u8; 4], scale: i32) {
        let glyph = font_glyph(c.to_ascii_uppercase());
        for (row, &bits) in glyph.iter().enumerate() {
            for col in 0..5 {
                if bits & (1 << (4 - col)) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        self.set_pixel(
                            x + col * scale + sx,
                            y + row as i32 * scale + sy,
                            color,
                        );
                    }
                }
            }
        }
    }

    /// Get the pixel buffer as RGB (without alpha) for GIF encoding
    pub fn get_rgb_buffer(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width * self.height * 3);
        for chunk in self.buffer.chunks_exact(4) {
            rgb.extend_from_slice(&chunk[..3]);
        }
        rgb
    }
}

/// 5x7 glyphs for the HUD; bits 4-0 are columns left to right
fn font_glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x06, 0x08, 0x10, 0x1F],
        '3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0E],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0E, 0x11, 0x10, 0x0E, 0x01, 0x11, 0x0E],
        ':' => [0x00, 0x04, 0x04, 0x00, 0x04, 0x04, 0x00],
        ' ' => [0x00; 7],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> Sprite {
        Sprite::from_fn(w, h, |_, _| color)
    }

    #[test]
    fn test_rgb_buffer_conversion() {
        let mut renderer = PixelRenderer::new(2, 2);
        renderer.clear([1, 2, 3, 255]);
        let rgb = renderer.get_rgb_buffer();
        assert_eq!(rgb.len(), 2 * 2 * 3);
        assert_eq!(&rgb[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_blit_clips_and_skips_transparent() {
        let mut renderer = PixelRenderer::new(4, 4);
        renderer.clear([0, 0, 0, 255]);
        let sprite = Sprite::from_fn(2, 2, |x, _| {
            if x == 0 {
                [255, 0, 0, 255]
            } else {
                [0, 0, 0, 0]
            }
        });
        renderer.blit(&sprite, 3, -1);
        assert_eq!(renderer.get_pixel(3, 0), [255, 0, 0, 255]);
        renderer.blit(&sprite, 1, 1);
        assert_eq!(renderer.get_pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(renderer.get_pixel(2, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut renderer = PixelRenderer::new(1, 1);
        renderer.clear([0, 0, 0, 255]);
        renderer.blit(&solid(1, 1, [255, 255, 255, 128]), 0, 0);
        assert_eq!(renderer.get_pixel(0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_rotated_blit_quarter_turn_swaps_extent() {
        let mut renderer = PixelRenderer::new(20, 20);
        renderer.clear([0, 0, 0, 255]);
        // 10 wide, 2 tall bar centred at (10, 10)
        renderer.blit_rotated(&solid(10, 2, [9, 9, 9, 255]), 5, 9, 90.0);
        assert_eq!(renderer.get_pixel(10, 6), [9, 9, 9, 255]);
        assert_eq!(renderer.get_pixel(10, 13), [9, 9, 9, 255]);
        assert_eq!(renderer.get_pixel(6, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn test_text_width_and_drawing() {
        assert_eq!(PixelRenderer::text_width("GEN", 1), 17);
        assert_eq!(PixelRenderer::text_width("", 3), 0);
        let mut renderer = PixelRenderer::new(20, 10);
        renderer.clear([0, 0, 0, 255]);
        renderer.draw_text(0, 0, "1", [255, 255, 255, 255], 1);
        // Top of the '1' stem
        assert_eq!(renderer.get_pixel(2, 0), [255, 255, 255, 255]);
        assert_eq!(renderer.get_pixel(0, 0), [0, 0, 0, 255]);
    }
}
