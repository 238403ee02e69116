//! Scrolling ground strip made of two tiles

#[derive(Debug, Clone, PartialEq)]
pub struct Ground {
    /// Floor collision threshold and top of the strip
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
    width: f32,
    speed: f32,
}

impl Ground {
    pub fn new(y: f32, width: f32, speed: f32) -> Self {
        Self {
            y,
            x1: 0.0,
            x2: width,
            width,
            speed,
        }
    }

    /// Scroll both tiles; a tile that left the screen moves behind the other
    pub fn advance_tick(&mut self) {
        self.x1 -= self.speed;
        self.x2 -= self.speed;

        if self.x1 + self.width < 0.0 {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0.0 {
            self.x2 = self.x1 + self.width;
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Tile offsets in drawing order
    pub fn segments(&self) -> [f32; 2] {
        [self.x1, self.x2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// True if the two tiles together cover `[0, visible)`
    fn covers(ground: &Ground, visible: f32) -> bool {
        let mut spans: Vec<(f32, f32)> = ground
            .segments()
            .iter()
            .map(|&x| (x, x + ground.width()))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut reach = 0.0f32;
        for (start, end) in spans {
            if start > reach {
                break;
            }
            reach = reach.max(end);
        }
        reach >= visible
    }

    #[test]
    fn test_tiles_start_adjacent() {
        let ground = Ground::new(730.0, 672.0, 5.0);
        assert_eq!(ground.segments(), [0.0, 672.0]);
    }

    #[test]
    fn test_ground_always_covers_screen() {
        let mut ground = Ground::new(730.0, 672.0, 5.0);
        for _ in 0..2000 {
            ground.advance_tick();
            assert!(covers(&ground, 500.0), "gap at {:?}", ground.segments());
        }
    }

    #[test]
    fn test_tile_wraps_behind_the_other() {
        let mut ground = Ground::new(730.0, 672.0, 5.0);
        // x1 reaches -675 after 135 ticks, past its width
        for _ in 0..135 {
            ground.advance_tick();
        }
        assert_eq!(ground.x1, ground.x2 + 672.0);
    }
}
