//! Off-screen frame composition
//!
//! [`WaveformCanvas`] is a dense grid of palette indices, one byte per
//! pixel. [`FramePair`] holds two canvases and swaps which one is being
//! drawn, so the display transport always reads a fully composed frame.

/// Palette-indexed pixel grid
#[derive(Debug, Clone)]
pub struct WaveformCanvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl WaveformCanvas {
    /// Create a canvas cleared to palette index 0
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Palette index at (x, y); out-of-bounds reads return 0
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            0
        }
    }

    /// Fill the whole canvas with one palette index
    pub fn fill(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    /// Fill a rectangular region, clipped to the canvas
    pub fn fill_region(&mut self, x: usize, y: usize, w: usize, h: usize, color: u8) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for row in y.min(self.height)..y_end {
            self.pixels[row * self.width + x..row * self.width + x_end].fill(color);
        }
    }

    /// Set one pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Horizontal line at `y` from `x` for `len` pixels
    pub fn draw_hline(&mut self, x: usize, y: usize, len: usize, color: u8) {
        self.fill_region(x, y, len, 1, color);
    }

    /// Vertical line at `x` from `y` for `len` pixels
    pub fn draw_vline(&mut self, x: usize, y: usize, len: usize, color: u8) {
        self.fill_region(x, y, 1, len, color);
    }
}

/// Double-buffered canvas pair
///
/// One canvas is being drawn while the other holds the last completed
/// frame. [`swap`](Self::swap) is an index flip; pixel data never moves.
pub struct FramePair {
    canvases: [WaveformCanvas; 2],
    draw_idx: usize,
}

impl FramePair {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            canvases: [
                WaveformCanvas::new(width, height),
                WaveformCanvas::new(width, height),
            ],
            draw_idx: 0,
        }
    }

    /// The canvas currently being composed
    pub fn draw_mut(&mut self) -> &mut WaveformCanvas {
        &mut self.canvases[self.draw_idx]
    }

    /// The last completed frame
    pub fn active(&self) -> &WaveformCanvas {
        &self.canvases[1 - self.draw_idx]
    }

    /// Which canvas index holds the completed frame
    pub fn active_index(&self) -> usize {
        1 - self.draw_idx
    }

    /// Promote the drawn canvas to active
    pub fn swap(&mut self) {
        self.draw_idx = 1 - self.draw_idx;
    }
}
