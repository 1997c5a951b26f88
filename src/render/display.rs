//! Display transport and color palette
//!
//! The transport interface models a windowed framebuffer panel: select a
//! rectangular window, then stream RGB565 pixels into it. Palette indices
//! used everywhere else in the render path resolve to RGB565 only here.

use thiserror::Error;

/// Palette index: background
pub const BLACK: u8 = 0;
/// Palette index: text and axes
pub const WHITE: u8 = 1;
/// Palette index: graticule
pub const DARK_GREY: u8 = 2;
/// Palette index: waveform trace
pub const RED: u8 = 3;
/// Palette index: measurement text accents
pub const GREEN: u8 = 4;
/// Palette index: trigger markers
pub const YELLOW: u8 = 5;

/// RGB565 values for each palette index
const PALETTE: [u16; 6] = [
    0x0000, // black
    0xFFFF, // white
    0x39E7, // dark grey
    0xF800, // red
    0x07E0, // green
    0xFFE0, // yellow
];

/// Resolve a palette index to its RGB565 value
pub fn resolve(index: u8) -> u16 {
    PALETTE
        .get(index as usize)
        .copied()
        .unwrap_or(PALETTE[BLACK as usize])
}

/// Errors from the display transport
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display window {x},{y} {w}x{h} out of bounds")]
    WindowOutOfBounds {
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    },

    #[error("blit of {got} pixels does not match window of {expected}")]
    SizeMismatch { got: usize, expected: usize },

    #[error("display transport error: {0}")]
    Transport(String),
}

/// Windowed RGB565 display interface
pub trait DisplayTransport: Send {
    /// Panel width in pixels
    fn width(&self) -> usize;

    /// Panel height in pixels
    fn height(&self) -> usize;

    /// Select the rectangle the next blit writes into
    fn set_window(&mut self, x: usize, y: usize, w: usize, h: usize) -> Result<(), DisplayError>;

    /// Stream pixels into the current window, row-major
    fn blit(&mut self, pixels: &[u16]) -> Result<(), DisplayError>;
}

/// Discards everything; for headless runs and throughput tests
pub struct NullDisplay {
    width: usize,
    height: usize,
}

impl NullDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl DisplayTransport for NullDisplay {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_window(&mut self, _x: usize, _y: usize, _w: usize, _h: usize) -> Result<(), DisplayError> {
        Ok(())
    }

    fn blit(&mut self, _pixels: &[u16]) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// In-memory panel that retains every pixel written, for tests
pub struct MemoryDisplay {
    width: usize,
    height: usize,
    framebuffer: Vec<u16>,
    window: (usize, usize, usize, usize),
    blits: u64,
}

impl MemoryDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            framebuffer: vec![0u16; width * height],
            window: (0, 0, width, height),
            blits: 0,
        }
    }

    /// RGB565 value at (x, y)
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.framebuffer[y * self.width + x]
    }

    /// Number of completed blits
    pub fn blits(&self) -> u64 {
        self.blits
    }
}

impl DisplayTransport for MemoryDisplay {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_window(&mut self, x: usize, y: usize, w: usize, h: usize) -> Result<(), DisplayError> {
        if x + w > self.width || y + h > self.height {
            return Err(DisplayError::WindowOutOfBounds { x, y, w, h });
        }
        self.window = (x, y, w, h);
        Ok(())
    }

    fn blit(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        let (x, y, w, h) = self.window;
        if pixels.len() != w * h {
            return Err(DisplayError::SizeMismatch {
                got: pixels.len(),
                expected: w * h,
            });
        }
        for row in 0..h {
            let src = &pixels[row * w..(row + 1) * w];
            let dst_start = (y + row) * self.width + x;
            self.framebuffer[dst_start..dst_start + w].copy_from_slice(src);
        }
        self.blits += 1;
        Ok(())
    }
}
