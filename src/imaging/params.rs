//! Parameter types for image operations.
//!
//! These types describe *what* to do to a raster, not *how*. The
//! [`RasterHandle`](super::writer::RasterHandle) builds them from caller
//! arguments and hands them to the [`backend`](super::backend), which owns the
//! pixel math. Swapping the backend (e.g. for a recording mock in tests) never
//! changes the parameters.
//!
//! ## Types
//!
//! - [`Rgb`]: An exact 8-bit RGB triple.
//! - [`ColorIndex`]: Backend-specific handle for one color inside one buffer.
//! - [`Quality`]: Lossy encoding quality (0–100, default 75). Clamped on construction.
//! - [`Filter`]: One per-pixel or neighborhood effect, with its arguments.
//! - [`Kernel`]: A 3×3 convolution matrix with divisor and offset.

use std::fmt;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Opaque identifier of a color within one buffer's color space.
///
/// Not portable across buffers, and stale once the buffer it came from is
/// replaced (`scale` swaps the buffer wholesale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorIndex(pub(crate) u32);

impl ColorIndex {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// A single effect applied in place by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Negate,
    Grayscale,
    /// Additive shift, -255..=255.
    Brightness(i32),
    /// -100..=100. Negative values *increase* contrast.
    Contrast(i32),
    Gamma { input: f64, output: f64 },
    /// `alpha` is on the 0 (opaque) – 127 (transparent) scale.
    Colorize { color: Rgb, alpha: u8 },
    EdgeDetect,
    Emboss,
    SelectiveBlur,
    GaussianBlur,
    MeanRemoval,
    Smooth(i32),
    Pixelate { block_size: u32, advanced: bool },
}

impl Filter {
    /// Human-readable operation name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Negate => "negative",
            Filter::Grayscale => "grayscale",
            Filter::Brightness(_) => "brightness",
            Filter::Contrast(_) => "contrast",
            Filter::Gamma { .. } => "gamma",
            Filter::Colorize { .. } => "colorize",
            Filter::EdgeDetect => "outline",
            Filter::Emboss => "emboss",
            Filter::SelectiveBlur => "blur",
            Filter::GaussianBlur => "gaussian blur",
            Filter::MeanRemoval => "sketchy",
            Filter::Smooth(_) => "smooth",
            Filter::Pixelate { .. } => "pixelation",
        }
    }
}

/// 3×3 convolution kernel.
///
/// Each output channel is `sum(weight * neighbor) / divisor + offset`,
/// clamped to 0..=255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    pub matrix: [[f32; 3]; 3],
    pub divisor: f32,
    pub offset: f32,
}

impl Kernel {
    /// Kernel whose divisor is the sum of its weights.
    pub fn normalized(matrix: [[f32; 3]; 3], offset: f32) -> Self {
        let divisor = matrix.iter().flatten().sum();
        Self {
            matrix,
            divisor,
            offset,
        }
    }

    /// Strong center-weighted sharpen (divisor ≈ 11.2).
    pub fn sharpen() -> Self {
        Self::normalized(
            [[-1.2, -1.0, -1.2], [-1.0, 20.0, -1.0], [-1.2, -1.0, -1.2]],
            0.0,
        )
    }
}
