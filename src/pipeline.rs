//! Recipe steps and their application to an open handle.
//!
//! A recipe is an ordered list of [`Step`]s, usually read from the
//! `[[steps]]` array of a recipe file (see [`crate::config`]):
//!
//! ```toml
//! [[steps]]
//! op = "grayscale"
//!
//! [[steps]]
//! op = "scale"
//! width = 800
//! height = 800
//! ```
//!
//! [`apply_steps`] runs them in order against a [`RasterHandle`]. The first
//! failing step aborts the run with its transform error; later steps are not
//! attempted.

use crate::imaging::{ImageError, RasterBackend, RasterHandle, Rgb};
use serde::{Deserialize, Serialize};

/// One handle transformation, tagged by `op` in recipe files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Negative,
    Grayscale,
    Brightness {
        value: i32,
    },
    Contrast {
        value: i32,
    },
    Gamma {
        input: f64,
        output: f64,
    },
    Colorize {
        red: u8,
        green: u8,
        blue: u8,
        /// 0 (opaque) to 127 (transparent).
        #[serde(default)]
        alpha: u8,
    },
    Outline,
    Emboss,
    Blur,
    BlurGaussian,
    Sharpen,
    Sketchy,
    Smooth {
        value: i32,
    },
    Pixelation {
        block_size: u32,
        #[serde(default)]
        advanced: bool,
    },
    AlphaBlending {
        #[serde(default = "enabled")]
        enable: bool,
    },
    Antialias {
        #[serde(default = "enabled")]
        enable: bool,
    },
    TransparentColor {
        red: u8,
        green: u8,
        blue: u8,
    },
    Scale {
        width: u32,
        height: u32,
    },
}

fn enabled() -> bool {
    true
}

impl Step {
    /// The `op` tag, for log lines.
    pub fn op(&self) -> &'static str {
        match self {
            Step::Negative => "negative",
            Step::Grayscale => "grayscale",
            Step::Brightness { .. } => "brightness",
            Step::Contrast { .. } => "contrast",
            Step::Gamma { .. } => "gamma",
            Step::Colorize { .. } => "colorize",
            Step::Outline => "outline",
            Step::Emboss => "emboss",
            Step::Blur => "blur",
            Step::BlurGaussian => "blur_gaussian",
            Step::Sharpen => "sharpen",
            Step::Sketchy => "sketchy",
            Step::Smooth { .. } => "smooth",
            Step::Pixelation { .. } => "pixelation",
            Step::AlphaBlending { .. } => "alpha_blending",
            Step::Antialias { .. } => "antialias",
            Step::TransparentColor { .. } => "transparent_color",
            Step::Scale { .. } => "scale",
        }
    }

    /// Apply this step to `handle`.
    pub fn apply<B: RasterBackend>(&self, handle: &mut RasterHandle<'_, B>) -> Result<(), ImageError> {
        match *self {
            Step::Negative => handle.negative()?,
            Step::Grayscale => handle.grayscale()?,
            Step::Brightness { value } => handle.brightness(value)?,
            Step::Contrast { value } => handle.contrast(value)?,
            Step::Gamma { input, output } => handle.gamma(input, output)?,
            Step::Colorize {
                red,
                green,
                blue,
                alpha,
            } => handle.colorize(Rgb::new(red, green, blue), alpha)?,
            Step::Outline => handle.outline()?,
            Step::Emboss => handle.emboss()?,
            Step::Blur => handle.blur()?,
            Step::BlurGaussian => handle.blur_gaussian()?,
            Step::Sharpen => handle.sharpen()?,
            Step::Sketchy => handle.sketchy()?,
            Step::Smooth { value } => handle.smooth(value)?,
            Step::Pixelation {
                block_size,
                advanced,
            } => handle.pixelation(block_size, advanced)?,
            Step::AlphaBlending { enable } => handle.alpha_blending(enable)?,
            Step::Antialias { enable } => handle.antialias(enable)?,
            Step::TransparentColor { red, green, blue } => {
                handle.transparent_color(Rgb::new(red, green, blue))?
            }
            Step::Scale { width, height } => handle.scale(width, height)?,
        };
        Ok(())
    }
}

/// Run `steps` in order, stopping at the first failure.
pub fn apply_steps<B: RasterBackend>(
    handle: &mut RasterHandle<'_, B>,
    steps: &[Step],
) -> Result<(), ImageError> {
    for (i, step) in steps.iter().enumerate() {
        tracing::debug!(index = i, op = step.op(), "applying step");
        step.apply(handle)?;
    }
    Ok(())
}
