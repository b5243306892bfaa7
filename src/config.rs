//! Recipe configuration.
//!
//! A recipe is a TOML file describing what to do to an image: the output
//! settings and an ordered list of transformation steps. It is layered the
//! same way every time: stock defaults, then the user's recipe on top.
//!
//! ## Recipe Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! quality = 75              # Encoder quality (0-100, JPEG only)
//! format = "png"            # Image type for `dump` (jpg, jpeg, jpe, png, gif)
//!
//! # Steps run top to bottom; the first failure aborts the recipe.
//! [[steps]]
//! op = "grayscale"
//!
//! [[steps]]
//! op = "scale"
//! width = 800
//! height = 800
//! ```
//!
//! ## Partial Recipes
//!
//! Recipes are sparse. A file with only `[[steps]]` keeps the default output
//! settings; a file with only `[output]` runs no steps. A recipe's `steps`
//! array replaces the default (empty) list as a whole.
//!
//! Unknown keys, and unknown `op` names, are rejected to catch typos early.

use crate::imaging::Format;
use crate::pipeline::Step;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Recipe validation error: {0}")]
    Validation(String),
}

/// A recipe loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecipeConfig {
    /// Encoder settings.
    pub output: OutputConfig,
    /// Transformations, applied in order.
    pub steps: Vec<Step>,
}

/// Encoder settings applied after the steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Encoder quality, 0-100. Only JPEG uses it.
    pub quality: u32,
    /// Image type used when dumping to stdout.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            format: "png".to_string(),
        }
    }
}

impl RecipeConfig {
    /// Validate values that parse fine but can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 0-100".into(),
            ));
        }
        if Format::from_extension(&self.output.format).is_none() {
            return Err(ConfigError::Validation(format!(
                "output.format {:?} is not a supported image type",
                self.output.format
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            match *step {
                Step::Gamma { input, output }
                    if !(input.is_finite() && output.is_finite() && input > 0.0 && output > 0.0) =>
                {
                    return Err(ConfigError::Validation(format!(
                        "steps[{i}]: gamma input and output must be positive numbers"
                    )));
                }
                Step::Scale { width, height } if width == 0 || height == 0 => {
                    return Err(ConfigError::Validation(format!(
                        "steps[{i}]: scale width and height must be non-zero"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Returns the stock default recipe as a `toml::Value::Table`.
///
/// This is the base layer user recipes are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RecipeConfig::default()).expect("default recipe must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a recipe file as a raw TOML value.
pub fn load_raw_recipe(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RecipeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RecipeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a recipe, or the stock defaults when `path` is `None`.
///
/// A path that does not exist is an error; only an absent `--recipe` falls
/// back to defaults.
pub fn load_recipe(path: Option<&Path>) -> Result<RecipeConfig, ConfigError> {
    let overlay = path.map(load_raw_recipe).transpose()?;
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loaded recipe");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock recipe with every step explained.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pixelchain Recipe
# =================
# All settings are optional. Values shown are the defaults.
# Unknown keys and unknown step names cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Encoder quality (0 = worst, 100 = best). Only JPEG output uses it.
quality = 75

# Image type written by `dump`: jpg, jpeg, jpe, png or gif.
format = "png"

# ---------------------------------------------------------------------------
# Steps
# ---------------------------------------------------------------------------
# Each [[steps]] entry is one transformation, applied top to bottom.
# The first failing step aborts the whole recipe. Available ops:
#
#   negative                          invert all colors
#   grayscale                         convert to gray
#   brightness      value             -255..255
#   contrast        value             -100..100 (negative raises contrast)
#   gamma           input, output     positive exponents
#   colorize        red, green, blue  added per channel; alpha 0..127
#   outline                           edge detection
#   emboss
#   blur                              selective blur
#   blur_gaussian
#   sharpen
#   sketchy                           mean removal
#   smooth          value             smoothing weight
#   pixelation      block_size        advanced = true averages each block
#   alpha_blending  enable
#   antialias       enable
#   transparent_color red, green, blue  color must occur in the image
#   scale           width, height     fit inside, keeping the aspect ratio
#
# Example:
#
# [[steps]]
# op = "grayscale"
#
# [[steps]]
# op = "scale"
# width = 800
# height = 800
"##
}
