//! The fluent, mutable image handle.
//!
//! A [`RasterHandle`] owns exactly one backend buffer. Transformations mutate
//! it in place and hand the handle back, so a pipeline reads as one chain:
//!
//! ```no_run
//! # use pixelchain::imaging::{ImageFactory, ImageError};
//! # fn main() -> Result<(), ImageError> {
//! let factory = ImageFactory::new();
//! let mut img = factory.open("photo.jpg")?;
//! img.grayscale()?.contrast(-20)?.scale(800, 800)?.set_quality(85);
//! img.save("photo-small.jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! Open → mutated → closed. `save`/`dump` encode and then release the
//! buffer; dropping an open handle releases it too. Release happens at most
//! once on every path, including `?` early returns. A closed handle stays
//! usable as a value: transformations become no-ops, queries return `None`,
//! and `save`/`dump` return `Ok(false)`.
//!
//! The first backend failure aborts the chain with
//! [`ImageError::Transform`]; nothing is retried or partially applied.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::calculations::calculate_scale_dimensions;
use super::error::ImageError;
use super::format::Format;
use super::params::{ColorIndex, Filter, Kernel, Quality, Rgb};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One in-memory image, mutated in place by chained operations.
///
/// Not meant for sharing across threads; build one handle per image.
#[derive(Debug)]
pub struct RasterHandle<'a, B: RasterBackend> {
    backend: &'a B,
    buffer: Option<B::Buffer>,
    quality: Quality,
}

impl<'a, B: RasterBackend> RasterHandle<'a, B> {
    pub(crate) fn new(backend: &'a B, buffer: B::Buffer) -> Self {
        Self {
            backend,
            buffer: Some(buffer),
            quality: Quality::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// The underlying buffer, while open.
    pub fn buffer(&self) -> Option<&B::Buffer> {
        self.buffer.as_ref()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.buffer.as_ref().map(|b| self.backend.dimensions(b))
    }

    /// Width in pixels; `None` once closed.
    pub fn width(&self) -> Option<u32> {
        self.dimensions().map(|d| d.width)
    }

    /// Height in pixels; `None` once closed.
    pub fn height(&self) -> Option<u32> {
        self.dimensions().map(|d| d.height)
    }

    /// Index for an exact color, allocating it in the buffer's color space.
    pub fn color_index(&mut self, color: impl Into<Rgb>) -> Option<ColorIndex> {
        let backend = self.backend;
        self.buffer
            .as_mut()
            .and_then(|b| backend.color_allocate(b, color.into()))
    }

    /// Whether this exact color already exists in the image.
    pub fn has_color(&self, color: impl Into<Rgb>) -> bool {
        self.buffer
            .as_ref()
            .and_then(|b| self.backend.color_exact(b, color.into()))
            .is_some()
    }

    /// Index of the nearest color present in the image.
    pub fn closest_color_index(&self, color: impl Into<Rgb>) -> Option<ColorIndex> {
        self.buffer
            .as_ref()
            .and_then(|b| self.backend.color_closest(b, color.into()))
    }

    /// Run one backend mutation if open; map failure to a named transform error.
    fn apply<F>(&mut self, operation: &'static str, f: F) -> Result<&mut Self, ImageError>
    where
        F: FnOnce(&B, &mut B::Buffer) -> Result<(), BackendError>,
    {
        let backend = self.backend;
        if let Some(buffer) = self.buffer.as_mut() {
            f(backend, buffer).map_err(|source| ImageError::Transform { operation, source })?;
        }
        Ok(self)
    }

    fn filter(&mut self, filter: Filter) -> Result<&mut Self, ImageError> {
        self.apply(filter.name(), |backend, buffer| {
            backend.apply_filter(buffer, &filter)
        })
    }

    /// Mark an existing color as the transparent one.
    ///
    /// Fails if the color does not occur in the image.
    pub fn transparent_color(&mut self, color: impl Into<Rgb>) -> Result<&mut Self, ImageError> {
        let color = color.into();
        self.apply("transparent color", |backend, buffer| {
            let index = backend
                .color_exact(buffer, color)
                .ok_or(BackendError::ColorNotFound(color))?;
            backend.set_transparent(buffer, index)
        })
    }

    /// Invert every color channel.
    pub fn negative(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Negate)
    }

    pub fn grayscale(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Grayscale)
    }

    /// Additive brightness shift, clamped to -255..=255.
    pub fn brightness(&mut self, value: i32) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Brightness(value.clamp(-255, 255)))
    }

    /// Contrast adjustment, clamped to -100..=100.
    ///
    /// Note the sign: negative values increase contrast, positive values
    /// flatten the image toward mid-gray.
    pub fn contrast(&mut self, value: i32) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Contrast(value.clamp(-100, 100)))
    }

    pub fn gamma(&mut self, input: f64, output: f64) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Gamma { input, output })
    }

    /// Tint toward `color`. `alpha` runs from 0 (opaque) to 127
    /// (transparent) and is clamped to that range.
    pub fn colorize(&mut self, color: impl Into<Rgb>, alpha: u8) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Colorize {
            color: color.into(),
            alpha: alpha.min(127),
        })
    }

    /// Edge detection.
    pub fn outline(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::EdgeDetect)
    }

    pub fn emboss(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Emboss)
    }

    /// Selective (edge-preserving) blur.
    pub fn blur(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::SelectiveBlur)
    }

    pub fn blur_gaussian(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::GaussianBlur)
    }

    pub fn sharpen(&mut self) -> Result<&mut Self, ImageError> {
        let kernel = Kernel::sharpen();
        self.apply("sharpen", |backend, buffer| backend.convolve(buffer, &kernel))
    }

    /// Mean-removal sketch effect.
    pub fn sketchy(&mut self) -> Result<&mut Self, ImageError> {
        self.filter(Filter::MeanRemoval)
    }

    pub fn smooth(&mut self, value: i32) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Smooth(value))
    }

    pub fn pixelation(&mut self, block_size: u32, advanced: bool) -> Result<&mut Self, ImageError> {
        self.filter(Filter::Pixelate {
            block_size,
            advanced,
        })
    }

    pub fn alpha_blending(&mut self, enable: bool) -> Result<&mut Self, ImageError> {
        self.apply("alpha blending", |backend, buffer| {
            backend.set_alpha_blending(buffer, enable)
        })
    }

    pub fn antialias(&mut self, enable: bool) -> Result<&mut Self, ImageError> {
        self.apply("antialias", |backend, buffer| {
            backend.set_antialias(buffer, enable)
        })
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Set lossy encoding quality (clamped to 0–100). Only JPEG uses it.
    pub fn set_quality(&mut self, quality: u32) -> &mut Self {
        self.quality = Quality::new(quality);
        self
    }

    /// Scale uniformly to fit inside `width` × `height`.
    ///
    /// The buffer is replaced wholesale, so color indices taken before the
    /// call are stale afterwards. If the fitted size collapses to zero in
    /// either dimension the image is left as is.
    pub fn scale(&mut self, width: u32, height: u32) -> Result<&mut Self, ImageError> {
        let backend = self.backend;
        let Some(buffer) = self.buffer.as_ref() else {
            return Ok(self);
        };
        let current = backend.dimensions(buffer);
        let Some((w, h)) =
            calculate_scale_dimensions((current.width, current.height), (width, height))
        else {
            tracing::debug!(width, height, "scale target collapses, leaving image unchanged");
            return Ok(self);
        };

        let scaled = backend
            .resample(buffer, w, h)
            .map_err(|source| ImageError::Transform {
                operation: "scale",
                source,
            })?;
        tracing::debug!(
            from_width = current.width,
            from_height = current.height,
            to_width = w,
            to_height = h,
            "scaled image"
        );
        if let Some(old) = self.buffer.replace(scaled) {
            backend.release(old);
        }
        Ok(self)
    }

    fn encode_into(
        &self,
        action: &'static str,
        format: Format,
        out: &mut dyn Write,
    ) -> Result<(), ImageError> {
        if let Some(buffer) = &self.buffer {
            self.backend
                .encode(buffer, format, self.quality, out)
                .map_err(|source| ImageError::Encode { action, source })?;
            out.flush().map_err(|e| ImageError::Encode {
                action,
                source: e.into(),
            })?;
            tracing::debug!(%format, quality = self.quality.value(), "encoded image");
        }
        Ok(())
    }

    /// Encode to `path` (format from its extension, matched case-sensitively)
    /// and close the handle.
    ///
    /// Returns `Ok(false)` if the handle is already closed. On error the
    /// handle stays open and any existing file at `path` is left untouched.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<bool, ImageError> {
        if !self.is_open() {
            return Ok(false);
        }
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = Format::from_extension_exact(ext)
            .ok_or_else(|| ImageError::UnsupportedFormat(ext.to_string()))?;

        let mut encoded = Vec::new();
        self.encode_into("saved", format, &mut encoded)?;
        write_replacing(path, &encoded).map_err(|e| ImageError::Encode {
            action: "saved",
            source: e.into(),
        })?;
        tracing::debug!(path = %path.display(), "saved image");
        self.close();
        Ok(true)
    }

    /// Encode to standard output as `kind` (`"png"`, `"jpg"`, `"gif"`, …,
    /// case-insensitive) and close the handle.
    pub fn dump(&mut self, kind: &str) -> Result<bool, ImageError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.dump_to(kind, &mut out)
    }

    /// [`dump`](Self::dump) into an arbitrary writer.
    pub fn dump_to<W: Write>(&mut self, kind: &str, out: &mut W) -> Result<bool, ImageError> {
        if !self.is_open() {
            return Ok(false);
        }
        let format = Format::from_extension(kind)
            .ok_or_else(|| ImageError::UnsupportedFormat(kind.to_string()))?;
        self.encode_into("dumped", format, out)?;
        self.close();
        Ok(true)
    }

    /// Release the buffer now. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.backend.release(buffer);
        }
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
///
/// An existing file at `path` is only replaced once the new content is
/// fully on disk.
fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.pixelchain-tmp"));
    let result = File::create(&tmp)
        .and_then(|mut file| file.write_all(bytes).and_then(|()| file.sync_all()))
        .and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

impl<B: RasterBackend> Drop for RasterHandle<'_, B> {
    fn drop(&mut self) {
        self.close();
    }
}
