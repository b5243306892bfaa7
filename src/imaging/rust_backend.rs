//! Pure Rust raster backend on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image::load_from_memory`, `ImageReader::with_format` |
//! | Resample | `image::imageops::resize` with `Triangle` (area-weighted on downscale) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGBA) |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (RGBA) |
//! | Negate, brightness | `image::imageops::colorops` |
//! | Other filters | [`kernels`](super::kernels) |
//!
//! ## Color model
//!
//! Buffers are true-color. A [`ColorIndex`] is the packed value
//! `(r << 16) | (g << 8) | b`, so allocation always succeeds; exact and
//! closest lookups only consider colors actually present in the pixels.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::format::Format;
use super::kernels;
use super::params::{ColorIndex, Filter, Kernel, Quality, Rgb};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Limits, Rgba, RgbaImage};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

const VERSION: &str = "pixelchain-rust (image 0.25)";

/// An RGBA8 raster plus the state GD-style callers expect to carry along.
#[derive(Debug, Clone)]
pub struct Raster {
    pixels: RgbaImage,
    transparent: Option<Rgb>,
    alpha_blending: bool,
    antialias: bool,
}

impl Raster {
    fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            transparent: None,
            alpha_blending: true,
            antialias: false,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn transparent(&self) -> Option<Rgb> {
        self.transparent
    }

    pub fn alpha_blending(&self) -> bool {
        self.alpha_blending
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Pixels with the designated transparent color knocked out to alpha 0.
    fn with_transparency(&self) -> RgbaImage {
        let mut out = self.pixels.clone();
        if let Some(t) = self.transparent {
            for px in out.pixels_mut() {
                if px.0[..3] == [t.red, t.green, t.blue] {
                    px.0[3] = 0;
                }
            }
        }
        out
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn pack(color: Rgb) -> ColorIndex {
    ColorIndex(((color.red as u32) << 16) | ((color.green as u32) << 8) | color.blue as u32)
}

fn unpack(index: ColorIndex) -> Rgb {
    let v = index.value();
    Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

fn rgb_of(px: &Rgba<u8>) -> Rgb {
    Rgb::new(px.0[0], px.0[1], px.0[2])
}

fn check_allocation(width: u32, height: u32) -> Result<(), BackendError> {
    let bytes = (width as u64)
        .checked_mul(height as u64)
        .and_then(|px| px.checked_mul(4));
    match (bytes, Limits::default().max_alloc) {
        (None, _) => Err(BackendError::ProcessingFailed(format!(
            "{width}x{height} raster overflows"
        ))),
        (Some(bytes), Some(max)) if bytes > max => Err(BackendError::ProcessingFailed(format!(
            "{width}x{height} raster needs {bytes} bytes, limit is {max}"
        ))),
        _ => Ok(()),
    }
}

fn decode_failed(e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("decode failed: {e}"))
}

fn encode_failed(e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("encode failed: {e}"))
}

impl RasterBackend for RustBackend {
    type Buffer = Raster;

    fn version(&self) -> &str {
        VERSION
    }

    fn supports(&self, format: Format) -> bool {
        let format = ImageFormat::from(format);
        format.reading_enabled() && format.writing_enabled()
    }

    fn allocate(&self, width: u32, height: u32) -> Result<Raster, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot allocate a {width}x{height} raster"
            )));
        }
        check_allocation(width, height)?;
        tracing::debug!(width, height, "allocating raster");
        Ok(Raster::new(RgbaImage::from_pixel(
            width,
            height,
            Rgba([0, 0, 0, 255]),
        )))
    }

    fn decode(&self, data: &[u8]) -> Result<Raster, BackendError> {
        let img = image::load_from_memory(data).map_err(decode_failed)?;
        Ok(Raster::new(img.into_rgba8()))
    }

    fn decode_file(&self, path: &Path, format: Format) -> Result<Raster, BackendError> {
        let mut reader = ImageReader::open(path)?;
        reader.set_format(format.into());
        let img = reader.decode().map_err(decode_failed)?;
        Ok(Raster::new(img.into_rgba8()))
    }

    fn encode(
        &self,
        buffer: &Raster,
        format: Format,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError> {
        let (w, h) = buffer.pixels.dimensions();
        match format {
            Format::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(buffer.pixels.clone()).into_rgb8();
                // The encoder rejects 0; treat it as the lowest quality.
                let q = quality.value().max(1);
                JpegEncoder::new_with_quality(out, q)
                    .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                    .map_err(encode_failed)
            }
            Format::Png => {
                let rgba = buffer.with_transparency();
                PngEncoder::new(out)
                    .write_image(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                    .map_err(encode_failed)
            }
            Format::Gif => {
                let rgba = buffer.with_transparency();
                GifEncoder::new(out)
                    .encode(rgba.as_raw(), w, h, ExtendedColorType::Rgba8)
                    .map_err(encode_failed)
            }
        }
    }

    fn release(&self, buffer: Raster) {
        let (width, height) = buffer.pixels.dimensions();
        tracing::debug!(width, height, "releasing raster");
        drop(buffer);
    }

    fn dimensions(&self, buffer: &Raster) -> Dimensions {
        let (width, height) = buffer.pixels.dimensions();
        Dimensions { width, height }
    }

    fn resample(&self, buffer: &Raster, width: u32, height: u32) -> Result<Raster, BackendError> {
        check_allocation(width, height)?;
        let resized = image::imageops::resize(&buffer.pixels, width, height, FilterType::Triangle);
        Ok(Raster::new(resized))
    }

    fn color_allocate(&self, _buffer: &mut Raster, color: Rgb) -> Option<ColorIndex> {
        Some(pack(color))
    }

    fn color_exact(&self, buffer: &Raster, color: Rgb) -> Option<ColorIndex> {
        buffer
            .pixels
            .pixels()
            .any(|px| rgb_of(px) == color)
            .then(|| pack(color))
    }

    fn color_closest(&self, buffer: &Raster, color: Rgb) -> Option<ColorIndex> {
        let present: HashSet<Rgb> = buffer.pixels.pixels().map(rgb_of).collect();
        present
            .into_iter()
            .min_by_key(|c| {
                let d = |a: u8, b: u8| (a as i32 - b as i32).pow(2);
                (
                    d(c.red, color.red) + d(c.green, color.green) + d(c.blue, color.blue),
                    pack(*c).value(),
                )
            })
            .map(pack)
    }

    fn set_transparent(&self, buffer: &mut Raster, index: ColorIndex) -> Result<(), BackendError> {
        buffer.transparent = Some(unpack(index));
        Ok(())
    }

    fn apply_filter(&self, buffer: &mut Raster, filter: &Filter) -> Result<(), BackendError> {
        let img = &mut buffer.pixels;
        match *filter {
            Filter::Negate => kernels::negate(img),
            Filter::Grayscale => kernels::grayscale(img),
            Filter::Brightness(v) => kernels::brightness(img, v),
            Filter::Contrast(v) => kernels::contrast(img, v),
            Filter::Gamma { input, output } => kernels::gamma(img, input, output)?,
            Filter::Colorize { color, alpha } => kernels::colorize(img, color, alpha),
            Filter::EdgeDetect => kernels::edge_detect(img)?,
            Filter::Emboss => kernels::emboss(img)?,
            Filter::SelectiveBlur => kernels::selective_blur(img),
            Filter::GaussianBlur => kernels::gaussian_blur(img)?,
            Filter::MeanRemoval => kernels::mean_removal(img)?,
            Filter::Smooth(weight) => kernels::smooth(img, weight)?,
            Filter::Pixelate {
                block_size,
                advanced,
            } => kernels::pixelate(img, block_size, advanced)?,
        }
        Ok(())
    }

    fn convolve(&self, buffer: &mut Raster, kernel: &Kernel) -> Result<(), BackendError> {
        kernels::convolve(&mut buffer.pixels, kernel)
    }

    fn set_alpha_blending(&self, buffer: &mut Raster, enable: bool) -> Result<(), BackendError> {
        buffer.alpha_blending = enable;
        Ok(())
    }

    fn set_antialias(&self, buffer: &mut Raster, enable: bool) -> Result<(), BackendError> {
        buffer.antialias = enable;
        Ok(())
    }
}
