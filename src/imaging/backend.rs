//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait is everything the handle needs from a pixel
//! library: buffer allocation and release, decode/encode, resampling, color
//! lookups, and the filter primitives. The handle never touches pixels
//! itself, so the whole transformation chain is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) on top of the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::format::Format;
use super::params::{ColorIndex, Filter, Kernel, Quality, Rgb};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Format not supported by this backend: {0}")]
    UnsupportedFormat(Format),
    #[error("Color {0} does not exist in the image")]
    ColorNotFound(Rgb),
}

/// Pixel dimensions of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster backends.
///
/// A backend owns no image state: every call receives the buffer it works
/// on. Buffers are moved into [`release`](RasterBackend::release), so a
/// released buffer cannot be touched again.
pub trait RasterBackend {
    /// The in-memory raster this backend operates on.
    type Buffer;

    /// Backend name and version, for capability reporting.
    fn version(&self) -> &str;

    /// Whether the format can be both decoded and encoded.
    fn supports(&self, format: Format) -> bool;

    /// Allocate a blank true-color buffer.
    fn allocate(&self, width: u32, height: u32) -> Result<Self::Buffer, BackendError>;

    /// Decode an encoded image, sniffing the format from its content.
    fn decode(&self, data: &[u8]) -> Result<Self::Buffer, BackendError>;

    /// Decode a file with the decoder for `format`.
    fn decode_file(&self, path: &Path, format: Format) -> Result<Self::Buffer, BackendError>;

    /// Encode `buffer` into `out`. `quality` only affects lossy formats.
    fn encode(
        &self,
        buffer: &Self::Buffer,
        format: Format,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError>;

    /// Free a buffer.
    fn release(&self, buffer: Self::Buffer) {
        drop(buffer);
    }

    fn dimensions(&self, buffer: &Self::Buffer) -> Dimensions;

    /// Produce a new buffer of the given size from `buffer` using an
    /// area-weighted filter. The source buffer is left untouched.
    fn resample(
        &self,
        buffer: &Self::Buffer,
        width: u32,
        height: u32,
    ) -> Result<Self::Buffer, BackendError>;

    /// Index for an exact color, allocating it if the color space needs to.
    fn color_allocate(&self, buffer: &mut Self::Buffer, color: Rgb) -> Option<ColorIndex>;

    /// Index of an exact color already present in the buffer.
    fn color_exact(&self, buffer: &Self::Buffer, color: Rgb) -> Option<ColorIndex>;

    /// Index of the nearest color present in the buffer.
    fn color_closest(&self, buffer: &Self::Buffer, color: Rgb) -> Option<ColorIndex>;

    fn set_transparent(
        &self,
        buffer: &mut Self::Buffer,
        index: ColorIndex,
    ) -> Result<(), BackendError>;

    fn apply_filter(&self, buffer: &mut Self::Buffer, filter: &Filter) -> Result<(), BackendError>;

    fn convolve(&self, buffer: &mut Self::Buffer, kernel: &Kernel) -> Result<(), BackendError>;

    fn set_alpha_blending(
        &self,
        buffer: &mut Self::Buffer,
        enable: bool,
    ) -> Result<(), BackendError>;

    fn set_antialias(&self, buffer: &mut Self::Buffer, enable: bool) -> Result<(), BackendError>;
}
