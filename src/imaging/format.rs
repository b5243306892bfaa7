//! The closed set of raster formats: JPEG, PNG, GIF.
//!
//! Dispatch is by file extension or type string. `open` and `dump` match
//! case-insensitively; `save` matches the extension exactly as written, so
//! `photo.PNG` is not a recognized save target.

use image::ImageFormat;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Jpeg,
    Png,
    Gif,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Jpeg, Format::Png, Format::Gif];

    /// Case-insensitive lookup (`"JPG"`, `"jpe"`, `"Png"` all match).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::from_extension_exact(&ext.to_ascii_lowercase())
    }

    /// Case-sensitive lookup; only the lowercase spellings match.
    pub fn from_extension_exact(ext: &str) -> Option<Self> {
        match ext {
            "jpe" | "jpg" | "jpeg" => Some(Format::Jpeg),
            "png" => Some(Format::Png),
            "gif" => Some(Format::Gif),
            _ => None,
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Jpeg => &["jpe", "jpg", "jpeg"],
            Format::Png => &["png"],
            Format::Gif => &["gif"],
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Jpeg => "image/jpeg",
            Format::Png => "image/png",
            Format::Gif => "image/gif",
        }
    }
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Jpeg => ImageFormat::Jpeg,
            Format::Png => ImageFormat::Png,
            Format::Gif => ImageFormat::Gif,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Gif => "gif",
        })
    }
}
