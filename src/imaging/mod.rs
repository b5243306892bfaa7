//! Image handles, formats, and the raster backend.
//!
//! | Operation | Where |
//! |---|---|
//! | **Create / load / open** | [`ImageFactory`] |
//! | **Queries, filters, scale, save/dump** | [`RasterHandle`] |
//! | **Pixel work** | [`RasterBackend`] trait, [`RustBackend`] on the `image` crate |
//! | **Format dispatch** | [`Format`] (JPEG, PNG, GIF) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`] + its pixel kernels
//! - **Handle / Factory**: The fluent image API built on top of a backend

pub mod backend;
mod calculations;
mod error;
mod factory;
mod format;
mod kernels;
mod params;
pub mod rust_backend;
mod writer;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use calculations::calculate_scale_dimensions;
pub use error::ImageError;
pub use factory::{BackendInfo, ImageFactory};
pub use format::Format;
pub use params::{ColorIndex, Filter, Kernel, Quality, Rgb};
pub use rust_backend::{Raster, RustBackend};
pub use writer::RasterHandle;
