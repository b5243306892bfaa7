//! # Pixelchain
//!
//! Fluent, in-place raster image transformations. Open a JPEG, PNG or GIF
//! (or create a blank canvas, or load encoded bytes), chain filters and a
//! proportional scale onto the handle, then save it to a file or dump it to
//! stdout.
//!
//! ```no_run
//! use pixelchain::imaging::ImageFactory;
//!
//! # fn main() -> Result<(), pixelchain::imaging::ImageError> {
//! let factory = ImageFactory::new();
//! let mut img = factory.open("dusk.jpg")?;
//! img.grayscale()?.brightness(20)?.scale(640, 640)?;
//! img.save("dusk-small.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Handles, the factory, formats, and the raster backend |
//! | [`pipeline`] | Serializable [`pipeline::Step`]s and fail-fast application |
//! | [`config`] | TOML recipe loading, merging onto stock defaults, validation |
//!
//! # Design Decisions
//!
//! ## Handles Own Their Buffer
//!
//! A [`imaging::RasterHandle`] owns exactly one backend buffer and borrows
//! the backend from its factory. The buffer is released exactly once: by
//! `save`/`dump`, by `close`, or by `Drop`. A closed handle is still a valid
//! value; transformations on it are no-ops and queries return `None`.
//!
//! ## Errors Abort the Chain
//!
//! Every transformation returns `Result<&mut Self, ImageError>`, so `?`
//! stops a chain at the first failure. There are no error flags to poll and
//! nothing is retried.
//!
//! ## Backend Behind a Trait
//!
//! Pixel work goes through [`imaging::RasterBackend`]. The production
//! [`imaging::RustBackend`] is pure Rust on the `image` crate, with no system
//! libraries to install. Tests swap in a recording mock to check the exact
//! sequence of backend calls and that no buffer leaks.

pub mod config;
pub mod imaging;
pub mod pipeline;
