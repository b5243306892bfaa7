//! Pixel kernels for [`RustBackend`](super::rust_backend::RustBackend).
//!
//! Every function mutates an RGBA8 raster in place and leaves the alpha
//! channel alone unless the effect is defined on alpha (only `colorize`).
//! Numeric conventions follow the classic GD filters so results match what
//! users of that library expect: contrast with a negative value increases
//! contrast, colorize adds rather than blends, edge detect and emboss are
//! biased by 127.

use super::backend::BackendError;
use super::params::{Kernel, Rgb};
use image::imageops::colorops;
use image::{Rgba, RgbaImage};

const EDGE_DETECT: Kernel = Kernel {
    matrix: [[-1.0, 0.0, -1.0], [0.0, 4.0, 0.0], [-1.0, 0.0, -1.0]],
    divisor: 1.0,
    offset: 127.0,
};

const EMBOSS: Kernel = Kernel {
    matrix: [[1.5, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, -1.5]],
    divisor: 1.0,
    offset: 127.0,
};

const GAUSSIAN: Kernel = Kernel {
    matrix: [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]],
    divisor: 16.0,
    offset: 0.0,
};

const MEAN_REMOVAL: Kernel = Kernel {
    matrix: [[-1.0, -1.0, -1.0], [-1.0, 9.0, -1.0], [-1.0, -1.0, -1.0]],
    divisor: 1.0,
    offset: 0.0,
};

#[inline]
fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert 8-bit alpha (255 = opaque) to the 0 (opaque) – 127 scale.
#[inline]
fn to_transparency(alpha: u8) -> i32 {
    (255 - alpha as i32) >> 1
}

#[inline]
fn from_transparency(t: i32) -> u8 {
    let t = t.clamp(0, 127);
    ((127 - t) * 255 / 127) as u8
}

pub fn negate(img: &mut RgbaImage) {
    colorops::invert(img);
}

pub fn grayscale(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let [r, g, b, _] = px.0;
        let y = clamp_channel(0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64);
        px.0[..3].fill(y);
    }
}

pub fn brightness(img: &mut RgbaImage, value: i32) {
    colorops::brighten_in_place(img, value);
}

/// `value` in -100..=100; negative values increase contrast.
pub fn contrast(img: &mut RgbaImage, value: i32) {
    let factor = ((100.0 - value as f64) / 100.0).powi(2);
    for px in img.pixels_mut() {
        for c in &mut px.0[..3] {
            let v = ((*c as f64 / 255.0 - 0.5) * factor + 0.5) * 255.0;
            *c = clamp_channel(v);
        }
    }
}

pub fn gamma(img: &mut RgbaImage, input: f64, output: f64) -> Result<(), BackendError> {
    if !(input.is_finite() && output.is_finite()) || input <= 0.0 || output <= 0.0 {
        return Err(BackendError::ProcessingFailed(format!(
            "invalid gamma pair {input}/{output}"
        )));
    }
    let exponent = input / output;
    let table: Vec<u8> = (0..=255u32)
        .map(|c| clamp_channel((c as f64 / 255.0).powf(exponent) * 255.0))
        .collect();
    for px in img.pixels_mut() {
        for c in &mut px.0[..3] {
            *c = table[*c as usize];
        }
    }
    Ok(())
}

/// Add `color` to every pixel; `alpha` (0–127) raises transparency.
pub fn colorize(img: &mut RgbaImage, color: Rgb, alpha: u8) {
    let add = [color.red, color.green, color.blue];
    for px in img.pixels_mut() {
        for (c, a) in px.0[..3].iter_mut().zip(add) {
            *c = c.saturating_add(a);
        }
        px.0[3] = from_transparency(to_transparency(px.0[3]) + alpha as i32);
    }
}

pub fn edge_detect(img: &mut RgbaImage) -> Result<(), BackendError> {
    convolve(img, &EDGE_DETECT)
}

pub fn emboss(img: &mut RgbaImage) -> Result<(), BackendError> {
    convolve(img, &EMBOSS)
}

pub fn gaussian_blur(img: &mut RgbaImage) -> Result<(), BackendError> {
    convolve(img, &GAUSSIAN)
}

pub fn mean_removal(img: &mut RgbaImage) -> Result<(), BackendError> {
    convolve(img, &MEAN_REMOVAL)
}

pub fn smooth(img: &mut RgbaImage, weight: i32) -> Result<(), BackendError> {
    let w = weight as f32;
    let matrix = [[1.0, 1.0, 1.0], [1.0, w, 1.0], [1.0, 1.0, 1.0]];
    convolve(img, &Kernel::normalized(matrix, 0.0))
}

/// 3×3 convolution with border samples clamped to the edge.
pub fn convolve(img: &mut RgbaImage, kernel: &Kernel) -> Result<(), BackendError> {
    if kernel.divisor == 0.0 || !kernel.divisor.is_finite() {
        return Err(BackendError::ProcessingFailed(
            "convolution divisor must be non-zero".into(),
        ));
    }
    let src = img.clone();
    let (w, h) = src.dimensions();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (j, row) in kernel.matrix.iter().enumerate() {
                let sy = (y as i64 + j as i64 - 1).clamp(0, h as i64 - 1) as u32;
                for (i, weight) in row.iter().enumerate() {
                    let sx = (x as i64 + i as i64 - 1).clamp(0, w as i64 - 1) as u32;
                    let n = src.get_pixel(sx, sy).0;
                    for (a, c) in acc.iter_mut().zip(n) {
                        *a += weight * c as f32;
                    }
                }
            }
            let px = img.get_pixel_mut(x, y);
            for (c, a) in px.0[..3].iter_mut().zip(acc) {
                *c = clamp_channel((a / kernel.divisor + kernel.offset) as f64);
            }
        }
    }
    Ok(())
}

/// Edge-preserving blur: neighbors are weighted by how close their color is
/// to the center pixel, channel by channel.
pub fn selective_blur(img: &mut RgbaImage) {
    let src = img.clone();
    let (w, h) = src.dimensions();
    for y in 0..h {
        for x in 0..w {
            let center = src.get_pixel(x, y).0;
            let mut sum = [0.0f64; 3];
            let mut weights = [0.0f64; 3];
            for dy in -1i64..=1 {
                let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                for dx in -1i64..=1 {
                    let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                    let n = src.get_pixel(sx, sy).0;
                    for ch in 0..3 {
                        let diff = (n[ch] as f64 - center[ch] as f64).abs();
                        let weight = if dx == 0 && dy == 0 {
                            0.5
                        } else if diff == 0.0 {
                            1.0
                        } else {
                            1.0 / diff
                        };
                        sum[ch] += weight * n[ch] as f64;
                        weights[ch] += weight;
                    }
                }
            }
            let px = img.get_pixel_mut(x, y);
            for ch in 0..3 {
                px.0[ch] = clamp_channel(sum[ch] / weights[ch]);
            }
        }
    }
}

/// Fill each `block_size` square with its top-left pixel, or with the block
/// average when `advanced` is set.
pub fn pixelate(img: &mut RgbaImage, block_size: u32, advanced: bool) -> Result<(), BackendError> {
    if block_size == 0 {
        return Err(BackendError::ProcessingFailed(
            "pixelation block size must be positive".into(),
        ));
    }
    if block_size == 1 {
        return Ok(());
    }
    let (w, h) = img.dimensions();
    for by in (0..h).step_by(block_size as usize) {
        for bx in (0..w).step_by(block_size as usize) {
            let bw = block_size.min(w - bx);
            let bh = block_size.min(h - by);
            let fill = if advanced {
                let mut acc = [0u64; 4];
                for y in by..by + bh {
                    for x in bx..bx + bw {
                        for (a, c) in acc.iter_mut().zip(img.get_pixel(x, y).0) {
                            *a += c as u64;
                        }
                    }
                }
                let n = (bw * bh) as u64;
                Rgba(acc.map(|a| ((a + n / 2) / n) as u8))
            } else {
                *img.get_pixel(bx, by)
            };
            for y in by..by + bh {
                for x in bx..bx + bw {
                    img.put_pixel(x, y, fill);
                }
            }
        }
    }
    Ok(())
}
