//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the uniform-scale dimensions that fit `source` inside `target`.
///
/// The scale factor is `min(target_w / src_w, target_h / src_h)`, so the
/// aspect ratio is preserved and neither result exceeds the request. Both
/// results are rounded toward zero. The arithmetic is done on integers: the
/// binding dimension lands exactly on its target instead of drifting one
/// pixel short through float rounding.
///
/// # Returns
/// * `Some((width, height))` - New dimensions, both positive
/// * `None` - A source or target dimension is zero, or a result would be zero
///
/// # Examples
/// ```
/// # use pixelchain::imaging::calculate_scale_dimensions;
/// // 320x213 into a 100x100 box → height binds after flooring: 100x66
/// assert_eq!(calculate_scale_dimensions((320, 213), (100, 100)), Some((100, 66)));
///
/// // Upscaling is allowed: 50x25 into 200x200 → 200x100
/// assert_eq!(calculate_scale_dimensions((50, 25), (200, 200)), Some((200, 100)));
/// ```
pub fn calculate_scale_dimensions(source: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = (source.0 as u64, source.1 as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    if src_w == 0 || src_h == 0 || tgt_w == 0 || tgt_h == 0 {
        return None;
    }

    // tgt_w / src_w <= tgt_h / src_h  ⇔  tgt_w * src_h <= tgt_h * src_w
    let (w, h) = if tgt_w * src_h <= tgt_h * src_w {
        // Width binds
        (tgt_w, tgt_w * src_h / src_w)
    } else {
        // Height binds
        (tgt_h * src_w / src_h, tgt_h)
    };

    if w == 0 || h == 0 {
        return None;
    }
    Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?))
}
