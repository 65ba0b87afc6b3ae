// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast and colour filters imageproc lacks, plus mask combinators.

pub mod clahe;
pub mod hsv;

pub use clahe::clahe;
pub use hsv::{HsvRange, rgb_to_hsv};

use image::{GrayImage, Luma};
use imageproc::map::map_colors2;

/// Pixel-wise maximum of two equally sized masks.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    map_colors2(a, b, |p, q| Luma([p.0[0].max(q.0[0])]))
}

/// Pixel-wise minimum of two equally sized masks.
pub fn intersection(a: &GrayImage, b: &GrayImage) -> GrayImage {
    map_colors2(a, b, |p, q| Luma([p.0[0].min(q.0[0])]))
}
