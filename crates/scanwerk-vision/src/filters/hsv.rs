// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 8-bit HSV conversion and range masks.
//
// Hue is stored halved (0-179) so it fits a byte; saturation and value span
// the full 0-255 range.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Convert one RGB pixel to `[hue, saturation, value]`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(i32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0 { 0 } else { (255 * delta + max / 2) / max };

    let hue = if delta == 0 {
        0.0
    } else {
        let d = delta as f32;
        let degrees = if max == r {
            60.0 * (g - b) as f32 / d
        } else if max == g {
            120.0 + 60.0 * (b - r) as f32 / d
        } else {
            240.0 + 60.0 * (r - g) as f32 / d
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        (degrees / 2.0).round() % 180.0
    };

    [hue as u8, saturation as u8, max as u8]
}

/// Inclusive bounds on each HSV channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// 255 where the pixel falls in any of `ranges`, 0 elsewhere.
pub fn in_any_range(image: &RgbImage, ranges: &[HsvRange]) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let hsv = rgb_to_hsv(*pixel);
        if ranges.iter().any(|r| r.contains(hsv)) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grays_have_no_saturation() {
        assert_eq!(rgb_to_hsv(Rgb([200, 200, 200])), [0, 0, 200]);
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 0])), [0, 0, 0]);
    }

    #[test]
    fn primaries() {
        assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 255])), [120, 255, 255]);
    }

    #[test]
    fn range_mask_marks_light_pixels() {
        let mut img = RgbImage::from_pixel(4, 1, Rgb([30, 30, 30]));
        img.put_pixel(1, 0, Rgb([230, 230, 225]));
        img.put_pixel(2, 0, Rgb([230, 40, 40]));

        let light = HsvRange::new([0, 0, 180], [180, 30, 255]);
        let mask = in_any_range(&img, &[light]);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(1, 0).0[0], 255);
        // Saturated red is bright but not paper.
        assert_eq!(mask.get_pixel(2, 0).0[0], 0);
    }
}
