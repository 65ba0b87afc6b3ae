// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: maps a document quadrilateral in the frame to
// a flat, upright image.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{Point, Quad};
use tracing::{debug, instrument};

use crate::filters::clahe;

/// Rectified images are never smaller than this on either side.
pub const MIN_OUTPUT_SIDE: u32 = 300;

const ENHANCE_CLIP_LIMIT: f32 = 3.0;
const ENHANCE_TILES: u32 = 8;
const ENHANCE_BLUR_SIGMA: f32 = 0.5;

/// Put corners in top-left, top-right, bottom-right, bottom-left order.
///
/// Top-left has the smallest `x + y` and bottom-right the largest; of the
/// other two, top-right has the larger `x - y`. Ties are broken on the other
/// key so the result depends only on the set of corners, never on their
/// input order. Sheets turned close to 45 degrees can be labelled one
/// corner off.
pub fn reorder(quad: &Quad) -> Quad {
    let corners = quad.corners();
    let sum = |p: &Point| (p.x + p.y, p.x - p.y);
    let diff = |p: &Point| (p.x - p.y, p.x + p.y);

    let top_left = pick(corners, sum, false);
    let bottom_right = pick(corners, sum, true);
    let top_right = pick(corners, diff, true);
    let bottom_left = pick(corners, diff, false);

    Quad::new([top_left, top_right, bottom_right, bottom_left])
}

fn pick(corners: &[Point; 4], key: impl Fn(&Point) -> (i32, i32), largest: bool) -> Point {
    let mut best = corners[0];
    for p in &corners[1..] {
        let better = if largest {
            key(p) > key(&best)
        } else {
            key(p) < key(&best)
        };
        if better {
            best = *p;
        }
    }
    best
}

/// Output size for an ordered quad: the longer of each pair of opposite
/// edges, truncated, and at least [`MIN_OUTPUT_SIDE`].
pub fn output_size(ordered: &Quad) -> (u32, u32) {
    let [tl, tr, br, bl] = ordered.corners();
    let width = tl.distance(tr).max(bl.distance(br)) as u32;
    let height = tl.distance(bl).max(tr.distance(br)) as u32;
    (width.max(MIN_OUTPUT_SIDE), height.max(MIN_OUTPUT_SIDE))
}

/// Warps document quadrilaterals to rectangles.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveRectifier {
    enhance: bool,
}

impl PerspectiveRectifier {
    /// `enhance` toggles the cosmetic pass applied by [`Self::finish`].
    pub fn new(enhance: bool) -> Self {
        Self { enhance }
    }

    /// Flatten `quad` out of `frame` with bicubic resampling.
    #[instrument(skip_all)]
    pub fn rectify(&self, frame: &RgbImage, quad: &Quad) -> Result<RgbImage> {
        let ordered = reorder(quad);
        let (width, height) = output_size(&ordered);

        let src = ordered.corners().map(|p| (p.x as f32, p.y as f32));
        let (w, h) = (width as f32, height as f32);
        let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dst).ok_or_else(|| {
            ScanwerkError::Geometry(format!("no projective transform for corners {src:?}"))
        })?;

        let mut out = RgbImage::new(width, height);
        warp_into(frame, &projection, Interpolation::Bicubic, Rgb([0, 0, 0]), &mut out);
        debug!(width, height, "document rectified");
        Ok(out)
    }

    /// Local contrast boost with light smoothing, returned as RGB.
    pub fn enhance(&self, image: &RgbImage) -> RgbImage {
        let gray = image::imageops::grayscale(image);
        let boosted = clahe(&gray, ENHANCE_CLIP_LIMIT, ENHANCE_TILES);
        let softened = gaussian_blur_f32(&boosted, ENHANCE_BLUR_SIGMA);
        DynamicImage::ImageLuma8(softened).to_rgb8()
    }

    /// Final form of a capture: enhanced when enabled, untouched otherwise.
    pub fn finish(&self, rectified: RgbImage) -> RgbImage {
        if self.enhance {
            self.enhance(&rectified)
        } else {
            rectified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quad(coords: [(i32, i32); 4]) -> Quad {
        Quad::new(coords.map(|(x, y)| Point::new(x, y)))
    }

    #[test]
    fn square_reorders_from_any_rotation() {
        let expected = quad([(0, 0), (10, 0), (10, 10), (0, 10)]);
        let mut corners = [(0, 0), (10, 0), (10, 10), (0, 10)];
        for _ in 0..4 {
            corners.rotate_left(1);
            assert_eq!(reorder(&quad(corners)), expected);

            let mut reversed = corners;
            reversed.reverse();
            assert_eq!(reorder(&quad(reversed)), expected);
        }
    }

    #[test]
    fn skewed_quad_reorders() {
        let q = quad([(210, 190), (48, 60), (30, 200), (220, 40)]);
        assert_eq!(reorder(&q), quad([(48, 60), (220, 40), (210, 190), (30, 200)]));
    }

    #[test]
    fn output_size_takes_longer_edges() {
        let q = quad([(0, 0), (400, 0), (410, 320), (0, 310)]);
        let (w, h) = output_size(&reorder(&q));
        assert_eq!(w, 410);
        assert_eq!(h, 320);
    }

    #[test]
    fn output_size_has_a_floor() {
        let q = quad([(0, 0), (100, 0), (100, 50), (0, 50)]);
        assert_eq!(output_size(&q), (MIN_OUTPUT_SIDE, MIN_OUTPUT_SIDE));
    }

    /// Straight-on rectangle: the warp reproduces the source pixels.
    #[test]
    fn rectify_axis_aligned_region() {
        let mut frame = RgbImage::from_pixel(600, 500, Rgb([0, 0, 0]));
        for y in 50..450 {
            for x in 100..500 {
                let v = if x < 300 { 200 } else { 60 };
                frame.put_pixel(x, y, Rgb([v, v, v]));
            }
        }
        let q = quad([(100, 50), (500, 50), (500, 450), (100, 450)]);
        let out = PerspectiveRectifier::new(false).rectify(&frame, &q).unwrap();

        assert_eq!(out.dimensions(), (400, 400));
        assert_eq!(out.get_pixel(50, 200).0[0], 200);
        assert_eq!(out.get_pixel(350, 200).0[0], 60);
    }

    #[test]
    fn finish_respects_toggle() {
        let mut img = RgbImage::from_pixel(64, 64, Rgb([120, 40, 40]));
        img.put_pixel(3, 3, Rgb([250, 250, 250]));

        let untouched = PerspectiveRectifier::new(false).finish(img.clone());
        assert_eq!(untouched, img);

        let enhanced = PerspectiveRectifier::new(true).finish(img.clone());
        assert_eq!(enhanced.dimensions(), img.dimensions());
        // Output is gray.
        assert!(enhanced.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
    }

    proptest! {
        /// Reordering is idempotent.
        #[test]
        fn reorder_is_idempotent(
            cx in 100i32..400,
            cy in 100i32..300,
            radii in prop::array::uniform4(20i32..90),
            start in 0.0f64..std::f64::consts::FRAC_PI_2,
        ) {
            let corners: [Point; 4] = std::array::from_fn(|i| {
                let angle = start + i as f64 * std::f64::consts::FRAC_PI_2;
                let r = f64::from(radii[i]);
                Point::new(cx + (r * angle.cos()) as i32, cy + (r * angle.sin()) as i32)
            });
            let q = Quad::new(corners);
            let once = reorder(&q);
            prop_assert_eq!(reorder(&once), once);
        }
    }
}
