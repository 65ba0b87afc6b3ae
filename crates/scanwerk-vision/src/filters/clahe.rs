// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalisation.

use image::{GrayImage, Luma};

/// Equalise local contrast over a `tiles x tiles` grid.
///
/// Each tile gets its own histogram, clipped at `clip_limit` times the mean
/// bin height with the excess spread evenly over all bins. Pixels are then
/// mapped through the bilinear blend of the four nearest tile lookup tables
/// so tile seams do not show.
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return image.clone();
    }

    let tiles_x = tiles.min(width) as usize;
    let tiles_y = tiles.min(height) as usize;
    let (w, h) = (width as usize, height as usize);
    let tile_w = w / tiles_x;
    let tile_h = h / tiles_y;

    let luts = tile_lookup_tables(image, tiles_x, tiles_y, tile_w, tile_h, clip_limit);

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = usize::from(pixel.0[0]);

        let (tx0, tx1, ax) = neighbour_tiles(x as usize, tile_w, tiles_x);
        let (ty0, ty1, ay) = neighbour_tiles(y as usize, tile_h, tiles_y);

        let at = |tx: usize, ty: usize| f32::from(luts[ty * tiles_x + tx][value]);
        let top = at(tx0, ty0) * (1.0 - ax) + at(tx1, ty0) * ax;
        let bottom = at(tx0, ty1) * (1.0 - ax) + at(tx1, ty1) * ax;
        let blended = top * (1.0 - ay) + bottom * ay;

        out.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
    }
    out
}

/// Clipped-histogram lookup table for every tile. The last row and column of
/// tiles absorb any remainder pixels.
fn tile_lookup_tables(
    image: &GrayImage,
    tiles_x: usize,
    tiles_y: usize,
    tile_w: usize,
    tile_h: usize,
    clip_limit: f32,
) -> Vec<[u8; 256]> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles_x - 1 { w } else { x0 + tile_w };
            let y1 = if ty == tiles_y - 1 { h } else { y0 + tile_h };
            let count = ((x1 - x0) * (y1 - y0)) as u32;

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[usize::from(image.get_pixel(x as u32, y as u32).0[0])] += 1;
                }
            }

            let clip = ((clip_limit * count as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let per_bin = excess / 256;
            let remainder = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += per_bin + u32::from(i < remainder);
            }

            let lut = &mut luts[ty * tiles_x + tx];
            let mut cumulative = 0u32;
            for (i, bin) in hist.iter().enumerate() {
                cumulative += bin;
                let mapped = (cumulative as f32 * 255.0 / count as f32).round();
                lut[i] = mapped.min(255.0) as u8;
            }
        }
    }
    luts
}

/// Indices of the two tiles whose centres bracket `pos`, and the weight of
/// the second one.
fn neighbour_tiles(pos: usize, tile_size: usize, tiles: usize) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile_size as f32 - 0.5;
    let last = tiles as i64 - 1;
    let t0 = (f.floor() as i64).clamp(0, last) as usize;
    let t1 = (t0 + 1).min(tiles - 1);
    let weight = (f - t0 as f32).clamp(0.0, 1.0);
    (t0, t1, weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_dimensions() {
        let img = GrayImage::from_pixel(80, 60, Luma([128]));
        let out = clahe(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        let out = clahe(&img, 2.0, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn empty_image_is_returned_unchanged() {
        let img = GrayImage::new(0, 0);
        assert_eq!(clahe(&img, 2.0, 8).dimensions(), (0, 0));
    }

    /// A low-contrast texture gets stretched. The high clip limit makes this
    /// plain per-tile equalisation.
    #[test]
    fn stretches_narrow_histogram() {
        let mut img = GrayImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            p.0[0] = 100 + ((x * 7 + y * 13) % 10) as u8;
        }
        let out = clahe(&img, 40.0, 8);

        let range = |g: &GrayImage| {
            let min = g.pixels().map(|p| p.0[0]).min().unwrap_or(0);
            let max = g.pixels().map(|p| p.0[0]).max().unwrap_or(0);
            max - min
        };
        assert!(range(&out) > range(&img));
    }

    /// Images smaller than the tile grid still work.
    #[test]
    fn tiny_image_no_panic() {
        let img = GrayImage::from_pixel(3, 2, Luma([50]));
        let out = clahe(&img, 3.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }
}
