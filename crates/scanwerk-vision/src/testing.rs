// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic frames for tests, benches and dry runs.

use image::{Rgb, RgbImage};

pub const BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
pub const PAPER: Rgb<u8> = Rgb([190, 190, 190]);
/// One-pixel border drawn around the sheet.
pub const PAPER_EDGE: Rgb<u8> = Rgb([160, 160, 160]);
pub const INK: Rgb<u8> = Rgb([20, 20, 20]);

/// Blank paper margin inside the sheet border.
pub const PRINT_MARGIN: u32 = 8;
/// Side of one checker cell in the printed area.
pub const PRINT_CELL: u32 = 4;

/// A dark frame holding one axis-aligned sheet of printed paper.
///
/// `sheet` is `(x, y, width, height)`. The printed area is a checker
/// pattern so the sheet has texture when rectified.
pub fn document_frame(width: u32, height: u32, sheet: (u32, u32, u32, u32)) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, BACKGROUND);
    let (sx, sy, sw, sh) = sheet;
    let x_end = (sx + sw).min(width);
    let y_end = (sy + sh).min(height);

    for y in sy..y_end {
        for x in sx..x_end {
            let (lx, ly) = (x - sx, y - sy);
            let on_border = lx == 0 || ly == 0 || x == x_end - 1 || y == y_end - 1;
            let printed = lx >= PRINT_MARGIN
                && ly >= PRINT_MARGIN
                && lx + PRINT_MARGIN < sw
                && ly + PRINT_MARGIN < sh
                && ((lx / PRINT_CELL) + (ly / PRINT_CELL)) % 2 == 0;

            let pixel = if on_border {
                PAPER_EDGE
            } else if printed {
                INK
            } else {
                PAPER
            };
            frame.put_pixel(x, y, pixel);
        }
    }
    frame
}

/// A featureless frame.
pub fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}
