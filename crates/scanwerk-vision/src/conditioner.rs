// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame conditioning: turns a raw colour frame into a binary mask in which
// the document outline is a closed foreground ring.

use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::bilateral_filter;
use imageproc::morphology::{close, dilate, erode, open};
use scanwerk_core::config::DetectionConfig;
use tracing::{instrument, trace};

use crate::filters::hsv::in_any_range;
use crate::filters::{HsvRange, clahe, intersection, union};

const CLAHE_CLIP_LIMIT: f32 = 2.0;
const CLAHE_TILES: u32 = 8;

const BILATERAL_WINDOW: u32 = 5;
const BILATERAL_SIGMA: f32 = 50.0;

/// White paper, and slightly darker paper under weaker light.
const PAPER_RANGES: [HsvRange; 2] = [
    HsvRange::new([0, 0, 180], [180, 30, 255]),
    HsvRange::new([0, 0, 150], [180, 50, 255]),
];

/// Closing radius that fills printed text inside the paper mask.
const PAPER_FILL_RADIUS: u8 = 7;

/// Builds the per-frame detection mask.
pub struct FrameConditioner<'a> {
    config: &'a DetectionConfig,
}

impl<'a> FrameConditioner<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Edge mask: equalise, smooth, detect edges at two sensitivities, then
    /// thicken and close small gaps.
    pub fn edge_mask(&self, frame: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(frame);
        if gray.is_empty() {
            return gray;
        }
        let equalised = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_TILES);
        let smoothed = bilateral_filter(&equalised, BILATERAL_WINDOW, BILATERAL_SIGMA, BILATERAL_SIGMA);

        let (low, high) = (self.config.canny_low, self.config.canny_high);
        let strict = canny(&smoothed, low, high);
        let lenient = canny(&smoothed, low / 2.0, high / 2.0);
        let edges = union(&strict, &lenient);

        let thickened = dilate(&edges, Norm::LInf, 2);
        let thinned = erode(&thickened, Norm::LInf, 1);
        close(&thinned, Norm::LInf, 1)
    }

    /// Paper mask: light, low-saturation pixels, with specks removed and
    /// print filled in.
    pub fn paper_mask(&self, frame: &RgbImage) -> GrayImage {
        let raw = in_any_range(frame, &PAPER_RANGES);
        let cleaned = open(&raw, Norm::LInf, 1);
        close(&cleaned, Norm::LInf, PAPER_FILL_RADIUS)
    }

    /// The mask handed to the locator.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn condition(&self, frame: &RgbImage) -> GrayImage {
        let edges = self.edge_mask(frame);
        if !self.config.color_assist {
            return edges;
        }
        let paper = self.paper_mask(frame);
        trace!("edge mask intersected with paper mask");
        intersection(&edges, &paper)
    }
}
