// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document outline search over a conditioned mask.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use scanwerk_core::config::DetectionConfig;
use scanwerk_core::{Point, Quad};
use tracing::{debug, instrument, trace};

use crate::geometry::{bounding_box, from_pixel, is_convex, polygon_area, simplify_closed};

/// One closed outline found in the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    /// Traced boundary pixels.
    pub contour: Vec<Point>,
    /// Simplified outline.
    pub polygon: Vec<Point>,
    /// Shoelace area of `polygon`.
    pub area: f64,
}

impl DetectionCandidate {
    /// The polygon as a quad, when it has exactly four vertices.
    pub fn quad(&self) -> Option<Quad> {
        Quad::from_polygon(&self.polygon)
    }
}

/// Finds the most plausible document in a mask.
pub struct DocumentLocator<'a> {
    config: &'a DetectionConfig,
}

impl<'a> DocumentLocator<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Every outermost contour, simplified, in scan order.
    pub fn candidates(&self, mask: &GrayImage) -> Vec<DetectionCandidate> {
        find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| {
                let polygon = simplify_closed(&c.points, self.config.epsilon_factor);
                let area = polygon_area(&polygon);
                let contour: Vec<Point> = c.points.into_iter().map(from_pixel).collect();
                DetectionCandidate {
                    contour,
                    polygon,
                    area,
                }
            })
            .collect()
    }

    /// Whether a candidate looks like a sheet of paper in a `frame_size` frame.
    pub fn is_valid_document(&self, candidate: &DetectionCandidate, frame_size: (u32, u32)) -> bool {
        let cfg = self.config;

        if candidate.area < cfg.min_area || candidate.area > cfg.max_area {
            trace!(area = candidate.area, "rejected: area out of range");
            return false;
        }
        if candidate.polygon.len() != 4 {
            trace!(vertices = candidate.polygon.len(), "rejected: not a quadrilateral");
            return false;
        }

        let Some((_, _, w, h)) = bounding_box(&candidate.polygon) else {
            return false;
        };
        let aspect = f64::from(w) / f64::from(h);
        if aspect < cfg.min_aspect || aspect > cfg.max_aspect {
            trace!(aspect, "rejected: aspect ratio out of range");
            return false;
        }

        let margin = cfg.border_margin;
        let (fw, fh) = (frame_size.0 as i32, frame_size.1 as i32);
        let near_border = candidate
            .polygon
            .iter()
            .any(|p| p.x < margin || p.y < margin || p.x > fw - margin || p.y > fh - margin);
        if near_border {
            trace!("rejected: corner too close to the frame border");
            return false;
        }

        if !is_convex(&candidate.polygon) {
            trace!("rejected: not convex");
            return false;
        }
        true
    }

    /// The largest valid candidate. Equal areas keep the first found.
    #[instrument(skip_all)]
    pub fn locate(&self, mask: &GrayImage, frame_size: (u32, u32)) -> Option<DetectionCandidate> {
        let candidates = self.candidates(mask);
        let total = candidates.len();

        let best = candidates
            .into_iter()
            .filter(|c| self.is_valid_document(c, frame_size))
            .fold(None::<DetectionCandidate>, |best, c| match best {
                Some(b) if b.area >= c.area => Some(b),
                _ => Some(c),
            });

        debug!(
            contours = total,
            found = best.is_some(),
            area = best.as_ref().map(|c| c.area),
            "document search complete"
        );
        best
    }
}
