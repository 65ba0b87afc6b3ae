// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator display.
//
// A HUD only observes: it receives each frame with its overlay and never
// feeds anything back into the scanner.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use scanwerk_capture::FrameReport;
use scanwerk_core::error::Result;
use scanwerk_core::{CaptureState, QualityMetrics, Quad};
use tracing::{debug, info, warn};

const PREVIEW_INTERVAL: Duration = Duration::from_secs(1);
const CENTRE_RADIUS: i32 = 5;

const SEARCHING: Rgb<u8> = Rgb([255, 0, 0]);
const COUNTING: Rgb<u8> = Rgb([255, 255, 0]);
const SAVED: Rgb<u8> = Rgb([0, 255, 0]);

// -- Overlay ------------------------------------------------------------------

/// Annotations drawn over one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub outline: Option<Quad>,
    pub state: CaptureState,
    pub remaining_seconds: Option<u64>,
    pub quality: Option<QualityMetrics>,
    pub fps: u32,
}

impl Overlay {
    pub fn from_report(report: &FrameReport, fps: u32) -> Self {
        Self {
            outline: report.quad,
            state: report.state,
            remaining_seconds: report.remaining_seconds,
            quality: report.quality,
            fps,
        }
    }

    pub fn status_text(&self) -> String {
        match (self.state, self.remaining_seconds) {
            (CaptureState::Saved, _) => "DOCUMENT SAVED!".to_owned(),
            (CaptureState::Detecting, Some(seconds)) => format!("Saving in {seconds} seconds..."),
            _ => "Searching for documents...".to_owned(),
        }
    }

    /// `Quality: N%` while an outline is shown.
    pub fn quality_text(&self) -> Option<String> {
        self.outline?;
        self.quality.map(|q| format!("Quality: {}%", q.overall_score))
    }

    fn colour(&self) -> Rgb<u8> {
        match self.state {
            CaptureState::Idle => SEARCHING,
            CaptureState::Detecting => COUNTING,
            CaptureState::Saved => SAVED,
        }
    }
}

/// Copy of `frame` with the document outline and its centre marked.
pub fn annotate(frame: &RgbImage, overlay: &Overlay) -> RgbImage {
    let mut canvas = frame.clone();
    let Some(quad) = overlay.outline else {
        return canvas;
    };

    let colour = overlay.colour();
    let corners = quad.corners();
    for (i, start) in corners.iter().enumerate() {
        let end = corners[(i + 1) % corners.len()];
        draw_line_segment_mut(
            &mut canvas,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            colour,
        );
    }
    let centre = quad.centroid();
    draw_filled_circle_mut(&mut canvas, (centre.x, centre.y), CENTRE_RADIUS, colour);
    canvas
}

// -- Displays -----------------------------------------------------------------

pub trait Hud {
    fn render(&mut self, frame: &RgbImage, mask: &GrayImage, overlay: &Overlay, now: Instant);
}

/// Logs the status line whenever it changes.
#[derive(Debug, Default)]
pub struct TracingHud {
    last_status: Option<String>,
}

impl TracingHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }
}

impl Hud for TracingHud {
    fn render(&mut self, _frame: &RgbImage, _mask: &GrayImage, overlay: &Overlay, _now: Instant) {
        let status = overlay.status_text();
        if self.last_status.as_deref() == Some(status.as_str()) {
            return;
        }
        match overlay.quality_text() {
            Some(quality) => info!(fps = overlay.fps, %quality, "{status}"),
            None => info!(fps = overlay.fps, "{status}"),
        }
        self.last_status = Some(status);
    }
}

/// Writes the annotated frame and the conditioned mask to a folder about
/// once a second.
#[derive(Debug)]
pub struct PreviewHud {
    folder: PathBuf,
    last_write: Option<Instant>,
    writes: u64,
}

impl PreviewHud {
    /// Preview files go to `<save_folder>/preview`.
    pub fn new(save_folder: &Path) -> Result<Self> {
        let folder = save_folder.join("preview");
        std::fs::create_dir_all(&folder)?;
        info!(folder = %folder.display(), "processing preview enabled");
        Ok(Self {
            folder,
            last_write: None,
            writes: 0,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn write(&self, frame: &RgbImage, mask: &GrayImage, overlay: &Overlay) -> image::ImageResult<()> {
        annotate(frame, overlay).save(self.folder.join("latest.jpg"))?;
        mask.save(self.folder.join("mask.png"))
    }
}

impl Hud for PreviewHud {
    fn render(&mut self, frame: &RgbImage, mask: &GrayImage, overlay: &Overlay, now: Instant) {
        if self
            .last_write
            .is_some_and(|last| now.duration_since(last) < PREVIEW_INTERVAL)
        {
            return;
        }
        self.last_write = Some(now);

        match self.write(frame, mask, overlay) {
            Ok(()) => {
                self.writes += 1;
                debug!(folder = %self.folder.display(), "preview updated");
            }
            Err(err) => warn!(error = %err, "preview could not be written"),
        }
    }
}
