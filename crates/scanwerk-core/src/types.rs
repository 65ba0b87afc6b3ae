// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk document scanner.

use serde::{Deserialize, Serialize};

/// An integer pixel coordinate in frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Exactly four corners of a document outline.
///
/// Corner order is whatever the producer supplied; the rectifier puts
/// them into top-left, top-right, bottom-right, bottom-left order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    corners: [Point; 4],
}

impl Quad {
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Build a quad from a polygon, or `None` unless it has exactly 4 vertices.
    pub fn from_polygon(polygon: &[Point]) -> Option<Self> {
        let corners: [Point; 4] = polygon.try_into().ok()?;
        Some(Self { corners })
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Mean of the four corners, truncated to whole pixels.
    pub fn centroid(&self) -> Point {
        let sx: i64 = self.corners.iter().map(|p| i64::from(p.x)).sum();
        let sy: i64 = self.corners.iter().map(|p| i64::from(p.y)).sum();
        Point::new((sx / 4) as i32, (sy / 4) as i32)
    }

    /// Enclosed area using the shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.corners.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.corners[i];
                let b = self.corners[(i + 1) % n];
                i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
            })
            .sum();
        twice.abs() as f64 / 2.0
    }
}

/// Image quality scores for a rectified document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Variance of the Laplacian of the grayscale image.
    pub sharpness: f64,
    /// Mean grayscale intensity (0-255).
    pub brightness: f64,
    /// Standard deviation of grayscale intensity.
    pub contrast: f64,
    /// Weighted composite, 0-100.
    pub overall_score: u8,
    /// Whether `overall_score` reached the configured threshold.
    pub acceptable: bool,
}

/// States of the automatic capture cycle.
///
/// The countdown shown to the operator is a view of `Detecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureState {
    /// No qualifying document in view.
    #[default]
    Idle,
    /// A qualifying document has been in view since the recorded start time.
    Detecting,
    /// A capture was just written; frames are ignored until the pause ends.
    Saved,
}

/// How a capture was triggered. Decides the file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    Automatic,
    Manual,
}

impl CaptureKind {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Automatic => "doc",
            Self::Manual => "manual",
        }
    }
}

/// Events relayed to the external controller device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerEvent {
    Detected,
    Lost,
    Saved,
    Shutdown,
}

impl ControllerEvent {
    /// Newline-terminated ASCII token written to the controller link.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Detected => "DOC_DETECTED\n",
            Self::Lost => "DOC_LOST\n",
            Self::Saved => "DOC_SAVED\n",
            Self::Shutdown => "SCANNER_OFF\n",
        }
    }
}

impl std::fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token().trim_end())
    }
}
