// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk vision: per-frame image analysis: edge/paper masks, document
// outline search, perspective rectification and quality scoring.

pub mod conditioner;
pub mod filters;
pub mod geometry;
pub mod locator;
pub mod quality;
pub mod rectifier;
pub mod testing;

pub use conditioner::FrameConditioner;
pub use locator::{DetectionCandidate, DocumentLocator};
pub use quality::QualityAssessor;
pub use rectifier::{PerspectiveRectifier, output_size, reorder};
