// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end vision path on synthetic frames.

use scanwerk_core::config::DetectionConfig;
use scanwerk_vision::testing::{blank_frame, document_frame};
use scanwerk_vision::{DocumentLocator, FrameConditioner, PerspectiveRectifier, QualityAssessor};

/// A printed sheet of about 5000 px² is found, rectified and passes the
/// default quality gate.
#[test]
fn printed_sheet_passes_quality_gate() {
    let frame = document_frame(320, 240, (110, 95, 100, 50));
    let config = DetectionConfig::default();

    let mask = FrameConditioner::new(&config).condition(&frame);
    let candidate = DocumentLocator::new(&config)
        .locate(&mask, frame.dimensions())
        .expect("sheet should be found");
    assert!((candidate.area - 5000.0).abs() < 500.0, "area {}", candidate.area);

    let quad = candidate.quad().expect("four corners");
    let flat = PerspectiveRectifier::new(false)
        .rectify(&frame, &quad)
        .expect("rectified");
    assert_eq!(flat.dimensions(), (300, 300));

    let metrics = QualityAssessor::new(60).assess(&flat);
    assert!(metrics.acceptable, "{metrics:?}");
}

/// Plain paper with nothing printed is found but scores poorly.
#[test]
fn blank_sheet_fails_quality_gate() {
    let config = DetectionConfig::default();
    let mut frame = document_frame(320, 240, (60, 50, 200, 140));
    // Paint over the print.
    for y in 52..188 {
        for x in 62..258 {
            frame.put_pixel(x, y, scanwerk_vision::testing::PAPER);
        }
    }

    let mask = FrameConditioner::new(&config).condition(&frame);
    let quad = DocumentLocator::new(&config)
        .locate(&mask, frame.dimensions())
        .and_then(|c| c.quad())
        .expect("sheet should be found");
    let flat = PerspectiveRectifier::new(false).rectify(&frame, &quad).unwrap();
    let metrics = QualityAssessor::new(60).assess(&flat);
    assert!(!metrics.acceptable, "{metrics:?}");
}

#[test]
fn nothing_found_in_empty_scene() {
    let config = DetectionConfig::default();
    let frame = blank_frame(320, 240);
    let mask = FrameConditioner::new(&config).condition(&frame);
    assert!(DocumentLocator::new(&config).locate(&mask, frame.dimensions()).is_none());
}

/// A sheet pushed against the frame edge is rejected by the border margin.
#[test]
fn sheet_touching_border_rejected() {
    let config = DetectionConfig::default();
    let frame = document_frame(320, 240, (2, 60, 120, 80));
    let mask = FrameConditioner::new(&config).condition(&frame);
    assert!(DocumentLocator::new(&config).locate(&mask, frame.dimensions()).is_none());
}
