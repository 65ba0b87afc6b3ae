// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quality scoring for rectified documents.

use image::{GrayImage, RgbImage};
use imageproc::filter::laplacian_filter;
use scanwerk_core::QualityMetrics;
use tracing::trace;

/// Laplacian variance at which sharpness scores full marks.
const SHARPNESS_FULL: f64 = 100.0;
/// Standard deviation at which contrast scores full marks.
const CONTRAST_FULL: f64 = 50.0;
/// Ideal mean intensity.
const MID_GRAY: f64 = 128.0;

/// Scores rectified images against a fixed threshold.
#[derive(Debug, Clone, Copy)]
pub struct QualityAssessor {
    threshold: u8,
}

impl QualityAssessor {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn assess(&self, image: &RgbImage) -> QualityMetrics {
        let gray = image::imageops::grayscale(image);
        let sharpness = laplacian_variance(&gray);
        let (brightness, contrast) = mean_and_std_dev(&gray);
        let overall_score = composite_score(sharpness, brightness, contrast);
        trace!(sharpness, brightness, contrast, overall_score, "quality assessed");

        QualityMetrics {
            sharpness,
            brightness,
            contrast,
            overall_score,
            acceptable: overall_score >= self.threshold,
        }
    }
}

/// Variance of the 4-neighbour Laplacian, edges replicated. Zero for empty
/// images.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    let laplacian = laplacian_filter(gray);
    let (sum, sum_sq) = laplacian.pixels().fold((0.0, 0.0), |(s, sq), p| {
        let v = f64::from(p.0[0]);
        (s + v, sq + v * v)
    });
    let n = laplacian.pixels().len() as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Mean and population standard deviation of intensity. Zero for empty images.
pub fn mean_and_std_dev(gray: &GrayImage) -> (f64, f64) {
    let n = gray.pixels().len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let (sum, sum_sq) = gray.pixels().fold((0.0, 0.0), |(s, sq), p| {
        let v = f64::from(p.0[0]);
        (s + v, sq + v * v)
    });
    let n = n as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Weighted 0-100 score: 40% sharpness, 30% brightness, 30% contrast.
pub fn composite_score(sharpness: f64, brightness: f64, contrast: f64) -> u8 {
    let sharpness_score = (sharpness / SHARPNESS_FULL * 100.0).min(100.0);
    let brightness_score = 100.0 - (brightness - MID_GRAY).abs() / MID_GRAY * 100.0;
    let contrast_score = (contrast / CONTRAST_FULL * 100.0).min(100.0);

    let overall = 0.4 * sharpness_score + 0.3 * brightness_score + 0.3 * contrast_score;
    overall.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn flat_image_is_not_sharp() {
        let gray = GrayImage::from_pixel(20, 20, Luma([128]));
        assert_eq!(laplacian_variance(&gray), 0.0);
        assert_eq!(mean_and_std_dev(&gray), (128.0, 0.0));
    }

    /// One lit pixel: centre response -1020, four neighbours +255.
    #[test]
    fn isolated_point_response() {
        let mut gray = GrayImage::new(5, 5);
        gray.put_pixel(2, 2, Luma([255]));
        assert_eq!(laplacian_variance(&gray), 52020.0);
    }

    #[test]
    fn tiny_and_empty_images() {
        assert_eq!(laplacian_variance(&GrayImage::new(2, 2)), 0.0);
        assert_eq!(laplacian_variance(&GrayImage::new(0, 0)), 0.0);
        assert_eq!(mean_and_std_dev(&GrayImage::new(0, 0)), (0.0, 0.0));
    }

    #[test]
    fn half_and_half_statistics() {
        let mut gray = GrayImage::from_pixel(10, 10, Luma([0]));
        for (x, _, p) in gray.enumerate_pixels_mut() {
            if x >= 5 {
                p.0[0] = 200;
            }
        }
        let (mean, std) = mean_and_std_dev(&gray);
        assert!((mean - 100.0).abs() < 1e-9);
        assert!((std - 100.0).abs() < 1e-9);
    }

    #[test]
    fn score_extremes() {
        assert_eq!(composite_score(1000.0, 128.0, 500.0), 100);
        assert_eq!(composite_score(0.0, 128.0, 0.0), 30);
        assert_eq!(composite_score(0.0, 0.0, 0.0), 0);
        assert_eq!(composite_score(50.0, 128.0, 25.0), 65);
    }

    #[test]
    fn score_non_decreasing_in_sharpness() {
        let mut previous = 0;
        for step in 0..400 {
            let score = composite_score(f64::from(step) * 0.5, 128.0, 30.0);
            assert!(score >= previous, "score fell at sharpness {}", f64::from(step) * 0.5);
            previous = score;
        }
    }

    #[test]
    fn threshold_gates_acceptance() {
        let mut img = RgbImage::from_pixel(64, 64, Rgb([20, 20, 20]));
        for (x, y, p) in img.enumerate_pixels_mut() {
            if (x / 2 + y / 2) % 2 == 0 {
                *p = Rgb([230, 230, 230]);
            }
        }
        let metrics = QualityAssessor::new(60).assess(&img);
        assert!(metrics.sharpness > 100.0);
        assert!(metrics.acceptable, "{metrics:?}");

        let strict = QualityAssessor::new(100).assess(&img);
        assert_eq!(strict.overall_score, metrics.overall_score);
        assert!(strict.overall_score == 100 || !strict.acceptable);

        let blank = QualityAssessor::new(60).assess(&RgbImage::from_pixel(64, 64, Rgb([128, 128, 128])));
        assert_eq!(blank.overall_score, 30);
        assert!(!blank.acceptable);
    }
}
