// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon helpers for closed contours.
//
// Length, area and Douglas-Peucker simplification come from
// `imageproc::geometry`; this module adapts them to traced contours and adds
// the checks imageproc lacks.

use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::point::Point as PixelPoint;
use scanwerk_core::Point;

pub fn from_pixel(p: PixelPoint<i32>) -> Point {
    Point::new(p.x, p.y)
}

fn to_pixel(p: &Point) -> PixelPoint<i32> {
    PixelPoint::new(p.x, p.y)
}

/// Length of the closed curve through `contour`.
pub fn perimeter(contour: &[PixelPoint<i32>]) -> f64 {
    arc_length(contour, true)
}

/// Simplify a closed traced contour, allowing dropped points to lie up to
/// `epsilon_factor` times the perimeter from the kept outline.
///
/// Contours too small to carry a tolerance come back unchanged.
pub fn simplify_closed(contour: &[PixelPoint<i32>], epsilon_factor: f64) -> Vec<Point> {
    let epsilon = epsilon_factor * perimeter(contour);
    if contour.len() < 3 || !(epsilon > 0.0) {
        return contour.iter().copied().map(from_pixel).collect();
    }
    approximate_polygon_dp(contour, epsilon, true)
        .into_iter()
        .map(from_pixel)
        .collect()
}

/// Shoelace area of a closed polygon, in either winding.
pub fn polygon_area(points: &[Point]) -> f64 {
    let pixels: Vec<PixelPoint<i32>> = points.iter().map(to_pixel).collect();
    contour_area(&pixels)
}

/// Axis-aligned bounds as `(x, y, width, height)`, inclusive of both edges.
pub fn bounding_box(points: &[Point]) -> Option<(i32, i32, i32, i32)> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// True when every turn of the closed polygon goes the same way.
///
/// Collinear vertices are tolerated; a polygon with no turns at all is not
/// convex.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = i64::from(b.x - a.x) * i64::from(c.y - b.y)
            - i64::from(b.y - a.y) * i64::from(c.x - b.x);
        if cross == 0 {
            continue;
        }
        let s = cross.signum();
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    sign != 0
}
