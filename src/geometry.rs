//! Arrow routing geometry.
//!
//! Everything here is pure and works in container coordinates. Distances
//! used for visual thresholds are Chebyshev (max-axis) distances; nearest
//! point queries use Euclidean distance.

use crate::model::{ArrowPath, Point, Rect, full_path};
use thiserror::Error;

/// Below this Chebyshev length an arrow is drawn without a head.
pub const MIN_ARROWHEAD_LENGTH: f32 = 40.0;

/// Points closer than this to the tip are ignored when computing the
/// heading, so pointer jitter at the drop point does not swing the head.
pub const HEADING_EPSILON: f32 = 5.0;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The target rectangle contains a point of the path but no segment
    /// crosses its boundary. Arrow and marker disagree about the geometry.
    #[error("arrow path enters its target marker without crossing its boundary")]
    NoIntersection,

    #[error("a polyline needs at least 2 points, got {len}")]
    DegeneratePolyline { len: usize },
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Chebyshev distance.
pub fn distance_between_points(a: Point, b: Point) -> f32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

pub fn euclidean_distance(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// True if `b` lies between `a` and `c`, inclusive, in either order.
pub fn is_monotonous(a: f32, b: f32, c: f32) -> bool {
    (a <= b && b <= c) || (a >= b && b >= c)
}

pub fn is_point_in_rect(p: Point, rect: &Rect) -> bool {
    is_monotonous(rect.left, p.x, rect.right) && is_monotonous(rect.top, p.y, rect.bottom)
}

/// First point where the segment `p1 -> p2` crosses the boundary of `rect`,
/// travelling from `p1`.
///
/// Edges are tried in the order top, bottom, left, right and only a
/// strictly smaller parameter replaces the current best, so a segment
/// through a corner reports the horizontal edge.
pub fn line_rect_intersection(p1: Point, p2: Point, rect: &Rect) -> Option<Point> {
    let candidates = [
        horizontal_edge_intersection(p1, p2, rect.left, rect.right, rect.top),
        horizontal_edge_intersection(p1, p2, rect.left, rect.right, rect.bottom),
        vertical_edge_intersection(p1, p2, rect.left, rect.top, rect.bottom),
        vertical_edge_intersection(p1, p2, rect.right, rect.top, rect.bottom),
    ];

    let mut best: Option<(f32, Point)> = None;
    for (t, point) in candidates.into_iter().flatten() {
        match best {
            Some((best_t, _)) if t >= best_t => {}
            _ => best = Some((t, point)),
        }
    }
    best.map(|(_, point)| point)
}

fn horizontal_edge_intersection(
    p1: Point,
    p2: Point,
    x1: f32,
    x2: f32,
    y: f32,
) -> Option<(f32, Point)> {
    if p1.y == p2.y {
        return None;
    }
    let t = (y - p1.y) / (p2.y - p1.y);
    let x = p1.x + t * (p2.x - p1.x);
    (is_monotonous(0.0, t, 1.0) && is_monotonous(x1, x, x2)).then_some((t, Point::new(x, y)))
}

fn vertical_edge_intersection(
    p1: Point,
    p2: Point,
    x: f32,
    y1: f32,
    y2: f32,
) -> Option<(f32, Point)> {
    if p1.x == p2.x {
        return None;
    }
    let t = (x - p1.x) / (p2.x - p1.x);
    let y = p1.y + t * (p2.y - p1.y);
    (is_monotonous(0.0, t, 1.0) && is_monotonous(y1, y, y2)).then_some((t, Point::new(x, y)))
}

/// Rendered points of an arrow, stopped at the boundary of its target.
///
/// Paths that never enter `to_rect` (including a drag that is not hovering
/// any marker) come back unchanged.
pub fn point_array_for_arrow<A: ArrowPath + ?Sized>(
    arrow: &A,
    to_rect: Option<&Rect>,
) -> Result<Vec<Point>> {
    let points = full_path(arrow.from_point(), arrow.mid_points(), arrow.to_point());
    trim_to_rect(points, to_rect)
}

/// Like [`point_array_for_arrow`], but a `straight` arrow ignores its
/// waypoints and runs directly between its endpoints.
pub fn point_array_for_line<A: ArrowPath + ?Sized>(
    arrow: &A,
    to_rect: Option<&Rect>,
    straight: bool,
) -> Result<Vec<Point>> {
    if !straight {
        return point_array_for_arrow(arrow, to_rect);
    }
    trim_to_rect(vec![arrow.from_point(), arrow.to_point()], to_rect)
}

fn trim_to_rect(mut points: Vec<Point>, to_rect: Option<&Rect>) -> Result<Vec<Point>> {
    let Some(rect) = to_rect else {
        return Ok(points);
    };
    if !points.iter().any(|p| is_point_in_rect(*p, rect)) {
        return Ok(points);
    }

    let last_index = (1..points.len())
        .rev()
        .find(|&i| line_rect_intersection(points[i - 1], points[i], rect).is_some())
        .ok_or(GeometryError::NoIntersection)?;

    // Walk back from the inner end so the first crossing is the boundary
    // nearest to the tip.
    let intersection = line_rect_intersection(points[last_index], points[last_index - 1], rect)
        .ok_or(GeometryError::NoIntersection)?;
    points.truncate(last_index);
    points.push(intersection);
    Ok(points)
}

/// Heading of the arrowhead in radians, or `None` when the arrow is too
/// short to carry one.
pub fn arrow_angle_for_points(points: &[Point]) -> Option<f32> {
    let (first, last) = (*points.first()?, *points.last()?);
    if distance_between_points(first, last) < MIN_ARROWHEAD_LENGTH {
        return None;
    }
    let previous = points
        .iter()
        .rev()
        .find(|p| distance_between_points(**p, last) > HEADING_EPSILON)?;
    Some((last.y - previous.y).atan2(last.x - previous.x))
}

/// Point on `polyline` closest to `p`.
pub fn point_on_polyline_near_point(p: Point, polyline: &[Point]) -> Result<Point> {
    if polyline.len() < 2 {
        return Err(GeometryError::DegeneratePolyline {
            len: polyline.len(),
        });
    }

    let mut best = polyline[0];
    let mut best_distance = f32::INFINITY;
    for segment in polyline.windows(2) {
        let candidate = point_on_segment_near_point(segment[0], segment[1], p);
        let d = euclidean_distance(p, candidate);
        if d < best_distance {
            best_distance = d;
            best = candidate;
        }
    }
    Ok(best)
}

fn point_on_segment_near_point(a: Point, b: Point, p: Point) -> Point {
    let length = euclidean_distance(a, b);
    if length <= f32::EPSILON {
        return a;
    }
    let nx = (b.x - a.x) / length;
    let ny = (b.y - a.y) / length;
    let t = (p.x - a.x) * nx + (p.y - a.y) * ny;
    if t <= 0.0 {
        a
    } else if t >= length {
        b
    } else {
        Point::new(a.x + t * nx, a.y + t * ny)
    }
}

/// Euclidean distance from `p` to the nearest point of `polyline`; used
/// for hit testing arrows.
pub fn distance_to_polyline(p: Point, polyline: &[Point]) -> Option<f32> {
    point_on_polyline_near_point(p, polyline)
        .ok()
        .map(|q| euclidean_distance(p, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Arrow, UnfinishedArrow};
    use std::collections::BTreeSet;

    const EPS: f32 = 1e-4;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    fn square(left: f32, top: f32, size: f32) -> Rect {
        Rect::from_ltwh(left, top, size, size)
    }

    fn arrow(from: Point, mid: Vec<Point>, to: Point) -> Arrow {
        Arrow {
            id: 10,
            from_marker: 1,
            from_point: from,
            mid_points: mid,
            to_marker: 2,
            to_point: to,
            color: None,
            dependencies: BTreeSet::from([1, 2]),
        }
    }

    #[test]
    fn chebyshev_distance_uses_the_larger_axis() {
        assert_eq!(
            distance_between_points(Point::new(0.0, 0.0), Point::new(3.0, -7.0)),
            7.0
        );
        assert_eq!(
            euclidean_distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)),
            5.0
        );
    }

    #[test]
    fn monotonous_accepts_either_direction() {
        assert!(is_monotonous(0.0, 0.5, 1.0));
        assert!(is_monotonous(1.0, 0.5, 0.0));
        assert!(is_monotonous(1.0, 1.0, 1.0));
        assert!(!is_monotonous(0.0, 1.5, 1.0));
    }

    #[test]
    fn point_in_rect_includes_the_boundary() {
        let r = square(0.0, 0.0, 10.0);
        assert!(is_point_in_rect(Point::new(0.0, 10.0), &r));
        assert!(is_point_in_rect(Point::new(5.0, 5.0), &r));
        assert!(!is_point_in_rect(Point::new(10.1, 5.0), &r));
    }

    #[test]
    fn segment_missing_the_rect_has_no_intersection() {
        let r = square(0.0, 0.0, 10.0);
        assert_eq!(
            line_rect_intersection(Point::new(20.0, 0.0), Point::new(30.0, 30.0), &r),
            None
        );
        // Stops short of the left edge.
        assert_eq!(
            line_rect_intersection(Point::new(-20.0, 5.0), Point::new(-1.0, 5.0), &r),
            None
        );
        // Passes beside the rect.
        assert_eq!(
            line_rect_intersection(Point::new(-5.0, -5.0), Point::new(15.0, -1.0), &r),
            None
        );
    }

    #[test]
    fn single_edge_crossing_lands_on_that_edge() {
        let r = Rect::from_ltwh(100.0, 0.0, 10.0, 10.0);
        let p = line_rect_intersection(Point::new(5.0, 5.0), Point::new(105.0, 5.0), &r).unwrap();
        assert_close(p, Point::new(100.0, 5.0));

        let p = line_rect_intersection(Point::new(104.0, -30.0), Point::new(104.0, 5.0), &r)
            .unwrap();
        assert_close(p, Point::new(104.0, 0.0));
    }

    #[test]
    fn nearest_crossing_to_the_start_wins() {
        let r = square(0.0, 0.0, 10.0);
        let p = line_rect_intersection(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), &r).unwrap();
        assert_close(p, Point::new(0.0, 5.0));
        let p = line_rect_intersection(Point::new(15.0, 5.0), Point::new(-5.0, 5.0), &r).unwrap();
        assert_close(p, Point::new(10.0, 5.0));
    }

    #[test]
    fn corner_crossing_prefers_the_horizontal_edge() {
        let r = square(0.0, 0.0, 10.0);
        let a = Point::new(-10.0, -10.0);
        let b = Point::new(5.0, 5.0);
        let first = line_rect_intersection(a, b, &r).unwrap();
        assert_close(first, Point::new(0.0, 0.0));
        assert_eq!(line_rect_intersection(a, b, &r), Some(first));
    }

    #[test]
    fn arrow_between_markers_stops_at_the_target_edge() {
        let m1 = square(0.0, 0.0, 10.0);
        let m2 = Rect::from_ltwh(100.0, 0.0, 10.0, 10.0);
        let a = arrow(m1.center(), vec![], m2.center());
        let points = point_array_for_arrow(&a, Some(&m2)).unwrap();
        assert_eq!(points.len(), 2);
        assert_close(points[0], Point::new(5.0, 5.0));
        assert_close(*points.last().unwrap(), Point::new(100.0, 5.0));
    }

    #[test]
    fn path_outside_the_target_is_untouched() {
        let target = Rect::from_ltwh(100.0, 100.0, 10.0, 10.0);
        let a = arrow(
            Point::new(0.0, 0.0),
            vec![Point::new(20.0, 20.0)],
            Point::new(50.0, 50.0),
        );
        let points = point_array_for_arrow(&a, Some(&target)).unwrap();
        assert_eq!(points, a.polyline());
        assert_eq!(point_array_for_arrow(&a, None).unwrap(), a.polyline());
    }

    #[test]
    fn freehand_tail_inside_the_target_is_cut_at_the_last_entry() {
        let target = Rect::from_ltwh(100.0, 0.0, 20.0, 20.0);
        let a = arrow(
            Point::new(0.0, 10.0),
            vec![
                Point::new(50.0, 10.0),
                Point::new(90.0, 10.0),
                Point::new(105.0, 10.0),
                Point::new(110.0, 12.0),
            ],
            Point::new(112.0, 15.0),
        );
        let points = point_array_for_arrow(&a, Some(&target)).unwrap();
        assert!(points.len() <= a.polyline().len());
        assert_eq!(points.len(), 4);
        assert_close(points[2], Point::new(90.0, 10.0));
        assert_close(points[3], Point::new(100.0, 10.0));
    }

    #[test]
    fn path_that_leaves_and_reenters_keeps_the_outer_loop() {
        let target = Rect::from_ltwh(100.0, 0.0, 20.0, 20.0);
        let a = arrow(
            Point::new(0.0, 10.0),
            vec![
                Point::new(110.0, 10.0),
                Point::new(110.0, 50.0),
                Point::new(115.0, 50.0),
            ],
            Point::new(115.0, 15.0),
        );
        let points = point_array_for_arrow(&a, Some(&target)).unwrap();
        assert_eq!(points.len(), 5);
        assert_close(points[3], Point::new(115.0, 50.0));
        assert_close(points[4], Point::new(115.0, 20.0));
    }

    #[test]
    fn target_containing_every_point_is_a_contract_violation() {
        let target = square(0.0, 0.0, 100.0);
        let a = arrow(Point::new(10.0, 10.0), vec![], Point::new(50.0, 50.0));
        assert_eq!(
            point_array_for_arrow(&a, Some(&target)),
            Err(GeometryError::NoIntersection)
        );
    }

    #[test]
    fn straight_line_ignores_waypoints() {
        let target = Rect::from_ltwh(100.0, 0.0, 10.0, 10.0);
        let a = arrow(
            Point::new(5.0, 5.0),
            vec![Point::new(50.0, 80.0)],
            Point::new(105.0, 5.0),
        );
        let points = point_array_for_line(&a, Some(&target), true).unwrap();
        assert_eq!(points.len(), 2);
        assert_close(points[1], Point::new(100.0, 5.0));
        let bent = point_array_for_line(&a, Some(&target), false).unwrap();
        assert_eq!(bent.len(), 3);
    }

    #[test]
    fn unfinished_arrows_route_like_committed_ones() {
        let drag = UnfinishedArrow {
            from_marker: 1,
            from_point: Point::new(5.0, 5.0),
            mid_points: vec![],
            to_marker: None,
            to_point: Point::new(105.0, 5.0),
            dependencies: BTreeSet::from([1]),
        };
        let points = point_array_for_arrow(&drag, None).unwrap();
        assert_eq!(points, vec![drag.from_point, drag.to_point]);
    }

    #[test]
    fn short_arrows_have_no_head() {
        let points = [Point::new(0.0, 0.0), Point::new(39.0, 39.0)];
        assert_eq!(arrow_angle_for_points(&points), None);
        assert_eq!(arrow_angle_for_points(&[]), None);
    }

    #[test]
    fn long_arrows_get_a_finite_heading() {
        let angle = arrow_angle_for_points(&[Point::new(0.0, 0.0), Point::new(40.0, 0.0)]).unwrap();
        assert!(angle.is_finite());
        assert!(angle.abs() < EPS);

        let down = arrow_angle_for_points(&[Point::new(0.0, 0.0), Point::new(0.0, 100.0)]).unwrap();
        assert!((down - std::f32::consts::FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn heading_skips_jitter_at_the_tip() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(101.0, 1.0),
        ];
        let angle = arrow_angle_for_points(&points).unwrap();
        let expected = (1.0f32).atan2(51.0);
        assert!((angle - expected).abs() < EPS);
    }

    #[test]
    fn projection_onto_a_single_segment() {
        let line = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_close(
            point_on_polyline_near_point(Point::new(5.0, 5.0), &line).unwrap(),
            Point::new(5.0, 0.0),
        );
        assert_close(
            point_on_polyline_near_point(Point::new(-5.0, 0.0), &line).unwrap(),
            Point::new(0.0, 0.0),
        );
        assert_close(
            point_on_polyline_near_point(Point::new(25.0, -3.0), &line).unwrap(),
            Point::new(10.0, 0.0),
        );
    }

    #[test]
    fn projection_picks_the_nearest_segment() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert_close(
            point_on_polyline_near_point(Point::new(12.0, 6.0), &line).unwrap(),
            Point::new(10.0, 6.0),
        );
    }

    #[test]
    fn projection_handles_repeated_points() {
        let line = [
            Point::new(3.0, 3.0),
            Point::new(3.0, 3.0),
            Point::new(3.0, 13.0),
        ];
        assert_close(
            point_on_polyline_near_point(Point::new(0.0, 8.0), &line).unwrap(),
            Point::new(3.0, 8.0),
        );
    }

    #[test]
    fn projection_rejects_degenerate_polylines() {
        assert_eq!(
            point_on_polyline_near_point(Point::new(0.0, 0.0), &[]),
            Err(GeometryError::DegeneratePolyline { len: 0 })
        );
        assert_eq!(
            point_on_polyline_near_point(Point::new(0.0, 0.0), &[Point::new(1.0, 1.0)]),
            Err(GeometryError::DegeneratePolyline { len: 1 })
        );
        assert_eq!(distance_to_polyline(Point::new(0.0, 0.0), &[]), None);
    }
}
