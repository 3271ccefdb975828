//! Geometry of incremental arc tracing.
//!
//! An arc is traced as a sequence of short chords. At each waypoint the
//! local slope of the circle decides whether the next increment is taken
//! along X or along Y; the other coordinate is then solved from the circle
//! equation so the waypoint stays on the arc.

use crate::{Error, Position, Result};

/// Slope used in place of `|dy / dx|` when `dx` is zero.
const VERTICAL_SLOPE: f64 = 2.0;

/// Absolute part of the end radius tolerance, in millimetres.
const RADIUS_ATOL: f64 = 0.01;

/// Relative part of the end radius tolerance.
const RADIUS_RTOL: f64 = 0.01;

/// Waypoint coordinates this close below zero are taken as zero.
const ZERO_SNAP: f64 = 1e-9;

/// Checks that an arc can be traced, before any motion happens.
///
/// # Parameters
///
/// - `start`: Current position.
/// - `end`: Requested end point.
/// - `center`: Centre of the arc.
///
/// # Returns
///
/// - The radius of the arc, measured from `start`.
pub fn validate_arc(
    start: Position,
    end: Position,
    center: Position,
) -> Result<f64> {
    if !(end.x >= 0.0 && end.y >= 0.0) {
        return Err(Error::NegativeCoordinate { x: end.x, y: end.y });
    }

    let radius = center.distance_to(&start);
    if radius == 0.0 {
        return Err(Error::ZeroRadius);
    }

    let end_radius = center.distance_to(&end);
    if (radius - end_radius).abs() > RADIUS_ATOL + RADIUS_RTOL * end_radius {
        return Err(Error::RadiusMismatch {
            start: radius,
            end: end_radius,
        });
    }

    Ok(radius)
}

/// Computes the waypoint following `current` on the arc.
///
/// The quadrant of `current` around `center` selects one of four stepping
/// patterns. Within a pattern, a steep tangent (slope above 1) steps X and a
/// shallow one steps Y. Going counter-clockwise only flips the sign of the
/// increment.
///
/// # Parameters
///
/// - `current`: Current waypoint.
/// - `center`: Centre of the arc.
/// - `radius`: Radius of the arc.
/// - `step`: Increment along the stepped coordinate.
/// - `clockwise`: Direction of travel.
pub fn next_arc_point(
    current: Position,
    center: Position,
    radius: f64,
    step: f64,
    clockwise: bool,
) -> Position {
    let dx = current.x - center.x;
    let dy = current.y - center.y;
    let slope = if dx != 0.0 {
        (dy / dx).abs()
    } else {
        VERTICAL_SLOPE
    };
    let step = if clockwise { step } else { -step };
    let steep = slope > 1.0;

    // Signs of (x increment, solved y) when steep, and of
    // (y increment, solved x) when shallow.
    let (x_inc, y_side, y_inc, x_side) = if dx >= 0.0 && dy > 0.0 {
        (1.0, 1.0, -1.0, 1.0)
    } else if dx > 0.0 && dy <= 0.0 {
        (-1.0, -1.0, -1.0, 1.0)
    } else if dx <= 0.0 && dy < 0.0 {
        (-1.0, -1.0, 1.0, -1.0)
    } else {
        (1.0, 1.0, 1.0, -1.0)
    };

    let mut next = current;
    if steep {
        next.x += x_inc * step;
        let dx = next.x - center.x;
        next.y = center.y + y_side * safe_sqrt(radius * radius - dx * dx);
    } else {
        next.y += y_inc * step;
        let dy = next.y - center.y;
        next.x = center.x + x_side * safe_sqrt(radius * radius - dy * dy);
    }
    Position::new(snap_zero(next.x), snap_zero(next.y))
}

/// Returns the point of the circle through `center` with `radius` that is
/// closest to `end`.
///
/// The end point of an arc may sit slightly off the circle traced from the
/// start. Waypoints only ever land on that circle, so tracing stops near
/// this point and the last chord goes to the real end point.
pub fn project_onto_circle(
    end: Position,
    center: Position,
    radius: f64,
) -> Position {
    let distance = center.distance_to(&end);
    if distance == 0.0 {
        return end;
    }
    let scale = radius / distance;
    Position::new(
        snap_zero(center.x + (end.x - center.x) * scale),
        snap_zero(center.y + (end.y - center.y) * scale),
    )
}

/// Returns true while `point` is at least one `step` away from `end` on
/// either axis.
pub fn far_from(point: Position, end: Position, step: f64) -> bool {
    (point.x - end.x).abs() >= step || (point.y - end.y).abs() >= step
}

fn safe_sqrt(value: f64) -> f64 {
    value.max(0.0).sqrt()
}

fn snap_zero(value: f64) -> f64 {
    if value < 0.0 && value > -ZERO_SNAP {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_validate_ok() {
        let r = validate_arc(p(0.0, 100.0), p(100.0, 0.0), p(0.0, 0.0));
        assert_eq!(Ok(100.0), r);
    }

    #[test]
    fn test_validate_negative_end() {
        assert_eq!(
            Err(Error::NegativeCoordinate { x: -1.0, y: 0.0 }),
            validate_arc(p(1.0, 0.0), p(-1.0, 0.0), p(0.0, 0.0))
        );
    }

    #[test]
    fn test_validate_zero_radius() {
        assert_eq!(
            Err(Error::ZeroRadius),
            validate_arc(p(5.0, 5.0), p(5.0, 5.0), p(5.0, 5.0))
        );
    }

    #[test]
    fn test_validate_radius_tolerance() {
        // 1% of 100 plus 0.01 mm.
        assert!(validate_arc(p(0.0, 100.0), p(101.0, 0.0), p(0.0, 0.0)).is_ok());
        assert!(matches!(
            validate_arc(p(0.0, 100.0), p(102.0, 0.0), p(0.0, 0.0)),
            Err(Error::RadiusMismatch { .. })
        ));
    }

    #[test]
    fn test_project_onto_circle() {
        let c = p(200.0, 200.0);
        let outside = project_onto_circle(p(301.0, 200.0), c, 100.0);
        assert!(outside.distance_to(&p(300.0, 200.0)) < 1e-9);
        let inside = project_onto_circle(p(200.0, 99.5), c, 100.0);
        assert!(inside.distance_to(&p(200.0, 100.0)) < 1e-9);

        let diagonal = project_onto_circle(p(271.0, 271.0), c, 100.0);
        assert!((c.distance_to(&diagonal) - 100.0).abs() < 1e-9);
        assert!((diagonal.x - diagonal.y).abs() < 1e-9);

        // The centre has no direction to project along.
        assert_eq!(c, project_onto_circle(c, c, 0.005));
    }

    #[test]
    fn test_clockwise_from_top_steps_right() {
        let next =
            next_arc_point(p(0.0, 100.0), p(0.0, 0.0), 100.0, 0.8, true);
        assert_eq!(0.8, next.x);
        assert!(next.y < 100.0 && next.y > 99.99);
    }

    #[test]
    fn test_counterclockwise_from_right_steps_up() {
        let next =
            next_arc_point(p(100.0, 0.0), p(0.0, 0.0), 100.0, 0.8, false);
        assert_eq!(0.8, next.y);
        assert!(next.x < 100.0 && next.x > 99.99);
    }

    #[test]
    fn test_clockwise_quadrants() {
        let c = p(50.0, 50.0);
        // Right of centre, moving clockwise goes down.
        let n = next_arc_point(p(100.0, 50.0), c, 50.0, 0.8, true);
        assert!(n.y < 50.0);
        // Bottom, moving clockwise goes left.
        let n = next_arc_point(p(50.0, 0.0), c, 50.0, 0.8, true);
        assert!(n.x < 50.0);
        // Left, moving clockwise goes up.
        let n = next_arc_point(p(0.0, 50.0), c, 50.0, 0.8, true);
        assert!(n.y > 50.0);
    }

    proptest! {
        #[test]
        fn test_waypoints_stay_on_circle(
            angle in 0.0f64..360.0,
            radius in 5.0f64..200.0,
            clockwise in any::<bool>(),
        ) {
            let c = p(300.0, 300.0);
            let (sin, cos) = angle.to_radians().sin_cos();
            let start = p(c.x + radius * cos, c.y + radius * sin);
            let next = next_arc_point(start, c, radius, 0.8, clockwise);

            assert!((c.distance_to(&next) - radius).abs() < 1e-6);
            assert!(start.distance_to(&next) < 0.8 * 2.0 + 1e-6);
        }
    }
}
