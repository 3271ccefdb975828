use thiserror::Error;

use crate::Axis;

/// Errors raised by the motion core.
///
/// Configuration and geometry errors are always reported before the first
/// pulse of the move that caused them, except for
/// [Error::NegativeWaypoint] and [Error::ArcDidNotConverge], which can only
/// be detected while an arc is being traced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(
        "step delay {delay}s is outside the valid pulse range [{min}s, {max}s]"
    )]
    StepDelayOutOfRange { delay: f64, min: f64, max: f64 },

    #[error("speed must be positive and finite, found {0} mm/s")]
    InvalidSpeed(f64),

    #[error("unknown microstep resolution 1/{0}")]
    UnknownMicrostep(u8),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("negative coordinates are not allowed: ({x}, {y})")]
    NegativeCoordinate { x: f64, y: f64 },

    #[error("move distance must not be negative, found {0} mm")]
    NegativeDistance(f64),

    #[error("arc radius cannot be zero")]
    ZeroRadius,

    #[error(
        "end point must be the same radius from the centre as the start \
         point (start radius {start}, end radius {end})"
    )]
    RadiusMismatch { start: f64, end: f64 },

    #[error("arc would pass through negative coordinates at ({x}, {y})")]
    NegativeWaypoint { x: f64, y: f64 },

    #[error("arc did not reach its end point after {0} waypoints")]
    ArcDidNotConverge(usize),

    #[error("hardware error: {0}")]
    Hardware(String),

    #[error("homing failed: no limit switch found on the {0:?} axis")]
    HomingFailed(Axis),
}

/// Broad classification of an [Error].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Step delay, speed, or microstep settings are unusable.
    Configuration,
    /// A requested move or arc is geometrically invalid.
    Geometry,
    /// A pin could not be driven.
    Hardware,
    /// The homing procedure did not complete.
    Homing,
}

impl Error {
    /// Returns the [ErrorKind] of this error.
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            StepDelayOutOfRange { .. }
            | InvalidSpeed(_)
            | UnknownMicrostep(_)
            | InvalidConfig(_) => ErrorKind::Configuration,
            NegativeCoordinate { .. }
            | NegativeDistance(_)
            | ZeroRadius
            | RadiusMismatch { .. }
            | NegativeWaypoint { .. }
            | ArcDidNotConverge(_) => ErrorKind::Geometry,
            Hardware(_) => ErrorKind::Hardware,
            HomingFailed(_) => ErrorKind::Homing,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ErrorKind::Configuration, Error::InvalidSpeed(0.0).kind());
        assert_eq!(
            ErrorKind::Configuration,
            Error::UnknownMicrostep(3).kind()
        );
        assert_eq!(ErrorKind::Geometry, Error::ZeroRadius.kind());
        assert_eq!(
            ErrorKind::Geometry,
            Error::NegativeCoordinate { x: -1.0, y: 0.0 }.kind()
        );
        assert_eq!(ErrorKind::Hardware, Error::Hardware("x".into()).kind());
        assert_eq!(ErrorKind::Homing, Error::HomingFailed(Axis::Y).kind());
    }

    #[test]
    fn test_display() {
        let e = Error::StepDelayOutOfRange {
            delay: 0.2,
            min: 0.001,
            max: 0.1,
        };
        assert_eq!(
            "step delay 0.2s is outside the valid pulse range [0.001s, 0.1s]",
            e.to_string()
        );
    }
}
