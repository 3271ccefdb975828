use embedded_hal::digital::PinState;

/// Describes the direction for an axis movement.
///
/// This is the single place where geometric intent is tied to the direction
/// line of the stepper drivers. For the coupled Y axis, both motors receive
/// the same level.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Direction {
    /// The coordinate increases. Associated with a "high" direction signal.
    Forward,
    /// The coordinate decreases. Associated with a "low" direction signal.
    Reverse,
}
impl Direction {
    /// Returns the direction which moves from `from` towards `to`.
    ///
    /// Equal values give [Direction::Forward].
    pub fn towards(from: f64, to: f64) -> Self {
        if to < from {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Returns the opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Converts a `Direction` to the level of the direction pin.
    pub fn to_pin_state(self) -> PinState {
        match self {
            Direction::Forward => PinState::High,
            Direction::Reverse => PinState::Low,
        }
    }

    /// Sign of a single step in this direction.
    pub fn signum(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}
