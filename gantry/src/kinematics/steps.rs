use crate::Direction;

/// Underlying type representing the number of steps.
type StepRepr = i32;

/// Signed step count along one axis.
///
/// Positions are kept in whole steps so that the reported position is always
/// exactly the number of emitted pulses times the distance of one step.
/// `Steps` refuses to overflow, so a position can never wrap around.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
pub struct Steps(StepRepr);
impl Steps {
    /// Create a new number of steps.
    pub fn new(steps: StepRepr) -> Self {
        Self(steps)
    }

    /// Zero steps.
    pub fn zero() -> Self {
        Steps(0)
    }

    /// Returns the value represented by `Steps`.
    pub fn get_value(&self) -> StepRepr {
        self.0
    }

    /// Increment the value if it's safe to do so without an overflow.
    pub fn inc(&self) -> Option<Self> {
        self.0.checked_add(1).map(Steps)
    }

    /// Decrement the value if it's safe to do so without an overflow.
    pub fn dec(&self) -> Option<Self> {
        self.0.checked_sub(1).map(Steps)
    }

    /// Moves one step in `direction`, if that does not overflow.
    pub fn advance(&self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::Forward => self.inc(),
            Direction::Reverse => self.dec(),
        }
    }

    /// Converts the step count to millimetres.
    pub fn to_mm(&self, mm_per_step: f64) -> f64 {
        self.0 as f64 * mm_per_step
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::direction::test::direction;
    use proptest::prelude::*;

    #[test]
    fn test_zero() {
        assert_eq!(0, Steps::zero().get_value());
        assert_eq!(Steps::new(0), Steps::zero());
        assert_eq!(Steps::zero(), Steps::default());
    }

    #[test]
    fn test_steps_max_inc() {
        assert_eq!(None, Steps::new(StepRepr::MAX).inc());
        assert_eq!(None, Steps::new(StepRepr::MAX).advance(Direction::Forward));
    }

    #[test]
    fn test_steps_min_dec() {
        assert_eq!(None, Steps::new(StepRepr::MIN).dec());
        assert_eq!(None, Steps::new(StepRepr::MIN).advance(Direction::Reverse));
    }

    #[test]
    fn test_to_mm() {
        assert_eq!(100.0, Steps::new(500).to_mm(0.2));
        assert_eq!(-0.4, Steps::new(-2).to_mm(0.2));
    }

    proptest! {
        #[test]
        fn test_advance_and_back(
            value in ((StepRepr::MIN + 1)..(StepRepr::MAX - 1)),
            dir in direction()
        ) {
            let s = Steps::new(value);
            let moved = s.advance(dir).unwrap();
            assert_eq!(value as i64 + dir.signum() as i64, moved.get_value() as i64);
            assert_eq!(s, moved.advance(dir.opposite()).unwrap());
        }
    }
}
