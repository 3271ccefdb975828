use core::time::Duration;

use crate::{Direction, MicrostepResolution, Result, StepperDriver};

/// Motion state of a single motor.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AxisState {
    /// No move in progress.
    Idle,
    /// Emitting the pulses of a move.
    Stepping,
    /// The last move was stopped by a limit switch before completion.
    Interrupted,
}

/// A single physical stepper motor.
///
/// `StepperAxis` remembers the direction and microstep resolution it has
/// written, so that redundant writes (and their settling delays) are
/// skipped. It has no notion of position; see
/// [crate::MotionController].
///
/// # Type Parameters
///
/// - `S`: the underlying [StepperDriver].
pub struct StepperAxis<S> {
    driver: S,
    direction: Direction,
    microstep: MicrostepResolution,
    state: AxisState,
}
impl<S: StepperDriver> StepperAxis<S> {
    /// Creates a new `StepperAxis`.
    ///
    /// The direction and microstep lines are written unconditionally so that
    /// the state remembered here is really what is set on the pins.
    ///
    /// # Parameters
    ///
    /// - `driver`: Driver for the motor.
    /// - `microstep`: Initial microstep resolution.
    pub fn new(driver: S, microstep: MicrostepResolution) -> Result<Self> {
        let mut axis = Self {
            driver,
            direction: Direction::Forward,
            microstep,
            state: AxisState::Idle,
        };
        axis.force_set_direction(Direction::Forward)?;
        axis.force_set_microstep(microstep)?;
        Ok(axis)
    }

    /// Sets the direction, but only if it needs changing.
    pub fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if direction != self.direction {
            self.force_set_direction(direction)?;
        }
        Ok(())
    }

    /// Sets the microstep resolution, but only if it needs changing.
    pub fn set_microstep(&mut self, res: MicrostepResolution) -> Result<()> {
        if res != self.microstep {
            self.force_set_microstep(res)?;
        }
        Ok(())
    }

    /// Emits one step pulse, holding each level for `delay`.
    pub fn step_with_delay(&mut self, delay: Duration) -> Result<()> {
        self.driver.pulse(delay)
    }

    /// Returns the direction most recently written.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the microstep resolution most recently written.
    pub fn microstep(&self) -> MicrostepResolution {
        self.microstep
    }

    /// Returns the motion state.
    pub fn state(&self) -> AxisState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: AxisState) {
        self.state = state;
    }

    fn force_set_direction(&mut self, direction: Direction) -> Result<()> {
        self.driver.set_direction(direction.to_pin_state())?;
        self.direction = direction;
        Ok(())
    }

    fn force_set_microstep(&mut self, res: MicrostepResolution) -> Result<()> {
        self.driver.set_microstep(res.pattern())?;
        self.microstep = res;
        Ok(())
    }
}
