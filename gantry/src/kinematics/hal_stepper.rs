use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::{Error, Result, StepperDriver};

/// Stepper motor driven through `embedded-hal` output pins.
///
/// This assumes an A4988-style driver board: a step line, a direction line
/// and three microstep select lines.
///
/// # Type Parameters
///
/// - `P`: pin type for the step, direction and microstep lines.
/// - `D`: delay provider.
pub struct HalStepper<P, D> {
    /// Pin to use for pulses.
    pin_step: P,
    /// Pin to use for direction indication.
    pin_direction: P,
    /// Microstep select pins `(MS1, MS2, MS3)`.
    pins_microstep: [P; 3],
    /// Blocking delay used to time pulses and direction changes.
    delay: D,
    /// Settling time after a direction change.
    delay_direction: Duration,
}

impl<P: OutputPin, D: DelayNs> HalStepper<P, D> {
    /// Settling time of the A4988 direction input.
    pub const DEFAULT_DIRECTION_SETTLE: Duration = Duration::from_micros(10);

    /// Creates a new `HalStepper`.
    ///
    /// The step line is driven low immediately so the first pulse starts
    /// from a known level.
    ///
    /// # Parameters
    ///
    /// - `pin_step`: Pin to use for step pulses.
    /// - `pin_direction`: Pin to use for direction signals.
    /// - `pins_microstep`: Pins `(MS1, MS2, MS3)`.
    /// - `delay`: Delay provider.
    pub fn new(
        mut pin_step: P,
        pin_direction: P,
        pins_microstep: [P; 3],
        delay: D,
    ) -> Result<Self> {
        pin_step.set_low().map_err(hardware)?;
        Ok(Self {
            pin_step,
            pin_direction,
            pins_microstep,
            delay,
            delay_direction: Self::DEFAULT_DIRECTION_SETTLE,
        })
    }

    /// Sleeps for `duration` with microsecond resolution.
    fn wait(&mut self, duration: Duration) {
        let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
        self.delay.delay_us(us);
    }
}

impl<P: OutputPin, D: DelayNs> StepperDriver for HalStepper<P, D> {
    fn set_direction(&mut self, level: PinState) -> Result<()> {
        let settle = self.delay_direction;
        self.wait(settle);
        self.pin_direction.set_state(level).map_err(hardware)?;
        self.wait(settle);
        Ok(())
    }

    fn set_microstep(&mut self, pattern: [PinState; 3]) -> Result<()> {
        for (pin, level) in self.pins_microstep.iter_mut().zip(pattern) {
            pin.set_state(level).map_err(hardware)?;
        }
        Ok(())
    }

    fn pulse(&mut self, delay: Duration) -> Result<()> {
        self.pin_step.set_high().map_err(hardware)?;
        self.wait(delay);
        self.pin_step.set_low().map_err(hardware)?;
        self.wait(delay);
        Ok(())
    }
}

/// Converts a pin error into an [Error::Hardware].
pub(crate) fn hardware<E: embedded_hal::digital::Error>(error: E) -> Error {
    Error::Hardware(format!("{:?}", error.kind()))
}
