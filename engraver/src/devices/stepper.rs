use gantry::HalStepper;
use log::debug;
use rppal::gpio::{Gpio, OutputPin};
use rppal::hal::Delay;

use super::{output_pin, DeviceError};
use crate::params::MotorPins;

/// A4988 driver wired to Raspberry Pi GPIO lines.
pub type PiStepper = HalStepper<OutputPin, Delay>;

/// Claims the lines of one driver.
///
/// # Parameters
///
/// - `gpio`: GPIO peripheral.
/// - `pins`: BCM numbers of the driver's lines.
pub fn open_stepper(
    gpio: &Gpio,
    pins: &MotorPins,
) -> Result<PiStepper, DeviceError> {
    let stepper = HalStepper::new(
        output_pin(gpio, pins.step)?,
        output_pin(gpio, pins.direction)?,
        [
            output_pin(gpio, pins.ms1)?,
            output_pin(gpio, pins.ms2)?,
            output_pin(gpio, pins.ms3)?,
        ],
        Delay::new(),
    )?;
    debug!(
        "Stepper on BCM step {} dir {} (MS {}, {}, {})",
        pins.step, pins.direction, pins.ms1, pins.ms2, pins.ms3
    );
    Ok(stepper)
}
