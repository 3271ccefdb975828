mod limitswitch;
mod stepper;

use thiserror::Error;

use crate::params::LaserPins;

pub use limitswitch::PiLimitSwitches;
pub use stepper::{open_stepper, PiStepper};

/// Errors raised while claiming GPIO lines.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("GPIO error on BCM {pin}: {source}")]
    Gpio {
        pin: u8,
        source: rppal::gpio::Error,
    },

    #[error(transparent)]
    Motion(#[from] gantry::Error),
}

/// Claims BCM `pin` as an output.
fn output_pin(
    gpio: &rppal::gpio::Gpio,
    pin: u8,
) -> Result<rppal::gpio::OutputPin, DeviceError> {
    gpio.get(pin)
        .map(|p| p.into_output())
        .map_err(|source| DeviceError::Gpio { pin, source })
}

/// Claims BCM `pin` as an input with the pull-up enabled.
fn input_pin(
    gpio: &rppal::gpio::Gpio,
    pin: u8,
) -> Result<rppal::gpio::InputPin, DeviceError> {
    gpio.get(pin)
        .map(|p| p.into_input_pullup())
        .map_err(|source| DeviceError::Gpio { pin, source })
}

/// Claims the laser enable line.
///
/// The line is driven low as soon as it is claimed.
pub fn open_laser(
    gpio: &rppal::gpio::Gpio,
    pins: &LaserPins,
) -> Result<rppal::gpio::OutputPin, DeviceError> {
    let mut pin = output_pin(gpio, pins.enable)?;
    pin.set_low();
    Ok(pin)
}
