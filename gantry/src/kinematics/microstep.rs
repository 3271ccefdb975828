use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Microstep resolution of an A4988-style driver.
///
/// Each resolution corresponds to a fixed level pattern on the three
/// microstep select lines `(MS1, MS2, MS3)`.
#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum MicrostepResolution {
    /// Full step. Pattern `(0, 0, 0)`.
    #[default]
    Full,
    /// 1/2 step. Pattern `(1, 0, 0)`.
    Half,
    /// 1/4 step. Pattern `(0, 1, 0)`.
    Quarter,
    /// 1/8 step. Pattern `(1, 1, 0)`.
    Eighth,
    /// 1/16 step. Pattern `(1, 1, 1)`.
    Sixteenth,
}
impl MicrostepResolution {
    /// Number of microsteps per full step.
    pub fn divisor(self) -> u8 {
        use MicrostepResolution::*;
        match self {
            Full => 1,
            Half => 2,
            Quarter => 4,
            Eighth => 8,
            Sixteenth => 16,
        }
    }

    /// Levels to write on `(MS1, MS2, MS3)`.
    pub fn pattern(self) -> [PinState; 3] {
        use MicrostepResolution::*;
        use PinState::{High as H, Low as L};
        match self {
            Full => [L, L, L],
            Half => [H, L, L],
            Quarter => [L, H, L],
            Eighth => [H, H, L],
            Sixteenth => [H, H, H],
        }
    }
}

impl TryFrom<u8> for MicrostepResolution {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use MicrostepResolution::*;
        match value {
            1 => Ok(Full),
            2 => Ok(Half),
            4 => Ok(Quarter),
            8 => Ok(Eighth),
            16 => Ok(Sixteenth),
            other => Err(Error::UnknownMicrostep(other)),
        }
    }
}

impl From<MicrostepResolution> for u8 {
    fn from(value: MicrostepResolution) -> Self {
        value.divisor()
    }
}
