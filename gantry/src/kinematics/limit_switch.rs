use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

use crate::{Axis, Direction, Result};

/// One of the four end-of-travel switches.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum LimitSwitch {
    XMin,
    XMax,
    YMin,
    YMax,
}
impl LimitSwitch {
    /// All switches, in registration order.
    pub const ALL: [LimitSwitch; 4] = [
        LimitSwitch::XMin,
        LimitSwitch::XMax,
        LimitSwitch::YMin,
        LimitSwitch::YMax,
    ];

    /// Axis guarded by this switch.
    pub fn axis(self) -> Axis {
        match self {
            LimitSwitch::XMin | LimitSwitch::XMax => Axis::X,
            LimitSwitch::YMin | LimitSwitch::YMax => Axis::Y,
        }
    }

    /// Direction which moves the carriage off this switch.
    pub fn away(self) -> Direction {
        match self {
            LimitSwitch::XMin | LimitSwitch::YMin => Direction::Forward,
            LimitSwitch::XMax | LimitSwitch::YMax => Direction::Reverse,
        }
    }
}

/// Signal edge that fires a limit-switch interrupt.
#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Rising,
    /// Switches are wired active-low with a pull-up.
    #[default]
    Falling,
    Either,
}

/// State of a limit switch.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LimitSwitchState {
    /// Limit switch is engaged at the limit.
    ///
    /// This means that the device has reached the limit and should not
    /// proceed any further in whichever direction triggered the limit
    /// to be reached.
    AtLimit,
    /// Limit switch is not at the limit.
    ///
    /// This means that the device can still safely proceed in the
    /// direction of this limit switch.
    NotAtLimit,
}

/// A limit-switch interrupt, as reported by a [LimitSource].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LimitEvent {
    /// Switch which fired.
    pub switch: LimitSwitch,
    /// Pin level seen when the interrupt fired.
    pub level: PinState,
}

/// Callback invoked from interrupt context when a switch fires.
pub type LimitCallback = Box<dyn FnMut(LimitEvent) + Send + 'static>;

/// Source of limit-switch interrupts.
///
/// Callbacks may be invoked on another thread, at any time, including in the
/// middle of a step pulse. They must only record the event.
pub trait LimitSource {
    /// Registers `callback` to run whenever `switch` sees `edge`.
    fn configure_limit_interrupt(
        &mut self,
        switch: LimitSwitch,
        edge: Edge,
        callback: LimitCallback,
    ) -> Result<()>;

    /// Reads the current state of `switch`.
    fn read_limitswitch_state(&self, switch: LimitSwitch) -> LimitSwitchState;
}
