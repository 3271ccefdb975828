use std::collections::HashMap;

use embedded_hal::digital::PinState;
use gantry::{
    Edge, LimitCallback, LimitEvent, LimitSource, LimitSwitch,
    LimitSwitchState,
};
use log::debug;
use rppal::gpio::{Event, Gpio, InputPin, Level, Trigger};

use super::{input_pin, DeviceError};
use crate::params::LimitPins;

/// Limit switches on Raspberry Pi GPIO lines.
///
/// Interrupts are delivered on rppal's interrupt thread. The pins must stay
/// alive for as long as interrupts are wanted; dropping this struct
/// disables them.
pub struct PiLimitSwitches {
    pins: HashMap<LimitSwitch, InputPin>,
    /// Level read while a switch is engaged.
    active: Level,
}
impl PiLimitSwitches {
    /// Claims the four limit switch lines, with pull-ups.
    ///
    /// # Parameters
    ///
    /// - `gpio`: GPIO peripheral.
    /// - `pins`: BCM numbers of the switches. Switches wired for a rising
    ///   edge read high when engaged, all others read low.
    pub fn open(gpio: &Gpio, pins: &LimitPins) -> Result<Self, DeviceError> {
        let mut lines = HashMap::new();
        for (switch, pin) in [
            (LimitSwitch::XMin, pins.x_min),
            (LimitSwitch::XMax, pins.x_max),
            (LimitSwitch::YMin, pins.y_min),
            (LimitSwitch::YMax, pins.y_max),
        ] {
            lines.insert(switch, input_pin(gpio, pin)?);
            debug!("Limit switch {:?} on BCM {}", switch, pin);
        }
        let active = match pins.edge {
            Edge::Rising => Level::High,
            Edge::Falling | Edge::Either => Level::Low,
        };
        Ok(Self {
            pins: lines,
            active,
        })
    }
}

impl LimitSource for PiLimitSwitches {
    fn configure_limit_interrupt(
        &mut self,
        switch: LimitSwitch,
        edge: Edge,
        mut callback: LimitCallback,
    ) -> gantry::Result<()> {
        let pin = self.pins.get_mut(&switch).ok_or_else(|| {
            gantry::Error::Hardware(format!("{:?} is not wired", switch))
        })?;
        pin.set_async_interrupt(trigger(edge), None, move |event: Event| {
            callback(LimitEvent {
                switch,
                level: level(event.trigger),
            })
        })
        .map_err(|e| gantry::Error::Hardware(e.to_string()))
    }

    fn read_limitswitch_state(&self, switch: LimitSwitch) -> LimitSwitchState {
        match self.pins.get(&switch) {
            Some(pin) if pin.read() == self.active => {
                LimitSwitchState::AtLimit
            }
            _ => LimitSwitchState::NotAtLimit,
        }
    }
}

fn trigger(edge: Edge) -> Trigger {
    match edge {
        Edge::Rising => Trigger::RisingEdge,
        Edge::Falling => Trigger::FallingEdge,
        Edge::Either => Trigger::Both,
    }
}

/// Pin level right after an edge.
fn level(trigger: Trigger) -> PinState {
    match trigger {
        Trigger::RisingEdge => PinState::High,
        _ => PinState::Low,
    }
}
