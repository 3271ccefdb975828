use embedded_hal::digital::OutputPin;
use log::info;

use crate::kinematics::hardware;
use crate::Result;

/// Laser module behind a single enable line.
///
/// The enable line is active high. The last written state is remembered so
/// that it can be restored after a rapid move.
pub struct Laser<P> {
    pin: P,
    on: bool,
}
impl<P: OutputPin> Laser<P> {
    /// Creates a new `Laser`, switching it off.
    pub fn new(mut pin: P) -> Result<Self> {
        pin.set_low().map_err(hardware)?;
        Ok(Self { pin, on: false })
    }

    /// Returns true if the laser is enabled.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Enables or disables the laser.
    pub fn set(&mut self, on: bool) -> Result<()> {
        if on {
            self.pin.set_high().map_err(hardware)?;
        } else {
            self.pin.set_low().map_err(hardware)?;
        }
        if on != self.on {
            info!("Laser {}", if on { "on" } else { "off" });
        }
        self.on = on;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct State {
        high: bool,
        /// Every level written, `true` for high.
        history: Vec<bool>,
    }

    /// Laser enable line for testing purposes.
    ///
    /// Clones share the same state.
    #[derive(Clone, Default)]
    pub struct TestLaser {
        state: Arc<Mutex<State>>,
    }
    impl TestLaser {
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns true if the line is currently high.
        pub fn is_high(&self) -> bool {
            self.state.lock().unwrap().high
        }

        /// Returns every level written so far.
        pub fn history(&self) -> Vec<bool> {
            self.state.lock().unwrap().history.clone()
        }

        fn write(&self, high: bool) {
            let mut state = self.state.lock().unwrap();
            state.high = high;
            state.history.push(high);
        }
    }
    impl embedded_hal::digital::ErrorType for TestLaser {
        type Error = Infallible;
    }
    impl OutputPin for TestLaser {
        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            self.write(false);
            Ok(())
        }
        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            self.write(true);
            Ok(())
        }
    }

    #[test]
    fn test_laser_starts_off() {
        let pin = TestLaser::new();
        let laser = Laser::new(pin.clone()).unwrap();
        assert!(!laser.is_on());
        assert_eq!(vec![false], pin.history());
    }

    #[test]
    fn test_laser_switching() {
        let pin = TestLaser::new();
        let mut laser = Laser::new(pin.clone()).unwrap();
        laser.set(true).unwrap();
        assert!(laser.is_on());
        assert!(pin.is_high());
        laser.set(false).unwrap();
        assert!(!pin.is_high());
    }
}
