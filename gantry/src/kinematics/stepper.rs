use core::time::Duration;

use embedded_hal::digital::PinState;

use crate::Result;

/// Driver for a single stepper motor.
///
/// This is the narrow hardware surface that the motion core needs from one
/// motor: a direction line, three microstep select lines and a step line.
/// Any backend (real pins, a simulation) that can do these three things is
/// interchangeable.
pub trait StepperDriver {
    /// Writes the direction line.
    ///
    /// The level must be settled before the next call to
    /// [StepperDriver::pulse] returns.
    fn set_direction(&mut self, level: PinState) -> Result<()>;

    /// Writes the three microstep select lines `(MS1, MS2, MS3)`.
    fn set_microstep(&mut self, pattern: [PinState; 3]) -> Result<()>;

    /// Emits a single step pulse.
    ///
    /// The step line is raised, held for `delay`, lowered, and held low for
    /// `delay` again. This blocks for the whole duration.
    fn pulse(&mut self, delay: Duration) -> Result<()>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Lines of a test stepper.
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub enum StepperPin {
        Step,
        Direction,
        Ms1,
        Ms2,
        Ms3,
    }

    type Trip = (i128, Box<dyn FnOnce() + Send>);

    struct State {
        position: i128,
        pins: HashMap<StepperPin, PinState>,
        pulses: u64,
        pin_writes: u64,
        last_delay: Option<Duration>,
        trips: Vec<Trip>,
    }

    /// Stepper to use for testing purposes.
    ///
    /// This records the last level written to each of its lines, counts
    /// pulses, and keeps a signed motor position (`i128`, far larger than
    /// any real travel). It never sleeps.
    ///
    /// If the `TestStepper` is cloned then the underlying state is shared.
    /// This is useful for coupling simulated devices (eg. limit switches) to
    /// the motor through [TestStepper::trip_at].
    #[derive(Clone)]
    pub struct TestStepper {
        state: Arc<Mutex<State>>,
    }
    impl TestStepper {
        /// Creates a new test stepper.
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(State {
                    position: 0,
                    pins: HashMap::new(),
                    pulses: 0,
                    pin_writes: 0,
                    last_delay: None,
                    trips: Vec::new(),
                })),
            }
        }

        /// Returns the motor position in steps.
        pub fn get_position(&self) -> i128 {
            self.state.lock().unwrap().position
        }

        /// Returns the total number of pulses emitted.
        pub fn pulses(&self) -> u64 {
            self.state.lock().unwrap().pulses
        }

        /// Returns the number of writes to the direction and microstep
        /// lines.
        pub fn pin_writes(&self) -> u64 {
            self.state.lock().unwrap().pin_writes
        }

        /// Returns the last level written to `pin`.
        pub fn read_pin(&self, pin: StepperPin) -> Option<PinState> {
            self.state.lock().unwrap().pins.get(&pin).copied()
        }

        /// Returns the hold time of the last pulse.
        pub fn last_delay(&self) -> Option<Duration> {
            self.state.lock().unwrap().last_delay
        }

        /// Calls `action` once, right after the pulse which brings the motor
        /// to `position`.
        ///
        /// The action runs on the stepping thread, in the middle of a move,
        /// which is how an interrupt appears to the stepping loop.
        pub fn trip_at<F>(&self, position: i128, action: F)
        where
            F: FnOnce() + Send + 'static,
        {
            self.state
                .lock()
                .unwrap()
                .trips
                .push((position, Box::new(action)));
        }

        fn write(&self, pin: StepperPin, level: PinState) {
            let mut state = self.state.lock().unwrap();
            state.pins.insert(pin, level);
            state.pin_writes += 1;
        }
    }
    impl StepperDriver for TestStepper {
        fn set_direction(&mut self, level: PinState) -> Result<()> {
            self.write(StepperPin::Direction, level);
            Ok(())
        }

        fn set_microstep(&mut self, pattern: [PinState; 3]) -> Result<()> {
            self.write(StepperPin::Ms1, pattern[0]);
            self.write(StepperPin::Ms2, pattern[1]);
            self.write(StepperPin::Ms3, pattern[2]);
            Ok(())
        }

        fn pulse(&mut self, delay: Duration) -> Result<()> {
            let fired = {
                let mut state = self.state.lock().unwrap();
                let sign = match state.pins.get(&StepperPin::Direction) {
                    Some(PinState::Low) => -1,
                    _ => 1,
                };
                state.pins.insert(StepperPin::Step, PinState::Low);
                state.position += sign;
                state.pulses += 1;
                state.last_delay = Some(delay);

                let position = state.position;
                let (fired, pending): (Vec<Trip>, Vec<Trip>) = state
                    .trips
                    .drain(..)
                    .partition(|(at, _)| *at == position);
                state.trips = pending;
                fired
            };
            for (_, action) in fired {
                action();
            }
            Ok(())
        }
    }

    #[test]
    fn test_pulse_follows_direction_line() {
        let mut stepper = TestStepper::new();
        stepper.set_direction(PinState::High).unwrap();
        for _ in 0..3 {
            stepper.pulse(Duration::from_millis(1)).unwrap();
        }
        stepper.set_direction(PinState::Low).unwrap();
        stepper.pulse(Duration::from_millis(2)).unwrap();

        assert_eq!(2, stepper.get_position());
        assert_eq!(4, stepper.pulses());
        assert_eq!(Some(Duration::from_millis(2)), stepper.last_delay());
        assert_eq!(Some(PinState::Low), stepper.read_pin(StepperPin::Step));
    }

    #[test]
    fn test_trip_fires_once() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let count = Arc::new(AtomicU32::new(0));
        let mut stepper = TestStepper::new();
        let c = count.clone();
        stepper.trip_at(2, move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        stepper.set_direction(PinState::High).unwrap();
        for _ in 0..2 {
            stepper.pulse(Duration::ZERO).unwrap();
        }
        stepper.set_direction(PinState::Low).unwrap();
        stepper.pulse(Duration::ZERO).unwrap();
        stepper.set_direction(PinState::High).unwrap();
        stepper.pulse(Duration::ZERO).unwrap();

        assert_eq!(1, count.load(Ordering::SeqCst));
    }
}
