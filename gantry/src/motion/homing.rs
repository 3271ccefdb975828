use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::{
    Axis, Direction, Error, LimitSwitch, MotionController, MoveOutcome,
    Result, StepperDriver,
};

impl<S: StepperDriver, L: OutputPin> MotionController<S, L> {
    /// Runs the homing procedure.
    ///
    /// Homing does the following:
    ///
    /// 1. Seeks along -X, for at most `homing.max_travel_mm`, until the
    ///    `XMin` switch interrupts the move. The usual backoff then releases
    ///    the switch.
    /// 2. Does the same along -Y with the `YMin` switch.
    /// 3. Sets the resulting position as home.
    ///
    /// # Returns
    ///
    /// - `Err(Error::HomingFailed(axis))` if a seek ends without its switch
    ///   firing.
    pub fn find_home(&mut self) -> Result<()> {
        let travel = self.config().homing.max_travel_mm;
        let speed = self.config().homing.seek_speed;
        info!("Homing at {} mm/s", speed);

        let seeks = [
            (Axis::X, LimitSwitch::XMin),
            (Axis::Y, LimitSwitch::YMin),
        ];
        for (axis, switch) in seeks {
            let outcome =
                self.move_linear_axis(axis, travel, speed, Direction::Reverse)?;
            if outcome != MoveOutcome::Interrupted(Some(switch)) {
                error!(
                    "Homing {:?} ended with {:?}, expected {:?}",
                    axis,
                    outcome,
                    switch
                );
                return Err(Error::HomingFailed(axis));
            }
            info!("{:?} axis found {:?}", axis, switch);
        }

        self.set_home();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::laser::tests::TestLaser;
    use crate::{
        Edge, MotionConfig, Position, TestLimitSwitches, TestStepper,
    };

    fn controller(
        x: &TestStepper,
        y: &TestStepper,
        switches: &mut TestLimitSwitches,
    ) -> MotionController<TestStepper, TestLaser> {
        let controller = MotionController::new(
            x.clone(),
            y.clone(),
            TestLaser::new(),
            MotionConfig::default(),
        )
        .unwrap();
        controller
            .attach_limit_switches(switches, Edge::Falling)
            .unwrap();
        controller
    }

    #[test]
    fn test_find_home() {
        let x = TestStepper::new();
        let y = TestStepper::new();
        let mut switches = TestLimitSwitches::new();
        let mut c = controller(&x, &y, &mut switches);
        c.move_to(120.0, 150.0, 50.0).unwrap();

        // The X motor turned for both axes and sits at 1350 steps. Both
        // switches are placed 100 mm below the current position.
        let s = switches.clone();
        x.trip_at(x.get_position() - 500, move || {
            s.trigger(LimitSwitch::XMin);
        });
        let s = switches.clone();
        y.trip_at(y.get_position() - 500, move || {
            s.trigger(LimitSwitch::YMin);
        });

        c.find_home().unwrap();
        assert_eq!(Position::new(0.0, 0.0), c.position());
        assert!(x.pulses() > 0);
    }

    #[test]
    fn test_find_home_fails_without_switch() {
        let x = TestStepper::new();
        let y = TestStepper::new();
        let mut switches = TestLimitSwitches::new();
        let mut c = controller(&x, &y, &mut switches);

        assert_eq!(Err(Error::HomingFailed(Axis::X)), c.find_home());
        // The whole travel was used up looking for the switch.
        assert_eq!(-3500, x.get_position());
    }

    #[test]
    fn test_find_home_fails_on_wrong_switch() {
        let x = TestStepper::new();
        let y = TestStepper::new();
        let mut switches = TestLimitSwitches::new();
        let mut c = controller(&x, &y, &mut switches);

        let s = switches.clone();
        x.trip_at(-10, move || {
            s.trigger(LimitSwitch::XMin);
        });
        let s = switches.clone();
        y.trip_at(-10, move || {
            s.trigger(LimitSwitch::YMax);
        });

        assert_eq!(Err(Error::HomingFailed(Axis::Y)), c.find_home());
    }
}
