mod axis;
pub(crate) mod direction;
mod hal_stepper;
mod limit_latch;
pub(crate) mod limit_switch;
mod microstep;
mod step_geometry;
pub(crate) mod stepper;
mod stepper_axis;
mod steps;

pub use axis::Axis;
pub use direction::Direction;
pub(crate) use hal_stepper::hardware;
pub use hal_stepper::HalStepper;
pub(crate) use limit_latch::LimitLatch;
pub use limit_latch::LimitHandle;
pub use limit_latch::EVENT_CAPACITY;
pub use limit_switch::Edge;
pub use limit_switch::LimitCallback;
pub use limit_switch::LimitEvent;
pub use limit_switch::LimitSource;
pub use limit_switch::LimitSwitch;
pub use limit_switch::LimitSwitchState;
pub use microstep::MicrostepResolution;
pub(crate) use step_geometry::seconds;
pub use step_geometry::StepGeometry;
pub use stepper::StepperDriver;
pub use stepper_axis::AxisState;
pub use stepper_axis::StepperAxis;
pub use steps::Steps;

#[cfg(test)]
pub use limit_switch::tests::TestLimitSwitches;
#[cfg(test)]
pub use stepper::tests::TestStepper;
