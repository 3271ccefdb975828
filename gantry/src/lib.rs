//! Motion core of a two-axis belt-driven laser engraver.
//!
//! The crate is split into three layers:
//!
//! - [kinematics]: stepper drivers, step geometry and limit switches.
//! - [motion]: the [MotionController], which owns both motors and the laser
//!   and turns millimetre moves into step pulses.
//! - [gcode]: a line-oriented [GCodeInterpreter] which feeds a
//!   [MotionSink].

mod config;
mod error;
pub mod gcode;
pub mod kinematics;
pub mod motion;

pub use config::HomingConfig;
pub use config::MotionConfig;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use gcode::GCodeInterpreter;
pub use gcode::Instruction;
pub use gcode::InterpreterState;
pub use gcode::MotionCommand;
pub use gcode::MotionSink;
pub use gcode::Positioning;
pub use gcode::Units;
pub use kinematics::Axis;
pub use kinematics::AxisState;
pub use kinematics::Direction;
pub use kinematics::Edge;
pub use kinematics::HalStepper;
pub use kinematics::LimitCallback;
pub use kinematics::LimitEvent;
pub use kinematics::LimitHandle;
pub use kinematics::LimitSource;
pub use kinematics::LimitSwitch;
pub use kinematics::LimitSwitchState;
pub use kinematics::MicrostepResolution;
pub use kinematics::StepGeometry;
pub use kinematics::StepperAxis;
pub use kinematics::StepperDriver;
pub use kinematics::Steps;
pub use kinematics::EVENT_CAPACITY;
pub use motion::Laser;
pub use motion::MotionController;
pub use motion::MoveOutcome;
pub use motion::Position;

#[cfg(test)]
pub use kinematics::TestLimitSwitches;
#[cfg(test)]
pub use kinematics::TestStepper;
