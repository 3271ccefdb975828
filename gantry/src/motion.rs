mod arc;
mod controller;
mod homing;
pub(crate) mod laser;
mod position;

pub use controller::MotionController;
pub use controller::MoveOutcome;
pub use laser::Laser;
pub use position::Position;

#[cfg(test)]
pub use laser::tests::TestLaser;
