use crate::{MoveOutcome, Result};

/// Length unit of GCode coordinates and feed rates.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Units {
    /// `G21`.
    #[default]
    Millimetres,
    /// `G20`.
    Inches,
}
impl Units {
    /// Millimetres per unit.
    pub fn to_mm(self) -> f64 {
        match self {
            Units::Millimetres => 1.0,
            Units::Inches => 25.4,
        }
    }
}

/// Interpretation of GCode coordinates.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Positioning {
    /// `G90`: coordinates are positions.
    #[default]
    Absolute,
    /// `G91`: coordinates are offsets from the current position.
    Relative,
}

/// A motion request, in millimetres and mm/s.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MotionCommand {
    RapidMove {
        x: f64,
        y: f64,
    },
    LinearMove {
        x: f64,
        y: f64,
        speed: f64,
    },
    ArcMove {
        end_x: f64,
        end_y: f64,
        center_x: f64,
        center_y: f64,
        speed: f64,
        clockwise: bool,
    },
    LaserOn,
    LaserOff,
    SetUnits(Units),
    SetPositioning(Positioning),
}

/// Something that carries out [MotionCommand]s.
pub trait MotionSink {
    /// Executes `command`, blocking until it has finished or stopped.
    fn execute(&mut self, command: &MotionCommand) -> Result<MoveOutcome>;
}
