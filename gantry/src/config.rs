use serde::{Deserialize, Serialize};

use crate::{MicrostepResolution, Result, StepGeometry};

/// Mechanical and motion settings of the gantry.
///
/// Every field has a default matching the engraver hardware (NEMA 17
/// motors, 20-tooth GT2 pulleys), so a TOML table only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Full steps per motor revolution.
    pub steps_per_revolution: u32,
    /// Teeth on the drive pulley.
    pub teeth_per_revolution: u32,
    /// Belt pitch in millimetres.
    pub tooth_pitch_mm: f64,
    /// Microstep resolution used for the whole session.
    pub microstep: MicrostepResolution,
    /// Shortest allowed pulse hold time, in seconds.
    pub min_step_delay: f64,
    /// Longest allowed pulse hold time, in seconds.
    pub max_step_delay: f64,
    /// Soft ceiling of the X axis, in millimetres.
    pub x_max_mm: f64,
    /// Soft ceiling of the Y axis, in millimetres.
    pub y_max_mm: f64,
    /// Distance to retreat after a limit switch fires.
    pub backoff_mm: f64,
    /// Speed of the retreat, in mm/s.
    pub backoff_speed: f64,
    /// Speed of rapid (G0) moves, in mm/s.
    pub rapid_speed: f64,
    /// Arc waypoint spacing, as a multiple of the step distance.
    pub arc_step_multiplier: f64,
    /// Upper bound on the waypoints of a single arc.
    pub max_arc_waypoints: usize,
    pub homing: HomingConfig,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: 200,
            teeth_per_revolution: 20,
            tooth_pitch_mm: 2.0,
            microstep: MicrostepResolution::Full,
            min_step_delay: 0.001,
            max_step_delay: 0.1,
            x_max_mm: 600.0,
            y_max_mm: 600.0,
            backoff_mm: 10.0,
            backoff_speed: 20.0,
            rapid_speed: 150.0,
            arc_step_multiplier: 4.0,
            max_arc_waypoints: 100_000,
            homing: HomingConfig::default(),
        }
    }
}

impl MotionConfig {
    /// Builds the [StepGeometry] described by this configuration.
    pub fn geometry(&self) -> Result<StepGeometry> {
        StepGeometry::new(
            self.steps_per_revolution,
            self.teeth_per_revolution,
            self.tooth_pitch_mm,
            self.microstep,
            (self.min_step_delay, self.max_step_delay),
        )
    }
}

/// Settings of the homing seek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomingConfig {
    /// Seek speed towards the minimum switches, in mm/s.
    pub seek_speed: f64,
    /// Longest distance travelled while looking for a switch.
    pub max_travel_mm: f64,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            seek_speed: 20.0,
            max_travel_mm: 700.0,
        }
    }
}
