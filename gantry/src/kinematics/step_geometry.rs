use core::time::Duration;

use crate::{Error, MicrostepResolution, Result, Steps};

/// Conversions for belt-driven linear motion.
///
/// This converts:
/// - Millimetres to steps.
/// - Steps to millimetres.
/// - Speeds (mm/s) to per-pulse hold times.
///
/// One revolution of the pulley moves the belt by
/// `teeth_per_revolution * tooth_pitch_mm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepGeometry {
    mm_per_step: f64,
    min_delay: f64,
    max_delay: f64,
}

impl StepGeometry {
    /// Creates a new step geometry.
    ///
    /// # Parameters
    ///
    /// - `steps_per_revolution`: Full steps per motor revolution.
    /// - `teeth_per_revolution`: Pulley teeth.
    /// - `tooth_pitch_mm`: Belt pitch in millimetres.
    /// - `microstep`: Driver microstep resolution.
    /// - `pulse_window`: Valid range `(min, max)` of the per-pulse hold time,
    ///   in seconds.
    pub fn new(
        steps_per_revolution: u32,
        teeth_per_revolution: u32,
        tooth_pitch_mm: f64,
        microstep: MicrostepResolution,
        pulse_window: (f64, f64),
    ) -> Result<Self> {
        let (min_delay, max_delay) = pulse_window;
        if steps_per_revolution == 0 || teeth_per_revolution == 0 {
            return Err(Error::InvalidConfig("revolution counts must be > 0"));
        }
        if !(tooth_pitch_mm > 0.0 && tooth_pitch_mm.is_finite()) {
            return Err(Error::InvalidConfig("tooth pitch must be > 0"));
        }
        if !(min_delay > 0.0 && min_delay <= max_delay && max_delay.is_finite())
        {
            return Err(Error::InvalidConfig("invalid step delay window"));
        }

        let mm_per_revolution = teeth_per_revolution as f64 * tooth_pitch_mm;
        let steps = steps_per_revolution as f64 * microstep.divisor() as f64;
        Ok(Self {
            mm_per_step: mm_per_revolution / steps,
            min_delay,
            max_delay,
        })
    }

    /// Distance travelled by one step, in millimetres.
    pub fn mm_per_step(&self) -> f64 {
        self.mm_per_step
    }

    /// Converts a distance to the nearest whole number of steps.
    ///
    /// Negative distances give a zero count.
    pub fn step_count_from_distance(&self, distance: f64) -> u32 {
        let steps = (distance / self.mm_per_step).round();
        if steps > 0.0 {
            steps as u32
        } else {
            0
        }
    }

    /// Converts a value in [Steps] to millimetres.
    pub fn to_mm(&self, steps: Steps) -> f64 {
        steps.to_mm(self.mm_per_step)
    }

    /// Converts a position in millimetres to the nearest [Steps].
    pub fn to_steps(&self, mm: f64) -> Steps {
        Steps::new((mm / self.mm_per_step).round() as i32)
    }

    /// Returns the per-pulse hold time for `speed` mm/s, in seconds.
    ///
    /// This is `mm_per_step / speed`. Fails if the speed is not positive,
    /// or if the delay falls outside the valid pulse window, where the motor
    /// stalls or loses steps.
    pub fn step_delay_from_speed(&self, speed: f64) -> Result<f64> {
        let delay = self.raw_delay(speed)?;
        if delay < self.min_delay || delay > self.max_delay {
            return Err(Error::StepDelayOutOfRange {
                delay,
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(delay)
    }

    /// Like [StepGeometry::step_delay_from_speed], but out-of-range delays
    /// are clamped into the pulse window instead of rejected.
    ///
    /// # Returns
    ///
    /// - `(delay, clamped)`, where `clamped` is true if the delay had to be
    ///   adjusted.
    pub fn clamped_step_delay(&self, speed: f64) -> Result<(f64, bool)> {
        let delay = self.raw_delay(speed)?;
        let clamped = delay.clamp(self.min_delay, self.max_delay);
        Ok((clamped, clamped != delay))
    }

    fn raw_delay(&self, speed: f64) -> Result<f64> {
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(Error::InvalidSpeed(speed));
        }
        Ok(self.mm_per_step / speed)
    }
}

/// Converts a delay in seconds to a [Duration].
pub(crate) fn seconds(delay: f64) -> Duration {
    Duration::from_secs_f64(delay)
}
