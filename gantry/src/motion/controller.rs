use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::kinematics::{seconds, LimitLatch};
use crate::motion::arc::{
    far_from, next_arc_point, project_onto_circle, validate_arc,
};
use crate::motion::laser::Laser;
use crate::{
    Axis, AxisState, Direction, Edge, Error, LimitHandle, LimitSource,
    LimitSwitch, MotionCommand, MotionConfig, MotionSink, Position, Result,
    StepGeometry, StepperAxis, StepperDriver, Steps, EVENT_CAPACITY,
};

/// How a move ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Every pulse of the move was emitted.
    Completed,
    /// The move stopped before a pulse that would pass the soft ceiling of
    /// the given axis.
    SoftLimitReached(Axis),
    /// A limit switch stopped the move. The switch is the first one
    /// serviced, if any event was queued.
    Interrupted(Option<LimitSwitch>),
}
impl MoveOutcome {
    /// Returns true if the move ran to completion.
    pub fn is_completed(&self) -> bool {
        *self == MoveOutcome::Completed
    }
}

/// What to do with a pulse delay outside the valid window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelayPolicy {
    Reject,
    Clamp,
}

/// Coordinates the two motors of the gantry.
///
/// The X motor moves the carriage along X on its own. Moving along Y needs
/// both motors to step together, in the same direction. The position is
/// kept as whole steps per axis and only ever changes as a pulse is
/// emitted.
///
/// Every public move first services limit events left over from idle time,
/// then clears the stop flag. Limit-switch callbacks raise the flag through
/// a [LimitHandle]; the stepping loops poll it before every pulse.
///
/// # Type Parameters
///
/// - `S`: [StepperDriver] of both motors.
/// - `L`: enable line of the laser.
pub struct MotionController<S, L> {
    x_motor: StepperAxis<S>,
    y_motor: StepperAxis<S>,
    laser: Laser<L>,
    config: MotionConfig,
    geometry: StepGeometry,
    x_steps: Steps,
    y_steps: Steps,
    x_ceiling: Steps,
    y_ceiling: Steps,
    latch: LimitLatch,
}
impl<S: StepperDriver, L: OutputPin> MotionController<S, L> {
    /// Creates a new `MotionController` at position `(0, 0)`.
    ///
    /// Both motors are set to the configured microstep resolution and the
    /// laser is switched off.
    ///
    /// # Parameters
    ///
    /// - `x_driver`: Driver of the X motor.
    /// - `y_driver`: Driver of the Y motor.
    /// - `laser_pin`: Laser enable line.
    /// - `config`: Motion settings.
    pub fn new(
        x_driver: S,
        y_driver: S,
        laser_pin: L,
        config: MotionConfig,
    ) -> Result<Self> {
        let geometry = config.geometry()?;
        for (speed, name) in [
            (config.backoff_speed, "backoff speed is out of range"),
            (config.rapid_speed, "rapid speed is out of range"),
            (config.homing.seek_speed, "homing seek speed is out of range"),
        ] {
            if geometry.step_delay_from_speed(speed).is_err() {
                return Err(Error::InvalidConfig(name));
            }
        }
        if !(config.arc_step_multiplier >= 1.0) {
            return Err(Error::InvalidConfig(
                "arc step multiplier must be at least 1",
            ));
        }
        if !(config.backoff_mm >= 0.0 && config.homing.max_travel_mm >= 0.0) {
            return Err(Error::InvalidConfig("distances must not be negative"));
        }

        let ceiling = |max: f64| {
            Steps::new((max / geometry.mm_per_step() + 1e-9).floor() as i32)
        };
        let x_ceiling = ceiling(config.x_max_mm);
        let y_ceiling = ceiling(config.y_max_mm);

        info!(
            "Motion controller ready: {} mm/step, ceilings ({}, {}) mm",
            geometry.mm_per_step(),
            config.x_max_mm,
            config.y_max_mm
        );
        Ok(Self {
            x_motor: StepperAxis::new(x_driver, config.microstep)?,
            y_motor: StepperAxis::new(y_driver, config.microstep)?,
            laser: Laser::new(laser_pin)?,
            config,
            geometry,
            x_steps: Steps::zero(),
            y_steps: Steps::zero(),
            x_ceiling,
            y_ceiling,
            latch: LimitLatch::new(),
        })
    }

    /// Returns the current position in millimetres.
    pub fn position(&self) -> Position {
        Position::new(
            self.geometry.to_mm(self.x_steps),
            self.geometry.to_mm(self.y_steps),
        )
    }

    /// Returns the current position in steps, `(x, y)`.
    pub fn steps(&self) -> (Steps, Steps) {
        (self.x_steps, self.y_steps)
    }

    /// Returns the motion state of the motor driving `axis`.
    ///
    /// The X motor also takes part in Y moves; this reports the Y motor for
    /// [Axis::Y].
    pub fn axis_state(&self, axis: Axis) -> AxisState {
        match axis {
            Axis::X => self.x_motor.state(),
            Axis::Y => self.y_motor.state(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn geometry(&self) -> &StepGeometry {
        &self.geometry
    }

    /// Declares the current position to be the origin. Nothing moves.
    pub fn set_home(&mut self) {
        info!("Home set at {}", self.position());
        self.x_steps = Steps::zero();
        self.y_steps = Steps::zero();
    }

    /// Returns a handle through which limit-switch callbacks stop motion.
    pub fn interrupt_handle(&self) -> LimitHandle {
        self.latch.handle()
    }

    /// Registers an interrupt callback for every limit switch.
    ///
    /// Each callback only forwards to [LimitHandle::interrupt_movement].
    pub fn attach_limit_switches<T: LimitSource>(
        &self,
        source: &mut T,
        edge: Edge,
    ) -> Result<()> {
        for switch in LimitSwitch::ALL {
            let handle = self.interrupt_handle();
            source.configure_limit_interrupt(
                switch,
                edge,
                Box::new(move |event| {
                    handle.interrupt_movement(event.switch, event.level)
                }),
            )?;
            debug!("Limit interrupt attached to {:?} ({:?})", switch, edge);
        }
        Ok(())
    }

    /// Enables the laser.
    pub fn laser_on(&mut self) -> Result<()> {
        self.laser.set(true)
    }

    /// Disables the laser.
    pub fn laser_off(&mut self) -> Result<()> {
        self.laser.set(false)
    }

    pub fn is_laser_on(&self) -> bool {
        self.laser.is_on()
    }

    /// Moves along the X axis only.
    pub fn move_x(
        &mut self,
        distance: f64,
        speed: f64,
        direction: Direction,
    ) -> Result<MoveOutcome> {
        self.move_linear_axis(Axis::X, distance, speed, direction)
    }

    /// Moves along the Y axis only. Both motors step on every pulse.
    pub fn move_y(
        &mut self,
        distance: f64,
        speed: f64,
        direction: Direction,
    ) -> Result<MoveOutcome> {
        self.move_linear_axis(Axis::Y, distance, speed, direction)
    }

    /// Moves `distance` millimetres along a single axis.
    ///
    /// # Parameters
    ///
    /// - `axis`: Axis to move along.
    /// - `distance`: Distance in millimetres. Must not be negative.
    /// - `speed`: Speed in mm/s. The resulting pulse delay must lie inside
    ///   the valid window.
    /// - `direction`: Direction of travel.
    ///
    /// # Returns
    ///
    /// - How the move ended. Nothing is emitted if an error is returned
    ///   before the first pulse.
    pub fn move_linear_axis(
        &mut self,
        axis: Axis,
        distance: f64,
        speed: f64,
        direction: Direction,
    ) -> Result<MoveOutcome> {
        info!(
            "Moving {:?} {} mm at {} mm/s ({:?})",
            axis, distance, speed, direction
        );
        self.begin_move()?;
        let outcome = self.run_linear(
            axis,
            distance,
            speed,
            direction,
            DelayPolicy::Reject,
        );
        self.end_move(outcome)
    }

    /// Moves `distance` millimetres along a bearing.
    ///
    /// `angle` is in degrees, counter-clockwise from +X. Cardinal bearings
    /// move a single axis; any other bearing interleaves X and Y pulses.
    /// Pulse delays outside the valid window are clamped, with a warning.
    pub fn move_angle(
        &mut self,
        distance: f64,
        speed: f64,
        angle: f64,
    ) -> Result<MoveOutcome> {
        self.begin_move()?;
        let outcome = self.run_angle(distance, speed, angle);
        self.end_move(outcome)
    }

    /// Moves in a straight line to `(x, y)`.
    ///
    /// Negative targets are rejected before anything moves. A target that
    /// rounds to the current step position is a no-op.
    pub fn move_to(
        &mut self,
        x: f64,
        y: f64,
        speed: f64,
    ) -> Result<MoveOutcome> {
        self.begin_move()?;
        let outcome = self.run_to(x, y, speed);
        self.end_move(outcome)
    }

    /// Moves to `(x, y)` at the rapid speed, with the laser off.
    ///
    /// The laser is switched back on afterwards if it was on before.
    pub fn rapid_to(&mut self, x: f64, y: f64) -> Result<MoveOutcome> {
        let was_on = self.laser.is_on();
        if was_on {
            self.laser.set(false)?;
        }
        let outcome = self.move_to(x, y, self.config.rapid_speed);
        if was_on {
            self.laser.set(true)?;
        }
        outcome
    }

    /// Traces a clockwise arc from the current position to `(end_x, end_y)`
    /// around `(center_x, center_y)`.
    pub fn arc_clockwise(
        &mut self,
        end_x: f64,
        end_y: f64,
        center_x: f64,
        center_y: f64,
        speed: f64,
    ) -> Result<MoveOutcome> {
        self.arc(
            Position::new(end_x, end_y),
            Position::new(center_x, center_y),
            speed,
            true,
        )
    }

    /// Traces a counter-clockwise arc from the current position to
    /// `(end_x, end_y)` around `(center_x, center_y)`.
    pub fn arc_counterclockwise(
        &mut self,
        end_x: f64,
        end_y: f64,
        center_x: f64,
        center_y: f64,
        speed: f64,
    ) -> Result<MoveOutcome> {
        self.arc(
            Position::new(end_x, end_y),
            Position::new(center_x, center_y),
            speed,
            false,
        )
    }

    /// Backs off every queued limit switch.
    ///
    /// Each backoff moves `backoff_mm` away from its switch at
    /// `backoff_speed`, with the stop flag cleared. The flag is raised again
    /// afterwards, so whatever move was running stays stopped. A switch
    /// that fires during a backoff simply queues another event; at most
    /// [EVENT_CAPACITY] events are handled per call.
    ///
    /// # Returns
    ///
    /// - The first switch serviced, if there was any.
    pub fn service_limit_events(&mut self) -> Result<Option<LimitSwitch>> {
        let mut first = None;
        for _ in 0..EVENT_CAPACITY {
            let Some(event) = self.latch.pop_event() else {
                break;
            };
            first.get_or_insert(event.switch);
            warn!(
                "Backing off {:?} by {} mm",
                event.switch, self.config.backoff_mm
            );

            self.latch.clear();
            let outcome = self.run_linear(
                event.switch.axis(),
                self.config.backoff_mm,
                self.config.backoff_speed,
                event.switch.away(),
                DelayPolicy::Reject,
            );
            self.latch.raise();
            if outcome.is_err() {
                self.settle_motors(&outcome);
            }
            outcome?;
        }
        if first.is_some() {
            self.settle_motors(&Ok(MoveOutcome::Interrupted(first)));
        }
        Ok(first)
    }

    /// Clears the stop flag for a new move, after servicing any limit events
    /// that arrived while idle.
    fn begin_move(&mut self) -> Result<()> {
        if self.latch.has_events() {
            warn!("Servicing limit events raised while idle");
            self.service_limit_events()?;
        }
        self.latch.clear();
        Ok(())
    }

    /// Settles the motor states and services the limit events which stopped
    /// the move, if any.
    fn end_move(
        &mut self,
        outcome: Result<MoveOutcome>,
    ) -> Result<MoveOutcome> {
        let outcome = match outcome {
            Ok(MoveOutcome::Interrupted(_)) => {
                self.service_limit_events().map(MoveOutcome::Interrupted)
            }
            other => other,
        };
        self.settle_motors(&outcome);
        match outcome? {
            MoveOutcome::Interrupted(switch) => {
                info!(
                    "Move interrupted by {:?}, now at {}",
                    switch,
                    self.position()
                );
                Ok(MoveOutcome::Interrupted(switch))
            }
            MoveOutcome::SoftLimitReached(axis) => {
                warn!(
                    "Reached limit enforced by software on the {:?} axis",
                    axis
                );
                Ok(MoveOutcome::SoftLimitReached(axis))
            }
            MoveOutcome::Completed => Ok(MoveOutcome::Completed),
        }
    }

    fn settle_motors(&mut self, outcome: &Result<MoveOutcome>) {
        let state = match outcome {
            Ok(MoveOutcome::Interrupted(_)) => AxisState::Interrupted,
            _ => AxisState::Idle,
        };
        self.x_motor.set_state(state);
        self.y_motor.set_state(state);
    }

    fn arc(
        &mut self,
        end: Position,
        center: Position,
        speed: f64,
        clockwise: bool,
    ) -> Result<MoveOutcome> {
        let radius = validate_arc(self.position(), end, center)?;
        self.geometry.clamped_step_delay(speed)?;
        info!(
            "Arc {} to {} around {}, radius {:.3} mm",
            if clockwise { "clockwise" } else { "counter-clockwise" },
            end,
            center,
            radius
        );

        self.begin_move()?;
        let outcome = self.run_arc(end, center, radius, speed, clockwise);
        self.end_move(outcome)
    }

    fn run_arc(
        &mut self,
        end: Position,
        center: Position,
        radius: f64,
        speed: f64,
        clockwise: bool,
    ) -> Result<MoveOutcome> {
        let step =
            self.geometry.mm_per_step() * self.config.arc_step_multiplier;
        let mut point = self.position();
        let mut waypoints = 0;
        let last = project_onto_circle(end, center, radius);

        while far_from(point, last, step) {
            if waypoints >= self.config.max_arc_waypoints {
                return Err(Error::ArcDidNotConverge(waypoints));
            }
            point = next_arc_point(point, center, radius, step, clockwise);
            waypoints += 1;

            if point.x < 0.0 || point.y < 0.0 {
                return Err(Error::NegativeWaypoint {
                    x: point.x,
                    y: point.y,
                });
            }
            match self.run_to(point.x, point.y, speed)? {
                MoveOutcome::Completed => {}
                stopped => return Ok(stopped),
            }
        }
        debug!("Arc traced through {} waypoints", waypoints);

        self.run_to(end.x, end.y, speed)
    }

    fn run_to(&mut self, x: f64, y: f64, speed: f64) -> Result<MoveOutcome> {
        // Bail before any pulse if the target is off the bed.
        if !(x >= 0.0 && y >= 0.0) {
            return Err(Error::NegativeCoordinate { x, y });
        }

        let dx = self.geometry.to_steps(x).get_value() as i64
            - self.x_steps.get_value() as i64;
        let dy = self.geometry.to_steps(y).get_value() as i64
            - self.y_steps.get_value() as i64;
        if dx == 0 && dy == 0 {
            return Ok(MoveOutcome::Completed);
        }

        let mm_per_step = self.geometry.mm_per_step();
        let (dx, dy) = (dx as f64 * mm_per_step, dy as f64 * mm_per_step);
        let distance = dx.hypot(dy);
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        debug!("Moving {:.3} mm at {:.3} degrees", distance, angle);

        self.run_angle(distance, speed, angle)
    }

    fn run_angle(
        &mut self,
        distance: f64,
        speed: f64,
        angle: f64,
    ) -> Result<MoveOutcome> {
        if !(distance >= 0.0) {
            return Err(Error::NegativeDistance(distance));
        }
        if !angle.is_finite() {
            return Err(Error::InvalidConfig("move angle must be finite"));
        }
        let angle = angle.rem_euclid(360.0);

        if let Some((axis, direction)) = cardinal(angle) {
            return self.run_linear(
                axis,
                distance,
                speed,
                direction,
                DelayPolicy::Clamp,
            );
        }

        let (x_dist, y_dist, x_dir, y_dir) = decompose(distance, angle);
        let x_count = self.geometry.step_count_from_distance(x_dist) as u64;
        let y_count = self.geometry.step_count_from_distance(y_dist) as u64;
        let total = x_count.max(y_count);
        if total == 0 {
            return Ok(MoveOutcome::Completed);
        }
        let delay = self.pulse_delay(speed, DelayPolicy::Clamp)?;

        self.x_motor.set_state(AxisState::Stepping);
        self.y_motor.set_state(AxisState::Stepping);
        let mut x_acc = 0;
        let mut y_acc = 0;
        for _ in 0..total {
            x_acc += x_count;
            if x_acc >= total {
                x_acc -= total;
                if let Some(stop) = self.guarded_step(Axis::X, x_dir, delay)? {
                    return Ok(stop);
                }
            }
            y_acc += y_count;
            if y_acc >= total {
                y_acc -= total;
                if let Some(stop) = self.guarded_step(Axis::Y, y_dir, delay)? {
                    return Ok(stop);
                }
            }
        }
        Ok(MoveOutcome::Completed)
    }

    fn run_linear(
        &mut self,
        axis: Axis,
        distance: f64,
        speed: f64,
        direction: Direction,
        policy: DelayPolicy,
    ) -> Result<MoveOutcome> {
        if !(distance >= 0.0) {
            return Err(Error::NegativeDistance(distance));
        }
        let delay = self.pulse_delay(speed, policy)?;
        let count = self.geometry.step_count_from_distance(distance);

        self.x_motor.set_state(AxisState::Stepping);
        if axis == Axis::Y {
            self.y_motor.set_microstep(self.config.microstep)?;
            self.y_motor.set_state(AxisState::Stepping);
        }
        for _ in 0..count {
            if let Some(stop) = self.guarded_step(axis, direction, delay)? {
                return Ok(stop);
            }
        }
        Ok(MoveOutcome::Completed)
    }

    fn pulse_delay(&self, speed: f64, policy: DelayPolicy) -> Result<Duration> {
        let delay = match policy {
            DelayPolicy::Reject => self.geometry.step_delay_from_speed(speed)?,
            DelayPolicy::Clamp => {
                let (delay, clamped) = self.geometry.clamped_step_delay(speed)?;
                if clamped {
                    warn!(
                        "Speed {} mm/s is outside the pulse range, using a \
                         step delay of {}s",
                        speed, delay
                    );
                }
                delay
            }
        };
        Ok(seconds(delay))
    }

    /// Emits one pulse on `axis`, unless the stop flag is raised or the
    /// pulse would pass the soft ceiling.
    ///
    /// # Returns
    ///
    /// - `None` if the pulse was emitted.
    /// - `Some(outcome)` if the move must stop.
    fn guarded_step(
        &mut self,
        axis: Axis,
        direction: Direction,
        delay: Duration,
    ) -> Result<Option<MoveOutcome>> {
        if self.latch.is_raised() {
            warn!("Motor interrupted by limit");
            return Ok(Some(MoveOutcome::Interrupted(None)));
        }

        let (current, ceiling) = match axis {
            Axis::X => (self.x_steps, self.x_ceiling),
            Axis::Y => (self.y_steps, self.y_ceiling),
        };
        let next = match current.advance(direction) {
            Some(next) if direction == Direction::Reverse => next,
            Some(next) if next <= ceiling => next,
            _ => return Ok(Some(MoveOutcome::SoftLimitReached(axis))),
        };

        match axis {
            Axis::X => {
                self.x_motor.set_direction(direction)?;
                self.x_motor.step_with_delay(delay)?;
                self.x_steps = next;
            }
            Axis::Y => {
                self.x_motor.set_direction(direction)?;
                self.y_motor.set_direction(direction)?;
                self.x_motor.step_with_delay(delay)?;
                self.y_motor.step_with_delay(delay)?;
                self.y_steps = next;
            }
        }
        Ok(None)
    }
}

impl<S: StepperDriver, L: OutputPin> MotionSink for MotionController<S, L> {
    fn execute(&mut self, command: &MotionCommand) -> Result<MoveOutcome> {
        match *command {
            MotionCommand::RapidMove { x, y } => self.rapid_to(x, y),
            MotionCommand::LinearMove { x, y, speed } => {
                self.move_to(x, y, speed)
            }
            MotionCommand::ArcMove {
                end_x,
                end_y,
                center_x,
                center_y,
                speed,
                clockwise,
            } => {
                if clockwise {
                    self.arc_clockwise(end_x, end_y, center_x, center_y, speed)
                } else {
                    self.arc_counterclockwise(
                        end_x, end_y, center_x, center_y, speed,
                    )
                }
            }
            MotionCommand::LaserOn => {
                self.laser_on()?;
                Ok(MoveOutcome::Completed)
            }
            MotionCommand::LaserOff => {
                self.laser_off()?;
                Ok(MoveOutcome::Completed)
            }
            MotionCommand::SetUnits(units) => {
                debug!("Units set to {:?}", units);
                Ok(MoveOutcome::Completed)
            }
            MotionCommand::SetPositioning(positioning) => {
                debug!("Positioning set to {:?}", positioning);
                Ok(MoveOutcome::Completed)
            }
        }
    }
}

/// Tolerance when matching a bearing to a cardinal direction, in degrees.
const CARDINAL_TOLERANCE: f64 = 1e-9;

/// Returns the single-axis move equivalent to a cardinal bearing.
fn cardinal(angle: f64) -> Option<(Axis, Direction)> {
    let near = |target: f64| (angle - target).abs() < CARDINAL_TOLERANCE;
    if near(0.0) || near(360.0) {
        Some((Axis::X, Direction::Forward))
    } else if near(90.0) {
        Some((Axis::Y, Direction::Forward))
    } else if near(180.0) {
        Some((Axis::X, Direction::Reverse))
    } else if near(270.0) {
        Some((Axis::Y, Direction::Reverse))
    } else {
        None
    }
}

/// Splits a move along a non-cardinal bearing into per-axis distances.
///
/// # Returns
///
/// - `(x_distance, y_distance, x_direction, y_direction)`, distances being
///   magnitudes.
fn decompose(distance: f64, angle: f64) -> (f64, f64, Direction, Direction) {
    use Direction::{Forward, Reverse};

    let quadrant = (angle / 90.0).floor() as u8;
    let (sin, cos) = (angle - quadrant as f64 * 90.0).to_radians().sin_cos();
    match quadrant {
        0 => (distance * cos, distance * sin, Forward, Forward),
        1 => (distance * sin, distance * cos, Reverse, Forward),
        2 => (distance * cos, distance * sin, Reverse, Reverse),
        _ => (distance * sin, distance * cos, Forward, Reverse),
    }
}
