use std::fs::read_to_string;
use std::io::{self, BufRead, Write};
use std::path::Path;

use embedded_hal::digital::OutputPin;
use gantry::{
    Axis, GCodeInterpreter, MotionController, MoveOutcome, StepperDriver,
};
use log::{info, warn};
use thiserror::Error;

use crate::commands::command::{Command, USAGE};
use crate::commands::command_parser;

/// Extensions accepted for GCode files.
pub const GCODE_EXTENSIONS: [&str; 4] = ["gc", "gcode", "g", "txt"];

/// Errors raised while executing a shell command.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Motion(#[from] gantry::Error),

    #[error("{0} is not a GCode file (expected .gc, .gcode, .g or .txt)")]
    NotGCode(String),

    #[error("cannot read {path}: {source}")]
    ReadFile { path: String, source: io::Error },

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

/// Whether the shell should keep reading commands.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow {
    Continue,
    Quit,
}

/// The engraver shell.
///
/// Owns the [MotionController] and executes one [Command] at a time. The
/// GCode modal state (units, positioning, feed rate) lives for the whole
/// session and carries over from one program to the next.
pub struct Machine<S, L> {
    controller: MotionController<S, L>,
    interpreter: GCodeInterpreter,
}

impl<S: StepperDriver, L: OutputPin> Machine<S, L> {
    pub fn new(controller: MotionController<S, L>) -> Self {
        Self {
            controller,
            interpreter: GCodeInterpreter::new(),
        }
    }

    pub fn controller(&self) -> &MotionController<S, L> {
        &self.controller
    }

    /// Reads and executes commands until `quit` or the end of `input`.
    ///
    /// Every command is answered with `Ok.`, a note saying why the move
    /// stopped early, or an `ERROR:` line.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
    ) -> io::Result<()> {
        writeln!(output, "ENGRAVER")?;
        prompt(output)?;
        for line in input.lines() {
            let line = line?;
            match command_parser::parse(&line) {
                Err(command_parser::Error::Empty) => {}
                Err(e) => writeln!(output, "ERROR: {}.", e)?,
                Ok(command) => match self.execute(command, output) {
                    Ok(Flow::Quit) => return Ok(()),
                    Ok(Flow::Continue) => {}
                    Err(Error::Output(e)) => return Err(e),
                    Err(e) => writeln!(output, "ERROR: {}.", e)?,
                },
            }
            prompt(output)?;
        }
        Ok(())
    }

    /// Executes a single command.
    pub fn execute<W: Write>(
        &mut self,
        command: Command,
        output: &mut W,
    ) -> Result<Flow, Error> {
        let outcome = match command {
            Command::MoveX {
                distance,
                speed,
                direction,
            } => self.controller.move_x(distance, speed, direction)?,
            Command::MoveY {
                distance,
                speed,
                direction,
            } => self.controller.move_y(distance, speed, direction)?,
            Command::MoveTo { x, y, speed } => {
                self.controller.move_to(x, y, speed)?
            }
            Command::Arc {
                end_x,
                end_y,
                center_x,
                center_y,
                speed,
                clockwise: true,
            } => self
                .controller
                .arc_clockwise(end_x, end_y, center_x, center_y, speed)?,
            Command::Arc {
                end_x,
                end_y,
                center_x,
                center_y,
                speed,
                clockwise: false,
            } => self.controller.arc_counterclockwise(
                end_x, end_y, center_x, center_y, speed,
            )?,
            Command::Home => {
                self.controller.set_home();
                MoveOutcome::Completed
            }
            Command::FindHome => {
                self.controller.find_home()?;
                MoveOutcome::Completed
            }
            Command::Laser(true) => {
                self.controller.laser_on()?;
                MoveOutcome::Completed
            }
            Command::Laser(false) => {
                self.controller.laser_off()?;
                MoveOutcome::Completed
            }
            Command::Run(path) => {
                self.run_file(&path, output)?;
                MoveOutcome::Completed
            }
            Command::DryRun(path) => {
                self.dry_run_file(&path, output)?;
                MoveOutcome::Completed
            }
            Command::State => {
                self.print_state(output)?;
                MoveOutcome::Completed
            }
            Command::Help => {
                writeln!(output, "{}", USAGE)?;
                return Ok(Flow::Continue);
            }
            Command::Quit => {
                info!("Quitting");
                self.controller.laser_off()?;
                return Ok(Flow::Quit);
            }
        };
        report(outcome, output)?;
        Ok(Flow::Continue)
    }

    /// Executes a GCode file, starting from the current position.
    ///
    /// The laser is switched off at the end if the program left it on.
    fn run_file<W: Write>(
        &mut self,
        path: &str,
        output: &mut W,
    ) -> Result<(), Error> {
        let program = read_program(path)?;
        info!("Running {}", path);
        self.interpreter
            .sync(self.controller.position(), self.controller.is_laser_on());
        let instructions = self
            .interpreter
            .execute_program(&program, &mut self.controller);
        if self.controller.is_laser_on() {
            warn!("{} left the laser on, switching it off", path);
            self.controller.laser_off()?;
        }
        writeln!(
            output,
            "Executed {} instructions, now at {}",
            instructions.len(),
            self.controller.position()
        )?;
        Ok(())
    }

    /// Interprets a GCode file and prints what would be executed.
    fn dry_run_file<W: Write>(
        &self,
        path: &str,
        output: &mut W,
    ) -> Result<(), Error> {
        let program = read_program(path)?;
        let mut interpreter = self.interpreter.clone();
        interpreter
            .sync(self.controller.position(), self.controller.is_laser_on());
        let instructions = interpreter.interpret_program(&program);
        for (index, instruction) in instructions.iter().enumerate() {
            writeln!(output, "{:5}: {}", index + 1, instruction)?;
        }
        writeln!(output, "{} instructions", instructions.len())?;
        Ok(())
    }

    fn print_state<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let (x_steps, y_steps) = self.controller.steps();
        writeln!(output, "Position: {} mm", self.controller.position())?;
        writeln!(
            output,
            "Steps: ({}, {})",
            x_steps.get_value(),
            y_steps.get_value()
        )?;
        writeln!(
            output,
            "Laser: {}",
            if self.controller.is_laser_on() { "on" } else { "off" }
        )?;
        writeln!(
            output,
            "Motors: X {:?}, Y {:?}",
            self.controller.axis_state(Axis::X),
            self.controller.axis_state(Axis::Y)
        )
    }
}

/// Reads a GCode file, checking its extension first.
fn read_program(path: &str) -> Result<String, Error> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(e) if GCODE_EXTENSIONS.contains(&e.as_str()) => {}
        _ => return Err(Error::NotGCode(path.to_string())),
    }
    read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_string(),
        source,
    })
}

fn report<W: Write>(outcome: MoveOutcome, output: &mut W) -> io::Result<()> {
    match outcome {
        MoveOutcome::Completed => writeln!(output, "Ok."),
        MoveOutcome::SoftLimitReached(axis) => {
            writeln!(output, "Stopped: {:?} axis soft limit reached.", axis)
        }
        MoveOutcome::Interrupted(Some(switch)) => {
            writeln!(output, "Stopped: limit switch {:?} triggered.", switch)
        }
        MoveOutcome::Interrupted(None) => writeln!(output, "Stopped."),
    }
}

fn prompt<W: Write>(output: &mut W) -> io::Result<()> {
    write!(output, "> ")?;
    output.flush()
}

#[cfg(test)]
mod test {
    use super::*;
    use core::convert::Infallible;
    use core::time::Duration;
    use embedded_hal::digital::{ErrorType, PinState};
    use gantry::{Direction, MotionConfig, Position};
    use std::io::Cursor;

    struct NullStepper;
    impl StepperDriver for NullStepper {
        fn set_direction(&mut self, _level: PinState) -> gantry::Result<()> {
            Ok(())
        }
        fn set_microstep(
            &mut self,
            _pattern: [PinState; 3],
        ) -> gantry::Result<()> {
            Ok(())
        }
        fn pulse(&mut self, _delay: Duration) -> gantry::Result<()> {
            Ok(())
        }
    }

    struct NullPin;
    impl ErrorType for NullPin {
        type Error = Infallible;
    }
    impl OutputPin for NullPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    fn machine() -> Machine<NullStepper, NullPin> {
        let controller = MotionController::new(
            NullStepper,
            NullStepper,
            NullPin,
            MotionConfig::default(),
        )
        .unwrap();
        Machine::new(controller)
    }

    fn execute(
        machine: &mut Machine<NullStepper, NullPin>,
        line: &str,
    ) -> String {
        let mut output = Vec::new();
        let command = command_parser::parse(line).unwrap();
        let flow = machine.execute(command, &mut output);
        match flow {
            Ok(_) => String::from_utf8(output).unwrap(),
            Err(e) => format!("ERROR: {}", e),
        }
    }

    /// Writes `program` to a fresh file in the temp directory.
    fn program_file(name: &str, program: &str) -> String {
        let path = std::env::temp_dir()
            .join(format!("engraver-{}-{}", std::process::id(), name));
        std::fs::write(&path, program).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_moves() {
        let mut m = machine();
        assert_eq!("Ok.\n", execute(&mut m, "move_x 10 20 +"));
        assert_eq!("Ok.\n", execute(&mut m, "move_y 4 20 +"));
        assert_eq!(Position::new(10.0, 4.0), m.controller().position());
        assert_eq!("Ok.\n", execute(&mut m, "move_to 0 4 20"));
        assert_eq!(Position::new(0.0, 4.0), m.controller().position());
    }

    #[test]
    fn test_move_errors() {
        let mut m = machine();
        assert!(execute(&mut m, "move_to -1 0 20").starts_with("ERROR"));
        assert!(execute(&mut m, "move_x 10 1 +").starts_with("ERROR"));
        assert_eq!(Position::default(), m.controller().position());
    }

    #[test]
    fn test_soft_limit_report() {
        let mut m = machine();
        assert_eq!(
            "Stopped: X axis soft limit reached.\n",
            execute(&mut m, "move_x 700 100 +")
        );
    }

    #[test]
    fn test_home_and_laser() {
        let mut m = machine();
        execute(&mut m, "move_to 10 10 20");
        assert_eq!("Ok.\n", execute(&mut m, "home"));
        assert_eq!(Position::default(), m.controller().position());
        execute(&mut m, "laser on");
        assert!(m.controller().is_laser_on());
        execute(&mut m, "laser off");
        assert!(!m.controller().is_laser_on());
    }

    #[test]
    fn test_find_home_without_switches_fails() {
        let mut m = machine();
        assert_eq!(
            "ERROR: homing failed: no limit switch found on the X axis",
            execute(&mut m, "find_home")
        );
    }

    #[test]
    fn test_state() {
        let mut m = machine();
        m.controller.move_x(1.0, 20.0, Direction::Forward).unwrap();
        let state = execute(&mut m, "state");
        assert!(state.contains("Position: (1.000, 0.000) mm"), "{}", state);
        assert!(state.contains("Steps: (5, 0)"), "{}", state);
        assert!(state.contains("Laser: off"), "{}", state);
    }

    #[test]
    fn test_rejects_other_extensions() {
        let mut m = machine();
        assert_eq!(
            "ERROR: logo.png is not a GCode file \
             (expected .gc, .gcode, .g or .txt)",
            execute(&mut m, "run logo.png")
        );
        assert!(execute(&mut m, "dry_run noextension").starts_with("ERROR"));
    }

    #[test]
    fn test_missing_file() {
        let mut m = machine();
        assert!(execute(&mut m, "run /no/such/job.gcode")
            .starts_with("ERROR: cannot read /no/such/job.gcode"));
    }

    #[test]
    fn test_dry_run_does_not_move() {
        let path = program_file("dry.GCODE", "G0 X10 Y5\nM3\nG1 X20\n");
        let mut m = machine();
        let listing = execute(&mut m, &format!("dry_run {}", path));
        assert!(listing.contains("    1: rapid move to (10.000, 5.000)"));
        assert!(listing.contains("    2: laser on"));
        assert!(listing.contains("3 instructions"));
        assert_eq!(Position::default(), m.controller().position());
        assert!(!m.controller().is_laser_on());
    }

    #[test]
    fn test_run_program() {
        let path = program_file(
            "run.gc",
            "G21\nG90\nG0 X10 Y10\nM3\nG1 X20 F600\nG91\nG1 Y5\n",
        );
        let mut m = machine();
        let report = execute(&mut m, &format!("run {}", path));
        assert!(report.starts_with("Executed 7 instructions"), "{}", report);
        assert_eq!(Position::new(20.0, 15.0), m.controller().position());
        assert!(!m.controller().is_laser_on());
    }

    #[test]
    fn test_modal_state_spans_programs() {
        let relative = program_file("relative.gc", "G91\nG0 X5\n");
        let step = program_file("step.gc", "G0 X5\n");
        let mut m = machine();
        execute(&mut m, &format!("run {}", relative));
        assert_eq!(Position::new(5.0, 0.0), m.controller().position());
        execute(&mut m, "move_to 1 1 20");
        execute(&mut m, &format!("run {}", step));
        assert_eq!(Position::new(6.0, 1.0), m.controller().position());
    }

    #[test]
    fn test_shell_session() {
        let mut m = machine();
        let input =
            Cursor::new("move_to 2 2 20\n\nbogus\nhelp\nquit\nstate\n");
        let mut output = Vec::new();
        m.run(input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("ENGRAVER\n> Ok.\n"));
        assert!(text.contains("ERROR: could not parse input: \"bogus\"."));
        assert!(text.contains("move_to <x> <y> <mm/s>"));
        assert!(!text.contains("Position:"));
        assert_eq!(Position::new(2.0, 2.0), m.controller().position());
    }
}
