use core::fmt;

use log::{debug, error, info, warn};

use super::parse_gcode::{parse_words, ParamLetter, Word};
use crate::{
    MotionCommand, MotionSink, MoveOutcome, Position, Positioning, Units,
};

/// Most words accepted on one line.
const MAX_WORDS: usize = 16;

/// Feed rate used until a line sets one, in units per minute.
pub const DEFAULT_FEED_RATE: f64 = 1000.0;

/// Modal state carried from one line to the next.
///
/// Positions are in millimetres, whatever the current units. The feed rate
/// is kept as written, in units per minute.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterState {
    pub units: Units,
    pub positioning: Positioning,
    pub laser_on: bool,
    pub x: f64,
    pub y: f64,
    pub previous_x: f64,
    pub previous_y: f64,
    pub feed_rate: f64,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self {
            units: Units::Millimetres,
            positioning: Positioning::Absolute,
            laser_on: false,
            x: 0.0,
            y: 0.0,
            previous_x: 0.0,
            previous_y: 0.0,
            feed_rate: DEFAULT_FEED_RATE,
        }
    }
}

/// Command word of a line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Code {
    G(u16),
    M(u16),
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::G(n) => write!(f, "G{}", n),
            Code::M(n) => write!(f, "M{}", n),
        }
    }
}

/// A line after interpretation.
///
/// Coordinates are absolute, in millimetres. Feed rates are as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    SetUnits(Units),
    SetPositioning(Positioning),
    /// `M3` (on) or `M5` (off).
    Laser(bool),
    Rapid {
        x: f64,
        y: f64,
    },
    Linear {
        x: f64,
        y: f64,
        feed_rate: f64,
        laser_on: bool,
    },
    Arc {
        x: f64,
        y: f64,
        center_x: f64,
        center_y: f64,
        feed_rate: f64,
        laser_on: bool,
        clockwise: bool,
    },
    /// A command outside the supported subset.
    Unknown(Code),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let laser = |on: &bool| if *on { "laser on" } else { "laser off" };
        match self {
            Instruction::SetUnits(units) => write!(f, "units: {:?}", units),
            Instruction::SetPositioning(positioning) => {
                write!(f, "positioning: {:?}", positioning)
            }
            Instruction::Laser(on) => write!(f, "{}", laser(on)),
            Instruction::Rapid { x, y } => {
                write!(f, "rapid move to ({:.3}, {:.3})", x, y)
            }
            Instruction::Linear {
                x,
                y,
                feed_rate,
                laser_on,
            } => write!(
                f,
                "linear move to ({:.3}, {:.3}) at F{}, {}",
                x,
                y,
                feed_rate,
                laser(laser_on)
            ),
            Instruction::Arc {
                x,
                y,
                center_x,
                center_y,
                feed_rate,
                laser_on,
                clockwise,
            } => write!(
                f,
                "{} arc to ({:.3}, {:.3}) around ({:.3}, {:.3}) at F{}, {}",
                if *clockwise { "clockwise" } else { "counter-clockwise" },
                x,
                y,
                center_x,
                center_y,
                feed_rate,
                laser(laser_on)
            ),
            Instruction::Unknown(code) => write!(f, "unknown command {}", code),
        }
    }
}

/// Parameters of a line, with empty values dropped.
#[derive(Debug, Default)]
struct Params {
    x: Option<f64>,
    y: Option<f64>,
    f: Option<f64>,
    i: Option<f64>,
    j: Option<f64>,
}
impl Params {
    fn from_words(words: &[Word], line_number: usize) -> Self {
        let mut params = Params::default();
        for word in words {
            match word {
                Word::Param(param) => {
                    let Some(value) = param.value else {
                        continue;
                    };
                    match param.letter {
                        ParamLetter::X => params.x = Some(value),
                        ParamLetter::Y => params.y = Some(value),
                        ParamLetter::F => params.f = Some(value),
                        ParamLetter::I => params.i = Some(value),
                        ParamLetter::J => params.j = Some(value),
                        ParamLetter::Z | ParamLetter::E => {
                            debug!(
                                "Line {}: ignoring {:?} parameter",
                                line_number, param.letter
                            );
                        }
                    }
                }
                Word::Unknown(letter) => {
                    debug!("Line {}: ignoring {} word", line_number, letter);
                }
                Word::G(_) | Word::M(_) => {
                    debug!("Line {}: ignoring extra command", line_number);
                }
            }
        }
        params
    }
}

/// Line-oriented GCode interpreter.
///
/// The interpreter keeps the modal state of a program (units, positioning
/// mode, laser, feed rate and position) and turns each line into an
/// [Instruction]. When executing, the instruction's [MotionCommand] is
/// forwarded to a [MotionSink]. Errors from the sink are logged and the
/// program carries on; the modal state always follows the program text,
/// even if a move failed.
#[derive(Debug, Clone, Default)]
pub struct GCodeInterpreter {
    state: InterpreterState,
    line_number: usize,
}
impl GCodeInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the position and laser state in line with the machine.
    ///
    /// Used when the machine was driven by other means between programs, so
    /// that relative moves and arc centres start from the right place.
    /// Units, positioning and feed rate are kept.
    pub fn sync(&mut self, position: Position, laser_on: bool) {
        self.state.laser_on = laser_on;
        self.state.x = position.x;
        self.state.y = position.y;
        self.state.previous_x = position.x;
        self.state.previous_y = position.y;
    }

    /// Returns the modal state.
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// Interprets a line without executing it.
    ///
    /// # Returns
    ///
    /// - `None` for blank lines, comments, and lines that could not be
    ///   parsed (these are logged).
    pub fn interpret_line(&mut self, line: &str) -> Option<Instruction> {
        self.process(line).map(|(instruction, _)| instruction)
    }

    /// Interprets a line and executes it on `sink`.
    pub fn execute_line<M: MotionSink>(
        &mut self,
        line: &str,
        sink: &mut M,
    ) -> Option<Instruction> {
        let (instruction, command) = self.process(line)?;
        if let Some(command) = command {
            match sink.execute(&command) {
                Ok(MoveOutcome::Completed) => {}
                Ok(outcome) => warn!(
                    "Line {}: {} ended early ({:?})",
                    self.line_number, instruction, outcome
                ),
                Err(e) => error!(
                    "Error executing line {}: {}: {}",
                    self.line_number, instruction, e
                ),
            }
        }
        Some(instruction)
    }

    /// Interprets every line of `program` without executing anything.
    ///
    /// Line numbers in log records restart at 1.
    pub fn interpret_program(&mut self, program: &str) -> Vec<Instruction> {
        self.line_number = 0;
        let instructions: Vec<Instruction> = program
            .lines()
            .filter_map(|line| self.interpret_line(line))
            .collect();
        info!("Parsed {} instructions (dry run)", instructions.len());
        instructions
    }

    /// Interprets and executes every line of `program` on `sink`.
    pub fn execute_program<M: MotionSink>(
        &mut self,
        program: &str,
        sink: &mut M,
    ) -> Vec<Instruction> {
        self.line_number = 0;
        let instructions: Vec<Instruction> = program
            .lines()
            .filter_map(|line| self.execute_line(line, sink))
            .collect();
        info!("Executed {} instructions", instructions.len());
        instructions
    }

    fn process(
        &mut self,
        line: &str,
    ) -> Option<(Instruction, Option<MotionCommand>)> {
        self.line_number += 1;
        let code = strip_comment(line).trim();
        if code.is_empty() {
            return None;
        }

        let mut words: heapless::Vec<Word, MAX_WORDS> = heapless::Vec::new();
        let mut input = code;
        match parse_words(&mut input, &mut words) {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "Too many words at line {}, skipped: {}",
                    self.line_number, line
                );
                return None;
            }
            Err(_) => {
                warn!("Could not parse line {}: {}", self.line_number, line);
                return None;
            }
        }

        let command = match words.first() {
            Some(Word::G(n)) => Code::G(*n),
            Some(Word::M(n)) => Code::M(*n),
            _ => {
                warn!("Could not parse line {}: {}", self.line_number, line);
                return None;
            }
        };
        let params = Params::from_words(&words[1..], self.line_number);
        Some(self.apply(command, &params))
    }

    fn apply(
        &mut self,
        command: Code,
        params: &Params,
    ) -> (Instruction, Option<MotionCommand>) {
        match command {
            Code::G(20) | Code::G(21) => {
                let units = if command == Code::G(20) {
                    Units::Inches
                } else {
                    Units::Millimetres
                };
                self.state.units = units;
                (
                    Instruction::SetUnits(units),
                    Some(MotionCommand::SetUnits(units)),
                )
            }
            Code::G(90) | Code::G(91) => {
                let positioning = if command == Code::G(90) {
                    Positioning::Absolute
                } else {
                    Positioning::Relative
                };
                self.state.positioning = positioning;
                (
                    Instruction::SetPositioning(positioning),
                    Some(MotionCommand::SetPositioning(positioning)),
                )
            }
            Code::M(3) => {
                self.state.laser_on = true;
                (Instruction::Laser(true), Some(MotionCommand::LaserOn))
            }
            Code::M(5) => {
                self.state.laser_on = false;
                (Instruction::Laser(false), Some(MotionCommand::LaserOff))
            }
            Code::G(0) => {
                let (x, y) = self.target(params);
                self.move_to(x, y);
                (
                    Instruction::Rapid { x, y },
                    Some(MotionCommand::RapidMove { x, y }),
                )
            }
            Code::G(1) => {
                self.update_feed_rate(params);
                let (x, y) = self.target(params);
                self.move_to(x, y);
                (
                    Instruction::Linear {
                        x,
                        y,
                        feed_rate: self.state.feed_rate,
                        laser_on: self.state.laser_on,
                    },
                    Some(MotionCommand::LinearMove {
                        x,
                        y,
                        speed: self.speed(),
                    }),
                )
            }
            Code::G(2) | Code::G(3) => {
                let clockwise = command == Code::G(2);
                self.update_feed_rate(params);
                let (x, y) = self.target(params);
                // I and J are offsets from the start of the arc.
                let scale = self.state.units.to_mm();
                let center_x = self.state.x + params.i.unwrap_or(0.0) * scale;
                let center_y = self.state.y + params.j.unwrap_or(0.0) * scale;
                self.move_to(x, y);
                (
                    Instruction::Arc {
                        x,
                        y,
                        center_x,
                        center_y,
                        feed_rate: self.state.feed_rate,
                        laser_on: self.state.laser_on,
                        clockwise,
                    },
                    Some(MotionCommand::ArcMove {
                        end_x: x,
                        end_y: y,
                        center_x,
                        center_y,
                        speed: self.speed(),
                        clockwise,
                    }),
                )
            }
            other => {
                warn!(
                    "Unknown command at line {}: {}",
                    self.line_number, other
                );
                (Instruction::Unknown(other), None)
            }
        }
    }

    /// Resolves the X and Y parameters against the modal state.
    fn target(&self, params: &Params) -> (f64, f64) {
        let scale = self.state.units.to_mm();
        let resolve = |current: f64, value: Option<f64>| match value {
            None => current,
            Some(v) => match self.state.positioning {
                Positioning::Absolute => v * scale,
                Positioning::Relative => current + v * scale,
            },
        };
        (
            resolve(self.state.x, params.x),
            resolve(self.state.y, params.y),
        )
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.state.previous_x = self.state.x;
        self.state.previous_y = self.state.y;
        self.state.x = x;
        self.state.y = y;
    }

    fn update_feed_rate(&mut self, params: &Params) {
        if let Some(f) = params.f {
            self.state.feed_rate = f;
        }
    }

    /// Current feed rate in mm/s.
    fn speed(&self) -> f64 {
        self.state.feed_rate / 60.0 * self.state.units.to_mm()
    }
}

/// Removes a trailing `;` comment.
fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(index) => &line[..index],
        None => line,
    }
}
