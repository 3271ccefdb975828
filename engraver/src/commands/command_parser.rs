use gantry::Direction;
use thiserror::Error;
use winnow::ascii::{float, space0, space1};
use winnow::combinator::{alt, preceded, terminated};
use winnow::token::rest;
use winnow::{Parser, Result};

use crate::commands::command::Command;

/// Possible errors that might occur during parsing.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Nothing but whitespace was entered.
    #[error("empty command")]
    Empty,
    /// Parsing failed.
    #[error("could not parse input: \"{0}\"")]
    ParseError(String),
}

/// Parses one line of shell input.
pub fn parse(line: &str) -> core::result::Result<Command, Error> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::Empty);
    }
    parse_command
        .parse(line)
        .map_err(|_| Error::ParseError(line.to_string()))
}

/// Parse a whole command.
fn parse_command<'s>(input: &mut &'s str) -> Result<Command> {
    alt((
        preceded(("move_x", space1), parse_axis_move).map(
            |(distance, speed, direction)| Command::MoveX {
                distance,
                speed,
                direction,
            },
        ),
        preceded(("move_y", space1), parse_axis_move).map(
            |(distance, speed, direction)| Command::MoveY {
                distance,
                speed,
                direction,
            },
        ),
        preceded(("move_to", space1), (parse_arg, parse_arg, parse_number))
            .map(|(x, y, speed)| Command::MoveTo { x, y, speed }),
        preceded(("arc_cw", space1), parse_arc(true)),
        preceded(("arc_ccw", space1), parse_arc(false)),
        "find_home".value(Command::FindHome),
        "home".value(Command::Home),
        preceded(("laser", space1), parse_on_off).map(Command::Laser),
        preceded(("dry_run", space1), parse_path).map(Command::DryRun),
        preceded(("run", space1), parse_path).map(Command::Run),
        "state".value(Command::State),
        "help".value(Command::Help),
        "quit".value(Command::Quit),
    ))
    .parse_next(input)
}

/// Parse `<mm> <mm/s> <+|->`.
fn parse_axis_move<'s>(input: &mut &'s str) -> Result<(f64, f64, Direction)> {
    (parse_arg, parse_arg, parse_direction).parse_next(input)
}

/// Parse `<ex> <ey> <cx> <cy> <mm/s>` into an arc.
///
/// # Parameters
///
/// - `clockwise`: Sense of the resulting arc.
fn parse_arc<'s>(
    clockwise: bool,
) -> impl FnMut(&mut &'s str) -> Result<Command> {
    move |input| {
        (parse_arg, parse_arg, parse_arg, parse_arg, parse_number)
            .map(|(end_x, end_y, center_x, center_y, speed)| Command::Arc {
                end_x,
                end_y,
                center_x,
                center_y,
                speed,
                clockwise,
            })
            .parse_next(input)
    }
}

/// Parse a number followed by at least one space.
fn parse_arg<'s>(input: &mut &'s str) -> Result<f64> {
    terminated(parse_number, space1).parse_next(input)
}

/// Parse a decimal number.
fn parse_number<'s>(input: &mut &'s str) -> Result<f64> {
    float.parse_next(input)
}

/// Parse `+` or `-`.
fn parse_direction<'s>(input: &mut &'s str) -> Result<Direction> {
    alt(('+'.value(Direction::Forward), '-'.value(Direction::Reverse)))
        .parse_next(input)
}

/// Parse `on` or `off`.
fn parse_on_off<'s>(input: &mut &'s str) -> Result<bool> {
    alt(("on".value(true), "off".value(false))).parse_next(input)
}

/// Parse the rest of the line as a path. Spaces inside are kept.
fn parse_path<'s>(input: &mut &'s str) -> Result<String> {
    preceded(space0, rest)
        .verify(|path: &str| !path.is_empty())
        .map(str::to_string)
        .parse_next(input)
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_axis_moves() {
        assert_eq!(
            Ok(Command::MoveX {
                distance: 10.0,
                speed: 20.0,
                direction: Direction::Forward
            }),
            parse("move_x 10 20 +")
        );
        assert_eq!(
            Ok(Command::MoveY {
                distance: 2.5,
                speed: 5.0,
                direction: Direction::Reverse
            }),
            parse("  move_y 2.5   5 - ")
        );
    }

    #[test]
    fn test_move_to_and_arcs() {
        assert_eq!(
            Ok(Command::MoveTo {
                x: 100.0,
                y: 0.5,
                speed: 20.0
            }),
            parse("move_to 100 0.5 20")
        );
        assert_eq!(
            Ok(Command::Arc {
                end_x: 10.0,
                end_y: 0.0,
                center_x: 5.0,
                center_y: 0.0,
                speed: 20.0,
                clockwise: false,
            }),
            parse("arc_ccw 10 0 5 0 20")
        );
        assert!(matches!(
            parse("arc_cw 10 0 5 0 20"),
            Ok(Command::Arc {
                clockwise: true,
                ..
            })
        ));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Ok(Command::Home), parse("home"));
        assert_eq!(Ok(Command::FindHome), parse("find_home"));
        assert_eq!(Ok(Command::Laser(true)), parse("laser on"));
        assert_eq!(Ok(Command::Laser(false)), parse("laser off"));
        assert_eq!(Ok(Command::State), parse("state"));
        assert_eq!(Ok(Command::Help), parse("help"));
        assert_eq!(Ok(Command::Quit), parse("quit\n"));
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            Ok(Command::Run("jobs/logo.gcode".into())),
            parse("run jobs/logo.gcode")
        );
        assert_eq!(
            Ok(Command::DryRun("my job.gc".into())),
            parse("dry_run my job.gc")
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(Err(Error::Empty), parse("   "));
        for bad in [
            "move_x 10 20",
            "move_x 10 20 *",
            "move_to 1 2",
            "laser maybe",
            "homes",
            "run",
            "state now",
            "fly 1 2",
        ] {
            assert_eq!(
                Err(Error::ParseError(bad.to_string())),
                parse(bad),
                "{}",
                bad
            );
        }
    }

    proptest! {
        #[test]
        fn move_to_numbers(
            x in 0u32..100_000,
            y in 0u32..100_000,
            speed in 1u32..1000,
        ) {
            let (x, y) = (x as f64 / 100.0, y as f64 / 100.0);
            let line = format!("move_to {} {} {}", x, y, speed);
            prop_assert_eq!(
                Ok(Command::MoveTo { x, y, speed: speed as f64 }),
                parse(&line)
            );
        }
    }
}
