use gantry::Direction;

/// Commands of the engraver shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `move_x <mm> <mm/s> <+|->`: move along X only.
    MoveX {
        distance: f64,
        speed: f64,
        direction: Direction,
    },
    /// `move_y <mm> <mm/s> <+|->`: move along Y only.
    MoveY {
        distance: f64,
        speed: f64,
        direction: Direction,
    },
    /// `move_to <x> <y> <mm/s>`: straight line to a position.
    MoveTo { x: f64, y: f64, speed: f64 },
    /// `arc_cw <ex> <ey> <cx> <cy> <mm/s>` and `arc_ccw ...`.
    Arc {
        end_x: f64,
        end_y: f64,
        center_x: f64,
        center_y: f64,
        speed: f64,
        clockwise: bool,
    },
    /// `home`: declare the current position to be the origin.
    Home,
    /// `find_home`: seek the minimum limit switches.
    FindHome,
    /// `laser <on|off>`.
    Laser(bool),
    /// `run <file>`: execute a GCode file.
    Run(String),
    /// `dry_run <file>`: interpret a GCode file without moving.
    DryRun(String),
    /// `state`: print position, laser and motor states.
    State,
    /// `help`.
    Help,
    /// `quit`.
    Quit,
}

/// Usage text printed by `help`.
pub const USAGE: &str = "\
Commands:
    move_x <mm> <mm/s> <+|->
    move_y <mm> <mm/s> <+|->
    move_to <x> <y> <mm/s>
    arc_cw <end x> <end y> <centre x> <centre y> <mm/s>
    arc_ccw <end x> <end y> <centre x> <centre y> <mm/s>
    home
    find_home
    laser <on|off>
    run <file>
    dry_run <file>
    state
    help
    quit";
