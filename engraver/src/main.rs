//! # Laser Engraver Executable
//!
//! Drives a two-axis belt gantry from a Raspberry Pi. Without a program
//! argument it runs an interactive shell on stdin; with one it runs (or dry
//! runs) that GCode file and exits.

mod commands;
mod devices;
mod logger;
mod machine;
mod params;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::{eyre::eyre, eyre::WrapErr, Result};
use gantry::MotionController;
use log::info;
use rppal::gpio::Gpio;

use commands::command::Command;
use devices::{open_laser, open_stepper, PiLimitSwitches};
use logger::logger_init;
use machine::Machine;
use params::EngraverParams;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parameter file.
    #[arg(short, long, default_value = "engraver.toml")]
    config: PathBuf,

    /// Overrides the log level of the parameter file.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Only print what the program would do.
    #[arg(long, requires = "program")]
    dry_run: bool,

    /// GCode file to run instead of starting the shell.
    program: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // ---- PARAMETERS AND LOGGING ----

    let mut params: EngraverParams = params::load(&args.config)
        .wrap_err_with(|| format!("Failed to load {:?}", args.config))?;
    if let Some(level) = args.log_level {
        params.logging.level = level;
    }

    let level = params.logging.level_filter().ok_or_else(|| {
        eyre!("Unknown log level {:?}", params.logging.level)
    })?;
    logger_init(level, params.logging.file.as_deref())
        .wrap_err("Failed to initialise logging")?;

    info!("Laser Engraver Executable");
    info!("Parameters loaded from {:?}", args.config);

    // ---- HARDWARE ----

    let gpio = Gpio::new().wrap_err("Failed to open the GPIO peripheral")?;
    let x_driver = open_stepper(&gpio, &params.x_motor)
        .wrap_err("Failed to set up the X motor")?;
    let y_driver = open_stepper(&gpio, &params.y_motor)
        .wrap_err("Failed to set up the Y motor")?;
    let laser = open_laser(&gpio, &params.laser)
        .wrap_err("Failed to set up the laser")?;

    let controller =
        MotionController::new(x_driver, y_driver, laser, params.motion)
            .wrap_err("Failed to initialise the motion controller")?;

    // Interrupts stay registered for as long as the switches are alive.
    let mut limits = PiLimitSwitches::open(&gpio, &params.limits)
        .wrap_err("Failed to set up the limit switches")?;
    controller
        .attach_limit_switches(&mut limits, params.limits.edge)
        .wrap_err("Failed to register limit switch interrupts")?;

    info!("Hardware initialised");

    // ---- MAIN LOOP ----

    let mut machine = Machine::new(controller);
    let mut stdout = io::stdout();
    match args.program {
        Some(program) => {
            let command = if args.dry_run {
                Command::DryRun(program)
            } else {
                Command::Run(program)
            };
            machine.execute(command, &mut stdout)?;
            machine.execute(Command::Quit, &mut stdout)?;
        }
        None => {
            machine.run(io::stdin().lock(), &mut stdout)?;
            machine.execute(Command::Quit, &mut stdout)?;
        }
    }

    info!("Final position {}", machine.controller().position());
    drop(limits);
    info!("Shutdown complete");
    Ok(())
}
