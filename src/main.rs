use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use miette::{IntoDiagnostic, Result};

use vcpu::menu::{self, Input};
use vcpu::output::Output;
use vcpu::{programs, Demo, Machine};

/// vcpu is a minimal virtual CPU, running integer-encoded programs.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Memory capacity in cells [default: $VCPU_MEMORY or 1024]
    #[arg(
        short = 'M',
        long,
        global = true,
        value_parser = clap::value_parser!(u32).range(0..=vcpu::MAX_MEMORY_SIZE as i64),
    )]
    memory: Option<u32>,

    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long, global = true)]
    minimal: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a built-in program or program file to completion, tracing each instruction
    Run {
        /// Built-in program name, or path to a program file
        name: String,
        /// Only output values emitted by `PRINT`
        #[arg(short, long)]
        quiet: bool,
    },
    /// Execute a program one instruction at a time, waiting for Enter before each
    Step {
        /// Built-in program name, or path to a program file
        name: String,
    },
    /// Check a program file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// List built-in programs
    List,
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    vcpu::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(vcpu::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    Output::set_minimal(args.minimal || vcpu::env::is_minimal());
    let memory = args
        .memory
        .map_or_else(vcpu::env::memory_size, |size| size as usize);

    let Some(command) = args.command else {
        menu::run_menu(memory, &mut Input::new());
        return Ok(());
    };

    match command {
        Command::Run { name, quiet } => {
            Output::set_quiet(quiet);
            let mut machine = load(&name, memory)?;
            Output::print_state(&machine);
            menu::run_traced(&mut machine);
            Output::print_state(&machine);
            message(Green, "Completed", &format!("target {name}"));
            Ok(())
        }
        Command::Step { name } => {
            let mut machine = load(&name, memory)?;
            menu::run_stepped(&mut machine, &mut Input::new());
            message(Green, "Completed", &format!("target {name}"));
            Ok(())
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let src = fs::read_to_string(&name).into_diagnostic()?;
            let program = programs::parse(&name.to_string_lossy(), &src)?;
            message(
                Green,
                "Success",
                &format!("no errors found! ({} cells)", program.len()),
            );
            Ok(())
        }
        Command::List => {
            for demo in Demo::ALL {
                println!("{:>12} {}", demo.name().green(), demo.description());
            }
            Ok(())
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &PathBuf) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    Output::Trace.print_str(&format!("{left:>12} {right}\n"));
}

/// Resolve a program by name and load it into a fresh machine
fn load(name: &str, memory: usize) -> Result<Machine> {
    message(MsgColor::Green, "Loading", &format!("target {name}"));
    let program = programs::load(name)?;

    let mut machine = Machine::new(memory);
    if program.len() > memory {
        message(
            MsgColor::Red,
            "Truncated",
            &format!("{} cells do not fit in memory of {memory}", program.len()),
        );
    }
    machine.load_program(&program);
    Ok(machine)
}
