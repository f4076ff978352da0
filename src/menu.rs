use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;

use crate::machine::Machine;
use crate::output::Output;
use crate::programs::Demo;
use crate::register::Register;

/// Programs in menu order, as options 1 to 3.
const MENU_DEMOS: [Demo; 3] = [Demo::Arithmetic, Demo::Factorial, Demo::Counting];

/// Where menu choices and step confirmations are read from.
pub enum Input {
    /// Interactive terminal
    Terminal(console::Term),
    /// Stdin which is not attached to a terminal, i.e. piped.
    Stdin(io::StdinLock<'static>),
}

impl Input {
    pub fn new() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            return Input::Terminal(console::Term::stdout());
        }
        Input::Stdin(stdin.lock())
    }

    /// `None` indicates EOF
    pub fn read_line(&mut self) -> Option<String> {
        // Prompt must be visible before blocking
        let _ = io::stdout().flush();
        match self {
            Input::Terminal(term) => term.read_line().ok(),
            Input::Stdin(stdin) => {
                let mut buffer = String::new();
                match stdin.read_line(&mut buffer) {
                    Ok(0) | Err(_) => None,
                    Ok(_) => Some(buffer.trim_end_matches(['\r', '\n']).to_owned()),
                }
            }
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Input::new()
    }
}

/// Run `machine` to completion, tracing every instruction.
pub fn run_traced(machine: &mut Machine) {
    Output::Trace.print_str("\n");
    Output::print_banner("CPU Execution Started");
    machine.run_with(Output::print_event);
    Output::print_banner("CPU Execution Finished");
}

/// Execute `machine` one instruction at a time, waiting for a line of input before each.
///
/// Input reaching EOF does not stop execution.
pub fn run_stepped(machine: &mut Machine, input: &mut Input) {
    Output::print_state(machine);
    Output::Normal.print_str("\nPress Enter to execute each step...\n");
    input.read_line();

    let mut count = 1;
    while machine.is_running() {
        Output::Normal.print_str(&format!(
            "\n{}\n",
            format!("--- Step {count} ---").bold()
        ));
        Output::Normal.print_str("Press Enter to continue...");
        input.read_line();
        count += 1;

        if let Some(event) = machine.step() {
            Output::print_event(&event);
        }

        Output::Normal.print_str(&format!(
            "Register AX: {}\nProgram Counter: {}\nCPU Running: {}\n",
            machine.reg(Register::AX),
            machine.pc(),
            if machine.is_running() { "Yes" } else { "No" },
        ));
    }

    Output::Normal.print_str("\nFinal state\n");
    Output::print_state(machine);
}

/// Interactive menu of built-in programs.
///
/// Returns on `Exit` or when input reaches EOF.
pub fn run_menu(memory_size: usize, input: &mut Input) {
    Output::Normal.print_str(&format!("{}\n", "CPU Simulator".bold()));
    Output::Normal.print_str("=============\n");
    Output::Normal
        .print_str("A virtual CPU that can execute simple assembly-like programs.\n");

    loop {
        print_menu();
        let Some(line) = input.read_line() else {
            Output::Normal.print_str("\n");
            break;
        };

        match line.trim() {
            "1" => run_demo(MENU_DEMOS[0], memory_size),
            "2" => run_demo(MENU_DEMOS[1], memory_size),
            "3" => run_demo(MENU_DEMOS[2], memory_size),
            "4" => {
                Output::Normal.print_str(&format!(
                    "\n{}\n",
                    "=== Step-by-step Execution Demo ===".bold()
                ));
                Output::Normal.print_str(&format!("Program: {}\n", Demo::Hello.description()));
                let mut machine = Machine::new(memory_size);
                machine.load_program(&Demo::Hello.program());
                Output::Normal.print_str("\nInitial state:\n");
                run_stepped(&mut machine, input);
            }
            "5" => {
                Output::Normal.print_str("Exiting CPU Simulator. Goodbye!\n");
                break;
            }
            _ => {
                Output::Normal.print_str(&format!(
                    "{}\n",
                    "Invalid choice. Please enter 1-5.".red()
                ));
            }
        }
    }
}

fn print_menu() {
    Output::Normal.print_str(&format!("\n{}\n", "=== CPU Simulator Menu ===".bold()));
    for (i, demo) in MENU_DEMOS.iter().enumerate() {
        Output::Normal.print_str(&format!("{}. Run {}\n", i + 1, demo.title()));
    }
    Output::Normal.print_str("4. Step-by-step Execution Demo\n");
    Output::Normal.print_str("5. Exit\n");
    Output::Normal.print_str("Enter your choice (1-5): ");
}

fn run_demo(demo: Demo, memory_size: usize) {
    Output::Normal.print_str(&format!(
        "\n{}\n",
        format!("--- Running {} ---", demo.title()).cyan()
    ));
    let mut machine = Machine::new(memory_size);
    machine.load_program(&demo.program());
    Output::print_state(&machine);
    run_traced(&mut machine);
    Output::print_state(&machine);
}
