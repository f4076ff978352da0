use std::cell::RefCell;
use std::str::Chars;

use colored::Colorize;

use crate::isa::Instruction;
use crate::machine::{Event, Halt, Machine};

/// Amount of memory cells shown in a state dump.
pub const MEMORY_PREVIEW: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    /// Always shown. Values emitted by `PRINT` when quiet.
    Normal,
    /// Execution trace, state dumps and banners. Hidden when quiet.
    Trace,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
        static IS_QUIET: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }
    pub fn set_quiet(new_value: bool) -> bool {
        Self::IS_QUIET.with(|value| value.replace(new_value))
    }
    pub fn is_quiet() -> bool {
        Self::IS_QUIET.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        if *self == Output::Trace && Self::is_quiet() {
            return;
        }
        // Always remove color if `--minimal`
        if Self::is_minimal() {
            print!("{}", Decolored::new(string).collect::<String>());
        } else {
            print!("{}", string);
        }
    }

    pub fn print_event(event: &Event) {
        if Self::is_quiet() {
            if let Some((_, value)) = event.output {
                Output::Normal.print_str(&format!("{value}\n"));
            }
            return;
        }
        Output::Trace.print_str(&event_line(event));
    }

    pub fn print_state(machine: &Machine) {
        Output::Trace.print_str(&state_dump(machine));
    }

    pub fn print_banner(title: &str) {
        Output::Trace.print_str(&format!("{}\n", format!("=== {title} ===").bold()));
    }
}

/// Single line of execution trace, in the form `PC=9: MUL BX, AX`.
pub fn event_line(event: &Event) -> String {
    let mut line = format!("{} ", format!("PC={}:", event.pc).dimmed());
    let instr = event.instr.to_string();
    match (event.instr, event.halt) {
        (Instruction::Print { reg }, _) => {
            let (_, value) = event.output.unwrap_or((reg, 0));
            line += &format!("{}: {}", instr.green(), value.to_string().yellow().bold());
        }
        (Instruction::Halt, _) => {
            line += &format!("{} - CPU stopped", instr.cyan());
        }
        (Instruction::Unknown(_), _) => {
            line += &instr.red().to_string();
        }
        (_, Some(Halt::DivisionByZero)) => {
            line += &format!("{}\n{}", "Division by zero error!".red(), instr.green());
        }
        _ => {
            line += &instr.green().to_string();
        }
    }
    line.push('\n');
    line
}

/// Multi-line dump of machine state.
pub fn state_dump(machine: &Machine) -> String {
    let mut dump = format!("\n{}\n", "=== CPU State ===".bold());
    dump += &format!("Program Counter: {}\n", machine.pc());
    dump += &format!(
        "Running: {}\n",
        if machine.is_running() { "Yes" } else { "No" }
    );
    dump += &format!(
        "Flags: Zero={}, Carry={}\n",
        machine.zero_flag() as u8,
        machine.carry_flag() as u8,
    );

    dump += &format!("\n{}\n", "Registers:".bold());
    for (reg, value) in machine.registers() {
        dump += &format!("  {}: {}\n", reg.to_string().bold(), value);
    }

    dump += &format!(
        "\n{}\n",
        format!("Memory (first {MEMORY_PREVIEW} locations):").bold()
    );
    for (addr, value) in machine.memory().iter().take(MEMORY_PREVIEW).enumerate() {
        dump += &format!("  {}: {}\n", format!("[{addr:>2}]").dimmed(), value);
    }
    dump
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Word;
    use crate::register::Register;

    fn plain(string: String) -> String {
        Decolored::new(&string).collect()
    }

    fn trace(program: &[Word]) -> Vec<String> {
        let mut machine = Machine::default();
        machine.load_program(program);
        let mut lines = Vec::new();
        machine.run_with(|event| lines.push(plain(event_line(event))));
        lines
    }

    #[test]
    fn decolored() {
        assert_eq!(Decolored::new("abcdef").collect::<String>(), "abcdef");
        assert_eq!(
            Decolored::new("abc\x1b[0;2mdef\x1b[0m").collect::<String>(),
            "abcdef"
        );
        assert_eq!(Decolored::new("abc\x1b[0xyz").collect::<String>(), "abc");
    }

    #[test]
    fn trace_lines() {
        assert_eq!(
            trace(&[1, 0, 42, 11, 0, 12]),
            [
                "PC=0: LOAD AX, 42\n",
                "PC=3: PRINT AX: 42\n",
                "PC=5: HALT - CPU stopped\n",
            ]
        );
        assert_eq!(
            trace(&[1, 0, 10, 6, 0, 1]),
            [
                "PC=0: LOAD AX, 10\n",
                "PC=3: Division by zero error!\nDIV AX, BX\n",
            ]
        );
        assert_eq!(
            trace(&[2, 1, 9, 77]),
            [
                "PC=0: STORE BX, [9]\n",
                "PC=3: Unknown instruction: 77\n",
            ]
        );
    }

    #[test]
    fn state() {
        let mut machine = Machine::new(4);
        machine.load_program(&[1, 1, 7]);
        machine.step();

        let dump = plain(state_dump(&machine));
        let expected = "
=== CPU State ===
Program Counter: 3
Running: Yes
Flags: Zero=0, Carry=0

Registers:
  AX: 0
  BX: 7
  CX: 0
  DX: 0
  SP: 3

Memory (first 20 locations):
  [ 0]: 1
  [ 1]: 1
  [ 2]: 7
  [ 3]: 0
";
        assert_eq!(dump, expected);
        assert_eq!(machine.reg(Register::BX), 7);

        machine.run();
        let dump = plain(state_dump(&machine));
        assert!(dump.contains("Program Counter: 3\nRunning: No\n"));
    }
}
