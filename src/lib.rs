// Core
mod isa;
pub use isa::{Instruction, Opcode, Word};
mod register;
pub use register::Register;
mod machine;
pub use machine::{Event, Flags, Halt, Machine, DEFAULT_MEMORY_SIZE, MAX_MEMORY_SIZE};

// Collaborators
pub mod programs;
pub use programs::Demo;
pub mod menu;
pub mod output;

mod error;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
