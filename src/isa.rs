//! Instruction set definitions.
//!
//! The [`opcodes!`] table is the only place an opcode's numeric code, mnemonic and width are
//! written down. Decoding reads exactly `width - 1` operand cells, and the machine advances the
//! program counter by the same width, so the two cannot disagree.
//!
//! # Encoding
//!
//! Every cell is one signed word. An instruction is its opcode cell followed by its operand cells;
//! there is no header, length prefix or label. Jump targets are absolute addresses.

use std::fmt;

use crate::register::Register;

/// A single memory cell.
pub type Word = i32;

macro_rules! opcodes {
    ( $( $(#[$doc:meta])* $name:ident = $code:literal, $mnemonic:literal, $width:literal; )* ) => {
        /// Opcodes understood by the machine.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum Opcode {
            $( $(#[$doc])* $name = $code, )*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            pub fn code(self) -> Word {
                self as Word
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Amount of cells taken by the instruction, including the opcode cell.
            pub fn width(self) -> Word {
                match self {
                    $( Opcode::$name => $width, )*
                }
            }
        }

        impl TryFrom<Word> for Opcode {
            type Error = Word;
            fn try_from(code: Word) -> Result<Self, Self::Error> {
                match code {
                    $( $code => Ok(Opcode::$name), )*
                    _ => Err(code),
                }
            }
        }
    };
}

opcodes! {
    /// LOAD reg, imm ; reg = imm
    Load = 1, "LOAD", 3;
    /// STORE reg, addr ; mem[addr] = reg, skipped if addr is out of range
    Store = 2, "STORE", 3;
    /// ADD r1, r2 ; r1 = r1 + r2
    Add = 3, "ADD", 3;
    /// SUB r1, r2 ; r1 = r1 - r2
    Sub = 4, "SUB", 3;
    /// MUL r1, r2 ; r1 = r1 * r2
    Mul = 5, "MUL", 3;
    /// DIV r1, r2 ; r1 = r1 / r2, halts if r2 is zero
    Div = 6, "DIV", 3;
    /// JMP addr ; pc = addr
    Jmp = 7, "JMP", 2;
    /// JEQ r1, r2, addr ; if r1 == r2 then pc = addr
    Jeq = 8, "JEQ", 4;
    /// JNE r1, r2, addr ; if r1 != r2 then pc = addr
    Jne = 9, "JNE", 4;
    /// CMP r1, r2 ; set flags from r1 - r2
    Cmp = 10, "CMP", 3;
    /// PRINT reg ; emit reg to the observer
    Print = 11, "PRINT", 2;
    /// HALT ; stop the machine
    Halt = 12, "HALT", 1;
}

/// A fully decoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Load { reg: Register, value: Word },
    Store { reg: Register, addr: Word },
    Add { dest: Register, src: Register },
    Sub { dest: Register, src: Register },
    Mul { dest: Register, src: Register },
    Div { dest: Register, src: Register },
    Jmp { addr: Word },
    Jeq { lhs: Register, rhs: Register, addr: Word },
    Jne { lhs: Register, rhs: Register, addr: Word },
    Cmp { lhs: Register, rhs: Register },
    Print { reg: Register },
    Halt,
    /// Opcode cell holding a value outside the table.
    Unknown(Word),
}

impl Instruction {
    /// Decode the instruction whose opcode cell holds `code`.
    ///
    /// `operand(n)` must return the `n`th cell after the opcode cell (starting at 1).
    pub fn decode(code: Word, operand: impl Fn(Word) -> Word) -> Instruction {
        let Ok(opcode) = Opcode::try_from(code) else {
            return Instruction::Unknown(code);
        };
        let reg = |n| Register::from_code(operand(n));

        match opcode {
            Opcode::Load => Instruction::Load {
                reg: reg(1),
                value: operand(2),
            },
            Opcode::Store => Instruction::Store {
                reg: reg(1),
                addr: operand(2),
            },
            Opcode::Add => Instruction::Add {
                dest: reg(1),
                src: reg(2),
            },
            Opcode::Sub => Instruction::Sub {
                dest: reg(1),
                src: reg(2),
            },
            Opcode::Mul => Instruction::Mul {
                dest: reg(1),
                src: reg(2),
            },
            Opcode::Div => Instruction::Div {
                dest: reg(1),
                src: reg(2),
            },
            Opcode::Jmp => Instruction::Jmp { addr: operand(1) },
            Opcode::Jeq => Instruction::Jeq {
                lhs: reg(1),
                rhs: reg(2),
                addr: operand(3),
            },
            Opcode::Jne => Instruction::Jne {
                lhs: reg(1),
                rhs: reg(2),
                addr: operand(3),
            },
            Opcode::Cmp => Instruction::Cmp {
                lhs: reg(1),
                rhs: reg(2),
            },
            Opcode::Print => Instruction::Print { reg: reg(1) },
            Opcode::Halt => Instruction::Halt,
        }
    }

    /// `None` for [`Instruction::Unknown`].
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Instruction::Load { .. } => Opcode::Load,
            Instruction::Store { .. } => Opcode::Store,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Div { .. } => Opcode::Div,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Jeq { .. } => Opcode::Jeq,
            Instruction::Jne { .. } => Opcode::Jne,
            Instruction::Cmp { .. } => Opcode::Cmp,
            Instruction::Print { .. } => Opcode::Print,
            Instruction::Halt => Opcode::Halt,
            Instruction::Unknown(_) => return None,
        })
    }

    /// Amount to advance the program counter by when no jump is taken.
    ///
    /// An unknown opcode has no width; the program counter stays on it.
    pub fn width(&self) -> Word {
        self.opcode().map_or(0, Opcode::width)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().map_or("", Opcode::mnemonic);
        match *self {
            Instruction::Load { reg, value } => write!(f, "{mnemonic} {reg}, {value}"),
            Instruction::Store { reg, addr } => write!(f, "{mnemonic} {reg}, [{addr}]"),
            Instruction::Add { dest, src }
            | Instruction::Sub { dest, src }
            | Instruction::Mul { dest, src }
            | Instruction::Div { dest, src } => write!(f, "{mnemonic} {dest}, {src}"),
            Instruction::Jmp { addr } => write!(f, "{mnemonic} {addr}"),
            Instruction::Jeq { lhs, rhs, addr } | Instruction::Jne { lhs, rhs, addr } => {
                write!(f, "{mnemonic} {lhs}, {rhs}, {addr}")
            }
            Instruction::Cmp { lhs, rhs } => write!(f, "{mnemonic} {lhs}, {rhs}"),
            Instruction::Print { reg } => write!(f, "{mnemonic} {reg}"),
            Instruction::Halt => f.write_str(mnemonic),
            Instruction::Unknown(code) => write!(f, "Unknown instruction: {code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(cells: &[Word]) -> Instruction {
        Instruction::decode(cells[0], |n| {
            cells.get(n as usize).copied().unwrap_or(0)
        })
    }

    #[test]
    fn opcode_table() {
        for (i, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(opcode.code(), i as Word + 1);
            assert_eq!(Opcode::try_from(opcode.code()), Ok(*opcode));
        }
        assert_eq!(Opcode::try_from(0), Err(0));
        assert_eq!(Opcode::try_from(13), Err(13));
        assert_eq!(Opcode::try_from(-1), Err(-1));
    }

    #[test]
    fn decode_width_matches_table() {
        #[rustfmt::skip]
        let cases: &[(&[Word], Instruction, Word)] = &[
            (&[1, 0, 42],   Instruction::Load { reg: Register::AX, value: 42 }, 3),
            (&[2, 3, 100],  Instruction::Store { reg: Register::DX, addr: 100 }, 3),
            (&[3, 0, 1],    Instruction::Add { dest: Register::AX, src: Register::BX }, 3),
            (&[6, 2, 4],    Instruction::Div { dest: Register::CX, src: Register::SP }, 3),
            (&[7, 9],       Instruction::Jmp { addr: 9 }, 2),
            (&[9, 0, 2, 9], Instruction::Jne { lhs: Register::AX, rhs: Register::CX, addr: 9 }, 4),
            (&[11, 1],      Instruction::Print { reg: Register::BX }, 2),
            (&[12],         Instruction::Halt, 1),
            (&[0],          Instruction::Unknown(0), 0),
            (&[99, 1, 2],   Instruction::Unknown(99), 0),
        ];
        for (cells, expected, width) in cases {
            let instr = decode(cells);
            assert_eq!(instr, *expected, "cells {cells:?}");
            assert_eq!(instr.width(), *width, "cells {cells:?}");
        }
    }

    #[test]
    fn decode_falls_back_to_ax() {
        assert_eq!(
            decode(&[4, 7, -3]),
            Instruction::Sub {
                dest: Register::AX,
                src: Register::AX
            }
        );
    }

    #[test]
    fn display() {
        assert_eq!(decode(&[1, 0, 42]).to_string(), "LOAD AX, 42");
        assert_eq!(decode(&[2, 1, 7]).to_string(), "STORE BX, [7]");
        assert_eq!(decode(&[5, 1, 0]).to_string(), "MUL BX, AX");
        assert_eq!(decode(&[8, 0, 1, 3]).to_string(), "JEQ AX, BX, 3");
        assert_eq!(decode(&[7, 0]).to_string(), "JMP 0");
        assert_eq!(decode(&[12]).to_string(), "HALT");
        assert_eq!(decode(&[42]).to_string(), "Unknown instruction: 42");
        assert_eq!(decode(&[0]).to_string(), "Unknown instruction: 0");
        assert_eq!(decode(&[-5, 1, 2]).to_string(), "Unknown instruction: -5");
    }
}
