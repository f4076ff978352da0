use log::{debug, trace, warn};

use crate::isa::{Instruction, Word};
use crate::register::Register;

/// Memory capacity used when none is given.
pub const DEFAULT_MEMORY_SIZE: usize = 1024;
/// Largest capacity with every address representable as a [`Word`].
pub const MAX_MEMORY_SIZE: usize = Word::MAX as usize;

/// Results outside this range set the carry flag.
///
/// Not a real carry; the bounds are odd on purpose and are part of observable behaviour.
const CARRY_MIN: Word = -32768;
const CARRY_MAX: Word = 65535;

/// Complete machine state.
#[derive(Clone, Debug)]
pub struct Machine {
    /// Zero-initialized, fixed length
    mem: Box<[Word]>,
    /// Address of the next opcode cell. Signed, since jump targets are taken verbatim.
    pc: Word,
    /// Indexed by [`Register::index`]
    reg: [Word; 5],
    flags: Flags,
    running: bool,
    halt: Option<Halt>,
}

/// Condition flags, updated by `ADD`, `SUB`, `MUL`, `DIV` and `CMP`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Flags {
    pub zero: bool,
    pub carry: bool,
}

/// Why the machine last stopped fetching.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Halt {
    /// `HALT` instruction.
    Instruction,
    UnknownOpcode(Word),
    DivisionByZero,
    /// Program counter was outside memory on fetch.
    PcOutOfRange(Word),
}

/// Record of a single executed instruction, handed to observers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Event {
    /// Address of the opcode cell.
    pub pc: Word,
    pub instr: Instruction,
    /// Value emitted by `PRINT`.
    pub output: Option<(Register, Word)>,
    /// Set if this instruction halted the machine.
    pub halt: Option<Halt>,
}

impl Flags {
    fn from_result(result: Word) -> Self {
        Flags {
            zero: result == 0,
            carry: !(CARRY_MIN..=CARRY_MAX).contains(&result),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new(DEFAULT_MEMORY_SIZE)
    }
}

impl Machine {
    pub fn new(capacity: usize) -> Self {
        let mut reg = [0; 5];
        reg[Register::SP.index()] = (capacity as Word).wrapping_sub(1);
        Machine {
            mem: vec![0; capacity].into_boxed_slice(),
            pc: 0,
            reg,
            flags: Flags::default(),
            running: false,
            halt: None,
        }
    }

    /// Copy `program` into memory from address 0 and start running.
    ///
    /// Cells past the end of memory are dropped. Registers and flags are kept as they are.
    pub fn load_program(&mut self, program: &[Word]) {
        let len = program.len().min(self.mem.len());
        if len < program.len() {
            debug!(
                "program of {} cells truncated to memory capacity {}",
                program.len(),
                self.mem.len()
            );
        }
        self.mem[..len].copy_from_slice(&program[..len]);
        self.pc = 0;
        self.running = true;
        self.halt = None;
        debug!("loaded program of {len} cells");
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// Returns `None` if nothing was fetched, ie. the machine was already halted or the program
    /// counter is outside memory. Both leave the machine halted.
    pub fn step(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        if self.addr(self.pc).is_none() {
            warn!("program counter {} is outside memory, halting", self.pc);
            self.stop(Halt::PcOutOfRange(self.pc));
            return None;
        }

        let pc = self.pc;
        let instr = Instruction::decode(self.mem(pc), |n| self.mem(pc.wrapping_add(n)));
        trace!("pc={pc}: {instr}");

        let mut output = None;
        // Overwritten by taken jumps
        let mut next_pc = pc.wrapping_add(instr.width());

        match instr {
            Instruction::Load { reg, value } => {
                *self.reg_mut(reg) = value;
            }
            Instruction::Store { reg, addr } => {
                if let Some(addr) = self.addr(addr) {
                    self.mem[addr] = self.reg(reg);
                }
            }
            Instruction::Add { dest, src } => {
                self.arith(dest, src, Word::wrapping_add);
            }
            Instruction::Sub { dest, src } => {
                self.arith(dest, src, Word::wrapping_sub);
            }
            Instruction::Mul { dest, src } => {
                self.arith(dest, src, Word::wrapping_mul);
            }
            Instruction::Div { dest, src } => {
                if self.reg(src) != 0 {
                    // Truncating; `MIN / -1` wraps
                    self.arith(dest, src, Word::wrapping_div);
                } else {
                    warn!("division by zero at pc={pc}, halting");
                    self.stop(Halt::DivisionByZero);
                }
            }
            Instruction::Jmp { addr } => {
                next_pc = addr;
            }
            Instruction::Jeq { lhs, rhs, addr } => {
                if self.reg(lhs) == self.reg(rhs) {
                    next_pc = addr;
                }
            }
            Instruction::Jne { lhs, rhs, addr } => {
                if self.reg(lhs) != self.reg(rhs) {
                    next_pc = addr;
                }
            }
            Instruction::Cmp { lhs, rhs } => {
                self.flags = Flags::from_result(self.reg(lhs).wrapping_sub(self.reg(rhs)));
            }
            Instruction::Print { reg } => {
                output = Some((reg, self.reg(reg)));
            }
            Instruction::Halt => {
                next_pc = pc;
                self.stop(Halt::Instruction);
            }
            Instruction::Unknown(code) => {
                warn!("unknown opcode {code} at pc={pc}, halting");
                self.stop(Halt::UnknownOpcode(code));
            }
        }

        self.pc = next_pc;
        Some(Event {
            pc,
            instr,
            output,
            halt: self.halt,
        })
    }

    /// Step until halted.
    pub fn run(&mut self) {
        self.run_with(|_| ());
    }

    /// Step until halted, passing each executed instruction to `observer`.
    pub fn run_with<F>(&mut self, mut observer: F)
    where
        F: FnMut(&Event),
    {
        while self.running {
            if let Some(event) = self.step() {
                observer(&event);
            }
        }
    }

    fn stop(&mut self, reason: Halt) {
        self.running = false;
        self.halt = Some(reason);
    }

    /// `dest = op(dest, src)`, then set flags from the result.
    #[inline]
    fn arith(&mut self, dest: Register, src: Register, op: fn(Word, Word) -> Word) {
        let res = op(self.reg(dest), self.reg(src));
        self.flags = Flags::from_result(res);
        *self.reg_mut(dest) = res;
    }

    /// Index into memory, if `addr` is in range.
    #[inline]
    fn addr(&self, addr: Word) -> Option<usize> {
        usize::try_from(addr)
            .ok()
            .filter(|addr| *addr < self.mem.len())
    }

    #[inline]
    fn reg_mut(&mut self, reg: Register) -> &mut Word {
        &mut self.reg[reg.index()]
    }

    // Accessors

    /// Value at `addr`, or 0 if out of range.
    pub fn mem(&self, addr: Word) -> Word {
        self.addr(addr).map_or(0, |addr| self.mem[addr])
    }

    pub fn memory(&self) -> &[Word] {
        &self.mem
    }

    pub fn capacity(&self) -> usize {
        self.mem.len()
    }

    pub fn reg(&self, reg: Register) -> Word {
        self.reg[reg.index()]
    }

    /// Register value by name, or 0 for an unknown name.
    pub fn reg_by_name(&self, name: &str) -> Word {
        name.parse().map_or(0, |reg| self.reg(reg))
    }

    /// Registers with their values, in encoding order.
    pub fn registers(&self) -> impl Iterator<Item = (Register, Word)> + '_ {
        Register::ALL.into_iter().map(|reg| (reg, self.reg(reg)))
    }

    pub fn pc(&self) -> Word {
        self.pc
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn zero_flag(&self) -> bool {
        self.flags.zero
    }

    pub fn carry_flag(&self) -> bool {
        self.flags.carry
    }

    /// `None` while running, or if never halted since the last load.
    pub fn halt_reason(&self) -> Option<Halt> {
        self.halt
    }
}
