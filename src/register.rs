use std::fmt;
use std::str::FromStr;

/// Represents the CPU registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    AX = 0,
    BX,
    CX,
    DX,
    /// Seeded with the last memory address. No instruction touches it.
    SP,
}

impl Register {
    /// All registers, in encoding order.
    pub const ALL: [Register; 5] = [
        Register::AX,
        Register::BX,
        Register::CX,
        Register::DX,
        Register::SP,
    ];

    /// Resolve a register code from an encoded instruction.
    ///
    /// Every code outside `0..=4` resolves to `AX`. Programs rely on this, so it must never
    /// become an error.
    pub fn from_code(code: i32) -> Register {
        match code {
            1 => Register::BX,
            2 => Register::CX,
            3 => Register::DX,
            4 => Register::SP,
            _ => Register::AX,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::AX => "AX",
            Register::BX => "BX",
            Register::CX => "CX",
            Register::DX => "DX",
            Register::SP => "SP",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    // Exact, case-sensitive names only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .into_iter()
            .find(|register| register.name() == s)
            .ok_or(())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
