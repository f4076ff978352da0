//! Programs to feed the machine: built-in demos and program files.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use miette::{IntoDiagnostic, NamedSource, Result, SourceSpan};

use crate::error;
use crate::isa::Word;

/// Built-in demonstration programs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Demo {
    Arithmetic,
    Factorial,
    Counting,
    Hello,
}

impl Demo {
    pub const ALL: [Demo; 4] = [Demo::Arithmetic, Demo::Factorial, Demo::Counting, Demo::Hello];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Arithmetic => "arithmetic",
            Demo::Factorial => "factorial",
            Demo::Counting => "counting",
            Demo::Hello => "hello",
        }
    }

    /// Heading used by the menu.
    pub fn title(self) -> &'static str {
        match self {
            Demo::Arithmetic => "Arithmetic Program",
            Demo::Factorial => "Factorial Program (5!)",
            Demo::Counting => "Counting Program (1 to 5)",
            Demo::Hello => "Hello Program",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Demo::Arithmetic => "Simple arithmetic: 10 + 5, - 5, * 5",
            Demo::Factorial => "Factorial of 5 (5!)",
            Demo::Counting => "Counting from 1 to 5",
            Demo::Hello => "LOAD AX, 42; PRINT AX; HALT",
        }
    }

    #[rustfmt::skip]
    pub fn program(self) -> Vec<Word> {
        match self {
            Demo::Arithmetic => vec![
                1, 0, 10,       // LOAD AX, 10
                1, 1, 5,        // LOAD BX, 5
                3, 0, 1,        // ADD AX, BX
                11, 0,          // PRINT AX
                4, 0, 1,        // SUB AX, BX
                11, 0,          // PRINT AX
                5, 0, 1,        // MUL AX, BX
                11, 0,          // PRINT AX
                12,             // HALT
            ],
            Demo::Factorial => vec![
                1, 0, 5,        // LOAD AX, 5
                1, 1, 1,        // LOAD BX, 1       ; result
                1, 2, 1,        // LOAD CX, 1       ; decrement
                // loop: 9
                5, 1, 0,        // MUL BX, AX
                4, 0, 2,        // SUB AX, CX
                10, 0, 2,       // CMP AX, CX
                9, 0, 2, 9,     // JNE AX, CX, 9
                11, 1,          // PRINT BX
                12,             // HALT
            ],
            Demo::Counting => vec![
                1, 0, 1,        // LOAD AX, 1       ; counter
                1, 1, 5,        // LOAD BX, 5       ; limit
                1, 2, 1,        // LOAD CX, 1       ; increment
                // loop: 9
                11, 0,          // PRINT AX
                3, 0, 2,        // ADD AX, CX
                10, 0, 1,       // CMP AX, BX
                9, 0, 1, 9,     // JNE AX, BX, 9
                11, 0,          // PRINT AX
                12,             // HALT
            ],
            Demo::Hello => vec![
                1, 0, 42,       // LOAD AX, 42
                11, 0,          // PRINT AX
                12,             // HALT
            ],
        }
    }
}

impl FromStr for Demo {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name().eq_ignore_ascii_case(string))
            .ok_or_else(|| format!("Unknown program '{}'", string))
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve `name` to a built-in demo, or failing that, a program file.
pub fn load(name: &str) -> Result<Vec<Word>> {
    if let Ok(demo) = name.parse::<Demo>() {
        return Ok(demo.program());
    }
    let path = Path::new(name);
    if !path.is_file() {
        return Err(error::unknown_program(name));
    }
    let src = fs::read_to_string(path).into_diagnostic()?;
    parse(name, &src)
}

/// Parse a program file.
///
/// Cells are integers separated by whitespace or commas. `;` and `#` start a comment which runs
/// to the end of the line.
pub fn parse(name: &str, src: &str) -> Result<Vec<Word>> {
    let mut program = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            ';' | '#' => {
                while chars.next_if(|(_, ch)| *ch != '\n').is_some() {}
            }
            ',' => (),
            _ if ch.is_whitespace() => (),
            _ => {
                let mut end = start + ch.len_utf8();
                while let Some((i, ch)) = chars.next_if(|(_, ch)| !is_delimiter(*ch)) {
                    end = i + ch.len_utf8();
                }
                program.push(parse_word(name, src, start, end)?);
            }
        }
    }

    if program.is_empty() {
        return Err(error::parse_empty(source(name, src)));
    }
    Ok(program)
}

fn parse_word(name: &str, src: &str, start: usize, end: usize) -> Result<Word> {
    let word = &src[start..end];
    let span = SourceSpan::from((start, end - start));
    word.parse::<Word>().map_err(|e| {
        let digits = word.strip_prefix(['-', '+']).unwrap_or(word);
        if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
            // Well-formed, but does not fit in a cell
            error::parse_bad_lit(span, source(name, src), e)
        } else {
            error::parse_bad_word(span, source(name, src))
        }
    })
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | ';' | '#')
}

fn source(name: &str, src: &str) -> error::Source {
    NamedSource::new(name, src.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_names() {
        for demo in Demo::ALL {
            assert_eq!(demo.name().parse::<Demo>(), Ok(demo));
            assert_eq!(demo.to_string(), demo.name());
        }
        assert_eq!("Factorial".parse::<Demo>(), Ok(Demo::Factorial));
        assert!("fibonacci".parse::<Demo>().is_err());
    }

    #[test]
    fn factorial_encoding() {
        assert_eq!(
            Demo::Factorial.program(),
            [1, 0, 5, 1, 1, 1, 1, 2, 1, 5, 1, 0, 4, 0, 2, 10, 0, 2, 9, 0, 2, 9, 11, 1, 12]
        );
        assert_eq!(Demo::Hello.program(), [1, 0, 42, 11, 0, 12]);
    }

    #[test]
    fn parse_program() {
        let src = "\
            ; hello\n\
            1, 0, 42   # LOAD AX, 42\n\
            11 0\n\
            \t12,\n";
        assert_eq!(parse("hello.vcpu", src).unwrap(), [1, 0, 42, 11, 0, 12]);
        assert_eq!(parse("a", "-5,+3,,7").unwrap(), [-5, 3, 7]);
        assert_eq!(parse("a", "1;2\n3#4").unwrap(), [1, 3]);
    }

    #[test]
    fn parse_errors() {
        let report = parse("a", "1 0 4x2").unwrap_err();
        assert_eq!(report.code().unwrap().to_string(), "parse::bad_word");
        let label = report.labels().unwrap().next().unwrap();
        assert_eq!((label.offset(), label.len()), (4, 3));

        let report = parse("a", "1, 99999999999").unwrap_err();
        assert_eq!(report.code().unwrap().to_string(), "parse::bad_lit");

        let report = parse("a", "LOAD AX, 42").unwrap_err();
        assert_eq!(report.code().unwrap().to_string(), "parse::bad_word");

        let report = parse("a", "-").unwrap_err();
        assert_eq!(report.code().unwrap().to_string(), "parse::bad_word");

        for src in ["", "  \n", "; nothing here\n"] {
            let report = parse("a", src).unwrap_err();
            assert_eq!(report.code().unwrap().to_string(), "parse::empty");
        }
    }
}
