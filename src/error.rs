use std::num::ParseIntError;

use miette::{miette, LabeledSpan, NamedSource, Report, Severity, SourceSpan};

/// Source of a program file, as attached to diagnostics.
pub type Source = NamedSource<String>;

// Program file errors

pub fn parse_bad_word(span: SourceSpan, src: Source) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::bad_word",
        help = "programs are integers separated by whitespace or commas; comments start with ; or #",
        labels = vec![LabeledSpan::at(span, "not an integer")],
        "Encountered a word that is not an integer.",
    )
    .with_source_code(src)
}

pub fn parse_bad_lit(span: SourceSpan, src: Source, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::bad_lit",
        help = "cells range from -2,147,483,648 to 2,147,483,647",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid literal: {e}",
    )
    .with_source_code(src)
}

pub fn parse_empty(src: Source) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::empty",
        help = "a program needs at least one cell, eg. `12` for HALT",
        "Program file contains no cells.",
    )
    .with_source_code(src)
}

// Command line errors

pub fn unknown_program(name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "cli::unknown_program",
        help = "use `vcpu list` to show built-in programs, or give a path to a program file",
        "No built-in program or file named '{name}'.",
    )
}
