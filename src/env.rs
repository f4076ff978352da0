use std::{cell::RefCell, ffi::OsStr};

use crate::machine::{DEFAULT_MEMORY_SIZE, MAX_MEMORY_SIZE};

#[derive(Clone, Copy)]
struct Env {
    memory_size: usize,
    minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        memory_size: var_size("VCPU_MEMORY").unwrap_or(DEFAULT_MEMORY_SIZE),
        minimal: var_is("VCPU_MINIMAL", "1"),
    };
    set_env(value);
}

/// Memory capacity for machines not given an explicit `--memory`.
pub fn memory_size() -> usize {
    with_env(|env| env.memory_size)
}

pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

// Unparseable or oversized values are ignored
fn var_size(name: impl AsRef<OsStr>) -> Option<usize> {
    let value = std::env::var(name.as_ref()).ok()?;
    match value.trim().parse::<usize>() {
        Ok(size) if size <= MAX_MEMORY_SIZE => Some(size),
        _ => {
            log::warn!("ignoring invalid {}={value:?}", name.as_ref().to_string_lossy());
            None
        }
    }
}
