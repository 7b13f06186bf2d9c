//! Compilation core for a small array-oriented JIT: validates a
//! program's instructions, binds them to backend rules, computes
//! variable liveness, allocates registers, and drives a pluggable
//! backend's code emission.
//!
//! This crate ships no backend: implement [`Target`] in a separate
//! crate to get executable code out of [`compile_full`].

#![deny(trivial_numeric_casts, unused_extern_crates)]
#![warn(unused_import_braces)]

mod codemem;
mod compiler;
mod constant_pool;
mod flags;
mod global_alloc;
mod instruction;
mod liveness;
mod local_alloc;
mod pipeline;
mod registers;
mod result;
mod rule_binder;
mod target;
mod validator;
mod variable;

pub use crate::codemem::{CodeMemory, CodeRegion, VecCodeMemory};
pub use crate::compiler::{CompilerState, Fixup, Program};
pub use crate::flags::Flags;
pub use crate::instruction::{Instruction, OpcodeFlags, Rule, StaticOpcode};
pub use crate::pipeline::EMULATOR_FALLBACK;
pub use crate::registers::RegisterFile;
pub use crate::result::{BackendStatus, CompileError, CompileResult};
pub use crate::target::{RegisterClass, Target, TargetFlags};
pub use crate::variable::{VarId, VarKind, Variable, VariableTable, GLOBAL_LIFETIME};

/// Compile `program` for the current platform's default target.
///
/// This crate registers no backend of its own (the backend is an
/// external collaborator), so there is no "current platform" to
/// default to: this always reports [`CompileError::NoTarget`], the
/// same outcome the original reports when no target module has
/// registered itself. Use [`compile_for_target`] or [`compile_full`]
/// with a concrete [`Target`] implementation.
pub fn compile(program: &mut Program) -> CompileResult {
    log::info!("initializing compiler for program \"{}\"", program.name);
    CompileResult::from_error(CompileError::NoTarget)
}

/// Compile `program` for `target`, using the target's default flags
/// and no configuration flags (`backup`/`debug` both unset).
pub fn compile_for_target(program: &mut Program, target: &dyn Target) -> CompileResult {
    pipeline::run(program, target, "")
}

/// Compile `program` for `target`, with `flags` as a comma-separated
/// configuration string (recognized tokens: `backup`, `debug`). The
/// target's own rule-lookup flags always come from
/// `target.default_flags()`; see DESIGN.md for why this crate doesn't
/// expose a second, independent flags parameter here.
pub fn compile_full(program: &mut Program, target: &dyn Target, flags: &str) -> CompileResult {
    pipeline::run(program, target, flags)
}

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_without_a_target_reports_no_target() {
        let mut program = Program::new("p");
        let result = compile(&mut program);
        assert_eq!(result, CompileResult::CompileError(CompileError::NoTarget));
    }
}
