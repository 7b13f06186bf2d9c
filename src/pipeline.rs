//! Fixed-order phase driver: the five steps of spec.md §4.9.
//!
//! Grounded on `orc_program_compile_full` in `orccompiler.c`. Every
//! phase checks `state.has_error()` before it runs rather than
//! trusting its own internal early-return, so the ordering here is the
//! single source of truth for "what runs after what."

use crate::compiler::{CompilerState, Program};
use crate::flags::Flags;
use crate::global_alloc;
use crate::liveness;
use crate::local_alloc;
use crate::result::{BackendStatus, CompileError, CompileResult};
use crate::rule_binder;
use crate::target::Target;
use crate::validator;

/// Sentinel `Program::code` value meaning "no native code was
/// produced; run this program through the emulator fallback"
/// (`orc_executor_emulate` in the original). A linked-in backend's
/// `backup_func`, or eventually a freshly compiled function, has a
/// nonzero value.
pub const EMULATOR_FALLBACK: usize = 0;

/// Drive one compile end to end against `target`, with `config` as the
/// comma-separated flag string (spec.md §6 "Configuration").
pub fn run(program: &mut Program, target: &dyn Target, config: &str) -> CompileResult {
    log::info!("initializing compiler for program \"{}\"", program.name);

    // Pre-seed program.code before any error check: the backup/emulator
    // fallback must stay runnable even if this compile fails outright.
    program.code = Some(program.backup_func.unwrap_or(EMULATOR_FALLBACK));

    let flags = Flags::parse(config);
    if flags.refuses_backup_program(program.backup_func.is_some()) {
        log::warn!(
            "program {} failed to compile, reason: compilation disabled",
            program.name
        );
        return CompileResult::CompileError(CompileError::BackupDisabled);
    }

    let target_flags = target.default_flags();
    let mut state = CompilerState::new(program, target, target_flags, flags);

    validator::validate(&mut state);
    if !state.has_error() {
        rule_binder::bind_rules(&mut state);
    }
    if !state.has_error() {
        liveness::rewrite_liveness(&mut state);
    }
    if !state.has_error() {
        global_alloc::allocate_globals(&mut state);
    }
    if !state.has_error() {
        local_alloc::allocate_locally(&mut state);
    }
    if !state.has_error() {
        match target.allocate_codemem(&mut state) {
            Ok(region) => state.code_region = Some(region),
            Err(err) => state.set_error(err),
        }
    }
    if !state.has_error() {
        if let Err(err) = target.compile(&mut state) {
            state.set_error(err);
        }
    }

    if let Some(err) = state.error.clone() {
        log::warn!(
            "program {} failed to compile, reason: {}",
            program.name,
            err
        );
        return CompileResult::from_error(err);
    }

    program.asm_code = state.asm_code.take();
    program.code_size = state.codeptr;
    log::info!("finished compiling \"{}\" (success)", program.name);
    CompileResult::Ok(BackendStatus::default())
}
