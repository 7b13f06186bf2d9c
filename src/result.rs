//! Compile results and the structured error taxonomy.
//!
//! The original reports compilation outcome as a plain integer
//! (`OrcCompileResult`) with `ORC_COMPILE_RESULT_IS_SUCCESSFUL`/
//! `_IS_FATAL` macros. This crate keeps the same three-way outcome
//! shape the external interface promises (spec.md §6) but backs it with
//! a `thiserror`-derived `CompileError` enum, the way this codebase's
//! other crates (`wasmtime-jit`, `wasi-common`) report errors.

use thiserror::Error;

/// The taxonomy of errors a compile can fail with (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An instruction's operand slot size disagrees with its opcode's
    /// declared size.
    #[error("size mismatch: opcode {opcode} {slot_kind}[{slot}] is {actual} should be {expected}")]
    SizeMismatch {
        opcode: String,
        slot_kind: &'static str,
        slot: usize,
        actual: u8,
        expected: u8,
    },

    /// A SRC-kind variable was used as a dest operand.
    #[error("using src var as dest")]
    SrcUsedAsDest,

    /// A CONST-kind variable was used as a dest operand.
    #[error("using const var as dest")]
    ConstUsedAsDest,

    /// A PARAM-kind variable was used as a dest operand.
    #[error("using param var as dest")]
    ParamUsedAsDest,

    /// An ACCUMULATOR-flagged opcode targeted a non-accumulator dest.
    #[error("accumulating opcode to non-accumulator dest")]
    AccumulatorToNonAccumulatorDest,

    /// A non-accumulator opcode targeted an ACCUMULATOR-kind dest.
    #[error("non-accumulating opcode to accumulator dest")]
    NonAccumulatorToAccumulatorDest,

    /// A TEMP variable was read before ever being written.
    #[error("using uninitialized temp var")]
    UninitializedTemp,

    /// A SCALAR opcode's non-first src is not a CONST/PARAM.
    #[error("opcode {opcode} requires const or param source")]
    ScalarSourceRequired { opcode: String },

    /// No rule bound for an opcode on the current target.
    #[error("no rule for {opcode} on target {target}")]
    NoRule { opcode: String, target: String },

    /// Compilation refused because the program carries a backup
    /// function and the "backup" flag is set.
    #[error("compilation disabled")]
    BackupDisabled,

    /// No target was given.
    #[error("no target given")]
    NoTarget,

    /// The register allocator could not find a free register.
    #[error("register overflow for {class} reg")]
    RegisterOverflow { class: &'static str },

    /// A variable carries an unrecognized kind.
    #[error("bad vartype")]
    BadVarType,

    /// A backend's `compile` step failed for a backend-specific reason
    /// (spec.md §6 "Code-memory contract" / target `compile`).
    #[error("backend compile failed: {0}")]
    Backend(String),
}

impl CompileError {
    /// Whether this error belongs to the UNKNOWN_PARSE family (semantic
    /// errors caught before any code is emitted) rather than
    /// UNKNOWN_COMPILE (spec.md §7's result-code table).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CompileError::SizeMismatch { .. }
                | CompileError::SrcUsedAsDest
                | CompileError::ConstUsedAsDest
                | CompileError::ParamUsedAsDest
                | CompileError::AccumulatorToNonAccumulatorDest
                | CompileError::NonAccumulatorToAccumulatorDest
                | CompileError::UninitializedTemp
                | CompileError::ScalarSourceRequired { .. }
                | CompileError::BadVarType
        )
    }
}

/// Minor, backend-reported issue that didn't prevent code generation
/// (spec.md §4.9: "backends may set OK even with minor issues").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BackendStatus {
    /// Backend-specific status code; `0` means "clean OK".
    pub code: i32,
}

/// Outcome of a compile, matching spec.md §6's two result-code
/// families plus the "successful" predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileResult {
    /// Native code was generated. `BackendStatus` may carry a nonzero,
    /// backend-tolerated minor-issue code.
    Ok(BackendStatus),
    /// UNKNOWN_PARSE: a semantic error in the program.
    ParseError(CompileError),
    /// UNKNOWN_COMPILE: compilation failed for a non-semantic reason
    /// (no rule, backup disabled, register exhaustion, ...).
    CompileError(CompileError),
}

impl CompileResult {
    /// "Successful" per spec.md §6: executable code was produced.
    pub fn is_successful(&self) -> bool {
        matches!(self, CompileResult::Ok(_))
    }

    /// "Fatal" per spec.md §6: a syntactical/semantic error, not merely
    /// a compilation failure the emulator fallback can route around.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompileResult::ParseError(_))
    }

    /// Build the correctly-categorized `CompileResult` for a
    /// `CompileError`, per spec.md §7's table (mirrors the original's
    /// `compiler->result = ORC_COMPILE_RESULT_UNKNOWN_{PARSE,COMPILE}`
    /// assignments at each error site).
    pub fn from_error(err: CompileError) -> Self {
        if err.is_parse_error() {
            CompileResult::ParseError(err)
        } else {
            CompileResult::CompileError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_fatal() {
        let result = CompileResult::from_error(CompileError::UninitializedTemp);
        assert!(result.is_fatal());
        assert!(!result.is_successful());
    }

    #[test]
    fn compile_errors_are_not_fatal_but_not_successful() {
        let result = CompileResult::from_error(CompileError::BackupDisabled);
        assert!(!result.is_fatal());
        assert!(!result.is_successful());
    }

    #[test]
    fn ok_is_successful_even_with_nonzero_backend_status() {
        let result = CompileResult::Ok(BackendStatus { code: 3 });
        assert!(result.is_successful());
        assert!(!result.is_fatal());
    }
}
