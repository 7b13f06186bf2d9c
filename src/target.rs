//! The backend contract: everything the compilation core needs from a
//! concrete CPU backend (scalar C, MMX, SSE, AltiVec, ARM, ...).
//!
//! This crate ships no backend. `Target` is the seam a backend crate
//! implements; see spec.md §6 "Target contract".

use crate::codemem::{CodeMemory, CodeRegion, VecCodeMemory};
use crate::compiler::CompilerState;
use crate::instruction::Rule;
use crate::result::CompileError;

/// Register classes a backend allocates from.
///
/// Mirrors `ORC_GP_REG_BASE`/`ORC_VEC_REG_BASE`: data registers hold
/// vector/scalar values, GP registers hold addresses and loop counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    /// Vector/scalar data register.
    Data,
    /// General-purpose (address/counter) register.
    Gp,
}

/// Opaque target-specific flag bits, analogous to the original's
/// `unsigned int target_flags` threaded from `get_default_flags()`
/// through to rule lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct TargetFlags(pub u32);

/// The backend contract a concrete CPU target implements.
///
/// A `&dyn Target` is threaded through the whole pipeline; the core
/// never downcasts it or assumes a concrete backend.
pub trait Target {
    /// Human-readable target name, used in error messages and logs.
    fn name(&self) -> &str;

    /// Whether this target produces directly executable code (vs. the
    /// scalar-C target, which emits source text only).
    fn executable(&self) -> bool;

    /// Offset of the first data register in the flat register-unit
    /// space `RegisterFile` allocates from.
    fn data_register_offset(&self) -> u16;

    /// Default target flags used when a caller doesn't supply its own
    /// (`orc_target_get_default_flags` in the original).
    fn default_flags(&self) -> TargetFlags;

    /// Populate per-compilation target-specific state: which registers
    /// are valid/save-listed, whether masked SRC access or a dedicated
    /// loop counter register are required, and the compiler's scratch
    /// ("tmpreg") register for constant materialization.
    fn compiler_init(&self, state: &mut CompilerState);

    /// Whether allocator exhaustion on the dedicated loop-counter
    /// register should be tolerated (x86 historically does; targets
    /// with real register pressure budgets should not). Replaces the
    /// original's hardcoded "massive hack" with a per-target policy —
    /// see spec.md §9 and the REDESIGN FLAGS section.
    fn tolerates_loop_counter_exhaustion(&self) -> bool {
        false
    }

    /// Look up the rule bound to `opcode_name` under the given target
    /// flags. Returns `None` if this target has no emitter for the
    /// opcode.
    fn find_rule(&self, opcode_name: &str, flags: TargetFlags) -> Option<&Rule>;

    /// Materialize an immediate `value` of `size` bytes into register
    /// `reg` (`load_constant` in the original).
    fn load_constant(&self, state: &mut CompilerState, reg: u16, size: u8, value: i32);

    /// Reserve the code-memory region `compile` will emit into
    /// (`orc_compiler_allocate_codemem` in the original, called
    /// immediately before `target->compile`). The default implementation
    /// backs onto this crate's own [`VecCodeMemory`] test double, sized
    /// from the program's instruction count; a backend that needs real
    /// executable memory (mmap/mprotect) overrides this with its own
    /// [`CodeMemory`] implementation.
    fn allocate_codemem(&self, state: &mut CompilerState) -> Result<CodeRegion, CompileError> {
        let mut mem = VecCodeMemory::new();
        mem.allocate(crate::codemem::default_size_hint(state.insns.len()))
    }

    /// Drive backend code generation for the whole program: walk
    /// `state.program.instructions` in order, call `emit` for each, and
    /// advance `state.codeptr`. Returns an error only for backend-level
    /// failures (e.g. code buffer exhaustion); semantic errors were
    /// already caught by the validator.
    fn compile(&self, state: &mut CompilerState) -> Result<(), CompileError>;
}
