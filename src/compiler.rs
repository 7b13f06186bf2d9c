//! Compiler state shared by every pipeline phase, and the `Program`
//! input/output contract.
//!
//! Grounded on the `_OrcProgram`/`_OrcCompiler`-shaped fields in
//! `orcprogram.h` and the lifecycle spec.md §3 describes. Teardown is
//! grounded on `orc_program_compile_full`'s `error:`/success cleanup
//! paths (see the `Drop` impl below).

use std::rc::Rc;

use crate::flags::Flags;
use crate::instruction::{Instruction, StaticOpcode};
use crate::registers::RegisterFile;
use crate::result::CompileError;
use crate::target::TargetFlags;
use crate::variable::VariableTable;

/// `ORC_N_INSNS`: max instructions in a program.
pub const MAX_INSNS: usize = 100;
/// `ORC_N_VARIABLES`: max variable slots in a program.
pub const MAX_VARIABLES: usize = 20;
/// `ORC_N_REGS` (32 * 4): the flat register-unit space `RegisterFile`
/// indexes into.
pub const MAX_REGS: usize = 128;
/// `ORC_N_FIXUPS`: max relocation fixups.
pub const MAX_FIXUPS: usize = 20;
/// `ORC_N_LABELS`: max labels.
pub const MAX_LABELS: usize = 20;

/// A relocation fixup recorded by the backend while emitting code
/// (spec.md §3: "the label table and fixup list").
#[derive(Debug, Clone, Copy)]
pub struct Fixup {
    /// Byte offset into the code buffer needing patching.
    pub code_offset: usize,
    /// Backend-defined fixup kind.
    pub kind: u32,
    /// Target label index.
    pub label: usize,
}

/// A finished Orc program: the input to compilation, and the carrier of
/// its output (assembly text, code pointer/size).
///
/// Construction (appending variables/instructions) is an external
/// collaborator per spec.md §1; this crate only consumes an
/// already-built `Program`.
pub struct Program {
    /// Program name, used in log output.
    pub name: String,
    /// The variable table this program's instructions operate over.
    pub variables: VariableTable,
    /// Instructions in program order.
    pub instructions: Vec<Instruction>,
    /// A pre-supplied native function pointer, if any. Compilation is
    /// refused when both this is `Some` and the `backup` flag is set.
    pub backup_func: Option<usize>,
    /// Published assembly text, set on successful compile.
    pub asm_code: Option<String>,
    /// Published code size in bytes, set on successful compile.
    pub code_size: usize,
    /// The function pointer the program should call: either freshly
    /// compiled native code, the backup function, or the emulator
    /// fallback (spec.md §4.9 step 2 / §7 "User-visible behavior").
    pub code: Option<usize>,
}

impl Program {
    /// Create an empty program with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            variables: VariableTable::new(),
            instructions: Vec::new(),
            backup_func: None,
            asm_code: None,
            code_size: 0,
            code: None,
        }
    }
}

/// Owns every piece of mutable state a compile touches: copies of the
/// program's instructions/variables (mutated in place during
/// rewriting), the register file, the label/fixup tables, the
/// accumulating asm-text buffer, the output code pointer, and the
/// constant pool.
pub struct CompilerState<'a> {
    /// The target driving this compile.
    pub target: &'a dyn crate::target::Target,
    /// Effective target flags for this compile.
    pub target_flags: TargetFlags,
    /// Parsed configuration flags.
    pub flags: Flags,

    /// Mutable copy of the program's variables.
    pub vars: VariableTable,
    /// Mutable copy of the program's instructions.
    pub insns: Vec<Instruction>,
    /// Number of TEMP variables present before any duplication began.
    pub n_temp_vars: usize,

    /// Register bookkeeping for this compile.
    pub registers: RegisterFile,
    /// Dedicated loop counter register, if the target requested one.
    pub loop_counter: Option<u16>,
    /// Whether the target requires masked SRC access (mask/offset/
    /// aligned-data registers allocated per SRC variable).
    pub need_mask_regs: bool,
    /// Whether the target wants a dedicated loop counter register.
    pub alloc_loop_counter: bool,
    /// Scratch register used to materialize constants that aren't
    /// already resident in a register.
    pub tmpreg: u16,

    /// Accumulating assembly-text buffer (spec.md §6 "Emitter
    /// contract"). `None` once ownership has transferred to the
    /// `Program` on success.
    pub asm_code: Option<String>,
    /// The code-memory region reserved by `Target::allocate_codemem`,
    /// `None` until that step runs (spec.md §4.9 step 5).
    pub code_region: Option<crate::codemem::CodeRegion>,
    /// Output code cursor, advanced by the backend's `compile`.
    pub codeptr: usize,
    /// Relocation fixups recorded during emission.
    pub fixups: Vec<Fixup>,
    /// Number of labels allocated so far.
    pub n_labels: usize,

    /// Constant pool entries: `(widened value, assigned register, use
    /// count)`.
    pub constants: Vec<crate::constant_pool::ConstantEntry>,

    /// First pending error encountered by any phase. Once set, every
    /// subsequent phase checks this on entry and returns immediately
    /// without doing any work (spec.md §7 "Propagation").
    pub error: Option<CompileError>,
}

impl<'a> CompilerState<'a> {
    /// Initialize compiler state from a program, per spec.md §4.9 step
    /// 1: copy instructions/variables, seed the initial valid-register
    /// set, then let the target's `compiler_init` refine it.
    pub fn new(program: &Program, target: &'a dyn crate::target::Target, target_flags: TargetFlags, flags: Flags) -> Self {
        let mut registers = RegisterFile::new(target.data_register_offset());
        for reg in 0..32 {
            registers.set_valid(reg, true);
        }

        let mut state = CompilerState {
            target,
            target_flags,
            flags,
            vars: program.variables.clone(),
            insns: program.instructions.clone(),
            n_temp_vars: program.variables.ids().filter(|&id| program.variables.get(id).kind == crate::variable::VarKind::Temp).count(),
            registers,
            loop_counter: None,
            need_mask_regs: false,
            alloc_loop_counter: false,
            tmpreg: 0,
            asm_code: Some(String::new()),
            code_region: None,
            codeptr: 0,
            fixups: Vec::new(),
            n_labels: 0,
            constants: Vec::new(),
            error: None,
        };
        target.compiler_init(&mut state);
        state
    }

    /// Record the first error, if none is pending yet. Matches the
    /// original's `ORC_COMPILER_ERROR` + `compiler->error = TRUE`
    /// pattern: first failure wins, later ones are no-ops.
    pub fn set_error(&mut self, err: CompileError) {
        if self.error.is_none() {
            log::warn!("compile error: {}", err);
            self.error = Some(err);
        }
    }

    /// Whether a phase should bail out immediately (spec.md §7
    /// "Propagation": every phase checks the error flag on entry).
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Append formatted text to the asm buffer (spec.md §6 "Emitter
    /// contract": `append_code`). Bounded per call to 200 characters,
    /// matching the original's `vsnprintf(tmp, 200 - 1, ...)` cap.
    pub fn append_code(&mut self, text: &str) {
        const MAX_APPEND: usize = 199;
        let buf = self.asm_code.get_or_insert_with(String::new);
        if text.len() > MAX_APPEND {
            buf.push_str(&text[..MAX_APPEND]);
        } else {
            buf.push_str(text);
        }
    }

    /// Allocate a fresh label id (`orc_compiler_label_new`).
    pub fn new_label(&mut self) -> usize {
        let label = self.n_labels;
        self.n_labels += 1;
        label
    }

    /// `Rc`-wrap a `StaticOpcode` for sharing across instructions. A
    /// convenience for backends/tests constructing programs; the
    /// compiler itself only ever reads opcodes through
    /// `Instruction::opcode`.
    pub fn share_opcode(opcode: StaticOpcode) -> Rc<StaticOpcode> {
        Rc::new(opcode)
    }
}

impl<'a> Drop for CompilerState<'a> {
    /// Documents the teardown contract spec.md §3/§9 describe: on the
    /// original, duplicate-temp names are `free()`d here unconditionally
    /// and `asm_code` is freed only on the failure path (success
    /// transfers ownership to the `Program`). Rust's ownership makes the
    /// manual frees unnecessary — `String`/`Vec` drop themselves — but
    /// this impl is where a future allocator-backed implementation would
    /// hook in, and it's the one place that runs on every exit path
    /// (success or early-return-on-error), mirroring the original's
    /// single `free(compiler)` at the end of both the success and
    /// `error:` paths in `orc_program_compile_full`.
    fn drop(&mut self) {
        log::trace!(
            "tearing down compiler state ({} duplicate temp(s))",
            self.vars.n_dup_vars()
        );
    }
}
