//! Opcodes, instructions, and backend rules.
//!
//! Grounded on `orcprogram.h`'s `_OrcStaticOpcode`/`_OrcInstruction`/
//! `_OrcRule`. The opcode catalog itself (which concrete opcodes exist,
//! their emulation functions) is an external collaborator per spec.md
//! §1 — this module only defines the shape a caller-supplied opcode
//! must have.

use smallvec::SmallVec;

use crate::compiler::CompilerState;
use crate::variable::VarId;

/// Max declared src slots on a `StaticOpcode` (`ORC_STATIC_OPCODE_N_SRC`).
pub const MAX_SRC_SLOTS: usize = 4;
/// Max declared dest slots on a `StaticOpcode` (`ORC_STATIC_OPCODE_N_DEST`).
pub const MAX_DEST_SLOTS: usize = 2;

/// Semantic flags on a `StaticOpcode`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct OpcodeFlags(u8);

impl OpcodeFlags {
    /// No flags set.
    pub const NONE: OpcodeFlags = OpcodeFlags(0);
    /// The opcode writes a cross-iteration accumulator; its single dest
    /// must be an ACCUMULATOR-kind variable.
    pub const ACCUMULATOR: OpcodeFlags = OpcodeFlags(1 << 0);
    /// All src slots after the first must resolve to a CONST or PARAM
    /// variable (scalar-broadcast operands).
    pub const SCALAR: OpcodeFlags = OpcodeFlags(1 << 1);

    /// Combine flags.
    pub const fn union(self, other: OpcodeFlags) -> OpcodeFlags {
        OpcodeFlags(self.0 | other.0)
    }

    /// Whether `self` has every bit set in `other`.
    pub const fn contains(self, other: OpcodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A static, caller-supplied opcode descriptor: per-slot declared sizes
/// and semantic flags. One `StaticOpcode` is shared by every
/// instruction in a program that uses the same opcode.
#[derive(Debug, Clone)]
pub struct StaticOpcode {
    /// Opcode name, used in error messages and rule lookup.
    pub name: &'static str,
    /// Declared dest slot sizes in bytes; `0` means the slot is unused.
    pub dest_size: [u8; MAX_DEST_SLOTS],
    /// Declared src slot sizes in bytes; `0` means the slot is unused.
    pub src_size: [u8; MAX_SRC_SLOTS],
    /// Semantic flags (`ACCUMULATOR`, `SCALAR`).
    pub flags: OpcodeFlags,
}

impl StaticOpcode {
    /// Number of declared (nonzero-size) dest slots.
    pub fn n_dest(&self) -> usize {
        self.dest_size.iter().filter(|&&s| s != 0).count()
    }

    /// Number of declared (nonzero-size) src slots.
    pub fn n_src(&self) -> usize {
        self.src_size.iter().filter(|&&s| s != 0).count()
    }
}

/// A backend-bound emitter for one opcode.
///
/// `emit_user` is opaque backend state threaded through to the emit
/// function (mirrors `OrcRule.emit_user` in the original — a `void *`
/// the Rust side models as `Box<dyn Any>`-free by letting the backend
/// close over whatever it needs instead).
pub struct Rule {
    /// Human-readable name, used in `log::debug!` output.
    pub name: &'static str,
    /// Emit function: given the compiler state and the instruction
    /// being compiled, append assembly/machine code.
    pub emit: Box<dyn Fn(&mut CompilerState, &Instruction) + Send + Sync>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// One instruction in a program: a bound opcode plus resolved operand
/// slots. `dest_args`/`src_args` are only meaningful up to
/// `opcode.n_dest()`/`opcode.n_src()`; unused trailing slots are
/// `None`.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// The static opcode this instruction invokes.
    pub opcode: std::rc::Rc<StaticOpcode>,
    /// Dest operand slots, resolved to variable ids.
    pub dest_args: SmallVec<[Option<VarId>; MAX_DEST_SLOTS]>,
    /// Src operand slots, resolved to variable ids.
    pub src_args: SmallVec<[Option<VarId>; MAX_SRC_SLOTS]>,
    /// Backend rule bound by `RuleBinder`; `None` until binding runs.
    pub rule_name: Option<&'static str>,
}

impl Instruction {
    /// Create an instruction with all slots unset; callers fill in
    /// `dest_args`/`src_args` up to the opcode's declared arities.
    pub fn new(opcode: std::rc::Rc<StaticOpcode>) -> Self {
        let dest_args = smallvec::smallvec![None; MAX_DEST_SLOTS];
        let src_args = smallvec::smallvec![None; MAX_SRC_SLOTS];
        Instruction {
            opcode,
            dest_args,
            src_args,
            rule_name: None,
        }
    }

    /// Convenience: build an instruction directly from dest/src id
    /// lists (padding unspecified trailing slots with `None`).
    pub fn with_args(
        opcode: std::rc::Rc<StaticOpcode>,
        dest_args: &[VarId],
        src_args: &[VarId],
    ) -> Self {
        let mut insn = Self::new(opcode);
        for (slot, &id) in insn.dest_args.iter_mut().zip(dest_args) {
            *slot = Some(id);
        }
        for (slot, &id) in insn.src_args.iter_mut().zip(src_args) {
            *slot = Some(id);
        }
        insn
    }
}
