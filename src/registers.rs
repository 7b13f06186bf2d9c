//! Per-compilation register bookkeeping for a fixed register set.
//!
//! Grounded on `orccompiler.c`'s `orc_compiler_allocate_register`
//! (two-pass scan, refcounted `alloc_regs`) and structured the way
//! teacher's `src/regalloc/register_set.rs` structures a fixed-size
//! bitmap-backed register set.

use crate::compiler::MAX_REGS;
use crate::target::RegisterClass;

/// Number of register numbers scanned per allocation attempt
/// (`orc_compiler_allocate_register` always scans exactly 32
/// candidates from the class base, regardless of `MAX_REGS`).
const SCAN_WINDOW: u16 = 32;

/// Fixed base register number for the GP class (`ORC_GP_REG_BASE`).
pub const GP_REG_BASE: u16 = 32;

/// Per-compilation bookkeeping of validity, save/restore, allocation
/// count, and used-ever bits for a fixed register set.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    /// Is this register number usable at all on the current target?
    valid: [bool; MAX_REGS],
    /// Is this register call-preserved (only taken on the allocator's
    /// second pass, to reserve it when possible)?
    save: [bool; MAX_REGS],
    /// Has this register ever been handed out during this compile
    /// (independent of whether it's currently allocated)?
    used: [bool; MAX_REGS],
    /// Allocation refcount. Not a bit: operand chaining relies on
    /// bumping this so a dest's later release doesn't free a register
    /// its src is still (conceptually) holding. See spec.md §9,
    /// "Allocator refcounting vs bitmap".
    alloc: [u16; MAX_REGS],
    /// Offset of the data-register class for this target
    /// (`data_register_offset`); the GP class always starts at
    /// `GP_REG_BASE`.
    data_register_offset: u16,
}

impl RegisterFile {
    /// Create a register file with every register invalid. A target's
    /// `compiler_init` is expected to mark the registers it actually
    /// has as valid (and, optionally, save-listed).
    pub fn new(data_register_offset: u16) -> Self {
        RegisterFile {
            valid: [false; MAX_REGS],
            save: [false; MAX_REGS],
            used: [false; MAX_REGS],
            alloc: [0; MAX_REGS],
            data_register_offset,
        }
    }

    /// Mark `reg` as a usable register on this target.
    pub fn set_valid(&mut self, reg: u16, valid: bool) {
        self.valid[reg as usize] = valid;
    }

    /// Mark `reg` as call-preserved: only taken on the allocator's
    /// second pass.
    pub fn set_save(&mut self, reg: u16, save: bool) {
        self.save[reg as usize] = save;
    }

    /// Has `reg` ever been handed out by `allocate`?
    pub fn was_used(&self, reg: u16) -> bool {
        self.used[reg as usize]
    }

    /// Current allocation refcount for `reg`.
    pub fn alloc_count(&self, reg: u16) -> u16 {
        self.alloc[reg as usize]
    }

    /// Bump `reg`'s allocation refcount by one, without going through
    /// the selection scan. Used by operand chaining to keep a src's
    /// register alive past its own last-use release once a dest has
    /// taken it over (spec.md §4.7 step 1).
    pub fn bump(&mut self, reg: u16) {
        self.alloc[reg as usize] = self.alloc[reg as usize].saturating_add(1);
    }

    /// Decrement `reg`'s allocation refcount by one, freeing it once
    /// the count reaches zero. Used on a variable's last use (spec.md
    /// §4.7 step 4).
    pub fn release(&mut self, reg: u16) {
        self.alloc[reg as usize] = self.alloc[reg as usize].saturating_sub(1);
    }

    /// Allocate a register of the given class.
    ///
    /// Selection order: scan `SCAN_WINDOW` candidates from the class
    /// base. First pass returns a register that is valid, not
    /// save-listed, and currently unallocated; this reserves
    /// call-preserved registers when possible. Second pass (only if the
    /// first finds nothing) accepts save-listed registers too. Returns
    /// `None` on exhaustion; the caller is responsible for turning that
    /// into a `CompileError::RegisterOverflow` (this type never touches
    /// `CompileResult`, per SPEC_FULL.md §4.2).
    pub fn allocate(&mut self, class: RegisterClass) -> Option<u16> {
        let base = match class {
            RegisterClass::Data => self.data_register_offset,
            RegisterClass::Gp => GP_REG_BASE,
        };

        for pass in 0..2 {
            for i in 0..SCAN_WINDOW {
                let reg = base + (i & 0x1f);
                let idx = reg as usize;
                if idx >= MAX_REGS {
                    continue;
                }
                let eligible = self.valid[idx]
                    && self.alloc[idx] == 0
                    && (pass == 1 || !self.save[idx]);
                if eligible {
                    self.alloc[idx] += 1;
                    self.used[idx] = true;
                    return Some(reg);
                }
            }
        }
        None
    }
}
