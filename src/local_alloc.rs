//! Local register allocation: a single forward pass over instructions
//! doing operand chaining, first-use allocation, and last-use release.
//!
//! Grounded on `orc_compiler_rewrite_vars2` in `orccompiler.c`. Runs
//! after global allocation, so SRC/DEST pointer registers and
//! CONST/PARAM/ACCUMULATOR data registers are already assigned; only
//! TEMP variables (and the chained dest registers) are assigned here.

use crate::instruction::OpcodeFlags;
use crate::result::CompileError;
use crate::target::RegisterClass;
use crate::compiler::CompilerState;

/// Walk instructions in order performing, at each instruction `j`:
/// 1. operand chaining, 2. stale immediate-src cleanup, 3. first-use
/// allocation, 4. last-use release (spec.md §4.7, in that exact order).
pub fn allocate_locally(state: &mut CompilerState) {
    for j in 0..state.insns.len() {
        if state.has_error() {
            return;
        }
        chain_operand(state, j);
        if state.has_error() {
            return;
        }
        clear_stale_src2_alloc(state, j);
        allocate_first_uses(state, j);
        if state.has_error() {
            return;
        }
        release_last_uses(state, j);
    }
}

/// If the chaining precondition holds — non-accumulator opcode, single
/// dest, and src1's last use is this instruction — hand the dest the
/// same physical register as src1. Allocating src1 first if it hasn't
/// been allocated yet (i.e. its first use is also this instruction),
/// and bumping the refcount so src1's upcoming last-use release doesn't
/// free a register the dest now also depends on.
fn chain_operand(state: &mut CompilerState, j: usize) {
    let opcode = state.insns[j].opcode.clone();
    if opcode.flags.contains(OpcodeFlags::ACCUMULATOR) || opcode.dest_size[1] != 0 {
        return;
    }
    let (Some(src1), Some(dest)) = (state.insns[j].src_args[0], state.insns[j].dest_args[0]) else {
        return;
    };

    if state.vars.get(src1).last_use != j as i32 {
        return;
    }

    if state.vars.get(src1).first_use == j as i32 {
        match state.registers.allocate(RegisterClass::Data) {
            Some(reg) => state.vars.get_mut(src1).alloc = Some(reg),
            None => {
                state.set_error(CompileError::RegisterOverflow { class: "vector" });
                return;
            }
        }
    }

    let src1_reg = state
        .vars
        .get(src1)
        .alloc
        .expect("chaining precondition guarantees src1 is allocated");
    state.registers.bump(src1_reg);
    state.vars.get_mut(dest).alloc = Some(src1_reg);
}

/// The original's immediate-operand branch (`if (0) { ... }`) is dead
/// cleanup and is not implemented (spec.md §9, REDESIGN FLAGS). Only
/// the live path survives: clear a stale `alloc == 1` sentinel value
/// left on a second src slot so it doesn't pollute this instruction's
/// allocations.
fn clear_stale_src2_alloc(state: &mut CompilerState, j: usize) {
    if let Some(src2) = state.insns[j].src_args[1] {
        if state.vars.get(src2).alloc == Some(1) {
            state.vars.get_mut(src2).alloc = None;
        }
    }
}

fn allocate_first_uses(state: &mut CompilerState, j: usize) {
    let ids: Vec<_> = state.vars.ids().collect();
    for id in ids {
        if state.has_error() {
            return;
        }
        let var = state.vars.get(id);
        if var.first_use != j as i32 || var.alloc.is_some() {
            continue;
        }
        match state.registers.allocate(RegisterClass::Data) {
            Some(reg) => state.vars.get_mut(id).alloc = Some(reg),
            None => state.set_error(CompileError::RegisterOverflow { class: "vector" }),
        }
    }
}

fn release_last_uses(state: &mut CompilerState, j: usize) {
    let ids: Vec<_> = state.vars.ids().collect();
    for id in ids {
        let var = state.vars.get(id);
        if var.last_use != j as i32 {
            continue;
        }
        if let Some(reg) = var.alloc {
            state.registers.release(reg);
        }
    }
}
