//! Global register allocation: fixed-lifetime registers for variables
//! with program-wide lifetime (CONST/PARAM/ACCUMULATOR data registers,
//! SRC/DEST pointer registers, optional mask/offset/aligned helpers,
//! optional loop counter).
//!
//! Grounded on `orc_compiler_global_reg_alloc` in `orccompiler.c`.

use crate::result::CompileError;
use crate::target::RegisterClass;
use crate::variable::{VarKind, GLOBAL_LIFETIME};
use crate::compiler::CompilerState;

/// Visit every occupied variable slot and assign its fixed-lifetime
/// register(s); then, if the target requested a dedicated loop
/// counter, allocate it.
pub fn allocate_globals(state: &mut CompilerState) {
    let ids: Vec<_> = state.vars.ids().collect();

    for id in ids {
        if state.has_error() {
            return;
        }

        match state.vars.get(id).kind {
            VarKind::Const | VarKind::Param | VarKind::Accumulator => {
                state.vars.get_mut(id).first_use = GLOBAL_LIFETIME;
                state.vars.get_mut(id).last_use = GLOBAL_LIFETIME;
                match state.registers.allocate(RegisterClass::Data) {
                    Some(reg) => state.vars.get_mut(id).alloc = Some(reg),
                    None => state.set_error(CompileError::RegisterOverflow { class: "vector" }),
                }
            }
            VarKind::Src => {
                match state.registers.allocate(RegisterClass::Gp) {
                    Some(reg) => state.vars.get_mut(id).ptr_register = Some(reg),
                    None => {
                        state.set_error(CompileError::RegisterOverflow { class: "gp" });
                        continue;
                    }
                }
                if state.need_mask_regs {
                    let mask = state.registers.allocate(RegisterClass::Data);
                    let offset = state.registers.allocate(RegisterClass::Gp);
                    let aligned = state.registers.allocate(RegisterClass::Data);
                    match (mask, offset, aligned) {
                        (Some(mask), Some(offset), Some(aligned)) => {
                            let var = state.vars.get_mut(id);
                            var.mask_alloc = Some(mask);
                            var.ptr_offset = Some(offset);
                            var.aligned_data = Some(aligned);
                        }
                        _ => state.set_error(CompileError::RegisterOverflow { class: "vector" }),
                    }
                }
            }
            VarKind::Dest => match state.registers.allocate(RegisterClass::Gp) {
                Some(reg) => state.vars.get_mut(id).ptr_register = Some(reg),
                None => state.set_error(CompileError::RegisterOverflow { class: "gp" }),
            },
            VarKind::Temp => {
                // Allocated locally; nothing to do here.
            }
        }
    }

    if state.alloc_loop_counter && !state.has_error() {
        match state.registers.allocate(RegisterClass::Gp) {
            Some(reg) => state.loop_counter = Some(reg),
            None => {
                if state.target.tolerates_loop_counter_exhaustion() {
                    log::debug!(
                        "{}: loop counter register exhausted, tolerated by target policy",
                        state.target.name()
                    );
                    state.error = None;
                } else {
                    state.set_error(CompileError::RegisterOverflow { class: "gp" });
                }
            }
        }
    }
}
