//! First/last-use computation with on-the-fly temp splitting.
//!
//! Grounded on `orc_compiler_rewrite_vars` + `orc_compiler_dup_temporary`
//! in `orccompiler.c`. Walks instructions in program order; within an
//! instruction, src slots are resolved before dest slots (spec.md §5
//! "Ordering guarantees").

use crate::compiler::CompilerState;
use crate::instruction::OpcodeFlags;
use crate::result::CompileError;
use crate::variable::{VarId, VarKind};

/// Run the liveness rewrite over every instruction in program order.
pub fn rewrite_liveness(state: &mut CompilerState) {
    for j in 0..state.insns.len() {
        if state.has_error() {
            return;
        }
        rewrite_sources(state, j);
        if state.has_error() {
            return;
        }
        rewrite_dests(state, j);
    }
}

fn rewrite_sources(state: &mut CompilerState, j: usize) {
    let opcode = state.insns[j].opcode.clone();

    for (slot, &declared) in opcode.src_size.iter().enumerate() {
        if declared == 0 {
            continue;
        }
        let Some(mut var_id) = state.insns[j].src_args[slot] else {
            continue;
        };

        if state.vars.get(var_id).kind == VarKind::Dest {
            state.vars.get_mut(var_id).load_dest = true;
        }

        let mut actual_var = var_id;
        if state.vars.get(var_id).replaced {
            actual_var = state.vars.get(var_id).replacement.expect("replaced implies replacement");
            state.insns[j].src_args[slot] = Some(actual_var);
            var_id = actual_var;
        }

        if !state.vars.get(var_id).used {
            if state.vars.get(var_id).kind == VarKind::Temp {
                state.set_error(CompileError::UninitializedTemp);
                return;
            }
            state.vars.get_mut(var_id).used = true;
            state.vars.get_mut(var_id).first_use = j as i32;
        }
        state.vars.get_mut(actual_var).last_use = j as i32;
    }
}

fn rewrite_dests(state: &mut CompilerState, j: usize) {
    let opcode = state.insns[j].opcode.clone();
    let is_accumulator_opcode = opcode.flags.contains(OpcodeFlags::ACCUMULATOR);

    for (slot, &declared) in opcode.dest_size.iter().enumerate() {
        if declared == 0 {
            continue;
        }
        let Some(var_id) = state.insns[j].dest_args[slot] else {
            continue;
        };

        match state.vars.get(var_id).kind {
            VarKind::Src => {
                state.set_error(CompileError::SrcUsedAsDest);
                return;
            }
            VarKind::Const => {
                state.set_error(CompileError::ConstUsedAsDest);
                return;
            }
            VarKind::Param => {
                state.set_error(CompileError::ParamUsedAsDest);
                return;
            }
            _ => {}
        }

        let is_accumulator_var = state.vars.get(var_id).kind == VarKind::Accumulator;
        if is_accumulator_opcode && !is_accumulator_var {
            state.set_error(CompileError::AccumulatorToNonAccumulatorDest);
            return;
        }
        if !is_accumulator_opcode && is_accumulator_var {
            state.set_error(CompileError::NonAccumulatorToAccumulatorDest);
            return;
        }

        let mut actual_var = var_id;
        if state.vars.get(var_id).replaced {
            actual_var = state.vars.get(var_id).replacement.expect("replaced implies replacement");
            state.insns[j].dest_args[slot] = Some(actual_var);
        }

        if !state.vars.get(actual_var).used {
            state.vars.get_mut(actual_var).used = true;
            state.vars.get_mut(actual_var).first_use = j as i32;
        } else if state.vars.get(var_id).kind == VarKind::Temp {
            actual_var = duplicate_and_rewrite(state, var_id, j, slot);
        }

        state.vars.get_mut(actual_var).last_use = j as i32;
    }
}

/// Split a TEMP that's being written again after having been used:
/// allocate a fresh duplicate slot, mark the original as forwarding to
/// it, and rewrite the instruction's dest to point at the duplicate.
fn duplicate_and_rewrite(state: &mut CompilerState, var_id: VarId, j: usize, slot: usize) -> VarId {
    let dup = state.vars.duplicate_temp(var_id, j);
    let orig = state.vars.get_mut(var_id);
    orig.replaced = true;
    orig.replacement = Some(dup);
    state.insns[j].dest_args[slot] = Some(dup);
    dup
}
