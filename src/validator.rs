//! Operand-size and kind checking.
//!
//! Grounded on `orc_compiler_check_sizes` in `orccompiler.c`. Runs
//! first, before rule binding or liveness, so later phases can assume
//! every instruction's slots agree with its opcode's declared sizes.

use crate::compiler::CompilerState;
use crate::instruction::OpcodeFlags;
use crate::result::CompileError;
use crate::variable::VarKind;

/// Check every instruction's operand sizes against its opcode's
/// declared sizes, and the SCALAR-opcode constraint on non-first src
/// operands. Sets `state.error` and returns on the first mismatch.
pub fn validate(state: &mut CompilerState) {
    for i in 0..state.insns.len() {
        if state.has_error() {
            return;
        }
        check_instruction(state, i);
    }
}

fn check_instruction(state: &mut CompilerState, i: usize) {
    let opcode = state.insns[i].opcode.clone();

    for (slot, &declared) in opcode.dest_size.iter().enumerate() {
        if declared == 0 {
            continue;
        }
        let Some(var_id) = state.insns[i].dest_args[slot] else {
            continue;
        };
        let actual = state.vars.get(var_id).size;
        if actual != declared {
            state.set_error(CompileError::SizeMismatch {
                opcode: opcode.name.to_string(),
                slot_kind: "dest",
                slot,
                actual,
                expected: declared,
            });
            return;
        }
    }

    for (slot, &declared) in opcode.src_size.iter().enumerate() {
        if declared == 0 {
            continue;
        }
        let Some(var_id) = state.insns[i].src_args[slot] else {
            continue;
        };
        let var = state.vars.get(var_id);
        let is_broadcast = matches!(var.kind, VarKind::Const | VarKind::Param);

        if var.size != declared && !is_broadcast {
            state.set_error(CompileError::SizeMismatch {
                opcode: opcode.name.to_string(),
                slot_kind: "src",
                slot,
                actual: var.size,
                expected: declared,
            });
            return;
        }

        if opcode.flags.contains(OpcodeFlags::SCALAR) && slot >= 1 && !is_broadcast {
            state.set_error(CompileError::ScalarSourceRequired {
                opcode: opcode.name.to_string(),
            });
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Program;
    use crate::flags::Flags;
    use crate::instruction::{Instruction, StaticOpcode};
    use crate::result::CompileError;
    use crate::target::TargetFlags;
    use crate::variable::{Variable, VarKind};
    use std::rc::Rc;

    struct NullTarget;
    impl crate::target::Target for NullTarget {
        fn name(&self) -> &str {
            "null"
        }
        fn executable(&self) -> bool {
            false
        }
        fn data_register_offset(&self) -> u16 {
            64
        }
        fn default_flags(&self) -> TargetFlags {
            TargetFlags(0)
        }
        fn compiler_init(&self, _state: &mut CompilerState) {}
        fn find_rule(&self, _opcode_name: &str, _flags: TargetFlags) -> Option<&crate::instruction::Rule> {
            None
        }
        fn load_constant(&self, _state: &mut CompilerState, _reg: u16, _size: u8, _value: i32) {}
        fn compile(&self, _state: &mut CompilerState) -> Result<(), CompileError> {
            Ok(())
        }
    }

    fn state_for(program: &Program) -> CompilerState<'_> {
        CompilerState::new(program, &NULL_TARGET, TargetFlags(0), Flags::default())
    }

    static NULL_TARGET: NullTarget = NullTarget;

    #[test]
    fn size_mismatch_on_dest_is_caught() {
        let mut program = Program::new("p");
        let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
        let d1 = program.variables.push(Variable::new("D1", 2, VarKind::Dest));
        let opcode = Rc::new(StaticOpcode {
            name: "mov",
            dest_size: [4, 0],
            src_size: [4, 0, 0, 0],
            flags: OpcodeFlags::NONE,
        });
        program.instructions.push(Instruction::with_args(opcode, &[d1], &[s1]));

        let mut state = state_for(&program);
        validate(&mut state);
        assert!(matches!(state.error, Some(CompileError::SizeMismatch { .. })));
    }

    #[test]
    fn const_and_param_src_bypass_size_check() {
        let mut program = Program::new("p");
        let c1 = program.variables.push(Variable::with_value("C1", 1, VarKind::Const, 5));
        let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
        let opcode = Rc::new(StaticOpcode {
            name: "loadc",
            dest_size: [4, 0],
            src_size: [4, 0, 0, 0],
            flags: OpcodeFlags::NONE,
        });
        program.instructions.push(Instruction::with_args(opcode, &[d1], &[c1]));

        let mut state = state_for(&program);
        validate(&mut state);
        assert!(state.error.is_none());
    }

    #[test]
    fn scalar_opcode_rejects_non_const_param_second_src() {
        let mut program = Program::new("p");
        let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
        let s2 = program.variables.push(Variable::new("S2", 4, VarKind::Src));
        let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
        let opcode = Rc::new(StaticOpcode {
            name: "shiftl",
            dest_size: [4, 0],
            src_size: [4, 4, 0, 0],
            flags: OpcodeFlags::SCALAR,
        });
        program.instructions.push(Instruction::with_args(opcode, &[d1], &[s1, s2]));

        let mut state = state_for(&program);
        validate(&mut state);
        assert!(matches!(state.error, Some(CompileError::ScalarSourceRequired { .. })));
    }

    #[test]
    fn validator_stops_at_first_error() {
        let mut program = Program::new("p");
        let s1 = program.variables.push(Variable::new("S1", 2, VarKind::Src));
        let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
        let opcode = Rc::new(StaticOpcode {
            name: "addl",
            dest_size: [4, 0],
            src_size: [4, 4, 0, 0],
            flags: OpcodeFlags::NONE,
        });
        program.instructions.push(Instruction::with_args(opcode.clone(), &[d1], &[s1, s1]));
        program.instructions.push(Instruction::with_args(opcode, &[d1], &[s1, s1]));

        let mut state = state_for(&program);
        validate(&mut state);
        assert!(state.error.is_some());
    }
}
