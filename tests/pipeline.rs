//! Integration tests driving the public `compile_full` entry point
//! against a minimal mock target, covering the concrete scenarios
//! enumerated in spec.md §8.

use orc_compiler::{
    compile_full, CodeMemory, CodeRegion, CompileError, CompileResult, CompilerState, Instruction,
    OpcodeFlags, Program, Rule, StaticOpcode, Target, TargetFlags, VarKind, Variable,
    VecCodeMemory,
};
use std::cell::RefCell;
use std::rc::Rc;

mod mock {
    use super::*;

    /// A target that accepts every opcode and emits nothing beyond a
    /// one-byte marker per instruction. Enough register classes to
    /// exercise the allocators without ever exhausting them.
    pub struct MockTarget;

    impl Target for MockTarget {
        fn name(&self) -> &str {
            "mock"
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
        fn compiler_init(&self, state: &mut CompilerState) {
            for i in 0..16 {
                state.registers.set_valid(32 + i, true);
                state.registers.set_valid(64 + i, true);
            }
        }
        fn find_rule(&self, _opcode_name: &str, _flags: TargetFlags) -> Option<&Rule> {
            None
        }
        fn load_constant(&self, _state: &mut CompilerState, _reg: u16, _size: u8, _value: i32) {}
        fn compile(&self, state: &mut CompilerState) -> Result<(), CompileError> {
            for _ in &state.insns {
                state.append_code(".\n");
                state.codeptr += 1;
            }
            Ok(())
        }
    }

    /// A `MockTarget` that additionally binds every opcode name to a
    /// no-op rule, so the pipeline can reach backend `compile`. Reserves
    /// its code memory through a `VecCodeMemory` it owns (behind a
    /// `RefCell` since `allocate_codemem` only gets `&self`), then
    /// asserts that reservation happened before it emits anything.
    pub struct RuleBoundTarget {
        rule: Rule,
        mem: RefCell<VecCodeMemory>,
    }

    impl RuleBoundTarget {
        pub fn new() -> Self {
            RuleBoundTarget {
                rule: Rule {
                    name: "any",
                    emit: Box::new(|_state, _insn| {}),
                },
                mem: RefCell::new(VecCodeMemory::new()),
            }
        }
    }

    impl Target for RuleBoundTarget {
        fn name(&self) -> &str {
            "rule-bound-mock"
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
        fn compiler_init(&self, state: &mut CompilerState) {
            for i in 0..16 {
                state.registers.set_valid(32 + i, true);
                state.registers.set_valid(64 + i, true);
            }
        }
        fn find_rule(&self, _opcode_name: &str, _flags: TargetFlags) -> Option<&Rule> {
            Some(&self.rule)
        }
        fn load_constant(&self, _state: &mut CompilerState, _reg: u16, _size: u8, _value: i32) {}
        fn allocate_codemem(&self, state: &mut CompilerState) -> Result<CodeRegion, CompileError> {
            self.mem.borrow_mut().allocate(state.insns.len() * 4)
        }
        fn compile(&self, state: &mut CompilerState) -> Result<(), CompileError> {
            assert!(state.code_region.is_some(), "allocate_codemem must run before compile");
            for _ in &state.insns {
                state.append_code(".\n");
                state.codeptr += 1;
            }
            Ok(())
        }
    }

    pub fn binop(name: &'static str, flags: OpcodeFlags) -> Rc<StaticOpcode> {
        Rc::new(StaticOpcode {
            name,
            dest_size: [4, 0],
            src_size: [4, 4, 0, 0],
            flags,
        })
    }

    pub fn movop() -> Rc<StaticOpcode> {
        Rc::new(StaticOpcode {
            name: "mov",
            dest_size: [4, 0],
            src_size: [4, 0, 0, 0],
            flags: OpcodeFlags::NONE,
        })
    }
}

/// Scenario 1: minimal add compiles successfully.
#[test]
fn minimal_add_compiles_successfully() {
    let mut program = Program::new("minimal_add");
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let s2 = program.variables.push(Variable::new("S2", 4, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(
        mock::binop("addl", OpcodeFlags::NONE),
        &[d1],
        &[s1, s2],
    ));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_successful());
    assert_eq!(program.code_size, 1);
}

/// Code memory is reserved before the backend's `compile` step runs,
/// and a target's `VecCodeMemory`-backed `allocate_codemem` override is
/// actually consulted by the pipeline (see `RuleBoundTarget::compile`'s
/// own assertion that `state.code_region` is already populated).
#[test]
fn code_memory_is_allocated_before_backend_compile_runs() {
    let mut program = Program::new("code_memory");
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(mock::movop(), &[d1], &[s1]));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_successful());
}

/// Scenario 3: a size mismatch is a fatal parse error.
#[test]
fn size_mismatch_is_fatal() {
    let mut program = Program::new("size_mismatch");
    let s1 = program.variables.push(Variable::new("S1", 2, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(
        mock::binop("addl", OpcodeFlags::NONE),
        &[d1],
        &[s1, s1],
    ));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_fatal());
    assert!(matches!(
        result,
        CompileResult::ParseError(CompileError::SizeMismatch { .. })
    ));
}

/// Scenario 4: an opcode with no bound rule fails compilation without
/// being fatal (it's a compile-stage failure, not a semantic one).
#[test]
fn missing_rule_fails_without_being_fatal() {
    let mut program = Program::new("missing_rule");
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let s2 = program.variables.push(Variable::new("S2", 4, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(
        mock::binop("xyz", OpcodeFlags::NONE),
        &[d1],
        &[s1, s2],
    ));

    let target = mock::MockTarget;
    let result = compile_full(&mut program, &target, "");

    assert!(!result.is_successful());
    assert!(!result.is_fatal());
    assert!(matches!(
        result,
        CompileResult::CompileError(CompileError::NoRule { .. })
    ));
}

/// Scenario 6a: an ACCUMULATOR-flagged opcode writing a TEMP is a fatal
/// parse error.
#[test]
fn accumulator_opcode_to_temp_dest_is_fatal() {
    let mut program = Program::new("acc_to_temp");
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let s2 = program.variables.push(Variable::new("S2", 4, VarKind::Src));
    let t1 = program.variables.push(Variable::new("T1", 4, VarKind::Temp));
    program.instructions.push(Instruction::with_args(
        mock::binop("accaddl", OpcodeFlags::ACCUMULATOR),
        &[t1],
        &[s1, s2],
    ));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_fatal());
    assert!(matches!(
        result,
        CompileResult::ParseError(CompileError::AccumulatorToNonAccumulatorDest)
    ));
}

/// Scenario 6b: a non-ACCUMULATOR opcode writing an ACCUMULATOR is a
/// fatal parse error.
#[test]
fn non_accumulator_opcode_to_accumulator_dest_is_fatal() {
    let mut program = Program::new("nonacc_to_acc");
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let s2 = program.variables.push(Variable::new("S2", 4, VarKind::Src));
    let acc = program.variables.push(Variable::new("A1", 4, VarKind::Accumulator));
    program.instructions.push(Instruction::with_args(
        mock::binop("addl", OpcodeFlags::NONE),
        &[acc],
        &[s1, s2],
    ));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_fatal());
    assert!(matches!(
        result,
        CompileResult::ParseError(CompileError::NonAccumulatorToAccumulatorDest)
    ));
}

/// Scenario 7: a program with a backup function, compiled with the
/// "backup" flag set, is refused; the backup function stays installed
/// as `program.code`.
#[test]
fn backup_flag_refuses_program_and_keeps_backup_installed() {
    let mut program = Program::new("backup_refusal");
    program.backup_func = Some(0x1234);
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(mock::movop(), &[d1], &[s1]));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "backup");

    assert!(!result.is_successful());
    assert_eq!(result, CompileResult::CompileError(CompileError::BackupDisabled));
    assert_eq!(program.code, Some(0x1234));
}

/// Without the "backup" flag, a program carrying a backup function
/// compiles normally.
#[test]
fn without_backup_flag_program_with_backup_func_still_compiles() {
    let mut program = Program::new("backup_allowed");
    program.backup_func = Some(0x1234);
    let s1 = program.variables.push(Variable::new("S1", 4, VarKind::Src));
    let d1 = program.variables.push(Variable::new("D1", 4, VarKind::Dest));
    program.instructions.push(Instruction::with_args(mock::movop(), &[d1], &[s1]));

    let target = mock::RuleBoundTarget::new();
    let result = compile_full(&mut program, &target, "");

    assert!(result.is_successful());
}
