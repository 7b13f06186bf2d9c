//! Bind each instruction to a backend rule by opcode and target flags.
//!
//! Grounded on `orc_compiler_assign_rules` in `orccompiler.c`.

use crate::compiler::CompilerState;
use crate::result::CompileError;

/// For each instruction, look up a rule by opcode name under the
/// current target flags; a missing rule is a fatal `UNKNOWN_COMPILE`
/// error. Runs after the validator, so every instruction here is
/// already known to have well-sized operands.
pub fn bind_rules(state: &mut CompilerState) {
    for i in 0..state.insns.len() {
        if state.has_error() {
            return;
        }

        let opcode_name = state.insns[i].opcode.name;
        let target = state.target;
        let target_flags = state.target_flags;

        match target.find_rule(opcode_name, target_flags) {
            Some(rule) => {
                state.insns[i].rule_name = Some(rule.name);
            }
            None => {
                let target_name = target.name().to_string();
                state.set_error(CompileError::NoRule {
                    opcode: opcode_name.to_string(),
                    target: target_name,
                });
                return;
            }
        }
    }
}
