//! Compile-time configuration flags.
//!
//! Grounded on `orccompiler.c`'s `_orc_compiler_init`/
//! `orc_compiler_flag_check`: split a single comma-separated string
//! once, answer "is flag X set?" for the well-known flags. Unlike the
//! original, this is instance data constructed per compile rather than
//! a process-global cache (see SPEC_FULL.md §5) — nothing else in this
//! crate assumes single-instance-per-process behavior, so a global
//! would only add a footgun.

/// Parsed configuration flags for one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    backup: bool,
    debug: bool,
}

impl Flags {
    /// Parse a comma-separated flag string (e.g. `"backup,debug"`).
    /// An empty string yields all flags unset.
    pub fn parse(cfg: &str) -> Self {
        let mut flags = Flags::default();
        for token in cfg.split(',') {
            match token.trim() {
                "backup" => flags.backup = true,
                "debug" => flags.debug = true,
                "" => {}
                other => log::trace!("ignoring unknown compiler flag {:?}", other),
            }
        }
        flags
    }

    /// Whether the "backup" flag is set: compilation of programs that
    /// carry a pre-supplied native function is refused.
    pub fn backup(&self) -> bool {
        self.backup
    }

    /// Whether the "debug" flag is set: enables verbose logging.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// spec.md §4.1's cross-cutting rule: refuse compilation when the
    /// "backup" flag is set and the program carries a backup function.
    pub fn refuses_backup_program(&self, program_has_backup: bool) -> bool {
        self.backup && program_has_backup
    }
}
