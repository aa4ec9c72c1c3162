//! Code generator state and core emission helpers.
//!
//! Grounded in the teacher's `codegen::state::CodeGen` shape: a flat struct
//! with `pub(super)` fields, an `output: String` accumulator, and small
//! counters for unique labels/temporaries (teacher's `temp_counter`,
//! `block_counter`).

use crate::error::CodegenError;
use crate::symtab::ScopeStack;
use std::collections::HashSet;
use std::fmt::Write as _;

pub struct CodeGen {
    pub(super) output: String,
    pub(super) scopes: ScopeStack,
    pub(super) label_counter: usize,
    /// Names of enclosing user functions, innermost last, used to detect
    /// assignment to the implicit function-return variable.
    pub(super) current_function_stack: Vec<String>,
    /// Lowercased names of top-level globals already reserved in the
    /// pre-`START` pass, so the post-`START` declaration walk skips them.
    pub(super) reserved_globals: HashSet<String>,
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            output: String::new(),
            scopes: ScopeStack::new(),
            label_counter: 0,
            current_function_stack: Vec::new(),
            reserved_globals: HashSet::new(),
        }
    }

    pub(super) fn into_output(self) -> String {
        self.output
    }

    pub(super) fn emit(&mut self, instruction: impl std::fmt::Display) -> Result<(), CodegenError> {
        writeln!(self.output, "    {instruction}")?;
        Ok(())
    }

    pub(super) fn emit_label(&mut self, label: &str) -> Result<(), CodegenError> {
        writeln!(self.output, "{label}:")?;
        Ok(())
    }

    pub(super) fn fresh_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{prefix}{}", self.label_counter)
    }

    /// Allocate a local slot and immediately emit the instruction that
    /// physically reserves it on the stack (a dummy push for a scalar, a
    /// block of zero slots for an array). Used both for genuine `var`
    /// declarations and for ad hoc temporaries introduced by statement
    /// codegen (FOR loop bounds, array-assignment staging).
    pub(super) fn reserve_local(&mut self, count: i64) -> Result<i64, CodegenError> {
        let offset = self.scopes.allocate_local(count);
        if count == 1 {
            self.emit("PUSHI 0")?;
        } else {
            self.emit(format!("PUSHN {count}"))?;
        }
        Ok(offset)
    }

    pub(super) fn current_function(&self) -> Option<&str> {
        self.current_function_stack.last().map(|s| s.as_str())
    }
}
