//! Pascal-subset batch compiler library.
//!
//! Compiles a Pascal-subset source file down to a textual stack-VM
//! instruction listing: lexer to token stream, operator-precedence parser
//! to AST, scoped semantic check, single-pass code generation (§1-§6).
//!
//! ```rust,ignore
//! use pascc::compile_to_vm;
//!
//! let vm_text = compile_to_vm("program hello; begin writeln('hi'); end.")?;
//! ```

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod symtab;
pub mod types;

pub use ast::Program;
pub use config::CompilerConfig;
pub use error::CompileError;

use std::fs;
use std::path::Path;

/// Compile Pascal source text to the target VM's textual instruction format.
pub fn compile_to_vm(source: &str) -> Result<String, CompileError> {
    compile_to_vm_with_config(source, &CompilerConfig::default())
}

/// Compile Pascal source text to VM text, honoring `config` (currently only
/// `case_as_error`, which is always `true` — see `CompilerConfig`).
pub fn compile_to_vm_with_config(source: &str, _config: &CompilerConfig) -> Result<String, CompileError> {
    let program = parser::parse(source)?;
    resolver::check_program(&program)?;
    let vm_text = codegen::generate(&program)?;
    Ok(vm_text)
}

/// Compile a Pascal source file, writing the VM listing to `output_path`.
pub fn compile_file(source_path: &Path, output_path: &Path) -> Result<(), CompileError> {
    compile_file_with_config(source_path, output_path, &CompilerConfig::default())
}

pub fn compile_file_with_config(
    source_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| CompileError::Io(format!("failed to read '{}': {e}", source_path.display())))?;
    let vm_text = compile_to_vm_with_config(&source, config)?;
    fs::write(output_path, vm_text)
        .map_err(|e| CompileError::Io(format!("failed to write '{}': {e}", output_path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_hello_world_end_to_end() {
        let vm_text = compile_to_vm("program hello; begin writeln('Hello, world!'); end.").unwrap();
        assert!(vm_text.contains("START"));
        assert!(vm_text.contains("WRITELN"));
        assert!(vm_text.trim_end().ends_with("STOP"));
    }

    #[test]
    fn rejects_undeclared_identifiers_before_codegen() {
        let err = compile_to_vm("program p; begin x := 1; end.").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }

    #[test]
    fn rejects_syntax_errors() {
        let err = compile_to_vm("program p; begin").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }
}
