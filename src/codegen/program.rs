//! Top-level program code generation: the global-reservation pass, the
//! `START`/`STOP` bracket, and the subprogram-then-main emission order.
//!
//! Grounded in the teacher's `codegen::program` entry point (one function
//! that walks top-level declarations and stitches the other submodules
//! together), retargeted at the textual stack-VM's linear instruction
//! stream instead of an LLVM module.

use super::state::CodeGen;
use crate::ast::*;
use crate::error::CodegenError;
use crate::symtab::{AddressOrOffset, Callable, ConstantValue, ParamInfo, ScopeStack, Symbol, SymbolKind};
use crate::types::{ScalarType, Type};

/// Compile a checked program into the target VM's textual instruction format.
pub fn generate(program: &Program) -> Result<String, CodegenError> {
    let mut cg = CodeGen::new();
    cg.emit_program(program)?;
    Ok(cg.into_output())
}

enum Subprogram<'a> {
    Function(&'a FunctionDeclaration),
    Procedure(&'a ProcedureDeclaration),
}

impl CodeGen {
    fn emit_program(&mut self, program: &Program) -> Result<(), CodegenError> {
        self.emit_globals_pass(&program.block.declarations)?;
        self.emit("START")?;
        self.register_constants(&program.block.declarations);
        self.emit_subprograms(&program.block.declarations)?;
        self.emit_statement(&program.block.compound_statement)?;
        self.emit("STOP")
    }

    /// Walk top-level `var` declarations before `START`, allocating GP
    /// offsets and emitting the reservation instructions in source order
    /// (§4.6 "Top-level emission order", step 1).
    fn emit_globals_pass(&mut self, declarations: &[Declaration]) -> Result<(), CodegenError> {
        for decl in declarations {
            if let Declaration::Variable(v) = decl {
                for group in &v.variable_list {
                    let count = element_count(&group.var_type)?;
                    for id in &group.id_list {
                        let offset = self.reserve_local(count)?;
                        self.scopes.define(variable_symbol(id, &group.var_type, offset, 0));
                        self.reserved_globals.insert(id.to_lowercase());
                    }
                }
            }
        }
        Ok(())
    }

    fn register_constants(&mut self, declarations: &[Declaration]) {
        for decl in declarations {
            if let Declaration::Constant(c) = decl {
                let (sym_type, value) = constant_type_and_value(c);
                let level = self.scopes.current_scope_level();
                self.scopes.define(Symbol {
                    name: c.name.clone(),
                    sym_type,
                    kind: SymbolKind::Constant,
                    address_or_offset: AddressOrOffset::Constant(value),
                    scope_level: level,
                    params_info: Vec::new(),
                    return_type: None,
                    is_var_param: false,
                    is_array: false,
                    array_lower_bound: None,
                    array_element_count: None,
                    array_element_type: None,
                });
            }
        }
    }

    fn register_local_variable_decls(&mut self, declarations: &[Declaration]) -> Result<(), CodegenError> {
        for decl in declarations {
            if let Declaration::Variable(v) = decl {
                for group in &v.variable_list {
                    let count = element_count(&group.var_type)?;
                    for id in &group.id_list {
                        let offset = self.reserve_local(count)?;
                        let level = self.scopes.current_scope_level();
                        self.scopes.define(variable_symbol(id, &group.var_type, offset, level));
                    }
                }
            }
        }
        Ok(())
    }

    /// Emit every function/procedure declared in `declarations` under its
    /// own label, preceded by a single `JUMP` that skips the whole block
    /// (§4.6 step 3: "before walking function/procedure bodies emit a
    /// `JUMP mainLabel_N` to skip over nested subprogram code").
    fn emit_subprograms(&mut self, declarations: &[Declaration]) -> Result<(), CodegenError> {
        let subprograms: Vec<Subprogram> = declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(Subprogram::Function(f)),
                Declaration::Procedure(p) => Some(Subprogram::Procedure(p)),
                _ => None,
            })
            .collect();
        if subprograms.is_empty() {
            return Ok(());
        }
        let main_label = self.fresh_label("mainLabel_");
        self.emit(format!("JUMP {main_label}"))?;
        for sub in &subprograms {
            match sub {
                Subprogram::Function(f) => self.emit_function(f)?,
                Subprogram::Procedure(p) => self.emit_procedure(p)?,
            }
        }
        self.emit_label(&main_label)
    }

    fn emit_function(&mut self, f: &FunctionDeclaration) -> Result<(), CodegenError> {
        let label = self.fresh_label(&format!("func{}", f.name.to_lowercase()));
        let enclosing_level = self.scopes.current_scope_level();
        self.scopes.define(Symbol {
            name: f.name.clone(),
            sym_type: f.return_type.clone(),
            kind: SymbolKind::Function,
            address_or_offset: AddressOrOffset::Callable(Callable::User(label.clone())),
            scope_level: enclosing_level,
            params_info: params_info_from(&f.parameter_list),
            return_type: Some(f.return_type.clone()),
            is_var_param: false,
            is_array: false,
            array_lower_bound: None,
            array_element_count: None,
            array_element_type: None,
        });

        self.emit_label(&label)?;
        // A manual push/pop, not `ScopeGuard`: `ScopeGuard` ties up an
        // exclusive borrow of `self.scopes` for its lifetime, which
        // conflicts with calling other `&mut self` methods (`emit`,
        // `reserve_local`) while it's alive. Codegen's scope stack is
        // throwaway on error (the partially built `CodeGen` is discarded,
        // never reused), so the restore-on-`?` guarantee `ScopeGuard`
        // gives the checker isn't needed here.
        self.scopes.push(format!("func_{}", f.name.to_lowercase()));
        self.current_function_stack.push(f.name.clone());
        let result = self.emit_function_body(f);
        self.current_function_stack.pop();
        self.scopes.pop();
        result?;
        self.emit("RETURN")
    }

    fn emit_function_body(&mut self, f: &FunctionDeclaration) -> Result<(), CodegenError> {
        define_parameters(&mut self.scopes, &f.parameter_list);
        self.register_local_variable_decls(&f.block.declarations)?;
        let return_offset = self.reserve_local(1)?;
        let level = self.scopes.current_scope_level();
        self.scopes
            .define(Symbol::variable(f.name.clone(), f.return_type.clone(), return_offset, level));
        self.register_constants(&f.block.declarations);
        self.emit_subprograms(&f.block.declarations)?;
        self.emit_statement(&f.block.compound_statement)
    }

    fn emit_procedure(&mut self, p: &ProcedureDeclaration) -> Result<(), CodegenError> {
        let label = self.fresh_label(&format!("proc{}", p.name.to_lowercase()));
        let enclosing_level = self.scopes.current_scope_level();
        self.scopes.define(Symbol {
            name: p.name.clone(),
            sym_type: Type::Scalar(ScalarType::Integer),
            kind: SymbolKind::Procedure,
            address_or_offset: AddressOrOffset::Callable(Callable::User(label.clone())),
            scope_level: enclosing_level,
            params_info: params_info_from(&p.parameter_list),
            return_type: None,
            is_var_param: false,
            is_array: false,
            array_lower_bound: None,
            array_element_count: None,
            array_element_type: None,
        });

        self.emit_label(&label)?;
        self.scopes.push(format!("proc_{}", p.name.to_lowercase()));
        let result = self.emit_procedure_body(p);
        self.scopes.pop();
        result?;
        self.emit("RETURN")
    }

    fn emit_procedure_body(&mut self, p: &ProcedureDeclaration) -> Result<(), CodegenError> {
        define_parameters(&mut self.scopes, &p.parameter_list);
        self.register_local_variable_decls(&p.block.declarations)?;
        self.register_constants(&p.block.declarations);
        self.emit_subprograms(&p.block.declarations)?;
        self.emit_statement(&p.block.compound_statement)
    }
}

fn element_count(var_type: &Type) -> Result<i64, CodegenError> {
    match var_type {
        Type::Array(arr) => arr.element_count().map_err(CodegenError::Logic),
        _ => Ok(1),
    }
}

fn variable_symbol(name: &str, var_type: &Type, offset: i64, scope_level: usize) -> Symbol {
    let mut symbol = Symbol::variable(name, var_type.clone(), offset, scope_level);
    if let Type::Array(arr) = var_type {
        symbol.is_array = true;
        symbol.array_lower_bound = Some(arr.lower_bound);
        symbol.array_element_count = arr.element_count().ok();
        symbol.array_element_type = Some(arr.element_type.clone());
    }
    symbol
}

fn constant_type_and_value(decl: &ConstantDeclaration) -> (Type, ConstantValue) {
    match &decl.value {
        Literal::Integer(n) => (Type::Scalar(ScalarType::Integer), ConstantValue::Integer(*n)),
        Literal::Real(x) => (Type::Scalar(ScalarType::Real), ConstantValue::Real(*x)),
        Literal::Str(s) => (Type::Scalar(ScalarType::String), ConstantValue::Str(s.clone())),
        Literal::Boolean(b) => (Type::Scalar(ScalarType::Boolean), ConstantValue::Boolean(*b)),
    }
}

fn params_info_from(parameter_list: &[Parameter]) -> Vec<ParamInfo> {
    parameter_list
        .iter()
        .flat_map(|p| {
            p.id_list
                .iter()
                .map(|_| ParamInfo { param_type: p.param_type.clone(), is_var: p.is_var })
        })
        .collect()
}

fn define_parameters(stack: &mut ScopeStack, parameter_list: &[Parameter]) {
    for param in parameter_list.iter().rev() {
        for id in param.id_list.iter().rev() {
            let offset = stack.allocate_param();
            let level = stack.current_scope_level();
            stack.define(Symbol::parameter(id.clone(), param.param_type.clone(), offset, level, param.is_var));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn compile(src: &str) -> String {
        let program = parser::parse(src).expect("parse");
        generate(&program).expect("codegen")
    }

    #[test]
    fn hello_world_brackets_start_and_stop_around_a_single_writeln() {
        let out = compile("program hello; begin writeln('Hello, world!'); end.");
        assert!(out.trim_start().starts_with("START"));
        assert!(out.trim_end().ends_with("STOP"));
        assert!(out.contains("PUSHS \"Hello, world!\""));
        assert!(out.contains("WRITELN"));
    }

    #[test]
    fn global_variable_assignment_reserves_and_stores_to_gp_offset() {
        let out = compile("program p; var x: integer; begin x := 42; end.");
        assert!(out.contains("PUSHI 0"));
        assert!(out.contains("PUSHI 42"));
        assert!(out.contains("STOREG 0"));
    }

    #[test]
    fn procedure_emits_its_own_label_and_return_before_main_label() {
        let out = compile("program p; procedure p; begin writeln('hi'); end; begin p; end.");
        assert!(out.contains("JUMP mainLabel_"));
        assert!(out.contains("RETURN"));
        assert!(out.contains("mainLabel_"));
        let jump_pos = out.find("JUMP mainLabel_").unwrap();
        let return_pos = out.find("RETURN").unwrap();
        assert!(jump_pos < return_pos);
    }

    #[test]
    fn program_without_subprograms_emits_no_jump_or_main_label() {
        let out = compile("program p; begin writeln('hi'); end.");
        assert!(!out.contains("mainLabel_"));
    }
}
