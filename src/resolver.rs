//! Semantic checker: identifier resolution, redefinition, and arity checks.
//!
//! Grounded in `anasem.py`'s `semantic_check` dispatch tree, restructured as
//! a set of free functions threading an explicit `&mut ScopeStack` (rather
//! than a global mutable "current scope" pointer), with scope push/pop via
//! `ScopeGuard` per the redesign note in SPEC_FULL.md §9.

use crate::ast::*;
use crate::error::SemanticError;
use crate::symtab::{AddressOrOffset, Callable, ParamInfo, Scope, ScopeGuard, ScopeStack, Symbol, SymbolKind};
use crate::types::Type;

/// Run the semantic checker over a whole program. Never mutates the AST;
/// failures are reported as the first violation encountered in declaration
/// and statement order, matching the source's single-pass behavior.
pub fn check_program(program: &Program) -> Result<(), SemanticError> {
    let mut stack = ScopeStack::new();
    check_block(&mut stack, &program.block, None)
}

fn check_block(
    stack: &mut ScopeStack,
    block: &Block,
    owning_function: Option<(&str, &Type)>,
) -> Result<(), SemanticError> {
    for decl in &block.declarations {
        match decl {
            Declaration::Variable(v) => register_variable_decl(stack, v)?,
            Declaration::Constant(c) => register_constant_decl(stack, c)?,
            // Type declarations are stored by the parser but not needed by
            // the checker: array/record structure is already resolved at the
            // use site via the Type carried directly on each declaration.
            Declaration::Type(_) => {}
            Declaration::Function(_) | Declaration::Procedure(_) => {}
        }
    }

    if let Some((name, return_type)) = owning_function {
        if stack.current().symbols.contains_key(&name.to_lowercase()) {
            return Err(SemanticError::new(format!(
                "Identifier '{name}' already declared."
            )));
        }
        let offset = stack.allocate_local(1);
        let level = stack.current_scope_level();
        stack.define(Symbol::variable(name, return_type.clone(), offset, level));
    }

    for decl in &block.declarations {
        match decl {
            Declaration::Function(f) => check_function(stack, f)?,
            Declaration::Procedure(p) => check_procedure(stack, p)?,
            _ => {}
        }
    }

    check_statement(stack, &block.compound_statement)
}

fn register_variable_decl(stack: &mut ScopeStack, decl: &VariableDeclaration) -> Result<(), SemanticError> {
    for group in &decl.variable_list {
        let count = match &group.var_type {
            Type::Array(arr) => arr.element_count().map_err(SemanticError::new)?,
            _ => 1,
        };
        for id in &group.id_list {
            check_not_already_declared(stack.current(), id)?;
            let offset = stack.allocate_local(count);
            let level = stack.current_scope_level();
            let mut symbol = Symbol::variable(id.clone(), group.var_type.clone(), offset, level);
            if let Type::Array(arr) = &group.var_type {
                symbol.is_array = true;
                symbol.array_lower_bound = Some(arr.lower_bound);
                symbol.array_element_count = Some(count);
                symbol.array_element_type = Some(arr.element_type.clone());
            }
            stack.define(symbol);
        }
    }
    Ok(())
}

fn register_constant_decl(stack: &mut ScopeStack, decl: &ConstantDeclaration) -> Result<(), SemanticError> {
    check_not_already_declared(stack.current(), &decl.name)?;
    let (sym_type, value) = match &decl.value {
        Literal::Integer(n) => (
            Type::Scalar(crate::types::ScalarType::Integer),
            crate::symtab::ConstantValue::Integer(*n),
        ),
        Literal::Real(x) => (
            Type::Scalar(crate::types::ScalarType::Real),
            crate::symtab::ConstantValue::Real(*x),
        ),
        Literal::Str(s) => (
            Type::Scalar(crate::types::ScalarType::String),
            crate::symtab::ConstantValue::Str(s.clone()),
        ),
        Literal::Boolean(b) => (
            Type::Scalar(crate::types::ScalarType::Boolean),
            crate::symtab::ConstantValue::Boolean(*b),
        ),
    };
    let level = stack.current_scope_level();
    stack.define(Symbol {
        name: decl.name.clone(),
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
    Ok(())
}

fn check_not_already_declared(scope: &Scope, name: &str) -> Result<(), SemanticError> {
    if scope.symbols.contains_key(&name.to_lowercase()) {
        return Err(SemanticError::new(format!("Identifier '{name}' already declared.")));
    }
    Ok(())
}

fn params_info_from(parameter_list: &[Parameter]) -> Vec<ParamInfo> {
    parameter_list
        .iter()
        .flat_map(|p| {
            p.id_list.iter().map(|_| ParamInfo {
                param_type: p.param_type.clone(),
                is_var: p.is_var,
            })
        })
        .collect()
}

fn define_parameters(stack: &mut ScopeStack, parameter_list: &[Parameter]) -> Result<(), SemanticError> {
    // Allocated last group to first, last identifier to first, so the
    // leftmost parameter ends up at the most negative offset (§4.3).
    for param in parameter_list.iter().rev() {
        for id in param.id_list.iter().rev() {
            check_not_already_declared(stack.current(), id)?;
            let offset = stack.allocate_param();
            let level = stack.current_scope_level();
            stack.define(Symbol::parameter(id.clone(), param.param_type.clone(), offset, level, param.is_var));
        }
    }
    Ok(())
}

fn check_function(stack: &mut ScopeStack, f: &FunctionDeclaration) -> Result<(), SemanticError> {
    check_not_already_declared(stack.current(), &f.name)?;
    let params_info = params_info_from(&f.parameter_list);
    let level = stack.current_scope_level();
    stack.define(Symbol {
        name: f.name.clone(),
        sym_type: f.return_type.clone(),
        kind: SymbolKind::Function,
        address_or_offset: AddressOrOffset::Callable(Callable::User(f.name.to_lowercase())),
        scope_level: level,
        params_info,
        return_type: Some(f.return_type.clone()),
        is_var_param: false,
        is_array: false,
        array_lower_bound: None,
        array_element_count: None,
        array_element_type: None,
    });

    let mut guard = ScopeGuard::enter(stack, format!("func_{}", f.name.to_lowercase()));
    define_parameters(guard.stack(), &f.parameter_list)?;
    check_block(guard.stack(), &f.block, Some((&f.name, &f.return_type)))
}

fn check_procedure(stack: &mut ScopeStack, p: &ProcedureDeclaration) -> Result<(), SemanticError> {
    check_not_already_declared(stack.current(), &p.name)?;
    let params_info = params_info_from(&p.parameter_list);
    let level = stack.current_scope_level();
    stack.define(Symbol {
        name: p.name.clone(),
        sym_type: Type::Scalar(crate::types::ScalarType::Integer),
        kind: SymbolKind::Procedure,
        address_or_offset: AddressOrOffset::Callable(Callable::User(p.name.to_lowercase())),
        scope_level: level,
        params_info,
        return_type: None,
        is_var_param: false,
        is_array: false,
        array_lower_bound: None,
        array_element_count: None,
        array_element_type: None,
    });

    let mut guard = ScopeGuard::enter(stack, format!("proc_{}", p.name.to_lowercase()));
    define_parameters(guard.stack(), &p.parameter_list)?;
    check_block(guard.stack(), &p.block, None)
}

fn check_statement(stack: &mut ScopeStack, statement: &Statement) -> Result<(), SemanticError> {
    match statement {
        Statement::Assignment { variable, expression, .. } => {
            check_expression(stack, variable)?;
            check_expression(stack, expression)
        }
        Statement::Compound(statements) => {
            for s in statements {
                check_statement(stack, s)?;
            }
            Ok(())
        }
        Statement::If { condition, then_statement, else_statement } => {
            check_expression(stack, condition)?;
            check_statement(stack, then_statement)?;
            if let Some(else_s) = else_statement {
                check_statement(stack, else_s)?;
            }
            Ok(())
        }
        Statement::While { condition, statement } => {
            check_expression(stack, condition)?;
            check_statement(stack, statement)
        }
        Statement::Repeat { statement_list, condition } => {
            for s in statement_list {
                check_statement(stack, s)?;
            }
            check_expression(stack, condition)
        }
        Statement::For { control_variable, start_expression, end_expression, statement, .. } => {
            check_for_control_variable(stack, control_variable)?;
            check_expression(stack, start_expression)?;
            check_expression(stack, end_expression)?;
            check_statement(stack, statement)
        }
        Statement::Case { .. } => Ok(()),
        Statement::IOCall { arguments, .. } => {
            for arg in arguments {
                check_expression(stack, arg)?;
            }
            Ok(())
        }
        Statement::Call(call) => check_call(stack, call),
        Statement::Empty => Ok(()),
    }
}

fn check_for_control_variable(stack: &ScopeStack, expr: &Expression) -> Result<(), SemanticError> {
    let Expression::Identifier { name, line } = expr else {
        return Err(SemanticError::new("FOR control variable must be a simple identifier."));
    };
    let symbol = stack
        .resolve(name)
        .ok_or_else(|| SemanticError::new(format!("Identifier '{name}' not declared (line {line}).")))?;
    if symbol.is_var_param {
        return Err(SemanticError::new(format!(
            "FOR control variable '{name}' cannot be a VAR parameter."
        )));
    }
    if symbol.is_array {
        return Err(SemanticError::new(format!(
            "FOR control variable '{name}' must be scalar, not an array."
        )));
    }
    Ok(())
}

fn check_expression(stack: &ScopeStack, expr: &Expression) -> Result<(), SemanticError> {
    match expr {
        Expression::Literal(_) => Ok(()),
        Expression::Identifier { name, line } => {
            stack
                .resolve(name)
                .map(|_| ())
                .ok_or_else(|| SemanticError::new(format!("Identifier '{name}' not declared (line {line}).")))
        }
        Expression::BinaryOperation { left, right, .. } => {
            check_expression(stack, left)?;
            check_expression(stack, right)
        }
        Expression::UnaryOperation { operand, .. } => check_expression(stack, operand),
        Expression::ArrayAccess { array, index } => {
            check_expression(stack, array)?;
            check_expression(stack, index)
        }
        Expression::FieldAccess { record, .. } => check_expression(stack, record),
        Expression::Call(call) => check_call(stack, call),
    }
}

fn check_call(stack: &ScopeStack, call: &FunctionCall) -> Result<(), SemanticError> {
    let symbol = stack.resolve(&call.name).ok_or_else(|| {
        SemanticError::new(format!("Function '{}' not declared (line {}).", call.name, call.line))
    })?;
    let is_callable = matches!(symbol.kind, SymbolKind::Function | SymbolKind::Procedure);
    if !is_callable {
        return Err(SemanticError::new(format!(
            "'{}' is not a function or procedure.",
            call.name
        )));
    }
    let is_variadic = matches!(
        symbol.address_or_offset,
        AddressOrOffset::Callable(Callable::Builtin(k)) if k.is_variadic()
    );
    if !is_variadic && call.arguments.len() != symbol.params_info.len() {
        return Err(SemanticError::new(format!(
            "'{}' expects {} argument(s), got {} (line {}).",
            call.name,
            symbol.params_info.len(),
            call.arguments.len(),
            call.line
        )));
    }
    for arg in &call.arguments {
        check_expression(stack, arg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check(src: &str) -> Result<(), SemanticError> {
        let program = parse(src).expect("fixture parses");
        check_program(&program)
    }

    #[test]
    fn accepts_hello_world() {
        assert!(check("program Hello; begin writeln('hi') end.").is_ok());
    }

    #[test]
    fn rejects_undeclared_identifier() {
        let err = check("program P; begin x := 1 end.").unwrap_err();
        assert!(err.message.contains("not declared"));
    }

    #[test]
    fn rejects_redeclaration_in_same_scope() {
        let err = check("program P; var x: integer; var x: real; begin end.").unwrap_err();
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let err = check(
            "program P; procedure p(x: integer); begin end; begin p(1, 2) end.",
        )
        .unwrap_err();
        assert!(err.message.contains("expects"));
    }

    #[test]
    fn accepts_var_parameter_call_with_variable_argument() {
        assert!(check(
            "program P; var g: integer; procedure p(var x: integer); begin x := 5 end; begin p(g) end.",
        )
        .is_ok());
    }

    #[test]
    fn function_return_variable_is_implicitly_declared() {
        assert!(check(
            "program P; function f: integer; begin f := 1 end; var y: integer; begin y := f() end.",
        )
        .is_ok());
    }

    #[test]
    fn rejects_var_parameter_as_for_loop_control_variable() {
        let err = check(
            "program P; procedure p(var i: integer); begin for i := 1 to 3 do begin end end; begin end.",
        )
        .unwrap_err();
        assert!(err.message.contains("VAR parameter"));
    }

    #[test]
    fn builtins_resolve_without_declaration() {
        assert!(check("program P; begin writeln(length('hi')) end.").is_ok());
    }
}
