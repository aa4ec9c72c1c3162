//! Expression code generation: value emission, type-directed instruction
//! selection, and built-in expansion.
//!
//! Grounded in the expression-emission shape of the teacher's
//! `codegen/mod.rs` visitor (one function per AST node kind, matching on
//! node tag), generalized to the target VM's textual instruction set
//! instead of LLVM IR.

use super::state::CodeGen;
use crate::ast::{Expression, FunctionCall, Literal};
use crate::builtins::BuiltinKind;
use crate::error::CodegenError;
use crate::symtab::{AddressOrOffset, Callable, ParamInfo, Symbol};
use crate::types::{ScalarType, Type};

impl CodeGen {
    /// Resolve types on demand; there is no separate typed-AST pass (§4.5).
    pub(super) fn determine_expression_type(&self, expr: &Expression) -> Type {
        match expr {
            Expression::Literal(Literal::Integer(_)) => Type::Scalar(ScalarType::Integer),
            Expression::Literal(Literal::Real(_)) => Type::Scalar(ScalarType::Real),
            Expression::Literal(Literal::Str(_)) => Type::Scalar(ScalarType::String),
            Expression::Literal(Literal::Boolean(_)) => Type::Scalar(ScalarType::Boolean),
            Expression::Identifier { name, .. } => self
                .scopes
                .resolve(name)
                .map(|s| s.sym_type.clone())
                .unwrap_or(Type::Scalar(ScalarType::Integer)),
            Expression::Call(call) => self
                .scopes
                .resolve(&call.name)
                .and_then(|s| s.return_type.clone())
                .unwrap_or(Type::Scalar(ScalarType::Integer)),
            Expression::BinaryOperation { operator, left, right } => {
                if operator == "/" {
                    return Type::Scalar(ScalarType::Real);
                }
                let lt = self.determine_expression_type(left);
                let rt = self.determine_expression_type(right);
                if is_real_type(&lt) || is_real_type(&rt) {
                    Type::Scalar(ScalarType::Real)
                } else {
                    Type::Scalar(ScalarType::Integer)
                }
            }
            Expression::UnaryOperation { operand, .. } => self.determine_expression_type(operand),
            Expression::ArrayAccess { array, .. } => match array.as_ref() {
                Expression::Identifier { name, .. } => self
                    .scopes
                    .resolve(name)
                    .and_then(|s| s.array_element_type.clone())
                    .unwrap_or(Type::Scalar(ScalarType::Integer)),
                _ => Type::Scalar(ScalarType::Integer),
            },
            Expression::FieldAccess { .. } => Type::Scalar(ScalarType::Integer),
        }
    }

    /// Evaluate an expression, leaving exactly one value on the stack.
    pub(super) fn emit_expression(&mut self, expr: &Expression) -> Result<(), CodegenError> {
        match expr {
            Expression::Literal(lit) => self.emit_literal(lit),
            Expression::Identifier { name, line } => self.emit_identifier_value(name, *line),
            Expression::BinaryOperation { operator, left, right } => {
                self.emit_binary_operation(operator, left, right)
            }
            Expression::UnaryOperation { operator, operand } => self.emit_unary_operation(operator, operand),
            Expression::ArrayAccess { array, index } => self.emit_array_access(array, index),
            Expression::FieldAccess { .. } => {
                self.output.push_str("    // FieldAccess not implemented\n");
                Ok(())
            }
            Expression::Call(call) => self.emit_call_expression(call),
        }
    }

    fn emit_literal(&mut self, lit: &Literal) -> Result<(), CodegenError> {
        match lit {
            Literal::Integer(n) => self.emit(format!("PUSHI {n}")),
            Literal::Real(x) => self.emit(format!("PUSHF {x}")),
            Literal::Str(s) => self.emit(format!("PUSHS \"{s}\"")),
            Literal::Boolean(b) => self.emit(format!("PUSHI {}", if *b { 1 } else { 0 })),
        }
    }

    pub(super) fn resolve_or_err(&self, name: &str, line: usize) -> Result<Symbol, CodegenError> {
        self.scopes
            .resolve(name)
            .cloned()
            .ok_or_else(|| CodegenError::Logic(format!("'{name}' not declared (line {line})")))
    }

    fn emit_identifier_value(&mut self, name: &str, line: usize) -> Result<(), CodegenError> {
        let symbol = self.resolve_or_err(name, line)?;
        let is_global = symbol.scope_level == 0;
        match &symbol.address_or_offset {
            AddressOrOffset::Constant(value) => self.emit_constant_value(value),
            AddressOrOffset::Offset(offset) => {
                if symbol.is_array {
                    self.emit(if is_global { "PUSHGP" } else { "PUSHFP" })?;
                    self.emit(format!("PUSHI {offset}"))?;
                    self.emit("PADD")
                } else if symbol.is_var_param {
                    self.emit(format!("PUSHL {offset}"))
                } else if is_global {
                    self.emit(format!("PUSHG {offset}"))
                } else {
                    self.emit(format!("PUSHL {offset}"))
                }
            }
            AddressOrOffset::Callable(_) => {
                Err(CodegenError::Logic(format!("'{name}' is callable, not a value")))
            }
        }
    }

    fn emit_constant_value(&mut self, value: &crate::symtab::ConstantValue) -> Result<(), CodegenError> {
        use crate::symtab::ConstantValue::*;
        match value {
            Integer(n) => self.emit(format!("PUSHI {n}")),
            Real(x) => self.emit(format!("PUSHF {x}")),
            Str(s) => self.emit(format!("PUSHS \"{s}\"")),
            Boolean(b) => self.emit(format!("PUSHI {}", if *b { 1 } else { 0 })),
        }
    }

    /// Push the *address* of an lvalue rather than its value, for VAR
    /// parameter passing and array-element assignment targets.
    pub(super) fn emit_lvalue_address(&mut self, expr: &Expression) -> Result<(), CodegenError> {
        match expr {
            Expression::Identifier { name, line } => {
                let symbol = self.resolve_or_err(name, *line)?;
                let is_global = symbol.scope_level == 0;
                match &symbol.address_or_offset {
                    AddressOrOffset::Offset(offset) if symbol.is_var_param => {
                        self.emit(format!("PUSHL {offset}"))
                    }
                    AddressOrOffset::Offset(offset) => {
                        self.emit(if is_global { "PUSHGP" } else { "PUSHFP" })?;
                        self.emit(format!("PUSHI {offset}"))?;
                        self.emit("PADD")
                    }
                    _ => Err(CodegenError::Logic(format!("'{name}' is not addressable"))),
                }
            }
            Expression::ArrayAccess { array, index } => {
                let Expression::Identifier { name, line } = array.as_ref() else {
                    return Err(CodegenError::Logic("nested array access is not supported".into()));
                };
                let symbol = self.resolve_or_err(name, *line)?;
                let is_global = symbol.scope_level == 0;
                let offset = match symbol.address_or_offset {
                    AddressOrOffset::Offset(off) => off,
                    _ => return Err(CodegenError::Logic(format!("'{name}' is not an array"))),
                };
                let lower_bound = symbol.array_lower_bound.unwrap_or(0);
                self.emit(if is_global { "PUSHGP" } else { "PUSHFP" })?;
                self.emit(format!("PUSHI {offset}"))?;
                self.emit("PADD")?;
                self.emit_expression(index)?;
                if lower_bound != 0 {
                    self.emit(format!("PUSHI {lower_bound}"))?;
                    self.emit("SUB")?;
                }
                self.emit("PADD")
            }
            _ => Err(CodegenError::Logic("reference argument is not an identifier or array element".into())),
        }
    }

    fn emit_array_access(&mut self, array: &Expression, index: &Expression) -> Result<(), CodegenError> {
        let Expression::Identifier { name, line } = array else {
            return Err(CodegenError::Logic("nested array access is not supported".into()));
        };
        let symbol = self.resolve_or_err(name, *line)?;
        if symbol.sym_type == Type::Scalar(ScalarType::String) && !symbol.is_array {
            self.emit_identifier_value(name, *line)?;
            self.emit_expression(index)?;
            self.emit("PUSHI 1")?;
            self.emit("SUB")?;
            return self.emit("CHARAT");
        }
        let is_global = symbol.scope_level == 0;
        let offset = match symbol.address_or_offset {
            AddressOrOffset::Offset(off) => off,
            _ => return Err(CodegenError::Logic(format!("'{name}' is not an array"))),
        };
        let lower_bound = symbol.array_lower_bound.unwrap_or(0);
        self.emit(if is_global { "PUSHGP" } else { "PUSHFP" })?;
        self.emit(format!("PUSHI {offset}"))?;
        self.emit("PADD")?;
        self.emit_expression(index)?;
        if lower_bound != 0 {
            self.emit(format!("PUSHI {lower_bound}"))?;
            self.emit("SUB")?;
        }
        self.emit("LOADN")
    }

    fn emit_binary_operation(
        &mut self,
        operator: &str,
        left: &Expression,
        right: &Expression,
    ) -> Result<(), CodegenError> {
        if let Some(fold) = self.try_fold_char_compare(operator, left, right)? {
            return Ok(fold);
        }

        let left_real = is_real_type(&self.determine_expression_type(left));
        let right_real = is_real_type(&self.determine_expression_type(right));
        let is_real = left_real || right_real;

        self.emit_expression(left)?;
        if operator == "/" && !left_real {
            self.emit("ITOF")?;
        }
        self.emit_expression(right)?;
        if operator == "/" && !right_real {
            self.emit("ITOF")?;
        }

        match operator {
            "+" => self.emit(if is_real { "FADD" } else { "ADD" }),
            "-" => self.emit(if is_real { "FSUB" } else { "SUB" }),
            "*" => self.emit(if is_real { "FMUL" } else { "MUL" }),
            "/" => self.emit("FDIV"),
            "DIV" => self.emit("DIV"),
            "MOD" => self.emit("MOD"),
            "=" => self.emit("EQUAL"),
            "<>" => {
                self.emit("EQUAL")?;
                self.emit("NOT")
            }
            "<" => self.emit(if is_real { "FINF" } else { "INF" }),
            "<=" => self.emit(if is_real { "FINFEQ" } else { "INFEQ" }),
            ">" => self.emit(if is_real { "FSUP" } else { "SUP" }),
            ">=" => self.emit(if is_real { "FSUPEQ" } else { "SUPEQ" }),
            "AND" | "ANDTHEN" => self.emit("AND"),
            "OR" | "ORELSE" => self.emit("OR"),
            _ => Err(CodegenError::Unsupported("binary operator")),
        }
    }

    /// `s[i] = 'c'` folds to comparing character codes as integers, since
    /// the base string-index access already yields a single character.
    fn try_fold_char_compare(
        &mut self,
        operator: &str,
        left: &Expression,
        right: &Expression,
    ) -> Result<Option<()>, CodegenError> {
        if operator != "=" && operator != "<>" {
            return Ok(None);
        }
        let Expression::Literal(Literal::Str(s)) = right else {
            return Ok(None);
        };
        if s.chars().count() != 1 {
            return Ok(None);
        }
        let Expression::ArrayAccess { array, index } = left else {
            return Ok(None);
        };
        let Expression::Identifier { name, .. } = array.as_ref() else {
            return Ok(None);
        };
        let Some(symbol) = self.scopes.resolve(name) else {
            return Ok(None);
        };
        if symbol.sym_type != Type::Scalar(ScalarType::String) || symbol.is_array {
            return Ok(None);
        }
        let array = array.clone();
        let index = index.clone();
        let code = s.chars().next().unwrap() as u32;
        self.emit_array_access(&array, &index)?;
        self.emit("CHRCODE")?;
        self.emit(format!("PUSHI {code}"))?;
        self.emit("EQUAL")?;
        if operator == "<>" {
            self.emit("NOT")?;
        }
        Ok(Some(()))
    }

    fn emit_unary_operation(&mut self, operator: &str, operand: &Expression) -> Result<(), CodegenError> {
        match operator {
            "NOT" => {
                self.emit_expression(operand)?;
                self.emit("NOT")
            }
            "-" => {
                let is_real = is_real_type(&self.determine_expression_type(operand));
                self.emit("PUSHI 0")?;
                self.emit_expression(operand)?;
                self.emit("SWAP")?;
                self.emit(if is_real { "FSUB" } else { "SUB" })
            }
            "+" => self.emit_expression(operand),
            _ => Err(CodegenError::Unsupported("unary operator")),
        }
    }

    pub(super) fn emit_call_expression(&mut self, call: &FunctionCall) -> Result<(), CodegenError> {
        let symbol = self.resolve_or_err(&call.name, call.line)?;
        match &symbol.address_or_offset {
            AddressOrOffset::Callable(Callable::Builtin(kind)) => self.emit_builtin_call(*kind, &call.arguments),
            AddressOrOffset::Callable(Callable::User(label)) => {
                self.emit_user_call(label, &symbol.params_info, &call.arguments)
            }
            _ => Err(CodegenError::Logic(format!("'{}' is not callable", call.name))),
        }
    }

    pub(super) fn emit_user_call(
        &mut self,
        label: &str,
        params_info: &[ParamInfo],
        arguments: &[Expression],
    ) -> Result<(), CodegenError> {
        if arguments.len() != params_info.len() {
            return Err(CodegenError::Logic(format!(
                "'{label}' expects {} argument(s), got {}",
                params_info.len(),
                arguments.len()
            )));
        }
        for (arg, info) in arguments.iter().zip(params_info) {
            if info.is_var {
                self.emit_lvalue_address(arg)?;
            } else {
                self.emit_expression(arg)?;
            }
        }
        self.emit(format!("PUSHA {label}"))?;
        self.emit("CALL")
    }

    fn emit_builtin_call(&mut self, kind: BuiltinKind, arguments: &[Expression]) -> Result<(), CodegenError> {
        match kind {
            BuiltinKind::Writeln => self.emit_writeln(arguments),
            BuiltinKind::Length => self.emit_length(&arguments[0]),
            BuiltinKind::Uppercase => self.emit_case_fold(&arguments[0], true),
            BuiltinKind::Lowercase => self.emit_case_fold(&arguments[0], false),
            BuiltinKind::Abs => self.emit_abs(&arguments[0]),
            BuiltinKind::Sqr => self.emit_sqr(&arguments[0]),
            BuiltinKind::Sqrt => self.emit_sqrt(&arguments[0]),
            BuiltinKind::Pred => self.emit_pred_succ(&arguments[0], false),
            BuiltinKind::Succ => self.emit_pred_succ(&arguments[0], true),
            BuiltinKind::Ord => {
                self.emit_expression(&arguments[0])?;
                self.emit("CHRCODE")
            }
            BuiltinKind::Chr => self.emit_expression(&arguments[0]),
            BuiltinKind::Sin => self.emit_trig(&arguments[0], "FSIN"),
            BuiltinKind::Cos => self.emit_trig(&arguments[0], "FCOS"),
        }
    }

    fn emit_length(&mut self, arg: &Expression) -> Result<(), CodegenError> {
        if let Expression::Literal(Literal::Str(s)) = arg {
            return self.emit(format!("PUSHI {}", s.chars().count()));
        }
        self.emit_expression(arg)?;
        self.emit("STRLEN")
    }

    fn emit_case_fold(&mut self, arg: &Expression, upper: bool) -> Result<(), CodegenError> {
        if let Expression::Literal(Literal::Str(s)) = arg {
            let folded = if upper { s.to_uppercase() } else { s.to_lowercase() };
            return self.emit(format!("PUSHS \"{folded}\""));
        }
        self.emit_expression(arg)?;
        self.emit(if upper { "UPPER" } else { "LOWER" })
    }

    fn emit_abs(&mut self, arg: &Expression) -> Result<(), CodegenError> {
        let is_real = is_real_type(&self.determine_expression_type(arg));
        let negate_label = self.fresh_label("absneg");
        let done_label = self.fresh_label("absdone");
        self.emit_expression(arg)?;
        self.emit("DUP 0")?;
        self.emit(if is_real { "PUSHF 0.0" } else { "PUSHI 0" })?;
        self.emit(if is_real { "FSUPEQ" } else { "SUPEQ" })?;
        self.emit(format!("JZ {negate_label}"))?;
        self.emit(format!("JUMP {done_label}"))?;
        self.emit_label(&negate_label)?;
        self.emit(if is_real { "PUSHF 0.0" } else { "PUSHI 0" })?;
        self.emit("SWAP")?;
        self.emit(if is_real { "FSUB" } else { "SUB" })?;
        self.emit_label(&done_label)
    }

    fn emit_sqr(&mut self, arg: &Expression) -> Result<(), CodegenError> {
        let is_real = is_real_type(&self.determine_expression_type(arg));
        self.emit_expression(arg)?;
        self.emit("DUP 0")?;
        self.emit(if is_real { "FMUL" } else { "MUL" })
    }

    fn emit_sqrt(&mut self, arg: &Expression) -> Result<(), CodegenError> {
        let is_real = is_real_type(&self.determine_expression_type(arg));
        self.emit_expression(arg)?;
        if !is_real {
            self.emit("ITOF")?;
        }
        self.emit("FSQRT")
    }

    fn emit_pred_succ(&mut self, arg: &Expression, succ: bool) -> Result<(), CodegenError> {
        self.emit_expression(arg)?;
        self.emit("PUSHI 1")?;
        self.emit(if succ { "ADD" } else { "SUB" })
    }

    fn emit_trig(&mut self, arg: &Expression, opcode: &'static str) -> Result<(), CodegenError> {
        let is_real = is_real_type(&self.determine_expression_type(arg));
        self.emit_expression(arg)?;
        if !is_real {
            self.emit("ITOF")?;
        }
        self.emit(opcode)
    }

    /// Shared by the bare `writeln(...)` IOCall form and the `writeln(...)`
    /// function-call form, per the Open Question 2 resolution (DESIGN.md).
    pub(super) fn emit_writeln(&mut self, arguments: &[Expression]) -> Result<(), CodegenError> {
        for arg in arguments {
            self.emit_expression(arg)?;
            let arg_type = self.determine_expression_type(arg);
            match arg_type {
                Type::Scalar(ScalarType::String) | Type::Scalar(ScalarType::Char) => self.emit("WRITES")?,
                t if is_real_type(&t) => self.emit("WRITEF")?,
                _ => self.emit("WRITEI")?,
            };
        }
        self.emit("WRITELN")
    }
}

fn is_real_type(t: &Type) -> bool {
    matches!(t, Type::Scalar(s) if s.is_real())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression as E;

    #[test]
    fn literal_integer_emits_pushi() {
        let mut cg = CodeGen::new();
        cg.emit_expression(&E::Literal(Literal::Integer(42))).unwrap();
        assert!(cg.into_output().contains("PUSHI 42"));
    }

    #[test]
    fn length_of_literal_folds_to_constant() {
        let mut cg = CodeGen::new();
        cg.emit_length(&E::Literal(Literal::Str("abcde".into()))).unwrap();
        let out = cg.into_output();
        assert!(out.contains("PUSHI 5"));
        assert!(!out.contains("STRLEN"));
    }

    #[test]
    fn division_always_uses_fdiv() {
        let mut cg = CodeGen::new();
        cg.emit_expression(&E::BinaryOperation {
            operator: "/".into(),
            left: Box::new(E::Literal(Literal::Integer(1))),
            right: Box::new(E::Literal(Literal::Integer(2))),
        })
        .unwrap();
        assert!(cg.into_output().contains("FDIV"));
    }

    #[test]
    fn not_equal_is_equal_then_not() {
        let mut cg = CodeGen::new();
        cg.emit_expression(&E::BinaryOperation {
            operator: "<>".into(),
            left: Box::new(E::Literal(Literal::Integer(1))),
            right: Box::new(E::Literal(Literal::Integer(2))),
        })
        .unwrap();
        let out = cg.into_output();
        assert!(out.contains("EQUAL"));
        assert!(out.contains("NOT"));
    }
}
