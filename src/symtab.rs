//! Scoped symbol table with FP/GP offset allocation.
//!
//! Grounded in `anasem.py`'s `Symbol`/`SymbolTable` (the Python original),
//! restructured per the teacher's ownership style (`ast.rs`/`codegen/state.rs`:
//! flat structs, explicit `new()`) and the redesign guidance in SPEC_FULL.md §9:
//! the global "current scope" pointer becomes an owned stack of scopes, and
//! push/pop is a `ScopeGuard` that restores the stack on every exit path,
//! including `?`-propagated errors. Built-ins are a tagged `Callable` rather
//! than sentinel strings.

use crate::builtins::{BuiltinKind, ALL_BUILTINS};
use crate::types::Type;
use std::collections::HashMap;

/// What a callable symbol's address slot actually is.
#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    /// A user-defined function/procedure, addressed by code label.
    User(String),
    /// A compiler built-in, expanded inline at the call site.
    Builtin(BuiltinKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function,
    Procedure,
    ProgramParam,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Integer(i64),
    Real(f64),
    Str(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub param_type: Type,
    pub is_var: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddressOrOffset {
    /// Non-negative GP/FP offset for variables and non-var parameters.
    Offset(i64),
    /// Literal constant value.
    Constant(ConstantValue),
    /// Function/procedure label, or a built-in tag.
    Callable(Callable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub sym_type: Type,
    pub kind: SymbolKind,
    pub address_or_offset: AddressOrOffset,
    pub scope_level: usize,
    pub params_info: Vec<ParamInfo>,
    pub return_type: Option<Type>,
    pub is_var_param: bool,
    pub is_array: bool,
    pub array_lower_bound: Option<i64>,
    pub array_element_count: Option<i64>,
    pub array_element_type: Option<Type>,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, sym_type: Type, offset: i64, scope_level: usize) -> Self {
        Symbol {
            name: name.into(),
            sym_type,
            kind: SymbolKind::Variable,
            address_or_offset: AddressOrOffset::Offset(offset),
            scope_level,
            params_info: Vec::new(),
            return_type: None,
            is_var_param: false,
            is_array: false,
            array_lower_bound: None,
            array_element_count: None,
            array_element_type: None,
        }
    }

    pub fn parameter(name: impl Into<String>, param_type: Type, offset: i64, scope_level: usize, is_var: bool) -> Self {
        Symbol {
            name: name.into(),
            sym_type: param_type,
            kind: SymbolKind::Parameter,
            address_or_offset: AddressOrOffset::Offset(offset),
            scope_level,
            params_info: Vec::new(),
            return_type: None,
            is_var_param: is_var,
            is_array: false,
            array_lower_bound: None,
            array_element_count: None,
            array_element_type: None,
        }
    }
}

/// One lexical scope: a flat map plus its own offset counters.
pub struct Scope {
    pub symbols: HashMap<String, Symbol>,
    pub scope_name: String,
    current_local_offset: i64,
    current_param_offset: i64,
}

impl Scope {
    fn new(scope_name: impl Into<String>) -> Self {
        Scope {
            symbols: HashMap::new(),
            scope_name: scope_name.into(),
            current_local_offset: 0,
            current_param_offset: -1,
        }
    }

    pub fn allocate_local(&mut self, count: i64) -> i64 {
        let offset = self.current_local_offset;
        self.current_local_offset += count;
        offset
    }

    pub fn allocate_param(&mut self) -> i64 {
        let offset = self.current_param_offset;
        self.current_param_offset -= 1;
        offset
    }
}

/// The lexical scope chain, owned as a stack rather than linked by borrowed
/// parent pointers: scope 0 is the built-in init root, scope 1 is "global",
/// and each active function/procedure body pushes one scope above that.
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut root = Scope::new("global_init_phase");
        register_builtins(&mut root);
        let global = Scope::new("global");
        ScopeStack { scopes: vec![root, global] }
    }

    pub fn push(&mut self, scope_name: impl Into<String>) {
        self.scopes.push(Scope::new(scope_name));
    }

    pub fn pop(&mut self) {
        if self.scopes.len() <= 2 {
            panic!("scope stack underflow: cannot pop past the global scope");
        }
        self.scopes.pop();
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().expect("scope stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    pub fn current_scope_level(&self) -> usize {
        self.scopes.len() - 2
    }

    pub fn define(&mut self, symbol: Symbol) {
        let key = symbol.name.to_lowercase();
        let scope = self.current_mut();
        if scope.symbols.contains_key(&key) && scope.scope_name != "global_init_phase" {
            tracing::warn!(scope = %scope.scope_name, name = %key, "redefining symbol in scope");
        }
        scope.symbols.insert(key, symbol);
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let key = name.to_lowercase();
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(&key))
    }

    pub fn allocate_local(&mut self, count: i64) -> i64 {
        self.current_mut().allocate_local(count)
    }

    pub fn allocate_param(&mut self) -> i64 {
        self.current_mut().allocate_param()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

fn register_builtins(scope: &mut Scope) {
    for kind in ALL_BUILTINS {
        let params_info = kind.params();
        let symbol = Symbol {
            name: kind.name().to_string(),
            sym_type: kind
                .return_type()
                .unwrap_or(Type::Scalar(crate::types::ScalarType::Integer)),
            kind: if kind.is_variadic() {
                SymbolKind::Procedure
            } else {
                SymbolKind::Function
            },
            address_or_offset: AddressOrOffset::Callable(Callable::Builtin(*kind)),
            scope_level: 0,
            params_info,
            return_type: kind.return_type(),
            is_var_param: false,
            is_array: false,
            array_lower_bound: None,
            array_element_count: None,
            array_element_type: None,
        };
        scope.symbols.insert(symbol.name.to_lowercase(), symbol);
    }
}

/// RAII scope guard: pushes a child scope on construction, pops it on drop.
/// Guarantees the scope stack unwinds correctly even when the caller bails
/// out early via `?`, matching the redesign note in SPEC_FULL.md §9.
pub struct ScopeGuard<'a> {
    stack: &'a mut ScopeStack,
}

impl<'a> ScopeGuard<'a> {
    pub fn enter(stack: &'a mut ScopeStack, scope_name: impl Into<String>) -> Self {
        stack.push(scope_name);
        ScopeGuard { stack }
    }

    pub fn stack(&mut self) -> &mut ScopeStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarType;

    #[test]
    fn resolve_walks_scope_stack_from_the_top() {
        let mut stack = ScopeStack::new();
        stack.define(Symbol::variable("x", Type::Scalar(ScalarType::Integer), 0, 0));

        assert!(stack.resolve("X").is_some());
        assert!(stack.resolve("length").is_some());
        assert!(stack.resolve("nonexistent").is_none());
    }

    #[test]
    fn allocate_local_grows_by_count() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.allocate_local(1), 0);
        assert_eq!(stack.allocate_local(5), 1);
        assert_eq!(stack.allocate_local(1), 6);
    }

    #[test]
    fn allocate_param_counts_down_from_minus_one() {
        let mut stack = ScopeStack::new();
        stack.push("func_f");
        assert_eq!(stack.allocate_param(), -1);
        assert_eq!(stack.allocate_param(), -2);
    }

    #[test]
    fn builtin_registration_is_present_exactly_once() {
        let stack = ScopeStack::new();
        let writeln_count = stack
            .scopes
            .iter()
            .filter(|s| s.symbols.contains_key("writeln"))
            .count();
        assert_eq!(writeln_count, 1);
    }

    #[test]
    fn redefinition_in_global_scope_overwrites() {
        let mut stack = ScopeStack::new();
        stack.define(Symbol::variable("x", Type::Scalar(ScalarType::Integer), 0, 0));
        stack.define(Symbol::variable("x", Type::Scalar(ScalarType::Real), 1, 0));
        assert_eq!(stack.resolve("x").unwrap().sym_type, Type::Scalar(ScalarType::Real));
    }

    #[test]
    fn scope_guard_pops_on_drop_even_through_early_return() {
        let mut stack = ScopeStack::new();
        fn enters_and_bails(stack: &mut ScopeStack) -> Result<(), ()> {
            let mut guard = ScopeGuard::enter(stack, "func_f");
            guard.stack().define(Symbol::variable("local", Type::Scalar(ScalarType::Integer), 0, 1));
            Err(())
        }
        let _ = enters_and_bails(&mut stack);
        assert_eq!(stack.scopes.len(), 2);
        assert!(stack.resolve("local").is_none());
    }

    #[test]
    fn nested_scope_shadows_outer_definition() {
        let mut stack = ScopeStack::new();
        stack.define(Symbol::variable("x", Type::Scalar(ScalarType::Integer), 0, 0));
        {
            let mut guard = ScopeGuard::enter(&mut stack, "func_f");
            guard.stack().define(Symbol::parameter("x", Type::Scalar(ScalarType::Real), -1, 1, false));
            assert_eq!(guard.stack().resolve("x").unwrap().sym_type, Type::Scalar(ScalarType::Real));
        }
        assert_eq!(stack.resolve("x").unwrap().sym_type, Type::Scalar(ScalarType::Integer));
    }
}
