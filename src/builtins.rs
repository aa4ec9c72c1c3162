//! Built-in registry: tagged `Callable` dispatch replacing the source's
//! `BUILTIN_<NAME>` sentinel strings (see SPEC_FULL.md §9).
//!
//! Grounded in the teacher's `builtin_signature`/`builtin_signatures`
//! HashMap-of-signature registry (`builtins.rs`), generalized to a closed
//! enum so an unrecognized built-in name is a compile error, not a runtime
//! string-prefix check.

use crate::symtab::ParamInfo;
use crate::types::{ScalarType, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Writeln,
    Length,
    Uppercase,
    Lowercase,
    Abs,
    Sqr,
    Sqrt,
    Pred,
    Succ,
    Ord,
    Chr,
    Sin,
    Cos,
}

impl BuiltinKind {
    pub fn from_name(lower: &str) -> Option<Self> {
        Some(match lower {
            "writeln" => BuiltinKind::Writeln,
            "length" => BuiltinKind::Length,
            "uppercase" => BuiltinKind::Uppercase,
            "lowercase" => BuiltinKind::Lowercase,
            "abs" => BuiltinKind::Abs,
            "sqr" => BuiltinKind::Sqr,
            "sqrt" => BuiltinKind::Sqrt,
            "pred" => BuiltinKind::Pred,
            "succ" => BuiltinKind::Succ,
            "ord" => BuiltinKind::Ord,
            "chr" => BuiltinKind::Chr,
            "sin" => BuiltinKind::Sin,
            "cos" => BuiltinKind::Cos,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Writeln => "writeln",
            BuiltinKind::Length => "length",
            BuiltinKind::Uppercase => "uppercase",
            BuiltinKind::Lowercase => "lowercase",
            BuiltinKind::Abs => "abs",
            BuiltinKind::Sqr => "sqr",
            BuiltinKind::Sqrt => "sqrt",
            BuiltinKind::Pred => "pred",
            BuiltinKind::Succ => "succ",
            BuiltinKind::Ord => "ord",
            BuiltinKind::Chr => "chr",
            BuiltinKind::Sin => "sin",
            BuiltinKind::Cos => "cos",
        }
    }

    /// Declared return type, or `None` for `writeln` which is really a
    /// variadic procedure (checked at the call site, not here).
    pub fn return_type(self) -> Option<Type> {
        use ScalarType::*;
        match self {
            BuiltinKind::Writeln => None,
            BuiltinKind::Length => Some(Type::Scalar(Integer)),
            BuiltinKind::Uppercase | BuiltinKind::Lowercase => Some(Type::Scalar(String)),
            BuiltinKind::Abs | BuiltinKind::Sqr | BuiltinKind::Pred | BuiltinKind::Succ => {
                Some(Type::Scalar(Integer))
            }
            BuiltinKind::Sqrt | BuiltinKind::Sin | BuiltinKind::Cos => Some(Type::Scalar(Real)),
            BuiltinKind::Ord => Some(Type::Scalar(Integer)),
            BuiltinKind::Chr => Some(Type::Scalar(Char)),
        }
    }

    /// Parameter signature used for arity checks. `writeln` is variadic and
    /// is not arity-checked against this list.
    pub fn params(self) -> Vec<ParamInfo> {
        use ScalarType::*;
        let one = |t: ScalarType| {
            vec![ParamInfo {
                param_type: Type::Scalar(t),
                is_var: false,
            }]
        };
        match self {
            BuiltinKind::Writeln => vec![],
            BuiltinKind::Length | BuiltinKind::Uppercase | BuiltinKind::Lowercase => one(String),
            BuiltinKind::Abs | BuiltinKind::Sqr => one(Integer),
            BuiltinKind::Sqrt => one(Real),
            BuiltinKind::Pred | BuiltinKind::Succ => one(Integer),
            BuiltinKind::Ord => one(Char),
            BuiltinKind::Chr => one(Integer),
            BuiltinKind::Sin | BuiltinKind::Cos => one(Real),
        }
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, BuiltinKind::Writeln)
    }
}

/// All built-ins registered into the root scope on first use (§4.3).
pub const ALL_BUILTINS: &[BuiltinKind] = &[
    BuiltinKind::Writeln,
    BuiltinKind::Length,
    BuiltinKind::Uppercase,
    BuiltinKind::Lowercase,
    BuiltinKind::Abs,
    BuiltinKind::Sqr,
    BuiltinKind::Sqrt,
    BuiltinKind::Pred,
    BuiltinKind::Succ,
    BuiltinKind::Ord,
    BuiltinKind::Chr,
    BuiltinKind::Sin,
    BuiltinKind::Cos,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive_given_lowercased_input() {
        assert_eq!(BuiltinKind::from_name("length"), Some(BuiltinKind::Length));
        assert_eq!(BuiltinKind::from_name("bogus"), None);
    }

    #[test]
    fn all_builtins_round_trip_through_name() {
        for kind in ALL_BUILTINS {
            assert_eq!(BuiltinKind::from_name(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn writeln_is_variadic_and_has_no_fixed_return_type() {
        assert!(BuiltinKind::Writeln.is_variadic());
        assert_eq!(BuiltinKind::Writeln.return_type(), None);
    }

    #[test]
    fn sqrt_takes_a_real_and_returns_a_real() {
        assert_eq!(BuiltinKind::Sqrt.params().len(), 1);
        assert_eq!(
            BuiltinKind::Sqrt.return_type(),
            Some(Type::Scalar(ScalarType::Real))
        );
    }
}
