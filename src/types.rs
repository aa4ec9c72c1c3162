//! The Pascal-subset type system: named scalars, arrays, and records.
//!
//! Grounded in the teacher's `types.rs` in shape (a small `Type` enum with a
//! `Display` impl and per-variant tests), far simpler in content since this
//! subset has no stack-effect row polymorphism.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Scalar(ScalarType),
    Array(Box<ArrayType>),
    Record(Vec<Field>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Integer,
    Real,
    Boolean,
    Char,
    String,
    Byte,
    Word,
    Longint,
    Shortint,
    Single,
    Double,
    Extended,
    Comp,
    Currency,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_uppercase().as_str() {
            "INTEGER" => ScalarType::Integer,
            "REAL" => ScalarType::Real,
            "BOOLEAN" => ScalarType::Boolean,
            "CHAR" => ScalarType::Char,
            "STRING" => ScalarType::String,
            "BYTE" => ScalarType::Byte,
            "WORD" => ScalarType::Word,
            "LONGINT" => ScalarType::Longint,
            "SHORTINT" => ScalarType::Shortint,
            "SINGLE" => ScalarType::Single,
            "DOUBLE" => ScalarType::Double,
            "EXTENDED" => ScalarType::Extended,
            "COMP" => ScalarType::Comp,
            "CURRENCY" => ScalarType::Currency,
            _ => return None,
        })
    }

    /// Whether this scalar is treated as a floating-point quantity for
    /// instruction selection (`FADD` vs `ADD` and friends).
    pub fn is_real(self) -> bool {
        matches!(
            self,
            ScalarType::Real | ScalarType::Single | ScalarType::Double | ScalarType::Extended
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Integer => "INTEGER",
            ScalarType::Real => "REAL",
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Char => "CHAR",
            ScalarType::String => "STRING",
            ScalarType::Byte => "BYTE",
            ScalarType::Word => "WORD",
            ScalarType::Longint => "LONGINT",
            ScalarType::Shortint => "SHORTINT",
            ScalarType::Single => "SINGLE",
            ScalarType::Double => "DOUBLE",
            ScalarType::Extended => "EXTENDED",
            ScalarType::Comp => "COMP",
            ScalarType::Currency => "CURRENCY",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub element_type: Type,
}

impl ArrayType {
    /// Number of elements, or an error if the bounds are inverted.
    pub fn element_count(&self) -> Result<i64, String> {
        if self.upper_bound < self.lower_bound {
            return Err(format!(
                "array upper bound {} less than lower bound {}",
                self.upper_bound, self.lower_bound
            ));
        }
        Ok(self.upper_bound - self.lower_bound + 1)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(s) => write!(f, "{}", s),
            Type::Array(a) => write!(
                f,
                "ARRAY[{}..{}] OF {}",
                a.lower_bound, a.upper_bound, a.element_type
            ),
            Type::Record(fields) => {
                write!(f, "RECORD(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.field_type)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: Type,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_from_name_case_insensitive() {
        assert_eq!(ScalarType::from_name("integer"), Some(ScalarType::Integer));
        assert_eq!(ScalarType::from_name("INTEGER"), Some(ScalarType::Integer));
        assert_eq!(ScalarType::from_name("bogus"), None);
    }

    #[test]
    fn real_ness_drives_instruction_selection() {
        assert!(ScalarType::Real.is_real());
        assert!(!ScalarType::Integer.is_real());
    }

    #[test]
    fn array_element_count() {
        let arr = ArrayType {
            lower_bound: 1,
            upper_bound: 5,
            element_type: Type::Scalar(ScalarType::Integer),
        };
        assert_eq!(arr.element_count(), Ok(5));
    }

    #[test]
    fn array_inverted_bounds_errors() {
        let arr = ArrayType {
            lower_bound: 5,
            upper_bound: 1,
            element_type: Type::Scalar(ScalarType::Integer),
        };
        assert!(arr.element_count().is_err());
    }

    #[test]
    fn display_formats_array_type() {
        let arr = Type::Array(Box::new(ArrayType {
            lower_bound: 1,
            upper_bound: 5,
            element_type: Type::Scalar(ScalarType::Integer),
        }));
        assert_eq!(arr.to_string(), "ARRAY[1..5] OF INTEGER");
    }
}
