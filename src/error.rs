//! Error taxonomy for the compilation pipeline.
//!
//! Each stage has its own error type; `CompileError` aggregates them so `?`
//! composes across stage boundaries, mirroring the teacher's
//! `codegen::error::CodeGenError` pattern generalized to every stage.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    IllegalCharacter { ch: char, line: usize },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::IllegalCharacter { ch, line } => {
                write!(f, "Illegal character '{}' at line {}", ch, line)
            }
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error: {} at line {}", self.message, self.line)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub message: String,
}

impl SemanticError {
    pub fn new(message: impl Into<String>) -> Self {
        SemanticError {
            message: message.into(),
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Semantic error: {}", self.message)
    }
}

impl std::error::Error for SemanticError {}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub message: String,
}

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        TypeError {
            message: message.into(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type error: {}", self.message)
    }
}

impl std::error::Error for TypeError {}

#[derive(Debug)]
pub enum CodegenError {
    Logic(String),
    Unsupported(&'static str),
    Format(fmt::Error),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::Logic(msg) => write!(f, "Codegen error: {}", msg),
            CodegenError::Unsupported(what) => {
                write!(f, "Codegen error: unsupported construct '{}'", what)
            }
            CodegenError::Format(e) => write!(f, "Codegen error: formatting failure: {}", e),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<fmt::Error> for CodegenError {
    fn from(e: fmt::Error) -> Self {
        CodegenError::Format(e)
    }
}

#[derive(Debug)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Semantic(SemanticError),
    Type(TypeError),
    Codegen(CodegenError),
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(e) => write!(f, "{}", e),
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Semantic(e) => write!(f, "{}", e),
            CompileError::Type(e) => write!(f, "{}", e),
            CompileError::Codegen(e) => write!(f, "{}", e),
            CompileError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<SemanticError> for CompileError {
    fn from(e: SemanticError) -> Self {
        CompileError::Semantic(e)
    }
}

impl From<TypeError> for CompileError {
    fn from(e: TypeError) -> Self {
        CompileError::Type(e)
    }
}

impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self {
        CompileError::Codegen(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let e = LexError::IllegalCharacter {
            ch: '@',
            line: 12,
        };
        assert_eq!(e.to_string(), "Illegal character '@' at line 12");
    }

    #[test]
    fn compile_error_from_parse_error() {
        let pe = ParseError {
            message: "unexpected token".into(),
            line: 3,
        };
        let ce: CompileError = pe.into();
        assert!(ce.to_string().contains("unexpected token"));
        assert!(ce.to_string().contains("line 3"));
    }
}
