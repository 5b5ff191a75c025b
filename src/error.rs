use thiserror::Error;


pub type Result<T> = std::result::Result<T, RuntimeError>;


/// Everything that can abort a run once the program is parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Undefined variable {0}")]
    UndefinedVariable(String),

    #[error("Cannot assign to {0}")]
    InvalidAssignmentTarget(String),

    #[error("Expected {expected} but got {got}")]
    TypeError {
        expected: &'static str,
        got: String,
    },

    #[error("Divide by zero")]
    DivideByZero,

    #[error("Program halted")]
    ProgramHalted,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
impl RuntimeError {
    pub fn type_error(expected: &'static str, got: impl Into<String>)->Self {
        RuntimeError::TypeError {
            expected,
            got: got.into(),
        }
    }
}


/// A failure while reading source text. `line` and `column` count from 1; columns count characters.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
impl SyntaxError {
    /// Locates byte `offset` of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>)->Self {
        let before = &source[..offset];
        let line_start = before.rfind('\n').map_or(0, |i|i + 1);

        SyntaxError {
            message: message.into(),
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}
