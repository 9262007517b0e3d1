use std::fmt;

/// Errors that halt compilation outright. Compile errors are non-recoverable
/// and carry a short "kind" plus enough context to be useful without
/// re-parsing the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    UnknownOperator(String),
    UnknownExpression(&'static str),
    UndefinedVariable(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownOperator(op) => write!(f, "unknown operator: {}", op),
            CompileError::UnknownExpression(kind) => write!(f, "unknown expression type: {}", kind),
            CompileError::UndefinedVariable(name) => write!(f, "undefined variable {}", name),
        }
    }
}

impl std::error::Error for CompileError {}

/// Fatal VM errors: these halt the dispatch loop and surface to the caller
/// of `run`. Type mismatches and built-in failures are deliberately *not*
/// represented here — those become first-class `Object::Error` values on
/// the stack and execution continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    NotCallable(String),
    StackOverflow,
    FrameOverflow,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::NotCallable(type_name) => {
                write!(f, "calling non-function: {}", type_name)
            }
            RuntimeError::StackOverflow => write!(f, "stack overflow"),
            RuntimeError::FrameOverflow => write!(f, "frame stack overflow"),
        }
    }
}

impl std::error::Error for RuntimeError {}
