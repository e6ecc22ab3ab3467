//! Compilation errors

use thiserror::Error;

/// Fatal compilation errors
///
/// These are emitter invariant violations: either the AST producer handed
/// us a malformed tree or a surface-language construct is not implemented.
/// Recoverable source errors (unresolved names, redeclarations) are not
/// errors at this level; they become `Op::Error` sentinels in the emitted
/// stream instead.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A subroutine was popped without any being active
    #[error("no active subroutine")]
    NoActiveSubroutine,

    /// A subroutine was sealed with an empty body
    #[error("subroutine `{0}` has an empty body")]
    EmptyRoutine(String),

    /// A routine-backed symbol was expected in the current frame
    #[error("no routine-backed symbol named `{0}` in the current frame")]
    UnknownRoutine(String),

    /// A symbol was referenced as a routine but has none
    #[error("`{0}` does not reference a routine")]
    NotARoutine(String),

    /// Assignment to something other than an identifier
    #[error("only identifiers can be assigned")]
    InvalidAssignmentTarget,
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;
