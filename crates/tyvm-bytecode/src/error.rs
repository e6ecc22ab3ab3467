//! Bytecode errors

use thiserror::Error;

/// Errors that can occur while decoding bytecode
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// Invalid opcode byte
    #[error("Invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    /// Truncated parameter or payload
    #[error("Unexpected end of bytecode at offset {0}")]
    UnexpectedEnd(usize),
}

/// Result type for bytecode operations
pub type Result<T> = std::result::Result<T, BytecodeError>;
