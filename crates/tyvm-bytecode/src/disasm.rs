//! Disassembler for opcode streams
//!
//! Renders a subroutine body or main body for debugging and tests. This
//! walks raw opcode streams, not whole packaged images (the storage and
//! sourcemap blocks of an image are not opcode streams).

use crate::bytes::{read_i32, read_u16, read_u32};
use crate::error::{BytecodeError, Result};
use crate::op::{ErrorCode, Op};

/// Disassemble an opcode stream into one line per instruction.
pub fn disassemble(ops: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut ip = 0;

    while ip < ops.len() {
        let op = Op::from_byte(ops[ip]).ok_or(BytecodeError::InvalidOpcode(ops[ip]))?;
        let width = op.param_width();
        if ip + 1 + width > ops.len() {
            return Err(BytecodeError::UnexpectedEnd(ip));
        }

        out.push_str(&format!("{ip:04} {}\n", format_op(ops, ip, op)));
        ip += 1 + width;

        if op == Op::SourceMap {
            // Dynamic payload follows the size parameter.
            ip += read_u32(ops, ip - 4) as usize;
        }
    }

    Ok(out)
}

fn format_op(ops: &[u8], ip: usize, op: Op) -> String {
    let p = ip + 1;
    match op {
        Op::Call | Op::TailCall => {
            format!("{op:?} routine={} args={}", read_u32(ops, p), read_u16(ops, p + 4))
        }
        Op::Loads => format!(
            "{op:?} frame={} symbol={}",
            read_u16(ops, p),
            read_u16(ops, p + 2)
        ),
        Op::Jump | Op::FrameReturnJump | Op::JumpCondition => {
            format!("{op:?} offset={:+}", read_i32(ops, p))
        }
        Op::Distribute => format!("{op:?} exit={}", read_u32(ops, p)),
        Op::Error => match ErrorCode::from_u16(read_u16(ops, p)) {
            Some(code) => format!("{op:?} {code:?}"),
            None => format!("{op:?} code={}", read_u16(ops, p)),
        },
        Op::Instantiate | Op::CallExpression => {
            format!("{op:?} args={}", read_u16(ops, p))
        }
        Op::StringLiteral | Op::NumberLiteral | Op::BigIntLiteral | Op::Parameter => {
            format!("{op:?} storage={}", read_u32(ops, p))
        }
        Op::Set | Op::FunctionRef | Op::TypeArgumentDefault => {
            format!("{op:?} routine={}", read_u32(ops, p))
        }
        Op::Subroutine => format!(
            "{op:?} name={} body={} flags={}",
            read_u32(ops, p),
            read_u32(ops, p + 4),
            ops[p + 8]
        ),
        Op::Main | Op::SourceMap => format!("{op:?} {}", read_u32(ops, p)),
        _ => format!("{op:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::{push_u16, push_u32};

    #[test]
    fn test_disassemble_simple_body() {
        let mut ops = vec![Op::String as u8];
        ops.push(Op::Return as u8);

        let text = disassemble(&ops).unwrap();
        assert_eq!(text, "0000 String\n0001 Return\n");
    }

    #[test]
    fn test_disassemble_call() {
        let mut ops = vec![Op::Call as u8];
        push_u32(&mut ops, 3);
        push_u16(&mut ops, 1);
        ops.push(Op::Return as u8);

        let text = disassemble(&ops).unwrap();
        assert!(text.contains("Call routine=3 args=1"));
        assert!(text.contains("0007 Return"));
    }

    #[test]
    fn test_invalid_opcode() {
        let err = disassemble(&[0xFE]).unwrap_err();
        assert!(matches!(err, BytecodeError::InvalidOpcode(0xFE)));
    }

    #[test]
    fn test_truncated_params() {
        let ops = vec![Op::Loads as u8, 0x01];
        let err = disassemble(&ops).unwrap_err();
        assert!(matches!(err, BytecodeError::UnexpectedEnd(0)));
    }
}
