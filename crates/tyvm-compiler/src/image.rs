//! Binary packaging
//!
//! Assembles the final byte image once compilation ends:
//!
//! 1. `Jump` + absolute address past the storage section
//! 2. storage entries, each `u64 hash + u16 length + bytes`
//! 3. `SourceMap` + size + all mapping triples, subroutines first
//! 4. one `Subroutine` table entry per routine
//! 5. `Main` + absolute address of the main body
//! 6. subroutine bodies, then the main body, then `Halt`
//!
//! All addresses in the image are absolute byte offsets from its start.
//! Storage addresses already are (the pool hands out final offsets);
//! subroutine references inside opcode streams are rewritten here from
//! logical indices to body offsets.

use tyvm_bytecode::bytes;
use tyvm_bytecode::{runtime_hash, Op};

use crate::program::Program;

/// Size of one subroutine table entry: opcode + name address + body
/// address + flags.
const SUBROUTINE_ENTRY_SIZE: u32 = 1 + 4 + 4 + 1;

/// Size of the `Main` marker: opcode + address.
const MAIN_ENTRY_SIZE: u32 = 1 + 4;

/// Bytes per packaged sourcemap entry.
const SOURCE_MAP_ENTRY_SIZE: u32 = 4 * 3;

impl Program {
    /// Package the program into its final byte image.
    pub fn build(&self) -> Vec<u8> {
        let mut bin = Vec::new();

        // Jump over storage; the target is known once the pool is sized.
        bin.push(Op::Jump as u8);
        bytes::push_u32(&mut bin, 0);

        let mut address = 1 + 4 + self.storage.byte_size();
        bytes::write_u32_at(&mut bin, 1, address);

        for entry in self.storage.entries() {
            bytes::push_u64(&mut bin, runtime_hash(&entry.text));
            bytes::push_u16(&mut bin, entry.text.len() as u16);
            bin.extend_from_slice(entry.text.as_bytes());
        }

        // Sourcemap block: subroutine maps in order, then main. Bytecode
        // positions become absolute image positions.
        let mut source_map_size = self.source_map.len() as u32 * SOURCE_MAP_ENTRY_SIZE;
        for routine in &self.subroutines {
            source_map_size += routine.source_map.len() as u32 * SOURCE_MAP_ENTRY_SIZE;
        }

        bin.push(Op::SourceMap as u8);
        bytes::push_u32(&mut bin, source_map_size);
        address += 1 + 4 + source_map_size;

        let mut bytecode_pos_offset = address
            + self.subroutines.len() as u32 * SUBROUTINE_ENTRY_SIZE
            + MAIN_ENTRY_SIZE;

        for routine in &self.subroutines {
            for entry in routine.source_map.iter() {
                bytes::push_u32(&mut bin, bytecode_pos_offset + entry.bytecode_pos);
                bytes::push_u32(&mut bin, entry.source_pos);
                bytes::push_u32(&mut bin, entry.source_end);
            }
            bytecode_pos_offset += routine.ops.len() as u32;
        }
        for entry in self.source_map.iter() {
            bytes::push_u32(&mut bin, bytecode_pos_offset + entry.bytecode_pos);
            bytes::push_u32(&mut bin, entry.source_pos);
            bytes::push_u32(&mut bin, entry.source_end);
        }

        address += MAIN_ENTRY_SIZE;
        address += self.subroutines.len() as u32 * SUBROUTINE_ENTRY_SIZE;

        // Subroutine table; `address` now runs over the body region.
        let mut body_addresses = Vec::with_capacity(self.subroutines.len());
        for routine in &self.subroutines {
            bin.push(Op::Subroutine as u8);
            bytes::push_u32(&mut bin, routine.name_address);
            bytes::push_u32(&mut bin, address);
            bin.push(routine.flags());
            body_addresses.push(address);
            address += routine.ops.len() as u32;
        }

        bin.push(Op::Main as u8);
        bytes::push_u32(&mut bin, address);

        for routine in &self.subroutines {
            bin.extend_from_slice(&rewrite_routine_refs(&routine.ops, &body_addresses));
        }
        bin.extend_from_slice(&rewrite_routine_refs(&self.ops, &body_addresses));
        bin.push(Op::Halt as u8);

        bin
    }
}

/// Rewrite subroutine-index parameters to absolute body addresses.
fn rewrite_routine_refs(ops: &[u8], body_addresses: &[u32]) -> Vec<u8> {
    let mut out = ops.to_vec();
    let mut ip = 0;

    while ip < out.len() {
        let Some(op) = Op::from_byte(out[ip]) else {
            break;
        };
        if op.references_subroutine() {
            let index = bytes::read_u32(&out, ip + 1) as usize;
            if let Some(&body_address) = body_addresses.get(index) {
                bytes::write_u32_at(&mut out, ip + 1, body_address);
            }
        }
        ip += 1 + op.param_width();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;
    use tyvm_ast::Span;

    #[test]
    fn test_empty_program_layout() {
        let program = Program::new();
        let bin = program.build();

        assert_eq!(bin[0], Op::Jump as u8);
        assert_eq!(bytes::read_u32(&bin, 1), 5);
        assert_eq!(bin[5], Op::SourceMap as u8);
        assert_eq!(bytes::read_u32(&bin, 6), 0);
        assert_eq!(bin[10], Op::Main as u8);
        assert_eq!(bytes::read_u32(&bin, 11), 15);
        assert_eq!(bin[15], Op::Halt as u8);
        assert_eq!(bin.len(), 16);
    }

    #[test]
    fn test_storage_entries_land_at_their_addresses() {
        let mut program = Program::new();
        let first = program.storage.register("ab");
        let second = program.storage.register("xyz");
        let bin = program.build();

        assert_eq!(bytes::read_u64(&bin, first as usize), runtime_hash("ab"));
        assert_eq!(bytes::read_u16(&bin, first as usize + 8), 2);
        assert_eq!(&bin[first as usize + 10..first as usize + 12], b"ab");

        assert_eq!(bytes::read_u64(&bin, second as usize), runtime_hash("xyz"));
        assert_eq!(&bin[second as usize + 10..second as usize + 13], b"xyz");

        // The header jump lands right after the storage section.
        assert_eq!(bin[bytes::read_u32(&bin, 1) as usize], Op::SourceMap as u8);
    }

    #[test]
    fn test_call_index_is_rewritten_to_body_address() {
        let mut program = Program::new();
        let id = program.push_symbol_for_routine("X", SymbolKind::Type, Span::default());
        let routine = program.frames.symbol(id).routine.unwrap();
        program.push_subroutine("X").unwrap();
        program.push_op(Op::String);
        program.pop_subroutine().unwrap();

        program.push_op(Op::Call);
        program.push_address(routine);
        program.push_u16(0);

        let bin = program.build();

        // The table entry and the rewritten Call agree on the body address.
        let table_at = bytes::read_u32(&bin, 1) as usize + 1 + 4;
        assert_eq!(bin[table_at], Op::Subroutine as u8);
        let body_address = bytes::read_u32(&bin, table_at + 5);
        assert_eq!(bin[body_address as usize], Op::String as u8);

        let main_address = bytes::read_u32(&bin, table_at + 10 + 1) as usize;
        assert_eq!(bin[main_address], Op::Call as u8);
        assert_eq!(bytes::read_u32(&bin, main_address + 1), body_address);
    }
}
