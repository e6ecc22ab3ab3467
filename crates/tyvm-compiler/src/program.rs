//! The compilation unit
//!
//! A [`Program`] owns the main opcode buffer, the storage pool, the global
//! subroutine list, and the frame chain. A stack of active subroutines
//! decides where emitted opcodes land: the top of the stack, or the main
//! buffer when the stack is empty.

use tyvm_ast::Span;
use tyvm_bytecode::bytes;
use tyvm_bytecode::{ErrorCode, Op};

use crate::error::{CompileError, CompileResult};
use crate::sourcemap::SourceMap;
use crate::storage::StoragePool;
use crate::subroutine::Subroutine;
use crate::symbol::{FrameStack, SymbolId, SymbolKind};

/// A compilation unit being emitted.
#[derive(Debug)]
pub struct Program {
    /// Opcodes of the main body
    pub ops: Vec<u8>,
    /// Sourcemap of the main body; also holds error locations at bytecode
    /// position 0
    pub source_map: SourceMap,
    /// Interned string literals
    pub storage: StoragePool,
    /// All subroutines in creation order
    pub subroutines: Vec<Subroutine>,
    /// The frame chain
    pub frames: FrameStack,

    /// Stack of active subroutines; the top is the current write target.
    active_subroutines: Vec<usize>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// Create an empty program with the root frame.
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            source_map: SourceMap::new(),
            storage: StoragePool::new(),
            subroutines: Vec::new(),
            frames: FrameStack::new(),
            active_subroutines: Vec::new(),
        }
    }

    // ==================== Write target ====================

    fn target_ops_mut(&mut self) -> &mut Vec<u8> {
        match self.active_subroutines.last() {
            Some(&index) => &mut self.subroutines[index].ops,
            None => &mut self.ops,
        }
    }

    /// Current instruction pointer of the write target
    pub fn ip(&self) -> u32 {
        match self.active_subroutines.last() {
            Some(&index) => self.subroutines[index].ip(),
            None => self.ops.len() as u32,
        }
    }

    /// Append an opcode to the write target.
    pub fn push_op(&mut self, op: Op) {
        match self.active_subroutines.last() {
            Some(&index) => self.subroutines[index].push_op(op),
            None => self.ops.push(op as u8),
        }
    }

    /// Append an opcode and record a sourcemap entry for it.
    pub fn push_op_at(&mut self, op: Op, span: Span) {
        self.push_sourcemap(span);
        self.push_op(op);
    }

    /// Record a sourcemap entry at the current instruction pointer.
    pub fn push_sourcemap(&mut self, span: Span) {
        match self.active_subroutines.last() {
            Some(&index) => self.subroutines[index].push_sourcemap(span.pos, span.end),
            None => self
                .source_map
                .push(self.ops.len() as u32, span.pos, span.end),
        }
    }

    /// Append a 4-byte address parameter.
    ///
    /// Addresses of storage entries are final; addresses of subroutines
    /// are logical indices the packager rewrites to byte offsets.
    pub fn push_address(&mut self, address: u32) {
        bytes::push_u32(self.target_ops_mut(), address);
    }

    /// Patch a previously reserved 4-byte address slot.
    pub fn write_address_at(&mut self, offset: u32, address: u32) {
        bytes::write_u32_at(self.target_ops_mut(), offset as usize, address);
    }

    /// Append a signed 4-byte relative offset.
    pub fn push_int32(&mut self, value: i32) {
        bytes::push_i32(self.target_ops_mut(), value);
    }

    /// Patch a previously reserved signed 4-byte slot.
    pub fn write_int32_at(&mut self, offset: u32, value: i32) {
        bytes::write_i32_at(self.target_ops_mut(), offset as usize, value);
    }

    /// Append a u16 parameter.
    pub fn push_u16(&mut self, value: u16) {
        bytes::push_u16(self.target_ops_mut(), value);
    }

    /// Intern `text` and append its 4-byte storage address.
    pub fn push_storage(&mut self, text: &str) {
        let address = self.storage.register(text);
        self.push_address(address);
    }

    /// Emit a string literal opcode with interned text.
    pub fn push_string_literal(&mut self, text: &str, span: Span) {
        self.push_op_at(Op::StringLiteral, span);
        self.push_storage(text);
    }

    /// Emit a recoverable error sentinel.
    ///
    /// The location is recorded on the main sourcemap at bytecode position
    /// 0 (errors live outside any subroutine); the `Error` opcode goes to
    /// the current write target.
    pub fn push_error(&mut self, code: ErrorCode, span: Span) {
        self.source_map.push(0, span.pos, span.end);
        self.push_op(Op::Error);
        self.push_u16(code as u16);
    }

    // ==================== Sections ====================

    /// Arm the one-shot section suppression on the active subroutine.
    pub fn ignore_next_section_op(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index].ignore_next_section_op();
        }
    }

    /// Open a section on the active subroutine.
    pub fn push_section(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index].push_section();
        }
    }

    /// Close a section on the active subroutine.
    pub fn pop_section(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index].pop_section();
        }
    }

    /// Block tail calls on the active subroutine's active section.
    pub fn block_tail_call(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index].block_tail_call();
        }
    }

    /// Record a type-argument read on the active subroutine's section.
    pub fn register_type_argument_usage(&mut self, symbol_index: u32) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index].register_type_argument_usage(symbol_index);
        }
    }

    // ==================== Frames ====================

    /// Push a frame. An implicit frame is one the VM opens on its own (a
    /// call convention or an op like `Distribute`), so no `Frame` opcode
    /// is emitted for it.
    pub fn push_frame(&mut self, implicit: bool) {
        if !implicit {
            self.push_op(Op::Frame);
        }
        self.frames.push();
    }

    /// Emit `FrameEnd` and detach the current frame.
    pub fn pop_frame(&mut self) {
        self.push_op(Op::FrameEnd);
        self.pop_frame_implicit();
    }

    /// Detach the current frame without emitting.
    ///
    /// Used by constructs whose own closing opcode (`Union`, `Tuple`,
    /// `ObjectLiteral`, `Class`, `Return`) collapses the frame in the VM.
    pub fn pop_frame_implicit(&mut self) {
        self.frames.pop();
    }

    // ==================== Symbols ====================

    /// Insert a symbol into the current frame.
    pub fn push_symbol(&mut self, name: &str, kind: SymbolKind, span: Span) -> SymbolId {
        self.frames.push_symbol(name, kind, span)
    }

    /// Insert a routine-backed symbol, allocating its subroutine on the
    /// first declaration and recording its name in storage.
    pub fn push_symbol_for_routine(
        &mut self,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> SymbolId {
        let id = self.frames.push_symbol(name, kind, span);
        if self.frames.symbol(id).routine.is_none() {
            let index = self.subroutines.len() as u32;
            let mut routine = Subroutine::new(name, kind, index);
            routine.name_address = self.storage.register(name);
            self.subroutines.push(routine);
            self.frames.symbol_mut(id).routine = Some(index);
        }
        id
    }

    /// Find the innermost, latest binding of `name`.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
        self.frames.find_symbol(name)
    }

    /// Emit the `(frame hops, symbol index)` address of a symbol.
    pub fn push_symbol_address(&mut self, id: SymbolId) {
        let frame_offset = self.frames.hops_to(id.frame);
        let symbol_index = self.frames.symbol(id).index as u16;
        self.push_u16(frame_offset);
        self.push_u16(symbol_index);
    }

    // ==================== Subroutines ====================

    /// Create a nameless subroutine (type-parameter defaults, inner bodies
    /// of generic functions) and make it the write target.
    pub fn push_subroutine_nameless(&mut self) -> u32 {
        let index = self.subroutines.len();
        self.subroutines
            .push(Subroutine::new("", SymbolKind::Inline, index as u32));

        // Subroutines have implicit stack frames due to the call convention.
        self.push_frame(true);
        self.active_subroutines.push(index);
        index as u32
    }

    /// Make the subroutine backed by `name` (in the current frame) the
    /// write target.
    pub fn push_subroutine(&mut self, name: &str) -> CompileResult<u32> {
        let id = self
            .frames
            .find_symbol_in_current(name)
            .ok_or_else(|| CompileError::UnknownRoutine(name.to_string()))?;
        let index = self
            .frames
            .symbol(id)
            .routine
            .ok_or_else(|| CompileError::NotARoutine(name.to_string()))?;

        // Subroutines have implicit stack frames due to the call convention.
        self.push_frame(true);
        self.active_subroutines.push(index as usize);
        Ok(index)
    }

    /// Seal the active subroutine: run the section optimizer and append
    /// the trailing `Return`. Returns the sealed subroutine's index.
    pub fn pop_subroutine(&mut self) -> CompileResult<u32> {
        let &index = self
            .active_subroutines
            .last()
            .ok_or(CompileError::NoActiveSubroutine)?;
        self.pop_frame_implicit();

        let routine = &mut self.subroutines[index];
        if routine.ops.is_empty() {
            return Err(CompileError::EmptyRoutine(routine.identifier.clone()));
        }

        routine.end();
        routine.optimise();
        // Appended directly: the Return must not disturb section accounting.
        routine.ops.push(Op::Return as u8);

        self.active_subroutines.pop();
        Ok(index as u32)
    }

    /// Whether any subroutine is currently the write target.
    pub fn in_subroutine(&self) -> bool {
        !self.active_subroutines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_is_target_without_active_subroutine() {
        let mut program = Program::new();
        program.push_op(Op::Any);
        assert_eq!(program.ops, vec![Op::Any as u8]);
        assert!(program.subroutines.is_empty());
    }

    #[test]
    fn test_active_subroutine_receives_ops() {
        let mut program = Program::new();
        program.push_subroutine_nameless();
        program.push_op(Op::String);
        let index = program.pop_subroutine().unwrap();

        assert!(program.ops.is_empty());
        assert_eq!(
            program.subroutines[index as usize].ops,
            vec![Op::String as u8, Op::Return as u8]
        );
    }

    #[test]
    fn test_pop_without_active_subroutine_fails() {
        let mut program = Program::new();
        assert!(matches!(
            program.pop_subroutine(),
            Err(CompileError::NoActiveSubroutine)
        ));
    }

    #[test]
    fn test_empty_routine_is_rejected() {
        let mut program = Program::new();
        program.push_subroutine_nameless();
        assert!(matches!(
            program.pop_subroutine(),
            Err(CompileError::EmptyRoutine(_))
        ));
    }

    #[test]
    fn test_routine_backed_symbol_registers_name() {
        let mut program = Program::new();
        let id = program.push_symbol_for_routine("Alias", SymbolKind::Type, Span::default());

        let routine = program.frames.symbol(id).routine.unwrap();
        assert_eq!(program.subroutines[routine as usize].identifier, "Alias");
        assert_eq!(program.subroutines[routine as usize].name_address, 5);

        // A second declaration reuses the routine.
        let id2 = program.push_symbol_for_routine("Alias", SymbolKind::Type, Span::default());
        assert_eq!(id, id2);
        assert_eq!(program.frames.symbol(id2).declaration_count, 2);
        assert_eq!(program.subroutines.len(), 1);
    }

    #[test]
    fn test_push_subroutine_requires_current_frame_symbol() {
        let mut program = Program::new();
        assert!(matches!(
            program.push_subroutine("missing"),
            Err(CompileError::UnknownRoutine(_))
        ));

        program.push_symbol("plain", SymbolKind::Type, Span::default());
        assert!(matches!(
            program.push_subroutine("plain"),
            Err(CompileError::NotARoutine(_))
        ));
    }

    #[test]
    fn test_error_sentinel_targets_main_sourcemap() {
        let mut program = Program::new();
        program.push_subroutine_nameless();
        program.push_error(ErrorCode::CannotFind, Span::new(3, 9));
        program.pop_subroutine().unwrap();

        // Error op landed in the subroutine, location on the main map.
        assert_eq!(program.source_map.len(), 1);
        let entry = program.source_map.iter().next().unwrap();
        assert_eq!(entry.bytecode_pos, 0);
        assert_eq!(entry.source_pos, 3);
        assert!(program.subroutines[0].ops.contains(&(Op::Error as u8)));
    }

    #[test]
    fn test_symbol_address_counts_frame_hops() {
        let mut program = Program::new();
        program.push_subroutine_nameless();
        let id = program.push_symbol("T", SymbolKind::TypeArgument, Span::default());
        program.push_frame(true);
        program.push_frame(true);

        program.push_op(Op::Loads);
        program.push_symbol_address(id);

        let ops = &program.subroutines[0].ops;
        assert_eq!(tyvm_bytecode::bytes::read_u16(ops, 1), 2);
        assert_eq!(tyvm_bytecode::bytes::read_u16(ops, 3), 0);
    }
}
