//! Control-flow sections
//!
//! A section (also called a branch) models a region of a subroutine's
//! opcode buffer. The emitter opens a section per conditional branch; the
//! optimizer later walks the section tree to find tail sections, i.e.
//! regions whose execution can only end by returning from the subroutine.

use tyvm_bytecode::Op;

/// Last recorded use of a type argument within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeArgumentUsage {
    /// Symbol index of the type argument inside its frame
    pub symbol_index: u32,
    /// Instruction pointer right after the `Loads` that read the argument
    pub ip: u32,
}

/// A control-flow region of a subroutine.
///
/// Sections form a tree: `up` points at the enclosing section, `next` at
/// the fallthrough sibling allocated when a child section is closed.
#[derive(Debug, Clone)]
pub struct Section {
    /// Instruction pointer where the section begins
    pub start: u32,
    /// Instruction pointer where the section was closed
    pub end: u32,
    /// Last opcode emitted into this section
    pub last_op: Op,
    /// Number of opcodes emitted into this section
    pub op_count: u32,
    /// Explicit "not a tail" override
    pub is_block_tail_call: bool,
    /// Whether a child section was opened inside this one
    pub has_child: bool,
    /// Fallthrough sibling
    pub next: Option<usize>,
    /// Enclosing section
    pub up: Option<usize>,
    /// Type argument reads, for the rest-reuse rewrite
    pub type_argument_usages: Vec<TypeArgumentUsage>,
}

impl Section {
    /// Create a section starting at `start` under `up`.
    pub fn new(start: u32, up: Option<usize>) -> Self {
        Self {
            start,
            end: 0,
            last_op: Op::Noop,
            op_count: 0,
            is_block_tail_call: false,
            has_child: false,
            next: None,
            up,
            type_argument_usages: Vec::new(),
        }
    }

    /// Record a read of a type argument at `ip`.
    ///
    /// Only the latest read per symbol is kept; rest reuse is only sound
    /// for the final read.
    pub fn register_type_argument_usage(&mut self, symbol_index: u32, ip: u32) {
        for usage in &mut self.type_argument_usages {
            if usage.symbol_index == symbol_index {
                usage.ip = ip;
                return;
            }
        }
        self.type_argument_usages
            .push(TypeArgumentUsage { symbol_index, ip });
    }
}
