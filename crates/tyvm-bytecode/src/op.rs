//! Bytecode instructions (opcodes)
//!
//! Every instruction is a single tag byte, optionally followed by inline
//! parameters whose width is fixed per opcode ([`Op::param_width`]). The
//! opcode set and the widths are a versioned contract with the type VM.

use serde::{Deserialize, Serialize};

/// Bytecode opcodes
///
/// Stack-based instruction set for type-level computation. Composing
/// opcodes (`Union`, `Tuple`, `ObjectLiteral`, ...) pop the values pushed
/// since the matching `Frame` and replace them with one composed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Op {
    // ==================== Program structure ====================
    /// No operation
    Noop = 0x00,
    /// Unconditional jump. At image start the parameter is an absolute
    /// 4-byte address; inside a subroutine it is a signed 4-byte offset
    /// relative to the parameter slot.
    Jump = 0x01,
    /// End of image
    Halt = 0x02,
    /// Marks the absolute address of the main body: u32 address
    Main = 0x03,
    /// Sourcemap block: u32 byte size, then (u32 bytecode pos, u32 source
    /// start, u32 source end) triples
    SourceMap = 0x04,
    /// Subroutine table entry: u32 name address, u32 body address, u8 flags
    Subroutine = 0x05,
    /// Return from the current subroutine
    Return = 0x06,

    // ==================== Frames & control flow ====================
    /// Open a new value frame
    Frame = 0x10,
    /// Close the current value frame
    FrameEnd = 0x11,
    /// Close the frame, record the result, and jump: i32 relative offset
    FrameReturnJump = 0x12,
    /// Pop a condition and jump to the false branch: i32 relative offset
    JumpCondition = 0x13,
    /// Pop a type and run the following body once per union member,
    /// rebinding the distribution variable: u32 relative exit offset
    Distribute = 0x14,
    /// Diagnostic sentinel: u16 error code
    Error = 0x15,

    // ==================== Type primitives ====================
    /// `never`
    Never = 0x20,
    /// `any`
    Any = 0x21,
    /// `unknown`
    Unknown = 0x22,
    /// `undefined`
    Undefined = 0x23,
    /// `null`
    Null = 0x24,
    /// `boolean`
    Boolean = 0x25,
    /// `string`
    String = 0x26,
    /// `number`
    Number = 0x27,
    /// `true`
    True = 0x28,
    /// `false`
    False = 0x29,

    // ==================== Literals ====================
    /// String literal: u32 storage address
    StringLiteral = 0x30,
    /// Number literal: u32 storage address of the numeric text
    NumberLiteral = 0x31,
    /// BigInt literal: u32 storage address of the numeric text
    BigIntLiteral = 0x32,
    /// Compose the current frame into a template literal type
    TemplateLiteral = 0x33,

    // ==================== Composers ====================
    /// Compose the current frame into a union
    Union = 0x40,
    /// Compose the current frame into an intersection
    Intersection = 0x41,
    /// Compose the current frame into an object literal type
    ObjectLiteral = 0x42,
    /// Pop name and type into a property signature
    PropertySignature = 0x43,
    /// Mark the preceding member optional
    Optional = 0x44,
    /// Mark the preceding member readonly
    Readonly = 0x45,
    /// Compose the current frame into a tuple
    Tuple = 0x46,
    /// Seal the top of the stack as a tuple member
    TupleMember = 0x47,
    /// Spread the top of the stack into the enclosing composition
    Rest = 0x48,
    /// Like `Rest`, but may alias the source storage (the source is not
    /// read again afterwards)
    RestReuse = 0x49,
    /// Array of the popped element type
    Array = 0x4A,
    /// Pop index and object, push the indexed access
    IndexAccess = 0x4B,
    /// Pop an object, push its `length` member
    Length = 0x4C,
    /// Compose the current frame into a class
    Class = 0x4D,
    /// Pop two types, push whether the first extends the second
    Extends = 0x4E,

    // ==================== References & calls ====================
    /// Call a subroutine: u32 subroutine address, u16 argument count
    Call = 0x50,
    /// Tail call: u32 subroutine address, u16 argument count
    TailCall = 0x51,
    /// Load a binding: u16 frame offset, u16 symbol index
    Loads = 0x52,
    /// Overwrite a subroutine's narrowed result: u32 subroutine address
    Set = 0x53,
    /// Check assignability of the popped value to the popped target
    Assign = 0x54,
    /// Widen a literal type to its base primitive
    Widen = 0x55,
    /// Instantiate a generic function ref: u16 type argument count
    Instantiate = 0x56,
    /// Call a value-level function: u16 argument count
    CallExpression = 0x57,
    /// Compose parameters and return type into a function type
    Function = 0x58,
    /// Reference to a generic function body: u32 subroutine address
    FunctionRef = 0x59,
    /// Pop type and name into a parameter: u32 storage address of the name
    Parameter = 0x5A,
    /// Attach the popped default value to the preceding parameter
    Initializer = 0x5B,
    /// Declare a type argument binding
    TypeArgument = 0x5C,
    /// Declare a type argument with a lazy default: u32 subroutine address
    TypeArgumentDefault = 0x5D,
}

impl Op {
    /// Convert from raw byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Noop),
            0x01 => Some(Self::Jump),
            0x02 => Some(Self::Halt),
            0x03 => Some(Self::Main),
            0x04 => Some(Self::SourceMap),
            0x05 => Some(Self::Subroutine),
            0x06 => Some(Self::Return),
            0x10 => Some(Self::Frame),
            0x11 => Some(Self::FrameEnd),
            0x12 => Some(Self::FrameReturnJump),
            0x13 => Some(Self::JumpCondition),
            0x14 => Some(Self::Distribute),
            0x15 => Some(Self::Error),
            0x20 => Some(Self::Never),
            0x21 => Some(Self::Any),
            0x22 => Some(Self::Unknown),
            0x23 => Some(Self::Undefined),
            0x24 => Some(Self::Null),
            0x25 => Some(Self::Boolean),
            0x26 => Some(Self::String),
            0x27 => Some(Self::Number),
            0x28 => Some(Self::True),
            0x29 => Some(Self::False),
            0x30 => Some(Self::StringLiteral),
            0x31 => Some(Self::NumberLiteral),
            0x32 => Some(Self::BigIntLiteral),
            0x33 => Some(Self::TemplateLiteral),
            0x40 => Some(Self::Union),
            0x41 => Some(Self::Intersection),
            0x42 => Some(Self::ObjectLiteral),
            0x43 => Some(Self::PropertySignature),
            0x44 => Some(Self::Optional),
            0x45 => Some(Self::Readonly),
            0x46 => Some(Self::Tuple),
            0x47 => Some(Self::TupleMember),
            0x48 => Some(Self::Rest),
            0x49 => Some(Self::RestReuse),
            0x4A => Some(Self::Array),
            0x4B => Some(Self::IndexAccess),
            0x4C => Some(Self::Length),
            0x4D => Some(Self::Class),
            0x4E => Some(Self::Extends),
            0x50 => Some(Self::Call),
            0x51 => Some(Self::TailCall),
            0x52 => Some(Self::Loads),
            0x53 => Some(Self::Set),
            0x54 => Some(Self::Assign),
            0x55 => Some(Self::Widen),
            0x56 => Some(Self::Instantiate),
            0x57 => Some(Self::CallExpression),
            0x58 => Some(Self::Function),
            0x59 => Some(Self::FunctionRef),
            0x5A => Some(Self::Parameter),
            0x5B => Some(Self::Initializer),
            0x5C => Some(Self::TypeArgument),
            0x5D => Some(Self::TypeArgumentDefault),
            _ => None,
        }
    }

    /// Number of fixed parameter bytes following the opcode.
    ///
    /// `SourceMap` additionally carries a dynamic payload of the size named
    /// by its u32 parameter; stream walkers must skip it themselves.
    pub const fn param_width(self) -> usize {
        match self {
            Self::Jump
            | Self::Main
            | Self::SourceMap
            | Self::FrameReturnJump
            | Self::JumpCondition
            | Self::Distribute
            | Self::StringLiteral
            | Self::NumberLiteral
            | Self::BigIntLiteral
            | Self::Loads
            | Self::Set
            | Self::FunctionRef
            | Self::Parameter
            | Self::TypeArgumentDefault => 4,
            Self::Error | Self::Instantiate | Self::CallExpression => 2,
            Self::Call | Self::TailCall => 6,
            Self::Subroutine => 9,
            _ => 0,
        }
    }

    /// Whether the first parameter is a subroutine reference that the
    /// packager rewrites from a logical index to an absolute byte address.
    pub const fn references_subroutine(self) -> bool {
        matches!(
            self,
            Self::Call | Self::TailCall | Self::Set | Self::FunctionRef | Self::TypeArgumentDefault
        )
    }
}

/// Diagnostic codes embedded with [`Op::Error`].
///
/// Closed enumeration shared with the VM; the VM resolves the source
/// location through the sourcemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    /// A name could not be resolved
    CannotFind = 1,
    /// A symbol was declared more than once in the same scope
    Redeclared = 2,
}

impl ErrorCode {
    /// Convert from the raw wire value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::CannotFind),
            2 => Some(Self::Redeclared),
            _ => None,
        }
    }
}
