//! # Tyvm AST
//!
//! Node types for the type-level surface language consumed by
//! `tyvm-compiler`. The parser that produces these trees lives outside this
//! workspace; the compiler only depends on the shape defined here (`kind`,
//! source span, and kind-specific children).

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod node;
pub mod span;

pub use node::{
    ArrayLiteralExpression, ArrayType, BinaryExpression, BinaryOperator, CallExpression,
    ConditionalExpression, ConditionalType, ExpressionStatement, ExpressionWithTypeArguments,
    FunctionDeclaration, Identifier, IndexedAccessType, InterfaceDeclaration, IntersectionType,
    Literal, LiteralType, MappedType, NamedTupleMember, Node, ObjectLiteralExpression,
    OptionalType, Parameter, ParenthesizedExpression, ParenthesizedType, PropertyAssignment,
    PropertySignature, RestType, SourceFile, TemplateLiteralSpan, TemplateLiteralType,
    TemplatePart, TupleType, TypeAliasDeclaration, TypeLiteral, TypeParameter, TypeReference,
    UnionType, VariableDeclaration, VariableStatement,
};
pub use span::Span;
