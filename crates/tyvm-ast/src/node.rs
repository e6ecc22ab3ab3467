//! AST nodes
//!
//! One enum variant per syntax kind the compiler consumes. Kinds the surface
//! language has but the compiler core does not lower (intersection types,
//! mapped types) are still representable so that the emitter's log-and-skip
//! path is exercised with real trees.

use crate::span::Span;

/// An identifier, e.g. `T` or `Foo`.
///
/// In expression position an identifier may carry type arguments
/// (`foo<string>` parses the arguments onto the callee identifier).
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// The identifier text, escaping already resolved by the parser.
    pub escaped_text: String,
    /// Type arguments attached in expression position.
    pub type_arguments: Option<Vec<Node>>,
    /// Source span
    pub span: Span,
}

impl Identifier {
    /// Create a plain identifier without type arguments.
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            escaped_text: text.into(),
            type_arguments: None,
            span,
        }
    }
}

/// A literal token carrying its raw text (`"abc"`, `42`, `123n`).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// The literal text as written, without quotes.
    pub text: String,
    /// Source span
    pub span: Span,
}

impl Literal {
    /// Create a literal token.
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// A whole compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Top-level statements in source order.
    pub statements: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `type Name<...> = ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDeclaration {
    /// Alias name
    pub name: Identifier,
    /// Type parameters, `None` when the alias is not generic.
    pub type_parameters: Option<Vec<Node>>,
    /// The aliased type expression.
    pub ty: Box<Node>,
    /// Source span
    pub span: Span,
}

/// A type parameter, e.g. `T` or `T = string`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    /// Parameter name
    pub name: Identifier,
    /// Default type, evaluated lazily by the VM.
    pub default: Option<Box<Node>>,
    /// Source span
    pub span: Span,
}

/// A value parameter of a function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Binding name; `None` for destructuring patterns, which lower to an
    /// empty parameter name.
    pub name: Option<Identifier>,
    /// Declared type
    pub ty: Option<Box<Node>>,
    /// `?` marker
    pub question_token: bool,
    /// Default value expression
    pub initializer: Option<Box<Node>>,
    /// Source span
    pub span: Span,
}

/// `function name<...>(...): T`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// Function name; `None` for anonymous declarations.
    pub name: Option<Identifier>,
    /// Type parameters when generic.
    pub type_parameters: Option<Vec<Node>>,
    /// Value parameters
    pub parameters: Vec<Node>,
    /// Declared return type
    pub return_type: Option<Box<Node>>,
    /// Source span
    pub span: Span,
}

/// A reference to a named type, optionally instantiated: `Foo<string>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    /// Referenced name
    pub type_name: Identifier,
    /// Instantiation arguments
    pub type_arguments: Option<Vec<Node>>,
    /// Source span
    pub span: Span,
}

/// A literal wrapped in type position, e.g. the `'a'` in `type T = 'a'`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralType {
    /// The wrapped literal node.
    pub literal: Box<Node>,
    /// Source span
    pub span: Span,
}

/// The static text before/after/between template spans.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    /// Raw text of this part; may be empty.
    pub raw_text: String,
    /// Source span
    pub span: Span,
}

/// One `${T}tail` segment of a template literal type.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteralSpan {
    /// The interpolated type.
    pub ty: Box<Node>,
    /// The literal text following the interpolation.
    pub literal: TemplatePart,
}

/// `` `a${T}b` ``
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteralType {
    /// The head text before the first interpolation.
    pub head: TemplatePart,
    /// Interpolated segments in order.
    pub spans: Vec<TemplateLiteralSpan>,
    /// Source span
    pub span: Span,
}

/// `A | B`
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    /// Union members in source order.
    pub types: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `A & B` — representable but not lowered by this core.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionType {
    /// Intersection members in source order.
    pub types: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `T[K]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedAccessType {
    /// The indexed object type.
    pub object_type: Box<Node>,
    /// The index type.
    pub index_type: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `C extends E ? T : F`
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalType {
    /// The checked type; a bare type reference makes the conditional
    /// distributive.
    pub check_type: Box<Node>,
    /// The `extends` operand.
    pub extends_type: Box<Node>,
    /// Taken when the check extends.
    pub true_type: Box<Node>,
    /// Taken otherwise.
    pub false_type: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `{ [K in T]: ... }` — representable but not lowered by this core.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedType {
    /// The iteration parameter.
    pub type_parameter: Box<Node>,
    /// The member type template.
    pub ty: Option<Box<Node>>,
    /// Source span
    pub span: Span,
}

/// `T[]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Element type
    pub element_type: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `[A, B, ...C]`
#[derive(Debug, Clone, PartialEq)]
pub struct TupleType {
    /// Tuple elements; may be `NamedTupleMember`, `OptionalType`, or plain
    /// types.
    pub elements: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `name: T`, `name?: T`, `...name: T` inside a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTupleMember {
    /// Member name
    pub name: Identifier,
    /// Member type
    pub ty: Box<Node>,
    /// `...` marker
    pub dot_dot_dot_token: bool,
    /// `?` marker
    pub question_token: bool,
    /// Source span
    pub span: Span,
}

/// `T?` inside a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalType {
    /// The optional element type.
    pub ty: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `...T`
#[derive(Debug, Clone, PartialEq)]
pub struct RestType {
    /// The spread type.
    pub ty: Box<Node>,
    /// Source span
    pub span: Span,
}

/// A property of an interface, type literal, or object literal type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    /// Property name; an identifier or a computed name expression.
    pub name: Box<Node>,
    /// Property type
    pub ty: Option<Box<Node>>,
    /// `?` marker
    pub question_token: bool,
    /// `readonly` modifier
    pub readonly: bool,
    /// Source span
    pub span: Span,
}

/// `name: expr` inside an object literal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAssignment {
    /// Property name; an identifier or a computed name expression.
    pub name: Box<Node>,
    /// Assigned value
    pub initializer: Option<Box<Node>>,
    /// `?` marker
    pub question_token: bool,
    /// `readonly` modifier
    pub readonly: bool,
    /// Source span
    pub span: Span,
}

/// `interface Name extends A, B { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDeclaration {
    /// Interface name
    pub name: Identifier,
    /// Extended base types.
    pub extends_types: Vec<Node>,
    /// Interface members
    pub members: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `{ a: string }` in type position.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeLiteral {
    /// Members of the literal.
    pub members: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `(T)` in type position — structural, recursed into.
#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedType {
    /// The wrapped type.
    pub ty: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `(expr)` in expression position — structural, recursed into.
#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    /// The wrapped expression.
    pub expression: Box<Node>,
    /// Source span
    pub span: Span,
}

/// The binary operators the compiler consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `=`
    Assign,
}

/// `lhs = rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// Left operand
    pub left: Box<Node>,
    /// Operator token
    pub operator: BinaryOperator,
    /// Right operand
    pub right: Box<Node>,
    /// Source span
    pub span: Span,
}

/// `const x: T = init` / `let x = init`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// Binding name; `None` for destructuring patterns.
    pub name: Option<Identifier>,
    /// Declared type
    pub ty: Option<Box<Node>>,
    /// Initializer expression
    pub initializer: Option<Box<Node>>,
    /// Whether the declaration list was `const`.
    pub is_const: bool,
    /// Source span
    pub span: Span,
}

/// A `var`/`let`/`const` statement holding one or more declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatement {
    /// Declarations in source order.
    pub declarations: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `callee<T>(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// Callee expression
    pub expression: Box<Node>,
    /// Explicit type arguments
    pub type_arguments: Option<Vec<Node>>,
    /// Call arguments
    pub arguments: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `expr<T>` without a call, e.g. in heritage clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionWithTypeArguments {
    /// The instantiated expression.
    pub expression: Box<Node>,
    /// Type arguments
    pub type_arguments: Option<Vec<Node>>,
    /// Source span
    pub span: Span,
}

/// `{ a: 1 }` in expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteralExpression {
    /// Properties of the literal.
    pub properties: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `[1, 'a']` in expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteralExpression {
    /// Elements in source order.
    pub elements: Vec<Node>,
    /// Source span
    pub span: Span,
}

/// `cond ? a : b` in expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// The condition; its type does not narrow the result.
    pub condition: Box<Node>,
    /// Value when truthy.
    pub when_true: Box<Node>,
    /// Value when falsy.
    pub when_false: Box<Node>,
    /// Source span
    pub span: Span,
}

/// An expression used as a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The inner expression.
    pub expression: Box<Node>,
    /// Source span
    pub span: Span,
}

/// A node of the surface-language AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A compilation unit
    SourceFile(SourceFile),

    /// `any`
    AnyKeyword(Span),
    /// `unknown`
    UnknownKeyword(Span),
    /// `null`
    NullKeyword(Span),
    /// `undefined`
    UndefinedKeyword(Span),
    /// `never`
    NeverKeyword(Span),
    /// `boolean`
    BooleanKeyword(Span),
    /// `string`
    StringKeyword(Span),
    /// `number`
    NumberKeyword(Span),
    /// `true`
    TrueKeyword(Span),
    /// `false`
    FalseKeyword(Span),

    /// `123n`
    BigIntLiteral(Literal),
    /// `42`
    NumericLiteral(Literal),
    /// `'a'`
    StringLiteral(Literal),
    /// A literal in type position
    LiteralType(LiteralType),
    /// A template literal type
    TemplateLiteralType(TemplateLiteralType),

    /// A union type
    UnionType(UnionType),
    /// An intersection type (not lowered)
    IntersectionType(IntersectionType),
    /// An indexed access type
    IndexedAccessType(IndexedAccessType),
    /// A named type reference
    TypeReference(TypeReference),
    /// A conditional type
    ConditionalType(ConditionalType),
    /// A mapped type (not lowered)
    MappedType(MappedType),
    /// An array type
    ArrayType(ArrayType),
    /// A tuple type
    TupleType(TupleType),
    /// A named tuple member
    NamedTupleMember(NamedTupleMember),
    /// An optional tuple element
    OptionalType(OptionalType),
    /// A rest element
    RestType(RestType),
    /// A parenthesized type
    ParenthesizedType(ParenthesizedType),
    /// An object type literal
    TypeLiteral(TypeLiteral),
    /// A property of an object type
    PropertySignature(PropertySignature),

    /// A type alias declaration
    TypeAliasDeclaration(TypeAliasDeclaration),
    /// A type parameter declaration
    TypeParameter(TypeParameter),
    /// An interface declaration
    InterfaceDeclaration(InterfaceDeclaration),
    /// A function declaration
    FunctionDeclaration(FunctionDeclaration),
    /// A value parameter declaration
    Parameter(Parameter),
    /// A variable statement
    VariableStatement(VariableStatement),
    /// A single variable declaration
    VariableDeclaration(VariableDeclaration),

    /// An identifier in expression position
    Identifier(Identifier),
    /// A binary expression
    BinaryExpression(BinaryExpression),
    /// A call expression
    CallExpression(CallExpression),
    /// An instantiation expression
    ExpressionWithTypeArguments(ExpressionWithTypeArguments),
    /// An object literal expression
    ObjectLiteralExpression(ObjectLiteralExpression),
    /// An array literal expression
    ArrayLiteralExpression(ArrayLiteralExpression),
    /// A conditional expression
    ConditionalExpression(ConditionalExpression),
    /// A property assignment
    PropertyAssignment(PropertyAssignment),
    /// A parenthesized expression
    ParenthesizedExpression(ParenthesizedExpression),
    /// An expression statement
    ExpressionStatement(ExpressionStatement),
}

impl Node {
    /// The source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Node::SourceFile(n) => n.span,
            Node::AnyKeyword(span)
            | Node::UnknownKeyword(span)
            | Node::NullKeyword(span)
            | Node::UndefinedKeyword(span)
            | Node::NeverKeyword(span)
            | Node::BooleanKeyword(span)
            | Node::StringKeyword(span)
            | Node::NumberKeyword(span)
            | Node::TrueKeyword(span)
            | Node::FalseKeyword(span) => *span,
            Node::BigIntLiteral(n) | Node::NumericLiteral(n) | Node::StringLiteral(n) => n.span,
            Node::LiteralType(n) => n.span,
            Node::TemplateLiteralType(n) => n.span,
            Node::UnionType(n) => n.span,
            Node::IntersectionType(n) => n.span,
            Node::IndexedAccessType(n) => n.span,
            Node::TypeReference(n) => n.span,
            Node::ConditionalType(n) => n.span,
            Node::MappedType(n) => n.span,
            Node::ArrayType(n) => n.span,
            Node::TupleType(n) => n.span,
            Node::NamedTupleMember(n) => n.span,
            Node::OptionalType(n) => n.span,
            Node::RestType(n) => n.span,
            Node::ParenthesizedType(n) => n.span,
            Node::TypeLiteral(n) => n.span,
            Node::PropertySignature(n) => n.span,
            Node::TypeAliasDeclaration(n) => n.span,
            Node::TypeParameter(n) => n.span,
            Node::InterfaceDeclaration(n) => n.span,
            Node::FunctionDeclaration(n) => n.span,
            Node::Parameter(n) => n.span,
            Node::VariableStatement(n) => n.span,
            Node::VariableDeclaration(n) => n.span,
            Node::Identifier(n) => n.span,
            Node::BinaryExpression(n) => n.span,
            Node::CallExpression(n) => n.span,
            Node::ExpressionWithTypeArguments(n) => n.span,
            Node::ObjectLiteralExpression(n) => n.span,
            Node::ArrayLiteralExpression(n) => n.span,
            Node::ConditionalExpression(n) => n.span,
            Node::PropertyAssignment(n) => n.span,
            Node::ParenthesizedExpression(n) => n.span,
            Node::ExpressionStatement(n) => n.span,
        }
    }

    /// The kind name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::SourceFile(_) => "SourceFile",
            Node::AnyKeyword(_) => "AnyKeyword",
            Node::UnknownKeyword(_) => "UnknownKeyword",
            Node::NullKeyword(_) => "NullKeyword",
            Node::UndefinedKeyword(_) => "UndefinedKeyword",
            Node::NeverKeyword(_) => "NeverKeyword",
            Node::BooleanKeyword(_) => "BooleanKeyword",
            Node::StringKeyword(_) => "StringKeyword",
            Node::NumberKeyword(_) => "NumberKeyword",
            Node::TrueKeyword(_) => "TrueKeyword",
            Node::FalseKeyword(_) => "FalseKeyword",
            Node::BigIntLiteral(_) => "BigIntLiteral",
            Node::NumericLiteral(_) => "NumericLiteral",
            Node::StringLiteral(_) => "StringLiteral",
            Node::LiteralType(_) => "LiteralType",
            Node::TemplateLiteralType(_) => "TemplateLiteralType",
            Node::UnionType(_) => "UnionType",
            Node::IntersectionType(_) => "IntersectionType",
            Node::IndexedAccessType(_) => "IndexedAccessType",
            Node::TypeReference(_) => "TypeReference",
            Node::ConditionalType(_) => "ConditionalType",
            Node::MappedType(_) => "MappedType",
            Node::ArrayType(_) => "ArrayType",
            Node::TupleType(_) => "TupleType",
            Node::NamedTupleMember(_) => "NamedTupleMember",
            Node::OptionalType(_) => "OptionalType",
            Node::RestType(_) => "RestType",
            Node::ParenthesizedType(_) => "ParenthesizedType",
            Node::TypeLiteral(_) => "TypeLiteral",
            Node::PropertySignature(_) => "PropertySignature",
            Node::TypeAliasDeclaration(_) => "TypeAliasDeclaration",
            Node::TypeParameter(_) => "TypeParameter",
            Node::InterfaceDeclaration(_) => "InterfaceDeclaration",
            Node::FunctionDeclaration(_) => "FunctionDeclaration",
            Node::Parameter(_) => "Parameter",
            Node::VariableStatement(_) => "VariableStatement",
            Node::VariableDeclaration(_) => "VariableDeclaration",
            Node::Identifier(_) => "Identifier",
            Node::BinaryExpression(_) => "BinaryExpression",
            Node::CallExpression(_) => "CallExpression",
            Node::ExpressionWithTypeArguments(_) => "ExpressionWithTypeArguments",
            Node::ObjectLiteralExpression(_) => "ObjectLiteralExpression",
            Node::ArrayLiteralExpression(_) => "ArrayLiteralExpression",
            Node::ConditionalExpression(_) => "ConditionalExpression",
            Node::PropertyAssignment(_) => "PropertyAssignment",
            Node::ParenthesizedExpression(_) => "ParenthesizedExpression",
            Node::ExpressionStatement(_) => "ExpressionStatement",
        }
    }
}
