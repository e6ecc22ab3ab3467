//! Shared AST builders for the e2e tests.
//!
//! The parser is an external collaborator, so tests construct the trees it
//! would produce. Spans are left empty unless a test checks sourcemaps.

#![allow(dead_code)]

use tyvm_ast::{
    ConditionalType, Identifier, Literal, LiteralType, Node, SourceFile, Span,
    TypeAliasDeclaration, TypeParameter, TypeReference, UnionType,
};
use tyvm_bytecode::Op;

pub fn sp() -> Span {
    Span::default()
}

pub fn ident(name: &str) -> Identifier {
    Identifier::new(name, sp())
}

pub fn source(statements: Vec<Node>) -> SourceFile {
    SourceFile {
        statements,
        span: sp(),
    }
}

pub fn alias(name: &str, ty: Node) -> Node {
    Node::TypeAliasDeclaration(TypeAliasDeclaration {
        name: ident(name),
        type_parameters: None,
        ty: Box::new(ty),
        span: sp(),
    })
}

pub fn generic_alias(name: &str, params: &[&str], ty: Node) -> Node {
    Node::TypeAliasDeclaration(TypeAliasDeclaration {
        name: ident(name),
        type_parameters: Some(params.iter().map(|param| type_param(param)).collect()),
        ty: Box::new(ty),
        span: sp(),
    })
}

pub fn type_param(name: &str) -> Node {
    Node::TypeParameter(TypeParameter {
        name: ident(name),
        default: None,
        span: sp(),
    })
}

pub fn ty_ref(name: &str) -> Node {
    Node::TypeReference(TypeReference {
        type_name: ident(name),
        type_arguments: None,
        span: sp(),
    })
}

pub fn ty_ref_with(name: &str, args: Vec<Node>) -> Node {
    Node::TypeReference(TypeReference {
        type_name: ident(name),
        type_arguments: Some(args),
        span: sp(),
    })
}

pub fn string_keyword() -> Node {
    Node::StringKeyword(sp())
}

pub fn number_keyword() -> Node {
    Node::NumberKeyword(sp())
}

pub fn never_keyword() -> Node {
    Node::NeverKeyword(sp())
}

pub fn lit_str(text: &str) -> Node {
    Node::LiteralType(LiteralType {
        literal: Box::new(Node::StringLiteral(Literal::new(text, sp()))),
        span: sp(),
    })
}

pub fn lit_num(text: &str) -> Node {
    Node::LiteralType(LiteralType {
        literal: Box::new(Node::NumericLiteral(Literal::new(text, sp()))),
        span: sp(),
    })
}

pub fn union(types: Vec<Node>) -> Node {
    Node::UnionType(UnionType { types, span: sp() })
}

pub fn conditional(check: Node, extends: Node, when_true: Node, when_false: Node) -> Node {
    Node::ConditionalType(ConditionalType {
        check_type: Box::new(check),
        extends_type: Box::new(extends),
        true_type: Box::new(when_true),
        false_type: Box::new(when_false),
        span: sp(),
    })
}

/// Decode an opcode stream into `(position, opcode)` pairs.
pub fn walk(ops: &[u8]) -> Vec<(usize, Op)> {
    let mut decoded = Vec::new();
    let mut ip = 0;
    while ip < ops.len() {
        let op = Op::from_byte(ops[ip]).unwrap_or_else(|| panic!("bad opcode at {ip}"));
        decoded.push((ip, op));
        ip += 1 + op.param_width();
    }
    decoded
}
