//! AST lowering
//!
//! A recursive translation keyed on node kind. Most nodes emit straight
//! into the current write target; constructs that need deferred evaluation
//! (type aliases, generic functions, type-parameter defaults) open a
//! subroutine, and conditional types additionally open sections and
//! back-patch their forward jumps once branch extents are known.

use tyvm_ast::{ConditionalType, Identifier, Node, SourceFile};
use tyvm_bytecode::{ErrorCode, Op};

use crate::error::{CompileError, CompileResult};
use crate::program::Program;
use crate::symbol::SymbolKind;

/// Compile a source file into a [`Program`].
pub fn compile(file: &SourceFile) -> CompileResult<Program> {
    Compiler::new().compile(file)
}

/// The AST-directed emitter.
#[derive(Debug, Default)]
pub struct Compiler {
    program: Program,
}

impl Compiler {
    /// Create a compiler with an empty program.
    pub fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    /// Lower `file` and return the finished program.
    pub fn compile(mut self, file: &SourceFile) -> CompileResult<Program> {
        for statement in &file.statements {
            self.handle(statement)?;
        }
        Ok(self.program)
    }

    fn handle(&mut self, node: &Node) -> CompileResult<()> {
        match node {
            Node::SourceFile(n) => {
                for statement in &n.statements {
                    self.handle(statement)?;
                }
            }

            Node::AnyKeyword(span) => self.program.push_op_at(Op::Any, *span),
            Node::UnknownKeyword(span) => self.program.push_op_at(Op::Unknown, *span),
            Node::NullKeyword(span) => self.program.push_op_at(Op::Null, *span),
            Node::UndefinedKeyword(span) => self.program.push_op_at(Op::Undefined, *span),
            Node::NeverKeyword(span) => self.program.push_op_at(Op::Never, *span),
            Node::BooleanKeyword(span) => self.program.push_op_at(Op::Boolean, *span),
            Node::StringKeyword(span) => self.program.push_op_at(Op::String, *span),
            Node::NumberKeyword(span) => self.program.push_op_at(Op::Number, *span),
            Node::TrueKeyword(span) => self.program.push_op_at(Op::True, *span),
            Node::FalseKeyword(span) => self.program.push_op_at(Op::False, *span),

            Node::BigIntLiteral(n) => {
                self.program.push_op_at(Op::BigIntLiteral, n.span);
                self.program.push_storage(&n.text);
            }
            Node::NumericLiteral(n) => {
                self.program.push_op_at(Op::NumberLiteral, n.span);
                self.program.push_storage(&n.text);
            }
            Node::StringLiteral(n) => {
                self.program.push_op_at(Op::StringLiteral, n.span);
                self.program.push_storage(&n.text);
            }
            Node::LiteralType(n) => self.handle(&n.literal)?,

            Node::TemplateLiteralType(n) => {
                self.program.push_frame(false);

                if !n.head.raw_text.is_empty() {
                    self.program.push_op_at(Op::StringLiteral, n.head.span);
                    self.program.push_storage(&n.head.raw_text);
                }

                for span_node in &n.spans {
                    self.handle(&span_node.ty)?;
                    if !span_node.literal.raw_text.is_empty() {
                        self.program
                            .push_op_at(Op::StringLiteral, span_node.literal.span);
                        self.program.push_storage(&span_node.literal.raw_text);
                    }
                }

                self.program.push_op_at(Op::TemplateLiteral, n.span);
                self.program.pop_frame_implicit();
            }

            Node::UnionType(n) => {
                self.program.push_frame(false);
                for member in &n.types {
                    self.handle(member)?;
                }
                self.program.push_op_at(Op::Union, n.span);
                self.program.pop_frame_implicit();
            }

            Node::IndexedAccessType(n) => {
                let length_access = matches!(
                    n.index_type.as_ref(),
                    Node::LiteralType(literal)
                        if matches!(
                            literal.literal.as_ref(),
                            Node::StringLiteral(text) if text.text == "length"
                        )
                );

                if length_access {
                    self.handle(&n.object_type)?;
                    self.program.push_op_at(Op::Length, n.span);
                } else {
                    self.handle(&n.object_type)?;
                    self.handle(&n.index_type)?;
                    self.program.push_op_at(Op::IndexAccess, n.span);
                }
            }

            Node::TypeReference(n) => {
                self.lower_reference(&n.type_name, n.type_arguments.as_deref(), true)?;
            }
            Node::Identifier(n) => {
                self.lower_reference(n, n.type_arguments.as_deref(), false)?;
            }

            Node::TypeAliasDeclaration(n) => {
                let id = self.program.push_symbol_for_routine(
                    &n.name.escaped_text,
                    SymbolKind::Type,
                    n.span,
                );
                if self.program.frames.symbol(id).declaration_count > 1 {
                    self.program.push_error(ErrorCode::Redeclared, n.span);
                } else {
                    self.program.push_subroutine(&n.name.escaped_text)?;

                    // The routine stores its result, so a tail call must
                    // not replace the activation; instantiations of a
                    // generic alias are not cached this way.
                    if n.type_parameters.as_ref().is_none_or(|p| p.is_empty()) {
                        self.program.block_tail_call();
                    }

                    if let Some(type_parameters) = &n.type_parameters {
                        for parameter in type_parameters {
                            self.handle(parameter)?;
                        }
                    }

                    self.handle(&n.ty)?;
                    self.program.pop_subroutine()?;
                }
            }

            Node::Parameter(n) => {
                match &n.ty {
                    Some(ty) => self.handle(ty)?,
                    None => self.program.push_op_at(Op::Unknown, n.span),
                }
                self.program.push_op_at(Op::Parameter, n.span);
                match &n.name {
                    Some(name) => self.program.push_storage(&name.escaped_text),
                    None => self.program.push_storage(""),
                }
                if n.question_token {
                    self.program.push_op_at(Op::Optional, n.span);
                }
                if let Some(initializer) = &n.initializer {
                    self.handle(initializer)?;
                    self.program.push_op_at(Op::Initializer, initializer.span());
                }
            }

            Node::TypeParameter(n) => {
                self.program
                    .push_symbol(&n.name.escaped_text, SymbolKind::TypeArgument, n.span);
                if let Some(default) = &n.default {
                    self.program.push_subroutine_nameless();
                    self.handle(default)?;
                    let routine = self.program.pop_subroutine()?;
                    self.program.push_op_at(Op::TypeArgumentDefault, n.name.span);
                    self.program.push_address(routine);
                } else {
                    self.program.push_op_at(Op::TypeArgument, n.name.span);
                }
            }

            Node::FunctionDeclaration(n) => {
                let Some(name) = &n.name else {
                    tracing::debug!("function declaration without identifier name");
                    return Ok(());
                };

                let id = self.program.push_symbol_for_routine(
                    &name.escaped_text,
                    SymbolKind::Function,
                    name.span,
                );
                if self.program.frames.symbol(id).declaration_count > 1 {
                    self.program.push_error(ErrorCode::Redeclared, n.span);
                } else if let Some(type_parameters) = &n.type_parameters {
                    // A generic function lowers to a FunctionRef wrapping a
                    // nameless inner routine; the VM instantiates the inner
                    // routine per call site.
                    self.program.push_subroutine(&name.escaped_text)?;
                    let inner = self.program.push_subroutine_nameless();

                    for parameter in type_parameters {
                        self.handle(parameter)?;
                    }
                    for parameter in &n.parameters {
                        self.handle(parameter)?;
                    }
                    match &n.return_type {
                        Some(return_type) => self.handle(return_type)?,
                        None => self.program.push_op(Op::Unknown),
                    }
                    self.program.push_op_at(Op::Function, n.span);
                    self.program.pop_subroutine()?;

                    self.program.push_op_at(Op::FunctionRef, n.span);
                    self.program.push_address(inner);
                    self.program.pop_subroutine()?;
                } else {
                    self.program.push_subroutine(&name.escaped_text)?;
                    for parameter in &n.parameters {
                        self.handle(parameter)?;
                    }
                    match &n.return_type {
                        Some(return_type) => self.handle(return_type)?,
                        None => self.program.push_op(Op::Unknown),
                    }
                    self.program.push_op_at(Op::Function, n.span);
                    self.program.pop_subroutine()?;
                }
            }

            Node::PropertySignature(n) => {
                match &n.ty {
                    Some(ty) => self.handle(ty)?,
                    None => self.program.push_op(Op::Any),
                }
                match n.name.as_ref() {
                    Node::Identifier(name) => {
                        self.program.push_string_literal(&name.escaped_text, name.span);
                    }
                    // Computed name like `[a]: string`.
                    other => self.handle(other)?,
                }
                self.program.push_op_at(Op::PropertySignature, n.span);
                if n.question_token {
                    self.program.push_op(Op::Optional);
                }
                if n.readonly {
                    self.program.push_op(Op::Readonly);
                }
            }

            Node::PropertyAssignment(n) => {
                match &n.initializer {
                    Some(initializer) => self.handle(initializer)?,
                    None => self.program.push_op_at(Op::Any, n.span),
                }
                match n.name.as_ref() {
                    Node::Identifier(name) => {
                        self.program.push_string_literal(&name.escaped_text, name.span);
                    }
                    other => self.handle(other)?,
                }
                self.program.push_op_at(Op::PropertySignature, n.name.span());
                if n.question_token {
                    self.program.push_op(Op::Optional);
                }
                if n.readonly {
                    self.program.push_op(Op::Readonly);
                }
            }

            Node::InterfaceDeclaration(n) => {
                self.program.push_frame(false);

                for extend in &n.extends_types {
                    self.handle(extend)?;
                }
                for member in &n.members {
                    self.handle(member)?;
                }

                self.program.push_op_at(Op::ObjectLiteral, n.name.span);
                self.program.pop_frame_implicit();
            }

            Node::TypeLiteral(n) => {
                self.program.push_frame(false);
                for member in &n.members {
                    self.handle(member)?;
                }
                self.program.push_op_at(Op::ObjectLiteral, n.span);
                self.program.pop_frame_implicit();
            }

            Node::ConditionalType(n) => self.lower_conditional_type(n)?,

            Node::ArrayType(n) => {
                self.handle(&n.element_type)?;
                self.program.push_op_at(Op::Array, n.span);
            }

            Node::TupleType(n) => {
                self.program.push_frame(false);
                for element in &n.elements {
                    match element {
                        Node::NamedTupleMember(member) => {
                            self.handle(&member.ty)?;
                            if member.dot_dot_dot_token {
                                self.program.push_op(Op::Rest);
                            }
                            self.program.push_op_at(Op::TupleMember, member.span);
                            if member.question_token {
                                self.program.push_op(Op::Optional);
                            }
                        }
                        Node::OptionalType(optional) => {
                            self.handle(&optional.ty)?;
                            self.program.push_op_at(Op::TupleMember, optional.span);
                            self.program.push_op(Op::Optional);
                        }
                        other => {
                            self.handle(other)?;
                            self.program.push_op_at(Op::TupleMember, other.span());
                        }
                    }
                }
                self.program.push_op_at(Op::Tuple, n.span);
                self.program.pop_frame_implicit();
            }

            Node::RestType(n) => {
                self.handle(&n.ty)?;
                self.program.push_op_at(Op::Rest, n.span);
            }

            Node::BinaryExpression(n) => {
                // Only `=` exists at the type level: narrow the routine
                // backing the left-hand symbol.
                let Node::Identifier(name) = n.left.as_ref() else {
                    return Err(CompileError::InvalidAssignmentTarget);
                };
                match self.program.find_symbol(&name.escaped_text) {
                    None => {
                        self.program.push_op_at(Op::Never, name.span);
                        self.program.push_error(ErrorCode::CannotFind, name.span);
                    }
                    Some(id) => {
                        let routine = self
                            .program
                            .frames
                            .symbol(id)
                            .routine
                            .ok_or_else(|| CompileError::NotARoutine(name.escaped_text.clone()))?;
                        self.handle(&n.right)?;
                        self.program.push_op_at(Op::Set, n.span);
                        self.program.push_address(routine);
                    }
                }
            }

            Node::VariableStatement(n) => {
                for declaration in &n.declarations {
                    self.handle(declaration)?;
                }
            }

            Node::VariableDeclaration(n) => {
                let Some(name) = &n.name else {
                    tracing::debug!("variable declaration without identifier name");
                    return Ok(());
                };

                let id = self.program.push_symbol_for_routine(
                    &name.escaped_text,
                    SymbolKind::Variable,
                    name.span,
                );
                if self.program.frames.symbol(id).declaration_count > 1 {
                    self.program.push_error(ErrorCode::Redeclared, n.span);
                } else if let Some(ty) = &n.ty {
                    let routine = self.program.push_subroutine(&name.escaped_text)?;
                    // The routine stores the declared type as the
                    // variable's wide type.
                    self.program.block_tail_call();
                    self.handle(ty)?;
                    self.program.pop_subroutine()?;

                    if let Some(initializer) = &n.initializer {
                        self.handle(initializer)?;
                        self.program.push_op(Op::Call);
                        self.program.push_address(routine);
                        self.program.push_u16(0);
                        self.program.push_op_at(Op::Assign, name.span);
                    }
                } else {
                    let routine = self.program.push_subroutine(&name.escaped_text)?;

                    if let Some(initializer) = &n.initializer {
                        // let x = true is boolean, const x = true stays true.
                        self.handle(initializer)?;
                        if !n.is_const {
                            self.program.push_op(Op::Widen);
                        }
                        self.program.pop_subroutine()?;

                        if !n.is_const {
                            // The narrowed type starts at the initializer.
                            self.handle(initializer)?;
                            self.program.push_op(Op::Set);
                            self.program.push_address(routine);
                        }
                    } else {
                        self.program.push_op(Op::Any);
                        self.program.pop_subroutine()?;
                    }
                }
            }

            Node::CallExpression(n) => {
                if let Some(type_arguments) = &n.type_arguments {
                    for argument in type_arguments {
                        self.handle(argument)?;
                    }
                }

                self.handle(&n.expression)?;

                if let Some(type_arguments) = &n.type_arguments {
                    self.program.push_op_at(Op::Instantiate, n.span);
                    self.program.push_u16(type_arguments.len() as u16);
                }

                for argument in &n.arguments {
                    self.handle(argument)?;
                }
                self.program.push_op_at(Op::CallExpression, n.span);
                self.program.push_u16(n.arguments.len() as u16);
            }

            Node::ExpressionWithTypeArguments(n) => {
                if let Some(type_arguments) = &n.type_arguments {
                    for argument in type_arguments {
                        self.handle(argument)?;
                    }
                }

                self.handle(&n.expression)?;

                if let Some(type_arguments) = &n.type_arguments {
                    self.program.push_op_at(Op::Instantiate, n.span);
                    self.program.push_u16(type_arguments.len() as u16);
                }
            }

            Node::ObjectLiteralExpression(n) => {
                self.program.push_frame(false);
                for property in &n.properties {
                    self.handle(property)?;
                }
                self.program.push_op_at(Op::ObjectLiteral, n.span);
                self.program.pop_frame_implicit();
            }

            Node::ArrayLiteralExpression(n) => {
                self.program.push_frame(false);
                for element in &n.elements {
                    self.handle(element)?;
                    self.program.push_op_at(Op::TupleMember, element.span());
                }
                self.program.push_op_at(Op::Tuple, n.span);
                self.program.pop_frame_implicit();
            }

            Node::ConditionalExpression(n) => {
                // The condition does not narrow: the result is always the
                // union of both branches.
                self.program.push_frame(false);
                self.handle(&n.when_false)?;
                self.handle(&n.when_true)?;
                self.program.push_op_at(Op::Union, n.span);
                self.program.pop_frame_implicit();
            }

            Node::ExpressionStatement(n) => self.handle(&n.expression)?,
            Node::ParenthesizedType(n) => self.handle(&n.ty)?,
            Node::ParenthesizedExpression(n) => self.handle(&n.expression)?,

            other => {
                tracing::debug!("node kind {} not handled", other.kind());
            }
        }

        Ok(())
    }

    /// Lower a reference to a named symbol: a load for type arguments and
    /// type variables, a call for routine-backed symbols.
    fn lower_reference(
        &mut self,
        name: &Identifier,
        type_arguments: Option<&[Node]>,
        register_usage: bool,
    ) -> CompileResult<()> {
        let Some(id) = self.program.find_symbol(&name.escaped_text) else {
            self.program.push_op_at(Op::Never, name.span);
            self.program.push_error(ErrorCode::CannotFind, name.span);
            return Ok(());
        };

        let (kind, routine, symbol_index) = {
            let symbol = self.program.frames.symbol(id);
            (symbol.kind, symbol.routine, symbol.index)
        };

        if matches!(kind, SymbolKind::TypeArgument | SymbolKind::TypeVariable) {
            self.program.push_op_at(Op::Loads, name.span);
            self.program.push_symbol_address(id);
            if register_usage && kind == SymbolKind::TypeArgument {
                self.program.register_type_argument_usage(symbol_index);
            }
        } else {
            if let Some(arguments) = type_arguments {
                for argument in arguments {
                    self.handle(argument)?;
                }
            }
            let routine = routine
                .ok_or_else(|| CompileError::NotARoutine(name.escaped_text.clone()))?;
            self.program.push_op_at(Op::Call, name.span);
            self.program.push_address(routine);
            self.program
                .push_u16(type_arguments.map_or(0, |arguments| arguments.len() as u16));
        }

        Ok(())
    }

    /// Lower a conditional type.
    ///
    /// When the check operand is a bare type reference the conditional is
    /// distributive: the body is wrapped in a `Distribute` loop that the
    /// VM runs once per union member, rebinding the check variable each
    /// iteration.
    fn lower_conditional_type(&mut self, n: &ConditionalType) -> CompileResult<()> {
        let distribute_over = match n.check_type.as_ref() {
            Node::TypeReference(reference) => Some(&reference.type_name),
            _ => None,
        };

        self.program.push_section();

        let mut distribute_jump_ip = 0;
        if let Some(identifier) = distribute_over {
            // Loads the input type onto the stack; Distribute pops it.
            self.handle(&n.check_type)?;

            // The section runs once per member, so no tail calls inside.
            self.program.block_tail_call();
            self.program.push_frame(true);

            // Distribute keeps an implicit type variable on the stack and
            // repopulates it per member.
            self.program.push_symbol(
                &identifier.escaped_text,
                SymbolKind::TypeVariable,
                identifier.span,
            );

            self.program.push_op(Op::Distribute);
            distribute_jump_ip = self.program.ip();
            self.program.push_address(0);
        }

        self.program.push_frame(false);
        self.program.frames.current_mut().conditional = true;

        self.handle(&n.check_type)?;
        self.handle(&n.extends_type)?;
        self.program.push_op_at(Op::Extends, n.span);

        self.program.push_op(Op::JumpCondition);
        let relative_to = self.program.ip();
        let false_jump_address_ip = self.program.ip();
        // The true branch sits directly behind the parameter slot.
        self.program.push_address(0);

        self.program.push_section();
        self.handle(&n.true_type)?;
        self.program.pop_section();

        self.program.ignore_next_section_op();
        self.program.push_op(Op::Jump);
        let true_jump_address_ip = self.program.ip();
        self.program.push_address(0);

        let false_program = self.program.ip() + 1;
        self.program.push_section();
        self.handle(&n.false_type)?;
        self.program.pop_section();
        let false_end_ip = self.program.ip();

        self.program
            .write_int32_at(false_jump_address_ip, (false_program - relative_to) as i32);
        self.program.write_int32_at(
            true_jump_address_ip,
            (false_end_ip - true_jump_address_ip + 1) as i32,
        );

        if distribute_over.is_some() {
            // Exit lands past the loop-back jump; the offset spans the
            // Distribute parameter, the symbol header, and the branches.
            self.program
                .write_address_at(distribute_jump_ip, false_end_ip - distribute_jump_ip + 6);
            self.program.ignore_next_section_op();
            self.program.push_op(Op::FrameReturnJump);
            let back = -((self.program.ip() - distribute_jump_ip) as i32);
            self.program.push_int32(back);
            self.program.pop_frame_implicit();
        } else {
            self.program.ignore_next_section_op();
            self.program.pop_frame();
        }

        self.program.pop_section();
        Ok(())
    }
}
