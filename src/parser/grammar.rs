// Grammar, in the notation used throughout this file:
//
// module:        statement* EOF
// statement:     modifier* ( obtain | declaration | expression [';'] | ';' )
// obtain:        'obtain' <anything> ';'
// declaration:   type declarator (',' declarator)* ';'
//              | 'fun' NAME ( '=' signature | signature | '{' (modifier* signature)+ '}' )
// declarator:    NAME ['=' additive]
// signature:     [type] '(' [parameter (',' parameter)*] ')' '->' ( '{' statement* '}' | statement )
// parameter:     ['final'] type NAME
// type:          DECLARATION_TYPE | member
//
// expression:    assignment
// assignment:    additive [('=' | BINARY_ASSIGN) assignment]
// additive:      multiplicative (('+' | '-') multiplicative)*
// multiplicative: call (('*' | '/' | '%') call)*
// call:          member ('(' [additive (',' additive)*] ')')*
// member:        primary (('.' NAME) | ('[' additive ']'))*
// primary:       NUMBER | STRING | CHARACTER | NAME | 'null' | 'true' | 'false'
//              | '(' expression ')'

use super::ast::*;
use super::error::{Diagnostic, DiagnosticKind, DiagnosticSink, Error, Result};
use super::tokenizer::{Lexer, Token, TokenType as TT};

/// Whether the source comes from an interactive session or a script.
///
/// Scripts may not use the repl-only keywords, and a bare value is not a
/// statement there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Repl,
    Script,
}

pub struct Parser<'s> {
    lexer: Lexer,
    sink: &'s mut DiagnosticSink,
    mode: Mode,
    // innermost last; declarations spill their leading declarators here
    blocks: Vec<Vec<Node>>,
}

impl<'s> Parser<'s> {
    pub fn new(lexer: Lexer, sink: &'s mut DiagnosticSink) -> Self {
        Self::with_mode(lexer, sink, Mode::Repl)
    }

    pub fn with_mode(lexer: Lexer, sink: &'s mut DiagnosticSink, mode: Mode) -> Self {
        Self {
            lexer,
            sink,
            mode,
            blocks: vec![],
        }
    }

    pub fn parse_module(&mut self) -> Result<Program> {
        let body = self.parse_block(TT::EOF)?;
        log::debug!("Successfully parsed the module");
        Ok(Program { body })
    }

    // # TOKEN HANDLING
    // # ==============

    fn token(&self) -> &Token {
        self.lexer.current()
    }

    fn at(&self, typ: TT) -> bool {
        self.token().typ == typ
    }

    /// Consumes the current token. At the end of input the `EOF` token is
    /// handed out again instead, so recovery never runs past it.
    fn advance(&mut self) -> Result<Token> {
        if self.at(TT::EOF) {
            return Ok(self.token().clone());
        }
        self.lexer.advance().map_err(|err| self.sink.escalate(err))
    }

    fn peek(&mut self, steps: usize) -> Result<Token> {
        self.lexer.lookahead(steps).map_err(|err| self.sink.escalate(err))
    }

    fn check(&mut self, expected: TT, token: &Token) -> Result<bool> {
        if token.typ == expected {
            return Ok(true);
        }
        let msg = format!(
            "unexpected symbol: {} expected: {}",
            token.typ.name(),
            expected.name()
        );
        self.sink
            .report(Diagnostic::at(DiagnosticKind::Expected, &msg, token))?;
        Ok(false)
    }

    fn check_one_of(&mut self, expected: &[TT], token: &Token) -> Result<bool> {
        if expected.contains(&token.typ) {
            return Ok(true);
        }
        let names: Vec<&str> = expected.iter().map(TT::name).collect();
        let msg = format!(
            "unexpected symbol: {} expected one of: [{}]",
            token.typ.name(),
            names.join(", ")
        );
        self.sink
            .report(Diagnostic::at(DiagnosticKind::Expected, &msg, token))?;
        Ok(false)
    }

    /// Consumes the current token if it has the expected type. Otherwise the
    /// mismatch is reported and the token is left in place, as if the
    /// expected one had been there.
    fn expect(&mut self, expected: TT) -> Result<Token> {
        let token = self.token().clone();
        if self.check(expected, &token)? {
            self.advance()
        } else {
            Ok(token)
        }
    }

    fn report(&mut self, kind: DiagnosticKind, msg: &str, token: &Token) -> Result<()> {
        self.sink.report(Diagnostic::at(kind, msg, token))
    }

    fn emit(&mut self, statement: Node) {
        if let Some(block) = self.blocks.last_mut() {
            block.push(statement);
        }
    }

    /// Emits all but the last node into the enclosing block and returns the
    /// last one.
    fn split_last(&mut self, mut nodes: Vec<Node>) -> Option<Node> {
        let last = nodes.pop();
        for node in nodes {
            self.emit(node);
        }
        last
    }

    // # STATEMENTS
    // # ==========

    fn parse_block(&mut self, terminator: TT) -> Result<Vec<Node>> {
        self.blocks.push(vec![]);
        while !self.at(terminator) && !self.at(TT::EOF) {
            if let Some(statement) = self.parse_statement()? {
                self.emit(statement);
            }
        }
        if terminator != TT::EOF {
            self.expect(terminator)?;
        }
        Ok(self.blocks.pop().unwrap_or_default())
    }

    fn parse_single_statement(&mut self) -> Result<Vec<Node>> {
        self.blocks.push(vec![]);
        let statement = self.parse_statement()?;
        let mut body = self.blocks.pop().unwrap_or_default();
        body.extend(statement);
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Option<Node>> {
        let modifiers = self.parse_modifiers()?;
        let token = self.token().clone();
        match token.typ {
            TT::OBTAIN => {
                self.skip_obtain()?;
                Ok(None)
            }
            TT::SEMI if modifiers.is_empty() => {
                self.advance()?;
                Ok(None)
            }
            TT::IDENTIFIER if self.declaration_ahead()? => {
                let typ = self.parse_member()?;
                self.parse_declaration(typ, modifiers)
            }
            typ if typ.is_declaration_type() => {
                self.advance()?;
                self.parse_declaration(Node::Identifier(token.lexeme), modifiers)
            }
            _ => {
                if !modifiers.is_empty() {
                    self.report(
                        DiagnosticKind::Syntax,
                        "attribute modifiers only apply to declarations",
                        &token,
                    )?;
                }
                let expression = self.parse_expression()?;
                if self.mode == Mode::Script
                    && !matches!(expression, Node::Assignment(..) | Node::Call(..))
                {
                    self.report(DiagnosticKind::NotAStatement, "not a statement", &token)?;
                }
                if self.at(TT::SEMI) {
                    self.advance()?;
                }
                Ok(Some(expression))
            }
        }
    }

    fn parse_modifiers(&mut self) -> Result<Modifiers> {
        let mut modifiers = Modifiers::default();
        while let Ok(modifier) = Modifier::try_from(self.token().typ) {
            let token = self.advance()?;
            if !modifiers.insert(modifier) {
                self.report(
                    DiagnosticKind::InvalidAction,
                    "repeating attribute modifier",
                    &token,
                )?;
            }
        }
        Ok(modifiers)
    }

    /// Module imports are resolved elsewhere; the statement is skipped.
    fn skip_obtain(&mut self) -> Result<()> {
        let obtain = self.advance()?;
        while !self.at(TT::SEMI) && !self.at(TT::EOF) {
            self.advance()?;
        }
        if self.at(TT::SEMI) {
            self.advance()?;
        }
        log::debug!("skipped obtain statement at {}", obtain.position);
        Ok(())
    }

    /// An identifier opens a declaration when its dotted name is followed by
    /// another identifier: `Foo.Bar name`.
    fn declaration_ahead(&mut self) -> Result<bool> {
        let mut steps = 1;
        loop {
            let token = self.peek(steps)?;
            match token.typ {
                TT::IDENTIFIER => return Ok(true),
                TT::DOT if self.peek(steps + 1)?.typ == TT::IDENTIFIER => steps += 2,
                _ => return Ok(false),
            }
        }
    }

    /// Parses the declarators following `typ`. Every declaration but the last
    /// lands in the enclosing block; the last is returned.
    pub(super) fn parse_declaration(
        &mut self,
        typ: Node,
        modifiers: Modifiers,
    ) -> Result<Option<Node>> {
        if typ.is_identifier("fun") {
            return self.parse_function_declaration(modifiers);
        }
        let typ = Box::new(typ);
        let mut declarations = vec![];
        loop {
            let name = self.expect(TT::IDENTIFIER)?;
            let value = if self.at(TT::ASSIGN) {
                self.advance()?;
                Some(Box::new(self.parse_additive()?))
            } else {
                None
            };
            declarations.push(Node::VariableDeclaration(VariableDeclaration {
                typ: typ.clone(),
                name: name.lexeme,
                value,
                modifiers: modifiers.clone(),
            }));

            let separator = self.token().clone();
            if !self.check_one_of(&[TT::SEMI, TT::COMMA], &separator)? {
                break;
            }
            self.advance()?;
            if separator.typ == TT::SEMI {
                break;
            }
        }
        Ok(self.split_last(declarations))
    }

    fn parse_function_declaration(&mut self, modifiers: Modifiers) -> Result<Option<Node>> {
        let name = self.expect(TT::IDENTIFIER)?.lexeme;
        let token = self.token().clone();
        match token.typ {
            TT::ASSIGN => {
                self.advance()?;
            }
            TT::OPEN_PAREN => {}
            TT::OPEN_BRACE => {
                self.advance()?;
                let mut overloads = vec![];
                while !self.at(TT::CLOSE_BRACE) && !self.at(TT::EOF) {
                    let specific = modifiers.merged(&self.parse_modifiers()?);
                    overloads.push(self.parse_signature(&name, specific)?);
                }
                let close = self.expect(TT::CLOSE_BRACE)?;
                if overloads.is_empty() {
                    self.report(
                        DiagnosticKind::Expected,
                        &format!("expected at least one signature for function '{name}'"),
                        &close,
                    )?;
                }
                return Ok(self.split_last(overloads));
            }
            _ => {
                self.check_one_of(&[TT::ASSIGN, TT::OPEN_BRACE], &token)?;
            }
        }
        self.parse_signature(&name, modifiers).map(Some)
    }

    fn parse_signature(&mut self, name: &str, modifiers: Modifiers) -> Result<Node> {
        let return_type = if self.at(TT::OPEN_PAREN) {
            None
        } else {
            Some(Box::new(self.parse_type()?))
        };
        self.expect(TT::OPEN_PAREN)?;
        let parameters = self.parse_parameters()?;
        self.expect(TT::LAMBDA_ARROW)?;

        let is_block_body = self.at(TT::OPEN_BRACE);
        let body = if is_block_body {
            self.advance()?;
            self.parse_block(TT::CLOSE_BRACE)?
        } else {
            self.parse_single_statement()?
        };
        Ok(Node::FunctionDeclaration(FunctionDeclaration {
            return_type,
            name: name.to_string(),
            parameters,
            body,
            modifiers,
            is_block_body,
        }))
    }

    fn parse_parameters(&mut self) -> Result<Parameters> {
        let mut parameters = Parameters::default();
        if self.at(TT::CLOSE_PAREN) {
            self.advance()?;
            return Ok(parameters);
        }
        loop {
            let is_final = self.at(TT::FINAL);
            if is_final {
                self.advance()?;
            }
            let typ = self.parse_type()?;
            let name = self.expect(TT::IDENTIFIER)?.lexeme;
            parameters.insert(Parameter {
                typ,
                name,
                is_final,
            });

            let separator = self.token().clone();
            if !self.check_one_of(&[TT::COMMA, TT::CLOSE_PAREN], &separator)? {
                break;
            }
            self.advance()?;
            if separator.typ == TT::CLOSE_PAREN {
                break;
            }
        }
        Ok(parameters)
    }

    fn parse_type(&mut self) -> Result<Node> {
        if self.token().typ.is_declaration_type() {
            let token = self.advance()?;
            return Ok(Node::Identifier(token.lexeme));
        }
        self.parse_member()
    }

    // # EXPRESSIONS
    // # ===========

    fn parse_expression(&mut self) -> Result<Node> {
        self.parse_assignment()
    }

    // Compound assignments (`a += 1`) are accepted but build a plain
    // assignment of the right hand side.
    fn parse_assignment(&mut self) -> Result<Node> {
        let target = self.parse_additive()?;
        if !matches!(self.token().typ, TT::ASSIGN | TT::BINARY_ASSIGN) {
            return Ok(target);
        }
        self.advance()?;
        let value = self.parse_assignment()?;
        Ok(Node::Assignment(Box::new(target), Box::new(value)))
    }

    fn binary_operator(&self, accept: fn(&Operator) -> bool) -> Option<Operator> {
        let token = self.token();
        if token.typ != TT::BINARY_OPERATOR {
            return None;
        }
        Operator::from_symbol(&token.lexeme).filter(accept)
    }

    fn parse_additive(&mut self) -> Result<Node> {
        let mut left = self.parse_multiplicative()?;
        while let Some(operator) = self.binary_operator(Operator::is_additive) {
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Node::binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node> {
        let mut left = self.parse_call()?;
        while let Some(operator) = self.binary_operator(Operator::is_multiplicative) {
            self.advance()?;
            let right = self.parse_call()?;
            left = Node::binary(operator, left, right);
        }
        Ok(left)
    }

    // `f(a)(b)` applies the second argument list to the result of the first
    fn parse_call(&mut self) -> Result<Node> {
        let mut callee = self.parse_member()?;
        while self.at(TT::OPEN_PAREN) {
            self.advance()?;
            let arguments = self.parse_arguments()?;
            callee = Node::Call(Box::new(callee), arguments);
        }
        Ok(callee)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>> {
        let mut arguments = vec![];
        if self.at(TT::CLOSE_PAREN) {
            self.advance()?;
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_additive()?);
            let separator = self.token().clone();
            if !self.check_one_of(&[TT::COMMA, TT::CLOSE_PAREN], &separator)? {
                break;
            }
            self.advance()?;
            if separator.typ == TT::CLOSE_PAREN {
                break;
            }
        }
        Ok(arguments)
    }

    fn parse_member(&mut self) -> Result<Node> {
        let mut parent = self.parse_primary()?;
        if !matches!(parent, Node::Identifier(_)) {
            return Ok(parent);
        }
        while matches!(self.token().typ, TT::DOT | TT::OPEN_BRACKET) {
            let computed = self.advance()?.typ == TT::OPEN_BRACKET;
            let child = if computed {
                let child = self.parse_additive()?;
                self.expect(TT::CLOSE_BRACKET)?;
                child
            } else {
                Node::Identifier(self.expect(TT::IDENTIFIER)?.lexeme)
            };
            parent = Node::Member {
                parent: Box::new(parent),
                child: Box::new(child),
                computed,
            };
        }
        Ok(parent)
    }

    fn parse_primary(&mut self) -> Result<Node> {
        let token = self.token().clone();
        match token.typ {
            TT::NUMBER_VALUE => {
                self.advance()?;
                Ok(Node::NumberLiteral(self.number(&token)?))
            }
            TT::STRING => {
                self.advance()?;
                Ok(Node::StringLiteral(token.lexeme))
            }
            TT::CHARACTER => {
                self.advance()?;
                Ok(Node::CharLiteral(self.character(&token)?))
            }
            TT::IDENTIFIER => {
                self.advance()?;
                Ok(Node::Identifier(token.lexeme))
            }
            typ if typ.is_repl_only() => {
                self.advance()?;
                if self.mode != Mode::Repl {
                    self.report(
                        DiagnosticKind::NotReplMode,
                        &format!("'{}' is only available in a repl session", token.lexeme),
                        &token,
                    )?;
                }
                Ok(Node::Identifier(token.lexeme))
            }
            TT::OPEN_PAREN => {
                self.advance()?;
                let expression = self.parse_expression()?;
                self.expect(TT::CLOSE_PAREN)?;
                Ok(expression)
            }
            TT::NULL => {
                self.advance()?;
                Ok(Node::NullLiteral)
            }
            TT::TRUE | TT::FALSE => {
                self.advance()?;
                Ok(Node::BooleanLiteral(token.typ == TT::TRUE))
            }
            _ => {
                let msg = format!("could not parse following token: {token}");
                let diagnostic = Diagnostic::at(DiagnosticKind::Fatal, &msg, &token);
                Err(self.sink.escalate(Error::Halt(diagnostic)))
            }
        }
    }

    // Number tokens are lexed leniently (`1x2` is one token), so they may
    // still fail to convert. A single float or double suffix is allowed.
    fn number(&mut self, token: &Token) -> Result<f32> {
        let digits = token
            .lexeme
            .strip_suffix(['f', 'F', 'd', 'D'])
            .unwrap_or(token.lexeme.as_str());
        match digits.parse::<f32>() {
            Ok(value) => Ok(value),
            Err(_) => {
                self.report(
                    DiagnosticKind::Syntax,
                    &format!("malformed number literal '{}'", token.lexeme),
                    token,
                )?;
                Ok(0.0)
            }
        }
    }

    // Escapes stay raw, so `'\n'` arrives as a backslash and an `n`; the
    // literal's value is its first character either way.
    fn character(&mut self, token: &Token) -> Result<char> {
        let mut chars = token.lexeme.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(chr), None, None) => Ok(chr),
            (Some('\\'), Some(_), None) => Ok('\\'),
            (first, _, _) => {
                self.report(
                    DiagnosticKind::Syntax,
                    "a character literal holds exactly one character",
                    token,
                )?;
                Ok(first.unwrap_or('\0'))
            }
        }
    }
}
