mod ast;
mod error;
mod grammar;
mod locations;
pub mod tokenizer;

pub use ast::*;
pub use error::{Diagnostic, DiagnosticKind, DiagnosticSink, Error, Result};
pub use grammar::{Mode, Parser};
pub use locations::Position;
pub use tokenizer::{tokenize, Lexer, Token, TokenType};

/// Parses a script: repl-only keywords and bare values are reported.
pub fn parse(source: &str, sink: &mut DiagnosticSink) -> Result<Program> {
    parse_with_mode(source, sink, Mode::Script)
}

/// Parses one line typed into an interactive session.
pub fn parse_interactive(source: &str, sink: &mut DiagnosticSink) -> Result<Program> {
    parse_with_mode(source, sink, Mode::Repl)
}

fn parse_with_mode(source: &str, sink: &mut DiagnosticSink, mode: Mode) -> Result<Program> {
    let lexer = Lexer::new(source).map_err(|err| sink.escalate(err))?;
    Parser::with_mode(lexer, sink, mode).parse_module()
}

#[cfg(test)]
mod test;
