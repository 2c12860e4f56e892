mod parser;
pub use parser::tokenizer::{tokenize, Lexer, Token, TokenType};
pub use parser::{
    parse, parse_interactive, Diagnostic, DiagnosticKind, DiagnosticSink, Error,
    FunctionDeclaration, Mode, Modifier, Modifiers, Node, Operator, Parameter, Parameters,
    Parser, Position, Program, Result, VariableDeclaration,
};

mod interpreter;
pub use interpreter::{Interpreter, Session, Value};
