mod session;
mod value;

pub use session::Session;
pub use value::Value;

use crate::parser::{
    Diagnostic, DiagnosticKind, DiagnosticSink, Error, Node, Operator, Program, Result,
};

/// Tree-walking evaluator. Recoverable runtime problems go to the sink, the
/// evaluation carries on with `Value::Null`.
pub struct Interpreter<'s> {
    sink: &'s mut DiagnosticSink,
}

impl<'s> Interpreter<'s> {
    pub fn new(sink: &'s mut DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Evaluates every statement in order; the program's value is that of
    /// the last one.
    pub fn evaluate_program(&mut self, program: &Program, session: &Session) -> Result<Value> {
        let mut last = Value::Null;
        for statement in program.body.iter() {
            last = self.evaluate(statement, session)?;
        }
        log::debug!("program evaluated to {last}");
        Ok(last)
    }

    pub fn evaluate(&mut self, node: &Node, session: &Session) -> Result<Value> {
        match node {
            Node::Program(program) => self.evaluate_program(program, session),
            Node::NumberLiteral(n) => Ok(Value::Number(*n)),
            Node::BooleanLiteral(b) => Ok(Value::Boolean(*b)),
            Node::NullLiteral => Ok(Value::Null),
            Node::Identifier(symbol) => session.lookup(symbol, self.sink),
            Node::VariableDeclaration(decl) => {
                let value = match &decl.value {
                    Some(expr) => Some(self.evaluate(expr, session)?),
                    None => None,
                };
                session.declare(&decl.name, value, self.sink)
            }
            Node::Binary(operator, operands) => {
                let (left, right) = operands.as_ref();
                // right first
                let rhs = self.evaluate(right, session)?;
                let lhs = self.evaluate(left, session)?;
                let result = apply(*operator, lhs, rhs);
                log::debug!("{lhs} {operator} {rhs} = {result}");
                Ok(result)
            }
            Node::Assignment(target, value) => match target.as_ref() {
                Node::Identifier(name) => {
                    let value = self.evaluate(value, session)?;
                    session.assign(name, value, self.sink)
                }
                _ => Err(self.not_ready(node)),
            },
            _ => Err(self.not_ready(node)),
        }
    }

    fn not_ready(&mut self, node: &Node) -> Error {
        let msg = format!(
            "The following statement is not ready for interpretation: {}",
            kind_of(node)
        );
        self.sink
            .escalate(Error::Halt(Diagnostic::new(DiagnosticKind::Fatal, &msg)))
    }
}

fn apply(operator: Operator, lhs: Value, rhs: Value) -> Value {
    let (l, r) = match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => (l, r),
        _ => return Value::Null,
    };
    let n = match operator {
        Operator::Plus => l + r,
        Operator::Minus => l - r,
        Operator::Times => l * r,
        Operator::Divide => l / r,
        Operator::Modulo => l % r,
        Operator::Power => l.powf(r),
    };
    Value::Number(n)
}

fn kind_of(node: &Node) -> &'static str {
    match node {
        Node::Program(_) => "Program",
        Node::VariableDeclaration(_) => "VariableDeclaration",
        Node::FunctionDeclaration(_) => "FunctionDeclaration",
        Node::Assignment(..) => "Assignment",
        Node::Member { .. } => "Member",
        Node::Call(..) => "Call",
        Node::Binary(..) => "Binary",
        Node::Identifier(_) => "Identifier",
        Node::NumberLiteral(_) => "NumberLiteral",
        Node::StringLiteral(_) => "StringLiteral",
        Node::CharLiteral(_) => "CharLiteral",
        Node::BooleanLiteral(_) => "BooleanLiteral",
        Node::NullLiteral => "NullLiteral",
    }
}
