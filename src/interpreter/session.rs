use super::Value;
use crate::parser::{Diagnostic, DiagnosticKind, DiagnosticSink, Result};
use derivative::Derivative;
use std::cell::RefCell;
use std::collections::HashMap;

/// One scope of variables. A name maps to `None` while it is declared but
/// not yet assigned. Lookups and assignments fall through to the parent.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Session<'p> {
    variables: RefCell<HashMap<String, Option<Value>>>,
    #[derivative(Debug = "ignore")]
    parent: Option<&'p Session<'p>>,
}

impl<'p> Session<'p> {
    pub fn new(parent: Option<&'p Session<'p>>) -> Self {
        Self {
            variables: RefCell::new(HashMap::new()),
            parent,
        }
    }

    /// Declares `name` in this scope and hands the value back, `Null` when
    /// there is none. A second declaration is reported and the first binding
    /// is kept.
    pub fn declare(
        &self,
        name: &str,
        value: Option<Value>,
        sink: &mut DiagnosticSink,
    ) -> Result<Value> {
        let mut variables = self.variables.borrow_mut();
        if variables.contains_key(name) {
            let msg = format!("Already existing variable '{name}' cannot be redefined");
            sink.report(Diagnostic::new(DiagnosticKind::InvalidAction, &msg))?;
        } else {
            variables.insert(name.to_string(), value);
        }
        Ok(value.unwrap_or(Value::Null))
    }

    pub fn lookup(&self, name: &str, sink: &mut DiagnosticSink) -> Result<Value> {
        let (kind, msg) = match self.resolve(name) {
            Some(Some(value)) => return Ok(value),
            Some(None) => (
                DiagnosticKind::UnassignedVariableQueried,
                format!("Variable '{name}' has no value assigned"),
            ),
            None => (
                DiagnosticKind::NotFound,
                format!("Variable '{name}' not found"),
            ),
        };
        sink.report(Diagnostic::new(kind, &msg))?;
        Ok(Value::Null)
    }

    /// Writes to the nearest scope declaring `name` and hands `value` back,
    /// also when no scope does.
    pub fn assign(&self, name: &str, value: Value, sink: &mut DiagnosticSink) -> Result<Value> {
        if let Some(slot) = self.variables.borrow_mut().get_mut(name) {
            *slot = Some(value);
            return Ok(value);
        }
        match self.parent {
            Some(parent) => parent.assign(name, value, sink),
            None => {
                let msg = format!("Variable '{name}' does not exist");
                sink.report(Diagnostic::new(DiagnosticKind::InvalidAction, &msg))?;
                Ok(value)
            }
        }
    }

    fn resolve(&self, name: &str) -> Option<Option<Value>> {
        if let Some(value) = self.variables.borrow().get(name) {
            return Some(*value);
        }
        self.parent.and_then(|parent| parent.resolve(name))
    }
}
