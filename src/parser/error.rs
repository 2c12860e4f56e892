use super::tokenizer::{split_lines, Token};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot tokenize an empty source")]
    EmptySource,
    #[error("end of input already reached")]
    EndOfInput,
    /// A fatal diagnostic ended the run.
    #[error("{0}")]
    Halt(Diagnostic),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiagnosticKind {
    Syntax,
    Expected,
    InvalidAction,
    NotAStatement,
    NotFound,
    Fatal,
    NotReplMode,
    UnassignedVariableQueried,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Syntax => "SYNTAX",
            Self::Expected => "EXPECTED",
            Self::InvalidAction => "INVALID_ACTION",
            Self::NotAStatement => "NOT_A_STATEMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Fatal => "FATAL",
            Self::NotReplMode => "NOT_REPL_MODE",
            Self::UnassignedVariableQueried => "UNASSIGNED_VARIABLE_QUERIED",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub token: Option<Token>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, msg: &str) -> Self {
        Self {
            kind,
            message: msg.to_string(),
            token: None,
        }
    }
    pub fn at(kind: DiagnosticKind, msg: &str, token: &Token) -> Self {
        Self {
            kind,
            message: msg.to_string(),
            token: Some(token.clone()),
        }
    }
    pub fn is_fatal(&self) -> bool {
        self.kind == DiagnosticKind::Fatal
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "{}: {} at {}",
                self.kind, self.message, token.position
            ),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Collects the diagnostics of one unit of source.
///
/// Fatal diagnostics are rendered the moment they are reported and come back
/// as `Err(Error::Halt)`; every other kind is buffered until `flush`.
#[derive(Debug)]
pub struct DiagnosticSink {
    lines: Vec<String>,
    origin: String,
    buffered: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new(source: &str, origin: &str) -> Self {
        Self {
            lines: split_lines(source),
            origin: origin.to_string(),
            buffered: vec![],
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) -> Result<()> {
        if diagnostic.is_fatal() {
            return Err(self.halt(diagnostic));
        }
        log::debug!("buffered {diagnostic}");
        self.buffered.push(diagnostic);
        Ok(())
    }

    /// Routes a halt raised outside the sink (by the lexer) through it, so
    /// the fatal diagnostic gets rendered.
    pub fn escalate(&mut self, error: Error) -> Error {
        match error {
            Error::Halt(diagnostic) => self.halt(diagnostic),
            other => other,
        }
    }

    fn halt(&self, diagnostic: Diagnostic) -> Error {
        eprintln!("{}", self.render(&diagnostic));
        eprintln!("Exiting now, Goodbye!");
        Error::Halt(diagnostic)
    }

    pub fn count(&self) -> usize {
        self.buffered.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.buffered
    }

    pub fn flush(&mut self) {
        for diagnostic in self.buffered.drain(..) {
            println!("{}", render(&self.lines, &self.origin, &diagnostic));
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        render(&self.lines, &self.origin, diagnostic)
    }
}

fn render(lines: &[String], origin: &str, diagnostic: &Diagnostic) -> String {
    let header = format!(
        "Error of type {} in {}:\nMessage: {}",
        diagnostic.kind, origin, diagnostic.message
    );
    let token = match &diagnostic.token {
        Some(token) => token,
        None => return header,
    };
    let position = token.position;
    let snippet = position
        .line
        .checked_sub(1)
        .and_then(|idx| lines.get(idx))
        .map(String::as_str)
        .unwrap_or("");
    let pointer = format!(
        "{}{}",
        " ".repeat(position.column),
        "^".repeat(token.lexeme.chars().count().max(1))
    );
    format!("{header}\n{snippet}\n{pointer}")
}
