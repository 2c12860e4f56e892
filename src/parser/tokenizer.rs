use super::error::{Diagnostic, DiagnosticKind, Error, Result};
use super::locations::Position;
use const_format::concatcp;
use derivative::Derivative;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

#[derive(Clone, Default, Debug, PartialEq)]
pub struct Token {
    pub typ: TokenType,
    pub lexeme: String,
    pub position: Position,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}('{}')", self.typ, self.lexeme)
    }
}

macro_rules! token_types {
    ($($name:ident $(: $($facet:ident)+)?),* $(,)?) => {
        #[allow(non_camel_case_types)]
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum TokenType {
            $($name),*
        }

        impl TokenType {
            pub const ALL: &'static [TokenType] = &[$(TokenType::$name),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name)),*
                }
            }

            fn facets(&self) -> &'static [&'static str] {
                match self {
                    $(Self::$name => &[$($(stringify!($facet)),+)?]),*
                }
            }
        }
    };
}

token_types! {
    // import
    OBTAIN: keyword,

    // type declarations
    CLASS: keyword,
    INTERFACE: keyword,
    RECORD: keyword,
    ANNOTATION: keyword,
    ENUM: keyword,

    // branching and loops
    IF: keyword,
    ELSE: keyword,
    SWITCH: keyword,
    FOR: keyword,
    WHILE: keyword,
    DO: keyword,

    // primitive types
    LONG: keyword,
    INT: keyword,
    CHAR: keyword,
    SHORT: keyword,
    BYTE: keyword,
    BOOLEAN: keyword,
    DOUBLE: keyword,
    FLOAT: keyword,
    VAR: keyword,

    // attribute modifiers
    FINAL: keyword,
    STATIC: keyword,
    PUBLIC: keyword,
    PRIVATE: keyword,
    PROTECTED: keyword,
    DEFAULT: keyword,

    ASSIGN,
    BINARY_OPERATOR,
    BINARY_ASSIGN,
    LAMBDA_ARROW,
    NUMBER_VALUE,
    IDENTIFIER,
    STRING,
    CHARACTER,

    NULL: keyword,
    TRUE: keyword,
    FALSE: keyword,

    OPEN_PAREN,
    CLOSE_PAREN,
    OPEN_BRACE,
    CLOSE_BRACE,
    OPEN_BRACKET,
    CLOSE_BRACKET,
    SEMI,
    COMMA,
    DOT,

    // only meaningful inside a repl session
    PRINT: keyword repl,
    INPUT: keyword repl,

    EOF,
}

impl Default for TokenType {
    fn default() -> Self {
        Self::EOF
    }
}

impl TokenType {
    pub fn is_keyword(&self) -> bool {
        self.facets().contains(&"keyword")
    }

    pub fn is_repl_only(&self) -> bool {
        self.facets().contains(&"repl")
    }

    /// The spelling of a keyword in source: `PROTECTED` is `protected`.
    pub fn surface(&self) -> String {
        self.name().to_lowercase().replace('_', "-")
    }

    pub fn from_surface(text: &str) -> Option<Self> {
        KEYWORDS.get(text).copied()
    }

    pub fn keywords() -> Vec<Self> {
        Self::ALL.iter().copied().filter(Self::is_keyword).collect()
    }

    pub fn keywords_excluding_repl() -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|t| t.is_keyword() && !t.is_repl_only())
            .collect()
    }

    pub fn attribute_modifiers() -> &'static [Self] {
        &[
            Self::FINAL,
            Self::PUBLIC,
            Self::PRIVATE,
            Self::PROTECTED,
            Self::STATIC,
        ]
    }

    /// Keywords that open a variable declaration, `int a = 1;`.
    pub fn declaration_types() -> &'static [Self] {
        &[
            Self::LONG,
            Self::INT,
            Self::CHAR,
            Self::SHORT,
            Self::BYTE,
            Self::BOOLEAN,
            Self::DOUBLE,
            Self::FLOAT,
            Self::VAR,
        ]
    }

    pub fn is_attribute_modifier(&self) -> bool {
        Self::attribute_modifiers().contains(self)
    }

    pub fn is_declaration_type(&self) -> bool {
        Self::declaration_types().contains(self)
    }
}

const S_LINE_SEPARATOR: &str = r"\r\n|\n|\r";
const S_LINE_BREAK: &str = concatcp!("^(?:", S_LINE_SEPARATOR, ")");
const S_WHITESPACE: &str = r"^[^\S\r\n]+";
const S_DIGIT: &str = r"[0-9]";
const S_NUMBER_PART: &str = r"[.0-9a-zA-Z]";
const S_NUMBER: &str = concatcp!("^", S_DIGIT, S_NUMBER_PART, "*");
const S_IDENTIFIER_START: &str = r"[_a-zA-Z]";
const S_IDENTIFIER_PART: &str = r"[_a-zA-Z0-9]";
const S_IDENTIFIER: &str = concatcp!("^", S_IDENTIFIER_START, S_IDENTIFIER_PART, "*");

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_LINE_BREAK).expect("Error compiling regex."));
static LINE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_LINE_SEPARATOR).expect("Error compiling regex."));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_WHITESPACE).expect("Error compiling regex."));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(S_NUMBER).expect("Error compiling regex."));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_IDENTIFIER).expect("Error compiling regex."));

static KEYWORDS: Lazy<HashMap<String, TokenType>> = Lazy::new(|| {
    TokenType::keywords()
        .into_iter()
        .map(|typ| (typ.surface(), typ))
        .collect()
});

fn structural(chr: char) -> Option<TokenType> {
    let typ = match chr {
        '{' => TokenType::OPEN_BRACE,
        '}' => TokenType::CLOSE_BRACE,
        '(' => TokenType::OPEN_PAREN,
        ')' => TokenType::CLOSE_PAREN,
        '[' => TokenType::OPEN_BRACKET,
        ']' => TokenType::CLOSE_BRACKET,
        '=' => TokenType::ASSIGN,
        ';' => TokenType::SEMI,
        ',' => TokenType::COMMA,
        '.' => TokenType::DOT,
        _ => return None,
    };
    Some(typ)
}

#[derive(Clone, Copy, Debug)]
struct Cursor {
    // byte index into the source, for slicing
    index: usize,
    // characters consumed so far; positions are counted in these
    chars: usize,
    line: usize,
    line_start: usize,
}

/// On-demand token stream over one unit of source.
///
/// The lexer always holds the current token; `advance` hands it out and lexes
/// the next one. Once an untokenizable character is met the lexer is halted
/// and keeps returning that halt.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Lexer {
    #[derivative(Debug = "ignore")]
    source: String,
    cursor: Cursor,
    current: Token,
    halted: Option<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::EmptySource);
        }
        let mut lexer = Self {
            source: source.to_string(),
            cursor: Cursor {
                index: 0,
                chars: 0,
                line: 1,
                line_start: 0,
            },
            current: Token::default(),
            halted: None,
        };
        lexer.current = lexer.next_token()?;
        log::trace!("{}", lexer.current);
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn advance(&mut self) -> Result<Token> {
        if let Some(diagnostic) = &self.halted {
            return Err(Error::Halt(diagnostic.clone()));
        }
        if self.current.typ == TokenType::EOF {
            return Err(Error::EndOfInput);
        }
        let next = match self.next_token() {
            Ok(token) => token,
            Err(Error::Halt(diagnostic)) => {
                self.halted = Some(diagnostic.clone());
                return Err(Error::Halt(diagnostic));
            }
            Err(err) => return Err(err),
        };
        log::trace!("{next}");
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// The token `steps` positions ahead of the current one. The cursor is
    /// restored afterwards, so the lexer is left exactly as it was.
    pub fn lookahead(&mut self, steps: usize) -> Result<Token> {
        if let Some(diagnostic) = &self.halted {
            return Err(Error::Halt(diagnostic.clone()));
        }
        let saved = self.cursor;
        let mut token = Ok(self.current.clone());
        for _ in 0..steps {
            token = self.next_token();
            if token.is_err() {
                break;
            }
        }
        self.cursor = saved;
        token
    }

    fn rest(&self) -> &str {
        &self.source[self.cursor.index..]
    }

    fn position(&self) -> Position {
        Position::new(self.cursor.chars, self.cursor.line, self.cursor.line_start)
    }

    fn bump(&mut self, len: usize) {
        let end = self.cursor.index + len;
        self.cursor.chars += self.source[self.cursor.index..end].chars().count();
        self.cursor.index = end;
    }

    fn take(&mut self, typ: TokenType, len: usize) -> Token {
        let position = self.position();
        let lexeme = self.source[self.cursor.index..self.cursor.index + len].to_string();
        self.bump(len);
        Token {
            typ,
            lexeme,
            position,
        }
    }

    fn find_by_regex(&mut self, regex: &Regex, typ: TokenType) -> Option<Token> {
        let len = regex.find(self.rest()).map(|m| m.end())?;
        Some(self.take(typ, len))
    }

    fn next_token(&mut self) -> Result<Token> {
        loop {
            let chr = match self.rest().chars().next() {
                Some(chr) => chr,
                None => {
                    return Ok(Token {
                        typ: TokenType::EOF,
                        lexeme: "EOF".to_string(),
                        position: self.position(),
                    })
                }
            };

            if let Some(len) = LINE_BREAK.find(self.rest()).map(|m| m.end()) {
                self.bump(len);
                self.cursor.line += 1;
                self.cursor.line_start = self.cursor.chars;
                continue;
            }
            if let Some(len) = WHITESPACE.find(self.rest()).map(|m| m.end()) {
                self.bump(len);
                continue;
            }

            if let Some(token) = self.find_by_regex(&NUMBER, TokenType::NUMBER_VALUE) {
                return Ok(token);
            }
            if let Some(mut token) = self.find_by_regex(&IDENTIFIER, TokenType::IDENTIFIER) {
                if let Some(keyword) = TokenType::from_surface(&token.lexeme) {
                    token.typ = keyword;
                }
                return Ok(token);
            }

            match chr {
                '"' => return Ok(self.literal(chr, TokenType::STRING)),
                '\'' => return Ok(self.literal(chr, TokenType::CHARACTER)),
                '+' | '-' | '*' | '/' | '%' => return Ok(self.operator(chr)),
                // reserved for escapes and unicode input
                '\\' => {
                    self.bump(1);
                    continue;
                }
                _ => {}
            }

            if let Some(typ) = structural(chr) {
                return Ok(self.take(typ, 1));
            }

            let token = Token {
                typ: TokenType::default(),
                lexeme: chr.to_string(),
                position: self.position(),
            };
            return Err(Error::Halt(Diagnostic::at(
                DiagnosticKind::Fatal,
                &format!("could not tokenize following character: '{chr}'"),
                &token,
            )));
        }
    }

    fn operator(&mut self, chr: char) -> Token {
        match self.rest()[chr.len_utf8()..].chars().next() {
            Some('=') => self.take(TokenType::BINARY_ASSIGN, 2),
            Some('>') if chr == '-' => self.take(TokenType::LAMBDA_ARROW, 2),
            _ => self.take(TokenType::BINARY_OPERATOR, 1),
        }
    }

    /// Scans a string or character literal verbatim, escapes included. The
    /// next delimiter always closes it, even after a backslash; a line break
    /// or the end of input also ends it.
    fn literal(&mut self, delimiter: char, typ: TokenType) -> Token {
        let position = self.position();
        let body = &self.source[self.cursor.index + delimiter.len_utf8()..];
        let mut lexeme = String::new();
        let mut consumed = body.len();
        for (idx, chr) in body.char_indices() {
            if chr == delimiter {
                consumed = idx + chr.len_utf8();
                break;
            }
            if chr == '\n' || chr == '\r' {
                consumed = idx;
                break;
            }
            lexeme.push(chr);
        }
        self.bump(delimiter.len_utf8() + consumed);
        Token {
            typ,
            lexeme,
            position,
        }
    }
}

/// Lexes the whole source, the trailing `EOF` token included.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source)?;
    let mut tokens = vec![];
    while lexer.current().typ != TokenType::EOF {
        tokens.push(lexer.advance()?);
    }
    tokens.push(lexer.current().clone());
    Ok(tokens)
}

/// Splits `source` at the same line breaks the lexer counts, so that line
/// `n` of a position is element `n - 1`.
pub(crate) fn split_lines(source: &str) -> Vec<String> {
    LINE_SEPARATOR.split(source).map(str::to_string).collect()
}
