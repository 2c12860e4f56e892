use super::tokenizer::TokenType as TT;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Program),
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(FunctionDeclaration),
    Assignment(Box<Node>, Box<Node>), // target, value
    Member {
        parent: Box<Node>,
        child: Box<Node>,
        computed: bool,
    },
    Call(Box<Node>, Vec<Node>),
    Binary(Operator, Box<(Node, Node)>),
    Identifier(String),
    NumberLiteral(f32),
    StringLiteral(String),
    CharLiteral(char),
    BooleanLiteral(bool),
    NullLiteral,
}

impl Node {
    pub fn identifier(symbol: &str) -> Self {
        Self::Identifier(symbol.to_string())
    }

    pub fn binary(operator: Operator, left: Node, right: Node) -> Self {
        Self::Binary(operator, Box::new((left, right)))
    }

    pub(crate) fn is_identifier(&self, symbol: &str) -> bool {
        matches!(self, Self::Identifier(s) if s == symbol)
    }
}

/// The ordered top-level statements of one unit of source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub typ: Box<Node>,
    pub name: String,
    pub value: Option<Box<Node>>,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// `None` when the signature starts directly with the parameter list.
    pub return_type: Option<Box<Node>>,
    pub name: String,
    pub parameters: Parameters,
    pub body: Vec<Node>,
    pub modifiers: Modifiers,
    pub is_block_body: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub typ: Node,
    pub name: String,
    pub is_final: bool,
}

/// Parameters in declaration order, keyed by name. A later parameter reusing
/// a name is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    pub fn insert(&mut self, parameter: Parameter) -> bool {
        if self.get(&parameter.name).is_some() {
            return false;
        }
        self.0.push(parameter);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Final,
    Static,
    Public,
    Private,
    Protected,
}

impl TryFrom<TT> for Modifier {
    type Error = TT;

    fn try_from(value: TT) -> Result<Self, Self::Error> {
        match value {
            TT::FINAL => Ok(Self::Final),
            TT::STATIC => Ok(Self::Static),
            TT::PUBLIC => Ok(Self::Public),
            TT::PRIVATE => Ok(Self::Private),
            TT::PROTECTED => Ok(Self::Protected),
            other => Err(other),
        }
    }
}

/// Attribute modifiers in the order they were written, without repeats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers(Vec<Modifier>);

impl Modifiers {
    /// Returns `false` if the modifier was already present.
    pub fn insert(&mut self, modifier: Modifier) -> bool {
        if self.contains(modifier) {
            return false;
        }
        self.0.push(modifier);
        true
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0.contains(&modifier)
    }

    pub fn merged(&self, other: &Modifiers) -> Modifiers {
        let mut merged = self.clone();
        for modifier in other.iter() {
            merged.insert(modifier);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Power,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Plus),
            "-" => Some(Self::Minus),
            "*" => Some(Self::Times),
            "/" => Some(Self::Divide),
            "%" => Some(Self::Modulo),
            "^" => Some(Self::Power),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "^",
        }
    }

    pub(crate) fn is_additive(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub(crate) fn is_multiplicative(&self) -> bool {
        matches!(self, Self::Times | Self::Divide | Self::Modulo)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
