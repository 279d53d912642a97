use crate::diagnostics::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    And,
    Or,
    BitAnd,
    BitOr,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Same,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Surface syntax for the operator, used in type error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Same => "same",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

/// One `key = value` pair inside a table literal. Keys are restricted by the
/// grammar to number, string, or atom literals.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub key: Ast,
    pub value: Ast,
}

/// One arm of an `if`/`elif`/`else` chain. The trailing `else` clause has no
/// condition and always matches when reached.
#[derive(Debug, Clone)]
pub struct IfClause {
    pub condition: Option<Ast>,
    pub body: Vec<Ast>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub enum AstKind {
    Ident(String),
    Atom(String),
    Number(f64),
    Str(String),
    Array(Vec<Ast>),
    Table(Vec<TableEntry>),
    Binary {
        op: BinaryOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Ast>,
    },
    Subscript {
        target: Box<Ast>,
        key: Box<Ast>,
    },
    Lambda {
        formals: Vec<String>,
        body: Vec<Ast>,
    },
    Call {
        callee: Box<Ast>,
        args: Vec<Ast>,
    },
    If(Vec<IfClause>),
    While {
        condition: Box<Ast>,
        body: Vec<Ast>,
    },
    VarDecl {
        name: String,
        initializer: Option<Box<Ast>>,
    },
    FunDecl {
        name: String,
        formals: Vec<String>,
        body: Vec<Ast>,
    },
    TopLevel(Vec<Ast>),
}

/// A node of the abstract syntax tree. Nodes own their children outright; the
/// whole tree is dropped after evaluation. Every node carries the position of
/// its first token for error reporting.
#[derive(Debug, Clone)]
pub struct Ast {
    pub kind: AstKind,
    pub position: Position,
}

impl Ast {
    pub fn new(kind: AstKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn classname(&self) -> &'static str {
        match &self.kind {
            AstKind::Ident(_) => "identifier",
            AstKind::Atom(_) => "atom",
            AstKind::Number(_) => "number",
            AstKind::Str(_) => "string",
            AstKind::Array(_) => "array",
            AstKind::Table(_) => "table",
            AstKind::Binary { .. } => "binary",
            AstKind::Unary { .. } => "unary",
            AstKind::Subscript { .. } => "subscript",
            AstKind::Lambda { .. } => "lambda",
            AstKind::Call { .. } => "call",
            AstKind::If(_) => "if statement",
            AstKind::While { .. } => "while statement",
            AstKind::VarDecl { .. } => "variable decl",
            AstKind::FunDecl { .. } => "function decl",
            AstKind::TopLevel(_) => "top level",
        }
    }
}
