use std::{fmt, rc::Rc};

use thiserror::Error;

/// A point in a source file, tracked for every token and AST node.
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start(filename: impl Into<Rc<str>>) -> Self {
        Self {
            filename: filename.into(),
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Classification of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexer,
    Syntax,
    Runtime(RuntimeErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Operator or builtin applied to an incompatible operand type.
    Type,
    /// Name lookup exhausted the environment chain.
    Undefined,
    /// Native call outside its registered argument bounds.
    Arity,
    /// Array subscript or substring bounds out of range.
    Range,
}

/// Diagnostic information surfaced to end users.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub position: Option<Position>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            notes: Vec::new(),
        }
    }

    pub fn lexer(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Lexer, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, message)
    }

    pub fn runtime(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Runtime(kind), message)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn at_opt(mut self, position: Option<&Position>) -> Self {
        if let Some(position) = position {
            self.position = Some(position.clone());
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(position) = &self.position {
            write!(f, "{position}: ")?;
        }
        let label = match self.kind {
            DiagnosticKind::Lexer => "lex error",
            DiagnosticKind::Syntax => "syntax error",
            DiagnosticKind::Runtime(RuntimeErrorKind::Type) => "type error",
            DiagnosticKind::Runtime(RuntimeErrorKind::Undefined) => "undefined variable",
            DiagnosticKind::Runtime(RuntimeErrorKind::Arity) => "arity error",
            DiagnosticKind::Runtime(RuntimeErrorKind::Range) => "range error",
        };
        write!(f, "{label}: {}", self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the Oleander toolchain.
#[derive(Debug, Error)]
pub enum OleanderError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OleanderError {
    /// The diagnostic payload, when this error carries one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            OleanderError::Diagnostic(diag) => Some(diag),
            OleanderError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OleanderError>;
