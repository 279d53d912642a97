use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    ast::Ast,
    diagnostics::{Diagnostic, RuntimeErrorKind},
    environment::EnvironmentRef,
    runtime::Interpreter,
};

/// A runtime value. Sentinels and numbers live inline; everything else is a
/// shared heap object behind an `Rc`, so copying a value never copies an
/// array, table, or closure.
#[derive(Clone)]
pub enum Value {
    Nil,
    None,
    Bool(bool),
    Number(f64),
    Boxed(Rc<Boxed>),
}

/// Heap payloads. Arrays and tables carry interior mutability so subscript
/// assignment writes through every alias of the object.
pub enum Boxed {
    Str(String),
    Atom(String),
    Array(RefCell<Vec<Value>>),
    Table(RefCell<IndexMap<TableKey, Value>>),
    Closure(Closure),
    Native(NativeFunction),
}

/// Hashable projection of the value types a table may be keyed on. Numbers
/// are stored by bit pattern with negative zero folded into zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    Number(u64),
    Atom(String),
    Str(String),
}

impl TableKey {
    pub fn number(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        Self::Number(value.to_bits())
    }

    /// Project a value into a key, or `None` when the value's type cannot
    /// key a table.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::number(*n)),
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Atom(name) => Some(Self::Atom(name.clone())),
                Boxed::Str(text) => Some(Self::Str(text.clone())),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKey::Number(bits) => write!(f, "{}", f64::from_bits(*bits)),
            TableKey::Atom(name) => write!(f, ":{name}"),
            TableKey::Str(text) => write_quoted(f, text),
        }
    }
}

/// A user function together with the environment it closed over.
#[derive(Clone)]
pub struct Closure {
    pub name: Option<String>,
    pub formals: Vec<String>,
    pub body: Vec<Ast>,
    pub env: EnvironmentRef,
}

pub type NativeCallback = fn(&mut Interpreter, &[Value]) -> crate::diagnostics::Result<Value>;

/// A host function registered with the interpreter. `max_args` of `None`
/// means the function is variadic with no upper bound.
pub struct NativeFunction {
    pub name: String,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub callback: NativeCallback,
}

impl NativeFunction {
    pub fn check_arity(&self, count: usize) -> Result<(), Diagnostic> {
        if count < self.min_args || self.max_args.is_some_and(|max| count > max) {
            let bounds = match self.max_args {
                Some(max) if max == self.min_args => format!("{}", self.min_args),
                Some(max) => format!("{} to {}", self.min_args, max),
                None => format!("at least {}", self.min_args),
            };
            return Err(Diagnostic::runtime(
                RuntimeErrorKind::Arity,
                format!(
                    "function `{}` expected {} arguments but received {}",
                    self.name, bounds, count
                ),
            ));
        }
        Ok(())
    }
}

impl Value {
    pub fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Boxed(Rc::new(Boxed::Str(value.into())))
    }

    pub fn atom(name: impl Into<String>) -> Self {
        Self::Boxed(Rc::new(Boxed::Atom(name.into())))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Self::Boxed(Rc::new(Boxed::Array(RefCell::new(values))))
    }

    pub fn table(entries: IndexMap<TableKey, Value>) -> Self {
        Self::Boxed(Rc::new(Boxed::Table(RefCell::new(entries))))
    }

    pub fn closure(closure: Closure) -> Self {
        Self::Boxed(Rc::new(Boxed::Closure(closure)))
    }

    pub fn native(native: NativeFunction) -> Self {
        Self::Boxed(Rc::new(Boxed::Native(native)))
    }

    /// Only `nil`, `none`, and `false` are falsy. Zero and the empty string
    /// count as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::None | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Str(_) => "string",
                Boxed::Atom(_) => "atom",
                Boxed::Array(_) => "array",
                Boxed::Table(_) => "table",
                Boxed::Closure(_) | Boxed::Native(_) => "function",
            },
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Str(text) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Atom(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&RefCell<Vec<Value>>> {
        match self {
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Array(values) => Some(values),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&RefCell<IndexMap<TableKey, Value>>> {
        match self {
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Table(entries) => Some(entries),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Value::Boxed(boxed) if matches!(&**boxed, Boxed::Closure(_) | Boxed::Native(_))
        )
    }

    /// Structural equality, recursing through arrays and tables. Functions
    /// compare by identity since they have no structure to compare. The
    /// recursion carries no cycle guard: a self-referential array or table
    /// exhausts the stack, as does dumping one.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boxed(a), Value::Boxed(b)) => match (&**a, &**b) {
                (Boxed::Str(a), Boxed::Str(b)) => a == b,
                (Boxed::Atom(a), Boxed::Atom(b)) => a == b,
                (Boxed::Array(a), Boxed::Array(b)) => {
                    let a = a.borrow();
                    let b = b.borrow();
                    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
                }
                (Boxed::Table(a), Boxed::Table(b)) => {
                    let a = a.borrow();
                    let b = b.borrow();
                    a.len() == b.len()
                        && a.iter()
                            .all(|(key, value)| b.get(key).is_some_and(|v| value.equal(v)))
                }
                _ => Rc::ptr_eq(a, b),
            },
            _ => false,
        }
    }

    /// Identity comparison for the `same` operator. Sentinels and numbers are
    /// their own identity; heap objects compare by allocation.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boxed(a), Value::Boxed(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in text.chars() {
        match ch {
            '\x07' => write!(f, "\\a")?,
            '\x08' => write!(f, "\\b")?,
            '\x0c' => write!(f, "\\f")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\\' => write!(f, "\\\\")?,
            '"' => write!(f, "\\\"")?,
            _ => write!(f, "{ch}")?,
        }
    }
    write!(f, "\"")
}

/// Canonical dump rendering. Strings come out quoted with their escapes
/// re-encoded; the raw rendering for `print` lives with the builtins.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boxed(boxed) => match &**boxed {
                Boxed::Str(text) => write_quoted(f, text),
                Boxed::Atom(name) => write!(f, ":{name}"),
                Boxed::Array(values) => {
                    write!(f, "[")?;
                    for (idx, value) in values.borrow().iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{value}")?;
                    }
                    write!(f, "]")
                }
                Boxed::Table(entries) => {
                    write!(f, "{{")?;
                    for (idx, (key, value)) in entries.borrow().iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{key} = {value}")?;
                    }
                    write!(f, "}}")
                }
                Boxed::Closure(closure) => match &closure.name {
                    Some(name) => write!(f, "<fun {name}>"),
                    None => write!(f, "<fun>"),
                },
                Boxed::Native(native) => write!(f, "<native fun {}>", native.name),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
