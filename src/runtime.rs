use std::{any::Any, collections::HashMap};

use indexmap::IndexMap;

use crate::{
    ast::{Ast, AstKind, BinaryOp, IfClause, UnaryOp},
    builtins,
    diagnostics::{Diagnostic, Position, Result, RuntimeErrorKind},
    environment::{Environment, EnvironmentRef},
    parser,
    value::{Boxed, Closure, NativeCallback, NativeFunction, TableKey, Value},
};

/// The tree-walking evaluator and its root state: the global frame, the atom
/// intern pool, and an optional slot of host data that native functions can
/// reach through the interpreter they are handed.
pub struct Interpreter {
    globals: EnvironmentRef,
    atoms: HashMap<String, Value>,
    user_data: Option<Box<dyn Any>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut interpreter = Self {
            globals: Environment::new(),
            atoms: HashMap::new(),
            user_data: None,
        };
        builtins::install(&mut interpreter);
        interpreter
    }

    pub fn globals(&self) -> &EnvironmentRef {
        &self.globals
    }

    /// Intern an atom so that every occurrence of `:name` in a program is the
    /// same heap object, which makes atoms identical under `same`.
    pub fn intern_atom(&mut self, name: &str) -> Value {
        if let Some(atom) = self.atoms.get(name) {
            return atom.clone();
        }
        let atom = Value::atom(name);
        self.atoms.insert(name.to_string(), atom.clone());
        atom
    }

    /// Register a host function as a global. `max_args` of `None` leaves the
    /// upper bound open.
    pub fn register_native(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: Option<usize>,
        callback: NativeCallback,
    ) {
        let native = Value::native(NativeFunction {
            name: name.to_string(),
            min_args,
            max_args,
            callback,
        });
        self.globals.borrow_mut().define(name, native);
    }

    pub fn set_user_data(&mut self, data: Box<dyn Any>) {
        self.user_data = Some(data);
    }

    pub fn user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    pub fn user_data_mut(&mut self) -> Option<&mut dyn Any> {
        self.user_data.as_deref_mut()
    }

    pub fn take_user_data(&mut self) -> Option<Box<dyn Any>> {
        self.user_data.take()
    }

    /// Parse and evaluate a whole source unit in the global frame, yielding
    /// the value of its last statement.
    pub fn run(&mut self, filename: &str, source: &str) -> Result<Value> {
        let ast = parser::parse(filename, source)?;
        let globals = self.globals.clone();
        self.eval(&ast, &globals)
    }

    pub fn eval(&mut self, ast: &Ast, env: &EnvironmentRef) -> Result<Value> {
        match &ast.kind {
            AstKind::Ident(name) => Ok(Environment::lookup(env, name, &ast.position)?),
            AstKind::Atom(name) => Ok(self.intern_atom(name)),
            AstKind::Number(n) => Ok(Value::number(*n)),
            AstKind::Str(text) => Ok(Value::string(text.clone())),
            AstKind::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, env)?);
                }
                Ok(Value::array(values))
            }
            AstKind::Table(entries) => {
                let mut table = IndexMap::with_capacity(entries.len());
                for entry in entries {
                    let key = self.eval(&entry.key, env)?;
                    let key = table_key(&key, &entry.key.position)?;
                    let value = self.eval(&entry.value, env)?;
                    table.insert(key, value);
                }
                Ok(Value::table(table))
            }
            AstKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env),
            AstKind::Unary { op, expr } => {
                let value = self.eval(expr, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::bool(!value.is_truthy())),
                }
            }
            AstKind::Subscript { target, key } => {
                let target = self.eval(target, env)?;
                let key = self.eval(key, env)?;
                self.subscript_read(&target, &key, &ast.position)
            }
            AstKind::Lambda { formals, body } => Ok(Value::closure(Closure {
                name: None,
                formals: formals.clone(),
                body: body.clone(),
                env: env.clone(),
            })),
            AstKind::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.eval(arg, env)?);
                }
                self.call_value(&callee, &arguments, Some(&ast.position))
            }
            AstKind::If(clauses) => self.eval_if(clauses, env),
            AstKind::While { condition, body } => {
                while self.eval(condition, env)?.is_truthy() {
                    let frame = Environment::with_parent(env.clone());
                    self.eval_block(body, &frame)?;
                }
                Ok(Value::Nil)
            }
            AstKind::VarDecl { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.eval(initializer, env)?,
                    None => Value::Nil,
                };
                env.borrow_mut().define(name.clone(), value.clone());
                Ok(value)
            }
            AstKind::FunDecl {
                name,
                formals,
                body,
            } => {
                let closure = Value::closure(Closure {
                    name: Some(name.clone()),
                    formals: formals.clone(),
                    body: body.clone(),
                    env: env.clone(),
                });
                env.borrow_mut().define(name.clone(), closure.clone());
                Ok(closure)
            }
            AstKind::TopLevel(statements) => {
                let mut result = Value::Nil;
                for statement in statements {
                    result = self.eval(statement, env)?;
                }
                Ok(result)
            }
        }
    }

    /// Evaluate a block body in the given frame, yielding the value of its
    /// last statement, or nil for an empty body.
    fn eval_block(&mut self, body: &[Ast], frame: &EnvironmentRef) -> Result<Value> {
        let mut result = Value::Nil;
        for statement in body {
            result = self.eval(statement, frame)?;
        }
        Ok(result)
    }

    fn eval_if(&mut self, clauses: &[IfClause], env: &EnvironmentRef) -> Result<Value> {
        for clause in clauses {
            let matched = match &clause.condition {
                Some(condition) => self.eval(condition, env)?.is_truthy(),
                None => true,
            };
            if matched {
                let frame = Environment::with_parent(env.clone());
                return self.eval_block(&clause.body, &frame);
            }
        }
        Ok(Value::Nil)
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Ast,
        right: &Ast,
        env: &EnvironmentRef,
    ) -> Result<Value> {
        match op {
            BinaryOp::Assign => return self.eval_assign(left, right, env),
            BinaryOp::And => {
                let lhs = self.eval(left, env)?;
                if !lhs.is_truthy() {
                    return Ok(Value::bool(false));
                }
                let rhs = self.eval(right, env)?;
                return Ok(Value::bool(rhs.is_truthy()));
            }
            BinaryOp::Or => {
                let lhs = self.eval(left, env)?;
                if lhs.is_truthy() {
                    return Ok(Value::bool(true));
                }
                let rhs = self.eval(right, env)?;
                return Ok(Value::bool(rhs.is_truthy()));
            }
            _ => {}
        }

        let lhs = self.eval(left, env)?;
        let rhs = self.eval(right, env)?;
        let position = &left.position;
        match op {
            BinaryOp::Equal => Ok(Value::bool(lhs.equal(&rhs))),
            BinaryOp::NotEqual => Ok(Value::bool(!lhs.equal(&rhs))),
            BinaryOp::Same => Ok(Value::bool(lhs.same(&rhs))),
            BinaryOp::Add => match (lhs.as_str(), rhs.as_str()) {
                (Some(a), Some(b)) => {
                    let mut text = String::with_capacity(a.len() + b.len());
                    text.push_str(a);
                    text.push_str(b);
                    Ok(Value::string(text))
                }
                _ => {
                    let (a, b) = numeric_operands(op, &lhs, &rhs, position)?;
                    Ok(Value::number(a + b))
                }
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (a, b) = numeric_operands(op, &lhs, &rhs, position)?;
                let result = match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                };
                Ok(Value::number(result))
            }
            BinaryOp::BitAnd | BinaryOp::BitOr => {
                let (a, b) = numeric_operands(op, &lhs, &rhs, position)?;
                let (a, b) = (a as i64, b as i64);
                let result = if op == BinaryOp::BitAnd { a & b } else { a | b };
                Ok(Value::number(result as f64))
            }
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                let (a, b) = numeric_operands(op, &lhs, &rhs, position)?;
                let result = match op {
                    BinaryOp::Less => a < b,
                    BinaryOp::Greater => a > b,
                    BinaryOp::LessEqual => a <= b,
                    _ => a >= b,
                };
                Ok(Value::bool(result))
            }
            BinaryOp::Assign | BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    /// `name = value` rebinds the nearest frame that binds `name`, creating a
    /// global when none does. `target[key] = value` writes through to the
    /// shared array or table object. Either form yields the assigned value.
    fn eval_assign(&mut self, left: &Ast, right: &Ast, env: &EnvironmentRef) -> Result<Value> {
        match &left.kind {
            AstKind::Ident(name) => {
                let value = self.eval(right, env)?;
                Environment::assign(env, name, value.clone());
                Ok(value)
            }
            AstKind::Subscript { target, key } => {
                let target = self.eval(target, env)?;
                let key = self.eval(key, env)?;
                let value = self.eval(right, env)?;
                self.subscript_write(&target, &key, value.clone(), &left.position)?;
                Ok(value)
            }
            _ => Err(Diagnostic::runtime(
                RuntimeErrorKind::Type,
                format!("cannot assign to {}", left.classname()),
            )
            .at(left.position.clone())
            .into()),
        }
    }

    fn subscript_read(&mut self, target: &Value, key: &Value, position: &Position) -> Result<Value> {
        if let Some(values) = target.as_array() {
            let values = values.borrow();
            let index = array_index(key, values.len(), position)?;
            return Ok(values[index].clone());
        }
        if let Some(entries) = target.as_table() {
            let key = table_key(key, position)?;
            // A missing key reads as nil rather than an error.
            return Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Nil));
        }
        Err(Diagnostic::runtime(
            RuntimeErrorKind::Type,
            format!("cannot subscript a value of type {}", target.type_name()),
        )
        .at(position.clone())
        .into())
    }

    fn subscript_write(
        &mut self,
        target: &Value,
        key: &Value,
        value: Value,
        position: &Position,
    ) -> Result<()> {
        if let Some(values) = target.as_array() {
            let mut values = values.borrow_mut();
            let index = array_index(key, values.len(), position)?;
            values[index] = value;
            return Ok(());
        }
        if let Some(entries) = target.as_table() {
            let key = table_key(key, position)?;
            entries.borrow_mut().insert(key, value);
            return Ok(());
        }
        Err(Diagnostic::runtime(
            RuntimeErrorKind::Type,
            format!("cannot subscript a value of type {}", target.type_name()),
        )
        .at(position.clone())
        .into())
    }

    /// Apply a callable value. Closures bind missing arguments to nil and
    /// ignore extras; natives are held to their registered arity bounds.
    /// Native callbacks re-enter through here with no source position.
    pub fn call_value(
        &mut self,
        callee: &Value,
        args: &[Value],
        position: Option<&Position>,
    ) -> Result<Value> {
        let boxed = match callee {
            Value::Boxed(boxed) => boxed,
            _ => return Err(not_callable(callee, position).into()),
        };
        match &**boxed {
            Boxed::Closure(closure) => {
                let frame = Environment::with_parent(closure.env.clone());
                for (idx, formal) in closure.formals.iter().enumerate() {
                    let arg = args.get(idx).cloned().unwrap_or(Value::Nil);
                    frame.borrow_mut().define(formal.clone(), arg);
                }
                self.eval_block(&closure.body, &frame)
            }
            Boxed::Native(native) => {
                native
                    .check_arity(args.len())
                    .map_err(|diag| diag.at_opt(position))?;
                let callback = native.callback;
                callback(self, args)
            }
            _ => Err(not_callable(callee, position).into()),
        }
    }
}

fn not_callable(callee: &Value, position: Option<&Position>) -> Diagnostic {
    Diagnostic::runtime(
        RuntimeErrorKind::Type,
        format!("a value of type {} is not callable", callee.type_name()),
    )
    .at_opt(position)
}

fn numeric_operands(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    position: &Position,
) -> Result<(f64, f64)> {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Diagnostic::runtime(
            RuntimeErrorKind::Type,
            format!(
                "operator `{}` cannot be applied to {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
        )
        .at(position.clone())
        .into()),
    }
}

fn table_key(key: &Value, position: &Position) -> Result<TableKey> {
    match TableKey::from_value(key) {
        Some(key) => Ok(key),
        None => Err(Diagnostic::runtime(
            RuntimeErrorKind::Type,
            format!("a value of type {} cannot key a table", key.type_name()),
        )
        .at(position.clone())
        .into()),
    }
}

/// Array indices truncate toward zero and must land inside the array.
fn array_index(key: &Value, len: usize, position: &Position) -> Result<usize> {
    let number = match key.as_number() {
        Some(number) => number,
        None => {
            return Err(Diagnostic::runtime(
                RuntimeErrorKind::Type,
                format!("array index must be a number, got {}", key.type_name()),
            )
            .at(position.clone())
            .into());
        }
    };
    let index = number.trunc();
    if !index.is_finite() || index < 0.0 || index >= len as f64 {
        return Err(Diagnostic::runtime(
            RuntimeErrorKind::Range,
            format!("array index {number} out of range for length {len}"),
        )
        .at(position.clone())
        .into());
    }
    Ok(index as usize)
}
