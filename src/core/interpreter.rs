use crate::domain::ast::{BinaryOp, Expr, Literal, Method, Source, Stmt};
use crate::domain::scope::Scope;
use crate::domain::value::Value;
use crate::utils::error::{PlcError, Result};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::io::Write;
use std::rc::Rc;

/// Scope used at runtime: variables hold values, functions are callable.
pub type RuntimeScope = Scope<Value, RuntimeFunction>;

#[derive(Clone)]
pub enum RuntimeFunction {
    Builtin(Rc<dyn Fn(Vec<Value>) -> Result<Value>>),
    Defined(Rc<DefinedFunction>),
}

/// A user-defined method closed over the scope it was defined in.
pub struct DefinedFunction {
    parameters: Vec<String>,
    statements: Vec<Stmt>,
    scope: RuntimeScope,
}

/// Tree-walking evaluator. `print` writes to the injected sink, which the CLI
/// points at stdout and tests point at a shared buffer.
pub struct Interpreter {
    scope: RuntimeScope,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(std::io::stdout())))
    }

    pub fn with_output(out: Rc<RefCell<dyn Write>>) -> Self {
        let scope = RuntimeScope::new();
        scope.define_function(
            "print",
            1,
            RuntimeFunction::Builtin(Rc::new(move |arguments| {
                writeln!(out.borrow_mut(), "{}", arguments[0])?;
                Ok(Value::Nil)
            })),
        );
        Interpreter { scope }
    }

    /// Defines globals and methods, then runs `main()` and yields its result.
    pub fn evaluate_source(&mut self, source: &Source) -> Result<Value> {
        for field in &source.fields {
            let value = match &field.value {
                Some(expression) => self.evaluate(expression)?,
                None => Value::Nil,
            };
            self.scope.define_variable(field.name.clone(), value);
        }
        for method in &source.methods {
            self.define_method(method);
        }

        let main = self
            .scope
            .lookup_function("main", 0)
            .ok_or_else(|| PlcError::runtime("program defines no main/0 function"))?;
        self.call(main, Vec::new())
    }

    fn define_method(&mut self, method: &Method) {
        let function = RuntimeFunction::Defined(Rc::new(DefinedFunction {
            parameters: method.parameters.clone(),
            statements: method.statements.clone(),
            scope: self.scope.clone(),
        }));
        self.scope
            .define_function(method.name.clone(), method.parameters.len(), function);
    }

    fn call(&mut self, function: RuntimeFunction, arguments: Vec<Value>) -> Result<Value> {
        match function {
            RuntimeFunction::Builtin(builtin) => builtin(arguments),
            RuntimeFunction::Defined(defined) => {
                let call_scope = defined.scope.child();
                for (parameter, argument) in defined.parameters.iter().zip(arguments) {
                    call_scope.define_variable(parameter.clone(), argument);
                }

                let caller_scope = std::mem::replace(&mut self.scope, call_scope);
                let mut result = Ok(None);
                for statement in &defined.statements {
                    result = self.execute(statement);
                    match &result {
                        Ok(Some(_)) | Err(_) => break,
                        Ok(None) => {}
                    }
                }
                self.scope = caller_scope;
                Ok(result?.unwrap_or(Value::Nil))
            }
        }
    }

    /// Runs one statement. `Some` carries a RETURN value up to the nearest
    /// call.
    fn execute(&mut self, statement: &Stmt) -> Result<Option<Value>> {
        match statement {
            Stmt::Expression { expression } => {
                self.evaluate(expression)?;
                Ok(None)
            }
            Stmt::Declaration { name, value, .. } => {
                let value = match value {
                    Some(expression) => self.evaluate(expression)?,
                    None => Value::Nil,
                };
                self.scope.define_variable(name.clone(), value);
                Ok(None)
            }
            Stmt::Assignment { receiver, value } => {
                let name = match receiver {
                    Expr::Access {
                        receiver: None,
                        name,
                        ..
                    } => name,
                    Expr::Access {
                        receiver: Some(_), ..
                    } => return Err(PlcError::runtime("values have no assignable fields")),
                    _ => return Err(PlcError::runtime("assignment target must be a variable")),
                };
                let value = self.evaluate(value)?;
                if !self.scope.assign_variable(name, value) {
                    return Err(PlcError::runtime(format!("undefined variable '{}'", name)));
                }
                Ok(None)
            }
            Stmt::If {
                condition,
                then_statements,
                else_statements,
            } => {
                let branch = if self.evaluate_boolean(condition)? {
                    then_statements
                } else {
                    else_statements
                };
                self.execute_block(branch)
            }
            Stmt::For {
                initialization,
                condition,
                increment,
                statements,
            } => {
                if let Some(initialization) = initialization {
                    self.execute(initialization)?;
                }
                while self.evaluate_boolean(condition)? {
                    if let Some(value) = self.execute_block(statements)? {
                        return Ok(Some(value));
                    }
                    if let Some(increment) = increment {
                        self.execute(increment)?;
                    }
                }
                Ok(None)
            }
            Stmt::While {
                condition,
                statements,
            } => {
                while self.evaluate_boolean(condition)? {
                    if let Some(value) = self.execute_block(statements)? {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
            Stmt::Return { value } => Ok(Some(self.evaluate(value)?)),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Option<Value>> {
        self.in_child_scope(|interpreter| {
            for statement in statements {
                if let Some(value) = interpreter.execute(statement)? {
                    return Ok(Some(value));
                }
            }
            Ok(None)
        })
    }

    pub fn evaluate(&mut self, expression: &Expr) -> Result<Value> {
        match expression {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Nil => Value::Nil,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Integer(i) => Value::Integer(*i),
                Literal::Decimal(d) => Value::Decimal(*d),
                Literal::Character(c) => Value::Character(*c),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Group { expression, .. } => self.evaluate(expression),
            Expr::Binary {
                op, left, right, ..
            } => self.evaluate_binary(*op, left, right),
            Expr::Access { receiver, name, .. } => {
                if receiver.is_some() {
                    return Err(PlcError::runtime("values have no fields"));
                }
                self.scope
                    .lookup_variable(name)
                    .ok_or_else(|| PlcError::runtime(format!("undefined variable '{}'", name)))
            }
            Expr::Function {
                receiver,
                name,
                arguments,
                ..
            } => {
                if receiver.is_some() {
                    return Err(PlcError::runtime("values have no methods"));
                }
                let function = self
                    .scope
                    .lookup_function(name, arguments.len())
                    .ok_or_else(|| {
                        PlcError::runtime(format!(
                            "undefined function '{}/{}'",
                            name,
                            arguments.len()
                        ))
                    })?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }
                self.call(function, values)
            }
        }
    }

    fn evaluate_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And => {
                // Both logical operators short-circuit.
                if !self.evaluate_boolean(left)? {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.evaluate_boolean(right)?))
            }
            BinaryOp::Or => {
                if self.evaluate_boolean(left)? {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.evaluate_boolean(right)?))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                let ordering = left.compare(&right).ok_or_else(|| {
                    PlcError::runtime(format!(
                        "cannot compare {} with {}",
                        left.kind_name(),
                        right.kind_name()
                    ))
                })?;
                Ok(Value::Boolean(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            BinaryOp::Eq => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(Value::Boolean(left == right))
            }
            BinaryOp::Ne => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(Value::Boolean(left != right))
            }
            BinaryOp::Add => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match (&left, &right) {
                    (Value::String(_), _) | (_, Value::String(_)) => {
                        Ok(Value::String(format!("{}{}", left, right)))
                    }
                    (Value::Integer(l), Value::Integer(r)) => l
                        .checked_add(*r)
                        .map(Value::Integer)
                        .ok_or_else(|| PlcError::runtime("integer overflow")),
                    (Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l + r)),
                    _ => Err(Self::arithmetic_mismatch("+", &left, &right)),
                }
            }
            BinaryOp::Sub => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match (&left, &right) {
                    (Value::Integer(l), Value::Integer(r)) => l
                        .checked_sub(*r)
                        .map(Value::Integer)
                        .ok_or_else(|| PlcError::runtime("integer overflow")),
                    (Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l - r)),
                    _ => Err(Self::arithmetic_mismatch("-", &left, &right)),
                }
            }
            BinaryOp::Mul => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match (&left, &right) {
                    (Value::Integer(l), Value::Integer(r)) => l
                        .checked_mul(*r)
                        .map(Value::Integer)
                        .ok_or_else(|| PlcError::runtime("integer overflow")),
                    (Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l * r)),
                    _ => Err(Self::arithmetic_mismatch("*", &left, &right)),
                }
            }
            BinaryOp::Div => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match (&left, &right) {
                    (Value::Integer(_), Value::Integer(0)) => {
                        Err(PlcError::runtime("division by zero"))
                    }
                    (Value::Integer(l), Value::Integer(r)) => l
                        .checked_div(*r)
                        .map(Value::Integer)
                        .ok_or_else(|| PlcError::runtime("integer overflow")),
                    (Value::Decimal(_), Value::Decimal(r)) if *r == 0.0 => {
                        Err(PlcError::runtime("division by zero"))
                    }
                    (Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l / r)),
                    _ => Err(Self::arithmetic_mismatch("/", &left, &right)),
                }
            }
        }
    }

    fn evaluate_boolean(&mut self, expression: &Expr) -> Result<bool> {
        match self.evaluate(expression)? {
            Value::Boolean(b) => Ok(b),
            other => Err(PlcError::runtime(format!(
                "expected Boolean, received {}",
                other.kind_name()
            ))),
        }
    }

    fn arithmetic_mismatch(op: &str, left: &Value, right: &Value) -> PlcError {
        PlcError::runtime(format!(
            "'{}' is not defined for {} and {}",
            op,
            left.kind_name(),
            right.kind_name()
        ))
    }

    fn in_child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope = self.scope.child();
        let result = f(self);
        self.scope = self.scope.parent().expect("child scope has a parent");
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
