use crate::domain::ast::{BinaryOp, Expr, Field, Literal, Method, Source, Stmt};
use crate::domain::scope::Scope;
use crate::domain::types::{require_assignable, FunctionSig, Type, Variable};
use crate::utils::error::{PlcError, Result};

/// Scope used during analysis: variables carry their static type, functions
/// their signature.
pub type StaticScope = Scope<Variable, FunctionSig>;

/// Type-checks a parsed AST and annotates it with resolved types, variables
/// and function signatures. The generator relies on those annotations.
pub struct Analyzer {
    scope: StaticScope,
    return_type: Option<Type>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_scope(StaticScope::new())
    }

    /// Builds an analyzer over a child of `parent`, with the `print` builtin
    /// defined (it generates as `System.out.println`).
    pub fn with_scope(parent: StaticScope) -> Self {
        let scope = parent.child();
        scope.define_function(
            "print",
            1,
            FunctionSig::new("print", vec![Type::Any], Type::Nil)
                .with_jvm_name("System.out.println"),
        );
        Analyzer {
            scope,
            return_type: None,
        }
    }

    pub fn analyze(&mut self, source: &mut Source) -> Result<()> {
        for field in &mut source.fields {
            self.analyze_field(field)?;
        }
        for method in &mut source.methods {
            self.analyze_method(method)?;
        }

        let main = self
            .scope
            .lookup_function("main", 0)
            .ok_or_else(|| PlcError::analysis("program defines no main/0 function"))?;
        require_assignable(Type::Integer, main.return_type)?;
        Ok(())
    }

    pub fn analyze_field(&mut self, field: &mut Field) -> Result<()> {
        let ty = Type::from_name(&field.type_name)?;

        if let Some(value) = &mut field.value {
            // The initializer is analyzed before the field exists, so a field
            // cannot reference itself.
            self.analyze_expr(value)?;
            require_assignable(ty, value.ty()?)?;
        } else if field.constant {
            return Err(PlcError::analysis(format!(
                "constant field '{}' must be initialized",
                field.name
            )));
        }

        let variable = Variable::new(field.name.clone(), ty, field.constant);
        self.scope.define_variable(field.name.clone(), variable.clone());
        field.variable = Some(variable);
        Ok(())
    }

    pub fn analyze_method(&mut self, method: &mut Method) -> Result<()> {
        let return_type = match &method.return_type_name {
            Some(name) => Type::from_name(name)?,
            None => Type::Nil,
        };
        let mut parameter_types = Vec::with_capacity(method.parameter_type_names.len());
        for name in &method.parameter_type_names {
            parameter_types.push(Type::from_name(name)?);
        }

        // Defined before the body is analyzed so the method can recurse.
        let signature = FunctionSig::new(method.name.clone(), parameter_types.clone(), return_type);
        self.scope
            .define_function(method.name.clone(), signature.arity(), signature.clone());
        method.function = Some(signature);

        let enclosing = self.return_type.replace(return_type);
        let result = self.in_child_scope(|analyzer| {
            for (parameter, ty) in method.parameters.iter().zip(&parameter_types) {
                analyzer
                    .scope
                    .define_variable(parameter.clone(), Variable::new(parameter.clone(), *ty, false));
            }
            for statement in &mut method.statements {
                analyzer.analyze_stmt(statement)?;
            }
            Ok(())
        });
        self.return_type = enclosing;
        result
    }

    pub fn analyze_stmt(&mut self, statement: &mut Stmt) -> Result<()> {
        match statement {
            Stmt::Expression { expression } => {
                if !matches!(expression, Expr::Function { .. }) {
                    return Err(PlcError::analysis(
                        "expression statements must be function calls",
                    ));
                }
                self.analyze_expr(expression)
            }
            Stmt::Declaration {
                name,
                type_name,
                value,
                variable,
            } => {
                if let Some(value) = value.as_mut() {
                    self.analyze_expr(value)?;
                }
                let ty = match (type_name.as_deref(), value.as_ref()) {
                    (Some(annotation), Some(value)) => {
                        let ty = Type::from_name(annotation)?;
                        require_assignable(ty, value.ty()?)?;
                        ty
                    }
                    (Some(annotation), None) => Type::from_name(annotation)?,
                    (None, Some(value)) => value.ty()?,
                    (None, None) => {
                        return Err(PlcError::analysis(format!(
                            "declaration of '{}' needs a type or an initializer",
                            name
                        )))
                    }
                };
                let resolved = Variable::new(name.clone(), ty, false);
                self.scope.define_variable(name.clone(), resolved.clone());
                *variable = Some(resolved);
                Ok(())
            }
            Stmt::Assignment { receiver, value } => {
                if !matches!(receiver, Expr::Access { .. }) {
                    return Err(PlcError::analysis(
                        "assignment target must be a variable access",
                    ));
                }
                self.analyze_expr(receiver)?;
                self.analyze_expr(value)?;
                require_assignable(receiver.ty()?, value.ty()?)?;

                if let Expr::Access {
                    variable: Some(variable),
                    ..
                } = receiver
                {
                    if variable.constant {
                        return Err(PlcError::analysis(format!(
                            "cannot assign to constant '{}'",
                            variable.name
                        )));
                    }
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_statements,
                else_statements,
            } => {
                self.analyze_expr(condition)?;
                require_assignable(Type::Boolean, condition.ty()?)?;
                if then_statements.is_empty() {
                    return Err(PlcError::analysis("if statement has an empty body"));
                }
                self.in_child_scope(|analyzer| {
                    then_statements
                        .iter_mut()
                        .try_for_each(|s| analyzer.analyze_stmt(s))
                })?;
                self.in_child_scope(|analyzer| {
                    else_statements
                        .iter_mut()
                        .try_for_each(|s| analyzer.analyze_stmt(s))
                })
            }
            Stmt::For {
                initialization,
                condition,
                increment,
                statements,
            } => {
                let mut clause_type = None;
                if let Some(initialization) = initialization.as_deref_mut() {
                    clause_type = Some(self.analyze_for_clause(initialization)?);
                }
                if let Some(increment) = increment.as_deref_mut() {
                    let increment_type = self.analyze_for_clause(increment)?;
                    if let Some(clause_type) = clause_type {
                        require_assignable(clause_type, increment_type)?;
                    }
                }

                self.analyze_expr(condition)?;
                require_assignable(Type::Boolean, condition.ty()?)?;

                if statements.is_empty() {
                    return Err(PlcError::analysis("for loop has an empty body"));
                }
                self.in_child_scope(|analyzer| {
                    statements
                        .iter_mut()
                        .try_for_each(|s| analyzer.analyze_stmt(s))
                })
            }
            Stmt::While {
                condition,
                statements,
            } => {
                self.analyze_expr(condition)?;
                require_assignable(Type::Boolean, condition.ty()?)?;
                self.in_child_scope(|analyzer| {
                    statements
                        .iter_mut()
                        .try_for_each(|s| analyzer.analyze_stmt(s))
                })
            }
            Stmt::Return { value } => {
                self.analyze_expr(value)?;
                let expected = self
                    .return_type
                    .ok_or_else(|| PlcError::analysis("RETURN outside of a method"))?;
                require_assignable(expected, value.ty()?)
            }
        }
    }

    /// For-loop init/increment clauses: an assignment whose target is
    /// Comparable.
    fn analyze_for_clause(&mut self, clause: &mut Stmt) -> Result<Type> {
        match clause {
            Stmt::Assignment { .. } => {
                self.analyze_stmt(clause)?;
                let Stmt::Assignment { receiver, .. } = clause else {
                    unreachable!("clause just matched as assignment");
                };
                let ty = receiver.ty()?;
                require_assignable(Type::Comparable, ty)?;
                Ok(ty)
            }
            _ => Err(PlcError::analysis(
                "for-loop clauses must be assignments",
            )),
        }
    }

    pub fn analyze_expr(&mut self, expression: &mut Expr) -> Result<()> {
        match expression {
            Expr::Literal { value, ty } => {
                *ty = Some(match value {
                    Literal::Nil => Type::Nil,
                    Literal::Boolean(_) => Type::Boolean,
                    Literal::Integer(i) => {
                        // Generated Java stores these in an int.
                        if *i > i64::from(i32::MAX) || *i < i64::from(i32::MIN) {
                            return Err(PlcError::analysis(format!(
                                "integer literal {} does not fit in 32 bits",
                                i
                            )));
                        }
                        Type::Integer
                    }
                    Literal::Decimal(d) => {
                        if !d.is_finite() {
                            return Err(PlcError::analysis(format!(
                                "decimal literal {} is out of range",
                                d
                            )));
                        }
                        Type::Decimal
                    }
                    Literal::Character(_) => Type::Character,
                    Literal::String(_) => Type::String,
                });
                Ok(())
            }
            Expr::Group { expression, ty } => {
                if !matches!(**expression, Expr::Binary { .. }) {
                    return Err(PlcError::analysis(
                        "grouped expression must be a binary expression",
                    ));
                }
                self.analyze_expr(expression)?;
                *ty = Some(expression.ty()?);
                Ok(())
            }
            Expr::Binary {
                op,
                left,
                right,
                ty,
            } => {
                self.analyze_expr(left)?;
                self.analyze_expr(right)?;
                let left_ty = left.ty()?;
                let right_ty = right.ty()?;

                let result = match op {
                    BinaryOp::And | BinaryOp::Or => {
                        require_assignable(Type::Boolean, left_ty)?;
                        require_assignable(Type::Boolean, right_ty)?;
                        Type::Boolean
                    }
                    BinaryOp::Lt
                    | BinaryOp::Le
                    | BinaryOp::Gt
                    | BinaryOp::Ge
                    | BinaryOp::Eq
                    | BinaryOp::Ne => {
                        require_assignable(Type::Comparable, left_ty)?;
                        require_assignable(Type::Comparable, right_ty)?;
                        Type::Boolean
                    }
                    BinaryOp::Add => {
                        if left_ty == Type::String || right_ty == Type::String {
                            Type::String
                        } else {
                            Self::numeric_result(left_ty, right_ty)?
                        }
                    }
                    BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                        Self::numeric_result(left_ty, right_ty)?
                    }
                };
                *ty = Some(result);
                Ok(())
            }
            Expr::Access {
                receiver,
                name,
                variable,
            } => {
                if let Some(receiver) = receiver {
                    self.analyze_expr(receiver)?;
                    return Err(PlcError::analysis(format!(
                        "type {} has no field '{}'",
                        receiver.ty()?,
                        name
                    )));
                }
                let resolved = self.scope.lookup_variable(name).ok_or_else(|| {
                    PlcError::analysis(format!("undefined variable '{}'", name))
                })?;
                *variable = Some(resolved);
                Ok(())
            }
            Expr::Function {
                receiver,
                name,
                arguments,
                function,
            } => {
                if let Some(receiver) = receiver {
                    self.analyze_expr(receiver)?;
                    return Err(PlcError::analysis(format!(
                        "type {} has no method '{}'",
                        receiver.ty()?,
                        name
                    )));
                }
                let resolved = self
                    .scope
                    .lookup_function(name, arguments.len())
                    .ok_or_else(|| {
                        PlcError::analysis(format!(
                            "undefined function '{}/{}'",
                            name,
                            arguments.len()
                        ))
                    })?;
                for (argument, parameter_ty) in
                    arguments.iter_mut().zip(resolved.parameter_types.clone())
                {
                    self.analyze_expr(argument)?;
                    require_assignable(parameter_ty, argument.ty()?)?;
                }
                *function = Some(resolved);
                Ok(())
            }
        }
    }

    fn numeric_result(left: Type, right: Type) -> Result<Type> {
        match left {
            Type::Integer => {
                require_assignable(Type::Integer, right)?;
                Ok(Type::Integer)
            }
            Type::Decimal => {
                require_assignable(Type::Decimal, right)?;
                Ok(Type::Decimal)
            }
            other => Err(PlcError::analysis(format!(
                "arithmetic requires Integer or Decimal operands, got {}",
                other
            ))),
        }
    }

    fn in_child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope = self.scope.child();
        let result = f(self);
        self.scope = self.scope.parent().expect("child scope has a parent");
        result
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
