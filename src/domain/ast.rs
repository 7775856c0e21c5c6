use crate::domain::types::{FunctionSig, Type, Variable};
use crate::utils::error::{PlcError, Result};
use serde::{Deserialize, Serialize};

/// A whole program: global fields followed by method definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

/// `LET [CONST] name: Type [= value];` at the top level.
///
/// `variable` is filled in by the analyzer; the generator refuses to run
/// without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub constant: bool,
    pub value: Option<Expr>,
    pub variable: Option<Variable>,
}

/// `DEF name(params): ReturnType DO ... END`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<String>,
    pub parameter_type_names: Vec<String>,
    pub return_type_name: Option<String>,
    pub statements: Vec<Stmt>,
    pub function: Option<FunctionSig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expression {
        expression: Expr,
    },
    Declaration {
        name: String,
        type_name: Option<String>,
        value: Option<Expr>,
        variable: Option<Variable>,
    },
    Assignment {
        receiver: Expr,
        value: Expr,
    },
    If {
        condition: Expr,
        then_statements: Vec<Stmt>,
        else_statements: Vec<Stmt>,
    },
    /// Initialization and increment, when present, are always assignments.
    For {
        initialization: Option<Box<Stmt>>,
        condition: Expr,
        increment: Option<Box<Stmt>>,
        statements: Vec<Stmt>,
    },
    While {
        condition: Expr,
        statements: Vec<Stmt>,
    },
    Return {
        value: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Character(char),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Word and symbol spellings both map to the same operator.
    pub fn from_literal(literal: &str) -> Option<BinaryOp> {
        match literal {
            "AND" | "&&" => Some(BinaryOp::And),
            "OR" | "||" => Some(BinaryOp::Or),
            "<" => Some(BinaryOp::Lt),
            "<=" => Some(BinaryOp::Le),
            ">" => Some(BinaryOp::Gt),
            ">=" => Some(BinaryOp::Ge),
            "==" => Some(BinaryOp::Eq),
            "!=" => Some(BinaryOp::Ne),
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            _ => None,
        }
    }

    /// How the operator renders in generated Java.
    pub fn jvm_symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal {
        value: Literal,
        ty: Option<Type>,
    },
    Group {
        expression: Box<Expr>,
        ty: Option<Type>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: Option<Type>,
    },
    Access {
        receiver: Option<Box<Expr>>,
        name: String,
        variable: Option<Variable>,
    },
    Function {
        receiver: Option<Box<Expr>>,
        name: String,
        arguments: Vec<Expr>,
        function: Option<FunctionSig>,
    },
}

impl Expr {
    pub fn literal(value: Literal) -> Expr {
        Expr::Literal { value, ty: None }
    }

    pub fn group(expression: Expr) -> Expr {
        Expr::Group {
            expression: Box::new(expression),
            ty: None,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: None,
        }
    }

    pub fn access(receiver: Option<Expr>, name: impl Into<String>) -> Expr {
        Expr::Access {
            receiver: receiver.map(Box::new),
            name: name.into(),
            variable: None,
        }
    }

    pub fn function(receiver: Option<Expr>, name: impl Into<String>, arguments: Vec<Expr>) -> Expr {
        Expr::Function {
            receiver: receiver.map(Box::new),
            name: name.into(),
            arguments,
            function: None,
        }
    }

    /// The type the analyzer assigned to this expression. Erroring here means
    /// the AST was handed to a consumer without being analyzed first.
    pub fn ty(&self) -> Result<Type> {
        let ty = match self {
            Expr::Literal { ty, .. } | Expr::Group { ty, .. } | Expr::Binary { ty, .. } => *ty,
            Expr::Access { variable, .. } => variable.as_ref().map(|v| v.ty),
            Expr::Function { function, .. } => function.as_ref().map(|f| f.return_type),
        };
        ty.ok_or_else(|| PlcError::analysis("expression has not been analyzed"))
    }

}
