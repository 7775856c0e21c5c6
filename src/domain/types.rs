use crate::utils::error::{PlcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static types of the PLC language.
///
/// `Any` is the top type, `Comparable` covers the four ordered primitive
/// types, and `Nil` is the type of the `NIL` literal and of methods without a
/// return annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Any,
    Nil,
    Comparable,
    Boolean,
    Integer,
    Decimal,
    Character,
    String,
}

impl Type {
    /// Resolves a type annotation. Unknown names are analysis errors.
    pub fn from_name(name: &str) -> Result<Type> {
        match name {
            "Any" => Ok(Type::Any),
            "Nil" => Ok(Type::Nil),
            "Comparable" => Ok(Type::Comparable),
            "Boolean" => Ok(Type::Boolean),
            "Integer" => Ok(Type::Integer),
            "Decimal" => Ok(Type::Decimal),
            "Character" => Ok(Type::Character),
            "String" => Ok(Type::String),
            other => Err(PlcError::analysis(format!("unknown type: {}", other))),
        }
    }

    /// The name the Java generator prints for this type.
    pub fn jvm_name(&self) -> &'static str {
        match self {
            Type::Any => "Object",
            Type::Nil => "Void",
            Type::Comparable => "Comparable",
            Type::Boolean => "boolean",
            Type::Integer => "int",
            Type::Decimal => "double",
            Type::Character => "char",
            Type::String => "String",
        }
    }

    pub fn is_comparable(&self) -> bool {
        matches!(
            self,
            Type::Integer | Type::Decimal | Type::Character | Type::String
        )
    }

    /// Whether a value of type `other` may be assigned to a slot of this type.
    pub fn assignable_from(&self, other: Type) -> bool {
        *self == other || *self == Type::Any || (*self == Type::Comparable && other.is_comparable())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub fn require_assignable(target: Type, ty: Type) -> Result<()> {
    if target.assignable_from(ty) {
        Ok(())
    } else {
        Err(PlcError::analysis(format!(
            "type {} is not assignable to {}",
            ty, target
        )))
    }
}

/// A resolved variable: the source name, the name generated Java uses, its
/// static type, and whether it was declared CONST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub jvm_name: String,
    pub ty: Type,
    pub constant: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, constant: bool) -> Self {
        let name = name.into();
        Self {
            jvm_name: name.clone(),
            name,
            ty,
            constant,
        }
    }

    pub fn with_jvm_name(mut self, jvm_name: impl Into<String>) -> Self {
        self.jvm_name = jvm_name.into();
        self
    }
}

/// A resolved function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub name: String,
    pub jvm_name: String,
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
}

impl FunctionSig {
    pub fn new(name: impl Into<String>, parameter_types: Vec<Type>, return_type: Type) -> Self {
        let name = name.into();
        Self {
            jvm_name: name.clone(),
            name,
            parameter_types,
            return_type,
        }
    }

    pub fn with_jvm_name(mut self, jvm_name: impl Into<String>) -> Self {
        self.jvm_name = jvm_name.into();
        self
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}
