use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Integer,
    Decimal,
    Character,
    String,
    Operator,
}

/// A lexed token: its kind, the exact source text, and the character index
/// where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub index: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, index: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            index,
        }
    }

    /// Index just past this token, where "expected X after Y" errors point.
    /// Indices count characters, not bytes, like the lexer's cursor.
    pub fn end_index(&self) -> usize {
        self.index + self.literal.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})@{}", self.kind, self.literal, self.index)
    }
}
