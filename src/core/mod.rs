pub mod analyzer;
pub mod engine;
pub mod generator;
pub mod interpreter;
pub mod lexer;
pub mod parser;

pub use crate::domain::ports::{ConfigProvider, EmitMode, SourceStore};
pub use crate::utils::error::Result;
