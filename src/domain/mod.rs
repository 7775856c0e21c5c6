// Domain layer: language model (tokens, AST, types, values, scopes) and the
// ports the engine is generic over.

pub mod ast;
pub mod ports;
pub mod scope;
pub mod token;
pub mod types;
pub mod value;
