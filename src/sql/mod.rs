pub mod compiler;
pub mod execution;
pub mod parser;
