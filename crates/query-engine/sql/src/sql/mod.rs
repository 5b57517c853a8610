//! SQL AST, its conversion to parameterized SQL strings, and the dialect descriptor.

pub mod ast;
pub mod convert;
pub mod dialect;
pub mod execution_plan;
pub mod helpers;
pub mod string;
