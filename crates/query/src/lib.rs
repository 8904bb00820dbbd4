//! Filter language for the document store.
//!
//! A small GROQ-flavoured subset: `*[category == $category && _id != $id] |
//! order(createdAt desc)`. Expressions are parsed once and then either
//! evaluated in memory ([`eval`]) or compiled by a storage backend.

pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{Direction, Expr, OrderBy, Pipeline};
pub use eval::{compare_values, eval_filter, values_equal, EvalError};
pub use parser::{parse, parse_pipeline, ParseError};
