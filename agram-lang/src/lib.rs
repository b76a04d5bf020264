//! Text front ends for `agram`.
//!
//!  * [`grammar_file`] reads rule files into [`agram::Rule`]s;
//!  * [`action`] parses the statements and guard conditions inside rules;
//!  * [`ir`] lexes the demo IR into [`agram::Terminal`]s.
//!
//! The `agram` binary (feature `cli`) ties them together.

pub mod action;
mod error;
pub mod grammar_file;
pub mod ir;

pub use crate::error::{LangError, Result};
pub use crate::grammar_file::{parse_rules, read_grammar};
