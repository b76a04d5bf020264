//! Guarded attribute grammars, built and run.
//!
//! `agram` turns a list of [`Rule`]s into LR(0) item sets, FIRST/FOLLOW sets
//! and an action/goto table, then interprets that table over a stream of
//! [`Terminal`]s:
//!  * **reduces** are placed on the FOLLOW set of the rule's nonterminal;
//!    conflicting unconditional reduces keep the longest rule, and guarded
//!    rules share a cell and are chosen at parse time by their condition;
//!  * **actions** attached to rules read and write the attribute maps of the
//!    symbols being reduced and emit output lines.
//!
//! The [`tokenizer`] module holds the longest-match lexer used by the
//! textual front ends.
//!
//! ```
//! use agram::{Grammar, Rule, Symbol, Terminal};
//!
//! let grammar = Grammar::try_new(vec![Rule::new(Symbol::new("S"), vec![Symbol::new("x")])])?;
//! let terminals = [Terminal::new("x"), Terminal::new("$")].into_iter().map(Ok);
//! let stats = grammar.parse(terminals, std::io::sink())?;
//! assert_eq!(stats.shifts, 1);
//! # Ok::<(), agram::Error>(())
//! ```

pub mod context;
pub mod cursor;
pub mod driver;
pub mod dump;
mod error;
pub mod grammar;
pub mod language;
pub mod slr;
mod symtab;
pub mod tokenizer;

pub use crate::context::ReduceContext;
pub use crate::cursor::{Cursor, Location, Position};
pub use crate::driver::{ParseStats, StackEntry};
pub use crate::error::{ConflictKind, Error, Failure, Result};
pub use crate::grammar::{END, EMPTY, Grammar, START};
pub use crate::language::{
    AttributeIdentifier, Attributes, Expression, LogicalExpression, Rule, RuleAction, Statement,
    Symbol, Target, Terminal,
};
pub use crate::slr::Action;
pub use crate::symtab::Symtab;
pub use crate::tokenizer::{PREVIEW_LEN, Producer, TokenRule, Tokenizer, Tokens};
