//! Error type shared by the tokenizer, the table builder and the driver.
//!
//! Every failure is fatal to the operation that raised it: a build error
//! aborts [`Grammar`](crate::Grammar) construction, a run-time error aborts
//! that one parse. Variants are kept distinct so callers can tell input
//! problems ([`Error::UnknownToken`], [`Error::ParseFailed`]) from grammar
//! authoring bugs ([`Error::TableConflict`], [`Error::MissingAttribute`])
//! and from broken internal invariants ([`Error::TableInconsistency`]).

use crate::cursor::Location;
use crate::language::Target;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What makes a table cell undecidable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// `Accept` shares its cell with another action.
    Accept,
    /// A shift shares its cell with a reduce.
    ShiftReduce,
    /// More than one unconditional reduce survived resolution.
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictKind::Accept => "accept",
            ConflictKind::ShiftReduce => "shift/reduce",
            ConflictKind::ReduceReduce => "reduce/reduce",
        })
    }
}

/// Why a parse stopped without reaching `Accept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The terminal source ran dry before `Accept`.
    EndOfInput,
    /// The table has no action for this terminal in this state.
    NoAction { state: usize, terminal: String },
    /// Every reduce candidate is guarded and no guard holds.
    NoSatisfiedReduce { state: usize, terminal: String },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::EndOfInput => write!(f, "unexpected end of terminal stream"),
            Failure::NoAction { state, terminal } => {
                write!(f, "no action for {:?} in state {}", terminal, state)
            }
            Failure::NoSatisfiedReduce { state, terminal } => write!(
                f,
                "no reduce rule satisfies its condition in state {} on {:?}",
                state, terminal
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown token at {location}\n{preview}")]
    UnknownToken { location: Location, preview: String },

    #[error("unknown terminal {name:?} (terminal #{index})")]
    UnknownTerminal { name: String, index: usize },

    #[error("invalid token pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("reserved symbol {name:?} used in a rule")]
    ReservedSymbol { name: String },

    #[error("{kind} conflict in state {state} on {terminal:?}: {actions}")]
    TableConflict {
        state: usize,
        terminal: String,
        kind: ConflictKind,
        actions: String,
    },

    #[error("duplicate goto from state {state} on {nonterminal:?}: {first} and {second}")]
    DuplicateGoto {
        state: usize,
        nonterminal: String,
        first: usize,
        second: usize,
    },

    #[error("parse failed: {0}")]
    ParseFailed(Failure),

    #[error("missing attribute {attribute:?} of {target}")]
    MissingAttribute { target: Target, attribute: String },

    #[error("no attribute map bound to {target}")]
    UnboundTarget { target: Target },

    #[error("table inconsistency: {0}")]
    TableInconsistency(String),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn inconsistency(message: impl Into<String>) -> Self {
        Error::TableInconsistency(message.into())
    }
}
