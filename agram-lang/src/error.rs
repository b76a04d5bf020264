use agram::Location;
use std::io;
use thiserror::Error;

pub type Result<T, E = LangError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LangError {
    #[error("syntax error at {location}: {message}")]
    Syntax { location: Location, message: String },

    #[error(transparent)]
    Grammar(#[from] agram::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl LangError {
    pub(crate) fn syntax(location: Location, message: impl Into<String>) -> Self {
        LangError::Syntax {
            location,
            message: message.into(),
        }
    }
}
