//! Terminals of the demo IR.
//!
//! | text   | terminal   | attributes |
//! |--------|------------|------------|
//! | `+`    | `+`        |            |
//! | `=`    | `=`        |            |
//! | `ind`  | `ind`      |            |
//! | `C<x>` | `C`        | `value`    |
//! | `R<x>` | `register` | `value`    |
//! | `M<x>` | `memory`   | `value`    |

use agram::{END, Terminal, TokenRule, Tokenizer, Tokens};
use once_cell::sync::Lazy;

static TOKENS: Lazy<Vec<TokenRule<Terminal>>> = Lazy::new(|| {
    vec![
        TokenRule::new(r"\+", |_| Some(Terminal::new("+"))).unwrap(),
        TokenRule::new(r"=", |_| Some(Terminal::new("="))).unwrap(),
        TokenRule::new(r"ind", |_| Some(Terminal::new("ind"))).unwrap(),
        TokenRule::new(r"C(\S+)", |c| Some(Terminal::new("C").with("value", &c[1]))).unwrap(),
        TokenRule::new(r"\s", |_| None).unwrap(),
        TokenRule::new(r"R(\S+)", |c| Some(Terminal::new("register").with("value", &c[1])))
            .unwrap(),
        TokenRule::new(r"M(\S+)", |c| Some(Terminal::new("memory").with("value", &c[1])))
            .unwrap(),
    ]
});

/// Drops blank lines and `//` comment lines.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.is_empty() && !line.starts_with("//")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lexes IR text into a terminal stream ending with `$`.
pub fn terminals(text: &str) -> agram::Result<Tokens<'static, '_, Terminal>> {
    Ok(Tokenizer::try_new(TOKENS.as_slice(), Terminal::new(END), text)?.into_tokens())
}
