//! Longest-match, priority-ordered tokenizer.
//!
//! A [`Tokenizer`] is driven by an ordered slice of [`TokenRule`]s. At every
//! offset all rules are tried anchored at that offset; the longest match
//! wins and ties go to the rule listed first. A rule's producer turns the
//! match into a token, or returns `None` to skip the text (whitespace).
//! At end of input the tokenizer yields its end token, repeatedly.
//!
//! The same machinery lexes grammar files, the action language and the
//! terminal streams fed to the driver.

use crate::cursor::{Cursor, Location};
use crate::error::{Error, Result};
use regex::{Captures, Regex};
use std::fmt;

/// Maximum number of characters of remaining input quoted by
/// [`Error::UnknownToken`].
pub const PREVIEW_LEN: usize = 50;

/// Maps a successful match to a token, or `None` to skip it.
pub type Producer<T> = fn(&Captures<'_>) -> Option<T>;

/// One token descriptor.
pub struct TokenRule<T> {
    regex: Regex,
    produce: Producer<T>,
}

impl<T> TokenRule<T> {
    /// Compiles `pattern` anchored at the match offset.
    pub fn new(pattern: &str, produce: Producer<T>) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self { regex, produce })
    }

    /// The anchored pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl<T> fmt::Debug for TokenRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRule")
            .field("pattern", &self.regex.as_str())
            .finish()
    }
}

/// Pull-based tokenizer over `input`.
///
/// The first token is produced by [`Tokenizer::try_new`]; after that
/// [`Tokenizer::advance`] moves to the next one and [`Tokenizer::current`]
/// returns the most recent non-skipped token.
#[derive(Debug)]
pub struct Tokenizer<'r, 'i, T> {
    rules: &'r [TokenRule<T>],
    end: T,
    input: &'i str,
    cursor: Cursor,
    current: T,
}

impl<'r, 'i, T> Tokenizer<'r, 'i, T>
where
    T: Clone,
{
    pub fn try_new(rules: &'r [TokenRule<T>], end: T, input: &'i str) -> Result<Self> {
        let mut tokenizer = Self {
            rules,
            current: end.clone(),
            end,
            input,
            cursor: Cursor::new(),
        };
        tokenizer.advance()?;
        Ok(tokenizer)
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    /// Position of the next unread character.
    pub fn location(&self) -> Location {
        self.cursor.location()
    }

    /// Produces the next token and makes it current.
    pub fn advance(&mut self) -> Result<&T> {
        let input = self.input;
        loop {
            let rest = &input[self.cursor.offset..];
            if rest.is_empty() {
                self.current = self.end.clone();
                return Ok(&self.current);
            }

            let mut longest: Option<(usize, Captures<'i>)> = None;
            for (i, rule) in self.rules.iter().enumerate() {
                let Some(caps) = rule.regex.captures(rest) else {
                    continue;
                };
                let len = caps.get(0).map_or(0, |m| m.len());
                let best = longest
                    .as_ref()
                    .map_or(0, |(_, c)| c.get(0).map_or(0, |m| m.len()));
                if len > best {
                    longest = Some((i, caps));
                }
            }

            let Some((i, caps)) = longest else {
                return Err(Error::UnknownToken {
                    location: self.cursor.location(),
                    preview: rest.chars().take(PREVIEW_LEN).collect(),
                });
            };

            let text = caps.get(0).map_or("", |m| m.as_str());
            log::trace!(
                "MATCHED: rule={}, at {}, text={:?}",
                i,
                self.cursor.location(),
                text
            );
            self.cursor.advance_str(text);

            if let Some(token) = (self.rules[i].produce)(&caps) {
                self.current = token;
                return Ok(&self.current);
            }
        }
    }

    /// Turns the tokenizer into an endless iterator: the current token
    /// first, then one [`advance`](Self::advance) per item.
    pub fn into_tokens(self) -> Tokens<'r, 'i, T> {
        Tokens {
            tokenizer: self,
            started: false,
        }
    }
}

/// Iterator returned by [`Tokenizer::into_tokens`].
///
/// Never returns `None`; once the input is exhausted it repeats the end
/// token.
#[derive(Debug)]
pub struct Tokens<'r, 'i, T> {
    tokenizer: Tokenizer<'r, 'i, T>,
    started: bool,
}

impl<'r, 'i, T> Tokens<'r, 'i, T> {
    pub fn location(&self) -> Location {
        self.tokenizer.cursor.location()
    }
}

impl<'r, 'i, T> Iterator for Tokens<'r, 'i, T>
where
    T: Clone,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(Ok(self.tokenizer.current().clone()));
        }
        Some(self.tokenizer.advance().cloned())
    }
}
