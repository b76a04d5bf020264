//! Reader for grammar files.
//!
//! One rule per line:
//!
//! ```text
//! Expr$0 -> + Expr$1 C$2 [$2.value = "0"] {$0.reg = $1.reg}
//! ```
//!
//! The optional `[...]` block is a guard condition and the optional `{...}`
//! block holds action statements, one per line; an action block may span
//! several lines. Blank lines between rules are ignored.

use crate::action::{parse_condition, parse_statement};
use crate::error::{LangError, Result};
use agram::{Grammar, Rule, Symbol, TokenRule, Tokenizer};
use once_cell::sync::Lazy;
use regex::Captures;
use smartstring::alias::String;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    End,
    Arrow,
    Condition(String),
    Action(String),
    Newline,
    Ident(Symbol),
}

fn ident(caps: &Captures<'_>) -> Option<Token> {
    let name = &caps[1];
    Some(Token::Ident(match caps.get(2) {
        Some(index) => Symbol::indexed(name, index.as_str().parse().ok()?),
        None => Symbol::new(name),
    }))
}

static TOKENS: Lazy<Vec<TokenRule<Token>>> = Lazy::new(|| {
    vec![
        TokenRule::new(r"->", |_| Some(Token::Arrow)).unwrap(),
        TokenRule::new(r"\[([^\]]*)\]", |c| Some(Token::Condition(c[1].into()))).unwrap(),
        TokenRule::new(r"\{([^\}]*)\}", |c| Some(Token::Action(c[1].into()))).unwrap(),
        TokenRule::new(r"\n", |_| Some(Token::Newline)).unwrap(),
        TokenRule::new(r"\s", |_| None).unwrap(),
        TokenRule::new(r"([^$\s]+)(?:\$(\d{1,9}))?", ident).unwrap(),
    ]
});

struct Parser<'i> {
    tokens: Tokenizer<'static, 'i, Token>,
}

impl<'i> Parser<'i> {
    fn new(text: &'i str) -> Result<Self> {
        Ok(Self {
            tokens: Tokenizer::try_new(TOKENS.as_slice(), Token::End, text)?,
        })
    }

    fn error(&self, message: &str) -> LangError {
        LangError::syntax(self.tokens.location(), message)
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while *self.tokens.current() == Token::Newline {
            self.tokens.advance()?;
        }
        Ok(())
    }

    fn rules(&mut self) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        self.skip_newlines()?;
        while *self.tokens.current() != Token::End {
            rules.push(self.rule()?);
            self.skip_newlines()?;
        }
        Ok(rules)
    }

    fn rule(&mut self) -> Result<Rule> {
        let Token::Ident(lhs) = self.tokens.current().clone() else {
            return Err(self.error("expected a rule"));
        };
        if *self.tokens.advance()? != Token::Arrow {
            return Err(self.error("expected `->`"));
        }
        self.tokens.advance()?;

        let mut production = Vec::new();
        while let Token::Ident(sym) = self.tokens.current() {
            production.push(sym.clone());
            self.tokens.advance()?;
        }
        let mut rule = Rule::new(lhs, production);

        if let Token::Condition(text) = self.tokens.current().clone() {
            if !text.trim().is_empty() {
                rule = rule.with_condition(parse_condition(&text)?);
            }
            self.tokens.advance()?;
        }

        if let Token::Action(text) = self.tokens.current().clone() {
            let statements = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(parse_statement)
                .collect::<Result<Vec<_>>>()?;
            if !statements.is_empty() {
                rule = rule.with_action(statements);
            }
            self.tokens.advance()?;
        }

        match self.tokens.current() {
            Token::Newline => {
                self.tokens.advance()?;
            }
            Token::End => {}
            _ => return Err(self.error("expected end of line")),
        }
        log::trace!("RULE: {}", rule);
        Ok(rule)
    }
}

/// Parses grammar text into rules, in file order.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    Parser::new(text)?.rules()
}

/// Reads a grammar file and builds its tables.
pub fn read_grammar<P: AsRef<Path>>(path: P) -> Result<Grammar> {
    let text = std::fs::read_to_string(&path)?;
    let rules = parse_rules(&text)?;
    log::debug!("read {} rules from {}", rules.len(), path.as_ref().display());
    Ok(Grammar::try_new(rules)?)
}
