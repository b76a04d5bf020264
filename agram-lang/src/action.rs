//! The statement and condition language of rule actions.
//!
//! ```text
//! expression := <newReg> | "literal" | target.attribute
//! statement  := emit expression* | target.attribute = expression
//! condition  := expression = expression
//! ```
//!
//! A target is a symbol name (`Expr.reg`) or a symbol index (`$1.value`).

use crate::error::{LangError, Result};
use agram::{
    AttributeIdentifier, Expression, LogicalExpression, Statement, Target, TokenRule, Tokenizer,
};
use once_cell::sync::Lazy;
use regex::Captures;
use smartstring::alias::String;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    End,
    Attribute(AttributeIdentifier),
    NewReg,
    Emit,
    Literal(String),
    Equals,
}

impl Token {
    fn describe(&self) -> std::string::String {
        match self {
            Token::End => "end of input".to_owned(),
            Token::Attribute(id) => format!("attribute {}", id),
            Token::NewReg => "`<newReg>`".to_owned(),
            Token::Emit => "`emit`".to_owned(),
            Token::Literal(value) => format!("literal {:?}", value.as_str()),
            Token::Equals => "`=`".to_owned(),
        }
    }
}

fn attribute(caps: &Captures<'_>) -> Option<Token> {
    let target = match (caps.get(1), caps.get(2)) {
        (Some(name), _) => Target::Named(name.as_str().into()),
        (None, Some(index)) => Target::Numbered(index.as_str().parse().ok()?),
        (None, None) => return None,
    };
    Some(Token::Attribute(AttributeIdentifier::new(target, &caps[3])))
}

static TOKENS: Lazy<Vec<TokenRule<Token>>> = Lazy::new(|| {
    vec![
        TokenRule::new(r"(?:([^$\s]+)|\$(\d{1,9}))\.([^$\s]+)", attribute).unwrap(),
        TokenRule::new(r"<newReg>", |_| Some(Token::NewReg)).unwrap(),
        TokenRule::new(r"emit", |_| Some(Token::Emit)).unwrap(),
        TokenRule::new(r#""([^"\n]*)""#, |c| Some(Token::Literal(c[1].into()))).unwrap(),
        TokenRule::new(r"=", |_| Some(Token::Equals)).unwrap(),
        TokenRule::new(r"\s", |_| None).unwrap(),
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

    fn error(&self, expected: &str) -> LangError {
        LangError::syntax(
            self.tokens.location(),
            format!("expected {}, found {}", expected, self.tokens.current().describe()),
        )
    }

    fn expression(&mut self) -> Result<Option<Expression>> {
        let expr = match self.tokens.current() {
            Token::NewReg => Expression::NewRegister,
            Token::Literal(value) => Expression::Literal(value.clone()),
            Token::Attribute(id) => Expression::AttributeRead(id.clone()),
            _ => return Ok(None),
        };
        self.tokens.advance()?;
        Ok(Some(expr))
    }

    fn expect_expression(&mut self) -> Result<Expression> {
        match self.expression()? {
            Some(expr) => Ok(expr),
            None => Err(self.error("an expression")),
        }
    }

    fn expect_equals(&mut self) -> Result<()> {
        if *self.tokens.current() != Token::Equals {
            return Err(self.error("`=`"));
        }
        self.tokens.advance()?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        match self.tokens.current() {
            Token::End => Ok(()),
            _ => Err(self.error("end of input")),
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.tokens.current().clone() {
            Token::Emit => {
                self.tokens.advance()?;
                let mut parts = Vec::new();
                while let Some(expr) = self.expression()? {
                    parts.push(expr);
                }
                Ok(Statement::Emit(parts))
            }
            Token::Attribute(dest) => {
                self.tokens.advance()?;
                self.expect_equals()?;
                let value = self.expect_expression()?;
                Ok(Statement::Assign(dest, value))
            }
            _ => Err(self.error("`emit` or an attribute")),
        }
    }

    fn condition(&mut self) -> Result<LogicalExpression> {
        let left = self.expect_expression()?;
        self.expect_equals()?;
        let right = self.expect_expression()?;
        Ok(LogicalExpression::Equals(left, right))
    }
}

/// Parses one action statement; the whole text must be consumed.
pub fn parse_statement(text: &str) -> Result<Statement> {
    let mut parser = Parser::new(text)?;
    let stmt = parser.statement()?;
    parser.finish()?;
    Ok(stmt)
}

/// Parses a guard condition; the whole text must be consumed.
pub fn parse_condition(text: &str) -> Result<LogicalExpression> {
    let mut parser = Parser::new(text)?;
    let condition = parser.condition()?;
    parser.finish()?;
    Ok(condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(target: Target, attribute: &str) -> AttributeIdentifier {
        AttributeIdentifier::new(target, attribute)
    }

    #[test]
    fn emit_with_mixed_parts() {
        let stmt = parse_statement(r#"emit "li r" $0.reg ", " Expr.value <newReg>"#).unwrap();
        assert_eq!(
            stmt,
            Statement::Emit(vec![
                Expression::Literal("li r".into()),
                Expression::AttributeRead(attr(Target::Numbered(0), "reg")),
                Expression::Literal(", ".into()),
                Expression::AttributeRead(attr(Target::Named("Expr".into()), "value")),
                Expression::NewRegister,
            ])
        );
    }

    #[test]
    fn bare_emit_writes_an_empty_line() {
        assert_eq!(parse_statement("emit").unwrap(), Statement::Emit(vec![]));
    }

    #[test]
    fn assignment() {
        let stmt = parse_statement("$0.reg = <newReg>").unwrap();
        assert_eq!(
            stmt,
            Statement::Assign(attr(Target::Numbered(0), "reg"), Expression::NewRegister)
        );
        let stmt = parse_statement("  E.v = $1.value ").unwrap();
        assert_eq!(
            stmt,
            Statement::Assign(
                attr(Target::Named("E".into()), "v"),
                Expression::AttributeRead(attr(Target::Numbered(1), "value")),
            )
        );
    }

    #[test]
    fn condition() {
        let condition = parse_condition(r#"$2.value = "0""#).unwrap();
        assert_eq!(
            condition,
            LogicalExpression::Equals(
                Expression::AttributeRead(attr(Target::Numbered(2), "value")),
                Expression::Literal("0".into()),
            )
        );
    }

    #[test]
    fn missing_equals_is_a_syntax_error() {
        let err = parse_statement("$0.reg <newReg>").unwrap_err();
        let LangError::Syntax { message, .. } = err else {
            panic!("expected Syntax, got {err:?}");
        };
        assert_eq!(message, "expected `=`, found `<newReg>`");
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = parse_condition(r#"$1.v = "a" "b""#).unwrap_err();
        assert!(matches!(err, LangError::Syntax { .. }));
        let err = parse_statement(r#"$1.v = "a" emit"#).unwrap_err();
        assert!(matches!(err, LangError::Syntax { .. }));
    }

    #[test]
    fn statement_must_start_with_emit_or_attribute() {
        let err = parse_statement(r#""x" = "y""#).unwrap_err();
        let LangError::Syntax { message, .. } = err else {
            panic!("expected Syntax, got {err:?}");
        };
        assert_eq!(message, "expected `emit` or an attribute, found literal \"x\"");
    }

    #[test]
    fn unknown_token_comes_from_the_tokenizer() {
        let err = parse_statement("emit #").unwrap_err();
        assert!(matches!(err, LangError::Grammar(agram::Error::UnknownToken { .. })));
    }
}
