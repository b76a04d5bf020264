//! Grammar rules and the semantic-action language they carry.
//!
//! A [`Rule`] is a production `nonterminal -> production` with an optional
//! guard ([`LogicalExpression`]) and an optional [`RuleAction`]. Actions are
//! evaluated by the driver against the attribute maps of the symbols being
//! reduced; [`Target`] names which map, [`AttributeIdentifier`] names one
//! slot in it.

use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt;

/// Attribute map of one symbol occurrence on the parse stack.
pub type Attributes = IndexMap<String, String>;

/// A grammar symbol, optionally indexed (`x$1`) so a rule can address two
/// occurrences of the same name separately.
///
/// The grammar classifies symbols by `name` only; `index` matters for
/// attribute addressing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub name: String,
    pub index: Option<u32>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}${}", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Which attribute map an action refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// By symbol name (`E.v`).
    Named(String),
    /// By symbol index (`$1.v`).
    Numbered(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Named(name) => write!(f, "{}", name),
            Target::Numbered(index) => write!(f, "${}", index),
        }
    }
}

/// One attribute slot: `target.attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeIdentifier {
    pub target: Target,
    pub attribute: String,
}

impl AttributeIdentifier {
    pub fn new(target: Target, attribute: impl Into<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttributeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Allocates the next register number of the running parse.
    NewRegister,
    Literal(String),
    AttributeRead(AttributeIdentifier),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::NewRegister => write!(f, "<newReg>"),
            Expression::Literal(value) => write!(f, "{:?}", value.as_str()),
            Expression::AttributeRead(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Writes the concatenation of the parts as one output line.
    Emit(Vec<Expression>),
    Assign(AttributeIdentifier, Expression),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Emit(parts) => {
                write!(f, "emit")?;
                for part in parts {
                    write!(f, " {}", part)?;
                }
                Ok(())
            }
            Statement::Assign(dest, value) => write!(f, "{} = {}", dest, value),
        }
    }
}

/// A guard condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalExpression {
    Equals(Expression, Expression),
}

impl fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalExpression::Equals(left, right) => write!(f, "{} = {}", left, right),
        }
    }
}

/// Statements executed, in order, when a rule is reduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAction(pub Vec<Statement>);

impl RuleAction {
    pub fn statements(&self) -> &[Statement] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub nonterminal: Symbol,
    pub production: Vec<Symbol>,
    pub condition: Option<LogicalExpression>,
    pub action: Option<RuleAction>,
}

impl Rule {
    /// Creates an unguarded rule without an action.
    pub fn new(nonterminal: Symbol, production: Vec<Symbol>) -> Self {
        Self {
            nonterminal,
            production,
            condition: None,
            action: None,
        }
    }

    pub fn with_condition(mut self, condition: LogicalExpression) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_action(mut self, statements: Vec<Statement>) -> Self {
        self.action = Some(RuleAction(statements));
        self
    }

    pub fn is_guarded(&self) -> bool {
        self.condition.is_some()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.nonterminal)?;
        for sym in &self.production {
            write!(f, " {}", sym)?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " [{}]", condition)?;
        }
        if let Some(action) = &self.action {
            write!(f, " {{")?;
            for (i, stmt) in action.statements().iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{}", stmt)?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

/// A terminal as delivered to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub name: String,
    pub attributes: Attributes,
}

impl Terminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Adds one attribute (builder style).
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }
}
