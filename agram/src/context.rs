//! Attribute context of one reduction.
//!
//! A [`ReduceContext`] binds every [`Target`] a rule can address to an
//! attribute map: the fresh map of the left-hand side, or the map of one of
//! the stack entries being reduced. An indexed symbol is reachable under
//! both its name and its index; both keys resolve to the same map.

use crate::driver::StackEntry;
use crate::error::{Error, Result};
use crate::language::{
    Attributes, Expression, LogicalExpression, Rule, RuleAction, Statement, Symbol, Target,
};
use smartstring::alias::String;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Lhs,
    /// Position in the production (and in the reduced stack slice).
    Stack(usize),
}

#[derive(Debug)]
pub struct ReduceContext<'s> {
    lhs: Attributes,
    entries: &'s mut [StackEntry],
    registers: &'s mut usize,
    bindings: HashMap<Target, Binding>,
}

impl<'s> ReduceContext<'s> {
    /// Binds `rule` to `entries`, the topmost stack entries in production
    /// order.
    ///
    /// Keys are registered for the left-hand side first, then for the
    /// production left to right; a key already taken keeps its first
    /// binding.
    pub fn bind(
        rule: &Rule,
        entries: &'s mut [StackEntry],
        registers: &'s mut usize,
    ) -> Result<Self> {
        if entries.len() != rule.production.len() {
            return Err(Error::inconsistency(format!(
                "reducing {} needs {} stack entries, found {}",
                rule,
                rule.production.len(),
                entries.len()
            )));
        }
        let mut bindings = HashMap::new();
        register(&mut bindings, &rule.nonterminal, Binding::Lhs);
        for (k, (sym, entry)) in rule.production.iter().zip(entries.iter()).enumerate() {
            if sym.name != entry.symbol {
                return Err(Error::inconsistency(format!(
                    "stack holds {:?} where {} expects {:?}",
                    entry.symbol.as_str(),
                    rule,
                    sym.name.as_str()
                )));
            }
            register(&mut bindings, sym, Binding::Stack(k));
        }
        Ok(Self {
            lhs: Attributes::new(),
            entries,
            registers,
            bindings,
        })
    }

    fn binding(&self, target: &Target) -> Result<Binding> {
        self.bindings
            .get(target)
            .copied()
            .ok_or_else(|| Error::UnboundTarget {
                target: target.clone(),
            })
    }

    fn attributes(&self, target: &Target) -> Result<&Attributes> {
        Ok(match self.binding(target)? {
            Binding::Lhs => &self.lhs,
            Binding::Stack(k) => &self.entries[k].attributes,
        })
    }

    fn attributes_mut(&mut self, target: &Target) -> Result<&mut Attributes> {
        Ok(match self.binding(target)? {
            Binding::Lhs => &mut self.lhs,
            Binding::Stack(k) => &mut self.entries[k].attributes,
        })
    }

    pub fn evaluate(&mut self, expr: &Expression) -> Result<String> {
        match expr {
            Expression::NewRegister => {
                let reg = *self.registers;
                *self.registers += 1;
                Ok(String::from(reg.to_string().as_str()))
            }
            Expression::Literal(value) => Ok(value.clone()),
            Expression::AttributeRead(id) => self
                .attributes(&id.target)?
                .get(&id.attribute)
                .cloned()
                .ok_or_else(|| Error::MissingAttribute {
                    target: id.target.clone(),
                    attribute: id.attribute.to_string(),
                }),
        }
    }

    pub fn test(&mut self, condition: &LogicalExpression) -> Result<bool> {
        match condition {
            LogicalExpression::Equals(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(left == right)
            }
        }
    }

    /// Runs the statements in order, writing one line per `emit`.
    pub fn execute<W: Write>(&mut self, action: &RuleAction, out: &mut W) -> Result<()> {
        for stmt in action.statements() {
            match stmt {
                Statement::Emit(parts) => {
                    let mut line = String::new();
                    for part in parts {
                        line.push_str(&self.evaluate(part)?);
                    }
                    log::debug!("EMIT: {}", line);
                    writeln!(out, "{}", line)?;
                }
                Statement::Assign(dest, value) => {
                    let value = self.evaluate(value)?;
                    self.attributes_mut(&dest.target)?
                        .insert(dest.attribute.clone(), value);
                }
            }
        }
        Ok(())
    }

    /// The left-hand side map, to be pushed with the reduced nonterminal.
    pub fn into_lhs(self) -> Attributes {
        self.lhs
    }
}

fn register(bindings: &mut HashMap<Target, Binding>, sym: &Symbol, binding: Binding) {
    bindings
        .entry(Target::Named(sym.name.clone()))
        .or_insert(binding);
    if let Some(index) = sym.index {
        bindings.entry(Target::Numbered(index)).or_insert(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::AttributeIdentifier;

    fn entry(symbol: &str, attrs: &[(&str, &str)]) -> StackEntry {
        StackEntry {
            state: 0,
            symbol: symbol.into(),
            attributes: attrs.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect(),
        }
    }

    fn read(target: Target, attribute: &str) -> Expression {
        Expression::AttributeRead(AttributeIdentifier::new(target, attribute))
    }

    fn sum_rule() -> Rule {
        Rule::new(
            Symbol::indexed("E", 0),
            vec![Symbol::indexed("E", 1), Symbol::new("+"), Symbol::indexed("E", 2)],
        )
    }

    #[test]
    fn numbered_and_named_targets() {
        let rule = sum_rule();
        let mut entries = vec![
            entry("E", &[("v", "1")]),
            entry("+", &[]),
            entry("E", &[("v", "2")]),
        ];
        let mut registers = 0;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        assert_eq!(ctx.evaluate(&read(Target::Numbered(1), "v")).unwrap().as_str(), "1");
        assert_eq!(ctx.evaluate(&read(Target::Numbered(2), "v")).unwrap().as_str(), "2");
        // The name `E` belongs to the left-hand side, registered first.
        let err = ctx.evaluate(&read(Target::Named("E".into()), "v")).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn lhs_aliases_share_storage() {
        let rule = Rule::new(Symbol::indexed("E", 0), vec![Symbol::indexed("n", 1)]);
        let mut entries = vec![entry("n", &[("value", "7")])];
        let mut registers = 0;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        let action = RuleAction(vec![Statement::Assign(
            AttributeIdentifier::new(Target::Numbered(0), "reg"),
            read(Target::Numbered(1), "value"),
        )]);
        let mut out = Vec::new();
        ctx.execute(&action, &mut out).unwrap();
        assert_eq!(ctx.evaluate(&read(Target::Named("E".into()), "reg")).unwrap().as_str(), "7");
        let lhs = ctx.into_lhs();
        assert_eq!(lhs.get("reg").map(|v| v.as_str()), Some("7"));
        assert!(out.is_empty());
    }

    #[test]
    fn registers_count_up() {
        let rule = Rule::new(Symbol::new("S"), vec![]);
        let mut entries = vec![];
        let mut registers = 0;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        for n in 0..3 {
            assert_eq!(ctx.evaluate(&Expression::NewRegister).unwrap().as_str(), n.to_string());
        }
        drop(ctx);
        assert_eq!(registers, 3);
    }

    #[test]
    fn emit_concatenates_parts() {
        let rule = Rule::new(Symbol::new("S"), vec![Symbol::indexed("n", 1)]);
        let mut entries = vec![entry("n", &[("value", "4")])];
        let mut registers = 5;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        let action = RuleAction(vec![Statement::Emit(vec![
            Expression::Literal("li r".into()),
            Expression::NewRegister,
            Expression::Literal(", ".into()),
            read(Target::Named("n".into()), "value"),
        ])]);
        let mut out = Vec::new();
        ctx.execute(&action, &mut out).unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "li r5, 4\n");
    }

    #[test]
    fn condition_compares_values() {
        let rule = Rule::new(Symbol::new("E"), vec![Symbol::indexed("C", 1)]);
        let mut entries = vec![entry("C", &[("value", "0")])];
        let mut registers = 0;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        let zero = LogicalExpression::Equals(
            read(Target::Numbered(1), "value"),
            Expression::Literal("0".into()),
        );
        let one = LogicalExpression::Equals(
            read(Target::Numbered(1), "value"),
            Expression::Literal("1".into()),
        );
        assert!(ctx.test(&zero).unwrap());
        assert!(!ctx.test(&one).unwrap());
    }

    #[test]
    fn unbound_target_is_reported() {
        let rule = Rule::new(Symbol::new("E"), vec![Symbol::new("C")]);
        let mut entries = vec![entry("C", &[])];
        let mut registers = 0;
        let mut ctx = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap();
        let err = ctx.evaluate(&read(Target::Numbered(3), "value")).unwrap_err();
        assert!(matches!(err, Error::UnboundTarget { target: Target::Numbered(3) }));
    }

    #[test]
    fn mismatched_stack_is_an_inconsistency() {
        let rule = Rule::new(Symbol::new("E"), vec![Symbol::new("C")]);
        let mut entries = vec![entry("M", &[])];
        let mut registers = 0;
        let err = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap_err();
        assert!(matches!(err, Error::TableInconsistency(_)));

        let mut entries = vec![];
        let err = ReduceContext::bind(&rule, &mut entries, &mut registers).unwrap_err();
        assert!(matches!(err, Error::TableInconsistency(_)));
    }
}
