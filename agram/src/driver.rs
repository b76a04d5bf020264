use crate::context::ReduceContext;
use crate::error::{Error, Failure, Result};
use crate::grammar::{Grammar, START};
use crate::language::{Attributes, Rule, Terminal};
use crate::slr::Action;
use smartstring::alias::String;
use std::io::Write;

/// One parse stack slot: the state entered after pushing `symbol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub state: usize,
    pub symbol: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Terminals pulled from the source.
    pub terminals: usize,
    pub shifts: usize,
    pub reductions: usize,
    /// Guard conditions evaluated while choosing reduces.
    pub guards: usize,
}

/// Per-parse mutable state.
#[derive(Debug)]
pub(crate) struct Session {
    pub stack: Vec<StackEntry>,
    pub registers: usize,
    pub stats: ParseStats,
}

impl Session {
    pub fn new() -> Self {
        Self {
            stack: vec![StackEntry {
                state: 0,
                symbol: String::from(START),
                attributes: Attributes::new(),
            }],
            registers: 0,
            stats: ParseStats::default(),
        }
    }

    fn top_state(&self) -> usize {
        self.stack.last().map_or(0, |entry| entry.state)
    }

    fn pull<I>(&mut self, terminals: &mut I) -> Result<Terminal>
    where
        I: Iterator<Item = Result<Terminal>>,
    {
        match terminals.next() {
            Some(terminal) => {
                self.stats.terminals += 1;
                terminal
            }
            None => Err(Error::ParseFailed(Failure::EndOfInput)),
        }
    }

    /// Binds the topmost `rule.production.len()` entries for a reduction.
    fn context(&mut self, rule: &Rule) -> Result<ReduceContext<'_>> {
        let n = rule.production.len();
        // The sentinel is never reduced.
        if self.stack.len() <= n {
            return Err(Error::inconsistency(format!(
                "stack too shallow to reduce {}",
                rule
            )));
        }
        let base = self.stack.len() - n;
        ReduceContext::bind(rule, &mut self.stack[base..], &mut self.registers)
    }

    fn dump_state(&self, incoming: &Terminal) {
        let mut output = std::string::String::new();
        for entry in &self.stack {
            output.push_str(&format!("<{}> {}  ", entry.state, entry.symbol));
        }
        output.push_str(&format!("<-  {}", incoming.name));
        log::trace!("{}", output);
    }
}

impl Grammar {
    /// Runs the shift-reduce automaton over `terminals`, executing rule
    /// actions and writing emitted lines to `out`.
    ///
    /// A terminal is pulled once at the start and once after every shift;
    /// reductions never consume input. The source must produce `$` after
    /// the last real terminal.
    ///
    /// Among the reduce actions of a cell, longer productions are tried
    /// first and ties go to the rule declared first. An unconditional rule
    /// is taken at once; a guarded rule is taken when its condition holds.
    ///
    /// # Errors
    /// - [`Error::ParseFailed`] when the input is not a sentence of the
    ///   grammar, ends before `$`, or no guard holds.
    /// - [`Error::UnknownTerminal`] for a name outside the terminal set.
    /// - [`Error::MissingAttribute`] and [`Error::UnboundTarget`] from
    ///   actions and guards.
    /// - Errors produced by the terminal source, unchanged.
    pub fn parse<I, W>(&self, terminals: I, mut out: W) -> Result<ParseStats>
    where
        I: IntoIterator<Item = Result<Terminal>>,
        W: Write,
    {
        let mut terminals = terminals.into_iter();
        let mut session = Session::new();
        let mut terminal = session.pull(&mut terminals)?;

        loop {
            if log::log_enabled!(log::Level::Trace) {
                session.dump_state(&terminal);
            }

            let state = session.top_state();
            let Some(t) = self.terminal_id(&terminal.name) else {
                return Err(Error::UnknownTerminal {
                    name: terminal.name.to_string(),
                    index: session.stats.terminals - 1,
                });
            };
            let cell = self.cell(state, t);

            match cell {
                [] => {
                    return Err(Error::ParseFailed(Failure::NoAction {
                        state,
                        terminal: terminal.name.to_string(),
                    }));
                }
                [Action::Accept] => {
                    log::trace!("Accept");
                    if session.stack.len() != 2 {
                        return Err(Error::inconsistency(format!(
                            "accept with {} stack entries",
                            session.stack.len()
                        )));
                    }
                    return Ok(session.stats);
                }
                [Action::Shift(next)] => {
                    log::trace!("Shift {}", next);
                    session.stack.push(StackEntry {
                        state: *next,
                        symbol: terminal.name,
                        attributes: terminal.attributes,
                    });
                    session.stats.shifts += 1;
                    terminal = session.pull(&mut terminals)?;
                }
                _ => {
                    let prod = self.select_reduce(&mut session, cell, state, &terminal)?;
                    self.reduce(&mut session, prod, &mut out)?;
                }
            }
        }
    }

    fn select_reduce(
        &self,
        session: &mut Session,
        cell: &[Action],
        state: usize,
        terminal: &Terminal,
    ) -> Result<usize> {
        let mut candidates = Vec::with_capacity(cell.len());
        for action in cell {
            match action {
                Action::Reduce(prod) => candidates.push(*prod),
                Action::Shift(_) | Action::Accept => {
                    return Err(Error::inconsistency(format!(
                        "unresolved cell in state {} on {:?}",
                        state,
                        terminal.name.as_str()
                    )));
                }
            }
        }
        candidates.sort_by_key(|&prod| (std::cmp::Reverse(self.prods[prod].rhs.len()), prod));

        for prod in candidates {
            let rule = &self.rules[prod];
            let Some(condition) = &rule.condition else {
                return Ok(prod);
            };
            session.stats.guards += 1;
            let holds = session.context(rule)?.test(condition)?;
            log::trace!("Guard r{} [{}]: {}", prod, condition, holds);
            if holds {
                return Ok(prod);
            }
        }

        Err(Error::ParseFailed(Failure::NoSatisfiedReduce {
            state,
            terminal: terminal.name.to_string(),
        }))
    }

    fn reduce<W: Write>(&self, session: &mut Session, prod: usize, out: &mut W) -> Result<()> {
        let rule = &self.rules[prod];
        log::trace!("Reduce r{}: {}", prod, rule);

        let mut ctx = session.context(rule)?;
        if let Some(action) = &rule.action {
            ctx.execute(action, out)?;
        }
        let attributes = ctx.into_lhs();

        let n = rule.production.len();
        session.stack.truncate(session.stack.len() - n);
        let top = session.top_state();
        let lhs = self.prods[prod].lhs;
        let Some(next) = self.tables.gotos[top][lhs] else {
            return Err(Error::inconsistency(format!(
                "no goto from state {} on {}",
                top, rule.nonterminal.name
            )));
        };
        log::trace!("Goto {}", next);
        session.stack.push(StackEntry {
            state: next,
            symbol: rule.nonterminal.name.clone(),
            attributes,
        });
        session.stats.reductions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{
        AttributeIdentifier, Expression, LogicalExpression, Statement, Symbol, Target,
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn read(target: Target, attribute: &str) -> Expression {
        Expression::AttributeRead(AttributeIdentifier::new(target, attribute))
    }

    fn assign(target: Target, attribute: &str, value: Expression) -> Statement {
        Statement::Assign(AttributeIdentifier::new(target, attribute), value)
    }

    fn stream(terminals: Vec<Terminal>) -> impl Iterator<Item = Result<Terminal>> {
        terminals.into_iter().map(Ok)
    }

    fn run(grammar: &Grammar, terminals: Vec<Terminal>) -> Result<(ParseStats, std::string::String)> {
        let mut out = Vec::new();
        let stats = grammar.parse(stream(terminals), &mut out)?;
        Ok((stats, std::string::String::from_utf8(out).unwrap()))
    }

    fn n(value: &str) -> Terminal {
        Terminal::new("n").with("value", value)
    }

    fn end() -> Terminal {
        Terminal::new("$")
    }

    // S -> E$1 + E$2 {emit $1.v $2.v}
    // E -> n$1 {E.v = $1.value}
    fn sum_grammar() -> Grammar {
        Grammar::try_new(vec![
            Rule::new(
                Symbol::new("S"),
                vec![Symbol::indexed("E", 1), Symbol::new("+"), Symbol::indexed("E", 2)],
            )
            .with_action(vec![Statement::Emit(vec![
                read(Target::Numbered(1), "v"),
                read(Target::Numbered(2), "v"),
            ])]),
            Rule::new(Symbol::new("E"), vec![Symbol::indexed("n", 1)]).with_action(vec![assign(
                Target::Named("E".into()),
                "v",
                read(Target::Numbered(1), "value"),
            )]),
        ])
        .unwrap()
    }

    #[test]
    fn sum_emits_operands_in_order() {
        init_logger();
        let g = sum_grammar();
        let (stats, out) = run(&g, vec![n("3"), Terminal::new("+"), n("4"), end()]).unwrap();
        assert_eq!(out, "34\n");
        assert_eq!(
            stats,
            ParseStats {
                terminals: 4,
                shifts: 3,
                reductions: 3,
                guards: 0,
            }
        );
    }

    #[test]
    fn missing_end_marker_is_end_of_input() {
        init_logger();
        let g = sum_grammar();
        let err = run(&g, vec![n("3"), Terminal::new("+"), n("4")]).unwrap_err();
        assert!(matches!(err, Error::ParseFailed(Failure::EndOfInput)));
        let err = run(&g, vec![]).unwrap_err();
        assert!(matches!(err, Error::ParseFailed(Failure::EndOfInput)));
    }

    #[test]
    fn unexpected_terminal_has_no_action() {
        let g = sum_grammar();
        let err = run(&g, vec![n("3"), n("4"), end()]).unwrap_err();
        let Error::ParseFailed(Failure::NoAction { terminal, .. }) = err else {
            panic!("expected NoAction, got {err:?}");
        };
        assert_eq!(terminal, "n");
    }

    #[test]
    fn unknown_terminal_is_reported() {
        let g = sum_grammar();
        let err = run(&g, vec![n("3"), Terminal::new("*"), n("4"), end()]).unwrap_err();
        assert!(matches!(err, Error::UnknownTerminal { name, index: 1 } if name == "*"));
    }

    #[test]
    fn source_errors_propagate() {
        let g = sum_grammar();
        let terminals = vec![Ok(n("3")), Err(Error::Io(std::io::Error::other("closed")))];
        let err = g.parse(terminals, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let g = sum_grammar();
        let err = run(&g, vec![Terminal::new("n"), Terminal::new("+"), n("4"), end()])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute { target: Target::Numbered(1), ref attribute } if attribute == "value"
        ));
    }

    fn zero_guard() -> LogicalExpression {
        LogicalExpression::Equals(
            read(Target::Numbered(1), "value"),
            Expression::Literal("0".into()),
        )
    }

    #[test]
    fn lone_false_guard_fails() {
        init_logger();
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::indexed("C", 1)]).with_condition(zero_guard()),
        ])
        .unwrap();
        let (stats, _) = run(&g, vec![Terminal::new("C").with("value", "0"), end()]).unwrap();
        assert_eq!(stats.guards, 1);
        let err = run(&g, vec![Terminal::new("C").with("value", "5"), end()]).unwrap_err();
        assert!(matches!(
            err,
            Error::ParseFailed(Failure::NoSatisfiedReduce { .. })
        ));
    }

    #[test]
    fn guard_selects_between_rules() {
        init_logger();
        // S -> E ; E -> C$1 [$1.value = "0"] {emit "zero"} ; E -> C$1 {emit "c" $1.value}
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::new("E")]),
            Rule::new(Symbol::new("E"), vec![Symbol::indexed("C", 1)])
                .with_condition(zero_guard())
                .with_action(vec![Statement::Emit(vec![Expression::Literal("zero".into())])]),
            Rule::new(Symbol::new("E"), vec![Symbol::indexed("C", 1)]).with_action(vec![
                Statement::Emit(vec![
                    Expression::Literal("c".into()),
                    read(Target::Numbered(1), "value"),
                ]),
            ]),
        ])
        .unwrap();
        let (stats, out) = run(&g, vec![Terminal::new("C").with("value", "0"), end()]).unwrap();
        assert_eq!(out, "zero\n");
        assert_eq!(stats.guards, 1);
        let (_, out) = run(&g, vec![Terminal::new("C").with("value", "9"), end()]).unwrap();
        assert_eq!(out, "c9\n");
    }

    #[test]
    fn left_recursion_reduces_eagerly() {
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::new("L")]),
            Rule::new(Symbol::new("L"), vec![Symbol::new("L"), Symbol::new("x")])
                .with_action(vec![Statement::Emit(vec![Expression::Literal("pair".into())])]),
            Rule::new(Symbol::new("L"), vec![Symbol::new("x")])
                .with_action(vec![Statement::Emit(vec![Expression::Literal("one".into())])]),
        ])
        .unwrap();
        let x = || Terminal::new("x");
        let (_, out) = run(&g, vec![x(), x(), x(), end()]).unwrap();
        assert_eq!(out, "one\npair\npair\n");
    }

    #[test]
    fn longer_guarded_reduce_is_tried_first() {
        init_logger();
        // After `a b` both `B -> b .` and `S -> a b$2 .` are reduce-ready on `$`.
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::new("a"), Symbol::new("B")]),
            Rule::new(Symbol::new("B"), vec![Symbol::new("b")])
                .with_action(vec![Statement::Emit(vec![Expression::Literal("short".into())])]),
            Rule::new(Symbol::new("S"), vec![Symbol::new("a"), Symbol::indexed("b", 2)])
                .with_condition(LogicalExpression::Equals(
                    read(Target::Numbered(2), "value"),
                    Expression::Literal("1".into()),
                ))
                .with_action(vec![Statement::Emit(vec![Expression::Literal("long".into())])]),
        ])
        .unwrap();
        let b = |value: &str| Terminal::new("b").with("value", value);
        let (stats, out) = run(&g, vec![Terminal::new("a"), b("1"), end()]).unwrap();
        assert_eq!(out, "long\n");
        assert_eq!(stats.reductions, 1);
        let (stats, out) = run(&g, vec![Terminal::new("a"), b("2"), end()]).unwrap();
        assert_eq!(out, "short\n");
        assert_eq!(stats.reductions, 2);
        assert_eq!(stats.guards, 1);
    }

    #[test]
    fn registers_increase_across_reductions() {
        init_logger();
        // S -> S R | R ; R -> r {$0.reg = <newReg> ; emit $0.reg}
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::new("S"), Symbol::new("R")]),
            Rule::new(Symbol::new("S"), vec![Symbol::new("R")]),
            Rule::new(Symbol::indexed("R", 0), vec![Symbol::new("r")]).with_action(vec![
                assign(Target::Numbered(0), "reg", Expression::NewRegister),
                Statement::Emit(vec![read(Target::Named("R".into()), "reg")]),
            ]),
        ])
        .unwrap();
        let r = || Terminal::new("r");
        let (_, out) = run(&g, vec![r(), r(), r(), end()]).unwrap();
        assert_eq!(out, "0\n1\n2\n");
    }

    #[test]
    fn lhs_attributes_reach_the_parent() {
        // S -> E$1 {emit "got " $1.reg} ; E$0 -> n$1 {$0.reg = $1.value}
        let g = Grammar::try_new(vec![
            Rule::new(Symbol::new("S"), vec![Symbol::indexed("E", 1)]).with_action(vec![
                Statement::Emit(vec![
                    Expression::Literal("got ".into()),
                    read(Target::Numbered(1), "reg"),
                ]),
            ]),
            Rule::new(Symbol::indexed("E", 0), vec![Symbol::indexed("n", 1)]).with_action(vec![
                assign(Target::Numbered(0), "reg", read(Target::Numbered(1), "value")),
            ]),
        ])
        .unwrap();
        let (_, out) = run(&g, vec![n("12"), end()]).unwrap();
        assert_eq!(out, "got 12\n");
    }

    #[test]
    fn grammar_is_reusable_across_parses() {
        let g = sum_grammar();
        for (a, b) in [("1", "2"), ("5", "6")] {
            let (_, out) = run(&g, vec![n(a), Terminal::new("+"), n(b), end()]).unwrap();
            assert_eq!(out, format!("{}{}\n", a, b));
        }
    }
}
