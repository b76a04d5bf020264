use crate::error::{Error, Result};
use crate::language::{Rule, Symbol};
use crate::slr::{self, Action, FirstSets, ItemSetSet, Prod, START_PROD, Tables};
use crate::symtab::Symtab;
use std::collections::BTreeSet;

/// Name of the synthetic start nonterminal.
pub const START: &str = "$START$";

/// Name of the end-of-input terminal.
pub const END: &str = "$";

/// Rendering of the empty string in [`Grammar::first`].
pub const EMPTY: &str = "";

/// A built grammar: rules, symbol classification, FIRST/FOLLOW sets, the
/// canonical LR(0) collection and the validated action/goto tables.
///
/// Immutable once constructed; parses borrow it and keep their own state,
/// so one `Grammar` can serve any number of parses.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) rules: Vec<Rule>,
    pub(crate) prods: Vec<Prod>,
    pub(crate) syms: Symtab,
    pub(crate) n_nonterm: usize,
    pub(crate) fst: FirstSets,
    pub(crate) flw: Vec<BTreeSet<usize>>,
    pub(crate) states: ItemSetSet,
    pub(crate) tables: Tables,
}

impl Grammar {
    /// Builds the grammar from user rules (start rule excluded).
    ///
    /// The first rule's nonterminal becomes the start symbol. Nonterminals
    /// are `$START$` followed by left-hand side names in first-seen order;
    /// every other production name is a terminal, and `$` is the last
    /// terminal.
    ///
    /// # Errors
    /// [`Error::EmptyGrammar`], [`Error::ReservedSymbol`], and the table
    /// construction errors [`Error::DuplicateGoto`],
    /// [`Error::TableConflict`] and [`Error::TableInconsistency`].
    pub fn try_new(user_rules: Vec<Rule>) -> Result<Self> {
        let Some(first) = user_rules.first() else {
            return Err(Error::EmptyGrammar);
        };
        for rule in &user_rules {
            for sym in std::iter::once(&rule.nonterminal).chain(&rule.production) {
                if sym.name.as_str() == START || sym.name.as_str() == END {
                    return Err(Error::ReservedSymbol {
                        name: sym.name.to_string(),
                    });
                }
            }
        }

        let mut rules = Vec::with_capacity(user_rules.len() + 1);
        rules.push(Rule::new(
            Symbol::new(START),
            vec![Symbol::new(first.nonterminal.name.clone())],
        ));
        rules.extend(user_rules);

        let mut syms = Symtab::new();
        for rule in &rules {
            syms.add(&rule.nonterminal.name);
        }
        let n_nonterm = syms.len();
        for rule in &rules {
            for sym in &rule.production {
                syms.add(&sym.name);
            }
        }
        let eos = syms.add(END);
        let n_sym = syms.len();

        let prods: Vec<Prod> = rules
            .iter()
            .map(|rule| {
                let lookup = |sym: &Symbol| {
                    syms.idx(&sym.name)
                        .ok_or_else(|| Error::inconsistency(format!("symbol {} not interned", sym)))
                };
                Ok(Prod {
                    lhs: lookup(&rule.nonterminal)?,
                    rhs: rule.production.iter().map(lookup).collect::<Result<_>>()?,
                    guarded: rule.is_guarded(),
                })
            })
            .collect::<Result<_>>()?;

        let fst = slr::first_sets(&prods, n_nonterm, n_sym);
        let flw = slr::follow_sets(&prods, n_nonterm, prods[START_PROD].lhs, eos, &fst);
        let states = slr::construct_set(&prods, n_nonterm, n_sym);
        let tables = slr::construct_tables(&states, &flw, &prods, &syms, n_nonterm)?;
        slr::validate_tables(&tables, &prods, &syms, n_nonterm)?;

        log::debug!(
            "grammar built: {} rules, {} terminals, {} nonterminals, {} states",
            rules.len(),
            n_sym - n_nonterm,
            n_nonterm,
            states.len()
        );

        Ok(Self {
            rules,
            prods,
            syms,
            n_nonterm,
            fst,
            flw,
            states,
            tables,
        })
    }

    /// All rules; index `0` is the synthetic start rule.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Terminal names in id order, `$` last.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.syms.iter().skip(self.n_nonterm)
    }

    /// Nonterminal names in id order, `$START$` first.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.syms.iter().take(self.n_nonterm)
    }

    /// FIRST set of a symbol, terminals in id order followed by
    /// [`EMPTY`] when the symbol is nullable.
    pub fn first(&self, name: &str) -> Option<Vec<&str>> {
        let sym = self.syms.idx(name)?;
        let mut set: Vec<&str> = self.names(&self.fst.first[sym]);
        if self.fst.nullable[sym] {
            set.push(EMPTY);
        }
        Some(set)
    }

    /// FOLLOW set of a nonterminal.
    pub fn follow(&self, name: &str) -> Option<Vec<&str>> {
        let sym = self.nonterminal_id(name)?;
        Some(self.names(&self.flw[sym]))
    }

    /// The canonical collection; a set's index is its state number.
    pub fn states(&self) -> &ItemSetSet {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Actions for `(state, terminal)`; empty when either is unknown.
    pub fn actions(&self, state: usize, terminal: &str) -> &[Action] {
        match self.terminal_id(terminal) {
            Some(t) => self.cell(state, t),
            None => &[],
        }
    }

    pub fn goto_state(&self, state: usize, nonterminal: &str) -> Option<usize> {
        let nt = self.nonterminal_id(nonterminal)?;
        self.tables.gotos.get(state)?[nt]
    }

    pub fn symbol_name(&self, id: usize) -> Option<&str> {
        self.syms.sym(id)
    }

    pub(crate) fn terminal_id(&self, name: &str) -> Option<usize> {
        self.syms.idx(name).filter(|&id| id >= self.n_nonterm)
    }

    pub(crate) fn nonterminal_id(&self, name: &str) -> Option<usize> {
        self.syms.idx(name).filter(|&id| id < self.n_nonterm)
    }

    pub(crate) fn cell(&self, state: usize, terminal: usize) -> &[Action] {
        self.tables
            .actions
            .get(state)
            .and_then(|row| row.get(terminal - self.n_nonterm))
            .map(|cell| cell.as_slice())
            .unwrap_or_default()
    }

    fn names(&self, set: &BTreeSet<usize>) -> Vec<&str> {
        set.iter().filter_map(|&id| self.syms.sym(id)).collect()
    }
}
