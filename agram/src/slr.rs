// This module defines LR(0) item machinery, FIRST/FOLLOW computations,
// and the guarded action/goto table construction.

use crate::error::{ConflictKind, Error, Result};
use crate::symtab::Symtab;
use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::fmt;

/// Index of the synthetic start production `$START$ -> S`.
pub const START_PROD: usize = 0;

/// A production in the integer encoding used by the table builder.
///
/// Symbol ids below `n_nonterm` are nonterminals; the rest are terminals,
/// with the end-of-input terminal last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prod {
    /// Left-hand side nonterminal id.
    pub lhs: usize,
    /// Right-hand side symbol ids.
    pub rhs: Vec<usize>,
    /// Whether the rule carries a guard condition.
    pub guarded: bool,
}

/// Represents an LR(0) item consisting of a production index and a dot position.
///
/// For example, if production `E → + E C` is partially parsed as
/// `E → + E • C`, the `Item` stores the production index and `dot == 2`.
/// `dot` ranges over `0..=rhs.len()`; `dot == rhs.len()` is reduce-ready.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    /// The index of the production in the grammar.
    pub prod: usize,

    /// The position of the dot within the production's right-hand side.
    pub dot: usize,
}

impl Item {
    /// The symbol right after the dot, or `None` when reduce-ready.
    pub fn observable(&self, prods: &[Prod]) -> Option<usize> {
        prods[self.prod].rhs.get(self.dot).copied()
    }
}

/// A set of LR(0) items, compared by value.
pub type ItemSet = BTreeSet<Item>;

/// The canonical collection of LR(0) item sets.
///
/// Insertion-ordered and deduplicated by value; the index of a set is its
/// parser state, and state `0` is the closure of the start item.
pub type ItemSetSet = IndexSet<ItemSet>;

/// Computes the LR(0) *closure* of a set of items.
///
/// For each item whose dot stands before a nonterminal, adds the zero-position
/// items of every production of that nonterminal, repeating until no new
/// items are added.
///
/// # Parameters
/// - `items`: The initial set of LR(0) items.
/// - `prods`: The grammar productions.
/// - `n_nonterm`: Symbols with ids `< n_nonterm` are nonterminals.
pub fn closure(items: &ItemSet, prods: &[Prod], n_nonterm: usize) -> ItemSet {
    let mut c = items.clone();
    let mut inserted = true;
    while inserted {
        inserted = false;
        // Iterate over a snapshot to avoid borrowing issues
        for item in c.clone() {
            let Some(t) = item.observable(prods) else {
                continue;
            };
            if t < n_nonterm {
                for (j, p) in prods.iter().enumerate() {
                    if p.lhs == t && c.insert(Item { prod: j, dot: 0 }) {
                        inserted = true;
                    }
                }
            }
        }
    }
    c
}

/// Computes the LR(0) *goto* function for a given item set and grammar symbol.
///
/// Advances the dot past `sym` in every item that observes `sym`, then
/// returns the closure of the result. The result is empty when no item
/// observes `sym`.
pub fn goto(items: &ItemSet, sym: usize, prods: &[Prod], n_nonterm: usize) -> ItemSet {
    let moved: ItemSet = items
        .iter()
        .filter(|item| item.observable(prods) == Some(sym))
        .map(|item| Item {
            prod: item.prod,
            dot: item.dot + 1,
        })
        .collect();
    closure(&moved, prods, n_nonterm)
}

/// Constructs the canonical collection of LR(0) item sets.
///
/// Starts from the closure of `$START$ → • S` and applies [`goto`] with every
/// symbol to every discovered set (in discovery order) until no new
/// non-empty set appears.
///
/// # Parameters
/// - `prods`: Grammar productions; production [`START_PROD`] is the start rule.
/// - `n_nonterm`: Number of nonterminal symbols.
/// - `n_sym`: Total number of symbols (nonterminals and terminals).
pub fn construct_set(prods: &[Prod], n_nonterm: usize, n_sym: usize) -> ItemSetSet {
    let mut c = ItemSetSet::new();
    let start0 = ItemSet::from([Item {
        prod: START_PROD,
        dot: 0,
    }]);
    c.insert(closure(&start0, prods, n_nonterm));
    let mut i = 0;
    while i < c.len() {
        for sym in 0..n_sym {
            let nxt = goto(&c[i], sym, prods, n_nonterm);
            if !nxt.is_empty() {
                c.insert(nxt);
            }
        }
        i += 1;
    }
    c
}

/// FIRST sets with the empty-string marker kept as a nullable flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirstSets {
    /// Terminal ids that can begin a derivation of each symbol.
    pub first: Vec<BTreeSet<usize>>,
    /// Whether each symbol derives the empty string.
    pub nullable: Vec<bool>,
}

impl FirstSets {
    /// FIRST(t) = {t} for terminals, empty (and not nullable) for
    /// nonterminals.
    pub fn new(n_nonterm: usize, n_sym: usize) -> Self {
        let first = (0..n_sym)
            .map(|sym| {
                if sym < n_nonterm {
                    BTreeSet::new()
                } else {
                    BTreeSet::from([sym])
                }
            })
            .collect();
        Self {
            first,
            nullable: vec![false; n_sym],
        }
    }

    /// FIRST of a sentence: concatenates FIRST sets left to right and stops
    /// at the first non-nullable symbol. The flag is `true` iff every symbol
    /// is nullable (so the empty sentence is nullable).
    pub fn of_sentence(&self, sentence: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut result = BTreeSet::new();
        for &sym in sentence {
            result.extend(self.first[sym].iter().copied());
            if !self.nullable[sym] {
                return (result, false);
            }
        }
        (result, true)
    }
}

/// One pass of the FIRST fixpoint. Returns whether any set grew.
pub fn extend_first_sets(prods: &[Prod], fst: &mut FirstSets) -> bool {
    let mut changed = false;
    for prod in prods {
        let (first_rhs, nullable) = fst.of_sentence(&prod.rhs);
        for f in first_rhs {
            changed |= fst.first[prod.lhs].insert(f);
        }
        if nullable && !fst.nullable[prod.lhs] {
            fst.nullable[prod.lhs] = true;
            changed = true;
        }
    }
    changed
}

/// Computes FIRST sets and nullability for all grammar symbols.
pub fn first_sets(prods: &[Prod], n_nonterm: usize, n_sym: usize) -> FirstSets {
    let mut fst = FirstSets::new(n_nonterm, n_sym);
    let mut passes = 1;
    while extend_first_sets(prods, &mut fst) {
        passes += 1;
    }
    log::trace!("FIRST sets stable after {} passes", passes);
    fst
}

/// One pass of the FOLLOW fixpoint. Returns whether any set grew.
///
/// For every nonterminal occurrence `B` followed by `β` in a production of
/// `A`: FOLLOW(B) ∪= FIRST(β), and FOLLOW(B) ∪= FOLLOW(A) when `β` is empty
/// or nullable.
pub fn extend_follow_sets(
    prods: &[Prod],
    n_nonterm: usize,
    fst: &FirstSets,
    follow: &mut [BTreeSet<usize>],
) -> bool {
    let mut changed = false;
    for prod in prods {
        for (i, &b) in prod.rhs.iter().enumerate() {
            if b >= n_nonterm {
                continue;
            }
            let (first_beta, beta_nullable) = fst.of_sentence(&prod.rhs[i + 1..]);
            for f in first_beta {
                changed |= follow[b].insert(f);
            }
            if beta_nullable && b != prod.lhs {
                let follow_lhs = follow[prod.lhs].clone();
                for f in follow_lhs {
                    changed |= follow[b].insert(f);
                }
            }
        }
    }
    changed
}

/// Computes FOLLOW sets for all nonterminal symbols.
///
/// # Parameters
/// - `start_sym`: Receives the end-of-input marker `eos`.
pub fn follow_sets(
    prods: &[Prod],
    n_nonterm: usize,
    start_sym: usize,
    eos: usize,
    fst: &FirstSets,
) -> Vec<BTreeSet<usize>> {
    let mut follow = vec![BTreeSet::new(); n_nonterm];
    follow[start_sym].insert(eos);
    let mut passes = 1;
    while extend_follow_sets(prods, n_nonterm, fst, &mut follow) {
        passes += 1;
    }
    log::trace!("FOLLOW sets stable after {} passes", passes);
    follow
}

/// Represents a parser action stored in a table cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Push the terminal and move to the state.
    Shift(usize),
    /// Apply the production.
    Reduce(usize),
    /// The input is a sentence of the grammar.
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "s{}", state),
            Action::Reduce(prod) => write!(f, "r{}", prod),
            Action::Accept => write!(f, "acc"),
        }
    }
}

/// Action and goto tables.
///
/// `actions[state][t - n_nonterm]` lists the actions for terminal `t`;
/// `gotos[state][nt]` is the target state for nonterminal `nt`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tables {
    pub actions: Vec<Vec<Vec<Action>>>,
    pub gotos: Vec<Vec<Option<usize>>>,
}

/// Adds a reduce of `prod` to `cell` following the resolution policy:
/// `Accept` blocks every reduce; guarded reduces accumulate; a single
/// unconditional reduce is kept, replaced in place by any unconditional
/// production at least as long.
fn add_reduce(cell: &mut Vec<Action>, prod: usize, prods: &[Prod]) {
    if cell.contains(&Action::Accept) || cell.contains(&Action::Reduce(prod)) {
        return;
    }
    if prods[prod].guarded {
        cell.push(Action::Reduce(prod));
        return;
    }
    let unconditional = cell
        .iter()
        .position(|a| matches!(a, Action::Reduce(r) if !prods[*r].guarded));
    match unconditional {
        None => cell.push(Action::Reduce(prod)),
        Some(k) => {
            let Action::Reduce(other) = cell[k] else {
                unreachable!()
            };
            if prods[prod].rhs.len() >= prods[other].rhs.len() {
                log::trace!("r{} replaces r{}", prod, other);
                cell[k] = Action::Reduce(prod);
            }
        }
    }
}

/// Constructs the action and goto tables from the canonical collection.
///
/// Items are visited per state in `(prod, dot)` order, so among equally long
/// unconditional productions the one with the higher index ends up in the
/// cell.
///
/// # Errors
/// - [`Error::DuplicateGoto`] if one (state, nonterminal) pair computes two
///   different targets.
/// - [`Error::TableInconsistency`] if a goto target is not in the collection.
pub fn construct_tables(
    c: &ItemSetSet,
    flw: &[BTreeSet<usize>],
    prods: &[Prod],
    syms: &Symtab,
    n_nonterm: usize,
) -> Result<Tables> {
    let n_sym = syms.len();
    let n_term = n_sym - n_nonterm;
    let eos = n_sym - 1;
    let mut tab = Tables {
        actions: vec![vec![Vec::new(); n_term]; c.len()],
        gotos: vec![vec![None; n_nonterm]; c.len()],
    };

    for (state, ssi) in c.iter().enumerate() {
        for item in ssi {
            match item.observable(prods) {
                None if item.prod == START_PROD => {
                    let cell = &mut tab.actions[state][eos - n_nonterm];
                    if !cell.contains(&Action::Accept) {
                        cell.push(Action::Accept);
                    }
                }
                None => {
                    for &t in &flw[prods[item.prod].lhs] {
                        add_reduce(&mut tab.actions[state][t - n_nonterm], item.prod, prods);
                    }
                }
                Some(sym) => {
                    let nxt = goto(ssi, sym, prods, n_nonterm);
                    let Some(ns) = c.get_index_of(&nxt) else {
                        return Err(Error::inconsistency(format!(
                            "goto({}, {}) is not a known state",
                            state,
                            syms.sym(sym).unwrap_or("?")
                        )));
                    };
                    if sym >= n_nonterm {
                        let cell = &mut tab.actions[state][sym - n_nonterm];
                        if !cell.contains(&Action::Shift(ns)) {
                            cell.push(Action::Shift(ns));
                        }
                    } else {
                        match tab.gotos[state][sym] {
                            None => tab.gotos[state][sym] = Some(ns),
                            Some(prev) if prev != ns => {
                                return Err(Error::DuplicateGoto {
                                    state,
                                    nonterminal: syms.sym(sym).unwrap_or("?").to_owned(),
                                    first: prev,
                                    second: ns,
                                });
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
    }
    Ok(tab)
}

/// Checks that every cell is decidable at parse time.
///
/// `Accept` and `Shift` must be alone in their cells, and at most one
/// unconditional reduce may remain; guarded reduces may stack.
pub fn validate_tables(
    tab: &Tables,
    prods: &[Prod],
    syms: &Symtab,
    n_nonterm: usize,
) -> Result<()> {
    for (state, row) in tab.actions.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if cell.len() < 2 {
                continue;
            }
            let unconditional = cell
                .iter()
                .filter(|a| matches!(a, Action::Reduce(r) if !prods[*r].guarded))
                .count();
            let kind = if cell.contains(&Action::Accept) {
                ConflictKind::Accept
            } else if cell.iter().any(|a| matches!(a, Action::Shift(_))) {
                ConflictKind::ShiftReduce
            } else if unconditional > 1 {
                ConflictKind::ReduceReduce
            } else {
                continue;
            };
            let actions: Vec<String> = cell.iter().map(|a| a.to_string()).collect();
            return Err(Error::TableConflict {
                state,
                terminal: syms.sym(n_nonterm + col).unwrap_or("?").to_owned(),
                kind,
                actions: actions.join(", "),
            });
        }
    }
    Ok(())
}
