//! Text renderings of a built [`Grammar`], for inspecting tables and
//! debugging conflicts. None of this affects parsing.

use crate::grammar::Grammar;
use crate::slr::Action;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Writes the rules, one per line: `R,<i>,<lhs> -> <rhs>`, followed by
/// `[?]` for a guarded rule and `{!}` for a rule with an action.
pub fn write_rules<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    writeln!(out, "RS,{}\n", grammar.rules.len())?;
    for (i, rule) in grammar.rules.iter().enumerate() {
        write!(out, "R,{},{} ->", i, rule.nonterminal)?;
        for sym in &rule.production {
            write!(out, " {}", sym)?;
        }
        if rule.condition.is_some() {
            write!(out, " [?]")?;
        }
        if rule.action.is_some() {
            write!(out, " {{!}}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes FIRST sets of every symbol, then FOLLOW sets of every
/// nonterminal. Nullable symbols list `` `empty' `` first.
pub fn write_first_follow<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    for (sym, set) in grammar.fst.first.iter().enumerate() {
        write_set(out, grammar, "FIRST", sym, set, grammar.fst.nullable[sym])?;
    }
    writeln!(out)?;
    for (sym, set) in grammar.flw.iter().enumerate() {
        write_set(out, grammar, "FOLLOW", sym, set, false)?;
    }
    Ok(())
}

fn write_set<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    label: &str,
    sym: usize,
    set: &BTreeSet<usize>,
    nullable: bool,
) -> io::Result<()> {
    write!(out, "{},{},{{", label, name(grammar, sym))?;
    if nullable {
        write!(out, "`empty', ")?;
    }
    for &t in set {
        write!(out, "{}, ", name(grammar, t))?;
    }
    writeln!(out, "}}")
}

/// Writes the canonical collection: `C,<state>,<lhs> -> α . β` per item.
pub fn write_item_sets<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    writeln!(out, "CS,{}\n", grammar.states.len())?;
    for (i, state) in grammar.states.iter().enumerate() {
        for item in state {
            let p = &grammar.prods[item.prod];
            write!(out, "C,{},{} ->", i, name(grammar, p.lhs))?;
            for (j, &t) in p.rhs.iter().enumerate() {
                if j == item.dot {
                    write!(out, " .")?;
                }
                write!(out, " {}", name(grammar, t))?;
            }
            if p.rhs.len() == item.dot {
                write!(out, " .")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the action and goto tables as one boxed table: a header of
/// terminals then user nonterminals, one row per state.
pub fn write_tables<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    let n_nonterm = grammar.n_nonterm;
    let n_sym = grammar.syms.len();

    let mut header = vec![String::new()];
    header.extend((n_nonterm..n_sym).map(|t| name(grammar, t).to_owned()));
    header.extend((1..n_nonterm).map(|nt| name(grammar, nt).to_owned()));

    let mut rows = vec![header];
    for state in 0..grammar.states.len() {
        let mut row = vec![state.to_string()];
        for t in n_nonterm..n_sym {
            let cell: Vec<String> = grammar.cell(state, t).iter().map(Action::to_string).collect();
            row.push(cell.join("/"));
        }
        for nt in 1..n_nonterm {
            row.push(
                grammar.tables.gotos[state][nt]
                    .map(|next| next.to_string())
                    .unwrap_or_default(),
            );
        }
        rows.push(row);
    }
    draw_table(out, &rows)
}

/// Draws rows as a boxed table with right-aligned cells. Short rows are
/// padded with empty cells.
pub fn draw_table<W: Write>(out: &mut W, rows: &[Vec<String>]) -> io::Result<()> {
    let n_columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..n_columns)
        .map(|col| {
            rows.iter()
                .map(|row| row.get(col).map_or(0, |cell| cell.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in rows {
        write_border(out, &widths)?;
        write!(out, "|")?;
        for (col, &w) in widths.iter().enumerate() {
            let value = row.get(col).map_or("", |cell| cell.as_str());
            write!(out, "{:>w$}|", value, w = w)?;
        }
        writeln!(out)?;
    }
    write_border(out, &widths)
}

fn write_border<W: Write>(out: &mut W, widths: &[usize]) -> io::Result<()> {
    write!(out, "+")?;
    for &w in widths {
        write!(out, "{}+", "-".repeat(w))?;
    }
    writeln!(out)
}

fn name(grammar: &Grammar, sym: usize) -> &str {
    grammar.syms.sym(sym).unwrap_or("?")
}
