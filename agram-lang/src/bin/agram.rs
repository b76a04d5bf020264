//! Command-line interface for `agram`.
//!
//! `agram run` builds a grammar from a rule file and runs it over an IR
//! file, printing emitted lines; `agram tables` prints the rules,
//! FIRST/FOLLOW sets, item sets and parse tables of a grammar.

#[cfg(feature = "cli")]
mod real {
    use agram::dump;
    use agram_lang::{ir, read_grammar};
    use anyhow::Context;
    use clap::{Parser, Subcommand};
    use std::io::{self, Write};
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Build and run guarded attribute grammars")]
    struct Args {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Run a grammar over an IR input file
        Run {
            /// Path to the grammar file
            #[arg(short = 'g', long)]
            grammar: PathBuf,

            /// Path to the IR input file
            #[arg(short = 'i', long)]
            input: PathBuf,

            /// Log parse statistics at info level.
            #[arg(short = 's', long)]
            stats: bool,
        },
        /// Print the rules, FIRST/FOLLOW sets, item sets and tables
        Tables {
            /// Path to the grammar file
            #[arg(short = 'g', long)]
            grammar: PathBuf,
        },
    }

    pub fn main() -> anyhow::Result<()> {
        env_logger::init();
        let args = Args::parse();
        match args.command {
            Command::Run {
                grammar,
                input,
                stats,
            } => {
                let g = read_grammar(&grammar)
                    .with_context(|| format!("failed to build grammar {}", grammar.display()))?;
                let text = std::fs::read_to_string(&input)
                    .with_context(|| format!("failed to read {}", input.display()))?;
                let code = ir::strip_comments(&text);
                let terminals = ir::terminals(&code)
                    .with_context(|| format!("failed to lex {}", input.display()))?;
                let parse_stats = g
                    .parse(terminals, io::stdout().lock())
                    .with_context(|| format!("failed to parse {}", input.display()))?;
                if stats {
                    log::info!("{:?}", parse_stats);
                }
            }
            Command::Tables { grammar } => {
                let g = read_grammar(&grammar)
                    .with_context(|| format!("failed to build grammar {}", grammar.display()))?;
                let mut out = io::stdout().lock();
                dump::write_rules(&mut out, &g)?;
                writeln!(out)?;
                dump::write_first_follow(&mut out, &g)?;
                writeln!(out)?;
                dump::write_item_sets(&mut out, &g)?;
                dump::write_tables(&mut out, &g)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("agram disabled (compiled without `cli` feature)");
}
