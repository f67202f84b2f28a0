#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The command-line interface.
//!
//! Solves a DIMACS CNF file, optionally with the live control socket
//! attached and/or a one-shot instruction file applied before search.

use crate::sat::assignment::Solutions;
use crate::sat::cnf::Cnf;
use crate::sat::dimacs::parse_file;
use crate::sat::restarter::Restarter;
use crate::sat::solver::{Cdcl, SearchStats};
use crate::tether::Tether;
use crate::tether::instruction::load_instruction_file;
use clap::{Args, CommandFactory, Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// Defines the command-line interface, parsed with `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "sat-tether",
    version,
    about = "A CDCL SAT solver with a live control socket"
)]
pub struct Cli {
    /// Path to the DIMACS .cnf file to solve.
    #[arg(global = true)]
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct CommonOptions {
    /// Unix socket path for the live control channel. External processes
    /// can observe conflicts and inject directives while solving runs.
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Instruction document applied once before solving, through the same
    /// protocol the socket speaks.
    #[arg(long)]
    pub instructions: Option<PathBuf>,

    /// Verify the found model against the original formula.
    #[arg(short, long, default_value_t = true)]
    pub verify: bool,

    /// Print search statistics after solving.
    #[arg(short, long, default_value_t = true)]
    pub stats: bool,

    /// Print the satisfying assignment if the formula is satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub print_solution: bool,

    /// Disable spontaneous restarts; only a restart directive over the
    /// control channel can force one.
    #[arg(long, default_value_t = false)]
    pub no_restarts: bool,
}

/// Parses arguments, runs the solve and reports. Returns the process exit
/// code.
#[must_use]
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "sat-tether",
            &mut std::io::stdout(),
        );
        return ExitCode::SUCCESS;
    }

    let Some(path) = cli.path else {
        eprintln!("No input file provided. Use --help for more information.");
        return ExitCode::FAILURE;
    };

    let parse_start = Instant::now();
    let cnf = match parse_file(&path) {
        Ok(cnf) => cnf,
        Err(e) => {
            eprintln!("Failed to parse {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let parse_time = parse_start.elapsed();

    if cli.common.no_restarts {
        solve_and_report(Cdcl::without_restarts(cnf), &cli.common, parse_time)
    } else {
        solve_and_report(Cdcl::new(cnf), &cli.common, parse_time)
    }
}

fn solve_and_report<R: Restarter>(
    mut solver: Cdcl<R>,
    common: &CommonOptions,
    parse_time: Duration,
) -> ExitCode {
    if let Some(instruction_path) = &common.instructions {
        // The restart flag is meaningless before search begins.
        if let Err(e) = load_instruction_file(instruction_path, &mut solver) {
            warn!("startup instructions skipped: {e}");
        }
    }

    if let Some(socket) = &common.socket {
        match Tether::start(socket) {
            Ok(tether) => solver.attach_tether(tether),
            Err(e) => warn!("solving without live control: {e}"),
        }
    }

    let solve_start = Instant::now();
    let solutions = solver.solve();
    let solve_time = solve_start.elapsed();

    if let Some(mut tether) = solver.detach_tether() {
        tether.shutdown();
    }

    if common.verify {
        if let Some(model) = &solutions {
            if !solver.cnf.verify(model) {
                eprintln!("Solution failed verification!");
                return ExitCode::FAILURE;
            }
            println!("Verified: true");
        }
    }

    if common.stats {
        print_stats(parse_time, solve_time, &solver.cnf, solver.stats());
    }

    report(&solutions, common.print_solution);
    ExitCode::SUCCESS
}

fn report(solutions: &Option<Solutions>, print_solution: bool) {
    match solutions {
        Some(model) => {
            if print_solution {
                println!("v {model} 0");
            }
            println!("\nSATISFIABLE");
        }
        None => println!("\nUNSATISFIABLE"),
    }
}

fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

fn print_stats(parse_time: Duration, elapsed: Duration, cnf: &Cnf, s: SearchStats) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.non_learnt_idx);

    println!("========================[ Search Statistics ]========================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line("Total clauses (incl. learnt)", cnf.len());
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
