// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The tradeloop command line: `parse` turns a wants text file into a json
//! instance, `solve` runs one back-end over an instance, `bench` sweeps a
//! directory of instances and gathers the per-file metrics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use tradeloop::{
    load_instance, normalise, parse_wants_file, peak_memory_mb, save_instance, save_metrics,
    solve, Cutoff, Error, NoCutoff, Report, SolveConfig, SolveOutcome, SolveStatus, TimeBudget,
    TradeGraph, VizConfig,
};

/// The tradeloop math-trade solver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// The per-solve knobs shared by `solve` and `bench`.
#[derive(clap::Args, Debug)]
struct SolveArgs {
    /// The back-end to run: matching, ilp-trades, ilp-players, genetic or
    /// greedy
    #[arg(long)]
    algo: String,
    /// Longest cycle the enumerator will consider
    #[arg(long, default_value_t = 8)]
    max_cycle_length: usize,
    /// Cap on the materialised cycle pool of the ILP back-ends
    #[arg(long, default_value_t = 1_000_000)]
    max_cycles: usize,
    /// Seed of the genetic solver's random source
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Give up (keeping the best known result) after this many seconds
    #[arg(long)]
    time_limit: Option<u64>,
    /// Where to write the metrics json
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a wants text file into a json instance
    Parse {
        /// The wants text file
        wants: PathBuf,
        /// Where to write the json instance
        out: PathBuf,
    },
    /// Solve a json instance with the chosen back-end
    Solve {
        /// The json instance file
        instance: PathBuf,
        #[command(flatten)]
        solve: SolveArgs,
        /// Where to write the exchange graph html
        #[arg(long)]
        graph_out: Option<PathBuf>,
    },
    /// Solve every json instance of a directory and gather the metrics
    Bench {
        /// The directory holding the json instances
        dir: PathBuf,
        #[command(flatten)]
        solve: SolveArgs,
    },
}

fn main() {
    env_logger::init();
    if let Err(error) = run(Args::parse()) {
        eprintln!("fatal: {}", error);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    match args.command {
        Command::Parse { wants, out } => {
            let (raw, diags) = parse_wants_file(&wants)?;
            save_instance(&out, &raw)?;
            println!(
                "parsed {} users and {} items ({} warnings) into {}",
                raw.users.len(),
                raw.items.len(),
                diags.len(),
                out.display()
            );
            Ok(())
        }
        Command::Solve {
            instance,
            solve,
            graph_out,
        } => {
            let (report, display) = solve_one(&instance, &solve)?;
            if let Some(graph_out) = graph_out {
                let html = display.as_html(&VizConfig::default())?;
                std::fs::write(&graph_out, html)?;
                println!("exchange graph written to {}", graph_out.display());
            }
            if let Some(metrics_out) = &solve.metrics_out {
                let mut metrics = BTreeMap::new();
                metrics.insert(instance.display().to_string(), report);
                save_metrics(metrics_out, &metrics)?;
            }
            Ok(())
        }
        Command::Bench { dir, solve } => {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
                .collect();
            paths.sort();
            if paths.is_empty() {
                println!("no json instances found under {}", dir.display());
                return Ok(());
            }
            let mut metrics = BTreeMap::new();
            for path in paths {
                println!("\n== processing {}", path.display());
                let (report, _) = solve_one(&path, &solve)?;
                metrics.insert(path.display().to_string(), report);
            }
            if let Some(metrics_out) = &solve.metrics_out {
                save_metrics(metrics_out, &metrics)?;
                println!("\nmetrics written to {}", metrics_out.display());
            }
            Ok(())
        }
    }
}

/// Loads, normalises and solves one instance file, printing the outcome and
/// returning the filled report along with the exchange graph.
fn solve_one(path: &Path, args: &SolveArgs) -> Result<(Report, TradeGraph), Error> {
    let start = Instant::now();
    let mut report = Report::default();

    let raw = load_instance(path)?;
    let (instance, diags) = normalise(&raw);
    report.count_warnings(diags.len());

    let mut config = SolveConfig::default();
    config.max_cycle_length = args.max_cycle_length;
    config.max_cycles = args.max_cycles;
    config.seed = args.seed;

    let cutoff: Box<dyn Cutoff> = match args.time_limit {
        Some(seconds) => Box::new(TimeBudget::new(Duration::from_secs(seconds))),
        None => Box::new(NoCutoff),
    };
    let outcome = solve(&instance, &args.algo, &config, cutoff.as_ref())?;

    report.tally(&instance, &outcome);
    report.execution_time_seconds = start.elapsed().as_secs_f64();
    report.memory_usage_mb = peak_memory_mb();

    print_transactions(&instance, &outcome);
    print_summaries(&instance, &outcome);
    print_headline(&report, &outcome);

    let display = TradeGraph::new(&instance, &outcome.exchanges);
    Ok((report, display))
}

fn print_transactions(instance: &tradeloop::Instance, outcome: &SolveOutcome) {
    println!("\ntransactions:");
    if outcome.exchanges.is_empty() {
        println!("  (none)");
        return;
    }
    for exchange in &outcome.exchanges {
        println!(
            "  {} gives '{}' and receives '{}'",
            instance.participant(exchange.giver).display,
            instance.item(exchange.given).name,
            instance.item(exchange.received).name,
        );
    }
}

fn print_summaries(instance: &tradeloop::Instance, outcome: &SolveOutcome) {
    println!("\nper participant:");
    for summary in &outcome.summaries {
        if !summary.participates() {
            println!("  {}: no trade", summary.display);
            continue;
        }
        let given: Vec<&str> = summary
            .items_given
            .iter()
            .map(|it| instance.item(*it).name.as_str())
            .collect();
        let received: Vec<&str> = summary
            .items_received
            .iter()
            .map(|it| instance.item(*it).name.as_str())
            .collect();
        println!(
            "  {}: gives {:?}, receives {:?}",
            summary.display, given, received
        );
    }
}

fn print_headline(report: &Report, outcome: &SolveOutcome) {
    let status = match outcome.completion.status {
        SolveStatus::Optimal => "optimal",
        SolveStatus::Feasible => "feasible",
        SolveStatus::Cancelled => "cancelled",
        SolveStatus::Failed => "failed",
    };
    println!("\nstatus:        {}", status);
    println!("exchanges:     {}", report.num_exchanges);
    println!(
        "participation: {:.2}% of {} users",
        report.participation_percent, report.num_users
    );
    println!(
        "effectiveness: {:.2}%",
        report.overall_effectiveness_percent
    );
    println!(
        "cycles:        {} found, {} selected",
        report.num_cycles_found, report.num_cycles_selected
    );
    println!("solver time:   {:.3}s", report.solver_time_seconds);
    println!("total time:    {:.3}s", report.execution_time_seconds);
    println!("warnings:      {}", report.num_warnings);
    if let Some(most_wanted) = &report.most_wanted_item {
        println!("most wanted:   {}", most_wanted);
    }
}
