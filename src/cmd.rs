//! Command line interface

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use kdam::{tqdm, BarExt};

use crate::circuit::{Circuit, SignalId, StuckAt};
use crate::fan::{fan_with_config, Config, SearchError};
use crate::generators;
use crate::sim;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show the structure of a sample circuit
    ///
    /// Prints the gate list and the classification of every signal.
    #[clap()]
    Show(ShowArgs),

    /// Generate test patterns for stuck-at faults
    ///
    /// Runs the search for a single fault when --signal is given, and
    /// otherwise sweeps both polarities on every signal of the circuit,
    /// verifying each pattern against a two-valued simulation.
    #[clap(alias = "atpg")]
    Test(TestArgs),
}

/// Command arguments for circuit display
#[derive(Args)]
pub struct ShowArgs {
    /// Name of a sample circuit (c17, three-gate, fan-test, redundant)
    circuit: String,
}

impl ShowArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = sample(&self.circuit);
        print!("{circuit}");
        let heads = circuit
            .head_lines()
            .iter()
            .map(|s| circuit.signal(*s).name())
            .join(", ");
        println!("Head lines: {heads}");
    }
}

/// Command arguments for test pattern generation
#[derive(Args)]
pub struct TestArgs {
    /// Name of a sample circuit (c17, three-gate, fan-test, redundant)
    circuit: String,

    /// Only target the fault on this signal
    #[arg(short = 's', long)]
    signal: Option<String>,

    /// Fault polarity for --signal, 0 or 1
    #[arg(short = 'v', long, default_value_t = 0)]
    stuck_at: u8,

    /// Cap on decision nodes per fault
    #[arg(long, default_value_t = 1000)]
    max_decisions: usize,

    /// Cap on backtrack events per fault
    #[arg(long, default_value_t = 1000)]
    max_backtracks: usize,

    /// Disable the unique sensitization analysis
    #[arg(long)]
    no_unique_sensitization: bool,
}

impl TestArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = sample(&self.circuit);
        let config = Config {
            max_decisions: self.max_decisions,
            max_backtracks: self.max_backtracks,
            use_unique_sensitization: !self.no_unique_sensitization,
            ..Config::default()
        };
        match &self.signal {
            Some(name) => self.run_single(&circuit, name, &config),
            None => self.run_sweep(&circuit, &config),
        }
    }

    fn run_single(&self, circuit: &Circuit, name: &str, config: &Config) {
        let site = match circuit.signal_by_name(name) {
            Ok(site) => site,
            Err(e) => {
                println!("{e}");
                std::process::exit(1);
            }
        };
        let stuck = if self.stuck_at == 0 {
            StuckAt::Zero
        } else {
            StuckAt::One
        };
        let result = fan_with_config(circuit, site, stuck, config);
        if result.success {
            println!(
                "Found a pattern for {} {} in {:?} with {} decisions:",
                stuck,
                name,
                result.stats.elapsed,
                result.stats.decisions
            );
            println!("\t{}", pattern_string(circuit, &result.pattern));
            assert!(sim::detects_fault(circuit, &result.pattern, site, stuck));
        } else {
            let reason = result
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("No pattern for {stuck} {name}: {reason}");
            std::process::exit(1);
        }
    }

    fn run_sweep(&self, circuit: &Circuit, config: &Config) {
        let faults: Vec<(SignalId, StuckAt)> = circuit
            .signal_ids()
            .flat_map(|s| [(s, StuckAt::Zero), (s, StuckAt::One)])
            .collect();
        let mut detected = 0usize;
        let mut redundant = 0usize;
        let mut aborted = 0usize;
        let mut progress = tqdm!(total = faults.len());
        progress.set_description("Fault coverage");
        for (site, stuck) in &faults {
            let result = fan_with_config(circuit, *site, *stuck, config);
            if result.success {
                assert!(
                    sim::detects_fault(circuit, &result.pattern, *site, *stuck),
                    "pattern fails to detect {} {}",
                    stuck,
                    circuit.signal(*site).name()
                );
                detected += 1;
            } else if result.error == Some(SearchError::NoSolution) {
                redundant += 1;
            } else {
                aborted += 1;
            }
            progress.update(1).unwrap();
        }
        println!();
        println!(
            "Detected {}/{} faults ({:.2}% coverage), {} redundant, {} aborted",
            detected,
            faults.len(),
            100.0 * (detected as f64) / (faults.len() as f64),
            redundant,
            aborted
        );
    }
}

fn sample(name: &str) -> Circuit {
    match generators::by_name(name) {
        Some(circuit) => circuit,
        None => {
            println!(
                "Unknown circuit {name}; available: {}",
                generators::NAMES.join(", ")
            );
            std::process::exit(1);
        }
    }
}

fn pattern_string(circuit: &Circuit, pattern: &[bool]) -> String {
    circuit
        .inputs()
        .iter()
        .zip(pattern)
        .map(|(s, v)| format!("{}={}", circuit.signal(*s).name(), *v as u8))
        .join(" ")
}
