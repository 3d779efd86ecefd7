use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

use crate::circuit::{Circuit, GateKind, SignalId, StuckAt, Value};
use crate::fan::backtrace::{multiple_backtrace, Objective};
use crate::fan::frontier::{best_gate, d_frontier, FrontierGate};
use crate::fan::implication::{eval_gate, implicate, Assignment};
use crate::fan::sensitization::unique_sensitization;
use crate::fan::values::ValueStore;

/// Reasons a search ends without a test pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The decision budget ran out; the result is inconclusive
    #[error("maximum number of decisions exceeded")]
    MaxDecisions,
    /// The backtrack budget ran out; the result is inconclusive
    #[error("maximum number of backtracks exceeded")]
    MaxBacktracks,
    /// The wall-clock deadline passed; the result is inconclusive
    #[error("time limit exceeded")]
    Timeout,
    /// The whole decision space was explored; the fault is redundant
    #[error("no test pattern exists")]
    NoSolution,
}

/// Knobs bounding and shaping a search
#[derive(Debug, Clone)]
pub struct Config {
    /// Cap on decision nodes created
    pub max_decisions: usize,
    /// Cap on backtrack events
    pub max_backtracks: usize,
    /// Wall-clock deadline for one run
    pub time_limit: Duration,
    /// Force side inputs along mandatory propagation segments
    pub use_unique_sensitization: bool,
    /// Order backtrace choices by controllability instead of input order
    pub use_dynamic_backtrace: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_decisions: 1000,
            max_backtracks: 1000,
            time_limit: Duration::from_secs(300),
            use_unique_sensitization: true,
            use_dynamic_backtrace: true,
        }
    }
}

/// Counters accumulated during one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Decision nodes created, staged sensitization included
    pub decisions: usize,
    /// Backtrack events
    pub backtracks: usize,
    /// Implication invocations
    pub implications: usize,
    /// Backtrace invocations
    pub backtraces: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// One entry of the decision stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Signal the decision assigns
    pub signal: SignalId,
    /// Value currently tried
    pub value: Value,
    /// Whether the complement has already been tried
    pub alternative: bool,
    /// Depth of the decision, starting at 1
    pub level: u32,
}

/// Outcome of a FAN run on a single fault
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Whether a test pattern was found
    pub success: bool,
    /// Primary-input values in circuit input order; don't-cares resolve to 0
    pub pattern: Vec<bool>,
    /// Every value derived by implication, in derivation order
    pub implications: Vec<Assignment>,
    /// The D-frontier at the end of the run
    pub frontier: Vec<FrontierGate>,
    /// The decision stack at the end of the run
    pub decisions: Vec<Decision>,
    /// Search counters
    pub stats: Stats,
    /// Failure reason when no pattern was found
    pub error: Option<SearchError>,
}

/// Find a test pattern for a single stuck-at fault, default configuration
pub fn fan(circuit: &Circuit, site: SignalId, stuck: StuckAt) -> TestResult {
    fan_with_config(circuit, site, stuck, &Config::default())
}

/// Find a test pattern for a single stuck-at fault
///
/// The fault effect is injected at `site`, implications are propagated, and
/// decisions at head lines push the effect toward an output. Conflicts
/// backtrack chronologically, trying the complement of the newest decision
/// before discarding it. An exhausted stack proves the fault redundant.
pub fn fan_with_config(
    circuit: &Circuit,
    site: SignalId,
    stuck: StuckAt,
    config: &Config,
) -> TestResult {
    let start = Instant::now();
    let mut search = Search {
        circuit,
        config,
        start,
        values: ValueStore::new(circuit, site, stuck),
        decisions: Vec::new(),
        pending: Vec::new(),
        implications: Vec::new(),
        stats: Stats::default(),
    };
    let error = search.run();
    let success = error.is_none();
    debug!(
        "{} on {}: {} after {} decisions",
        stuck,
        circuit.signal(site).name(),
        if success { "pattern found" } else { "no pattern" },
        search.stats.decisions
    );
    search.stats.elapsed = start.elapsed();
    TestResult {
        success,
        pattern: if success { search.pattern() } else { Vec::new() },
        frontier: d_frontier(circuit, &search.values),
        implications: search.implications,
        decisions: search.decisions,
        stats: search.stats,
        error,
    }
}

struct Search<'a> {
    circuit: &'a Circuit,
    config: &'a Config,
    start: Instant,
    values: ValueStore,
    decisions: Vec<Decision>,
    pending: Vec<Assignment>,
    implications: Vec<Assignment>,
    stats: Stats,
}

impl Search<'_> {
    /// Main decision loop; `None` means a pattern was found
    fn run(&mut self) -> Option<SearchError> {
        self.pending.push(Assignment {
            signal: self.values.fault_site(),
            value: self.values.fault().effect(),
        });

        loop {
            if self.start.elapsed() >= self.config.time_limit {
                return Some(SearchError::Timeout);
            }
            if self.stats.decisions >= self.config.max_decisions {
                return Some(SearchError::MaxDecisions);
            }
            if self.stats.backtracks >= self.config.max_backtracks {
                return Some(SearchError::MaxBacktracks);
            }

            if !self.implicate_pending() {
                if !self.backtrack() {
                    return Some(SearchError::NoSolution);
                }
                continue;
            }

            if self.fault_observed() {
                // Propagation is done; fill in the free choices the
                // backward rules could not settle on their own
                match self.next_justification() {
                    None => return None,
                    Some(a) => {
                        self.decide(a.signal, a.value);
                        continue;
                    }
                }
            }

            let frontier = d_frontier(self.circuit, &self.values);
            if frontier.is_empty() {
                if !self.backtrack() {
                    return Some(SearchError::NoSolution);
                }
                continue;
            }

            if self.config.use_unique_sensitization {
                if let Some(sens) = unique_sensitization(self.circuit, &self.values, &frontier) {
                    if !sens.forced.is_empty() {
                        let level = self.next_level();
                        for a in sens.forced {
                            self.push_decision(a.signal, a.value, level);
                        }
                        continue;
                    }
                }
            }

            self.stats.backtraces += 1;
            let initial = match best_gate(&frontier) {
                Some(best) => self.propagation_objectives(best),
                None => Vec::new(),
            };
            let finals =
                multiple_backtrace(self.circuit, initial, self.config.use_dynamic_backtrace);
            let next = finals
                .iter()
                .find(|o| self.values.is_unknown(o.signal))
                .map(|o| (o.signal, o.value()));
            match next {
                Some((signal, value)) => self.decide(signal, value),
                None => {
                    if !self.backtrack() {
                        return Some(SearchError::NoSolution);
                    }
                }
            }
        }
    }

    /// Run implication for every pending assignment; false on conflict
    fn implicate_pending(&mut self) -> bool {
        let pending = std::mem::take(&mut self.pending);
        for a in pending {
            self.stats.implications += 1;
            match implicate(self.circuit, &mut self.values, a) {
                Ok(implied) => self.implications.extend(implied),
                Err(_) => return false,
            }
        }
        true
    }

    /// Whether some primary output already carries the fault effect
    fn fault_observed(&self) -> bool {
        self.circuit
            .outputs()
            .iter()
            .any(|o| self.values.get(*o).is_faulty())
    }

    /// Initial objectives unblocking the chosen frontier gate
    fn propagation_objectives(&self, gate: &FrontierGate) -> Vec<Objective> {
        let Some(nc) = self.circuit.gate(gate.gate).kind().non_controlling() else {
            return Vec::new();
        };
        gate.blocking_inputs
            .iter()
            .map(|s| Objective::new(*s, nc, 0))
            .collect()
    }

    /// The next free choice needed to justify an assigned line
    ///
    /// Backward implication settles every forced case, so an assigned
    /// signal whose driving gate still evaluates to X is waiting on a
    /// choice: all inputs at the non-controlling value for one polarity,
    /// any single controlling input for the other. The fault site asks for
    /// its good-circuit value, which is what the pattern must establish.
    fn next_justification(&self) -> Option<Assignment> {
        for s in self.circuit.signal_ids() {
            let v = self.values.get(s);
            let Some(good) = v.good() else {
                continue;
            };
            let Some(driver) = self.circuit.signal(s).driver() else {
                continue;
            };
            if eval_gate(self.circuit, &self.values, driver) != Value::X {
                continue;
            }
            let gate = self.circuit.gate(driver);
            let (nc, needs_all) = match gate.kind() {
                GateKind::And => (Value::One, good),
                GateKind::Or => (Value::Zero, !good),
                GateKind::Not => continue,
            };
            let unknown: Vec<SignalId> = gate
                .inputs()
                .iter()
                .filter(|i| self.values.is_unknown(**i))
                .copied()
                .collect();
            let choice = if needs_all {
                unknown.first().copied()
            } else if self.config.use_dynamic_backtrace {
                unknown.iter().copied().min_by_key(|i| {
                    (
                        self.circuit.signal(*i).controllability(),
                        self.circuit.reachable_stems(*i),
                        *i,
                    )
                })
            } else {
                unknown.first().copied()
            };
            if let Some(signal) = choice {
                let value = if needs_all { nc } else { !nc };
                return Some(Assignment { signal, value });
            }
        }
        None
    }

    fn next_level(&self) -> u32 {
        self.decisions.last().map(|d| d.level).unwrap_or(0) + 1
    }

    fn decide(&mut self, signal: SignalId, value: Value) {
        let level = self.next_level();
        debug!(
            "decision {} = {} at level {}",
            self.circuit.signal(signal).name(),
            value,
            level
        );
        self.push_decision(signal, value, level);
    }

    fn push_decision(&mut self, signal: SignalId, value: Value, level: u32) {
        self.decisions.push(Decision {
            signal,
            value,
            alternative: false,
            level,
        });
        self.stats.decisions += 1;
        self.pending.push(Assignment { signal, value });
    }

    /// Flip the newest untried decision, dropping exhausted ones
    ///
    /// Returns false once the stack is empty: the search space is spent.
    fn backtrack(&mut self) -> bool {
        self.stats.backtracks += 1;
        loop {
            let Some(top) = self.decisions.last_mut() else {
                return false;
            };
            if top.alternative {
                self.decisions.pop();
                continue;
            }
            top.alternative = true;
            top.value = !top.value;
            let (signal, value) = (top.signal, top.value);
            debug!(
                "backtrack: retrying {} = {}",
                self.circuit.signal(signal).name(),
                value
            );
            self.rebuild();
            return true;
        }
    }

    /// Reset all values and replay the surviving decisions
    fn rebuild(&mut self) {
        self.values.reset();
        self.implications.clear();
        self.pending.clear();
        self.pending.push(Assignment {
            signal: self.values.fault_site(),
            value: self.values.fault().effect(),
        });
        for d in &self.decisions {
            self.pending.push(Assignment {
                signal: d.signal,
                value: d.value,
            });
        }
    }

    /// Primary-input values of the found pattern, don't-cares at 0
    fn pattern(&self) -> Vec<bool> {
        self.circuit
            .inputs()
            .iter()
            .map(|i| self.values.get(*i).good().unwrap_or(false))
            .collect()
    }
}
