use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::circuit::gate::{Gate, GateId, GateKind};
use crate::circuit::signal::{Signal, SignalId};

/// Structural defects reported by [`Circuit::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A non-primary signal with no driver and no reader
    #[error("unconnected signal {0}")]
    UnconnectedSignal(String),
    /// A gate input that nothing drives and that is not a primary input
    #[error("signal {0} is read but never driven")]
    UndrivenSignal(String),
    /// Gate arity does not match its kind
    #[error("gate {0} has {1} inputs")]
    BadArity(String, usize),
    /// No topological order exists
    #[error("combinational loop through gate {0}")]
    CombinationalLoop(String),
    /// Lookup of a signal name that was never added
    #[error("unknown signal {0}")]
    UnknownSignal(String),
}

/// A combinational circuit over And, Or and Not gates
///
/// Signals and gates are stored in arenas and referenced by stable indices,
/// so the graph can be freely shared once built. The structure is frozen
/// after construction; searches keep their own per-signal value state.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    signals: Vec<Signal>,
    gates: Vec<Gate>,
    inputs: Vec<SignalId>,
    outputs: Vec<SignalId>,
    head_lines: Vec<SignalId>,
    names: HashMap<String, SignalId>,
}

impl Circuit {
    /// Create an empty circuit
    pub fn new() -> Circuit {
        Circuit::default()
    }

    /// Number of signals
    pub fn nb_signals(&self) -> usize {
        self.signals.len()
    }

    /// Number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Get a signal record
    pub fn signal(&self, s: SignalId) -> &Signal {
        &self.signals[s.index()]
    }

    /// Get a gate record
    pub fn gate(&self, g: GateId) -> &Gate {
        &self.gates[g.index()]
    }

    /// Primary inputs, in declaration order
    pub fn inputs(&self) -> &[SignalId] {
        &self.inputs
    }

    /// Primary outputs, in declaration order
    pub fn outputs(&self) -> &[SignalId] {
        &self.outputs
    }

    /// Head lines, filled in by [`Circuit::identify_head_lines`]
    pub fn head_lines(&self) -> &[SignalId] {
        &self.head_lines
    }

    /// Iterate over all signal ids
    pub fn signal_ids(&self) -> impl Iterator<Item = SignalId> {
        (0..self.signals.len() as u32).map(SignalId)
    }

    /// Iterate over all gate ids
    pub fn gate_ids(&self) -> impl Iterator<Item = GateId> {
        (0..self.gates.len() as u32).map(GateId)
    }

    /// Find a signal by name
    pub fn signal_by_name(&self, name: &str) -> Result<SignalId, ModelError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownSignal(name.to_string()))
    }

    /// Add a new signal; names must be unique
    pub fn add_signal(&mut self, name: &str) -> SignalId {
        assert!(
            !self.names.contains_key(name),
            "duplicate signal name {name}"
        );
        let id = SignalId(self.signals.len() as u32);
        self.signals.push(Signal::new(name));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Add a new gate and wire it up
    ///
    /// The fanout lists of the input signals and the driver of the output
    /// signal are maintained here, so connectivity stays consistent with
    /// the gate list by construction.
    pub fn add_gate(
        &mut self,
        name: &str,
        kind: GateKind,
        inputs: Vec<SignalId>,
        output: SignalId,
    ) -> GateId {
        assert!(
            self.signals[output.index()].driver().is_none(),
            "signal {} is already driven",
            self.signal(output).name()
        );
        let id = GateId(self.gates.len() as u32);
        for i in &inputs {
            self.signals[i.index()].add_fanout(id);
        }
        self.signals[output.index()].set_driver(id);
        self.gates.push(Gate::new(name, kind, inputs, output));
        id
    }

    /// Declare a signal as primary input
    pub fn add_input(&mut self, s: SignalId) {
        self.signals[s.index()].mark_input();
        self.inputs.push(s);
    }

    /// Declare a signal as primary output
    pub fn add_output(&mut self, s: SignalId) {
        self.signals[s.index()].mark_output();
        self.outputs.push(s);
    }

    /// Classify bound signals and head lines
    ///
    /// A signal is bound when it is reachable, stem included, from any
    /// fanout stem by following gates forward. A head line is a free signal
    /// feeding at least one gate with a bound output. Call once after
    /// construction.
    pub fn identify_head_lines(&mut self) {
        let stems: Vec<SignalId> = self.signal_ids().filter(|s| self.signal(*s).is_stem()).collect();
        for stem in stems {
            self.mark_bound_from(stem);
        }
        let heads: Vec<SignalId> = self
            .signal_ids()
            .filter(|s| {
                self.signal(*s).is_free()
                    && self
                        .signal(*s)
                        .fanouts()
                        .iter()
                        .any(|g| self.signal(self.gate(*g).output()).is_bound())
            })
            .collect();
        for h in &heads {
            self.signals[h.index()].mark_head();
        }
        self.head_lines = heads;
    }

    fn mark_bound_from(&mut self, s: SignalId) {
        if self.signal(s).is_bound() {
            return;
        }
        self.signals[s.index()].mark_bound();
        let next: Vec<SignalId> = self
            .signal(s)
            .fanouts()
            .iter()
            .map(|g| self.gate(*g).output())
            .collect();
        for t in next {
            self.mark_bound_from(t);
        }
    }

    /// Seed the controllability estimates
    ///
    /// Primary inputs get 1; a gate output inherits its gate's estimate.
    /// Call once after construction.
    pub fn init_controllability(&mut self) {
        for g in self.gate_ids() {
            let c = self.gate(g).kind().controllability(self.gate(g).inputs().len());
            let out = self.gate(g).output();
            self.signals[out.index()].set_controllability(c);
        }
        for i in self.inputs.clone() {
            self.signals[i.index()].set_controllability(1);
        }
    }

    /// Enumerate every signal sequence from `from` to a primary output
    ///
    /// Paths follow the fanout direction through consuming gates and start
    /// at `from` itself. Exponential in the worst case; used on the small
    /// regions downstream of a fault.
    pub fn paths_to_outputs(&self, from: SignalId) -> Vec<Vec<SignalId>> {
        let mut paths = Vec::new();
        let mut current = vec![from];
        self.extend_paths(&mut current, &mut paths);
        paths
    }

    fn extend_paths(&self, current: &mut Vec<SignalId>, paths: &mut Vec<Vec<SignalId>>) {
        let last = current[current.len() - 1];
        if self.signal(last).is_output() {
            paths.push(current.clone());
            return;
        }
        for g in self.signal(last).fanouts() {
            let next = self.gate(*g).output();
            current.push(next);
            self.extend_paths(current, paths);
            current.pop();
        }
    }

    /// Signals present on every path from `from` to a primary output
    ///
    /// The source itself is included. Empty when no output is reachable.
    pub fn mandatory_signals(&self, from: SignalId) -> Vec<SignalId> {
        let paths = self.paths_to_outputs(from);
        let Some(first) = paths.first() else {
            return Vec::new();
        };
        first
            .iter()
            .filter(|s| paths.iter().all(|p| p.contains(*s)))
            .copied()
            .collect()
    }

    /// Number of fanout stems reachable from `from`, itself included
    pub fn reachable_stems(&self, from: SignalId) -> usize {
        let mut visited = vec![false; self.nb_signals()];
        let mut count = 0;
        let mut stack = vec![from];
        while let Some(s) = stack.pop() {
            if visited[s.index()] {
                continue;
            }
            visited[s.index()] = true;
            if self.signal(s).is_stem() {
                count += 1;
            }
            for g in self.signal(s).fanouts() {
                stack.push(self.gate(*g).output());
            }
        }
        count
    }

    /// Topological order over the gates
    pub fn topo_order(&self) -> Result<Vec<GateId>, ModelError> {
        let mut pending: Vec<usize> = self
            .gates
            .iter()
            .map(|g| {
                g.inputs()
                    .iter()
                    .filter(|s| self.signal(**s).driver().is_some())
                    .count()
            })
            .collect();
        let mut ready: Vec<GateId> = self
            .gate_ids()
            .filter(|g| pending[g.index()] == 0)
            .collect();
        let mut order = Vec::new();
        while let Some(g) = ready.pop() {
            order.push(g);
            for consumer in self.signal(self.gate(g).output()).fanouts() {
                pending[consumer.index()] -= 1;
                if pending[consumer.index()] == 0 {
                    ready.push(*consumer);
                }
            }
        }
        if order.len() != self.nb_gates() {
            let stuck = self
                .gate_ids()
                .find(|g| pending[g.index()] > 0)
                .map(|g| self.gate(g).name().to_string())
                .unwrap_or_default();
            return Err(ModelError::CombinationalLoop(stuck));
        }
        Ok(order)
    }

    /// One-time structural validation, to run before any search
    pub fn validate(&self) -> Result<(), ModelError> {
        for g in self.gate_ids() {
            let gate = self.gate(g);
            let arity_ok = match gate.kind() {
                GateKind::Not => gate.inputs().len() == 1,
                GateKind::And | GateKind::Or => gate.inputs().len() >= 2,
            };
            if !arity_ok {
                return Err(ModelError::BadArity(
                    gate.name().to_string(),
                    gate.inputs().len(),
                ));
            }
        }
        for s in self.signal_ids() {
            let sig = self.signal(s);
            if sig.is_input() {
                continue;
            }
            if sig.driver().is_none() {
                if sig.fanouts().is_empty() && !sig.is_output() {
                    return Err(ModelError::UnconnectedSignal(sig.name().to_string()));
                }
                return Err(ModelError::UndrivenSignal(sig.name().to_string()));
            }
        }
        self.topo_order()?;
        Ok(())
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for g in self.gate_ids() {
            let gate = self.gate(g);
            assert_eq!(self.signal(gate.output()).driver(), Some(g));
            for i in gate.inputs() {
                assert!(self.signal(*i).fanouts().contains(&g));
            }
        }
        for s in self.signal_ids() {
            for g in self.signal(s).fanouts() {
                assert!(self.gate(*g).inputs().contains(&s));
            }
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs, {} gates, {} head lines:",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_gates(),
            self.head_lines.len()
        )?;
        for g in self.gate_ids() {
            let gate = self.gate(g);
            let inputs: Vec<&str> = gate.inputs().iter().map(|s| self.signal(*s).name()).collect();
            writeln!(
                f,
                "\t{} = {}({})",
                self.signal(gate.output()).name(),
                gate.kind(),
                inputs.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;

    #[test]
    fn test_construction() {
        let mut c = Circuit::new();
        let a = c.add_signal("a");
        let b = c.add_signal("b");
        let out = c.add_signal("out");
        c.add_input(a);
        c.add_input(b);
        c.add_output(out);
        let g = c.add_gate("g", GateKind::And, vec![a, b], out);
        assert_eq!(c.nb_signals(), 3);
        assert_eq!(c.nb_gates(), 1);
        assert_eq!(c.signal(out).driver(), Some(g));
        assert_eq!(c.signal(a).fanouts(), &[g]);
        assert_eq!(c.signal_by_name("b"), Ok(b));
        assert!(c.signal_by_name("missing").is_err());
        c.check();
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_head_lines_c17() {
        let c = generators::c17();
        let names: Vec<&str> = c.head_lines().iter().map(|s| c.signal(*s).name()).collect();
        assert_eq!(names, vec!["4", "5", "6"]);
        // Stems and everything downstream of them are bound
        for name in ["3", "7", "8", "9", "10", "11"] {
            let s = c.signal_by_name(name).unwrap();
            assert!(c.signal(s).is_bound(), "{name} should be bound");
        }
        for name in ["1", "2", "4", "5", "6"] {
            let s = c.signal_by_name(name).unwrap();
            assert!(c.signal(s).is_free(), "{name} should be free");
        }
    }

    #[test]
    fn test_head_lines_partition() {
        let c = generators::fan_test();
        // Every primary input feeds the bound region directly
        for s in c.inputs() {
            assert!(c.signal(*s).is_head());
        }
        // A signal is never both bound and head
        for s in c.signal_ids() {
            assert!(!(c.signal(s).is_bound() && c.signal(s).is_head()));
        }
    }

    #[test]
    fn test_no_fanout_no_heads() {
        let c = generators::three_gate();
        assert!(c.head_lines().is_empty());
        for s in c.signal_ids() {
            assert!(c.signal(s).is_free());
        }
    }

    #[test]
    fn test_controllability() {
        let c = generators::three_gate();
        let in1 = c.signal_by_name("in1").unwrap();
        let mid1 = c.signal_by_name("mid1").unwrap();
        let out = c.signal_by_name("out").unwrap();
        assert_eq!(c.signal(in1).controllability(), 1);
        assert_eq!(c.signal(mid1).controllability(), 4);
        assert_eq!(c.signal(out).controllability(), 1);
    }

    #[test]
    fn test_paths_and_mandatory() {
        let c = generators::three_gate();
        let mid1 = c.signal_by_name("mid1").unwrap();
        let paths = c.paths_to_outputs(mid1);
        assert_eq!(paths.len(), 1);
        let mandatory: Vec<&str> = c
            .mandatory_signals(mid1)
            .iter()
            .map(|s| c.signal(*s).name())
            .collect();
        assert_eq!(mandatory, vec!["mid1", "mid2", "out"]);

        let c = generators::fan_test();
        let n1 = c.signal_by_name("n1").unwrap();
        let mandatory = c.mandatory_signals(n1);
        // n1 reaches out2 directly, so nothing downstream is shared
        assert_eq!(
            mandatory,
            vec![n1],
            "only the source lies on every path from a stem"
        );
    }

    #[test]
    fn test_reachable_stems() {
        let c = generators::fan_test();
        let n1 = c.signal_by_name("n1").unwrap();
        let in4 = c.signal_by_name("in4").unwrap();
        // n1 and n3 are the two stems downstream of n1
        assert_eq!(c.reachable_stems(n1), 2);
        assert_eq!(c.reachable_stems(in4), 1);
    }

    #[test]
    fn test_validate_errors() {
        let mut c = Circuit::new();
        let a = c.add_signal("a");
        c.add_input(a);
        let dangling = c.add_signal("dangling");
        assert_eq!(
            c.validate(),
            Err(ModelError::UnconnectedSignal("dangling".to_string()))
        );
        let out = c.add_signal("out");
        c.add_output(out);
        c.add_gate("g", GateKind::Not, vec![a, dangling], out);
        assert_eq!(c.validate(), Err(ModelError::BadArity("g".to_string(), 2)));
    }

    #[test]
    fn test_validate_undriven() {
        let mut c = Circuit::new();
        let a = c.add_signal("a");
        let b = c.add_signal("b");
        let out = c.add_signal("out");
        c.add_input(a);
        c.add_output(out);
        c.add_gate("g", GateKind::And, vec![a, b], out);
        assert_eq!(
            c.validate(),
            Err(ModelError::UndrivenSignal("b".to_string()))
        );
    }

    #[test]
    fn test_topo_order() {
        let c = generators::c17();
        let order = c.topo_order().unwrap();
        assert_eq!(order.len(), c.nb_gates());
        let mut seen = vec![false; c.nb_gates()];
        for g in order {
            for i in c.gate(g).inputs() {
                if let Some(d) = c.signal(*i).driver() {
                    assert!(seen[d.index()]);
                }
            }
            seen[g.index()] = true;
        }
    }
}
