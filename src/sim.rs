//! Two-valued simulation, used to verify generated test patterns

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::circuit::{Circuit, GateKind, SignalId, StuckAt};

/// Simulate the fault-free circuit; returns the primary-output values
pub fn simulate(circuit: &Circuit, inputs: &[bool]) -> Vec<bool> {
    run(circuit, inputs, None)
}

/// Simulate the circuit with a stuck-at fault injected
pub fn simulate_with_fault(
    circuit: &Circuit,
    inputs: &[bool],
    site: SignalId,
    stuck: StuckAt,
) -> Vec<bool> {
    run(circuit, inputs, Some((site, stuck)))
}

/// Whether `inputs` makes the good and faulty responses differ
pub fn detects_fault(circuit: &Circuit, inputs: &[bool], site: SignalId, stuck: StuckAt) -> bool {
    simulate(circuit, inputs) != simulate_with_fault(circuit, inputs, site, stuck)
}

/// Seeded random input vectors
pub fn random_patterns(nb_inputs: usize, nb_patterns: usize, seed: u64) -> Vec<Vec<bool>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..nb_patterns)
        .map(|_| (0..nb_inputs).map(|_| rng.gen()).collect())
        .collect()
}

fn run(circuit: &Circuit, inputs: &[bool], fault: Option<(SignalId, StuckAt)>) -> Vec<bool> {
    assert_eq!(inputs.len(), circuit.nb_inputs());
    let order = match circuit.topo_order() {
        Ok(order) => order,
        Err(e) => panic!("simulation needs a valid circuit: {e}"),
    };

    let mut values = vec![false; circuit.nb_signals()];
    let clamp = |s: SignalId, v: bool| match fault {
        Some((site, stuck)) if site == s => stuck.value(),
        _ => v,
    };
    for (s, v) in circuit.inputs().iter().zip(inputs) {
        values[s.index()] = clamp(*s, *v);
    }
    for g in order {
        let gate = circuit.gate(g);
        let out = match gate.kind() {
            GateKind::And => gate.inputs().iter().all(|i| values[i.index()]),
            GateKind::Or => gate.inputs().iter().any(|i| values[i.index()]),
            GateKind::Not => !values[gate.inputs()[0].index()],
        };
        values[gate.output().index()] = clamp(gate.output(), out);
    }
    circuit.outputs().iter().map(|o| values[o.index()]).collect()
}
