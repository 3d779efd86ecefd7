use crate::circuit::{Circuit, GateId, SignalId};
use crate::fan::values::ValueStore;

/// A gate through which a fault effect may still propagate
///
/// The output is unknown while some input already carries D or D'; the
/// remaining unknown side inputs block the effect until they take the
/// gate's non-controlling value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierGate {
    /// The gate itself
    pub gate: GateId,
    /// The input carrying the fault effect
    pub faulty_input: SignalId,
    /// Side inputs still unknown, keeping the output at X
    pub blocking_inputs: Vec<SignalId>,
    /// Ranking score, larger is more promising
    pub score: i32,
}

/// Enumerate the gates whose output is X with a fault effect on some input
///
/// An empty result means the effect cannot move any further under the
/// current assignments; the run either succeeded already at an output or
/// has to backtrack.
pub fn d_frontier(circuit: &Circuit, values: &ValueStore) -> Vec<FrontierGate> {
    let mut frontier = Vec::new();
    for g in circuit.gate_ids() {
        let gate = circuit.gate(g);
        if !values.is_unknown(gate.output()) {
            continue;
        }
        let Some(faulty_input) = gate
            .inputs()
            .iter()
            .find(|i| values.get(**i).is_faulty())
            .copied()
        else {
            continue;
        };
        let blocking_inputs: Vec<SignalId> = gate
            .inputs()
            .iter()
            .filter(|i| values.is_unknown(**i))
            .copied()
            .collect();
        frontier.push(FrontierGate {
            gate: g,
            faulty_input,
            blocking_inputs,
            score: score(circuit, g),
        });
    }
    frontier
}

/// Rank a frontier gate by how cheap further propagation looks
///
/// Head-line outputs justify locally and outputs with a single reader have
/// one forced continuation; a stem output opens reconvergent paths that may
/// cancel the effect.
fn score(circuit: &Circuit, g: GateId) -> i32 {
    let out = circuit.signal(circuit.gate(g).output());
    let mut score = 0;
    if out.is_head() {
        score += 2;
    }
    if out.fanouts().len() == 1 {
        score += 1;
    }
    if out.is_stem() {
        score -= 1;
    }
    score
}

/// The frontier gate to pursue: best score, then lowest gate index
pub fn best_gate<'a>(frontier: &'a [FrontierGate]) -> Option<&'a FrontierGate> {
    frontier.iter().min_by_key(|f| (-f.score, f.gate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{StuckAt, Value};
    use crate::fan::implication::{implicate, Assignment};
    use crate::generators;

    #[test]
    fn test_frontier_after_injection() {
        let c = generators::three_gate();
        let in1 = c.signal_by_name("in1").unwrap();
        let mid1 = c.signal_by_name("mid1").unwrap();
        let mut values = ValueStore::new(&c, in1, StuckAt::Zero);
        implicate(&c, &mut values, Assignment { signal: in1, value: Value::D }).unwrap();

        let frontier = d_frontier(&c, &values);
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier[0].faulty_input, in1);
        assert_eq!(c.gate(frontier[0].gate).output(), mid1);
        let in2 = c.signal_by_name("in2").unwrap();
        assert_eq!(frontier[0].blocking_inputs, vec![in2]);
    }

    #[test]
    fn test_frontier_empty_when_blocked() {
        let c = generators::three_gate();
        let in1 = c.signal_by_name("in1").unwrap();
        let in2 = c.signal_by_name("in2").unwrap();
        let mut values = ValueStore::new(&c, in1, StuckAt::Zero);
        implicate(&c, &mut values, Assignment { signal: in1, value: Value::D }).unwrap();
        // in2 = 0 kills the And output, the effect is stopped
        implicate(&c, &mut values, Assignment { signal: in2, value: Value::Zero }).unwrap();
        assert!(d_frontier(&c, &values).is_empty());
    }

    #[test]
    fn test_frontier_scores() {
        let c = generators::fan_test();
        let n1 = c.signal_by_name("n1").unwrap();
        let mut values = ValueStore::new(&c, n1, StuckAt::One);
        implicate(&c, &mut values, Assignment { signal: n1, value: Value::DBar }).unwrap();

        let frontier = d_frontier(&c, &values);
        // n1 feeds three gates, all still open
        assert_eq!(frontier.len(), 3);
        for f in &frontier {
            assert_eq!(f.faulty_input, n1);
        }
        // g2 drives the single-reader n2 and wins over g7 driving out2
        let best = best_gate(&frontier).unwrap();
        let n2 = c.signal_by_name("n2").unwrap();
        assert_eq!(c.gate(best.gate).output(), n2);
    }
}
