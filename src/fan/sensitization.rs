use crate::circuit::{Circuit, SignalId};
use crate::fan::frontier::FrontierGate;
use crate::fan::implication::Assignment;
use crate::fan::values::ValueStore;

/// Forced assignments derived from a unique propagation corridor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensitization {
    /// Signals every route from the fault effect to an output passes through
    pub mandatory: Vec<SignalId>,
    /// Side inputs that must take their gate's non-controlling value
    pub forced: Vec<Assignment>,
}

/// Analyze the propagation routes of a singleton D-frontier
///
/// When a single frontier gate remains, every route to an output leaves
/// through it; the signals shared by all routes are mandatory and the side
/// inputs of their gates must not block them. With several frontier gates
/// the effect still has routing freedom and nothing is forced yet.
pub fn unique_sensitization(
    circuit: &Circuit,
    values: &ValueStore,
    frontier: &[FrontierGate],
) -> Option<Sensitization> {
    let [single] = frontier else {
        return None;
    };
    let start = circuit.gate(single.gate).output();
    let mandatory = circuit.mandatory_signals(start);
    if mandatory.is_empty() {
        return None;
    }

    let mut forced = Vec::new();
    for m in &mandatory {
        let Some(driver) = circuit.signal(*m).driver() else {
            continue;
        };
        let gate = circuit.gate(driver);
        let Some(nc) = gate.kind().non_controlling() else {
            continue;
        };
        for input in gate.inputs() {
            if mandatory.contains(input) || values.get(*input).is_faulty() {
                continue;
            }
            if values.is_unknown(*input) {
                forced.push(Assignment { signal: *input, value: nc });
            }
        }
    }
    Some(Sensitization { mandatory, forced })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{StuckAt, Value};
    use crate::fan::frontier::d_frontier;
    use crate::fan::implication::implicate;
    use crate::generators;

    #[test]
    fn test_single_corridor() {
        let c = generators::three_gate();
        let in1 = c.signal_by_name("in1").unwrap();
        let mut values = ValueStore::new(&c, in1, StuckAt::Zero);
        implicate(&c, &mut values, Assignment { signal: in1, value: Value::D }).unwrap();

        let frontier = d_frontier(&c, &values);
        let sens = unique_sensitization(&c, &values, &frontier).unwrap();
        let names: Vec<&str> = sens.mandatory.iter().map(|s| c.signal(*s).name()).collect();
        assert_eq!(names, vec!["mid1", "mid2", "out"]);

        let in2 = c.signal_by_name("in2").unwrap();
        let in3 = c.signal_by_name("in3").unwrap();
        assert_eq!(
            sens.forced,
            vec![
                Assignment { signal: in2, value: Value::One },
                Assignment { signal: in3, value: Value::Zero },
            ]
        );
    }

    #[test]
    fn test_deferred_on_multiple_gates() {
        let c = generators::fan_test();
        let n1 = c.signal_by_name("n1").unwrap();
        let mut values = ValueStore::new(&c, n1, StuckAt::One);
        implicate(&c, &mut values, Assignment { signal: n1, value: Value::DBar }).unwrap();

        let frontier = d_frontier(&c, &values);
        assert!(frontier.len() > 1);
        assert_eq!(unique_sensitization(&c, &values, &frontier), None);
    }

    #[test]
    fn test_stem_fault_with_single_gate() {
        let c = generators::fan_test();
        let n4 = c.signal_by_name("n4").unwrap();
        let n3 = c.signal_by_name("n3").unwrap();
        let mut values = ValueStore::new(&c, n4, StuckAt::Zero);
        implicate(&c, &mut values, Assignment { signal: n4, value: Value::D }).unwrap();

        let frontier = d_frontier(&c, &values);
        assert_eq!(frontier.len(), 1);
        let sens = unique_sensitization(&c, &values, &frontier).unwrap();
        let names: Vec<&str> = sens.mandatory.iter().map(|s| c.signal(*s).name()).collect();
        assert_eq!(names, vec!["n5", "out1"]);
        assert_eq!(sens.forced, vec![Assignment { signal: n3, value: Value::One }]);
    }
}
