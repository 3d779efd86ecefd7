use std::collections::VecDeque;

use crate::circuit::{Circuit, Gate, GateKind, SignalId, Value};

/// A value objective pushed back toward head lines
///
/// The zero/one counters accumulate how often each polarity is requested
/// when several objectives meet on the same line; the decided value is the
/// majority, ties going to 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    /// The signal the objective targets
    pub signal: SignalId,
    /// How many requests want a 0 here
    pub n_zero: u32,
    /// How many requests want a 1 here
    pub n_one: u32,
    /// Ordering priority, larger first
    pub priority: i32,
}

impl Objective {
    /// Build an objective asking for `value` once
    pub fn new(signal: SignalId, value: Value, priority: i32) -> Objective {
        let (n_zero, n_one) = match value {
            Value::One => (0, 1),
            _ => (1, 0),
        };
        Objective {
            signal,
            n_zero,
            n_one,
            priority,
        }
    }

    /// The majority value; a tie resolves to 0
    pub fn value(&self) -> Value {
        if self.n_one > self.n_zero {
            Value::One
        } else {
            Value::Zero
        }
    }
}

/// The gate input that is cheapest to steer to a controlling value
///
/// Orders by the controllability estimate, then by the number of reachable
/// stems, then by index, so the choice is a deterministic total order. With
/// `dynamic` disabled the declaration order of the inputs decides instead.
pub(crate) fn easiest_input(circuit: &Circuit, gate: &Gate, dynamic: bool) -> SignalId {
    if !dynamic {
        return gate.inputs()[0];
    }
    gate.inputs()
        .iter()
        .copied()
        .min_by_key(|s| {
            (
                circuit.signal(*s).controllability(),
                circuit.reachable_stems(*s),
                *s,
            )
        })
        .unwrap_or(gate.output())
}

/// Push `initial` objectives back to head lines and primary inputs
///
/// A non-controlling target needs every input of the driving gate, so the
/// objective fans out; a controlling target is satisfied by one input and
/// descends into the cheapest. Head lines stop the descent: their value can
/// be justified later inside their fanout-free cone. Objectives landing on
/// the same line merge their counters. The result is ordered by priority,
/// then controllability, then index.
pub fn multiple_backtrace(
    circuit: &Circuit,
    initial: Vec<Objective>,
    dynamic: bool,
) -> Vec<Objective> {
    let mut finals: Vec<Objective> = Vec::new();
    let mut processed = vec![false; circuit.nb_signals()];
    let mut queue: VecDeque<Objective> = initial.into();

    while let Some(obj) = queue.pop_front() {
        let sig = circuit.signal(obj.signal);
        if sig.is_head() || sig.driver().is_none() {
            merge(&mut finals, obj);
            continue;
        }
        if processed[obj.signal.index()] {
            continue;
        }
        processed[obj.signal.index()] = true;

        let gate = match sig.driver() {
            Some(d) => circuit.gate(d),
            None => continue,
        };
        match gate.kind() {
            GateKind::Not => {
                queue.push_back(Objective {
                    signal: gate.inputs()[0],
                    n_zero: obj.n_one,
                    n_one: obj.n_zero,
                    priority: obj.priority,
                });
            }
            GateKind::And => {
                descend(circuit, gate, &obj, obj.n_one, obj.n_zero, dynamic, &mut queue);
            }
            GateKind::Or => {
                descend(circuit, gate, &obj, obj.n_zero, obj.n_one, dynamic, &mut queue);
            }
        }
    }

    finals.sort_by_key(|o| {
        (
            -o.priority,
            circuit.signal(o.signal).controllability(),
            o.signal,
        )
    });
    finals
}

/// Shared And/Or descent
///
/// `n_all` counts requests for the non-controlling output, which every
/// input must support; `n_any` counts requests for the controlled output,
/// which the cheapest input alone can produce. For And these are the one
/// and zero counters; for Or the roles swap.
fn descend(
    circuit: &Circuit,
    gate: &Gate,
    obj: &Objective,
    n_all: u32,
    n_any: u32,
    dynamic: bool,
    queue: &mut VecDeque<Objective>,
) {
    let nc = gate.kind().non_controlling().unwrap_or(Value::X);
    if n_all > 0 {
        for input in gate.inputs() {
            queue.push_back(count_objective(*input, nc, n_all, obj.priority));
        }
    }
    if n_any > 0 {
        let input = easiest_input(circuit, gate, dynamic);
        queue.push_back(count_objective(input, !nc, n_any, obj.priority));
    }
}

fn count_objective(signal: SignalId, value: Value, count: u32, priority: i32) -> Objective {
    let (n_zero, n_one) = match value {
        Value::One => (0, count),
        _ => (count, 0),
    };
    Objective {
        signal,
        n_zero,
        n_one,
        priority,
    }
}

fn merge(finals: &mut Vec<Objective>, obj: Objective) {
    if let Some(existing) = finals.iter_mut().find(|o| o.signal == obj.signal) {
        existing.n_zero += obj.n_zero;
        existing.n_one += obj.n_one;
        existing.priority = existing.priority.max(obj.priority);
    } else {
        finals.push(obj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;

    #[test]
    fn test_and_fans_out_for_one() {
        let c = generators::three_gate();
        let mid1 = c.signal_by_name("mid1").unwrap();
        let in1 = c.signal_by_name("in1").unwrap();
        let in2 = c.signal_by_name("in2").unwrap();

        let finals =
            multiple_backtrace(&c, vec![Objective::new(mid1, Value::One, 0)], true);
        // Both And inputs are required at 1
        assert_eq!(finals.len(), 2);
        for f in &finals {
            assert!(f.signal == in1 || f.signal == in2);
            assert_eq!(f.value(), Value::One);
        }
    }

    #[test]
    fn test_and_picks_one_input_for_zero() {
        let c = generators::three_gate();
        let mid1 = c.signal_by_name("mid1").unwrap();
        let in1 = c.signal_by_name("in1").unwrap();

        let finals =
            multiple_backtrace(&c, vec![Objective::new(mid1, Value::Zero, 0)], true);
        // One controlling input suffices; the tie on controllability breaks
        // toward the lowest index
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].signal, in1);
        assert_eq!(finals[0].value(), Value::Zero);
    }

    #[test]
    fn test_not_swaps_counts() {
        let c = generators::three_gate();
        let out = c.signal_by_name("out").unwrap();
        let in3 = c.signal_by_name("in3").unwrap();
        let mid1 = c.signal_by_name("mid1").unwrap();

        // out = 1 needs mid2 = 0, which needs both Or inputs at 0; the
        // mid1 = 0 branch descends further into the And
        let finals = multiple_backtrace(&c, vec![Objective::new(out, Value::One, 0)], true);
        assert_eq!(finals.len(), 2);
        for f in &finals {
            assert_eq!(f.value(), Value::Zero);
        }
        assert!(finals.iter().any(|f| f.signal == in3));
        // mid1 = 0 descends further into the And
        assert!(finals.iter().all(|f| f.signal != mid1));
    }

    #[test]
    fn test_head_lines_stop_descent() {
        let c = generators::fan_test();
        let n3 = c.signal_by_name("n3").unwrap();
        let in4 = c.signal_by_name("in4").unwrap();

        let finals = multiple_backtrace(&c, vec![Objective::new(n3, Value::Zero, 0)], true);
        // in4 is a head line and the cheapest way to zero the And
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].signal, in4);
        assert_eq!(finals[0].value(), Value::Zero);
    }

    #[test]
    fn test_merge_majority() {
        let c = generators::fan_test();
        let in1 = c.signal_by_name("in1").unwrap();
        let initial = vec![
            Objective::new(in1, Value::One, 0),
            Objective::new(in1, Value::Zero, 0),
            Objective::new(in1, Value::One, 3),
        ];
        let finals = multiple_backtrace(&c, initial, true);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].n_one, 2);
        assert_eq!(finals[0].n_zero, 1);
        assert_eq!(finals[0].value(), Value::One);
        assert_eq!(finals[0].priority, 3);
    }

    #[test]
    fn test_tie_resolves_to_zero() {
        let c = generators::fan_test();
        let in1 = c.signal_by_name("in1").unwrap();
        let initial = vec![
            Objective::new(in1, Value::One, 0),
            Objective::new(in1, Value::Zero, 0),
        ];
        let finals = multiple_backtrace(&c, initial, true);
        assert_eq!(finals[0].value(), Value::Zero);
    }

    #[test]
    fn test_priority_orders_first() {
        let c = generators::fan_test();
        let in1 = c.signal_by_name("in1").unwrap();
        let in2 = c.signal_by_name("in2").unwrap();
        let initial = vec![
            Objective::new(in1, Value::One, 0),
            Objective::new(in2, Value::One, 10),
        ];
        let finals = multiple_backtrace(&c, initial, true);
        assert_eq!(finals[0].signal, in2);
        assert_eq!(finals[1].signal, in1);
    }
}
