use std::collections::VecDeque;

use log::debug;

use crate::circuit::{Circuit, GateId, GateKind, SignalId, Value};
use crate::fan::values::{Conflict, ValueStore};

/// One decided or derived value assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// The signal being assigned
    pub signal: SignalId,
    /// The value assigned to it
    pub value: Value,
}

/// Evaluate a gate over the current values of its inputs
pub(crate) fn eval_gate(circuit: &Circuit, values: &ValueStore, g: GateId) -> Value {
    let gate = circuit.gate(g);
    gate.kind().eval(gate.inputs().iter().map(|s| values.get(*s)))
}

/// Propagate the consequences of `seed` until a fixed point
///
/// Signals are pulled from a worklist; each one is propagated forward by
/// re-evaluating its consuming gates and backward through its driving gate.
/// The per-invocation processed set bounds the work to one pass per signal.
/// Returns the ordered list of value changes, or the conflict that makes
/// the current assignments inconsistent.
pub(crate) fn implicate(
    circuit: &Circuit,
    values: &mut ValueStore,
    seed: Assignment,
) -> Result<Vec<Assignment>, Conflict> {
    let mut implications = Vec::new();
    let mut processed = vec![false; circuit.nb_signals()];
    let mut queue = VecDeque::new();

    if values.assign(seed.signal, seed.value)? {
        implications.push(seed);
    }
    queue.push_back(seed.signal);

    while let Some(s) = queue.pop_front() {
        if processed[s.index()] {
            continue;
        }
        processed[s.index()] = true;
        if let Err(c) = forward(circuit, values, s, &mut queue, &mut implications) {
            debug!(
                "implication conflict on {}: {} vs {}",
                circuit.signal(c.signal).name(),
                c.old,
                c.new
            );
            return Err(c);
        }
        if let Err(c) = backward(circuit, values, s, &mut queue, &mut implications) {
            debug!(
                "implication conflict on {}: {} vs {}",
                circuit.signal(c.signal).name(),
                c.old,
                c.new
            );
            return Err(c);
        }
    }
    Ok(implications)
}

/// Re-evaluate the gates consuming `s` and push refined outputs
fn forward(
    circuit: &Circuit,
    values: &mut ValueStore,
    s: SignalId,
    queue: &mut VecDeque<SignalId>,
    implications: &mut Vec<Assignment>,
) -> Result<(), Conflict> {
    for g in circuit.signal(s).fanouts() {
        let out = circuit.gate(*g).output();
        let new = eval_gate(circuit, values, *g);
        if new == Value::X || new == values.get(out) {
            continue;
        }
        if values.assign(out, new)? {
            implications.push(Assignment { signal: out, value: new });
        }
        queue.push_back(out);
    }
    Ok(())
}

/// Derive input constraints from the value of `s` through its driving gate
///
/// Only 0 and 1 outputs constrain And/Or inputs; a D or D' output is
/// consistent with several input combinations and implies nothing. At the
/// fault site the driving gate sees the good-circuit value: the fault
/// effect is the site's own, not the gate's.
fn backward(
    circuit: &Circuit,
    values: &mut ValueStore,
    s: SignalId,
    queue: &mut VecDeque<SignalId>,
    implications: &mut Vec<Assignment>,
) -> Result<(), Conflict> {
    let Some(g) = circuit.signal(s).driver() else {
        return Ok(());
    };
    let out_val = if s == values.fault_site() {
        match values.get(s).good() {
            Some(b) => Value::from(b),
            None => Value::X,
        }
    } else {
        values.get(s)
    };
    let gate = circuit.gate(g);
    match gate.kind() {
        GateKind::Not => {
            let implied = !out_val;
            if implied == Value::X {
                return Ok(());
            }
            let input = gate.inputs()[0];
            if values.is_unknown(input) {
                push(values, input, implied, queue, implications)?;
            }
        }
        GateKind::And => {
            backward_controlled(circuit, values, g, out_val, Value::One, queue, implications)?;
        }
        GateKind::Or => {
            backward_controlled(circuit, values, g, out_val, Value::Zero, queue, implications)?;
        }
    }
    Ok(())
}

/// Backward rules shared by And and Or
///
/// `nc` is the gate's non-controlling value. An output at `nc` forces every
/// unknown input to `nc`; an output at the controlling value with all
/// other inputs at `nc` forces the last unknown input.
fn backward_controlled(
    circuit: &Circuit,
    values: &mut ValueStore,
    g: GateId,
    out_val: Value,
    nc: Value,
    queue: &mut VecDeque<SignalId>,
    implications: &mut Vec<Assignment>,
) -> Result<(), Conflict> {
    let gate = circuit.gate(g);
    if out_val == nc {
        for input in gate.inputs() {
            if values.is_unknown(*input) {
                push(values, *input, nc, queue, implications)?;
            }
        }
    } else if out_val == !nc {
        let unknown: Vec<SignalId> = gate
            .inputs()
            .iter()
            .filter(|i| values.is_unknown(**i))
            .copied()
            .collect();
        let settled = gate
            .inputs()
            .iter()
            .filter(|i| values.get(**i) == nc)
            .count();
        if unknown.len() == 1 && settled == gate.inputs().len() - 1 {
            push(values, unknown[0], !nc, queue, implications)?;
        }
    }
    Ok(())
}

fn push(
    values: &mut ValueStore,
    s: SignalId,
    v: Value,
    queue: &mut VecDeque<SignalId>,
    implications: &mut Vec<Assignment>,
) -> Result<(), Conflict> {
    if values.assign(s, v)? {
        implications.push(Assignment { signal: s, value: v });
    }
    queue.push_back(s);
    Ok(())
}
