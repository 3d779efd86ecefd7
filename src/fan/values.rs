use crate::circuit::{Circuit, SignalId, StuckAt, Value};

/// A value pair that no signal can hold at once
///
/// Conflicts never escape the search: they trigger a backtrack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict {
    pub signal: SignalId,
    pub old: Value,
    pub new: Value,
}

/// Per-run value state of a circuit under one injected fault
///
/// The circuit structure stays immutable and shared; one store holds the
/// five-valued state of a single search. The fault site always reads its
/// fault effect, whatever is written to it.
#[derive(Debug, Clone)]
pub struct ValueStore {
    values: Vec<Value>,
    site: SignalId,
    stuck: StuckAt,
}

impl ValueStore {
    /// Create the store for a run on `circuit`, injecting the fault
    pub fn new(circuit: &Circuit, site: SignalId, stuck: StuckAt) -> ValueStore {
        ValueStore {
            values: vec![Value::X; circuit.nb_signals()],
            site,
            stuck,
        }
    }

    /// Location of the injected fault
    pub fn fault_site(&self) -> SignalId {
        self.site
    }

    /// Polarity of the injected fault
    pub fn fault(&self) -> StuckAt {
        self.stuck
    }

    /// Current value of `s`; the fault site always reads D or D'
    pub fn get(&self, s: SignalId) -> Value {
        if s == self.site {
            self.stuck.effect()
        } else {
            self.values[s.index()]
        }
    }

    /// Returns true if `s` is still unassigned
    pub fn is_unknown(&self, s: SignalId) -> bool {
        self.get(s) == Value::X
    }

    /// Try to assign `v` to `s`; returns whether the stored value changed
    ///
    /// The assignment is refused when it is incompatible with the current
    /// value. Writes to the fault site never change the observed value but
    /// still go through the compatibility check.
    pub(crate) fn assign(&mut self, s: SignalId, v: Value) -> Result<bool, Conflict> {
        let old = self.get(s);
        if !old.compatible_with(v) {
            return Err(Conflict { signal: s, old, new: v });
        }
        if s == self.site || v == old || v == Value::X {
            return Ok(false);
        }
        self.values[s.index()] = v;
        Ok(true)
    }

    /// Reset every signal to X; the fault stays injected
    pub fn reset(&mut self) {
        self.values.fill(Value::X);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;

    fn two_signal_circuit() -> (Circuit, SignalId, SignalId) {
        let mut c = Circuit::new();
        let a = c.add_signal("a");
        let out = c.add_signal("out");
        c.add_input(a);
        c.add_output(out);
        c.add_gate("g", GateKind::Not, vec![a], out);
        (c, a, out)
    }

    #[test]
    fn test_fault_site_is_pinned() {
        let (c, a, out) = two_signal_circuit();
        let mut values = ValueStore::new(&c, a, StuckAt::Zero);
        assert_eq!(values.get(a), Value::D);
        assert_eq!(values.get(out), Value::X);
        // A compatible write leaves the effect in place
        assert_eq!(values.assign(a, Value::One), Ok(false));
        assert_eq!(values.get(a), Value::D);
        // An incompatible write is a conflict
        assert!(values.assign(a, Value::Zero).is_err());
    }

    #[test]
    fn test_assign_and_reset() {
        let (c, a, out) = two_signal_circuit();
        let mut values = ValueStore::new(&c, out, StuckAt::One);
        assert_eq!(values.assign(a, Value::One), Ok(true));
        assert_eq!(values.assign(a, Value::One), Ok(false));
        assert_eq!(values.assign(a, Value::D), Ok(true));
        assert!(values.assign(a, Value::Zero).is_err());
        values.reset();
        assert_eq!(values.get(a), Value::X);
        assert_eq!(values.get(out), Value::DBar);
    }
}
