use std::fmt;

use crate::circuit::signal::SignalId;
use crate::circuit::value::Value;

/// Stable index of a gate within its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateId(pub(crate) u32);

impl GateId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The primitive gate kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// N-input And gate
    And,
    /// N-input Or gate
    Or,
    /// Inverter
    Not,
}

impl GateKind {
    /// Input value that alone determines the output; `None` for Not
    pub fn controlling(self) -> Option<Value> {
        match self {
            GateKind::And => Some(Value::Zero),
            GateKind::Or => Some(Value::One),
            GateKind::Not => None,
        }
    }

    /// Input value that leaves the output to the other inputs; `None` for Not
    pub fn non_controlling(self) -> Option<Value> {
        match self {
            GateKind::And => Some(Value::One),
            GateKind::Or => Some(Value::Zero),
            GateKind::Not => None,
        }
    }

    /// Whether `v` alone determines the gate output
    ///
    /// D' counts as 0 and D as 1: either decides an And/Or on its own.
    pub fn is_controlling(self, v: Value) -> bool {
        match self {
            GateKind::And => matches!(v, Value::Zero | Value::DBar),
            GateKind::Or => matches!(v, Value::One | Value::D),
            GateKind::Not => false,
        }
    }

    /// Evaluate the gate over five-valued inputs
    ///
    /// A controlling input wins outright, then any unknown makes the result
    /// unknown. D and D' meeting at the same gate cancel to the controlled
    /// value: the good and faulty products are equal and the effect is lost.
    pub fn eval<I>(self, inputs: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        match self {
            GateKind::Not => {
                let v = inputs.into_iter().next().unwrap_or(Value::X);
                !v
            }
            GateKind::And => {
                let (mut has_x, mut has_d, mut has_dbar) = (false, false, false);
                for v in inputs {
                    match v {
                        Value::Zero => return Value::Zero,
                        Value::X => has_x = true,
                        Value::D => has_d = true,
                        Value::DBar => has_dbar = true,
                        Value::One => (),
                    }
                }
                if has_x {
                    Value::X
                } else if has_d && has_dbar {
                    Value::Zero
                } else if has_d {
                    Value::D
                } else if has_dbar {
                    Value::DBar
                } else {
                    Value::One
                }
            }
            GateKind::Or => {
                let (mut has_x, mut has_d, mut has_dbar) = (false, false, false);
                for v in inputs {
                    match v {
                        Value::One => return Value::One,
                        Value::X => has_x = true,
                        Value::D => has_d = true,
                        Value::DBar => has_dbar = true,
                        Value::Zero => (),
                    }
                }
                if has_x {
                    Value::X
                } else if has_d && has_dbar {
                    Value::One
                } else if has_d {
                    Value::D
                } else if has_dbar {
                    Value::DBar
                } else {
                    Value::Zero
                }
            }
        }
    }

    /// Controllability estimate for a gate with `fan_in` inputs
    ///
    /// Wider gates are harder to steer to both the controlled and the
    /// non-controlled output.
    pub fn controllability(self, fan_in: usize) -> u32 {
        match self {
            GateKind::And | GateKind::Or => 2 * fan_in as u32,
            GateKind::Not => 1,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKind::And => write!(f, "AND"),
            GateKind::Or => write!(f, "OR"),
            GateKind::Not => write!(f, "NOT"),
        }
    }
}

/// A logic gate with its ordered inputs and single output
#[derive(Debug, Clone)]
pub struct Gate {
    name: String,
    kind: GateKind,
    inputs: Vec<SignalId>,
    output: SignalId,
}

impl Gate {
    pub(crate) fn new(name: &str, kind: GateKind, inputs: Vec<SignalId>, output: SignalId) -> Gate {
        Gate {
            name: name.to_string(),
            kind,
            inputs,
            output,
        }
    }

    /// Name of the gate
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the gate
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Input signals, in declaration order
    pub fn inputs(&self) -> &[SignalId] {
        &self.inputs
    }

    /// The single output signal
    pub fn output(&self) -> SignalId {
        self.output
    }
}
