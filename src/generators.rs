//! Sample circuits for tests and the command line

use crate::circuit::{Circuit, GateKind};

/// The ISCAS-85 C17 benchmark, rendered with And gates
///
/// Signals carry the benchmark's numeric names: inputs 1 to 5, outputs 10
/// and 11. Input 3 and the internal lines 7 and 8 are fanout stems.
pub fn c17() -> Circuit {
    let mut c = Circuit::new();
    let in1 = c.add_signal("1");
    let in2 = c.add_signal("2");
    let in3 = c.add_signal("3");
    let in4 = c.add_signal("4");
    let in5 = c.add_signal("5");
    let n6 = c.add_signal("6");
    let n7 = c.add_signal("7");
    let n8 = c.add_signal("8");
    let n9 = c.add_signal("9");
    let out10 = c.add_signal("10");
    let out11 = c.add_signal("11");
    for i in [in1, in2, in3, in4, in5] {
        c.add_input(i);
    }
    c.add_output(out10);
    c.add_output(out11);

    c.add_gate("g1", GateKind::And, vec![in1, in2], n6);
    c.add_gate("g2", GateKind::And, vec![in3, in4], n7);
    c.add_gate("g3", GateKind::And, vec![n6, in3], n8);
    c.add_gate("g4", GateKind::And, vec![n7, in5], n9);
    c.add_gate("g5", GateKind::And, vec![n8, n7], out10);
    c.add_gate("g6", GateKind::And, vec![n9, n8], out11);

    finish(c)
}

/// An And feeding an Or feeding an inverter, with no fanout at all
pub fn three_gate() -> Circuit {
    let mut c = Circuit::new();
    let in1 = c.add_signal("in1");
    let in2 = c.add_signal("in2");
    let in3 = c.add_signal("in3");
    let mid1 = c.add_signal("mid1");
    let mid2 = c.add_signal("mid2");
    let out = c.add_signal("out");
    for i in [in1, in2, in3] {
        c.add_input(i);
    }
    c.add_output(out);

    c.add_gate("g1", GateKind::And, vec![in1, in2], mid1);
    c.add_gate("g2", GateKind::Or, vec![in3, mid1], mid2);
    c.add_gate("g3", GateKind::Not, vec![mid2], out);

    finish(c)
}

/// A reconvergent circuit with the stems n1 and n3
///
/// Every primary input is a head line; faults on the stems see several
/// frontier gates at once, faults on n4 a single one.
pub fn fan_test() -> Circuit {
    let mut c = Circuit::new();
    let in1 = c.add_signal("in1");
    let in2 = c.add_signal("in2");
    let in3 = c.add_signal("in3");
    let in4 = c.add_signal("in4");
    let n1 = c.add_signal("n1");
    let n2 = c.add_signal("n2");
    let n3 = c.add_signal("n3");
    let n4 = c.add_signal("n4");
    let n5 = c.add_signal("n5");
    let out1 = c.add_signal("out1");
    let out2 = c.add_signal("out2");
    for i in [in1, in2, in3, in4] {
        c.add_input(i);
    }
    c.add_output(out1);
    c.add_output(out2);

    c.add_gate("g1", GateKind::And, vec![in1, in2], n1);
    c.add_gate("g2", GateKind::Or, vec![n1, in3], n2);
    c.add_gate("g3", GateKind::And, vec![n2, in4], n3);
    c.add_gate("g4", GateKind::Or, vec![n3, n1], n4);
    c.add_gate("g5", GateKind::And, vec![n3, n4], n5);
    c.add_gate("g6", GateKind::Not, vec![n5], out1);
    c.add_gate("g7", GateKind::Or, vec![n1, n3], out2);

    finish(c)
}

/// A circuit whose input b is untestable
///
/// The output needs !a to pass anything through, but b only matters when
/// a = 1; the reconvergence of a blocks every propagation path, so both
/// stuck-at faults on b are redundant.
pub fn redundant() -> Circuit {
    let mut c = Circuit::new();
    let a = c.add_signal("a");
    let b = c.add_signal("b");
    let n2 = c.add_signal("n2");
    let n3 = c.add_signal("n3");
    let out = c.add_signal("out");
    c.add_input(a);
    c.add_input(b);
    c.add_output(out);

    c.add_gate("g1", GateKind::And, vec![a, b], n2);
    c.add_gate("g2", GateKind::Not, vec![a], n3);
    c.add_gate("g3", GateKind::And, vec![n2, n3], out);

    finish(c)
}

/// Sample circuits by name, for the command line
pub fn by_name(name: &str) -> Option<Circuit> {
    match name {
        "c17" => Some(c17()),
        "three-gate" => Some(three_gate()),
        "fan-test" => Some(fan_test()),
        "redundant" => Some(redundant()),
        _ => None,
    }
}

/// Names accepted by [`by_name`]
pub const NAMES: [&str; 4] = ["c17", "three-gate", "fan-test", "redundant"];

fn finish(mut c: Circuit) -> Circuit {
    c.identify_head_lines();
    c.init_controllability();
    c.check();
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c17_structure() {
        let c = c17();
        assert_eq!(c.nb_inputs(), 5);
        assert_eq!(c.nb_outputs(), 2);
        assert_eq!(c.nb_gates(), 6);
        assert_eq!(c.nb_signals(), 11);
        assert_eq!(c.validate(), Ok(()));
        let stem = c.signal_by_name("3").unwrap();
        assert!(c.signal(stem).is_stem());
    }

    #[test]
    fn test_three_gate_structure() {
        let c = three_gate();
        assert_eq!(c.nb_gates(), 3);
        assert_eq!(c.validate(), Ok(()));
        assert!(c.head_lines().is_empty());
    }

    #[test]
    fn test_fan_test_structure() {
        let c = fan_test();
        assert_eq!(c.nb_gates(), 7);
        assert_eq!(c.validate(), Ok(()));
        let n1 = c.signal_by_name("n1").unwrap();
        let n3 = c.signal_by_name("n3").unwrap();
        assert!(c.signal(n1).is_stem());
        assert!(c.signal(n3).is_stem());
        assert_eq!(c.head_lines().len(), 4);
    }

    #[test]
    fn test_redundant_structure() {
        let c = redundant();
        assert_eq!(c.validate(), Ok(()));
        // a reconverges at the output gate
        let a = c.signal_by_name("a").unwrap();
        assert!(c.signal(a).is_stem());
    }

    #[test]
    fn test_by_name() {
        for name in NAMES {
            assert!(by_name(name).is_some(), "{name} should build");
        }
        assert!(by_name("unknown").is_none());
    }
}
