//! Test pattern generation for stuck-at faults in combinational logic
//!
//! This crate implements the FAN algorithm: given a gate-level circuit over
//! And, Or and Not gates and a single stuck-at fault, it searches for an
//! input assignment whose fault-free and faulty responses differ at some
//! primary output, or proves that no such pattern exists.
//!
//! The search runs a five-valued simulation where `D` stands for a signal
//! at 1 in the good circuit and 0 in the faulty one. Implications are
//! propagated in both directions after every assignment, the D-frontier
//! tracks where the fault effect can still move, and multiple backtrace
//! turns propagation objectives into assignments at head lines, the
//! boundary of the fanout-free input cones. Conflicts backtrack
//! chronologically, trying the complement of the newest decision first.
//!
//! ```
//! use stuckat::generators;
//! use stuckat::{fan, StuckAt};
//!
//! let circuit = generators::c17();
//! let site = circuit.signal_by_name("1").unwrap();
//! let result = fan(&circuit, site, StuckAt::Zero);
//! assert!(result.success);
//! ```
//!
//! Circuits are built through [`Circuit`] and frozen before the search;
//! see [`generators`] for ready-made examples. The `stuckat` binary wraps
//! the library for quick experiments on those circuits.

#![warn(missing_docs)]

pub mod circuit;
pub mod cmd;
pub mod fan;
pub mod generators;
pub mod sim;

pub use circuit::{Circuit, Gate, GateId, GateKind, ModelError, Signal, SignalId, StuckAt, Value};
pub use fan::{fan, fan_with_config, Config, SearchError, TestResult};
