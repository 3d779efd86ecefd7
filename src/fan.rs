//! The FAN search engine: implication, D-frontier, sensitization,
//! multiple backtrace and the decision loop

mod backtrace;
mod driver;
mod frontier;
mod implication;
mod sensitization;
mod values;

pub use backtrace::{multiple_backtrace, Objective};
pub use driver::{fan, fan_with_config, Config, Decision, SearchError, Stats, TestResult};
pub use frontier::{best_gate, d_frontier, FrontierGate};
pub use implication::Assignment;
pub use sensitization::{unique_sensitization, Sensitization};
pub use values::ValueStore;
