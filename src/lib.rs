//! A CDCL SAT solver with a live control and introspection socket.
//!
//! The [`sat`] module holds the solver: literals, clauses, the trail,
//! watched-literal propagation, first-UIP clause learning and the
//! VSIDS-with-precedence variable order. The [`tether`] module is the
//! control channel: a Unix-socket service that lets external processes
//! observe the solver at conflicts and inject branching hints, precedence
//! weights, forced restarts and dynamically compiled NAND-gate definitions
//! while the search runs.

/// The `sat` module implements the solver itself and the narrow interface
/// the control channel drives it through.
pub mod sat;

/// The `tether` module implements the live control channel.
pub mod tether;

/// The `command_line` module implements the binary's interface.
pub mod command_line;
