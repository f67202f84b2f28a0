#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A live control and introspection channel for a running solver.
//!
//! Clients connect over a Unix socket and send one directive document;
//! the solver applies it at its next decision point and answers with a
//! state snapshot at its next conflict, after which the connection is
//! closed. Two timelines meet here: the accept thread's asynchronous
//! stream of requests, and the solver thread's checkpoints
//! ([`Tether::on_decision_point`] and [`Tether::on_conflict`]), which are
//! plain synchronous calls from the search loop.

pub mod definition;
pub mod error;
pub mod instruction;
pub mod snapshot;

mod connection;
#[cfg(test)]
pub(crate) mod mock;

use crate::sat::cnf::ClauseRef;
use crate::sat::literal::Literal;
use crate::sat::solver::SolverControl;
use crate::tether::connection::ConnectionManager;
use crate::tether::error::TetherError;
use crate::tether::snapshot::Snapshot;
use log::{debug, warn};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// Bound on how long one unresponsive client can hold the solver thread
/// while a snapshot is sent.
const SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// The channel endpoint held by the solver thread.
///
/// Connections move `received` (request read, directives not yet applied)
/// to `ready` (directives applied, awaiting the next conflict snapshot) to
/// closed. The `ready` set only grows between conflicts and is fully
/// drained at each one.
pub struct Tether {
    manager: ConnectionManager,
    ready: Vec<UnixStream>,
}

impl Tether {
    /// Binds the control socket and starts accepting clients.
    ///
    /// # Errors
    /// Fails with [`TetherError::Bind`] when the address is unusable; the
    /// solver can keep running without live control.
    pub fn start<P: AsRef<Path>>(path: P) -> Result<Self, TetherError> {
        Ok(Self {
            manager: ConnectionManager::start(path.as_ref())?,
            ready: Vec::new(),
        })
    }

    /// The decision-time checkpoint. Drains connections whose requests
    /// have been read, applies their directives in arrival order and
    /// promotes each to the ready set. Returns whether any directive asked
    /// for a restart; triggering it is the caller's job.
    pub fn on_decision_point<S: SolverControl>(&mut self, solver: &mut S) -> bool {
        let mut restart = false;

        for pending in self.manager.drain_received() {
            if let Some(instructions) = &pending.instructions {
                restart |= instructions.apply(solver);
            }
            self.ready.push(pending.stream);
        }

        restart
    }

    /// The conflict-time checkpoint. Sends one identical snapshot to every
    /// ready connection and closes them. Costs a length check when no
    /// clients are waiting.
    pub fn on_conflict<S: SolverControl>(
        &mut self,
        solver: &S,
        confl: ClauseRef,
        learnt: &[Literal],
    ) {
        if self.ready.is_empty() {
            return;
        }

        let snapshot = Snapshot::capture(solver, confl, learnt);
        let payload = match serde_json::to_vec(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("snapshot serialization failed, closing clients unanswered: {e}");
                self.ready.clear();
                return;
            }
        };

        debug!("answering {} client(s) at conflict", self.ready.len());
        for mut stream in self.ready.drain(..) {
            let send = stream
                .set_write_timeout(Some(SEND_TIMEOUT))
                .and_then(|()| stream.write_all(&payload));
            if let Err(e) = send {
                warn!("client dropped while sending snapshot: {e}");
            }
        }
    }

    /// Connections applied but not yet answered.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Stops the accept thread, closes every connection in every lifecycle
    /// state without a response, and removes the socket file. Returns only
    /// after the accept thread has exited.
    pub fn shutdown(&mut self) {
        self.manager.shutdown();
        self.ready.clear();
    }
}
