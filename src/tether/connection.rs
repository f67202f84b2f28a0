#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The accept thread and cross-thread connection bookkeeping.
//!
//! One dedicated thread owns the listening socket, reads one request body
//! per connection and publishes the decoded result into a shared queue.
//! The solver thread drains that queue at its own checkpoints; the mutex
//! around it is held only for enqueue and dequeue, never across a blocking
//! socket call.

use crate::tether::error::TetherError;
use crate::tether::instruction::Instructions;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often a parked read re-checks the stop flag.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A connection whose request has been read but whose directives have not
/// been applied yet. `instructions` is `None` when the body failed to
/// decode; such a connection still moves through the lifecycle and will
/// receive a snapshot, just with no directive effect.
pub(crate) struct Pending {
    pub stream: UnixStream,
    pub instructions: Option<Instructions>,
}

#[derive(Default)]
pub(crate) struct Shared {
    pub received: Vec<Pending>,
    pub stopping: bool,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the listening socket and the accept thread.
pub(crate) struct ConnectionManager {
    shared: Arc<Mutex<Shared>>,
    handle: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl ConnectionManager {
    /// Binds the socket, removing any stale artifact at the path first,
    /// and starts accepting.
    pub fn start(path: &Path) -> Result<Self, TetherError> {
        let _ = fs::remove_file(path);
        let listener = UnixListener::bind(path).map_err(|source| TetherError::Bind {
            path: path.to_path_buf(),
            source,
        })?;

        let shared = Arc::new(Mutex::new(Shared::default()));
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("tether-accept".into())
            .spawn(move || accept_loop(&listener, &thread_shared));
        let handle = match handle {
            Ok(handle) => handle,
            Err(source) => {
                let _ = fs::remove_file(path);
                return Err(TetherError::Io(source));
            }
        };

        info!("control channel listening on {}", path.display());
        Ok(Self {
            shared,
            handle: Some(handle),
            path: path.to_path_buf(),
        })
    }

    /// Takes every connection read since the last drain, in arrival order.
    pub fn drain_received(&self) -> Vec<Pending> {
        std::mem::take(&mut lock(&self.shared).received)
    }

    /// Stops the accept thread and waits for it to exit. The thread is
    /// unblocked by dialing our own address, which it observes together
    /// with the stop flag. Closes every tracked socket and removes the
    /// filesystem artifact.
    pub fn shutdown(&mut self) {
        lock(&self.shared).stopping = true;
        let _ = UnixStream::connect(&self.path);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("accept thread panicked during shutdown");
            }
        }
        let _ = fs::remove_file(&self.path);
        info!("control channel on {} shut down", self.path.display());
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn accept_loop(listener: &UnixListener, shared: &Arc<Mutex<Shared>>) {
    for stream in listener.incoming() {
        if lock(shared).stopping {
            break;
        }
        match stream {
            Ok(stream) => service(stream, shared),
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    // Dropping the queue closes every socket still tracked here.
    lock(shared).received.clear();
}

/// Reads one request from a fresh connection and publishes it. Connections
/// that close without sending anything are discarded untracked; a body
/// that fails to decode is tracked anyway so the client is not left
/// waiting on a reply that cannot come.
fn service(mut stream: UnixStream, shared: &Arc<Mutex<Shared>>) {
    match read_request(&mut stream, shared) {
        Ok(Some(body)) if body.is_empty() => debug!("client closed without a request"),
        Ok(Some(body)) => {
            let instructions = match Instructions::decode(&body) {
                Ok(instructions) => Some(instructions),
                Err(e) => {
                    warn!("connection kept, directives dropped: {e}");
                    None
                }
            };
            lock(shared).received.push(Pending {
                stream,
                instructions,
            });
        }
        Ok(None) => debug!("read abandoned, channel is stopping"),
        Err(e) => warn!("dropping connection after read error: {e}"),
    }
}

/// Reads until the zero-byte terminator or the peer's write-side close,
/// whichever comes first. The body may arrive in any number of chunks.
/// Returns `None` when shutdown interrupted the read.
fn read_request(
    stream: &mut UnixStream,
    shared: &Arc<Mutex<Shared>>,
) -> io::Result<Option<Vec<u8>>> {
    stream.set_read_timeout(Some(READ_POLL_INTERVAL))?;

    let mut body = Vec::new();
    let mut buf = [0_u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Some(end) = buf[..n].iter().position(|&b| b == 0) {
                    body.extend_from_slice(&buf[..end]);
                    break;
                }
                body.extend_from_slice(&buf[..n]);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                ) =>
            {
                if lock(shared).stopping {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e),
        }
    }

    stream.set_read_timeout(None)?;
    Ok(Some(body))
}
