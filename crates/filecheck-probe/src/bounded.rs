use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundedError {
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("could not start worker: {0}")]
    Spawn(String),

    #[error("worker exited without a result")]
    WorkerLost,
}

/// Runs `work` on a detached thread and waits at most `timeout` for it.
///
/// On timeout the worker is abandoned: it keeps running until its blocking
/// call returns, and its result is dropped with the channel.
pub fn run_bounded<T, F>(name: &str, timeout: Duration, work: F) -> Result<T, BoundedError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded::<T>(1);
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            let _ = tx.send(work());
        })
        .map_err(|err| BoundedError::Spawn(err.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(BoundedError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(BoundedError::WorkerLost),
    }
}
