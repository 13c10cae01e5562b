//! # Deferred Results
//!
//! Converts a backend task's outcome into something a callback-only host can
//! observe. A bridged call hands the caller a [`Deferred`] immediately and
//! runs its work on a separate task; when the work finishes, the paired
//! [`Completion`] settles the deferred with either a success value or a
//! textual [`Rejection`].
//!
//! The original callback style makes "exactly one of resolve/reject, exactly
//! once" easy to violate. Here the completion is a value consumed by
//! `resolve`/`reject`, so double completion is a compile error, and a task
//! that dies without settling drops its sender, which the waiting side
//! observes as a rejection rather than a hang. An unresolved deferred is
//! impossible by construction.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::oneshot;

use crate::task;

/// A human-readable failure message carried by a rejected operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection(String);

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<caskrepo::repo::Error> for Rejection {
    fn from(e: caskrepo::repo::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<caskrepo::transport::Error> for Rejection {
    fn from(e: caskrepo::transport::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<crate::registry::Error> for Rejection {
    fn from(e: crate::registry::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<crate::download::Error> for Rejection {
    fn from(e: crate::download::Error) -> Self {
        Self(e.to_string())
    }
}

/// The producing half: settles the paired [`Deferred`] exactly once.
pub struct Completion<T> {
    tx: oneshot::Sender<Result<T, Rejection>>,
}

impl<T> Completion<T> {
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, why: impl Into<Rejection>) {
        let _ = self.tx.send(Err(why.into()));
    }
}

/// The consuming half: a placeholder for a value produced asynchronously.
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T, Rejection>>,
}

impl<T> Deferred<T> {
    /// Waits for the operation to settle.
    ///
    /// If the producing task terminated without settling (panic on a
    /// non-unwinding platform, runtime shutdown), this yields a rejection.
    pub async fn wait(self) -> Result<T, Rejection> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Rejection::new("operation abandoned before completion")),
        }
    }
}

/// Creates a linked completion/deferred pair.
pub fn deferred<T>() -> (Completion<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, Deferred { rx })
}

/// Runs `work` on a backend task and returns a deferred for its outcome.
///
/// The caller gets the deferred back immediately; the host thread is never
/// blocked. Errors and (where the platform unwinds) panics inside `work`
/// both settle the deferred as rejections.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_bridged<T, F>(work: F) -> Deferred<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, Rejection>> + Send + 'static,
{
    let (completion, deferred) = deferred();
    task::spawn(drive(work, completion));
    deferred
}

#[cfg(target_arch = "wasm32")]
pub fn spawn_bridged<T, F>(work: F) -> Deferred<T>
where
    T: 'static,
    F: Future<Output = Result<T, Rejection>> + 'static,
{
    let (completion, deferred) = deferred();
    task::spawn(drive(work, completion));
    deferred
}

async fn drive<T>(work: impl Future<Output = Result<T, Rejection>>, completion: Completion<T>) {
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(value)) => completion.resolve(value),
        Ok(Err(rejection)) => completion.reject(rejection),
        Err(payload) => completion.reject(panic_message(payload)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> Rejection {
    if let Some(text) = payload.downcast_ref::<&str>() {
        Rejection::new(format!("backend task panicked: {}", text))
    } else if let Some(text) = payload.downcast_ref::<String>() {
        Rejection::new(format!("backend task panicked: {}", text))
    } else {
        Rejection::new("backend task panicked")
    }
}
