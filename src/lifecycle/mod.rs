//! Cooperative shutdown
//!
//! One [`Lifecycle`] is shared (by clone) between the main sequence and the
//! signal-listener thread. Shutdown:
//! - runs at most once; later calls are no-ops
//! - shuts down the active session's socket, which unblocks whatever read or
//!   write the main thread is parked in
//! - sets the flag the submission and polling loops check between operations
//! - wakes any interruptible wait
//!
//! The flag and the active-session slot are guarded by one mutex, so a
//! session registered concurrently with shutdown is either closed by the
//! shutdown or refused by [`Lifecycle::register`].

mod signal;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::observability::{log_event, Event, Logger, Severity};
use crate::transport::{Session, SessionHandle, TransportError};

/// Failures of lifecycle bookkeeping
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("shutdown in progress")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Default)]
struct State {
    shut_down: bool,
    active: Option<SessionHandle>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    /// Mirrors `state.shut_down` for lock-free polling
    flag: AtomicBool,
    wake: Condvar,
    logger: Logger,
}

/// Shared shutdown coordinator
#[derive(Debug, Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    pub fn new(logger: Logger) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                flag: AtomicBool::new(false),
                wake: Condvar::new(),
                logger,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Whether shutdown has happened
    pub fn is_shutdown(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Makes `session` the one shutdown will close.
    ///
    /// If shutdown already happened the session is closed here and
    /// `Cancelled` is returned.
    pub fn register(&self, session: &mut Session) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        if state.shut_down {
            drop(state);
            session.close();
            return Err(LifecycleError::Cancelled);
        }
        state.active = Some(session.handle()?);
        Ok(())
    }

    /// Forgets the active session once its owner closed it.
    ///
    /// A handle belonging to a different session is left in place.
    pub fn clear(&self, session_id: Uuid) {
        let mut state = self.lock();
        if state
            .active
            .as_ref()
            .map_or(false, |h| h.session_id() == session_id)
        {
            state.active = None;
        }
    }

    /// Id of the session shutdown would close, if any
    pub fn active_session(&self) -> Option<Uuid> {
        self.lock().active.as_ref().map(SessionHandle::session_id)
    }

    /// Performs shutdown. Returns `false` if it had already been performed.
    pub fn shutdown(&self) -> bool {
        let active = {
            let mut state = self.lock();
            if state.shut_down {
                return false;
            }
            state.shut_down = true;
            self.inner.flag.store(true, Ordering::SeqCst);
            state.active.take()
        };

        let logger = &self.inner.logger;
        match active {
            Some(handle) => {
                let session_id = handle.session_id().to_string();
                match handle.shutdown() {
                    Ok(()) => log_event(
                        logger,
                        Severity::Info,
                        Event::Shutdown,
                        &[("result", "success"), ("session_id", &session_id)],
                    ),
                    Err(e) => log_event(
                        logger,
                        Severity::Error,
                        Event::Shutdown,
                        &[
                            ("error", &e.to_string()),
                            ("result", "fail"),
                            ("session_id", &session_id),
                        ],
                    ),
                }
            }
            None => log_event(
                logger,
                Severity::Info,
                Event::Shutdown,
                &[("result", "success"), ("session_id", "none")],
            ),
        }

        self.inner.wake.notify_all();
        true
    }

    /// Sleeps for `timeout` unless shutdown happens first.
    ///
    /// Returns `true` if the wait ended because of shutdown.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = match self
            .inner
            .wake
            .wait_timeout_while(state, timeout, |s| !s.shut_down)
        {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.shut_down
    }
}
