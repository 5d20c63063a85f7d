//! Termination-signal listener
//!
//! A dedicated thread runs a current-thread tokio runtime that waits for
//! SIGTERM or SIGINT (Ctrl-C on Windows) and then calls
//! [`Lifecycle::shutdown`]. Every signal stream is registered before the
//! thread starts, so a signal arriving right after installation is not lost.

use std::io;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Runtime};

use super::Lifecycle;
use crate::observability::{log_event, Event, Severity};

struct Termination {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl Termination {
    #[cfg(unix)]
    fn register(runtime: &Runtime) -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let _guard = runtime.enter();
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(windows)]
    fn register(runtime: &Runtime) -> io::Result<Self> {
        let _guard = runtime.enter();
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Resolves with the name of the first signal received
    #[cfg(unix)]
    async fn recv(&mut self) -> io::Result<&'static str> {
        let (received, name) = tokio::select! {
            received = self.term.recv() => (received, "SIGTERM"),
            received = self.interrupt.recv() => (received, "SIGINT"),
        };
        received.map(|_| name).ok_or_else(closed)
    }

    #[cfg(windows)]
    async fn recv(&mut self) -> io::Result<&'static str> {
        self.ctrl_c.recv().await.map(|_| "CTRL_C").ok_or_else(closed)
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "signal stream closed")
}

impl Lifecycle {
    /// Subscribes to the termination signal and spawns the listener thread.
    ///
    /// Call once at process start. The thread ends after the first signal.
    pub fn install_signal_handler(&self) -> io::Result<JoinHandle<()>> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let mut termination = Termination::register(&runtime)?;
        let lifecycle = self.clone();

        thread::Builder::new()
            .name("signal-listener".to_string())
            .spawn(move || {
                let received = runtime.block_on(termination.recv());
                let logger = &lifecycle.inner.logger;
                match received {
                    Ok(signal) => {
                        log_event(
                            logger,
                            Severity::Info,
                            Event::ShutdownSignal,
                            &[("result", "in_progress"), ("signal", signal)],
                        );
                        lifecycle.shutdown();
                    }
                    Err(e) => log_event(
                        logger,
                        Severity::Error,
                        Event::ShutdownSignal,
                        &[("error", &e.to_string()), ("result", "fail")],
                    ),
                }
            })
    }
}
