//! Run-wide cancellation: a signal (or an explicit request) flips the run
//! from running to cancelling exactly once and broadcasts the stop.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use tokio::{
    signal::unix::{Signal, SignalKind, signal},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{error::CoreError, journal::Journal};

const RUNNING: u8 = 0;
const CANCELLING: u8 = 1;
const EXITED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    Cancelling,
    Exited,
}

#[derive(Debug, Clone)]
pub struct CancellationController {
    token: CancellationToken,
    done: CancellationToken,
    state: Arc<AtomicU8>,
    journal: Journal,
}

impl CancellationController {
    pub fn new(journal: Journal) -> Self {
        Self {
            token: CancellationToken::new(),
            done: CancellationToken::new(),
            state: Arc::new(AtomicU8::new(RUNNING)),
            journal,
        }
    }

    /// Token observed by the scheduler and every worker.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> ControllerState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ControllerState::Running,
            CANCELLING => ControllerState::Cancelling,
            _ => ControllerState::Exited,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Journal `message` and stop the run.
    ///
    /// Only the first call while running has any effect; returns whether this
    /// call was it.
    pub fn cancel(&self, message: impl Into<String>) -> bool {
        if self
            .state
            .compare_exchange(RUNNING, CANCELLING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(target: "mproc.core.cancel", state = ?self.state(), "cancel ignored");
            return false;
        }
        let message = message.into();
        info!(target: "mproc.core.cancel", %message, "cancelling run");
        self.journal.emit(message);
        self.token.cancel();
        true
    }

    /// Mark the run finished and stop any watcher.
    pub fn finish(&self) {
        self.state.store(EXITED, Ordering::Release);
        self.done.cancel();
    }

    /// Cancel the run when `stop` fires or, if `signals` is set, on the first
    /// SIGINT, SIGTERM or SIGQUIT.
    ///
    /// Handlers are installed before this returns, so a signal arriving right
    /// after cannot take the default action. They stay installed for the rest
    /// of the process: later signals are absorbed.
    pub fn watch(&self, stop: CancellationToken, signals: bool) -> Result<JoinHandle<()>, CoreError> {
        let mut set = if signals {
            Some(SignalSet::install().map_err(CoreError::Signal)?)
        } else {
            None
        };
        let ctl = self.clone();

        Ok(tokio::spawn(async move {
            let message = tokio::select! {
                name = next_signal(&mut set) => format!("Received signal {name}. Cleaning up."),
                _ = stop.cancelled() => "Cancellation requested. Cleaning up.".to_string(),
                _ = ctl.done.cancelled() => return,
            };
            ctl.cancel(message);
        }))
    }
}

struct SignalSet {
    int: Signal,
    term: Signal,
    quit: Signal,
}

impl SignalSet {
    fn install() -> io::Result<Self> {
        Ok(Self {
            int: signal(SignalKind::interrupt())?,
            term: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.int.recv() => "SIGINT",
            _ = self.term.recv() => "SIGTERM",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }
}

async fn next_signal(set: &mut Option<SignalSet>) -> &'static str {
    match set {
        Some(set) => set.recv().await,
        None => std::future::pending().await,
    }
}
