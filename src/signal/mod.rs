//! Signal handling for cooperative cancellation (SIGINT/SIGTERM)
//!
//! On the first SIGINT or SIGTERM:
//! 1. Fire the shared [`CancelToken`] exactly once
//! 2. Print a one-line notice
//! 3. Restore the default dispositions, so a further signal behaves as if
//!    the launcher had never installed a handler
//!
//! Handlers are process-wide and can only be installed once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cancel::CancelToken;

/// Notice printed when the first signal arrives
pub const INTERRUPT_NOTICE: &str = "Command interrupted";

/// Signal handler state
#[derive(Debug)]
pub struct SignalState {
    token: CancelToken,
    /// Signals seen so far
    signal_count: AtomicUsize,
    /// Set once the foreground invocation has finished
    done: AtomicBool,
}

impl SignalState {
    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            signal_count: AtomicUsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    /// The token fired by the first signal
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Get the number of signals received
    pub fn signal_count(&self) -> usize {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Check if the listener has been told the invocation finished
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Mark the invocation finished; later signals no longer cancel.
    pub fn finish(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    /// Handle a signal (SIGINT/SIGTERM)
    ///
    /// Returns the appropriate action to take
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        if self.is_done() {
            return SignalAction::Ignore;
        }
        if count == 0 && self.token.cancel() {
            SignalAction::Cancelled
        } else {
            SignalAction::Ignore
        }
    }
}

/// Action taken after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: the token fired
    Cancelled,
    /// Already cancelled, or the invocation finished
    Ignore,
}

/// Installs the process-wide handler that drives a [`SignalState`]
pub struct SignalBridge {
    state: Arc<SignalState>,
}

impl SignalBridge {
    pub fn new(token: CancelToken) -> Self {
        Self {
            state: Arc::new(SignalState::new(token)),
        }
    }

    /// Get a reference to the signal state
    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the SIGINT/SIGTERM handler.
    ///
    /// Fails if a handler was already installed in this process. The
    /// returned listener marks the invocation finished when dropped.
    pub fn install(&self) -> Result<SignalListener, ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || {
            if state.handle_signal() == SignalAction::Cancelled {
                println!("{}", INTERRUPT_NOTICE);
                restore_default_dispositions();
            }
        })?;
        tracing::debug!("installed interrupt handler");

        Ok(SignalListener {
            state: Arc::clone(&self.state),
        })
    }
}

/// Guard tying the signal listener to one foreground invocation
pub struct SignalListener {
    state: Arc<SignalState>,
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.state.finish();
    }
}

#[cfg(unix)]
fn restore_default_dispositions() {
    use nix::sys::signal::{signal, SigHandler, Signal};

    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: SigDfl installs no Rust code as a handler.
        if let Err(e) = unsafe { signal(sig, SigHandler::SigDfl) } {
            tracing::debug!(signal = %sig, error = %e, "failed to restore default disposition");
        }
    }
}

#[cfg(not(unix))]
fn restore_default_dispositions() {}
