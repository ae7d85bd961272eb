use crate::BridgeError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cooperative cancellation shared between a signal handler and the drain loop.
///
/// The handler only flips an atomic flag; all teardown work happens on the
/// bridge thread when it next looks at the token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips on SIGINT or SIGTERM.
    ///
    /// The handlers stay installed for the rest of the process, a bridge runs
    /// once and then exits.
    pub fn with_termination_signals() -> Result<Self, BridgeError> {
        let token = Self::new();
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&token.flag))
                .map_err(BridgeError::Signals)?;
        }
        log::debug!("SIGINT/SIGTERM handlers installed");
        Ok(token)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
