use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures of the stdin bridge.
///
/// The first group are setup faults: they happen before any piped byte is
/// relayed and abort the whole ingestion. The rest can only occur while
/// draining and are reported after the viewer has been torn down.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to install signal handlers")]
    Signals(#[source] io::Error),

    #[error("failed to duplicate the stdin descriptor")]
    Stdin(#[source] io::Error),

    #[error("failed to create relay file")]
    RelayCreate(#[source] io::Error),

    #[error("failed to open terminal device {}", path.display())]
    TerminalOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn viewer {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for stdin to become readable")]
    Poll(#[source] io::Error),

    #[error("failed to read piped input")]
    Read(#[source] io::Error),

    #[error("failed to append to relay file")]
    Write(#[source] io::Error),

    #[error("failed to check on the viewer process")]
    Wait(#[source] io::Error),
}

impl BridgeError {
    /// true for faults that prevented the viewer from ever starting
    pub fn is_setup_fault(&self) -> bool {
        matches!(
            self,
            Self::Signals(_)
                | Self::Stdin(_)
                | Self::RelayCreate(_)
                | Self::TerminalOpen { .. }
                | Self::Spawn { .. }
        )
    }
}
