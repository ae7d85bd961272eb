//! # pipelog-bridge
//!
//! Lets the pipelog viewer follow output piped into it.
//!
//! A full-screen viewer needs the keyboard, and a piped process has a pipe
//! where the keyboard would be. The bridge resolves this by mirroring stdin
//! into a relay file and starting the viewer as a child that tails that
//! file, with its stdin reattached to the controlling terminal:
//!
//! ```text
//! producer | pipelog            (bridge: stdin -> relay file)
//!              └── pipelog <relay>   (viewer: stdin = /dev/tty)
//! ```
//!
//! The bridge keeps draining until the producer closes the pipe, the viewer
//! exits or SIGINT/SIGTERM arrives. Whatever ends it, the viewer is stopped
//! and reaped and the relay file is removed.

mod child;
mod drain;
mod error;
mod relay;
mod signals;
mod terminal;

pub use child::{ALLOW_SIGNALS_ENV, ChildViewer, Liveness};
pub use drain::{DrainOutcome, drain};
pub use error::BridgeError;
pub use relay::RelayFile;
pub use signals::CancelToken;
pub use terminal::{DEFAULT_TTY_PATH, open_terminal, stdin_is_interactive};

use std::{
    ffi::OsString,
    fs::File,
    io::{self, Read},
    os::fd::AsFd,
    path::{Path, PathBuf},
    process::ExitStatus,
    thread,
    time::Duration,
};

// constants
const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_RELAY_PREFIX: &str = "pl_";
const DEFAULT_TERMINATE_GRACE_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct BridgeDesc {
    /// the viewer, started as `<program> <args>... <relay_path>`
    pub viewer_program: PathBuf,
    pub viewer_args: Vec<OsString>,
    /// terminal device handed to the viewer as stdin
    pub tty_path: PathBuf,
    pub poll_timeout: Duration,
    pub chunk_size: usize,
    pub relay_prefix: String,
    /// how long the viewer gets to exit after SIGTERM before it is killed
    pub terminate_grace: Duration,
}

impl BridgeDesc {
    pub fn new(viewer_program: impl Into<PathBuf>) -> Self {
        Self {
            viewer_program: viewer_program.into(),
            viewer_args: Vec::new(),
            tty_path: PathBuf::from(DEFAULT_TTY_PATH),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            relay_prefix: DEFAULT_RELAY_PREFIX.to_string(),
            terminate_grace: Duration::from_millis(DEFAULT_TERMINATE_GRACE_MS),
        }
    }
}

/// What a finished bridge run did.
#[derive(Debug)]
pub struct BridgeReport {
    pub outcome: DrainOutcome,
    pub bytes_relayed: u64,
    /// already removed by the time the report is returned
    pub relay_path: PathBuf,
    pub viewer_pid: u32,
    pub viewer_status: ExitStatus,
}

/// A relay file and the viewer reading it.
///
/// Dropping the session stops the viewer, reaps it and then removes the relay
/// file, whichever way the bridge is left.
pub struct BridgeSession {
    viewer: ChildViewer,
    relay: RelayFile,
    terminate_grace: Duration,
}

impl BridgeSession {
    /// Create the relay file and start the viewer on it.
    pub fn start(desc: &BridgeDesc) -> Result<Self, BridgeError> {
        let relay = RelayFile::create(&desc.relay_prefix)?;
        let terminal = open_terminal(&desc.tty_path)?;
        let viewer = ChildViewer::spawn(desc, relay.path(), terminal)?;

        Ok(Self {
            viewer,
            relay,
            terminate_grace: desc.terminate_grace,
        })
    }

    pub fn relay_path(&self) -> &Path {
        self.relay.path()
    }

    pub fn viewer_pid(&self) -> u32 {
        self.viewer.id()
    }

    pub fn bytes_relayed(&self) -> u64 {
        self.relay.bytes_written()
    }

    pub fn drain_from<S>(
        &mut self,
        source: &mut S,
        cancel: &CancelToken,
        desc: &BridgeDesc,
    ) -> Result<DrainOutcome, BridgeError>
    where
        S: Read + AsFd,
    {
        drain(
            source,
            &mut self.relay,
            &mut self.viewer,
            cancel,
            desc.poll_timeout,
            desc.chunk_size,
        )
    }

    /// Block until the viewer exits on its own or `cancel` trips.
    ///
    /// Returns whether the viewer exited.
    pub fn wait_for_viewer(
        &mut self,
        cancel: &CancelToken,
        poll_interval: Duration,
    ) -> Result<bool, BridgeError> {
        loop {
            if !self.viewer.is_alive()? {
                return Ok(true);
            }
            if cancel.is_cancelled() {
                return Ok(false);
            }
            thread::sleep(poll_interval);
        }
    }

    /// Tear down now and report how the viewer ended.
    pub fn finish(mut self) -> Result<ExitStatus, BridgeError> {
        self.viewer
            .terminate(self.terminate_grace)
            .map_err(BridgeError::Wait)
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        // reaping a viewer twice is harmless, `finish` may already have run
        if let Err(e) = self.viewer.terminate(self.terminate_grace) {
            log::error!("Failed to stop viewer {}: {}", self.viewer.id(), e);
        }
        log::debug!("Removing relay file {}", self.relay.path().display());
    }
}

/// Drains stdin for a viewer child.
pub struct IngestBridge {
    desc: BridgeDesc,
}

impl IngestBridge {
    pub fn new(desc: BridgeDesc) -> Self {
        Self { desc }
    }

    /// Bridge the process's own stdin, cancelled by SIGINT/SIGTERM.
    pub fn run(&self) -> Result<BridgeReport, BridgeError> {
        // handlers go in first so an early Ctrl-C still tears down cleanly
        let cancel = CancelToken::with_termination_signals()?;

        // an unbuffered handle, so poll readiness and reads stay in step
        let stdin = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(BridgeError::Stdin)?;
        let mut source = File::from(stdin);

        self.run_with(&mut source, &cancel)
    }

    /// Bridge `source` until it ends, the viewer exits or `cancel` trips.
    pub fn run_with<S>(
        &self,
        source: &mut S,
        cancel: &CancelToken,
    ) -> Result<BridgeReport, BridgeError>
    where
        S: Read + AsFd,
    {
        let mut session = BridgeSession::start(&self.desc)?;
        let relay_path = session.relay_path().to_path_buf();
        let viewer_pid = session.viewer_pid();
        log::info!(
            "Relaying stdin to {} for viewer {}",
            relay_path.display(),
            viewer_pid
        );

        let outcome = session.drain_from(source, cancel, &self.desc)?;
        let bytes_relayed = session.bytes_relayed();
        log::info!(
            "Drain ended with {:?} after {} bytes",
            outcome,
            bytes_relayed
        );

        if outcome == DrainOutcome::Eof {
            // keep the viewer up so the user can browse what was piped
            if !session.wait_for_viewer(cancel, self.desc.poll_timeout)? {
                log::info!("Cancelled while the viewer was open");
            }
        }

        let viewer_status = session.finish()?;
        log::debug!("Viewer {} ended with {}", viewer_pid, viewer_status);

        Ok(BridgeReport {
            outcome,
            bytes_relayed,
            relay_path,
            viewer_pid,
            viewer_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, os::unix::net::UnixStream, time::Instant};

    fn test_desc(program: &str, args: &[&str]) -> BridgeDesc {
        let mut desc = BridgeDesc::new(program);
        desc.viewer_args = args.iter().map(|a| (*a).into()).collect();
        desc.tty_path = PathBuf::from("/dev/null");
        desc.terminate_grace = Duration::from_millis(500);
        desc
    }

    #[test]
    fn test_defaults() {
        let desc = BridgeDesc::new("pipelog");
        assert_eq!(desc.poll_timeout, Duration::from_millis(100));
        assert_eq!(desc.chunk_size, 65536);
        assert_eq!(desc.tty_path, Path::new("/dev/tty"));
        assert_eq!(desc.terminate_grace, Duration::from_secs(2));
        assert!(desc.viewer_args.is_empty());
    }

    #[test]
    fn test_session_relays_then_cleans_up() {
        let desc = test_desc("sh", &["-c", "exec sleep 30", "viewer"]);
        let mut session = BridgeSession::start(&desc).unwrap();
        let relay_path = session.relay_path().to_path_buf();

        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\nB\nC\n").unwrap();
        drop(writer);

        let outcome = session
            .drain_from(&mut reader, &CancelToken::new(), &desc)
            .unwrap();
        assert_eq!(outcome, DrainOutcome::Eof);
        assert_eq!(std::fs::read_to_string(&relay_path).unwrap(), "A\nB\nC\n");

        let started = Instant::now();
        drop(session);
        assert!(started.elapsed() < desc.terminate_grace);
        assert!(!relay_path.exists());
    }

    #[test]
    fn test_wait_for_viewer_honours_cancel() {
        let desc = test_desc("sh", &["-c", "exec sleep 30", "viewer"]);
        let mut session = BridgeSession::start(&desc).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(
            !session
                .wait_for_viewer(&cancel, Duration::from_millis(10))
                .unwrap()
        );
        assert!(!session.finish().unwrap().success());
    }

    #[test]
    fn test_setup_fault_leaves_no_relay() {
        let mut desc = test_desc("true", &[]);
        let dir = tempfile::tempdir().unwrap();
        desc.tty_path = dir.path().join("missing-tty");
        desc.relay_prefix = "pl_setup_fault_".to_string();

        let err = BridgeSession::start(&desc).err().unwrap();
        assert!(matches!(err, BridgeError::TerminalOpen { .. }));

        let leftovers = std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("pl_setup_fault_"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
