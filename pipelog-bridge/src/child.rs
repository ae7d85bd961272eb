use crate::{BridgeDesc, BridgeError};
use std::{
    fs::File,
    io,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

/// Set to `1` in the viewer's environment.
///
/// The viewer is not the process the user started, so it must honour
/// SIGINT/SIGTERM itself and restore the terminal on the way out.
pub const ALLOW_SIGNALS_ENV: &str = "PIPELOG_ALLOW_SIGNALS";

const REAP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Whether the consumer of the relay file is still running.
pub trait Liveness {
    fn is_alive(&mut self) -> Result<bool, BridgeError>;
}

/// The interactive viewer reading the relay file.
pub struct ChildViewer {
    child: Child,
}

impl ChildViewer {
    /// Start `<program> <args>... <relay_path>` with its stdin on `terminal`.
    ///
    /// stdout and stderr are inherited so the viewer draws on the user's
    /// terminal. Descriptors opened by the bridge are close-on-exec and do
    /// not leak into the viewer.
    pub fn spawn(
        desc: &BridgeDesc,
        relay_path: &Path,
        terminal: File,
    ) -> Result<Self, BridgeError> {
        let child = Command::new(&desc.viewer_program)
            .args(&desc.viewer_args)
            .arg(relay_path)
            .stdin(Stdio::from(terminal))
            .env(ALLOW_SIGNALS_ENV, "1")
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: desc.viewer_program.clone(),
                source,
            })?;

        log::info!(
            "Viewer {} started with pid {}",
            desc.viewer_program.display(),
            child.id()
        );
        Ok(Self { child })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Stop the viewer and reap it.
    ///
    /// Sends SIGTERM first and gives the viewer `grace` to restore the
    /// terminal; a viewer still running after that is killed. Returns at once
    /// if the viewer already exited.
    pub fn terminate(&mut self, grace: Duration) -> io::Result<ExitStatus> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(status);
        }

        let pid = self.child.id() as libc::pid_t;
        // SAFETY: `pid` is our own child and has not been reaped yet, so the
        // id cannot have been recycled
        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            log::debug!(
                "SIGTERM to viewer {} failed: {}",
                pid,
                io::Error::last_os_error()
            );
        }

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait()? {
                log::debug!("Viewer {} exited with {}", pid, status);
                return Ok(status);
            }
            thread::sleep(REAP_POLL_INTERVAL);
        }

        log::warn!("Viewer {} ignored SIGTERM for {:?}, killing it", pid, grace);
        self.child.kill()?;
        self.child.wait()
    }
}

impl Liveness for ChildViewer {
    fn is_alive(&mut self) -> Result<bool, BridgeError> {
        Ok(self.child.try_wait().map_err(BridgeError::Wait)?.is_none())
    }
}
