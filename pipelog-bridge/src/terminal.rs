use crate::BridgeError;
use std::{
    fs::{File, OpenOptions},
    io::{self, IsTerminal},
    path::Path,
};

pub const DEFAULT_TTY_PATH: &str = "/dev/tty";

/// whether stdin is an interactive terminal rather than a pipe or redirect
pub fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Open the controlling terminal directly, independent of a redirected stdin.
pub fn open_terminal(path: &Path) -> Result<File, BridgeError> {
    OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|source| BridgeError::TerminalOpen {
            path: path.to_path_buf(),
            source,
        })
}
