use crate::BridgeError;
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;

/// Append-only on-disk mirror of the piped input.
///
/// Writes go straight to the file descriptor, there is no userspace buffer
/// for a reader to wait on. The file is removed when the value is dropped.
pub struct RelayFile {
    file: NamedTempFile,
    bytes_written: u64,
}

impl RelayFile {
    pub fn create(prefix: &str) -> Result<Self, BridgeError> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile()
            .map_err(BridgeError::RelayCreate)?;
        log::debug!("Relay file created at {}", file.path().display());

        Ok(Self {
            file,
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        self.file
            .as_file_mut()
            .write_all(bytes)
            .map_err(BridgeError::Write)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
