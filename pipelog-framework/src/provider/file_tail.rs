use super::LogProvider;
use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

/// idle polls after which an unterminated trailing line is emitted anyway
const PARTIAL_FLUSH_POLLS: u32 = 10;

/// Tails a growing file, `tail -f` style, yielding complete lines.
///
/// Only bytes appended since the previous poll are read. A line without its
/// terminating `\n` is held back until the rest arrives, or until the file
/// has stayed idle for a few polls. A file that shrinks is read again from
/// the start.
pub struct FileTailProvider {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
    idle_polls: u32,
}

impl FileTailProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            partial: Vec::new(),
            idle_polls: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_delta(path: &Path, prev_len: u64, cur_len: u64) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and dropped before returning; log
        // files are only appended to while we read them
        let mmap = unsafe { MmapOptions::new().len(cur_len as usize).map(&file)? };

        let start = (prev_len as usize).min(mmap.len());
        let end = (cur_len as usize).min(mmap.len());
        Ok(mmap[start..end].to_vec())
    }

    fn take_lines(&mut self, delta: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(delta);

        let Some(last_newline) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    fn flush_partial(&mut self) -> Vec<String> {
        if self.partial.is_empty() {
            return Vec::new();
        }
        let line = decode_line(&self.partial);
        self.partial.clear();
        vec![line]
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl LogProvider for FileTailProvider {
    fn start(&mut self) -> Result<()> {
        fs::metadata(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))?;
        log::debug!("FileTailProvider: tailing {}", self.path.display());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        log::debug!("FileTailProvider: stopping {}", self.path.display());
        Ok(())
    }

    fn poll_logs(&mut self) -> Result<Vec<String>> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if len < self.offset {
            log::debug!(
                "FileTailProvider: {} truncated, reading from start",
                self.path.display()
            );
            self.offset = 0;
            self.partial.clear();
        }

        if len == self.offset {
            self.idle_polls = self.idle_polls.saturating_add(1);
            if self.idle_polls == PARTIAL_FLUSH_POLLS {
                return Ok(self.flush_partial());
            }
            return Ok(Vec::new());
        }

        let delta = Self::read_delta(&self.path, self.offset, len)?;
        self.offset = len;
        self.idle_polls = 0;

        let lines = self.take_lines(&delta);
        if !lines.is_empty() {
            log::debug!("FileTailProvider: read {} new lines", lines.len());
        }
        Ok(lines)
    }
}

/// Tails several files, one after another on each poll.
///
/// Lines keep their arrival order per file; no ordering is imposed across
/// files.
pub struct MultiFileProvider {
    files: Vec<FileTailProvider>,
}

impl MultiFileProvider {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(FileTailProvider::new).collect(),
        }
    }
}

impl LogProvider for MultiFileProvider {
    fn start(&mut self) -> Result<()> {
        self.files.iter_mut().try_for_each(|f| f.start())
    }

    fn stop(&mut self) -> Result<()> {
        for file in &mut self.files {
            if let Err(e) = file.stop() {
                log::warn!("Failed to stop tail of {}: {}", file.path().display(), e);
            }
        }
        Ok(())
    }

    fn poll_logs(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for file in &mut self.files {
            match file.poll_logs() {
                Ok(new_lines) => lines.extend(new_lines),
                Err(e) => log::debug!("Poll of {} failed: {}", file.path().display(), e),
            }
        }
        Ok(lines)
    }
}
