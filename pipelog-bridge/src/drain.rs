use crate::{BridgeError, CancelToken, child::Liveness, relay::RelayFile};
use std::{
    io::{self, Read},
    os::fd::{AsFd, AsRawFd, BorrowedFd},
    time::Duration,
};

/// Why the drain loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// the writer closed its end; everything it wrote is in the relay
    Eof,
    /// the viewer went away first, unread input stays in the pipe
    ChildExited,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Ready,
    TimedOut,
    Interrupted,
}

/// Copy `source` into `relay` until it ends, the viewer exits or `cancel` trips.
///
/// The source is never read without first being reported readable, so the
/// viewer and the token are both checked at least once per `poll_timeout`
/// even when the writer stays silent. Each read takes at most `chunk_size`
/// bytes and lands in the relay before the next read starts.
pub fn drain<S, L>(
    source: &mut S,
    relay: &mut RelayFile,
    viewer: &mut L,
    cancel: &CancelToken,
    poll_timeout: Duration,
    chunk_size: usize,
) -> Result<DrainOutcome, BridgeError>
where
    S: Read + AsFd,
    L: Liveness,
{
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        if cancel.is_cancelled() {
            return Ok(DrainOutcome::Cancelled);
        }
        if !viewer.is_alive()? {
            return Ok(DrainOutcome::ChildExited);
        }

        match wait_readable(source.as_fd(), poll_timeout)? {
            Readiness::Ready => {}
            Readiness::TimedOut | Readiness::Interrupted => continue,
        }

        // a signal may have arrived, or the viewer gone away, while we were blocked
        if cancel.is_cancelled() {
            return Ok(DrainOutcome::Cancelled);
        }
        if !viewer.is_alive()? {
            return Ok(DrainOutcome::ChildExited);
        }

        let n = match source.read(&mut buf) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                continue;
            }
            Err(e) => return Err(BridgeError::Read(e)),
        };

        if n == 0 {
            return Ok(DrainOutcome::Eof);
        }
        relay.append(&buf[..n])?;
    }
}

fn wait_readable(fd: BorrowedFd<'_>, timeout: Duration) -> Result<Readiness, BridgeError> {
    let mut pollfd = libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    // SAFETY: a single valid pollfd and a descriptor borrowed for the duration
    // of the call
    let ret = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };

    if ret < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Readiness::Interrupted);
        }
        return Err(BridgeError::Poll(err));
    }
    if ret == 0 {
        return Ok(Readiness::TimedOut);
    }
    if pollfd.revents & libc::POLLNVAL != 0 {
        return Err(BridgeError::Poll(io::Error::from_raw_os_error(libc::EBADF)));
    }

    // POLLHUP and POLLERR are left for the read to report as EOF or an error
    Ok(Readiness::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs,
        io::Write,
        net::Shutdown,
        os::unix::net::UnixStream,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Instant,
    };

    const TIMEOUT: Duration = Duration::from_millis(100);

    struct AlwaysAlive;

    impl Liveness for AlwaysAlive {
        fn is_alive(&mut self) -> Result<bool, BridgeError> {
            Ok(true)
        }
    }

    /// alive for the first check only, as if it exited during the wait
    struct ExitsDuringWait {
        checks: usize,
    }

    impl Liveness for ExitsDuringWait {
        fn is_alive(&mut self) -> Result<bool, BridgeError> {
            self.checks += 1;
            Ok(self.checks == 1)
        }
    }

    struct Switch(Arc<AtomicBool>);

    impl Liveness for Switch {
        fn is_alive(&mut self) -> Result<bool, BridgeError> {
            Ok(self.0.load(Ordering::Relaxed))
        }
    }

    fn relay() -> RelayFile {
        RelayFile::create("pl_test_").unwrap()
    }

    #[test]
    fn test_relays_all_bytes_in_order() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        let input: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        writer.write_all(&input).unwrap();
        writer.shutdown(Shutdown::Write).unwrap();

        let mut relay = relay();
        let outcome = drain(
            &mut reader,
            &mut relay,
            &mut AlwaysAlive,
            &CancelToken::new(),
            TIMEOUT,
            64,
        )
        .unwrap();

        assert_eq!(outcome, DrainOutcome::Eof);
        assert_eq!(fs::read(relay.path()).unwrap(), input);
        assert_eq!(relay.bytes_written(), 5000);
    }

    #[test]
    fn test_lines_scenario() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\nB\nC\n").unwrap();
        drop(writer);

        let mut relay = relay();
        let outcome = drain(
            &mut reader,
            &mut relay,
            &mut AlwaysAlive,
            &CancelToken::new(),
            TIMEOUT,
            64 * 1024,
        )
        .unwrap();

        assert_eq!(outcome, DrainOutcome::Eof);
        assert_eq!(fs::read_to_string(relay.path()).unwrap(), "A\nB\nC\n");
    }

    #[test]
    fn test_empty_input() {
        let (writer, mut reader) = UnixStream::pair().unwrap();
        drop(writer);

        let mut relay = relay();
        let outcome = drain(
            &mut reader,
            &mut relay,
            &mut AlwaysAlive,
            &CancelToken::new(),
            TIMEOUT,
            16,
        )
        .unwrap();

        assert_eq!(outcome, DrainOutcome::Eof);
        assert_eq!(relay.bytes_written(), 0);
    }

    #[test]
    fn test_exited_viewer_leaves_input_unread() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\n").unwrap();

        let mut relay = relay();
        let mut viewer = Switch(Arc::new(AtomicBool::new(false)));
        let outcome = drain(
            &mut reader,
            &mut relay,
            &mut viewer,
            &CancelToken::new(),
            TIMEOUT,
            16,
        )
        .unwrap();

        assert_eq!(outcome, DrainOutcome::ChildExited);
        assert_eq!(relay.bytes_written(), 0);

        let mut pending = [0u8; 2];
        reader.read_exact(&mut pending).unwrap();
        assert_eq!(&pending, b"A\n");
    }

    #[test]
    fn test_viewer_exit_during_wait_reads_nothing() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\n").unwrap();

        let mut relay = relay();
        let mut viewer = ExitsDuringWait { checks: 0 };
        let outcome = drain(
            &mut reader,
            &mut relay,
            &mut viewer,
            &CancelToken::new(),
            TIMEOUT,
            16,
        )
        .unwrap();

        assert_eq!(outcome, DrainOutcome::ChildExited);
        assert_eq!(relay.bytes_written(), 0);
        assert_eq!(viewer.checks, 2);

        let mut pending = [0u8; 2];
        reader.read_exact(&mut pending).unwrap();
        assert_eq!(&pending, b"A\n");
    }

    #[test]
    fn test_viewer_exit_noticed_while_input_is_idle() {
        let (_writer, mut reader) = UnixStream::pair().unwrap();
        let alive = Arc::new(AtomicBool::new(true));
        let mut viewer = Switch(Arc::clone(&alive));

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            alive.store(false, Ordering::Relaxed);
        });

        let started = Instant::now();
        let outcome = drain(
            &mut reader,
            &mut relay(),
            &mut viewer,
            &CancelToken::new(),
            TIMEOUT,
            16,
        )
        .unwrap();
        stopper.join().unwrap();

        assert_eq!(outcome, DrainOutcome::ChildExited);
        assert!(started.elapsed() < Duration::from_millis(150) + TIMEOUT * 3);
    }

    #[test]
    fn test_cancellation_mid_stream() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\n").unwrap();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            trigger.cancel();
        });

        let mut relay = relay();
        let outcome = drain(&mut reader, &mut relay, &mut AlwaysAlive, &cancel, TIMEOUT, 16)
            .unwrap();
        canceller.join().unwrap();

        assert_eq!(outcome, DrainOutcome::Cancelled);
        assert_eq!(fs::read(relay.path()).unwrap(), b"A\n");
    }

    #[test]
    fn test_already_cancelled_reads_nothing() {
        let (mut writer, mut reader) = UnixStream::pair().unwrap();
        writer.write_all(b"A\n").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut relay = relay();
        let outcome = drain(&mut reader, &mut relay, &mut AlwaysAlive, &cancel, TIMEOUT, 16)
            .unwrap();

        assert_eq!(outcome, DrainOutcome::Cancelled);
        assert_eq!(relay.bytes_written(), 0);
    }
}
