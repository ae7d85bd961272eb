use pipelog_bridge::{BridgeDesc, BridgeError, CancelToken, DrainOutcome, IngestBridge};
use std::{
    fs,
    io::Write,
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

fn shell_viewer(script: &str, out: &Path) -> BridgeDesc {
    // the viewer sees `$0` = out and `$1` = relay path
    let mut desc = BridgeDesc::new("sh");
    desc.viewer_args = vec!["-c".into(), script.into(), out.into()];
    desc.tty_path = PathBuf::from("/dev/null");
    desc.terminate_grace = Duration::from_millis(500);
    desc
}

fn process_is_gone(pid: u32) -> bool {
    // SAFETY: signal 0 only checks that the pid exists
    let ret = unsafe { libc::kill(pid as libc::pid_t, 0) };
    ret == -1 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ESRCH)
}

#[test]
fn test_piped_lines_reach_the_viewer() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("seen");
    let desc = shell_viewer(r#"sleep 0.3; cp "$1" "$0""#, &out);

    let (mut writer, mut reader) = UnixStream::pair().unwrap();
    writer.write_all(b"A\nB\nC\n").unwrap();
    drop(writer);

    let report = IngestBridge::new(desc)
        .run_with(&mut reader, &CancelToken::new())
        .unwrap();

    assert_eq!(report.outcome, DrainOutcome::Eof);
    assert_eq!(report.bytes_relayed, 6);
    assert!(report.viewer_status.success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "A\nB\nC\n");
    assert!(!report.relay_path.exists());
    assert!(process_is_gone(report.viewer_pid));
}

#[test]
fn test_input_larger_than_a_chunk() {
    const TOTAL: usize = 300_000;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("seen");
    let script = format!(
        r#"while [ $(wc -c < "$1") -lt {TOTAL} ]; do sleep 0.05; done; cp "$1" "$0""#
    );
    let mut desc = shell_viewer(&script, &out);
    desc.chunk_size = 1024;

    let input: Vec<u8> = (0..TOTAL).map(|i| b"0123456789\n"[i % 11]).collect();
    let (mut writer, mut reader) = UnixStream::pair().unwrap();
    let expected = input.clone();
    let feeder = thread::spawn(move || {
        for piece in input.chunks(7000) {
            writer.write_all(piece).unwrap();
        }
    });

    let report = IngestBridge::new(desc)
        .run_with(&mut reader, &CancelToken::new())
        .unwrap();
    feeder.join().unwrap();

    assert_eq!(report.outcome, DrainOutcome::Eof);
    assert_eq!(report.bytes_relayed, TOTAL as u64);
    assert_eq!(fs::read(&out).unwrap(), expected);
}

#[test]
fn test_viewer_contract() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("contract");
    let desc = shell_viewer(r#"printf '%s|%s' "$PIPELOG_ALLOW_SIGNALS" "$1" > "$0""#, &out);

    let (_writer, mut reader) = UnixStream::pair().unwrap();
    let report = IngestBridge::new(desc)
        .run_with(&mut reader, &CancelToken::new())
        .unwrap();

    assert_eq!(report.outcome, DrainOutcome::ChildExited);
    let seen = fs::read_to_string(&out).unwrap();
    assert_eq!(seen, format!("1|{}", report.relay_path.display()));
}

#[test]
fn test_viewer_exit_ends_bridge_with_pipe_open() {
    let mut desc = BridgeDesc::new("true");
    desc.tty_path = PathBuf::from("/dev/null");

    let (_writer, mut reader) = UnixStream::pair().unwrap();
    let started = Instant::now();
    let report = IngestBridge::new(desc)
        .run_with(&mut reader, &CancelToken::new())
        .unwrap();

    assert_eq!(report.outcome, DrainOutcome::ChildExited);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!report.relay_path.exists());
}

#[test]
fn test_interrupt_mid_stream_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let desc = shell_viewer("exec sleep 30", &dir.path().join("unused"));

    let (mut writer, mut reader) = UnixStream::pair().unwrap();
    writer.write_all(b"A\n").unwrap();

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });

    let report = IngestBridge::new(desc).run_with(&mut reader, &cancel).unwrap();
    canceller.join().unwrap();

    assert_eq!(report.outcome, DrainOutcome::Cancelled);
    assert_eq!(report.bytes_relayed, 2);
    assert!(!report.viewer_status.success());
    assert!(!report.relay_path.exists());
    assert!(process_is_gone(report.viewer_pid));
}

#[test]
fn test_setup_faults() {
    let mut desc = BridgeDesc::new("/nonexistent/pipelog");
    desc.tty_path = PathBuf::from("/dev/null");
    let (_writer, mut reader) = UnixStream::pair().unwrap();

    let err = IngestBridge::new(desc)
        .run_with(&mut reader, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, BridgeError::Spawn { .. }));
    assert!(err.is_setup_fault());
    assert!(err.to_string().contains("/nonexistent/pipelog"));
}
