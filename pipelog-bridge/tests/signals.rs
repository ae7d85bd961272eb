// Runs in its own test binary: it installs process-wide signal handlers.

use pipelog_bridge::{BridgeDesc, CancelToken, DrainOutcome, IngestBridge};
use std::{
    io::Write,
    os::unix::net::UnixStream,
    path::PathBuf,
    thread,
    time::Duration,
};

#[test]
fn test_sigterm_cancels_the_bridge() {
    let cancel = CancelToken::with_termination_signals().unwrap();

    let mut desc = BridgeDesc::new("sh");
    desc.viewer_args = vec!["-c".into(), "exec sleep 30".into(), "viewer".into()];
    desc.tty_path = PathBuf::from("/dev/null");
    desc.terminate_grace = Duration::from_millis(500);

    let (mut writer, mut reader) = UnixStream::pair().unwrap();
    writer.write_all(b"A\n").unwrap();

    let raiser = thread::spawn(|| {
        thread::sleep(Duration::from_millis(300));
        signal_hook::low_level::raise(signal_hook::consts::SIGTERM).unwrap();
    });

    let report = IngestBridge::new(desc).run_with(&mut reader, &cancel).unwrap();
    raiser.join().unwrap();

    assert!(cancel.is_cancelled());
    assert_eq!(report.outcome, DrainOutcome::Cancelled);
    assert!(!report.relay_path.exists());

    // SAFETY: signal 0 only checks that the pid exists
    let ret = unsafe { libc::kill(report.viewer_pid as libc::pid_t, 0) };
    assert_eq!(ret, -1);
    assert_eq!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(libc::ESRCH)
    );
}
