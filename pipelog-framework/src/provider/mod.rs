//! Log acquisition.
//!
//! A [`LogProvider`] turns some source into raw lines; [`spawn_provider_thread`]
//! polls it from a background thread and feeds [`LogItem`]s into the ring
//! buffer the viewer drains.
//!
//! ```text
//! ┌──────────────────┐  poll_logs()  ┌─────────────┐  LogItem::new  ┌──────────┐
//! │ FileTailProvider │ ────────────> │ Vec<String> │ ─────────────> │ HeapRb   │
//! └──────────────────┘               └─────────────┘                └──────────┘
//! ```

mod file_tail;
mod log_item;

pub use file_tail::{FileTailProvider, MultiFileProvider};
pub use log_item::LogItem;

use anyhow::Result;
use ringbuf::traits::Producer;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

const FULL_BUFFER_BACKOFF: Duration = Duration::from_millis(5);

/// Source of raw log lines.
///
/// `poll_logs()` must not block: return an empty `Vec` when nothing new is
/// available. Providers run on their own thread, hence `Send`.
pub trait LogProvider: Send {
    /// Acquire resources. Called once before the first poll; an error aborts
    /// the provider thread.
    fn start(&mut self) -> Result<()>;

    /// Release resources. Errors are logged, shutdown proceeds regardless.
    fn stop(&mut self) -> Result<()>;

    /// Lines that became available since the previous call.
    fn poll_logs(&mut self) -> Result<Vec<String>>;
}

/// Run `provider` on a background thread, pushing every line into `producer`.
///
/// Returns the thread handle and the stop flag; set the flag and join the
/// handle to shut down. Poll errors are logged and polling continues. When
/// the ring buffer is full the thread waits for the consumer instead of
/// dropping lines.
pub fn spawn_provider_thread<P>(
    mut provider: P,
    mut producer: impl Producer<Item = LogItem> + Send + 'static,
    poll_interval: Duration,
) -> (thread::JoinHandle<()>, Arc<AtomicBool>)
where
    P: LogProvider + 'static,
{
    let should_stop = Arc::new(AtomicBool::new(false));
    let should_stop_clone = should_stop.clone();

    let handle = thread::spawn(move || {
        if let Err(e) = provider.start() {
            log::error!("Failed to start log provider: {}", e);
            return;
        }

        log::debug!("Provider thread started");

        'polling: while !should_stop_clone.load(Ordering::Relaxed) {
            match provider.poll_logs() {
                Ok(raw_logs) => {
                    for raw_log in raw_logs {
                        let mut item = LogItem::new(raw_log);
                        while let Err(rejected) = producer.try_push(item) {
                            if should_stop_clone.load(Ordering::Relaxed) {
                                break 'polling;
                            }
                            item = rejected;
                            thread::sleep(FULL_BUFFER_BACKOFF);
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Provider poll error: {}", e);
                }
            }

            thread::sleep(poll_interval);
        }

        if let Err(e) = provider.stop() {
            log::error!("Failed to stop log provider: {}", e);
        }

        log::debug!("Provider thread stopped");
    });

    (handle, should_stop)
}
