use crate::{
    app_block::AppBlock,
    line_panel::LinePanel,
    log_list::LogList,
    provider::{LogItem, LogProvider, spawn_provider_thread},
};
use anyhow::{Result, anyhow};
use crossterm::event::{self, Event};
use ratatui::{Terminal, backend::CrosstermBackend, prelude::*, widgets::Widget};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Split},
};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

mod events;
mod render;

// constants
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_EVENT_POLL_INTERVAL_MS: u64 = 16;
const DEFAULT_RING_BUFFER_SIZE: usize = 16384;

#[derive(Clone)]
pub struct AppDesc {
    pub poll_interval: Duration,
    pub event_poll_interval: Duration,
    pub ring_buffer_size: usize,
    /// exit cleanly on SIGINT/SIGTERM, set when running under the stdin bridge
    pub allow_signals: bool,
    /// shown in the title of the lines panel
    pub title: String,
}

impl AppDesc {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            event_poll_interval: Duration::from_millis(DEFAULT_EVENT_POLL_INTERVAL_MS),
            ring_buffer_size: DEFAULT_RING_BUFFER_SIZE,
            allow_signals: false,
            title: "Lines".to_string(),
        }
    }
}

impl Default for AppDesc {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the viewer with default configuration
pub fn start_with_provider<P>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    provider: P,
) -> Result<()>
where
    P: LogProvider + 'static,
{
    start_with_desc(terminal, provider, AppDesc::new())
}

/// Start the viewer with custom configuration
pub fn start_with_desc<P>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    provider: P,
    desc: AppDesc,
) -> Result<()>
where
    P: LogProvider + 'static,
{
    color_eyre::install().or(Err(anyhow!("Error installing color_eyre")))?;

    let app = App::new(provider, &desc)?;
    app.run(terminal, &desc)
}

struct App {
    is_exiting: bool,
    logs: Vec<LogItem>,
    log_list: LogList,
    log_consumer: ringbuf::HeapCons<LogItem>, // receives lines from the provider thread
    provider_thread: Option<thread::JoinHandle<()>>,
    provider_stop_signal: Arc<AtomicBool>,
    termination_requested: Option<Arc<AtomicBool>>, // set by SIGINT/SIGTERM when allowed
    follow: bool, // keep the newest line selected as lines arrive
    wrap_enabled: bool,
    focused_block_id: uuid::Uuid,
    logs_block: AppBlock,
    panel_block: AppBlock,
    line_panel: LinePanel,
    shown_log_id: Option<uuid::Uuid>, // line currently rendered in the panel
    last_logs_viewport_height: usize,
    last_panel_viewport_height: usize,
}

// ============================================================================
// Initialization
// ============================================================================
impl App {
    fn register_termination_signals() -> Result<Arc<AtomicBool>> {
        let flag = Arc::new(AtomicBool::new(false));
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&flag))?;
        }
        Ok(flag)
    }

    fn new<P>(provider: P, desc: &AppDesc) -> Result<Self>
    where
        P: LogProvider + 'static,
    {
        let ring_buffer = HeapRb::<LogItem>::new(desc.ring_buffer_size);
        let (producer, consumer) = ring_buffer.split();

        let (provider_thread, provider_stop_signal) =
            spawn_provider_thread(provider, producer, desc.poll_interval);

        let termination_requested = if desc.allow_signals {
            log::debug!("Viewer honours SIGINT/SIGTERM");
            Some(Self::register_termination_signals()?)
        } else {
            None
        };

        let logs_block = AppBlock::new().set_title(format!("[1]─{}", desc.title));
        let panel_block = AppBlock::new()
            .set_title("[2]─Line")
            .set_padding(ratatui::widgets::Padding::horizontal(1));
        let focused_block_id = logs_block.id();

        Ok(Self {
            is_exiting: false,
            logs: Vec::new(),
            log_list: LogList::new(),
            log_consumer: consumer,
            provider_thread: Some(provider_thread),
            provider_stop_signal,
            termination_requested,
            follow: true,
            wrap_enabled: true,
            focused_block_id,
            logs_block,
            panel_block,
            line_panel: LinePanel::new(),
            shown_log_id: None,
            last_logs_viewport_height: 1,
            last_panel_viewport_height: 1,
        })
    }
}

// ============================================================================
// Lifecycle
// ============================================================================
impl App {
    fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        desc: &AppDesc,
    ) -> Result<()> {
        let mut last_update_logs = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> Result<()> {
            while !self.is_exiting {
                self.poll_event(desc.event_poll_interval)?;

                if last_update_logs.elapsed() >= desc.poll_interval {
                    self.update_logs();
                    last_update_logs = Instant::now();
                }

                if self
                    .termination_requested
                    .as_ref()
                    .is_some_and(|flag| flag.load(Ordering::Relaxed))
                {
                    log::debug!("Termination signal received, leaving viewer");
                    self.is_exiting = true;
                }

                terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            }
            Ok(())
        }));

        // cleanup provider thread before returning
        self.cleanup();

        // the caller restores the terminal, so a panic becomes an error here
        result.unwrap_or_else(|_| Err(anyhow!("Viewer panicked")))
    }

    fn cleanup(&mut self) {
        self.provider_stop_signal.store(true, Ordering::Relaxed);

        if let Some(handle) = self.provider_thread.take() {
            log::debug!("Waiting for provider thread to finish...");
            if let Err(e) = handle.join() {
                log::error!("Provider thread panicked: {:?}", e);
            }
        }
    }

    fn poll_event(&mut self, poll_interval: Duration) -> Result<()> {
        if event::poll(poll_interval)? {
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(width, height) => {
                    log::debug!("Terminal resized to {}x{}", width, height);
                }
                _ => {}
            }
        }

        Ok(())
    }
}

// ============================================================================
// Lines and selection
// ============================================================================
impl App {
    fn update_logs(&mut self) {
        let mut new_logs = Vec::new();
        while let Some(log) = self.log_consumer.try_pop() {
            new_logs.push(log);
        }
        self.ingest(new_logs);
    }

    fn ingest(&mut self, new_logs: Vec<LogItem>) {
        if new_logs.is_empty() {
            return;
        }

        log::debug!("Received {} new lines from provider", new_logs.len());
        self.logs.extend(new_logs);
        self.log_list.set_len(self.logs.len());

        if self.follow {
            self.log_list.select_last();
        }
        self.sync_line_panel();
    }

    /// render the selected line into the panel if the selection changed
    fn sync_line_panel(&mut self) {
        let selected = self
            .log_list
            .selected()
            .and_then(|i| self.logs.get(i));

        match selected {
            Some(item) if self.shown_log_id != Some(item.id) => {
                self.line_panel.update(&item.content, item.timestamp);
                self.shown_log_id = Some(item.id);
                self.panel_block.set_scroll_position(0);
            }
            Some(_) => {}
            None => {
                if self.line_panel.clear().is_some() {
                    log::debug!("No line selected - clearing line panel");
                }
                self.shown_log_id = None;
                self.panel_block.set_scroll_position(0);
            }
        }
    }

    fn is_logs_block_focused(&self) -> bool {
        self.focused_block_id == self.logs_block.id()
    }
}

// ============================================================================
// Widget implementation
// ============================================================================
impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [main_area, footer_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let [logs_area, panel_area] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(main_area);

        self.render_logs(logs_area, buf);
        self.render_line_panel(panel_area, buf);
        self.render_footer(footer_area, buf);
    }
}
