//! # pipelog-framework
//!
//! The viewer side of pipelog: turning log lines into something readable and
//! showing them in the terminal.
//!
//! ## Line rendering
//!
//! [`render_line`] classifies a line as JSON or plain text. JSON lines are
//! unescaped and pretty-printed with two-space indentation; anything else is
//! kept verbatim. [`LinePanel`] holds the one [`RenderedUnit`] currently on
//! screen and replaces it atomically when the selection moves.
//!
//! ```rust
//! use pipelog_framework::{LinePanel, UnitKind};
//!
//! let mut panel = LinePanel::new();
//! panel.update(r#"{"msg": "line1\nline2"}"#, None);
//!
//! let unit = panel.current().unwrap();
//! assert_eq!(unit.kind, UnitKind::Structured);
//! assert!(unit.text.contains("line1\nline2"));
//! ```
//!
//! ## Providers
//!
//! A [`LogProvider`] yields raw lines; [`FileTailProvider`] follows a growing
//! file the way `tail -f` does, which is how a viewer started by the stdin
//! bridge reads its relay file.
//!
//! ## Viewer
//!
//! [`start_with_desc`] runs the interactive viewer: lines on top, the
//! rendered selection below.
//! - `j`/`k`, `↓`/`↑`: move, `g`/`G`: first/last line
//! - `Ctrl+d`/`Ctrl+u`: half page down/up
//! - `Tab`: switch focus between the list and the line panel
//! - `w`: toggle wrapping, `q`/`Esc`: quit

pub mod line_panel;
pub mod provider;

// re-export commonly used types
pub use line_panel::{
    ContentLanguage, DisplayHints, LinePanel, RenderedUnit, UnitKind, render_line,
};
pub use provider::{
    FileTailProvider, LogItem, LogProvider, MultiFileProvider, spawn_provider_thread,
};

// internal modules
pub(crate) mod app;
pub(crate) mod app_block;
pub(crate) mod content_line_maker;
pub(crate) mod log_list;
pub(crate) mod theme;

// public API for running the viewer
pub use app::{AppDesc, start_with_desc, start_with_provider};
