//! Rendering of a single selected log line.
//!
//! A line is either a JSON document, shown pretty-printed and highlighted, or
//! anything else, shown as is. [`render_line`] makes that decision and
//! produces a [`RenderedUnit`]; [`LinePanel`] holds the unit currently on
//! screen and swaps it out when the selection changes.
//!
//! ```text
//!   "{\"msg\": \"a\\nb\"}"
//!        │ serde_json::from_str
//!        ▼
//!   Value ──unescape string leaves──> Value ──pretty-print──> String
//!                                                                   │ unescape
//!                                                                   ▼
//!                                                RenderedUnit { Structured, .. }
//! ```
//!
//! Unescaping runs twice, once on every string leaf and once on the
//! serialized text, each exactly once. The first pass undoes strings that
//! were escaped before being embedded in the log line; the second turns the
//! escapes the serializer writes back into real characters.
//!
//! Nesting depth is capped at 1000 levels, independent of the call stack.

mod highlight;
mod json;
mod unescape;

pub use highlight::unit_into_lines;
pub use unescape::unescape;

use chrono::NaiveDateTime;
use serde_json::Value;

/// how a unit was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// the line parsed as JSON and was pretty-printed
    Structured,
    /// the line is shown verbatim
    Plain,
}

/// content type marker used to pick a highlighter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentLanguage {
    Json,
}

impl ContentLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }
}

/// Presentation hints for whoever draws the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHints {
    pub language: Option<ContentLanguage>,
    pub read_only: bool,
    pub soft_wrap: bool,
    /// when set, the focus-navigation key moves focus away instead of being
    /// consumed by the panel
    pub tab_releases_focus: bool,
    pub line_numbers: bool,
}

impl DisplayHints {
    fn structured() -> Self {
        Self {
            language: Some(ContentLanguage::Json),
            read_only: true,
            soft_wrap: true,
            tab_releases_focus: true,
            line_numbers: false,
        }
    }

    fn plain() -> Self {
        Self {
            language: None,
            read_only: true,
            soft_wrap: true,
            tab_releases_focus: false,
            line_numbers: false,
        }
    }
}

/// The display-ready form of one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub kind: UnitKind,
    pub text: String,
    pub timestamp: Option<NaiveDateTime>,
    pub hints: DisplayHints,
}

impl RenderedUnit {
    pub fn is_structured(&self) -> bool {
        self.kind == UnitKind::Structured
    }
}

/// Render one log line.
///
/// Never fails: anything that is not a JSON document (including the empty
/// string) becomes a plain unit holding `line` unchanged.
pub fn render_line(line: &str, timestamp: Option<NaiveDateTime>) -> RenderedUnit {
    match format_json(line) {
        Some(text) => RenderedUnit {
            kind: UnitKind::Structured,
            text,
            timestamp,
            hints: DisplayHints::structured(),
        },
        None => RenderedUnit {
            kind: UnitKind::Plain,
            text: line.to_string(),
            timestamp,
            hints: DisplayHints::plain(),
        },
    }
}

/// parse, unescape string leaves, pretty-print and unescape the result
///
/// returns None when `line` is not a JSON document
fn format_json(line: &str) -> Option<String> {
    let mut value = json::parse(line)?;
    unescape_leaves(&mut value);

    let pretty = json::to_pretty(&value);
    json::dismantle(value);
    Some(unescape(&pretty?).into_owned())
}

// iterative so nesting depth is bounded by the heap, not the call stack
fn unescape_leaves(root: &mut Value) {
    let mut pending = vec![root];

    while let Some(value) = pending.pop() {
        match value {
            Value::String(s) => {
                if s.contains('\\') {
                    *s = unescape(s).into_owned();
                }
            }
            Value::Array(items) => pending.extend(items.iter_mut()),
            Value::Object(map) => pending.extend(map.values_mut()),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

/// Holds the unit currently shown for the selected line.
///
/// There is at most one unit at a time. [`LinePanel::update`] renders the new
/// line completely before swapping it in with a single assignment, so a
/// reader never observes an empty panel between two units.
#[derive(Debug, Default)]
pub struct LinePanel {
    current: Option<RenderedUnit>,
}

impl LinePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current unit with the rendering of `line`.
    ///
    /// Returns the unit that was replaced, if any.
    pub fn update(
        &mut self,
        line: &str,
        timestamp: Option<NaiveDateTime>,
    ) -> Option<RenderedUnit> {
        let unit = render_line(line, timestamp);
        self.current.replace(unit)
    }

    pub fn current(&self) -> Option<&RenderedUnit> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) -> Option<RenderedUnit> {
        self.current.take()
    }

    pub fn unit_count(&self) -> usize {
        usize::from(self.current.is_some())
    }
}
