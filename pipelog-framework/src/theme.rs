use ratatui::{prelude::*, style::Color};

pub const TEXT_FG_COLOR: Color = Color::Gray;

pub const BORDER_COLOR: Color = Color::LightGreen;

pub const SELECTED_STYLE: Style = Style::new().bg(Color::DarkGray);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Gray);

pub const TIMESTAMP_STYLE: Style = Style::new().fg(Color::DarkGray);

// JSON highlighting, close to monokai
pub const JSON_KEY_STYLE: Style = Style::new().fg(Color::LightMagenta);

pub const JSON_STRING_STYLE: Style = Style::new().fg(Color::LightYellow);

pub const JSON_NUMBER_STYLE: Style = Style::new().fg(Color::LightBlue);

pub const JSON_LITERAL_STYLE: Style = Style::new()
    .fg(Color::LightCyan)
    .add_modifier(Modifier::ITALIC);

pub const JSON_PUNCT_STYLE: Style = Style::new().fg(Color::White);
