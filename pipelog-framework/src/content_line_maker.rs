use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrappingMode {
    Wrapped,
    Unwrapped,
}

/// strip ANSI CSI sequences, expand tabs and drop control chars other than '\n'
pub fn sanitize_control_chars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.next_if_eq(&'[').is_some() {
                    // parameters run until the final byte, which is alphabetic
                    for ch in chars.by_ref() {
                        if ch.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\t' => result.push_str(&" ".repeat(TAB_WIDTH)),
            '\n' => result.push('\n'),
            c if c.is_control() => {}
            c => result.push(c),
        }
    }

    result
}

/// turn plain content into display lines
pub fn content_into_lines(content: &str, width: u16, mode: WrappingMode) -> Vec<Line<'static>> {
    styled_into_lines(&[(content.to_string(), Style::default())], width, mode)
}

/// turn styled segments into display lines
///
/// segments may contain '\n', which always starts a new line; a trailing
/// empty line is dropped, so "a\n" yields a single line
pub fn styled_into_lines(
    segments: &[(String, Style)],
    width: u16,
    mode: WrappingMode,
) -> Vec<Line<'static>> {
    let logical = split_logical_lines(segments);
    match mode {
        WrappingMode::Unwrapped => logical.into_iter().map(Line::from).collect(),
        WrappingMode::Wrapped => {
            if width == 0 {
                return vec![];
            }
            logical
                .into_iter()
                .flat_map(|spans| wrap_spans(spans, width as usize))
                .collect()
        }
    }
}

fn split_logical_lines(segments: &[(String, Style)]) -> Vec<Vec<Span<'static>>> {
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];

    for (text, style) in segments {
        let sanitized = sanitize_control_chars(text);
        for (i, piece) in sanitized.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
            }
            if !piece.is_empty()
                && let Some(current) = lines.last_mut()
            {
                current.push(Span::styled(piece.to_string(), *style));
            }
        }
    }

    if lines.last().is_some_and(|spans| spans.is_empty()) {
        lines.pop();
    }

    lines
}

// wraps at character boundaries by display width
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    if spans.is_empty() {
        return vec![Line::default()];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in spans {
        let mut buffer = String::new();
        for ch in span.content.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > width && current_width > 0 {
                if !buffer.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut buffer), span.style));
                }
                lines.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }
            buffer.push(ch);
            current_width += ch_width;
        }
        if !buffer.is_empty() {
            current.push(Span::styled(buffer, span.style));
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    lines
}
