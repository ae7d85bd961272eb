use super::{ContentLanguage, RenderedUnit};
use crate::{
    content_line_maker::{WrappingMode, content_into_lines, styled_into_lines},
    theme,
};
use ratatui::{style::Style, text::Line};

/// Lay out a unit for drawing `width` columns wide.
///
/// Units hinting a language are highlighted. Wrapping happens only when the
/// unit allows soft wrap and `wrap` is requested by the viewer.
pub fn unit_into_lines(unit: &RenderedUnit, width: u16, wrap: bool) -> Vec<Line<'static>> {
    let mode = if wrap && unit.hints.soft_wrap {
        WrappingMode::Wrapped
    } else {
        WrappingMode::Unwrapped
    };

    match unit.hints.language {
        Some(ContentLanguage::Json) => {
            styled_into_lines(&json_segments(&unit.text), width, mode)
        }
        None => content_into_lines(&unit.text, width, mode),
    }
}

/// split pretty-printed JSON into styled segments
///
/// the text has been unescaped, so strings may hold raw quotes or line
/// breaks; the scanner is lenient and just keeps going
fn json_segments(text: &str) -> Vec<(String, Style)> {
    let mut segments = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();
        let style = match c {
            '"' => {
                let mut escaped = false;
                for (i, ch) in chars.by_ref() {
                    end = i + ch.len_utf8();
                    match ch {
                        '\\' if !escaped => escaped = true,
                        '"' if !escaped => break,
                        _ => escaped = false,
                    }
                }
                if next_non_space(&text[end..]) == Some(':') {
                    theme::JSON_KEY_STYLE
                } else {
                    theme::JSON_STRING_STYLE
                }
            }
            '-' | '0'..='9' => {
                while let Some((i, ch)) =
                    chars.next_if(|(_, ch)| ch.is_ascii_digit() || "+-.eE".contains(*ch))
                {
                    end = i + ch.len_utf8();
                }
                theme::JSON_NUMBER_STYLE
            }
            c if c.is_ascii_alphabetic() => {
                while let Some((i, ch)) = chars.next_if(|(_, ch)| ch.is_ascii_alphabetic()) {
                    end = i + ch.len_utf8();
                }
                theme::JSON_LITERAL_STYLE
            }
            '{' | '}' | '[' | ']' | ',' | ':' => theme::JSON_PUNCT_STYLE,
            _ => Style::default(),
        };
        push_segment(&mut segments, &text[start..end], style);
    }

    segments
}

fn next_non_space(s: &str) -> Option<char> {
    s.chars().find(|c| !c.is_whitespace())
}

// merge runs sharing a style to keep span counts low
fn push_segment(segments: &mut Vec<(String, Style)>, piece: &str, style: Style) {
    match segments.last_mut() {
        Some((text, last_style)) if *last_style == style => text.push_str(piece),
        _ => segments.push((piece.to_string(), style)),
    }
}
