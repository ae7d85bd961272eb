use crate::theme;
use ratatui::{
    layout::Rect,
    prelude::Stylize,
    style::{Color, Style},
    symbols::scrollbar,
    widgets::{Block, BorderType, Borders, Padding, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use uuid::Uuid;

fn border_color(focused: bool) -> Color {
    if focused {
        theme::BORDER_COLOR
    } else {
        Color::DarkGray
    }
}

/// a bordered, scrollable panel of the viewer
pub struct AppBlock {
    id: Uuid,
    title: Option<String>,
    lines_count: usize,
    scroll_position: usize,
    scrollbar_state: ScrollbarState,
    padding: Option<Padding>,
}

impl AppBlock {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: None,
            lines_count: 0,
            scroll_position: 0,
            scrollbar_state: ScrollbarState::default(),
            padding: None,
        }
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.update_title(title);
        self
    }

    pub fn set_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn update_title(&mut self, title: impl Into<String>) {
        self.title = Some(format!("─{}", title.into()));
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn build(&self, focused: bool) -> Block<'_> {
        let mut block = Block::default()
            .borders(Borders::TOP | Borders::LEFT)
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(border_color(focused)));

        if let Some(title) = &self.title {
            let title_style = if focused {
                Style::new().bold()
            } else {
                Style::new()
            };
            block = block.title(
                ratatui::prelude::Line::from(title.as_str())
                    .style(title_style)
                    .left_aligned(),
            );
        }

        if let Some(padding) = self.padding {
            block = block.padding(padding);
        }

        block
    }

    /// record the content length and clamp the scroll position to it
    pub fn set_lines_count(&mut self, lines_count: usize, viewport_height: usize) {
        self.lines_count = lines_count;
        let max_scroll = lines_count.saturating_sub(viewport_height);
        self.scroll_position = self.scroll_position.min(max_scroll);
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(max_scroll.max(1))
            .position(self.scroll_position);
    }

    pub fn get_lines_count(&self) -> usize {
        self.lines_count
    }

    pub fn set_scroll_position(&mut self, scroll_position: usize) {
        self.scroll_position = scroll_position;
    }

    pub fn get_scroll_position(&self) -> usize {
        self.scroll_position
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll_position = self.scroll_position.saturating_add_signed(delta);
    }

    pub fn get_scrollbar_state(&mut self) -> &mut ScrollbarState {
        &mut self.scrollbar_state
    }

    pub fn create_scrollbar(focused: bool) -> Scrollbar<'static> {
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(scrollbar::VERTICAL)
            .style(Style::default().fg(border_color(focused)))
            .begin_symbol(Some("╮"))
            .end_symbol(Some("╯"))
            .track_symbol(Some("│"))
            .thumb_symbol("█")
    }

    /// content rectangle inside the block borders
    pub fn get_content_rect(&self, area: Rect, focused: bool) -> Rect {
        self.build(focused).inner(area)
    }
}

impl Default for AppBlock {
    fn default() -> Self {
        Self::new()
    }
}
