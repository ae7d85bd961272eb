use super::App;
use crate::{app_block::AppBlock, line_panel::unit_into_lines, theme};
use ratatui::{
    prelude::*,
    widgets::{List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

impl App {
    pub(super) fn render_logs(&mut self, area: Rect, buf: &mut Buffer) {
        let focused = self.is_logs_block_focused();
        let [content_area, scrollbar_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let inner = self.logs_block.get_content_rect(content_area, focused);
        let height = inner.height as usize;
        self.last_logs_viewport_height = height;

        // keep the selection inside the viewport
        let mut top = self.logs_block.get_scroll_position();
        if let Some(selected) = self.log_list.selected() {
            if selected < top {
                top = selected;
            } else if height > 0 && selected >= top + height {
                top = selected + 1 - height;
            }
        }
        self.logs_block.set_scroll_position(top);
        self.logs_block.set_lines_count(self.logs.len(), height);
        let top = self.logs_block.get_scroll_position();

        let visible: Vec<ListItem> = self
            .logs
            .iter()
            .skip(top)
            .take(height)
            .map(|item| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", item.time), theme::TIMESTAMP_STYLE),
                    Span::styled(
                        item.preview().to_string(),
                        Style::new().fg(theme::TEXT_FG_COLOR),
                    ),
                ]))
            })
            .collect();

        let mut window_state = ListState::default()
            .with_selected(self.log_list.selected().map(|i| i.saturating_sub(top)));

        let list = List::new(visible)
            .block(self.logs_block.build(focused))
            .highlight_style(theme::SELECTED_STYLE);
        StatefulWidget::render(list, content_area, buf, &mut window_state);

        StatefulWidget::render(
            AppBlock::create_scrollbar(focused),
            scrollbar_area,
            buf,
            self.logs_block.get_scrollbar_state(),
        );
    }

    pub(super) fn render_line_panel(&mut self, area: Rect, buf: &mut Buffer) {
        let focused = !self.is_logs_block_focused();
        let [content_area, scrollbar_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let inner = self.panel_block.get_content_rect(content_area, focused);

        let lines = match self.line_panel.current() {
            Some(unit) => {
                let mut lines = Vec::new();
                if let Some(ts) = unit.timestamp {
                    lines.push(Line::from(vec![
                        "Time: ".bold(),
                        ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string().into(),
                    ]));
                }
                lines.extend(unit_into_lines(unit, inner.width, self.wrap_enabled));
                let language = unit.hints.language.map(|l| l.name()).unwrap_or("text");
                self.panel_block.update_title(format!("[2]─Line ({})", language));
                lines
            }
            None => {
                self.panel_block.update_title("[2]─Line");
                vec![Line::from("Select a line to see it here...".italic())]
            }
        };

        let height = inner.height as usize;
        self.last_panel_viewport_height = height;
        self.panel_block.set_lines_count(lines.len(), height);
        let top = self.panel_block.get_scroll_position();

        let visible: Vec<Line> = lines.into_iter().skip(top).take(height).collect();
        Paragraph::new(visible)
            .block(self.panel_block.build(focused))
            .render(content_area, buf);

        StatefulWidget::render(
            AppBlock::create_scrollbar(focused),
            scrollbar_area,
            buf,
            self.panel_block.get_scrollbar_state(),
        );
    }

    pub(super) fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let position = match self.log_list.selected() {
            Some(i) => format!("{}/{}", i + 1, self.logs.len()),
            None => format!("-/{}", self.logs.len()),
        };
        let mode = if self.follow { "following" } else { "paused" };
        let wrap = if self.wrap_enabled { "wrap" } else { "nowrap" };

        let text = format!(
            " {} | {} | {}   j/k move  g/G ends  Tab focus  w wrap  q quit",
            position, mode, wrap
        );
        Paragraph::new(text)
            .style(theme::FOOTER_STYLE)
            .render(area, buf);
    }
}
