use super::App;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.is_exiting = true,
            KeyCode::Char('c') if ctrl => self.is_exiting = true,
            // the line panel never keeps Tab, so focus always cycles
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Char('w') => {
                self.wrap_enabled = !self.wrap_enabled;
                log::debug!("Text wrapping: {}", self.wrap_enabled);
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_by(-1),
            KeyCode::Char('d') if ctrl => self.move_by(self.half_page()),
            KeyCode::Char('u') if ctrl => self.move_by(-self.half_page()),
            KeyCode::PageDown => self.move_by(self.half_page() * 2),
            KeyCode::PageUp => self.move_by(-self.half_page() * 2),
            KeyCode::Char('g') | KeyCode::Home => self.jump_to_first(),
            KeyCode::Char('G') | KeyCode::End => self.jump_to_last(),
            _ => {}
        }
    }

    fn toggle_focus(&mut self) {
        self.focused_block_id = if self.is_logs_block_focused() {
            self.panel_block.id()
        } else {
            self.logs_block.id()
        };
    }

    fn half_page(&self) -> isize {
        let height = if self.is_logs_block_focused() {
            self.last_logs_viewport_height
        } else {
            self.last_panel_viewport_height
        };
        (height / 2).max(1) as isize
    }

    fn move_by(&mut self, delta: isize) {
        if self.is_logs_block_focused() {
            self.log_list.select_relative(delta);
            self.follow = self.log_list.selected() == self.log_list.len().checked_sub(1);
            self.sync_line_panel();
        } else {
            self.panel_block.scroll_by(delta);
        }
    }

    fn jump_to_first(&mut self) {
        if self.is_logs_block_focused() {
            self.log_list.select_first();
            self.follow = self.log_list.len() <= 1;
            self.sync_line_panel();
        } else {
            self.panel_block.set_scroll_position(0);
        }
    }

    fn jump_to_last(&mut self) {
        if self.is_logs_block_focused() {
            self.log_list.select_last();
            self.follow = true;
            self.sync_line_panel();
        } else {
            self.panel_block
                .set_scroll_position(self.panel_block.get_lines_count());
        }
    }
}
