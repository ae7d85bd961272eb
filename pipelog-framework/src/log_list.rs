use ratatui::widgets::ListState;

/// selection over the received lines
pub struct LogList {
    len: usize,
    pub state: ListState,
}

impl LogList {
    pub fn new() -> Self {
        Self {
            len: 0,
            state: ListState::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if let Some(i) = self.state.selected()
            && i >= len
        {
            self.state.select(len.checked_sub(1));
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    /// move the selection by `delta`, stopping at either end
    pub fn select_relative(&mut self, delta: isize) {
        if self.len == 0 {
            self.state.select(None);
            return;
        }

        let next = match self.state.selected() {
            Some(i) => i.saturating_add_signed(delta).min(self.len - 1),
            None if delta < 0 => self.len - 1,
            None => 0,
        };
        self.state.select(Some(next));
    }

    pub fn select_first(&mut self) {
        self.state.select(if self.is_empty() { None } else { Some(0) });
    }

    pub fn select_last(&mut self) {
        self.state.select(self.len.checked_sub(1));
    }
}

impl Default for LogList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_has_no_selection() {
        let mut list = LogList::new();
        list.select_relative(1);
        assert_eq!(list.selected(), None);
        list.select_last();
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn test_relative_selection_stops_at_ends() {
        let mut list = LogList::new();
        list.set_len(3);

        list.select_relative(1);
        assert_eq!(list.selected(), Some(0));
        list.select_relative(10);
        assert_eq!(list.selected(), Some(2));
        list.select_relative(-10);
        assert_eq!(list.selected(), Some(0));
    }

    #[test]
    fn test_moving_up_without_selection_picks_last() {
        let mut list = LogList::new();
        list.set_len(4);
        list.select_relative(-1);
        assert_eq!(list.selected(), Some(3));
    }

    #[test]
    fn test_shrinking_clamps_selection() {
        let mut list = LogList::new();
        list.set_len(5);
        list.select_last();
        list.set_len(2);
        assert_eq!(list.selected(), Some(1));
    }
}
