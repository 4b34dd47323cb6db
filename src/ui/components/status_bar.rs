use rat_widget::statusline_stacked::StatusLineStacked;
use ratatui::buffer::Buffer;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::Widget;
use ratatui_macros::span;
use std::sync::atomic::Ordering;

use crate::ui::components::DumbComponent;
use crate::ui::components::comment_panel::COMMENT_COUNT;
use crate::ui::{AppState, layout::Layout};

pub struct StatusBar {
    source_label: String,
    user_label: String,
}

impl StatusBar {
    pub fn new(app_state: &AppState) -> Self {
        Self {
            source_label: format!(" {} ", app_state.source_label),
            user_label: format!(" Commenting as {} ", app_state.config.current_user),
        }
    }

    fn count_text(count: usize) -> String {
        match count {
            1 => " 1 comment ".to_string(),
            n => format!(" {n} comments "),
        }
    }

    pub fn render(&mut self, area: Layout, buf: &mut Buffer) {
        let count_text = Self::count_text(COMMENT_COUNT.load(Ordering::Relaxed));

        StatusLineStacked::new()
            .start(
                span!(self.user_label.as_str()).style(Style::new().black().on_green()),
                " ",
            )
            .start(span!(self.source_label.as_str()).style(Style::new()), " ")
            .end(span!(count_text).style(Style::new().black().on_blue()), " ")
            .render(area.status_bar, buf);
    }
}

impl DumbComponent for StatusBar {
    fn render(&mut self, area: Layout, buf: &mut Buffer) {
        self.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_read_naturally() {
        assert_eq!(StatusBar::count_text(0), " 0 comments ");
        assert_eq!(StatusBar::count_text(1), " 1 comment ");
        assert_eq!(StatusBar::count_text(12), " 12 comments ");
    }
}
