use ratatui::layout::Rect;
use ratatui_macros::vertical;

/// Height of the composer including its border.
pub const COMPOSER_HEIGHT: u16 = 5;

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub tabs: Rect,
    pub header: Rect,
    pub main_content: Rect,
    pub composer: Rect,
    pub status_bar: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        let [tabs, header, main_content, composer, status_bar] =
            vertical![==1, ==1, *=1, ==COMPOSER_HEIGHT, ==1].areas(area);
        Self {
            tabs,
            header,
            main_content,
            composer,
            status_bar,
        }
    }

    /// Layout of a panel that has no composer (loading, error and placeholder views).
    pub fn without_composer(area: Rect) -> Self {
        let [tabs, header, main_content, status_bar] =
            vertical![==1, ==1, *=1, ==1].areas(area);
        Self {
            tabs,
            header,
            main_content,
            composer: Rect::new(main_content.x, main_content.bottom(), main_content.width, 0),
            status_bar,
        }
    }
}
