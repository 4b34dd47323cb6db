use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BlockExt, Clear, Widget},
};
use textwrap::core::display_width;
use tracing::trace;

/// One line of a help screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpElementKind {
    Keybind(&'static str, &'static str),
    Text(&'static str),
}

#[macro_export]
macro_rules! help_keybind {
    ($key:expr, $description:expr) => {
        $crate::ui::components::help::HelpElementKind::Keybind($key, $description)
    };
}

#[macro_export]
macro_rules! help_text {
    ($text:expr) => {
        $crate::ui::components::help::HelpElementKind::Text($text)
    };
}

/// Keys flush left, descriptions flush right, free text centered and wrapped to `width`.
pub fn help_elements_to_text(elements: &[HelpElementKind], width: u16) -> Text<'static> {
    let mut lines = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            HelpElementKind::Keybind(key, description) => {
                let used = display_width(key) + display_width(description);
                let padding = usize::from(width).saturating_sub(used).max(1);
                lines.push(Line::from(vec![
                    Span::styled(
                        *key,
                        Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" ".repeat(padding)),
                    Span::raw(*description),
                ]));
            }
            HelpElementKind::Text(text) => {
                let wrapped = textwrap::wrap(text, usize::from(width).max(1));
                if wrapped.is_empty() {
                    lines.push(Line::default());
                }
                lines.extend(wrapped.into_iter().map(|line| Line::from(line).centered()));
            }
        }
    }
    Text::from(lines)
}

/// A centered help box. `set_constraint` gives its width as a percentage of the parent area and
/// its maximum height in rows.
pub struct HelpComponent<'a> {
    constraint: u16,
    content: &'a [HelpElementKind],
    block: Option<ratatui::widgets::Block<'a>>,
}

impl<'a> HelpComponent<'a> {
    pub fn new(content: &'a [HelpElementKind]) -> Self {
        Self {
            content,
            constraint: 0,
            block: None,
        }
    }

    pub fn set_constraint(self, constraint: u16) -> Self {
        Self { constraint, ..self }
    }

    pub fn block(self, block: ratatui::widgets::Block<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }
}

impl<'a> Widget for HelpComponent<'a> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        use ratatui::layout::Constraint::{Length, Percentage};
        trace!(lines = self.content.len(), "Rendering help");
        let mut centered_area = if self.constraint != 0 {
            area.centered(Percentage(self.constraint), Length(self.constraint))
        } else {
            area
        };
        let mut inner = self.block.inner_if_some(centered_area);
        let text = help_elements_to_text(self.content, inner.width);
        let text_height = (text.height() as u16).min(inner.height);
        let y_offset = |h: u16| h.saturating_sub(text_height) / 2;
        inner.y += y_offset(inner.height);
        inner.height = text_height;
        centered_area.y += y_offset(centered_area.height).saturating_sub(1);
        centered_area.height = (text_height + 2).min(area.height);
        Clear.render(centered_area, buf);
        self.block.render(centered_area, buf);
        text.render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keybinds_span_the_full_width() {
        let text = help_elements_to_text(&[crate::help_keybind!("Ctrl+S", "post")], 20);
        assert_eq!(text.lines[0].width(), 20);
        let text = help_elements_to_text(&[crate::help_keybind!("Ctrl+S", "post")], 4);
        assert_eq!(text.lines[0].width(), "Ctrl+S post".len());
    }

    #[test]
    fn empty_text_keeps_its_line() {
        let text = help_elements_to_text(
            &[crate::help_text!("Title"), crate::help_text!("")],
            20,
        );
        assert_eq!(text.lines.len(), 2);
    }
}
