//! Short-lived notices drawn over the panel.
//!
//! Showing a toast spawns a timer that sends [`ToastMessage::Hide`] back through the action
//! channel. Each hide names the toast it belongs to, so a timer left over from an earlier toast
//! never dismisses a newer one.
use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Rect, Size},
    style::{Color, Style},
    symbols,
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, WidgetRef},
};
use textwrap::{core::display_width, wrap};
use tracing::debug;

use crate::ui::Action;

const MAX_TOAST_WIDTH: u16 = 40;
const PADDING: u16 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl From<ToastType> for Color {
    fn from(value: ToastType) -> Self {
        match value {
            ToastType::Info => Color::Blue,
            ToastType::Success => Color::Green,
            ToastType::Warning => Color::Yellow,
            ToastType::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastMessage {
    Show {
        message: String,
        toast_type: ToastType,
        duration: Duration,
    },
    Hide {
        id: u64,
    },
}

impl From<ToastMessage> for Action {
    fn from(value: ToastMessage) -> Self {
        Action::Toast(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    id: u64,
    message: String,
    toast_type: ToastType,
}

impl WidgetRef for Toast {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.message.as_str())
            .block(
                Block::default()
                    .borders(Borders::LEFT | Borders::RIGHT)
                    .border_set(symbols::border::QUADRANT_OUTSIDE)
                    .padding(Padding::horizontal(PADDING))
                    .border_style(Style::default().fg(self.toast_type.into())),
            )
            .render(area, buf);
    }
}

/// Holds at most one toast and places it in the top-right corner of its area.
#[derive(Debug, Default)]
pub struct ToastEngine {
    area: Rect,
    tx: Option<tokio::sync::mpsc::Sender<Action>>,
    next_id: u64,
    current: Option<Toast>,
}

impl ToastEngine {
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            ..Default::default()
        }
    }

    pub fn action_tx(mut self, tx: tokio::sync::mpsc::Sender<Action>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn has_toast(&self) -> bool {
        self.current.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.message.as_str())
    }

    pub fn handle(&mut self, message: ToastMessage) {
        match message {
            ToastMessage::Show {
                message,
                toast_type,
                duration,
            } => self.show(message, toast_type, duration),
            ToastMessage::Hide { id } => self.hide(id),
        }
    }

    fn show(&mut self, message: String, toast_type: ToastType, duration: Duration) {
        self.next_id += 1;
        let id = self.next_id;
        debug!(id, %message, "Showing toast");
        self.current = Some(Toast {
            id,
            message,
            toast_type,
        });
        if let Some(tx) = self.tx.clone() {
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let _ = tx.send(ToastMessage::Hide { id }.into()).await;
            });
        }
    }

    fn hide(&mut self, id: u64) {
        if self.current.as_ref().is_some_and(|t| t.id == id) {
            self.current = None;
        }
    }

    pub fn toast_area(&self) -> Option<Rect> {
        let toast = self.current.as_ref()?;
        let max_width = MAX_TOAST_WIDTH.min(self.area.width);
        let text_width = display_width(&toast.message) as u16 + (PADDING + 1) * 2;
        let width = text_width.min(max_width);
        let inner = usize::from(width.saturating_sub((PADDING + 1) * 2).max(1));
        let height = (wrap(&toast.message, inner).len() as u16).min(self.area.height);
        Some(top_right(self.area, Size { width, height }))
    }
}

fn top_right(area: Rect, Size { width, height }: Size) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area.y,
        width,
        height,
    }
}

impl Widget for &ToastEngine {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        if let (Some(toast), Some(area)) = (&self.current, self.toast_area()) {
            Clear.render(area, buf);
            toast.render_ref(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(engine: &mut ToastEngine, message: &str) {
        engine.handle(ToastMessage::Show {
            message: message.to_string(),
            toast_type: ToastType::Success,
            duration: Duration::from_secs(2),
        });
    }

    #[test]
    fn stale_hides_keep_the_newer_toast() {
        let mut engine = ToastEngine::new(Rect::new(0, 0, 80, 24));
        show(&mut engine, "first");
        show(&mut engine, "Link copied");
        engine.handle(ToastMessage::Hide { id: 1 });
        assert_eq!(engine.message(), Some("Link copied"));
        engine.handle(ToastMessage::Hide { id: 2 });
        assert!(!engine.has_toast());
    }

    #[test]
    fn sits_in_the_top_right_corner() {
        let mut engine = ToastEngine::new(Rect::new(0, 0, 80, 24));
        assert_eq!(engine.toast_area(), None);
        show(&mut engine, "Link copied");
        assert_eq!(engine.toast_area(), Some(Rect::new(65, 0, 15, 1)));
    }

    #[tokio::test]
    async fn hides_itself_after_the_duration() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let mut engine = ToastEngine::new(Rect::new(0, 0, 80, 24)).action_tx(tx);
        engine.handle(ToastMessage::Show {
            message: "Link copied".to_string(),
            toast_type: ToastType::Success,
            duration: Duration::from_millis(10),
        });
        let Some(Action::Toast(hide)) = rx.recv().await else {
            panic!("expected a hide message");
        };
        assert_eq!(hide, ToastMessage::Hide { id: 1 });
        engine.handle(hide);
        assert!(!engine.has_toast());
    }
}
