//! Floating panels: header menus, the emoji picker, mention suggestions, reaction summaries and
//! the comment action menu. Each is drawn through a [`Popover`] anchored to its trigger.
use comment_thread::{Comment, ReactionGroup};
use ratatui::{
    buffer::Buffer,
    layout::{Rect, Size},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph, Widget},
};

use crate::ui::{
    panel::{MenuItem, REACTION_EMOJI},
    popover::Popover,
};

/// Draws `lines` in a bordered box placed by `popover`. Nothing is drawn while the popover is
/// closed or has no content to measure.
pub fn render_popup(
    popover: &mut Popover,
    trigger: Rect,
    container: Rect,
    title: Option<&str>,
    lines: Vec<Line<'static>>,
    buf: &mut Buffer,
) {
    let content_width = lines.iter().map(Line::width).max().unwrap_or(0);
    let title_width = title.map_or(0, |t| t.chars().count());
    let width = if lines.is_empty() {
        0
    } else {
        (content_width.max(title_width) + 2) as u16
    };
    let size = Size::new(width, lines.len() as u16 + 2);
    let Some(placement) = popover.layout(trigger, size, container, 0) else {
        return;
    };
    let area = placement.area.intersection(*buf.area());
    if area.is_empty() {
        return;
    }
    let mut block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(Color::Cyan));
    if let Some(title) = title {
        block = block.title(title.to_string());
    }
    Clear.render(area, buf);
    Paragraph::new(lines).block(block).render(area, buf);
}

fn highlight(selected: bool) -> Style {
    if selected {
        Style::new().reversed().add_modifier(Modifier::BOLD)
    } else {
        Style::new()
    }
}

pub fn menu_lines(items: &[MenuItem], highlighted: usize) -> Vec<Line<'static>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mark = if item.checked { "✓ " } else { "  " };
            Line::from(vec![
                Span::styled(mark, Style::new().fg(Color::Green)),
                Span::styled(item.label.clone(), highlight(i == highlighted)),
            ])
        })
        .collect()
}

pub fn emoji_lines(highlighted: usize) -> Vec<Line<'static>> {
    let mut spans = Vec::with_capacity(REACTION_EMOJI.len() * 2);
    for (i, emoji) in REACTION_EMOJI.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*emoji, highlight(i == highlighted)));
    }
    vec![Line::from(spans)]
}

pub fn mention_lines(names: &[String], highlighted: usize) -> Vec<Line<'static>> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Line::from(vec![
                Span::styled("@", Style::new().fg(Color::Cyan)),
                Span::styled(name.clone(), highlight(i == highlighted)),
            ])
        })
        .collect()
}

pub fn reaction_summary_lines(groups: &[ReactionGroup]) -> Vec<Line<'static>> {
    groups
        .iter()
        .map(|g| Line::from(g.summary()).style(Style::new().dim()))
        .collect()
}

/// Entries of the per-comment action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Reply,
    React,
    Edit,
    Resolve,
    Pin,
    CopyLink,
    Delete,
}

impl CommentAction {
    /// Actions offered for `comment`; resolved comments cannot be replied to or reacted to.
    pub fn available(comment: &Comment, effectively_resolved: bool, in_thread: bool) -> Vec<Self> {
        let mut actions = Vec::with_capacity(7);
        if !effectively_resolved {
            if !in_thread {
                actions.push(CommentAction::Reply);
            }
            actions.push(CommentAction::React);
        }
        actions.push(CommentAction::Edit);
        if comment.is_top_level() {
            actions.push(CommentAction::Resolve);
            actions.push(CommentAction::Pin);
        }
        actions.push(CommentAction::CopyLink);
        actions.push(CommentAction::Delete);
        actions
    }

    pub fn label(&self, comment: &Comment) -> &'static str {
        match self {
            CommentAction::Reply => "Reply",
            CommentAction::React => "Add reaction",
            CommentAction::Edit => "Edit",
            CommentAction::Resolve if comment.resolved => "Re-open",
            CommentAction::Resolve => "Resolve",
            CommentAction::Pin if comment.is_pinned => "Unpin",
            CommentAction::Pin => "Pin",
            CommentAction::CopyLink => "Copy link",
            CommentAction::Delete => "Delete",
        }
    }
}

pub fn action_lines(
    actions: &[CommentAction],
    comment: &Comment,
    highlighted: usize,
) -> Vec<Line<'static>> {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let style = if *action == CommentAction::Delete {
                highlight(i == highlighted).fg(Color::Red)
            } else {
                highlight(i == highlighted)
            };
            Line::styled(action.label(comment), style)
        })
        .collect()
}
