//! Rendering of the comment rows: the card of each comment and the scrolling list around them.
use chrono::{DateTime, Utc};
use comment_thread::{Comment, CommentId, SpanKind, group_reactions, tokenize};
use rat_widget::focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use textwrap::core::display_width;

use crate::ui::{panel::Row, utils::relative_time};

const GUTTER: u16 = 2;

/// Focus target and scroll position of the list. Row areas are recorded on every render so
/// popovers can anchor to the row they belong to.
#[derive(Debug, Default)]
pub struct CommentListState {
    pub focus: FocusFlag,
    pub area: Rect,
    offset: usize,
    row_areas: Vec<(Row, Rect)>,
}

impl CommentListState {
    pub fn new() -> Self {
        Self {
            focus: FocusFlag::new().with_name("comment_list"),
            ..Default::default()
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Scrolls by `delta` rows and returns whether the offset moved.
    pub fn scroll_by(&mut self, delta: isize, rows: usize) -> bool {
        let max = rows.saturating_sub(1);
        let next = self.offset.saturating_add_signed(delta).min(max);
        let moved = next != self.offset;
        self.offset = next;
        moved
    }

    pub fn row_area(&self, row: Row) -> Option<Rect> {
        self.row_areas
            .iter()
            .find(|(r, _)| *r == row)
            .map(|(_, area)| *area)
    }
}

impl HasFocus for CommentListState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.leaf_widget(self);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

/// First row to draw so that `selected` is fully visible, moving as little as possible.
pub fn scroll_into_view(offset: usize, selected: usize, heights: &[u16], viewport: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let selected = selected.min(heights.len() - 1);
    if selected < offset {
        return selected;
    }
    let mut offset = offset.min(selected);
    let span = |from: usize| -> u32 { heights[from..=selected].iter().map(|h| u32::from(*h)).sum() };
    while offset < selected && span(offset) > u32::from(viewport) {
        offset += 1;
    }
    offset
}

/// Everything a card needs besides the comment itself.
#[derive(Debug, Clone, Copy)]
pub struct CardContext<'a> {
    pub current_user: &'a str,
    pub now: DateTime<Utc>,
    pub effectively_resolved: bool,
    pub replying_to: Option<&'a str>,
    /// Replies under a top-level comment in the main view.
    pub reply_count: Option<usize>,
    pub confirm_delete: bool,
}

pub fn comment_card(comment: &Comment, ctx: CardContext<'_>, width: usize) -> Vec<Line<'static>> {
    let is_self = comment.author.name == ctx.current_user;
    let author_style = if is_self {
        Style::new().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let mut header = vec![
        Span::styled(comment.author.name.clone(), author_style),
        Span::raw("  "),
        Span::styled(relative_time(comment.created_at, ctx.now), Style::new().dim()),
    ];
    if comment.is_edited {
        header.push(Span::styled(" (edited)", Style::new().dim().italic()));
    }
    if comment.is_pinned {
        header.push(Span::styled("  📌 Pinned", Style::new().fg(Color::Yellow)));
    }
    if comment.resolved {
        header.push(Span::styled("  ✓ Resolved", Style::new().fg(Color::Green)));
    }
    let mut lines = vec![Line::from(header)];

    if let Some(name) = ctx.replying_to {
        lines.push(Line::from(vec![
            Span::styled("↳ replying to ", Style::new().dim()),
            Span::styled(format!("@{name}"), token_style(SpanKind::Mention)),
        ]));
    }

    let mut wrapper = SpanWrapper::new(width);
    for span in tokenize(&comment.text) {
        wrapper.push_text(span.text, token_style(span.kind));
    }
    lines.extend(wrapper.finish());

    if let Some(attachment) = &comment.attachment {
        lines.push(Line::from(vec![
            Span::styled("🖼 ", Style::new()),
            Span::styled(attachment_label(&attachment.url, width), Style::new().dim().underlined()),
        ]));
    }

    let groups = group_reactions(&comment.reactions, ctx.current_user);
    if !groups.is_empty() {
        let mut spans = Vec::new();
        for group in groups {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            let style = if group.reacted {
                Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::new()
            };
            spans.push(Span::styled(format!("{} {}", group.emoji, group.count()), style));
        }
        lines.push(Line::from(spans));
    }

    match ctx.reply_count {
        Some(0) | None => {}
        Some(1) => lines.push(Line::styled("💬 1 reply", Style::new().fg(Color::Blue))),
        Some(n) => lines.push(Line::styled(
            format!("💬 {n} replies"),
            Style::new().fg(Color::Blue),
        )),
    }

    if ctx.confirm_delete {
        lines.push(Line::styled(
            "Delete this comment and its replies? Press d again, Esc to cancel.",
            Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    if ctx.effectively_resolved {
        for line in &mut lines {
            line.style = line.style.add_modifier(Modifier::DIM);
        }
    }
    lines
}

pub fn load_more_line(label: &str) -> Vec<Line<'static>> {
    vec![Line::styled(
        label.to_string(),
        Style::new().fg(Color::Blue).underlined(),
    )]
}

fn token_style(kind: SpanKind) -> Style {
    match kind {
        SpanKind::Plain => Style::new(),
        SpanKind::Link => Style::new().fg(Color::Blue).underlined(),
        SpanKind::Hashtag => Style::new().fg(Color::Magenta),
        SpanKind::Mention => Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    }
}

fn attachment_label(url: &str, width: usize) -> String {
    if let Some(rest) = url.strip_prefix("data:") {
        let mime = rest.split(';').next().unwrap_or("image");
        let kib = rest.len() * 3 / 4 / 1024;
        return format!("{mime} attachment ({kib} KiB)");
    }
    crate::ui::utils::truncate(url, width.saturating_sub(2))
}

/// One entry of the list after layout.
pub struct ListEntry {
    pub row: Row,
    pub lines: Vec<Line<'static>>,
}

impl ListEntry {
    fn height(&self) -> u16 {
        // one blank line between cards
        (self.lines.len() as u16).saturating_add(1)
    }
}

pub fn render_list(
    entries: Vec<ListEntry>,
    selected: Option<usize>,
    area: Rect,
    buf: &mut Buffer,
    state: &mut CommentListState,
) {
    state.area = area;
    state.row_areas.clear();
    let heights: Vec<u16> = entries.iter().map(ListEntry::height).collect();
    if let Some(selected) = selected {
        state.offset = scroll_into_view(state.offset, selected, &heights, area.height);
    } else {
        state.offset = state.offset.min(entries.len().saturating_sub(1));
    }

    let marker_style = if state.focus.is_focused() {
        Style::new().fg(Color::Cyan)
    } else {
        Style::new().dim()
    };
    let mut y = area.y;
    for (index, entry) in entries.into_iter().enumerate().skip(state.offset) {
        if y >= area.bottom() {
            break;
        }
        let height = (entry.lines.len() as u16).min(area.bottom() - y);
        let row_area = Rect::new(area.x, y, area.width, height);
        if selected == Some(index) {
            for dy in 0..height {
                buf[(area.x, y + dy)].set_symbol("▌").set_style(marker_style);
            }
        }
        let body = Rect::new(
            area.x + GUTTER,
            y,
            area.width.saturating_sub(GUTTER),
            height,
        );
        Paragraph::new(entry.lines).render(body, buf);
        state.row_areas.push((entry.row, row_area));
        y = y.saturating_add(height + 1);
    }
}

pub fn card_width(area: Rect) -> usize {
    usize::from(area.width.saturating_sub(GUTTER).max(10))
}

/// Word wrapping over styled text, keeping styles on each word.
struct SpanWrapper {
    max_width: usize,
    lines: Vec<Line<'static>>,
    current_line: Vec<Span<'static>>,
    current_width: usize,
    pending_space: bool,
}

impl SpanWrapper {
    fn new(max_width: usize) -> Self {
        Self {
            max_width: max_width.max(1),
            lines: Vec::new(),
            current_line: Vec::new(),
            current_width: 0,
            pending_space: false,
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let mut buffer = String::new();
        for ch in text.chars() {
            if ch == '\n' {
                if !buffer.is_empty() {
                    self.push_word(&buffer, style);
                    buffer.clear();
                }
                self.hard_break();
            } else if ch.is_whitespace() {
                if !buffer.is_empty() {
                    self.push_word(&buffer, style);
                    buffer.clear();
                }
                self.pending_space = true;
            } else {
                buffer.push(ch);
            }
        }
        if !buffer.is_empty() {
            self.push_word(&buffer, style);
        }
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let word_width = display_width(word);
        if word_width > self.max_width {
            self.push_long_word(word, style);
            return;
        }
        let space = usize::from(self.pending_space && self.current_width > 0);
        if self.current_width + space + word_width > self.max_width && self.current_width > 0 {
            self.flush_line();
        } else if space == 1 {
            self.current_line.push(Span::raw(" "));
            self.current_width += 1;
        }
        self.pending_space = false;
        self.current_line.push(Span::styled(word.to_string(), style));
        self.current_width += word_width;
    }

    fn push_long_word(&mut self, word: &str, style: Style) {
        if self.current_width > 0 {
            self.flush_line();
        }
        let wrapped = textwrap::wrap(word, textwrap::Options::new(self.max_width).break_words(true));
        let last = wrapped.len().saturating_sub(1);
        for (idx, part) in wrapped.iter().enumerate() {
            self.current_line.push(Span::styled(part.to_string(), style));
            self.current_width += display_width(part);
            if idx < last {
                self.flush_line();
            }
        }
        self.pending_space = false;
    }

    fn hard_break(&mut self) {
        let line = Line::from(std::mem::take(&mut self.current_line));
        self.lines.push(line);
        self.current_width = 0;
        self.pending_space = false;
    }

    fn flush_line(&mut self) {
        if self.current_line.is_empty() {
            self.pending_space = false;
            return;
        }
        self.hard_break();
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        self.lines
    }
}

/// Id of the comment a row shows, if any.
pub fn row_comment(row: Row) -> Option<CommentId> {
    match row {
        Row::Comment(id) => Some(id),
        Row::LoadMore => None,
    }
}

#[cfg(test)]
mod tests {
    use comment_thread::{Author, Reaction};

    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn wrap(text: &str, width: usize) -> Vec<String> {
        let mut wrapper = SpanWrapper::new(width);
        wrapper.push_text(text, Style::new());
        plain(&wrapper.finish())
    }

    #[test]
    fn wraps_on_words_and_keeps_blank_lines() {
        assert_eq!(wrap("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn keeps_token_styles_per_word() {
        let mut wrapper = SpanWrapper::new(40);
        for span in tokenize("hi @Ana see #x") {
            wrapper.push_text(span.text, token_style(span.kind));
        }
        let lines = wrapper.finish();
        let mention = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "@Ana")
            .unwrap();
        assert_eq!(mention.style, token_style(SpanKind::Mention));
    }

    #[test]
    fn scrolls_just_enough_to_show_the_selection() {
        let heights = [4, 4, 4, 4];
        assert_eq!(scroll_into_view(0, 1, &heights, 10), 0);
        assert_eq!(scroll_into_view(0, 3, &heights, 10), 2);
        assert_eq!(scroll_into_view(3, 1, &heights, 10), 1);
        // taller than the viewport: show its top
        assert_eq!(scroll_into_view(0, 2, &[4, 4, 20], 10), 2);
        assert_eq!(scroll_into_view(5, 0, &[], 10), 0);
    }

    #[test]
    fn cards_show_state_reactions_and_replies() {
        let now = Utc::now();
        let comment = Comment {
            id: CommentId(1),
            author: Author::named("Jane Doe"),
            created_at: now - chrono::TimeDelta::minutes(5),
            text: "Ship it".to_string(),
            reactions: vec![
                Reaction {
                    emoji: "🚀".to_string(),
                    user: "You".to_string(),
                },
                Reaction {
                    emoji: "🚀".to_string(),
                    user: "Ali Rahimi".to_string(),
                },
            ],
            parent_id: None,
            attachment: None,
            resolved: true,
            is_edited: true,
            is_pinned: false,
        };
        let ctx = CardContext {
            current_user: "You",
            now,
            effectively_resolved: true,
            replying_to: None,
            reply_count: Some(3),
            confirm_delete: false,
        };
        let lines = plain(&comment_card(&comment, ctx, 40));
        assert_eq!(
            lines,
            vec![
                "Jane Doe  5m ago (edited)  ✓ Resolved",
                "Ship it",
                "🚀 2",
                "💬 3 replies",
            ]
        );
    }

    #[test]
    fn data_urls_are_summarised() {
        assert_eq!(
            attachment_label("data:image/png;base64,AAAA", 40),
            "image/png attachment (0 KiB)"
        );
    }
}
