//! The commenting panel: tabs, the filter header, the comment list or an open thread, the
//! composer, and every floating panel on top of them.
//!
//! All domain decisions live in [`PanelState`]. This component translates key presses into
//! [`Msg`]s, hands the resulting effects to the [`EffectRunner`] and keeps the text widgets in
//! step with the reducer.
use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use comment_thread::{CommentId, group_reactions};
use rat_cursor::HasScreenCursor;
use rat_widget::{
    event::{HandleEvent, TextOutcome, ct_event},
    focus::{FocusBuilder, FocusFlag, HasFocus, Navigation},
    text_input::{TextInput, TextInputState},
    textarea::{TextArea, TextAreaState, TextWrap},
};
use ratatui::{
    buffer::Buffer,
    crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers},
    layout::{Constraint, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, StatefulWidget, Tabs, Widget},
};
use ratatui_macros::vertical;
use textwrap::core::display_width;
use throbber_widgets_tui::{BRAILLE_SIX_DOUBLE, Throbber, ThrobberState, WhichUse};
use tracing::{debug, instrument, trace};

use crate::{
    errors::AppError,
    help_keybind, help_text,
    ui::{
        Action,
        components::{
            Component,
            comment_list::{
                CardContext, CommentListState, ListEntry, card_width, comment_card,
                load_more_line, render_list, row_comment,
            },
            help::HelpElementKind,
            overlays::{
                CommentAction, action_lines, emoji_lines, menu_lines, mention_lines,
                reaction_summary_lines, render_popup,
            },
        },
        effects::{EffectRunner, Services},
        layout::Layout,
        panel::{
            Effect, EmojiTarget, HeaderMenu, LoadState, Msg, PanelConfig, PanelState, Row, Tab,
        },
        popover::{Bias, Popover},
        utils::get_border_style,
    },
};

/// Number of comments in the store, shown by the status bar.
pub static COMMENT_COUNT: AtomicUsize = AtomicUsize::new(0);

const PAGE_SCROLL: isize = 3;

pub const HELP: &[HelpElementKind] = &[
    help_text!("Comments Help"),
    help_text!(""),
    help_keybind!("Up / k, Down / j", "move selection"),
    help_keybind!("Home / g, End / G", "first / last comment"),
    help_keybind!("PageUp / PageDown", "scroll the list"),
    help_keybind!("Enter", "open thread / load more replies"),
    help_keybind!("Esc", "close popup / leave thread"),
    help_keybind!("[ / ]", "previous / next tab"),
    help_keybind!("s / u / f", "sort / user / status menu"),
    help_keybind!("m", "actions for the selected comment"),
    help_keybind!("r", "add a reaction"),
    help_keybind!("i", "who reacted"),
    help_keybind!("e", "edit"),
    help_keybind!("d, d", "delete (press twice)"),
    help_keybind!("x / p", "resolve / pin"),
    help_keybind!("y", "copy link"),
    help_keybind!("R", "retry loading"),
    help_text!(""),
    help_text!("Composer"),
    help_keybind!("Ctrl+S / Ctrl+Enter", "post"),
    help_keybind!("Ctrl+T", "mention someone"),
    help_keybind!("Ctrl+E", "insert an emoji"),
    help_keybind!("Ctrl+O / Ctrl+X", "attach / remove image"),
    help_keybind!("Tab", "accept mention / leave composer"),
];

/// Which text field owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    List,
    Composer,
    Edit,
    Attach,
}

/// Floating panels owned by the view rather than the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalOverlay {
    Actions { id: CommentId, highlighted: usize },
    Reactions(CommentId),
}

pub struct CommentPanel {
    state: PanelState,
    services: Services,
    runner: Option<EffectRunner>,
    pending: Vec<Effect>,
    action_tx: Option<tokio::sync::mpsc::Sender<Action>>,
    list_state: CommentListState,
    input_state: TextAreaState,
    composer_revision: Option<u64>,
    edit_state: TextAreaState,
    editing: Option<CommentId>,
    attach_state: TextInputState,
    attaching: bool,
    throbber_state: ThrobberState,
    local: Option<LocalOverlay>,
    menu_popover: Popover,
    menu_shown: Option<HeaderMenu>,
    emoji_popover: Popover,
    emoji_shown: Option<EmojiTarget>,
    mention_popover: Popover,
    action_popover: Popover,
    reaction_popover: Popover,
    header_buttons: [Rect; 3],
    last_row: Option<Row>,
    focus: FocusFlag,
    area: Rect,
}

fn menu_slot(kind: HeaderMenu) -> usize {
    match kind {
        HeaderMenu::Sort => 0,
        HeaderMenu::User => 1,
        HeaderMenu::Resolution => 2,
    }
}

/// The character of a plain key press, ignoring shift.
fn pressed_char(event: &Event) -> Option<char> {
    match event {
        Event::Key(key)
            if key.kind == KeyEventKind::Press
                && !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            match key.code {
                KeyCode::Char(c) => Some(c),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_submit(event: &Event) -> bool {
    matches!(
        event,
        ct_event!(key press CONTROL-'s')
            | ct_event!(keycode press CONTROL-Enter)
            | ct_event!(keycode press ALT-Enter)
    )
}

impl CommentPanel {
    pub fn new(config: PanelConfig, services: Services) -> Self {
        let (state, pending) = PanelState::start(config);
        let mut panel = Self {
            state,
            services,
            runner: None,
            pending,
            action_tx: None,
            list_state: CommentListState::new(),
            input_state: TextAreaState::new(),
            composer_revision: None,
            edit_state: TextAreaState::new(),
            editing: None,
            attach_state: TextInputState::default(),
            attaching: false,
            throbber_state: ThrobberState::default(),
            local: None,
            menu_popover: Popover::new(Bias::Below),
            menu_shown: None,
            emoji_popover: Popover::new(Bias::Below),
            emoji_shown: None,
            mention_popover: Popover::new(Bias::Above),
            action_popover: Popover::new(Bias::Above),
            reaction_popover: Popover::new(Bias::Above),
            header_buttons: [Rect::default(); 3],
            last_row: None,
            focus: FocusFlag::new().with_name("comment_panel"),
            area: Rect::default(),
        };
        panel.sync();
        panel
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    #[instrument(skip(self))]
    fn dispatch(&mut self, msg: Msg) {
        let effects = self.state.handle(msg);
        self.run_effects(effects);
        self.sync();
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        match &self.runner {
            Some(runner) => effects.into_iter().for_each(|effect| runner.run(effect)),
            None => self.pending.extend(effects),
        }
    }

    /// Brings the widgets and popovers in line with the reducer after every message.
    fn sync(&mut self) {
        COMMENT_COUNT.store(self.state.store().len(), Ordering::Relaxed);

        let composer = self.state.composer();
        if self.composer_revision != Some(composer.revision) {
            trace!(revision = composer.revision, "Resyncing composer");
            self.composer_revision = Some(composer.revision);
            self.input_state.set_text(&composer.text);
            self.input_state.move_to_end(false);
        }
        let mentions_open = composer.mentions.is_open();
        if mentions_open != self.mention_popover.is_open() {
            if mentions_open {
                self.mention_popover.open();
            } else {
                self.mention_popover.close();
            }
        }

        match (self.state.edit(), self.editing) {
            (Some(edit), editing) if editing != Some(edit.id) => {
                self.editing = Some(edit.id);
                self.edit_state.set_text(&edit.text);
                self.edit_state.move_to_end(false);
                self.focus_field(Field::Edit);
            }
            (None, Some(_)) => {
                self.editing = None;
                if self.edit_state.is_focused() {
                    self.focus_field(Field::List);
                }
            }
            _ => {}
        }

        let menu = self.state.menu().map(|m| m.kind);
        if menu != self.menu_shown {
            self.menu_shown = menu;
            match menu {
                Some(_) => self.menu_popover.open(),
                None => self.menu_popover.close(),
            }
        }
        let emoji = self.state.emoji_picker().map(|p| p.target);
        if emoji != self.emoji_shown {
            self.emoji_shown = emoji;
            match emoji {
                Some(_) => self.emoji_popover.open(),
                None => self.emoji_popover.close(),
            }
        }

        let row = self.state.selected_row();
        if row != self.last_row {
            self.last_row = row;
            self.set_local(None);
        }
        if let Some(LocalOverlay::Actions { id, .. } | LocalOverlay::Reactions(id)) = self.local
            && !self.state.store().contains(id)
        {
            self.set_local(None);
        }

        if !self.shows_composer() && !self.list_state.is_focused() {
            self.attaching = false;
            self.focus_field(Field::List);
        }
    }

    fn set_local(&mut self, overlay: Option<LocalOverlay>) {
        self.local = overlay;
        match overlay {
            Some(LocalOverlay::Actions { .. }) => {
                self.reaction_popover.close();
                if !self.action_popover.is_open() {
                    self.action_popover.open();
                }
            }
            Some(LocalOverlay::Reactions(_)) => {
                self.action_popover.close();
                self.reaction_popover.open();
            }
            None => {
                self.action_popover.close();
                self.reaction_popover.close();
            }
        }
    }

    fn focus_field(&mut self, field: Field) {
        self.list_state.focus.set(field == Field::List);
        self.input_state.focus.set(field == Field::Composer);
        self.edit_state.focus.set(field == Field::Edit);
        self.attach_state.focus.set(field == Field::Attach);
    }

    fn shows_composer(&self) -> bool {
        self.state.tab() == Tab::Comments && self.state.is_ready()
    }

    fn has_overlay(&self) -> bool {
        self.state.menu().is_some() || self.state.emoji_picker().is_some() || self.local.is_some()
    }

    fn invalidate_popovers(&mut self) {
        for popover in [
            &mut self.menu_popover,
            &mut self.emoji_popover,
            &mut self.mention_popover,
            &mut self.action_popover,
            &mut self.reaction_popover,
        ] {
            popover.invalidate();
        }
    }

    async fn send(&self, action: Action) -> Result<(), AppError> {
        if let Some(tx) = &self.action_tx {
            tx.send(action).await?;
        }
        Ok(())
    }

    async fn handle_key(&mut self, event: &Event) -> Result<(), AppError> {
        if self.state.emoji_picker().is_some() {
            self.emoji_key(event);
            return Ok(());
        }
        if self.state.menu().is_some() {
            self.menu_key(event);
            return Ok(());
        }
        if let Some(overlay) = self.local {
            return self.local_key(overlay, event).await;
        }
        if self.attaching && self.attach_state.is_focused() {
            self.attach_key(event);
            return Ok(());
        }
        if self.editing.is_some() && self.edit_state.is_focused() {
            self.edit_key(event);
            return Ok(());
        }
        if self.input_state.is_focused() {
            return self.composer_key(event).await;
        }
        if self.list_state.is_focused() {
            self.list_key(event);
        }
        Ok(())
    }

    fn emoji_key(&mut self, event: &Event) {
        let msg = match event {
            ct_event!(keycode press Left) | ct_event!(keycode press Up) => Msg::EmojiPrevious,
            ct_event!(keycode press Right) | ct_event!(keycode press Down) => Msg::EmojiNext,
            ct_event!(keycode press Enter) => Msg::EmojiChoose,
            ct_event!(keycode press Esc) => Msg::CloseEmojiPicker,
            _ => match pressed_char(event) {
                Some('h' | 'k') => Msg::EmojiPrevious,
                Some('l' | 'j') => Msg::EmojiNext,
                _ => return,
            },
        };
        self.dispatch(msg);
    }

    fn menu_key(&mut self, event: &Event) {
        let msg = match event {
            ct_event!(keycode press Up) => Msg::MenuPrevious,
            ct_event!(keycode press Down) => Msg::MenuNext,
            ct_event!(keycode press Enter) => Msg::MenuChoose,
            ct_event!(keycode press Esc) => Msg::CloseMenus,
            _ => match pressed_char(event) {
                Some('k') => Msg::MenuPrevious,
                Some('j') => Msg::MenuNext,
                Some('s') => Msg::ToggleMenu(HeaderMenu::Sort),
                Some('u') => Msg::ToggleMenu(HeaderMenu::User),
                Some('f') => Msg::ToggleMenu(HeaderMenu::Resolution),
                _ => return,
            },
        };
        self.dispatch(msg);
    }

    async fn local_key(&mut self, overlay: LocalOverlay, event: &Event) -> Result<(), AppError> {
        match overlay {
            LocalOverlay::Reactions(_) => {
                self.set_local(None);
                if !matches!(event, ct_event!(keycode press Esc)) && pressed_char(event) != Some('i')
                {
                    self.list_key(event);
                }
            }
            LocalOverlay::Actions { id, highlighted } => {
                let actions = self.actions_for(id);
                if actions.is_empty() {
                    self.set_local(None);
                    return Ok(());
                }
                let step = |forward: bool| {
                    let len = actions.len();
                    if forward {
                        (highlighted + 1) % len
                    } else {
                        (highlighted + len - 1) % len
                    }
                };
                let next = match event {
                    ct_event!(keycode press Up) => Some(step(false)),
                    ct_event!(keycode press Down) => Some(step(true)),
                    ct_event!(keycode press Enter) => {
                        self.set_local(None);
                        if let Some(action) = actions.get(highlighted) {
                            self.run_action(*action, id).await?;
                        }
                        None
                    }
                    ct_event!(keycode press Esc) => {
                        self.set_local(None);
                        None
                    }
                    _ => match pressed_char(event) {
                        Some('k') => Some(step(false)),
                        Some('j') => Some(step(true)),
                        Some('m') => {
                            self.set_local(None);
                            None
                        }
                        _ => None,
                    },
                };
                if let Some(highlighted) = next {
                    self.local = Some(LocalOverlay::Actions { id, highlighted });
                }
            }
        }
        Ok(())
    }

    fn actions_for(&self, id: CommentId) -> Vec<CommentAction> {
        self.state
            .store()
            .get(id)
            .map(|comment| {
                CommentAction::available(
                    comment,
                    self.state.is_effectively_resolved(id),
                    self.state.thread().is_some(),
                )
            })
            .unwrap_or_default()
    }

    async fn run_action(&mut self, action: CommentAction, id: CommentId) -> Result<(), AppError> {
        debug!(?action, %id, "Running comment action");
        match action {
            CommentAction::Reply => {
                self.dispatch(Msg::OpenThread(id));
                if self.state.thread_root() == Some(id) {
                    self.focus_field(Field::Composer);
                }
            }
            CommentAction::React => self.dispatch(Msg::OpenEmojiPicker(EmojiTarget::Reaction(id))),
            CommentAction::Edit => self.dispatch(Msg::StartEdit(id)),
            CommentAction::Resolve => self.dispatch(Msg::ToggleResolve(id)),
            CommentAction::Pin => self.dispatch(Msg::TogglePin(id)),
            CommentAction::CopyLink => self.dispatch(Msg::CopyLink(id)),
            CommentAction::Delete => self.dispatch(Msg::RequestDelete(id)),
        }
        self.send(Action::ForceRender).await
    }

    fn attach_key(&mut self, event: &Event) {
        match event {
            ct_event!(keycode press Enter) => {
                let path = self.attach_state.text().trim().to_string();
                self.close_attach_prompt();
                if !path.is_empty() {
                    self.dispatch(Msg::AttachRequested(PathBuf::from(path)));
                }
            }
            ct_event!(keycode press Esc) => self.close_attach_prompt(),
            _ => {
                self.attach_state.handle(event, rat_widget::event::Regular);
            }
        }
    }

    fn close_attach_prompt(&mut self) {
        self.attaching = false;
        self.attach_state.set_text("");
        self.focus_field(Field::Composer);
    }

    fn edit_key(&mut self, event: &Event) {
        if is_submit(event) {
            self.dispatch(Msg::SaveEdit);
            return;
        }
        if matches!(event, ct_event!(keycode press Esc)) {
            self.dispatch(Msg::CancelEdit);
            return;
        }
        let o = self.edit_state.handle(event, rat_widget::event::Regular);
        if o == TextOutcome::TextChanged {
            self.dispatch(Msg::EditChanged(self.edit_state.text()));
        }
    }

    async fn composer_key(&mut self, event: &Event) -> Result<(), AppError> {
        if self.state.composer().mentions.is_open() {
            let msg = match event {
                ct_event!(keycode press Up) => Some(Msg::MentionPrevious),
                ct_event!(keycode press Down) => Some(Msg::MentionNext),
                ct_event!(keycode press Enter) | ct_event!(keycode press Tab) => {
                    Some(Msg::MentionAccept)
                }
                ct_event!(keycode press Esc) => Some(Msg::MentionDismiss),
                _ => None,
            };
            if let Some(msg) = msg {
                self.dispatch(msg);
                return Ok(());
            }
        }
        if is_submit(event) {
            self.dispatch(Msg::Submit);
            return Ok(());
        }
        match event {
            ct_event!(key press CONTROL-'e') => {
                self.dispatch(Msg::OpenEmojiPicker(EmojiTarget::Composer))
            }
            ct_event!(key press CONTROL-'o') => {
                self.attaching = true;
                self.focus_field(Field::Attach);
            }
            ct_event!(key press CONTROL-'x') => self.dispatch(Msg::RemoveAttachment),
            ct_event!(key press CONTROL-'t') => self.dispatch(Msg::InsertMentionTrigger),
            ct_event!(keycode press Tab) => self.send(Action::ForceFocusChange).await?,
            ct_event!(keycode press SHIFT-BackTab) => {
                self.send(Action::ForceFocusChangeRev).await?
            }
            ct_event!(keycode press Esc) => self.focus_field(Field::List),
            _ => {
                let o = self.input_state.handle(event, rat_widget::event::Regular);
                if o == TextOutcome::TextChanged {
                    self.dispatch(Msg::ComposerChanged(self.input_state.text()));
                }
            }
        }
        Ok(())
    }

    fn list_key(&mut self, event: &Event) {
        let selected = self.state.selected_comment();
        let msg = match event {
            ct_event!(keycode press Up) => Msg::SelectPrevious,
            ct_event!(keycode press Down) => Msg::SelectNext,
            ct_event!(keycode press Home) => Msg::SelectFirst,
            ct_event!(keycode press End) => Msg::SelectLast,
            ct_event!(keycode press Enter) => Msg::Activate,
            ct_event!(keycode press Esc) => Msg::Back,
            ct_event!(keycode press PageUp) | ct_event!(keycode press PageDown) => {
                let delta = if matches!(event, ct_event!(keycode press PageUp)) {
                    -PAGE_SCROLL
                } else {
                    PAGE_SCROLL
                };
                if self.list_state.scroll_by(delta, self.state.rows().len()) {
                    self.invalidate_popovers();
                }
                return;
            }
            _ => {
                let Some(c) = pressed_char(event) else {
                    return;
                };
                let in_main_view = self.state.thread().is_none() && self.state.is_ready();
                match (c, selected) {
                    ('k', _) => Msg::SelectPrevious,
                    ('j', _) => Msg::SelectNext,
                    ('g', _) => Msg::SelectFirst,
                    ('G', _) => Msg::SelectLast,
                    ('[', _) => Msg::SelectTab(self.state.tab().previous()),
                    (']', _) => Msg::SelectTab(self.state.tab().next()),
                    ('R', _) if matches!(self.state.load_state(), LoadState::Failed(_)) => {
                        Msg::Load
                    }
                    ('s', _) if in_main_view => Msg::ToggleMenu(HeaderMenu::Sort),
                    ('u', _) if in_main_view => Msg::ToggleMenu(HeaderMenu::User),
                    ('f', _) if in_main_view => Msg::ToggleMenu(HeaderMenu::Resolution),
                    ('r', Some(id)) => Msg::OpenEmojiPicker(EmojiTarget::Reaction(id)),
                    ('x', Some(id)) => Msg::ToggleResolve(id),
                    ('p', Some(id)) => Msg::TogglePin(id),
                    ('y', Some(id)) => Msg::CopyLink(id),
                    ('e', Some(id)) => Msg::StartEdit(id),
                    ('d', Some(id)) => Msg::RequestDelete(id),
                    ('m', Some(id)) => {
                        self.set_local(Some(LocalOverlay::Actions { id, highlighted: 0 }));
                        return;
                    }
                    ('i', Some(id)) => {
                        let has_reactions = self
                            .state
                            .store()
                            .get(id)
                            .is_some_and(|c| !c.reactions.is_empty());
                        if has_reactions {
                            self.set_local(Some(LocalOverlay::Reactions(id)));
                        }
                        return;
                    }
                    _ => return,
                }
            }
        };
        let tab = self.state.tab();
        self.dispatch(msg);
        if self.state.tab() != tab {
            self.focus_field(Field::List);
        }
    }

    fn render_tabs(&self, area: Rect, buf: &mut Buffer) {
        let selected = Tab::ALL.iter().position(|t| *t == self.state.tab());
        Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .select(selected)
            .style(Style::new().dim())
            .highlight_style(Style::new().fg(Color::Cyan).bold().not_dim())
            .divider(" ")
            .render(area, buf);
    }

    fn render_header(&mut self, area: Rect, buf: &mut Buffer) {
        self.header_buttons = [Rect::default(); 3];
        if self.state.tab() != Tab::Comments {
            Line::styled(format!(" {}", self.state.tab().title()), Style::new().bold())
                .render(area, buf);
            return;
        }
        if let Some(root) = self.state.thread_root() {
            let replies = self.state.store().descendant_count(root);
            let noun = if replies == 1 { "reply" } else { "replies" };
            Line::from(vec![
                Span::styled(" ← All Comments ", Style::new().fg(Color::Cyan)),
                Span::styled(format!("  Thread · {replies} {noun}"), Style::new().dim()),
            ])
            .render(area, buf);
            return;
        }

        let query = self.state.query();
        let open = self.state.menu().map(|m| m.kind);
        let buttons = [
            (HeaderMenu::Sort, format!(" {} ▾ ", query.sort.label())),
            (
                HeaderMenu::User,
                format!(" {} ▾ ", query.author.as_deref().unwrap_or("All Users")),
            ),
            (
                HeaderMenu::Resolution,
                format!(" {} ▾ ", query.resolution.label()),
            ),
        ];
        let mut spans = Vec::with_capacity(buttons.len() * 2);
        let mut x = area.x;
        for (kind, label) in buttons {
            let width = display_width(&label) as u16;
            let style = if open == Some(kind) {
                Style::new().reversed()
            } else {
                Style::new().fg(Color::Cyan)
            };
            let button = Rect::new(x, area.y, width, 1).intersection(area);
            self.header_buttons[menu_slot(kind)] = button;
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            x = x.saturating_add(width + 1);
        }
        Line::from(spans).render(area, buf);
    }

    fn render_placeholder(&self, area: Rect, buf: &mut Buffer) {
        let title = format!("{} Panel", self.state.tab().title());
        centered_message(
            area,
            buf,
            &[
                Line::styled(title, Style::new().bold()),
                Line::styled(
                    "Functionality for this section is not yet implemented.",
                    Style::new().dim(),
                ),
            ],
        );
    }

    fn render_comments(&mut self, area: Rect, buf: &mut Buffer) {
        match self.state.load_state() {
            LoadState::Loading => {
                let width = 20.min(area.width);
                let throbber_area = Rect::new(
                    area.x + (area.width - width) / 2,
                    area.y + area.height / 2,
                    width,
                    1.min(area.height),
                );
                let throbber = Throbber::default()
                    .label("Loading comments")
                    .style(Style::new().fg(Color::Cyan))
                    .throbber_set(BRAILLE_SIX_DOUBLE)
                    .use_type(WhichUse::Spin);
                StatefulWidget::render(throbber, throbber_area, buf, &mut self.throbber_state);
                return;
            }
            LoadState::Failed(_) => {
                centered_message(
                    area,
                    buf,
                    &[
                        Line::styled("Something Went Wrong", Style::new().bold().fg(Color::Red)),
                        Line::styled(
                            "We couldn't load the comments. Please try again.",
                            Style::new().dim(),
                        ),
                        Line::default(),
                        Line::styled("Press R to retry", Style::new().fg(Color::Cyan)),
                    ],
                );
                return;
            }
            LoadState::Ready => {}
        }

        let entries = self.entries(card_width(area));
        if entries.is_empty() {
            let (title, hint) = if self.state.query().is_filtered() {
                ("No Matching Comments", "Try adjusting your filters.")
            } else {
                ("No Comments Yet", "Be the first to start the conversation.")
            };
            centered_message(
                area,
                buf,
                &[
                    Line::styled(title, Style::new().bold()),
                    Line::styled(hint, Style::new().dim()),
                ],
            );
            return;
        }
        let offset = self.list_state.offset();
        render_list(entries, self.state.selected(), area, buf, &mut self.list_state);
        if self.list_state.offset() != offset {
            self.invalidate_popovers();
        }
    }

    fn entries(&self, width: usize) -> Vec<ListEntry> {
        let state = &self.state;
        let store = state.store();
        let now = Utc::now();
        let ctx = |id: CommentId| CardContext {
            current_user: state.current_user(),
            now,
            effectively_resolved: state.is_effectively_resolved(id),
            replying_to: None,
            reply_count: None,
            confirm_delete: state.confirm_delete() == Some(id),
        };

        if let Some(page) = state.thread().and_then(|t| t.page(store)) {
            let mut entries = Vec::with_capacity(page.replies.len() + 2);
            entries.push(ListEntry {
                row: Row::Comment(page.root.id),
                lines: comment_card(page.root, ctx(page.root.id), width),
            });
            for reply in &page.replies {
                let id = reply.comment.id;
                let card = CardContext {
                    replying_to: reply.replying_to,
                    effectively_resolved: reply.effectively_resolved,
                    ..ctx(id)
                };
                entries.push(ListEntry {
                    row: Row::Comment(id),
                    lines: comment_card(reply.comment, card, width),
                });
            }
            if let Some(label) = page.load_more_label() {
                entries.push(ListEntry {
                    row: Row::LoadMore,
                    lines: load_more_line(&label),
                });
            }
            return entries;
        }

        state
            .rows()
            .into_iter()
            .filter_map(|row| {
                let comment = store.get(row_comment(row)?)?;
                let card = CardContext {
                    reply_count: Some(store.descendant_count(comment.id)),
                    ..ctx(comment.id)
                };
                Some(ListEntry {
                    row,
                    lines: comment_card(comment, card, width),
                })
            })
            .collect()
    }

    fn render_composer(&mut self, area: Rect, buf: &mut Buffer) {
        if self.attaching {
            let [input_area, _] = vertical![==3, *=1].areas(area);
            let input = TextInput::new().block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(get_border_style(&self.attach_state))
                    .title("Attach image: path (Enter to attach, Esc to cancel)"),
            );
            input.render(input_area, buf, &mut self.attach_state);
            return;
        }
        if self.editing.is_some() {
            let block = Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(get_border_style(&self.edit_state))
                .title("Edit comment (Ctrl+S to save, Esc to cancel)");
            TextArea::new()
                .block(block)
                .text_wrap(TextWrap::Word(4))
                .render(area, buf, &mut self.edit_state);
            return;
        }

        let composer = self.state.composer();
        let title = if self.state.thread().is_some() {
            "Reply (Ctrl+S to post)"
        } else {
            "Comment (Ctrl+S to post)"
        };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(get_border_style(&self.input_state))
            .title(title);
        if composer.attachment.is_some() {
            block = block.title_bottom(Line::styled(
                " 🖼 image attached (Ctrl+X to remove) ",
                Style::new().fg(Color::Magenta),
            ));
        } else if self.input_state.is_focused() {
            block = block.title_bottom(Line::styled(
                " Ctrl+T mention · Ctrl+E emoji · Ctrl+O attach ",
                Style::new().dim(),
            ));
        }
        TextArea::new()
            .block(block)
            .text_wrap(TextWrap::Word(4))
            .render(area, buf, &mut self.input_state);
    }

    fn render_popovers(&mut self, layout: Layout, buf: &mut Buffer) {
        let list_area = layout.main_content;
        let panel_area = self.area;

        if let Some(menu) = self.state.menu() {
            let trigger = self.header_buttons[menu_slot(menu.kind)];
            let lines = menu_lines(&self.state.menu_items(menu.kind), menu.highlighted);
            render_popup(&mut self.menu_popover, trigger, panel_area, None, lines, buf);
        }

        if let Some(picker) = self.state.emoji_picker() {
            let (trigger, container) = match picker.target {
                EmojiTarget::Reaction(id) => {
                    (self.list_state.row_area(Row::Comment(id)), list_area)
                }
                EmojiTarget::Composer => (Some(layout.composer), panel_area),
            };
            if let Some(trigger) = trigger {
                render_popup(
                    &mut self.emoji_popover,
                    trigger,
                    container,
                    Some("React"),
                    emoji_lines(picker.highlighted),
                    buf,
                );
            }
        }

        let mentions = &self.state.composer().mentions;
        if mentions.is_open() {
            let trigger = self
                .input_state
                .screen_cursor()
                .map(|(x, y)| Rect::new(x, y, 1, 1))
                .unwrap_or(layout.composer);
            let lines = mention_lines(mentions.names(), mentions.highlighted());
            render_popup(&mut self.mention_popover, trigger, panel_area, None, lines, buf);
        }

        match self.local {
            Some(LocalOverlay::Actions { id, highlighted }) => {
                let actions = self.actions_for(id);
                if let (Some(comment), Some(trigger)) = (
                    self.state.store().get(id),
                    self.list_state.row_area(Row::Comment(id)),
                ) {
                    let lines = action_lines(&actions, comment, highlighted);
                    render_popup(&mut self.action_popover, trigger, list_area, None, lines, buf);
                }
            }
            Some(LocalOverlay::Reactions(id)) => {
                if let (Some(comment), Some(trigger)) = (
                    self.state.store().get(id),
                    self.list_state.row_area(Row::Comment(id)),
                ) {
                    let groups = group_reactions(&comment.reactions, self.state.current_user());
                    render_popup(
                        &mut self.reaction_popover,
                        trigger,
                        list_area,
                        None,
                        reaction_summary_lines(&groups),
                        buf,
                    );
                }
            }
            None => {}
        }
    }
}

/// Draws `lines` centered both ways inside `area`.
fn centered_message(area: Rect, buf: &mut Buffer, lines: &[Line<'static>]) {
    let height = (lines.len() as u16).min(area.height);
    let area = area.centered_vertically(Constraint::Length(height));
    Paragraph::new(lines.to_vec()).centered().render(area, buf);
}

#[async_trait(?Send)]
impl Component for CommentPanel {
    fn render(&mut self, area: Layout, buf: &mut Buffer) {
        let full = area.tabs.union(area.status_bar);
        let layout = if self.shows_composer() {
            area
        } else {
            Layout::without_composer(full)
        };
        self.area = layout.tabs.union(layout.main_content).union(layout.composer);

        self.render_tabs(layout.tabs, buf);
        self.render_header(layout.header, buf);
        if self.state.tab() == Tab::Comments {
            self.render_comments(layout.main_content, buf);
        } else {
            self.list_state.area = layout.main_content;
            self.render_placeholder(layout.main_content, buf);
        }
        if self.shows_composer() {
            self.render_composer(layout.composer, buf);
        }
        self.render_popovers(layout, buf);
    }

    fn register_action_tx(&mut self, action_tx: tokio::sync::mpsc::Sender<Action>) {
        let runner = EffectRunner::new(self.services.clone(), action_tx.clone());
        for effect in self.pending.drain(..) {
            runner.run(effect);
        }
        self.runner = Some(runner);
        self.action_tx = Some(action_tx);
    }

    async fn handle_event(&mut self, event: Action) -> Result<(), AppError> {
        match event {
            Action::AppEvent(ref event) => match event {
                Event::Resize(..) => self.invalidate_popovers(),
                Event::Key(_) => self.handle_key(event).await?,
                _ => {}
            },
            Action::Panel(msg) => self.dispatch(msg),
            Action::Tick => {
                if self.is_animating() {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        self.attach_state
            .screen_cursor()
            .or_else(|| self.edit_state.screen_cursor())
            .or_else(|| self.input_state.screen_cursor())
    }

    fn is_animating(&self) -> bool {
        self.state.tab() == Tab::Comments && *self.state.load_state() == LoadState::Loading
    }

    fn capture_focus_event(&self, event: &Event) -> bool {
        if !matches!(event, Event::Key(_)) {
            return false;
        }
        self.has_overlay()
            || self.input_state.is_focused()
            || self.edit_state.is_focused()
            || self.attach_state.is_focused()
    }

    fn set_global_help(&self) {
        if let Some(action_tx) = &self.action_tx {
            let _ = action_tx.try_send(Action::SetHelp(HELP));
        }
    }
}

impl HasFocus for CommentPanel {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.widget(&self.list_state);
        if self.shows_composer() {
            if self.attaching {
                builder.widget(&self.attach_state);
            } else if self.editing.is_some() {
                builder.widget(&self.edit_state);
            } else {
                builder.widget(&self.input_state);
            }
        }
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }

    fn navigable(&self) -> Navigation {
        Navigation::Regular
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use ratatui::crossterm::event::{KeyEvent, KeyEventState};

    use super::*;
    use crate::{
        clipboard::Clipboard,
        drafts::MemoryDraftStore,
        source::{FixtureSource, fixture::sample_comments},
    };

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn set_contents(&self, _text: String) -> anyhow::Result<()> {
            anyhow::bail!("no clipboard in tests")
        }
    }

    fn panel() -> CommentPanel {
        let services = Services {
            source: Arc::new(FixtureSource::new(Duration::ZERO)),
            drafts: Arc::new(MemoryDraftStore::default()),
            clipboard: Arc::new(NoClipboard),
        };
        let config = PanelConfig {
            current_user: "You".to_string(),
            base_url: "https://board.example/doc".to_string(),
        };
        CommentPanel::new(config, services)
    }

    fn loaded() -> CommentPanel {
        let mut panel = panel();
        panel.dispatch(Msg::Loaded {
            request: 1,
            result: Ok(sample_comments(Utc::now())),
        });
        panel.focus_field(Field::List);
        panel
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn char_key(c: char) -> Event {
        key(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn draw(panel: &mut CommentPanel) -> Buffer {
        let area = Rect::new(0, 0, 80, 40);
        let mut buf = Buffer::empty(area);
        panel.render(Layout::new(area), &mut buf);
        buf
    }

    fn screen(buf: &Buffer) -> String {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn effects_wait_for_the_action_channel() {
        let mut panel = panel();
        assert_eq!(panel.pending.len(), 2);
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        panel.register_action_tx(tx);
        assert!(panel.pending.is_empty());
        assert!(panel.runner.is_some());
        assert!(matches!(rx.recv().await, Some(Action::Panel(_))));
    }

    #[test]
    fn shows_loading_then_comments() {
        let mut panel = panel();
        assert!(panel.is_animating());
        assert!(screen(&draw(&mut panel)).contains("Loading comments"));

        let mut panel = loaded();
        assert!(!panel.is_animating());
        let text = screen(&draw(&mut panel));
        assert!(text.contains("Ali Rahimi"));
        assert!(text.contains("Newest First"));
    }

    #[test]
    fn failed_loads_offer_a_retry() {
        let mut panel = panel();
        panel.dispatch(Msg::Loaded {
            request: 1,
            result: Err("offline".to_string()),
        });
        panel.focus_field(Field::List);
        assert!(screen(&draw(&mut panel)).contains("Something Went Wrong"));
        panel.list_key(&char_key('R'));
        assert_eq!(*panel.state().load_state(), LoadState::Loading);
    }

    #[tokio::test]
    async fn keys_drive_the_selection_and_threads() {
        let mut panel = loaded();
        assert_eq!(panel.state().selected(), Some(0));
        panel.handle_key(&char_key('j')).await.unwrap();
        assert_eq!(panel.state().selected_comment(), Some(CommentId(2)));
        panel.handle_key(&char_key('k')).await.unwrap();
        panel
            .handle_key(&key(KeyCode::Enter, KeyModifiers::NONE))
            .await
            .unwrap();
        assert_eq!(panel.state().thread_root(), Some(CommentId(1)));
        assert!(screen(&draw(&mut panel)).contains("← All Comments"));
        panel
            .handle_key(&key(KeyCode::Esc, KeyModifiers::NONE))
            .await
            .unwrap();
        assert_eq!(panel.state().thread_root(), None);
    }

    #[tokio::test]
    async fn header_menu_captures_keys_until_closed() {
        let mut panel = loaded();
        panel.handle_key(&char_key('s')).await.unwrap();
        assert!(panel.capture_focus_event(&char_key('j')));
        draw(&mut panel);
        assert!(panel.menu_popover.placement().is_some());

        panel
            .handle_key(&key(KeyCode::Down, KeyModifiers::NONE))
            .await
            .unwrap();
        panel
            .handle_key(&key(KeyCode::Enter, KeyModifiers::NONE))
            .await
            .unwrap();
        assert!(panel.state().menu().is_none());
        assert!(!panel.menu_popover.is_open());
        assert_eq!(
            panel.state().query().sort,
            comment_thread::SortOrder::Oldest
        );
    }

    #[tokio::test]
    async fn typing_reaches_the_reducer_and_submits() {
        let mut panel = loaded();
        panel.focus_field(Field::Composer);
        for c in "hello".chars() {
            panel.handle_key(&char_key(c)).await.unwrap();
        }
        assert_eq!(panel.state().composer().text, "hello");
        assert!(panel.capture_focus_event(&char_key('q')));

        panel
            .handle_key(&key(KeyCode::Char('s'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert_eq!(panel.state().store().len(), 10);
        assert_eq!(panel.input_state.text(), "");
    }

    #[tokio::test]
    async fn mention_acceptance_rewrites_the_text_box() {
        let mut panel = loaded();
        panel.focus_field(Field::Composer);
        for c in "hi @Ja".chars() {
            panel.handle_key(&char_key(c)).await.unwrap();
        }
        assert!(panel.state().composer().mentions.is_open());
        assert!(panel.mention_popover.is_open());
        panel
            .handle_key(&key(KeyCode::Tab, KeyModifiers::NONE))
            .await
            .unwrap();
        assert_eq!(panel.input_state.text(), "hi @Jane Doe ");
        assert!(!panel.mention_popover.is_open());
    }

    #[tokio::test]
    async fn editing_swaps_the_composer_for_an_edit_box() {
        let mut panel = loaded();
        panel.handle_key(&char_key('j')).await.unwrap();
        panel.handle_key(&char_key('e')).await.unwrap();
        assert!(panel.edit_state.is_focused());
        assert_eq!(panel.edit_state.text(), panel.state().store().get(CommentId(2)).unwrap().text);

        panel
            .handle_key(&key(KeyCode::Esc, KeyModifiers::NONE))
            .await
            .unwrap();
        assert!(panel.state().edit().is_none());
        assert!(panel.list_state.is_focused());
    }

    #[tokio::test]
    async fn action_menu_runs_the_highlighted_action() {
        let mut panel = loaded();
        panel.handle_key(&char_key('j')).await.unwrap();
        panel.handle_key(&char_key('m')).await.unwrap();
        assert!(panel.action_popover.is_open());
        // Reply, React, Edit, Resolve
        for _ in 0..3 {
            panel.handle_key(&char_key('j')).await.unwrap();
        }
        panel
            .handle_key(&key(KeyCode::Enter, KeyModifiers::NONE))
            .await
            .unwrap();
        assert!(panel.state().store().get(CommentId(2)).unwrap().resolved);
        assert!(!panel.action_popover.is_open());
    }

    #[tokio::test]
    async fn other_tabs_show_a_placeholder() {
        let mut panel = loaded();
        panel.handle_key(&char_key(']')).await.unwrap();
        assert_eq!(panel.state().tab(), Tab::History);
        let text = screen(&draw(&mut panel));
        assert!(text.contains("History Panel"));
        assert!(text.contains("not yet implemented"));
    }
}
