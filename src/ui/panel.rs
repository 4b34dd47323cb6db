//! State of the commenting panel and the reducer that drives it.
//!
//! [`PanelState::update`] is pure: it mutates the in-memory model and describes every side
//! effect (fetching, draft persistence, file reads, the clipboard, toasts) as an [`Effect`]. The
//! runtime executes the effects and feeds their completions back in as [`Msg`]s. Completions
//! carry the request id they were issued with, so answers to superseded requests are dropped.
use std::{path::PathBuf, time::Duration};

use comment_thread::{
    Author, Comment, CommentId, CommentStore, DraftKey, MentionPicker, NewComment,
    ResolutionFilter, SortOrder, ThreadView, TopLevelQuery, mention,
};
use tracing::{debug, info, warn};

use crate::clipboard::comment_link;

pub const REACTION_EMOJI: [&str; 8] = ["👍", "❤️", "😂", "😮", "😢", "🙏", "🚀", "🎉"];
pub const LINK_COPIED_TOAST: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    Tune,
    Info,
    #[default]
    Comments,
    History,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Tune, Tab::Info, Tab::Comments, Tab::History];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Tune => "Tune",
            Tab::Info => "Info",
            Tab::Comments => "Comments",
            Tab::History => "History",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let index = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Failed(String),
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMenu {
    Sort,
    User,
    Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub kind: HeaderMenu,
    pub highlighted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub checked: bool,
}

/// One selectable line of the comment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Comment(CommentId),
    LoadMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiTarget {
    Reaction(CommentId),
    Composer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiPicker {
    pub target: EmojiTarget,
    pub highlighted: usize,
}

impl EmojiPicker {
    pub fn emoji(&self) -> &'static str {
        REACTION_EMOJI[self.highlighted % REACTION_EMOJI.len()]
    }
}

/// The text box at the bottom of the panel.
///
/// `revision` changes whenever the reducer replaces the text on its own (draft loaded, mention
/// inserted, submit), which tells the widget to resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composer {
    pub key: DraftKey,
    pub text: String,
    pub revision: u64,
    pub attachment: Option<String>,
    pub mentions: MentionPicker,
}

impl Composer {
    fn new(key: DraftKey, revision: u64) -> Self {
        Self {
            key,
            text: String::new(),
            revision,
            attachment: None,
            mentions: MentionPicker::default(),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    fn replace_text(&mut self, text: String) {
        self.text = text;
        self.revision += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: CommentId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub current_user: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub enum Msg {
    Load,
    Loaded {
        request: u64,
        result: Result<Vec<Comment>, String>,
    },
    SelectTab(Tab),
    SelectNext,
    SelectPrevious,
    SelectFirst,
    SelectLast,
    /// Enter on the selected row.
    Activate,
    /// Esc: closes the innermost open overlay, or leaves the thread.
    Back,
    OpenThread(CommentId),
    CloseThread,
    LoadMoreReplies,
    ToggleMenu(HeaderMenu),
    MenuNext,
    MenuPrevious,
    MenuChoose,
    CloseMenus,
    SetSort(SortOrder),
    SetAuthorFilter(Option<String>),
    SetResolutionFilter(ResolutionFilter),
    ComposerChanged(String),
    DraftLoaded {
        key: DraftKey,
        text: Option<String>,
    },
    InsertMentionTrigger,
    MentionNext,
    MentionPrevious,
    MentionAccept,
    MentionDismiss,
    Submit,
    AttachRequested(PathBuf),
    AttachmentRead {
        request: u64,
        result: Result<Option<String>, String>,
    },
    RemoveAttachment,
    StartEdit(CommentId),
    EditChanged(String),
    SaveEdit,
    CancelEdit,
    RequestDelete(CommentId),
    CancelDelete,
    OpenEmojiPicker(EmojiTarget),
    EmojiNext,
    EmojiPrevious,
    EmojiChoose,
    CloseEmojiPicker,
    ToggleReaction {
        id: CommentId,
        emoji: String,
    },
    ToggleResolve(CommentId),
    TogglePin(CommentId),
    CopyLink(CommentId),
    LinkCopied(CommentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchComments { request: u64 },
    LoadDraft(DraftKey),
    SaveDraft { key: DraftKey, text: String },
    ClearDraft(DraftKey),
    ReadAttachment { request: u64, path: PathBuf },
    CopyToClipboard { id: CommentId, text: String },
    ShowToast { message: String, duration: Duration },
}

#[derive(Debug, Clone)]
pub struct PanelState {
    config: PanelConfig,
    tab: Tab,
    load: LoadState,
    load_request: u64,
    store: CommentStore,
    thread: Option<ThreadView>,
    query: TopLevelQuery,
    menu: Option<MenuState>,
    selected: Option<usize>,
    composer: Composer,
    attachment_request: u64,
    pending_attachment: Option<(u64, DraftKey)>,
    edit: Option<EditSession>,
    confirm_delete: Option<CommentId>,
    emoji_picker: Option<EmojiPicker>,
}

impl PanelState {
    /// A panel that starts loading its comments and the main draft right away.
    pub fn start(config: PanelConfig) -> (Self, Vec<Effect>) {
        let state = Self {
            config,
            tab: Tab::default(),
            load: LoadState::Loading,
            load_request: 0,
            store: CommentStore::new(),
            thread: None,
            query: TopLevelQuery::default(),
            menu: None,
            selected: None,
            composer: Composer::new(DraftKey::Main, 0),
            attachment_request: 0,
            pending_attachment: None,
            edit: None,
            confirm_delete: None,
            emoji_picker: None,
        };
        let (state, mut effects) = state.update(Msg::Load);
        effects.push(Effect::LoadDraft(DraftKey::Main));
        (state, effects)
    }

    pub fn update(mut self, msg: Msg) -> (Self, Vec<Effect>) {
        let effects = self.handle(msg);
        (self, effects)
    }

    /// In-place form of [`PanelState::update`].
    pub fn handle(&mut self, msg: Msg) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.apply(msg, &mut effects);
        effects
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn current_user(&self) -> &str {
        &self.config.current_user
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn thread(&self) -> Option<&ThreadView> {
        self.thread.as_ref()
    }

    pub fn thread_root(&self) -> Option<CommentId> {
        self.thread.map(|t| t.root())
    }

    pub fn query(&self) -> &TopLevelQuery {
        &self.query
    }

    pub fn menu(&self) -> Option<MenuState> {
        self.menu
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn edit(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn confirm_delete(&self) -> Option<CommentId> {
        self.confirm_delete
    }

    pub fn emoji_picker(&self) -> Option<EmojiPicker> {
        self.emoji_picker
    }

    /// Whether the comment, seen from the current view, counts as resolved.
    pub fn is_effectively_resolved(&self, id: CommentId) -> bool {
        self.store.is_effectively_resolved(id, self.thread_root())
    }

    /// The list as currently shown: the pinned comment and the filtered top-level comments, or
    /// the thread root, its visible replies and a "load more" row.
    pub fn rows(&self) -> Vec<Row> {
        if self.tab != Tab::Comments || !self.is_ready() {
            return Vec::new();
        }
        match &self.thread {
            Some(thread) => {
                let Some(page) = thread.page(&self.store) else {
                    return Vec::new();
                };
                let mut rows = vec![Row::Comment(page.root.id)];
                rows.extend(page.replies.iter().map(|r| Row::Comment(r.comment.id)));
                if page.remaining() > 0 {
                    rows.push(Row::LoadMore);
                }
                rows
            }
            None => self
                .store
                .pinned()
                .into_iter()
                .chain(self.store.top_level_view(&self.query))
                .map(|c| Row::Comment(c.id))
                .collect(),
        }
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.selected.and_then(|i| self.rows().get(i).copied())
    }

    pub fn selected_comment(&self) -> Option<CommentId> {
        match self.selected_row()? {
            Row::Comment(id) => Some(id),
            Row::LoadMore => None,
        }
    }

    pub fn menu_items(&self, kind: HeaderMenu) -> Vec<MenuItem> {
        match kind {
            HeaderMenu::Sort => SortOrder::ALL
                .iter()
                .map(|s| MenuItem {
                    label: s.label().to_string(),
                    checked: *s == self.query.sort,
                })
                .collect(),
            HeaderMenu::User => {
                let mut items = vec![MenuItem {
                    label: "All Comments".to_string(),
                    checked: self.query.author.is_none(),
                }];
                items.extend(self.store.authors().into_iter().map(|a| MenuItem {
                    label: a.name.clone(),
                    checked: self.query.author.as_deref() == Some(a.name.as_str()),
                }));
                items
            }
            HeaderMenu::Resolution => ResolutionFilter::ALL
                .iter()
                .map(|r| MenuItem {
                    label: r.label().to_string(),
                    checked: *r == self.query.resolution,
                })
                .collect(),
        }
    }

    fn apply(&mut self, msg: Msg, effects: &mut Vec<Effect>) {
        match msg {
            Msg::Load => {
                self.load_request += 1;
                self.load = LoadState::Loading;
                effects.push(Effect::FetchComments {
                    request: self.load_request,
                });
            }
            Msg::Loaded { request, result } => self.loaded(request, result),
            Msg::SelectTab(tab) => {
                self.tab = tab;
                self.close_overlays();
                self.selected = None;
                self.clamp_selection();
            }
            Msg::SelectNext => self.move_selection(|i, len| (i + 1).min(len - 1)),
            Msg::SelectPrevious => self.move_selection(|i, _| i.saturating_sub(1)),
            Msg::SelectFirst => self.move_selection(|_, _| 0),
            Msg::SelectLast => self.move_selection(|_, len| len - 1),
            Msg::Activate => match self.selected_row() {
                Some(Row::LoadMore) => self.apply(Msg::LoadMoreReplies, effects),
                Some(Row::Comment(id)) if self.thread.is_none() => {
                    self.apply(Msg::OpenThread(id), effects)
                }
                _ => {}
            },
            Msg::Back => self.back(effects),
            Msg::OpenThread(id) => self.open_thread(id, effects),
            Msg::CloseThread => {
                if self.thread.take().is_some() {
                    self.close_overlays();
                    self.switch_draft(DraftKey::Main, effects);
                    self.selected = Some(0);
                    self.clamp_selection();
                }
            }
            Msg::LoadMoreReplies => {
                if let Some(thread) = self.thread.as_mut() {
                    thread.load_more();
                    self.clamp_selection();
                }
            }
            Msg::ToggleMenu(kind) => {
                self.menu = match self.menu {
                    Some(open) if open.kind == kind => None,
                    _ => Some(MenuState {
                        kind,
                        highlighted: self
                            .menu_items(kind)
                            .iter()
                            .position(|item| item.checked)
                            .unwrap_or(0),
                    }),
                };
            }
            Msg::MenuNext => self.step_menu(true),
            Msg::MenuPrevious => self.step_menu(false),
            Msg::MenuChoose => {
                if let Some(menu) = self.menu.take() {
                    self.choose_menu_item(menu, effects);
                }
            }
            Msg::CloseMenus => self.menu = None,
            Msg::SetSort(sort) => {
                self.query.sort = sort;
                self.selected = Some(0);
                self.clamp_selection();
            }
            Msg::SetAuthorFilter(author) => {
                self.query.author = author;
                self.filters_changed();
            }
            Msg::SetResolutionFilter(resolution) => {
                self.query.resolution = resolution;
                self.filters_changed();
            }
            Msg::ComposerChanged(text) => {
                if self.composer.text != text {
                    self.composer.text = text;
                    self.refresh_mentions();
                    effects.push(self.draft_effect());
                }
            }
            Msg::DraftLoaded { key, text } => {
                if key == self.composer.key {
                    self.composer.replace_text(text.unwrap_or_default());
                    self.composer.mentions.close();
                } else {
                    debug!(%key, "Dropping draft for inactive composer");
                }
            }
            Msg::InsertMentionTrigger => {
                let needs_space = self
                    .composer
                    .text
                    .chars()
                    .next_back()
                    .is_some_and(|c| c != ' ' && c != '\n');
                let mut text = self.composer.text.clone();
                text.push_str(if needs_space { " @" } else { "@" });
                self.composer.replace_text(text);
                self.refresh_mentions();
                effects.push(self.draft_effect());
            }
            Msg::MentionNext => self.composer.mentions.next(),
            Msg::MentionPrevious => self.composer.mentions.previous(),
            Msg::MentionAccept => {
                let text = &self.composer.text;
                if let Some(name) = self.composer.mentions.selected()
                    && let Some((text, _cursor)) = mention::insert_mention(text, text.len(), name)
                {
                    self.composer.replace_text(text);
                    self.composer.mentions.close();
                    effects.push(self.draft_effect());
                }
            }
            Msg::MentionDismiss => self.composer.mentions.close(),
            Msg::Submit => self.submit(effects),
            Msg::AttachRequested(path) => {
                self.attachment_request += 1;
                self.pending_attachment = Some((self.attachment_request, self.composer.key));
                effects.push(Effect::ReadAttachment {
                    request: self.attachment_request,
                    path,
                });
            }
            Msg::AttachmentRead { request, result } => {
                if self.pending_attachment != Some((request, self.composer.key)) {
                    debug!(request, "Dropping stale attachment");
                    return;
                }
                self.pending_attachment = None;
                match result {
                    Ok(Some(url)) => self.composer.attachment = Some(url),
                    Ok(None) => debug!("Attachment is not an image"),
                    Err(err) => warn!(%err, "Attachment could not be read"),
                }
            }
            Msg::RemoveAttachment => {
                self.composer.attachment = None;
                self.pending_attachment = None;
            }
            Msg::StartEdit(id) => {
                if let Some(text) = self.store.get(id).map(|comment| comment.text.clone()) {
                    self.close_overlays();
                    self.edit = Some(EditSession { id, text });
                }
            }
            Msg::EditChanged(text) => {
                if let Some(edit) = self.edit.as_mut() {
                    edit.text = text;
                }
            }
            Msg::SaveEdit => {
                if let Some(edit) = self.edit.take()
                    && !self.store.update(edit.id, edit.text)
                {
                    debug!(id = %edit.id, "Edit rejected");
                }
            }
            Msg::CancelEdit => self.edit = None,
            Msg::RequestDelete(id) => self.request_delete(id, effects),
            Msg::CancelDelete => self.confirm_delete = None,
            Msg::OpenEmojiPicker(target) => {
                let allowed = match target {
                    EmojiTarget::Reaction(id) => {
                        self.store.contains(id) && !self.is_effectively_resolved(id)
                    }
                    EmojiTarget::Composer => true,
                };
                if allowed {
                    self.menu = None;
                    self.emoji_picker = Some(EmojiPicker {
                        target,
                        highlighted: 0,
                    });
                }
            }
            Msg::EmojiNext => self.step_emoji(true),
            Msg::EmojiPrevious => self.step_emoji(false),
            Msg::EmojiChoose => {
                if let Some(picker) = self.emoji_picker.take() {
                    match picker.target {
                        EmojiTarget::Reaction(id) => self.apply(
                            Msg::ToggleReaction {
                                id,
                                emoji: picker.emoji().to_string(),
                            },
                            effects,
                        ),
                        EmojiTarget::Composer => {
                            let mut text = self.composer.text.clone();
                            text.push_str(picker.emoji());
                            self.composer.replace_text(text);
                            effects.push(self.draft_effect());
                        }
                    }
                }
            }
            Msg::CloseEmojiPicker => self.emoji_picker = None,
            Msg::ToggleReaction { id, emoji } => {
                if !self.is_effectively_resolved(id) {
                    self.store
                        .toggle_reaction(id, &emoji, &self.config.current_user);
                }
            }
            Msg::ToggleResolve(id) => {
                if self.store.toggle_resolve(id) {
                    self.clamp_selection();
                }
            }
            Msg::TogglePin(id) => {
                if self.store.toggle_pin(id) {
                    self.clamp_selection();
                }
            }
            Msg::CopyLink(id) => {
                if self.store.contains(id) {
                    effects.push(Effect::CopyToClipboard {
                        id,
                        text: comment_link(&self.config.base_url, id),
                    });
                }
            }
            Msg::LinkCopied(id) => {
                debug!(%id, "Link copied");
                effects.push(Effect::ShowToast {
                    message: "Link copied".to_string(),
                    duration: LINK_COPIED_TOAST,
                });
            }
        }
    }

    fn loaded(&mut self, request: u64, result: Result<Vec<Comment>, String>) {
        if request != self.load_request {
            debug!(request, current = self.load_request, "Dropping stale load");
            return;
        }
        let store = result.and_then(|comments| {
            CommentStore::from_comments(comments).map_err(|err| err.to_string())
        });
        match store {
            Ok(store) => {
                info!(count = store.len(), "Comments loaded");
                self.store = store;
                self.load = LoadState::Ready;
                if self.thread_root().is_some_and(|root| !self.store.contains(root)) {
                    self.thread = None;
                }
                self.selected = Some(0);
                self.clamp_selection();
            }
            Err(message) => {
                warn!(%message, "Loading comments failed");
                self.load = LoadState::Failed(message);
                self.selected = None;
            }
        }
    }

    fn back(&mut self, effects: &mut Vec<Effect>) {
        if self.menu.take().is_some() || self.emoji_picker.take().is_some() {
            return;
        }
        if self.composer.mentions.is_open() {
            self.composer.mentions.close();
            return;
        }
        if self.edit.take().is_some() || self.confirm_delete.take().is_some() {
            return;
        }
        self.apply(Msg::CloseThread, effects);
    }

    fn step_menu(&mut self, forward: bool) {
        if let Some(menu) = self.menu {
            let len = self.menu_items(menu.kind).len();
            self.menu = Some(MenuState {
                highlighted: cycle(menu.highlighted, len, forward),
                ..menu
            });
        }
    }

    fn step_emoji(&mut self, forward: bool) {
        if let Some(picker) = self.emoji_picker.as_mut() {
            picker.highlighted = cycle(picker.highlighted, REACTION_EMOJI.len(), forward);
        }
    }

    fn open_thread(&mut self, id: CommentId, effects: &mut Vec<Effect>) {
        if !self.is_ready() || self.thread.is_some() || !self.store.contains(id) {
            return;
        }
        if self.is_effectively_resolved(id) {
            debug!(%id, "Not opening thread of resolved comment");
            return;
        }
        self.close_overlays();
        self.thread = Some(ThreadView::new(id));
        self.switch_draft(DraftKey::Thread(id), effects);
        self.selected = Some(0);
        self.clamp_selection();
    }

    fn choose_menu_item(&mut self, menu: MenuState, effects: &mut Vec<Effect>) {
        let i = menu.highlighted;
        let msg = match menu.kind {
            HeaderMenu::Sort => SortOrder::ALL.get(i).copied().map(Msg::SetSort),
            HeaderMenu::User => match i {
                0 => Some(Msg::SetAuthorFilter(None)),
                _ => self
                    .store
                    .authors()
                    .get(i - 1)
                    .map(|a| Msg::SetAuthorFilter(Some(a.name.clone()))),
            },
            HeaderMenu::Resolution => ResolutionFilter::ALL
                .get(i)
                .copied()
                .map(Msg::SetResolutionFilter),
        };
        if let Some(msg) = msg {
            self.apply(msg, effects);
        }
    }

    fn filters_changed(&mut self) {
        if let Some(thread) = self.thread.as_mut() {
            thread.reset();
        }
        self.selected = Some(0);
        self.clamp_selection();
    }

    fn submit(&mut self, effects: &mut Vec<Effect>) {
        if !self.is_ready() || !self.composer.can_submit() {
            return;
        }
        let mut new = NewComment::new(
            Author::named(self.config.current_user.as_str()),
            self.composer.text.clone(),
        );
        new.attachment_url = self.composer.attachment.clone();
        new.parent_id = self.thread_root();
        let Some(id) = self.store.add(new) else {
            return;
        };
        info!(%id, "Comment posted");

        let key = self.composer.key;
        self.composer = Composer::new(key, self.composer.revision + 1);
        self.pending_attachment = None;
        effects.push(Effect::ClearDraft(key));
        self.scroll_to(id);
    }

    /// Selects a freshly added comment, or the end of the list it was added to.
    fn scroll_to(&mut self, id: CommentId) {
        let rows = self.rows();
        if rows.is_empty() {
            self.selected = None;
            return;
        }
        self.selected = Some(
            rows.iter()
                .position(|r| *r == Row::Comment(id))
                .unwrap_or(
                    if self.thread.is_none() && self.query.sort == SortOrder::Newest {
                        0
                    } else {
                        rows.len() - 1
                    },
                ),
        );
    }

    fn request_delete(&mut self, id: CommentId, effects: &mut Vec<Effect>) {
        if self.confirm_delete != Some(id) {
            if self.store.contains(id) {
                self.confirm_delete = Some(id);
            }
            return;
        }
        self.confirm_delete = None;
        let removed = self.store.delete(id);
        info!(%id, count = removed.len(), "Deleted comment");

        if self.edit.as_ref().is_some_and(|e| removed.contains(&e.id)) {
            self.edit = None;
        }
        if let Some(EmojiPicker {
            target: EmojiTarget::Reaction(target),
            ..
        }) = self.emoji_picker
            && removed.contains(&target)
        {
            self.emoji_picker = None;
        }
        if let Some(root) = self.thread_root()
            && removed.contains(&root)
        {
            self.thread = None;
            effects.push(Effect::ClearDraft(DraftKey::Thread(root)));
            self.switch_draft(DraftKey::Main, effects);
        }
        self.clamp_selection();
    }

    fn switch_draft(&mut self, key: DraftKey, effects: &mut Vec<Effect>) {
        if self.composer.key == key {
            return;
        }
        self.composer = Composer::new(key, self.composer.revision + 1);
        self.pending_attachment = None;
        effects.push(Effect::LoadDraft(key));
    }

    fn draft_effect(&self) -> Effect {
        let key = self.composer.key;
        if self.composer.text.is_empty() {
            Effect::ClearDraft(key)
        } else {
            Effect::SaveDraft {
                key,
                text: self.composer.text.clone(),
            }
        }
    }

    fn refresh_mentions(&mut self) {
        let text = &self.composer.text;
        self.composer.mentions.refresh(
            text,
            text.len(),
            self.store.mentionable_users(&self.config.current_user),
        );
    }

    fn close_overlays(&mut self) {
        self.menu = None;
        self.emoji_picker = None;
        self.confirm_delete = None;
        self.edit = None;
    }

    fn move_selection(&mut self, step: impl Fn(usize, usize) -> usize) {
        let len = self.rows().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let next = step(self.selected.unwrap_or(0).min(len - 1), len);
        if Some(next) != self.selected {
            self.confirm_delete = None;
        }
        self.selected = Some(next);
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        self.selected = match (len, self.selected) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(i)) => Some(i.min(len - 1)),
        };
    }
}

fn cycle(index: usize, len: usize, forward: bool) -> usize {
    match len {
        0 => 0,
        _ if forward => (index + 1) % len,
        _ => (index + len - 1) % len,
    }
}
