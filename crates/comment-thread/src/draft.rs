use std::fmt::Display;

use crate::model::CommentId;

/// Where an unsent composer draft is cached: one slot for the main panel and one per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftKey {
    Main,
    Thread(CommentId),
}

impl DraftKey {
    pub fn for_thread(root: Option<CommentId>) -> Self {
        root.map_or(DraftKey::Main, DraftKey::Thread)
    }
}

impl Display for DraftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftKey::Main => write!(f, "commentDraft_main"),
            DraftKey::Thread(id) => write!(f, "commentDraft_thread_{id}"),
        }
    }
}
