use std::collections::HashMap;

use crate::{
    model::{Comment, CommentId},
    store::CommentStore,
};

pub const REPLIES_PAGE_SIZE: usize = 10;

/// Focused view on one comment and every reply beneath it.
///
/// Only a window of the flattened replies is visible; [`ThreadView::load_more`] grows it a page
/// at a time and [`ThreadView::reset`] shrinks it back to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadView {
    root: CommentId,
    visible: usize,
}

#[derive(Debug, Clone)]
pub struct ThreadReply<'a> {
    pub comment: &'a Comment,
    /// Author of the direct parent, unless the parent is the thread root.
    pub replying_to: Option<&'a str>,
    pub effectively_resolved: bool,
}

#[derive(Debug, Clone)]
pub struct ThreadPage<'a> {
    pub root: &'a Comment,
    pub replies: Vec<ThreadReply<'a>>,
    pub total: usize,
}

impl ThreadView {
    pub fn new(root: CommentId) -> Self {
        Self {
            root,
            visible: REPLIES_PAGE_SIZE,
        }
    }

    pub fn root(&self) -> CommentId {
        self.root
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn load_more(&mut self) {
        self.visible += REPLIES_PAGE_SIZE;
    }

    pub fn reset(&mut self) {
        self.visible = REPLIES_PAGE_SIZE;
    }

    /// The visible part of the thread, or `None` once the root is gone.
    pub fn page<'a>(&self, store: &'a CommentStore) -> Option<ThreadPage<'a>> {
        let root = store.get(self.root)?;
        let index = store.child_index();
        let all: Vec<&Comment> = index.descendants(self.root).collect();
        let total = all.len();

        let by_id: HashMap<CommentId, &Comment> =
            store.comments().iter().map(|c| (c.id, c)).collect();
        let replies = all
            .into_iter()
            .take(self.visible)
            .map(|comment| ThreadReply {
                comment,
                replying_to: comment
                    .parent_id
                    .filter(|&parent| parent != self.root)
                    .and_then(|parent| by_id.get(&parent))
                    .map(|parent| parent.author.name.as_str()),
                effectively_resolved: comment.resolved || root.resolved,
            })
            .collect();

        Some(ThreadPage {
            root,
            replies,
            total,
        })
    }
}

impl ThreadPage<'_> {
    /// Replies hidden behind the "load more" row.
    pub fn remaining(&self) -> usize {
        self.total - self.replies.len()
    }

    /// How many replies the next "load more" reveals.
    pub fn next_batch(&self) -> usize {
        self.remaining().min(REPLIES_PAGE_SIZE)
    }

    /// Label of the "load more" row, if there is anything left to load.
    pub fn load_more_label(&self) -> Option<String> {
        match self.next_batch() {
            0 => None,
            1 => Some("View 1 more reply".to_string()),
            n => Some(format!("View {n} more replies")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::model::{Author, NewComment};

    fn thread_with_replies(count: i64) -> CommentStore {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = CommentStore::new();
        let root = store
            .add_at(NewComment::new(Author::named("Jane Doe"), "root"), base)
            .unwrap();
        for i in 0..count {
            store
                .add_at(
                    NewComment::new(Author::named("You"), format!("reply {i}")).reply_to(root),
                    base + Duration::minutes(i + 1),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn pages_through_replies_ten_at_a_time() {
        let store = thread_with_replies(25);
        let mut view = ThreadView::new(CommentId(1));

        let page = view.page(&store).unwrap();
        assert_eq!(page.replies.len(), 10);
        assert_eq!(page.load_more_label().as_deref(), Some("View 10 more replies"));

        view.load_more();
        let page = view.page(&store).unwrap();
        assert_eq!(page.replies.len(), 20);
        assert_eq!(page.next_batch(), 5);

        view.load_more();
        let page = view.page(&store).unwrap();
        assert_eq!(page.replies.len(), 25);
        assert_eq!(page.remaining(), 0);
        assert_eq!(page.load_more_label(), None);

        view.reset();
        assert_eq!(view.visible(), REPLIES_PAGE_SIZE);
    }

    #[test]
    fn labels_a_single_remaining_reply() {
        let store = thread_with_replies(11);
        let page = ThreadView::new(CommentId(1)).page(&store).unwrap();
        assert_eq!(page.load_more_label().as_deref(), Some("View 1 more reply"));
    }

    #[test]
    fn annotates_only_nested_replies() {
        let mut store = thread_with_replies(1);
        let nested = store
            .add(NewComment::new(Author::named("Ali Rahimi"), "nested").reply_to(CommentId(2)))
            .unwrap();

        let page = ThreadView::new(CommentId(1)).page(&store).unwrap();
        let direct = &page.replies[0];
        assert_eq!(direct.comment.id, CommentId(2));
        assert_eq!(direct.replying_to, None);

        let deep = &page.replies[1];
        assert_eq!(deep.comment.id, nested);
        assert_eq!(deep.replying_to, Some("You"));
    }

    #[test]
    fn marks_replies_of_a_resolved_root() {
        let mut store = thread_with_replies(2);
        store.toggle_resolve(CommentId(1));
        let page = ThreadView::new(CommentId(1)).page(&store).unwrap();
        assert!(page.replies.iter().all(|r| r.effectively_resolved));
    }

    #[test]
    fn vanishes_with_its_root() {
        let mut store = thread_with_replies(3);
        store.delete(CommentId(1));
        assert!(ThreadView::new(CommentId(1)).page(&store).is_none());
    }
}
