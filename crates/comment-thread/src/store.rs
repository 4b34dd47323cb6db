use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Attachment, Comment, CommentId, NewComment, Reaction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("comment id {0} appears more than once")]
    DuplicateId(CommentId),
    #[error("comment {0} is its own ancestor")]
    ParentCycle(CommentId),
}

/// Owner of every comment in a panel.
///
/// Comments live in a flat list in insertion order; replies point at their parent by id. All
/// mutations go through this type, and all of them are total: an unknown id is ignored rather
/// than reported.
#[derive(Debug, Clone)]
pub struct CommentStore {
    comments: Vec<Comment>,
    next_id: u64,
}

impl Default for CommentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentStore {
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds a store from a loaded collection.
    ///
    /// Duplicate ids and parent chains that loop back on themselves are rejected. When more than
    /// one comment claims the pin, only the first keeps it.
    pub fn from_comments(mut comments: Vec<Comment>) -> Result<Self, LoadError> {
        let mut parents = HashMap::with_capacity(comments.len());
        for comment in &comments {
            if parents.insert(comment.id, comment.parent_id).is_some() {
                return Err(LoadError::DuplicateId(comment.id));
            }
        }

        let mut acyclic = HashSet::with_capacity(comments.len());
        for comment in &comments {
            let mut path = Vec::new();
            let mut cursor = Some(comment.id);
            while let Some(id) = cursor {
                if acyclic.contains(&id) {
                    break;
                }
                if path.contains(&id) {
                    return Err(LoadError::ParentCycle(id));
                }
                path.push(id);
                cursor = parents.get(&id).copied().flatten();
            }
            acyclic.extend(path);
        }

        let mut seen_pin = false;
        for comment in comments.iter_mut().filter(|c| c.is_pinned) {
            if seen_pin {
                warn!(id = %comment.id, "Dropping extra pin from loaded comment");
                comment.is_pinned = false;
            }
            seen_pin = true;
        }

        let next_id = comments.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        Ok(Self { comments, next_id })
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    /// Adds a comment stamped with the current time. See [`CommentStore::add_at`].
    pub fn add(&mut self, new: NewComment) -> Option<CommentId> {
        self.add_at(new, Utc::now())
    }

    /// Adds a comment and returns its fresh id.
    ///
    /// Returns `None` without touching the store when the comment has neither text nor an
    /// attachment, or when it replies to a comment that does not exist.
    pub fn add_at(&mut self, new: NewComment, created_at: DateTime<Utc>) -> Option<CommentId> {
        if !new.has_content() {
            debug!("Rejecting empty comment");
            return None;
        }
        if let Some(parent) = new.parent_id
            && !self.contains(parent)
        {
            debug!(%parent, "Rejecting reply to unknown comment");
            return None;
        }

        let id = CommentId(self.next_id);
        self.next_id += 1;
        self.comments.push(Comment {
            id,
            author: new.author,
            created_at,
            text: new.text,
            reactions: Vec::new(),
            parent_id: new.parent_id,
            attachment: new.attachment_url.map(Attachment::image),
            resolved: false,
            is_edited: false,
            is_pinned: false,
        });
        debug!(%id, parent = ?new.parent_id, "Added comment");
        Some(id)
    }

    /// Replaces the text of a comment and marks it edited. Blank text is only accepted when the
    /// comment carries an attachment. Returns whether anything changed.
    pub fn update(&mut self, id: CommentId, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(comment) = self.get_mut(id) else {
            return false;
        };
        if text.trim().is_empty() && !comment.has_attachment() {
            return false;
        }
        comment.text = text;
        comment.is_edited = true;
        debug!(%id, "Updated comment");
        true
    }

    /// Removes a comment together with every reply beneath it and returns the removed ids.
    pub fn delete(&mut self, id: CommentId) -> Vec<CommentId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut removed = vec![id];
        removed.extend(self.child_index().descendants(id).map(|c| c.id));

        let doomed: HashSet<CommentId> = removed.iter().copied().collect();
        self.comments.retain(|c| !doomed.contains(&c.id));
        debug!(%id, count = removed.len(), "Deleted comment subtree");
        removed
    }

    /// Adds `user`'s `emoji` reaction, or removes it when already present.
    pub fn toggle_reaction(&mut self, id: CommentId, emoji: &str, user: &str) -> bool {
        let Some(comment) = self.get_mut(id) else {
            return false;
        };
        match comment
            .reactions
            .iter()
            .position(|r| r.emoji == emoji && r.user == user)
        {
            Some(index) => {
                comment.reactions.remove(index);
            }
            None => comment.reactions.push(Reaction {
                emoji: emoji.to_string(),
                user: user.to_string(),
            }),
        }
        true
    }

    pub fn toggle_resolve(&mut self, id: CommentId) -> bool {
        let Some(comment) = self.get_mut(id) else {
            return false;
        };
        comment.resolved = !comment.resolved;
        debug!(%id, resolved = comment.resolved, "Toggled resolution");
        true
    }

    /// Pins a comment, unpinning whichever comment held the pin; pinning the pinned comment
    /// unpins it.
    pub fn toggle_pin(&mut self, id: CommentId) -> bool {
        let Some(was_pinned) = self.get(id).map(|c| c.is_pinned) else {
            return false;
        };
        for comment in &mut self.comments {
            if comment.id == id {
                comment.is_pinned = !was_pinned;
            } else if !was_pinned {
                comment.is_pinned = false;
            }
        }
        debug!(%id, pinned = !was_pinned, "Toggled pin");
        true
    }

    pub fn pinned(&self) -> Option<&Comment> {
        self.comments.iter().find(|c| c.is_pinned)
    }

    /// Number of transitive replies below `id`.
    pub fn descendant_count(&self, id: CommentId) -> usize {
        self.child_index().descendants(id).count()
    }

    /// Every transitive reply below `id`, depth first, siblings oldest first.
    pub fn all_descendants(&self, id: CommentId) -> Vec<&Comment> {
        self.child_index().descendants(id).collect()
    }

    /// A comment is effectively resolved when it, or the thread root it is shown under, is.
    pub fn is_effectively_resolved(&self, id: CommentId, thread_root: Option<CommentId>) -> bool {
        let resolved = |id| self.get(id).is_some_and(|c| c.resolved);
        resolved(id) || thread_root.is_some_and(resolved)
    }

    pub(crate) fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub(crate) fn child_index(&self) -> ChildIndex<'_> {
        ChildIndex::build(&self.comments)
    }
}

/// Parent id to children, with each child list ordered oldest first.
pub(crate) struct ChildIndex<'a> {
    comments: &'a [Comment],
    children: HashMap<CommentId, Vec<usize>>,
}

impl<'a> ChildIndex<'a> {
    fn build(comments: &'a [Comment]) -> Self {
        let mut children: HashMap<CommentId, Vec<usize>> = HashMap::new();
        for (index, comment) in comments.iter().enumerate() {
            if let Some(parent) = comment.parent_id {
                children.entry(parent).or_default().push(index);
            }
        }
        for list in children.values_mut() {
            list.sort_by_key(|&i| (comments[i].created_at, comments[i].id));
        }
        Self { comments, children }
    }

    pub(crate) fn get(&self, id: CommentId) -> Option<&'a Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Pre-order walk of the subtree below `root`, excluding `root` itself.
    pub(crate) fn descendants(&self, root: CommentId) -> impl Iterator<Item = &'a Comment> + '_ {
        let comments = self.comments;
        let mut visited = HashSet::from([root]);
        let mut stack: Vec<usize> = self.children_of(root).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            while let Some(index) = stack.pop() {
                let comment = &comments[index];
                if !visited.insert(comment.id) {
                    continue;
                }
                stack.extend(self.children_of(comment.id).iter().rev().copied());
                return Some(comment);
            }
            None
        })
    }

    fn children_of(&self, id: CommentId) -> &[usize] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::model::Author;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn you() -> Author {
        Author::named("You")
    }

    fn comment(id: u64, parent: Option<u64>, minutes: i64) -> Comment {
        Comment {
            id: CommentId(id),
            author: Author::named(format!("user{id}")),
            created_at: at(minutes),
            text: format!("comment {id}"),
            reactions: Vec::new(),
            parent_id: parent.map(CommentId),
            attachment: None,
            resolved: false,
            is_edited: false,
            is_pinned: false,
        }
    }

    fn chain() -> CommentStore {
        CommentStore::from_comments(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ])
        .unwrap()
    }

    #[test]
    fn counts_and_deletes_a_reply_chain() {
        let mut store = chain();
        assert_eq!(store.descendant_count(CommentId(1)), 2);
        assert_eq!(store.descendant_count(CommentId(3)), 0);

        let removed = store.delete(CommentId(1));
        assert_eq!(removed.len(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn delete_leaves_unrelated_comments() {
        let mut store = CommentStore::from_comments(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 2),
            comment(4, Some(3), 3),
            comment(5, Some(2), 4),
        ])
        .unwrap();

        let mut removed = store.delete(CommentId(2));
        removed.sort();
        assert_eq!(removed, vec![CommentId(2), CommentId(5)]);
        let left: Vec<_> = store.iter().map(|c| c.id.0).collect();
        assert_eq!(left, vec![1, 3, 4]);
    }

    #[test]
    fn delete_of_unknown_id_is_a_no_op() {
        let mut store = chain();
        assert!(store.delete(CommentId(99)).is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn descendants_are_pre_order_with_siblings_oldest_first() {
        let store = CommentStore::from_comments(vec![
            comment(1, None, 0),
            comment(2, Some(1), 5),
            comment(3, Some(1), 2),
            comment(4, Some(3), 9),
            comment(5, Some(2), 6),
            comment(6, Some(3), 3),
        ])
        .unwrap();

        let order: Vec<_> = store
            .all_descendants(CommentId(1))
            .into_iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(order, vec![3, 6, 4, 2, 5]);
    }

    #[test]
    fn add_rejects_blank_comments_without_attachment() {
        let mut store = CommentStore::new();
        assert_eq!(store.add(NewComment::new(you(), "   \n")), None);
        assert!(store.is_empty());

        let id = store
            .add(NewComment::new(you(), "").attachment("data:image/png;base64,AA=="))
            .expect("attachment-only comments are allowed");
        let added = store.get(id).unwrap();
        assert_eq!(added.text, "");
        assert!(added.has_attachment());
    }

    #[test]
    fn add_rejects_replies_to_unknown_parents() {
        let mut store = chain();
        assert_eq!(
            store.add(NewComment::new(you(), "hi").reply_to(CommentId(42))),
            None
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = chain();
        let first = store.add(NewComment::new(you(), "a")).unwrap();
        store.delete(first);
        let second = store.add(NewComment::new(you(), "b")).unwrap();
        assert_eq!(first, CommentId(4));
        assert_eq!(second, CommentId(5));
    }

    #[test]
    fn update_marks_edited_and_respects_attachments() {
        let mut store = chain();
        assert!(store.update(CommentId(2), "changed"));
        let updated = store.get(CommentId(2)).unwrap();
        assert_eq!(updated.text, "changed");
        assert!(updated.is_edited);

        assert!(!store.update(CommentId(3), "  "));
        assert_eq!(store.get(CommentId(3)).unwrap().text, "comment 3");
        assert!(!store.update(CommentId(77), "nobody"));

        let id = store
            .add(NewComment::new(you(), "pic").attachment("data:image/gif;base64,R0"))
            .unwrap();
        assert!(store.update(id, ""));
        assert_eq!(store.get(id).unwrap().text, "");
    }

    #[test]
    fn toggle_reaction_is_an_involution() {
        let mut store = chain();
        store.toggle_reaction(CommentId(1), "🚀", "Jane");
        let before = store.get(CommentId(1)).unwrap().reactions.clone();

        store.toggle_reaction(CommentId(1), "👍", "You");
        assert!(store.get(CommentId(1)).unwrap().has_reaction("👍", "You"));
        store.toggle_reaction(CommentId(1), "👍", "You");
        assert_eq!(store.get(CommentId(1)).unwrap().reactions, before);
    }

    #[test]
    fn pinning_moves_the_single_pin() {
        let mut store = chain();
        store.toggle_pin(CommentId(1));
        store.toggle_pin(CommentId(2));
        assert!(!store.get(CommentId(1)).unwrap().is_pinned);
        assert!(store.get(CommentId(2)).unwrap().is_pinned);
        assert_eq!(store.iter().filter(|c| c.is_pinned).count(), 1);

        store.toggle_pin(CommentId(2));
        assert!(store.pinned().is_none());

        assert!(!store.toggle_pin(CommentId(9)));
        assert!(store.pinned().is_none());
    }

    #[test]
    fn resolution_propagates_from_the_thread_root() {
        let mut store = chain();
        store.toggle_resolve(CommentId(1));
        assert!(store.is_effectively_resolved(CommentId(3), Some(CommentId(1))));
        assert!(!store.is_effectively_resolved(CommentId(3), None));
        store.toggle_resolve(CommentId(1));
        assert!(!store.is_effectively_resolved(CommentId(1), None));
    }

    #[test]
    fn load_rejects_duplicates_and_cycles() {
        assert_eq!(
            CommentStore::from_comments(vec![comment(1, None, 0), comment(1, None, 1)])
                .unwrap_err(),
            LoadError::DuplicateId(CommentId(1))
        );
        assert!(matches!(
            CommentStore::from_comments(vec![comment(1, Some(2), 0), comment(2, Some(1), 1)]),
            Err(LoadError::ParentCycle(_))
        ));
        assert_eq!(
            CommentStore::from_comments(vec![comment(3, Some(3), 0)]).unwrap_err(),
            LoadError::ParentCycle(CommentId(3))
        );
    }

    #[test]
    fn load_keeps_only_the_first_pin() {
        let mut first = comment(1, None, 0);
        first.is_pinned = true;
        let mut second = comment(2, None, 1);
        second.is_pinned = true;
        let store = CommentStore::from_comments(vec![first, second]).unwrap();
        assert_eq!(store.pinned().map(|c| c.id), Some(CommentId(1)));
        assert_eq!(store.iter().filter(|c| c.is_pinned).count(), 1);
    }

    #[test]
    fn orphans_are_kept_but_unreachable() {
        let store =
            CommentStore::from_comments(vec![comment(1, None, 0), comment(2, Some(40), 1)])
                .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.descendant_count(CommentId(1)), 0);
    }
}
