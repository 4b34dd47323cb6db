use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::avatar::avatar_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub avatar_url: String,
}

impl Author {
    /// An author whose avatar is derived from the name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let avatar_url = avatar_url(&name);
        Self { name, avatar_url }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    #[default]
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: AttachmentKind,
}

impl Attachment {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: AttachmentKind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub text: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn has_reaction(&self, emoji: &str, user: &str) -> bool {
        self.reactions
            .iter()
            .any(|r| r.emoji == emoji && r.user == user)
    }
}

/// Input for [`crate::CommentStore::add`]. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: Author,
    pub text: String,
    pub attachment_url: Option<String>,
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
            attachment_url: None,
            parent_id: None,
        }
    }

    pub fn reply_to(mut self, parent: CommentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn attachment(mut self, url: impl Into<String>) -> Self {
        self.attachment_url = Some(url.into());
        self
    }

    /// A comment needs either some non-blank text or an attachment.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment_url.is_some()
    }
}
