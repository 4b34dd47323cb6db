//! An in-memory model for threaded comment panels.
//!
//! Comments are kept as a flat list with parent pointers. The [`CommentStore`] owns that list
//! and is the only place comments are mutated; every tree query (descendant counts, flattened
//! replies, cascading deletes) builds a child index once per call instead of rescanning the list.
//!
//! On top of the store sit the derived views a panel renders:
//! - [`TopLevelQuery`] filters and sorts the top-level comments,
//! - [`ThreadView`] paginates the flattened replies of a selected root,
//! - [`tokenize`] splits comment text into links, hashtags and mentions,
//! - [`group_reactions`] groups reactions by emoji for display,
//! - [`mention`] drives the `@` suggestion list of a composer.
//!
//! Every operation is total: unknown ids are silently ignored, and invalid input (an empty comment
//! without attachment) leaves the store untouched.
pub mod avatar;
pub mod draft;
pub mod mention;
pub mod model;
pub mod reactions;
pub mod store;
pub mod thread;
pub mod tokenize;
pub mod view;

pub use avatar::avatar_url;
pub use draft::DraftKey;
pub use mention::MentionPicker;
pub use model::{Attachment, AttachmentKind, Author, Comment, CommentId, NewComment, Reaction};
pub use reactions::{ReactionGroup, group_reactions};
pub use store::{CommentStore, LoadError};
pub use thread::{REPLIES_PAGE_SIZE, ThreadPage, ThreadReply, ThreadView};
pub use tokenize::{Span, SpanKind, tokenize};
pub use view::{ResolutionFilter, SortOrder, TopLevelQuery};
